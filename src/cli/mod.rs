//! CLI for receiptbook.
//!
//! This module contains the CLI parser and dispatches to command handlers.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Settings;

#[derive(Parser)]
#[command(name = "receiptbook")]
#[command(about = "Delivery receipt capture and spend analysis system")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Receipt store directory (overrides config file)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a receipt image and print the extracted record
    Analyze {
        /// Path to the receipt photo
        image: PathBuf,

        /// Store the analyzed receipt
        #[arg(long)]
        save: bool,
    },

    /// List stored receipts, newest first
    List {
        /// Filter by store name, order number, or item name
        #[arg(short, long)]
        query: Option<String>,
    },

    /// Print one stored receipt as JSON
    Show {
        /// Receipt identifier
        id: String,
    },

    /// Delete a stored receipt
    Delete {
        /// Receipt identifier
        id: String,
    },

    /// Aggregate spend statistics over stored receipts
    Stats,

    /// Run the JSON API server
    Serve {
        /// Bind address (overrides config file)
        #[arg(long)]
        addr: Option<String>,
    },
}

/// Parse arguments and run the selected command.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(data_dir) = cli.data_dir {
        settings.storage.data_dir = data_dir;
    }

    match cli.command {
        Commands::Analyze { image, save } => commands::analyze(&settings, &image, save).await,
        Commands::List { query } => commands::list(&settings, query.as_deref()).await,
        Commands::Show { id } => commands::show(&settings, &id).await,
        Commands::Delete { id } => commands::delete(&settings, &id).await,
        Commands::Stats => commands::stats(&settings).await,
        Commands::Serve { addr } => {
            if let Some(addr) = addr {
                settings.server.addr = addr;
            }
            crate::server::serve(&settings).await
        }
    }
}
