//! Command handlers.

use std::path::Path;

use anyhow::Context;
use console::style;

use crate::analysis::analyze_receipts;
use crate::config::Settings;
use crate::models::Receipt;
use crate::repository::{JsonReceiptRepository, ReceiptRepository};
use crate::service::AnalysisService;

fn open_repo(settings: &Settings) -> anyhow::Result<JsonReceiptRepository> {
    JsonReceiptRepository::open(&settings.storage.data_dir)
        .context("failed to open receipt store")
}

fn print_receipt(receipt: &Receipt) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(receipt)?);
    Ok(())
}

fn print_receipt_line(receipt: &Receipt) {
    println!(
        "{}  {}  {}  {}원",
        style(&receipt.id).dim(),
        receipt.order_receipt_time,
        style(&receipt.store_name).bold(),
        receipt.final_amount
    );
}

/// Analyze a receipt photo, optionally persisting the result.
pub async fn analyze(settings: &Settings, image: &Path, save: bool) -> anyhow::Result<()> {
    let bytes = std::fs::read(image)
        .with_context(|| format!("failed to read image {}", image.display()))?;

    let service = AnalysisService::from_settings(settings);
    let receipt = service.process_receipt_image(&bytes, None).await;

    if save {
        let stored = open_repo(settings)?.create(receipt).await?;
        print_receipt(&stored)?;
        eprintln!(
            "{} stored receipt {}",
            style("✓").green(),
            style(&stored.id).bold()
        );
    } else {
        print_receipt(&receipt)?;
    }
    Ok(())
}

/// List stored receipts, optionally filtered.
pub async fn list(settings: &Settings, query: Option<&str>) -> anyhow::Result<()> {
    let repo = open_repo(settings)?;
    let receipts = match query {
        Some(term) => repo.search(term).await?,
        None => repo.list().await?,
    };

    if receipts.is_empty() {
        eprintln!("no receipts stored");
        return Ok(());
    }
    for receipt in &receipts {
        print_receipt_line(receipt);
    }
    Ok(())
}

/// Print one receipt as JSON.
pub async fn show(settings: &Settings, id: &str) -> anyhow::Result<()> {
    let receipt = open_repo(settings)?
        .get(id)
        .await?
        .with_context(|| format!("receipt not found: {id}"))?;
    print_receipt(&receipt)
}

/// Delete one receipt.
pub async fn delete(settings: &Settings, id: &str) -> anyhow::Result<()> {
    open_repo(settings)?.delete(id).await?;
    eprintln!("{} deleted {}", style("✓").green(), id);
    Ok(())
}

/// Print aggregate spend statistics.
pub async fn stats(settings: &Settings) -> anyhow::Result<()> {
    let receipts = open_repo(settings)?.list().await?;
    let analysis = analyze_receipts(&receipts);

    println!(
        "{}: {}   {}: {}원   {}: {}원",
        style("receipts").bold(),
        analysis.total_receipts,
        style("total").bold(),
        analysis.total_spent,
        style("average").bold(),
        analysis.average_spent
    );

    if !analysis.store_breakdown.is_empty() {
        println!("\n{}", style("by store").underlined());
        for entry in &analysis.store_breakdown {
            println!(
                "  {:<16} {:>3}건  {:>10}원",
                entry.store, entry.count, entry.total_spent
            );
        }
    }

    if !analysis.item_breakdown.is_empty() {
        println!("\n{}", style("top items").underlined());
        for entry in analysis.item_breakdown.iter().take(10) {
            println!(
                "  {:<28} {:>3}개  {:>10}원",
                entry.item, entry.total_quantity, entry.total_spent
            );
        }
    }
    Ok(())
}
