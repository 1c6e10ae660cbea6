//! JSON API server for receipt capture and browsing.
//!
//! A thin boundary over the analysis service and the receipt store:
//! multipart upload in, receipt JSON out, plus CRUD and the aggregate
//! analysis endpoint. Display concerns live entirely in the clients.

mod handlers;
mod routes;

use std::sync::Arc;

use tracing::info;

use crate::config::Settings;
use crate::repository::{JsonReceiptRepository, ReceiptRepository};
use crate::service::AnalysisService;

pub use routes::create_router;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn ReceiptRepository>,
    pub service: Arc<AnalysisService>,
}

impl AppState {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let repo = JsonReceiptRepository::open(&settings.storage.data_dir)?;
        Ok(Self {
            repo: Arc::new(repo),
            service: Arc::new(AnalysisService::from_settings(settings)),
        })
    }
}

/// Run the server until interrupted.
pub async fn serve(settings: &Settings) -> anyhow::Result<()> {
    let state = AppState::new(settings)?;
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&settings.server.addr).await?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}
