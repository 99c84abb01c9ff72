// This is the entry point of the indicators API.
//
// **Architecture Overview:**
// - `core/` = Business logic (table operations, indicator creation)
// - `infra/` = Implementations of core traits (Google Sheets, Google Drive)
// - `http/` = HTTP adapters (routes, JSON envelopes)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Serve the router

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with several mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "http/http_layer.rs"]
mod http;
#[path = "infra/infra_layer.rs"]
mod infra;

mod config;

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::core::indicators::IndicatorService;
use crate::core::table::TableService;
use crate::http::routes::{router, AppState};
use crate::infra::google::{
    AccessTokenProvider, GoogleDriveClient, GoogleSheetsGateway, ServiceAccountAuth,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env()?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================

    let auth = ServiceAccountAuth::from_env()
        .await
        .context("Failed to load Google service account credentials")?;
    tracing::info!("Using service account {}", auth.client_email());
    let auth: Arc<dyn AccessTokenProvider> = Arc::new(auth);

    let sheets = GoogleSheetsGateway::new(Arc::clone(&auth), config.sheets_settings())?;
    let drive = GoogleDriveClient::new(Arc::clone(&auth), config.http_timeout)?;

    let tables = Arc::new(TableService::new(sheets));
    let indicators = IndicatorService::new(Arc::clone(&tables), drive, config.indicator_config());
    let state = Arc::new(AppState { tables, indicators });

    // ========================================================================
    // SERVE
    // ========================================================================

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(
        "Serving spreadsheet {} on http://{}",
        config.spreadsheet_id,
        addr
    );

    axum::serve(listener, router(state))
        .await
        .context("HTTP server stopped")?;
    Ok(())
}
