//! Privacy Guard RPC server: collector protocol over stdin/stdout.
//!
//! Protocol: one JSON object per line (newline-delimited JSON). See
//! [`privacy_guard::rpc_handler::serve`] for the request and reply shapes.
//!
//! Logs go to stderr; stdout carries only the protocol.

use std::sync::Arc;

use privacy_guard::app::Collector;
use privacy_guard::rpc_handler::serve;
use privacy_guard::services::settings_engine::SettingsEngine;

use serde_json::json;
use tokio::io::{self, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("privacy_guard=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let engine = SettingsEngine::new(std::env::var_os("PRIVACY_GUARD_CONFIG").map(Into::into));
    let mut settings = engine.load_or_default();
    if let Ok(api) = std::env::var("PRIVACY_GUARD_API") {
        settings.api_base_url = api;
    }

    let collector = Arc::new(Collector::new(settings)?);

    let mut stdout = io::stdout();

    // Signal ready
    let ready = json!({"event":"ready","version":env!("CARGO_PKG_VERSION")});
    stdout.write_all(format!("{}\n", ready).as_bytes()).await?;
    stdout.flush().await?;
    info!("collector ready");

    serve(BufReader::new(io::stdin()), stdout, collector).await?;

    info!("stdin closed, shutting down");
    Ok(())
}
