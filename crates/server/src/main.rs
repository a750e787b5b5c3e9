mod routes;

use std::fs::{self, OpenOptions};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing_subscriber::{prelude::*, EnvFilter};

use kasse_core::{
    admission::AdmissionController,
    config::{self, AppConfig},
    ledger::{JsonLedgerStore, LedgerStore},
};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    config::ensure_default_config()?;
    let config = AppConfig::load()?;

    let store = Arc::new(JsonLedgerStore::new(&config.data_file));
    let ledger = store.load();
    tracing::info!(
        "reservation ledger at {}: {} reservations, occupancy {:?}",
        store.path().display(),
        ledger.reservations.len(),
        ledger.persons_by_day
    );

    let controller = Arc::new(AdmissionController::new(store));
    let app = routes::router(controller, config.static_dir.as_deref());

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!("theaterkasse listening on http://{}", config.listen_addr);

    axum::serve(listener, app).await.context("server error")
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("theaterkasse.log");

    let env_filter = EnvFilter::from_default_env();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stdout);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact()
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    Ok(())
}
