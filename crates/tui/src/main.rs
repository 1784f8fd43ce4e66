mod app;
mod form;
mod pane;

use anyhow::Result;
use std::{
    fs::{self, OpenOptions},
    sync::Mutex,
};

use racedesk_core::{
    config::{self, AppConfig},
    ApiClient,
};
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "racedesk=info,racedesk_core=info";

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let config_path = config::ensure_default_config()?;
    let config = AppConfig::load()?;
    info!(path = %config_path.display(), api = %config.api_base_url, "starting racedesk");

    let api = ApiClient::from_config(&config)?;
    let mut app = app::RaceDeskApp::new(&config, api);
    app.run().await
}

/// Log to `logs/racedesk.log`; the terminal belongs to the UI.
fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("racedesk.log"))?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
