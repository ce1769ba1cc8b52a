// src/main.rs
use afit_packer::api;
use afit_packer::config::{AppConfig, LogConfig};

#[tokio::main]
async fn main() {
    if let Err(err) = dotenvy::dotenv() {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("⚠️ Could not load .env: {}", err);
        }
    }

    let log_config = LogConfig::from_env();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_config.level())
        .init();

    let app_config = AppConfig::from_env();
    let api_config = app_config.api.clone();
    let optimizer_config = app_config.optimizer.clone();

    tracing::info!("Packing service starting");
    if let Err(err) = api::start_api_server(api_config, optimizer_config).await {
        tracing::error!(error = %err, "API server terminated with an error");
        std::process::exit(1);
    }
}
