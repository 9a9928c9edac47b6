use std::path::PathBuf;

use anyhow::Context;
use tracing::{info, warn};

use fogpass::config::{default_config_path, load_config};
use fogpass::Config;
use fogpass_server::{build_router, telemetry, AppState};

const CONFIG_ENV: &str = "FOGPASS_CONFIG";

/// `FOGPASS_CONFIG`, then the per-user config file, then built-in defaults.
fn resolve_config() -> anyhow::Result<(Config, Option<PathBuf>)> {
    if let Some(path) = std::env::var_os(CONFIG_ENV).map(PathBuf::from) {
        let config = load_config(&path)
            .with_context(|| format!("loading config from {}", path.display()))?;
        return Ok((config, Some(path)));
    }
    match default_config_path() {
        Some(path) if path.exists() => {
            let config = load_config(&path)
                .with_context(|| format!("loading config from {}", path.display()))?;
            Ok((config, Some(path)))
        }
        _ => Ok((Config::default(), None)),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (config, source) = resolve_config()?;
    telemetry::init_tracing(config.json_logs)?;

    match &source {
        Some(path) => info!("Loaded config from {}", path.display()),
        None => info!("No config file found, using defaults"),
    }

    let metrics = if config.metrics_enabled {
        Some(telemetry::install_metrics()?)
    } else {
        None
    };

    let state = AppState::from_config(&config, metrics)?;
    let pool = state.pool.clone();
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("binding {}", config.bind_address))?;
    info!(
        address = %config.bind_address,
        workers = config.max_concurrent_jobs,
        queue = config.queue_capacity(),
        "Server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Draining ingest pool");
    tokio::task::spawn_blocking(move || pool.wait()).await?;
    info!("Stopped");
    Ok(())
}
