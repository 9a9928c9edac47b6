use anyhow::Context;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

use fogpass::PipelineMetrics;

const DEFAULT_FILTER: &str = "info,fogpass=debug,fogpass_server=debug";

/// Installs the global subscriber and routes `log` records into it.
/// `RUST_LOG` overrides the default filter.
pub fn init_tracing(json: bool) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if json {
        let subscriber = registry.with(tracing_subscriber::fmt::layer().json());
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = registry.with(tracing_subscriber::fmt::layer().with_target(true));
        tracing::subscriber::set_global_default(subscriber)
    };
    installed.context("tracing subscriber already installed")?;

    tracing_log::LogTracer::init().context("log bridge already installed")?;
    Ok(())
}

/// Installs the Prometheus recorder and registers the pipeline metrics.
pub fn install_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install Prometheus recorder")?;
    PipelineMetrics::register();
    Ok(handle)
}
