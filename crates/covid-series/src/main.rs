mod bootstrap;
mod report;

use anyhow::{Context, Result};
use covid_core::settings::Settings;
use covid_data::analysis::ingest_all;
use covid_runtime::orchestrator::RefreshOrchestrator;

use crate::report::{render, ReportRequest};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("covid-series v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "View: {}, Granularity: {}, Metric: {}",
        settings.view,
        settings.granularity,
        settings.metric
    );

    let request = ReportRequest::from_settings(&settings)?;
    let data_path = settings
        .data_path
        .clone()
        .or_else(bootstrap::discover_data_path);

    if settings.watch {
        tracing::info!("Watching for dataset updates every {}s", settings.refresh_rate);

        let orchestrator = RefreshOrchestrator::new(u64::from(settings.refresh_rate), data_path);
        let (mut rx, handle) = orchestrator.start();

        loop {
            tokio::select! {
                snapshot = rx.recv() => {
                    let Some(snapshot) = snapshot else { break };
                    if let Some(err) = &snapshot.last_error {
                        tracing::warn!("Showing previous data; refresh failed: {}", err);
                    }
                    match render(&snapshot.bundle, &request) {
                        Ok(out) => println!("{out}"),
                        Err(e) => tracing::error!("{:#}", e),
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Ctrl+C received; stopping refresh task");
                    break;
                }
            }
        }
        handle.abort();
    } else {
        let bundle = tokio::task::spawn_blocking(move || ingest_all(data_path.as_deref()))
            .await?
            .context("failed to ingest datasets")?;
        println!("{}", render(&bundle, &request)?);
    }

    Ok(())
}
