//! Fetch and reduce the whole pyramid.

use std::sync::Arc;
use tracing::{info, warn};
use wmscache::config::ConfigFile;
use wmscache::controller::{CacheController, PipelineHandle, PipelinePhase, PipelineReport};
use wmscache::provider::ReqwestMapClient;

use super::common::{print_row, start_logging};
use crate::error::CliError;

/// Run the pipeline to completion, cancelling on Ctrl-C.
pub fn run(config: &ConfigFile, workers: Option<usize>) -> Result<(), CliError> {
    let _logging = start_logging(config, "build")?;

    let runtime = tokio::runtime::Runtime::new().map_err(CliError::Runtime)?;
    let report = runtime.block_on(build(config, workers))?;

    println!();
    println!("Level 0 fetch:");
    print_row("Fetched", report.fetch.fetched);
    print_row("Empty", report.fetch.empty);
    print_row("Already stored", report.fetch.skipped);
    print_row("Abandoned", report.fetch.abandoned);
    if let Some(mip) = report.mip {
        println!("Mip construction:");
        print_row("Written", mip.written);
        print_row("Empty", mip.empty);
        print_row("Levels completed", mip.levels_completed);
    }

    if report.fetch.cancelled || report.mip.is_some_and(|mip| mip.cancelled) {
        return Err(CliError::Unfinished("cancelled".to_string()));
    }
    if !report.fetch.is_complete() {
        return Err(CliError::Unfinished(format!(
            "{} tiles could not be fetched",
            report.fetch.abandoned
        )));
    }

    Ok(())
}

async fn build(config: &ConfigFile, workers: Option<usize>) -> Result<PipelineReport, CliError> {
    let controller = CacheController::from_config(config)?;
    let client = Arc::new(ReqwestMapClient::new(
        &config.source_endpoint(),
        config.source.timeout,
    )?);

    let mut options = config.pipeline_options();
    if let Some(workers) = workers {
        options.workers = workers.max(1);
    }
    info!(
        source = %client.base_url(),
        workers = options.workers,
        "Starting pipeline"
    );

    let handle = controller.start(client, options);
    tokio::spawn(log_phases(handle.subscribe()));
    cancel_on_ctrl_c(&handle);

    let report = handle.wait().await?;
    Ok(report)
}

async fn log_phases(mut phase_rx: tokio::sync::watch::Receiver<PipelinePhase>) {
    loop {
        let phase = *phase_rx.borrow_and_update();
        info!(%phase, "Pipeline phase");
        if phase.is_terminal() || phase_rx.changed().await.is_err() {
            break;
        }
    }
}

fn cancel_on_ctrl_c(handle: &PipelineHandle) {
    let token = handle.cancellation_token();
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            result = tokio::signal::ctrl_c() => {
                match result {
                    Ok(()) => {
                        warn!("Interrupted, cancelling pipeline");
                        token.cancel();
                    }
                    Err(e) => warn!(error = %e, "Could not listen for Ctrl-C"),
                }
            }
        }
    });
}
