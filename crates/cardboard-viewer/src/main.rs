use std::process::ExitCode;

use anyhow::{Context, Result};

use cardboard_engine::device::GpuInit;
use cardboard_engine::logging::init_logging;
use cardboard_engine::window::Runtime;
use cardboard_viewer::{config, ViewerApp, ViewerConfig};

fn main() -> ExitCode {
    let (config, origin) = config::load();
    init_logging(config.logging_config());
    origin.log();

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: ViewerConfig) -> Result<()> {
    // Asset fetches and sensor reads; rendering stays on the main thread.
    let tasks = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("cardboard-io")
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;
    let handle = tasks.handle().clone();

    Runtime::run(config.runtime_config(), GpuInit::default(), move |proxy| {
        ViewerApp::new(config, handle, proxy)
    })?;

    log::info!("viewer closed");
    Ok(())
}
