#![doc = include_str!("../README.md")]

mod sim;

use clap::Parser;
use galley::{Coordinator, SimulatedWork, Simulator};
use sim::config::{CliArgs, SimConfig};
use sim::report::Summary;
use sim::telemetry::init_telemetry;
use tokio::signal;
use tokio_util::sync::CancellationToken;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = SimConfig::try_from(args)?;

    init_telemetry()?;
    log_startup_info(&config);

    let simulator = Simulator::new(config.time_scale);
    let work = SimulatedWork::new(simulator, config.pipeline.work_base)
        .with_failure_rate(config.failure_rate);
    let coordinator = Coordinator::new(config.pipeline.clone(), work).with_simulator(simulator);

    let signals = tokio::spawn(shutdown_signal(coordinator.shutdown_token()));
    let result = coordinator.run().await;
    signals.abort();
    let report = result?;

    if config.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", Summary(&report));
    }

    Ok(())
}

fn log_startup_info(config: &SimConfig) {
    if cfg!(debug_assertions) {
        tracing::info!("Opening the restaurant with full config: {:#?}", config);
    } else {
        tracing::info!(
            customers = config.pipeline.requesters.len(),
            cooks = config.pipeline.workers.len(),
            capacity = config.pipeline.capacity,
            time_scale = config.time_scale,
            "Opening the restaurant"
        );
    }
}

/// Waits for Ctrl+C or SIGTERM, then asks requesters to stop placing items.
async fn shutdown_signal(shutdown: CancellationToken) {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                core::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = core::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            core::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C signal"),
        () = terminate => tracing::info!("Received SIGTERM signal"),
    }

    tracing::info!("No new orders; serving what was already taken");
    shutdown.cancel();
}
