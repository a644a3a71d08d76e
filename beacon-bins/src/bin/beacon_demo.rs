//! Beacon demo service
//!
//! This binary combines:
//! - CountingAllocator as the global allocator (live memory statistics)
//! - BufferedTransport (journal file or log output)
//! - MetricsManager with registration and heartbeat
//! - A small hyper server wrapped in MetricsService
//!
//! Stops on Ctrl-C.

use anyhow::{Context, Result};
use beacon_bins::common::{build_info, build_transport, load_config, print_stats, CommonArgs};
use beacon_bins::server::DemoServer;
use beacon_core::manager::MetricsManager;
use beacon_core::monitoring::TelemetryMetrics;
use beacon_core::stats::CountingAllocator;
use beacon_core::utils::init_logger;
use clap::Parser;
use std::sync::Arc;

#[global_allocator]
static GLOBAL: CountingAllocator = CountingAllocator::system();

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = CommonArgs::parse();
    let config = load_config(&args)?;

    // Initialize logging
    init_logger(&config.logging)?;

    tracing::info!("=== Beacon: demo service ===");

    let metrics = Arc::new(TelemetryMetrics::new().context("Failed to register metrics")?);
    let transport = Arc::new(build_transport(&config.transport, metrics.clone())?);

    let manager = Arc::new(
        MetricsManager::new(&config.telemetry, transport.clone())?.with_metrics(metrics.clone()),
    );
    tracing::info!("Telemetry enabled: {}", manager.is_enabled());

    manager.spawn_registration(build_info());
    let heartbeat = manager.spawn_heartbeat();

    let server = DemoServer::new(args.listen, manager.clone(), metrics);
    server
        .serve(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("Received Ctrl-C, shutting down"),
                Err(e) => tracing::error!("Failed to listen for Ctrl-C: {}", e),
            }
        })
        .await?;

    manager.shutdown();
    heartbeat.await.context("Heartbeat task panicked")?;

    print_stats(&transport);

    Ok(())
}
