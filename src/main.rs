//! # AZ Failover Controller
//!
//! Keeps CAST AI node templates pinned to a healthy AWS availability zone.
//!
//! ## Overview
//!
//! Every cycle the controller:
//!
//! 1. **Scans zones** - Probes the configured zones in priority order until one reports `available`
//! 2. **Reconciles templates** - Sets `constraints.azs` of every selected node template to that zone
//! 3. **Waits** - Sleeps the cycle interval, then starts over
//!
//! ## Configuration
//!
//! Required: `API_KEY`, `CLUSTER_ID`, `NODE_TEMPLATE_NAMES`, `AZ_LIST`.
//! Optional tuning knobs are documented on [`ControllerConfig`].

use anyhow::{Context, Result};
use az_failover_controller::catalog::{CastAiCatalog, TemplateCatalog};
use az_failover_controller::config::{ClusterConfig, ControllerConfig};
use az_failover_controller::controller::shutdown::{Shutdown, ShutdownTrigger};
use az_failover_controller::controller::status::{
    FileStatusSink, NoopStatusSink, ZoneStatusSink,
};
use az_failover_controller::controller::{ControlLoop, ReconciliationEngine, ZoneScanner};
use az_failover_controller::observability::{init_logging, metrics};
use az_failover_controller::provider::aws::Ec2ZoneProbe;
use az_failover_controller::provider::ZoneStateProbe;
use az_failover_controller::server::{start_server, ServerState};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(name = "az-failover-controller")]
#[command(about = "Pin CAST AI node templates to the first available AWS availability zone")]
struct Args {
    /// Run a single scan and reconciliation, then exit
    #[arg(long)]
    once: bool,

    /// Log planned node template updates without submitting them
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Configure rustls crypto provider FIRST, before any TLS operations
    // Both ring and aws-lc are linked through feature unification; pick ring
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        anyhow::bail!("Failed to install rustls crypto provider");
    }

    let args = Args::parse();
    let controller_config = ControllerConfig::from_env();
    init_logging(&controller_config);

    info!("Starting AZ Failover Controller");

    let cluster = match ClusterConfig::from_env() {
        Ok(cluster) => cluster,
        Err(e) => {
            error!("Configuration error: {}", e);
            return Ok(());
        }
    };
    info!(
        "Cluster {}: {} node templates selected, {} candidate zones",
        cluster.cluster_id,
        cluster.selector.len(),
        cluster.zones.len()
    );
    if args.dry_run {
        warn!("Dry-run mode: node templates will not be modified");
    }

    let server_state = Arc::new(ServerState::default());
    if controller_config.enable_metrics {
        metrics::register_metrics().context("Failed to register metrics")?;

        let port = controller_config.metrics_port;
        let state = Arc::clone(&server_state);
        tokio::spawn(async move {
            if let Err(e) = start_server(port, state).await {
                error!("HTTP server error: {}", e);
            }
        });
    }

    let probe: Arc<dyn ZoneStateProbe> =
        Arc::new(Ec2ZoneProbe::new(controller_config.ec2_endpoint.clone()).await);
    let catalog: Arc<dyn TemplateCatalog> = Arc::new(CastAiCatalog::new(
        &controller_config.castai_api_url,
        cluster.api_key.clone(),
        controller_config.http_timeout(),
    )?);
    let status: Arc<dyn ZoneStatusSink> = if controller_config.status_dump_enabled {
        Arc::new(
            FileStatusSink::new(&controller_config.status_dir).with_context(|| {
                format!(
                    "Failed to create status directory {}",
                    controller_config.status_dir.display()
                )
            })?,
        )
    } else {
        Arc::new(NoopStatusSink)
    };

    let scanner = ZoneScanner::new(probe, status, controller_config.scan_retry_interval())
        .with_probe_interval(controller_config.probe_interval())
        .with_max_passes(controller_config.scan_max_passes);
    let engine = ReconciliationEngine::new(catalog, controller_config.update_delay())
        .with_dry_run(args.dry_run)
        .with_clear_on_empty(controller_config.clear_azs_when_none_available);
    let mut control_loop =
        ControlLoop::new(&cluster, scanner, engine, controller_config.cycle_interval());

    let (trigger, mut shutdown) = Shutdown::channel();
    tokio::spawn(handle_signals(trigger, Arc::clone(&server_state)));

    server_state.set_ready(true);
    if args.once {
        match control_loop.run_cycle(&mut shutdown).await {
            Some(report) => info!(
                "Single cycle complete: {} updated, {} unchanged, {} failed",
                report.updated(),
                report.unchanged(),
                report.failed()
            ),
            None => info!("Single cycle cancelled before a zone was selected"),
        }
    } else {
        control_loop.run(&mut shutdown).await;
    }
    server_state.set_ready(false);

    info!("AZ Failover Controller stopped");
    Ok(())
}

/// Wait for SIGINT or SIGTERM, then stop the control loop
async fn handle_signals(trigger: ShutdownTrigger, server_state: Arc<ServerState>) {
    wait_for_signal().await;
    info!("Received shutdown signal (SIGINT/SIGTERM), initiating graceful shutdown...");
    server_state.set_ready(false);
    trigger.trigger();
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        Err(e) => {
            warn!("Failed to install SIGTERM handler: {}", e);
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
