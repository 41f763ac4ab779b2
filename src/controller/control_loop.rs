//! # Control Loop
//!
//! Top-level driver: scan for a zone, reconcile node templates against it,
//! wait the cycle interval, repeat.
//!
//! ```text
//! Scanning ──scan result──▶ Reconciling(set) ──report──▶ Waiting ──interval──▶ Scanning
//!     │                                                      │
//!     └──────────────── shutdown ──▶ Stopped ◀── shutdown ───┘
//! ```
//!
//! `Stopped` is only reached through an external shutdown request.

use crate::config::{ClusterConfig, TemplateSelector};
use crate::controller::reconciler::{ReconciliationEngine, ReconciliationReport};
use crate::controller::scanner::ZoneScanner;
use crate::controller::shutdown::Shutdown;
use crate::observability::metrics;
use crate::zone::{ActiveZoneSet, ZoneId};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopState {
    Scanning,
    Reconciling(ActiveZoneSet),
    Waiting,
    Stopped,
}

#[derive(Debug)]
pub struct ControlLoop {
    cluster_id: String,
    selector: TemplateSelector,
    zones: Vec<ZoneId>,
    scanner: ZoneScanner,
    engine: ReconciliationEngine,
    cycle_interval: Duration,
    state: LoopState,
    last_report: Option<ReconciliationReport>,
}

impl ControlLoop {
    #[must_use]
    pub fn new(
        cluster: &ClusterConfig,
        scanner: ZoneScanner,
        engine: ReconciliationEngine,
        cycle_interval: Duration,
    ) -> Self {
        Self {
            cluster_id: cluster.cluster_id.clone(),
            selector: cluster.selector.clone(),
            zones: cluster.zones.clone(),
            scanner,
            engine,
            cycle_interval,
            state: LoopState::Scanning,
            last_report: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> &LoopState {
        &self.state
    }

    /// Report of the most recent reconciliation pass
    #[must_use]
    pub fn last_report(&self) -> Option<&ReconciliationReport> {
        self.last_report.as_ref()
    }

    /// Perform one state transition
    pub async fn step(&mut self, shutdown: &mut Shutdown) -> &LoopState {
        let next = match std::mem::replace(&mut self.state, LoopState::Stopped) {
            LoopState::Scanning => {
                match self.scanner.scan(&self.zones, shutdown).await.active_zone_set() {
                    Some(set) => {
                        metrics::set_active_zone(set.zone().map(ZoneId::as_str));
                        LoopState::Reconciling(set)
                    }
                    None => LoopState::Stopped,
                }
            }
            LoopState::Reconciling(set) => {
                let report = self
                    .engine
                    .reconcile(&self.cluster_id, &self.selector, &set, shutdown)
                    .await;
                metrics::increment_cycles();
                let interrupted = report.interrupted;
                self.last_report = Some(report);
                if interrupted || shutdown.is_requested() {
                    LoopState::Stopped
                } else {
                    LoopState::Waiting
                }
            }
            LoopState::Waiting => {
                debug!(
                    "Waiting {} seconds before the next cycle",
                    self.cycle_interval.as_secs()
                );
                if shutdown.sleep(self.cycle_interval).await {
                    LoopState::Scanning
                } else {
                    LoopState::Stopped
                }
            }
            LoopState::Stopped => LoopState::Stopped,
        };
        self.state = next;
        &self.state
    }

    /// Run a single scan and reconciliation pass
    ///
    /// Returns `None` if shutdown interrupted the scan before a result was found.
    pub async fn run_cycle(&mut self, shutdown: &mut Shutdown) -> Option<ReconciliationReport> {
        self.state = LoopState::Scanning;
        self.last_report = None;
        while !matches!(self.state, LoopState::Waiting | LoopState::Stopped) {
            self.step(shutdown).await;
        }
        self.last_report.clone()
    }

    /// Run until shutdown is requested
    pub async fn run(&mut self, shutdown: &mut Shutdown) {
        info!(
            "Starting control loop for cluster {} over zones {:?}",
            self.cluster_id,
            self.zones.iter().map(ZoneId::as_str).collect::<Vec<_>>()
        );
        while self.step(shutdown).await != &LoopState::Stopped {}
        info!("Control loop stopped");
    }
}
