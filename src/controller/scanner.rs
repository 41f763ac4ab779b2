//! # Zone Scanner
//!
//! Finds the first usable availability zone in priority order.
//!
//! A scan walks the configured zone list front to back, probing one zone at a
//! time. The first zone reporting `available` wins and the pass stops there.
//! If a full pass finds nothing, the scanner waits the retry interval and
//! starts again from the head of the list. Zone states are never cached
//! between passes.
//!
//! Probe failures are logged and recorded as `unknown`; they never end a scan.

use crate::controller::shutdown::Shutdown;
use crate::controller::status::ZoneStatusSink;
use crate::observability::metrics;
use crate::provider::ZoneStateProbe;
use crate::zone::{ActiveZoneSet, ZoneId, ZoneState};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Result of a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// First zone in list order that reported available
    Found(ZoneId),
    /// `max_passes` full passes found no available zone
    Exhausted { passes: u32 },
    /// Shutdown was requested while waiting
    Cancelled,
}

impl ScanOutcome {
    /// Reconciliation target for this outcome, `None` when cancelled
    #[must_use]
    pub fn active_zone_set(&self) -> Option<ActiveZoneSet> {
        match self {
            Self::Found(zone) => Some(ActiveZoneSet::single(zone.clone())),
            Self::Exhausted { .. } => Some(ActiveZoneSet::empty()),
            Self::Cancelled => None,
        }
    }
}

pub struct ZoneScanner {
    probe: Arc<dyn ZoneStateProbe>,
    status: Arc<dyn ZoneStatusSink>,
    retry_interval: Duration,
    probe_interval: Duration,
    max_passes: Option<u32>,
}

impl ZoneScanner {
    #[must_use]
    pub fn new(
        probe: Arc<dyn ZoneStateProbe>,
        status: Arc<dyn ZoneStatusSink>,
        retry_interval: Duration,
    ) -> Self {
        Self {
            probe,
            status,
            retry_interval,
            probe_interval: Duration::ZERO,
            max_passes: None,
        }
    }

    /// Space consecutive probes within one pass
    #[must_use]
    pub fn with_probe_interval(mut self, probe_interval: Duration) -> Self {
        self.probe_interval = probe_interval;
        self
    }

    /// Give up after `max_passes` full passes. `None` scans forever.
    #[must_use]
    pub fn with_max_passes(mut self, max_passes: Option<u32>) -> Self {
        self.max_passes = max_passes;
        self
    }

    /// Probe `zones` in order until one is available
    ///
    /// Without a pass bound this only returns on success or shutdown.
    pub async fn scan(&self, zones: &[ZoneId], shutdown: &mut Shutdown) -> ScanOutcome {
        let mut passes: u32 = 0;
        loop {
            if shutdown.is_requested() {
                return ScanOutcome::Cancelled;
            }

            passes = passes.saturating_add(1);
            metrics::increment_scan_passes();
            debug!("Starting zone scan pass {} over {} zones", passes, zones.len());

            match self.scan_pass(zones, shutdown).await {
                PassResult::Found(zone) => {
                    info!("Selected availability zone: {}", zone);
                    return ScanOutcome::Found(zone);
                }
                PassResult::Cancelled => return ScanOutcome::Cancelled,
                PassResult::NoneAvailable => {}
            }

            if self.max_passes.is_some_and(|max| passes >= max) {
                warn!(
                    "No available zone found after {} passes, giving up this cycle",
                    passes
                );
                return ScanOutcome::Exhausted { passes };
            }

            info!(
                "No available zones found, retrying in {} seconds",
                self.retry_interval.as_secs()
            );
            if !shutdown.sleep(self.retry_interval).await {
                return ScanOutcome::Cancelled;
            }
        }
    }

    async fn scan_pass(&self, zones: &[ZoneId], shutdown: &mut Shutdown) -> PassResult {
        for (idx, zone) in zones.iter().enumerate() {
            if idx > 0
                && !self.probe_interval.is_zero()
                && !shutdown.sleep(self.probe_interval).await
            {
                return PassResult::Cancelled;
            }

            let state = self.observe(zone).await;
            if state.is_available() {
                return PassResult::Found(zone.clone());
            }
        }
        PassResult::NoneAvailable
    }

    async fn observe(&self, zone: &ZoneId) -> ZoneState {
        let state = match self.probe.probe(zone).await {
            Ok(state) => state,
            Err(e) => {
                warn!("Error checking availability zone {}: {}", zone, e);
                metrics::increment_zone_probe_errors(zone.as_str());
                ZoneState::Unknown
            }
        };
        metrics::record_zone_probe(zone.as_str(), state.as_str());
        self.status.record(zone, state);
        state
    }
}

impl std::fmt::Debug for ZoneScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZoneScanner")
            .field("retry_interval", &self.retry_interval)
            .field("probe_interval", &self.probe_interval)
            .field("max_passes", &self.max_passes)
            .finish_non_exhaustive()
    }
}

enum PassResult {
    Found(ZoneId),
    NoneAvailable,
    Cancelled,
}
