//! # Zone Status Records
//!
//! Diagnostic side channel: the latest observed state of every probed zone.
//!
//! One record per zone, overwritten on every probe. The control loop never
//! reads these back; they exist for operators and external tooling.

use crate::zone::{ZoneId, ZoneState};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Destination for per-zone status records
pub trait ZoneStatusSink: Send + Sync {
    fn record(&self, zone: &ZoneId, state: ZoneState);
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ZoneStatusRecord {
    pub zone: ZoneId,
    pub state: ZoneState,
    pub observed_at: DateTime<Utc>,
}

/// Writes `<dir>/<zone>.json` for every observation
#[derive(Debug, Clone)]
pub struct FileStatusSink {
    dir: PathBuf,
}

impl FileStatusSink {
    /// Create the sink, creating `dir` if needed
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        info!(
            "Output directory '{}' created or already exists",
            dir.display()
        );
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn path_for(&self, zone: &ZoneId) -> PathBuf {
        self.dir.join(format!("{zone}.json"))
    }

    fn write(&self, record: &ZoneStatusRecord) -> std::io::Result<()> {
        let body = serde_json::to_vec_pretty(record)?;
        std::fs::write(self.path_for(&record.zone), body)
    }
}

impl ZoneStatusSink for FileStatusSink {
    fn record(&self, zone: &ZoneId, state: ZoneState) {
        let record = ZoneStatusRecord {
            zone: zone.clone(),
            state,
            observed_at: Utc::now(),
        };
        match self.write(&record) {
            Ok(()) => debug!("State of availability zone '{}' has been recorded", zone),
            // Diagnostics only; a failed write never affects the scan
            Err(e) => warn!("Failed to record state of zone '{}': {}", zone, e),
        }
    }
}

/// Sink used when status dumps are disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStatusSink;

impl ZoneStatusSink for NoopStatusSink {
    fn record(&self, _zone: &ZoneId, _state: ZoneState) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_is_written_and_overwritten() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = FileStatusSink::new(tmp.path().join("az-availability")).unwrap();
        let zone = ZoneId::new("us-east-1a");

        sink.record(&zone, ZoneState::Unavailable);
        let first: serde_json::Value =
            serde_json::from_slice(&std::fs::read(sink.path_for(&zone)).unwrap()).unwrap();
        assert_eq!(first["zone"], "us-east-1a");
        assert_eq!(first["state"], "unavailable");
        assert!(first["observedAt"].is_string());

        sink.record(&zone, ZoneState::Available);
        let second: serde_json::Value =
            serde_json::from_slice(&std::fs::read(sink.path_for(&zone)).unwrap()).unwrap();
        assert_eq!(second["state"], "available");

        // One file per zone, never accumulated history
        assert_eq!(std::fs::read_dir(sink.dir()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = FileStatusSink::new(tmp.path()).unwrap();
        std::fs::remove_dir_all(tmp.path()).unwrap();
        // Must not panic even though the directory is gone
        sink.record(&ZoneId::new("us-east-1a"), ZoneState::Unknown);
    }
}
