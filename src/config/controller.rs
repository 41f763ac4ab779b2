//! # Controller Configuration
//!
//! Timing, endpoint and observability settings loaded from environment variables.

use crate::constants::{
    DEFAULT_CASTAI_API_URL, DEFAULT_CYCLE_INTERVAL_SECS, DEFAULT_HTTP_TIMEOUT_SECS,
    DEFAULT_METRICS_PORT, DEFAULT_PROBE_INTERVAL_MS, DEFAULT_SCAN_RETRY_INTERVAL_SECS,
    DEFAULT_STATUS_DIR, DEFAULT_UPDATE_DELAY_SECS,
};
use std::path::PathBuf;
use std::time::Duration;

/// Controller-level configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
/// Loaded once at startup and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Delay between the end of one reconciliation and the next scan (seconds)
    pub cycle_interval_secs: u64,
    /// Delay before re-scanning after a pass found no available zone (seconds)
    pub scan_retry_interval_secs: u64,
    /// Delay between probes of consecutive zones in one pass (milliseconds)
    pub probe_interval_ms: u64,
    /// Give up a scan after this many full passes. `None` scans forever.
    pub scan_max_passes: Option<u32>,
    /// Delay after each successful template update (seconds)
    pub update_delay_secs: u64,
    /// Write an empty AZ list to selected templates when no zone is available
    pub clear_azs_when_none_available: bool,
    /// CAST AI cluster API base URL
    pub castai_api_url: String,
    /// Per-request timeout for CAST AI calls (seconds)
    pub http_timeout_secs: u64,
    /// Override endpoint for EC2 calls (e.g. a local mock)
    pub ec2_endpoint: Option<String>,
    /// Directory receiving one diagnostic record per zone
    pub status_dir: PathBuf,
    /// Write per-zone diagnostic records
    pub status_dump_enabled: bool,
    /// Port of the metrics and health probe server
    pub metrics_port: u16,
    /// Enable metrics collection and the HTTP server
    pub enable_metrics: bool,
    /// Global log level (ERROR, WARN, INFO, DEBUG, TRACE)
    pub log_level: String,
    /// Log format (json, text)
    pub log_format: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            cycle_interval_secs: DEFAULT_CYCLE_INTERVAL_SECS,
            scan_retry_interval_secs: DEFAULT_SCAN_RETRY_INTERVAL_SECS,
            probe_interval_ms: DEFAULT_PROBE_INTERVAL_MS,
            scan_max_passes: None,
            update_delay_secs: DEFAULT_UPDATE_DELAY_SECS,
            clear_azs_when_none_available: false,
            castai_api_url: DEFAULT_CASTAI_API_URL.to_string(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            ec2_endpoint: None,
            status_dir: PathBuf::from(DEFAULT_STATUS_DIR),
            status_dump_enabled: true,
            metrics_port: DEFAULT_METRICS_PORT,
            enable_metrics: true,
            log_level: "INFO".to_string(),
            log_format: "text".to_string(),
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    ///
    /// Unparseable values fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            cycle_interval_secs: parse_or_default(
                &lookup,
                "CYCLE_INTERVAL_SECS",
                defaults.cycle_interval_secs,
            ),
            scan_retry_interval_secs: parse_or_default(
                &lookup,
                "SCAN_RETRY_INTERVAL_SECS",
                defaults.scan_retry_interval_secs,
            ),
            probe_interval_ms: parse_or_default(
                &lookup,
                "PROBE_INTERVAL_MS",
                defaults.probe_interval_ms,
            ),
            scan_max_passes: lookup("SCAN_MAX_PASSES")
                .and_then(|v| v.trim().parse::<u32>().ok())
                .filter(|passes| *passes > 0),
            update_delay_secs: parse_or_default(
                &lookup,
                "UPDATE_DELAY_SECS",
                defaults.update_delay_secs,
            ),
            clear_azs_when_none_available: bool_or_default(
                &lookup,
                "CLEAR_AZS_WHEN_NONE_AVAILABLE",
                defaults.clear_azs_when_none_available,
            ),
            castai_api_url: lookup("CASTAI_API_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.castai_api_url),
            http_timeout_secs: parse_or_default(
                &lookup,
                "HTTP_TIMEOUT_SECS",
                defaults.http_timeout_secs,
            ),
            ec2_endpoint: lookup("AWS_EC2_ENDPOINT").filter(|v| !v.is_empty()),
            status_dir: lookup("STATUS_DIR")
                .filter(|v| !v.is_empty())
                .map_or(defaults.status_dir, PathBuf::from),
            status_dump_enabled: bool_or_default(
                &lookup,
                "STATUS_DUMP_ENABLED",
                defaults.status_dump_enabled,
            ),
            metrics_port: parse_or_default(&lookup, "METRICS_PORT", defaults.metrics_port),
            enable_metrics: bool_or_default(&lookup, "ENABLE_METRICS", defaults.enable_metrics),
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format: lookup("LOG_FORMAT").unwrap_or(defaults.log_format),
        }
    }

    /// Get cycle interval duration
    #[must_use]
    pub fn cycle_interval(&self) -> Duration {
        Duration::from_secs(self.cycle_interval_secs)
    }

    /// Get scan retry interval duration
    #[must_use]
    pub fn scan_retry_interval(&self) -> Duration {
        Duration::from_secs(self.scan_retry_interval_secs)
    }

    /// Get inter-probe interval duration
    #[must_use]
    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }

    /// Get inter-update delay duration
    #[must_use]
    pub fn update_delay(&self) -> Duration {
        Duration::from_secs(self.update_delay_secs)
    }

    /// Get HTTP request timeout duration
    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// Read value and parse it, or return default value
fn parse_or_default<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Read value as boolean or return default
fn bool_or_default<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).map_or(default, |v| {
        let v_lower = v.trim().to_lowercase();
        v_lower == "true" || v_lower == "1" || v_lower == "yes" || v_lower == "on"
    })
}
