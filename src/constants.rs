//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! These values represent reasonable defaults and can be overridden via
//! environment variables where applicable.

/// CAST AI cluster API base URL
pub const DEFAULT_CASTAI_API_URL: &str = "https://api.cast.ai/v1/kubernetes/clusters";

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Default delay between control loop cycles (seconds)
pub const DEFAULT_CYCLE_INTERVAL_SECS: u64 = 60;

/// Default delay before re-scanning the zone list after a pass found no available zone (seconds)
pub const DEFAULT_SCAN_RETRY_INTERVAL_SECS: u64 = 10;

/// Default delay between probes of consecutive zones within one pass (milliseconds)
pub const DEFAULT_PROBE_INTERVAL_MS: u64 = 0;

/// Default delay after a successful template update before the next one (seconds)
pub const DEFAULT_UPDATE_DELAY_SECS: u64 = 5;

/// Default timeout for a single CAST AI API request (seconds)
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Default directory for per-zone diagnostic records
pub const DEFAULT_STATUS_DIR: &str = "az-availability";

/// Header carrying the CAST AI API key
pub const API_KEY_HEADER: &str = "X-API-Key";
