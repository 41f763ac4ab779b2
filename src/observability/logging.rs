//! # Logging
//!
//! Tracing subscriber setup. `RUST_LOG` takes precedence over `LOG_LEVEL`.

use crate::config::ControllerConfig;
use tracing_subscriber::EnvFilter;

/// Build the default filter directive for a `LOG_LEVEL` value
fn default_directive(log_level: &str) -> String {
    let level = match log_level.trim().to_ascii_lowercase().as_str() {
        "error" => "error",
        "warn" | "warning" => "warn",
        "debug" => "debug",
        "trace" => "trace",
        _ => "info",
    };
    format!("az_failover_controller={level},tower_http=warn")
}

/// Initialize the global tracing subscriber
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging(config: &ControllerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(&config.log_level)));

    let result = if config.log_format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    };

    if let Err(e) = result {
        eprintln!("Tracing subscriber already initialized: {e}");
    }
}
