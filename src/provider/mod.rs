//! # Provider Modules
//!
//! Cloud provider integrations for availability zone state.
//!
//! Each provider implements [`ZoneStateProbe`], a pure query with no state
//! kept between calls.

use crate::error::ProbeError;
use crate::zone::{ZoneId, ZoneState};
use async_trait::async_trait;

/// Provider trait for availability zone state queries
#[async_trait]
pub trait ZoneStateProbe: Send + Sync {
    /// Query the current state of a single zone
    ///
    /// An error means the state could not be determined. Callers must treat
    /// it as [`ZoneState::Unknown`], never as a confirmed outage.
    async fn probe(&self, zone: &ZoneId) -> Result<ZoneState, ProbeError>;
}

// Provider implementations
pub mod aws;
