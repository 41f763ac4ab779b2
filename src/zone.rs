//! # Zones
//!
//! Availability zone identifiers, probe states and the reconciliation target.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Availability zone identifier, e.g. `us-east-1a`
///
/// Identifiers are expected to end in a single-letter zone suffix; the region
/// is everything before it. This is not validated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(String);

impl ZoneId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Region the zone belongs to (identifier minus its final character)
    #[must_use]
    pub fn region(&self) -> &str {
        let mut chars = self.0.char_indices();
        match chars.next_back() {
            Some((idx, _)) => &self.0[..idx],
            None => "",
        }
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ZoneId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ZoneId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Observed state of a zone for one probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneState {
    Available,
    Unavailable,
    /// The probe failed or returned a state we do not recognise.
    /// Never treated as a confirmed outage.
    Unknown,
}

impl ZoneState {
    /// Map an EC2 `AvailabilityZoneState` string onto a zone state
    ///
    /// Only `available` is usable. `information`, `impaired`, `unavailable`
    /// and `constrained` are confirmed-not-usable states.
    #[must_use]
    pub fn from_api(state: &str) -> Self {
        match state {
            "available" => Self::Available,
            "information" | "impaired" | "unavailable" | "constrained" => Self::Unavailable,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Unavailable => "unavailable",
            Self::Unknown => "unknown",
        }
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}

impl fmt::Display for ZoneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reconciliation target: either no zone or exactly one zone
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveZoneSet(Option<ZoneId>);

impl ActiveZoneSet {
    #[must_use]
    pub fn empty() -> Self {
        Self(None)
    }

    #[must_use]
    pub fn single(zone: ZoneId) -> Self {
        Self(Some(zone))
    }

    #[must_use]
    pub fn zone(&self) -> Option<&ZoneId> {
        self.0.as_ref()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// The AZ constraint list a template should carry for this target
    #[must_use]
    pub fn to_az_list(&self) -> Vec<String> {
        self.0.iter().map(|z| z.as_str().to_owned()).collect()
    }

    /// Whether a template's current AZ list already equals this target
    ///
    /// For a single-zone target this requires exactly one entry equal to the
    /// zone. An empty target matches only an empty list.
    #[must_use]
    pub fn is_satisfied_by(&self, current: &[String]) -> bool {
        match &self.0 {
            Some(zone) => current.len() == 1 && current[0] == zone.as_str(),
            None => current.is_empty(),
        }
    }
}

impl fmt::Display for ActiveZoneSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(zone) => write!(f, "[{zone}]"),
            None => f.write_str("[]"),
        }
    }
}
