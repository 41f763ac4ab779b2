//! # Cluster Configuration
//!
//! The required settings identifying what to reconcile: the CAST AI cluster,
//! its API key, the node templates eligible for mutation and the ordered list
//! of candidate availability zones.
//!
//! All four are required. Any missing value is a [`ConfigError`] and the
//! process exits without entering the control loop.

use crate::error::ConfigError;
use crate::zone::ZoneId;
use std::collections::BTreeSet;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub const API_KEY_VAR: &str = "API_KEY";
pub const CLUSTER_ID_VAR: &str = "CLUSTER_ID";
pub const NODE_TEMPLATE_NAMES_VAR: &str = "NODE_TEMPLATE_NAMES";
pub const AZ_LIST_VAR: &str = "AZ_LIST";

/// CAST AI API key
///
/// Wiped from memory on drop and never printed.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Names of the node templates the controller may mutate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateSelector(BTreeSet<String>);

impl TemplateSelector {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl fmt::Display for TemplateSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().collect();
        write!(f, "{}", names.join(","))
    }
}

/// Static description of the cluster being reconciled
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    pub api_key: ApiKey,
    pub cluster_id: String,
    pub selector: TemplateSelector,
    /// Candidate zones in priority order
    pub zones: Vec<ZoneId>,
}

impl ClusterConfig {
    /// Load the cluster configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any required variable is unset or holds no values.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load the cluster configuration from an arbitrary key lookup
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any required key is unset or holds no values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = required(&lookup, API_KEY_VAR)?;
        let cluster_id = required(&lookup, CLUSTER_ID_VAR)?;
        let template_names = required_list(&lookup, NODE_TEMPLATE_NAMES_VAR)?;
        let zones = required_list(&lookup, AZ_LIST_VAR)?;

        if let Some(zone) = zones.iter().find(|z| z.chars().count() < 2) {
            return Err(ConfigError::Invalid {
                var: AZ_LIST_VAR,
                reason: format!("'{zone}' is not an availability zone identifier"),
            });
        }

        Ok(Self {
            api_key: ApiKey::new(api_key),
            cluster_id,
            selector: TemplateSelector::new(template_names),
            zones: zones.into_iter().map(ZoneId::new).collect(),
        })
    }
}

fn required<F>(lookup: &F, var: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(var).ok_or(ConfigError::Missing(var))?;
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::Missing(var));
    }
    Ok(value.to_string())
}

/// Comma-separated list, entries trimmed, empty entries dropped, order kept
fn required_list<F>(lookup: &F, var: &'static str) -> Result<Vec<String>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(var).ok_or(ConfigError::Missing(var))?;
    let items: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect();
    if items.is_empty() {
        return Err(ConfigError::Empty(var));
    }
    Ok(items)
}
