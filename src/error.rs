//! # Errors
//!
//! Error taxonomy for the controller.
//!
//! Only [`ConfigError`] is fatal, and only at startup. Every other kind is
//! recoverable: the next polling cycle is the retry mechanism.

use crate::zone::ZoneId;
use thiserror::Error;

/// Missing or invalid startup configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),
    #[error("environment variable {0} does not contain any values")]
    Empty(&'static str),
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// A single zone state query failed
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to query state of zone {zone} in region {region}: {message}")]
    Query {
        zone: ZoneId,
        region: String,
        message: String,
    },
    #[error("no availability zone record returned for {zone}")]
    NotFound { zone: ZoneId },
}

/// Listing node templates for the cluster failed
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request for node templates of cluster {cluster_id} failed: {source}")]
    Request {
        cluster_id: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("listing node templates of cluster {cluster_id} returned HTTP {status}: {body}")]
    Status {
        cluster_id: String,
        status: u16,
        body: String,
    },
    #[error("failed to decode node templates of cluster {cluster_id}: {message}")]
    Decode { cluster_id: String, message: String },
}

/// Updating a single node template failed
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("request to update node template {template} failed: {source}")]
    Request {
        template: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("updating node template {template} returned HTTP {status}: {body}")]
    Status {
        template: String,
        status: u16,
        body: String,
    },
    #[error("failed to decode updated node template {template}: {message}")]
    Decode { template: String, message: String },
}
