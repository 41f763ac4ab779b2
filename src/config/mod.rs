//! # Configuration
//!
//! - `cluster`: required settings naming the cluster, templates and zones
//! - `controller`: optional timing, endpoint and observability settings

pub mod cluster;
pub mod controller;

pub use cluster::{ApiKey, ClusterConfig, TemplateSelector};
pub use controller::ControllerConfig;
