//! AZ Failover Controller Library
//!
//! Keeps CAST AI node templates pinned to the first healthy AWS availability
//! zone in a configured priority list.
//! Tests are included in the module files and under `tests/`.

pub mod catalog;
pub mod config;
pub mod constants;
pub mod controller;
pub mod error;
pub mod observability;
pub mod provider;
pub mod server;
pub mod zone;
