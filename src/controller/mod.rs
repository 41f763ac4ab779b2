//! # Controller
//!
//! Core controller modules for the AZ failover controller.
//!
//! - `control_loop`: Scan, reconcile, wait, repeat
//! - `reconciler`: Node template reconciliation against the active zone
//! - `scanner`: Ordered availability zone probing with retry
//! - `shutdown`: Interruptible waits
//! - `status`: Per-zone diagnostic records

pub mod control_loop;
pub mod reconciler;
pub mod scanner;
pub mod shutdown;
pub mod status;

pub use control_loop::{ControlLoop, LoopState};
pub use reconciler::{ReconciliationEngine, ReconciliationReport, SkipReason, TemplateOutcome};
pub use scanner::{ScanOutcome, ZoneScanner};
pub use shutdown::{Shutdown, ShutdownTrigger};
