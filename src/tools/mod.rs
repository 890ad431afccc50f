//! Deterministic ledger tools
//!
//! - `loader`: CSV sheets into USD-projected tables
//! - `metrics`: pure calculations over those tables
//! - `charts`: figure descriptions for metric results

pub mod charts;
pub mod loader;
pub mod metrics;
