//! FP&A Copilot
//!
//! Answers plain-English finance questions over a month-level ledger:
//! - Routes each question to one of a few fixed intents
//! - Computes the metric deterministically from actuals, budget and cash
//! - Formats a one-line answer plus an optional chart description
//! - Builds a month-end board snapshot from the same metrics
//!
//! FLOW:
//! QUERY → ROUTE → METRIC → FORMAT → CHART

pub mod api;
pub mod config;
pub mod error;
pub mod formatter;
pub mod models;
pub mod month;
pub mod planner;
pub mod report;
pub mod router;
pub mod state;
pub mod tools;

pub use error::{CopilotError, Result};

// Re-export common types
pub use config::CopilotConfig;
pub use models::*;
pub use month::{parse_month, Month};
pub use planner::Planner;
pub use router::IntentRouter;
pub use state::LedgerCache;
