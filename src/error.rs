//! Error types for the FP&A copilot

use thiserror::Error;

/// Result type alias for copilot operations
pub type Result<T> = std::result::Result<T, CopilotError>;

/// Failures the copilot can surface.
///
/// Business conditions (zero budget, empty lookback window, missing cash row)
/// are never errors; they show up as absent values in metric results.
#[derive(Error, Debug)]
pub enum CopilotError {

    // =============================
    // Core Pipeline Errors
    // =============================

    #[error("Month parse error: {0}")]
    MonthParse(String),

    #[error("Data load error: {0}")]
    DataLoad(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl CopilotError {
    /// True for failures raised while loading the ledger tables.
    pub fn is_data_load(&self) -> bool {
        matches!(self, CopilotError::DataLoad(_) | CopilotError::Csv(_))
    }
}
