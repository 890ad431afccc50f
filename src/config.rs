//! Runtime configuration read from the environment

use crate::error::CopilotError;
use crate::Result;
use std::env;
use std::path::PathBuf;

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_LOOKBACK: usize = 3;
const DEFAULT_CASH_TREND_MONTHS: usize = 12;

#[derive(Debug, Clone, PartialEq)]
pub struct CopilotConfig {
    /// Directory holding `actuals.csv`, `budget.csv`, `fx.csv`, `cash.csv`
    pub data_dir: PathBuf,
    pub port: u16,
    /// Months of history averaged for cash burn
    pub runway_lookback: usize,
    /// Gross margin window when the question gives no count
    pub trend_months: usize,
    /// Cash balances shown next to the runway answer
    pub cash_trend_months: usize,
}

impl Default for CopilotConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            port: DEFAULT_PORT,
            runway_lookback: DEFAULT_LOOKBACK,
            trend_months: DEFAULT_LOOKBACK,
            cash_trend_months: DEFAULT_CASH_TREND_MONTHS,
        }
    }
}

impl CopilotConfig {
    /// Read `FPNA_*` variables plus `PORT` / `API_PORT`. Call
    /// `dotenv::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let data_dir = lookup("FPNA_DATA_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let port = match lookup("PORT").or_else(|| lookup("API_PORT")) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| CopilotError::Config(format!("invalid port '{}': {}", raw, e)))?,
            None => defaults.port,
        };

        Ok(Self {
            data_dir,
            port,
            runway_lookback: positive(&lookup, "FPNA_RUNWAY_LOOKBACK", defaults.runway_lookback)?,
            trend_months: positive(&lookup, "FPNA_TREND_MONTHS", defaults.trend_months)?,
            cash_trend_months: positive(
                &lookup,
                "FPNA_CASH_TREND_MONTHS",
                defaults.cash_trend_months,
            )?,
        })
    }
}

fn positive<F>(lookup: &F, key: &str, default: usize) -> Result<usize>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };

    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        Ok(_) => Err(CopilotError::Config(format!("{} must be greater than zero", key))),
        Err(e) => Err(CopilotError::Config(format!("invalid {} '{}': {}", key, raw, e))),
    }
}
