//! Session ledger cache
//!
//! The ledger is loaded once on first use and shared read-only afterwards.
//! A failed load is not cached; the next call tries again.

use crate::models::FinanceData;
use crate::tools::loader::load_finance_data;
use crate::Result;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::info;

/// Where the cache gets its tables from
enum LedgerSource {
    Directory(PathBuf),
    Preloaded,
}

/// Load-on-first-use handle to the session's ledger tables
pub struct LedgerCache {
    source: LedgerSource,
    data: OnceLock<Arc<FinanceData>>,
}

impl LedgerCache {
    /// Cache backed by a directory of ledger sheets
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            source: LedgerSource::Directory(data_dir.into()),
            data: OnceLock::new(),
        }
    }

    /// Cache that already holds its tables
    pub fn preloaded(data: FinanceData) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(Arc::new(data));
        Self {
            source: LedgerSource::Preloaded,
            data: cell,
        }
    }

    pub fn data_dir(&self) -> Option<&Path> {
        match &self.source {
            LedgerSource::Directory(dir) => Some(dir),
            LedgerSource::Preloaded => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.data.get().is_some()
    }

    /// Tables for this session, loading them on the first call
    pub fn get_or_load(&self) -> Result<Arc<FinanceData>> {
        if let Some(data) = self.data.get() {
            return Ok(Arc::clone(data));
        }

        let loaded = match &self.source {
            LedgerSource::Directory(dir) => {
                info!(dir = %dir.display(), "Loading ledger on first use");
                Arc::new(load_finance_data(dir)?)
            }
            LedgerSource::Preloaded => Arc::new(FinanceData::default()),
        };

        // a concurrent first load may have won; keep whichever landed first
        let _ = self.data.set(loaded);
        Ok(self.data.get().map(Arc::clone).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LedgerRow;
    use crate::month::Month;
    use std::fs;

    #[test]
    fn test_preloaded_cache() {
        let m = Month::new(2025, 6).unwrap();
        let cache = LedgerCache::preloaded(FinanceData {
            actuals: vec![LedgerRow::new(m, "A", "Revenue", 1.0)],
            ..Default::default()
        });

        assert!(cache.is_loaded());
        assert!(cache.data_dir().is_none());
        assert_eq!(cache.get_or_load().unwrap().actuals.len(), 1);
    }

    #[test]
    fn test_failed_load_is_retried() {
        let dir = std::env::temp_dir().join(format!("fpna-cache-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);

        let cache = LedgerCache::new(&dir);
        assert!(cache.get_or_load().unwrap_err().is_data_load());
        assert!(!cache.is_loaded());

        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("actuals.csv"),
            "month,entity,account_category,amount,currency\n2025-06,A,Revenue,10,USD\n",
        )
        .unwrap();
        fs::write(
            dir.join("budget.csv"),
            "month,entity,account_category,amount,currency\n",
        )
        .unwrap();
        fs::write(dir.join("fx.csv"), "month,currency,rate_to_usd\n2025-06,USD,1\n").unwrap();
        fs::write(dir.join("cash.csv"), "month,cash_usd\n2025-06,100\n").unwrap();

        let first = cache.get_or_load().unwrap();
        assert!(cache.is_loaded());
        assert_eq!(first.actuals.len(), 1);

        // removing the files does not matter once loaded
        fs::remove_dir_all(&dir).unwrap();
        let second = cache.get_or_load().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
