//! Core data models for the FP&A copilot

use crate::month::Month;
use crate::tools::charts::Figure;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Exact category for revenue rows
pub const REVENUE: &str = "Revenue";

/// Exact category for cost-of-goods-sold rows
pub const COGS: &str = "COGS";

/// Prefix shared by every operating-expense category (`Opex:Sales`)
pub const OPEX_PREFIX: &str = "Opex:";

//
// ================= Ledger Tables =================
//

/// One P&L line, already projected to USD
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub month: Month,
    pub entity: String,
    pub account_category: String,
    pub amount_usd: f64,
}

impl LedgerRow {
    pub fn new(month: Month, entity: &str, account_category: &str, amount_usd: f64) -> Self {
        Self {
            month,
            entity: entity.to_string(),
            account_category: account_category.to_string(),
            amount_usd,
        }
    }

    pub fn is_revenue(&self) -> bool {
        self.account_category == REVENUE
    }

    pub fn is_cogs(&self) -> bool {
        self.account_category == COGS
    }

    pub fn is_opex(&self) -> bool {
        self.account_category.starts_with(OPEX_PREFIX)
    }
}

/// Month-end cash balance in USD
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CashRow {
    pub month: Month,
    pub cash_usd: f64,
}

/// Conversion rate from a currency to USD for one month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FxRate {
    pub month: Month,
    pub currency: String,
    pub rate_to_usd: f64,
}

/// The four normalized tables handed to the core, read-only per query
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinanceData {
    pub actuals: Vec<LedgerRow>,
    pub budget: Vec<LedgerRow>,
    pub cash: Vec<CashRow>,
    #[serde(default)]
    pub fx: Vec<FxRate>,
}

impl FinanceData {
    /// Distinct months present in actuals, ascending
    pub fn actual_months(&self) -> Vec<Month> {
        self.actuals
            .iter()
            .map(|row| row.month)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Most recent month in actuals; the default for month-scoped questions
    pub fn latest_actual_month(&self) -> Option<Month> {
        self.actuals.iter().map(|row| row.month).max()
    }

    /// Trailing `n` cash balances ordered by month
    pub fn cash_tail(&self, n: usize) -> Vec<CashRow> {
        let mut rows = self.cash.clone();
        rows.sort_by_key(|row| row.month);
        let skip = rows.len().saturating_sub(n);
        rows.split_off(skip)
    }
}

//
// ================= Intents =================
//

/// Intent tag, as reported back to callers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    RevenueVsBudget,
    GrossMarginTrend,
    OpexBreakdown,
    CashRunway,
    Unknown,
}

impl IntentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::RevenueVsBudget => "revenue_vs_budget",
            IntentKind::GrossMarginTrend => "gross_margin_trend",
            IntentKind::OpexBreakdown => "opex_breakdown",
            IntentKind::CashRunway => "cash_runway",
            IntentKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Router output: the intent plus the parameters it carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    RevenueVsBudget { month: Option<Month> },
    GrossMarginTrend { last_n: Option<usize> },
    OpexBreakdown { month: Option<Month> },
    CashRunway,
    /// Unclassified; any month found is kept for downstream heuristics
    Unknown { month: Option<Month> },
}

impl Intent {
    pub fn kind(&self) -> IntentKind {
        match self {
            Intent::RevenueVsBudget { .. } => IntentKind::RevenueVsBudget,
            Intent::GrossMarginTrend { .. } => IntentKind::GrossMarginTrend,
            Intent::OpexBreakdown { .. } => IntentKind::OpexBreakdown,
            Intent::CashRunway => IntentKind::CashRunway,
            Intent::Unknown { .. } => IntentKind::Unknown,
        }
    }

    /// Target month, when the intent carries one
    pub fn month(&self) -> Option<Month> {
        match self {
            Intent::RevenueVsBudget { month }
            | Intent::OpexBreakdown { month }
            | Intent::Unknown { month } => *month,
            Intent::GrossMarginTrend { .. } | Intent::CashRunway => None,
        }
    }

    /// Lookback window, only set for gross margin trend
    pub fn last_n(&self) -> Option<usize> {
        match self {
            Intent::GrossMarginTrend { last_n } => *last_n,
            _ => None,
        }
    }
}

//
// ================= Metric Results =================
//

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueVsBudget {
    pub month: Month,
    pub actual: f64,
    pub budget: f64,
    pub variance: f64,
    /// Absent when budget is zero
    pub variance_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrossMarginPoint {
    pub month: Month,
    /// Absent when revenue is zero
    pub gm_pct: Option<f64>,
}

/// Opex by subcategory, highest spend first
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OpexBreakdown {
    pub month: Option<Month>,
    pub categories: Vec<(String, f64)>,
}

impl OpexBreakdown {
    pub fn total(&self) -> f64 {
        self.categories.iter().map(|(_, amount)| amount).sum()
    }

    pub fn get(&self, category: &str) -> Option<f64> {
        self.categories
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, amount)| *amount)
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashRunway {
    /// Absent only when the cash table is empty and no month was requested
    pub asof: Option<Month>,
    pub cash_current: f64,
    pub avg_burn: Option<f64>,
    pub runway: Option<f64>,
    pub months_used: Vec<Month>,
}

/// Any metric the planner can hand to the formatter and chart builder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "metric", rename_all = "snake_case")]
pub enum MetricResult {
    RevenueVsBudget(RevenueVsBudget),
    GrossMarginTrend { points: Vec<GrossMarginPoint> },
    OpexBreakdown(OpexBreakdown),
    CashRunway {
        runway: CashRunway,
        cash_trend: Vec<CashRow>,
    },
}

impl MetricResult {
    pub fn kind(&self) -> IntentKind {
        match self {
            MetricResult::RevenueVsBudget(_) => IntentKind::RevenueVsBudget,
            MetricResult::GrossMarginTrend { .. } => IntentKind::GrossMarginTrend,
            MetricResult::OpexBreakdown(_) => IntentKind::OpexBreakdown,
            MetricResult::CashRunway { .. } => IntentKind::CashRunway,
        }
    }
}

//
// ================= Final Answer =================
//

/// What a single query produces: `{intent, text, figure}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub intent: IntentKind,
    pub text: String,
    pub figure: Option<Figure>,
}
