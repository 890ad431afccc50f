//! Metrics engine
//!
//! Pure aggregations over the USD-normalized ledger tables. Nothing here
//! mutates its inputs or returns an error: degenerate inputs (zero
//! denominators, empty windows, missing cash rows) come back as `None`.

use crate::models::{
    CashRow, CashRunway, GrossMarginPoint, LedgerRow, OpexBreakdown, RevenueVsBudget,
    OPEX_PREFIX,
};
use crate::month::{last_n_distinct, Month};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Burn window used when the caller does not pick one
pub const DEFAULT_RUNWAY_LOOKBACK: usize = 3;

/// Subcategory used for `Opex:` rows with nothing after the colon
const OTHER_SUBCATEGORY: &str = "Other";

/// `numer / denom`, absent when the denominator is zero
pub fn safe_ratio(numer: f64, denom: f64) -> Option<f64> {
    if denom == 0.0 {
        None
    } else {
        Some(numer / denom)
    }
}

fn sum_where<F>(rows: &[LedgerRow], month: Month, predicate: F) -> f64
where
    F: Fn(&LedgerRow) -> bool,
{
    rows.iter()
        .filter(|row| row.month == month && predicate(row))
        .map(|row| row.amount_usd)
        .sum()
}

fn sum_revenue(rows: &[LedgerRow], month: Month) -> f64 {
    sum_where(rows, month, LedgerRow::is_revenue)
}

fn sum_cogs(rows: &[LedgerRow], month: Month) -> f64 {
    sum_where(rows, month, LedgerRow::is_cogs)
}

fn sum_opex(rows: &[LedgerRow], month: Month) -> f64 {
    sum_where(rows, month, LedgerRow::is_opex)
}

/// Revenue actual against budget for one month
pub fn revenue_vs_budget(actuals: &[LedgerRow], budget: &[LedgerRow], month: Month) -> RevenueVsBudget {
    let actual = sum_revenue(actuals, month);
    let budget = sum_revenue(budget, month);
    let variance = actual - budget;

    RevenueVsBudget {
        month,
        actual,
        budget,
        variance,
        variance_pct: safe_ratio(variance, budget),
    }
}

/// GM% per month, `(revenue - cogs) / revenue`, in the order given.
/// Months without data stay in the output with an absent margin.
pub fn gross_margin_trend(actuals: &[LedgerRow], months: &[Month]) -> Vec<GrossMarginPoint> {
    months
        .iter()
        .map(|&month| {
            let revenue = sum_revenue(actuals, month);
            let cogs = sum_cogs(actuals, month);
            GrossMarginPoint {
                month,
                gm_pct: safe_ratio(revenue - cogs, revenue),
            }
        })
        .collect()
}

/// Opex for one month grouped by the label after `Opex:`, largest first.
/// Equal amounts keep the order in which their subcategory first appeared.
pub fn opex_breakdown(actuals: &[LedgerRow], month: Month) -> OpexBreakdown {
    let mut categories: Vec<(String, f64)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in actuals.iter().filter(|row| row.month == month && row.is_opex()) {
        let label = opex_subcategory(&row.account_category);
        match index.get(label) {
            Some(&pos) => categories[pos].1 += row.amount_usd,
            None => {
                index.insert(label.to_string(), categories.len());
                categories.push((label.to_string(), row.amount_usd));
            }
        }
    }

    // stable sort keeps first-seen order for ties
    categories.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    OpexBreakdown {
        month: Some(month),
        categories,
    }
}

fn opex_subcategory(category: &str) -> &str {
    let rest = category
        .split_once(':')
        .map(|(_, rest)| rest)
        .unwrap_or_default();
    if rest.is_empty() {
        OTHER_SUBCATEGORY
    } else {
        rest
    }
}

/// EBITDA proxy: revenue - cogs - all opex for the month
pub fn ebitda(actuals: &[LedgerRow], month: Month) -> f64 {
    net_income(actuals, month)
}

fn net_income(actuals: &[LedgerRow], month: Month) -> f64 {
    sum_revenue(actuals, month) - sum_cogs(actuals, month) - sum_opex(actuals, month)
}

/// Months of runway left: current cash over average monthly burn.
///
/// * `asof` defaults to the latest month in the cash table.
/// * Current cash is the balance at `asof`, else the latest balance before it.
///   With no balance at all the result is degenerate: zero cash, no burn,
///   no runway, empty window.
/// * The burn window is the last `lookback` distinct actuals months strictly
///   before `asof`; it may be shorter or empty.
/// * Each window month burns `max(0, -pnl)`. Runway is absent when the
///   average burn is absent or zero.
pub fn cash_runway(
    actuals: &[LedgerRow],
    cash: &[CashRow],
    asof: Option<Month>,
    lookback: usize,
) -> CashRunway {
    let asof = asof.or_else(|| cash.iter().map(|row| row.month).max());

    let Some(asof) = asof else {
        return degenerate_runway(None);
    };

    let Some(cash_current) = cash_at(cash, asof) else {
        return degenerate_runway(Some(asof));
    };

    let months_used = last_n_distinct(
        actuals.iter().map(|row| row.month).filter(|m| *m < asof),
        lookback,
    );

    let burns: Vec<f64> = months_used
        .iter()
        .map(|&month| (-net_income(actuals, month)).max(0.0))
        .collect();

    let avg_burn = if burns.is_empty() {
        None
    } else {
        Some(burns.iter().sum::<f64>() / burns.len() as f64)
    };

    let runway = avg_burn.and_then(|burn| safe_ratio(cash_current, burn));

    CashRunway {
        asof: Some(asof),
        cash_current,
        avg_burn,
        runway,
        months_used,
    }
}

/// Balance at `asof`, falling back to the latest earlier month.
/// Duplicate rows for a month resolve to the last one in table order.
fn cash_at(cash: &[CashRow], asof: Month) -> Option<f64> {
    if let Some(row) = cash.iter().rev().find(|row| row.month == asof) {
        return Some(row.cash_usd);
    }

    cash.iter()
        .enumerate()
        .filter(|(_, row)| row.month <= asof)
        .max_by_key(|(pos, row)| (row.month, *pos))
        .map(|(_, row)| row.cash_usd)
}

fn degenerate_runway(asof: Option<Month>) -> CashRunway {
    CashRunway {
        asof,
        cash_current: 0.0,
        avg_burn: None,
        runway: None,
        months_used: Vec::new(),
    }
}
