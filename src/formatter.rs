//! Answer formatter
//!
//! Turns metric results into one-line answers. Absent values are always
//! spelled out as `N/A` / "not applicable", never printed as zero.

use crate::models::{CashRunway, GrossMarginPoint, OpexBreakdown, RevenueVsBudget};

/// Marker printed for absent values
pub const NOT_AVAILABLE: &str = "N/A";

/// Compact USD: `$950`, `$1.50k`, `$2.30M`, `$1.00B`, `-$12.40k`
pub fn fmt_money(value: f64) -> String {
    let negative = value < 0.0;
    let x = value.abs();

    let body = if x >= 1_000_000_000.0 {
        format!("${:.2}B", x / 1_000_000_000.0)
    } else if x >= 1_000_000.0 {
        format!("${:.2}M", x / 1_000_000.0)
    } else if x >= 1_000.0 {
        format!("${:.2}k", x / 1_000.0)
    } else {
        format!("${:.0}", x)
    };

    if negative {
        format!("-{}", body)
    } else {
        body
    }
}

/// Ratio as a percentage with one decimal, `N/A` when absent
pub fn fmt_pct(ratio: Option<f64>) -> String {
    match ratio {
        Some(p) => format!("{:.1}%", p * 100.0),
        None => NOT_AVAILABLE.to_string(),
    }
}

pub fn revenue_vs_budget_text(r: &RevenueVsBudget) -> String {
    format!(
        "{} revenue was {} vs budget {} ({}; {}).",
        r.month.label(),
        fmt_money(r.actual),
        fmt_money(r.budget),
        fmt_money(r.variance),
        fmt_pct(r.variance_pct)
    )
}

/// Describes the latest point of the trend
pub fn gm_trend_text(points: &[GrossMarginPoint]) -> String {
    match points.last() {
        None => "No data to compute Gross Margin trend.".to_string(),
        Some(last) => format!(
            "Gross Margin trend shown; latest ({}) is {}.",
            last.month,
            fmt_pct(last.gm_pct)
        ),
    }
}

pub fn opex_breakdown_text(breakdown: &OpexBreakdown) -> String {
    let month = breakdown
        .month
        .map(|m| m.label())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    match breakdown.categories.first() {
        None => format!("Opex breakdown for {} (total {}).", month, fmt_money(0.0)),
        Some((largest, amount)) => format!(
            "Opex breakdown for {} (total {}); largest is {} at {}.",
            month,
            fmt_money(breakdown.total()),
            largest,
            fmt_money(*amount)
        ),
    }
}

pub fn cash_runway_text(r: &CashRunway) -> String {
    let Some(asof) = r.asof else {
        return "No cash balances are loaded, so runway is not applicable.".to_string();
    };

    let head = format!("As of {}, cash is {}.", asof.label(), fmt_money(r.cash_current));

    match (r.avg_burn, r.runway) {
        (Some(burn), Some(runway)) => format!(
            "{} Average burn is {}/mo, so runway is about {:.1} months.",
            head,
            fmt_money(burn),
            runway
        ),
        (Some(_), None) => format!("{} Average burn is zero, so runway is not applicable.", head),
        (None, _) => format!(
            "{} Average burn is {} (no prior months to measure), so runway is not applicable.",
            head, NOT_AVAILABLE
        ),
    }
}

/// Fixed reply for questions the router cannot classify
pub fn help_text() -> String {
    "Sorry, I couldn't classify that. Try asking about: revenue vs budget (for a month), \
     gross margin trend, opex breakdown (for a month), or cash runway."
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::month::Month;

    fn ym(year: i32, month: u32) -> Month {
        Month::new(year, month).unwrap()
    }

    #[test]
    fn test_fmt_money_thresholds() {
        assert_eq!(fmt_money(0.0), "$0");
        assert_eq!(fmt_money(950.4), "$950");
        assert_eq!(fmt_money(1_000.0), "$1.00k");
        assert_eq!(fmt_money(1_500.0), "$1.50k");
        assert_eq!(fmt_money(2_345_678.0), "$2.35M");
        assert_eq!(fmt_money(1_000_000_000.0), "$1.00B");
        assert_eq!(fmt_money(-12_400.0), "-$12.40k");
        assert_eq!(fmt_money(-250.0), "-$250");
    }

    #[test]
    fn test_fmt_pct() {
        assert_eq!(fmt_pct(Some(0.6)), "60.0%");
        assert_eq!(fmt_pct(Some(-0.0512)), "-5.1%");
        assert_eq!(fmt_pct(None), "N/A");
    }

    #[test]
    fn test_revenue_text() {
        let r = RevenueVsBudget {
            month: ym(2025, 6),
            actual: 1000.0,
            budget: 900.0,
            variance: 100.0,
            variance_pct: Some(100.0 / 900.0),
        };
        assert_eq!(
            revenue_vs_budget_text(&r),
            "Jun 2025 revenue was $1.00k vs budget $900 ($100; 11.1%)."
        );

        let zero_budget = RevenueVsBudget {
            budget: 0.0,
            variance: 1000.0,
            variance_pct: None,
            ..r
        };
        assert!(revenue_vs_budget_text(&zero_budget).ends_with("($1.00k; N/A)."));
    }

    #[test]
    fn test_gm_text() {
        assert_eq!(gm_trend_text(&[]), "No data to compute Gross Margin trend.");
        let points = vec![
            GrossMarginPoint { month: ym(2025, 5), gm_pct: Some(0.6) },
            GrossMarginPoint { month: ym(2025, 6), gm_pct: None },
        ];
        assert_eq!(
            gm_trend_text(&points),
            "Gross Margin trend shown; latest (2025-06) is N/A."
        );
    }

    #[test]
    fn test_opex_text() {
        let breakdown = OpexBreakdown {
            month: Some(ym(2025, 6)),
            categories: vec![("Sales".to_string(), 1500.0), ("Marketing".to_string(), 100.0)],
        };
        assert_eq!(
            opex_breakdown_text(&breakdown),
            "Opex breakdown for Jun 2025 (total $1.60k); largest is Sales at $1.50k."
        );

        let empty = OpexBreakdown {
            month: Some(ym(2025, 6)),
            categories: vec![],
        };
        assert_eq!(opex_breakdown_text(&empty), "Opex breakdown for Jun 2025 (total $0).");
    }

    #[test]
    fn test_runway_text_variants() {
        let base = CashRunway {
            asof: Some(ym(2025, 6)),
            cash_current: 2000.0,
            avg_burn: Some(100.0 / 3.0),
            runway: Some(60.0),
            months_used: vec![ym(2025, 3), ym(2025, 4), ym(2025, 5)],
        };
        assert_eq!(
            cash_runway_text(&base),
            "As of Jun 2025, cash is $2.00k. Average burn is $33/mo, so runway is about 60.0 months."
        );

        let zero_burn = CashRunway {
            avg_burn: Some(0.0),
            runway: None,
            ..base.clone()
        };
        assert!(cash_runway_text(&zero_burn).contains("Average burn is zero"));

        let no_window = CashRunway {
            avg_burn: None,
            runway: None,
            months_used: vec![],
            ..base.clone()
        };
        let text = cash_runway_text(&no_window);
        assert!(text.contains("N/A"));
        assert!(text.contains("not applicable"));

        let no_cash = CashRunway {
            asof: None,
            cash_current: 0.0,
            avg_burn: None,
            runway: None,
            months_used: vec![],
        };
        assert!(cash_runway_text(&no_cash).contains("not applicable"));
    }

    #[test]
    fn test_help_text_lists_intents() {
        let help = help_text();
        assert!(help.contains("revenue vs budget"));
        assert!(help.contains("cash runway"));
    }
}
