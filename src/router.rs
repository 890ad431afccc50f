//! Intent Router
//!
//! Classifies a question into one of four FP&A intents using an ordered list
//! of keyword rules. The first rule whose predicate matches wins; anything
//! left over is `Unknown`, with a best-effort month still attached.

use crate::models::Intent;
use crate::month::{Month, MONTH_PATTERN};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

/// Lookback used when a trend is requested without an explicit count
pub const DEFAULT_TREND_MONTHS: usize = 3;

fn month_name_regex() -> &'static Regex {
    static MONTH_NAME_RE: OnceLock<Regex> = OnceLock::new();
    MONTH_NAME_RE.get_or_init(|| {
        Regex::new(&format!(r"(?i)\b(?:{})\s+\d{{4}}\b", MONTH_PATTERN))
            .expect("month name regex is valid")
    })
}

fn year_month_regex() -> &'static Regex {
    static YEAR_MONTH_RE: OnceLock<Regex> = OnceLock::new();
    YEAR_MONTH_RE.get_or_init(|| {
        Regex::new(r"\b(\d{4})[-/](0?[1-9]|1[0-2])\b").expect("year-month regex is valid")
    })
}

fn last_n_regex() -> &'static Regex {
    static LAST_N_RE: OnceLock<Regex> = OnceLock::new();
    LAST_N_RE.get_or_init(|| {
        Regex::new(r"(?i)last\s+(\d+)\s+months?").expect("last-n regex is valid")
    })
}

fn trend_regex() -> &'static Regex {
    static TREND_RE: OnceLock<Regex> = OnceLock::new();
    TREND_RE.get_or_init(|| Regex::new(r"(?i)\btrend\b").expect("trend regex is valid"))
}

/// One routing rule: predicate over the lower-cased text, extractor over the
/// original text.
struct Rule {
    name: &'static str,
    matches: fn(&str) -> bool,
    extract: fn(&str) -> Intent,
}

fn is_cash_runway(t: &str) -> bool {
    t.contains("cash") && t.contains("runway")
}

fn is_revenue_vs_budget(t: &str) -> bool {
    t.contains("revenue") && (t.contains("budget") || t.contains("vs"))
}

fn is_gross_margin_trend(t: &str) -> bool {
    (t.contains("gross margin") || t.contains("gm")) && (t.contains("trend") || t.contains("last"))
}

fn is_opex_breakdown(t: &str) -> bool {
    t.contains("opex") && (t.contains("breakdown") || t.contains("by category"))
}

fn is_gross_margin(t: &str) -> bool {
    t.contains("gross margin")
}

fn cash_runway(_text: &str) -> Intent {
    Intent::CashRunway
}

fn revenue_vs_budget(text: &str) -> Intent {
    Intent::RevenueVsBudget {
        month: find_single_month(text),
    }
}

fn gross_margin_trend(text: &str) -> Intent {
    Intent::GrossMarginTrend {
        last_n: find_last_n_months(text),
    }
}

fn opex_breakdown(text: &str) -> Intent {
    Intent::OpexBreakdown {
        month: find_single_month(text),
    }
}

fn gross_margin_default(_text: &str) -> Intent {
    Intent::GrossMarginTrend {
        last_n: Some(DEFAULT_TREND_MONTHS),
    }
}

/// Evaluated top to bottom; order is the precedence.
const RULES: &[Rule] = &[
    Rule { name: "cash_runway", matches: is_cash_runway, extract: cash_runway },
    Rule { name: "revenue_vs_budget", matches: is_revenue_vs_budget, extract: revenue_vs_budget },
    Rule { name: "gross_margin_trend", matches: is_gross_margin_trend, extract: gross_margin_trend },
    Rule { name: "opex_breakdown", matches: is_opex_breakdown, extract: opex_breakdown },
    Rule { name: "gross_margin_fallback", matches: is_gross_margin, extract: gross_margin_default },
];

/// Intent router
pub struct IntentRouter;

impl IntentRouter {
    /// Classify a question. Deterministic and side-effect free.
    pub fn route(text: &str) -> Intent {
        let lowered = text.trim().to_lowercase();

        for rule in RULES {
            if (rule.matches)(&lowered) {
                let intent = (rule.extract)(text);
                debug!(rule = rule.name, ?intent, "Intent routed");
                return intent;
            }
        }

        let intent = Intent::Unknown {
            month: find_single_month(text),
        };
        debug!(?intent, "No routing rule matched");
        intent
    }
}

/// First month reference in the text. A month name with a year is preferred
/// over a numeric `YYYY-MM` / `YYYY/MM` reference.
pub fn find_single_month(text: &str) -> Option<Month> {
    let s = text.trim();

    if let Some(found) = month_name_regex().find(s) {
        if let Ok(month) = Month::parse(found.as_str()) {
            return Some(month);
        }
    }

    let caps = year_month_regex().captures(s)?;
    let year = caps[1].parse::<i32>().ok()?;
    let month = caps[2].parse::<u32>().ok()?;
    Month::new(year, month).ok()
}

/// `last N month(s)` count, or the trend default when only "trend" appears
pub fn find_last_n_months(text: &str) -> Option<usize> {
    if let Some(n) = last_n_regex()
        .captures(text)
        .and_then(|caps| caps[1].parse::<usize>().ok())
    {
        return Some(n);
    }

    if trend_regex().is_match(text) {
        return Some(DEFAULT_TREND_MONTHS);
    }

    None
}
