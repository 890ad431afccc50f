//! Planner
//!
//! Orchestrates one query end to end:
//! ROUTE → RESOLVE PARAMETERS → COMPUTE METRIC → FORMAT → CHART
//!
//! Every step is synchronous and pure over the tables handed in.

use crate::config::CopilotConfig;
use crate::formatter;
use crate::models::{Answer, FinanceData, Intent, IntentKind, MetricResult};
use crate::month::{last_n_distinct, Month};
use crate::router::{IntentRouter, DEFAULT_TREND_MONTHS};
use crate::state::LedgerCache;
use crate::tools::charts::{ChartBuilder, FigureBuilder};
use crate::tools::metrics::{self, DEFAULT_RUNWAY_LOOKBACK};
use crate::Result;
use tracing::{debug, info};

const DEFAULT_CASH_TREND_MONTHS: usize = 12;

/// Reply when a month-scoped question arrives but actuals are empty
const NO_ACTUALS_TEXT: &str =
    "No actuals are loaded yet, so there is no month to report on. Load a ledger and ask again.";

/// Routes questions to metrics and renders the answer
pub struct Planner {
    chart_builder: Box<dyn ChartBuilder>,
    runway_lookback: usize,
    trend_months: usize,
    cash_trend_months: usize,
}

impl Planner {
    pub fn new(chart_builder: Box<dyn ChartBuilder>) -> Self {
        Self {
            chart_builder,
            runway_lookback: DEFAULT_RUNWAY_LOOKBACK,
            trend_months: DEFAULT_TREND_MONTHS,
            cash_trend_months: DEFAULT_CASH_TREND_MONTHS,
        }
    }

    /// Planner with the window sizes from configuration
    pub fn from_config(chart_builder: Box<dyn ChartBuilder>, config: &CopilotConfig) -> Self {
        Self {
            chart_builder,
            runway_lookback: config.runway_lookback,
            trend_months: config.trend_months,
            cash_trend_months: config.cash_trend_months,
        }
    }

    /// Answer a free-text question against the given tables
    pub fn answer(&self, query: &str, data: &FinanceData) -> Answer {
        let intent = IntentRouter::route(query);

        info!(
            intent = %intent.kind(),
            query = %query,
            "Planner: answering query"
        );

        if let Intent::Unknown { month } = intent {
            debug!(?month, "Unclassified query, returning help text");
            return Answer {
                intent: IntentKind::Unknown,
                text: formatter::help_text(),
                figure: None,
            };
        }

        let Some(metric) = self.compute(intent, data) else {
            return Answer {
                intent: intent.kind(),
                text: NO_ACTUALS_TEXT.to_string(),
                figure: None,
            };
        };

        Answer {
            intent: intent.kind(),
            text: render_text(&metric),
            figure: self.chart_builder.build(&metric),
        }
    }

    /// Same as [`Planner::answer`], reading tables through the session cache
    pub fn answer_cached(&self, query: &str, cache: &LedgerCache) -> Result<Answer> {
        let data = cache.get_or_load()?;
        Ok(self.answer(query, &data))
    }

    /// Distinct months present in actuals, ascending
    pub fn available_months(&self, data: &FinanceData) -> Vec<Month> {
        data.actual_months()
    }

    pub fn chart_builder(&self) -> &dyn ChartBuilder {
        self.chart_builder.as_ref()
    }

    pub fn cash_trend_months(&self) -> usize {
        self.cash_trend_months
    }

    pub fn runway_lookback(&self) -> usize {
        self.runway_lookback
    }

    /// Metric for a classified intent; `None` when a default month is needed
    /// but actuals are empty.
    fn compute(&self, intent: Intent, data: &FinanceData) -> Option<MetricResult> {
        let metric = match intent {
            Intent::RevenueVsBudget { month } => {
                let month = month.or_else(|| data.latest_actual_month())?;
                debug!(%month, "Revenue vs budget");
                MetricResult::RevenueVsBudget(metrics::revenue_vs_budget(
                    &data.actuals,
                    &data.budget,
                    month,
                ))
            }
            Intent::GrossMarginTrend { last_n } => {
                let n = last_n.filter(|n| *n > 0).unwrap_or(self.trend_months);
                let months = last_n_distinct(data.actuals.iter().map(|row| row.month), n);
                debug!(window = n, months = months.len(), "Gross margin trend");
                MetricResult::GrossMarginTrend {
                    points: metrics::gross_margin_trend(&data.actuals, &months),
                }
            }
            Intent::OpexBreakdown { month } => {
                let month = month.or_else(|| data.latest_actual_month())?;
                debug!(%month, "Opex breakdown");
                MetricResult::OpexBreakdown(metrics::opex_breakdown(&data.actuals, month))
            }
            Intent::CashRunway => {
                let runway =
                    metrics::cash_runway(&data.actuals, &data.cash, None, self.runway_lookback);
                debug!(
                    asof = ?runway.asof,
                    months_used = runway.months_used.len(),
                    "Cash runway"
                );
                MetricResult::CashRunway {
                    runway,
                    cash_trend: data.cash_tail(self.cash_trend_months),
                }
            }
            Intent::Unknown { .. } => return None,
        };

        Some(metric)
    }
}

impl Default for Planner {
    fn default() -> Self {
        Self::new(Box::new(FigureBuilder))
    }
}

/// Sentence for any metric result
pub fn render_text(metric: &MetricResult) -> String {
    match metric {
        MetricResult::RevenueVsBudget(r) => formatter::revenue_vs_budget_text(r),
        MetricResult::GrossMarginTrend { points } => formatter::gm_trend_text(points),
        MetricResult::OpexBreakdown(breakdown) => formatter::opex_breakdown_text(breakdown),
        MetricResult::CashRunway { runway, .. } => formatter::cash_runway_text(runway),
    }
}
