//! Chart building
//!
//! Charts are described, not rendered: a [`Figure`] is a serialisable description
//! (kind, title, labelled series) that a front end can hand to its plotting
//! library of choice.

use crate::models::MetricResult;
use serde::{Deserialize, Serialize};

const DEFAULT_HEIGHT: u32 = 380;
const CASH_HEIGHT: u32 = 320;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
}

/// One labelled series. `None` points are gaps, not zeros.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trace {
    pub name: String,
    pub x: Vec<String>,
    pub y: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Figure {
    pub kind: ChartKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_axis_title: Option<String>,
    pub traces: Vec<Trace>,
    pub height: u32,
}

/// Collaborator that turns a metric into a chart, or declines to
pub trait ChartBuilder: Send + Sync {
    fn build(&self, metric: &MetricResult) -> Option<Figure>;
}

/// Builds one figure per intent
pub struct FigureBuilder;

impl ChartBuilder for FigureBuilder {
    fn build(&self, metric: &MetricResult) -> Option<Figure> {
        let figure = match metric {
            MetricResult::RevenueVsBudget(r) => {
                let label = r.month.to_string();
                Figure {
                    kind: ChartKind::Bar,
                    title: format!("Revenue vs Budget: {}", label),
                    y_axis_title: None,
                    traces: vec![
                        Trace {
                            name: "Actual".to_string(),
                            x: vec![label.clone()],
                            y: vec![Some(r.actual)],
                        },
                        Trace {
                            name: "Budget".to_string(),
                            x: vec![label],
                            y: vec![Some(r.budget)],
                        },
                    ],
                    height: DEFAULT_HEIGHT,
                }
            }
            MetricResult::GrossMarginTrend { points } => Figure {
                kind: ChartKind::Line,
                title: "Gross Margin % Trend".to_string(),
                y_axis_title: Some("GM %".to_string()),
                traces: vec![Trace {
                    name: "GM %".to_string(),
                    x: points.iter().map(|p| p.month.to_string()).collect(),
                    y: points.iter().map(|p| p.gm_pct.map(|v| v * 100.0)).collect(),
                }],
                height: DEFAULT_HEIGHT,
            },
            MetricResult::OpexBreakdown(breakdown) => Figure {
                kind: ChartKind::Pie,
                title: format!(
                    "Opex Breakdown: {}",
                    breakdown
                        .month
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "N/A".to_string())
                ),
                y_axis_title: None,
                traces: vec![Trace {
                    name: "Opex".to_string(),
                    x: breakdown.categories.iter().map(|(name, _)| name.clone()).collect(),
                    y: breakdown.categories.iter().map(|(_, amount)| Some(*amount)).collect(),
                }],
                height: DEFAULT_HEIGHT,
            },
            MetricResult::CashRunway { cash_trend, .. } => Figure {
                kind: ChartKind::Line,
                title: format!("Cash (last {} months)", cash_trend.len()),
                y_axis_title: Some("USD".to_string()),
                traces: vec![Trace {
                    name: "Cash".to_string(),
                    x: cash_trend.iter().map(|row| row.month.to_string()).collect(),
                    y: cash_trend.iter().map(|row| Some(row.cash_usd)).collect(),
                }],
                height: CASH_HEIGHT,
            },
        };

        Some(figure)
    }
}

/// Chart builder for callers that only want text
pub struct NoCharts;

impl ChartBuilder for NoCharts {
    fn build(&self, _metric: &MetricResult) -> Option<Figure> {
        None
    }
}
