//! Board snapshot
//!
//! A compact month-end pack: revenue vs budget, opex breakdown, EBITDA and
//! the trailing cash trend with runway. Sections carry text plus an optional
//! figure so any renderer (markdown, PDF, web) can lay them out.

use crate::formatter::{self, fmt_money};
use crate::models::{FinanceData, MetricResult};
use crate::month::Month;
use crate::planner::{render_text, Planner};
use crate::tools::charts::Figure;
use crate::tools::metrics;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSection {
    pub title: String,
    pub text: String,
    pub figure: Option<Figure>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardReport {
    pub title: String,
    pub month: Month,
    pub sections: Vec<ReportSection>,
}

impl BoardReport {
    /// Markdown rendering; figures are referenced by title only
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("# {}\n\n", self.title));

        for section in &self.sections {
            out.push_str(&format!("## {}\n\n", section.title));
            out.push_str(&section.text);
            out.push_str("\n\n");
            if let Some(figure) = &section.figure {
                out.push_str(&format!("_Chart: {}_\n\n", figure.title));
            }
        }

        out
    }
}

/// Build the board pack for `month` using the planner's chart builder and
/// cash windows
pub fn build_board_report(planner: &Planner, data: &FinanceData, month: Month) -> BoardReport {
    let charts = planner.chart_builder();
    let mut sections = Vec::with_capacity(4);

    let revenue = MetricResult::RevenueVsBudget(metrics::revenue_vs_budget(
        &data.actuals,
        &data.budget,
        month,
    ));
    sections.push(ReportSection {
        title: format!("Revenue vs Budget for {}", month.label()),
        text: render_text(&revenue),
        figure: charts.build(&revenue),
    });

    let opex = MetricResult::OpexBreakdown(metrics::opex_breakdown(&data.actuals, month));
    sections.push(ReportSection {
        title: format!("Opex breakdown: {}", month.label()),
        text: render_text(&opex),
        figure: charts.build(&opex),
    });

    let ebitda = metrics::ebitda(&data.actuals, month);
    sections.push(ReportSection {
        title: "EBITDA".to_string(),
        text: format!("EBITDA for {} was {}.", month.label(), fmt_money(ebitda)),
        figure: None,
    });

    let runway = metrics::cash_runway(
        &data.actuals,
        &data.cash,
        Some(month),
        planner.runway_lookback(),
    );
    let cash_text = formatter::cash_runway_text(&runway);
    let cash = MetricResult::CashRunway {
        runway,
        cash_trend: data.cash_tail(planner.cash_trend_months()),
    };
    sections.push(ReportSection {
        title: "Cash Trend".to_string(),
        text: cash_text,
        figure: charts.build(&cash),
    });

    info!(%month, sections = sections.len(), "Board report built");

    BoardReport {
        title: format!("FP&A Snapshot: {}", month.label()),
        month,
        sections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CashRow, LedgerRow};
    use crate::tools::charts::NoCharts;

    fn ym(year: i32, month: u32) -> Month {
        Month::new(year, month).unwrap()
    }

    fn data() -> FinanceData {
        let m = ym(2025, 6);
        FinanceData {
            actuals: vec![
                LedgerRow::new(ym(2025, 5), "A", "Revenue", 500.0),
                LedgerRow::new(ym(2025, 5), "A", "Opex:Sales", 800.0),
                LedgerRow::new(m, "A", "Revenue", 800.0),
                LedgerRow::new(m, "A", "COGS", 300.0),
                LedgerRow::new(m, "A", "Opex:Sales", 250.0),
            ],
            budget: vec![LedgerRow::new(m, "A", "Revenue", 1000.0)],
            cash: vec![CashRow { month: m, cash_usd: 3000.0 }],
            fx: vec![],
        }
    }

    #[test]
    fn test_board_report_sections() {
        let report = build_board_report(&Planner::default(), &data(), ym(2025, 6));

        assert_eq!(report.title, "FP&A Snapshot: Jun 2025");
        let titles: Vec<&str> = report.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Revenue vs Budget for Jun 2025", "Opex breakdown: Jun 2025", "EBITDA", "Cash Trend"]
        );
        assert_eq!(report.sections[2].text, "EBITDA for Jun 2025 was $250.");
        // 2025-05 lost 300, so burn is 300 and runway 10 months
        assert!(report.sections[3].text.contains("about 10.0 months"));
        assert!(report.sections[0].figure.is_some());
    }

    #[test]
    fn test_markdown_and_no_charts() {
        let planner = Planner::new(Box::new(NoCharts));
        let report = build_board_report(&planner, &data(), ym(2025, 6));
        assert!(report.sections.iter().all(|s| s.figure.is_none()));

        let md = report.to_markdown();
        assert!(md.starts_with("# FP&A Snapshot: Jun 2025\n\n"));
        assert!(md.contains("## EBITDA"));
        assert!(!md.contains("_Chart:"));
    }
}
