//! Ledger loader
//!
//! Reads the four ledger sheets (`actuals`, `budget`, `fx`, `cash`) from a
//! directory of CSV files and projects every P&L amount to USD. Any problem
//! here is a `DataLoad` error and aborts before the core sees the data.

use crate::error::CopilotError;
use crate::models::{CashRow, FinanceData, FxRate, LedgerRow};
use crate::month::Month;
use crate::Result;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::{BTreeSet, HashMap};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Sheets every ledger directory must provide
pub const REQUIRED_SHEETS: &[&str] = &["actuals", "budget", "fx", "cash"];

const PL_COLUMNS: &[&str] = &["month", "entity", "account_category", "amount", "currency"];
const FX_COLUMNS: &[&str] = &["month", "currency", "rate_to_usd"];
const CASH_COLUMNS: &[&str] = &["month", "cash_usd"];

/// Missing-rate examples quoted in the error message
const MAX_MISSING_EXAMPLES: usize = 5;

/// A raw sheet: lower-cased header names plus string records
struct Sheet {
    name: String,
    columns: HashMap<String, usize>,
    records: Vec<StringRecord>,
}

impl Sheet {
    fn read<R: Read>(name: &str, reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);

        let columns = rdr
            .headers()?
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_lowercase(), i))
            .collect();

        let records = rdr.records().collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            name: name.to_string(),
            columns,
            records,
        })
    }

    fn require(&self, required: &[&str]) -> Result<()> {
        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|col| !self.columns.contains_key(*col))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(CopilotError::DataLoad(format!(
                "{} sheet missing columns: {}",
                self.name,
                missing.join(", ")
            )))
        }
    }

    fn cell<'r>(&self, record: &'r StringRecord, column: &str, line: usize) -> Result<&'r str> {
        self.columns
            .get(column)
            .and_then(|&i| record.get(i))
            .ok_or_else(|| {
                CopilotError::DataLoad(format!(
                    "{} row {}: missing value for '{}'",
                    self.name, line, column
                ))
            })
    }

    fn month(&self, record: &StringRecord, line: usize) -> Result<Month> {
        let raw = self.cell(record, "month", line)?;
        Month::parse(raw).map_err(|e| {
            CopilotError::DataLoad(format!("{} row {}: {}", self.name, line, e))
        })
    }

    fn number(&self, record: &StringRecord, column: &str, line: usize) -> Result<f64> {
        let raw = self.cell(record, column, line)?;
        raw.replace(',', "").parse::<f64>().map_err(|e| {
            CopilotError::DataLoad(format!(
                "{} row {}: invalid {} '{}': {}",
                self.name, line, column, raw, e
            ))
        })
    }
}

/// Load and normalize a ledger directory holding `<sheet>.csv` files
pub fn load_finance_data(dir: impl AsRef<Path>) -> Result<FinanceData> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(CopilotError::DataLoad(format!(
            "Ledger directory not found: {}",
            dir.display()
        )));
    }

    let missing: Vec<&str> = REQUIRED_SHEETS
        .iter()
        .copied()
        .filter(|sheet| !dir.join(format!("{}.csv", sheet)).is_file())
        .collect();
    if !missing.is_empty() {
        return Err(CopilotError::DataLoad(format!(
            "Missing sheet(s) in {}: {}",
            dir.display(),
            missing.join(", ")
        )));
    }

    let open = |sheet: &str| -> Result<Sheet> {
        let path = dir.join(format!("{}.csv", sheet));
        debug!(path = %path.display(), "Reading ledger sheet");
        Sheet::read(sheet, std::fs::File::open(path)?)
    };

    let data = build_finance_data(open("actuals")?, open("budget")?, open("fx")?, open("cash")?)?;

    info!(
        dir = %dir.display(),
        actuals = data.actuals.len(),
        budget = data.budget.len(),
        cash = data.cash.len(),
        fx = data.fx.len(),
        "Ledger loaded"
    );

    Ok(data)
}

/// Same as [`load_finance_data`] but from in-memory CSV text, in sheet order
pub fn load_finance_data_from_readers<A, B, F, C>(
    actuals: A,
    budget: B,
    fx: F,
    cash: C,
) -> Result<FinanceData>
where
    A: Read,
    B: Read,
    F: Read,
    C: Read,
{
    build_finance_data(
        Sheet::read("actuals", actuals)?,
        Sheet::read("budget", budget)?,
        Sheet::read("fx", fx)?,
        Sheet::read("cash", cash)?,
    )
}

fn build_finance_data(actuals: Sheet, budget: Sheet, fx: Sheet, cash: Sheet) -> Result<FinanceData> {
    let fx = read_fx(&fx)?;
    let rates = index_rates(&fx)?;

    Ok(FinanceData {
        actuals: project_usd(&actuals, &rates)?,
        budget: project_usd(&budget, &rates)?,
        cash: read_cash(&cash)?,
        fx,
    })
}

fn read_fx(sheet: &Sheet) -> Result<Vec<FxRate>> {
    sheet.require(FX_COLUMNS)?;

    sheet
        .records
        .iter()
        .enumerate()
        .map(|(i, record)| -> Result<FxRate> {
            let line = i + 2;
            Ok(FxRate {
                month: sheet.month(record, line)?,
                currency: sheet.cell(record, "currency", line)?.to_uppercase(),
                rate_to_usd: sheet.number(record, "rate_to_usd", line)?,
            })
        })
        .collect()
}

/// (month, currency) -> rate; a key may appear once
fn index_rates(fx: &[FxRate]) -> Result<HashMap<(Month, String), f64>> {
    let mut rates = HashMap::with_capacity(fx.len());
    for rate in fx {
        let key = (rate.month, rate.currency.clone());
        if rates.insert(key, rate.rate_to_usd).is_some() {
            return Err(CopilotError::DataLoad(format!(
                "Duplicate FX rate for ({}, {})",
                rate.month, rate.currency
            )));
        }
    }
    Ok(rates)
}

fn project_usd(sheet: &Sheet, rates: &HashMap<(Month, String), f64>) -> Result<Vec<LedgerRow>> {
    sheet.require(PL_COLUMNS)?;

    let mut rows = Vec::with_capacity(sheet.records.len());
    let mut missing_rates: BTreeSet<(Month, String)> = BTreeSet::new();

    for (i, record) in sheet.records.iter().enumerate() {
        let line = i + 2;
        let month = sheet.month(record, line)?;
        let currency = sheet.cell(record, "currency", line)?.to_uppercase();
        let amount = sheet.number(record, "amount", line)?;

        let Some(rate) = rates.get(&(month, currency.clone())) else {
            missing_rates.insert((month, currency));
            continue;
        };

        rows.push(LedgerRow {
            month,
            entity: sheet.cell(record, "entity", line)?.to_string(),
            account_category: sheet.cell(record, "account_category", line)?.to_string(),
            amount_usd: amount * rate,
        });
    }

    if !missing_rates.is_empty() {
        let sample: Vec<String> = missing_rates
            .iter()
            .take(MAX_MISSING_EXAMPLES)
            .map(|(month, currency)| format!("({}, {})", month, currency))
            .collect();
        return Err(CopilotError::DataLoad(format!(
            "Missing FX rate_to_usd in {} sheet for some (month, currency). Examples: {}",
            sheet.name,
            sample.join(", ")
        )));
    }

    Ok(rows)
}

fn read_cash(sheet: &Sheet) -> Result<Vec<CashRow>> {
    sheet.require(CASH_COLUMNS).map_err(|_| {
        CopilotError::DataLoad("cash sheet must have columns: month, cash_usd".to_string())
    })?;

    sheet
        .records
        .iter()
        .enumerate()
        .map(|(i, record)| -> Result<CashRow> {
            let line = i + 2;
            Ok(CashRow {
                month: sheet.month(record, line)?,
                cash_usd: sheet.number(record, "cash_usd", line)?,
            })
        })
        .collect()
}
