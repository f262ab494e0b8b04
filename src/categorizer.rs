//! Ratio categories, period labels and record export.

use crate::metrics::DerivedMetrics;
use crate::schema::{QUARTER, YEAR};
use crate::table::PeriodTable;
use crate::utils::period_end_date;
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::fmt;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub enum RatioCategory {
    #[serde(rename = "Per Share Value")]
    PerShareValue,
    #[serde(rename = "Growth Rate")]
    GrowthRate,
    #[serde(rename = "Profitability")]
    Profitability,
    #[serde(rename = "Valuation")]
    Valuation,
    #[serde(rename = "Leverage & Liquidity")]
    LeverageLiquidity,
    #[serde(rename = "Efficiency")]
    Efficiency,
}

impl RatioCategory {
    pub const ALL: [RatioCategory; 6] = [
        RatioCategory::PerShareValue,
        RatioCategory::GrowthRate,
        RatioCategory::Profitability,
        RatioCategory::Valuation,
        RatioCategory::LeverageLiquidity,
        RatioCategory::Efficiency,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            RatioCategory::PerShareValue => "Per Share Value",
            RatioCategory::GrowthRate => "Growth Rate",
            RatioCategory::Profitability => "Profitability",
            RatioCategory::Valuation => "Valuation",
            RatioCategory::LeverageLiquidity => "Leverage & Liquidity",
            RatioCategory::Efficiency => "Efficiency",
        }
    }
}

impl fmt::Display for RatioCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A reporting period identified by fiscal year and, for quarterly data,
/// the quarter number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    pub quarter: Option<u32>,
}

impl Period {
    /// Builds a period from table cells. Without a year there is no period;
    /// a quarter outside 1-4 is ignored.
    pub fn from_cells(year: Option<f64>, quarter: Option<f64>) -> Option<Self> {
        let year = year?;
        Some(Self {
            year: year.round() as i32,
            quarter: quarter
                .map(f64::round)
                .filter(|q| (1.0..=4.0).contains(q))
                .map(|q| q as u32),
        })
    }

    pub fn label(&self) -> String {
        match self.quarter {
            Some(quarter) => format!("Q{} {}", quarter, self.year),
            None => self.year.to_string(),
        }
    }

    /// Last calendar day of the period, if the quarter number is valid.
    pub fn end_date(&self) -> Option<NaiveDate> {
        period_end_date(self.year, self.quarter)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// `"Q<quarter> <year>"`, `"<year>"`, or an empty string when the year is
/// missing.
pub fn period_label(year: Option<f64>, quarter: Option<f64>) -> String {
    Period::from_cells(year, quarter)
        .map(|p| p.label())
        .unwrap_or_default()
}

/// One exported row: every table column except Quarter, in table column
/// order, plus the label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProfileRecord {
    pub formatted_quarter: String,
    #[serde(flatten)]
    pub values: Map<String, Value>,
}

impl ProfileRecord {
    pub fn get(&self, field: &str) -> Option<f64> {
        self.values.get(field).and_then(Value::as_f64)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.values.keys().map(String::as_str)
    }
}

/// Whole Year values are exported as integers, every other cell as a float.
fn cell_value(column: &str, value: Option<f64>) -> Value {
    match value {
        Some(v) if column == YEAR && v.fract() == 0.0 => Value::from(v as i64),
        Some(v) => Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null),
        None => Value::Null,
    }
}

/// Exports a table as records in period order. Every record carries the same
/// keys; null cells are kept as explicit nulls. The Quarter column is folded
/// into the label and dropped.
pub fn table_to_records(table: &PeriodTable) -> Vec<ProfileRecord> {
    let years = table.column(YEAR);
    let quarters = table.column(QUARTER);

    (0..table.len())
        .map(|position| {
            let year = years.and_then(|s| s.get(position));
            let quarter = quarters.and_then(|s| s.get(position));
            ProfileRecord {
                formatted_quarter: period_label(year, quarter),
                values: table
                    .row(position)
                    .filter(|(name, _)| *name != QUARTER)
                    .map(|(name, value)| (name.to_string(), cell_value(name, value)))
                    .collect(),
            }
        })
        .collect()
}

pub type CategorizedRatios = BTreeMap<RatioCategory, Vec<ProfileRecord>>;

/// Groups the derived metric tables under their six category names.
pub fn categorize(metrics: &DerivedMetrics) -> CategorizedRatios {
    metrics
        .iter()
        .map(|(category, table)| (category, table_to_records(table)))
        .collect()
}
