//! Builds raw tables from record-oriented JSON, the shape tabular vendor data
//! takes once exported row by row.

use crate::error::{FinancialProfileError, Result};
use crate::series::Series;
use crate::table::{PeriodTable, RawStatementSet};
use log::debug;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Record key carrying the period index label, when the exporter kept it.
pub const INDEX_FIELD: &str = "index";

/// Separator between group and name in two-level column keys,
/// e.g. `"Chỉ tiêu định giá::P/E"`.
pub const GROUP_SEPARATOR: &str = "::";

fn cell_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn index_label(position: usize, record: &Map<String, Value>) -> Result<usize> {
    match record.get(INDEX_FIELD) {
        None => Ok(position),
        Some(value) => value
            .as_u64()
            .and_then(|v| usize::try_from(v).ok())
            .ok_or_else(|| {
                FinancialProfileError::InvalidRecord(format!(
                    "record #{} has non-integer '{}' value {}",
                    position, INDEX_FIELD, value
                ))
            }),
    }
}

/// Converts records (one JSON object per period) into a [`PeriodTable`].
///
/// Columns appear in first-seen key order. Numbers and numeric strings become
/// values; nulls, missing keys and non-numeric values become nulls. Keys of the
/// form `group::name` become grouped columns.
pub fn table_from_records(records: &[Value]) -> Result<PeriodTable> {
    let mut objects = Vec::with_capacity(records.len());
    for (position, record) in records.iter().enumerate() {
        let object = record.as_object().ok_or_else(|| {
            FinancialProfileError::InvalidRecord(format!("record #{} is not an object", position))
        })?;
        objects.push(object);
    }

    let index = objects
        .iter()
        .enumerate()
        .map(|(position, record)| index_label(position, record))
        .collect::<Result<Vec<_>>>()?;
    let mut table = PeriodTable::new(index)?;

    let mut keys: Vec<&str> = Vec::new();
    for object in &objects {
        for key in object.keys() {
            if key != INDEX_FIELD && !keys.contains(&key.as_str()) {
                keys.push(key);
            }
        }
    }

    for key in keys {
        let values = Series::new(
            objects
                .iter()
                .map(|record| record.get(key).and_then(cell_value))
                .collect(),
        );
        match key.split_once(GROUP_SEPARATOR) {
            Some((group, name)) => table.insert_grouped(group, name, values)?,
            None => table.insert(key, values)?,
        }
    }

    debug!(
        "Ingested {} records into {} columns",
        table.len(),
        table.columns().len()
    );

    Ok(table)
}

#[derive(Deserialize)]
struct RecordSet {
    #[serde(default)]
    income_statement: Vec<Value>,
    #[serde(default)]
    balance_sheet: Vec<Value>,
    #[serde(default)]
    cash_flow: Vec<Value>,
    #[serde(default)]
    key_ratios: Vec<Value>,
}

impl RawStatementSet {
    /// Reads the four raw tables from a JSON object holding one record array
    /// per table. Absent tables are read as empty.
    pub fn from_records_json(json: &str) -> Result<Self> {
        let records: RecordSet = serde_json::from_str(json)?;
        Ok(Self {
            income_statement: table_from_records(&records.income_statement)?,
            balance_sheet: table_from_records(&records.balance_sheet)?,
            cash_flow: table_from_records(&records.cash_flow)?,
            key_ratios: table_from_records(&records.key_ratios)?,
        })
    }
}
