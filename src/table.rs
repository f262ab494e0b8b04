//! Period-indexed tables shared by every stage of the pipeline.

use crate::error::{FinancialProfileError, Result};
use crate::series::Series;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// First header level for two-level vendor tables (e.g. the ratio table).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub name: String,
    pub values: Series,
}

/// A table with one row per reporting period.
///
/// `index` carries the period index label of every row. It is preserved from
/// the raw input through normalization, and tables are aligned with each other
/// by label rather than by row position.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PeriodTable {
    index: Vec<usize>,
    columns: Vec<Column>,
}

impl PeriodTable {
    pub fn new(index: Vec<usize>) -> Result<Self> {
        let table = Self {
            index,
            columns: Vec::new(),
        };
        table.validate()?;
        Ok(table)
    }

    /// A table with `periods` rows indexed `0..periods`.
    pub fn with_periods(periods: usize) -> Self {
        Self {
            index: (0..periods).collect(),
            columns: Vec::new(),
        }
    }

    /// Builds a flat table from named columns; the period count is taken from
    /// the first column.
    pub fn from_columns<S, I>(columns: I) -> Result<Self>
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, Series)>,
    {
        let mut table: Option<Self> = None;
        for (name, values) in columns {
            let t = table.get_or_insert_with(|| Self::with_periods(values.len()));
            t.insert(name, values)?;
        }
        Ok(table.unwrap_or_default())
    }

    pub fn index(&self) -> &[usize] {
        &self.index
    }

    /// Number of periods.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// True when the table has no periods, regardless of its columns.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Inserts or replaces an ungrouped column. Replacing keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, values: Series) -> Result<()> {
        self.insert_column(Column {
            group: None,
            name: name.into(),
            values,
        })
    }

    pub fn insert_grouped(
        &mut self,
        group: impl Into<String>,
        name: impl Into<String>,
        values: Series,
    ) -> Result<()> {
        self.insert_column(Column {
            group: Some(group.into()),
            name: name.into(),
            values,
        })
    }

    pub fn insert_column(&mut self, column: Column) -> Result<()> {
        if column.values.len() != self.len() {
            return Err(FinancialProfileError::ColumnLengthMismatch {
                column: column.name,
                expected: self.len(),
                actual: column.values.len(),
            });
        }

        match self
            .columns
            .iter_mut()
            .find(|c| c.name == column.name && c.group == column.group)
        {
            Some(existing) => existing.values = column.values,
            None => self.columns.push(column),
        }
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<Column> {
        let pos = self.columns.iter().position(|c| c.name == name)?;
        Some(self.columns.remove(pos))
    }

    /// First column named `name`, in any group.
    pub fn column(&self, name: &str) -> Option<&Series> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.values)
    }

    /// Column `name` under `group`. A flat table (no grouped columns matching)
    /// falls back to an ungrouped column of the same name.
    pub fn column_in(&self, group: &str, name: &str) -> Option<&Series> {
        self.columns
            .iter()
            .find(|c| c.name == name && c.group.as_deref() == Some(group))
            .or_else(|| {
                self.columns
                    .iter()
                    .find(|c| c.name == name && c.group.is_none())
            })
            .map(|c| &c.values)
    }

    /// Column values, or an all-null series when the column is absent.
    pub fn series(&self, name: &str) -> Series {
        self.column(name)
            .cloned()
            .unwrap_or_else(|| Series::nulls(self.len()))
    }

    pub fn series_in(&self, group: &str, name: &str) -> Series {
        self.column_in(group, name)
            .cloned()
            .unwrap_or_else(|| Series::nulls(self.len()))
    }

    /// Re-indexes `values` (a column of this table) onto `target`, a period
    /// index of another table. Labels this table lacks become null.
    pub fn align(&self, values: &Series, target: &[usize]) -> Series {
        Series::new(
            target
                .iter()
                .map(|label| {
                    self.index
                        .iter()
                        .position(|l| l == label)
                        .and_then(|pos| values.get(pos))
                })
                .collect(),
        )
    }

    /// Row `position` as `(column name, value)` pairs in column order.
    pub fn row(&self, position: usize) -> impl Iterator<Item = (&str, Option<f64>)> + '_ {
        self.columns
            .iter()
            .map(move |c| (c.name.as_str(), c.values.get(position)))
    }

    /// Checks the table shape: unique index labels and one value per period
    /// in every column. Deserialized tables bypass the constructors, so the
    /// pipeline runs this on every raw input.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.index.len());
        for &label in &self.index {
            if !seen.insert(label) {
                return Err(FinancialProfileError::DuplicatePeriodIndex { index: label });
            }
        }

        for column in &self.columns {
            if column.values.len() != self.len() {
                return Err(FinancialProfileError::ColumnLengthMismatch {
                    column: column.name.clone(),
                    expected: self.len(),
                    actual: column.values.len(),
                });
            }
        }
        Ok(())
    }

    /// Fails with [`FinancialProfileError::MissingPeriodColumn`] when a table
    /// holding periods lacks an identifying column. Empty tables always pass.
    pub fn require_column(&self, table: &str, group: Option<&str>, name: &str) -> Result<()> {
        let present = match group {
            Some(g) => self.column_in(g, name).is_some(),
            None => self.has_column(name),
        };
        if self.is_empty() || present {
            return Ok(());
        }
        Err(FinancialProfileError::MissingPeriodColumn {
            table: table.to_string(),
            column: name.to_string(),
            rows: self.len(),
        })
    }

    pub fn to_csv(&self) -> String {
        let mut output = String::new();
        let header: Vec<String> = self.columns.iter().map(|c| csv_field(&c.name)).collect();
        output.push_str(&header.join(","));
        output.push('\n');

        for position in 0..self.len() {
            let cells: Vec<String> = self
                .row(position)
                .map(|(_, v)| v.map(|x| x.to_string()).unwrap_or_default())
                .collect();
            output.push_str(&cells.join(","));
            output.push('\n');
        }

        output
    }
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// The four raw vendor tables of one request.
///
/// Rows are aligned by period index across tables; any of them may be empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawStatementSet {
    #[serde(default)]
    pub income_statement: PeriodTable,
    #[serde(default)]
    pub balance_sheet: PeriodTable,
    #[serde(default)]
    pub cash_flow: PeriodTable,
    #[serde(default)]
    pub key_ratios: PeriodTable,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PeriodTable {
        PeriodTable::from_columns([
            ("yearReport", Series::from(vec![2022.0, 2023.0])),
            ("Net Sales", Series::from(vec![100.0, 120.0])),
        ])
        .unwrap()
    }

    #[test]
    fn test_missing_column_is_all_null() {
        let table = sample();
        assert_eq!(table.series("Cost of Sales").values(), &[None, None]);
        assert_eq!(table.series("Net Sales").get(1), Some(120.0));
    }

    #[test]
    fn test_insert_rejects_wrong_length() {
        let mut table = sample();
        let err = table
            .insert("Gross Profit", Series::from(vec![1.0]))
            .unwrap_err();
        assert!(matches!(
            err,
            FinancialProfileError::ColumnLengthMismatch { expected: 2, actual: 1, .. }
        ));
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut table = sample();
        table
            .insert("yearReport", Series::from(vec![2020.0, 2021.0]))
            .unwrap();
        assert_eq!(table.column_names(), vec!["yearReport", "Net Sales"]);
        assert_eq!(table.series("yearReport").get(0), Some(2020.0));
    }

    #[test]
    fn test_duplicate_index_rejected() {
        assert!(matches!(
            PeriodTable::new(vec![0, 1, 1]),
            Err(FinancialProfileError::DuplicatePeriodIndex { index: 1 })
        ));
    }

    #[test]
    fn test_validate_deserialized_shape() {
        let json = r#"{"index":[0,1],"columns":[{"name":"yearReport","values":[2023.0]}]}"#;
        let table: PeriodTable = serde_json::from_str(json).unwrap();
        assert!(matches!(
            table.validate(),
            Err(FinancialProfileError::ColumnLengthMismatch { actual: 1, .. })
        ));
    }

    #[test]
    fn test_grouped_lookup_falls_back_to_flat() {
        let mut grouped = PeriodTable::with_periods(1);
        grouped
            .insert_grouped("Chỉ tiêu định giá", "P/E", Series::from(vec![12.0]))
            .unwrap();
        grouped
            .insert_grouped("Other", "P/E", Series::from(vec![99.0]))
            .unwrap();
        assert_eq!(grouped.series_in("Chỉ tiêu định giá", "P/E").get(0), Some(12.0));

        let flat = PeriodTable::from_columns([("P/E", Series::from(vec![8.0]))]).unwrap();
        assert_eq!(flat.series_in("Chỉ tiêu định giá", "P/E").get(0), Some(8.0));
    }

    #[test]
    fn test_align_by_index_label() {
        let mut table = PeriodTable::new(vec![3, 4]).unwrap();
        table.insert("x", Series::from(vec![30.0, 40.0])).unwrap();
        let aligned = table.align(table.column("x").unwrap(), &[4, 5, 3]);
        assert_eq!(aligned.values(), &[Some(40.0), None, Some(30.0)]);
    }

    #[test]
    fn test_require_column() {
        let table = sample();
        assert!(table.require_column("income_statement", None, "yearReport").is_ok());
        assert!(table
            .require_column("income_statement", None, "lengthReport")
            .is_err());
        assert!(PeriodTable::default()
            .require_column("income_statement", None, "lengthReport")
            .is_ok());
    }

    #[test]
    fn test_to_csv() {
        let mut table = sample();
        table
            .insert("Other, net", Series::from(vec![None, Some(1.5)]))
            .unwrap();
        let csv = table.to_csv();
        assert_eq!(
            csv,
            "yearReport,Net Sales,\"Other, net\"\n2022,100,\n2023,120,1.5\n"
        );
    }
}
