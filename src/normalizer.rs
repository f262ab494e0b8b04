//! Statement normalization: raw vendor tables to canonical columns.

use crate::error::Result;
use crate::schema::{
    ratio_fields, registry, EntityType, FieldMapping, PeriodGranularity, RatioField,
    StatementKind, QUARTER, QUARTER_SOURCE, YEAR_SOURCE,
};
use crate::series::Series;
use crate::table::PeriodTable;
use log::debug;
use serde::{Deserialize, Serialize};

pub const EPS: &str = "EPS";
pub const OUTSTANDING_SHARE: &str = "Outstanding Share";
pub const EBITDA: &str = "EBITDA";
pub const EBIT: &str = "EBIT";
pub const FREE_CASH_FLOW: &str = "Free cash flow";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedStatement {
    pub kind: StatementKind,
    pub entity_type: EntityType,
    pub table: PeriodTable,
}

impl NormalizedStatement {
    pub fn series(&self, canonical: &str) -> Series {
        self.table.series(canonical)
    }
}

/// The three normalized statements of one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedStatements {
    pub income_statement: NormalizedStatement,
    pub balance_sheet: NormalizedStatement,
    pub cash_flow: NormalizedStatement,
}

/// Copies every mapped column of `raw` into a new table carrying exactly the
/// canonical columns of `mapping`, in mapping order.
///
/// Unmapped fields, and mapped fields whose source column `raw` lacks, are
/// filled with nulls. The Quarter field is left out entirely for yearly data.
/// The period index of `raw` is preserved.
pub fn apply_mapping(
    mapping: &[FieldMapping],
    granularity: PeriodGranularity,
    raw: &PeriodTable,
) -> Result<PeriodTable> {
    let mut table = PeriodTable::new(raw.index().to_vec())?;

    for field in mapping {
        if field.canonical == QUARTER && !granularity.is_quarterly() {
            continue;
        }

        let values = match field.source.and_then(|source| raw.column(source)) {
            Some(values) => values.clone(),
            None => {
                if !raw.is_empty() {
                    debug!(
                        "No source column for '{}' (mapped from {:?})",
                        field.canonical, field.source
                    );
                }
                Series::nulls(raw.len())
            }
        };
        table.insert(field.canonical, values)?;
    }

    Ok(table)
}

pub struct StatementNormalizer {
    entity_type: EntityType,
    granularity: PeriodGranularity,
}

impl StatementNormalizer {
    pub fn new(entity_type: EntityType, granularity: PeriodGranularity) -> Self {
        Self {
            entity_type,
            granularity,
        }
    }

    /// Normalizes one raw statement against the registry. A table holding
    /// periods must carry the period columns; an empty table yields the full
    /// canonical column set with zero rows.
    pub fn normalize(&self, kind: StatementKind, raw: &PeriodTable) -> Result<NormalizedStatement> {
        raw.validate()?;
        raw.require_column(kind.table_name(), None, YEAR_SOURCE)?;
        if self.granularity.is_quarterly() {
            raw.require_column(kind.table_name(), None, QUARTER_SOURCE)?;
        }

        let table = apply_mapping(registry(self.entity_type, kind), self.granularity, raw)?;
        debug!(
            "Normalized {} into {} columns over {} periods",
            kind.table_name(),
            table.columns().len(),
            table.len()
        );

        Ok(NormalizedStatement {
            kind,
            entity_type: self.entity_type,
            table,
        })
    }

    /// Normalizes the income statement and appends the per-share and earnings
    /// columns the vendor only publishes in the ratio table.
    pub fn normalize_income(
        &self,
        raw: &PeriodTable,
        key_ratios: &PeriodTable,
    ) -> Result<NormalizedStatement> {
        let mut statement = self.normalize(StatementKind::IncomeStatement, raw)?;

        let mut appended: Vec<(&str, RatioField)> = vec![
            (EPS, ratio_fields::EPS),
            (OUTSTANDING_SHARE, ratio_fields::OUTSTANDING_SHARES),
        ];
        if self.entity_type == EntityType::Standard {
            appended.push((EBITDA, ratio_fields::EBITDA));
            appended.push((EBIT, ratio_fields::EBIT));
        }

        for (name, field) in appended {
            let values = key_ratios.align(
                &key_ratios.series_in(field.group, field.name),
                statement.table.index(),
            );
            statement.table.insert(name, values)?;
        }

        Ok(statement)
    }

    /// Normalizes the cash flow statement and appends free cash flow
    /// (operating cash flow plus the negatively signed capital expenditure).
    pub fn normalize_cash_flow(&self, raw: &PeriodTable) -> Result<NormalizedStatement> {
        let mut statement = self.normalize(StatementKind::CashFlow, raw)?;
        let free_cash_flow =
            &statement.series("Operating cash flow") + &statement.series("Capital expenditure");
        statement.table.insert(FREE_CASH_FLOW, free_cash_flow)?;
        Ok(statement)
    }

    pub fn normalize_all(
        &self,
        income_statement: &PeriodTable,
        balance_sheet: &PeriodTable,
        cash_flow: &PeriodTable,
        key_ratios: &PeriodTable,
    ) -> Result<NormalizedStatements> {
        Ok(NormalizedStatements {
            income_statement: self.normalize_income(income_statement, key_ratios)?,
            balance_sheet: self.normalize(StatementKind::BalanceSheet, balance_sheet)?,
            cash_flow: self.normalize_cash_flow(cash_flow)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FinancialProfileError;
    use crate::schema::{canonical_fields, ratio_groups, YEAR};

    fn raw_cash_flow() -> PeriodTable {
        PeriodTable::from_columns([
            ("yearReport", Series::from(vec![2022.0, 2023.0])),
            (
                "Net cash inflows/outflows from operating activities",
                Series::from(vec![50.0, 60.0]),
            ),
            (
                "Purchase of fixed assets",
                Series::from(vec![None, Some(-10.0)]),
            ),
            ("Some vendor-only column", Series::from(vec![1.0, 2.0])),
        ])
        .unwrap()
    }

    #[test]
    fn test_every_canonical_column_present() {
        let normalizer = StatementNormalizer::new(EntityType::Standard, PeriodGranularity::Year);
        let raw = PeriodTable::from_columns([("yearReport", Series::from(vec![2023.0]))]).unwrap();
        let statement = normalizer.normalize(StatementKind::BalanceSheet, &raw).unwrap();

        assert_eq!(
            statement.table.column_names(),
            canonical_fields(
                EntityType::Standard,
                StatementKind::BalanceSheet,
                PeriodGranularity::Year
            )
        );
        assert_eq!(statement.series("TOTAL ASSETS").values(), &[None]);
        assert_eq!(statement.series(YEAR).get(0), Some(2023.0));
    }

    #[test]
    fn test_vendor_columns_dropped_and_order_follows_registry() {
        let normalizer = StatementNormalizer::new(EntityType::Depository, PeriodGranularity::Year);
        let statement = normalizer.normalize_cash_flow(&raw_cash_flow()).unwrap();
        let names = statement.table.column_names();

        assert!(!names.contains(&"Some vendor-only column"));
        assert_eq!(names.first(), Some(&"Year"));
        assert_eq!(names.last(), Some(&FREE_CASH_FLOW));
    }

    #[test]
    fn test_free_cash_flow_per_period_null() {
        let normalizer = StatementNormalizer::new(EntityType::Standard, PeriodGranularity::Year);
        let statement = normalizer.normalize_cash_flow(&raw_cash_flow()).unwrap();
        assert_eq!(statement.series(FREE_CASH_FLOW).values(), &[None, Some(50.0)]);
    }

    #[test]
    fn test_quarter_column_only_for_quarterly() {
        let mut raw = raw_cash_flow();
        raw.insert("lengthReport", Series::from(vec![3.0, 4.0])).unwrap();

        let yearly = StatementNormalizer::new(EntityType::Standard, PeriodGranularity::Year)
            .normalize(StatementKind::CashFlow, &raw)
            .unwrap();
        assert!(!yearly.table.has_column(QUARTER));

        let quarterly = StatementNormalizer::new(EntityType::Standard, PeriodGranularity::Quarter)
            .normalize(StatementKind::CashFlow, &raw)
            .unwrap();
        assert_eq!(quarterly.table.column_names()[1], QUARTER);
        assert_eq!(quarterly.series(QUARTER).get(1), Some(4.0));
    }

    #[test]
    fn test_missing_period_column_is_an_error() {
        let raw = PeriodTable::from_columns([("Net Sales", Series::from(vec![1.0]))]).unwrap();
        let err = StatementNormalizer::new(EntityType::Standard, PeriodGranularity::Year)
            .normalize(StatementKind::IncomeStatement, &raw)
            .unwrap_err();
        assert!(matches!(
            err,
            FinancialProfileError::MissingPeriodColumn { ref column, .. } if column == "yearReport"
        ));

        let quarterly = StatementNormalizer::new(EntityType::Standard, PeriodGranularity::Quarter)
            .normalize(StatementKind::CashFlow, &raw_cash_flow());
        assert!(quarterly.is_err());
    }

    #[test]
    fn test_empty_table_keeps_shape() {
        let statement = StatementNormalizer::new(EntityType::Depository, PeriodGranularity::Quarter)
            .normalize(StatementKind::BalanceSheet, &PeriodTable::default())
            .unwrap();
        assert!(statement.table.is_empty());
        assert_eq!(
            statement.table.column_names(),
            canonical_fields(
                EntityType::Depository,
                StatementKind::BalanceSheet,
                PeriodGranularity::Quarter
            )
        );
    }

    #[test]
    fn test_unmapped_field_is_null() {
        let mapping = [
            FieldMapping {
                canonical: "Year",
                source: Some("yearReport"),
            },
            FieldMapping {
                canonical: "Deposits from customers",
                source: None,
            },
        ];
        let raw = PeriodTable::from_columns([
            ("yearReport", Series::from(vec![2023.0])),
            ("Deposits from customers", Series::from(vec![7.0])),
        ])
        .unwrap();
        let table = apply_mapping(&mapping, PeriodGranularity::Year, &raw).unwrap();
        assert_eq!(table.series("Deposits from customers").values(), &[None]);
    }

    #[test]
    fn test_income_appends_ratio_columns_by_entity_type() {
        let raw = PeriodTable::from_columns([
            ("yearReport", Series::from(vec![2023.0])),
            ("Net Sales", Series::from(vec![100.0])),
        ])
        .unwrap();
        let mut ratios = PeriodTable::with_periods(1);
        ratios
            .insert_grouped(ratio_groups::VALUATION, "EPS (VND)", Series::from(vec![1500.0]))
            .unwrap();
        ratios
            .insert_grouped(ratio_groups::PROFITABILITY, "EBIT (Bn. VND)", Series::from(vec![20.0]))
            .unwrap();

        let standard = StatementNormalizer::new(EntityType::Standard, PeriodGranularity::Year)
            .normalize_income(&raw, &ratios)
            .unwrap();
        assert_eq!(standard.series(EPS).get(0), Some(1500.0));
        assert_eq!(standard.series(EBIT).get(0), Some(20.0));
        assert_eq!(standard.series(OUTSTANDING_SHARE).values(), &[None]);
        assert_eq!(standard.series("Net sales").get(0), Some(100.0));

        let bank = StatementNormalizer::new(EntityType::Depository, PeriodGranularity::Year)
            .normalize_income(&raw, &ratios)
            .unwrap();
        assert!(bank.table.has_column(EPS));
        assert!(!bank.table.has_column(EBITDA));
        assert!(!bank.table.has_column(EBIT));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let normalizer = StatementNormalizer::new(EntityType::Standard, PeriodGranularity::Year);
        let raw = raw_cash_flow();
        assert_eq!(
            normalizer.normalize_cash_flow(&raw).unwrap(),
            normalizer.normalize_cash_flow(&raw).unwrap()
        );
    }
}
