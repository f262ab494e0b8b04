//! # Financial Profile Builder
//!
//! Turns raw, vendor-specific financial statement tables (income statement,
//! balance sheet, cash flow and the vendor ratio table) into a normalized,
//! chart-ready financial profile.
//!
//! ## Pipeline
//!
//! - **Classification**: the income statement's column set decides whether the
//!   entity is a [`EntityType::Standard`] business or a bank-like
//!   [`EntityType::Depository`].
//! - **Normalization**: each statement is mapped onto the canonical columns of
//!   the [schema registry](schema) for that entity type. Missing source columns
//!   become nulls, so the output shape never depends on the input.
//! - **Derived metrics**: per-share, growth, profitability, valuation,
//!   leverage/liquidity and efficiency metrics, computed with null-propagating
//!   arithmetic ([`Series`]).
//! - **Categorization**: every table is exported as records labelled with
//!   their period (`"Q3 2023"` or `"2023"`).
//!
//! ## Example
//!
//! ```rust,ignore
//! use financial_profile_builder::*;
//!
//! let raw = RawStatementSet::from_records_json(&vendor_json)?;
//! let request = ProfileRequest {
//!     ticker: "VNM".to_string(),
//!     granularity: PeriodGranularity::Quarter,
//! };
//!
//! let profile = build_financial_profile(&request, &raw)?;
//! for record in &profile.categorized_ratios[&RatioCategory::Profitability] {
//!     println!("{}: {:?}", record.formatted_quarter, record.get("ROE"));
//! }
//! ```

pub mod categorizer;
pub mod classifier;
pub mod error;
pub mod ingestion;
pub mod metrics;
pub mod normalizer;
pub mod schema;
pub mod series;
pub mod table;
pub mod utils;

pub use categorizer::{
    categorize, period_label, table_to_records, CategorizedRatios, Period, ProfileRecord,
    RatioCategory,
};
pub use classifier::{classify_entity, BANK_INDICATORS};
pub use error::{FinancialProfileError, Result};
pub use ingestion::table_from_records;
pub use metrics::{DerivedMetrics, MetricsEngine};
pub use normalizer::{NormalizedStatement, NormalizedStatements, StatementNormalizer};
pub use schema::{EntityType, FieldMapping, PeriodGranularity, StatementKind};
pub use series::Series;
pub use table::{PeriodTable, RawStatementSet};

use log::{debug, info};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// What to build: one entity at one period granularity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ProfileRequest {
    #[schemars(description = "Ticker or other identifier of the reporting entity")]
    pub ticker: String,

    #[serde(default)]
    #[schemars(description = "Reporting period granularity: 'year' or 'quarter'")]
    pub granularity: PeriodGranularity,
}

/// Normalized statements and categorized ratios for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FinancialProfile {
    pub ticker: String,
    pub granularity: PeriodGranularity,
    pub entity_type: EntityType,
    pub transformed_income_statement: Vec<ProfileRecord>,
    pub transformed_balance_sheet: Vec<ProfileRecord>,
    pub transformed_cash_flow: Vec<ProfileRecord>,
    pub categorized_ratios: CategorizedRatios,
}

impl FinancialProfile {
    pub fn is_depository(&self) -> bool {
        self.entity_type == EntityType::Depository
    }

    pub fn ratios(&self, category: RatioCategory) -> &[ProfileRecord] {
        self.categorized_ratios
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Reverses every record sequence for "most recent first" display.
    pub fn most_recent_first(mut self) -> Self {
        self.transformed_income_statement.reverse();
        self.transformed_balance_sheet.reverse();
        self.transformed_cash_flow.reverse();
        for records in self.categorized_ratios.values_mut() {
            records.reverse();
        }
        self
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(FinancialProfile)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

/// Intermediate results of one run, for callers that need the tables rather
/// than exported records.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileTables {
    pub entity_type: EntityType,
    pub statements: NormalizedStatements,
    pub metrics: DerivedMetrics,
}

pub struct FinancialProfileProcessor;

impl FinancialProfileProcessor {
    pub fn process(request: &ProfileRequest, raw: &RawStatementSet) -> Result<FinancialProfile> {
        let tables = Self::process_tables(request, raw)?;

        let profile = FinancialProfile {
            ticker: request.ticker.clone(),
            granularity: request.granularity,
            entity_type: tables.entity_type,
            transformed_income_statement: table_to_records(
                &tables.statements.income_statement.table,
            ),
            transformed_balance_sheet: table_to_records(&tables.statements.balance_sheet.table),
            transformed_cash_flow: table_to_records(&tables.statements.cash_flow.table),
            categorized_ratios: categorize(&tables.metrics),
        };

        Ok(profile)
    }

    pub fn process_tables(
        request: &ProfileRequest,
        raw: &RawStatementSet,
    ) -> Result<ProfileTables> {
        ensure_registry_valid()?;

        info!(
            "Building {} financial profile for {}",
            request.granularity, request.ticker
        );
        debug!(
            "Raw tables: income {}x{}, balance {}x{}, cash flow {}x{}, ratios {}x{}",
            raw.income_statement.len(),
            raw.income_statement.columns().len(),
            raw.balance_sheet.len(),
            raw.balance_sheet.columns().len(),
            raw.cash_flow.len(),
            raw.cash_flow.columns().len(),
            raw.key_ratios.len(),
            raw.key_ratios.columns().len()
        );

        let entity_type = classify_entity(&raw.income_statement);
        info!("{} classified as {:?}", request.ticker, entity_type);

        let statements = StatementNormalizer::new(entity_type, request.granularity).normalize_all(
            &raw.income_statement,
            &raw.balance_sheet,
            &raw.cash_flow,
            &raw.key_ratios,
        )?;
        let metrics = MetricsEngine::new(entity_type, request.granularity)
            .compute(&statements, &raw.key_ratios)?;

        Ok(ProfileTables {
            entity_type,
            statements,
            metrics,
        })
    }
}

pub fn build_financial_profile(
    request: &ProfileRequest,
    raw: &RawStatementSet,
) -> Result<FinancialProfile> {
    FinancialProfileProcessor::process(request, raw)
}

fn ensure_registry_valid() -> Result<()> {
    static REGISTRY_CHECK: OnceLock<std::result::Result<(), String>> = OnceLock::new();
    REGISTRY_CHECK
        .get_or_init(|| schema::validate_registry().map_err(|e| e.to_string()))
        .clone()
        .map_err(FinancialProfileError::InvalidRegistry)
}
