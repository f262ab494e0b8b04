//! Canonical schema registry.
//!
//! Static field mappings from canonical statement columns to the raw vendor
//! column names, one table per `(EntityType, StatementKind)`. The vendor
//! literals are matched exactly (case and spacing included). A mapped column
//! that a particular entity's data lacks degrades to null in the normalizer.

use crate::error::{FinancialProfileError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum EntityType {
    #[schemars(description = "Business reporting net sales and cost of goods sold")]
    Standard,

    #[schemars(description = "Bank-like entity reporting interest income and credit provisions")]
    Depository,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    IncomeStatement,
    BalanceSheet,
    CashFlow,
}

impl StatementKind {
    pub const ALL: [StatementKind; 3] = [
        StatementKind::IncomeStatement,
        StatementKind::BalanceSheet,
        StatementKind::CashFlow,
    ];

    /// Name of the raw input table for this statement.
    pub fn table_name(&self) -> &'static str {
        match self {
            StatementKind::IncomeStatement => "income_statement",
            StatementKind::BalanceSheet => "balance_sheet",
            StatementKind::CashFlow => "cash_flow",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PeriodGranularity {
    #[default]
    Year,
    Quarter,
}

impl PeriodGranularity {
    pub fn is_quarterly(&self) -> bool {
        matches!(self, PeriodGranularity::Quarter)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodGranularity::Year => "year",
            PeriodGranularity::Quarter => "quarter",
        }
    }
}

impl fmt::Display for PeriodGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PeriodGranularity {
    type Err = FinancialProfileError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "year" => Ok(PeriodGranularity::Year),
            "quarter" => Ok(PeriodGranularity::Quarter),
            other => Err(FinancialProfileError::InvalidGranularity(other.to_string())),
        }
    }
}

/// One canonical column and the raw column it is copied from. `source: None`
/// means the entity type has no analog and the column is always null.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
    pub canonical: &'static str,
    pub source: Option<&'static str>,
}

const fn field(canonical: &'static str, source: &'static str) -> FieldMapping {
    FieldMapping {
        canonical,
        source: Some(source),
    }
}

pub const YEAR: &str = "Year";
pub const QUARTER: &str = "Quarter";
pub const YEAR_SOURCE: &str = "yearReport";
pub const QUARTER_SOURCE: &str = "lengthReport";

const YEAR_FIELD: FieldMapping = field(YEAR, YEAR_SOURCE);
const QUARTER_FIELD: FieldMapping = field(QUARTER, QUARTER_SOURCE);

pub const STANDARD_INCOME: &[FieldMapping] = &[
    YEAR_FIELD,
    QUARTER_FIELD,
    field("Sales", "Sales"),
    field("Sales deductions", "Sales deductions"),
    field("Net sales", "Net Sales"),
    field("Cost of goods sold", "Cost of Sales"),
    field("Gross profit", "Gross Profit"),
    field("Financial income", "Financial Income"),
    field("Financial expenses", "Financial Expenses"),
    field("Including: Interest expense", "Interest Expenses"),
    field("Selling expenses", "Selling Expenses"),
    field("General & administrative expenses", "General & Admin Expenses"),
    field("Operating income", "Operating Profit/Loss"),
    field("Other income (expense)", "Net other income/expenses"),
    field("Other income", "Other income"),
    field("Other expenses", "Other Income/Expenses"),
    field("Profit before tax", "Profit before tax"),
    field("Business income tax - current", "Business income tax - current"),
    field("Business income tax - deferred", "Business income tax - deferred"),
    field("Net profit", "Net Profit For the Year"),
    field("Attributable to parent company", "Attributable to parent company"),
    field("Minority interest", "Minority Interest"),
];

pub const DEPOSITORY_INCOME: &[FieldMapping] = &[
    YEAR_FIELD,
    QUARTER_FIELD,
    field("Net interest income", "Net Interest Income"),
    field("Interest and similar income", "Interest and Similar Income"),
    field("Interest and similar expenses", "Interest and Similar Expenses"),
    field("Net fee and commission income", "Net Fee and Commission Income"),
    field("Fees and commission income", "Fees and Comission Income"),
    field("Fees and commission expenses", "Fees and Comission Expenses"),
    field(
        "Net gain (loss) from trading of foreign currencies",
        "Net gain (loss) from foreign currency and gold dealings",
    ),
    field(
        "Net gain from trading of held-for-trading securities",
        "Net gain (loss) from trading of trading securities",
    ),
    field(
        "Net gain from trading of investment securities",
        "Net gain (loss) from disposal of investment securities",
    ),
    field("Net other income/expenses", "Net Other income/expenses"),
    field("Other income", "Net Other income/(expenses)"),
    field("Other expenses", "Other expenses"),
    field("Income from investments in other entities", "Dividends received"),
    field("Operating expenses", "General & Admin Expenses"),
    field(
        "Operating income before allowance for credit losses",
        "Operating Profit before Provision",
    ),
    field("Allowance expenses for credit losses", "Provision for credit losses"),
    field("Profit before tax", "Profit before tax"),
    field("Corporate income tax", "Tax For the Year"),
    field("Business income tax - current", "Business income tax - current"),
    field("Business income tax - deferred", "Business income tax - deferred"),
    field("Net Profit", "Net Profit For the Year"),
    field("Attributable to parent company", "Attributable to parent company"),
    field("Minority interest", "Minority Interest"),
];

pub const STANDARD_BALANCE: &[FieldMapping] = &[
    YEAR_FIELD,
    QUARTER_FIELD,
    field("TOTAL ASSETS", "TOTAL ASSETS (Bn. VND)"),
    field("CURRENT ASSETS", "CURRENT ASSETS (Bn. VND)"),
    field("Cash and cash equivalents", "Cash and cash equivalents (Bn. VND)"),
    field("Short-term investments", "Short-term investments (Bn. VND)"),
    field("Short-term receivables", "Accounts receivable (Bn. VND)"),
    field("Net inventories", "Net Inventories"),
    field("Other current assets", "Other current assets"),
    field("LONG-TERM ASSETS", "LONG-TERM ASSETS (Bn. VND)"),
    field("Long-term receivables", "Long-term trade receivables (Bn. VND)"),
    field("Fixed assets", "Fixed assets (Bn. VND)"),
    field("Investment properties", "Investment in properties"),
    field("Long-term assets in progress", "Long-term assets in progress"),
    field("Long-term investments", "Long-term investments (Bn. VND)"),
    field("Other long-term assets", "Other non-current assets"),
    field("TOTAL RESOURCES", "TOTAL RESOURCES (Bn. VND)"),
    field("TOTAL LIABILITIES", "LIABILITIES (Bn. VND)"),
    field("Current liabilities", "Current liabilities (Bn. VND)"),
    field("Short Term Debt", "Short-term borrowings (Bn. VND)"),
    field("Long-term liabilities", "Long-term liabilities (Bn. VND)"),
    field("Long Term Debt", "Long-term borrowings (Bn. VND)"),
    field("OWNER'S EQUITY", "OWNER'S EQUITY(Bn.VND)"),
    field("Capital and reserves", "Capital and reserves (Bn. VND)"),
    field("Share Capital", "Paid-in capital (Bn. VND)"),
    field("Other Owners' Capital", "Other Reserves"),
    field("Undistributed earnings", "Undistributed earnings (Bn. VND)"),
    field("Minority interests", "MINORITY INTERESTS"),
    field("Budget sources and other funds", "Budget sources and other funds"),
];

pub const DEPOSITORY_BALANCE: &[FieldMapping] = &[
    YEAR_FIELD,
    QUARTER_FIELD,
    field("Assets", "TOTAL ASSETS (Bn. VND)"),
    field("Cash, gold and gemstones", "Cash and cash equivalents (Bn. VND)"),
    field("Balances with the State Bank of Vietnam (SBV)", "Balances with the SBV"),
    field(
        "Deposits with and loans to other credit institutions (CIs)",
        "Placements with and loans to other credit institutions",
    ),
    field("Net trading securities", "Trading Securities, net"),
    field("Trading securities", "Trading Securities"),
    field(
        "Provision for trading securities",
        "Provision for diminution in value of Trading Securities",
    ),
    field(
        "Derivatives and other financial assets",
        "Derivatives and other financial liabilities",
    ),
    field("Net loans to customers", "Loans and advances to customers, net"),
    field("Loans to customers", "Loans and advances to customers"),
    field(
        "Provision for loans to customers",
        "Less: Provision for losses on loans and advances to customers",
    ),
    field("Investment securities", "Investment Securities"),
    field("Available-for-sale securities", "Available-for Sales Securities"),
    field("Held-to-maturity securities", "Held-to-Maturity Securities"),
    field(
        "Provision for investment securities",
        "Less: Provision for diminution in value of investment securities",
    ),
    field("Long-term investments", "Long-term investments (Bn. VND)"),
    field("Other long-term investments", "Other long-term assets (Bn. VND)"),
    field(
        "Provision for long-term investments",
        "Less: Provision for diminuation in value of long term investments",
    ),
    field("Fixed assets", "Fixed assets (Bn. VND)"),
    field("Tangible fixed assets", "Tangible fixed assets"),
    field("Intangible fixed assets", "Intagible fixed assets"),
    field("Investment properties", "Investment in properties"),
    field("Other assets", "Other Assets"),
    field("Liabilities", "LIABILITIES (Bn. VND)"),
    field("Due to the Government and the SBV", "Due to Gov and borrowings from SBV"),
    field(
        "Deposits and borrowings from other CIs",
        "Deposits and borrowings from other credit institutions",
    ),
    field("Deposits from customers", "Deposits from customers"),
    field(
        "Derivatives and other financial liabilities",
        "_Derivatives and other financial liabilities",
    ),
    field(
        "Other borrowed and entrusted funds",
        "Funds received from Gov, international and other institutions",
    ),
    field(
        "Valuable papers issued",
        "Convertible bonds/CDs and other valuable papers issued",
    ),
    field("Other liabilities", "Other liabilities"),
    field("Shareholders' Equity", "OWNER'S EQUITY(Bn.VND)"),
    field("Share capital", "Capital"),
    field("Charter capital", "Paid-in capital (Bn. VND)"),
    field("Other capital", "Other Reserves"),
    field("Reserves", "Reserves"),
    field("Foreign exchange differences", "Foreign Currency Difference reserve"),
    field("Differences upon asset revaluation", "Difference upon Assets Revaluation"),
    field("Retained earnings", "Undistributed earnings (Bn. VND)"),
    field("Minority interests", "MINORITY INTERESTS"),
];

/// Shared by both entity types.
pub const CASH_FLOW: &[FieldMapping] = &[
    YEAR_FIELD,
    QUARTER_FIELD,
    field(
        "Operating cash flow",
        "Net cash inflows/outflows from operating activities",
    ),
    field("Investing cash flow", "Net Cash Flows from Investing Activities"),
    field("Financing cash flow", "Cash flows from financial activities"),
    field(
        "Ending cash position",
        "Cash and Cash Equivalents at the end of period",
    ),
    field("Dividends paid", "Dividends paid"),
    field("Share repurchase", "Payments for share repurchases"),
    field("Capital expenditure", "Purchase of fixed assets"),
];

pub fn registry(entity_type: EntityType, kind: StatementKind) -> &'static [FieldMapping] {
    match (entity_type, kind) {
        (EntityType::Standard, StatementKind::IncomeStatement) => STANDARD_INCOME,
        (EntityType::Depository, StatementKind::IncomeStatement) => DEPOSITORY_INCOME,
        (EntityType::Standard, StatementKind::BalanceSheet) => STANDARD_BALANCE,
        (EntityType::Depository, StatementKind::BalanceSheet) => DEPOSITORY_BALANCE,
        (_, StatementKind::CashFlow) => CASH_FLOW,
    }
}

/// Canonical columns the normalizer emits for `(entity_type, kind)` at the
/// given granularity, in registry order. Quarter is omitted for yearly data.
pub fn canonical_fields(
    entity_type: EntityType,
    kind: StatementKind,
    granularity: PeriodGranularity,
) -> Vec<&'static str> {
    registry(entity_type, kind)
        .iter()
        .filter(|m| granularity.is_quarterly() || m.canonical != QUARTER)
        .map(|m| m.canonical)
        .collect()
}

/// Checks registry invariants: every table starts with Year then Quarter and
/// has no duplicate canonical names.
pub fn validate_registry() -> Result<()> {
    for entity_type in [EntityType::Standard, EntityType::Depository] {
        for kind in StatementKind::ALL {
            let table = registry(entity_type, kind);
            let label = format!("{:?}/{}", entity_type, kind.table_name());

            if table.first() != Some(&YEAR_FIELD) || table.get(1) != Some(&QUARTER_FIELD) {
                return Err(FinancialProfileError::InvalidRegistry(format!(
                    "{} must start with {} and {}",
                    label, YEAR, QUARTER
                )));
            }

            let mut seen = HashSet::new();
            for mapping in table {
                if !seen.insert(mapping.canonical) {
                    return Err(FinancialProfileError::InvalidRegistry(format!(
                        "{} declares '{}' twice",
                        label, mapping.canonical
                    )));
                }
            }
        }
    }
    Ok(())
}

/// A column of the two-level vendor ratio table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatioField {
    pub group: &'static str,
    pub name: &'static str,
}

const fn ratio_field(group: &'static str, name: &'static str) -> RatioField {
    RatioField { group, name }
}

pub mod ratio_groups {
    pub const META: &str = "Meta";
    pub const VALUATION: &str = "Chỉ tiêu định giá";
    pub const PROFITABILITY: &str = "Chỉ tiêu khả năng sinh lợi";
    pub const CAPITAL_STRUCTURE: &str = "Chỉ tiêu cơ cấu nguồn vốn";
    pub const LIQUIDITY: &str = "Chỉ tiêu thanh khoản";
    pub const EFFICIENCY: &str = "Chỉ tiêu hiệu quả hoạt động";
}

pub mod ratio_fields {
    use super::ratio_field;
    use super::ratio_groups::*;
    use super::RatioField;

    pub const YEAR: RatioField = ratio_field(META, super::YEAR_SOURCE);
    pub const QUARTER: RatioField = ratio_field(META, super::QUARTER_SOURCE);

    pub const EPS: RatioField = ratio_field(VALUATION, "EPS (VND)");
    pub const BVPS: RatioField = ratio_field(VALUATION, "BVPS (VND)");
    pub const OUTSTANDING_SHARES: RatioField =
        ratio_field(VALUATION, "Outstanding Share (Mil. Shares)");
    pub const PE: RatioField = ratio_field(VALUATION, "P/E");
    pub const PS: RatioField = ratio_field(VALUATION, "P/S");
    pub const PB: RatioField = ratio_field(VALUATION, "P/B");
    pub const P_CASH_FLOW: RatioField = ratio_field(VALUATION, "P/Cash Flow");
    pub const EV_EBITDA: RatioField = ratio_field(VALUATION, "EV/EBITDA");

    pub const GROSS_MARGIN: RatioField = ratio_field(PROFITABILITY, "Gross Profit Margin (%)");
    pub const NET_MARGIN: RatioField = ratio_field(PROFITABILITY, "Net Profit Margin (%)");
    pub const EBIT_MARGIN: RatioField = ratio_field(PROFITABILITY, "EBIT Margin (%)");
    pub const ROE: RatioField = ratio_field(PROFITABILITY, "ROE (%)");
    pub const ROA: RatioField = ratio_field(PROFITABILITY, "ROA (%)");
    pub const ROIC: RatioField = ratio_field(PROFITABILITY, "ROIC (%)");
    pub const EBITDA: RatioField = ratio_field(PROFITABILITY, "EBITDA (Bn. VND)");
    pub const EBIT: RatioField = ratio_field(PROFITABILITY, "EBIT (Bn. VND)");
    pub const DIVIDEND_YIELD: RatioField = ratio_field(PROFITABILITY, "Dividend yield (%)");

    pub const DEBT_EQUITY: RatioField = ratio_field(CAPITAL_STRUCTURE, "Debt/Equity");
    pub const BORROWINGS_EQUITY: RatioField =
        ratio_field(CAPITAL_STRUCTURE, "(ST+LT borrowings)/Equity");

    pub const FINANCIAL_LEVERAGE: RatioField = ratio_field(LIQUIDITY, "Financial Leverage");
    pub const QUICK_RATIO: RatioField = ratio_field(LIQUIDITY, "Quick Ratio");
    pub const CURRENT_RATIO: RatioField = ratio_field(LIQUIDITY, "Current Ratio");
    pub const CASH_RATIO: RatioField = ratio_field(LIQUIDITY, "Cash Ratio");
    pub const INTEREST_COVERAGE: RatioField = ratio_field(LIQUIDITY, "Interest Coverage");

    pub const ASSET_TURNOVER: RatioField = ratio_field(EFFICIENCY, "Asset Turnover");
    pub const INVENTORY_TURNOVER: RatioField = ratio_field(EFFICIENCY, "Inventory Turnover");
    pub const CASH_CYCLE: RatioField = ratio_field(EFFICIENCY, "Cash Cycle");
}
