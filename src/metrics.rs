//! Derived metrics engine.
//!
//! Builds the six categorized metric tables from the normalized statements
//! and the vendor ratio table. The ratio table drives the period index: every
//! statement series is re-aligned onto it by period label before use.

use crate::categorizer::RatioCategory;
use crate::error::Result;
use crate::normalizer::{NormalizedStatement, NormalizedStatements};
use crate::schema::{ratio_fields, EntityType, PeriodGranularity, RatioField, QUARTER, YEAR};
use crate::series::Series;
use crate::table::PeriodTable;
use log::debug;
use serde::{Deserialize, Serialize};

const KEY_RATIOS: &str = "key_ratios";

const STANDARD_TRACKED: &[&str] = &[
    "Revenues",
    "Earnings",
    "Free Cash Flow",
    "Dividend",
    "Book Value",
];
const DEPOSITORY_TRACKED: &[&str] = &["Earnings", "Free Cash Flow", "Dividend", "Book Value"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub per_share: PeriodTable,
    pub growth_rate: PeriodTable,
    pub profitability: PeriodTable,
    pub valuation: PeriodTable,
    pub leverage_liquidity: PeriodTable,
    pub efficiency: PeriodTable,
}

impl DerivedMetrics {
    pub fn table(&self, category: RatioCategory) -> &PeriodTable {
        match category {
            RatioCategory::PerShareValue => &self.per_share,
            RatioCategory::GrowthRate => &self.growth_rate,
            RatioCategory::Profitability => &self.profitability,
            RatioCategory::Valuation => &self.valuation,
            RatioCategory::LeverageLiquidity => &self.leverage_liquidity,
            RatioCategory::Efficiency => &self.efficiency,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (RatioCategory, &PeriodTable)> + '_ {
        RatioCategory::ALL.into_iter().map(move |c| (c, self.table(c)))
    }
}

/// Statement and ratio series aligned onto the ratio table's periods.
struct Inputs<'a> {
    key_ratios: &'a PeriodTable,
    statements: &'a NormalizedStatements,
}

impl Inputs<'_> {
    fn ratio(&self, field: RatioField) -> Series {
        self.key_ratios.series_in(field.group, field.name)
    }

    fn statement(&self, statement: &NormalizedStatement, canonical: &str) -> Series {
        statement
            .table
            .align(&statement.series(canonical), self.key_ratios.index())
    }

    fn income(&self, canonical: &str) -> Series {
        self.statement(&self.statements.income_statement, canonical)
    }

    fn balance(&self, canonical: &str) -> Series {
        self.statement(&self.statements.balance_sheet, canonical)
    }

    fn cash_flow(&self, canonical: &str) -> Series {
        self.statement(&self.statements.cash_flow, canonical)
    }

    fn shares(&self) -> Series {
        self.ratio(ratio_fields::OUTSTANDING_SHARES)
    }

    fn net_sales(&self) -> Series {
        self.income("Net sales")
    }

    fn dividends_paid(&self) -> Series {
        self.cash_flow("Dividends paid")
    }

    fn ebitda(&self) -> Series {
        self.ratio(ratio_fields::EBITDA)
    }
}

fn percent(numerator: &Series, denominator: &Series) -> Series {
    &(numerator / denominator) * 100.0
}

pub struct MetricsEngine {
    entity_type: EntityType,
    granularity: PeriodGranularity,
}

impl MetricsEngine {
    pub fn new(entity_type: EntityType, granularity: PeriodGranularity) -> Self {
        Self {
            entity_type,
            granularity,
        }
    }

    pub fn compute(
        &self,
        statements: &NormalizedStatements,
        key_ratios: &PeriodTable,
    ) -> Result<DerivedMetrics> {
        key_ratios.validate()?;
        key_ratios.require_column(
            KEY_RATIOS,
            Some(ratio_fields::YEAR.group),
            ratio_fields::YEAR.name,
        )?;
        if self.granularity.is_quarterly() {
            key_ratios.require_column(
                KEY_RATIOS,
                Some(ratio_fields::QUARTER.group),
                ratio_fields::QUARTER.name,
            )?;
        }

        let inputs = Inputs {
            key_ratios,
            statements,
        };

        let per_share = self.per_share(&inputs)?;
        let growth_rate = self.growth_rate(&inputs, &per_share)?;
        let metrics = DerivedMetrics {
            per_share,
            growth_rate,
            profitability: self.profitability(&inputs)?,
            valuation: self.valuation(&inputs)?,
            leverage_liquidity: self.leverage_liquidity(&inputs)?,
            efficiency: self.efficiency(&inputs)?,
        };

        debug!(
            "Computed {:?} metrics over {} periods",
            self.entity_type,
            key_ratios.len()
        );

        Ok(metrics)
    }

    /// Empty metric table with the period columns leading.
    fn period_table(&self, inputs: &Inputs<'_>) -> Result<PeriodTable> {
        let mut table = PeriodTable::new(inputs.key_ratios.index().to_vec())?;
        table.insert(YEAR, inputs.ratio(ratio_fields::YEAR))?;
        if self.granularity.is_quarterly() {
            table.insert(QUARTER, inputs.ratio(ratio_fields::QUARTER))?;
        }
        Ok(table)
    }

    /// Per-share metrics whose year-over-year change is tracked, in column order.
    fn tracked_per_share(&self) -> &'static [&'static str] {
        match self.entity_type {
            EntityType::Standard => STANDARD_TRACKED,
            EntityType::Depository => DEPOSITORY_TRACKED,
        }
    }

    fn per_share(&self, inputs: &Inputs<'_>) -> Result<PeriodTable> {
        let mut table = self.period_table(inputs)?;
        let shares = inputs.shares();
        let book_value = inputs.ratio(ratio_fields::BVPS);

        if self.entity_type == EntityType::Standard {
            table.insert("Revenues", &inputs.net_sales() / &shares)?;
        }
        table.insert("Earnings", inputs.ratio(ratio_fields::EPS))?;

        let free_cash_flow = &inputs.cash_flow("Operating cash flow")
            + &inputs.cash_flow("Capital expenditure");
        table.insert("Free Cash Flow", &free_cash_flow / &shares)?;
        table.insert("Dividend", &(-&inputs.dividends_paid()) / &shares)?;

        // Yield-implied counterpart of the cash-paid dividend above.
        let implied_dividend = &(&inputs.ratio(ratio_fields::DIVIDEND_YIELD) * 0.01)
            * &(&inputs.ratio(ratio_fields::PB) * &book_value);
        table.insert("Book Value", book_value)?;
        table.insert("Dividend (Yield-Implied)", implied_dividend)?;

        Ok(table)
    }

    fn growth_rate(&self, inputs: &Inputs<'_>, per_share: &PeriodTable) -> Result<PeriodTable> {
        let mut table = self.period_table(inputs)?;
        for metric in self.tracked_per_share() {
            let growth = per_share.series(metric).yoy_growth(per_share.index());
            table.insert(format!("{} YoY", metric), growth)?;
        }
        Ok(table)
    }

    fn profitability(&self, inputs: &Inputs<'_>) -> Result<PeriodTable> {
        let mut table = self.period_table(inputs)?;

        match self.entity_type {
            EntityType::Depository => {
                table.insert("Net Margin", inputs.ratio(ratio_fields::NET_MARGIN))?;
                table.insert("ROE", inputs.ratio(ratio_fields::ROE))?;
            }
            EntityType::Standard => {
                let net_sales = inputs.net_sales();
                let ebit = inputs.ratio(ratio_fields::EBIT);
                let capital_employed =
                    &inputs.balance("TOTAL ASSETS") - &inputs.balance("Current liabilities");

                table.insert("Gross Margin", inputs.ratio(ratio_fields::GROSS_MARGIN))?;
                table.insert(
                    "Operating Margin",
                    percent(&inputs.income("Operating income"), &net_sales),
                )?;
                table.insert("Net Margin", inputs.ratio(ratio_fields::NET_MARGIN))?;
                table.insert("ROE", inputs.ratio(ratio_fields::ROE))?;
                table.insert("ROIC", inputs.ratio(ratio_fields::ROIC))?;
                table.insert("ROCE", percent(&ebit, &capital_employed))?;
                table.insert("EBITDA Margin", percent(&inputs.ebitda(), &net_sales))?;
                table.insert("EBIT Margin", inputs.ratio(ratio_fields::EBIT_MARGIN))?;
            }
        }

        Ok(table)
    }

    fn valuation(&self, inputs: &Inputs<'_>) -> Result<PeriodTable> {
        let mut table = self.period_table(inputs)?;
        table.insert("P/E", inputs.ratio(ratio_fields::PE))?;
        table.insert("P/S", inputs.ratio(ratio_fields::PS))?;
        table.insert("P/B", inputs.ratio(ratio_fields::PB))?;
        table.insert("P/Cash Flow", inputs.ratio(ratio_fields::P_CASH_FLOW))?;

        if self.entity_type == EntityType::Standard {
            let ev_ebitda = inputs.ratio(ratio_fields::EV_EBITDA);
            let enterprise_value = &ev_ebitda * &inputs.ebitda();
            let ev_revenue = &enterprise_value / &inputs.net_sales();
            table.insert("EV", enterprise_value)?;
            table.insert("EV/EBITDA", ev_ebitda)?;
            table.insert("EV/Revenue", ev_revenue)?;
        }

        Ok(table)
    }

    fn leverage_liquidity(&self, inputs: &Inputs<'_>) -> Result<PeriodTable> {
        let mut table = self.period_table(inputs)?;

        match self.entity_type {
            EntityType::Depository => {
                let debt_equity =
                    &inputs.balance("Liabilities") / &inputs.balance("Shareholders' Equity");
                table.insert("Debt/Equity", debt_equity)?;
                table.insert(
                    "Financial Leverage",
                    inputs.ratio(ratio_fields::FINANCIAL_LEVERAGE),
                )?;
            }
            EntityType::Standard => {
                let total_debt =
                    &inputs.balance("Long Term Debt") + &inputs.balance("Short Term Debt");

                table.insert("Debt/Equity", inputs.ratio(ratio_fields::DEBT_EQUITY))?;
                table.insert("Debt to EBITDA", &total_debt / &inputs.ebitda())?;
                table.insert(
                    "Short and Long Term Borrowings to Equity",
                    inputs.ratio(ratio_fields::BORROWINGS_EQUITY),
                )?;
                table.insert(
                    "Financial Leverage",
                    inputs.ratio(ratio_fields::FINANCIAL_LEVERAGE),
                )?;
                table.insert("Quick Ratio", inputs.ratio(ratio_fields::QUICK_RATIO))?;
                table.insert("Current Ratio", inputs.ratio(ratio_fields::CURRENT_RATIO))?;
                table.insert("Cash Ratio", inputs.ratio(ratio_fields::CASH_RATIO))?;
                table.insert(
                    "Interest Coverage",
                    inputs.ratio(ratio_fields::INTEREST_COVERAGE),
                )?;
            }
        }

        Ok(table)
    }

    fn efficiency(&self, inputs: &Inputs<'_>) -> Result<PeriodTable> {
        let mut table = self.period_table(inputs)?;
        let payout = percent(
            &(-&inputs.dividends_paid()),
            &inputs.income("Attributable to parent company"),
        );

        match self.entity_type {
            EntityType::Depository => {
                table.insert("ROA", inputs.ratio(ratio_fields::ROA))?;
                table.insert("Dividend Payout %", payout)?;
            }
            EntityType::Standard => {
                table.insert("Asset Turnover", inputs.ratio(ratio_fields::ASSET_TURNOVER))?;
                table.insert(
                    "Inventory Turnover",
                    inputs.ratio(ratio_fields::INVENTORY_TURNOVER),
                )?;
                table.insert("ROA", inputs.ratio(ratio_fields::ROA))?;
                table.insert("Dividend Payout %", payout)?;
                table.insert(
                    "Cash Conversion Cycle",
                    inputs.ratio(ratio_fields::CASH_CYCLE),
                )?;
            }
        }

        Ok(table)
    }
}
