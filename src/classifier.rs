use crate::schema::EntityType;
use crate::table::PeriodTable;
use log::debug;

/// Income-statement line items only bank-like entities report.
pub const BANK_INDICATORS: [&str; 4] = [
    "Net Interest Income",
    "Interest and Similar Income",
    "Net Fee and Commission Income",
    "Provision for credit losses",
];

/// Classifies an entity from the column set of its raw income statement.
///
/// An entity is [`EntityType::Depository`] when at least half of
/// [`BANK_INDICATORS`] (floor division) are present as columns. Only column
/// presence counts; the values are never inspected, so an income statement
/// without periods is classified the same way as a populated one.
pub fn classify_entity(income_statement: &PeriodTable) -> EntityType {
    let present = BANK_INDICATORS
        .iter()
        .filter(|indicator| income_statement.has_column(indicator))
        .count();
    let threshold = BANK_INDICATORS.len() / 2;

    let entity_type = if present >= threshold {
        EntityType::Depository
    } else {
        EntityType::Standard
    };

    debug!(
        "Found {}/{} bank indicator columns, classified as {:?}",
        present,
        BANK_INDICATORS.len(),
        entity_type
    );

    entity_type
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Series;

    fn income_with(columns: &[&str]) -> PeriodTable {
        PeriodTable::from_columns(
            columns
                .iter()
                .map(|name| (name.to_string(), Series::from(vec![1.0]))),
        )
        .unwrap()
    }

    #[test]
    fn test_three_indicators_is_depository() {
        let income = income_with(&[
            "Net Interest Income",
            "Interest and Similar Income",
            "Net Fee and Commission Income",
        ]);
        assert_eq!(classify_entity(&income), EntityType::Depository);
    }

    #[test]
    fn test_half_of_indicators_is_depository() {
        let income = income_with(&[
            "yearReport",
            "Net Interest Income",
            "Provision for credit losses",
        ]);
        assert_eq!(classify_entity(&income), EntityType::Depository);
    }

    #[test]
    fn test_single_indicator_is_standard() {
        let income = income_with(&["yearReport", "Net Sales", "Net Interest Income"]);
        assert_eq!(classify_entity(&income), EntityType::Standard);
    }

    #[test]
    fn test_empty_income_statement_is_standard() {
        assert_eq!(classify_entity(&PeriodTable::default()), EntityType::Standard);
    }

    #[test]
    fn test_indicator_names_are_case_sensitive() {
        let income = income_with(&["net interest income", "interest and similar income"]);
        assert_eq!(classify_entity(&income), EntityType::Standard);
    }

    #[test]
    fn test_classification_is_stable() {
        let income = income_with(&["Net Interest Income", "Interest and Similar Income"]);
        let first = classify_entity(&income);
        assert!((0..10).all(|_| classify_entity(&income) == first));
    }
}
