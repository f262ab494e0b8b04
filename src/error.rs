use thiserror::Error;

#[derive(Error, Debug)]
pub enum FinancialProfileError {
    #[error("Table '{table}' has {rows} periods but no '{column}' column")]
    MissingPeriodColumn {
        table: String,
        column: String,
        rows: usize,
    },

    #[error("Column '{column}' has {actual} values but the table has {expected} periods")]
    ColumnLengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("Duplicate period index {index}")]
    DuplicatePeriodIndex { index: usize },

    #[error("Invalid period granularity '{0}': expected 'year' or 'quarter'")]
    InvalidGranularity(String),

    #[error("Schema registry is inconsistent: {0}")]
    InvalidRegistry(String),

    #[error("Invalid input record: {0}")]
    InvalidRecord(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FinancialProfileError>;
