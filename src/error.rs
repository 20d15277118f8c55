use rust_decimal::Decimal;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FunderReportError {
    #[error("Unable to decode {} with any candidate encoding", path.display())]
    Undecodable { path: PathBuf },

    #[error("Malformed report file {}: {details}", path.display())]
    Malformed { path: PathBuf, details: String },

    #[error("Missing columns in {file}: {}", columns.join(", "))]
    MissingColumns { file: String, columns: Vec<String> },

    #[error("No records remained after filtering; nothing to aggregate")]
    EmptyResult,

    #[error("Invalid funder format '{funder}': {details}")]
    InvalidFormat { funder: String, details: String },

    #[error("Grand total mismatch in {column}: totals row has {reported}, display rows sum to {computed}")]
    TotalsMismatch {
        column: String,
        reported: Decimal,
        computed: Decimal,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, FunderReportError>;
