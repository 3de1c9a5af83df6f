//! Ranking engine error types.

use metabolyx_common::EvidenceDimension;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RankError>;

/// Fatal conditions: the run is aborted and nothing is ranked.
#[derive(Debug, Error)]
pub enum RankError {
    #[error("schema error in {table} table: {message}")]
    Schema { table: String, message: String },

    #[error("identifier mismatch: no metabolite is common to all supplied tables ({})", .tables.join(", "))]
    IdentifierMismatch { tables: Vec<String> },

    #[error("invalid weights: {0}")]
    InvalidWeights(String),

    #[error("invalid value {value:?} in {table} table, row {row}, column {column}")]
    InvalidValue {
        table: String,
        row: usize,
        column: String,
        value: String,
    },

    #[error("evidence provider for {table} table failed: {message}")]
    Provider { table: String, message: String },
}

impl RankError {
    pub(crate) fn schema(table: impl Into<String>, message: impl Into<String>) -> Self {
        RankError::Schema {
            table: table.into(),
            message: message.into(),
        }
    }
}

/// Non-fatal: the dimension is reported and contributes nothing to any composite.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize)]
pub enum NormaliseError {
    #[error("dimension {dimension} has no observed values and cannot be normalised")]
    NoObservedValues { dimension: EvidenceDimension },
}
