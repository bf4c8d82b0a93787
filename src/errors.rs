//! Unified error types and result handling for finboard.
//!
//! All fallible operations in the crate return [`Result`], with validation
//! failures carrying the offending field name so the request layer can map
//! them onto form fields without parsing message strings.

use thiserror::Error;

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or out-of-range input, scoped to the offending field.
    #[error("validation failed on `{field}`: {message}")]
    Validation {
        /// Input field the message refers to.
        field: &'static str,
        /// Human-readable description of the problem.
        message: String,
    },

    /// Record absent, or owned by a different user (never disclosed which).
    #[error("{entity} not found")]
    NotFound {
        /// Kind of record that could not be resolved.
        entity: &'static str,
    },

    /// Operation requires an installment group the payable does not have.
    #[error("payable {id} does not belong to an installment group")]
    InvalidGroup {
        /// Identifier of the offending payable.
        id: i64,
    },

    /// Delete blocked by a referential-integrity protection.
    #[error("{message}")]
    Conflict {
        /// Description of the blocking reference.
        message: String,
    },

    /// Configuration loading or parsing failure.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration problem.
        message: String,
    },

    /// Database failure surfaced from `SeaORM`.
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Filesystem failure in the receipt store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a field-scoped validation error.
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}

/// Convenience `Result` type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
