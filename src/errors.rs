//! Unified error type for the inventory core, importers and web handlers.

use crate::entities::LoanStatus;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// A product code that collides with an existing product or with another row
/// of the same import batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeConflict {
    /// The colliding canonical code
    pub code: String,
    /// Description of the row (or existing product) that holds the code
    pub description: String,
}

impl fmt::Display for CodeConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code, self.description)
    }
}

fn join_conflicts(conflicts: &[CodeConflict]) -> String {
    conflicts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Every failure the application can surface.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed input, rejected before any write
    #[error("Validation error: {message}")]
    Validation {
        /// What was wrong with the input
        message: String,
    },

    /// Requested quantity exceeds the product's current stock
    #[error("Insufficient stock for product {product_id}: {available} available, {requested} requested")]
    InsufficientStock {
        /// Product that was short
        product_id: i64,
        /// Units on hand when the operation ran
        available: i32,
        /// Units the operation asked for
        requested: i32,
    },

    /// Illegal loan state change (double return, returning a consumable, ...)
    #[error("Loan {loan_id} cannot be {action} while {status}")]
    InvalidTransition {
        /// Loan the transition was attempted on
        loan_id: i64,
        /// Status the loan was in
        status: LoanStatus,
        /// Attempted action, e.g. "returned"
        action: &'static str,
    },

    /// Product code already taken
    #[error("Duplicate product codes: {}", join_conflicts(.conflicts))]
    DuplicateCode {
        /// Every colliding code with its description
        conflicts: Vec<CodeConflict>,
    },

    /// Malformed import document
    #[error("Parse error: {message}")]
    Parse {
        /// What could not be parsed
        message: String,
    },

    /// Product id does not exist or is archived
    #[error("Product not found: {id}")]
    ProductNotFound {
        /// Requested id or code
        id: String,
    },

    /// Employee id does not exist
    #[error("Employee not found: {id}")]
    EmployeeNotFound {
        /// Requested id
        id: i64,
    },

    /// Loan id does not exist
    #[error("Loan not found: {id}")]
    LoanNotFound {
        /// Requested id
        id: i64,
    },

    /// Employee still holds tools and cannot be deleted
    #[error("Employee {employee_id} still has {active_loans} active loan(s)")]
    EmployeeHasActiveLoans {
        /// Employee that was going to be deleted
        employee_id: i64,
        /// Number of loans still in `prestado`
        active_loans: u64,
    },

    /// Configuration file could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Error details
        message: String,
    },

    /// Database error from `SeaORM`
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a [`Error::Validation`] with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for a [`Error::Parse`] with the given message.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Maps a unique-constraint violation raised while writing `code` into a
    /// [`Error::DuplicateCode`]; any other database error passes through.
    #[must_use]
    pub fn from_insert(err: sea_orm::DbErr, code: &str, description: &str) -> Self {
        if matches!(
            err.sql_err(),
            Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
        ) {
            Self::DuplicateCode {
                conflicts: vec![CodeConflict {
                    code: code.to_string(),
                    description: description.to_string(),
                }],
            }
        } else {
            Self::Database(err)
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
