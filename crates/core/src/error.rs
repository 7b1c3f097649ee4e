//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic failures when turning raw source values
/// into domain values. Transport and delivery concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A calendar date could not be parsed.
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// An email address (or `Name <address>` pair) was malformed.
    #[error("invalid email address: {0}")]
    InvalidAddress(String),
}

impl DomainError {
    pub fn invalid_date(msg: impl Into<String>) -> Self {
        Self::InvalidDate(msg.into())
    }

    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::InvalidAddress(msg.into())
    }
}
