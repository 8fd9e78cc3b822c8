//! Errors raised by cart and catalog rules.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// A cart or catalog rule refused an operation.
///
/// These are deterministic: retrying the same call against the same state
/// fails the same way. A catalog that cannot be reached is reported through
/// the catalog's own error type instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed operator or seed input: a blank product name, a price like
    /// `"1.234"`, an unknown `:command`.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A command addressed to a different cart than the one handling it.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// A product or cart id that is not a UUID.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A lookup resolved to no product, or a catalog edit targeted a product
    /// that no longer exists.
    #[error("not found")]
    NotFound,

    /// A catalog edit would give two products the same name or barcode.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}
