//! Domain-level error types.

use thiserror::Error;

/// Domain errors - precondition violations raised while building domain values.
///
/// Counter store failures never show up here; the frequency engine absorbs them.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}
