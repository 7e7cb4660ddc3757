//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent invalid inputs to the hierarchy core.
///
/// Malformed leader references are never errors; they degrade to roots.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("invalid layout setting {field}: {value}")]
    InvalidLayout { field: &'static str, value: f64 },

    #[error("invalid participant record: {0}")]
    InvalidParticipant(String),
}
