//! Cross-cutting error types for Trellis.
//!
//! Domain-specific errors (e.g., `StoreError`, `ConfigError`) are defined in
//! their respective crates; `CoreError` covers failures that can originate
//! from any crate in the system.

use thiserror::Error;

/// Errors that can be raised by any Trellis crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity lookup returned no result (or the row belongs to another owner —
    /// the two cases are indistinguishable to the caller).
    #[error("Entity not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: String },

    /// A state machine transition was attempted that is not allowed.
    #[error("Invalid state transition: {entity_type} {id} from {from} to {to}")]
    InvalidTransition {
        entity_type: String,
        id: String,
        from: String,
        to: String,
    },

    /// Data failed validation (format, range, constraints).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
