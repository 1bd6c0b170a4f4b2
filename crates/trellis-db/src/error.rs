//! Store error types for trellis-db.
//!
//! The variants mirror the engine's error taxonomy: validation failures are
//! never retried, conflicts are retryable after a re-fetch, preconditions
//! require the caller to change entity state first, and `NotFound` covers
//! both missing rows and rows owned by someone else (indistinguishable to
//! the caller).

use thiserror::Error;

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Malformed input (empty title, missing subtopics, unknown subtopic name).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Optimistic-concurrency version mismatch, duplicate in-progress
    /// analysis, or disallowed status transition.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Operation attempted against an entity in the wrong state.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Entity missing, or not owned by the caller.
    #[error("Not found")]
    NotFound,

    /// Transient infrastructure failure; caller-level retry with backoff
    /// is appropriate.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// A SQL query failed.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Detect a SQLite UNIQUE constraint violation.
///
/// libsql surfaces constraint failures as generic errors; the message is the
/// only discriminator available, so the predicate is kept narrow.
#[must_use]
pub fn is_unique_violation(e: &libsql::Error) -> bool {
    e.to_string().contains("UNIQUE constraint failed")
}
