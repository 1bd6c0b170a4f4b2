//! Service façade owning the store handle.
//!
//! `TrellisService` wraps [`TrellisDb`]; every repository, coordinator, and
//! reader method is implemented as `impl TrellisService` in its own file.
//!
//! Tenant isolation is per-call: every method takes the calling `owner` and
//! appends `owner_id = ?` to its WHERE clause, so a row belonging to another
//! owner is indistinguishable from a missing row.

use trellis_config::TrellisConfig;

use crate::TrellisDb;
use crate::error::StoreError;

/// Orchestrates all mutations and reads of the research dataflow graph.
pub struct TrellisService {
    db: TrellisDb,
}

impl TrellisService {
    /// Create a new service wrapping a local database.
    ///
    /// # Arguments
    ///
    /// * `db_path` — Path to the libSQL database file, or `":memory:"` for
    ///   tests.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the database cannot be opened.
    pub async fn new_local(db_path: &str) -> Result<Self, StoreError> {
        let db = TrellisDb::open_local(db_path).await?;
        Ok(Self { db })
    }

    /// Create a service from loaded configuration.
    ///
    /// Opens the database at `config.database.path`, creating parent
    /// directories if needed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the directory cannot be created or the
    /// database cannot be opened.
    pub async fn from_config(config: &TrellisConfig) -> Result<Self, StoreError> {
        let path = std::path::Path::new(&config.database.path);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Unavailable(format!("create {parent:?}: {e}")))?;
            }
        }
        Self::new_local(&config.database.path).await
    }

    /// Create from an existing `TrellisDb` (for testing).
    #[must_use]
    pub const fn from_db(db: TrellisDb) -> Self {
        Self { db }
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &TrellisDb {
        &self.db
    }
}
