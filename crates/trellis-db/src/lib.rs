//! # trellis-db
//!
//! libSQL persistence and orchestration for the Trellis research dataflow.
//!
//! Handles the four-level research graph as relational state: research
//! topics, topic decompositions, trend analyses, and content ideas. The
//! engine holds no long-lived in-memory state of its own — all shared state
//! lives in the backing store, and all cross-request coordination is
//! row/constraint-level (optimistic version counters, partial unique
//! indexes), never global locks.
//!
//! Uses the `libsql` crate (C `SQLite` fork) — embedded local databases with
//! per-connection foreign-key enforcement.

pub mod coordinator;
pub mod error;
pub mod helpers;
mod migrations;
pub mod reader;
pub mod repos;
pub mod service;
pub mod updates;

#[cfg(test)]
pub(crate) mod test_support;

use error::StoreError;
use libsql::Builder;

/// Central database handle for all Trellis state operations.
///
/// Wraps a libSQL database and connection, and provides ID generation and
/// transaction access. Repository methods live on
/// [`service::TrellisService`] and use this handle internally.
pub struct TrellisDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
}

impl TrellisDb {
    /// Open a local database at the given path (`":memory:"` for tests).
    ///
    /// Runs migrations automatically on first open.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the database cannot be opened or migrations
    /// fail.
    pub async fn open_local(path: &str) -> Result<Self, StoreError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        // Enable foreign keys (must be per-connection in SQLite)
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| StoreError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let store = Self { db, conn };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Begin a transaction on the underlying connection.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the transaction cannot be started.
    pub async fn transaction(&self) -> Result<libsql::Transaction, StoreError> {
        Ok(self.conn.transaction().await?)
    }

    /// Generate a prefixed ID via libSQL. Returns e.g., `"rtp-a3f8b2c1"`.
    ///
    /// Uses `randomblob(4)` in SQL to produce 8-char hex, then prepends the
    /// prefix.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the query fails or returns no rows.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, StoreError> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT '{prefix}-' || lower(hex(randomblob(4)))"),
                (),
            )
            .await?;
        let row = rows.next().await?.ok_or(StoreError::NotFound)?;
        Ok(row.get::<String>(0)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    async fn test_db() -> TrellisDb {
        TrellisDb::open_local(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn open_local_creates_schema() {
        let db = test_db().await;

        let tables = [
            "research_topics",
            "topic_decompositions",
            "trend_analyses",
            "content_ideas",
        ];
        for table in &tables {
            let mut rows = db
                .conn()
                .query(
                    "SELECT name FROM sqlite_master WHERE type='table' AND name=?1",
                    [*table],
                )
                .await
                .unwrap();
            let row = rows.next().await.unwrap();
            assert!(row.is_some(), "table '{table}' should exist");
        }
    }

    #[tokio::test]
    async fn generate_id_correct_format() {
        let db = test_db().await;
        let id = db.generate_id("rtp").await.unwrap();
        assert!(id.starts_with("rtp-"), "ID should start with 'rtp-': {id}");
        assert_eq!(
            id.len(),
            12,
            "ID should be 12 chars (3 prefix + 1 dash + 8 hex): {id}"
        );

        let hex_part = &id[4..];
        assert!(
            hex_part.chars().all(|c| c.is_ascii_hexdigit()),
            "Random part should be hex: {hex_part}"
        );
    }

    #[tokio::test]
    async fn generate_id_all_prefixes() {
        let db = test_db().await;
        for prefix in trellis_core::ids::ALL_PREFIXES {
            let id = db.generate_id(prefix).await.unwrap();
            assert!(id.starts_with(&format!("{prefix}-")));
        }
    }

    #[tokio::test]
    async fn generate_id_uniqueness() {
        let db = test_db().await;
        let mut ids = HashSet::new();
        for _ in 0..100 {
            let id = db.generate_id("tst").await.unwrap();
            assert!(ids.insert(id.clone()), "Duplicate ID generated: {id}");
        }
    }

    #[tokio::test]
    async fn idempotent_migrations() {
        let db = test_db().await;
        // Run migrations again — should not fail
        db.run_migrations().await.unwrap();
    }

    #[tokio::test]
    async fn one_in_progress_index_enforced() {
        let db = test_db().await;

        db.conn()
            .execute(
                "INSERT INTO research_topics (id, owner_id, title) VALUES ('rtp-t1', 'own-1', 'Topic')",
                (),
            )
            .await
            .unwrap();
        db.conn()
            .execute(
                "INSERT INTO topic_decompositions (id, owner_id, research_topic_id, original_query, subtopics) \
                 VALUES ('dcp-t1', 'own-1', 'rtp-t1', 'Topic', '[]')",
                (),
            )
            .await
            .unwrap();

        db.conn()
            .execute(
                "INSERT INTO trend_analyses (id, owner_id, decomposition_id, subtopic_name, name, keywords, timeframe, geography, status, source) \
                 VALUES ('tan-t1', 'own-1', 'dcp-t1', 'facet', 'a1', '[]', '12m', 'US', 'in_progress', 'manual')",
                (),
            )
            .await
            .unwrap();

        // Second in-progress row for the same (decomposition, subtopic) must fail.
        let dup = db
            .conn()
            .execute(
                "INSERT INTO trend_analyses (id, owner_id, decomposition_id, subtopic_name, name, keywords, timeframe, geography, status, source) \
                 VALUES ('tan-t2', 'own-1', 'dcp-t1', 'facet', 'a2', '[]', '12m', 'US', 'in_progress', 'manual')",
                (),
            )
            .await;
        assert!(dup.is_err(), "duplicate in-progress analysis should be rejected");

        // A completed row for the same subtopic is fine.
        db.conn()
            .execute(
                "INSERT INTO trend_analyses (id, owner_id, decomposition_id, subtopic_name, name, keywords, timeframe, geography, status, source) \
                 VALUES ('tan-t3', 'own-1', 'dcp-t1', 'facet', 'a3', '[]', '12m', 'US', 'completed', 'manual')",
                (),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn one_current_decomposition_index_enforced() {
        let db = test_db().await;

        db.conn()
            .execute(
                "INSERT INTO research_topics (id, owner_id, title) VALUES ('rtp-t1', 'own-1', 'Topic')",
                (),
            )
            .await
            .unwrap();
        db.conn()
            .execute(
                "INSERT INTO topic_decompositions (id, owner_id, research_topic_id, original_query, subtopics, current) \
                 VALUES ('dcp-t1', 'own-1', 'rtp-t1', 'Topic', '[]', 1)",
                (),
            )
            .await
            .unwrap();

        let dup = db
            .conn()
            .execute(
                "INSERT INTO topic_decompositions (id, owner_id, research_topic_id, original_query, subtopics, current) \
                 VALUES ('dcp-t2', 'own-1', 'rtp-t1', 'Topic', '[]', 1)",
                (),
            )
            .await;
        assert!(dup.is_err(), "second current decomposition should be rejected");

        // Superseded rows may coexist.
        db.conn()
            .execute(
                "INSERT INTO topic_decompositions (id, owner_id, research_topic_id, original_query, subtopics, current) \
                 VALUES ('dcp-t3', 'own-1', 'rtp-t1', 'Topic', '[]', 0)",
                (),
            )
            .await
            .unwrap();
    }
}
