//! Research topic repository — CRUD with optimistic concurrency.

use chrono::Utc;

use trellis_core::entities::ResearchTopic;
use trellis_core::enums::{IdeaStatus, TopicStatus};
use trellis_core::ids::PREFIX_TOPIC;

use crate::error::{StoreError, is_unique_violation};
use crate::helpers::{get_opt_string, parse_datetime, parse_enum};
use crate::service::TrellisService;
use crate::updates::topic::TopicPatch;

/// Engine-owned bound on topic titles.
pub const MAX_TITLE_LEN: usize = 200;

pub(crate) fn row_to_topic(row: &libsql::Row) -> Result<ResearchTopic, StoreError> {
    Ok(ResearchTopic {
        id: row.get::<String>(0)?,
        owner_id: row.get::<String>(1)?,
        title: row.get::<String>(2)?,
        description: get_opt_string(row, 3)?,
        status: parse_enum(&row.get::<String>(4)?)?,
        version: row.get::<i64>(5)?,
        created_at: parse_datetime(&row.get::<String>(6)?)?,
        updated_at: parse_datetime(&row.get::<String>(7)?)?,
    })
}

pub(crate) fn validate_title(title: &str) -> Result<(), StoreError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(StoreError::Validation("title must not be empty".into()));
    }
    if trimmed.len() > MAX_TITLE_LEN {
        return Err(StoreError::Validation(format!(
            "title exceeds {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

impl TrellisService {
    /// Create a new research topic with `version = 1` and status `active`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` if the title is empty, too long, or
    /// duplicates an existing title for the same owner.
    pub async fn create_topic(
        &self,
        owner: &str,
        title: &str,
        description: Option<&str>,
    ) -> Result<ResearchTopic, StoreError> {
        validate_title(title)?;
        let title = title.trim();

        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_TOPIC).await?;

        self.db()
            .conn()
            .execute(
                "INSERT INTO research_topics (id, owner_id, title, description, status, version, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, 'active', 1, ?5, ?5)",
                libsql::params![id.as_str(), owner, title, description, now.to_rfc3339()],
            )
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::Validation(format!("a topic titled '{title}' already exists"))
                } else {
                    StoreError::from(e)
                }
            })?;

        Ok(ResearchTopic {
            id,
            owner_id: owner.to_string(),
            title: title.to_string(),
            description: description.map(String::from),
            status: TopicStatus::Active,
            version: 1,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a research topic by ID, scoped to the owner.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the topic does not exist or belongs
    /// to another owner.
    pub async fn get_topic(&self, id: &str, owner: &str) -> Result<ResearchTopic, StoreError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, owner_id, title, description, status, version, created_at, updated_at
                 FROM research_topics WHERE id = ?1 AND owner_id = ?2",
                libsql::params![id, owner],
            )
            .await?;
        let row = rows.next().await?.ok_or(StoreError::NotFound)?;
        row_to_topic(&row)
    }

    /// List an owner's topics ordered by creation date descending.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the query fails.
    pub async fn list_topics(
        &self,
        owner: &str,
        limit: u32,
    ) -> Result<Vec<ResearchTopic>, StoreError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, owner_id, title, description, status, version, created_at, updated_at
                 FROM research_topics WHERE owner_id = ?1 ORDER BY created_at DESC LIMIT ?2",
                libsql::params![owner, i64::from(limit)],
            )
            .await?;

        let mut topics = Vec::new();
        while let Some(row) = rows.next().await? {
            topics.push(row_to_topic(&row)?);
        }
        Ok(topics)
    }

    /// Apply a patch to a topic under optimistic concurrency.
    ///
    /// The version check and increment happen in the same UPDATE statement as
    /// the patch — a single compare-and-swap at the storage layer, never a
    /// read-then-write round trip.
    ///
    /// # Errors
    ///
    /// - `StoreError::Conflict` if the stored version ≠ `expected_version`.
    /// - `StoreError::NotFound` if the topic is missing or foreign.
    /// - `StoreError::Validation` for a bad title or one that duplicates
    ///   another topic of the same owner.
    pub async fn update_topic(
        &self,
        id: &str,
        owner: &str,
        expected_version: i64,
        patch: TopicPatch,
    ) -> Result<ResearchTopic, StoreError> {
        if patch.is_empty() {
            return Err(StoreError::Validation("empty patch".into()));
        }

        let now = Utc::now();
        let mut sets = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();
        let mut idx = 1;

        if let Some(ref title) = patch.title {
            validate_title(title)?;
            params.push(libsql::Value::Text(title.trim().to_string()));
            sets.push(format!("title = ?{idx}"));
            idx += 1;
        }
        if let Some(ref description) = patch.description {
            match description {
                Some(d) => params.push(libsql::Value::Text(d.clone())),
                None => params.push(libsql::Value::Null),
            }
            sets.push(format!("description = ?{idx}"));
            idx += 1;
        }
        if let Some(status) = patch.status {
            params.push(libsql::Value::Text(status.as_str().to_string()));
            sets.push(format!("status = ?{idx}"));
            idx += 1;
        }

        params.push(libsql::Value::Text(now.to_rfc3339()));
        sets.push(format!("updated_at = ?{idx}"));
        idx += 1;

        sets.push("version = version + 1".to_string());

        let sql = format!(
            "UPDATE research_topics SET {} WHERE id = ?{idx} AND owner_id = ?{} AND version = ?{}",
            sets.join(", "),
            idx + 1,
            idx + 2,
        );
        params.push(libsql::Value::Text(id.to_string()));
        params.push(libsql::Value::Text(owner.to_string()));
        params.push(libsql::Value::Integer(expected_version));

        let affected = self
            .db()
            .conn()
            .execute(&sql, libsql::params_from_iter(params))
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::Validation("another topic already uses that title".into())
                } else {
                    StoreError::from(e)
                }
            })?;

        if affected == 0 {
            // Distinguish a stale version from a missing row.
            let current = self.get_topic(id, owner).await?;
            return Err(StoreError::Conflict(format!(
                "version mismatch for topic {id}: expected {expected_version}, stored {}",
                current.version
            )));
        }

        self.get_topic(id, owner).await
    }

    /// Soft-delete a topic by marking it archived.
    ///
    /// Counts as a mutation: the version increments.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the topic is missing or foreign.
    pub async fn archive_topic(&self, id: &str, owner: &str) -> Result<ResearchTopic, StoreError> {
        let now = Utc::now();
        let affected = self
            .db()
            .conn()
            .execute(
                "UPDATE research_topics
                 SET status = 'archived', version = version + 1, updated_at = ?1
                 WHERE id = ?2 AND owner_id = ?3",
                libsql::params![now.to_rfc3339(), id, owner],
            )
            .await?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_topic(id, owner).await
    }

    /// Hard-delete a topic and its dependents (privileged, administrative).
    ///
    /// Cascades decompositions, analyses, and non-published ideas; published
    /// ideas are detached (both parent references set NULL) to preserve
    /// user-visible work product. Runs in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the topic is missing or foreign.
    pub async fn hard_delete_topic(&self, id: &str, owner: &str) -> Result<(), StoreError> {
        // Existence probe keeps the NotFound contract without relying on
        // DELETE row counts after the idea pass.
        self.get_topic(id, owner).await?;

        let tx = self.db().transaction().await?;

        let detached = tx
            .execute(
                "UPDATE content_ideas SET trend_analysis_id = NULL, research_topic_id = NULL
                 WHERE research_topic_id = ?1 AND owner_id = ?2 AND status = ?3",
                libsql::params![id, owner, IdeaStatus::Published.as_str()],
            )
            .await?;

        tx.execute(
            "DELETE FROM content_ideas WHERE research_topic_id = ?1 AND owner_id = ?2",
            libsql::params![id, owner],
        )
        .await?;

        // Decompositions and analyses go via ON DELETE CASCADE.
        tx.execute(
            "DELETE FROM research_topics WHERE id = ?1 AND owner_id = ?2",
            libsql::params![id, owner],
        )
        .await?;

        tx.commit().await?;

        if detached > 0 {
            tracing::warn!(topic = id, detached, "published ideas detached on topic delete");
        }
        Ok(())
    }
}
