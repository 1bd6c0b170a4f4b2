//! Topic decomposition service — subtopic-set validation and replacement.

use chrono::Utc;

use trellis_core::entities::{Subtopic, TopicDecomposition};
use trellis_core::ids::PREFIX_DECOMPOSITION;

use crate::error::StoreError;
use crate::helpers::{parse_datetime, parse_json, to_json_text};
use crate::service::TrellisService;

pub(crate) fn row_to_decomposition(row: &libsql::Row) -> Result<TopicDecomposition, StoreError> {
    Ok(TopicDecomposition {
        id: row.get::<String>(0)?,
        owner_id: row.get::<String>(1)?,
        research_topic_id: row.get::<String>(2)?,
        original_query: row.get::<String>(3)?,
        subtopics: parse_json(&row.get::<String>(4)?)?,
        current: row.get::<i64>(5)? != 0,
        created_at: parse_datetime(&row.get::<String>(6)?)?,
    })
}

/// Validate collaborator-supplied subtopics and guarantee the
/// original-topic-as-subtopic invariant.
///
/// The decomposition collaborator is imperfect: rather than rejecting a list
/// that omits the original topic, an entry is injected with the query as both
/// name and description.
pub(crate) fn normalize_subtopics(
    original_query: &str,
    mut subtopics: Vec<Subtopic>,
) -> Result<Vec<Subtopic>, StoreError> {
    if subtopics.is_empty() {
        return Err(StoreError::Validation("subtopic list is empty".into()));
    }
    for sub in &subtopics {
        if sub.name.trim().is_empty() {
            return Err(StoreError::Validation("subtopic name must not be empty".into()));
        }
        if !(0.0..=1.0).contains(&sub.relevance) {
            return Err(StoreError::Validation(format!(
                "relevance {} for subtopic '{}' is outside [0, 1]",
                sub.relevance, sub.name
            )));
        }
    }

    let wanted = original_query.trim();
    if !subtopics.iter().any(|s| s.name.trim() == wanted) {
        subtopics.push(Subtopic::original(wanted));
    }
    Ok(subtopics)
}

impl TrellisService {
    /// Record a decomposition for a topic, replacing the current one.
    ///
    /// Inputs come from the external decomposition collaborator. The prior
    /// current row (if any) is marked superseded and retained for history —
    /// both steps happen in one transaction so readers never see zero or two
    /// current decompositions.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the topic is missing or foreign.
    /// - `StoreError::Validation` if the subtopic list is empty or malformed.
    pub async fn decompose(
        &self,
        topic_id: &str,
        owner: &str,
        original_query: &str,
        subtopics: Vec<Subtopic>,
    ) -> Result<TopicDecomposition, StoreError> {
        self.get_topic(topic_id, owner).await?;
        let subtopics = normalize_subtopics(original_query, subtopics)?;

        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_DECOMPOSITION).await?;
        let subtopics_json = to_json_text(&subtopics)?;

        let tx = self.db().transaction().await?;
        tx.execute(
            "UPDATE topic_decompositions SET current = 0
             WHERE research_topic_id = ?1 AND owner_id = ?2 AND current = 1",
            libsql::params![topic_id, owner],
        )
        .await?;
        tx.execute(
            "INSERT INTO topic_decompositions (id, owner_id, research_topic_id, original_query, subtopics, current, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)",
            libsql::params![
                id.as_str(),
                owner,
                topic_id,
                original_query.trim(),
                subtopics_json.as_str(),
                now.to_rfc3339()
            ],
        )
        .await?;
        tx.commit().await?;

        Ok(TopicDecomposition {
            id,
            owner_id: owner.to_string(),
            research_topic_id: topic_id.to_string(),
            original_query: original_query.trim().to_string(),
            subtopics,
            current: true,
            created_at: now,
        })
    }

    /// Get the current decomposition for a topic.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the topic has no current
    /// decomposition or is foreign.
    pub async fn current_decomposition(
        &self,
        topic_id: &str,
        owner: &str,
    ) -> Result<TopicDecomposition, StoreError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, owner_id, research_topic_id, original_query, subtopics, current, created_at
                 FROM topic_decompositions
                 WHERE research_topic_id = ?1 AND owner_id = ?2 AND current = 1",
                libsql::params![topic_id, owner],
            )
            .await?;
        let row = rows.next().await?.ok_or(StoreError::NotFound)?;
        row_to_decomposition(&row)
    }

    /// Get a decomposition by ID (current or superseded).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if missing or foreign.
    pub async fn get_decomposition(
        &self,
        id: &str,
        owner: &str,
    ) -> Result<TopicDecomposition, StoreError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, owner_id, research_topic_id, original_query, subtopics, current, created_at
                 FROM topic_decompositions WHERE id = ?1 AND owner_id = ?2",
                libsql::params![id, owner],
            )
            .await?;
        let row = rows.next().await?.ok_or(StoreError::NotFound)?;
        row_to_decomposition(&row)
    }

    /// All decompositions ever recorded for a topic, newest first.
    ///
    /// Superseded rows are retained, so this is the re-decomposition history.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the query fails.
    pub async fn decomposition_history(
        &self,
        topic_id: &str,
        owner: &str,
    ) -> Result<Vec<TopicDecomposition>, StoreError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, owner_id, research_topic_id, original_query, subtopics, current, created_at
                 FROM topic_decompositions
                 WHERE research_topic_id = ?1 AND owner_id = ?2
                 ORDER BY created_at DESC, rowid DESC",
                libsql::params![topic_id, owner],
            )
            .await?;

        let mut items = Vec::new();
        while let Some(row) = rows.next().await? {
            items.push(row_to_decomposition(&row)?);
        }
        Ok(items)
    }
}
