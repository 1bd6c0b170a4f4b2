//! Content idea service — leaf rows derived from completed analyses.

use chrono::Utc;

use trellis_core::entities::ContentIdea;
use trellis_core::enums::{AnalysisStatus, IdeaStatus};
use trellis_core::ids::PREFIX_IDEA;
use trellis_core::reports::IdeaDraft;

use crate::error::StoreError;
use crate::helpers::{
    get_opt_string, parse_datetime, parse_enum, parse_json, parse_optional_json, to_json_text,
};
use crate::service::TrellisService;
use crate::updates::idea::IdeaPatch;

const IDEA_COLUMNS: &str = "id, owner_id, trend_analysis_id, research_topic_id, title, \
     content_type, idea_type, status, primary_keyword, secondary_keywords, scoring, \
     created_at, updated_at";

pub(crate) fn row_to_idea(row: &libsql::Row) -> Result<ContentIdea, StoreError> {
    Ok(ContentIdea {
        id: row.get::<String>(0)?,
        owner_id: row.get::<String>(1)?,
        trend_analysis_id: get_opt_string(row, 2)?,
        research_topic_id: get_opt_string(row, 3)?,
        title: row.get::<String>(4)?,
        content_type: row.get::<String>(5)?,
        idea_type: row.get::<String>(6)?,
        status: parse_enum(&row.get::<String>(7)?)?,
        primary_keyword: row.get::<String>(8)?,
        secondary_keywords: parse_json(&row.get::<String>(9)?)?,
        scoring: parse_optional_json(get_opt_string(row, 10)?.as_deref())?,
        created_at: parse_datetime(&row.get::<String>(11)?)?,
        updated_at: parse_datetime(&row.get::<String>(12)?)?,
    })
}

impl TrellisService {
    /// Persist one idea derived from a completed analysis.
    ///
    /// Resolves and stores the owning research-topic id by following
    /// analysis → decomposition → topic, so per-topic queries stay cheap.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the analysis is missing or foreign.
    /// - `StoreError::Precondition` if the analysis is not `completed`.
    /// - `StoreError::Validation` if the draft title is empty.
    pub async fn create_idea(
        &self,
        analysis_id: &str,
        owner: &str,
        draft: IdeaDraft,
    ) -> Result<ContentIdea, StoreError> {
        let analysis = self.get_analysis(analysis_id, owner).await?;
        if analysis.status != AnalysisStatus::Completed {
            return Err(StoreError::Precondition(format!(
                "analysis {analysis_id} is {}; ideas require a completed analysis",
                analysis.status
            )));
        }
        if draft.title.trim().is_empty() {
            return Err(StoreError::Validation("idea title must not be empty".into()));
        }

        let decomposition = self
            .get_decomposition(&analysis.decomposition_id, owner)
            .await?;
        let topic_id = decomposition.research_topic_id;

        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_IDEA).await?;
        let secondary_json = to_json_text(&draft.secondary_keywords)?;
        let scoring_json = match &draft.scoring {
            Some(v) => Some(to_json_text(v)?),
            None => None,
        };

        self.db()
            .conn()
            .execute(
                "INSERT INTO content_ideas (id, owner_id, trend_analysis_id, research_topic_id, title, content_type, idea_type, status, primary_keyword, secondary_keywords, scoring, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'draft', ?8, ?9, ?10, ?11, ?11)",
                libsql::params![
                    id.as_str(),
                    owner,
                    analysis_id,
                    topic_id.as_str(),
                    draft.title.trim(),
                    draft.content_type.as_str(),
                    draft.idea_type.as_str(),
                    draft.primary_keyword.as_str(),
                    secondary_json.as_str(),
                    scoring_json.as_deref(),
                    now.to_rfc3339()
                ],
            )
            .await?;

        Ok(ContentIdea {
            id,
            owner_id: owner.to_string(),
            trend_analysis_id: Some(analysis_id.to_string()),
            research_topic_id: Some(topic_id),
            title: draft.title.trim().to_string(),
            content_type: draft.content_type,
            idea_type: draft.idea_type,
            status: IdeaStatus::Draft,
            primary_keyword: draft.primary_keyword,
            secondary_keywords: draft.secondary_keywords,
            scoring: draft.scoring,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a patch to an idea with dynamic SET clauses.
    ///
    /// # Errors
    ///
    /// - `StoreError::Validation` for an empty patch or empty title.
    /// - `StoreError::NotFound` if the idea is missing or foreign.
    pub async fn update_idea(
        &self,
        id: &str,
        owner: &str,
        patch: IdeaPatch,
    ) -> Result<ContentIdea, StoreError> {
        if patch.is_empty() {
            return Err(StoreError::Validation("empty patch".into()));
        }

        let now = Utc::now();
        let mut sets = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();
        let mut idx = 1;

        if let Some(ref title) = patch.title {
            if title.trim().is_empty() {
                return Err(StoreError::Validation("idea title must not be empty".into()));
            }
            params.push(libsql::Value::Text(title.trim().to_string()));
            sets.push(format!("title = ?{idx}"));
            idx += 1;
        }
        if let Some(status) = patch.status {
            params.push(libsql::Value::Text(status.as_str().to_string()));
            sets.push(format!("status = ?{idx}"));
            idx += 1;
        }
        if let Some(ref keyword) = patch.primary_keyword {
            params.push(libsql::Value::Text(keyword.clone()));
            sets.push(format!("primary_keyword = ?{idx}"));
            idx += 1;
        }
        if let Some(ref keywords) = patch.secondary_keywords {
            params.push(libsql::Value::Text(to_json_text(keywords)?));
            sets.push(format!("secondary_keywords = ?{idx}"));
            idx += 1;
        }
        if let Some(ref scoring) = patch.scoring {
            match scoring {
                Some(v) => params.push(libsql::Value::Text(to_json_text(v)?)),
                None => params.push(libsql::Value::Null),
            }
            sets.push(format!("scoring = ?{idx}"));
            idx += 1;
        }

        params.push(libsql::Value::Text(now.to_rfc3339()));
        sets.push(format!("updated_at = ?{idx}"));
        idx += 1;

        let sql = format!(
            "UPDATE content_ideas SET {} WHERE id = ?{idx} AND owner_id = ?{}",
            sets.join(", "),
            idx + 1,
        );
        params.push(libsql::Value::Text(id.to_string()));
        params.push(libsql::Value::Text(owner.to_string()));

        let affected = self
            .db()
            .conn()
            .execute(&sql, libsql::params_from_iter(params))
            .await?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }

        self.get_idea(id, owner).await
    }

    /// Move an idea to `archived`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the idea is missing or foreign.
    pub async fn archive_idea(&self, id: &str, owner: &str) -> Result<ContentIdea, StoreError> {
        self.update_idea(
            id,
            owner,
            IdeaPatch {
                status: Some(IdeaStatus::Archived),
                ..IdeaPatch::default()
            },
        )
        .await
    }

    /// Get a content idea by ID, scoped to the owner.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if missing or foreign.
    pub async fn get_idea(&self, id: &str, owner: &str) -> Result<ContentIdea, StoreError> {
        let sql =
            format!("SELECT {IDEA_COLUMNS} FROM content_ideas WHERE id = ?1 AND owner_id = ?2");
        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params![id, owner])
            .await?;
        let row = rows.next().await?.ok_or(StoreError::NotFound)?;
        row_to_idea(&row)
    }

    /// List ideas derived from one analysis, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the query fails.
    pub async fn list_ideas_for_analysis(
        &self,
        analysis_id: &str,
        owner: &str,
    ) -> Result<Vec<ContentIdea>, StoreError> {
        let sql = format!(
            "SELECT {IDEA_COLUMNS} FROM content_ideas
             WHERE trend_analysis_id = ?1 AND owner_id = ?2
             ORDER BY created_at, rowid"
        );
        self.collect_ideas(&sql, libsql::params![analysis_id, owner])
            .await
    }

    /// List ideas linked to one topic (via the denormalized direct
    /// reference), oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the query fails.
    pub async fn list_ideas_for_topic(
        &self,
        topic_id: &str,
        owner: &str,
    ) -> Result<Vec<ContentIdea>, StoreError> {
        let sql = format!(
            "SELECT {IDEA_COLUMNS} FROM content_ideas
             WHERE research_topic_id = ?1 AND owner_id = ?2
             ORDER BY created_at, rowid"
        );
        self.collect_ideas(&sql, libsql::params![topic_id, owner])
            .await
    }

    async fn collect_ideas(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<ContentIdea>, StoreError> {
        let mut rows = self.db().conn().query(sql, params).await?;
        let mut ideas = Vec::new();
        while let Some(row) = rows.next().await? {
            ideas.push(row_to_idea(&row)?);
        }
        Ok(ideas)
    }
}
