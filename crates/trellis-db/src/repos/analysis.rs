//! Trend analysis orchestrator — per-subtopic lifecycle state machine.
//!
//! Analyses move forward only: `pending → in_progress → completed`, or
//! `pending|in_progress → failed`. Retrying a failed analysis means creating
//! a new row. The duplicate-run guard (one in-progress analysis per
//! (decomposition, subtopic)) is a partial unique index, so concurrent
//! starters race at the storage layer, not behind a lock.

use chrono::{Duration, Utc};

use trellis_core::entities::TrendAnalysis;
use trellis_core::enums::{AnalysisStatus, IdeaStatus};
use trellis_core::ids::PREFIX_ANALYSIS;
use trellis_core::reports::AnalysisParams;

use crate::error::{StoreError, is_unique_violation};
use crate::helpers::{
    get_opt_string, parse_datetime, parse_enum, parse_json, parse_optional_datetime,
    parse_optional_json, to_json_text,
};
use crate::service::TrellisService;

const ANALYSIS_COLUMNS: &str = "id, owner_id, decomposition_id, subtopic_name, name, keywords, \
     timeframe, geography, status, source, result, error_message, \
     created_at, started_at, completed_at, processing_ms";

pub(crate) fn row_to_analysis(row: &libsql::Row) -> Result<TrendAnalysis, StoreError> {
    Ok(TrendAnalysis {
        id: row.get::<String>(0)?,
        owner_id: row.get::<String>(1)?,
        decomposition_id: row.get::<String>(2)?,
        subtopic_name: row.get::<String>(3)?,
        name: row.get::<String>(4)?,
        keywords: parse_json(&row.get::<String>(5)?)?,
        timeframe: row.get::<String>(6)?,
        geography: row.get::<String>(7)?,
        status: parse_enum(&row.get::<String>(8)?)?,
        source: parse_enum(&row.get::<String>(9)?)?,
        result: parse_optional_json(get_opt_string(row, 10)?.as_deref())?,
        error_message: get_opt_string(row, 11)?,
        created_at: parse_datetime(&row.get::<String>(12)?)?,
        started_at: parse_optional_datetime(get_opt_string(row, 13)?.as_deref())?,
        completed_at: parse_optional_datetime(get_opt_string(row, 14)?.as_deref())?,
        processing_ms: row.get::<Option<i64>>(15)?,
    })
}

impl TrellisService {
    /// Start an analysis for one subtopic of a decomposition.
    ///
    /// Creates the row in `pending`, then immediately promotes it to
    /// `in_progress` and records the start time — the actual computation is
    /// delegated to an external collaborator; this method only manages state.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the decomposition is missing or foreign.
    /// - `StoreError::Validation` if `subtopic_name` does not match an entry
    ///   in the decomposition.
    /// - `StoreError::Conflict` if an analysis for the same subtopic is
    ///   already in progress.
    pub async fn start_analysis(
        &self,
        decomposition_id: &str,
        owner: &str,
        subtopic_name: &str,
        params: AnalysisParams,
    ) -> Result<TrendAnalysis, StoreError> {
        let decomposition = self.get_decomposition(decomposition_id, owner).await?;
        let subtopic_name = subtopic_name.trim();
        if !decomposition.contains_subtopic(subtopic_name) {
            return Err(StoreError::Validation(format!(
                "subtopic '{subtopic_name}' is not part of decomposition {decomposition_id}"
            )));
        }

        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_ANALYSIS).await?;
        let keywords_json = to_json_text(&params.keywords)?;

        let tx = self.db().transaction().await?;
        tx.execute(
            "INSERT INTO trend_analyses (id, owner_id, decomposition_id, subtopic_name, name, keywords, timeframe, geography, status, source, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 'pending', ?9, ?10)",
            libsql::params![
                id.as_str(),
                owner,
                decomposition_id,
                subtopic_name,
                params.name.as_str(),
                keywords_json.as_str(),
                params.timeframe.as_str(),
                params.geography.as_str(),
                params.source.as_str(),
                now.to_rfc3339()
            ],
        )
        .await?;

        // The in-progress uniqueness index fires here, not on the insert.
        let promote = tx
            .execute(
                "UPDATE trend_analyses SET status = 'in_progress', started_at = ?1 WHERE id = ?2",
                libsql::params![now.to_rfc3339(), id.as_str()],
            )
            .await;
        if let Err(e) = promote {
            drop(tx); // implicit rollback
            if is_unique_violation(&e) {
                return Err(StoreError::Conflict(format!(
                    "an analysis for subtopic '{subtopic_name}' is already in progress"
                )));
            }
            return Err(e.into());
        }
        tx.commit().await?;

        Ok(TrendAnalysis {
            id,
            owner_id: owner.to_string(),
            decomposition_id: decomposition_id.to_string(),
            subtopic_name: subtopic_name.to_string(),
            name: params.name,
            keywords: params.keywords,
            timeframe: params.timeframe,
            geography: params.geography,
            status: AnalysisStatus::InProgress,
            source: params.source,
            result: None,
            error_message: None,
            created_at: now,
            started_at: Some(now),
            completed_at: None,
            processing_ms: None,
        })
    }

    /// Mark an in-progress analysis completed and store its payload.
    ///
    /// Records the completion time and the elapsed processing time.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the analysis is missing or foreign.
    /// - `StoreError::Conflict` if the analysis is not `in_progress`.
    pub async fn complete_analysis(
        &self,
        id: &str,
        owner: &str,
        result: serde_json::Value,
    ) -> Result<TrendAnalysis, StoreError> {
        let current = self.get_analysis(id, owner).await?;
        if !current.status.can_transition_to(AnalysisStatus::Completed) {
            return Err(StoreError::Conflict(format!(
                "cannot complete analysis {id} from {}",
                current.status
            )));
        }

        let now = Utc::now();
        let processing_ms = current
            .started_at
            .map(|started| (now - started).num_milliseconds().max(0));
        let result_json = to_json_text(&result)?;

        // Guarded UPDATE: a concurrent complete/fail that won the race leaves
        // zero affected rows here.
        let affected = self
            .db()
            .conn()
            .execute(
                "UPDATE trend_analyses
                 SET status = 'completed', result = ?1, completed_at = ?2, processing_ms = ?3
                 WHERE id = ?4 AND owner_id = ?5 AND status = 'in_progress'",
                libsql::params![result_json.as_str(), now.to_rfc3339(), processing_ms, id, owner],
            )
            .await?;
        if affected == 0 {
            return Err(StoreError::Conflict(format!(
                "analysis {id} left in_progress before completion was recorded"
            )));
        }

        self.get_analysis(id, owner).await
    }

    /// Mark a pending or in-progress analysis failed.
    ///
    /// Also the hook for supervising callers to enforce deadlines: the
    /// orchestrator runs no timers of its own.
    ///
    /// # Errors
    ///
    /// - `StoreError::Validation` if `error_message` is empty (failed rows
    ///   must carry a reason).
    /// - `StoreError::NotFound` if the analysis is missing or foreign.
    /// - `StoreError::Conflict` if the analysis is already terminal.
    pub async fn fail_analysis(
        &self,
        id: &str,
        owner: &str,
        error_message: &str,
    ) -> Result<TrendAnalysis, StoreError> {
        if error_message.trim().is_empty() {
            return Err(StoreError::Validation(
                "failed analyses require a non-empty error message".into(),
            ));
        }

        let current = self.get_analysis(id, owner).await?;
        if !current.status.can_transition_to(AnalysisStatus::Failed) {
            return Err(StoreError::Conflict(format!(
                "cannot fail analysis {id} from {}",
                current.status
            )));
        }

        let now = Utc::now();
        let affected = self
            .db()
            .conn()
            .execute(
                "UPDATE trend_analyses SET status = 'failed', error_message = ?1
                 WHERE id = ?2 AND owner_id = ?3 AND status IN ('pending', 'in_progress')",
                libsql::params![error_message.trim(), id, owner],
            )
            .await?;
        if affected == 0 {
            return Err(StoreError::Conflict(format!(
                "analysis {id} reached a terminal state before failure was recorded"
            )));
        }
        tracing::debug!(analysis = id, at = %now, "analysis marked failed");

        self.get_analysis(id, owner).await
    }

    /// Get a trend analysis by ID, scoped to the owner.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if missing or foreign.
    pub async fn get_analysis(&self, id: &str, owner: &str) -> Result<TrendAnalysis, StoreError> {
        let sql = format!(
            "SELECT {ANALYSIS_COLUMNS} FROM trend_analyses WHERE id = ?1 AND owner_id = ?2"
        );
        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params![id, owner])
            .await?;
        let row = rows.next().await?.ok_or(StoreError::NotFound)?;
        row_to_analysis(&row)
    }

    /// List all analyses for a decomposition, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the query fails.
    pub async fn list_analyses_for_decomposition(
        &self,
        decomposition_id: &str,
        owner: &str,
    ) -> Result<Vec<TrendAnalysis>, StoreError> {
        let sql = format!(
            "SELECT {ANALYSIS_COLUMNS} FROM trend_analyses
             WHERE decomposition_id = ?1 AND owner_id = ?2
             ORDER BY created_at, rowid"
        );
        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params![decomposition_id, owner])
            .await?;

        let mut analyses = Vec::new();
        while let Some(row) = rows.next().await? {
            analyses.push(row_to_analysis(&row)?);
        }
        Ok(analyses)
    }

    /// Fail every in-progress analysis of this owner that started more than
    /// `timeout_secs` ago, returning the rows that were marked.
    ///
    /// Intended for the supervising process that drives the trend
    /// collaborators; the engine never runs this on its own schedule.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the scan or any update fails.
    pub async fn sweep_overdue_analyses(
        &self,
        owner: &str,
        timeout_secs: u64,
    ) -> Result<Vec<TrendAnalysis>, StoreError> {
        let cutoff = Utc::now() - Duration::seconds(i64::try_from(timeout_secs).unwrap_or(i64::MAX));

        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id FROM trend_analyses
                 WHERE owner_id = ?1 AND status = 'in_progress' AND started_at < ?2",
                libsql::params![owner, cutoff.to_rfc3339()],
            )
            .await?;

        let mut overdue_ids = Vec::new();
        while let Some(row) = rows.next().await? {
            overdue_ids.push(row.get::<String>(0)?);
        }

        let message = format!("timed out after {timeout_secs}s without a reported outcome");
        let mut swept = Vec::new();
        for id in overdue_ids {
            tracing::warn!(analysis = %id, timeout_secs, "marking overdue analysis failed");
            swept.push(self.fail_analysis(&id, owner, &message).await?);
        }
        Ok(swept)
    }

    /// Delete an analysis row.
    ///
    /// Non-published ideas derived from it are removed; published ideas are
    /// detached (analysis reference set NULL) to preserve user-visible work
    /// product.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if missing or foreign.
    pub async fn delete_analysis(&self, id: &str, owner: &str) -> Result<(), StoreError> {
        self.get_analysis(id, owner).await?;

        let tx = self.db().transaction().await?;
        let detached = tx
            .execute(
                "UPDATE content_ideas SET trend_analysis_id = NULL
                 WHERE trend_analysis_id = ?1 AND owner_id = ?2 AND status = ?3",
                libsql::params![id, owner, IdeaStatus::Published.as_str()],
            )
            .await?;
        tx.execute(
            "DELETE FROM content_ideas WHERE trend_analysis_id = ?1 AND owner_id = ?2",
            libsql::params![id, owner],
        )
        .await?;
        tx.execute(
            "DELETE FROM trend_analyses WHERE id = ?1 AND owner_id = ?2",
            libsql::params![id, owner],
        )
        .await?;
        tx.commit().await?;

        if detached > 0 {
            tracing::warn!(analysis = id, detached, "published ideas detached on analysis delete");
        }
        Ok(())
    }
}
