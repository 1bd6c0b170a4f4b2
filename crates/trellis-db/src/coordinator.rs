//! Dataflow coordinator — compound writes with explicit atomicity policy.
//!
//! Two deliberately different policies live here and must not be merged into
//! one generic transaction wrapper:
//!
//! - `create_topic_with_decomposition` is all-or-nothing, because a topic
//!   without its decomposition breaks a structural invariant of the graph.
//! - `explode_into_ideas` is best-effort fan-out over independent leaf rows:
//!   each draft is persisted on its own and the caller gets a per-item
//!   report. Losing one bad idea must never discard the others.

use trellis_core::entities::{ResearchTopic, Subtopic, TopicDecomposition, TrendAnalysis};
use trellis_core::enums::{AnalysisStatus, TopicStatus};
use trellis_core::ids::{PREFIX_DECOMPOSITION, PREFIX_TOPIC};
use trellis_core::reports::{AnalysisOutcome, FailedIdea, IdeaDraft, IdeaExplosionReport};

use chrono::Utc;

use crate::error::{StoreError, is_unique_violation};
use crate::helpers::to_json_text;
use crate::repos::decomposition::normalize_subtopics;
use crate::repos::topic::validate_title;
use crate::service::TrellisService;

impl TrellisService {
    /// Create a topic together with its first decomposition, atomically.
    ///
    /// Both inserts run in one storage transaction; on any failure after
    /// partial writes the transaction is rolled back entirely, so callers
    /// never observe a topic without its decomposition.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` for a bad or duplicate title, or a
    /// bad subtopic list. Nothing is persisted on error.
    pub async fn create_topic_with_decomposition(
        &self,
        owner: &str,
        title: &str,
        description: Option<&str>,
        original_query: &str,
        subtopics: Vec<Subtopic>,
    ) -> Result<(ResearchTopic, TopicDecomposition), StoreError> {
        validate_title(title)?;
        let title = title.trim();
        let subtopics = normalize_subtopics(original_query, subtopics)?;

        let now = Utc::now();
        let topic_id = self.db().generate_id(PREFIX_TOPIC).await?;
        let decomposition_id = self.db().generate_id(PREFIX_DECOMPOSITION).await?;
        let subtopics_json = to_json_text(&subtopics)?;

        let tx = self.db().transaction().await?;
        let inserted = tx
            .execute(
                "INSERT INTO research_topics (id, owner_id, title, description, status, version, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, 'active', 1, ?5, ?5)",
                libsql::params![topic_id.as_str(), owner, title, description, now.to_rfc3339()],
            )
            .await;
        if let Err(e) = inserted {
            drop(tx); // implicit rollback
            if is_unique_violation(&e) {
                return Err(StoreError::Validation(format!(
                    "a topic titled '{title}' already exists"
                )));
            }
            return Err(e.into());
        }

        tx.execute(
            "INSERT INTO topic_decompositions (id, owner_id, research_topic_id, original_query, subtopics, current, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)",
            libsql::params![
                decomposition_id.as_str(),
                owner,
                topic_id.as_str(),
                original_query.trim(),
                subtopics_json.as_str(),
                now.to_rfc3339()
            ],
        )
        .await?;
        tx.commit().await?;

        let topic = ResearchTopic {
            id: topic_id.clone(),
            owner_id: owner.to_string(),
            title: title.to_string(),
            description: description.map(String::from),
            status: TopicStatus::Active,
            version: 1,
            created_at: now,
            updated_at: now,
        };
        let decomposition = TopicDecomposition {
            id: decomposition_id,
            owner_id: owner.to_string(),
            research_topic_id: topic_id,
            original_query: original_query.trim().to_string(),
            subtopics,
            current: true,
            created_at: now,
        };
        Ok((topic, decomposition))
    }

    /// Record the terminal outcome of an external analysis run.
    ///
    /// Single-entity, atomic by construction: dispatches to
    /// [`Self::complete_analysis`] or [`Self::fail_analysis`].
    ///
    /// # Errors
    ///
    /// Propagates the dispatched method's errors (`Conflict` on an invalid
    /// transition, `NotFound`, `Validation` for an empty failure message).
    pub async fn record_analysis_result(
        &self,
        analysis_id: &str,
        owner: &str,
        outcome: AnalysisOutcome,
    ) -> Result<TrendAnalysis, StoreError> {
        match outcome {
            AnalysisOutcome::Completed { result } => {
                self.complete_analysis(analysis_id, owner, result).await
            }
            AnalysisOutcome::Failed { error } => {
                self.fail_analysis(analysis_id, owner, &error).await
            }
        }
    }

    /// Persist a batch of idea drafts derived from one completed analysis.
    ///
    /// Each draft is created independently; failures are collected into the
    /// report by identity instead of aborting the batch. The only whole-call
    /// failure is the precondition: the analysis must already be `completed`
    /// before any draft runs.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the analysis is missing or foreign.
    /// - `StoreError::Precondition` if the analysis is not `completed`.
    pub async fn explode_into_ideas(
        &self,
        analysis_id: &str,
        owner: &str,
        drafts: Vec<IdeaDraft>,
    ) -> Result<IdeaExplosionReport, StoreError> {
        let analysis = self.get_analysis(analysis_id, owner).await?;
        if analysis.status != AnalysisStatus::Completed {
            return Err(StoreError::Precondition(format!(
                "analysis {analysis_id} is {}; ideas require a completed analysis",
                analysis.status
            )));
        }

        let mut report = IdeaExplosionReport::default();
        for draft in drafts {
            match self.create_idea(analysis_id, owner, draft.clone()).await {
                Ok(idea) => report.created.push(idea),
                Err(e) => {
                    tracing::debug!(
                        analysis = analysis_id,
                        title = draft.title.as_str(),
                        error = %e,
                        "idea draft rejected during fan-out"
                    );
                    report.failed.push(FailedIdea {
                        input: draft,
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(report)
    }
}
