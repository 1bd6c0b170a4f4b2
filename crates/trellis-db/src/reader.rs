//! Dataflow reader — whole-graph reconstruction in one consistent snapshot.

use trellis_core::enums::WorkflowStage;
use trellis_core::reports::CompleteDataflow;

use crate::error::StoreError;
use crate::repos::analysis::row_to_analysis;
use crate::repos::decomposition::row_to_decomposition;
use crate::repos::idea::row_to_idea;
use crate::repos::topic::row_to_topic;
use crate::service::TrellisService;

impl TrellisService {
    /// Reconstruct the complete research graph for one topic.
    ///
    /// All four levels are read inside a single transaction so the result is
    /// a consistent snapshot: no analysis or idea appears without its parent
    /// having been visible in the same read. Each level is ordered by
    /// creation time.
    ///
    /// `decomposition` is the current one; `analyses` covers every
    /// decomposition the topic ever had (retries and superseded history
    /// included), and `ideas` covers everything still linked to the topic.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the topic does not exist or belongs
    /// to another owner.
    pub async fn get_complete(
        &self,
        topic_id: &str,
        owner: &str,
    ) -> Result<CompleteDataflow, StoreError> {
        let tx = self.db().transaction().await?;

        let mut rows = tx
            .query(
                "SELECT id, owner_id, title, description, status, version, created_at, updated_at
                 FROM research_topics WHERE id = ?1 AND owner_id = ?2",
                libsql::params![topic_id, owner],
            )
            .await?;
        let Some(row) = rows.next().await? else {
            return Err(StoreError::NotFound);
        };
        let topic = row_to_topic(&row)?;

        let mut rows = tx
            .query(
                "SELECT id, owner_id, research_topic_id, original_query, subtopics, current, created_at
                 FROM topic_decompositions
                 WHERE research_topic_id = ?1 AND owner_id = ?2 AND current = 1",
                libsql::params![topic_id, owner],
            )
            .await?;
        let decomposition = match rows.next().await? {
            Some(row) => Some(row_to_decomposition(&row)?),
            None => None,
        };

        let mut rows = tx
            .query(
                "SELECT a.id, a.owner_id, a.decomposition_id, a.subtopic_name, a.name, a.keywords,
                        a.timeframe, a.geography, a.status, a.source, a.result, a.error_message,
                        a.created_at, a.started_at, a.completed_at, a.processing_ms
                 FROM trend_analyses a
                 JOIN topic_decompositions d ON d.id = a.decomposition_id
                 WHERE d.research_topic_id = ?1 AND a.owner_id = ?2
                 ORDER BY a.created_at, a.rowid",
                libsql::params![topic_id, owner],
            )
            .await?;
        let mut analyses = Vec::new();
        while let Some(row) = rows.next().await? {
            analyses.push(row_to_analysis(&row)?);
        }

        let mut rows = tx
            .query(
                "SELECT id, owner_id, trend_analysis_id, research_topic_id, title, content_type,
                        idea_type, status, primary_keyword, secondary_keywords, scoring,
                        created_at, updated_at
                 FROM content_ideas
                 WHERE research_topic_id = ?1 AND owner_id = ?2
                 ORDER BY created_at, rowid",
                libsql::params![topic_id, owner],
            )
            .await?;
        let mut ideas = Vec::new();
        while let Some(row) = rows.next().await? {
            ideas.push(row_to_idea(&row)?);
        }

        tx.commit().await?;

        Ok(CompleteDataflow {
            topic,
            decomposition,
            analyses,
            ideas,
        })
    }

    /// Derive the topic's position in the research workflow from the stored
    /// graph.
    ///
    /// "Current step" is never stored client state; it falls out of what the
    /// graph already contains.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the topic is missing or foreign.
    pub async fn workflow_stage(
        &self,
        topic_id: &str,
        owner: &str,
    ) -> Result<WorkflowStage, StoreError> {
        let graph = self.get_complete(topic_id, owner).await?;

        if !graph.ideas.is_empty() {
            return Ok(WorkflowStage::IdeasGenerated);
        }
        if graph
            .analyses
            .iter()
            .any(|a| a.status == trellis_core::enums::AnalysisStatus::Completed)
        {
            return Ok(WorkflowStage::AnalysisCompleted);
        }
        if !graph.analyses.is_empty() {
            return Ok(WorkflowStage::Analyzing);
        }
        if graph.decomposition.is_some() {
            return Ok(WorkflowStage::Decomposed);
        }
        Ok(WorkflowStage::TopicCreated)
    }
}
