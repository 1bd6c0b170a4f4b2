use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::IdeaStatus;

/// A concrete content concept derived from a completed trend analysis.
///
/// Both parent references are nullable: deleting an analysis (or hard
/// deleting a topic) detaches published ideas instead of destroying
/// user-visible work product.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ContentIdea {
    pub id: String,
    pub owner_id: String,
    pub trend_analysis_id: Option<String>,
    /// Denormalized direct reference for cheap per-topic queries.
    pub research_topic_id: Option<String>,
    pub title: String,
    pub content_type: String,
    pub idea_type: String,
    pub status: IdeaStatus,
    pub primary_keyword: String,
    pub secondary_keywords: Vec<String>,
    /// Opaque numeric metadata (difficulty, volume, ...) owned by collaborators.
    pub scoring: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
