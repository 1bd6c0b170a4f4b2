use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{AnalysisSource, AnalysisStatus};

/// A trend investigation of a single subtopic, produced by an external
/// data source and persisted here.
///
/// `subtopic_name` is a free-text match key against the decomposition's
/// subtopic list, not a foreign key — validated once at start time.
///
/// Invariants: `error_message` is non-empty iff `status == Failed`;
/// `completed_at` is set iff `status == Completed`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct TrendAnalysis {
    pub id: String,
    pub owner_id: String,
    pub decomposition_id: String,
    pub subtopic_name: String,
    pub name: String,
    pub keywords: Vec<String>,
    pub timeframe: String,
    pub geography: String,
    pub status: AnalysisStatus,
    pub source: AnalysisSource,
    /// Opaque structured payload owned by the producing collaborator.
    pub result: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Elapsed wall time from start to completion, in milliseconds.
    pub processing_ms: Option<i64>,
}
