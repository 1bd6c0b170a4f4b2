//! Input and report types for compound dataflow operations.
//!
//! These structs define the shapes that cross the coordinator boundary: the
//! parameters collaborators hand in, the per-item fan-out report, and the
//! fully reconstructed graph returned by the reader.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::{ContentIdea, ResearchTopic, TopicDecomposition, TrendAnalysis};

/// Parameters for starting a trend analysis, as supplied by the caller
/// driving the trend-data collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AnalysisParams {
    pub name: String,
    pub keywords: Vec<String>,
    pub timeframe: String,
    pub geography: String,
    pub source: crate::enums::AnalysisSource,
}

/// Terminal outcome of an external trend analysis run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum AnalysisOutcome {
    Completed { result: serde_json::Value },
    Failed { error: String },
}

/// An idea draft produced by the idea-generation collaborator, not yet
/// validated or persisted.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct IdeaDraft {
    pub title: String,
    pub content_type: String,
    pub idea_type: String,
    pub primary_keyword: String,
    #[serde(default)]
    pub secondary_keywords: Vec<String>,
    #[serde(default)]
    pub scoring: Option<serde_json::Value>,
}

/// One rejected draft from an idea fan-out, reported by identity.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct FailedIdea {
    /// The draft exactly as submitted, so callers can correlate failures.
    pub input: IdeaDraft,
    pub reason: String,
}

/// Aggregated result of exploding a completed analysis into ideas.
///
/// The fan-out is best-effort: one bad draft never discards the others, so
/// both lists can be non-empty ("N of M ideas saved").
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
pub struct IdeaExplosionReport {
    pub created: Vec<ContentIdea>,
    pub failed: Vec<FailedIdea>,
}

impl IdeaExplosionReport {
    /// Whether every submitted draft was persisted.
    #[must_use]
    pub fn all_created(&self) -> bool {
        self.failed.is_empty()
    }
}

/// The complete research graph for one topic, reconstructed in a single
/// consistent snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct CompleteDataflow {
    pub topic: ResearchTopic,
    pub decomposition: Option<TopicDecomposition>,
    pub analyses: Vec<TrendAnalysis>,
    pub ideas: Vec<ContentIdea>,
}
