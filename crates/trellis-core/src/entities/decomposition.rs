use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A named facet of a research topic.
///
/// By convention every decomposition contains a subtopic reproducing the
/// original topic itself; the decomposition service injects one when the
/// collaborator omits it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Subtopic {
    pub name: String,
    pub description: String,
    /// Relevance to the original topic, in `[0, 1]`.
    pub relevance: f64,
}

impl Subtopic {
    /// Build the subtopic representing the original query itself.
    #[must_use]
    pub fn original(query: &str) -> Self {
        Self {
            name: query.to_string(),
            description: query.to_string(),
            relevance: 1.0,
        }
    }
}

/// The current set of subtopics for a research topic.
///
/// A topic has at most one current decomposition; re-decomposition inserts a
/// new row and marks the prior one superseded (retained for history, never
/// overwritten in place).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct TopicDecomposition {
    pub id: String,
    pub owner_id: String,
    pub research_topic_id: String,
    pub original_query: String,
    /// Ordered list; invariant: non-empty, contains the original topic.
    pub subtopics: Vec<Subtopic>,
    pub current: bool,
    pub created_at: DateTime<Utc>,
}

impl TopicDecomposition {
    /// Whether `name` matches one of the subtopics (trimmed, exact).
    #[must_use]
    pub fn contains_subtopic(&self, name: &str) -> bool {
        let wanted = name.trim();
        self.subtopics.iter().any(|s| s.name.trim() == wanted)
    }
}
