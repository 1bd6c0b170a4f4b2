//! Entity structs for the four levels of the research dataflow graph.
//!
//! Each entity maps to a table in the libSQL database. All structs derive
//! `Serialize`, `Deserialize`, and `JsonSchema` for JSON roundtrip and
//! schema generation.

mod analysis;
mod decomposition;
mod idea;
mod topic;

pub use analysis::TrendAnalysis;
pub use decomposition::{Subtopic, TopicDecomposition};
pub use idea::ContentIdea;
pub use topic::ResearchTopic;
