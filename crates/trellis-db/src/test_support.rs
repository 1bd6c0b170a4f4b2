//! Shared test utilities for trellis-db tests.

#[cfg(test)]
pub(crate) mod helpers {
    use trellis_core::entities::{ResearchTopic, Subtopic, TopicDecomposition, TrendAnalysis};
    use trellis_core::enums::AnalysisSource;
    use trellis_core::reports::{AnalysisParams, IdeaDraft};

    use crate::TrellisDb;
    use crate::service::TrellisService;

    /// Owner used by every test unless it exercises isolation explicitly.
    pub const OWNER: &str = "own-1";

    /// Create an in-memory TrellisService with migrations applied.
    pub async fn test_service() -> TrellisService {
        let db = TrellisDb::open_local(":memory:").await.unwrap();
        TrellisService::from_db(db)
    }

    /// Build a subtopic with a derived description.
    pub fn subtopic(name: &str, relevance: f64) -> Subtopic {
        Subtopic {
            name: name.to_string(),
            description: format!("Research facet: {name}"),
            relevance,
        }
    }

    /// Default analysis parameters for tests that don't care about them.
    pub fn test_params(name: &str) -> AnalysisParams {
        AnalysisParams {
            name: name.to_string(),
            keywords: vec!["sustainable".to_string(), "fashion".to_string()],
            timeframe: "today 12-m".to_string(),
            geography: "US".to_string(),
            source: AnalysisSource::PrimaryProvider,
        }
    }

    /// A draft idea with sensible defaults.
    pub fn idea_draft(title: &str) -> IdeaDraft {
        IdeaDraft {
            title: title.to_string(),
            content_type: "blog_post".to_string(),
            idea_type: "educational".to_string(),
            primary_keyword: "sustainable fashion".to_string(),
            secondary_keywords: vec!["thrifting".to_string()],
            scoring: None,
        }
    }

    /// Create a topic and decompose it, returning both.
    ///
    /// The decomposition always contains the "eco-friendly materials" and
    /// "thrifting" facets, which analysis tests target by name.
    pub async fn decomposed_topic(svc: &TrellisService) -> (ResearchTopic, TopicDecomposition) {
        let topic = svc
            .create_topic(OWNER, "Sustainable Fashion", Some("Slow fashion research"))
            .await
            .unwrap();
        let dcp = svc
            .decompose(
                &topic.id,
                OWNER,
                "sustainable fashion trends",
                vec![
                    subtopic("eco-friendly materials", 0.9),
                    subtopic("thrifting", 0.8),
                    subtopic("capsule wardrobes", 0.7),
                ],
            )
            .await
            .unwrap();
        (topic, dcp)
    }

    /// Create a topic, decompose it, and drive one analysis to completed.
    pub async fn completed_analysis(svc: &TrellisService) -> (ResearchTopic, TrendAnalysis) {
        let (topic, dcp) = decomposed_topic(svc).await;
        let analysis = svc
            .start_analysis(&dcp.id, OWNER, "thrifting", test_params("thrifting trends"))
            .await
            .unwrap();
        let analysis = svc
            .complete_analysis(
                &analysis.id,
                OWNER,
                serde_json::json!({"interest_over_time": [42, 58, 71]}),
            )
            .await
            .unwrap();
        (topic, analysis)
    }
}
