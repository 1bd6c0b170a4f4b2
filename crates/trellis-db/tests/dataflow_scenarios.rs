//! End-to-end dataflow scenarios against an in-memory store:
//! - The full topic → decomposition → analysis → ideas pipeline
//! - Optimistic-concurrency conflicts on stale topic versions
//! - Hard-delete cascade with published-idea detachment
//! - Snapshot reconstruction with no orphaned children

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use trellis_core::entities::Subtopic;
use trellis_core::enums::{AnalysisSource, AnalysisStatus, IdeaStatus, WorkflowStage};
use trellis_core::reports::{AnalysisOutcome, AnalysisParams, IdeaDraft};
use trellis_db::error::StoreError;
use trellis_db::service::TrellisService;
use trellis_db::updates::idea::IdeaPatchBuilder;
use trellis_db::updates::topic::TopicPatchBuilder;

const OWNER: &str = "own-e2e";

async fn test_service() -> TrellisService {
    TrellisService::new_local(":memory:").await.unwrap()
}

fn subtopic(name: &str, relevance: f64) -> Subtopic {
    Subtopic {
        name: name.to_string(),
        description: format!("Research facet: {name}"),
        relevance,
    }
}

fn params(name: &str) -> AnalysisParams {
    AnalysisParams {
        name: name.to_string(),
        keywords: vec!["sustainable".to_string()],
        timeframe: "today 12-m".to_string(),
        geography: "US".to_string(),
        source: AnalysisSource::PrimaryProvider,
    }
}

fn draft(title: &str) -> IdeaDraft {
    IdeaDraft {
        title: title.to_string(),
        content_type: "blog_post".to_string(),
        idea_type: "educational".to_string(),
        primary_keyword: "sustainable fashion".to_string(),
        secondary_keywords: vec![],
        scoring: None,
    }
}

// ---------------------------------------------------------------------------
// Full pipeline
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sustainable_fashion_pipeline() {
    let svc = test_service().await;

    // Topic plus its first decomposition land atomically.
    let (topic, dcp) = svc
        .create_topic_with_decomposition(
            OWNER,
            "Sustainable Fashion",
            Some("Slow fashion research"),
            "sustainable fashion trends",
            vec![
                subtopic("eco-friendly materials", 0.9),
                subtopic("thrifting", 0.85),
                subtopic("capsule wardrobes", 0.7),
                subtopic("upcycling", 0.6),
            ],
        )
        .await
        .unwrap();

    assert_eq!(topic.version, 1);
    assert!(dcp.current);
    // Four facets plus the injected original query.
    assert_eq!(dcp.subtopics.len(), 5);
    assert_eq!(
        dcp.subtopics.last().unwrap().name,
        "sustainable fashion trends"
    );
    assert_eq!(
        svc.workflow_stage(&topic.id, OWNER).await.unwrap(),
        WorkflowStage::Decomposed
    );

    // Start an analysis; a second for the same facet is refused while it runs.
    let analysis = svc
        .start_analysis(&dcp.id, OWNER, "eco-friendly materials", params("materials"))
        .await
        .unwrap();
    assert_eq!(analysis.status, AnalysisStatus::InProgress);
    assert!(analysis.started_at.is_some());

    let dup = svc
        .start_analysis(&dcp.id, OWNER, "eco-friendly materials", params("materials"))
        .await;
    assert!(matches!(dup, Err(StoreError::Conflict(_))));

    // An unknown facet is a validation error, not a conflict.
    let unknown = svc
        .start_analysis(&dcp.id, OWNER, "not a facet", params("nope"))
        .await;
    assert!(matches!(unknown, Err(StoreError::Validation(_))));

    // Record the terminal outcome.
    let analysis = svc
        .record_analysis_result(
            &analysis.id,
            OWNER,
            AnalysisOutcome::Completed {
                result: serde_json::json!({"interest_over_time": [12, 34, 56]}),
            },
        )
        .await
        .unwrap();
    assert_eq!(analysis.status, AnalysisStatus::Completed);
    assert!(analysis.completed_at.is_some());
    assert!(analysis.processing_ms.is_some());

    // Fan ideas out; the empty title fails alone without discarding the rest.
    let report = svc
        .explode_into_ideas(
            &analysis.id,
            OWNER,
            vec![
                draft("Guide to recycled fabrics"),
                draft("   "),
                draft("Top 10 eco-friendly brands"),
            ],
        )
        .await
        .unwrap();
    assert_eq!(report.created.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert!(!report.all_created());
    assert_eq!(report.failed[0].input.title, "   ");

    // The snapshot shows exactly what was persisted.
    let graph = svc.get_complete(&topic.id, OWNER).await.unwrap();
    assert_eq!(graph.topic.id, topic.id);
    assert_eq!(graph.decomposition.unwrap().id, dcp.id);
    assert_eq!(graph.analyses.len(), 1);
    assert_eq!(graph.ideas.len(), 2);
    assert_eq!(
        svc.workflow_stage(&topic.id, OWNER).await.unwrap(),
        WorkflowStage::IdeasGenerated
    );
}

#[tokio::test]
async fn redecomposition_supersedes_but_keeps_history() {
    let svc = test_service().await;

    let (topic, first) = svc
        .create_topic_with_decomposition(
            OWNER,
            "Urban Gardening",
            None,
            "urban gardening",
            vec![subtopic("balcony gardens", 0.8)],
        )
        .await
        .unwrap();

    let second = svc
        .decompose(
            &topic.id,
            OWNER,
            "urban gardening",
            vec![subtopic("hydroponics", 0.9), subtopic("composting", 0.7)],
        )
        .await
        .unwrap();

    let current = svc.current_decomposition(&topic.id, OWNER).await.unwrap();
    assert_eq!(current.id, second.id);

    let history = svc.decomposition_history(&topic.id, OWNER).await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(history.iter().any(|d| d.id == first.id && !d.current));
}

// ---------------------------------------------------------------------------
// Durability
// ---------------------------------------------------------------------------

#[tokio::test]
async fn graph_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("trellis.db");
    let db_path = db_path.to_str().unwrap();

    let topic_id = {
        let svc = TrellisService::new_local(db_path).await.unwrap();
        let (topic, _) = svc
            .create_topic_with_decomposition(
                OWNER,
                "Durable Topic",
                None,
                "durable",
                vec![subtopic("facet", 0.5)],
            )
            .await
            .unwrap();
        topic.id
    };

    let svc = TrellisService::new_local(db_path).await.unwrap();
    let graph = svc.get_complete(&topic_id, OWNER).await.unwrap();
    assert_eq!(graph.topic.title, "Durable Topic");
    assert!(graph.decomposition.is_some());
}

// ---------------------------------------------------------------------------
// Optimistic concurrency
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stale_topic_update_conflicts() {
    let svc = test_service().await;
    let topic = svc.create_topic(OWNER, "Contended Topic", None).await.unwrap();

    // Two writers read the same version; the slower one must lose.
    let first = svc
        .update_topic(
            &topic.id,
            OWNER,
            topic.version,
            TopicPatchBuilder::new().title("Renamed by writer one").build(),
        )
        .await
        .unwrap();
    assert_eq!(first.version, topic.version + 1);

    let second = svc
        .update_topic(
            &topic.id,
            OWNER,
            topic.version,
            TopicPatchBuilder::new().title("Renamed by writer two").build(),
        )
        .await;
    match second {
        Err(StoreError::Conflict(msg)) => {
            assert!(msg.contains(&first.version.to_string()));
        }
        other => panic!("expected version conflict, got {other:?}"),
    }

    // Retrying with the fresh version succeeds.
    let retried = svc
        .update_topic(
            &topic.id,
            OWNER,
            first.version,
            TopicPatchBuilder::new().title("Renamed by writer two").build(),
        )
        .await
        .unwrap();
    assert_eq!(retried.title, "Renamed by writer two");
    assert_eq!(retried.version, first.version + 1);
}

// ---------------------------------------------------------------------------
// Tenant isolation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn foreign_rows_look_missing() {
    let svc = test_service().await;
    let topic = svc.create_topic(OWNER, "Private Topic", None).await.unwrap();

    let intruder = "own-other";
    assert!(matches!(
        svc.get_topic(&topic.id, intruder).await,
        Err(StoreError::NotFound)
    ));
    assert!(matches!(
        svc.update_topic(
            &topic.id,
            intruder,
            topic.version,
            TopicPatchBuilder::new().title("Hijacked").build(),
        )
        .await,
        Err(StoreError::NotFound)
    ));
    assert!(matches!(
        svc.hard_delete_topic(&topic.id, intruder).await,
        Err(StoreError::NotFound)
    ));

    // Same title in another tenant is not a uniqueness clash.
    svc.create_topic(intruder, "Private Topic", None).await.unwrap();

    let listed = svc.list_topics(OWNER, 10).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, topic.id);
}

// ---------------------------------------------------------------------------
// Deletion and detachment
// ---------------------------------------------------------------------------

#[tokio::test]
async fn hard_delete_cascades_but_detaches_published_ideas() {
    let svc = test_service().await;

    let (topic, dcp) = svc
        .create_topic_with_decomposition(
            OWNER,
            "Doomed Topic",
            None,
            "doomed",
            vec![subtopic("facet", 0.5)],
        )
        .await
        .unwrap();
    let analysis = svc
        .start_analysis(&dcp.id, OWNER, "facet", params("run"))
        .await
        .unwrap();
    svc.complete_analysis(&analysis.id, OWNER, serde_json::json!({}))
        .await
        .unwrap();

    let kept = svc.create_idea(&analysis.id, OWNER, draft("Published piece")).await.unwrap();
    let dropped = svc.create_idea(&analysis.id, OWNER, draft("Draft piece")).await.unwrap();
    svc.update_idea(
        &kept.id,
        OWNER,
        IdeaPatchBuilder::new().status(IdeaStatus::Published).build(),
    )
    .await
    .unwrap();

    svc.hard_delete_topic(&topic.id, OWNER).await.unwrap();

    // The whole graph under the topic is gone...
    assert!(matches!(
        svc.get_topic(&topic.id, OWNER).await,
        Err(StoreError::NotFound)
    ));
    assert!(matches!(
        svc.get_analysis(&analysis.id, OWNER).await,
        Err(StoreError::NotFound)
    ));
    assert!(matches!(
        svc.get_idea(&dropped.id, OWNER).await,
        Err(StoreError::NotFound)
    ));

    // ...except the published idea, which survives detached.
    let survivor = svc.get_idea(&kept.id, OWNER).await.unwrap();
    assert_eq!(survivor.status, IdeaStatus::Published);
    assert_eq!(survivor.trend_analysis_id, None);
    assert_eq!(survivor.research_topic_id, None);
}

#[tokio::test]
async fn snapshot_has_no_orphans_after_analysis_delete() {
    let svc = test_service().await;

    let (topic, dcp) = svc
        .create_topic_with_decomposition(
            OWNER,
            "Pruned Topic",
            None,
            "pruned",
            vec![subtopic("kept facet", 0.9), subtopic("pruned facet", 0.4)],
        )
        .await
        .unwrap();

    for facet in ["kept facet", "pruned facet"] {
        let analysis = svc
            .start_analysis(&dcp.id, OWNER, facet, params(facet))
            .await
            .unwrap();
        svc.complete_analysis(&analysis.id, OWNER, serde_json::json!({}))
            .await
            .unwrap();
        svc.create_idea(&analysis.id, OWNER, draft(&format!("Idea for {facet}")))
            .await
            .unwrap();
    }

    let before = svc.get_complete(&topic.id, OWNER).await.unwrap();
    assert_eq!(before.analyses.len(), 2);
    assert_eq!(before.ideas.len(), 2);

    let pruned = before
        .analyses
        .iter()
        .find(|a| a.subtopic_name == "pruned facet")
        .unwrap();
    svc.delete_analysis(&pruned.id, OWNER).await.unwrap();

    let after = svc.get_complete(&topic.id, OWNER).await.unwrap();
    assert_eq!(after.analyses.len(), 1);
    // Every surviving idea still points at a surviving analysis.
    for idea in &after.ideas {
        let parent = idea.trend_analysis_id.as_deref();
        assert!(
            parent.is_none() || after.analyses.iter().any(|a| Some(a.id.as_str()) == parent),
            "idea {} references a deleted analysis",
            idea.id
        );
    }
}
