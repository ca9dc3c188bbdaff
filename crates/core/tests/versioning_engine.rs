//! Engine-level tests for version lineage operations.
//!
//! Exercises `VersioningEngine` against the in-memory store:
//! - version arithmetic through create/branch/merge/revert
//! - history ordering
//! - all-or-nothing behaviour when a step fails
//! - publish gate on `is_validated`

use std::sync::Arc;

use assert_matches::assert_matches;
use glossa_core::grading::{CriterionScores, GradingConfig, GradingResult};
use glossa_core::{
    ChangeType, ContentVersion, CoreError, DiffStatus, InMemoryVersionStore, VersionMetadata,
    VersionNumber, VersionStatus, VersioningEngine,
};
use serde_json::json;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn setup() -> (InMemoryVersionStore, VersioningEngine) {
    let store = InMemoryVersionStore::new();
    let engine = VersioningEngine::new(Arc::new(store.clone()));
    (store, engine)
}

fn number(v: &ContentVersion) -> VersionNumber {
    v.version_number()
}

fn passing_result() -> GradingResult {
    GradingResult::from_scores(
        CriterionScores {
            completeness: 0.9,
            accuracy: 0.9,
            cultural_relevance: 0.9,
            dialect_consistency: 0.9,
            context_quality: 0.9,
        },
        &GradingConfig::default(),
    )
}

async fn seed(engine: &VersioningEngine, content_id: Uuid) -> ContentVersion {
    engine
        .create_version(
            content_id,
            json!({"original": "Hola", "translated": "Hello"}),
            "ana",
            None,
        )
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// create
// ---------------------------------------------------------------------------

#[tokio::test]
async fn first_version_is_draft_one_zero_zero() {
    let (_store, engine) = setup();
    let v = seed(&engine, Uuid::now_v7()).await;

    assert_eq!(number(&v), VersionNumber::new(1, 0, 0));
    assert_eq!(v.status, VersionStatus::Draft);
    assert_eq!(v.change_type, ChangeType::Creation);
    assert!(v.metadata.comments.is_empty());
    assert_eq!(v.metadata.author, "ana");
    assert!(v.metadata.previous_version_id.is_none());
    assert!(!v.validation_status.is_validated);
    assert!(v.parent_ids.is_empty());
}

#[tokio::test]
async fn history_is_newest_first() {
    let (_store, engine) = setup();
    let content_id = Uuid::now_v7();
    let v1 = seed(&engine, content_id).await;
    let v2 = engine
        .create_version(
            content_id,
            json!({"original": "Hola!"}),
            "ana",
            Some(ChangeType::Modification),
        )
        .await
        .unwrap();
    let v3 = engine
        .create_version(
            content_id,
            json!({"original": "¡Hola!"}),
            "ana",
            Some(ChangeType::Modification),
        )
        .await
        .unwrap();

    assert_eq!(number(&v2), VersionNumber::new(1, 1, 0));
    assert_eq!(number(&v3), VersionNumber::new(1, 2, 0));
    assert_eq!(v3.metadata.previous_version_id, Some(v2.id));
    assert_eq!(v3.parent_ids, vec![v2.id]);

    let history = engine.get_history(content_id).await.unwrap();
    let ids: Vec<Uuid> = history.iter().map(|v| v.id).collect();
    assert_eq!(ids, vec![v3.id, v2.id, v1.id]);
}

#[tokio::test]
async fn creation_on_existing_lineage_bumps_patch() {
    let (_store, engine) = setup();
    let content_id = Uuid::now_v7();
    seed(&engine, content_id).await;
    let v = seed(&engine, content_id).await;
    assert_eq!(number(&v), VersionNumber::new(1, 0, 1));
}

#[tokio::test]
async fn deletion_bumps_major() {
    let (_store, engine) = setup();
    let content_id = Uuid::now_v7();
    seed(&engine, content_id).await;
    let v = engine
        .create_version(content_id, json!({}), "ana", Some(ChangeType::Deletion))
        .await
        .unwrap();
    assert_eq!(number(&v), VersionNumber::new(2, 0, 0));
}

#[tokio::test]
async fn malformed_payload_is_rejected_before_storage() {
    let (store, engine) = setup();
    let err = engine
        .create_version(Uuid::now_v7(), json!("plain text"), "ana", None)
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Validation(_));
    assert!(store.is_empty());
}

#[tokio::test]
async fn concurrent_creates_get_distinct_numbers() {
    let (store, engine) = setup();
    let engine = Arc::new(engine);
    let content_id = Uuid::now_v7();
    seed(&engine, content_id).await;

    let mut handles = Vec::new();
    for i in 0..8 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            engine
                .create_version(
                    content_id,
                    json!({ "original": format!("edit {i}") }),
                    "ana",
                    Some(ChangeType::Modification),
                )
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let mut numbers: Vec<VersionNumber> = store.all().iter().map(number).collect();
    numbers.sort();
    numbers.dedup();
    assert_eq!(numbers.len(), 9);
    assert_eq!(numbers.last(), Some(&VersionNumber::new(1, 8, 0)));
}

// ---------------------------------------------------------------------------
// branch
// ---------------------------------------------------------------------------

#[tokio::test]
async fn branch_copies_content_and_records_provenance() {
    let (_store, engine) = setup();
    let base = seed(&engine, Uuid::now_v7()).await;

    let branch = engine.branch_version(base.id, "luis").await.unwrap();
    assert_eq!(number(&branch), VersionNumber::new(1, 0, 1));
    assert_eq!(branch.content_id, base.content_id);
    assert_eq!(branch.content_data, base.content_data);
    assert_eq!(branch.change_type, ChangeType::Creation);
    assert_eq!(branch.status, VersionStatus::Draft);
    assert_eq!(branch.metadata.author, "luis");
    assert_eq!(branch.parent_ids, vec![base.id]);
    assert_eq!(branch.metadata.comments.len(), 1);
    assert!(branch.metadata.comments[0].starts_with("Branched from version 1.0.0"));
}

#[tokio::test]
async fn branch_of_older_version_skips_taken_numbers() {
    let (_store, engine) = setup();
    let content_id = Uuid::now_v7();
    let base = seed(&engine, content_id).await;
    engine.branch_version(base.id, "luis").await.unwrap();

    let second = engine.branch_version(base.id, "luis").await.unwrap();
    assert_eq!(number(&second), VersionNumber::new(1, 0, 2));
}

#[tokio::test]
async fn branch_with_exhausted_patch_numbers_is_rejected() {
    let (store, engine) = setup();
    let base = ContentVersion::draft(
        Uuid::now_v7(),
        json!({"original": "Hola"}),
        VersionNumber::new(1, 0, u32::MAX),
        ChangeType::Creation,
        VersionMetadata::authored_by("ana"),
        Vec::new(),
    );
    store.insert(base.clone());

    let err = engine.branch_version(base.id, "luis").await.unwrap_err();
    assert_matches!(err, CoreError::InvalidState(_));
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn branch_of_missing_version_is_not_found() {
    let (store, engine) = setup();
    let err = engine.branch_version(Uuid::now_v7(), "luis").await.unwrap_err();
    assert_matches!(err, CoreError::NotFound { .. });
    assert!(store.is_empty());
}

// ---------------------------------------------------------------------------
// merge
// ---------------------------------------------------------------------------

#[tokio::test]
async fn merge_favours_source_and_concatenates_cultural_context() {
    let (store, engine) = setup();
    let content_id = Uuid::now_v7();
    let target = engine
        .create_version(
            content_id,
            json!({
                "original": "Che",
                "translated": "Hey",
                "culturalContext": ["rioplatense", "informal"]
            }),
            "ana",
            None,
        )
        .await
        .unwrap();
    let source = engine
        .create_version(
            Uuid::now_v7(),
            json!({"original": "Che, boludo", "culturalContext": ["informal", "amistoso"]}),
            "luis",
            None,
        )
        .await
        .unwrap();
    let stored_source = engine.get_version(source.id).await.unwrap();
    let stored_target = engine.get_version(target.id).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    let merged = engine
        .merge_versions(source.id, target.id, Some("eva"))
        .await
        .unwrap();

    assert_eq!(merged.content_id, content_id);
    assert_eq!(merged.change_type, ChangeType::Merge);
    assert_eq!(number(&merged), VersionNumber::new(1, 1, 0));
    assert_eq!(
        merged.content_data,
        json!({
            "original": "Che, boludo",
            "translated": "Hey",
            "culturalContext": ["rioplatense", "informal", "amistoso"]
        })
    );
    assert_eq!(merged.parent_ids, vec![target.id, source.id]);
    assert!(!merged.validation_status.is_validated);
    assert!(merged.metadata.comments.last().unwrap().starts_with("Merged version 1.0.0"));
    assert_eq!(merged.metadata.author, "eva");

    // Inputs are untouched, timestamps included.
    assert_eq!(store.len(), 3);
    assert_eq!(engine.get_version(source.id).await.unwrap(), stored_source);
    assert_eq!(engine.get_version(target.id).await.unwrap(), stored_target);
}

#[tokio::test]
async fn merge_defaults_to_system_author() {
    let (_store, engine) = setup();
    let target = seed(&engine, Uuid::now_v7()).await;
    let source = seed(&engine, Uuid::now_v7()).await;
    let merged = engine.merge_versions(source.id, target.id, None).await.unwrap();
    assert_eq!(merged.metadata.author, "system");
}

#[tokio::test]
async fn merge_with_missing_side_leaves_store_unchanged() {
    let (store, engine) = setup();
    let existing = seed(&engine, Uuid::now_v7()).await;
    let before = store.all();

    let err = engine
        .merge_versions(Uuid::now_v7(), existing.id, None)
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::NotFound { .. });

    let err = engine
        .merge_versions(existing.id, Uuid::now_v7(), None)
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::NotFound { .. });

    assert_eq!(store.all(), before);
}

#[tokio::test]
async fn merge_failure_midway_rolls_back() {
    let (store, engine) = setup();
    let target = seed(&engine, Uuid::now_v7()).await;
    let source = seed(&engine, Uuid::now_v7()).await;
    let before = store.all();

    // First save (merged version) succeeds, re-saving the source fails.
    store.fail_on_save(2);
    let err = engine
        .merge_versions(source.id, target.id, None)
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Storage(_));
    assert_eq!(store.all(), before);
}

#[tokio::test]
async fn merge_into_itself_is_rejected() {
    let (_store, engine) = setup();
    let v = seed(&engine, Uuid::now_v7()).await;
    let err = engine.merge_versions(v.id, v.id, None).await.unwrap_err();
    assert_matches!(err, CoreError::InvalidState(_));
}

// ---------------------------------------------------------------------------
// revert
// ---------------------------------------------------------------------------

#[tokio::test]
async fn revert_restores_old_content_as_minor_bump() {
    let (_store, engine) = setup();
    let content_id = Uuid::now_v7();
    let v1 = seed(&engine, content_id).await;
    let v2 = engine
        .create_version(
            content_id,
            json!({"original": "Adiós"}),
            "ana",
            Some(ChangeType::Modification),
        )
        .await
        .unwrap();

    let reverted = engine.revert_version(v1.id, "luis").await.unwrap();
    assert_eq!(reverted.change_type, ChangeType::Revert);
    assert_eq!(number(&reverted), VersionNumber::new(1, 2, 0));
    assert_eq!(reverted.content_data, v1.content_data);
    assert_eq!(reverted.parent_ids, vec![v2.id, v1.id]);
    assert!(reverted.metadata.comments[0].starts_with("Reverted to version 1.0.0"));
}

// ---------------------------------------------------------------------------
// publish / grading
// ---------------------------------------------------------------------------

#[tokio::test]
async fn publish_requires_validation_and_writes_nothing() {
    let (store, engine) = setup();
    let v = seed(&engine, Uuid::now_v7()).await;
    let before = store.all();

    let err = engine.publish_version(v.id, "eva").await.unwrap_err();
    assert_matches!(err, CoreError::InvalidState(_));
    assert_eq!(store.all(), before);
}

#[tokio::test]
async fn publish_of_missing_version_is_not_found() {
    let (_store, engine) = setup();
    let err = engine.publish_version(Uuid::now_v7(), "eva").await.unwrap_err();
    assert_matches!(err, CoreError::NotFound { .. });
}

#[tokio::test]
async fn graded_version_moves_to_review_then_publishes() {
    let (_store, engine) = setup();
    let v = seed(&engine, Uuid::now_v7()).await;

    let graded = engine
        .apply_grading(v.id, &passing_result(), GradingConfig::default().validation_pass_score)
        .await
        .unwrap();
    assert_eq!(graded.status, VersionStatus::Review);
    assert!(graded.validation_status.is_validated);
    assert!((graded.validation_status.score - 0.9).abs() < 1e-9);

    let published = engine.publish_version(v.id, "eva").await.unwrap();
    assert_eq!(published.status, VersionStatus::Published);
    assert!(published.metadata.published_at.is_some());
    assert_eq!(published.metadata.published_by.as_deref(), Some("eva"));

    let err = engine
        .apply_grading(v.id, &passing_result(), 0.7)
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::InvalidState(_));
}

#[tokio::test]
async fn low_grade_does_not_validate() {
    let (_store, engine) = setup();
    let v = seed(&engine, Uuid::now_v7()).await;
    let graded = engine
        .apply_grading(v.id, &passing_result(), 0.95)
        .await
        .unwrap();
    assert!(!graded.validation_status.is_validated);
    assert_matches!(
        engine.publish_version(v.id, "eva").await,
        Err(CoreError::InvalidState(_))
    );
}

#[tokio::test]
async fn community_approval_survives_grading() {
    let (_store, engine) = setup();
    let v = seed(&engine, Uuid::now_v7()).await;
    engine.set_community_approval(v.id, true).await.unwrap();
    let graded = engine.apply_grading(v.id, &passing_result(), 0.7).await.unwrap();
    assert!(graded.validation_status.community_approval);
}

// ---------------------------------------------------------------------------
// compare / remove / lineage
// ---------------------------------------------------------------------------

#[tokio::test]
async fn compare_reports_changes_between_versions() {
    let (_store, engine) = setup();
    let content_id = Uuid::now_v7();
    let v1 = seed(&engine, content_id).await;
    let v2 = engine
        .create_version(
            content_id,
            json!({"original": "Hola", "translated": "Hi"}),
            "ana",
            Some(ChangeType::Modification),
        )
        .await
        .unwrap();

    assert!(engine.compare_versions(v1.id, v1.id).await.unwrap().is_empty());

    let diffs = engine.compare_versions(v1.id, v2.id).await.unwrap();
    assert_eq!(diffs[0].field, "contentData.translated");
    assert_eq!(diffs[0].status, DiffStatus::Changed);
    assert_eq!(diffs[0].previous_value, Some(json!("Hello")));
    assert!(diffs.iter().any(|d| d.field == "metadata.previousVersionId"));
}

#[tokio::test]
async fn compare_with_missing_version_is_not_found() {
    let (_store, engine) = setup();
    let v = seed(&engine, Uuid::now_v7()).await;
    assert_matches!(
        engine.compare_versions(v.id, Uuid::now_v7()).await,
        Err(CoreError::NotFound { .. })
    );
}

#[tokio::test]
async fn remove_deletes_outright() {
    let (store, engine) = setup();
    let v = seed(&engine, Uuid::now_v7()).await;
    engine.remove_version(v.id).await.unwrap();
    assert!(store.is_empty());
    assert_matches!(
        engine.remove_version(v.id).await,
        Err(CoreError::NotFound { .. })
    );
}

#[tokio::test]
async fn lineage_parents_follow_merge_edges() {
    let (_store, engine) = setup();
    let target = seed(&engine, Uuid::now_v7()).await;
    let source = seed(&engine, Uuid::now_v7()).await;
    let merged = engine.merge_versions(source.id, target.id, None).await.unwrap();

    let parents = engine.lineage_parents(merged.id).await.unwrap();
    let ids: Vec<Uuid> = parents.iter().map(|v| v.id).collect();
    assert_eq!(ids, vec![target.id, source.id]);
}
