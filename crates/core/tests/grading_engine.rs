//! Engine-level tests for grading against the in-memory store.

use std::sync::Arc;

use assert_matches::assert_matches;
use glossa_core::grading::criteria;
use glossa_core::lexical::{CaseInsensitiveMatch, SynonymTable};
use glossa_core::{
    ChangeType, ContentVersion, CoreError, GradingConfig, GradingEngine, InMemoryVersionStore,
    VersionMetadata, VersionNumber, VersionStore, VersioningEngine,
};
use serde_json::{json, Value};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn grader(store: &InMemoryVersionStore) -> GradingEngine {
    GradingEngine::new(
        Arc::new(store.clone()),
        Arc::new(CaseInsensitiveMatch),
        GradingConfig::default(),
    )
    .unwrap()
}

fn version(content_data: Value) -> ContentVersion {
    ContentVersion::draft(
        Uuid::now_v7(),
        content_data,
        VersionNumber::INITIAL,
        ChangeType::Creation,
        VersionMetadata::authored_by("ana"),
        Vec::new(),
    )
}

fn rich_content() -> Value {
    json!({
        "original": "Ojú, qué caló hace hoy en la plaza del pueblo, illo",
        "translated": "Wow, how hot it is today in the town square, mate",
        "culturalContext": "Expresión típica andaluza usada en conversación informal entre \
            vecinos del pueblo durante el verano; refleja la tradición oral de la región.",
        "pronunciation": "/oˈxu ke kaˈlo/",
        "dialectVariation": "Andaluz occidental"
    })
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

#[test]
fn invalid_config_is_rejected() {
    let mut config = GradingConfig::default();
    config.weights.accuracy = 0.9;
    let result = GradingEngine::new(
        Arc::new(InMemoryVersionStore::new()),
        Arc::new(CaseInsensitiveMatch),
        config,
    );
    assert_matches!(result, Err(CoreError::Validation(_)));
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

#[tokio::test]
async fn every_score_is_bounded() {
    let store = InMemoryVersionStore::new();
    let engine = grader(&store);

    for content in [json!({}), json!({"original": ""}), rich_content()] {
        let result = engine.grade(&version(content)).await.unwrap();
        assert!((0.0..=1.0).contains(&result.score));
        assert!((0.0..=1.0).contains(&result.confidence));
        for score in result.breakdown.as_array() {
            assert!((0.0..=1.0).contains(&score));
        }
        assert_eq!(result.feedback.len(), result.suggestions.len());
    }
}

#[tokio::test]
async fn sparse_content_collects_feedback() {
    let store = InMemoryVersionStore::new();
    let result = grader(&store)
        .grade(&version(json!({"original": "Texto original de prueba"})))
        .await
        .unwrap();

    assert!(result.breakdown.completeness > 0.0);
    assert!(result.breakdown.completeness < 0.7);
    assert!(!result.feedback.is_empty());
    assert!(result.score < rich_score().await);
}

async fn rich_score() -> f64 {
    let store = InMemoryVersionStore::new();
    grader(&store)
        .grade(&version(rich_content()))
        .await
        .unwrap()
        .score
}

#[tokio::test]
async fn grading_is_deterministic() {
    let store = InMemoryVersionStore::new();
    let engine = grader(&store);
    let v = version(rich_content());
    let first = engine.grade(&v).await.unwrap();
    let second = engine.grade(&v).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn synonyms_raise_accuracy() {
    let store = InMemoryVersionStore::new();
    let v = version(json!({"original": "casa grande", "translated": "hogar grande"}));

    let plain = grader(&store).grade(&v).await.unwrap();
    let with_synonyms = GradingEngine::new(
        Arc::new(store.clone()),
        Arc::new(SynonymTable::new().with_group(["casa", "hogar"])),
        GradingConfig::default(),
    )
    .unwrap()
    .grade(&v)
    .await
    .unwrap();

    assert!(with_synonyms.breakdown.accuracy > plain.breakdown.accuracy);
}

// ---------------------------------------------------------------------------
// Dialect consistency
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_dialect_scores_zero_without_querying() {
    let store = InMemoryVersionStore::new();
    store.insert(version(json!({"dialectVariation": "Andaluz"})));

    let result = grader(&store)
        .grade(&version(json!({"original": "Hola", "dialectVariation": "   "})))
        .await
        .unwrap();

    assert_eq!(result.breakdown.dialect_consistency, 0.0);
    assert_eq!(store.dialect_query_count(), 0);
}

#[tokio::test]
async fn sibling_agreement_raises_dialect_consistency() {
    let store = InMemoryVersionStore::new();
    let target = version(json!({"dialectVariation": "Andaluz"}));

    let alone = grader(&store).grade(&target).await.unwrap();

    store.insert(version(json!({"dialectVariation": "Andaluz"})));
    store.insert(version(json!({"dialectVariation": "andaluz"})));
    let with_siblings = grader(&store).grade(&target).await.unwrap();

    let coherence = criteria::dialect_coherence("Andaluz", &GradingConfig::default());
    assert!((alone.breakdown.dialect_consistency - 0.4 * coherence).abs() < 1e-9);
    // One exact match out of two case-insensitive siblings.
    assert!(
        (with_siblings.breakdown.dialect_consistency - (0.3 + 0.4 * coherence)).abs() < 1e-9
    );
    assert_eq!(store.dialect_query_count(), 2);
}

#[tokio::test]
async fn sibling_lookup_is_limited() {
    let store = InMemoryVersionStore::new();
    for _ in 0..8 {
        store.insert(version(json!({"dialectVariation": "Porteño"})));
    }
    let limit = GradingConfig::default().sibling_limit;
    let found = store
        .find_by_dialect("Porteño", Uuid::now_v7(), limit)
        .await
        .unwrap();
    assert_eq!(found.len(), 5);
}

// ---------------------------------------------------------------------------
// Predecessor lookups
// ---------------------------------------------------------------------------

#[tokio::test]
async fn predecessor_similarity_contributes() {
    let store = InMemoryVersionStore::new();
    let versioning = VersioningEngine::new(Arc::new(store.clone()));
    let content_id = Uuid::now_v7();
    let content = json!({"original": "Hola amigo", "translated": "Hello friend"});

    let first = versioning
        .create_version(content_id, content.clone(), "ana", None)
        .await
        .unwrap();
    let second = versioning
        .create_version(content_id, content.clone(), "ana", Some(ChangeType::Modification))
        .await
        .unwrap();
    assert_eq!(second.metadata.previous_version_id, Some(first.id));

    let engine = grader(&store);
    let with_predecessor = engine.grade(&second).await.unwrap();
    let without_predecessor = engine.grade(&version(content)).await.unwrap();

    assert!(with_predecessor.breakdown.accuracy > without_predecessor.breakdown.accuracy);
}

#[tokio::test]
async fn dangling_predecessor_fails_the_grading() {
    let store = InMemoryVersionStore::new();
    let versioning = VersioningEngine::new(Arc::new(store.clone()));
    let content_id = Uuid::now_v7();
    let content = json!({"original": "Hola amigo", "translated": "Hello friend"});

    let first = versioning
        .create_version(content_id, content.clone(), "ana", None)
        .await
        .unwrap();
    let second = versioning
        .create_version(content_id, content, "ana", Some(ChangeType::Modification))
        .await
        .unwrap();
    versioning.remove_version(first.id).await.unwrap();

    let err = grader(&store).grade(&second).await.unwrap_err();
    assert_matches!(err, CoreError::NotFound { .. });

    let mut unknown = version(json!({"original": "Hola"}));
    unknown.metadata.previous_version_id = Some(Uuid::now_v7());
    let err = grader(&InMemoryVersionStore::new())
        .grade(&unknown)
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::NotFound { .. });
}

#[tokio::test]
async fn storage_failure_fails_the_grading() {
    let store = InMemoryVersionStore::new();
    let predecessor = version(json!({"original": "Hola"}));
    store.insert(predecessor.clone());
    let mut v = version(json!({"original": "Hola", "dialectVariation": "Andaluz"}));
    v.metadata.previous_version_id = Some(predecessor.id);

    store.set_fail_reads(true);
    let err = grader(&store).grade(&v).await.unwrap_err();
    assert_matches!(err, CoreError::Storage(_));

    store.set_fail_reads(false);
    assert!(grader(&store).grade(&v).await.is_ok());
}
