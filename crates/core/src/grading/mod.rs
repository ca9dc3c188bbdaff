//! Automated quality grading of content versions.
//!
//! A grading combines five criteria into a weighted composite score, a
//! per-criterion breakdown, a confidence value, and fixed feedback for every
//! criterion below the feedback threshold.
//!
//! Accuracy may read the version's predecessor and dialect consistency reads
//! up to `sibling_limit` versions sharing the dialect tag. Both lookups are
//! plain reads outside any write transaction. A storage failure in either,
//! or a predecessor id that no longer resolves, fails the whole grading.

pub mod config;
pub mod criteria;
pub mod feedback;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::content_version::{
    ContentVersion, ValidationStatus, FIELD_ORIGINAL, FIELD_TRANSLATED,
};
use crate::error::CoreError;
use crate::lexical::LexicalEquivalence;
use crate::store::VersionStore;

pub use config::{CriterionWeights, FieldTarget, GradingConfig};
pub use feedback::{Criterion, ALL_CRITERIA};

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Score of each criterion, each in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionScores {
    pub completeness: f64,
    pub accuracy: f64,
    pub cultural_relevance: f64,
    pub dialect_consistency: f64,
    pub context_quality: f64,
}

impl CriterionScores {
    /// Scores in [`ALL_CRITERIA`] order.
    pub fn as_array(&self) -> [f64; 5] {
        [
            self.completeness,
            self.accuracy,
            self.cultural_relevance,
            self.dialect_consistency,
            self.context_quality,
        ]
    }

    pub fn get(&self, criterion: Criterion) -> f64 {
        match criterion {
            Criterion::Completeness => self.completeness,
            Criterion::Accuracy => self.accuracy,
            Criterion::CulturalRelevance => self.cultural_relevance,
            Criterion::DialectConsistency => self.dialect_consistency,
            Criterion::ContextQuality => self.context_quality,
        }
    }
}

/// Outcome of grading one version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingResult {
    pub score: f64,
    pub breakdown: CriterionScores,
    pub feedback: Vec<String>,
    pub suggestions: Vec<String>,
    pub confidence: f64,
}

impl GradingResult {
    /// Assemble the result from raw criterion scores.
    pub fn from_scores(breakdown: CriterionScores, config: &GradingConfig) -> Self {
        let scores = breakdown.as_array();
        let score = scores
            .iter()
            .zip(config.weights.as_array())
            .map(|(s, w)| s * w)
            .sum::<f64>()
            .clamp(0.0, 1.0);

        let mut feedback = Vec::new();
        let mut suggestions = Vec::new();
        for criterion in ALL_CRITERIA {
            if breakdown.get(criterion) < config.feedback_threshold {
                feedback.push(criterion.feedback().to_string());
                suggestions.push(criterion.suggestion().to_string());
            }
        }

        Self {
            score,
            breakdown,
            feedback,
            suggestions,
            confidence: criteria::confidence(&scores),
        }
    }

    /// Validation record for this result. `is_validated` is set when the
    /// composite score reaches `pass_score`.
    pub fn to_validation_status(
        &self,
        pass_score: f64,
        community_approval: bool,
    ) -> ValidationStatus {
        ValidationStatus {
            score: self.score,
            cultural_accuracy: self.breakdown.cultural_relevance,
            linguistic_quality: self.breakdown.accuracy,
            dialect_consistency: self.breakdown.dialect_consistency,
            community_approval,
            is_validated: self.score >= pass_score,
            feedback: self.feedback.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Grades content versions against a [`GradingConfig`].
pub struct GradingEngine {
    store: Arc<dyn VersionStore>,
    lexicon: Arc<dyn LexicalEquivalence>,
    config: GradingConfig,
}

impl std::fmt::Debug for GradingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GradingEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl GradingEngine {
    /// Build an engine. Fails if `config` does not validate.
    pub fn new(
        store: Arc<dyn VersionStore>,
        lexicon: Arc<dyn LexicalEquivalence>,
        config: GradingConfig,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        Ok(Self {
            store,
            lexicon,
            config,
        })
    }

    pub fn config(&self) -> &GradingConfig {
        &self.config
    }

    /// Grade `version`.
    pub async fn grade(&self, version: &ContentVersion) -> Result<GradingResult, CoreError> {
        let (accuracy, dialect_consistency) =
            tokio::try_join!(self.accuracy(version), self.dialect_consistency(version))?;

        let breakdown = CriterionScores {
            completeness: criteria::completeness(version, &self.config.completeness_fields),
            accuracy,
            cultural_relevance: criteria::cultural_relevance(version, &self.config),
            dialect_consistency,
            context_quality: criteria::context_quality(version, &self.config),
        };
        tracing::debug!(
            version_id = %version.id,
            completeness = breakdown.completeness,
            accuracy = breakdown.accuracy,
            cultural_relevance = breakdown.cultural_relevance,
            dialect_consistency = breakdown.dialect_consistency,
            context_quality = breakdown.context_quality,
            "Computed criterion scores"
        );

        let result = GradingResult::from_scores(breakdown, &self.config);
        tracing::info!(
            version_id = %version.id,
            score = result.score,
            confidence = result.confidence,
            "Graded content version"
        );
        Ok(result)
    }

    /// Token agreement, marker check, and predecessor similarity.
    async fn accuracy(&self, version: &ContentVersion) -> Result<f64, CoreError> {
        let original = version.content_text(FIELD_ORIGINAL);
        let translated = version.content_text(FIELD_TRANSLATED);

        let token_ratio =
            criteria::token_match_ratio(&original, &translated, self.lexicon.as_ref());
        let pattern =
            criteria::linguistic_pattern_score(&original, &self.config.linguistic_markers);

        let predecessor = match version.metadata.previous_version_id {
            Some(previous_id) => {
                let previous = self.store.find_by_id(previous_id).await?.ok_or_else(|| {
                    tracing::warn!(
                        version_id = %version.id,
                        previous_version_id = %previous_id,
                        "Predecessor version not found"
                    );
                    CoreError::version_not_found(previous_id)
                })?;
                Some(criteria::predecessor_similarity(version, &previous))
            }
            None => None,
        };

        Ok(criteria::accuracy(token_ratio, pattern, predecessor))
    }

    /// Sibling agreement plus description coherence. No dialect tag means
    /// zero and no storage query.
    async fn dialect_consistency(&self, version: &ContentVersion) -> Result<f64, CoreError> {
        let Some(dialect) = version.dialect() else {
            return Ok(0.0);
        };

        let siblings = self
            .store
            .find_by_dialect(&dialect, version.id, self.config.sibling_limit)
            .await?;
        let sibling_dialects: Vec<String> = siblings.iter().filter_map(|s| s.dialect()).collect();

        let coherence = criteria::dialect_coherence(&dialect, &self.config);
        Ok(criteria::dialect_consistency(
            &dialect,
            &sibling_dialects,
            coherence,
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
