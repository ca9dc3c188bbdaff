//! Grading configuration: criterion weights, field targets, thresholds, and
//! the fixed vocabularies the heuristics scan for.
//!
//! [`GradingConfig::default`] carries the production values. Tests and
//! tuning inject their own copy into [`crate::grading::GradingEngine::new`].

use serde::{Deserialize, Serialize};

use crate::content_version::{
    FIELD_CULTURAL_CONTEXT, FIELD_DIALECT_VARIATION, FIELD_ORIGINAL, FIELD_PRONUNCIATION,
    FIELD_TRANSLATED,
};
use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Criteria scoring below this emit feedback and a suggestion.
pub const DEFAULT_FEEDBACK_THRESHOLD: f64 = 0.7;

/// Minimum composite score for a graded version to count as validated.
pub const DEFAULT_VALIDATION_PASS_SCORE: f64 = 0.7;

/// Maximum number of dialect siblings consulted per grading.
pub const DEFAULT_SIBLING_LIMIT: usize = 5;

/// Tolerance when checking that criterion weights sum to 1.0.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

const DEFAULT_CULTURAL_TERMS: &[&str] = &[
    "tradición",
    "tradicional",
    "tradition",
    "costumbre",
    "custom",
    "fiesta",
    "festival",
    "celebración",
    "celebration",
    "familia",
    "family",
    "comunidad",
    "community",
    "historia",
    "history",
    "religión",
    "religion",
    "comida",
    "food",
    "música",
    "music",
    "cultura",
    "culture",
    "ritual",
    "indígena",
    "indigenous",
    "respeto",
    "respect",
];

const DEFAULT_DIALECT_TERMS: &[&str] = &[
    "dialecto",
    "dialect",
    "región",
    "regional",
    "region",
    "acento",
    "accent",
    "variante",
    "variant",
    "voseo",
    "seseo",
    "ceceo",
    "yeísmo",
    "informal",
    "formal",
    "local",
    "rural",
    "urbano",
    "urban",
];

/// Marker substrings of the source language the pattern check looks for.
const DEFAULT_LINGUISTIC_MARKERS: &[&str] = &["¿", "¡", "ñ", "á", "é", "í", "ó", "ú", "ü"];

/// Characters that indicate a phonetic transcription in a pronunciation guide.
const DEFAULT_PHONETIC_MARKERS: &[char] = &['/', '[', 'ˈ', 'ˌ', 'ː', '-'];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Weight of each criterion in the composite score. Must sum to 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionWeights {
    pub completeness: f64,
    pub accuracy: f64,
    pub cultural_relevance: f64,
    pub dialect_consistency: f64,
    pub context_quality: f64,
}

impl Default for CriterionWeights {
    fn default() -> Self {
        Self {
            completeness: 0.20,
            accuracy: 0.25,
            cultural_relevance: 0.25,
            dialect_consistency: 0.20,
            context_quality: 0.10,
        }
    }
}

impl CriterionWeights {
    pub fn as_array(&self) -> [f64; 5] {
        [
            self.completeness,
            self.accuracy,
            self.cultural_relevance,
            self.dialect_consistency,
            self.context_quality,
        ]
    }
}

/// Completeness target for one content field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldTarget {
    pub field: String,
    pub weight: f64,
    /// Length (in characters) at which the field earns full credit.
    pub optimal_len: usize,
}

impl FieldTarget {
    pub fn new(field: &str, weight: f64, optimal_len: usize) -> Self {
        Self {
            field: field.to_string(),
            weight,
            optimal_len,
        }
    }
}

/// Everything the grading heuristics are parameterised by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GradingConfig {
    pub weights: CriterionWeights,
    pub completeness_fields: Vec<FieldTarget>,
    pub feedback_threshold: f64,
    pub validation_pass_score: f64,
    pub sibling_limit: usize,
    pub cultural_terms: Vec<String>,
    pub dialect_terms: Vec<String>,
    pub linguistic_markers: Vec<String>,
    pub phonetic_markers: Vec<char>,
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            weights: CriterionWeights::default(),
            completeness_fields: vec![
                FieldTarget::new(FIELD_ORIGINAL, 0.30, 100),
                FieldTarget::new(FIELD_TRANSLATED, 0.25, 100),
                FieldTarget::new(FIELD_CULTURAL_CONTEXT, 0.20, 150),
                FieldTarget::new(FIELD_PRONUNCIATION, 0.15, 30),
                FieldTarget::new(FIELD_DIALECT_VARIATION, 0.10, 50),
            ],
            feedback_threshold: DEFAULT_FEEDBACK_THRESHOLD,
            validation_pass_score: DEFAULT_VALIDATION_PASS_SCORE,
            sibling_limit: DEFAULT_SIBLING_LIMIT,
            cultural_terms: to_strings(DEFAULT_CULTURAL_TERMS),
            dialect_terms: to_strings(DEFAULT_DIALECT_TERMS),
            linguistic_markers: to_strings(DEFAULT_LINGUISTIC_MARKERS),
            phonetic_markers: DEFAULT_PHONETIC_MARKERS.to_vec(),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl GradingConfig {
    /// Check that weights and thresholds are usable.
    ///
    /// - every weight and threshold lies in `[0.0, 1.0]`
    /// - criterion weights sum to 1.0
    /// - completeness field weights sum to at most 1.0
    /// - optimal lengths are positive
    pub fn validate(&self) -> Result<(), CoreError> {
        let criterion = self.weights.as_array();
        for w in criterion {
            check_unit("criterion weight", w)?;
        }
        let sum: f64 = criterion.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(CoreError::Validation(format!(
                "Criterion weights must sum to 1.0, got {sum}"
            )));
        }

        let mut field_sum = 0.0;
        for target in &self.completeness_fields {
            check_unit("completeness field weight", target.weight)?;
            if target.optimal_len == 0 {
                return Err(CoreError::Validation(format!(
                    "Optimal length for '{}' must be positive",
                    target.field
                )));
            }
            field_sum += target.weight;
        }
        if field_sum > 1.0 + WEIGHT_SUM_TOLERANCE {
            return Err(CoreError::Validation(format!(
                "Completeness field weights must not exceed 1.0, got {field_sum}"
            )));
        }

        check_unit("feedback_threshold", self.feedback_threshold)?;
        check_unit("validation_pass_score", self.validation_pass_score)?;
        Ok(())
    }
}

fn check_unit(name: &str, value: f64) -> Result<(), CoreError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "{name} must be between 0.0 and 1.0, got {value}"
        )))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
