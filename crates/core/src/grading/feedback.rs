//! Grading criteria identifiers and their fixed feedback table.

use serde::{Deserialize, Serialize};

/// One of the five independent grading dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Criterion {
    Completeness,
    Accuracy,
    CulturalRelevance,
    DialectConsistency,
    ContextQuality,
}

/// All criteria in scoring order.
pub const ALL_CRITERIA: [Criterion; 5] = [
    Criterion::Completeness,
    Criterion::Accuracy,
    Criterion::CulturalRelevance,
    Criterion::DialectConsistency,
    Criterion::ContextQuality,
];

impl Criterion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completeness => "completeness",
            Self::Accuracy => "accuracy",
            Self::CulturalRelevance => "culturalRelevance",
            Self::DialectConsistency => "dialectConsistency",
            Self::ContextQuality => "contextQuality",
        }
    }

    /// Feedback shown when this criterion scores below the threshold.
    pub fn feedback(&self) -> &'static str {
        match self {
            Self::Completeness => "Content is missing key fields or they are too brief.",
            Self::Accuracy => "The translation does not closely track the original text.",
            Self::CulturalRelevance => "Cultural context is missing or lacks depth.",
            Self::DialectConsistency => {
                "Dialect information is missing or inconsistent with related content."
            }
            Self::ContextQuality => {
                "Pronunciation guidance, cross-references, or metadata are weak."
            }
        }
    }

    /// Suggested next step when this criterion scores below the threshold.
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::Completeness => {
                "Fill in the original, translation, cultural context, pronunciation, \
                 and dialect fields."
            }
            Self::Accuracy => "Review the translation word by word against the original.",
            Self::CulturalRelevance => "Describe where, when, and by whom the expression is used.",
            Self::DialectConsistency => {
                "Name the regional variant and align it with existing content for that dialect."
            }
            Self::ContextQuality => {
                "Add a phonetic transcription, tags, and a short title or description."
            }
        }
    }
}

impl std::fmt::Display for Criterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
