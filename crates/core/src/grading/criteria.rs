//! Pure scoring heuristics for the grading criteria.
//!
//! These are deliberately simple, explainable proxies (length ratios,
//! term-density scans, lexical equality), not language analysis. Every
//! function returns a score in `[0.0, 1.0]`.

use crate::content_version::{
    ContentVersion, CONVENTIONAL_FIELDS, FIELD_CULTURAL_CONTEXT, FIELD_ORIGINAL,
    FIELD_PRONUNCIATION, FIELD_TRANSLATED,
};
use crate::grading::config::{FieldTarget, GradingConfig};
use crate::lexical::{normalize_word, LexicalEquivalence};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Flat credit for having any cultural context at all.
const CULTURAL_PRESENCE_CREDIT: f64 = 0.4;
/// Weight of the cultural-context length score.
const CULTURAL_LENGTH_WEIGHT: f64 = 0.3;
/// Cultural context length (chars) that earns the full length score.
const CULTURAL_LENGTH_TARGET: f64 = 200.0;
/// Weight of the term-density/depth score inside cultural relevance.
const CULTURAL_DEPTH_WEIGHT: f64 = 0.3;

/// Density multiplier and cap for [`depth_score`].
const DENSITY_SCALE: f64 = 500.0;
const DENSITY_CAP: f64 = 0.7;
/// Length sub-bonus weight and target (chars) for [`depth_score`].
const DEPTH_LENGTH_WEIGHT: f64 = 0.3;
const DEPTH_LENGTH_TARGET: f64 = 500.0;

/// Accuracy sub-weights.
const ACCURACY_TOKEN_WEIGHT: f64 = 0.4;
const ACCURACY_PATTERN_WEIGHT: f64 = 0.3;
const ACCURACY_PREDECESSOR_WEIGHT: f64 = 0.3;
/// Pattern score when no marker is found.
const NEUTRAL_PATTERN_SCORE: f64 = 0.5;

/// Context-quality sub-weights.
const PRONUNCIATION_WEIGHT: f64 = 0.4;
const INTEGRATION_WEIGHT: f64 = 0.3;
const METADATA_WEIGHT: f64 = 0.3;
/// Bonus when cultural context echoes the start of the original text.
const CROSS_REFERENCE_BONUS: f64 = 0.1;
/// Leading characters of `original` looked for in cultural context.
const CROSS_REFERENCE_PREFIX_CHARS: usize = 10;
/// Tag count that earns full tag credit.
const TAG_TARGET: f64 = 5.0;

// ---------------------------------------------------------------------------
// Completeness
// ---------------------------------------------------------------------------

/// Field-weighted presence and length score.
///
/// Each non-blank field earns `weight * (0.5 + 0.5 * min(len / optimal, 1))`.
pub fn completeness(version: &ContentVersion, targets: &[FieldTarget]) -> f64 {
    let total: f64 = targets
        .iter()
        .map(|target| {
            let text = version.content_text(&target.field);
            let len = char_len(text.trim());
            if len == 0 || target.optimal_len == 0 {
                return 0.0;
            }
            let ratio = (len as f64 / target.optimal_len as f64).min(1.0);
            target.weight * (0.5 + 0.5 * ratio)
        })
        .sum();
    total.min(1.0)
}

// ---------------------------------------------------------------------------
// Accuracy building blocks
// ---------------------------------------------------------------------------

/// Share of `original` tokens that have an equivalent token in `translated`.
///
/// Each original token is matched against every translated token, not only
/// the one at the same position, so reordered translations still score.
pub fn token_match_ratio(
    original: &str,
    translated: &str,
    lexicon: &dyn LexicalEquivalence,
) -> f64 {
    let source: Vec<&str> = original.split_whitespace().collect();
    let target: Vec<&str> = translated.split_whitespace().collect();
    if source.is_empty() || target.is_empty() {
        return 0.0;
    }
    let matched = source
        .iter()
        .filter(|word| target.iter().any(|other| lexicon.are_equivalent(word, other)))
        .count();
    matched as f64 / source.len() as f64
}

/// 1.0 when `text` contains one of the known markers, otherwise neutral 0.5.
pub fn linguistic_pattern_score(text: &str, markers: &[String]) -> f64 {
    let lowered = text.to_lowercase();
    if markers
        .iter()
        .any(|m| !m.is_empty() && lowered.contains(&m.to_lowercase()))
    {
        1.0
    } else {
        NEUTRAL_PATTERN_SCORE
    }
}

/// Shorter length over longer length. Two empty texts are identical.
pub fn length_ratio(a: &str, b: &str) -> f64 {
    let (la, lb) = (char_len(a.trim()), char_len(b.trim()));
    match (la, lb) {
        (0, 0) => 1.0,
        _ => la.min(lb) as f64 / la.max(lb) as f64,
    }
}

/// Length-ratio similarity to the predecessor across original (0.4),
/// translated (0.4), and cultural context (0.2).
pub fn predecessor_similarity(current: &ContentVersion, previous: &ContentVersion) -> f64 {
    let ratio = |field: &str| {
        length_ratio(&current.content_text(field), &previous.content_text(field))
    };
    0.4 * ratio(FIELD_ORIGINAL)
        + 0.4 * ratio(FIELD_TRANSLATED)
        + 0.2 * ratio(FIELD_CULTURAL_CONTEXT)
}

/// Combine the accuracy signals. A missing predecessor contributes nothing.
pub fn accuracy(token_ratio: f64, pattern: f64, predecessor: Option<f64>) -> f64 {
    let total = ACCURACY_TOKEN_WEIGHT * token_ratio
        + ACCURACY_PATTERN_WEIGHT * pattern
        + ACCURACY_PREDECESSOR_WEIGHT * predecessor.unwrap_or(0.0);
    total.clamp(0.0, 1.0)
}

// ---------------------------------------------------------------------------
// Cultural relevance and dialect coherence
// ---------------------------------------------------------------------------

/// Fraction of words in `text` that match one of `terms`.
///
/// A word matches when its normalized form starts with a normalized term,
/// so simple plurals count.
pub fn term_density(text: &str, terms: &[String]) -> f64 {
    let words: Vec<String> = text.split_whitespace().map(normalize_word).collect();
    if words.is_empty() {
        return 0.0;
    }
    let terms: Vec<String> = terms
        .iter()
        .map(|t| normalize_word(t))
        .filter(|t| !t.is_empty())
        .collect();
    let hits = words
        .iter()
        .filter(|w| !w.is_empty() && terms.iter().any(|t| w.starts_with(t.as_str())))
        .count();
    hits as f64 / words.len() as f64
}

/// Density-plus-length score shared by cultural relevance and dialect
/// coherence: `min(density * 500, 0.7) + 0.3 * min(len / 500, 1)`.
pub fn depth_score(text: &str, terms: &[String]) -> f64 {
    let density = (term_density(text, terms) * DENSITY_SCALE).min(DENSITY_CAP);
    let length = (char_len(text.trim()) as f64 / DEPTH_LENGTH_TARGET).min(1.0);
    (density + DEPTH_LENGTH_WEIGHT * length).min(1.0)
}

/// Cultural relevance of the `culturalContext` field.
///
/// Zero when empty. Otherwise a flat 0.4 for presence, up to 0.3 for
/// length, and up to 0.3 for vocabulary depth.
pub fn cultural_relevance(version: &ContentVersion, config: &GradingConfig) -> f64 {
    let text = version.content_text(FIELD_CULTURAL_CONTEXT);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    let length = (char_len(trimmed) as f64 / CULTURAL_LENGTH_TARGET).min(1.0);
    let total = CULTURAL_PRESENCE_CREDIT
        + CULTURAL_LENGTH_WEIGHT * length
        + CULTURAL_DEPTH_WEIGHT * depth_score(trimmed, &config.cultural_terms);
    total.min(1.0)
}

/// Internal coherence of a dialect description.
pub fn dialect_coherence(dialect: &str, config: &GradingConfig) -> f64 {
    depth_score(dialect, &config.dialect_terms)
}

/// Combine sibling agreement (0.6) and description coherence (0.4).
///
/// `sibling_dialects` are the dialect tags of the versions returned by the
/// sibling lookup; only exact matches of `dialect` count. No siblings
/// means no agreement credit.
pub fn dialect_consistency(dialect: &str, sibling_dialects: &[String], coherence: f64) -> f64 {
    let agreement = if sibling_dialects.is_empty() {
        0.0
    } else {
        let same = sibling_dialects
            .iter()
            .filter(|d| d.as_str() == dialect)
            .count();
        same as f64 / sibling_dialects.len() as f64
    };
    (0.6 * agreement + 0.4 * coherence).clamp(0.0, 1.0)
}

// ---------------------------------------------------------------------------
// Context quality
// ---------------------------------------------------------------------------

/// Presence (0.5) plus a bonus (0.5) for phonetic notation.
pub fn pronunciation_quality(pronunciation: &str, markers: &[char]) -> f64 {
    let trimmed = pronunciation.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    let bonus = if trimmed.chars().any(|c| markers.contains(&c)) {
        0.5
    } else {
        0.0
    };
    0.5 + bonus
}

/// Share of populated conventional fields, plus a small bonus when the
/// cultural context quotes the opening of the original text.
pub fn content_integration(version: &ContentVersion) -> f64 {
    let filled = CONVENTIONAL_FIELDS
        .iter()
        .filter(|f| !version.content_text(f).trim().is_empty())
        .count();
    let ratio = filled as f64 / CONVENTIONAL_FIELDS.len() as f64;

    let original = version.content_text(FIELD_ORIGINAL).trim().to_lowercase();
    let context = version.content_text(FIELD_CULTURAL_CONTEXT).to_lowercase();
    let prefix: String = original.chars().take(CROSS_REFERENCE_PREFIX_CHARS).collect();
    let bonus = if !prefix.is_empty() && context.contains(&prefix) {
        CROSS_REFERENCE_BONUS
    } else {
        0.0
    };
    (ratio + bonus).min(1.0)
}

/// Tag count (up to five, worth 0.7) plus 0.3 for a title or description.
pub fn metadata_quality(version: &ContentVersion) -> f64 {
    let meta = &version.metadata;
    let tags = (meta.tags.len() as f64 / TAG_TARGET).min(1.0) * 0.7;
    let has_text = |s: &Option<String>| s.as_deref().is_some_and(|t| !t.trim().is_empty());
    let described = if has_text(&meta.title) || has_text(&meta.description) {
        0.3
    } else {
        0.0
    };
    tags + described
}

/// Weighted context quality: pronunciation 0.4, integration 0.3, metadata 0.3.
pub fn context_quality(version: &ContentVersion, config: &GradingConfig) -> f64 {
    let pronunciation = pronunciation_quality(
        &version.content_text(FIELD_PRONUNCIATION),
        &config.phonetic_markers,
    );
    let total = PRONUNCIATION_WEIGHT * pronunciation
        + INTEGRATION_WEIGHT * content_integration(version)
        + METADATA_WEIGHT * metadata_quality(version);
    total.min(1.0)
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// `max(0, 1 - population standard deviation)` of the criterion scores.
pub fn confidence(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let n = scores.len() as f64;
    let mean = scores.iter().sum::<f64>() / n;
    let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
    (1.0 - variance.sqrt()).max(0.0)
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
