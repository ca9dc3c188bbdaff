//! Content version entity, lineage enums, and payload checks.
//!
//! A [`ContentVersion`] is an immutable snapshot of one content item. Versions
//! of the same `content_id` form a lineage ordered by their
//! [`VersionNumber`]; the "latest" version is always derived from that
//! ordering and never stored as a flag.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::types::{ContentId, Timestamp, VersionId};

// ---------------------------------------------------------------------------
// Conventional content fields
// ---------------------------------------------------------------------------

/// Source-language text.
pub const FIELD_ORIGINAL: &str = "original";
/// Target-language rendering of `original`.
pub const FIELD_TRANSLATED: &str = "translated";
/// Cultural background notes. May be a string or a list of strings.
pub const FIELD_CULTURAL_CONTEXT: &str = "culturalContext";
/// Pronunciation guide.
pub const FIELD_PRONUNCIATION: &str = "pronunciation";
/// Regional dialect tag / description.
pub const FIELD_DIALECT_VARIATION: &str = "dialectVariation";

/// Characters stripped from both ends of a dialect tag. Matches the
/// `btrim` set used by the Postgres dialect lookup.
pub const DIALECT_TRIM_CHARS: &[char] = &[' ', '\t', '\n', '\r', '\x0B', '\x0C'];

/// The content fields the grading engine inspects, in scoring order.
pub const CONVENTIONAL_FIELDS: &[&str] = &[
    FIELD_ORIGINAL,
    FIELD_TRANSLATED,
    FIELD_CULTURAL_CONTEXT,
    FIELD_PRONUNCIATION,
    FIELD_DIALECT_VARIATION,
];

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Review lifecycle of a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VersionStatus {
    Draft,
    Review,
    Published,
}

impl VersionStatus {
    /// String representation for display, logging, and database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Review => "REVIEW",
            Self::Published => "PUBLISHED",
        }
    }

    /// Parse from the stored name. Unknown names are a caller error.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "DRAFT" => Ok(Self::Draft),
            "REVIEW" => Ok(Self::Review),
            "PUBLISHED" => Ok(Self::Published),
            other => Err(CoreError::InvalidState(format!(
                "Unknown version status '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for VersionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Change classification driving version-number arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeType {
    Creation,
    Modification,
    Deletion,
    Merge,
    Revert,
}

impl ChangeType {
    /// String representation for display, logging, and database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Creation => "CREATION",
            Self::Modification => "MODIFICATION",
            Self::Deletion => "DELETION",
            Self::Merge => "MERGE",
            Self::Revert => "REVERT",
        }
    }

    /// Parse from the stored name. Unknown names are a caller error.
    ///
    /// Version arithmetic has its own lenient path for unknown labels, see
    /// [`crate::version_arithmetic::next_version_for_label`].
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "CREATION" => Ok(Self::Creation),
            "MODIFICATION" => Ok(Self::Modification),
            "DELETION" => Ok(Self::Deletion),
            "MERGE" => Ok(Self::Merge),
            "REVERT" => Ok(Self::Revert),
            other => Err(CoreError::InvalidState(format!(
                "Unknown change type '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Version number
// ---------------------------------------------------------------------------

/// A `(major, minor, patch)` triple. Field order gives lineage ordering.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct VersionNumber {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl VersionNumber {
    /// First version of every lineage.
    pub const INITIAL: VersionNumber = VersionNumber::new(1, 0, 0);

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl std::fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

// ---------------------------------------------------------------------------
// Metadata and validation records
// ---------------------------------------------------------------------------

/// Free-form version metadata. Unknown keys are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VersionMetadata {
    pub author: String,
    pub reviewers: Vec<String>,
    pub tags: Vec<String>,
    /// Append-only log of human-readable lineage notes.
    pub comments: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_version_id: Option<VersionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_by: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VersionMetadata {
    /// Metadata for a freshly built version with an empty comment log.
    pub fn authored_by(author: &str) -> Self {
        Self {
            author: author.to_string(),
            ..Self::default()
        }
    }
}

/// Grading outcome recorded on a version. `is_validated` gates publishing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationStatus {
    pub score: f64,
    pub cultural_accuracy: f64,
    pub linguistic_quality: f64,
    pub dialect_consistency: f64,
    pub community_approval: bool,
    pub is_validated: bool,
    pub feedback: Vec<String>,
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// One immutable version of a content item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentVersion {
    pub id: VersionId,
    pub content_id: ContentId,
    pub content_data: Value,
    pub major_version: u32,
    pub minor_version: u32,
    pub patch_version: u32,
    pub status: VersionStatus,
    pub change_type: ChangeType,
    pub metadata: VersionMetadata,
    pub validation_status: ValidationStatus,
    /// Lineage edges: the versions this one was derived from.
    pub parent_ids: Vec<VersionId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ContentVersion {
    /// Build a new `DRAFT` version with a fresh id and an unvalidated baseline.
    pub fn draft(
        content_id: ContentId,
        content_data: Value,
        number: VersionNumber,
        change_type: ChangeType,
        metadata: VersionMetadata,
        parent_ids: Vec<VersionId>,
    ) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: uuid::Uuid::now_v7(),
            content_id,
            content_data,
            major_version: number.major,
            minor_version: number.minor,
            patch_version: number.patch,
            status: VersionStatus::Draft,
            change_type,
            metadata,
            validation_status: ValidationStatus::default(),
            parent_ids,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn version_number(&self) -> VersionNumber {
        VersionNumber::new(self.major_version, self.minor_version, self.patch_version)
    }

    /// Text of a content field.
    ///
    /// Strings are returned as-is and lists of strings are joined with a
    /// space. Any other shape (or a missing field) yields an empty string.
    pub fn content_text(&self, field: &str) -> String {
        content_text(&self.content_data, field)
    }

    /// The trimmed dialect tag, if one is set. Only a string value counts
    /// as a tag.
    pub fn dialect(&self) -> Option<String> {
        let Some(Value::String(dialect)) = self.content_data.get(FIELD_DIALECT_VARIATION) else {
            return None;
        };
        let trimmed = trim_dialect(dialect);
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

/// Strip [`DIALECT_TRIM_CHARS`] from both ends of a dialect tag.
pub fn trim_dialect(dialect: &str) -> &str {
    dialect.trim_matches(DIALECT_TRIM_CHARS)
}

/// Text of `field` in a content payload. See [`ContentVersion::content_text`].
pub fn content_text(content_data: &Value, field: &str) -> String {
    match content_data.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" "),
        _ => String::new(),
    }
}

/// Sort versions by version triple, newest first.
pub fn sort_lineage_desc(versions: &mut [ContentVersion]) {
    versions.sort_by_key(|v| Reverse(v.version_number()));
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate the structure of a content payload.
///
/// The payload must be a JSON object. The conventional fields, when present
/// and non-null, must be strings; `culturalContext` may also be a list of
/// strings. Any other key is accepted untouched.
pub fn validate_content_data(content_data: &Value) -> Result<(), CoreError> {
    let obj = content_data
        .as_object()
        .ok_or_else(|| CoreError::Validation("contentData must be a JSON object".into()))?;

    for &field in CONVENTIONAL_FIELDS {
        match obj.get(field) {
            None | Some(Value::Null) | Some(Value::String(_)) => {}
            Some(Value::Array(items)) if field == FIELD_CULTURAL_CONTEXT => {
                if !items.iter().all(|item| item.is_string() || item.is_null()) {
                    return Err(CoreError::Validation(format!(
                        "contentData.{field} must contain only strings"
                    )));
                }
            }
            Some(_) => {
                return Err(CoreError::Validation(format!(
                    "contentData.{field} must be a string"
                )));
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
