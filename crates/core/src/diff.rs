//! Field-level diff between two content version snapshots.
//!
//! Compares `contentData`, `metadata`, `status`, and `validationStatus`.
//! Each record group is a shallow key union: a key present on either side is
//! compared and reported under a dotted path such as `contentData.original`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::content_version::ContentVersion;

/// The status of a reported field.
///
/// - `Added`   -- present only on the new side.
/// - `Removed` -- present only on the old side.
/// - `Changed` -- present on both sides with different values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffStatus {
    Added,
    Removed,
    Changed,
}

impl DiffStatus {
    /// String representation for display and logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Changed => "changed",
        }
    }
}

impl std::fmt::Display for DiffStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One changed field between two versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDiff {
    pub field: String,
    pub previous_value: Option<Value>,
    pub new_value: Option<Value>,
    pub status: DiffStatus,
}

/// Compute the ordered list of changed fields from `old` to `new`.
///
/// Order: content fields, metadata fields, `status`, validation fields.
/// Within a group, keys follow their encounter order: keys of `old` first,
/// then keys only present in `new`.
///
/// Content and metadata values are compared by their serialized form.
/// Validation values use strict value equality. Because `ValidationStatus`
/// is typed, a score stored as a string never reaches this point: it fails
/// to load as a `ContentVersion` and surfaces as a storage error instead.
pub fn diff_versions(old: &ContentVersion, new: &ContentVersion) -> Vec<FieldDiff> {
    let mut out = Vec::new();

    diff_group(
        "contentData",
        old.content_data.as_object(),
        new.content_data.as_object(),
        serialized_eq,
        &mut out,
    );

    let old_meta = to_record(&old.metadata);
    let new_meta = to_record(&new.metadata);
    diff_group(
        "metadata",
        old_meta.as_ref(),
        new_meta.as_ref(),
        serialized_eq,
        &mut out,
    );

    if old.status != new.status {
        out.push(FieldDiff {
            field: "status".to_string(),
            previous_value: Some(Value::String(old.status.as_str().to_string())),
            new_value: Some(Value::String(new.status.as_str().to_string())),
            status: DiffStatus::Changed,
        });
    }

    let old_validation = to_record(&old.validation_status);
    let new_validation = to_record(&new.validation_status);
    diff_group(
        "validationStatus",
        old_validation.as_ref(),
        new_validation.as_ref(),
        strict_eq,
        &mut out,
    );

    out
}

fn serialized_eq(a: &Value, b: &Value) -> bool {
    a.to_string() == b.to_string()
}

fn strict_eq(a: &Value, b: &Value) -> bool {
    a == b
}

/// Serialize a typed record into a JSON object. Non-object output counts as
/// "no fields".
fn to_record<T: Serialize>(record: &T) -> Option<Map<String, Value>> {
    match serde_json::to_value(record) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn diff_group(
    prefix: &str,
    old: Option<&Map<String, Value>>,
    new: Option<&Map<String, Value>>,
    eq: fn(&Value, &Value) -> bool,
    out: &mut Vec<FieldDiff>,
) {
    let empty = Map::new();
    let old = old.unwrap_or(&empty);
    let new = new.unwrap_or(&empty);

    let keys = old
        .keys()
        .chain(new.keys().filter(|k| !old.contains_key(*k)));

    for key in keys {
        let entry = match (old.get(key), new.get(key)) {
            (Some(a), Some(b)) if eq(a, b) => continue,
            (Some(a), Some(b)) => (Some(a.clone()), Some(b.clone()), DiffStatus::Changed),
            (Some(a), None) => (Some(a.clone()), None, DiffStatus::Removed),
            (None, Some(b)) => (None, Some(b.clone()), DiffStatus::Added),
            (None, None) => continue,
        };
        out.push(FieldDiff {
            field: format!("{prefix}.{key}"),
            previous_value: entry.0,
            new_value: entry.1,
            status: entry.2,
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
