//! Semantic version derivation for new lineage entries.
//!
//! Pure functions; no storage access.

use crate::content_version::{ChangeType, VersionNumber};

/// Compute the version number that follows `previous` for a change of kind
/// `change_type`.
///
/// - No previous version: `1.0.0`, whatever the change type.
/// - `Creation`: patch bump. A creation on an existing lineage is a new
///   edition of that content, not a new lineage.
/// - `Modification`, `Merge`, `Revert`: minor bump, patch reset.
/// - `Deletion`: major bump, minor and patch reset.
pub fn next_version(change_type: ChangeType, previous: Option<VersionNumber>) -> VersionNumber {
    let Some(prev) = previous else {
        return VersionNumber::INITIAL;
    };
    match change_type {
        ChangeType::Creation => bump_patch(prev),
        ChangeType::Modification | ChangeType::Merge | ChangeType::Revert => {
            VersionNumber::new(prev.major, prev.minor.saturating_add(1), 0)
        }
        ChangeType::Deletion => VersionNumber::new(prev.major.saturating_add(1), 0, 0),
    }
}

/// Like [`next_version`], but takes the raw classification label.
///
/// Unrecognised labels fall back to a patch bump instead of failing.
pub fn next_version_for_label(label: &str, previous: Option<VersionNumber>) -> VersionNumber {
    match ChangeType::from_name(label) {
        Ok(change_type) => next_version(change_type, previous),
        Err(_) => previous.map_or(VersionNumber::INITIAL, bump_patch),
    }
}

fn bump_patch(prev: VersionNumber) -> VersionNumber {
    VersionNumber::new(prev.major, prev.minor, prev.patch.saturating_add(1))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
