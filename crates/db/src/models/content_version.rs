//! Row model for the `content_versions` table.

use glossa_core::content_version::{
    ChangeType, ContentVersion, ValidationStatus, VersionMetadata, VersionStatus,
};
use glossa_core::error::CoreError;
use glossa_core::types::{ContentId, Timestamp, VersionId};
use serde_json::Value;
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A row from the `content_versions` table.
///
/// `metadata` and `validation_status` are JSONB documents; status and change
/// type are stored by their upper-case names.
#[derive(Debug, Clone, FromRow)]
pub struct ContentVersionRow {
    pub id: VersionId,
    pub content_id: ContentId,
    pub content_data: Value,
    pub major_version: i32,
    pub minor_version: i32,
    pub patch_version: i32,
    pub status: String,
    pub change_type: String,
    pub metadata: Value,
    pub validation_status: Value,
    pub parent_ids: Vec<VersionId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

impl TryFrom<ContentVersionRow> for ContentVersion {
    type Error = CoreError;

    fn try_from(row: ContentVersionRow) -> Result<Self, Self::Error> {
        let metadata: VersionMetadata =
            serde_json::from_value(row.metadata).map_err(CoreError::storage)?;
        let validation_status: ValidationStatus =
            serde_json::from_value(row.validation_status).map_err(CoreError::storage)?;

        Ok(ContentVersion {
            id: row.id,
            content_id: row.content_id,
            content_data: row.content_data,
            major_version: from_column("major_version", row.major_version)?,
            minor_version: from_column("minor_version", row.minor_version)?,
            patch_version: from_column("patch_version", row.patch_version)?,
            status: VersionStatus::from_name(&row.status)?,
            change_type: ChangeType::from_name(&row.change_type)?,
            metadata,
            validation_status,
            parent_ids: row.parent_ids,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<&ContentVersion> for ContentVersionRow {
    type Error = CoreError;

    fn try_from(version: &ContentVersion) -> Result<Self, Self::Error> {
        Ok(ContentVersionRow {
            id: version.id,
            content_id: version.content_id,
            content_data: version.content_data.clone(),
            major_version: to_column("major_version", version.major_version)?,
            minor_version: to_column("minor_version", version.minor_version)?,
            patch_version: to_column("patch_version", version.patch_version)?,
            status: version.status.as_str().to_string(),
            change_type: version.change_type.as_str().to_string(),
            metadata: serde_json::to_value(&version.metadata).map_err(CoreError::storage)?,
            validation_status: serde_json::to_value(&version.validation_status)
                .map_err(CoreError::storage)?,
            parent_ids: version.parent_ids.clone(),
            created_at: version.created_at,
            updated_at: version.updated_at,
        })
    }
}

fn from_column(name: &str, value: i32) -> Result<u32, CoreError> {
    u32::try_from(value)
        .map_err(|_| CoreError::storage(format!("{name} is negative: {value}")))
}

fn to_column(name: &str, value: u32) -> Result<i32, CoreError> {
    i32::try_from(value)
        .map_err(|_| CoreError::Validation(format!("{name} {value} exceeds the column range")))
}
