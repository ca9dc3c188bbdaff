/// Version primary keys are UUIDv7, generated when the version is built.
pub type VersionId = uuid::Uuid;

/// Identifier of the logical content item a lineage belongs to.
pub type ContentId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
