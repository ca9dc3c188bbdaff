/// Boxed error returned by a storage collaborator.
pub type StorageSource = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Storage failure: {0}")]
    Storage(#[source] StorageSource),
}

impl CoreError {
    /// Build a `NotFound` for a content version id.
    pub fn version_not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity: "ContentVersion",
            id: id.to_string(),
        }
    }

    /// Wrap any collaborator error as a `Storage` failure.
    pub fn storage(err: impl Into<StorageSource>) -> Self {
        Self::Storage(err.into())
    }
}
