//! Storage collaborator contracts.
//!
//! The engines never talk to a database directly. They read through a
//! [`VersionStore`] and perform every multi-step mutation inside one
//! [`VersionTransaction`] obtained from [`VersionStore::begin`].
//!
//! A transaction that is dropped without [`VersionTransaction::commit`]
//! must roll back every write made through it. Engine operations rely on
//! this: any `?` early return discards the transaction and leaves the store
//! untouched.

pub mod memory;

use async_trait::async_trait;

use crate::content_version::ContentVersion;
use crate::error::CoreError;
use crate::types::{ContentId, VersionId};

pub use memory::InMemoryVersionStore;

/// Read access plus transaction acquisition.
///
/// Reads made here run outside any write transaction and may observe either
/// the old or the new snapshot of a concurrently written lineage.
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// The version with the greatest version triple for `content_id`.
    async fn find_latest(&self, content_id: ContentId)
        -> Result<Option<ContentVersion>, CoreError>;

    async fn find_by_id(&self, id: VersionId) -> Result<Option<ContentVersion>, CoreError>;

    /// All versions of a lineage. Implementations should return them newest
    /// first; callers still sort.
    async fn find_by_content_id(
        &self,
        content_id: ContentId,
    ) -> Result<Vec<ContentVersion>, CoreError>;

    /// Up to `limit` versions whose dialect tag matches `dialect`
    /// (trimmed, case-insensitive), excluding `exclude_id`.
    async fn find_by_dialect(
        &self,
        dialect: &str,
        exclude_id: VersionId,
        limit: usize,
    ) -> Result<Vec<ContentVersion>, CoreError>;

    /// Open a transaction scope.
    async fn begin(&self) -> Result<Box<dyn VersionTransaction>, CoreError>;
}

/// A transactional scope. All reads and writes of one engine operation go
/// through the same scope.
#[async_trait]
pub trait VersionTransaction: Send {
    /// Serialise version-number allocation for `content_id` until this
    /// transaction ends.
    async fn lock_lineage(&mut self, content_id: ContentId) -> Result<(), CoreError>;

    async fn find_latest(
        &mut self,
        content_id: ContentId,
    ) -> Result<Option<ContentVersion>, CoreError>;

    async fn find_by_id(&mut self, id: VersionId) -> Result<Option<ContentVersion>, CoreError>;

    async fn find_by_content_id(
        &mut self,
        content_id: ContentId,
    ) -> Result<Vec<ContentVersion>, CoreError>;

    /// Insert or update a version, returning the stored row.
    async fn save(&mut self, version: ContentVersion) -> Result<ContentVersion, CoreError>;

    /// Save several versions in order.
    async fn save_many(
        &mut self,
        versions: Vec<ContentVersion>,
    ) -> Result<Vec<ContentVersion>, CoreError> {
        let mut saved = Vec::with_capacity(versions.len());
        for version in versions {
            saved.push(self.save(version).await?);
        }
        Ok(saved)
    }

    /// Hard-delete a version. Returns `true` if a row was removed.
    async fn remove(&mut self, id: VersionId) -> Result<bool, CoreError>;

    /// Make every write of this scope durable.
    async fn commit(self: Box<Self>) -> Result<(), CoreError>;
}
