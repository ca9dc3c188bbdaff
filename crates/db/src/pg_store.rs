//! [`VersionStore`] backed by PostgreSQL.
//!
//! Reads go straight to the pool. A [`PgVersionTransaction`] wraps one
//! database transaction; dropping it without commit rolls back.

use async_trait::async_trait;
use glossa_core::content_version::ContentVersion;
use glossa_core::error::CoreError;
use glossa_core::store::{VersionStore, VersionTransaction};
use glossa_core::types::{ContentId, VersionId};
use sqlx::{Postgres, Transaction};

use crate::models::content_version::ContentVersionRow;
use crate::repositories::ContentVersionRepo;
use crate::DbPool;

/// Postgres implementation of the version storage contract.
#[derive(Clone)]
pub struct PgVersionStore {
    pool: DbPool,
}

impl PgVersionStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl VersionStore for PgVersionStore {
    async fn find_latest(
        &self,
        content_id: ContentId,
    ) -> Result<Option<ContentVersion>, CoreError> {
        let row = ContentVersionRepo::find_latest(&self.pool, content_id)
            .await
            .map_err(CoreError::storage)?;
        row.map(ContentVersion::try_from).transpose()
    }

    async fn find_by_id(&self, id: VersionId) -> Result<Option<ContentVersion>, CoreError> {
        let row = ContentVersionRepo::find_by_id(&self.pool, id)
            .await
            .map_err(CoreError::storage)?;
        row.map(ContentVersion::try_from).transpose()
    }

    async fn find_by_content_id(
        &self,
        content_id: ContentId,
    ) -> Result<Vec<ContentVersion>, CoreError> {
        let rows = ContentVersionRepo::list_by_content(&self.pool, content_id)
            .await
            .map_err(CoreError::storage)?;
        into_versions(rows)
    }

    async fn find_by_dialect(
        &self,
        dialect: &str,
        exclude_id: VersionId,
        limit: usize,
    ) -> Result<Vec<ContentVersion>, CoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = ContentVersionRepo::find_by_dialect(&self.pool, dialect, exclude_id, limit)
            .await
            .map_err(CoreError::storage)?;
        into_versions(rows)
    }

    async fn begin(&self) -> Result<Box<dyn VersionTransaction>, CoreError> {
        let tx = self.pool.begin().await.map_err(CoreError::storage)?;
        Ok(Box::new(PgVersionTransaction { tx }))
    }
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// One open database transaction.
pub struct PgVersionTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl VersionTransaction for PgVersionTransaction {
    async fn lock_lineage(&mut self, content_id: ContentId) -> Result<(), CoreError> {
        ContentVersionRepo::lock_lineage(&mut *self.tx, content_id)
            .await
            .map_err(CoreError::storage)?;
        tracing::debug!(%content_id, "Acquired lineage lock");
        Ok(())
    }

    async fn find_latest(
        &mut self,
        content_id: ContentId,
    ) -> Result<Option<ContentVersion>, CoreError> {
        let row = ContentVersionRepo::find_latest(&mut *self.tx, content_id)
            .await
            .map_err(CoreError::storage)?;
        row.map(ContentVersion::try_from).transpose()
    }

    async fn find_by_id(&mut self, id: VersionId) -> Result<Option<ContentVersion>, CoreError> {
        let row = ContentVersionRepo::find_by_id(&mut *self.tx, id)
            .await
            .map_err(CoreError::storage)?;
        row.map(ContentVersion::try_from).transpose()
    }

    async fn find_by_content_id(
        &mut self,
        content_id: ContentId,
    ) -> Result<Vec<ContentVersion>, CoreError> {
        let rows = ContentVersionRepo::list_by_content(&mut *self.tx, content_id)
            .await
            .map_err(CoreError::storage)?;
        into_versions(rows)
    }

    async fn save(&mut self, version: ContentVersion) -> Result<ContentVersion, CoreError> {
        let row = ContentVersionRow::try_from(&version)?;
        let saved = ContentVersionRepo::upsert(&mut *self.tx, &row)
            .await
            .map_err(|err| {
                tracing::warn!(version_id = %version.id, error = %err, "Failed to save version");
                CoreError::storage(err)
            })?;
        ContentVersion::try_from(saved)
    }

    async fn remove(&mut self, id: VersionId) -> Result<bool, CoreError> {
        ContentVersionRepo::delete(&mut *self.tx, id)
            .await
            .map_err(CoreError::storage)
    }

    async fn commit(self: Box<Self>) -> Result<(), CoreError> {
        self.tx.commit().await.map_err(CoreError::storage)
    }
}

fn into_versions(rows: Vec<ContentVersionRow>) -> Result<Vec<ContentVersion>, CoreError> {
    rows.into_iter().map(ContentVersion::try_from).collect()
}
