//! Repository for the `content_versions` table.
//!
//! Every function takes a generic executor so the same query runs against
//! the pool or inside an open transaction (`&mut *tx`).

use glossa_core::types::{ContentId, VersionId};
use sqlx::PgExecutor;

use crate::models::content_version::ContentVersionRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, content_id, content_data, major_version, minor_version, \
    patch_version, status, change_type, metadata, validation_status, parent_ids, \
    created_at, updated_at";

/// Whitespace stripped from dialect tags: space, tab, newline, carriage
/// return, vertical tab, form feed.
const DIALECT_TRIM: &str = r"E' \t\n\r\x0B\f'";

/// Newest-first ordering by version triple.
const ORDER_DESC: &str = "major_version DESC, minor_version DESC, patch_version DESC";

/// Provides lineage queries and writes for content versions.
pub struct ContentVersionRepo;

impl ContentVersionRepo {
    // ── Reads ────────────────────────────────────────────────────────

    /// Find a version by its ID.
    pub async fn find_by_id<'e>(
        executor: impl PgExecutor<'e>,
        id: VersionId,
    ) -> Result<Option<ContentVersionRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM content_versions WHERE id = $1");
        sqlx::query_as::<_, ContentVersionRow>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// The version with the greatest triple for a content item.
    pub async fn find_latest<'e>(
        executor: impl PgExecutor<'e>,
        content_id: ContentId,
    ) -> Result<Option<ContentVersionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM content_versions
             WHERE content_id = $1
             ORDER BY {ORDER_DESC}
             LIMIT 1"
        );
        sqlx::query_as::<_, ContentVersionRow>(&query)
            .bind(content_id)
            .fetch_optional(executor)
            .await
    }

    /// All versions of a content item, newest first.
    pub async fn list_by_content<'e>(
        executor: impl PgExecutor<'e>,
        content_id: ContentId,
    ) -> Result<Vec<ContentVersionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM content_versions
             WHERE content_id = $1
             ORDER BY {ORDER_DESC}"
        );
        sqlx::query_as::<_, ContentVersionRow>(&query)
            .bind(content_id)
            .fetch_all(executor)
            .await
    }

    /// Up to `limit` versions tagged with `dialect` (trimmed,
    /// case-insensitive), excluding `exclude_id`. Most recent first.
    ///
    /// Only string tags match, and the trim set is the same as
    /// [`glossa_core::content_version::DIALECT_TRIM_CHARS`].
    pub async fn find_by_dialect<'e>(
        executor: impl PgExecutor<'e>,
        dialect: &str,
        exclude_id: VersionId,
        limit: i64,
    ) -> Result<Vec<ContentVersionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM content_versions
             WHERE lower(btrim(content_data ->> 'dialectVariation', {DIALECT_TRIM}))
                   = lower(btrim($1, {DIALECT_TRIM}))
               AND json_typeof(content_data -> 'dialectVariation') = 'string'
               AND id <> $2
             ORDER BY created_at DESC, id
             LIMIT $3"
        );
        sqlx::query_as::<_, ContentVersionRow>(&query)
            .bind(dialect)
            .bind(exclude_id)
            .bind(limit)
            .fetch_all(executor)
            .await
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Insert a version or update the mutable columns of an existing one.
    ///
    /// `content_data` is bound as text so the JSON column keeps its key order.
    /// The version triple and `created_at` are fixed at insert time.
    /// `updated_at` is set by the database, and only when a mutable column
    /// actually changes; re-saving an identical row leaves it untouched.
    pub async fn upsert<'e>(
        executor: impl PgExecutor<'e>,
        row: &ContentVersionRow,
    ) -> Result<ContentVersionRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO content_versions
                (id, content_id, content_data, major_version, minor_version, patch_version,
                 status, change_type, metadata, validation_status, parent_ids, created_at)
             VALUES ($1, $2, $3::json, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             ON CONFLICT (id) DO UPDATE SET
                content_data = EXCLUDED.content_data,
                status = EXCLUDED.status,
                change_type = EXCLUDED.change_type,
                metadata = EXCLUDED.metadata,
                validation_status = EXCLUDED.validation_status,
                parent_ids = EXCLUDED.parent_ids,
                updated_at = CASE
                    WHEN (content_versions.content_data::text, content_versions.status,
                          content_versions.change_type, content_versions.metadata,
                          content_versions.validation_status, content_versions.parent_ids)
                         IS DISTINCT FROM
                         (EXCLUDED.content_data::text, EXCLUDED.status,
                          EXCLUDED.change_type, EXCLUDED.metadata,
                          EXCLUDED.validation_status, EXCLUDED.parent_ids)
                    THEN NOW()
                    ELSE content_versions.updated_at
                END
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ContentVersionRow>(&query)
            .bind(row.id)
            .bind(row.content_id)
            .bind(row.content_data.to_string())
            .bind(row.major_version)
            .bind(row.minor_version)
            .bind(row.patch_version)
            .bind(&row.status)
            .bind(&row.change_type)
            .bind(&row.metadata)
            .bind(&row.validation_status)
            .bind(&row.parent_ids)
            .bind(row.created_at)
            .fetch_one(executor)
            .await
    }

    /// Hard-delete a version. Returns `true` if a row was removed.
    pub async fn delete<'e>(
        executor: impl PgExecutor<'e>,
        id: VersionId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM content_versions WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Take a transaction-scoped advisory lock on a content lineage.
    ///
    /// Released automatically when the surrounding transaction ends.
    pub async fn lock_lineage<'e>(
        executor: impl PgExecutor<'e>,
        content_id: ContentId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1::text))")
            .bind(content_id)
            .execute(executor)
            .await?;
        Ok(())
    }
}
