//! Version lineage operations: create, branch, merge, revert, publish.
//!
//! Every mutating operation runs inside one [`VersionTransaction`]: all of
//! its reads and writes use that scope and it commits as the last step. An
//! error anywhere before the commit drops the transaction, which rolls back
//! every write made so far.
//!
//! Operations that allocate a version number first lock the lineage so two
//! concurrent writers cannot compute the same triple.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;

use crate::content_version::{
    sort_lineage_desc, validate_content_data, ChangeType, ContentVersion, ValidationStatus,
    VersionMetadata, VersionNumber, VersionStatus,
};
use crate::diff::{diff_versions, FieldDiff};
use crate::error::CoreError;
use crate::grading::GradingResult;
use crate::merge::merge_content;
use crate::store::{VersionStore, VersionTransaction};
use crate::types::{ContentId, VersionId};
use crate::version_arithmetic::next_version;

/// Author recorded when a merge is requested without one.
pub const SYSTEM_AUTHOR: &str = "system";

/// Orchestrates lineage mutations against a [`VersionStore`].
pub struct VersioningEngine {
    store: Arc<dyn VersionStore>,
}

impl VersioningEngine {
    pub fn new(store: Arc<dyn VersionStore>) -> Self {
        Self { store }
    }

    // ── Lineage creation ─────────────────────────────────────────────

    /// Add a version to the lineage of `content_id`.
    ///
    /// The number follows the current latest version according to
    /// `change_type` (default [`ChangeType::Creation`]). The new version is a
    /// `DRAFT` with an unvalidated baseline and an empty comment log.
    pub async fn create_version(
        &self,
        content_id: ContentId,
        content_data: Value,
        author: &str,
        change_type: Option<ChangeType>,
    ) -> Result<ContentVersion, CoreError> {
        validate_content_data(&content_data)?;
        let change_type = change_type.unwrap_or(ChangeType::Creation);

        let mut tx = self.store.begin().await?;
        tx.lock_lineage(content_id).await?;
        let latest = tx.find_latest(content_id).await?;

        let number = next_version(change_type, latest.as_ref().map(|v| v.version_number()));
        let mut metadata = VersionMetadata::authored_by(author);
        metadata.previous_version_id = latest.as_ref().map(|v| v.id);
        let parents = latest.iter().map(|v| v.id).collect();

        let version = ContentVersion::draft(
            content_id,
            content_data,
            number,
            change_type,
            metadata,
            parents,
        );
        let saved = tx.save(version).await?;
        tx.commit().await?;

        tracing::info!(
            version_id = %saved.id,
            content_id = %content_id,
            version = %number,
            change_type = %change_type,
            author,
            "Created content version"
        );
        Ok(saved)
    }

    /// Start a new edition from `base_id`.
    ///
    /// The branch copies the base content, is numbered as a patch bump of the
    /// base (skipping triples already taken in the lineage), and records its
    /// provenance in the comment log.
    pub async fn branch_version(
        &self,
        base_id: VersionId,
        author: &str,
    ) -> Result<ContentVersion, CoreError> {
        let mut tx = self.store.begin().await?;
        let base = require(tx.as_mut(), base_id).await?;
        tx.lock_lineage(base.content_id).await?;

        let wanted = next_version(ChangeType::Creation, Some(base.version_number()));
        let number = first_free_patch(tx.as_mut(), base.content_id, wanted).await?;

        let mut metadata = successor_metadata(&base.metadata, author);
        metadata.previous_version_id = Some(base.id);
        metadata.comments.push(format!(
            "Branched from version {} ({}) by {author}",
            base.version_number(),
            base.id
        ));

        let version = ContentVersion::draft(
            base.content_id,
            base.content_data.clone(),
            number,
            ChangeType::Creation,
            metadata,
            vec![base.id],
        );
        let saved = tx.save(version).await?;
        tx.commit().await?;

        tracing::info!(
            version_id = %saved.id,
            base_id = %base.id,
            version = %number,
            author,
            "Branched content version"
        );
        Ok(saved)
    }

    /// Merge `source_id` into the lineage of `target_id`.
    ///
    /// Content is a shallow merge favouring source (see
    /// [`merge_content`]). The result is a `MERGE` minor bump of the target
    /// lineage's latest version with a reset validation record.
    pub async fn merge_versions(
        &self,
        source_id: VersionId,
        target_id: VersionId,
        author: Option<&str>,
    ) -> Result<ContentVersion, CoreError> {
        let author = author.unwrap_or(SYSTEM_AUTHOR);
        if source_id == target_id {
            return Err(CoreError::InvalidState(
                "Cannot merge a version into itself".to_string(),
            ));
        }

        let mut tx = self.store.begin().await?;
        let source = require(tx.as_mut(), source_id).await?;
        let target = require(tx.as_mut(), target_id).await?;
        tx.lock_lineage(target.content_id).await?;

        let latest = tx
            .find_latest(target.content_id)
            .await?
            .ok_or_else(|| CoreError::version_not_found(target.id))?;
        let number = next_version(ChangeType::Merge, Some(latest.version_number()));

        let mut metadata = successor_metadata(&target.metadata, author);
        metadata.previous_version_id = Some(target.id);
        metadata.comments.push(format!(
            "Merged version {} ({}) into version {} ({}) by {author}",
            source.version_number(),
            source.id,
            target.version_number(),
            target.id
        ));

        let mut merged = ContentVersion::draft(
            target.content_id,
            merge_content(&source.content_data, &target.content_data),
            number,
            ChangeType::Merge,
            metadata,
            vec![target.id, source.id],
        );
        merged.validation_status = ValidationStatus::default();

        let saved = tx.save(merged).await?;
        tx.save_many(vec![source, target]).await?;
        tx.commit().await?;

        tracing::info!(
            version_id = %saved.id,
            source_id = %source_id,
            target_id = %target_id,
            version = %number,
            author,
            "Merged content versions"
        );
        Ok(saved)
    }

    /// Restore the content of `target_id` as a new `REVERT` version on top
    /// of its lineage.
    pub async fn revert_version(
        &self,
        target_id: VersionId,
        author: &str,
    ) -> Result<ContentVersion, CoreError> {
        let mut tx = self.store.begin().await?;
        let target = require(tx.as_mut(), target_id).await?;
        tx.lock_lineage(target.content_id).await?;

        let latest = tx
            .find_latest(target.content_id)
            .await?
            .ok_or_else(|| CoreError::version_not_found(target.id))?;
        let number = next_version(ChangeType::Revert, Some(latest.version_number()));

        let mut metadata = successor_metadata(&latest.metadata, author);
        metadata.previous_version_id = Some(latest.id);
        metadata.comments.push(format!(
            "Reverted to version {} ({}) by {author}",
            target.version_number(),
            target.id
        ));

        let mut parents = vec![latest.id];
        if target.id != latest.id {
            parents.push(target.id);
        }

        let version = ContentVersion::draft(
            target.content_id,
            target.content_data.clone(),
            number,
            ChangeType::Revert,
            metadata,
            parents,
        );
        let saved = tx.save(version).await?;
        tx.commit().await?;

        tracing::info!(
            version_id = %saved.id,
            reverted_to = %target.id,
            version = %number,
            author,
            "Reverted content version"
        );
        Ok(saved)
    }

    // ── Status and validation ────────────────────────────────────────

    /// Publish a validated version.
    ///
    /// Fails with `InvalidState` (and writes nothing) unless
    /// `validation_status.is_validated` is set. Publishing an already
    /// published version returns it unchanged.
    pub async fn publish_version(
        &self,
        version_id: VersionId,
        author: &str,
    ) -> Result<ContentVersion, CoreError> {
        let mut tx = self.store.begin().await?;
        let mut version = require(tx.as_mut(), version_id).await?;

        if !version.validation_status.is_validated {
            tracing::warn!(version_id = %version_id, "Rejected publish of unvalidated version");
            return Err(CoreError::InvalidState(format!(
                "Version {version_id} must be validated before publishing"
            )));
        }
        if version.status == VersionStatus::Published {
            return Ok(version);
        }

        version.status = VersionStatus::Published;
        version.metadata.published_at = Some(chrono::Utc::now());
        version.metadata.published_by = Some(author.to_string());
        version.metadata.comments.push(format!("Published by {author}"));

        let saved = tx.save(version).await?;
        tx.commit().await?;

        tracing::info!(version_id = %saved.id, author, "Published content version");
        Ok(saved)
    }

    /// Record a grading result on a version.
    ///
    /// The validation record is replaced (keeping the community approval
    /// flag) and a `DRAFT` version moves to `REVIEW`. Published versions are
    /// immutable here.
    pub async fn apply_grading(
        &self,
        version_id: VersionId,
        result: &GradingResult,
        pass_score: f64,
    ) -> Result<ContentVersion, CoreError> {
        let mut tx = self.store.begin().await?;
        let mut version = require(tx.as_mut(), version_id).await?;
        if version.status == VersionStatus::Published {
            return Err(CoreError::InvalidState(format!(
                "Version {version_id} is already published"
            )));
        }

        let approval = version.validation_status.community_approval;
        version.validation_status = result.to_validation_status(pass_score, approval);
        if version.status == VersionStatus::Draft {
            version.status = VersionStatus::Review;
        }

        let saved = tx.save(version).await?;
        tx.commit().await?;

        tracing::info!(
            version_id = %saved.id,
            score = saved.validation_status.score,
            is_validated = saved.validation_status.is_validated,
            "Applied grading result"
        );
        Ok(saved)
    }

    /// Set the community approval flag on a version.
    pub async fn set_community_approval(
        &self,
        version_id: VersionId,
        approved: bool,
    ) -> Result<ContentVersion, CoreError> {
        let mut tx = self.store.begin().await?;
        let mut version = require(tx.as_mut(), version_id).await?;
        version.validation_status.community_approval = approved;
        let saved = tx.save(version).await?;
        tx.commit().await?;
        Ok(saved)
    }

    /// Permanently delete a version. There is no tombstone.
    pub async fn remove_version(&self, version_id: VersionId) -> Result<(), CoreError> {
        let mut tx = self.store.begin().await?;
        if !tx.remove(version_id).await? {
            return Err(CoreError::version_not_found(version_id));
        }
        tx.commit().await?;

        tracing::info!(version_id = %version_id, "Removed content version");
        Ok(())
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub async fn get_version(&self, version_id: VersionId) -> Result<ContentVersion, CoreError> {
        self.store
            .find_by_id(version_id)
            .await?
            .ok_or_else(|| CoreError::version_not_found(version_id))
    }

    /// All versions of a lineage, newest first.
    pub async fn get_history(
        &self,
        content_id: ContentId,
    ) -> Result<Vec<ContentVersion>, CoreError> {
        let mut versions = self.store.find_by_content_id(content_id).await?;
        sort_lineage_desc(&mut versions);
        Ok(versions)
    }

    /// Field-level diff from `version_id_1` to `version_id_2`.
    pub async fn compare_versions(
        &self,
        version_id_1: VersionId,
        version_id_2: VersionId,
    ) -> Result<Vec<FieldDiff>, CoreError> {
        let old = self
            .store
            .find_by_id(version_id_1)
            .await?
            .ok_or_else(|| CoreError::version_not_found(version_id_1))?;
        let new = self
            .store
            .find_by_id(version_id_2)
            .await?
            .ok_or_else(|| CoreError::version_not_found(version_id_2))?;
        Ok(diff_versions(&old, &new))
    }

    /// The versions `version_id` was derived from. Parents that have since
    /// been removed are skipped.
    pub async fn lineage_parents(
        &self,
        version_id: VersionId,
    ) -> Result<Vec<ContentVersion>, CoreError> {
        let version = self
            .store
            .find_by_id(version_id)
            .await?
            .ok_or_else(|| CoreError::version_not_found(version_id))?;

        let mut parents = Vec::with_capacity(version.parent_ids.len());
        for parent_id in &version.parent_ids {
            if let Some(parent) = self.store.find_by_id(*parent_id).await? {
                parents.push(parent);
            }
        }
        Ok(parents)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load a version inside `tx` or fail with `NotFound`.
async fn require(
    tx: &mut dyn VersionTransaction,
    id: VersionId,
) -> Result<ContentVersion, CoreError> {
    tx.find_by_id(id)
        .await?
        .ok_or_else(|| CoreError::version_not_found(id))
}

/// Bump the patch of `wanted` until no version of the lineage holds it.
async fn first_free_patch(
    tx: &mut dyn VersionTransaction,
    content_id: ContentId,
    wanted: VersionNumber,
) -> Result<VersionNumber, CoreError> {
    let taken: HashSet<VersionNumber> = tx
        .find_by_content_id(content_id)
        .await?
        .iter()
        .map(|v| v.version_number())
        .collect();

    let mut number = wanted;
    while taken.contains(&number) {
        number.patch = number.patch.checked_add(1).ok_or_else(|| {
            CoreError::InvalidState(format!(
                "no free patch number after {number} for content {content_id}"
            ))
        })?;
    }
    Ok(number)
}

/// Metadata for a version derived from another: descriptive fields and the
/// comment log carry over, authorship and review state start fresh.
fn successor_metadata(from: &VersionMetadata, author: &str) -> VersionMetadata {
    VersionMetadata {
        author: author.to_string(),
        tags: from.tags.clone(),
        comments: from.comments.clone(),
        title: from.title.clone(),
        description: from.description.clone(),
        extra: from.extra.clone(),
        ..VersionMetadata::default()
    }
}
