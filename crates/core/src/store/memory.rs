//! In-process [`VersionStore`] implementation.
//!
//! Transactions are fully serialised: `begin` waits for the previous
//! transaction to finish, stages its writes privately, and applies them on
//! commit. Dropping a transaction discards the staged writes.
//!
//! The store also exposes a few hooks used by tests: a counter of dialect
//! sibling lookups and fault injection for saves and reads.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use tokio::sync::OwnedMutexGuard;

use crate::content_version::{sort_lineage_desc, trim_dialect, ContentVersion};
use crate::error::CoreError;
use crate::store::{VersionStore, VersionTransaction};
use crate::types::{ContentId, VersionId};

type Rows = HashMap<VersionId, ContentVersion>;

#[derive(Debug, Default)]
struct Faults {
    /// Fail the n-th save from now (1-based).
    save_countdown: Option<usize>,
    fail_reads: bool,
}

/// A [`VersionStore`] kept in memory.
#[derive(Clone, Default)]
pub struct InMemoryVersionStore {
    rows: Arc<RwLock<Rows>>,
    writer: Arc<tokio::sync::Mutex<()>>,
    faults: Arc<Mutex<Faults>>,
    dialect_queries: Arc<AtomicUsize>,
}

impl InMemoryVersionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a version directly, bypassing transactions.
    pub fn insert(&self, version: ContentVersion) {
        write_rows(&self.rows).insert(version.id, version);
    }

    /// Every stored version, newest first.
    pub fn all(&self) -> Vec<ContentVersion> {
        let mut versions: Vec<ContentVersion> = read_rows(&self.rows).values().cloned().collect();
        sort_lineage_desc(&mut versions);
        versions
    }

    pub fn len(&self) -> usize {
        read_rows(&self.rows).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `find_by_dialect` calls served so far.
    pub fn dialect_query_count(&self) -> usize {
        self.dialect_queries.load(Ordering::SeqCst)
    }

    /// Make the n-th save from now fail with a storage error.
    pub fn fail_on_save(&self, nth: usize) {
        lock_faults(&self.faults).save_countdown = Some(nth.max(1));
    }

    /// Make every read fail with a storage error until reset.
    pub fn set_fail_reads(&self, fail: bool) {
        lock_faults(&self.faults).fail_reads = fail;
    }

    fn check_read(&self) -> Result<(), CoreError> {
        check_read(&self.faults)
    }
}

#[async_trait]
impl VersionStore for InMemoryVersionStore {
    async fn find_latest(
        &self,
        content_id: ContentId,
    ) -> Result<Option<ContentVersion>, CoreError> {
        self.check_read()?;
        Ok(latest_of(read_rows(&self.rows).values(), content_id))
    }

    async fn find_by_id(&self, id: VersionId) -> Result<Option<ContentVersion>, CoreError> {
        self.check_read()?;
        Ok(read_rows(&self.rows).get(&id).cloned())
    }

    async fn find_by_content_id(
        &self,
        content_id: ContentId,
    ) -> Result<Vec<ContentVersion>, CoreError> {
        self.check_read()?;
        Ok(lineage_of(read_rows(&self.rows).values(), content_id))
    }

    async fn find_by_dialect(
        &self,
        dialect: &str,
        exclude_id: VersionId,
        limit: usize,
    ) -> Result<Vec<ContentVersion>, CoreError> {
        self.dialect_queries.fetch_add(1, Ordering::SeqCst);
        self.check_read()?;

        let wanted = trim_dialect(dialect).to_lowercase();
        let mut matches: Vec<ContentVersion> = read_rows(&self.rows)
            .values()
            .filter(|v| v.id != exclude_id)
            .filter(|v| v.dialect().is_some_and(|d| d.to_lowercase() == wanted))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        matches.truncate(limit);
        Ok(matches)
    }

    async fn begin(&self) -> Result<Box<dyn VersionTransaction>, CoreError> {
        let guard = Arc::clone(&self.writer).lock_owned().await;
        Ok(Box::new(InMemoryTransaction {
            rows: Arc::clone(&self.rows),
            faults: Arc::clone(&self.faults),
            staged: Vec::new(),
            _guard: guard,
        }))
    }
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

struct InMemoryTransaction {
    rows: Arc<RwLock<Rows>>,
    faults: Arc<Mutex<Faults>>,
    /// Pending writes in order; `None` marks a removal.
    staged: Vec<(VersionId, Option<ContentVersion>)>,
    _guard: OwnedMutexGuard<()>,
}

impl InMemoryTransaction {
    /// Committed rows overlaid with this transaction's pending writes.
    fn view(&self) -> Rows {
        let mut rows = read_rows(&self.rows).clone();
        apply(&mut rows, &self.staged);
        rows
    }
}

#[async_trait]
impl VersionTransaction for InMemoryTransaction {
    async fn lock_lineage(&mut self, _content_id: ContentId) -> Result<(), CoreError> {
        // Transactions already hold the store-wide writer lock.
        Ok(())
    }

    async fn find_latest(
        &mut self,
        content_id: ContentId,
    ) -> Result<Option<ContentVersion>, CoreError> {
        check_read(&self.faults)?;
        Ok(latest_of(self.view().values(), content_id))
    }

    async fn find_by_id(&mut self, id: VersionId) -> Result<Option<ContentVersion>, CoreError> {
        check_read(&self.faults)?;
        Ok(self.view().remove(&id))
    }

    async fn find_by_content_id(
        &mut self,
        content_id: ContentId,
    ) -> Result<Vec<ContentVersion>, CoreError> {
        check_read(&self.faults)?;
        Ok(lineage_of(self.view().values(), content_id))
    }

    async fn save(&mut self, mut version: ContentVersion) -> Result<ContentVersion, CoreError> {
        {
            let mut faults = lock_faults(&self.faults);
            if let Some(remaining) = faults.save_countdown {
                if remaining <= 1 {
                    faults.save_countdown = None;
                    return Err(CoreError::storage("injected save failure"));
                }
                faults.save_countdown = Some(remaining - 1);
            }
        }

        let view = self.view();
        let number = version.version_number();
        let clash = view.values().any(|other| {
            other.id != version.id
                && other.content_id == version.content_id
                && other.version_number() == number
        });
        if clash {
            return Err(CoreError::storage(format!(
                "duplicate version {number} for content {}",
                version.content_id
            )));
        }

        version.updated_at = chrono::Utc::now();
        if let Some(existing) = view.get(&version.id) {
            version.created_at = existing.created_at;
            if is_unchanged(existing, &version) {
                version.updated_at = existing.updated_at;
            }
        }
        self.staged.push((version.id, Some(version.clone())));
        Ok(version)
    }

    async fn remove(&mut self, id: VersionId) -> Result<bool, CoreError> {
        let existed = self.view().contains_key(&id);
        if existed {
            self.staged.push((id, None));
        }
        Ok(existed)
    }

    async fn commit(self: Box<Self>) -> Result<(), CoreError> {
        let mut rows = write_rows(&self.rows);
        apply(&mut rows, &self.staged);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn apply(rows: &mut Rows, staged: &[(VersionId, Option<ContentVersion>)]) {
    for (id, write) in staged {
        match write {
            Some(version) => {
                rows.insert(*id, version.clone());
            }
            None => {
                rows.remove(id);
            }
        }
    }
}

/// Whether `incoming` differs from `existing` only in `updated_at`.
fn is_unchanged(existing: &ContentVersion, incoming: &ContentVersion) -> bool {
    let mut candidate = incoming.clone();
    candidate.updated_at = existing.updated_at;
    candidate == *existing
}

fn latest_of<'a>(
    versions: impl Iterator<Item = &'a ContentVersion>,
    content_id: ContentId,
) -> Option<ContentVersion> {
    versions
        .filter(|v| v.content_id == content_id)
        .max_by_key(|v| v.version_number())
        .cloned()
}

fn lineage_of<'a>(
    versions: impl Iterator<Item = &'a ContentVersion>,
    content_id: ContentId,
) -> Vec<ContentVersion> {
    let mut lineage: Vec<ContentVersion> = versions
        .filter(|v| v.content_id == content_id)
        .cloned()
        .collect();
    sort_lineage_desc(&mut lineage);
    lineage
}

fn check_read(faults: &Mutex<Faults>) -> Result<(), CoreError> {
    if lock_faults(faults).fail_reads {
        return Err(CoreError::storage("injected read failure"));
    }
    Ok(())
}

fn read_rows(rows: &RwLock<Rows>) -> std::sync::RwLockReadGuard<'_, Rows> {
    rows.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_rows(rows: &RwLock<Rows>) -> std::sync::RwLockWriteGuard<'_, Rows> {
    rows.write().unwrap_or_else(PoisonError::into_inner)
}

fn lock_faults(faults: &Mutex<Faults>) -> std::sync::MutexGuard<'_, Faults> {
    faults.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
