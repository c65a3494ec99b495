//! Persistent stores behind the geo-cache.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use domain::models::{CacheLocationMeta, CachedBusinessEntry};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::StoreError;

/// Two logical collections: business entries (by id, indexed by category)
/// and the singleton location meta.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Upserts by id. With `replace`, every other entry is dropped first.
    async fn put_entries(
        &self,
        entries: Vec<CachedBusinessEntry>,
        replace: bool,
    ) -> Result<(), StoreError>;

    async fn entries(&self, category: Option<&str>) -> Result<Vec<CachedBusinessEntry>, StoreError>;

    async fn put_meta(&self, meta: CacheLocationMeta) -> Result<(), StoreError>;

    async fn meta(&self) -> Result<Option<CacheLocationMeta>, StoreError>;

    async fn clear(&self) -> Result<(), StoreError>;
}

/// In-memory contents shared by both store implementations.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CacheSnapshot {
    entries: BTreeMap<Uuid, CachedBusinessEntry>,
    meta: Option<CacheLocationMeta>,
    #[serde(skip)]
    by_category: HashMap<String, BTreeSet<Uuid>>,
}

impl CacheSnapshot {
    fn rebuild_index(&mut self) {
        self.by_category.clear();
        for (id, entry) in &self.entries {
            self.by_category
                .entry(entry.record.category.clone())
                .or_default()
                .insert(*id);
        }
    }

    fn upsert(&mut self, entries: Vec<CachedBusinessEntry>, replace: bool) {
        if replace {
            self.entries.clear();
            self.by_category.clear();
        }
        for entry in entries {
            let id = entry.record.id;
            if let Some(previous) = self.entries.get(&id) {
                if let Some(ids) = self.by_category.get_mut(&previous.record.category) {
                    ids.remove(&id);
                }
            }
            self.by_category
                .entry(entry.record.category.clone())
                .or_default()
                .insert(id);
            self.entries.insert(id, entry);
        }
    }

    fn select(&self, category: Option<&str>) -> Vec<CachedBusinessEntry> {
        match category {
            None => self.entries.values().cloned().collect(),
            Some(category) => self
                .by_category
                .get(category)
                .into_iter()
                .flatten()
                .filter_map(|id| self.entries.get(id).cloned())
                .collect(),
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.by_category.clear();
        self.meta = None;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn lock(snapshot: &Mutex<CacheSnapshot>) -> Result<std::sync::MutexGuard<'_, CacheSnapshot>, StoreError> {
    snapshot.lock().map_err(|_| StoreError::Unavailable)
}

/// Process-lifetime store.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    snapshot: Mutex<CacheSnapshot>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn put_entries(
        &self,
        entries: Vec<CachedBusinessEntry>,
        replace: bool,
    ) -> Result<(), StoreError> {
        lock(&self.snapshot)?.upsert(entries, replace);
        Ok(())
    }

    async fn entries(&self, category: Option<&str>) -> Result<Vec<CachedBusinessEntry>, StoreError> {
        Ok(lock(&self.snapshot)?.select(category))
    }

    async fn put_meta(&self, meta: CacheLocationMeta) -> Result<(), StoreError> {
        lock(&self.snapshot)?.meta = Some(meta);
        Ok(())
    }

    async fn meta(&self) -> Result<Option<CacheLocationMeta>, StoreError> {
        Ok(lock(&self.snapshot)?.meta.clone())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        lock(&self.snapshot)?.clear();
        Ok(())
    }
}

/// JSON snapshot on disk, rewritten after every mutation.
///
/// Writes go to a sibling temp file and are renamed into place.
#[derive(Debug)]
pub struct FileCacheStore {
    path: PathBuf,
    snapshot: tokio::sync::Mutex<CacheSnapshot>,
}

impl FileCacheStore {
    /// Opens `path`, starting empty when the file is missing or unreadable.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let snapshot = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<CacheSnapshot>(&bytes) {
                Ok(mut snapshot) => {
                    snapshot.rebuild_index();
                    debug!(path = %path.display(), entries = snapshot.len(), "Loaded geo-cache");
                    snapshot
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Discarding corrupt geo-cache file");
                    CacheSnapshot::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => CacheSnapshot::default(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            snapshot: tokio::sync::Mutex::new(snapshot),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, snapshot: &CacheSnapshot) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(snapshot)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl CacheStore for FileCacheStore {
    async fn put_entries(
        &self,
        entries: Vec<CachedBusinessEntry>,
        replace: bool,
    ) -> Result<(), StoreError> {
        let mut snapshot = self.snapshot.lock().await;
        let mut next = snapshot.clone();
        next.upsert(entries, replace);
        self.persist(&next).await?;
        *snapshot = next;
        Ok(())
    }

    async fn entries(&self, category: Option<&str>) -> Result<Vec<CachedBusinessEntry>, StoreError> {
        Ok(self.snapshot.lock().await.select(category))
    }

    async fn put_meta(&self, meta: CacheLocationMeta) -> Result<(), StoreError> {
        let mut snapshot = self.snapshot.lock().await;
        let mut next = snapshot.clone();
        next.meta = Some(meta);
        self.persist(&next).await?;
        *snapshot = next;
        Ok(())
    }

    async fn meta(&self) -> Result<Option<CacheLocationMeta>, StoreError> {
        Ok(self.snapshot.lock().await.meta.clone())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut snapshot = self.snapshot.lock().await;
        let mut next = snapshot.clone();
        next.clear();
        self.persist(&next).await?;
        *snapshot = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo_cache::tests::{business, entry};
    use shared::geo::Coordinates;

    #[tokio::test]
    async fn test_category_index_follows_updates() {
        let store = MemoryCacheStore::new();
        let mut cafe = business("Cafe Luna", "cafes");
        store.put_entries(vec![entry(&cafe, 1)], false).await.unwrap();

        cafe.category = "bares".to_string();
        store.put_entries(vec![entry(&cafe, 2)], false).await.unwrap();

        assert!(store.entries(Some("cafes")).await.unwrap().is_empty());
        let bars = store.entries(Some("bares")).await.unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].cached_at, 2);
    }

    #[tokio::test]
    async fn test_replace_drops_other_entries() {
        let store = MemoryCacheStore::new();
        let a = business("A", "cafes");
        let b = business("B", "cafes");
        store.put_entries(vec![entry(&a, 1)], false).await.unwrap();
        store.put_entries(vec![entry(&b, 2)], true).await.unwrap();

        let all = store.entries(None).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].record.id, b.id);
        assert_eq!(store.entries(Some("cafes")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache").join("geo_cache.json");
        let record = business("Panaderia", "panaderias");

        {
            let store = FileCacheStore::open(&path).await.unwrap();
            store
                .put_entries(vec![entry(&record, 10)], false)
                .await
                .unwrap();
            store
                .put_meta(CacheLocationMeta::new(Coordinates::new(20.67, -103.35), 10, 1))
                .await
                .unwrap();
        }

        let reopened = FileCacheStore::open(&path).await.unwrap();
        let entries = reopened.entries(Some("panaderias")).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].record, record);
        assert_eq!(reopened.meta().await.unwrap().unwrap().count, 1);
    }

    #[tokio::test]
    async fn test_file_store_ignores_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("geo_cache.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let store = FileCacheStore::open(&path).await.unwrap();
        assert!(store.entries(None).await.unwrap().is_empty());
        assert!(store.meta().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("geo_cache.json");
        let store = FileCacheStore::open(&path).await.unwrap();
        store
            .put_entries(vec![entry(&business("X", "cafes"), 1)], false)
            .await
            .unwrap();
        store.clear().await.unwrap();

        let reopened = FileCacheStore::open(&path).await.unwrap();
        assert!(reopened.entries(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_leaves_memory_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let cache_dir = dir.path().join("cache");
        let store = FileCacheStore::open(cache_dir.join("geo_cache.json"))
            .await
            .unwrap();
        let kept = business("Cafe Luna", "cafes");
        store.put_entries(vec![entry(&kept, 1)], false).await.unwrap();

        tokio::fs::remove_dir_all(&cache_dir).await.unwrap();

        let dropped = business("Bar Sol", "bares");
        assert!(store
            .put_entries(vec![entry(&dropped, 2)], true)
            .await
            .is_err());
        assert!(store
            .put_meta(CacheLocationMeta::new(Coordinates::new(20.67, -103.35), 2, 1))
            .await
            .is_err());
        assert!(store.clear().await.is_err());

        let entries = store.entries(None).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].record.id, kept.id);
        assert_eq!(store.entries(Some("cafes")).await.unwrap().len(), 1);
        assert!(store.meta().await.unwrap().is_none());
    }
}
