//! In-memory bucket store.
//!
//! Same contract as the SQLite store, kept in a `HashMap` behind a tokio
//! `RwLock`. Used by tests and by hosts configured with `db_path = ":memory:"`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CacheStorage, EntryMeta, Snapshot};
use crate::Error;

#[derive(Default)]
struct Buckets {
    /// Bucket names in creation order.
    order: Vec<String>,
    entries: HashMap<String, HashMap<String, Snapshot>>,
}

impl Buckets {
    fn open(&mut self, name: &str) -> bool {
        if self.entries.contains_key(name) {
            return false;
        }
        self.order.push(name.to_string());
        self.entries.insert(name.to_string(), HashMap::new());
        true
    }
}

/// Bucket store that lives only as long as the process.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<RwLock<Buckets>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, bucket: &str) -> Result<bool, Error> {
        Ok(self.inner.write().await.open(bucket))
    }

    async fn has(&self, bucket: &str) -> Result<bool, Error> {
        Ok(self.inner.read().await.entries.contains_key(bucket))
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        Ok(self.inner.read().await.order.clone())
    }

    async fn delete(&self, bucket: &str) -> Result<bool, Error> {
        let mut buckets = self.inner.write().await;
        buckets.order.retain(|name| name != bucket);
        Ok(buckets.entries.remove(bucket).is_some())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Option<Snapshot>, Error> {
        let buckets = self.inner.read().await;
        Ok(buckets.entries.get(bucket).and_then(|entries| entries.get(key)).cloned())
    }

    async fn put(&self, snapshot: &Snapshot) -> Result<(), Error> {
        let mut buckets = self.inner.write().await;
        buckets.open(&snapshot.bucket);
        if let Some(entries) = buckets.entries.get_mut(&snapshot.bucket) {
            entries.insert(snapshot.key.clone(), snapshot.clone());
        }
        Ok(())
    }

    async fn replace(&self, snapshot: &Snapshot) -> Result<bool, Error> {
        let mut buckets = self.inner.write().await;
        match buckets.entries.get_mut(&snapshot.bucket) {
            Some(entries) => {
                entries.insert(snapshot.key.clone(), snapshot.clone());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn entries(&self, bucket: &str) -> Result<Vec<EntryMeta>, Error> {
        let buckets = self.inner.read().await;
        let mut metas: Vec<EntryMeta> = buckets
            .entries
            .get(bucket)
            .map(|entries| entries.values().map(Snapshot::meta).collect())
            .unwrap_or_default();
        metas.sort_by(|a, b| a.fetched_at.cmp(&b.fetched_at).then_with(|| a.url.cmp(&b.url)));
        Ok(metas)
    }
}
