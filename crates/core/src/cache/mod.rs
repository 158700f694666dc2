//! Named-bucket response cache.
//!
//! A bucket is a named partition of request-identity → snapshot pairs. The
//! [`CacheStorage`] trait is the seam between the caching worker and the
//! backing store:
//!
//! - [`CacheDb`]: SQLite via tokio-rusqlite, WAL mode, migrations
//! - [`MemoryStorage`]: process-local, for tests and ephemeral hosts
//!
//! Buckets are only ever evicted whole; entries never expire on their own.

pub mod buckets;
pub mod connection;
pub mod hash;
pub mod memory;
pub mod migrations;
pub mod snapshots;

use async_trait::async_trait;

pub use crate::Error;

pub use connection::CacheDb;
pub use hash::compute_cache_key;
pub use memory::MemoryStorage;
pub use snapshots::{EntryMeta, Snapshot};

/// Bucketed key-value store of response snapshots.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open a bucket, creating it when absent. Returns true if it was created.
    async fn open(&self, bucket: &str) -> Result<bool, Error>;

    /// Whether a bucket exists.
    async fn has(&self, bucket: &str) -> Result<bool, Error>;

    /// Every bucket name, in creation order.
    async fn keys(&self) -> Result<Vec<String>, Error>;

    /// Delete a bucket with all of its entries. Returns false if it was absent.
    async fn delete(&self, bucket: &str) -> Result<bool, Error>;

    /// Look up a snapshot by request key. Missing buckets yield `None`.
    async fn get(&self, bucket: &str, key: &str) -> Result<Option<Snapshot>, Error>;

    /// Store a snapshot in `snapshot.bucket`, replacing any entry with the
    /// same key. The bucket is created when missing.
    async fn put(&self, snapshot: &Snapshot) -> Result<(), Error>;

    /// Store a snapshot only if `snapshot.bucket` still exists. Returns
    /// false, writing nothing, when the bucket has been deleted.
    async fn replace(&self, snapshot: &Snapshot) -> Result<bool, Error>;

    /// Summaries of every entry in a bucket.
    async fn entries(&self, bucket: &str) -> Result<Vec<EntryMeta>, Error>;
}

#[async_trait]
impl CacheStorage for CacheDb {
    async fn open(&self, bucket: &str) -> Result<bool, Error> {
        self.open_bucket(bucket).await
    }

    async fn has(&self, bucket: &str) -> Result<bool, Error> {
        self.has_bucket(bucket).await
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.bucket_names().await
    }

    async fn delete(&self, bucket: &str) -> Result<bool, Error> {
        self.delete_bucket(bucket).await
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Option<Snapshot>, Error> {
        self.get_snapshot(bucket, key).await
    }

    async fn put(&self, snapshot: &Snapshot) -> Result<(), Error> {
        self.put_snapshot(snapshot).await
    }

    async fn replace(&self, snapshot: &Snapshot) -> Result<bool, Error> {
        self.replace_snapshot(snapshot).await
    }

    async fn entries(&self, bucket: &str) -> Result<Vec<EntryMeta>, Error> {
        self.list_entries(bucket).await
    }
}
