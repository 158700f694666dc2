//! Test doubles for the worker: a scripted network and a broken store.

use crate::fetch::{FetchError, Fetcher, Request, Response};
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{self, HeaderMap, HeaderValue};
use spritz_core::cache::EntryMeta;
use spritz_core::{CacheStorage, Error, Snapshot};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

/// Fetcher answering from a URL → (status, body) table.
///
/// Unknown URLs answer 404. While offline every fetch fails.
pub(crate) struct ScriptedFetcher {
    routes: Mutex<HashMap<String, (u16, Vec<u8>)>>,
    calls: Mutex<Vec<String>>,
    online: AtomicBool,
    gate: Arc<RwLock<()>>,
}

impl ScriptedFetcher {
    pub(crate) fn new() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            online: AtomicBool::new(true),
            gate: Arc::new(RwLock::new(())),
        }
    }

    pub(crate) fn respond(&self, url: &str, status: u16, body: &str) {
        self.routes.lock().unwrap().insert(url.to_string(), (status, body.as_bytes().to_vec()));
    }

    pub(crate) fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub(crate) fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| u.as_str() == url).count()
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Block every fetch until the returned guard is dropped.
    pub(crate) async fn hold(&self) -> OwnedRwLockWriteGuard<()> {
        self.gate.clone().write_owned().await
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        let _pass = self.gate.read().await;
        self.calls.lock().unwrap().push(request.url.to_string());

        if !self.online.load(Ordering::SeqCst) {
            return Err(FetchError::Unreachable(request.url.to_string()));
        }

        let route = self.routes.lock().unwrap().get(request.url.as_str()).cloned();
        let (status, body) = route.unwrap_or((404, b"not found".to_vec()));
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        Ok(Response::new(request.url.clone(), StatusCode::from_u16(status).unwrap(), headers, body))
    }
}

/// Storage whose every operation fails.
pub(crate) struct FailingStorage;

fn unavailable() -> Error {
    Error::CorruptSnapshot("storage unavailable".into())
}

#[async_trait]
impl CacheStorage for FailingStorage {
    async fn open(&self, _bucket: &str) -> Result<bool, Error> {
        Err(unavailable())
    }

    async fn has(&self, _bucket: &str) -> Result<bool, Error> {
        Err(unavailable())
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        Err(unavailable())
    }

    async fn delete(&self, _bucket: &str) -> Result<bool, Error> {
        Err(unavailable())
    }

    async fn get(&self, _bucket: &str, _key: &str) -> Result<Option<Snapshot>, Error> {
        Err(unavailable())
    }

    async fn put(&self, _snapshot: &Snapshot) -> Result<(), Error> {
        Err(unavailable())
    }

    async fn replace(&self, _snapshot: &Snapshot) -> Result<bool, Error> {
        Err(unavailable())
    }

    async fn entries(&self, _bucket: &str) -> Result<Vec<EntryMeta>, Error> {
        Err(unavailable())
    }
}

/// Poll until a stored entry carries `body`, yielding to background tasks.
pub(crate) async fn wait_for_body(storage: &dyn CacheStorage, bucket: &str, key: &str, body: &[u8]) -> bool {
    for _ in 0..200 {
        if let Ok(Some(snapshot)) = storage.get(bucket, key).await
            && snapshot.body == body
        {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}
