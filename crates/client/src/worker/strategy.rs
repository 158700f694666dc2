//! The three caching strategies.
//!
//! Every strategy turns a request into a response and never fails: network
//! errors and cache I/O errors both degrade to the fallback path, which ends
//! in a synthetic 503 when nothing else can answer.

use crate::fetch::{Fetcher, Request, Response};
use spritz_core::{CacheStorage, Error};
use std::sync::Arc;

/// Body of the cache-first fallback response.
pub const OFFLINE_BODY: &str = "Offline";

/// Body of the stale-while-revalidate fallback response.
pub const IMAGE_OFFLINE_BODY: &str = "Image not available offline";

/// Body of the network-first fallback response.
pub const CONTENT_OFFLINE_BODY: &str = "Offline - content not available";

const TEXT_PLAIN: &str = "text/plain";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    CacheFirst,
    StaleWhileRevalidate,
    NetworkFirst,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::CacheFirst => "cache-first",
            Strategy::StaleWhileRevalidate => "stale-while-revalidate",
            Strategy::NetworkFirst => "network-first",
        }
    }
}

/// Runs strategies against a storage backend and a fetcher.
#[derive(Clone)]
pub struct StrategyEngine {
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
}

impl StrategyEngine {
    pub fn new(storage: Arc<dyn CacheStorage>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self { storage, fetcher }
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    pub async fn run(&self, strategy: Strategy, request: &Request, bucket: &str) -> Response {
        match strategy {
            Strategy::CacheFirst => self.cache_first(request, bucket).await,
            Strategy::StaleWhileRevalidate => self.stale_while_revalidate(request, bucket).await,
            Strategy::NetworkFirst => self.network_first(request, bucket).await,
        }
    }

    /// Serve from the bucket when possible; otherwise fetch and store.
    pub async fn cache_first(&self, request: &Request, bucket: &str) -> Response {
        if let Some(cached) = self.lookup(bucket, request).await {
            tracing::debug!(url = %request.url, bucket, "cache hit");
            return cached;
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_success() {
                    self.store(bucket, request, &response).await;
                }
                response
            }
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "fetch failed, rechecking cache");
                // another task may have populated the entry meanwhile
                match self.lookup(bucket, request).await {
                    Some(cached) => cached,
                    None => Response::offline(&request.url, OFFLINE_BODY, None),
                }
            }
        }
    }

    /// Serve the cached entry immediately and refresh it in the background.
    ///
    /// On a miss the caller waits for the refresh instead.
    pub async fn stale_while_revalidate(&self, request: &Request, bucket: &str) -> Response {
        let cached = self.lookup(bucket, request).await;

        let engine = self.clone();
        let owned_request = request.clone();
        let owned_bucket = bucket.to_string();
        let refresh = tokio::spawn(async move { engine.revalidate(&owned_request, &owned_bucket).await });

        if let Some(cached) = cached {
            tracing::debug!(url = %request.url, bucket, "serving stale entry while revalidating");
            return cached;
        }

        match refresh.await {
            Ok(Some(response)) => response,
            Ok(None) => Response::offline(&request.url, IMAGE_OFFLINE_BODY, Some(TEXT_PLAIN)),
            Err(e) => {
                tracing::error!(url = %request.url, error = %e, "revalidation task failed");
                Response::offline(&request.url, IMAGE_OFFLINE_BODY, Some(TEXT_PLAIN))
            }
        }
    }

    /// Prefer the network; the bucket is only a fallback.
    pub async fn network_first(&self, request: &Request, bucket: &str) -> Response {
        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_success() {
                    self.store(bucket, request, &response).await;
                }
                response
            }
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "fetch failed, falling back to cache");
                match self.lookup(bucket, request).await {
                    Some(cached) => cached,
                    None => Response::offline(&request.url, CONTENT_OFFLINE_BODY, Some(TEXT_PLAIN)),
                }
            }
        }
    }

    /// Fetch `request` and store it, requiring a successful status.
    ///
    /// Unlike the strategies this reports failure, so install can log which
    /// seeds were not stored.
    pub async fn add(&self, request: &Request, bucket: &str) -> Result<(), Error> {
        let response = self.fetcher.fetch(request).await.map_err(|e| Error::HttpError(e.to_string()))?;
        if !response.is_success() {
            return Err(Error::HttpError(format!("{} returned {}", request.url, response.status)));
        }
        let snapshot = response.to_snapshot(bucket, request)?;
        self.storage.put(&snapshot).await
    }

    async fn revalidate(&self, request: &Request, bucket: &str) -> Option<Response> {
        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_success() {
                    self.store(bucket, request, &response).await;
                }
                Some(response)
            }
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "background revalidation failed");
                None
            }
        }
    }

    /// Read failures count as a miss.
    async fn lookup(&self, bucket: &str, request: &Request) -> Option<Response> {
        let snapshot = match self.storage.get(bucket, &request.cache_key()).await {
            Ok(snapshot) => snapshot?,
            Err(e) => {
                tracing::warn!(bucket, url = %request.url, error = %e, "cache read failed");
                return None;
            }
        };

        match Response::from_snapshot(&snapshot) {
            Ok(response) => Some(response),
            Err(e) => {
                tracing::warn!(bucket, url = %request.url, error = %e, "discarding unreadable cache entry");
                None
            }
        }
    }

    /// Write failures are logged and otherwise ignored. A bucket deleted
    /// meanwhile, by activation of a newer version, is not recreated.
    async fn store(&self, bucket: &str, request: &Request, response: &Response) {
        let result = match response.to_snapshot(bucket, request) {
            Ok(snapshot) => self.storage.replace(&snapshot).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(true) => {}
            Ok(false) => tracing::debug!(bucket, url = %request.url, "bucket no longer exists, response not stored"),
            Err(e) => tracing::warn!(bucket, url = %request.url, error = %e, "cache write failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::testing::{FailingStorage, ScriptedFetcher, wait_for_body};
    use reqwest::{StatusCode, Url};
    use spritz_core::MemoryStorage;

    const STATIC: &str = "app-static-v1";
    const IMAGES: &str = "app-images-v1";

    fn request(url: &str) -> Request {
        Request::get(Url::parse(url).unwrap())
    }

    /// Engine over a store where the static and image buckets exist.
    async fn engine(fetcher: &Arc<ScriptedFetcher>) -> (StrategyEngine, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        storage.open(STATIC).await.unwrap();
        storage.open(IMAGES).await.unwrap();
        (StrategyEngine::new(storage.clone(), fetcher.clone()), storage)
    }

    #[tokio::test]
    async fn test_cache_first_second_request_skips_network() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond("http://localhost/app.css", 200, "body{}");
        let (engine, _) = engine(&fetcher).await;
        let req = request("http://localhost/app.css");

        let first = engine.cache_first(&req, STATIC).await;
        let second = engine.cache_first(&req, STATIC).await;

        assert_eq!(first.text(), "body{}");
        assert_eq!(second.text(), "body{}");
        assert_eq!(fetcher.calls_to("http://localhost/app.css"), 1);
    }

    #[tokio::test]
    async fn test_cache_first_offline_without_entry() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.set_online(false);
        let (engine, _) = engine(&fetcher).await;

        let response = engine.cache_first(&request("http://localhost/app.css"), STATIC).await;

        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.text(), OFFLINE_BODY);
        assert!(response.content_type().is_none());
    }

    #[tokio::test]
    async fn test_cache_first_does_not_store_errors() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond("http://localhost/missing.js", 404, "nope");
        let (engine, storage) = engine(&fetcher).await;
        let req = request("http://localhost/missing.js");

        let response = engine.cache_first(&req, STATIC).await;

        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(storage.get(STATIC, &req.cache_key()).await.unwrap(), None);
        engine.cache_first(&req, STATIC).await;
        assert_eq!(fetcher.calls_to("http://localhost/missing.js"), 2);
    }

    #[tokio::test]
    async fn test_swr_miss_waits_for_network_and_stores() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond("http://localhost/logo.png", 200, "png-v1");
        let (engine, storage) = engine(&fetcher).await;
        let req = request("http://localhost/logo.png");

        let response = engine.stale_while_revalidate(&req, IMAGES).await;

        assert_eq!(response.text(), "png-v1");
        let stored = storage.get(IMAGES, &req.cache_key()).await.unwrap().unwrap();
        assert_eq!(stored.body, b"png-v1");
    }

    #[tokio::test]
    async fn test_swr_hit_returns_without_waiting_then_refreshes() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond("http://localhost/logo.png", 200, "png-v1");
        let (engine, storage) = engine(&fetcher).await;
        let req = request("http://localhost/logo.png");
        engine.stale_while_revalidate(&req, IMAGES).await;

        fetcher.respond("http://localhost/logo.png", 200, "png-v2");
        let hold = fetcher.hold().await;
        let response = engine.stale_while_revalidate(&req, IMAGES).await;
        assert_eq!(response.text(), "png-v1");

        drop(hold);
        assert!(wait_for_body(storage.as_ref(), IMAGES, &req.cache_key(), b"png-v2").await);
    }

    #[tokio::test]
    async fn test_swr_offline_without_entry() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.set_online(false);
        let (engine, _) = engine(&fetcher).await;

        let response = engine.stale_while_revalidate(&request("http://localhost/a.webp"), IMAGES).await;

        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.text(), IMAGE_OFFLINE_BODY);
        assert_eq!(response.content_type(), Some("text/plain"));
    }

    #[tokio::test]
    async fn test_network_first_stores_and_falls_back() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond("http://localhost/api/cocktails", 200, "[1]");
        let (engine, storage) = engine(&fetcher).await;
        let req = request("http://localhost/api/cocktails");

        let online = engine.network_first(&req, STATIC).await;
        assert_eq!(online.text(), "[1]");
        assert!(storage.get(STATIC, &req.cache_key()).await.unwrap().is_some());

        fetcher.respond("http://localhost/api/cocktails", 200, "[1,2]");
        assert_eq!(engine.network_first(&req, STATIC).await.text(), "[1,2]");

        fetcher.set_online(false);
        let offline = engine.network_first(&req, STATIC).await;
        assert_eq!(offline.status, StatusCode::OK);
        assert_eq!(offline.text(), "[1,2]");
    }

    #[tokio::test]
    async fn test_network_first_offline_without_entry() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.set_online(false);
        let (engine, _) = engine(&fetcher).await;

        let response = engine.network_first(&request("http://localhost/api/x"), STATIC).await;

        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.text(), CONTENT_OFFLINE_BODY);
        assert_eq!(response.content_type(), Some("text/plain"));
    }

    #[tokio::test]
    async fn test_storage_failure_degrades_to_network() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond("http://localhost/app.js", 200, "js");
        let engine = StrategyEngine::new(Arc::new(FailingStorage), fetcher.clone());

        let response = engine.cache_first(&request("http://localhost/app.js"), STATIC).await;
        assert_eq!(response.text(), "js");

        fetcher.set_online(false);
        let offline = engine.cache_first(&request("http://localhost/app.js"), STATIC).await;
        assert_eq!(offline.text(), OFFLINE_BODY);
    }

    #[tokio::test]
    async fn test_add_rejects_unsuccessful_status() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond("http://localhost/index.html", 500, "boom");
        let (engine, storage) = engine(&fetcher).await;

        let result = engine.add(&request("http://localhost/index.html"), STATIC).await;

        assert!(matches!(result, Err(Error::HttpError(_))));
        assert!(storage.entries(STATIC).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cache_first_rechecks_bucket_after_fetch_failure() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.set_online(false);
        let (engine, storage) = engine(&fetcher).await;
        let req = request("http://localhost/app.css");

        let hold = fetcher.hold().await;
        let pending = {
            let engine = engine.clone();
            let req = req.clone();
            tokio::spawn(async move { engine.cache_first(&req, STATIC).await })
        };
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        let concurrent = Response::new(req.url.clone(), StatusCode::OK, Default::default(), "written meanwhile");
        storage.put(&concurrent.to_snapshot(STATIC, &req).unwrap()).await.unwrap();
        drop(hold);

        let response = pending.await.unwrap();
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.text(), "written meanwhile");
        assert_eq!(fetcher.calls_to("http://localhost/app.css"), 1);
    }

    #[tokio::test]
    async fn test_store_skips_deleted_bucket() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond("http://localhost/api/x", 200, "fresh");
        let (engine, storage) = engine(&fetcher).await;
        storage.delete(STATIC).await.unwrap();

        let response = engine.network_first(&request("http://localhost/api/x"), STATIC).await;

        assert_eq!(response.text(), "fresh");
        assert!(!storage.has(STATIC).await.unwrap());
    }
}
