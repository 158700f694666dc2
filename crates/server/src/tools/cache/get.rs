//! cache_get tool implementation.
//!
//! Looks up the snapshot stored for one request identity.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use spritz_client::fetch::resolve;
use spritz_core::cache::{EntryMeta, compute_cache_key};
use spritz_core::Error;

use crate::context::ServerContext;
use crate::tools::{json_result, parse_method};

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Bucket name, e.g. `cocktail-app-static-v1.0.0`.
    pub bucket: String,

    /// Absolute URL, or a path resolved against the configured origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default)]
    pub method: Option<String>,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub bucket: String,
    pub entry: EntryMeta,
    pub headers: Vec<(String, String)>,
}

pub async fn get_impl(ctx: &ServerContext, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    if params.bucket.is_empty() {
        return Err(Error::InvalidInput("bucket cannot be empty".into()).into());
    }
    let method = parse_method(params.method.as_deref())?;
    let url = resolve(&ctx.config.origin, &params.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let key = compute_cache_key(method.as_str(), url.as_str());

    let snapshot = ctx
        .storage
        .get(&params.bucket, &key)
        .await?
        .ok_or_else(|| Error::CacheMiss(format!("{method} {url} in {}", params.bucket)))?;

    let output = CacheGetOutput { bucket: params.bucket, entry: snapshot.meta(), headers: snapshot.headers()? };
    json_result(&output)
}
