//! cache_buckets tool implementation.
//!
//! Lists every bucket in the store with its entry count.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::context::ServerContext;
use crate::tools::json_result;

/// Parameters for the cache_buckets tool (none).
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheBucketsParams {}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BucketSummary {
    pub name: String,
    pub entries: usize,
    /// Owned by the active worker version.
    pub current: bool,
}

/// Output from the cache_buckets tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheBucketsOutput {
    pub buckets: Vec<BucketSummary>,
}

pub async fn buckets_impl(ctx: &ServerContext, _params: CacheBucketsParams) -> Result<CallToolResult, McpError> {
    let active = ctx.registration.active().await;

    let mut buckets = Vec::new();
    for name in ctx.storage.keys().await? {
        let entries = ctx.storage.entries(&name).await?.len();
        let current = active.as_ref().is_some_and(|w| w.buckets().is_current(&name));
        buckets.push(BucketSummary { name, entries, current });
    }

    json_result(&CacheBucketsOutput { buckets })
}
