//! offline_fetch tool implementation.
//!
//! Sends a request through the registration exactly as the app would: the
//! active worker intercepts it when it classifies, otherwise it goes to the
//! network untouched.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use spritz_client::{Request, fetch::resolve};
use spritz_core::Error;

use super::{json_result, parse_method};
use crate::context::ServerContext;

/// Parameters for the offline_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OfflineFetchParams {
    /// Absolute URL, or a path such as `/index.html` resolved against the
    /// configured origin.
    pub url: String,

    /// HTTP method (default: GET). Only GET requests are ever cached.
    #[serde(default)]
    pub method: Option<String>,
}

/// Output from the offline_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OfflineFetchOutput {
    pub url: String,
    pub method: String,
    pub status: u16,
    pub content_type: Option<String>,
    /// Strategy that answered, absent when the request passed through.
    pub strategy: Option<String>,
    /// Bucket the strategy used.
    pub bucket: Option<String>,
    pub bytes: usize,
    /// Body decoded as UTF-8, lossy.
    pub body: String,
}

pub async fn offline_fetch_impl(ctx: &ServerContext, params: OfflineFetchParams) -> Result<CallToolResult, McpError> {
    let method = parse_method(params.method.as_deref())?;
    let url = resolve(&ctx.config.origin, &params.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let request = Request::new(method, url);

    let route = match ctx.registration.active().await {
        Some(worker) => worker.route(&request).map(|r| (r.strategy.as_str().to_string(), r.bucket.to_string())),
        None => None,
    };

    let response = ctx.registration.fetch(&request).await.map_err(|e| Error::HttpError(e.to_string()))?;

    let (strategy, bucket) = route.unzip();
    let output = OfflineFetchOutput {
        url: request.url.to_string(),
        method: request.method.to_string(),
        status: response.status.as_u16(),
        content_type: response.content_type().map(str::to_string),
        strategy,
        bucket,
        bytes: response.bytes.len(),
        body: response.text(),
    };
    json_result(&output)
}
