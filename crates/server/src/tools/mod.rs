//! MCP tool implementations.
//!
//! Every tool answers with pretty-printed JSON in a single text block.

pub mod cache;
pub mod cocktails;
pub mod offline_fetch;
pub mod worker;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;
use spritz_core::Error;

pub use cache::{CacheBucketsParams, CacheGetParams};
pub use cocktails::CocktailsListParams;
pub use offline_fetch::OfflineFetchParams;
pub use worker::{WorkerStatusParams, WorkerUpdateParams};

pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Parse a method name, defaulting to GET.
pub(crate) fn parse_method(method: Option<&str>) -> Result<spritz_client::fetch::Method, Error> {
    let name = method.unwrap_or("GET").trim().to_ascii_uppercase();
    spritz_client::fetch::Method::from_bytes(name.as_bytes())
        .map_err(|_| Error::InvalidInput(format!("invalid method: {name}")))
}

#[cfg(test)]
pub(crate) fn output_json(result: &CallToolResult) -> serde_json::Value {
    let content = serde_json::to_value(&result.content[0]).unwrap();
    let text = content.get("text").and_then(|v| v.as_str()).expect("text content");
    serde_json::from_str(text).unwrap()
}
