//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.

use std::sync::Arc;

use crate::context::ServerContext;
use crate::tools::{
    CacheBucketsParams, CacheGetParams, CocktailsListParams, OfflineFetchParams, WorkerStatusParams,
    WorkerUpdateParams, cache, cocktails, offline_fetch, worker,
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for spritz.
#[derive(Clone)]
pub struct SpritzServer {
    ctx: Arc<ServerContext>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl SpritzServer {
    pub fn new(ctx: Arc<ServerContext>) -> Self {
        Self { ctx, tool_router: Self::tool_router() }
    }

    /// Send a request through the offline worker.
    ///
    /// GET requests the worker classifies are answered by a caching strategy;
    /// everything else goes to the network as-is.
    #[tool(
        description = "Fetch a URL through the offline caching worker. Returns status, content type, the strategy and bucket used, and the body text."
    )]
    async fn offline_fetch(&self, params: Parameters<OfflineFetchParams>) -> Result<CallToolResult, McpError> {
        offline_fetch::offline_fetch_impl(&self.ctx, params.0).await
    }

    #[tool(description = "List cache buckets with entry counts and whether they belong to the active version.")]
    async fn cache_buckets(&self, params: Parameters<CacheBucketsParams>) -> Result<CallToolResult, McpError> {
        cache::buckets_impl(&self.ctx, params.0).await
    }

    #[tool(description = "Show the stored snapshot metadata for a request (bucket, url, optional method).")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        cache::get_impl(&self.ctx, params.0).await
    }

    #[tool(description = "Report the active and waiting worker versions and the active version's buckets.")]
    async fn worker_status(&self, params: Parameters<WorkerStatusParams>) -> Result<CallToolResult, McpError> {
        worker::status_impl(&self.ctx, params.0).await
    }

    /// Run one update check now instead of waiting for the next poll.
    #[tool(description = "Check for a new worker version now; installs it and reloads when configured to.")]
    async fn worker_update(&self, params: Parameters<WorkerUpdateParams>) -> Result<CallToolResult, McpError> {
        worker::update_impl(&self.ctx, params.0).await
    }

    #[tool(description = "List cocktail records from local persistence, with the dark mode preference.")]
    async fn cocktails_list(&self, params: Parameters<CocktailsListParams>) -> Result<CallToolResult, McpError> {
        cocktails::list_impl(&self.ctx, params.0).await
    }
}

impl ServerHandler for SpritzServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "spritz".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::test_context;

    #[tokio::test]
    async fn test_router_lists_every_tool() {
        let (ctx, _) = test_context().await;
        let server = SpritzServer::new(ctx);

        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();

        assert_eq!(
            names,
            vec!["cache_buckets", "cache_get", "cocktails_list", "offline_fetch", "worker_status", "worker_update"]
        );
    }
}
