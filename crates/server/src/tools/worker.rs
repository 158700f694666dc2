//! worker_status and worker_update tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use spritz_client::UpdateOutcome;

use super::json_result;
use crate::context::ServerContext;

/// Parameters for the worker_status tool (none).
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct WorkerStatusParams {}

/// Output from the worker_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerStatusOutput {
    /// Version controlling requests, absent when requests pass through.
    pub active_version: Option<String>,
    pub active_state: Option<String>,
    /// Version installed and waiting for a reload.
    pub waiting_version: Option<String>,
    /// Buckets owned by the active version.
    pub buckets: Vec<String>,
}

pub async fn status_impl(ctx: &ServerContext, _params: WorkerStatusParams) -> Result<CallToolResult, McpError> {
    let (active_version, active_state, buckets) = match ctx.registration.active().await {
        Some(worker) => (
            Some(worker.version().to_string()),
            Some(worker.state().await.to_string()),
            worker.buckets().current().into_iter().map(str::to_string).collect(),
        ),
        None => (None, None, Vec::new()),
    };

    let output = WorkerStatusOutput {
        active_version,
        active_state,
        waiting_version: ctx.registration.waiting_version().await,
        buckets,
    };
    json_result(&output)
}

/// Parameters for the worker_update tool (none).
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct WorkerUpdateParams {}

pub async fn update_impl(ctx: &ServerContext, _params: WorkerUpdateParams) -> Result<CallToolResult, McpError> {
    let outcome: UpdateOutcome = ctx.registration.update(ctx.updates.as_ref(), ctx.prompt.as_ref()).await?;
    json_result(&outcome)
}
