//! cocktails_list tool implementation.
//!
//! Reads the catalog from record persistence, falling back to the bundled
//! catalog when nothing usable is stored.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use spritz_core::Cocktail;
use spritz_core::records::DARK_MODE_KEY;

use super::json_result;
use crate::context::ServerContext;

/// Parameters for the cocktails_list tool (none).
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CocktailsListParams {}

/// Output from the cocktails_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CocktailsListOutput {
    pub cocktails: Vec<Cocktail>,
    pub dark_mode: bool,
}

pub async fn list_impl(ctx: &ServerContext, _params: CocktailsListParams) -> Result<CallToolResult, McpError> {
    let output = CocktailsListOutput {
        cocktails: ctx.records.load_cocktails().await,
        dark_mode: ctx.records.load_flag(DARK_MODE_KEY).await,
    };
    json_result(&output)
}
