//! Invocation pipeline and response normalization.
//!
//! [`invoke`] runs one tool call end to end: argument validation, the call
//! executor, optional pagination, and finally conversion into a
//! [`ToolOutput`]. It is the only place tool errors are caught; every error
//! raised upstream becomes a single error-flagged text item.

use rmcp::model::{CallToolResult, Content, Meta};
use serde_json::{Map, Value, json};
use tracing::{error, instrument};

use super::ToolError;
use super::executor::CallExecutor;
use super::overrides::CallParams;
use super::pagination::{fetch_all_pages, wants_all_pages};
use super::registry::BoundTool;
use crate::core::graph::ApiResponse;

/// The uniform result of a tool invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolOutput {
    /// Ordered text content items.
    pub content: Vec<String>,

    /// Metadata passed through from the client response.
    pub meta: Option<Map<String, Value>>,

    pub is_error: bool,
}

impl ToolOutput {
    pub fn from_response(response: ApiResponse) -> Self {
        Self {
            content: response.content,
            meta: response.meta,
            is_error: response.is_error,
        }
    }

    /// A single structured error item naming the failing tool.
    pub fn failure(tool_name: &str, err: &ToolError) -> Self {
        let message = json!({ "error": format!("Error in tool {}: {}", tool_name, err) });
        Self {
            content: vec![message.to_string()],
            meta: None,
            is_error: true,
        }
    }

    /// Convert into the rmcp result type used by the STDIO/TCP router.
    pub fn into_call_tool_result(self) -> CallToolResult {
        let content = self.content.into_iter().map(Content::text).collect();
        let mut result = if self.is_error {
            CallToolResult::error(content)
        } else {
            CallToolResult::success(content)
        };
        result.meta = self.meta.map(Meta);
        result
    }

    /// JSON-RPC `tools/call` result body, used by the HTTP transport.
    pub fn to_json(&self) -> Value {
        let content: Vec<Value> = self
            .content
            .iter()
            .map(|text| json!({ "type": "text", "text": text }))
            .collect();
        let mut result = json!({
            "content": content,
            "isError": self.is_error,
        });
        if let Some(meta) = &self.meta {
            result["_meta"] = Value::Object(meta.clone());
        }
        result
    }
}

/// Run one invocation of `tool`. Never fails: errors are normalized.
#[instrument(skip_all, fields(tool = %tool.name()))]
pub async fn invoke(tool: &BoundTool, executor: &CallExecutor, args: CallParams) -> ToolOutput {
    match run(tool, executor, args).await {
        Ok(response) => ToolOutput::from_response(response),
        Err(e) => {
            error!("Tool {} failed: {}", tool.name(), e);
            ToolOutput::failure(tool.name(), &e)
        }
    }
}

async fn run(
    tool: &BoundTool,
    executor: &CallExecutor,
    args: CallParams,
) -> Result<ApiResponse, ToolError> {
    tool.validate(&args)?;

    let record = tool.record.as_deref();
    let (request, response) = executor.execute(&tool.endpoint, record, &args).await?;

    if wants_all_pages(&args) && response.is_content_bearing() {
        return Ok(fetch_all_pages(executor, &request, response).await);
    }
    Ok(response)
}
