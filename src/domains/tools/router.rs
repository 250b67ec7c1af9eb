//! Tool Router - builds the rmcp ToolRouter from the registry.
//!
//! This module builds the ToolRouter for STDIO/TCP transport. Every bound
//! tool gets a dynamic route that runs the same invocation pipeline as the
//! HTTP dispatch in `registry.rs`.

use std::sync::Arc;

use futures::FutureExt;
use rmcp::{
    ErrorData as McpError,
    handler::server::tool::{ToolCallContext, ToolRoute, ToolRouter},
};

use super::handlers::invoke;
use super::registry::{BoundTool, ToolRegistry};

/// Build the tool router with all bound tools.
pub fn build_tool_router<S>(registry: Arc<ToolRegistry>) -> ToolRouter<S>
where
    S: Send + Sync + 'static,
{
    registry
        .tools()
        .fold(ToolRouter::new(), |router, tool| {
            router.with_route(create_route(registry.clone(), tool.clone()))
        })
}

fn create_route<S>(registry: Arc<ToolRegistry>, tool: Arc<BoundTool>) -> ToolRoute<S>
where
    S: Send + Sync + 'static,
{
    ToolRoute::new_dyn(tool.to_tool(), move |ctx: ToolCallContext<'_, S>| {
        let args = ctx.arguments.clone().unwrap_or_default();
        let registry = registry.clone();
        let tool = tool.clone();
        async move {
            let output = invoke(&tool, registry.executor(), args).await;
            Ok::<_, McpError>(output.into_call_tool_result())
        }
        .boxed()
    })
}
