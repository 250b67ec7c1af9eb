//! MCP Server implementation and lifecycle management.
//!
//! This module contains the main server handler that implements the MCP
//! protocol on top of the bound tool set.
//!
//! ## Tool Architecture
//!
//! Tools are not written by hand: every endpoint declared under
//! `domains/tools/definitions/` is bound into a [`ToolRegistry`] at startup.
//! The ToolRouter is then built from that registry in
//! `domains/tools/router.rs`, and the HTTP transport dispatches through the
//! same registry, so both paths expose identical tools.

use rmcp::{ServerHandler, handler::server::tool::ToolRouter, model::*, tool_handler};
use std::sync::Arc;
use tracing::info;

use super::config::Config;
use super::error::Result as CoreResult;
use super::graph::{ApiClient, GraphClient};
use crate::domains::tools::{EndpointCatalog, OverrideRegistry, ToolRegistry, build_tool_router};

/// Usage notes sent to clients on initialization.
pub const INSTRUCTIONS: &str = "Exposes Microsoft Graph REST endpoints as tools. Query options \
     such as filter, select and top are passed without the '$' prefix. Set fetchAllPages on \
     list tools to follow paging links (up to 100 pages).";

/// The main MCP server handler.
///
/// This struct implements the `ServerHandler` trait from rmcp; tool calls
/// are routed to the bound tools.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Bound tools, shared with the HTTP transport.
    registry: Arc<ToolRegistry>,

    /// Tool router for handling tool calls.
    tool_router: ToolRouter<Self>,
}

impl McpServer {
    /// Create a new MCP server talking to the configured remote API.
    pub fn new(config: Config) -> CoreResult<Self> {
        let client = GraphClient::new(&config.graph)?;
        info!("Remote API base URL: {}", config.graph.base_url);
        Ok(Self::with_client(config, Arc::new(client)))
    }

    /// Create a server on top of an arbitrary API client.
    pub fn with_client(config: Config, client: Arc<dyn ApiClient>) -> Self {
        let config = Arc::new(config);
        let registry = Arc::new(ToolRegistry::bind(
            &EndpointCatalog::builtin(),
            &OverrideRegistry::builtin(),
            &config.tools,
            client,
        ));

        Self {
            tool_router: build_tool_router::<Self>(registry.clone()),
            registry,
            config,
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Get the server configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    // ========================================================================
    // HTTP Transport Support Methods
    // ========================================================================

    /// List all available tools (for HTTP transport).
    pub fn list_tools(&self) -> Vec<serde_json::Value> {
        self.tool_router
            .list_all()
            .into_iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name,
                    "description": t.description,
                    "inputSchema": t.input_schema,
                    "annotations": t.annotations,
                })
            })
            .collect()
    }

    /// Call a tool by name (for HTTP transport).
    ///
    /// Errors are reserved for unknown tools and malformed arguments; a
    /// failed remote call is an `isError` result.
    #[cfg(feature = "http")]
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> std::result::Result<serde_json::Value, String> {
        self.registry
            .call_tool(name, arguments)
            .await
            .map(|output| output.to_json())
            .map_err(|e| e.to_string())
    }
}

/// ServerHandler implementation with tool_handler macro for automatic tool routing.
#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::mock::MockClient;

    fn server(org_mode: bool) -> McpServer {
        let mut config = Config::default();
        config.tools.org_mode = org_mode;
        McpServer::with_client(config, Arc::new(MockClient::always("{\"value\":[]}")))
    }

    #[test]
    fn test_list_tools_matches_registry() {
        let server = server(false);
        let tools = server.list_tools();
        assert_eq!(tools.len(), server.registry().len());
        assert!(tools.iter().all(|t| t["inputSchema"]["type"] == "object"));
    }

    #[test]
    fn test_org_mode_adds_tools() {
        assert!(server(true).registry().len() > server(false).registry().len());
    }

    #[test]
    fn test_info_enables_tools_only() {
        let info = server(false).get_info();
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.resources.is_none());
        assert!(info.capabilities.prompts.is_none());
    }

    #[test]
    fn test_new_builds_real_client() {
        assert!(McpServer::new(Config::default()).is_ok());
    }

    #[cfg(feature = "http")]
    #[tokio::test]
    async fn test_call_tool_json() {
        let result = server(false)
            .call_tool("list-mail-messages", serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(result["isError"], false);
        assert_eq!(result["content"][0]["text"], "{\"value\":[]}");

        assert!(server(false).call_tool("nope", serde_json::json!({})).await.is_err());
    }
}
