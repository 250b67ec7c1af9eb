//! Graph MCP Server Library
//!
//! This crate exposes a REST API catalog (Microsoft Graph style) as Model
//! Context Protocol tools. Every endpoint descriptor becomes a tool whose
//! input schema is derived from its declared parameters; calls are routed
//! into path, query, header and body, sent through an [`core::graph::ApiClient`],
//! optionally paginated, and normalized into MCP content.
//!
//! # Architecture
//!
//! - **core**: configuration, error handling, the remote API client, the
//!   MCP server handler and its transports
//! - **domains**: business logic organized by bounded contexts
//!   - **tools**: endpoint catalog, overrides, binding, execution and
//!     pagination
//!
//! # Example
//!
//! ```rust,no_run
//! use graph_mcp_server::{core::McpServer, core::Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let server = McpServer::new(config)?;
//!     // Start the server...
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
