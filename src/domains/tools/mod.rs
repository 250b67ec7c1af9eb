//! Tools domain module.
//!
//! This module exposes a REST endpoint catalog as MCP tools. Each endpoint
//! descriptor becomes one tool whose input schema is derived from the
//! endpoint's declared parameters, optionally reshaped by an override.
//!
//! ## Architecture
//!
//! - `catalog.rs` - Endpoint descriptors and parameter declarations
//! - `params.rs` - Parameter routing and OData name restoration
//! - `overrides.rs` - Per-tool override records and their registry
//! - `schema.rs` - Effective input schema and argument validation
//! - `executor.rs` - Builds and sends the HTTP request for one call
//! - `pagination.rs` - Follows `@odata.nextLink` cursors on request
//! - `handlers.rs` - Invocation pipeline and response normalization
//! - `registry.rs` - Tool binding and HTTP dispatch
//! - `router.rs` - Dynamic ToolRouter builder for STDIO/TCP transport
//! - `definitions/` - Endpoint and override declarations, one file per area
//!
//! ## Adding a New Tool
//!
//! 1. Declare an `EndpointDescriptor` in the matching `definitions/` file
//! 2. Optionally register an `OverrideRecord` for a friendlier schema
//!
//! The binder, router and HTTP dispatch pick it up automatically.

pub mod catalog;
pub mod definitions;
mod error;
pub mod executor;
mod handlers;
pub mod overrides;
pub mod pagination;
pub mod params;
mod registry;
pub mod router;
pub mod schema;

pub use catalog::{EndpointCatalog, EndpointDescriptor, ParamDecl, ParamLocation, ParamSchema};
pub use error::ToolError;
pub use executor::{CallExecutor, PreparedRequest};
pub use handlers::{ToolOutput, invoke};
pub use overrides::{CallParams, OverrideRecord, OverrideRegistry};
pub use registry::{BoundTool, ToolRegistry};
pub use router::build_tool_router;
