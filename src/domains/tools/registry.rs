//! Tool Registry - the bound tool set and name-based dispatch.
//!
//! The registry is built once at startup by binding every catalog endpoint
//! that survives the mode and name filters. It is shared read-only by the
//! STDIO/TCP router and the HTTP transport, so every transport exposes the
//! same tools.

use std::collections::HashMap;
use std::sync::Arc;

use regex::{Regex, RegexBuilder};
use rmcp::model::{Tool, ToolAnnotations};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::ToolError;
use super::catalog::{EndpointCatalog, EndpointDescriptor};
use super::executor::CallExecutor;
use super::handlers::{ToolOutput, invoke};
use super::overrides::{CallParams, OverrideRecord, OverrideRegistry};
use super::schema::{ArgumentValidator, EffectiveSchema};
use crate::core::config::ToolsConfig;
use crate::core::graph::ApiClient;

// ============================================================================
// Bound Tool
// ============================================================================

/// One endpoint exposed as a callable tool.
pub struct BoundTool {
    pub endpoint: EndpointDescriptor,
    pub record: Option<Arc<OverrideRecord>>,
    schema: EffectiveSchema,
    description: String,
    validator: Option<ArgumentValidator>,
}

impl BoundTool {
    /// Derive the schema, description and validator for `endpoint`.
    pub fn bind(endpoint: EndpointDescriptor, record: Option<Arc<OverrideRecord>>) -> Self {
        let schema = EffectiveSchema::build(&endpoint, record.as_deref());
        let description = describe(&endpoint, record.as_deref());
        let validator = ArgumentValidator::compile(&endpoint.name, &schema);
        Self {
            endpoint,
            record,
            schema,
            description,
            validator,
        }
    }

    pub fn name(&self) -> &str {
        &self.endpoint.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn schema(&self) -> &EffectiveSchema {
        &self.schema
    }

    /// Whether the tool is advertised as side-effect free.
    pub fn read_only(&self) -> bool {
        self.endpoint.is_get()
    }

    /// Check call arguments against the tool's input schema.
    pub fn validate(&self, args: &CallParams) -> Result<(), ToolError> {
        match &self.validator {
            Some(validator) => validator.validate(&Value::Object(args.clone())),
            None => Ok(()),
        }
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool(&self) -> Tool {
        Tool {
            name: self.endpoint.name.clone().into(),
            description: Some(self.description.clone().into()),
            input_schema: Arc::new(self.schema.to_json_schema()),
            annotations: Some(ToolAnnotations::new().read_only(self.read_only())),
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }
}

/// Visible description: override, then catalog, then a generated fallback.
fn describe(endpoint: &EndpointDescriptor, record: Option<&OverrideRecord>) -> String {
    let base = record
        .and_then(|r| r.description.clone())
        .or_else(|| endpoint.description.clone())
        .unwrap_or_else(|| format!("Execute {} request to {}", endpoint.method, endpoint.path));
    match &endpoint.llm_tip {
        Some(tip) => format!("{}\n\nTIP: {}", base, tip),
        None => base,
    }
}

// ============================================================================
// Tool Registry
// ============================================================================

/// Tool registry - manages all bound tools.
///
/// This struct provides a central point for:
/// - Listing all available tools
/// - Dispatching tool calls by name
pub struct ToolRegistry {
    tools: Vec<Arc<BoundTool>>,
    index: HashMap<String, usize>,
    executor: CallExecutor,
}

impl ToolRegistry {
    /// Bind every eligible catalog endpoint, in catalog order.
    ///
    /// Endpoints are skipped, never rejected: work-scoped endpoints outside
    /// org mode, non-GET endpoints in read-only mode, and names that do not
    /// match the configured filter.
    pub fn bind(
        catalog: &EndpointCatalog,
        overrides: &OverrideRegistry,
        config: &ToolsConfig,
        client: Arc<dyn ApiClient>,
    ) -> Self {
        let filter = config.enabled_tools.as_deref().and_then(compile_filter);

        let mut tools = Vec::new();
        let mut index = HashMap::new();
        for endpoint in catalog.iter() {
            let record = overrides.get(&endpoint.name).cloned();

            if endpoint.requires_org_mode && !config.org_mode {
                debug!("Skipping work-scoped tool {}", endpoint.name);
                continue;
            }
            if config.read_only && !endpoint.is_get() {
                debug!("Skipping {} tool {} in read-only mode", endpoint.method, endpoint.name);
                continue;
            }
            if let Some(filter) = &filter {
                if !filter.is_match(&endpoint.name) {
                    continue;
                }
            }

            index.insert(endpoint.name.clone(), tools.len());
            tools.push(Arc::new(BoundTool::bind(endpoint.clone(), record)));
        }

        info!(
            "Bound {} of {} endpoints as tools (read_only={}, org_mode={})",
            tools.len(),
            catalog.len(),
            config.read_only,
            config.org_mode
        );

        Self {
            tools,
            index,
            executor: CallExecutor::new(client),
        }
    }

    /// Get all tool names, in binding order.
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<BoundTool>> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    pub fn tools(&self) -> impl Iterator<Item = &Arc<BoundTool>> {
        self.tools.iter()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Get all tools as Tool models (metadata).
    ///
    /// This is the single source of truth for all available tools.
    /// Both HTTP and STDIO/TCP transports use this to get tool metadata.
    pub fn get_all_tools(&self) -> Vec<Tool> {
        self.tools.iter().map(|t| t.to_tool()).collect()
    }

    pub fn executor(&self) -> &CallExecutor {
        &self.executor
    }

    /// Dispatch a tool call by name.
    ///
    /// Only an unknown tool or non-object arguments are errors; everything
    /// that happens during the invocation is reported inside the output.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolOutput, ToolError> {
        let Some(tool) = self.get(name) else {
            warn!("Unknown tool requested: {}", name);
            return Err(ToolError::not_found(name));
        };
        let args = match arguments {
            Value::Object(map) => map,
            Value::Null => CallParams::new(),
            other => {
                return Err(ToolError::invalid_arguments(format!(
                    "arguments must be an object, got {}",
                    other
                )));
            }
        };
        Ok(invoke(tool, &self.executor, args).await)
    }
}

/// Compile the name filter; an invalid pattern disables filtering.
fn compile_filter(pattern: &str) -> Option<Regex> {
    match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(regex) => Some(regex),
        Err(e) => {
            warn!("Invalid tool filter '{}', filtering disabled: {}", pattern, e);
            None
        }
    }
}
