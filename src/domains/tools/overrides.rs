//! Per-tool overrides.
//!
//! An [`OverrideRecord`] replaces parts of the mechanical parameter mapping
//! for one tool: its description, its input schema, and the construction of
//! the request body, query string or path. Every field is independent; an
//! absent transform keeps the mechanical behavior for that routing class.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use super::ToolError;
use super::catalog::{ParamDecl, ParamLocation, ParamSchema};
use super::definitions;

/// Validated arguments of one tool invocation.
pub type CallParams = Map<String, Value>;

/// Builds the whole request body from the call parameters.
pub type BodyTransform = Arc<dyn Fn(&CallParams) -> Result<Value, ToolError> + Send + Sync>;

/// Builds the whole query mapping, using wire-level keys.
pub type QueryTransform =
    Arc<dyn Fn(&CallParams) -> Result<Vec<(String, String)>, ToolError> + Send + Sync>;

/// Resolves the request path from the template and the call parameters.
pub type PathTransform =
    Arc<dyn Fn(&str, &CallParams) -> Result<String, ToolError> + Send + Sync>;

/// Custom behavior attached to one tool name.
#[derive(Clone, Default)]
pub struct OverrideRecord {
    pub description: Option<String>,
    pub schema: Option<BTreeMap<String, ParamSchema>>,
    pub body: Option<BodyTransform>,
    pub query: Option<QueryTransform>,
    pub path: Option<PathTransform>,
}

impl OverrideRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add one field to the override schema.
    pub fn field(mut self, name: impl Into<String>, schema: ParamSchema) -> Self {
        self.schema
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), schema);
        self
    }

    pub fn body_transform(
        mut self,
        f: impl Fn(&CallParams) -> Result<Value, ToolError> + Send + Sync + 'static,
    ) -> Self {
        self.body = Some(Arc::new(f));
        self
    }

    pub fn query_transform(
        mut self,
        f: impl Fn(&CallParams) -> Result<Vec<(String, String)>, ToolError> + Send + Sync + 'static,
    ) -> Self {
        self.query = Some(Arc::new(f));
        self
    }

    pub fn path_transform(
        mut self,
        f: impl Fn(&str, &CallParams) -> Result<String, ToolError> + Send + Sync + 'static,
    ) -> Self {
        self.path = Some(Arc::new(f));
        self
    }

    /// Whether a transform takes over the given routing class.
    pub fn owns(&self, location: ParamLocation) -> bool {
        match location {
            ParamLocation::Path => self.path.is_some(),
            ParamLocation::Query => self.query.is_some(),
            ParamLocation::Body => self.body.is_some(),
            ParamLocation::Header => false,
        }
    }

    pub fn owns_param(&self, decl: &ParamDecl) -> bool {
        self.owns(decl.location)
    }
}

impl fmt::Debug for OverrideRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverrideRecord")
            .field("description", &self.description)
            .field("schema", &self.schema)
            .field("body", &self.body.is_some())
            .field("query", &self.query.is_some())
            .field("path", &self.path.is_some())
            .finish()
    }
}

/// Lookup from tool name to its override.
///
/// Built once before any tool runs and shared read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct OverrideRegistry {
    records: HashMap<String, Arc<OverrideRecord>>,
}

impl OverrideRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The overrides shipped with the server.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        definitions::register_overrides(&mut registry);
        registry
    }

    /// Register an override. A later registration for the same name
    /// replaces the earlier one, which is returned.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        record: OverrideRecord,
    ) -> Option<Arc<OverrideRecord>> {
        let name = name.into();
        let previous = self.records.insert(name.clone(), Arc::new(record));
        if previous.is_some() {
            debug!("Override for '{}' replaced", name);
        }
        previous
    }

    pub fn get(&self, name: &str) -> Option<&Arc<OverrideRecord>> {
        self.records.get(name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
