//! Endpoint catalog types.
//!
//! An [`EndpointDescriptor`] statically describes one remote API operation:
//! its symbolic tool name, HTTP method, path template and declared
//! parameters. Descriptors are immutable once the catalog is built.

use std::collections::HashSet;

use serde_json::{Map, Value, json};
use tracing::warn;

use super::definitions;

/// The part of an HTTP request a parameter feeds into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamLocation {
    Path,
    Query,
    Body,
    Header,
}

/// A parameter validator, expressed as a JSON Schema fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSchema {
    schema: Value,
    required: bool,
}

impl ParamSchema {
    /// Build a validator from a raw JSON Schema fragment.
    pub fn from_json(schema: Value) -> Self {
        Self {
            schema,
            required: false,
        }
    }

    /// Accepts any value.
    pub fn any() -> Self {
        Self::from_json(json!({}))
    }

    pub fn string() -> Self {
        Self::from_json(json!({ "type": "string" }))
    }

    pub fn integer() -> Self {
        Self::from_json(json!({ "type": "integer" }))
    }

    pub fn boolean() -> Self {
        Self::from_json(json!({ "type": "boolean" }))
    }

    pub fn object() -> Self {
        Self::from_json(json!({ "type": "object" }))
    }

    /// An array whose items match `items`.
    pub fn array(items: ParamSchema) -> Self {
        Self::from_json(json!({ "type": "array", "items": items.schema }))
    }

    /// Mark the parameter as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Attach a human-readable description.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        if let Value::Object(map) = &mut self.schema {
            map.insert("description".to_string(), Value::String(description.into()));
        } else {
            let mut map = Map::new();
            map.insert("description".to_string(), Value::String(description.into()));
            self.schema = Value::Object(map);
        }
        self
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// The JSON Schema fragment for this parameter.
    pub fn json_schema(&self) -> &Value {
        &self.schema
    }
}

/// A parameter declared on an endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    pub name: String,
    pub location: ParamLocation,
    pub schema: Option<ParamSchema>,
}

impl ParamDecl {
    pub fn new(name: impl Into<String>, location: ParamLocation) -> Self {
        Self {
            name: name.into(),
            location,
            schema: None,
        }
    }

    /// A required string path parameter.
    pub fn path(name: impl Into<String>) -> Self {
        Self::new(name, ParamLocation::Path).with_schema(ParamSchema::string().required())
    }

    pub fn query(name: impl Into<String>) -> Self {
        Self::new(name, ParamLocation::Query)
    }

    pub fn body(name: impl Into<String>) -> Self {
        Self::new(name, ParamLocation::Body)
    }

    pub fn header(name: impl Into<String>) -> Self {
        Self::new(name, ParamLocation::Header)
    }

    pub fn with_schema(mut self, schema: ParamSchema) -> Self {
        self.schema = Some(schema);
        self
    }
}

/// Static description of one remote API operation.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointDescriptor {
    /// Symbolic tool name, unique within a catalog.
    pub name: String,
    pub method: String,
    /// Path template with `{name}` or `:name` placeholders.
    pub path: String,
    pub description: Option<String>,
    pub parameters: Vec<ParamDecl>,
    /// Only available when work-scoped (organization) tools are enabled.
    pub requires_org_mode: bool,
    /// Documented to return raw media content.
    pub media_content: bool,
    /// Accepts a `timezone` preference.
    pub supports_timezone: bool,
    /// Extra usage hint appended to the description.
    pub llm_tip: Option<String>,
}

impl EndpointDescriptor {
    pub fn new(name: impl Into<String>, method: &str, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method: method.to_uppercase(),
            path: path.into(),
            description: None,
            parameters: Vec::new(),
            requires_org_mode: false,
            media_content: false,
            supports_timezone: false,
            llm_tip: None,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_param(mut self, param: ParamDecl) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn with_params(mut self, params: impl IntoIterator<Item = ParamDecl>) -> Self {
        self.parameters.extend(params);
        self
    }

    pub fn work_scoped(mut self) -> Self {
        self.requires_org_mode = true;
        self
    }

    pub fn media(mut self) -> Self {
        self.media_content = true;
        self
    }

    pub fn timezone(mut self) -> Self {
        self.supports_timezone = true;
        self
    }

    pub fn tip(mut self, tip: impl Into<String>) -> Self {
        self.llm_tip = Some(tip.into());
        self
    }

    /// Whether this endpoint is a safe read.
    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }

    /// Look up a declared parameter by name.
    pub fn find_param(&self, name: &str) -> Option<&ParamDecl> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// An ordered collection of endpoint descriptors with unique names.
#[derive(Debug, Clone, Default)]
pub struct EndpointCatalog {
    endpoints: Vec<EndpointDescriptor>,
}

impl EndpointCatalog {
    /// Build a catalog, keeping the first descriptor for any repeated name.
    pub fn new(endpoints: Vec<EndpointDescriptor>) -> Self {
        let mut seen = HashSet::new();
        let endpoints = endpoints
            .into_iter()
            .filter(|e| {
                let fresh = seen.insert(e.name.clone());
                if !fresh {
                    warn!("Duplicate endpoint '{}' ignored", e.name);
                }
                fresh
            })
            .collect();
        Self { endpoints }
    }

    /// The catalog of endpoints shipped with the server.
    pub fn builtin() -> Self {
        Self::new(definitions::all_endpoints())
    }

    pub fn iter(&self) -> impl Iterator<Item = &EndpointDescriptor> {
        self.endpoints.iter()
    }

    pub fn get(&self, name: &str) -> Option<&EndpointDescriptor> {
        self.endpoints.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_is_uppercased() {
        let endpoint = EndpointDescriptor::new("list-things", "get", "/things");
        assert_eq!(endpoint.method, "GET");
        assert!(endpoint.is_get());
    }

    #[test]
    fn test_describe_adds_description_to_schema() {
        let schema = ParamSchema::string().describe("An id").required();
        assert_eq!(schema.json_schema()["description"], "An id");
        assert_eq!(schema.json_schema()["type"], "string");
        assert!(schema.is_required());
    }

    #[test]
    fn test_find_param() {
        let endpoint = EndpointDescriptor::new("update-thing", "PATCH", "/things/{id}")
            .with_param(ParamDecl::path("id"))
            .with_param(ParamDecl::body("body"))
            .with_param(ParamDecl::query("select"));
        assert_eq!(endpoint.find_param("body").unwrap().location, ParamLocation::Body);
        assert!(endpoint.find_param("id").is_some());
        assert!(endpoint.find_param("missing").is_none());
    }

    #[test]
    fn test_catalog_keeps_first_duplicate() {
        let catalog = EndpointCatalog::new(vec![
            EndpointDescriptor::new("a", "GET", "/first"),
            EndpointDescriptor::new("a", "GET", "/second"),
            EndpointDescriptor::new("b", "GET", "/b"),
        ]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("a").unwrap().path, "/first");
    }

    #[test]
    fn test_builtin_catalog_names_unique() {
        let catalog = EndpointCatalog::builtin();
        assert!(!catalog.is_empty());
        let names: HashSet<_> = catalog.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names.len(), catalog.len());
    }
}
