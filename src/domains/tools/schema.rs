//! Effective tool schemas.
//!
//! The schema a tool exposes starts from its declared parameters, gains the
//! adapter's own control fields, drops whatever an override transform takes
//! over, and finally merges the override's fields (override wins).

use std::collections::BTreeMap;

use jsonschema::JSONSchema;
use serde_json::{Map, Value, json};
use tracing::warn;

use super::ToolError;
use super::catalog::{EndpointDescriptor, ParamSchema};
use super::overrides::OverrideRecord;

/// Control flag asking the adapter to follow pagination cursors.
pub const FETCH_ALL_PAGES: &str = "fetchAllPages";

/// Control field carrying the caller's preferred timezone.
pub const TIMEZONE: &str = "timezone";

/// Whether the endpoint takes `timezone` as a preference rather than as one
/// of its own declared parameters.
pub fn uses_timezone_preference(endpoint: &EndpointDescriptor) -> bool {
    endpoint.supports_timezone && endpoint.find_param(TIMEZONE).is_none()
}

/// Whether `name` is an adapter control field for `endpoint`, never sent as
/// a parameter.
pub fn is_reserved(endpoint: &EndpointDescriptor, name: &str) -> bool {
    name == FETCH_ALL_PAGES || (name == TIMEZONE && uses_timezone_preference(endpoint))
}

/// The named inputs a tool accepts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectiveSchema {
    fields: BTreeMap<String, ParamSchema>,
}

impl EffectiveSchema {
    pub fn build(endpoint: &EndpointDescriptor, record: Option<&OverrideRecord>) -> Self {
        let mut fields = BTreeMap::new();

        for param in &endpoint.parameters {
            if record.is_some_and(|r| r.owns_param(param)) {
                continue;
            }
            fields.insert(
                param.name.clone(),
                param.schema.clone().unwrap_or_else(ParamSchema::any),
            );
        }

        if endpoint.is_get() && endpoint.path.contains('/') {
            fields.insert(
                FETCH_ALL_PAGES.to_string(),
                ParamSchema::boolean()
                    .describe("Automatically fetch all pages of results (up to 100 pages)"),
            );
        }

        if uses_timezone_preference(endpoint) {
            fields.insert(
                TIMEZONE.to_string(),
                ParamSchema::string()
                    .describe("IANA or Windows timezone for returned dates, e.g. 'Europe/Paris'"),
            );
        }

        if let Some(extra) = record.and_then(|r| r.schema.as_ref()) {
            for (name, schema) in extra {
                fields.insert(name.clone(), schema.clone());
            }
        }

        Self { fields }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&ParamSchema> {
        self.fields.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Render as a JSON Schema object describing the tool arguments.
    pub fn to_json_schema(&self) -> Map<String, Value> {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, schema)| (name.clone(), schema.json_schema().clone()))
            .collect();
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|(_, schema)| schema.is_required())
            .map(|(name, _)| name.as_str())
            .collect();

        let mut map = Map::new();
        map.insert("type".to_string(), json!("object"));
        map.insert("properties".to_string(), Value::Object(properties));
        if !required.is_empty() {
            map.insert("required".to_string(), json!(required));
        }
        map
    }
}

/// Compiled validator for a tool's arguments.
pub struct ArgumentValidator {
    compiled: JSONSchema,
}

impl ArgumentValidator {
    /// Compile the validator, or `None` if the schema is not valid JSON Schema.
    pub fn compile(tool_name: &str, schema: &EffectiveSchema) -> Option<Self> {
        let document = Value::Object(schema.to_json_schema());
        match JSONSchema::compile(&document) {
            Ok(compiled) => Some(Self { compiled }),
            Err(e) => {
                warn!("Schema for '{}' does not compile, skipping validation: {}", tool_name, e);
                None
            }
        }
    }

    pub fn validate(&self, arguments: &Value) -> Result<(), ToolError> {
        if let Err(errors) = self.compiled.validate(arguments) {
            let messages: Vec<String> = errors
                .take(5)
                .map(|e| {
                    let path = e.instance_path.to_string();
                    if path.is_empty() {
                        e.to_string()
                    } else {
                        format!("{}: {}", path, e)
                    }
                })
                .collect();
            return Err(ToolError::invalid_arguments(messages.join("; ")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::catalog::ParamDecl;

    fn update_event() -> EndpointDescriptor {
        EndpointDescriptor::new("update-event", "PATCH", "/me/events/{event-id}")
            .with_param(ParamDecl::path("event-id"))
            .with_param(ParamDecl::body("subject"))
            .with_param(ParamDecl::body("location"))
            .with_param(ParamDecl::header("Prefer"))
    }

    #[test]
    fn test_mechanical_schema_matches_declared_params() {
        let schema = EffectiveSchema::build(&update_event(), None);
        let names: Vec<_> = schema.names().collect();
        assert_eq!(names, vec!["Prefer", "event-id", "location", "subject"]);
        assert_eq!(schema.get("subject"), Some(&ParamSchema::any()));
    }

    #[test]
    fn test_nested_get_gains_fetch_all_pages() {
        let endpoint = EndpointDescriptor::new("list-messages", "GET", "/me/messages")
            .with_param(ParamDecl::query("top"));
        let schema = EffectiveSchema::build(&endpoint, None);
        assert!(schema.contains(FETCH_ALL_PAGES));
        assert!(schema.contains("top"));
        assert_eq!(schema.len(), 2);

        let post = EndpointDescriptor::new("create-message", "POST", "/me/messages");
        assert!(!EffectiveSchema::build(&post, None).contains(FETCH_ALL_PAGES));
    }

    #[test]
    fn test_body_transform_removes_body_params() {
        let record = OverrideRecord::new().body_transform(|_| Ok(json!({})));
        let schema = EffectiveSchema::build(&update_event(), Some(&record));
        assert!(!schema.contains("subject"));
        assert!(!schema.contains("location"));
        assert!(schema.contains("event-id"));
        assert!(schema.contains("Prefer"));
    }

    #[test]
    fn test_override_fields_merge_and_win() {
        let record = OverrideRecord::new()
            .body_transform(|_| Ok(json!({})))
            .field("subject", ParamSchema::string().required())
            .field("event-id", ParamSchema::integer());
        let schema = EffectiveSchema::build(&update_event(), Some(&record));
        assert_eq!(schema.get("subject"), Some(&ParamSchema::string().required()));
        assert_eq!(schema.get("event-id"), Some(&ParamSchema::integer()));
        assert!(!schema.contains("location"));
    }

    #[test]
    fn test_timezone_field_for_calendar_endpoints() {
        let endpoint = EndpointDescriptor::new("list-events", "GET", "/me/events").timezone();
        let schema = EffectiveSchema::build(&endpoint, None);
        assert!(schema.contains(TIMEZONE));
        assert!(is_reserved(&endpoint, TIMEZONE));
        assert!(is_reserved(&endpoint, FETCH_ALL_PAGES));
        assert!(!is_reserved(&endpoint, "top"));
    }

    #[test]
    fn test_declared_timezone_is_an_ordinary_param() {
        let endpoint = EndpointDescriptor::new("get-schedule", "GET", "/me/schedule")
            .with_param(ParamDecl::query(TIMEZONE).with_schema(ParamSchema::integer()));
        assert!(!is_reserved(&endpoint, TIMEZONE));
        let schema = EffectiveSchema::build(&endpoint, None);
        assert_eq!(schema.get(TIMEZONE), Some(&ParamSchema::integer()));

        let both = endpoint.clone().timezone();
        assert!(!is_reserved(&both, TIMEZONE));
        let schema = EffectiveSchema::build(&both, None);
        assert_eq!(schema.get(TIMEZONE), Some(&ParamSchema::integer()));
    }

    #[test]
    fn test_json_schema_rendering() {
        let rendered = EffectiveSchema::build(&update_event(), None).to_json_schema();
        assert_eq!(rendered["type"], "object");
        assert_eq!(rendered["required"], json!(["event-id"]));
        assert_eq!(rendered["properties"]["event-id"]["type"], "string");
    }

    #[test]
    fn test_validator_reports_missing_and_mistyped() {
        let schema = EffectiveSchema::build(&update_event(), None);
        let validator = ArgumentValidator::compile("update-event", &schema).unwrap();

        assert!(validator.validate(&json!({ "event-id": "AAMk" })).is_ok());
        assert!(validator.validate(&json!({})).is_err());
        let err = validator.validate(&json!({ "event-id": 5 })).unwrap_err();
        assert!(err.to_string().contains("Invalid arguments"));
    }
}
