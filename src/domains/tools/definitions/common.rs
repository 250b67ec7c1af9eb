//! Common helpers shared across endpoint and override declarations.

use serde_json::{Value, json};

use crate::domains::tools::ToolError;
use crate::domains::tools::catalog::{ParamDecl, ParamSchema};
use crate::domains::tools::overrides::CallParams;

/// Upper bound the API accepts for `$top`.
const MAX_PAGE_SIZE: i64 = 999;

/// OData query options for a list endpoint, exposed under their plain names.
pub fn odata_query(names: &[&str]) -> Vec<ParamDecl> {
    names.iter().map(|name| odata_param(name)).collect()
}

fn odata_param(name: &str) -> ParamDecl {
    let schema = match name {
        "filter" => ParamSchema::string().describe("OData filter expression"),
        "select" => ParamSchema::string().describe("Comma-separated list of properties to return"),
        "expand" => ParamSchema::string().describe("Related entities to expand inline"),
        "orderby" => ParamSchema::string().describe("Property to sort by, e.g. 'receivedDateTime desc'"),
        "search" => ParamSchema::string().describe("Free-text search expression"),
        "top" => ParamSchema::integer().describe("Maximum number of items per page"),
        "skip" => ParamSchema::integer().describe("Number of items to skip"),
        "count" => ParamSchema::boolean().describe("Include the total item count"),
        _ => ParamSchema::any(),
    };
    ParamDecl::query(name).with_schema(schema)
}

/// A required string argument.
pub fn required_str<'a>(params: &'a CallParams, name: &str) -> Result<&'a str, ToolError> {
    params
        .get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ToolError::transform(format!("missing required string '{}'", name)))
}

/// An optional string argument.
pub fn optional_str<'a>(params: &'a CallParams, name: &str) -> Option<&'a str> {
    params.get(name).and_then(Value::as_str)
}

/// A list of strings given either as an array or a comma-separated string.
pub fn string_list(params: &CallParams, name: &str) -> Vec<String> {
    match params.get(name) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Graph recipient objects for a list of addresses.
pub fn recipients(addresses: &[String]) -> Value {
    Value::Array(
        addresses
            .iter()
            .map(|address| json!({ "emailAddress": { "address": address } }))
            .collect(),
    )
}

/// Clamp a page size to the range the API accepts.
pub fn validate_top(top: i64) -> i64 {
    top.clamp(1, MAX_PAGE_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::catalog::ParamLocation;

    fn params(value: Value) -> CallParams {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_odata_query_params() {
        let decls = odata_query(&["filter", "top"]);
        assert_eq!(decls.len(), 2);
        assert!(decls.iter().all(|d| d.location == ParamLocation::Query));
        assert_eq!(decls[1].schema.as_ref().unwrap().json_schema()["type"], "integer");
    }

    #[test]
    fn test_required_str() {
        let p = params(json!({ "a": "x", "b": "", "c": 1 }));
        assert_eq!(required_str(&p, "a").unwrap(), "x");
        assert!(required_str(&p, "b").is_err());
        assert!(required_str(&p, "c").is_err());
        assert!(required_str(&p, "missing").is_err());
    }

    #[test]
    fn test_string_list_accepts_both_forms() {
        let p = params(json!({ "arr": ["a@x.com", "b@x.com"], "csv": "a@x.com, b@x.com," }));
        assert_eq!(string_list(&p, "arr"), vec!["a@x.com", "b@x.com"]);
        assert_eq!(string_list(&p, "csv"), vec!["a@x.com", "b@x.com"]);
        assert!(string_list(&p, "missing").is_empty());
    }

    #[test]
    fn test_recipients_shape() {
        let value = recipients(&["a@x.com".to_string()]);
        assert_eq!(value, json!([{ "emailAddress": { "address": "a@x.com" } }]));
    }

    #[test]
    fn test_validate_top() {
        assert_eq!(validate_top(0), 1);
        assert_eq!(validate_top(-5), 1);
        assert_eq!(validate_top(50), 50);
        assert_eq!(validate_top(5000), 999);
    }
}
