//! Parameter routing.
//!
//! Each call parameter is routed into one part of an in-progress request
//! according to its declared [`ParamLocation`]. OData system query options
//! (`$filter`, `$select`, ...) cannot be exposed under their real names
//! because tool argument names may not start with `$`; callers use the plain
//! name and the router restores the prefix on the wire.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::{Map, Value};

use super::catalog::{ParamDecl, ParamLocation};

/// Query parameter names that travel on the wire with a `$` prefix.
pub const RESTORED_QUERY_NAMES: &[&str] = &[
    "filter", "select", "expand", "orderby", "skip", "top", "count", "search", "format",
];

const RESTORED_PREFIX: &str = "$";

/// Characters left as-is by `encodeURIComponent`.
const COMPONENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Name of the parameter treated as an opaque request payload.
pub const BODY_PARAM: &str = "body";

/// Wire-level name for a query parameter exposed as `name`.
pub fn restore_query_name(name: &str) -> String {
    let lower = name.to_lowercase();
    if RESTORED_QUERY_NAMES.contains(&lower.as_str()) {
        format!("{RESTORED_PREFIX}{lower}")
    } else {
        name.to_string()
    }
}

/// Percent-encode a value for use as a single path segment.
pub fn encode_path_value(raw: &str) -> String {
    utf8_percent_encode(raw, COMPONENT_ENCODE_SET).to_string()
}

/// Render a parameter value as a query or header string.
///
/// `null` has no string form; arrays are joined with commas.
pub fn stringify_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(stringify_value)
                .collect::<Vec<_>>()
                .join(","),
        ),
        other => Some(other.to_string()),
    }
}

/// The request under construction while parameters are routed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestDraft {
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RequestDraft {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Route one declared parameter.
    pub fn route(&mut self, decl: &ParamDecl, value: &Value) {
        match decl.location {
            ParamLocation::Path => self.substitute_path(&decl.name, value),
            ParamLocation::Query => {
                if let Some(rendered) = stringify_value(value) {
                    set_pair(&mut self.query, restore_query_name(&decl.name), rendered);
                }
            }
            ParamLocation::Header => {
                if let Some(rendered) = stringify_value(value) {
                    set_pair(&mut self.headers, decl.name.clone(), rendered);
                }
            }
            ParamLocation::Body => self.merge_body(&decl.name, value),
        }
    }

    /// Replace `{name}` and `:name` placeholders with the encoded value.
    pub fn substitute_path(&mut self, name: &str, value: &Value) {
        let Some(rendered) = stringify_value(value) else {
            return;
        };
        let encoded = encode_path_value(&rendered);
        let braced = self.path.replace(&format!("{{{name}}}"), &encoded);
        self.path = replace_colon_placeholder(&braced, name, &encoded);
    }

    /// A parameter named `body` is the whole payload; any other body
    /// parameter becomes a field of an object payload.
    pub fn merge_body(&mut self, name: &str, value: &Value) {
        if name == BODY_PARAM {
            self.body = Some(value.clone());
            return;
        }
        match &mut self.body {
            Some(Value::Object(map)) => {
                map.insert(name.to_string(), value.clone());
            }
            _ => {
                let mut map = Map::new();
                map.insert(name.to_string(), value.clone());
                self.body = Some(Value::Object(map));
            }
        }
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        set_pair(&mut self.headers, name.into(), value.into());
    }
}

/// Insert or replace a key in an ordered pair list.
fn set_pair(pairs: &mut Vec<(String, String)>, key: String, value: String) {
    match pairs.iter_mut().find(|(k, _)| *k == key) {
        Some(pair) => pair.1 = value,
        None => pairs.push((key, value)),
    }
}

/// Replace `:name` only where the name ends at an identifier boundary.
fn replace_colon_placeholder(path: &str, name: &str, encoded: &str) -> String {
    let needle = format!(":{name}");
    let mut out = String::with_capacity(path.len());
    let mut rest = path;

    while let Some(idx) = rest.find(&needle) {
        let after = &rest[idx + needle.len()..];
        let at_boundary = after
            .chars()
            .next()
            .is_none_or(|c| !(c.is_alphanumeric() || c == '_'));
        out.push_str(&rest[..idx]);
        out.push_str(if at_boundary { encoded } else { &needle });
        rest = after;
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_restore_query_name() {
        assert_eq!(restore_query_name("filter"), "$filter");
        assert_eq!(restore_query_name("OrderBy"), "$orderby");
        assert_eq!(restore_query_name("top"), "$top");
        assert_eq!(restore_query_name("startDateTime"), "startDateTime");
    }

    #[test]
    fn test_encode_path_value() {
        assert_eq!(encode_path_value("abc-123_x.y"), "abc-123_x.y");
        assert_eq!(encode_path_value("a b/c"), "a%20b%2Fc");
        assert_eq!(encode_path_value("a+b="), "a%2Bb%3D");
        assert_eq!(encode_path_value("a b~!*'()/@"), "a%20b~!*'()%2F%40");
        assert_eq!(encode_path_value("é"), "%C3%A9");
    }

    #[test]
    fn test_substitute_both_placeholder_forms() {
        let mut draft = RequestDraft::new("/users/{id}/items/:id");
        draft.substitute_path("id", &json!("a b"));
        assert_eq!(draft.path, "/users/a%20b/items/a%20b");

        // Idempotent once resolved.
        draft.substitute_path("id", &json!("other"));
        assert_eq!(draft.path, "/users/a%20b/items/a%20b");
    }

    #[test]
    fn test_colon_placeholder_respects_boundary() {
        let mut draft = RequestDraft::new("/things/:id/:identity");
        draft.substitute_path("id", &json!(7));
        assert_eq!(draft.path, "/things/7/:identity");
    }

    #[test]
    fn test_route_query_restores_prefix() {
        let mut draft = RequestDraft::new("/me/messages");
        draft.route(&ParamDecl::query("filter"), &json!("isRead eq false"));
        draft.route(&ParamDecl::query("select"), &json!(["subject", "from"]));
        draft.route(&ParamDecl::query("top"), &json!(5));
        draft.route(&ParamDecl::query("startDateTime"), &json!("2024-01-01"));
        assert_eq!(
            draft.query,
            vec![
                ("$filter".to_string(), "isRead eq false".to_string()),
                ("$select".to_string(), "subject,from".to_string()),
                ("$top".to_string(), "5".to_string()),
                ("startDateTime".to_string(), "2024-01-01".to_string()),
            ]
        );
    }

    #[test]
    fn test_route_skips_null() {
        let mut draft = RequestDraft::new("/x/{id}");
        draft.route(&ParamDecl::query("top"), &Value::Null);
        draft.route(&ParamDecl::path("id"), &Value::Null);
        assert!(draft.query.is_empty());
        assert_eq!(draft.path, "/x/{id}");
    }

    #[test]
    fn test_route_header_replaces_existing() {
        let mut draft = RequestDraft::new("/x");
        draft.route(&ParamDecl::header("ConsistencyLevel"), &json!("eventual"));
        draft.route(&ParamDecl::header("ConsistencyLevel"), &json!("strong"));
        assert_eq!(
            draft.headers,
            vec![("ConsistencyLevel".to_string(), "strong".to_string())]
        );
    }

    #[test]
    fn test_route_body_whole_and_merged() {
        let mut draft = RequestDraft::new("/x");
        draft.route(&ParamDecl::body("subject"), &json!("hi"));
        draft.route(&ParamDecl::body("importance"), &json!("high"));
        assert_eq!(
            draft.body,
            Some(json!({ "subject": "hi", "importance": "high" }))
        );

        draft.route(&ParamDecl::body("body"), &json!({ "replaced": true }));
        assert_eq!(draft.body, Some(json!({ "replaced": true })));
    }

    #[test]
    fn test_stringify_value() {
        assert_eq!(stringify_value(&json!(true)).as_deref(), Some("true"));
        assert_eq!(stringify_value(&json!("s")).as_deref(), Some("s"));
        assert_eq!(stringify_value(&json!([1, "a"])).as_deref(), Some("1,a"));
        assert_eq!(stringify_value(&Value::Null), None);
    }
}
