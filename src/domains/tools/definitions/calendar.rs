//! Calendar endpoints.
//!
//! Two overrides: `get-calendar-view` takes a plain `start`/`end` range and
//! builds its own query string, and `create-calendar-event` builds the event
//! payload from flat fields.

use serde_json::{Value, json};

use super::common::{odata_query, optional_str, required_str, string_list, validate_top};
use crate::domains::tools::ToolError;
use crate::domains::tools::catalog::{EndpointDescriptor, ParamDecl, ParamSchema};
use crate::domains::tools::overrides::{CallParams, OverrideRecord, OverrideRegistry};

const DEFAULT_TIME_ZONE: &str = "UTC";

pub fn endpoints() -> Vec<EndpointDescriptor> {
    vec![
        EndpointDescriptor::new("list-calendars", "GET", "/me/calendars")
            .describe("List the calendars of the signed-in user.")
            .with_params(odata_query(&["select", "top"])),
        EndpointDescriptor::new("list-calendar-events", "GET", "/me/events")
            .describe("List events in the signed-in user's default calendar.")
            .with_params(odata_query(&["filter", "select", "orderby", "top", "skip"]))
            .timezone(),
        EndpointDescriptor::new("get-calendar-event", "GET", "/me/events/{event-id}")
            .describe("Get a single calendar event.")
            .with_param(ParamDecl::path("event-id"))
            .with_params(odata_query(&["select"]))
            .timezone(),
        EndpointDescriptor::new("get-calendar-view", "GET", "/me/calendarView")
            .with_param(ParamDecl::query("startDateTime").with_schema(ParamSchema::string().required()))
            .with_param(ParamDecl::query("endDateTime").with_schema(ParamSchema::string().required()))
            .with_params(odata_query(&["select", "top"]))
            .timezone()
            .tip("Recurring events are expanded into occurrences within the range."),
        EndpointDescriptor::new("create-calendar-event", "POST", "/me/events")
            .with_param(ParamDecl::body("body").with_schema(ParamSchema::object())),
        EndpointDescriptor::new("delete-calendar-event", "DELETE", "/me/events/{event-id}")
            .describe("Delete a calendar event.")
            .with_param(ParamDecl::path("event-id")),
    ]
}

pub fn register_overrides(registry: &mut OverrideRegistry) {
    registry.register(
        "get-calendar-view",
        OverrideRecord::new()
            .describe(
                "Get the occurrences, exceptions and single instances of events in the \
                 signed-in user's calendar between two dates.",
            )
            .field(
                "start",
                ParamSchema::string()
                    .describe("Range start, ISO 8601 (e.g. 2024-05-01T00:00:00Z)")
                    .required(),
            )
            .field(
                "end",
                ParamSchema::string()
                    .describe("Range end, ISO 8601")
                    .required(),
            )
            .field("select", ParamSchema::string().describe("Comma-separated properties"))
            .field("top", ParamSchema::integer().describe("Maximum events per page"))
            .query_transform(calendar_view_query),
    );

    registry.register(
        "create-calendar-event",
        OverrideRecord::new()
            .describe("Create an event in the signed-in user's default calendar.")
            .field("subject", ParamSchema::string().required())
            .field("start", ParamSchema::string().describe("Start, ISO 8601 local time").required())
            .field("end", ParamSchema::string().describe("End, ISO 8601 local time").required())
            .field(
                "timeZone",
                ParamSchema::string().describe("Time zone of start/end (default UTC)"),
            )
            .field("location", ParamSchema::string())
            .field("content", ParamSchema::string().describe("Event description"))
            .field(
                "attendees",
                ParamSchema::array(ParamSchema::string()).describe("Attendee email addresses"),
            )
            .body_transform(create_event_body),
    );
}

fn calendar_view_query(params: &CallParams) -> Result<Vec<(String, String)>, ToolError> {
    let mut query = vec![
        ("startDateTime".to_string(), required_str(params, "start")?.to_string()),
        ("endDateTime".to_string(), required_str(params, "end")?.to_string()),
    ];
    if let Some(select) = optional_str(params, "select") {
        query.push(("$select".to_string(), select.to_string()));
    }
    if let Some(top) = params.get("top").and_then(Value::as_i64) {
        query.push(("$top".to_string(), validate_top(top).to_string()));
    }
    Ok(query)
}

fn create_event_body(params: &CallParams) -> Result<Value, ToolError> {
    let time_zone = optional_str(params, "timeZone").unwrap_or(DEFAULT_TIME_ZONE);
    let mut event = json!({
        "subject": required_str(params, "subject")?,
        "start": { "dateTime": required_str(params, "start")?, "timeZone": time_zone },
        "end": { "dateTime": required_str(params, "end")?, "timeZone": time_zone },
    });

    if let Some(location) = optional_str(params, "location") {
        event["location"] = json!({ "displayName": location });
    }
    if let Some(content) = optional_str(params, "content") {
        event["body"] = json!({ "contentType": "Text", "content": content });
    }
    let attendees = string_list(params, "attendees");
    if !attendees.is_empty() {
        event["attendees"] = Value::Array(
            attendees
                .iter()
                .map(|address| {
                    json!({ "emailAddress": { "address": address }, "type": "required" })
                })
                .collect(),
        );
    }
    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::executor::CallExecutor;
    use crate::domains::tools::schema::{EffectiveSchema, TIMEZONE};

    fn params(value: Value) -> CallParams {
        value.as_object().cloned().unwrap_or_default()
    }

    fn lookup(name: &str) -> (EndpointDescriptor, OverrideRecord) {
        let endpoint = endpoints().into_iter().find(|e| e.name == name).unwrap();
        let mut registry = OverrideRegistry::new();
        register_overrides(&mut registry);
        (endpoint, registry.get(name).unwrap().as_ref().clone())
    }

    #[test]
    fn test_calendar_view_schema_uses_plain_range() {
        let (endpoint, record) = lookup("get-calendar-view");
        let schema = EffectiveSchema::build(&endpoint, Some(&record));
        assert!(!schema.contains("startDateTime"));
        assert!(!schema.contains("endDateTime"));
        assert!(schema.get("start").unwrap().is_required());
        assert!(schema.contains(TIMEZONE));
    }

    #[test]
    fn test_calendar_view_request() {
        let (endpoint, record) = lookup("get-calendar-view");
        let request = CallExecutor::prepare(
            &endpoint,
            Some(&record),
            &params(json!({
                "start": "2024-05-01T00:00:00Z",
                "end": "2024-05-02T00:00:00Z",
                "top": 5000,
                "timezone": "UTC",
                "fetchAllPages": true,
            })),
        )
        .unwrap();

        assert_eq!(request.path, "/me/calendarView");
        assert_eq!(
            request.query,
            vec![
                ("startDateTime".to_string(), "2024-05-01T00:00:00Z".to_string()),
                ("endDateTime".to_string(), "2024-05-02T00:00:00Z".to_string()),
                ("$top".to_string(), "999".to_string()),
            ]
        );
        assert_eq!(
            request.options.headers,
            vec![("Prefer".to_string(), "outlook.timezone=\"UTC\"".to_string())]
        );
    }

    #[test]
    fn test_calendar_view_requires_range() {
        assert!(calendar_view_query(&params(json!({ "start": "x" }))).is_err());
    }

    #[test]
    fn test_calendar_view_negative_top_is_clamped() {
        let query = calendar_view_query(&params(json!({
            "start": "2024-05-01T00:00:00Z",
            "end": "2024-05-02T00:00:00Z",
            "top": -5,
        })))
        .unwrap();
        assert_eq!(query.last(), Some(&("$top".to_string(), "1".to_string())));
    }

    #[test]
    fn test_create_event_body() {
        let event = create_event_body(&params(json!({
            "subject": "Sync",
            "start": "2024-05-01T10:00:00",
            "end": "2024-05-01T10:30:00",
            "timeZone": "Europe/Paris",
            "location": "Room 1",
            "attendees": ["a@example.com"],
        })))
        .unwrap();

        assert_eq!(event["start"]["timeZone"], "Europe/Paris");
        assert_eq!(event["location"]["displayName"], "Room 1");
        assert_eq!(event["attendees"][0]["type"], "required");
        assert!(event.get("body").is_none());
    }

    #[test]
    fn test_create_event_defaults_to_utc() {
        let event = create_event_body(&params(json!({
            "subject": "Sync",
            "start": "2024-05-01T10:00:00",
            "end": "2024-05-01T10:30:00",
        })))
        .unwrap();
        assert_eq!(event["end"]["timeZone"], DEFAULT_TIME_ZONE);
    }
}
