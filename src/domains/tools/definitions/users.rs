//! User, directory and Teams endpoints.
//!
//! Everything except `get-current-user` needs an organizational account and
//! is only bound in org mode.

use serde_json::{Value, json};

use super::common::{odata_query, optional_str, required_str};
use crate::domains::tools::ToolError;
use crate::domains::tools::catalog::{EndpointDescriptor, ParamDecl, ParamSchema};
use crate::domains::tools::overrides::{CallParams, OverrideRecord, OverrideRegistry};

pub fn endpoints() -> Vec<EndpointDescriptor> {
    vec![
        EndpointDescriptor::new("get-current-user", "GET", "/me")
            .describe("Get the profile of the signed-in user.")
            .with_params(odata_query(&["select"])),
        EndpointDescriptor::new("list-users", "GET", "/users")
            .describe("List users in the organization directory.")
            .with_param(ParamDecl::header("ConsistencyLevel").with_schema(
                ParamSchema::string().describe("Set to 'eventual' when using search or count"),
            ))
            .with_params(odata_query(&["filter", "select", "top", "search", "orderby", "count"]))
            .work_scoped()
            .tip("search requires the ConsistencyLevel header set to 'eventual'."),
        EndpointDescriptor::new("get-user", "GET", "/users/{user-id}")
            .describe("Get a user by id or user principal name.")
            .with_param(ParamDecl::path("user-id"))
            .with_params(odata_query(&["select"]))
            .work_scoped(),
        EndpointDescriptor::new("get-user-photo", "GET", "/users/{user-id}/photo/$value")
            .describe("Download a user's profile photo.")
            .with_param(ParamDecl::path("user-id"))
            .media()
            .work_scoped(),
        EndpointDescriptor::new(
            "list-team-channels",
            "GET",
            "/teams/{team-id}/channels",
        )
        .describe("List the channels of a team.")
        .with_param(ParamDecl::path("team-id"))
        .with_params(odata_query(&["filter", "select"]))
        .work_scoped(),
        EndpointDescriptor::new(
            "send-channel-message",
            "POST",
            "/teams/{team-id}/channels/{channel-id}/messages",
        )
        .with_param(ParamDecl::path("team-id"))
        .with_param(ParamDecl::path("channel-id"))
        .with_param(ParamDecl::body("body").with_schema(ParamSchema::object()))
        .work_scoped(),
    ]
}

pub fn register_overrides(registry: &mut OverrideRegistry) {
    registry.register(
        "send-channel-message",
        OverrideRecord::new()
            .describe("Post a message to a Teams channel.")
            .field(
                "content",
                ParamSchema::string().describe("Message text").required(),
            )
            .field(
                "contentType",
                ParamSchema::from_json(json!({ "type": "string", "enum": ["text", "html"] })),
            )
            .body_transform(channel_message_body),
    );
}

fn channel_message_body(params: &CallParams) -> Result<Value, ToolError> {
    let content = required_str(params, "content")?;
    let content_type = optional_str(params, "contentType").unwrap_or("text");
    Ok(json!({
        "body": {
            "content": content,
            "contentType": content_type,
        }
    }))
}
