//! Mail endpoints.
//!
//! `send-mail` is overridden: instead of a raw Graph message payload the
//! tool accepts flat fields (`to`, `subject`, `content`, ...) and builds the
//! message body itself.

use serde_json::{Value, json};

use super::common::{odata_query, optional_str, recipients, required_str, string_list};
use crate::domains::tools::ToolError;
use crate::domains::tools::catalog::{EndpointDescriptor, ParamDecl, ParamSchema};
use crate::domains::tools::overrides::{CallParams, OverrideRecord, OverrideRegistry};

const LIST_QUERY: &[&str] = &["filter", "select", "orderby", "top", "skip", "search", "count"];

pub fn endpoints() -> Vec<EndpointDescriptor> {
    vec![
        EndpointDescriptor::new("list-mail-messages", "GET", "/me/messages")
            .describe("List messages in the signed-in user's mailbox.")
            .with_params(odata_query(LIST_QUERY))
            .tip("Use select to return only the fields you need; message bodies are large."),
        EndpointDescriptor::new("list-mail-folders", "GET", "/me/mailFolders")
            .describe("List the mail folders of the signed-in user.")
            .with_params(odata_query(&["filter", "select", "top"])),
        EndpointDescriptor::new(
            "list-mail-folder-messages",
            "GET",
            "/me/mailFolders/{mailFolder-id}/messages",
        )
        .describe("List messages in a mail folder.")
        .with_param(ParamDecl::path("mailFolder-id"))
        .with_params(odata_query(LIST_QUERY)),
        EndpointDescriptor::new("get-mail-message", "GET", "/me/messages/{message-id}")
            .describe("Get a single message.")
            .with_param(ParamDecl::path("message-id"))
            .with_params(odata_query(&["select", "expand"])),
        EndpointDescriptor::new(
            "get-mail-message-mime",
            "GET",
            "/me/messages/{message-id}/$value",
        )
        .describe("Get the MIME content of a message.")
        .with_param(ParamDecl::path("message-id")),
        EndpointDescriptor::new("send-mail", "POST", "/me/sendMail")
            .with_param(ParamDecl::body("body").with_schema(ParamSchema::object())),
        EndpointDescriptor::new("update-mail-message", "PATCH", "/me/messages/{message-id}")
            .describe("Update properties of a message.")
            .with_param(ParamDecl::path("message-id"))
            .with_param(ParamDecl::body("isRead").with_schema(ParamSchema::boolean()))
            .with_param(
                ParamDecl::body("categories").with_schema(ParamSchema::array(ParamSchema::string())),
            )
            .with_param(ParamDecl::body("importance").with_schema(
                ParamSchema::from_json(json!({ "type": "string", "enum": ["low", "normal", "high"] })),
            )),
        EndpointDescriptor::new("move-mail-message", "POST", "/me/messages/{message-id}/move")
            .describe("Move a message to another folder.")
            .with_param(ParamDecl::path("message-id"))
            .with_param(
                ParamDecl::body("destinationId")
                    .with_schema(ParamSchema::string().describe("Target folder id or well-known name")),
            ),
        EndpointDescriptor::new("delete-mail-message", "DELETE", "/me/messages/{message-id}")
            .describe("Delete a message.")
            .with_param(ParamDecl::path("message-id")),
    ]
}

pub fn register_overrides(registry: &mut OverrideRegistry) {
    registry.register(
        "send-mail",
        OverrideRecord::new()
            .describe(
                "Send an email as the signed-in user. Provide recipients, a subject and the \
                 message content; the message is saved to Sent Items unless told otherwise.",
            )
            .field(
                "to",
                ParamSchema::array(ParamSchema::string())
                    .describe("Recipient email addresses")
                    .required(),
            )
            .field("cc", ParamSchema::array(ParamSchema::string()).describe("CC addresses"))
            .field("subject", ParamSchema::string().required())
            .field("content", ParamSchema::string().describe("Message body").required())
            .field(
                "contentType",
                ParamSchema::from_json(json!({ "type": "string", "enum": ["Text", "HTML"] })),
            )
            .field("saveToSentItems", ParamSchema::boolean())
            .body_transform(send_mail_body),
    );
}

fn send_mail_body(params: &CallParams) -> Result<Value, ToolError> {
    let to = string_list(params, "to");
    if to.is_empty() {
        return Err(ToolError::transform("at least one recipient is required in 'to'"));
    }
    let subject = required_str(params, "subject")?;
    let content = required_str(params, "content")?;
    let content_type = optional_str(params, "contentType").unwrap_or("Text");

    let mut message = json!({
        "subject": subject,
        "body": { "contentType": content_type, "content": content },
        "toRecipients": recipients(&to),
    });
    let cc = string_list(params, "cc");
    if !cc.is_empty() {
        message["ccRecipients"] = recipients(&cc);
    }

    let save = params
        .get("saveToSentItems")
        .and_then(Value::as_bool)
        .unwrap_or(true);
    Ok(json!({ "message": message, "saveToSentItems": save }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::executor::CallExecutor;
    use crate::domains::tools::schema::EffectiveSchema;

    fn params(value: Value) -> CallParams {
        value.as_object().cloned().unwrap_or_default()
    }

    fn send_mail() -> (EndpointDescriptor, OverrideRecord) {
        let endpoint = endpoints()
            .into_iter()
            .find(|e| e.name == "send-mail")
            .unwrap();
        let mut registry = OverrideRegistry::new();
        register_overrides(&mut registry);
        let record = registry.get("send-mail").unwrap().as_ref().clone();
        (endpoint, record)
    }

    #[test]
    fn test_send_mail_schema_replaces_raw_body() {
        let (endpoint, record) = send_mail();
        let schema = EffectiveSchema::build(&endpoint, Some(&record));
        assert!(!schema.contains("body"));
        assert!(schema.get("to").unwrap().is_required());
        assert!(schema.contains("saveToSentItems"));
    }

    #[test]
    fn test_send_mail_body() {
        let body = send_mail_body(&params(json!({
            "to": ["a@example.com"],
            "cc": "b@example.com",
            "subject": "Hello",
            "content": "<b>Hi</b>",
            "contentType": "HTML",
        })))
        .unwrap();

        assert_eq!(body["saveToSentItems"], json!(true));
        assert_eq!(body["message"]["subject"], "Hello");
        assert_eq!(body["message"]["body"]["contentType"], "HTML");
        assert_eq!(
            body["message"]["toRecipients"][0]["emailAddress"]["address"],
            "a@example.com"
        );
        assert_eq!(
            body["message"]["ccRecipients"][0]["emailAddress"]["address"],
            "b@example.com"
        );
    }

    #[test]
    fn test_send_mail_requires_recipient() {
        let err = send_mail_body(&params(json!({ "subject": "s", "content": "c" }))).unwrap_err();
        assert!(err.to_string().contains("recipient"));
    }

    #[test]
    fn test_send_mail_request_ignores_raw_body() {
        let (endpoint, record) = send_mail();
        let request = CallExecutor::prepare(
            &endpoint,
            Some(&record),
            &params(json!({
                "to": ["a@example.com"],
                "subject": "s",
                "content": "c",
                "body": { "raw": true },
                "saveToSentItems": false,
            })),
        )
        .unwrap();

        assert_eq!(request.path, "/me/sendMail");
        assert_eq!(request.options.method, "POST");
        let body: Value = serde_json::from_str(request.options.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["saveToSentItems"], json!(false));
        assert!(body.get("raw").is_none());
    }
}
