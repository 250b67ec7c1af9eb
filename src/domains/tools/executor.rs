//! Call execution.
//!
//! Turns one tool invocation into one concrete HTTP request: the path
//! template is resolved, every call parameter is routed by its declared
//! class (unless an override transform owns that class), and the request is
//! handed to the [`ApiClient`]. Nothing here retries or catches errors.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use super::ToolError;
use super::catalog::{EndpointDescriptor, ParamLocation};
use super::overrides::{CallParams, OverrideRecord};
use super::params::{BODY_PARAM, RequestDraft};
use super::schema::{TIMEZONE, is_reserved, uses_timezone_preference};
use crate::core::graph::{ApiClient, ApiResponse, RequestOptions};

/// Path suffixes that return raw media rather than JSON.
pub const MEDIA_SUFFIXES: &[&str] = &["/content", "/$value"];

/// A fully resolved request, ready to send.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    /// Resolved path without the query string.
    pub path: String,
    /// Wire-level query pairs.
    pub query: Vec<(String, String)>,
    pub options: RequestOptions,
}

impl PreparedRequest {
    /// Path with the URL-encoded query string appended.
    pub fn resolved_path(&self) -> Result<String, ToolError> {
        if self.query.is_empty() {
            return Ok(self.path.clone());
        }
        let encoded = serde_urlencoded::to_string(&self.query)
            .map_err(|e| ToolError::internal(format!("Failed to encode query: {}", e)))?;
        let separator = if self.path.contains('?') { '&' } else { '?' };
        Ok(format!("{}{}{}", self.path, separator, encoded))
    }

    /// The same request aimed at another path and query.
    pub fn follow(&self, path: String, query: Vec<(String, String)>) -> Self {
        Self {
            path,
            query,
            options: self.options.clone(),
        }
    }
}

/// Executes tool invocations against the remote API.
#[derive(Clone)]
pub struct CallExecutor {
    client: Arc<dyn ApiClient>,
}

impl CallExecutor {
    pub fn new(client: Arc<dyn ApiClient>) -> Self {
        Self { client }
    }

    /// Build the request for one invocation without sending it.
    pub fn prepare(
        endpoint: &EndpointDescriptor,
        record: Option<&OverrideRecord>,
        params: &CallParams,
    ) -> Result<PreparedRequest, ToolError> {
        let mut draft = RequestDraft::new(endpoint.path.clone());

        if let Some(transform) = record.and_then(|r| r.path.as_ref()) {
            draft.path = transform(&endpoint.path, params)?;
        }
        if let Some(transform) = record.and_then(|r| r.body.as_ref()) {
            draft.body = Some(transform(params)?);
        }
        if let Some(transform) = record.and_then(|r| r.query.as_ref()) {
            draft.query = transform(params)?;
        }

        let body_owned = record.is_some_and(|r| r.owns(ParamLocation::Body));
        for (name, value) in params {
            if is_reserved(endpoint, name) {
                continue;
            }
            match endpoint.find_param(name) {
                Some(decl) if record.is_some_and(|r| r.owns_param(decl)) => {}
                Some(decl) => draft.route(decl, value),
                None if name == BODY_PARAM && !body_owned => draft.merge_body(BODY_PARAM, value),
                None => debug!("Dropping undeclared parameter '{}' for {}", name, endpoint.name),
            }
        }

        if uses_timezone_preference(endpoint) {
            if let Some(tz) = params.get(TIMEZONE).and_then(Value::as_str) {
                draft.set_header("Prefer", format!("outlook.timezone=\"{}\"", tz));
            }
        }

        let method = endpoint.method.to_uppercase();
        let body = match draft.body {
            Some(_) if method == "GET" => None,
            Some(Value::Null) | None => None,
            Some(Value::String(text)) => Some(text),
            Some(other) => Some(other.to_string()),
        };
        let raw_response = endpoint.media_content || is_media_path(&draft.path);

        Ok(PreparedRequest {
            path: draft.path,
            query: draft.query,
            options: RequestOptions {
                method,
                headers: draft.headers,
                body,
                raw_response,
            },
        })
    }

    /// Send a prepared request.
    pub async fn send(&self, request: &PreparedRequest) -> Result<ApiResponse, ToolError> {
        let path = request.resolved_path()?;
        debug!("{} {}", request.options.method, path);
        Ok(self.client.request(&path, &request.options).await?)
    }

    /// Prepare and send one invocation.
    pub async fn execute(
        &self,
        endpoint: &EndpointDescriptor,
        record: Option<&OverrideRecord>,
        params: &CallParams,
    ) -> Result<(PreparedRequest, ApiResponse), ToolError> {
        let request = Self::prepare(endpoint, record, params)?;
        let response = self.send(&request).await?;
        Ok((request, response))
    }
}

fn is_media_path(path: &str) -> bool {
    let path = path.split('?').next().unwrap_or(path);
    MEDIA_SUFFIXES.iter().any(|suffix| path.ends_with(suffix))
}
