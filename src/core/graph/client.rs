//! reqwest-backed client for the Graph REST API.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use serde_json::{Map, Value, json};
use tracing::{debug, error};

use super::{ApiClient, ApiResponse, ClientError, ClientResult, RequestOptions};
use crate::core::config::GraphConfig;

/// Content type assumed when a media response does not declare one.
const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

/// HTTP client for the Graph API.
///
/// Resolved paths are appended to the configured base URL. When an access
/// token is configured it is sent as a bearer token on every request.
pub struct GraphClient {
    http: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
}

impl GraphClient {
    /// Create a new client from the Graph configuration section.
    pub fn new(config: &GraphConfig) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Init(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
        })
    }

    /// Absolute URL for a resolved path.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[async_trait::async_trait]
impl ApiClient for GraphClient {
    async fn request(&self, path: &str, options: &RequestOptions) -> ClientResult<ApiResponse> {
        let method = Method::from_bytes(options.method.as_bytes()).map_err(|_| {
            ClientError::invalid_request(format!("unsupported method '{}'", options.method))
        })?;
        let url = self.url_for(path);
        debug!("{} {}", method, url);

        let mut request = self.http.request(method, &url);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &options.body {
            let has_content_type = options
                .headers
                .iter()
                .any(|(name, _)| name.eq_ignore_ascii_case(CONTENT_TYPE.as_str()));
            if !has_content_type {
                request = request.header(CONTENT_TYPE, "application/json");
            }
            request = request.body(body.clone());
        }

        let response = request.send().await.map_err(|e| {
            error!("Request to {} failed: {}", url, e);
            ClientError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("{} answered HTTP {}", url, status.as_u16());
            return Err(ClientError::status(status.as_u16(), body));
        }

        let text = if options.raw_response {
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or(DEFAULT_MEDIA_TYPE)
                .to_string();
            let bytes = response.bytes().await?;
            render_media_body(&content_type, &bytes)
        } else {
            let body = response.text().await?;
            render_text_body(&body)
        };

        let mut meta = Map::new();
        meta.insert("status".to_string(), json!(status.as_u16()));

        Ok(ApiResponse {
            content: vec![text],
            meta: Some(meta),
            is_error: false,
        })
    }
}

/// Render a textual response body. JSON is pretty-printed, empty bodies
/// become a short acknowledgement, anything else passes through.
fn render_text_body(body: &str) -> String {
    if body.trim().is_empty() {
        return json!({ "message": "OK!" }).to_string();
    }
    match serde_json::from_str::<Value>(body) {
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| body.to_string()),
        Err(_) => body.to_string(),
    }
}

/// Wrap binary content as base64 inside a JSON envelope.
fn render_media_body(content_type: &str, bytes: &[u8]) -> String {
    json!({
        "message": "Binary content retrieved",
        "contentType": content_type,
        "encoding": "base64",
        "contentBytes": STANDARD.encode(bytes),
    })
    .to_string()
}
