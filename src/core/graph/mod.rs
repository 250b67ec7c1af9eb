//! Remote API client boundary.
//!
//! The tool adapter never performs network I/O itself. It resolves a request
//! path and [`RequestOptions`], then hands them to an [`ApiClient`]. The client
//! owns authentication, timeouts and the wire format of the response, and
//! returns a content-bearing [`ApiResponse`] or a [`ClientError`].
//!
//! - `client.rs` - reqwest-backed [`GraphClient`]
//! - `error.rs` - client error types

mod client;
mod error;

#[cfg(test)]
pub(crate) mod mock;

pub use client::GraphClient;
pub use error::{ClientError, ClientResult};

use serde_json::{Map, Value};

/// Options accompanying a resolved request path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    /// Uppercased HTTP method.
    pub method: String,

    /// Request headers, in insertion order.
    pub headers: Vec<(String, String)>,

    /// Serialized request body, if any.
    pub body: Option<String>,

    /// Whether the caller expects raw (media) content rather than text.
    pub raw_response: bool,
}

/// A normalized response returned by an [`ApiClient`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiResponse {
    /// Ordered text content items.
    pub content: Vec<String>,

    /// Pass-through metadata.
    pub meta: Option<Map<String, Value>>,

    /// Whether the remote side reported the call as failed.
    pub is_error: bool,
}

impl ApiResponse {
    /// Create a response holding a single text item.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![text.into()],
            meta: None,
            is_error: false,
        }
    }

    /// Text of the first content item, if present.
    pub fn first_text(&self) -> Option<&str> {
        self.content.first().map(String::as_str)
    }

    /// A response is content-bearing when it carries at least one item.
    pub fn is_content_bearing(&self) -> bool {
        !self.content.is_empty()
    }
}

/// The transport client contract consumed by the tool adapter.
///
/// `path` is already resolved, including any query string.
#[async_trait::async_trait]
pub trait ApiClient: Send + Sync {
    async fn request(&self, path: &str, options: &RequestOptions) -> ClientResult<ApiResponse>;
}
