//! Scripted [`ApiClient`] used by unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use super::{ApiClient, ApiResponse, ClientError, ClientResult, RequestOptions};

type Responder = Box<dyn Fn(usize, &str) -> ClientResult<ApiResponse> + Send + Sync>;

/// A client that answers from a script and records every request.
pub(crate) struct MockClient {
    responder: Responder,
    queue: Mutex<VecDeque<ClientResult<ApiResponse>>>,
    requests: Mutex<Vec<(String, RequestOptions)>>,
}

impl MockClient {
    /// Answer each call with the next queued result; an exhausted queue
    /// yields an empty (non content-bearing) response.
    pub(crate) fn sequence(results: Vec<ClientResult<ApiResponse>>) -> Self {
        Self {
            responder: Box::new(|_, _| Ok(ApiResponse::default())),
            queue: Mutex::new(results.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer every call by invoking `f(call_index, path)`.
    pub(crate) fn with_fn(
        f: impl Fn(usize, &str) -> ClientResult<ApiResponse> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(f),
            queue: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with the same text.
    pub(crate) fn always(text: &'static str) -> Self {
        Self::with_fn(move |_, _| Ok(ApiResponse::text(text)))
    }

    /// Always fail with the given status.
    pub(crate) fn failing(status: u16, body: &'static str) -> Self {
        Self::with_fn(move |_, _| Err(ClientError::status(status, body)))
    }

    /// Requests received so far, in order.
    pub(crate) fn requests(&self) -> Vec<(String, RequestOptions)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ApiClient for MockClient {
    async fn request(&self, path: &str, options: &RequestOptions) -> ClientResult<ApiResponse> {
        let index = {
            let mut requests = self.requests.lock().unwrap();
            requests.push((path.to_string(), options.clone()));
            requests.len() - 1
        };
        if let Some(next) = self.queue.lock().unwrap().pop_front() {
            return next;
        }
        (self.responder)(index, path)
    }
}
