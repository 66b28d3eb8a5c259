//! Scripted HTTP transport for testing.

use super::error::{ErrorKind, Result};
use super::{HttpRequest, HttpResponse, HttpTransport, StreamingResponse};
use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::sync::Mutex;

enum Reply {
    Response(HttpResponse),
    Failure(ErrorKind),
}

/// Transport that answers requests from a queue of scripted replies, in
/// order, and records every request it receives.
///
/// Panics if a request arrives after the script has run out. If test setup
/// is wrong, then test should not pass.
///
/// ```ignore
/// let transport = MockTransport::new()
///     .with_json(200, &serde_json::json!({"access_token": "abc", "expires_in": 3600}))
///     .with_failure(ErrorKind::Timeout);
/// ```
#[derive(Default)]
pub struct MockTransport {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<HttpRequest>>,
    chunk_size: Option<usize>,
}
impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.replies.get_mut().push_back(Reply::Response(HttpResponse { status, body: body.into() }));
        self
    }

    pub fn with_json(self, status: u16, body: &serde_json::Value) -> Self {
        self.with_response(status, body.to_string())
    }

    pub fn with_failure(mut self, kind: ErrorKind) -> Self {
        self.replies.get_mut().push_back(Reply::Failure(kind));
        self
    }

    /// Split streamed bodies into chunks of `size` bytes (default: one chunk).
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = Some(size.max(1));
        self
    }

    /// Every request received so far, oldest first.
    pub async fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn remaining(&self) -> usize {
        self.replies.lock().await.len()
    }

    async fn next(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = request.url.clone();
        self.requests.lock().await.push(request);
        match self.replies.lock().await.pop_front() {
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::Failure(kind)) => exn::bail!(kind),
            None => panic!("MockTransport: no scripted reply left for {url}"),
        }
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.next(request).await
    }

    async fn stream(&self, request: HttpRequest) -> Result<StreamingResponse> {
        let HttpResponse { status, body } = self.next(request).await?;
        let size = self.chunk_size.unwrap_or(body.len().max(1));
        let chunks: Vec<Result<Vec<u8>>> = body.chunks(size).map(|chunk| Ok(chunk.to_vec())).collect();
        Ok(StreamingResponse { status, body: Box::pin(futures::stream::iter(chunks)) })
    }
}
