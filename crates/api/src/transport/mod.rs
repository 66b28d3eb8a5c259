//! HTTP transport capability.
//!
//! Everything that talks to the network goes through [`HttpTransport`], so
//! the token manager, the query client and the archive fetcher can all be
//! exercised against [`MockTransport`] in tests.

pub mod error;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod reqwest;

pub use self::error::ErrorKind;
#[cfg(any(test, feature = "mock"))]
pub use self::mock::MockTransport;
pub use self::reqwest::ReqwestTransport;
use self::error::Result;
use async_trait::async_trait;
use futures::Stream;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

pub type TransportHandle = Arc<dyn HttpTransport>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A single outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub timeout: Duration,
}
impl HttpRequest {
    const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn bearer(self, token: &str) -> Self {
        self.header("authorization", format!("Bearer {token}"))
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// First value of a header, compared case-insensitively.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A fully buffered response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}
impl HttpResponse {
    /// Body as text, for error payloads.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>>> + Send>>;

/// A response whose body is read chunk by chunk.
pub struct StreamingResponse {
    pub status: u16,
    pub body: BodyStream,
}
impl fmt::Debug for StreamingResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingResponse").field("status", &self.status).finish_non_exhaustive()
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Name of the transport implementation (used for logging only).
    fn name(&self) -> &str;

    /// Send a request and buffer the whole response body.
    ///
    /// Non-2xx statuses are not errors at this level; only failing to get a
    /// response at all is.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;

    /// Send a request and return the body as a stream of chunks.
    async fn stream(&self, request: HttpRequest) -> Result<StreamingResponse>;
}
