use super::error::{ErrorKind, Result};
use super::{HttpRequest, HttpResponse, HttpTransport, Method, StreamingResponse};
use async_trait::async_trait;
use exn::ResultExt;
use futures::StreamExt;
use ::reqwest::{Client, RequestBuilder};
use tracing::debug;

const USER_AGENT: &str = concat!("fakit/", env!("CARGO_PKG_VERSION"));

/// HTTP transport backed by a shared [`reqwest::Client`](::reqwest::Client) (rustls).
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}
impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .or_raise(|| ErrorKind::Request)?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn build(&self, request: HttpRequest) -> RequestBuilder {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        builder.timeout(request.timeout)
    }

    async fn execute(&self, request: HttpRequest) -> Result<::reqwest::Response> {
        let (method, url) = (request.method, request.url.clone());
        match self.build(request).send().await {
            Ok(response) => {
                debug!(?method, %url, status = response.status().as_u16(), "HTTP response");
                Ok(response)
            },
            Err(e) => {
                let kind = classify(&e);
                Err(e).or_raise(|| kind)
            },
        }
    }
}

fn classify(err: &::reqwest::Error) -> ErrorKind {
    if err.is_timeout() {
        ErrorKind::Timeout
    } else if err.is_connect() {
        ErrorKind::Connect
    } else if err.is_body() || err.is_decode() {
        ErrorKind::Body
    } else {
        ErrorKind::Request
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    fn name(&self) -> &str {
        "reqwest"
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let response = self.execute(request).await?;
        let status = response.status().as_u16();
        let body = match response.bytes().await {
            Ok(body) => body.to_vec(),
            Err(e) => {
                let kind = classify(&e);
                return Err(e).or_raise(|| kind);
            },
        };
        Ok(HttpResponse { status, body })
    }

    async fn stream(&self, request: HttpRequest) -> Result<StreamingResponse> {
        let response = self.execute(request).await?;
        let status = response.status().as_u16();
        let body = response.bytes_stream().map(|chunk| match chunk {
            Ok(bytes) => Ok(bytes.to_vec()),
            Err(e) => {
                let kind = classify(&e);
                Err(e).or_raise(|| kind)
            },
        });
        Ok(StreamingResponse { status, body: Box::pin(body) })
    }
}
