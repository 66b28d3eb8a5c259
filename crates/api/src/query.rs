//! GraphQL queries against the Font Awesome API.

use crate::error::{ErrorKind, Result};
use crate::token::TokenProvider;
use crate::transport::{HttpRequest, HttpResponse, TransportHandle};
use exn::ResultExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument};

/// Request body: `{query, variables?}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Map<String, Value>>,
}
impl Query {
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into(), variables: None }
    }

    pub fn with_variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables = Some(variables);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// Send the request without an `authorization` header.
    pub ignore_auth: bool,
    pub timeout: Duration,
}
impl QueryOptions {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
}
impl Default for QueryOptions {
    fn default() -> Self {
        Self { ignore_auth: false, timeout: Self::DEFAULT_TIMEOUT }
    }
}

pub struct QueryClient {
    base_url: String,
    transport: TransportHandle,
    options: QueryOptions,
}
impl QueryClient {
    pub fn new(base_url: impl Into<String>, transport: TransportHandle) -> Result<Self> {
        let base_url = base_url.into();
        if base_url.trim().is_empty() {
            exn::bail!(ErrorKind::InvalidConfiguration("API base URL is empty"));
        }
        Ok(Self { base_url, transport, options: QueryOptions::default() })
    }

    /// Timeout for the queries this crate issues on the caller's behalf.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Options used by [`KitBuild`](crate::KitBuild) and
    /// [`fetch_kit_metadata`](crate::fetch_kit_metadata).
    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// POST a query and return the raw response, whatever its status.
    ///
    /// Callers should prefer [`query_data`](Self::query_data), which applies
    /// the full response classification.
    #[instrument(skip_all, fields(base_url = %self.base_url, ignore_auth = options.ignore_auth))]
    pub async fn query(&self, query: &Query, tokens: &dyn TokenProvider, options: &QueryOptions) -> Result<HttpResponse> {
        if query.query.trim().is_empty() {
            exn::bail!(ErrorKind::InvalidArgument("query"));
        }
        let body = serde_json::to_vec(query).or_raise(|| ErrorKind::InvalidArgument("query"))?;
        let mut request = HttpRequest::post(&self.base_url)
            .header("content-type", "application/json")
            .body(body)
            .timeout(options.timeout);
        if !options.ignore_auth {
            request = request.bearer(&tokens.access_token().await?);
        }
        let response = self.transport.send(request).await.or_raise(|| ErrorKind::Transport)?;
        debug!(status = response.status, bytes = response.body.len(), "query response");
        Ok(response)
    }

    /// POST a query and decode its `data` member into `T`.
    pub async fn query_data<T: DeserializeOwned>(
        &self,
        query: &Query,
        tokens: &dyn TokenProvider,
        options: &QueryOptions,
    ) -> Result<T> {
        decode(&self.query(query, tokens, options).await?)
    }
}
impl fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryClient")
            .field("base_url", &self.base_url)
            .field("transport", &self.transport.name())
            .field("timeout", &self.options.timeout)
            .finish()
    }
}

/// Classify a response, in order: HTTP status, JSON syntax, authorization
/// failure, any other GraphQL error, then the shape of `data`.
pub fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T> {
    if response.status != 200 {
        exn::bail!(ErrorKind::HttpStatus { status: response.status, body: response.text() });
    }
    let mut body: Value =
        serde_json::from_slice(&response.body).or_raise(|| ErrorKind::JsonParse { body: response.text() })?;
    if is_authorization_error(&body) {
        exn::bail!(ErrorKind::Unauthorized);
    }
    if has_any_error(&body) {
        if !body.is_object() {
            exn::bail!(ErrorKind::UnexpectedShape("response is not an object".to_string()));
        }
        exn::bail!(ErrorKind::Api(error_messages(&body)));
    }
    let Some(data) = body.get_mut("data").map(Value::take) else {
        exn::bail!(ErrorKind::UnexpectedShape("missing data".to_string()));
    };
    match serde_json::from_value(data) {
        Ok(data) => Ok(data),
        Err(e) => {
            let message = e.to_string();
            Err(e).or_raise(|| ErrorKind::UnexpectedShape(message))
        },
    }
}

/// Whether `body` carries an `errors` entry whose message is exactly
/// `"unauthorized"`.
pub fn is_authorization_error(body: &Value) -> bool {
    errors(body).is_some_and(|errors| {
        errors
            .iter()
            .any(|error| error.get("message").and_then(Value::as_str) == Some("unauthorized"))
    })
}

/// Whether `body` is not an object, or has a non-empty `errors` array.
///
/// Also true for authorization errors; check
/// [`is_authorization_error`] first.
pub fn has_any_error(body: &Value) -> bool {
    !body.is_object() || errors(body).is_some_and(|errors| !errors.is_empty())
}

fn errors(body: &Value) -> Option<&Vec<Value>> {
    body.get("errors").and_then(Value::as_array)
}

fn error_messages(body: &Value) -> Vec<String> {
    errors(body)
        .into_iter()
        .flatten()
        .map(|error| match error.get("message").and_then(Value::as_str) {
            Some(message) => message.to_string(),
            None => error.to_string(),
        })
        .collect()
}
