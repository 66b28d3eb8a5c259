//! Short-lived access tokens.

use crate::error::{ErrorKind, Result};
use crate::transport::{HttpRequest, TransportHandle};
use async_trait::async_trait;
use exn::ResultExt;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

/// A cached token is treated as expired this many seconds early.
const EXPIRY_SKEW_SECS: i64 = 5;
const TOKEN_TIMEOUT: Duration = Duration::from_secs(10);

/// Something that can hand out a bearer token for API requests.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// A token obtained elsewhere, used as-is.
#[derive(Clone)]
pub struct StaticToken(String);
impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}
impl fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticToken(..)")
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: i64,
}
impl CachedToken {
    fn is_valid_at(&self, now: i64) -> bool {
        now < self.expires_at.saturating_sub(EXPIRY_SKEW_SECS)
    }
}

/// Exchanges a long-lived API token for short-lived access tokens, and
/// caches the current one until it is about to expire.
///
/// Each manager owns its cache, so managers for different API tokens can
/// coexist.
pub struct AccessTokenManager {
    api_token: String,
    endpoint: String,
    transport: TransportHandle,
    cache: Mutex<Option<CachedToken>>,
}
impl AccessTokenManager {
    pub fn new(api_token: impl Into<String>, base_url: &str, transport: TransportHandle) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.trim().is_empty() {
            exn::bail!(ErrorKind::InvalidConfiguration("API token is empty"));
        }
        Ok(Self {
            api_token,
            endpoint: format!("{}/token", base_url.trim_end_matches('/')),
            transport,
            cache: Mutex::new(None),
        })
    }

    /// Request a fresh access token, replacing whatever is cached.
    pub async fn request_access_token(&self) -> Result<String> {
        let mut cache = self.cache.lock().await;
        let token = self.fetch().await?;
        let access_token = token.access_token.clone();
        *cache = Some(token);
        Ok(access_token)
    }

    /// The previous token stays cached until the new one has been fully
    /// decoded, so a failed refresh never leaves a half-updated cache.
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn fetch(&self) -> Result<CachedToken> {
        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
            expires_in: i64,
        }

        let request = HttpRequest::post(&self.endpoint)
            .bearer(&self.api_token)
            .body(Vec::new())
            .timeout(TOKEN_TIMEOUT);
        let response = self
            .transport
            .send(request)
            .await
            .or_raise(|| ErrorKind::TokenEndpointTransport)?;
        if response.status != 200 {
            exn::bail!(ErrorKind::TokenEndpointHttp { status: response.status, body: response.text() });
        }
        let token: TokenResponse = serde_json::from_slice(&response.body)
            .or_raise(|| ErrorKind::TokenEndpointMalformedResponse { body: response.text() })?;
        let expires_at = OffsetDateTime::now_utc().unix_timestamp().saturating_add(token.expires_in);
        info!(expires_in = token.expires_in, "obtained access token");
        Ok(CachedToken { access_token: token.access_token, expires_at })
    }
}
impl fmt::Debug for AccessTokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessTokenManager")
            .field("endpoint", &self.endpoint)
            .field("transport", &self.transport.name())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenProvider for AccessTokenManager {
    /// Cached token if it is still valid, otherwise a freshly requested one.
    async fn access_token(&self) -> Result<String> {
        // Held across the refresh so concurrent callers share one request.
        let mut cache = self.cache.lock().await;
        let now = OffsetDateTime::now_utc().unix_timestamp();
        if let Some(token) = cache.as_ref().filter(|token| token.is_valid_at(now)) {
            debug!("using cached access token");
            return Ok(token.access_token.clone());
        }
        let token = self.fetch().await?;
        let access_token = token.access_token.clone();
        *cache = Some(token);
        Ok(access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{ErrorKind as TransportErrorKind, MockTransport};
    use rstest::rstest;
    use serde_json::json;
    use std::sync::Arc;

    fn manager(transport: &Arc<MockTransport>) -> AccessTokenManager {
        AccessTokenManager::new("api-token", "https://api.test/", transport.clone()).unwrap()
    }

    #[test]
    fn test_empty_api_token_rejected() {
        let err = AccessTokenManager::new("  ", "https://api.test", Arc::new(MockTransport::new())).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidConfiguration(_)));
    }

    #[tokio::test]
    async fn test_request_shape() {
        let transport = Arc::new(MockTransport::new().with_json(200, &json!({"access_token": "abc", "expires_in": 3600})));
        assert_eq!(manager(&transport).access_token().await.unwrap(), "abc");

        let requests = transport.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "https://api.test/token");
        assert_eq!(requests[0].header_value("authorization"), Some("Bearer api-token"));
        assert_eq!(requests[0].body.as_deref(), Some(&[][..]));
    }

    #[tokio::test]
    async fn test_cached_within_validity_window() {
        let transport = Arc::new(MockTransport::new().with_json(200, &json!({"access_token": "abc", "expires_in": 3600})));
        let tokens = manager(&transport);
        assert_eq!(tokens.access_token().await.unwrap(), "abc");
        assert_eq!(tokens.access_token().await.unwrap(), "abc");
        assert_eq!(transport.requests().await.len(), 1);
    }

    #[tokio::test]
    async fn test_refreshed_inside_safety_skew() {
        let transport = Arc::new(
            MockTransport::new()
                .with_json(200, &json!({"access_token": "short", "expires_in": 3}))
                .with_json(200, &json!({"access_token": "long", "expires_in": 3600})),
        );
        let tokens = manager(&transport);
        assert_eq!(tokens.access_token().await.unwrap(), "short");
        assert_eq!(tokens.access_token().await.unwrap(), "long");
        assert_eq!(tokens.access_token().await.unwrap(), "long");
        assert_eq!(transport.requests().await.len(), 2);
    }

    #[tokio::test]
    async fn test_explicit_request_replaces_cache() {
        let transport = Arc::new(
            MockTransport::new()
                .with_json(200, &json!({"access_token": "one", "expires_in": 3600}))
                .with_json(200, &json!({"access_token": "two", "expires_in": 3600})),
        );
        let tokens = manager(&transport);
        assert_eq!(tokens.access_token().await.unwrap(), "one");
        assert_eq!(tokens.request_access_token().await.unwrap(), "two");
        assert_eq!(tokens.access_token().await.unwrap(), "two");
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_token() {
        let transport = Arc::new(
            MockTransport::new()
                .with_json(200, &json!({"access_token": "one", "expires_in": 3600}))
                .with_response(500, "boom"),
        );
        let tokens = manager(&transport);
        tokens.access_token().await.unwrap();
        assert!(tokens.request_access_token().await.is_err());
        assert_eq!(tokens.access_token().await.unwrap(), "one");
    }

    #[tokio::test]
    async fn test_transport_failure() {
        let transport = Arc::new(MockTransport::new().with_failure(TransportErrorKind::Timeout));
        let err = manager(&transport).access_token().await.unwrap_err();
        assert_eq!(*err, ErrorKind::TokenEndpointTransport);
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_http_error() {
        let transport = Arc::new(MockTransport::new().with_response(401, "nope"));
        let err = manager(&transport).access_token().await.unwrap_err();
        assert_eq!(*err, ErrorKind::TokenEndpointHttp { status: 401, body: "nope".into() });
    }

    #[rstest]
    #[case::not_json("<html>")]
    #[case::missing_token(r#"{"expires_in": 3600}"#)]
    #[case::token_not_string(r#"{"access_token": 12, "expires_in": 3600}"#)]
    #[case::missing_expiry(r#"{"access_token": "abc"}"#)]
    #[case::expiry_not_integer(r#"{"access_token": "abc", "expires_in": "3600"}"#)]
    #[tokio::test]
    async fn test_malformed_response(#[case] body: &str) {
        let transport = Arc::new(MockTransport::new().with_response(200, body));
        let err = manager(&transport).access_token().await.unwrap_err();
        assert_eq!(*err, ErrorKind::TokenEndpointMalformedResponse { body: body.to_string() });
    }
}
