//! API Error Types
//!
//! Every failure the remote service can produce, classified so callers can
//! decide whether to re-authenticate, retry or give up.

use derive_more::{Display, Error};

/// An API error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for API operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Client was constructed with a missing or empty setting
    #[display("invalid configuration: {_0}")]
    InvalidConfiguration(#[error(not(source))] &'static str),
    /// Caller passed a missing or empty argument
    #[display("invalid argument: {_0}")]
    InvalidArgument(#[error(not(source))] &'static str),
    /// Token endpoint could not be reached
    #[display("token endpoint request failed")]
    TokenEndpointTransport,
    /// Token endpoint answered with a status other than 200
    #[display("token endpoint returned HTTP {status}")]
    TokenEndpointHttp { status: u16, body: String },
    /// Token endpoint body lacks a string `access_token` or integer `expires_in`
    #[display("malformed token endpoint response")]
    TokenEndpointMalformedResponse { body: String },
    /// API could not be reached
    #[display("API request failed")]
    Transport,
    /// API answered with a status other than 200
    #[display("API returned HTTP {status}")]
    HttpStatus { status: u16, body: String },
    /// API body is not valid JSON
    #[display("API response is not valid JSON")]
    JsonParse { body: String },
    /// Access token was rejected; request a fresh one
    #[display("unauthorized")]
    Unauthorized,
    /// GraphQL errors other than an authorization failure
    #[display("API error: {}", _0.join("; "))]
    Api(#[error(not(source))] Vec<String>),
    /// Valid response lacking required fields in `data`
    #[display("unexpected API response shape: {_0}")]
    UnexpectedShape(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::TokenEndpointTransport | Self::Transport => true,
            Self::TokenEndpointHttp { status, .. } | Self::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
