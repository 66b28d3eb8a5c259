use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

/// Why a request never produced a complete response.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("request timed out")]
    Timeout,
    #[display("could not connect")]
    Connect,
    /// Request could not be built or sent
    #[display("request failed")]
    Request,
    /// Connection dropped while reading the response body
    #[display("failed to read response body")]
    Body,
}

impl ErrorKind {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Request)
    }
}
