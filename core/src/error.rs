//! Error types for the client runtime.
//!
//! # Design
//! Every stage of the pipeline reports through `ClientError`. Failures that
//! happen after the transport produced a response travel in `ExecuteError`
//! together with that response, so callers can still inspect status, headers
//! and the partial body.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

use crate::response::Response;

/// Boxed error used for codec and transport sources.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Errors produced while building, sending or decoding a request.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// The client was configured with options the transport cannot honour.
    #[error("invalid client configuration: {0}")]
    Config(String),

    /// The request URL (or base URL + path) could not be parsed.
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid header name: {0}")]
    InvalidHeaderName(#[from] http::header::InvalidHeaderName),

    #[error("invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    /// The raw transport request could not be assembled.
    #[error("failed to build request: {0}")]
    Request(#[from] http::Error),

    /// The request body could not be serialized.
    #[error("{format} encoding failed: {source}")]
    Encode {
        format: &'static str,
        #[source]
        source: BoxError,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The response body could not be deserialized into the receptor.
    #[error("{format} decoding failed: {source}")]
    Decode {
        format: &'static str,
        #[source]
        source: BoxError,
    },

    /// The result decider flagged the status and no error receptor was set.
    ///
    /// `message` is the JSON document `{"status_code":..,"body":".."}`.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// A `Content-Encoding: gzip` body could not be inflated.
    #[error("gunzip failed: {0}")]
    Gunzip(#[source] std::io::Error),
}

/// Errors reported by a [`Doer`](crate::doer::Doer).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// The request context was cancelled before or during the round trip.
    #[error("request cancelled")]
    Cancelled,

    /// The request context deadline or a transport timeout elapsed.
    #[error("request deadline exceeded")]
    DeadlineExceeded,

    /// Network, TLS or protocol failure.
    #[error("transport failure: {0}")]
    Failed(#[source] BoxError),
}

impl From<ureq::Error> for TransportError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Timeout(_) => TransportError::DeadlineExceeded,
            other => TransportError::Failed(Box::new(other)),
        }
    }
}

/// Failure returned by [`Request::execute`](crate::request::Request::execute).
///
/// Pre-request failures carry no response. Transport and post-response
/// failures carry the response as far as it was filled in.
pub struct ExecuteError {
    error: ClientError,
    response: Option<Box<Response>>,
}

impl ExecuteError {
    pub(crate) fn with_response(error: ClientError, response: Response) -> Self {
        Self {
            error,
            response: Some(Box::new(response)),
        }
    }

    pub fn error(&self) -> &ClientError {
        &self.error
    }

    pub fn response(&self) -> Option<&Response> {
        self.response.as_deref()
    }

    pub fn into_parts(self) -> (ClientError, Option<Response>) {
        (self.error, self.response.map(|r| *r))
    }
}

impl From<ClientError> for ExecuteError {
    fn from(error: ClientError) -> Self {
        Self {
            error,
            response: None,
        }
    }
}

impl fmt::Debug for ExecuteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecuteError")
            .field("error", &self.error)
            .field("status", &self.response.as_ref().map(|r| r.status_code()))
            .finish()
    }
}

impl fmt::Display for ExecuteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl StdError for ExecuteError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.error)
    }
}
