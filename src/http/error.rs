//! Transport-level errors.

use bytes::Bytes;
use thiserror::Error;

use crate::common::error::ErrorCode;

/// Failure of a single HTTP exchange.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// The request was cancelled through its handle. An expected terminal
    /// state, not a failure of the transport.
    #[error("Request cancelled")]
    Cancelled,

    /// Connection, TLS, timeout or IO failure below HTTP
    #[error("Transport failure: {0}")]
    TransportFailure(String),

    /// The server answered with an error status
    #[error("HTTP {code} {message}")]
    HttpStatus {
        code: u16,
        message: String,
        /// Response body, kept so CMIS fault documents can be inspected
        body: Option<Bytes>,
    },

    /// A streamed transfer was requested from a transport that only
    /// supports buffered bodies
    #[error("Transport does not support streamed transfers")]
    StreamingNotSupported,
}

impl RequestError {
    pub fn code(&self) -> ErrorCode {
        match self {
            RequestError::Cancelled => ErrorCode::Runtime,
            RequestError::TransportFailure(_) => ErrorCode::Connection,
            RequestError::HttpStatus { code: 401, .. } => ErrorCode::Unauthorized,
            RequestError::HttpStatus { code: 407, .. } => ErrorCode::ProxyAuthentication,
            RequestError::HttpStatus { code: 404, .. } => ErrorCode::ObjectNotFound,
            RequestError::HttpStatus { .. } => ErrorCode::Runtime,
            RequestError::StreamingNotSupported => ErrorCode::NotSupported,
        }
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RequestError::Cancelled)
    }

    /// Body as text, lossy, if the failure carried one.
    pub fn body_text(&self) -> Option<String> {
        match self {
            RequestError::HttpStatus { body: Some(body), .. } => Some(String::from_utf8_lossy(body).into_owned()),
            _ => None,
        }
    }
}
