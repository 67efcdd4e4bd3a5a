//! Session-level errors.

use bytes::Bytes;
use thiserror::Error;

use crate::atompub::parser::DecodeError;
use crate::common::error::ErrorCode;

/// Failure of a binding session operation.
///
/// Each variant names a cause callers can branch on. Failed HTTP exchanges
/// keep their status and body in [`BindingError::Cmis`] or
/// [`BindingError::ObjectNotFound`].
#[derive(Error, Debug)]
pub enum BindingError {
    /// The transport failed below HTTP (refused connection, timeout, TLS)
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Proxy authentication required")]
    ProxyAuthenticationRequired,

    /// The service document listed no workspace, or not the requested one
    #[error("No repository found: {0}")]
    NoRepositoryFound(String),

    #[error("Object not found: {target}")]
    ObjectNotFound { target: String, body: Option<Bytes> },

    /// The repository does not expose the operation for this object
    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The request was cancelled before it completed
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The repository answered with an error status
    #[error("{code}: HTTP {status} {message}")]
    Cmis {
        code: ErrorCode,
        status: u16,
        message: String,
        body: Option<Bytes>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BindingError {
    /// The CMIS error code this error maps onto.
    pub fn code(&self) -> ErrorCode {
        match self {
            BindingError::ConnectionError(_) => ErrorCode::Connection,
            BindingError::Unauthorized => ErrorCode::Unauthorized,
            BindingError::ProxyAuthenticationRequired => ErrorCode::ProxyAuthentication,
            BindingError::NoRepositoryFound(_) => ErrorCode::NoRepositoryFound,
            BindingError::ObjectNotFound { .. } => ErrorCode::ObjectNotFound,
            BindingError::NotSupported(_) => ErrorCode::NotSupported,
            BindingError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            BindingError::Cancelled => ErrorCode::Runtime,
            BindingError::Decode(_) => ErrorCode::Runtime,
            BindingError::Cmis { code, .. } => *code,
            BindingError::Io(_) => ErrorCode::Storage,
        }
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, BindingError::Cancelled)
    }

    /// Response body of the failed exchange, if one was kept.
    pub fn body(&self) -> Option<&Bytes> {
        match self {
            BindingError::ObjectNotFound { body, .. } | BindingError::Cmis { body, .. } => body.as_ref(),
            _ => None,
        }
    }
}
