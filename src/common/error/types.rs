//! Unified error type for the crate.
//!
//! Each layer has its own error enum; this type wraps them so applications can
//! use a single `Result` across decoding, transport and session calls.
use thiserror::Error;

use super::codes::ErrorCode;
use crate::atompub::parser::DecodeError;
use crate::http::RequestError;
use crate::session::BindingError;

/// Main error type for CMIS operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Decoding of an Atom/CMIS document failed
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// A single HTTP exchange failed
    #[error("Request error: {0}")]
    Request(#[from] RequestError),

    /// A binding session operation failed
    #[error("Binding error: {0}")]
    Binding(#[from] BindingError),

    /// Session parameters could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The CMIS error code this error maps onto.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Decode(_) => ErrorCode::Runtime,
            Error::Request(err) => err.code(),
            Error::Binding(err) => err.code(),
            Error::Config(_) => ErrorCode::InvalidArgument,
            Error::Io(_) => ErrorCode::Storage,
        }
    }
}

/// Result type for CMIS operations.
pub type Result<T> = std::result::Result<T, Error>;
