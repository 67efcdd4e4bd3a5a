//! Common types and utilities shared across layers.
//!
//! The CMIS error taxonomy used by the decoder, the transport and the
//! session, and the XML text helpers used by the decoder and writer.

// Submodule declarations
pub mod error;
pub mod xml;

// Re-exports for convenience
pub use error::{Error, ErrorCode, Result};
