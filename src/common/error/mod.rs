//! Error types shared across the crate.
//!
//! This module holds the fixed CMIS error code taxonomy, the unified error
//! type, and the conversions that map layer errors onto the taxonomy.

// Submodule declarations
pub mod codes;
pub mod conversions;
pub mod types;

// Re-exports
pub use codes::{ErrorCategory, ErrorCode};
pub use types::{Error, Result};
