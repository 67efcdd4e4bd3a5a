//! cmis-atompub - A client binding for the CMIS AtomPub protocol
//!
//! This library talks to CMIS repositories over the Atom Publishing Protocol
//! binding: it decodes service documents, entries and feeds into typed
//! models, resolves object links into request URIs, and runs every HTTP
//! exchange as a cancellable request with a single terminal result.
//!
//! # Features
//!
//! - **Streaming decoder**: Atom and CMIS documents are decoded scope by scope
//!   on top of `quick-xml`, with unknown elements kept as extension content
//! - **Binding session**: Repository discovery, URI templates, link relations
//!   and a bounded object cache that never serves stale copies after writes
//! - **Request lifecycle**: Exactly-once completion, cancellation by handle or
//!   by dropping the future, progress reporting for streamed transfers
//! - **Streamed content**: Uploads are base64 encoded on the fly and downloads
//!   go straight to a sink, so document content is never buffered whole
//!
//! # Example - Listing the root folder
//!
//! ```no_run
//! use cmis_atompub::{BindingSession, SessionParameters};
//!
//! # async fn run() -> Result<(), cmis_atompub::Error> {
//! let parameters = SessionParameters::from_yaml(
//!     "atompub_url: http://localhost:8080/cmis/atom\nusername: admin\npassword: admin\n",
//! )?;
//! let session = BindingSession::with_reqwest(parameters)?;
//! session.connect().await?;
//!
//! let root = session.repository_info()?.root_folder_id;
//! for child in session.retrieve_children(&root).await? {
//!     println!("{}: {:?}", child.object_id, child.name());
//! }
//! # Ok(())
//! # }
//! ```

/// AtomPub wire format
///
/// Decoders for service documents, entries, feeds and allowable actions,
/// the entry writer, and URI parameter helpers.
pub mod atompub;

/// Error taxonomy and XML text helpers shared by every layer
pub mod common;

/// Session parameters
pub mod config;

/// HTTP request lifecycle
///
/// The transport seam, the request/response value types, and the invoker
/// that turns callback-based requests into futures.
pub mod http;

/// Decoded CMIS data model
pub mod model;

/// Binding session, link resolution and object cache
pub mod session;

// Re-export commonly used types for convenience
pub use common::error::{Error, ErrorCode, Result};
pub use config::SessionParameters;
pub use http::{HttpInvoker, HttpTransport, RequestError, RequestHandle};
#[cfg(feature = "reqwest-transport")]
pub use http::ReqwestTransport;
pub use model::{CmisProperties, ObjectData, PropertyData, PropertyValue, RepositoryInfo};
pub use session::{BindingError, BindingSession, ContentSource, ContentStore};
