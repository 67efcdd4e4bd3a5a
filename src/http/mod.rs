//! HTTP request lifecycle.
//!
//! A transport starts an exchange and returns a [`RequestHandle`] at once;
//! the result arrives later through a completion callback, invoked exactly
//! once whether the exchange succeeds, fails or is cancelled. Streaming
//! upload and download are optional transport capabilities.
//!
//! [`HttpInvoker`] adapts the callback contract to `async` for the session
//! layer.

pub mod error;
pub mod invoker;
pub mod request;
pub mod response;
pub mod transport;

#[cfg(feature = "reqwest-transport")]
pub mod reqwest_transport;

#[cfg(test)]
pub(crate) mod mock;

pub use error::RequestError;
pub use invoker::HttpInvoker;
pub use request::{CompletionCallback, ProgressCallback, ProgressReporter, RequestHandle, Responder, channel};
pub use response::{Credentials, HttpRequest, HttpResponse, Method, ResponseBody};
pub use transport::{DownloadSink, HttpTransport, UploadStream};

#[cfg(feature = "reqwest-transport")]
pub use reqwest_transport::ReqwestTransport;
