//! The transport seam.

use tokio::io::{AsyncRead, AsyncWrite};

use super::error::RequestError;
use super::request::{CompletionCallback, ProgressCallback, RequestHandle};
use super::response::HttpRequest;

/// Destination of a streamed download.
pub type DownloadSink = Box<dyn AsyncWrite + Send + Unpin>;

/// Source of a streamed upload.
pub struct UploadStream {
    pub reader: Box<dyn AsyncRead + Send + Unpin>,
    /// Body length when known up front
    pub length: Option<u64>,
}

impl UploadStream {
    pub fn new(reader: impl AsyncRead + Send + Unpin + 'static, length: Option<u64>) -> Self {
        Self {
            reader: Box::new(reader),
            length,
        }
    }
}

/// Issues HTTP exchanges.
///
/// Every method returns immediately; the exchange runs elsewhere and ends by
/// invoking the completion callback exactly once, possibly on another
/// thread. Implementations obtain their [`Responder`](super::Responder)
/// from [`channel`](super::channel), which enforces single delivery.
///
/// Streaming is optional. A transport that only buffers keeps the default
/// `start_download` and `start_upload`, which refuse with
/// [`RequestError::StreamingNotSupported`] and drop the callbacks uncalled.
pub trait HttpTransport: Send + Sync {
    /// Start a request with a buffered body and buffered response.
    fn start_request(&self, request: HttpRequest, completion: CompletionCallback) -> RequestHandle;

    fn supports_streaming(&self) -> bool {
        false
    }

    /// Start a request whose successful response body is written to `sink`.
    /// Error responses are still buffered so their body can be inspected.
    fn start_download(
        &self,
        _request: HttpRequest,
        _sink: DownloadSink,
        _bytes_expected: Option<u64>,
        _completion: CompletionCallback,
        _progress: Option<ProgressCallback>,
    ) -> Result<RequestHandle, RequestError> {
        Err(RequestError::StreamingNotSupported)
    }

    /// Start a request whose body is read from `upload`.
    fn start_upload(
        &self,
        _request: HttpRequest,
        _upload: UploadStream,
        _completion: CompletionCallback,
        _progress: Option<ProgressCallback>,
    ) -> Result<RequestHandle, RequestError> {
        Err(RequestError::StreamingNotSupported)
    }
}
