//! Awaitable front end over a callback transport.

use std::sync::Arc;

use tokio::sync::oneshot;

use super::error::RequestError;
use super::request::{CompletionCallback, ProgressCallback, RequestHandle};
use super::response::{HttpRequest, HttpResponse, ResponseBody};
use super::transport::{DownloadSink, HttpTransport, UploadStream};

/// Turns one completion callback into an awaited result.
///
/// Dropping the returned future cancels the request. Error statuses (400 and
/// above) are turned into [`RequestError::HttpStatus`] here, so every
/// transport reports them the same way.
#[derive(Clone)]
pub struct HttpInvoker {
    transport: Arc<dyn HttpTransport>,
}

impl HttpInvoker {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    pub fn supports_streaming(&self) -> bool {
        self.transport.supports_streaming()
    }

    pub async fn invoke(&self, request: HttpRequest) -> Result<HttpResponse, RequestError> {
        let transport = Arc::clone(&self.transport);
        await_completion(move |completion| Ok(transport.start_request(request, completion))).await
    }

    pub async fn download(
        &self,
        request: HttpRequest,
        sink: DownloadSink,
        bytes_expected: Option<u64>,
        progress: Option<ProgressCallback>,
    ) -> Result<HttpResponse, RequestError> {
        if !self.transport.supports_streaming() {
            return Err(RequestError::StreamingNotSupported);
        }
        let transport = Arc::clone(&self.transport);
        await_completion(move |completion| {
            transport.start_download(request, sink, bytes_expected, completion, progress)
        })
        .await
    }

    pub async fn upload(
        &self,
        request: HttpRequest,
        upload: UploadStream,
        progress: Option<ProgressCallback>,
    ) -> Result<HttpResponse, RequestError> {
        if !self.transport.supports_streaming() {
            return Err(RequestError::StreamingNotSupported);
        }
        let transport = Arc::clone(&self.transport);
        await_completion(move |completion| transport.start_upload(request, upload, completion, progress)).await
    }
}

/// Cancels the request if the awaiting future is dropped early.
struct CancelOnDrop(RequestHandle);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if !self.0.is_finished() {
            self.0.cancel();
        }
    }
}

async fn await_completion<F>(start: F) -> Result<HttpResponse, RequestError>
where
    F: FnOnce(CompletionCallback) -> Result<RequestHandle, RequestError>,
{
    let (tx, rx) = oneshot::channel();
    let handle = start(Box::new(move |result| {
        let _ = tx.send(result);
    }))?;
    let _guard = CancelOnDrop(handle);

    let response = rx
        .await
        .unwrap_or_else(|_| Err(RequestError::TransportFailure("completion callback dropped".to_string())))?;
    if response.status >= 400 {
        let body = match response.body {
            ResponseBody::Buffered(bytes) if !bytes.is_empty() => Some(bytes),
            _ => None,
        };
        return Err(RequestError::HttpStatus {
            code: response.status,
            message: response.status_message,
            body,
        });
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Method;
    use crate::http::mock::MockTransport;
    use std::time::Duration;

    #[tokio::test]
    async fn test_error_status_carries_body() {
        let mock = MockTransport::new();
        mock.respond(Method::Get, "http://host/missing", 404, "<fault/>");
        let invoker = HttpInvoker::new(Arc::new(mock));
        let err = invoker.invoke(HttpRequest::get("http://host/missing")).await.unwrap_err();
        assert_eq!(err.body_text().as_deref(), Some("<fault/>"));
        assert!(matches!(err, RequestError::HttpStatus { code: 404, .. }));
    }

    #[tokio::test]
    async fn test_buffered_transport_refuses_streams() {
        let invoker = HttpInvoker::new(Arc::new(MockTransport::new()));
        let sink: DownloadSink = Box::new(tokio::io::sink());
        let result = invoker.download(HttpRequest::get("http://host/c"), sink, None, None).await;
        assert_eq!(result.unwrap_err(), RequestError::StreamingNotSupported);
    }

    #[tokio::test]
    async fn test_download_reports_progress() {
        let mock = MockTransport::streaming();
        mock.respond(Method::Get, "http://host/c", 200, vec![7u8; 40]);
        let invoker = HttpInvoker::new(Arc::new(mock));
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let progress: ProgressCallback = Box::new(move |done, total| sink_seen.lock().push((done, total)));

        let file = tempfile::NamedTempFile::new().unwrap();
        let sink: DownloadSink = Box::new(tokio::fs::File::create(file.path()).await.unwrap());
        let response = invoker
            .download(HttpRequest::get("http://host/c"), sink, None, Some(progress))
            .await
            .unwrap();

        assert_eq!(response.body, ResponseBody::Streamed { bytes_written: 40 });
        assert_eq!(*seen.lock(), vec![(16, 40), (32, 40), (40, 40)]);
        assert_eq!(std::fs::read(file.path()).unwrap(), vec![7u8; 40]);
    }

    #[tokio::test]
    async fn test_dropped_future_cancels_held_request() {
        let mock = MockTransport::new();
        mock.respond(Method::Get, "http://host/slow", 200, "late");
        mock.hold();
        let invoker = HttpInvoker::new(Arc::new(mock.clone()));

        let timed = tokio::time::timeout(Duration::from_millis(20), invoker.invoke(HttpRequest::get("http://host/slow")));
        assert!(timed.await.is_err());
        assert_eq!(mock.held_count(), 1);
        // The cancel already delivered; the late response is discarded.
        assert_eq!(mock.release_held(), vec![false]);
    }
}
