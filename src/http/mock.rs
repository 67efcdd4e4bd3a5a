//! Scripted transport for tests.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::error::RequestError;
use super::request::{CompletionCallback, ProgressCallback, RequestHandle, Responder, channel};
use super::response::{Credentials, HttpRequest, HttpResponse, Method, ResponseBody};
use super::transport::{DownloadSink, HttpTransport, UploadStream};

/// Chunk size used when replaying a download into a sink.
const DOWNLOAD_CHUNK: usize = 16;

#[derive(Debug, Clone)]
pub enum Canned {
    Response {
        status: u16,
        body: Bytes,
        headers: Vec<(String, String)>,
    },
    Failure(RequestError),
}

impl Canned {
    fn result(&self) -> Result<HttpResponse, RequestError> {
        match self {
            Canned::Response { status, body, headers } => Ok(HttpResponse {
                status: *status,
                status_message: String::new(),
                headers: headers.clone(),
                body: ResponseBody::Buffered(body.clone()),
            }),
            Canned::Failure(e) => Err(e.clone()),
        }
    }
}

/// A request as seen by the transport. Streamed upload bodies are read to
/// the end and stored in `body`.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
    pub credentials: Option<Credentials>,
}

impl RecordedRequest {
    pub fn body_text(&self) -> String {
        self.body
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Default)]
struct State {
    routes: HashMap<(Method, String), Canned>,
    requests: Vec<RecordedRequest>,
    hold: bool,
    held: Vec<(Responder, Result<HttpResponse, RequestError>)>,
}

/// Transport answering from a route table keyed by method and exact URL.
/// Unrouted requests answer 404.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<State>>,
    streaming: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn streaming() -> Self {
        Self {
            streaming: true,
            ..Self::default()
        }
    }

    pub fn respond(&self, method: Method, url: &str, status: u16, body: impl Into<Bytes>) {
        self.route(
            method,
            url,
            Canned::Response {
                status,
                body: body.into(),
                headers: Vec::new(),
            },
        );
    }

    pub fn fail(&self, method: Method, url: &str, error: RequestError) {
        self.route(method, url, Canned::Failure(error));
    }

    pub fn route(&self, method: Method, url: &str, canned: Canned) {
        self.state.lock().routes.insert((method, url.to_string()), canned);
    }

    /// Keep responders instead of completing them until [`release_held`](Self::release_held).
    pub fn hold(&self) {
        self.state.lock().hold = true;
    }

    /// Complete every held request. Returns, per request, whether the result
    /// reached the caller.
    pub fn release_held(&self) -> Vec<bool> {
        let held = {
            let mut state = self.state.lock();
            state.hold = false;
            std::mem::take(&mut state.held)
        };
        held.into_iter()
            .map(|(responder, result)| responder.complete(result))
            .collect()
    }

    pub fn held_count(&self) -> usize {
        self.state.lock().held.len()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().requests.clone()
    }

    pub fn count(&self, method: Method, url: &str) -> usize {
        self.state
            .lock()
            .requests
            .iter()
            .filter(|r| r.method == method && r.url == url)
            .count()
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.state.lock().requests.last().cloned()
    }

    fn answer(&self, request: &HttpRequest, body: Option<Bytes>) -> Result<HttpResponse, RequestError> {
        let mut state = self.state.lock();
        state.requests.push(RecordedRequest {
            method: request.method,
            url: request.url.clone(),
            headers: request.headers.clone(),
            body,
            credentials: request.credentials.clone(),
        });
        state
            .routes
            .get(&(request.method, request.url.clone()))
            .map(Canned::result)
            .unwrap_or_else(|| Ok(HttpResponse::buffered(404, "")))
    }

    fn finish(&self, responder: Responder, result: Result<HttpResponse, RequestError>) {
        let mut state = self.state.lock();
        if state.hold {
            state.held.push((responder, result));
            return;
        }
        drop(state);
        responder.complete(result);
    }
}

impl HttpTransport for MockTransport {
    fn start_request(&self, request: HttpRequest, completion: CompletionCallback) -> RequestHandle {
        let (handle, responder) = channel(completion, None);
        let result = self.answer(&request, request.body.clone());
        self.finish(responder, result);
        handle
    }

    fn supports_streaming(&self) -> bool {
        self.streaming
    }

    fn start_download(
        &self,
        request: HttpRequest,
        mut sink: DownloadSink,
        bytes_expected: Option<u64>,
        completion: CompletionCallback,
        progress: Option<ProgressCallback>,
    ) -> Result<RequestHandle, RequestError> {
        if !self.streaming {
            return Err(RequestError::StreamingNotSupported);
        }
        let (handle, responder) = channel(completion, progress);
        let result = self.answer(&request, None);
        let transport = self.clone();
        tokio::spawn(async move {
            let response = match result {
                Ok(response) if response.status < 400 => response,
                other => return transport.finish(responder, other),
            };
            let body = response.bytes().to_vec();
            let total = bytes_expected.unwrap_or(body.len() as u64);
            let mut written = 0u64;
            for chunk in body.chunks(DOWNLOAD_CHUNK) {
                if responder.is_cancelled() {
                    break;
                }
                if let Err(e) = sink.write_all(chunk).await {
                    return transport.finish(responder, Err(RequestError::TransportFailure(e.to_string())));
                }
                written += chunk.len() as u64;
                responder.progress(written, total);
            }
            let _ = sink.flush().await;
            let streamed = HttpResponse {
                body: ResponseBody::Streamed { bytes_written: written },
                ..response
            };
            transport.finish(responder, Ok(streamed));
        });
        Ok(handle)
    }

    fn start_upload(
        &self,
        request: HttpRequest,
        mut upload: UploadStream,
        completion: CompletionCallback,
        progress: Option<ProgressCallback>,
    ) -> Result<RequestHandle, RequestError> {
        if !self.streaming {
            return Err(RequestError::StreamingNotSupported);
        }
        let (handle, responder) = channel(completion, progress);
        let transport = self.clone();
        tokio::spawn(async move {
            let mut body = Vec::new();
            if let Err(e) = upload.reader.read_to_end(&mut body).await {
                return transport.finish(responder, Err(RequestError::TransportFailure(e.to_string())));
            }
            let total = upload.length.unwrap_or(body.len() as u64);
            responder.progress(body.len() as u64, total);
            let result = transport.answer(&request, Some(Bytes::from(body)));
            transport.finish(responder, result);
        });
        Ok(handle)
    }
}
