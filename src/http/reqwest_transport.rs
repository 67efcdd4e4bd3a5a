//! [`HttpTransport`] over `reqwest`.

use std::future::Future;
use std::time::Duration;

use futures::{StreamExt, TryStreamExt};
use reqwest::header::{CONTENT_LENGTH, HeaderMap, HeaderName, HeaderValue};
use tokio::io::AsyncWriteExt;
use tokio::runtime::Handle;
use tokio_util::io::ReaderStream;
use tracing::{debug, trace, warn};

use super::error::RequestError;
use super::request::{CompletionCallback, ProgressCallback, ProgressReporter, RequestHandle, Responder, channel};
use super::response::{HttpRequest, HttpResponse, Method, ResponseBody};
use super::transport::{DownloadSink, HttpTransport, UploadStream};
use crate::common::error::{Error, Result};
use crate::config::SessionParameters;

/// Transport running each exchange as a task on a tokio runtime.
///
/// Cancelling a handle drops the in-flight `reqwest` future, which closes
/// the connection and stops any streamed body.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    runtime: Handle,
}

impl ReqwestTransport {
    /// Build a client from the session parameters. Must be called from
    /// within a tokio runtime, which then runs every exchange.
    pub fn new(parameters: &SessionParameters) -> Result<Self> {
        let runtime =
            Handle::try_current().map_err(|e| Error::Config(format!("No tokio runtime for the transport: {}", e)))?;

        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_millis(parameters.request_timeout_ms))
            .connect_timeout(Duration::from_millis(parameters.connect_timeout_ms))
            .default_headers(default_headers(parameters));
        if !parameters.user_agent.is_empty() {
            builder = builder.user_agent(parameters.user_agent.as_str());
        }
        if !parameters.proxy_url.is_empty() {
            let proxy = reqwest::Proxy::all(&parameters.proxy_url)
                .map_err(|e| Error::Config(format!("Invalid proxy url '{}': {}", parameters.proxy_url, e)))?;
            builder = builder.proxy(proxy);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, runtime })
    }

    /// Wrap an existing client.
    pub fn with_client(client: reqwest::Client, runtime: Handle) -> Self {
        Self { client, runtime }
    }

    fn build(&self, request: &HttpRequest) -> reqwest::RequestBuilder {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };
        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(credentials) = &request.credentials {
            builder = builder.basic_auth(&credentials.username, Some(&credentials.password));
        }
        builder
    }

    fn spawn<F>(&self, responder: Responder, exchange: F)
    where
        F: Future<Output = std::result::Result<HttpResponse, RequestError>> + Send + 'static,
    {
        let token = responder.token();
        self.runtime.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    responder.complete(Err(RequestError::Cancelled));
                },
                result = exchange => {
                    match &result {
                        Ok(response) => trace!(status = response.status, "exchange finished"),
                        Err(e) => debug!(error = %e, "exchange failed"),
                    }
                    responder.complete(result);
                },
            }
        });
    }
}

impl HttpTransport for ReqwestTransport {
    fn start_request(&self, request: HttpRequest, completion: CompletionCallback) -> RequestHandle {
        debug!(method = %request.method, url = %request.url, "starting request");
        let (handle, responder) = channel(completion, None);
        let mut builder = self.build(&request);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        self.spawn(responder, execute(builder));
        handle
    }

    fn supports_streaming(&self) -> bool {
        true
    }

    fn start_download(
        &self,
        request: HttpRequest,
        sink: DownloadSink,
        bytes_expected: Option<u64>,
        completion: CompletionCallback,
        progress: Option<ProgressCallback>,
    ) -> std::result::Result<RequestHandle, RequestError> {
        debug!(method = %request.method, url = %request.url, "starting download");
        let (handle, responder) = channel(completion, progress);
        let reporter = responder.progress_reporter();
        let builder = self.build(&request);
        self.spawn(responder, execute_download(builder, sink, bytes_expected, reporter));
        Ok(handle)
    }

    fn start_upload(
        &self,
        request: HttpRequest,
        upload: UploadStream,
        completion: CompletionCallback,
        progress: Option<ProgressCallback>,
    ) -> std::result::Result<RequestHandle, RequestError> {
        debug!(method = %request.method, url = %request.url, length = ?upload.length, "starting upload");
        let (handle, responder) = channel(completion, progress);
        let reporter = responder.progress_reporter();

        let total = upload.length.unwrap_or(0);
        let mut sent = 0u64;
        let chunks = ReaderStream::new(upload.reader).inspect_ok(move |chunk| {
            sent += chunk.len() as u64;
            reporter.report(sent, total);
        });
        let mut builder = self.build(&request).body(reqwest::Body::wrap_stream(chunks));
        if let Some(length) = upload.length {
            builder = builder.header(CONTENT_LENGTH, length);
        }
        self.spawn(responder, execute(builder));
        Ok(handle)
    }
}

fn default_headers(parameters: &SessionParameters) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in &parameters.additional_headers {
        match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            },
            _ => warn!(header = %name, "skipping invalid additional header"),
        }
    }
    headers
}

fn transport_failure(e: reqwest::Error) -> RequestError {
    RequestError::TransportFailure(e.to_string())
}

fn head(response: &reqwest::Response) -> (u16, String, Vec<(String, String)>) {
    let status = response.status();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| Some((name.as_str().to_string(), value.to_str().ok()?.to_string())))
        .collect();
    (
        status.as_u16(),
        status.canonical_reason().unwrap_or_default().to_string(),
        headers,
    )
}

async fn execute(builder: reqwest::RequestBuilder) -> std::result::Result<HttpResponse, RequestError> {
    let response = builder.send().await.map_err(transport_failure)?;
    let (status, status_message, headers) = head(&response);
    let body = response.bytes().await.map_err(transport_failure)?;
    Ok(HttpResponse {
        status,
        status_message,
        headers,
        body: ResponseBody::Buffered(body),
    })
}

async fn execute_download(
    builder: reqwest::RequestBuilder,
    mut sink: DownloadSink,
    bytes_expected: Option<u64>,
    reporter: ProgressReporter,
) -> std::result::Result<HttpResponse, RequestError> {
    let response = builder.send().await.map_err(transport_failure)?;
    let (status, status_message, headers) = head(&response);

    // Error bodies carry the fault description, never content.
    if status >= 400 {
        let body = response.bytes().await.map_err(transport_failure)?;
        return Ok(HttpResponse {
            status,
            status_message,
            headers,
            body: ResponseBody::Buffered(body),
        });
    }

    let total = response.content_length().or(bytes_expected).unwrap_or(0);
    let mut written = 0u64;
    let mut chunks = response.bytes_stream();
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk.map_err(transport_failure)?;
        sink.write_all(&chunk)
            .await
            .map_err(|e| RequestError::TransportFailure(format!("Failed to write download: {}", e)))?;
        written += chunk.len() as u64;
        reporter.report(written, total);
    }
    sink.flush()
        .await
        .map_err(|e| RequestError::TransportFailure(format!("Failed to flush download: {}", e)))?;

    Ok(HttpResponse {
        status,
        status_message,
        headers,
        body: ResponseBody::Streamed { bytes_written: written },
    })
}
