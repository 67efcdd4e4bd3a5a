//! Requests and responses exchanged with a transport.

use std::fmt;

use bytes::Bytes;

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Basic authentication credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// One HTTP request. Bodies of streamed uploads travel separately.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
    pub credentials: Option<Credentials>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            credentials: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }
}

/// Body of a response: held in memory, or already written to the sink the
/// caller supplied. Never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    Buffered(Bytes),
    Streamed { bytes_written: u64 },
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub status_message: String,
    pub headers: Vec<(String, String)>,
    pub body: ResponseBody,
}

impl HttpResponse {
    /// A buffered response.
    pub fn buffered(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            status_message: String::new(),
            headers: Vec::new(),
            body: ResponseBody::Buffered(body.into()),
        }
    }

    /// Buffered body bytes; empty for streamed responses.
    pub fn bytes(&self) -> &[u8] {
        match &self.body {
            ResponseBody::Buffered(bytes) => bytes,
            ResponseBody::Streamed { .. } => &[],
        }
    }

    pub fn into_bytes(self) -> Bytes {
        match self.body {
            ResponseBody::Buffered(bytes) => bytes,
            ResponseBody::Streamed { .. } => Bytes::new(),
        }
    }

    /// First header value with the given name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
