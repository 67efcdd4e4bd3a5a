//! Content streams for uploads and downloads.
//!
//! Document content is never buffered whole. Uploads are streamed as an
//! Atom entry whose `cmisra:base64` element is encoded on the fly; downloads
//! go straight to a caller-provided sink.

use std::io;
use std::path::Path;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio_util::io::StreamReader;

use super::error::BindingError;
use crate::atompub::writer::ContentEntryParts;
use crate::http::UploadStream;

/// Bytes read from the source per encoded chunk; a multiple of 3 so chunks
/// encode without padding.
const ENCODE_CHUNK: usize = 48 * 1024;

/// Destination of downloaded content.
pub type ContentSink = Box<dyn AsyncWrite + Send + Unpin>;

/// Content to upload.
pub struct ContentSource {
    pub reader: Box<dyn AsyncRead + Send + Unpin>,
    /// Length in bytes when known; enables `Content-Length` and progress totals
    pub length: Option<u64>,
    pub mime_type: String,
}

impl ContentSource {
    pub fn new(reader: impl AsyncRead + Send + Unpin + 'static, length: Option<u64>, mime_type: impl Into<String>) -> Self {
        Self {
            reader: Box::new(reader),
            length,
            mime_type: mime_type.into(),
        }
    }

    /// Content already held in memory.
    pub fn from_bytes(content: impl Into<Bytes>, mime_type: impl Into<String>) -> Self {
        let content = content.into();
        let length = content.len() as u64;
        Self::new(io::Cursor::new(content), Some(length), mime_type)
    }
}

impl std::fmt::Debug for ContentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentSource")
            .field("length", &self.length)
            .field("mime_type", &self.mime_type)
            .finish_non_exhaustive()
    }
}

/// Opens local content for upload and creates download destinations.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn open_source(&self, path: &Path, mime_type: &str) -> Result<ContentSource, BindingError>;

    async fn create_sink(&self, path: &Path) -> Result<ContentSink, BindingError>;
}

/// [`ContentStore`] over the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalContentStore;

#[async_trait]
impl ContentStore for LocalContentStore {
    async fn open_source(&self, path: &Path, mime_type: &str) -> Result<ContentSource, BindingError> {
        let file = tokio::fs::File::open(path).await?;
        let length = file.metadata().await?.len();
        Ok(ContentSource::new(file, Some(length), mime_type))
    }

    async fn create_sink(&self, path: &Path) -> Result<ContentSink, BindingError> {
        let file = tokio::fs::File::create(path).await?;
        Ok(Box::new(file))
    }
}

/// Encoded length of `length` bytes of base64 with padding.
#[inline]
pub fn base64_len(length: u64) -> u64 {
    length.div_ceil(3) * 4
}

/// Base64 of everything `reader` yields, one chunk per read batch.
fn encode_base64(reader: Box<dyn AsyncRead + Send + Unpin>) -> impl Stream<Item = io::Result<Bytes>> + Send {
    stream::unfold(Some((reader, Vec::with_capacity(ENCODE_CHUNK))), |state| async move {
        let (mut reader, mut pending) = state?;
        let mut buf = vec![0u8; ENCODE_CHUNK];
        loop {
            let read = match reader.read(&mut buf).await {
                Ok(read) => read,
                Err(e) => return Some((Err(e), None)),
            };
            if read == 0 {
                if pending.is_empty() {
                    return None;
                }
                let tail = BASE64_STANDARD.encode(&pending);
                return Some((Ok(Bytes::from(tail)), None));
            }
            pending.extend_from_slice(&buf[..read]);
            let whole = pending.len() / 3 * 3;
            if whole < ENCODE_CHUNK {
                continue;
            }
            let encoded = BASE64_STANDARD.encode(&pending[..whole]);
            pending.drain(..whole);
            return Some((Ok(Bytes::from(encoded)), Some((reader, pending))));
        }
    })
}

/// Atom entry body with `source` encoded between the two halves of `parts`.
pub fn entry_upload(parts: ContentEntryParts, source: ContentSource) -> UploadStream {
    let length = source
        .length
        .map(|length| parts.prefix.len() as u64 + base64_len(length) + parts.suffix.len() as u64);
    let body = stream::once(async move { Ok(Bytes::from(parts.prefix)) })
        .chain(encode_base64(source.reader))
        .chain(stream::once(async move { Ok(Bytes::from(parts.suffix)) }));
    UploadStream::new(StreamReader::new(Box::pin(body)), length)
}
