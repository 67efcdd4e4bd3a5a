//! Content stream upload and download.
//!
//! These operations need a streaming transport and fail with
//! [`BindingError::NotSupported`] before any request is made otherwise.

use std::path::Path;

use tracing::debug;

use super::content::{ContentSink, ContentSource, entry_upload};
use super::{BindingError, BindingSession, EvictGuard};
use crate::atompub::constants::{MEDIATYPE_ENTRY, MEDIATYPE_FEED, REL_DOWN, REL_EDIT_MEDIA};
use crate::atompub::writer::content_entry_parts;
use crate::atompub::{append_query_param, decode_object_entry};
use crate::http::{Method, ProgressCallback, ResponseBody, UploadStream};
use crate::model::CmisProperties;
use crate::model::properties::{PROP_CONTENT_STREAM_LENGTH, PROP_NAME};

impl BindingSession {
    fn require_streaming(&self) -> Result<(), BindingError> {
        if self.invoker.supports_streaming() {
            Ok(())
        } else {
            Err(BindingError::NotSupported(
                "the transport does not support streamed transfers".to_string(),
            ))
        }
    }

    /// Create a document with content under `parent_id`. The content is
    /// base64 encoded into the entry while it is uploaded. Returns the new
    /// object id.
    pub async fn create_document(
        &self,
        parent_id: &str,
        properties: &CmisProperties,
        content: ContentSource,
        progress: Option<ProgressCallback>,
    ) -> Result<String, BindingError> {
        self.require_streaming()?;
        let url = self.resolve_link(parent_id, REL_DOWN, Some(MEDIATYPE_FEED)).await?;
        let _evict = EvictGuard::new(&self.cache, &[parent_id]);

        let parts = content_entry_parts(properties, properties.string_value(PROP_NAME), &content.mime_type);
        let upload = entry_upload(parts, content);
        let request = self
            .request(Method::Post, &url)
            .header("Content-Type", MEDIATYPE_ENTRY);
        let response = self
            .invoker
            .upload(request, upload, progress)
            .await
            .map_err(|e| BindingError::from_request(e, parent_id))?;
        let created = decode_object_entry(response.bytes())?;
        debug!(parent_id = %parent_id, object_id = %created.object_id, "document created");
        Ok(created.object_id)
    }

    /// [`create_document`](Self::create_document) with content read from a
    /// file through the session's content store.
    pub async fn create_document_from_path(
        &self,
        parent_id: &str,
        properties: &CmisProperties,
        path: &Path,
        mime_type: &str,
        progress: Option<ProgressCallback>,
    ) -> Result<String, BindingError> {
        self.require_streaming()?;
        let content = self.content_store.open_source(path, mime_type).await?;
        self.create_document(parent_id, properties, content, progress).await
    }

    /// Write the content stream of an object, or of its rendition
    /// `stream_id`, into `sink`. Returns the number of bytes written.
    pub async fn download_content(
        &self,
        object_id: &str,
        stream_id: Option<&str>,
        sink: ContentSink,
        progress: Option<ProgressCallback>,
    ) -> Result<u64, BindingError> {
        self.require_streaming()?;
        let object = self.object_for_links(object_id).await?;
        let mut url = object
            .atom
            .content_src
            .clone()
            .or_else(|| object.links.find(REL_EDIT_MEDIA, None).map(str::to_string))
            .ok_or_else(|| BindingError::NotSupported(format!("object {} has no content stream", object_id)))?;
        if let Some(stream_id) = stream_id {
            url = append_query_param(&url, "streamId", stream_id);
        }
        let expected = object
            .properties
            .get(PROP_CONTENT_STREAM_LENGTH)
            .and_then(|p| p.first_value())
            .and_then(|v| v.as_i64())
            .and_then(|length| u64::try_from(length).ok());

        let response = self
            .invoker
            .download(self.request(Method::Get, &url), sink, expected, progress)
            .await
            .map_err(|e| BindingError::from_request(e, object_id))?;
        let written = match response.body {
            ResponseBody::Streamed { bytes_written } => bytes_written,
            ResponseBody::Buffered(_) => 0,
        };
        debug!(object_id = %object_id, bytes = written, "content downloaded");
        Ok(written)
    }

    /// [`download_content`](Self::download_content) into a file created
    /// through the session's content store.
    pub async fn download_content_to_path(
        &self,
        object_id: &str,
        stream_id: Option<&str>,
        path: &Path,
        progress: Option<ProgressCallback>,
    ) -> Result<u64, BindingError> {
        self.require_streaming()?;
        let sink = self.content_store.create_sink(path).await?;
        self.download_content(object_id, stream_id, sink, progress).await
    }

    /// Replace the content stream of an object through its `edit-media`
    /// link. With `overwrite` false the repository refuses to replace
    /// existing content.
    pub async fn change_content(
        &self,
        object_id: &str,
        content: ContentSource,
        overwrite: bool,
        change_token: Option<&str>,
        progress: Option<ProgressCallback>,
    ) -> Result<(), BindingError> {
        self.require_streaming()?;
        let url = self.resolve_link(object_id, REL_EDIT_MEDIA, None).await?;
        let mut url = append_query_param(&url, "overwriteFlag", if overwrite { "true" } else { "false" });
        if let Some(token) = change_token {
            url = append_query_param(&url, "changeToken", token);
        }
        let _evict = EvictGuard::new(&self.cache, &[object_id]);

        let request = self
            .request(Method::Put, &url)
            .header("Content-Type", content.mime_type.as_str());
        let upload = UploadStream {
            reader: content.reader,
            length: content.length,
        };
        self.invoker
            .upload(request, upload, progress)
            .await
            .map_err(|e| BindingError::from_request(e, object_id))?;
        debug!(object_id = %object_id, "content changed");
        Ok(())
    }

    /// Remove the content stream of an object.
    pub async fn delete_content(&self, object_id: &str, change_token: Option<&str>) -> Result<(), BindingError> {
        let mut url = self.resolve_link(object_id, REL_EDIT_MEDIA, None).await?;
        if let Some(token) = change_token {
            url = append_query_param(&url, "changeToken", token);
        }
        let _evict = EvictGuard::new(&self.cache, &[object_id]);
        self.send(self.request(Method::Delete, &url), object_id).await?;
        debug!(object_id = %object_id, "content deleted");
        Ok(())
    }
}
