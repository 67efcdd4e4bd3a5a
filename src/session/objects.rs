//! Object retrieval and link resolution.

use tracing::{debug, trace};

use super::{BindingError, BindingSession};
use crate::atompub::constants::{
    MEDIATYPE_ALLOWABLE_ACTIONS, MEDIATYPE_ENTRY, MEDIATYPE_FEED, REL_ALLOWABLE_ACTIONS, REL_DOWN,
};
use crate::atompub::{ObjectByIdUriBuilder, ObjectFetchOptions, decode_allowable_actions, decode_feed, decode_object_entry};
use crate::model::template::{TEMPLATE_OBJECT_BY_ID, TEMPLATE_OBJECT_BY_PATH};
use crate::model::{AllowableActions, ObjectData, Rendition};

impl BindingSession {
    /// Fetch the object with id `object_id`.
    ///
    /// Only the options set in `options` are sent. A cached copy fetched
    /// with equal options is returned without a request; otherwise the
    /// fetched object replaces whatever the cache held for the id. A
    /// repository advertising no `objectbyid` template yields
    /// [`BindingError::ObjectNotFound`] for uncached ids.
    pub async fn retrieve_object(&self, object_id: &str, options: &ObjectFetchOptions) -> Result<ObjectData, BindingError> {
        if let Some(object) = self.cache.get_matching(object_id, options) {
            trace!(object_id = %object_id, "object cache hit");
            return Ok(object);
        }
        trace!(object_id = %object_id, "object cache miss");

        // Without the template an uncached id cannot be looked up at all.
        let template = self
            .uri_template(TEMPLATE_OBJECT_BY_ID)
            .map_err(|err| match err {
                BindingError::NotSupported(reason) => {
                    debug!(object_id = %object_id, %reason, "object cannot be fetched");
                    BindingError::ObjectNotFound {
                        target: object_id.to_string(),
                        body: None,
                    }
                },
                other => other,
            })?;
        let url = ObjectByIdUriBuilder::new(&template, object_id)
            .options(options)
            .build();
        self.fetch_object(&url, object_id, options).await
    }

    /// Fetch the object at `path`. The result is cached under its object
    /// id; paths are never cache keys.
    pub async fn retrieve_object_by_path(&self, path: &str, options: &ObjectFetchOptions) -> Result<ObjectData, BindingError> {
        let template = self.uri_template(TEMPLATE_OBJECT_BY_PATH)?;
        let url = ObjectByIdUriBuilder::for_path(&template, path)
            .options(options)
            .build();
        self.fetch_object(&url, path, options).await
    }

    pub(super) async fn fetch_object(
        &self,
        url: &str,
        target: &str,
        options: &ObjectFetchOptions,
    ) -> Result<ObjectData, BindingError> {
        let ticket = self.cache.ticket();
        let body = self.get(url, MEDIATYPE_ENTRY, target).await?;
        let object = decode_object_entry(&body)?;
        if self.cache.insert(ticket, object.clone(), options.clone()) {
            trace!(object_id = %object.object_id, "object cached");
        } else {
            debug!(object_id = %object.object_id, "object changed while fetching; not cached");
        }
        Ok(object)
    }

    /// Cached copy of the object, fetched with default options on a miss.
    pub(super) async fn object_for_links(&self, object_id: &str) -> Result<ObjectData, BindingError> {
        match self.cache.get(object_id) {
            Some(object) => Ok(object),
            None => self.retrieve_object(object_id, &ObjectFetchOptions::default()).await,
        }
    }

    /// Resolve the `relation` link of an object to its href.
    ///
    /// With `media_type`, a link of that type is preferred; a link with the
    /// relation alone is the fallback. Fails with
    /// [`BindingError::ObjectNotFound`] when the object cannot be fetched
    /// and with [`BindingError::NotSupported`] when it has no such link.
    pub async fn resolve_link(
        &self,
        object_id: &str,
        relation: &str,
        media_type: Option<&str>,
    ) -> Result<String, BindingError> {
        let object = self.object_for_links(object_id).await?;
        match object.links.find(relation, media_type) {
            Some(href) => {
                trace!(object_id = %object_id, relation = %relation, href = %href, "link resolved");
                Ok(href.to_string())
            },
            None => Err(BindingError::NotSupported(format!(
                "object {} has no '{}' link",
                object_id, relation
            ))),
        }
    }

    pub async fn retrieve_allowable_actions(&self, object_id: &str) -> Result<AllowableActions, BindingError> {
        let url = self.resolve_link(object_id, REL_ALLOWABLE_ACTIONS, None).await?;
        let body = self.get(&url, MEDIATYPE_ALLOWABLE_ACTIONS, object_id).await?;
        let mut actions = decode_allowable_actions(&body)?;
        actions.object_id.get_or_insert_with(|| object_id.to_string());
        Ok(actions)
    }

    /// Children of a folder, from its `down` feed.
    pub async fn retrieve_children(&self, folder_id: &str) -> Result<Vec<ObjectData>, BindingError> {
        let url = self.resolve_link(folder_id, REL_DOWN, Some(MEDIATYPE_FEED)).await?;
        let body = self.get(&url, MEDIATYPE_FEED, folder_id).await?;
        Ok(decode_feed(&body)?)
    }

    /// Renditions of an object matching `rendition_filter`.
    ///
    /// The AtomPub binding returns renditions with the object, so
    /// `max_items` and `skip_count` are accepted but the whole set is
    /// returned.
    pub async fn retrieve_renditions(
        &self,
        object_id: &str,
        rendition_filter: &str,
        max_items: Option<u64>,
        skip_count: Option<u64>,
    ) -> Result<Vec<Rendition>, BindingError> {
        if max_items.is_some() || skip_count.is_some() {
            trace!(object_id = %object_id, "rendition paging is not applied by the AtomPub binding");
        }
        let options = ObjectFetchOptions::new().rendition_filter(rendition_filter);
        Ok(self.retrieve_object(object_id, &options).await?.renditions)
    }
}
