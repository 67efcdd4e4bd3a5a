//! Operations that change repository state.
//!
//! Each one evicts the objects it touches from the cache once its request
//! has finished, successful or not.

use tracing::{debug, trace, warn};

use super::{BindingError, BindingSession, EvictGuard};
use crate::atompub::constants::{
    MEDIATYPE_CMISTREE, MEDIATYPE_ENTRY, MEDIATYPE_FEED, REL_DOWN, REL_EDIT, REL_FOLDER_TREE, REL_SELF,
};
use crate::atompub::writer::entry_xml;
use crate::atompub::{ObjectFetchOptions, UnfileObject, append_query_param, decode_feed, decode_object_entry};
use crate::http::{HttpResponse, Method, RequestError};
use crate::model::{CmisProperties, ObjectData};

impl BindingSession {
    /// Create a folder under `parent_id`. Returns the new object id.
    pub async fn create_folder(&self, parent_id: &str, properties: &CmisProperties) -> Result<String, BindingError> {
        let url = self.resolve_link(parent_id, REL_DOWN, Some(MEDIATYPE_FEED)).await?;
        let _evict = EvictGuard::new(&self.cache, &[parent_id]);

        let body = entry_xml(properties, properties.string_value(crate::model::properties::PROP_NAME));
        let request = self
            .request(Method::Post, &url)
            .header("Content-Type", MEDIATYPE_ENTRY)
            .body(body);
        let response = self.send(request, parent_id).await?;
        let created = decode_object_entry(response.bytes())?;
        debug!(parent_id = %parent_id, object_id = %created.object_id, "folder created");
        Ok(created.object_id)
    }

    /// Update properties of an object through its `edit` link, or `self`
    /// when the repository advertises no `edit` link.
    ///
    /// Returns the object as the repository reports it after the update.
    /// The repository may assign a new object id.
    pub async fn update_properties(
        &self,
        object_id: &str,
        properties: &CmisProperties,
        change_token: Option<&str>,
    ) -> Result<ObjectData, BindingError> {
        let object = self.object_for_links(object_id).await?;
        let mut url = object
            .links
            .find(REL_EDIT, None)
            .or_else(|| object.links.find(REL_SELF, None))
            .ok_or_else(|| BindingError::NotSupported(format!("object {} has no edit link", object_id)))?
            .to_string();
        if let Some(token) = change_token {
            url = append_query_param(&url, "changeToken", token);
        }
        let _evict = EvictGuard::new(&self.cache, &[object_id]);

        let request = self
            .request(Method::Put, &url)
            .header("Content-Type", MEDIATYPE_ENTRY)
            .body(entry_xml(properties, None));
        let response = self.send(request, object_id).await?;
        debug!(object_id = %object_id, "properties updated");

        if response.bytes().is_empty() {
            self.fetch_fresh(object_id).await
        } else {
            Ok(decode_object_entry(response.bytes())?)
        }
    }

    /// Delete an object through its `self` link.
    ///
    /// `all_versions` is accepted for interface parity; the AtomPub binding
    /// always deletes the addressed version only.
    pub async fn delete_object(&self, object_id: &str, all_versions: bool) -> Result<(), BindingError> {
        if all_versions {
            trace!(object_id = %object_id, "allVersions is not applied by the AtomPub binding");
        }
        let url = self.resolve_link(object_id, REL_SELF, None).await?;
        let _evict = EvictGuard::new(&self.cache, &[object_id]);
        self.send(self.request(Method::Delete, &url), object_id).await?;
        debug!(object_id = %object_id, "object deleted");
        Ok(())
    }

    /// Delete a folder and its descendants. Returns the ids of objects the
    /// repository failed to delete.
    ///
    /// `all_versions` is accepted and ignored, as for [`delete_object`](Self::delete_object).
    pub async fn delete_tree(
        &self,
        folder_id: &str,
        all_versions: bool,
        unfile_objects: UnfileObject,
        continue_on_failure: bool,
    ) -> Result<Vec<String>, BindingError> {
        if all_versions {
            trace!(folder_id = %folder_id, "allVersions is not applied by the AtomPub binding");
        }
        let object = self.object_for_links(folder_id).await?;
        let url = object
            .links
            .iter()
            .find(|link| {
                link.relation == REL_DOWN
                    && link
                        .media_type
                        .as_deref()
                        .is_some_and(|t| crate::model::media_types_match(t, MEDIATYPE_CMISTREE))
            })
            .map(|link| link.href.as_str())
            .or_else(|| object.links.find(REL_FOLDER_TREE, None))
            .ok_or_else(|| BindingError::NotSupported(format!("folder {} has no tree link", folder_id)))?;
        let url = append_query_param(url, "unfileObjects", unfile_objects.as_str());
        let url = append_query_param(&url, "continueOnFailure", if continue_on_failure { "true" } else { "false" });
        let _evict = EvictGuard::new(&self.cache, &[folder_id]);

        match self.invoker.invoke(self.request(Method::Delete, &url)).await {
            Ok(response) => Ok(failed_object_ids(&response)),
            Err(RequestError::HttpStatus {
                code,
                message,
                body: Some(body),
            }) => match decode_feed(&body) {
                Ok(failed) if !failed.is_empty() => {
                    warn!(folder_id = %folder_id, failed = failed.len(), "tree deleted partially");
                    Ok(failed.into_iter().map(|o| o.object_id).collect())
                },
                _ => Err(BindingError::from_status(code, message, Some(body), folder_id)),
            },
            Err(e) => Err(BindingError::from_request(e, folder_id)),
        }
    }

    /// Object fetched with default options, bypassing any cached copy.
    pub(super) async fn fetch_fresh(&self, object_id: &str) -> Result<ObjectData, BindingError> {
        self.cache.evict(object_id);
        self.retrieve_object(object_id, &ObjectFetchOptions::default()).await
    }
}

/// Ids listed in the failure feed of a successful tree deletion.
fn failed_object_ids(response: &HttpResponse) -> Vec<String> {
    if response.bytes().is_empty() {
        return Vec::new();
    }
    match decode_feed(response.bytes()) {
        Ok(failed) => failed.into_iter().map(|o| o.object_id).collect(),
        Err(e) => {
            warn!(error = %e, "could not decode failed objects of tree deletion");
            Vec::new()
        },
    }
}
