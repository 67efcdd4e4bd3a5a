//! Binding session and link resolver.
//!
//! A [`BindingSession`] bootstraps from the service document, keeps the
//! workspace and repository tables of the endpoint, resolves link relations
//! of objects into request URIs, and caches decoded objects. Requests go
//! through an [`HttpInvoker`]; responses are decoded by
//! [`crate::atompub::parser`].
//!
//! # Example
//!
//! ```no_run
//! use cmis_atompub::atompub::ObjectFetchOptions;
//! use cmis_atompub::config::SessionParameters;
//! use cmis_atompub::session::BindingSession;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut parameters = SessionParameters::new("http://localhost:8080/cmis/atom");
//! parameters.username = "admin".to_string();
//! parameters.password = "admin".to_string();
//!
//! let session = BindingSession::with_reqwest(parameters)?;
//! session.connect().await?;
//!
//! let root_id = session.repository_info()?.root_folder_id;
//! for child in session.retrieve_children(&root_id).await? {
//!     println!("{} {:?}", child.object_id, child.name());
//! }
//! let root = session.retrieve_object(&root_id, &ObjectFetchOptions::new()).await?;
//! println!("{:?}", root.allowable_actions);
//! # Ok(())
//! # }
//! ```

mod cache;
pub mod content;
mod error;
mod objects;
mod transfer;
mod write;

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::atompub::constants::MEDIATYPE_SERVICE;
use crate::atompub::decode_service_document;
use crate::config::SessionParameters;
use crate::http::{Credentials, HttpInvoker, HttpRequest, HttpResponse, HttpTransport, Method};
use crate::model::{RepositoryInfo, UriTemplate, Workspace};

pub use cache::{FetchTicket, ObjectCache};
pub use content::{ContentSink, ContentSource, ContentStore, LocalContentStore};
pub use error::BindingError;

#[derive(Debug, Default)]
struct SessionState {
    endpoint: String,
    credentials: Option<Credentials>,
    workspaces: Vec<Workspace>,
    repositories: HashMap<String, RepositoryInfo>,
    selected: Option<String>,
}

impl SessionState {
    fn selected_workspace(&self) -> Result<&Workspace, BindingError> {
        let selected = self
            .selected
            .as_deref()
            .ok_or_else(|| BindingError::NoRepositoryFound("session is not bootstrapped".to_string()))?;
        self.workspaces
            .iter()
            .find(|w| w.repository_info.id == selected)
            .ok_or_else(|| BindingError::NoRepositoryFound(selected.to_string()))
    }
}

/// A session against one AtomPub endpoint.
///
/// All methods take `&self`; a session can be shared across tasks behind an
/// `Arc`. The object cache belongs to the session and is never shared.
pub struct BindingSession {
    parameters: SessionParameters,
    invoker: HttpInvoker,
    content_store: Arc<dyn ContentStore>,
    state: RwLock<SessionState>,
    cache: ObjectCache,
}

impl BindingSession {
    pub fn new(parameters: SessionParameters, transport: Arc<dyn HttpTransport>) -> Self {
        let cache = ObjectCache::new(parameters.object_cache_capacity);
        Self {
            parameters,
            invoker: HttpInvoker::new(transport),
            content_store: Arc::new(LocalContentStore),
            state: RwLock::new(SessionState::default()),
            cache,
        }
    }

    /// Session over a [`ReqwestTransport`](crate::http::ReqwestTransport)
    /// configured from `parameters`. Must be called within a tokio runtime.
    #[cfg(feature = "reqwest-transport")]
    pub fn with_reqwest(parameters: SessionParameters) -> crate::common::error::Result<Self> {
        let transport = crate::http::ReqwestTransport::new(&parameters)?;
        Ok(Self::new(parameters, Arc::new(transport)))
    }

    /// Replace the store used by the path-based content helpers.
    pub fn with_content_store(mut self, store: Arc<dyn ContentStore>) -> Self {
        self.content_store = store;
        self
    }

    pub fn parameters(&self) -> &SessionParameters {
        &self.parameters
    }

    pub fn cache(&self) -> &ObjectCache {
        &self.cache
    }

    /// Bootstrap from the endpoint and credentials of the session parameters.
    pub async fn connect(&self) -> Result<(), BindingError> {
        let endpoint = self.parameters.atompub_url.clone();
        self.bootstrap(&endpoint, self.parameters.credentials()).await
    }

    /// Fetch the service document at `endpoint` and load its workspaces.
    ///
    /// The repository named by `repository_id` in the parameters is selected,
    /// or the first workspace when none is configured. Any previous state,
    /// cached objects included, is discarded.
    pub async fn bootstrap(&self, endpoint: &str, credentials: Option<Credentials>) -> Result<(), BindingError> {
        info!(endpoint = %endpoint, "bootstrapping session");
        let request = HttpRequest::get(endpoint)
            .header("Accept", MEDIATYPE_SERVICE)
            .credentials(credentials.clone());
        let response = self
            .invoker
            .invoke(request)
            .await
            .map_err(|e| BindingError::from_request(e, endpoint))?;
        let document = decode_service_document(response.bytes())?;

        if document.workspaces.is_empty() {
            warn!(endpoint = %endpoint, "service document lists no workspaces");
            return Err(BindingError::NoRepositoryFound(endpoint.to_string()));
        }

        let selected = match &self.parameters.repository_id {
            Some(id) if document.workspace(id).is_some() => id.clone(),
            Some(id) => return Err(BindingError::NoRepositoryFound(id.clone())),
            None => document.workspaces[0].repository_info.id.clone(),
        };
        let repositories: HashMap<String, RepositoryInfo> = document
            .workspaces
            .iter()
            .map(|w| (w.repository_info.id.clone(), w.repository_info.clone()))
            .collect();
        debug!(
            workspaces = document.workspaces.len(),
            repository_id = %selected,
            "service document loaded"
        );

        let mut state = self.state.write();
        *state = SessionState {
            endpoint: endpoint.to_string(),
            credentials,
            workspaces: document.workspaces,
            repositories,
            selected: Some(selected),
        };
        self.cache.clear();
        Ok(())
    }

    /// Info of the selected repository.
    pub fn repository_info(&self) -> Result<RepositoryInfo, BindingError> {
        Ok(self.state.read().selected_workspace()?.repository_info.clone())
    }

    /// Every repository of the endpoint, keyed by id.
    pub fn repositories(&self) -> HashMap<String, RepositoryInfo> {
        self.state.read().repositories.clone()
    }

    pub fn workspaces(&self) -> Vec<Workspace> {
        self.state.read().workspaces.clone()
    }

    pub fn endpoint(&self) -> String {
        self.state.read().endpoint.clone()
    }

    pub fn selected_repository_id(&self) -> Option<String> {
        self.state.read().selected.clone()
    }

    /// Switch to another repository of the endpoint. Cached objects belong
    /// to the previous repository and are dropped.
    pub fn select_repository(&self, repository_id: &str) -> Result<(), BindingError> {
        let mut state = self.state.write();
        if !state.repositories.contains_key(repository_id) {
            return Err(BindingError::NoRepositoryFound(repository_id.to_string()));
        }
        if state.selected.as_deref() != Some(repository_id) {
            debug!(repository_id = %repository_id, "selecting repository");
            state.selected = Some(repository_id.to_string());
            self.cache.clear();
        }
        Ok(())
    }

    /// Refetch the info of the selected repository from its workspace's
    /// `repositoryInfo` as served in a fresh service document.
    pub async fn refresh_repository_info(&self) -> Result<RepositoryInfo, BindingError> {
        let (endpoint, credentials) = {
            let state = self.state.read();
            (state.endpoint.clone(), state.credentials.clone())
        };
        let request = HttpRequest::get(&endpoint)
            .header("Accept", MEDIATYPE_SERVICE)
            .credentials(credentials);
        let response = self
            .invoker
            .invoke(request)
            .await
            .map_err(|e| BindingError::from_request(e, &endpoint))?;
        let document = decode_service_document(response.bytes())?;

        let mut state = self.state.write();
        let selected = state
            .selected
            .clone()
            .ok_or_else(|| BindingError::NoRepositoryFound("session is not bootstrapped".to_string()))?;
        let workspace = document
            .workspaces
            .into_iter()
            .find(|w| w.repository_info.id == selected)
            .ok_or_else(|| BindingError::NoRepositoryFound(selected.clone()))?;
        let info = workspace.repository_info.clone();
        state.repositories.insert(selected.clone(), info.clone());
        if let Some(slot) = state
            .workspaces
            .iter_mut()
            .find(|w| w.repository_info.id == selected)
        {
            *slot = workspace;
        }
        Ok(info)
    }

    fn uri_template(&self, template_type: &str) -> Result<UriTemplate, BindingError> {
        let state = self.state.read();
        state
            .selected_workspace()?
            .uri_template(template_type)
            .cloned()
            .ok_or_else(|| {
                BindingError::NotSupported(format!("repository advertises no '{}' URI template", template_type))
            })
    }

    fn request(&self, method: Method, url: &str) -> HttpRequest {
        HttpRequest::new(method, url).credentials(self.state.read().credentials.clone())
    }

    /// Issue a buffered request; failures are reported against `target`.
    async fn send(&self, request: HttpRequest, target: &str) -> Result<HttpResponse, BindingError> {
        self.invoker
            .invoke(request)
            .await
            .map_err(|e| BindingError::from_request(e, target))
    }

    async fn get(&self, url: &str, accept: &str, target: &str) -> Result<Bytes, BindingError> {
        let request = self.request(Method::Get, url).header("Accept", accept);
        Ok(self.send(request, target).await?.into_bytes())
    }
}

/// Evicts objects from the cache when dropped, so a mutation evicts even
/// when its future is dropped mid-flight or fails.
struct EvictGuard<'a> {
    cache: &'a ObjectCache,
    object_ids: Vec<String>,
}

impl<'a> EvictGuard<'a> {
    fn new(cache: &'a ObjectCache, object_ids: &[&str]) -> Self {
        Self {
            cache,
            object_ids: object_ids.iter().map(|id| id.to_string()).collect(),
        }
    }
}

impl Drop for EvictGuard<'_> {
    fn drop(&mut self) {
        for object_id in &self.object_ids {
            if self.cache.evict(object_id) {
                debug!(object_id = %object_id, "evicted object after mutation");
            }
        }
    }
}
