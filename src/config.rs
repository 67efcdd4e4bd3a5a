//! Session parameters.
//!
//! Parameters can be built in code or loaded from YAML:
//!
//! ```
//! use cmis_atompub::config::SessionParameters;
//!
//! let yaml = "
//! atompub_url: http://localhost:8080/cmis/atom
//! repository_id: A1
//! username: admin
//! password: secret
//! request_timeout_ms: 5000
//! ";
//! let parameters = SessionParameters::from_yaml(yaml).unwrap();
//! assert_eq!(parameters.repository_id.as_deref(), Some("A1"));
//! assert_eq!(parameters.connect_timeout_ms, 10_000);
//! ```

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;

use crate::common::error::{Error, Result};
use crate::http::Credentials;

/// Default timeout for a whole request
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
/// Default timeout for establishing a connection
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;
/// Default number of objects kept in the session cache
pub const DEFAULT_OBJECT_CACHE_CAPACITY: usize = 1000;

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct SessionParameters {
    /// Service document URL
    pub atompub_url: String,
    /// Repository to select after bootstrap; the first workspace when unset
    pub repository_id: Option<String>,
    pub username: String,
    pub password: String,
    pub request_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    /// Proxy for all requests; empty for none
    pub proxy_url: String,
    pub user_agent: String,
    /// Headers added to every request
    pub additional_headers: HashMap<String, String>,
    /// Bound of the object cache; the oldest entry is evicted when full
    pub object_cache_capacity: usize,
}

impl Default for SessionParameters {
    fn default() -> Self {
        Self {
            atompub_url: String::new(),
            repository_id: None,
            username: String::new(),
            password: String::new(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            proxy_url: String::new(),
            user_agent: concat!("cmis-atompub/", env!("CARGO_PKG_VERSION")).to_string(),
            additional_headers: HashMap::new(),
            object_cache_capacity: DEFAULT_OBJECT_CACHE_CAPACITY,
        }
    }
}

impl SessionParameters {
    pub fn new(atompub_url: impl Into<String>) -> Self {
        Self {
            atompub_url: atompub_url.into(),
            ..Self::default()
        }
    }

    /// Load parameters from a YAML document; missing keys take defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_saphyr::from_str(yaml).map_err(|e| Error::Config(format!("Failed to parse session parameters: {}", e)))
    }

    /// Basic credentials, if a user name is configured.
    pub fn credentials(&self) -> Option<Credentials> {
        (!self.username.is_empty()).then(|| Credentials::new(&self.username, &self.password))
    }
}

impl fmt::Debug for SessionParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionParameters")
            .field("atompub_url", &self.atompub_url)
            .field("repository_id", &self.repository_id)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("proxy_url", &self.proxy_url)
            .field("user_agent", &self.user_agent)
            .field("additional_headers", &self.additional_headers)
            .field("object_cache_capacity", &self.object_cache_capacity)
            .finish()
    }
}
