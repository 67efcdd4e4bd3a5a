//! Repository description advertised by a workspace.

use std::collections::HashMap;

use super::extension::ExtensionBlob;

/// Permission advertised by the repository's ACL capabilities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionDefinition {
    pub permission: String,
    pub description: Option<String>,
}

/// ACL capabilities of a repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AclCapabilities {
    /// `basic`, `repository` or `both`
    pub supported_permissions: Option<String>,
    /// `objectonly`, `propagate` or `repositorydetermined`
    pub propagation: Option<String>,
    pub permissions: Vec<PermissionDefinition>,
    /// Allowable action key → permissions required for it
    pub mappings: HashMap<String, Vec<String>>,
}

/// Repository info. Replaced wholesale on re-fetch, never patched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryInfo {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub vendor_name: Option<String>,
    pub product_name: Option<String>,
    pub product_version: Option<String>,
    pub root_folder_id: String,
    pub latest_change_log_token: Option<String>,
    pub cmis_version_supported: Option<String>,
    pub thin_client_uri: Option<String>,
    pub changes_incomplete: Option<bool>,
    pub changes_on_type: Vec<String>,
    pub principal_id_anonymous: Option<String>,
    pub principal_id_anyone: Option<String>,
    /// Capability local name (e.g. `capabilityACL`) → raw value
    pub capabilities: HashMap<String, String>,
    pub acl_capabilities: Option<AclCapabilities>,
    pub extensions: ExtensionBlob,
}

impl RepositoryInfo {
    /// Raw value of a capability.
    pub fn capability(&self, name: &str) -> Option<&str> {
        self.capabilities.get(name).map(String::as_str)
    }

    /// Boolean capability, `None` if absent or not a boolean.
    pub fn capability_flag(&self, name: &str) -> Option<bool> {
        match self.capability(name)? {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }
}
