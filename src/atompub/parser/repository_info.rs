//! Repository info, capabilities and ACL capability scopes.

use quick_xml::events::BytesStart;

use super::DecodeError;
use super::extension::ExtensionScope;
use super::scope::{Decoded, ElementName, ScopeDecoder, Step, non_empty, parse_bool};
use crate::model::{AclCapabilities, PermissionDefinition, RepositoryInfo};

/// `<cmisra:repositoryInfo>`, also accepted as the root of a standalone
/// `cmis:repositoryInfo` document.
#[derive(Default)]
pub(crate) struct RepositoryInfoScope {
    info: RepositoryInfo,
}

impl RepositoryInfoScope {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScopeDecoder for RepositoryInfoScope {
    fn open(&mut self, name: ElementName<'_>, _element: &BytesStart<'_>) -> Result<(), DecodeError> {
        if !name.is_cmis(b"repositoryInfo") {
            return Err(DecodeError::MissingRequiredElement("repositoryInfo".to_string()));
        }
        Ok(())
    }

    fn start(&mut self, depth: usize, name: ElementName<'_>, _element: &BytesStart<'_>) -> Result<Step, DecodeError> {
        if depth > 2 {
            return Ok(Step::Delegate(ExtensionScope::boxed()));
        }
        if name.is_cmis(b"capabilities") {
            return Ok(Step::Delegate(Box::new(CapabilitiesScope::default())));
        }
        if name.is_cmis(b"aclCapability") {
            return Ok(Step::Delegate(Box::new(AclCapabilityScope::default())));
        }
        if is_known_field(name) {
            return Ok(Step::Consume);
        }
        Ok(Step::Delegate(ExtensionScope::boxed()))
    }

    fn end(&mut self, depth: usize, name: ElementName<'_>, text: &str) -> Result<(), DecodeError> {
        if depth != 2 {
            return Ok(());
        }
        let info = &mut self.info;
        match name.local {
            b"repositoryId" => info.id = text.trim().to_string(),
            b"repositoryName" => info.name = non_empty(text),
            b"repositoryDescription" => info.description = non_empty(text),
            b"vendorName" => info.vendor_name = non_empty(text),
            b"productName" => info.product_name = non_empty(text),
            b"productVersion" => info.product_version = non_empty(text),
            b"rootFolderId" => info.root_folder_id = text.trim().to_string(),
            b"latestChangeLogToken" => info.latest_change_log_token = non_empty(text),
            b"cmisVersionSupported" => info.cmis_version_supported = non_empty(text),
            b"thinClientURI" => info.thin_client_uri = non_empty(text),
            b"changesIncomplete" => info.changes_incomplete = parse_bool(text),
            b"changesOnType" => info.changes_on_type.extend(non_empty(text)),
            b"principalAnonymous" => info.principal_id_anonymous = non_empty(text),
            b"principalAnyone" => info.principal_id_anyone = non_empty(text),
            _ => {},
        }
        Ok(())
    }

    fn accept(&mut self, child: Decoded) -> Result<(), DecodeError> {
        match child {
            Decoded::Capabilities(capabilities) => self.info.capabilities.extend(capabilities),
            Decoded::AclCapabilities(acl) => self.info.acl_capabilities = Some(acl),
            Decoded::Extension(extension) => self.info.extensions.push(extension),
            _ => {},
        }
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Decoded, DecodeError> {
        if self.info.id.is_empty() {
            return Err(DecodeError::MissingRequiredElement("repositoryId".to_string()));
        }
        if self.info.root_folder_id.is_empty() {
            return Err(DecodeError::MissingRequiredElement("rootFolderId".to_string()));
        }
        Ok(Decoded::RepositoryInfo(self.info))
    }
}

fn is_known_field(name: ElementName<'_>) -> bool {
    const FIELDS: &[&[u8]] = &[
        b"repositoryId",
        b"repositoryName",
        b"repositoryDescription",
        b"vendorName",
        b"productName",
        b"productVersion",
        b"rootFolderId",
        b"latestChangeLogToken",
        b"cmisVersionSupported",
        b"thinClientURI",
        b"changesIncomplete",
        b"changesOnType",
        b"principalAnonymous",
        b"principalAnyone",
    ];
    FIELDS.iter().any(|field| name.is_cmis(field))
}

/// `<cmis:capabilities>`: every child is a capability keyed by its local name.
#[derive(Default)]
struct CapabilitiesScope {
    capabilities: Vec<(String, String)>,
}

impl ScopeDecoder for CapabilitiesScope {
    fn start(&mut self, _depth: usize, _name: ElementName<'_>, _element: &BytesStart<'_>) -> Result<Step, DecodeError> {
        Ok(Step::Consume)
    }

    fn end(&mut self, depth: usize, name: ElementName<'_>, text: &str) -> Result<(), DecodeError> {
        if depth == 2 {
            self.capabilities
                .push((name.local_str(), text.trim().to_string()));
        }
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Decoded, DecodeError> {
        Ok(Decoded::Capabilities(self.capabilities))
    }
}

enum PendingAcl {
    None,
    Permission {
        permission: Option<String>,
        description: Option<String>,
    },
    Mapping {
        key: Option<String>,
        permissions: Vec<String>,
    },
}

/// `<cmis:aclCapability>`
struct AclCapabilityScope {
    capabilities: AclCapabilities,
    pending: PendingAcl,
}

impl Default for AclCapabilityScope {
    fn default() -> Self {
        Self {
            capabilities: AclCapabilities::default(),
            pending: PendingAcl::None,
        }
    }
}

impl ScopeDecoder for AclCapabilityScope {
    fn start(&mut self, depth: usize, name: ElementName<'_>, _element: &BytesStart<'_>) -> Result<Step, DecodeError> {
        if depth == 2 {
            if name.is_cmis(b"permissions") {
                self.pending = PendingAcl::Permission {
                    permission: None,
                    description: None,
                };
            } else if name.is_cmis(b"mapping") {
                self.pending = PendingAcl::Mapping {
                    key: None,
                    permissions: Vec::new(),
                };
            }
        }
        Ok(Step::Consume)
    }

    fn end(&mut self, depth: usize, name: ElementName<'_>, text: &str) -> Result<(), DecodeError> {
        match depth {
            3 => match (&mut self.pending, name.local) {
                (PendingAcl::Permission { permission, .. }, b"permission") => *permission = non_empty(text),
                (PendingAcl::Permission { description, .. }, b"description") => *description = non_empty(text),
                (PendingAcl::Mapping { key, .. }, b"key") => *key = non_empty(text),
                (PendingAcl::Mapping { permissions, .. }, b"permission") => permissions.extend(non_empty(text)),
                _ => {},
            },
            2 => match (std::mem::replace(&mut self.pending, PendingAcl::None), name.local) {
                (_, b"supportedPermissions") => self.capabilities.supported_permissions = non_empty(text),
                (_, b"propagation") => self.capabilities.propagation = non_empty(text),
                (
                    PendingAcl::Permission {
                        permission: Some(permission),
                        description,
                    },
                    _,
                ) => self.capabilities.permissions.push(PermissionDefinition {
                    permission,
                    description,
                }),
                (
                    PendingAcl::Mapping {
                        key: Some(key),
                        permissions,
                    },
                    _,
                ) => {
                    self.capabilities
                        .mappings
                        .entry(key)
                        .or_default()
                        .extend(permissions);
                },
                _ => {},
            },
            _ => {},
        }
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Decoded, DecodeError> {
        Ok(Decoded::AclCapabilities(self.capabilities))
    }
}
