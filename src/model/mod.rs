//! Value types produced by the decoder and consumed by the session layer.
//!
//! Everything here is plain data: decoded once, then shared read-only.

pub mod actions;
pub mod extension;
pub mod link;
pub mod object;
pub mod properties;
pub mod repository;
pub mod template;
pub mod workspace;

pub use actions::AllowableActions;
pub use extension::{ExtensionBlob, ExtensionElement};
pub use link::{Link, Links, media_types_match};
pub use object::{Ace, Acl, AtomMetadata, ChangeEventInfo, ObjectData, Rendition};
pub use properties::{CmisProperties, PropertyData, PropertyType, PropertyValue};
pub use repository::{AclCapabilities, PermissionDefinition, RepositoryInfo};
pub use template::UriTemplate;
pub use workspace::{CollectionType, ServiceDocument, Workspace};
