//! Object data decoded from a single Atom entry.

use chrono::{DateTime, Utc};

use super::actions::AllowableActions;
use super::extension::ExtensionBlob;
use super::link::Links;
use super::properties::CmisProperties;

/// Atom-level metadata of an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtomMetadata {
    pub id: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub author: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    /// `src` of `<atom:content>`, the location of the content stream
    pub content_src: Option<String>,
    /// `type` of `<atom:content>`
    pub content_type: Option<String>,
}

/// Change event attached to objects returned by the change log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEventInfo {
    pub change_type: String,
    pub change_time: Option<DateTime<Utc>>,
}

/// Access control entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ace {
    pub principal_id: String,
    pub permissions: Vec<String>,
    pub is_direct: bool,
}

/// Access control list, carried opaquely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Acl {
    pub aces: Vec<Ace>,
    pub is_exact: Option<bool>,
}

/// Rendition descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendition {
    pub stream_id: String,
    pub mime_type: Option<String>,
    pub length: Option<i64>,
    pub kind: Option<String>,
    pub title: Option<String>,
    pub height: Option<i64>,
    pub width: Option<i64>,
    pub rendition_document_id: Option<String>,
}

/// A repository object as decoded from one `<atom:entry>`.
///
/// Values are immutable once decoded. Caches replace or evict whole values;
/// they never patch fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectData {
    pub object_id: String,
    pub base_type_id: Option<String>,
    pub properties: CmisProperties,
    pub allowable_actions: Option<AllowableActions>,
    /// Relationship objects, shallow
    pub relationships: Vec<ObjectData>,
    pub change_event_info: Option<ChangeEventInfo>,
    pub acl: Option<Acl>,
    pub policy_ids: Vec<String>,
    pub renditions: Vec<Rendition>,
    pub links: Links,
    pub atom: AtomMetadata,
    pub path_segment: Option<String>,
    pub relative_path_segment: Option<String>,
    pub extensions: ExtensionBlob,
}

impl ObjectData {
    /// Name of the object (`cmis:name`).
    pub fn name(&self) -> Option<&str> {
        self.properties.string_value(super::properties::PROP_NAME)
    }

    /// Current change token, if the repository reports one.
    pub fn change_token(&self) -> Option<&str> {
        self.properties
            .string_value(super::properties::PROP_CHANGE_TOKEN)
    }

    /// Href of the first link with `relation`.
    pub fn link(&self, relation: &str) -> Option<&str> {
        self.links.find(relation, None)
    }
}
