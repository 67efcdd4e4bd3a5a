//! Namespaces, link relations and media types of the AtomPub binding.

/// Atom syndication namespace.
pub const NS_ATOM: &str = "http://www.w3.org/2005/Atom";
/// Atom publishing protocol namespace.
pub const NS_APP: &str = "http://www.w3.org/2007/app";
/// CMIS core namespace.
pub const NS_CMIS: &str = "http://docs.oasis-open.org/ns/cmis/core/200908/";
/// CMIS RESTful AtomPub namespace.
pub const NS_CMISRA: &str = "http://docs.oasis-open.org/ns/cmis/restatom/200908/";

pub const REL_SELF: &str = "self";
pub const REL_EDIT: &str = "edit";
pub const REL_EDIT_MEDIA: &str = "edit-media";
pub const REL_DOWN: &str = "down";
pub const REL_UP: &str = "up";
pub const REL_ALTERNATE: &str = "alternate";
pub const REL_DESCRIBED_BY: &str = "describedby";
pub const REL_SERVICE: &str = "service";
pub const REL_VERSION_HISTORY: &str = "version-history";
pub const REL_CURRENT_VERSION: &str = "current-version";
pub const REL_ALLOWABLE_ACTIONS: &str = "http://docs.oasis-open.org/ns/cmis/link/200908/allowableactions";
pub const REL_RELATIONSHIPS: &str = "http://docs.oasis-open.org/ns/cmis/link/200908/relationships";
pub const REL_POLICIES: &str = "http://docs.oasis-open.org/ns/cmis/link/200908/policies";
pub const REL_ACL: &str = "http://docs.oasis-open.org/ns/cmis/link/200908/acl";
pub const REL_FOLDER_TREE: &str = "http://docs.oasis-open.org/ns/cmis/link/200908/foldertree";

pub const MEDIATYPE_ENTRY: &str = "application/atom+xml;type=entry";
pub const MEDIATYPE_FEED: &str = "application/atom+xml;type=feed";
pub const MEDIATYPE_SERVICE: &str = "application/atomsvc+xml";
pub const MEDIATYPE_CMISTREE: &str = "application/cmistree+xml";
pub const MEDIATYPE_ACL: &str = "application/cmisacl+xml";
pub const MEDIATYPE_ALLOWABLE_ACTIONS: &str = "application/cmisallowableactions+xml";
pub const MEDIATYPE_OCTET_STREAM: &str = "application/octet-stream";

/// Namespace an element name resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Atom,
    App,
    Cmis,
    CmisRa,
    /// Bound to a namespace this binding does not interpret
    Other,
    /// Not bound to any namespace
    None,
}

impl Namespace {
    pub fn from_uri(uri: &[u8]) -> Self {
        match uri {
            u if u == NS_ATOM.as_bytes() => Self::Atom,
            u if u == NS_APP.as_bytes() => Self::App,
            u if u == NS_CMIS.as_bytes() => Self::Cmis,
            u if u == NS_CMISRA.as_bytes() => Self::CmisRa,
            _ => Self::Other,
        }
    }
}
