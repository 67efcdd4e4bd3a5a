//! Service document and workspaces.

use std::collections::HashMap;

use super::extension::ExtensionBlob;
use super::link::Links;
use super::repository::RepositoryInfo;
use super::template::UriTemplate;

/// Collection types a workspace may advertise.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CollectionType {
    Root,
    Types,
    CheckedOut,
    Query,
    Unfiled,
    Other(String),
}

impl CollectionType {
    pub fn parse(value: &str) -> Self {
        match value {
            "root" => Self::Root,
            "types" => Self::Types,
            "checkedout" => Self::CheckedOut,
            "query" => Self::Query,
            "unfiled" => Self::Unfiled,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Root => "root",
            Self::Types => "types",
            Self::CheckedOut => "checkedout",
            Self::Query => "query",
            Self::Unfiled => "unfiled",
            Self::Other(value) => value,
        }
    }
}

/// One repository as exposed at the service endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub repository_info: RepositoryInfo,
    pub collections: HashMap<CollectionType, String>,
    pub links: Links,
    pub uri_templates: HashMap<String, UriTemplate>,
    pub extensions: ExtensionBlob,
}

impl Workspace {
    pub fn collection(&self, collection_type: &CollectionType) -> Option<&str> {
        self.collections.get(collection_type).map(String::as_str)
    }

    /// URI template by type (`objectbyid`, `objectbypath`, `query`, `typebyid`).
    pub fn uri_template(&self, template_type: &str) -> Option<&UriTemplate> {
        self.uri_templates.get(template_type)
    }
}

/// The AtomPub service document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceDocument {
    pub workspaces: Vec<Workspace>,
    pub extensions: ExtensionBlob,
}

impl ServiceDocument {
    pub fn workspace(&self, repository_id: &str) -> Option<&Workspace> {
        self.workspaces
            .iter()
            .find(|ws| ws.repository_info.id == repository_id)
    }
}
