//! Service document, workspace, collection and URI template scopes.

use std::collections::HashMap;

use quick_xml::events::BytesStart;

use super::DecodeError;
use super::extension::ExtensionScope;
use super::repository_info::RepositoryInfoScope;
use super::scope::{Decoded, ElementName, ScopeDecoder, Step, attribute, non_empty};
use crate::atompub::constants::Namespace;
use crate::model::{CollectionType, ExtensionBlob, Link, Links, RepositoryInfo, ServiceDocument, UriTemplate, Workspace};

/// `<app:service>`
#[derive(Default)]
pub(crate) struct ServiceScope {
    document: ServiceDocument,
}

impl ServiceScope {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScopeDecoder for ServiceScope {
    fn open(&mut self, name: ElementName<'_>, _element: &BytesStart<'_>) -> Result<(), DecodeError> {
        if !name.is(Namespace::App, b"service") {
            return Err(DecodeError::MissingRequiredElement("app:service".to_string()));
        }
        Ok(())
    }

    fn start(&mut self, _depth: usize, name: ElementName<'_>, _element: &BytesStart<'_>) -> Result<Step, DecodeError> {
        if name.is(Namespace::App, b"workspace") {
            Ok(Step::Delegate(Box::new(WorkspaceScope::default())))
        } else {
            Ok(Step::Delegate(ExtensionScope::boxed()))
        }
    }

    fn accept(&mut self, child: Decoded) -> Result<(), DecodeError> {
        match child {
            Decoded::Workspace(workspace) => self.document.workspaces.push(workspace),
            Decoded::Extension(extension) => self.document.extensions.push(extension),
            _ => {},
        }
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Decoded, DecodeError> {
        Ok(Decoded::ServiceDocument(self.document))
    }
}

/// `<app:workspace>`. Cannot be finished without a repository info.
#[derive(Default)]
struct WorkspaceScope {
    repository_info: Option<RepositoryInfo>,
    collections: HashMap<CollectionType, String>,
    links: Links,
    uri_templates: HashMap<String, UriTemplate>,
    extensions: ExtensionBlob,
}

impl ScopeDecoder for WorkspaceScope {
    fn start(&mut self, depth: usize, name: ElementName<'_>, element: &BytesStart<'_>) -> Result<Step, DecodeError> {
        if depth > 2 {
            return Ok(Step::Delegate(ExtensionScope::boxed()));
        }
        match (name.ns, name.local) {
            (Namespace::App, b"collection") => Ok(Step::Delegate(Box::new(CollectionScope::default()))),
            (Namespace::CmisRa, b"repositoryInfo") => Ok(Step::Delegate(Box::new(RepositoryInfoScope::new()))),
            (Namespace::CmisRa, b"uritemplate") => Ok(Step::Delegate(Box::new(UriTemplateScope::default()))),
            (Namespace::Atom, b"link") => {
                if let Some(link) = read_link(element)? {
                    self.links.push(link);
                }
                Ok(Step::Consume)
            },
            (Namespace::Atom, b"title") => Ok(Step::Consume),
            _ => Ok(Step::Delegate(ExtensionScope::boxed())),
        }
    }

    fn accept(&mut self, child: Decoded) -> Result<(), DecodeError> {
        match child {
            Decoded::RepositoryInfo(info) => self.repository_info = Some(info),
            Decoded::Collection {
                collection_type: Some(collection_type),
                href: Some(href),
            } => {
                self.collections
                    .insert(CollectionType::parse(&collection_type), href);
            },
            Decoded::UriTemplate(template) => {
                self.uri_templates
                    .insert(template.template_type().to_string(), template);
            },
            Decoded::Extension(extension) => self.extensions.push(extension),
            _ => {},
        }
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Decoded, DecodeError> {
        let repository_info = self
            .repository_info
            .ok_or_else(|| DecodeError::MissingRequiredElement("repositoryInfo".to_string()))?;
        Ok(Decoded::Workspace(Workspace {
            repository_info,
            collections: self.collections,
            links: self.links,
            uri_templates: self.uri_templates,
            extensions: self.extensions,
        }))
    }
}

/// `<app:collection href="...">` with its `cmisra:collectionType`.
#[derive(Default)]
struct CollectionScope {
    href: Option<String>,
    collection_type: Option<String>,
}

impl ScopeDecoder for CollectionScope {
    fn open(&mut self, _name: ElementName<'_>, element: &BytesStart<'_>) -> Result<(), DecodeError> {
        self.href = attribute(element, b"href")?;
        Ok(())
    }

    fn start(&mut self, _depth: usize, _name: ElementName<'_>, _element: &BytesStart<'_>) -> Result<Step, DecodeError> {
        Ok(Step::Consume)
    }

    fn end(&mut self, depth: usize, name: ElementName<'_>, text: &str) -> Result<(), DecodeError> {
        if depth == 2 && name.is(Namespace::CmisRa, b"collectionType") {
            self.collection_type = non_empty(text);
        }
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Decoded, DecodeError> {
        Ok(Decoded::Collection {
            collection_type: self.collection_type,
            href: self.href,
        })
    }
}

/// `<cmisra:uritemplate>`
#[derive(Default)]
struct UriTemplateScope {
    template: Option<String>,
    template_type: Option<String>,
    media_type: Option<String>,
}

impl ScopeDecoder for UriTemplateScope {
    fn start(&mut self, _depth: usize, _name: ElementName<'_>, _element: &BytesStart<'_>) -> Result<Step, DecodeError> {
        Ok(Step::Consume)
    }

    fn end(&mut self, depth: usize, name: ElementName<'_>, text: &str) -> Result<(), DecodeError> {
        if depth != 2 || name.ns != Namespace::CmisRa {
            return Ok(());
        }
        match name.local {
            b"template" => self.template = non_empty(text),
            b"type" => self.template_type = non_empty(text),
            b"mediatype" => self.media_type = non_empty(text),
            _ => {},
        }
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Decoded, DecodeError> {
        let pattern = self
            .template
            .ok_or_else(|| DecodeError::MissingRequiredElement("cmisra:template".to_string()))?;
        let template_type = self
            .template_type
            .ok_or_else(|| DecodeError::MissingRequiredElement("cmisra:type".to_string()))?;
        Ok(Decoded::UriTemplate(UriTemplate::new(template_type, pattern, self.media_type)))
    }
}

/// Reads an `<atom:link>`; links without `rel` or `href` are skipped.
pub(crate) fn read_link(element: &BytesStart<'_>) -> Result<Option<Link>, DecodeError> {
    let (Some(relation), Some(href)) = (attribute(element, b"rel")?, attribute(element, b"href")?) else {
        return Ok(None);
    };
    Ok(Some(Link::new(relation, attribute(element, b"type")?, href)))
}
