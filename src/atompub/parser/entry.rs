//! Feed, entry and object scopes.

use quick_xml::events::BytesStart;

use super::DecodeError;
use super::allowable_actions::AllowableActionsScope;
use super::extension::ExtensionScope;
use super::object_parts::{AclScope, ChangeEventInfoScope, PolicyIdsScope, RenditionScope};
use super::properties::PropertiesScope;
use super::scope::{Decoded, ElementName, ScopeDecoder, Step, attribute, non_empty, parse_bool, parse_datetime};
use super::service::read_link;
use crate::atompub::constants::{Namespace, REL_SELF};
use crate::model::properties::PROP_BASE_TYPE_ID;
use crate::model::{AtomMetadata, ExtensionBlob, Links, ObjectData};

/// `<atom:feed>`: collects its entries, ignores feed-level metadata.
#[derive(Default)]
pub(crate) struct FeedScope {
    entries: Vec<ObjectData>,
}

impl FeedScope {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScopeDecoder for FeedScope {
    fn open(&mut self, name: ElementName<'_>, _element: &BytesStart<'_>) -> Result<(), DecodeError> {
        if !name.is(Namespace::Atom, b"feed") {
            return Err(DecodeError::MissingRequiredElement("atom:feed".to_string()));
        }
        Ok(())
    }

    fn start(&mut self, depth: usize, name: ElementName<'_>, _element: &BytesStart<'_>) -> Result<Step, DecodeError> {
        if depth == 2 && name.is(Namespace::Atom, b"entry") {
            return Ok(Step::Delegate(Box::new(EntryScope::new())));
        }
        Ok(Step::Consume)
    }

    fn accept(&mut self, child: Decoded) -> Result<(), DecodeError> {
        if let Decoded::Entry(entry) = child {
            self.entries.push(entry);
        }
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Decoded, DecodeError> {
        Ok(Decoded::Feed(self.entries))
    }
}

/// `<atom:entry>`
///
/// Finishing requires a `cmisra:object` carrying a non-empty object id and
/// a `self` link.
#[derive(Default)]
pub(crate) struct EntryScope {
    object: Option<ObjectData>,
    links: Links,
    atom: AtomMetadata,
    path_segment: Option<String>,
    relative_path_segment: Option<String>,
    extensions: ExtensionBlob,
    in_author: bool,
}

impl EntryScope {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScopeDecoder for EntryScope {
    fn open(&mut self, name: ElementName<'_>, _element: &BytesStart<'_>) -> Result<(), DecodeError> {
        if !name.is(Namespace::Atom, b"entry") {
            return Err(DecodeError::MissingRequiredElement("atom:entry".to_string()));
        }
        Ok(())
    }

    fn start(&mut self, depth: usize, name: ElementName<'_>, element: &BytesStart<'_>) -> Result<Step, DecodeError> {
        if depth > 2 {
            let author_field = depth == 3
                && self.in_author
                && name.ns == Namespace::Atom
                && matches!(name.local, b"name" | b"uri" | b"email");
            return Ok(if author_field {
                Step::Consume
            } else {
                Step::Delegate(ExtensionScope::boxed())
            });
        }
        self.in_author = name.is(Namespace::Atom, b"author");
        match (name.ns, name.local) {
            (Namespace::Atom, b"link") => {
                if let Some(link) = read_link(element)? {
                    self.links.push(link);
                }
                Ok(Step::Consume)
            },
            (Namespace::Atom, b"content") => {
                self.atom.content_src = attribute(element, b"src")?;
                self.atom.content_type = attribute(element, b"type")?;
                Ok(Step::Consume)
            },
            (Namespace::Atom, b"id" | b"title" | b"summary" | b"published" | b"updated" | b"author") => {
                Ok(Step::Consume)
            },
            (Namespace::CmisRa, b"object") => Ok(Step::Delegate(Box::new(ObjectScope::default()))),
            (Namespace::CmisRa, b"pathSegment" | b"relativePathSegment") => Ok(Step::Consume),
            _ => Ok(Step::Delegate(ExtensionScope::boxed())),
        }
    }

    fn end(&mut self, depth: usize, name: ElementName<'_>, text: &str) -> Result<(), DecodeError> {
        if depth == 3 {
            if name.is(Namespace::Atom, b"name") && self.atom.author.is_none() {
                self.atom.author = non_empty(text);
            }
            return Ok(());
        }
        if depth != 2 {
            return Ok(());
        }
        match (name.ns, name.local) {
            (Namespace::Atom, b"id") => self.atom.id = non_empty(text),
            (Namespace::Atom, b"title") => self.atom.title = non_empty(text),
            (Namespace::Atom, b"summary") => self.atom.summary = non_empty(text),
            (Namespace::Atom, b"published") => self.atom.published = parse_datetime(text),
            (Namespace::Atom, b"updated") => self.atom.updated = parse_datetime(text),
            (Namespace::CmisRa, b"pathSegment") => self.path_segment = non_empty(text),
            (Namespace::CmisRa, b"relativePathSegment") => self.relative_path_segment = non_empty(text),
            _ => {},
        }
        Ok(())
    }

    fn accept(&mut self, child: Decoded) -> Result<(), DecodeError> {
        match child {
            Decoded::Object(object) => self.object = Some(object),
            Decoded::Extension(extension) => self.extensions.push(extension),
            _ => {},
        }
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Decoded, DecodeError> {
        let mut object = self
            .object
            .ok_or_else(|| DecodeError::MissingRequiredElement("cmisra:object".to_string()))?;
        if object.object_id.is_empty() {
            return Err(DecodeError::MissingRequiredElement("cmis:objectId".to_string()));
        }
        if !self.links.contains(REL_SELF) {
            return Err(DecodeError::MissingRequiredElement("atom:link[rel=self]".to_string()));
        }
        object.links = self.links;
        object.atom = self.atom;
        object.path_segment = self.path_segment;
        object.relative_path_segment = self.relative_path_segment;
        for extension in self.extensions.iter() {
            object.extensions.push(extension.clone());
        }
        Ok(Decoded::Entry(object))
    }
}

/// `<cmisra:object>`, and `<cmis:relationship>` nested inside one.
#[derive(Default)]
struct ObjectScope {
    object: ObjectData,
    exact_acl: Option<bool>,
}

impl ScopeDecoder for ObjectScope {
    fn start(&mut self, depth: usize, name: ElementName<'_>, _element: &BytesStart<'_>) -> Result<Step, DecodeError> {
        if depth > 2 || name.ns != Namespace::Cmis {
            return Ok(Step::Delegate(ExtensionScope::boxed()));
        }
        let step = match name.local {
            b"properties" => Step::Delegate(Box::new(PropertiesScope::new())),
            b"allowableActions" => Step::Delegate(Box::new(AllowableActionsScope::new())),
            b"relationship" => Step::Delegate(Box::new(ObjectScope::default())),
            b"changeEventInfo" => Step::Delegate(Box::new(ChangeEventInfoScope::default())),
            b"acl" => Step::Delegate(Box::new(AclScope::default())),
            b"policyIds" => Step::Delegate(Box::new(PolicyIdsScope::default())),
            b"rendition" => Step::Delegate(Box::new(RenditionScope::default())),
            b"exactACL" => Step::Consume,
            _ => Step::Delegate(ExtensionScope::boxed()),
        };
        Ok(step)
    }

    fn end(&mut self, depth: usize, name: ElementName<'_>, text: &str) -> Result<(), DecodeError> {
        if depth == 2 && name.is(Namespace::Cmis, b"exactACL") {
            self.exact_acl = parse_bool(text);
        }
        Ok(())
    }

    fn accept(&mut self, child: Decoded) -> Result<(), DecodeError> {
        let object = &mut self.object;
        match child {
            Decoded::Properties(properties) => object.properties = properties,
            Decoded::AllowableActions(actions) => object.allowable_actions = Some(actions),
            Decoded::Object(relationship) => object.relationships.push(relationship),
            Decoded::ChangeEventInfo(info) => object.change_event_info = Some(info),
            Decoded::Acl(acl) => object.acl = Some(acl),
            Decoded::PolicyIds(ids) => object.policy_ids.extend(ids),
            Decoded::Rendition(rendition) => object.renditions.push(rendition),
            Decoded::Extension(extension) => object.extensions.push(extension),
            _ => {},
        }
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Decoded, DecodeError> {
        let mut object = self.object;
        object.object_id = object
            .properties
            .object_id()
            .unwrap_or_default()
            .to_string();
        object.base_type_id = object
            .properties
            .string_value(PROP_BASE_TYPE_ID)
            .map(str::to_string);
        if let Some(actions) = object.allowable_actions.as_mut() {
            actions.object_id = Some(object.object_id.clone());
        }
        if let (Some(acl), Some(exact)) = (object.acl.as_mut(), self.exact_acl) {
            acl.is_exact = Some(exact);
        }
        Ok(Decoded::Object(object))
    }
}
