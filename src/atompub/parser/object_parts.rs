//! Scopes for the smaller parts of an object: ACL, renditions, change
//! event info and policy ids. None of them keep extensions.

use quick_xml::events::BytesStart;

use super::DecodeError;
use super::scope::{Decoded, ElementName, ScopeDecoder, Step, non_empty, parse_bool, parse_datetime, parse_integer};
use crate::model::{Ace, Acl, ChangeEventInfo, Rendition};

/// `<cmis:acl>`
#[derive(Default)]
pub(crate) struct AclScope {
    acl: Acl,
    current: Option<Ace>,
}

impl ScopeDecoder for AclScope {
    fn start(&mut self, depth: usize, name: ElementName<'_>, _element: &BytesStart<'_>) -> Result<Step, DecodeError> {
        if depth == 2 && name.is_cmis(b"permission") {
            self.current = Some(Ace {
                is_direct: true,
                ..Ace::default()
            });
        }
        Ok(Step::Consume)
    }

    fn end(&mut self, depth: usize, name: ElementName<'_>, text: &str) -> Result<(), DecodeError> {
        if depth == 2 {
            if let Some(ace) = self.current.take() {
                self.acl.aces.push(ace);
            }
            return Ok(());
        }
        let Some(ace) = self.current.as_mut() else {
            return Ok(());
        };
        match (depth, name.local) {
            (4, b"principalId") => ace.principal_id = text.trim().to_string(),
            (3, b"permission") => ace.permissions.extend(non_empty(text)),
            (3, b"direct") => ace.is_direct = parse_bool(text).unwrap_or(true),
            _ => {},
        }
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Decoded, DecodeError> {
        Ok(Decoded::Acl(self.acl))
    }
}

/// `<cmis:rendition>`
#[derive(Default)]
pub(crate) struct RenditionScope {
    rendition: Rendition,
}

impl ScopeDecoder for RenditionScope {
    fn start(&mut self, _depth: usize, _name: ElementName<'_>, _element: &BytesStart<'_>) -> Result<Step, DecodeError> {
        Ok(Step::Consume)
    }

    fn end(&mut self, depth: usize, name: ElementName<'_>, text: &str) -> Result<(), DecodeError> {
        if depth != 2 {
            return Ok(());
        }
        let rendition = &mut self.rendition;
        match name.local {
            b"streamId" => rendition.stream_id = text.trim().to_string(),
            b"mimetype" => rendition.mime_type = non_empty(text),
            b"length" => rendition.length = parse_integer(text),
            b"kind" => rendition.kind = non_empty(text),
            b"title" => rendition.title = non_empty(text),
            b"height" => rendition.height = parse_integer(text),
            b"width" => rendition.width = parse_integer(text),
            b"renditionDocumentId" => rendition.rendition_document_id = non_empty(text),
            _ => {},
        }
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Decoded, DecodeError> {
        if self.rendition.stream_id.is_empty() {
            return Err(DecodeError::MissingRequiredElement("streamId".to_string()));
        }
        Ok(Decoded::Rendition(self.rendition))
    }
}

/// `<cmis:changeEventInfo>`
#[derive(Default)]
pub(crate) struct ChangeEventInfoScope {
    change_type: Option<String>,
    change_time: Option<String>,
}

impl ScopeDecoder for ChangeEventInfoScope {
    fn start(&mut self, _depth: usize, _name: ElementName<'_>, _element: &BytesStart<'_>) -> Result<Step, DecodeError> {
        Ok(Step::Consume)
    }

    fn end(&mut self, depth: usize, name: ElementName<'_>, text: &str) -> Result<(), DecodeError> {
        match (depth, name.local) {
            (2, b"changeType") => self.change_type = non_empty(text),
            (2, b"changeTime") => self.change_time = non_empty(text),
            _ => {},
        }
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Decoded, DecodeError> {
        let change_type = self
            .change_type
            .ok_or_else(|| DecodeError::MissingRequiredElement("changeType".to_string()))?;
        let change_time = match self.change_time {
            Some(raw) => Some(parse_datetime(&raw).ok_or(DecodeError::InvalidPropertyValue {
                property_id: "changeTime".to_string(),
                raw,
            })?),
            None => None,
        };
        Ok(Decoded::ChangeEventInfo(ChangeEventInfo {
            change_type,
            change_time,
        }))
    }
}

/// `<cmis:policyIds>`
#[derive(Default)]
pub(crate) struct PolicyIdsScope {
    ids: Vec<String>,
}

impl ScopeDecoder for PolicyIdsScope {
    fn start(&mut self, _depth: usize, _name: ElementName<'_>, _element: &BytesStart<'_>) -> Result<Step, DecodeError> {
        Ok(Step::Consume)
    }

    fn end(&mut self, depth: usize, name: ElementName<'_>, text: &str) -> Result<(), DecodeError> {
        if depth == 2 && name.is_cmis(b"id") {
            self.ids.extend(non_empty(text));
        }
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Decoded, DecodeError> {
        Ok(Decoded::PolicyIds(self.ids))
    }
}
