//! Streaming decoder for Atom/CMIS documents.
//!
//! Documents are decoded from a single forward pass over `quick-xml`
//! events. The decoder keeps an explicit stack of scoped sub-decoders
//! ([`scope::ScopeDecoder`]): when a scope sees the start of an element it
//! knows how to delegate (a `repositoryInfo` inside a `workspace`, the
//! `allowableActions` inside an object), a new scope is pushed and receives
//! every event of that subtree. Each scope counts its own depth and is
//! popped when that depth returns to zero, so extension content that reuses
//! the local name of an enclosing element never closes a scope early. The
//! finished value is handed to the parent scope in the same event turn.
//!
//! Elements no scope recognizes are captured verbatim into the
//! [`ExtensionBlob`](crate::model::ExtensionBlob) of the enclosing entity.
//!
//! Every decode call owns its stack; nothing is shared between calls.

mod allowable_actions;
mod entry;
mod extension;
mod object_parts;
mod properties;
mod repository_info;
mod scope;
mod service;


use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use thiserror::Error;
use tracing::trace;

use crate::atompub::constants::Namespace;
use crate::common::xml::{resolve_entity, unescape_xml};
use crate::model::{AllowableActions, ObjectData, RepositoryInfo, ServiceDocument};
use scope::{AttributeBinding, Decoded, ElementName, ScopeDecoder, Step, TextBuffer};

/// Nesting limit for a single document
const MAX_DEPTH: usize = 1000;

/// Decoding failure. Always fatal to the decode call that raised it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Not well-formed XML; `offset` is the byte position of the failing event
    #[error("Malformed XML at byte {offset}: {message}")]
    Malformed { offset: u64, message: String },

    #[error("Missing required element: {0}")]
    MissingRequiredElement(String),

    /// A value that does not parse as its declared type
    #[error("Invalid value {raw:?} for {property_id}")]
    InvalidPropertyValue { property_id: String, raw: String },
}

impl DecodeError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            offset: 0,
            message: message.into(),
        }
    }

    /// Attach a byte offset to a `Malformed` error raised without one.
    fn at(self, position: u64) -> Self {
        match self {
            Self::Malformed { offset: 0, message } => Self::Malformed {
                offset: position,
                message,
            },
            other => other,
        }
    }
}

/// Decode an AtomPub service document.
///
/// A document without workspaces decodes to an empty [`ServiceDocument`];
/// a workspace without `repositoryInfo` fails the whole document.
pub fn decode_service_document(bytes: &[u8]) -> Result<ServiceDocument, DecodeError> {
    match run(bytes, Box::new(service::ServiceScope::new()), "app:service")? {
        Decoded::ServiceDocument(document) => Ok(document),
        _ => Err(DecodeError::MissingRequiredElement("app:service".to_string())),
    }
}

/// Decode a single Atom entry into an object.
///
/// # Example
///
/// ```
/// use cmis_atompub::atompub::decode_object_entry;
///
/// let xml = br#"<entry xmlns="http://www.w3.org/2005/Atom"
///     xmlns:cmis="http://docs.oasis-open.org/ns/cmis/core/200908/"
///     xmlns:cmisra="http://docs.oasis-open.org/ns/cmis/restatom/200908/">
///   <link rel="self" href="http://host/obj?id=42"/>
///   <cmisra:object><cmis:properties>
///     <cmis:propertyId propertyDefinitionId="cmis:objectId"><cmis:value>42</cmis:value></cmis:propertyId>
///   </cmis:properties></cmisra:object>
/// </entry>"#;
///
/// let object = decode_object_entry(xml).unwrap();
/// assert_eq!(object.object_id, "42");
/// ```
pub fn decode_object_entry(bytes: &[u8]) -> Result<ObjectData, DecodeError> {
    match run(bytes, Box::new(entry::EntryScope::new()), "atom:entry")? {
        Decoded::Entry(object) => Ok(object),
        _ => Err(DecodeError::MissingRequiredElement("atom:entry".to_string())),
    }
}

/// Decode an Atom feed; every entry goes through the entry decoder.
pub fn decode_feed(bytes: &[u8]) -> Result<Vec<ObjectData>, DecodeError> {
    match run(bytes, Box::new(entry::FeedScope::new()), "atom:feed")? {
        Decoded::Feed(entries) => Ok(entries),
        _ => Err(DecodeError::MissingRequiredElement("atom:feed".to_string())),
    }
}

/// Decode a standalone `repositoryInfo` document.
pub fn decode_repository_info(bytes: &[u8]) -> Result<RepositoryInfo, DecodeError> {
    match run(
        bytes,
        Box::new(repository_info::RepositoryInfoScope::new()),
        "repositoryInfo",
    )? {
        Decoded::RepositoryInfo(info) => Ok(info),
        _ => Err(DecodeError::MissingRequiredElement("repositoryInfo".to_string())),
    }
}

/// Decode a standalone `allowableActions` document.
pub fn decode_allowable_actions(bytes: &[u8]) -> Result<AllowableActions, DecodeError> {
    match run(
        bytes,
        Box::new(allowable_actions::AllowableActionsScope::new()),
        "allowableActions",
    )? {
        Decoded::AllowableActions(actions) => Ok(actions),
        _ => Err(DecodeError::MissingRequiredElement("allowableActions".to_string())),
    }
}

struct Frame {
    decoder: Box<dyn ScopeDecoder>,
    depth: usize,
    text: TextBuffer,
}

/// Drive `root` over the document and return what it finished with.
fn run(bytes: &[u8], root: Box<dyn ScopeDecoder>, root_name: &str) -> Result<Decoded, DecodeError> {
    let mut reader = NsReader::from_reader(bytes);
    reader.config_mut().expand_empty_elements = true;

    let mut buf = Vec::with_capacity(1024);
    let mut pending_root = Some(root);
    let mut stack: Vec<Frame> = Vec::with_capacity(16);
    let mut total_depth = 0usize;
    let mut bindings: Vec<AttributeBinding> = Vec::new();
    let mut result = None;

    loop {
        let position = reader.buffer_position();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                total_depth += 1;
                if total_depth > MAX_DEPTH {
                    return Err(DecodeError::Malformed {
                        offset: position,
                        message: format!("maximum nesting depth {} exceeded", MAX_DEPTH),
                    });
                }
                attribute_bindings(&reader, e, &mut bindings).map_err(|err| err.at(position))?;
                let (resolved, local) = reader.resolve_element(e.name());
                let name = element_name(&resolved, local.as_ref(), &bindings);
                open_element(&mut stack, &mut pending_root, name, e).map_err(|err| err.at(position))?;
            },
            Ok(Event::End(ref e)) => {
                total_depth = total_depth.saturating_sub(1);
                let (resolved, local) = reader.resolve_element(e.name());
                let name = element_name(&resolved, local.as_ref(), &[]);
                if let Some(value) = close_element(&mut stack, name).map_err(|err| err.at(position))? {
                    result = Some(value);
                }
            },
            Ok(Event::Text(ref t)) => {
                let raw = std::str::from_utf8(t).map_err(|_| DecodeError::Malformed {
                    offset: position,
                    message: "text is not valid UTF-8".to_string(),
                })?;
                push_text(&mut stack, &unescape_xml(raw));
            },
            Ok(Event::CData(ref c)) => {
                let raw = std::str::from_utf8(c).map_err(|_| DecodeError::Malformed {
                    offset: position,
                    message: "CDATA is not valid UTF-8".to_string(),
                })?;
                push_text(&mut stack, raw);
            },
            Ok(Event::GeneralRef(ref r)) => {
                let entity = std::str::from_utf8(r).unwrap_or_default();
                let ch = resolve_entity(entity).ok_or_else(|| DecodeError::Malformed {
                    offset: position,
                    message: format!("unknown entity &{};", entity),
                })?;
                push_text(&mut stack, ch.encode_utf8(&mut [0u8; 4]));
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(DecodeError::Malformed {
                    offset: position,
                    message: e.to_string(),
                });
            },
            _ => {}, // declarations, comments, processing instructions
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(DecodeError::Malformed {
            offset: reader.buffer_position(),
            message: "unexpected end of document".to_string(),
        });
    }
    trace!(root = root_name, "document decoded");
    result.ok_or_else(|| DecodeError::MissingRequiredElement(root_name.to_string()))
}

fn element_name<'a>(
    resolved: &'a ResolveResult<'_>,
    local: &'a [u8],
    attribute_bindings: &'a [AttributeBinding],
) -> ElementName<'a> {
    let (ns, uri) = match resolved {
        ResolveResult::Bound(ns) => (Namespace::from_uri(ns.as_ref()), Some(ns.as_ref())),
        ResolveResult::Unbound => (Namespace::None, None),
        ResolveResult::Unknown(_) => (Namespace::Other, None),
    };
    ElementName {
        ns,
        uri,
        local,
        attribute_bindings,
    }
}

/// Collect the bindings of the prefixed attributes of `element` into `out`.
/// Namespace declarations and the predefined `xml` prefix are skipped.
fn attribute_bindings(
    reader: &NsReader<&[u8]>,
    element: &BytesStart<'_>,
    out: &mut Vec<AttributeBinding>,
) -> Result<(), DecodeError> {
    out.clear();
    for attr in element.attributes() {
        let attr = attr.map_err(|err| DecodeError::malformed(format!("invalid attribute: {}", err)))?;
        let Some(prefix) = attr.key.prefix() else {
            continue;
        };
        let prefix = prefix.as_ref();
        if prefix == b"xmlns" || prefix == b"xml" {
            continue;
        }
        if let (ResolveResult::Bound(ns), _) = reader.resolve_attribute(attr.key) {
            let prefix = String::from_utf8_lossy(prefix).into_owned();
            if !out.iter().any(|(known, _)| *known == prefix) {
                out.push((prefix, String::from_utf8_lossy(ns.as_ref()).into_owned()));
            }
        }
    }
    Ok(())
}

fn open_element(
    stack: &mut Vec<Frame>,
    pending_root: &mut Option<Box<dyn ScopeDecoder>>,
    name: ElementName<'_>,
    element: &BytesStart<'_>,
) -> Result<(), DecodeError> {
    let decoder = match stack.last_mut() {
        Some(frame) => match frame.decoder.start(frame.depth + 1, name, element)? {
            Step::Consume => {
                frame.text.clear();
                frame.depth += 1;
                return Ok(());
            },
            // The delegated subtree is invisible to the parent's text.
            Step::Delegate(child) => child,
        },
        None => pending_root
            .take()
            .ok_or_else(|| DecodeError::malformed("content after the document element"))?,
    };

    let mut frame = Frame {
        decoder,
        depth: 1,
        text: TextBuffer::default(),
    };
    frame.decoder.open(name, element)?;
    stack.push(frame);
    Ok(())
}

fn close_element(stack: &mut Vec<Frame>, name: ElementName<'_>) -> Result<Option<Decoded>, DecodeError> {
    let Some(frame) = stack.last_mut() else {
        return Err(DecodeError::malformed("unexpected end tag"));
    };
    let text = frame.text.take();
    frame.decoder.end(frame.depth, name, &text)?;
    frame.depth -= 1;
    if frame.depth > 0 {
        return Ok(None);
    }

    let Some(frame) = stack.pop() else {
        return Ok(None);
    };
    let value = frame.decoder.finish()?;
    match stack.last_mut() {
        Some(parent) => {
            parent.decoder.accept(value)?;
            Ok(None)
        },
        None => Ok(Some(value)),
    }
}

fn push_text(stack: &mut [Frame], chunk: &str) {
    if let Some(frame) = stack.last_mut() {
        frame.text.push_str(chunk);
        frame.decoder.text(chunk);
    }
}
