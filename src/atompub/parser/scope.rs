//! Scoped sub-decoder contract and the helpers shared by every scope.

use chrono::{DateTime, Utc};
use quick_xml::events::BytesStart;

use super::DecodeError;
use crate::atompub::constants::Namespace;
use crate::common::xml::unescape_xml;
use crate::model::{
    Acl, AclCapabilities, AllowableActions, ChangeEventInfo, CmisProperties, ExtensionElement,
    ObjectData, Rendition, RepositoryInfo, ServiceDocument, UriTemplate, Workspace,
};

/// Prefix and namespace URI of a prefixed attribute.
pub(crate) type AttributeBinding = (String, String);

/// Resolved name of an element.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ElementName<'a> {
    pub ns: Namespace,
    /// Namespace URI when the name is bound
    pub uri: Option<&'a [u8]>,
    pub local: &'a [u8],
    /// Bindings of the element's prefixed attributes; empty on end tags
    pub attribute_bindings: &'a [AttributeBinding],
}

impl ElementName<'_> {
    #[inline]
    pub fn is(&self, ns: Namespace, local: &[u8]) -> bool {
        self.ns == ns && self.local == local
    }

    /// Either CMIS namespace; repositories disagree on where some elements live.
    #[inline]
    pub fn is_cmis(&self, local: &[u8]) -> bool {
        matches!(self.ns, Namespace::Cmis | Namespace::CmisRa) && self.local == local
    }

    pub fn local_str(&self) -> String {
        String::from_utf8_lossy(self.local).into_owned()
    }
}

/// Value handed from a closing scope to its parent.
#[derive(Debug)]
pub(crate) enum Decoded {
    ServiceDocument(ServiceDocument),
    Workspace(Workspace),
    Collection { collection_type: Option<String>, href: Option<String> },
    UriTemplate(UriTemplate),
    RepositoryInfo(RepositoryInfo),
    Capabilities(Vec<(String, String)>),
    AclCapabilities(AclCapabilities),
    Feed(Vec<ObjectData>),
    /// A complete `<atom:entry>`
    Entry(ObjectData),
    /// Object content (`cmisra:object` or `cmis:relationship`)
    Object(ObjectData),
    Properties(CmisProperties),
    AllowableActions(AllowableActions),
    Acl(Acl),
    ChangeEventInfo(ChangeEventInfo),
    Rendition(Rendition),
    PolicyIds(Vec<String>),
    Extension(ExtensionElement),
}

/// What a scope does with an element start below its root.
pub(crate) enum Step {
    /// The scope handles the element itself
    Consume,
    /// A new scope owns the element and its whole subtree
    Delegate(Box<dyn ScopeDecoder>),
}

/// A sub-decoder owning one element subtree.
///
/// The driver counts depth per scope: the root element is depth 1, and the
/// scope is finished when its depth returns to zero. Scopes therefore never
/// compare end-tag names to decide when they are done.
pub(crate) trait ScopeDecoder {
    /// The scope's own root element.
    fn open(&mut self, _name: ElementName<'_>, _element: &BytesStart<'_>) -> Result<(), DecodeError> {
        Ok(())
    }

    /// An element start below the root; `depth` is 2 for direct children.
    fn start(
        &mut self,
        depth: usize,
        name: ElementName<'_>,
        element: &BytesStart<'_>,
    ) -> Result<Step, DecodeError>;

    /// Character data as it arrives, in document order.
    fn text(&mut self, _chunk: &str) {}

    /// An element end; `text` holds the character data since the last start.
    fn end(&mut self, _depth: usize, _name: ElementName<'_>, _text: &str) -> Result<(), DecodeError> {
        Ok(())
    }

    /// A child scope finished.
    fn accept(&mut self, _child: Decoded) -> Result<(), DecodeError> {
        Ok(())
    }

    /// The root element closed; produce the value for the parent.
    fn finish(self: Box<Self>) -> Result<Decoded, DecodeError>;
}

/// Accumulates character data for the innermost open element of a scope.
#[derive(Debug, Default)]
pub(crate) struct TextBuffer {
    buffer: String,
}

impl TextBuffer {
    #[inline]
    pub fn push_str(&mut self, s: &str) {
        self.buffer.push_str(s);
    }

    #[inline]
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    #[inline]
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.buffer)
    }
}

/// Value of an unprefixed attribute, unescaped.
pub(crate) fn attribute(element: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, DecodeError> {
    for attr in element.attributes() {
        let attr = attr.map_err(|err| DecodeError::malformed(format!("invalid attribute: {}", err)))?;
        if attr.key.as_ref() == key {
            let raw = std::str::from_utf8(&attr.value)
                .map_err(|_| DecodeError::malformed("attribute value is not valid UTF-8"))?;
            return Ok(Some(unescape_xml(raw)));
        }
    }
    Ok(None)
}

/// Text with surrounding whitespace removed, `None` when nothing is left.
pub(crate) fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// `xsd:boolean`
pub(crate) fn parse_bool(text: &str) -> Option<bool> {
    match text.trim() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

pub(crate) fn parse_integer(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
    atoi_simd::parse::<i64, false, false>(digits.as_bytes()).ok()
}

pub(crate) fn parse_decimal(text: &str) -> Option<f64> {
    fast_float2::parse::<f64, _>(text.trim()).ok()
}

/// `xsd:dateTime`, normalized to UTC.
pub(crate) fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
