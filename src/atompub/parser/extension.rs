//! Verbatim capture of subtrees no decoder recognizes.

use quick_xml::events::BytesStart;

use super::DecodeError;
use super::scope::{Decoded, ElementName, ScopeDecoder, Step};
use crate::common::xml::escape_xml;
use crate::model::ExtensionElement;

/// Re-serializes an unknown subtree into an [`ExtensionElement`].
///
/// Prefixes bound outside the captured subtree, for the element name or
/// for its attributes, are declared on the first element that uses them,
/// so the captured XML stands on its own.
#[derive(Default)]
pub(crate) struct ExtensionScope {
    namespace: Option<String>,
    name: String,
    local_name: String,
    xml: String,
    /// Qualified names of the open elements, innermost last
    open: Vec<String>,
    /// Prefixes in scope per open element (`""` for the default namespace)
    declared: Vec<Vec<String>>,
}

impl ExtensionScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boxed() -> Box<dyn ScopeDecoder> {
        Box::new(Self::new())
    }

    fn is_declared(&self, prefix: &str) -> bool {
        self.declared.iter().flatten().any(|p| p == prefix)
    }

    fn declare(&mut self, prefix: &str, uri: &str, frame: &mut Vec<String>) {
        if prefix.is_empty() {
            self.xml.push_str(" xmlns=\"");
        } else {
            self.xml.push_str(" xmlns:");
            self.xml.push_str(prefix);
            self.xml.push_str("=\"");
        }
        self.xml.push_str(&escape_xml(uri));
        self.xml.push('"');
        frame.push(prefix.to_string());
    }

    fn write_start(&mut self, name: ElementName<'_>, element: &BytesStart<'_>) -> Result<(), DecodeError> {
        let raw = std::str::from_utf8(element)
            .map_err(|_| DecodeError::malformed("element is not valid UTF-8"))?;
        let qname = element.name();
        let qname = std::str::from_utf8(qname.as_ref())
            .map_err(|_| DecodeError::malformed("element name is not valid UTF-8"))?;

        let mut frame = Vec::new();
        for attr in element.attributes() {
            let attr = attr.map_err(|err| DecodeError::malformed(format!("invalid attribute: {}", err)))?;
            let key = attr.key.as_ref();
            if key == b"xmlns" {
                frame.push(String::new());
            } else if let Some(prefix) = key.strip_prefix(b"xmlns:") {
                frame.push(String::from_utf8_lossy(prefix).into_owned());
            }
        }

        self.xml.push('<');
        self.xml.push_str(raw);

        let prefix = qname.split_once(':').map_or("", |(prefix, _)| prefix);
        if let Some(uri) = name.uri
            && !frame.iter().any(|p| p == prefix)
            && !self.is_declared(prefix)
        {
            self.declare(prefix, &String::from_utf8_lossy(uri), &mut frame);
        }
        for (prefix, uri) in name.attribute_bindings {
            if !frame.iter().any(|p| p == prefix) && !self.is_declared(prefix) {
                self.declare(prefix, uri, &mut frame);
            }
        }

        self.xml.push('>');
        self.open.push(qname.to_string());
        self.declared.push(frame);
        Ok(())
    }
}

impl ScopeDecoder for ExtensionScope {
    fn open(&mut self, name: ElementName<'_>, element: &BytesStart<'_>) -> Result<(), DecodeError> {
        self.namespace = name.uri.map(|uri| String::from_utf8_lossy(uri).into_owned());
        self.local_name = name.local_str();
        self.name = String::from_utf8_lossy(element.name().as_ref()).into_owned();
        self.write_start(name, element)
    }

    fn start(&mut self, _depth: usize, name: ElementName<'_>, element: &BytesStart<'_>) -> Result<Step, DecodeError> {
        self.write_start(name, element)?;
        Ok(Step::Consume)
    }

    fn text(&mut self, chunk: &str) {
        self.xml.push_str(&escape_xml(chunk));
    }

    fn end(&mut self, _depth: usize, _name: ElementName<'_>, _text: &str) -> Result<(), DecodeError> {
        let qname = self
            .open
            .pop()
            .ok_or_else(|| DecodeError::malformed("unbalanced extension element"))?;
        self.declared.pop();
        self.xml.push_str("</");
        self.xml.push_str(&qname);
        self.xml.push('>');
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Decoded, DecodeError> {
        Ok(Decoded::Extension(ExtensionElement {
            namespace: self.namespace,
            name: self.name,
            local_name: self.local_name,
            xml: self.xml,
        }))
    }
}
