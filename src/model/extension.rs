//! Opaque capture of XML content that no decoder recognized.

/// One captured element subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionElement {
    /// Namespace URI the element was bound to, if any
    pub namespace: Option<String>,
    /// Qualified name as written in the document (`prefix:local`)
    pub name: String,
    /// Local part of the name
    pub local_name: String,
    /// The subtree serialized back to XML, in document order
    pub xml: String,
}

/// Ordered collection of unrecognized subtrees attached to one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionBlob {
    elements: Vec<ExtensionElement>,
}

impl ExtensionBlob {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, element: ExtensionElement) {
        self.elements.push(element);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExtensionElement> {
        self.elements.iter()
    }

    /// First captured element with the given local name.
    pub fn find(&self, local_name: &str) -> Option<&ExtensionElement> {
        self.elements.iter().find(|e| e.local_name == local_name)
    }

    /// Concatenated XML of every captured element.
    pub fn to_xml(&self) -> String {
        self.elements.iter().map(|e| e.xml.as_str()).collect()
    }
}
