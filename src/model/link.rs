//! Atom links and relation lookup.

/// A single `<atom:link>` carried by an entry or a workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Relation name, e.g. `self`, `down` or a CMIS link relation URI
    pub relation: String,
    /// Optional MIME type, used as a secondary match key
    pub media_type: Option<String>,
    /// Target URI
    pub href: String,
}

impl Link {
    pub fn new(relation: impl Into<String>, media_type: Option<String>, href: impl Into<String>) -> Self {
        Self {
            relation: relation.into(),
            media_type,
            href: href.into(),
        }
    }
}

/// Ordered list of links in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Links {
    links: Vec<Link>,
}

impl Links {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, link: Link) {
        self.links.push(link);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Link> {
        self.links.iter()
    }

    /// Find the href for `relation`.
    ///
    /// When `media_type` is given the first link matching both relation and
    /// type wins; otherwise, or when no typed link matches, the first link with
    /// the relation is returned.
    pub fn find(&self, relation: &str, media_type: Option<&str>) -> Option<&str> {
        if let Some(wanted) = media_type
            && let Some(link) = self.links.iter().find(|link| {
                link.relation == relation
                    && link
                        .media_type
                        .as_deref()
                        .is_some_and(|actual| media_types_match(actual, wanted))
            })
        {
            return Some(&link.href);
        }

        self.links
            .iter()
            .find(|link| link.relation == relation)
            .map(|link| link.href.as_str())
    }

    /// Whether any link carries `relation`.
    pub fn contains(&self, relation: &str) -> bool {
        self.links.iter().any(|link| link.relation == relation)
    }
}

impl FromIterator<Link> for Links {
    fn from_iter<I: IntoIterator<Item = Link>>(iter: I) -> Self {
        Self {
            links: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Links {
    type Item = &'a Link;
    type IntoIter = std::slice::Iter<'a, Link>;

    fn into_iter(self) -> Self::IntoIter {
        self.links.iter()
    }
}

/// Compare two MIME types ignoring case and whitespace around parameters.
///
/// `application/atom+xml; type=feed` matches `application/atom+xml;type=feed`.
pub fn media_types_match(a: &str, b: &str) -> bool {
    let mut left = a.chars().filter(|c| !c.is_whitespace());
    let mut right = b.chars().filter(|c| !c.is_whitespace());
    loop {
        match (left.next(), right.next()) {
            (None, None) => return true,
            (Some(x), Some(y)) if x.eq_ignore_ascii_case(&y) => continue,
            _ => return false,
        }
    }
}
