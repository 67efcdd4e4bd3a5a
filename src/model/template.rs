//! URI templates advertised by a workspace.
//!
//! A template is a URI pattern with `{placeholder}` tokens, e.g.
//!
//! ```text
//! http://host/cmis/id?id={id}&filter={filter}&includeACL={includeACL}
//! ```
//!
//! Resolution substitutes the supplied parameters. A query segment whose
//! placeholder was not supplied is dropped together with its separator, so
//! the resolved URI never contains literal braces or empty `name=` pairs.

use memchr::memchr;

/// Template type of the object-by-id template.
pub const TEMPLATE_OBJECT_BY_ID: &str = "objectbyid";
/// Template type of the object-by-path template.
pub const TEMPLATE_OBJECT_BY_PATH: &str = "objectbypath";
/// Template type of the query template.
pub const TEMPLATE_QUERY: &str = "query";
/// Template type of the type-by-id template.
pub const TEMPLATE_TYPE_BY_ID: &str = "typebyid";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    template_type: String,
    pattern: String,
    media_type: Option<String>,
    placeholders: Vec<String>,
}

impl UriTemplate {
    pub fn new(template_type: impl Into<String>, pattern: impl Into<String>, media_type: Option<String>) -> Self {
        let pattern = pattern.into();
        let placeholders = scan_placeholders(&pattern);
        Self {
            template_type: template_type.into(),
            pattern,
            media_type,
            placeholders,
        }
    }

    #[inline]
    pub fn template_type(&self) -> &str {
        &self.template_type
    }

    #[inline]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    #[inline]
    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    /// Legal placeholder names, in pattern order.
    #[inline]
    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }

    pub fn accepts(&self, name: &str) -> bool {
        self.placeholders.iter().any(|p| p == name)
    }

    /// Resolve the template with the given parameters.
    ///
    /// Parameters whose name is not a placeholder of this template are
    /// ignored. Path placeholders without a value resolve to an empty string.
    pub fn resolve(&self, params: &[(&str, String)]) -> String {
        let lookup = |name: &str| {
            params
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.as_str())
        };

        let mut out = String::with_capacity(self.pattern.len() + 32);
        let (path, query) = match memchr(b'?', self.pattern.as_bytes()) {
            Some(pos) => (&self.pattern[..pos], Some(&self.pattern[pos + 1..])),
            None => (self.pattern.as_str(), None),
        };

        substitute(path, &lookup, false, &mut out);

        if let Some(query) = query {
            let mut first = true;
            let mut segment_buf = String::new();
            for segment in query.split('&').filter(|s| !s.is_empty()) {
                segment_buf.clear();
                if !substitute(segment, &lookup, true, &mut segment_buf) {
                    continue;
                }
                out.push(if first { '?' } else { '&' });
                out.push_str(&segment_buf);
                first = false;
            }
        }

        out
    }
}

/// Copy `segment` into `out`, replacing placeholders with encoded values.
///
/// Returns false, leaving `out` partially written, when `require_all` is set
/// and a placeholder has no value.
fn substitute<'p>(
    segment: &str,
    lookup: &impl Fn(&str) -> Option<&'p str>,
    require_all: bool,
    out: &mut String,
) -> bool {
    let mut rest = segment;
    loop {
        let Some(open) = memchr(b'{', rest.as_bytes()) else {
            out.push_str(rest);
            return true;
        };
        let Some(len) = memchr(b'}', &rest.as_bytes()[open..]) else {
            out.push_str(rest);
            return true;
        };
        let close = open + len;
        out.push_str(&rest[..open]);
        match lookup(&rest[open + 1..close]) {
            Some(value) => out.push_str(&urlencoding::encode(value)),
            None if require_all => return false,
            None => {},
        }
        rest = &rest[close + 1..];
    }
}

fn scan_placeholders(pattern: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = pattern;
    while let Some(open) = memchr(b'{', rest.as_bytes()) {
        let Some(len) = memchr(b'}', &rest.as_bytes()[open..]) else {
            break;
        };
        let name = &rest[open + 1..open + len];
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
        rest = &rest[open + len + 1..];
    }
    names
}
