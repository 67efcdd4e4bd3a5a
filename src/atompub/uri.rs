//! Request URI construction from URI templates and links.

use std::fmt;

use memchr::memchr;

use crate::model::UriTemplate;

/// Which relationships to include with an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IncludeRelationships {
    None,
    Source,
    Target,
    Both,
}

impl IncludeRelationships {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Source => "source",
            Self::Target => "target",
            Self::Both => "both",
        }
    }
}

/// Version of a document to return when fetching by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnVersion {
    This,
    Latest,
    LatestMajor,
}

impl ReturnVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::This => "this",
            Self::Latest => "latest",
            Self::LatestMajor => "latestmajor",
        }
    }
}

/// What happens to objects that are also filed elsewhere when a folder tree
/// is deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum UnfileObject {
    Unfile,
    DeleteSingleFiled,
    #[default]
    Delete,
}

impl UnfileObject {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unfile => "unfile",
            Self::DeleteSingleFiled => "deletesinglefiled",
            Self::Delete => "delete",
        }
    }
}

/// Optional parameters of an object fetch.
///
/// Unset fields are left out of the request entirely. Two fetches are
/// interchangeable for caching purposes only when their options are equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ObjectFetchOptions {
    pub filter: Option<String>,
    pub include_relationships: Option<IncludeRelationships>,
    pub include_policy_ids: Option<bool>,
    pub rendition_filter: Option<String>,
    pub include_acl: Option<bool>,
    pub include_allowable_actions: Option<bool>,
    pub return_version: Option<ReturnVersion>,
}

impl ObjectFetchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn include_relationships(mut self, include: IncludeRelationships) -> Self {
        self.include_relationships = Some(include);
        self
    }

    pub fn include_policy_ids(mut self, include: bool) -> Self {
        self.include_policy_ids = Some(include);
        self
    }

    pub fn rendition_filter(mut self, filter: impl Into<String>) -> Self {
        self.rendition_filter = Some(filter.into());
        self
    }

    pub fn include_acl(mut self, include: bool) -> Self {
        self.include_acl = Some(include);
        self
    }

    pub fn include_allowable_actions(mut self, include: bool) -> Self {
        self.include_allowable_actions = Some(include);
        self
    }

    pub fn return_version(mut self, version: ReturnVersion) -> Self {
        self.return_version = Some(version);
        self
    }

    /// Supplied parameters, named as on the wire.
    pub fn parameters(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(7);
        if let Some(filter) = &self.filter {
            params.push(("filter", filter.clone()));
        }
        if let Some(include) = self.include_allowable_actions {
            params.push(("includeAllowableActions", include.to_string()));
        }
        if let Some(include) = self.include_acl {
            params.push(("includeACL", include.to_string()));
        }
        if let Some(include) = self.include_policy_ids {
            params.push(("includePolicyIds", include.to_string()));
        }
        if let Some(include) = self.include_relationships {
            params.push(("includeRelationships", include.as_str().to_string()));
        }
        if let Some(filter) = &self.rendition_filter {
            params.push(("renditionFilter", filter.clone()));
        }
        if let Some(version) = self.return_version {
            params.push(("returnVersion", version.as_str().to_string()));
        }
        params
    }
}

/// Builds object URIs from the `objectbyid` or `objectbypath` template.
///
/// Parameters the template has no placeholder for are appended as query
/// parameters, so a supplied option is never silently dropped.
#[derive(Debug, Clone)]
pub struct ObjectByIdUriBuilder<'a> {
    template: &'a UriTemplate,
    key: (&'static str, String),
    options: Option<&'a ObjectFetchOptions>,
}

impl<'a> ObjectByIdUriBuilder<'a> {
    /// Builder for the object-by-id template.
    pub fn new(template: &'a UriTemplate, object_id: &str) -> Self {
        Self {
            template,
            key: ("id", object_id.to_string()),
            options: None,
        }
    }

    /// Builder for the object-by-path template.
    pub fn for_path(template: &'a UriTemplate, path: &str) -> Self {
        Self {
            template,
            key: ("path", path.to_string()),
            options: None,
        }
    }

    pub fn options(mut self, options: &'a ObjectFetchOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn build(&self) -> String {
        let mut params = vec![self.key.clone()];
        if let Some(options) = self.options {
            params.extend(options.parameters());
        }
        let mut uri = self.template.resolve(&params);
        for (name, value) in &params {
            if !self.template.accepts(name) {
                uri = append_query_param(&uri, name, value);
            }
        }
        uri
    }
}

impl fmt::Display for ObjectByIdUriBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.build())
    }
}

/// Append `name=value` to `uri`, encoding the value.
pub fn append_query_param(uri: &str, name: &str, value: &str) -> String {
    let mut out = String::with_capacity(uri.len() + name.len() + value.len() + 2);
    out.push_str(uri);
    match memchr(b'?', uri.as_bytes()) {
        None => out.push('?'),
        Some(pos) if pos + 1 < uri.len() && !uri.ends_with('&') => out.push('&'),
        Some(_) => {},
    }
    out.push_str(name);
    out.push('=');
    out.push_str(&urlencoding::encode(value));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::template::{TEMPLATE_OBJECT_BY_ID, TEMPLATE_OBJECT_BY_PATH};

    fn by_id() -> UriTemplate {
        UriTemplate::new(
            TEMPLATE_OBJECT_BY_ID,
            "http://host/id?id={id}&filter={filter}&includeACL={includeACL}&includeRelationships={includeRelationships}",
            None,
        )
    }

    #[test]
    fn test_only_supplied_options_are_sent() {
        let template = by_id();
        assert_eq!(ObjectByIdUriBuilder::new(&template, "42").build(), "http://host/id?id=42");

        let options = ObjectFetchOptions::new()
            .include_acl(true)
            .include_relationships(IncludeRelationships::Both);
        let uri = ObjectByIdUriBuilder::new(&template, "42")
            .options(&options)
            .build();
        assert_eq!(uri, "http://host/id?id=42&includeACL=true&includeRelationships=both");
    }

    #[test]
    fn test_unknown_placeholder_appended() {
        let template = by_id();
        let options = ObjectFetchOptions::new().return_version(ReturnVersion::LatestMajor);
        let uri = ObjectByIdUriBuilder::new(&template, "42")
            .options(&options)
            .build();
        assert_eq!(uri, "http://host/id?id=42&returnVersion=latestmajor");
    }

    #[test]
    fn test_path_template() {
        let template = UriTemplate::new(TEMPLATE_OBJECT_BY_PATH, "http://host/path?path={path}&filter={filter}", None);
        let uri = ObjectByIdUriBuilder::for_path(&template, "/Sites/a b").build();
        assert_eq!(uri, "http://host/path?path=%2FSites%2Fa%20b");
    }

    #[test]
    fn test_append_query_param() {
        assert_eq!(append_query_param("http://h/x", "a", "1"), "http://h/x?a=1");
        assert_eq!(append_query_param("http://h/x?", "a", "1"), "http://h/x?a=1");
        assert_eq!(append_query_param("http://h/x?b=2", "a", "1 2"), "http://h/x?b=2&a=1%202");
    }

    #[test]
    fn test_options_equality_drives_cache_reuse() {
        let a = ObjectFetchOptions::new().filter("*");
        let b = ObjectFetchOptions::new().filter("*");
        assert_eq!(a, b);
        assert_ne!(a, ObjectFetchOptions::new());
    }
}
