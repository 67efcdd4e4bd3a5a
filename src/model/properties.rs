//! Typed CMIS property values.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use smallvec::SmallVec;

use super::extension::ExtensionBlob;

/// Property id of the object id property.
pub const PROP_OBJECT_ID: &str = "cmis:objectId";
/// Property id of the base type id property.
pub const PROP_BASE_TYPE_ID: &str = "cmis:baseTypeId";
/// Property id of the object type id property.
pub const PROP_OBJECT_TYPE_ID: &str = "cmis:objectTypeId";
/// Property id of the name property.
pub const PROP_NAME: &str = "cmis:name";
/// Property id of the change token property.
pub const PROP_CHANGE_TOKEN: &str = "cmis:changeToken";
/// Property id of the content stream MIME type property.
pub const PROP_CONTENT_STREAM_MIME_TYPE: &str = "cmis:contentStreamMimeType";
/// Property id of the content stream length property.
pub const PROP_CONTENT_STREAM_LENGTH: &str = "cmis:contentStreamLength";

/// Declared type of a property, taken from its element name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyType {
    String,
    Integer,
    Decimal,
    Boolean,
    DateTime,
    Id,
    Uri,
    Html,
}

impl PropertyType {
    /// Map a `cmis:propertyXxx` local name to its type.
    pub fn from_element_name(local_name: &[u8]) -> Option<Self> {
        let ty = match local_name {
            b"propertyString" => Self::String,
            b"propertyInteger" => Self::Integer,
            b"propertyDecimal" => Self::Decimal,
            b"propertyBoolean" => Self::Boolean,
            b"propertyDateTime" => Self::DateTime,
            b"propertyId" => Self::Id,
            b"propertyUri" => Self::Uri,
            b"propertyHtml" => Self::Html,
            _ => return None,
        };
        Some(ty)
    }

    /// Local element name used on the wire.
    pub fn element_name(self) -> &'static str {
        match self {
            Self::String => "propertyString",
            Self::Integer => "propertyInteger",
            Self::Decimal => "propertyDecimal",
            Self::Boolean => "propertyBoolean",
            Self::DateTime => "propertyDateTime",
            Self::Id => "propertyId",
            Self::Uri => "propertyUri",
            Self::Html => "propertyHtml",
        }
    }
}

/// A single property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    String(String),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    Id(String),
    Uri(String),
    Html(String),
}

impl PropertyValue {
    pub fn property_type(&self) -> PropertyType {
        match self {
            Self::String(_) => PropertyType::String,
            Self::Integer(_) => PropertyType::Integer,
            Self::Decimal(_) => PropertyType::Decimal,
            Self::Boolean(_) => PropertyType::Boolean,
            Self::DateTime(_) => PropertyType::DateTime,
            Self::Id(_) => PropertyType::Id,
            Self::Uri(_) => PropertyType::Uri,
            Self::Html(_) => PropertyType::Html,
        }
    }

    /// Text of string-like values (string, id, uri, html).
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Id(s) | Self::Uri(s) | Self::Html(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Wire representation of the value.
    pub fn to_wire(&self) -> String {
        match self {
            Self::String(s) | Self::Id(s) | Self::Uri(s) | Self::Html(s) => s.clone(),
            Self::Integer(v) => itoa::Buffer::new().format(*v).to_string(),
            Self::Decimal(v) => v.to_string(),
            Self::Boolean(v) => v.to_string(),
            Self::DateTime(v) => v.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        }
    }
}

/// A property with its definition attributes and values.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyData {
    pub id: String,
    pub local_name: Option<String>,
    pub display_name: Option<String>,
    pub query_name: Option<String>,
    pub property_type: PropertyType,
    pub values: SmallVec<[PropertyValue; 1]>,
}

impl PropertyData {
    /// A property with no values yet.
    pub fn new(id: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            id: id.into(),
            local_name: None,
            display_name: None,
            query_name: None,
            property_type,
            values: SmallVec::new(),
        }
    }

    /// A single-valued property; the type follows the value.
    pub fn single(id: impl Into<String>, value: PropertyValue) -> Self {
        let mut data = Self::new(id, value.property_type());
        data.values.push(value);
        data
    }

    #[inline]
    pub fn first_value(&self) -> Option<&PropertyValue> {
        self.values.first()
    }
}

/// Properties of an object keyed by property id, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CmisProperties {
    entries: Vec<PropertyData>,
    index: HashMap<String, usize>,
    pub extensions: ExtensionBlob,
}

impl CmisProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a property, replacing any existing one with the same id.
    pub fn insert(&mut self, property: PropertyData) {
        match self.index.get(&property.id) {
            Some(&slot) => self.entries[slot] = property,
            None => {
                self.index.insert(property.id.clone(), self.entries.len());
                self.entries.push(property);
            },
        }
    }

    pub fn get(&self, id: &str) -> Option<&PropertyData> {
        self.index.get(id).map(|&slot| &self.entries[slot])
    }

    /// First value of a string-like property.
    pub fn string_value(&self, id: &str) -> Option<&str> {
        self.get(id)?.first_value()?.as_str()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertyData> {
        self.entries.iter()
    }

    pub fn object_id(&self) -> Option<&str> {
        self.string_value(PROP_OBJECT_ID)
    }
}

impl FromIterator<PropertyData> for CmisProperties {
    fn from_iter<I: IntoIterator<Item = PropertyData>>(iter: I) -> Self {
        let mut properties = Self::new();
        for property in iter {
            properties.insert(property);
        }
        properties
    }
}
