//! `<cmis:properties>` scope with typed value decoding.

use quick_xml::events::BytesStart;

use super::DecodeError;
use super::extension::ExtensionScope;
use super::scope::{Decoded, ElementName, ScopeDecoder, Step, attribute, parse_bool, parse_datetime, parse_decimal, parse_integer};
use crate::atompub::constants::Namespace;
use crate::model::{CmisProperties, PropertyData, PropertyType, PropertyValue};

#[derive(Default)]
pub(crate) struct PropertiesScope {
    properties: CmisProperties,
    current: Option<PropertyData>,
}

impl PropertiesScope {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScopeDecoder for PropertiesScope {
    fn start(&mut self, depth: usize, name: ElementName<'_>, element: &BytesStart<'_>) -> Result<Step, DecodeError> {
        if depth > 2 {
            // Only values are read below a property.
            return Ok(if depth == 3 && name.is(Namespace::Cmis, b"value") {
                Step::Consume
            } else {
                Step::Delegate(ExtensionScope::boxed())
            });
        }
        let property_type = match name.ns {
            Namespace::Cmis => PropertyType::from_element_name(name.local),
            _ => None,
        };
        let Some(property_type) = property_type else {
            return Ok(Step::Delegate(ExtensionScope::boxed()));
        };

        let id = attribute(element, b"propertyDefinitionId")?
            .ok_or_else(|| DecodeError::MissingRequiredElement("propertyDefinitionId".to_string()))?;
        let mut property = PropertyData::new(id, property_type);
        property.local_name = attribute(element, b"localName")?;
        property.display_name = attribute(element, b"displayName")?;
        property.query_name = attribute(element, b"queryName")?;
        self.current = Some(property);
        Ok(Step::Consume)
    }

    fn end(&mut self, depth: usize, name: ElementName<'_>, text: &str) -> Result<(), DecodeError> {
        match depth {
            3 if name.is(Namespace::Cmis, b"value") => {
                if let Some(property) = self.current.as_mut() {
                    let value = parse_value(property, text)?;
                    property.values.push(value);
                }
            },
            2 => {
                if let Some(property) = self.current.take() {
                    self.properties.insert(property);
                }
            },
            _ => {},
        }
        Ok(())
    }

    fn accept(&mut self, child: Decoded) -> Result<(), DecodeError> {
        if let Decoded::Extension(extension) = child {
            self.properties.extensions.push(extension);
        }
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Decoded, DecodeError> {
        Ok(Decoded::Properties(self.properties))
    }
}

/// Decodes one `<cmis:value>` according to the declared property type.
fn parse_value(property: &PropertyData, raw: &str) -> Result<PropertyValue, DecodeError> {
    let value = match property.property_type {
        PropertyType::String => Some(PropertyValue::String(raw.to_string())),
        PropertyType::Html => Some(PropertyValue::Html(raw.to_string())),
        PropertyType::Id => Some(PropertyValue::Id(raw.trim().to_string())),
        PropertyType::Uri => Some(PropertyValue::Uri(raw.trim().to_string())),
        PropertyType::Integer => parse_integer(raw).map(PropertyValue::Integer),
        PropertyType::Decimal => parse_decimal(raw).map(PropertyValue::Decimal),
        PropertyType::Boolean => parse_bool(raw).map(PropertyValue::Boolean),
        PropertyType::DateTime => parse_datetime(raw).map(PropertyValue::DateTime),
    };
    value.ok_or_else(|| DecodeError::InvalidPropertyValue {
        property_id: property.id.clone(),
        raw: raw.to_string(),
    })
}
