//! Atom entry serialization for create and update requests.
//!
//! Output is written straight into a `String` buffer; every text value and
//! attribute goes through [`escape_xml`].

use chrono::{SecondsFormat, Utc};

use super::constants::{NS_ATOM, NS_CMIS, NS_CMISRA};
use crate::common::xml::escape_xml;
use crate::model::{CmisProperties, RepositoryInfo};

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";

/// Placeholder id; repositories assign the real one.
const ENTRY_ID: &str = "urn:uuid:00000000-0000-0000-0000-000000000000";

/// Entry carrying only properties (folder creation, property updates).
pub fn entry_xml(properties: &CmisProperties, title: Option<&str>) -> String {
    let mut out = String::with_capacity(512 + properties.len() * 128);
    write_entry_head(&mut out, title);
    write_object(&mut out, properties);
    out.push_str("</atom:entry>");
    out
}

/// Entry with inline base64 content, split around the content so the
/// encoded stream can be written between the two halves without buffering.
#[derive(Debug, Clone)]
pub struct ContentEntryParts {
    /// Everything up to and including `<cmisra:base64>`
    pub prefix: String,
    /// Everything from `</cmisra:base64>` to the end of the document
    pub suffix: String,
}

pub fn content_entry_parts(properties: &CmisProperties, title: Option<&str>, mime_type: &str) -> ContentEntryParts {
    let mut prefix = String::with_capacity(512);
    write_entry_head(&mut prefix, title);
    prefix.push_str("<cmisra:content>");
    push_element(&mut prefix, "cmisra:mediatype", mime_type);
    prefix.push_str("<cmisra:base64>");

    let mut suffix = String::with_capacity(256 + properties.len() * 128);
    suffix.push_str("</cmisra:base64></cmisra:content>");
    write_object(&mut suffix, properties);
    suffix.push_str("</atom:entry>");

    ContentEntryParts { prefix, suffix }
}

/// Standalone `repositoryInfo` document with the known fields of `info`.
/// Extension content is appended verbatim.
pub fn repository_info_xml(info: &RepositoryInfo) -> String {
    let mut out = String::with_capacity(1024);
    out.push_str(XML_DECLARATION);
    out.push_str("<cmisra:repositoryInfo xmlns:cmis=\"");
    out.push_str(NS_CMIS);
    out.push_str("\" xmlns:cmisra=\"");
    out.push_str(NS_CMISRA);
    out.push_str("\">");

    push_element(&mut out, "cmis:repositoryId", &info.id);
    push_optional(&mut out, "cmis:repositoryName", info.name.as_deref());
    push_optional(&mut out, "cmis:repositoryDescription", info.description.as_deref());
    push_optional(&mut out, "cmis:vendorName", info.vendor_name.as_deref());
    push_optional(&mut out, "cmis:productName", info.product_name.as_deref());
    push_optional(&mut out, "cmis:productVersion", info.product_version.as_deref());
    push_element(&mut out, "cmis:rootFolderId", &info.root_folder_id);
    push_optional(&mut out, "cmis:latestChangeLogToken", info.latest_change_log_token.as_deref());

    if !info.capabilities.is_empty() {
        let mut capabilities: Vec<_> = info.capabilities.iter().collect();
        capabilities.sort();
        out.push_str("<cmis:capabilities>");
        for (name, value) in capabilities {
            push_element(&mut out, &format!("cmis:{}", name), value);
        }
        out.push_str("</cmis:capabilities>");
    }

    push_optional(&mut out, "cmis:cmisVersionSupported", info.cmis_version_supported.as_deref());
    push_optional(&mut out, "cmis:thinClientURI", info.thin_client_uri.as_deref());
    if let Some(incomplete) = info.changes_incomplete {
        push_element(&mut out, "cmis:changesIncomplete", if incomplete { "true" } else { "false" });
    }
    for base_type in &info.changes_on_type {
        push_element(&mut out, "cmis:changesOnType", base_type);
    }
    push_optional(&mut out, "cmis:principalAnonymous", info.principal_id_anonymous.as_deref());
    push_optional(&mut out, "cmis:principalAnyone", info.principal_id_anyone.as_deref());
    out.push_str(&info.extensions.to_xml());
    out.push_str("</cmisra:repositoryInfo>");
    out
}

fn write_entry_head(out: &mut String, title: Option<&str>) {
    out.push_str(XML_DECLARATION);
    out.push_str("<atom:entry xmlns:atom=\"");
    out.push_str(NS_ATOM);
    out.push_str("\" xmlns:cmis=\"");
    out.push_str(NS_CMIS);
    out.push_str("\" xmlns:cmisra=\"");
    out.push_str(NS_CMISRA);
    out.push_str("\">");
    push_element(out, "atom:id", ENTRY_ID);
    push_element(out, "atom:title", title.unwrap_or_default());
    push_element(
        out,
        "atom:updated",
        &Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    );
}

fn write_object(out: &mut String, properties: &CmisProperties) {
    out.push_str("<cmisra:object><cmis:properties>");
    for property in properties.iter() {
        let element = property.property_type.element_name();
        out.push_str("<cmis:");
        out.push_str(element);
        out.push_str(" propertyDefinitionId=\"");
        out.push_str(&escape_xml(&property.id));
        out.push_str("\">");
        for value in &property.values {
            push_element(out, "cmis:value", &value.to_wire());
        }
        out.push_str("</cmis:");
        out.push_str(element);
        out.push('>');
    }
    out.push_str(&properties.extensions.to_xml());
    out.push_str("</cmis:properties></cmisra:object>");
}

fn push_element(out: &mut String, name: &str, text: &str) {
    out.push('<');
    out.push_str(name);
    out.push('>');
    out.push_str(&escape_xml(text));
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn push_optional(out: &mut String, name: &str, text: Option<&str>) {
    if let Some(text) = text {
        push_element(out, name, text);
    }
}
