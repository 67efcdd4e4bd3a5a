//! Session scenarios against the scripted transport.

mod mutations;
mod objects;

use std::sync::Arc;

use super::BindingSession;
use crate::config::SessionParameters;
use crate::http::Method;
use crate::http::mock::MockTransport;

const NAMESPACES: &str = r#"xmlns="http://www.w3.org/2005/Atom" xmlns:app="http://www.w3.org/2007/app" xmlns:cmis="http://docs.oasis-open.org/ns/cmis/core/200908/" xmlns:cmisra="http://docs.oasis-open.org/ns/cmis/restatom/200908/""#;

const SERVICE_URL: &str = "http://repo/service";

fn workspace(id: &str) -> String {
    format!(
        r#"<app:workspace>
  <title>{id}</title>
  <cmisra:repositoryInfo>
    <cmis:repositoryId>{id}</cmis:repositoryId>
    <cmis:repositoryName>Repository {id}</cmis:repositoryName>
    <cmis:rootFolderId>root-{id}</cmis:rootFolderId>
    <cmis:capabilities><cmis:capabilityACL>manage</cmis:capabilityACL></cmis:capabilities>
  </cmisra:repositoryInfo>
  <app:collection href="http://repo/{id}/children">
    <cmisra:collectionType>root</cmisra:collectionType>
  </app:collection>
  <cmisra:uritemplate>
    <cmisra:template>http://repo/{id}/id?id={{id}}&amp;filter={{filter}}&amp;includeAllowableActions={{includeAllowableActions}}&amp;includeACL={{includeACL}}&amp;renditionFilter={{renditionFilter}}</cmisra:template>
    <cmisra:type>objectbyid</cmisra:type>
    <cmisra:mediatype>application/atom+xml;type=entry</cmisra:mediatype>
  </cmisra:uritemplate>
  <cmisra:uritemplate>
    <cmisra:template>http://repo/{id}/path?path={{path}}&amp;filter={{filter}}</cmisra:template>
    <cmisra:type>objectbypath</cmisra:type>
  </cmisra:uritemplate>
</app:workspace>"#
    )
}

fn service_document(repository_ids: &[&str]) -> String {
    let workspaces: String = repository_ids.iter().map(|id| workspace(id)).collect();
    format!(r#"<?xml version="1.0" encoding="UTF-8"?><app:service {NAMESPACES}>{workspaces}</app:service>"#)
}

/// Links every test object carries, in this order.
fn standard_links(id: &str) -> String {
    format!(
        r#"<link rel="self" href="http://repo/entry/{id}"/>
  <link rel="edit" href="http://repo/entry/{id}/edit"/>
  <link rel="edit-media" href="http://repo/media/{id}"/>
  <link rel="http://docs.oasis-open.org/ns/cmis/link/200908/allowableactions" type="application/cmisallowableactions+xml" href="http://repo/actions/{id}"/>
  <link rel="down" type="application/atom+xml;type=feed" href="http://repo/children/{id}"/>
  <link rel="down" type="application/cmistree+xml" href="http://repo/tree/{id}"/>"#
    )
}

fn entry_body(id: &str, name: &str, links: &str) -> String {
    format!(
        r#"<id>urn:uuid:{id}</id>
  <title>{name}</title>
  <content src="http://repo/content/{id}" type="text/plain"/>
  {links}
  <cmisra:object>
    <cmis:properties>
      <cmis:propertyId propertyDefinitionId="cmis:objectId"><cmis:value>{id}</cmis:value></cmis:propertyId>
      <cmis:propertyId propertyDefinitionId="cmis:baseTypeId"><cmis:value>cmis:document</cmis:value></cmis:propertyId>
      <cmis:propertyString propertyDefinitionId="cmis:name"><cmis:value>{name}</cmis:value></cmis:propertyString>
      <cmis:propertyString propertyDefinitionId="cmis:changeToken"><cmis:value>token-1</cmis:value></cmis:propertyString>
      <cmis:propertyInteger propertyDefinitionId="cmis:contentStreamLength"><cmis:value>40</cmis:value></cmis:propertyInteger>
    </cmis:properties>
    <cmis:rendition>
      <cmis:streamId>thumb-{id}</cmis:streamId>
      <cmis:kind>cmis:thumbnail</cmis:kind>
    </cmis:rendition>
  </cmisra:object>"#
    )
}

fn object_entry(id: &str, name: &str) -> String {
    entry_with_links(id, name, &standard_links(id))
}

fn entry_with_links(id: &str, name: &str, links: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><entry {NAMESPACES}>{}</entry>"#,
        entry_body(id, name, links)
    )
}

fn feed(entries: &[(&str, &str)]) -> String {
    let entries: String = entries
        .iter()
        .map(|(id, name)| format!("<entry>{}</entry>", entry_body(id, name, &standard_links(id))))
        .collect();
    format!(r#"<?xml version="1.0" encoding="UTF-8"?><feed {NAMESPACES}><title>children</title>{entries}</feed>"#)
}

/// Object-by-id URL of repository `A` without options.
fn object_url(id: &str) -> String {
    format!("http://repo/A/id?id={id}")
}

fn parameters() -> SessionParameters {
    let mut parameters = SessionParameters::new(SERVICE_URL);
    parameters.username = "alice".to_string();
    parameters.password = "secret".to_string();
    parameters
}

/// Session bootstrapped against a service document with repository `A`.
async fn connected(mock: &MockTransport) -> BindingSession {
    mock.respond(Method::Get, SERVICE_URL, 200, service_document(&["A"]));
    let session = BindingSession::new(parameters(), Arc::new(mock.clone()));
    session.connect().await.unwrap();
    session
}

/// Route the object-by-id fetch of `id` in repository `A`.
fn serve_object(mock: &MockTransport, id: &str, name: &str) {
    mock.respond(Method::Get, &object_url(id), 200, object_entry(id, name));
}
