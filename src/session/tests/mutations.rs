use std::sync::Arc;

use super::*;
use crate::atompub::{ObjectFetchOptions, UnfileObject};
use crate::common::error::ErrorCode;
use crate::http::mock::RecordedRequest;
use crate::model::{CmisProperties, PropertyData, PropertyValue};
use crate::session::{BindingError, ContentSource};

fn named(name: &str) -> CmisProperties {
    [
        PropertyData::single("cmis:name", PropertyValue::String(name.to_string())),
        PropertyData::single("cmis:objectTypeId", PropertyValue::Id("cmis:folder".to_string())),
    ]
    .into_iter()
    .collect()
}

fn last(mock: &MockTransport, method: Method) -> RecordedRequest {
    mock.requests()
        .into_iter()
        .rev()
        .find(|r| r.method == method)
        .unwrap()
}

#[tokio::test]
async fn test_update_evicts_and_next_retrieve_refetches() {
    let mock = MockTransport::new();
    let session = connected(&mock).await;
    serve_object(&mock, "doc-1", "a.txt");
    mock.respond(
        Method::Put,
        "http://repo/entry/doc-1/edit?changeToken=token-1",
        200,
        object_entry("doc-1", "b.txt"),
    );

    let options = ObjectFetchOptions::new();
    let cached = session.retrieve_object("doc-1", &options).await.unwrap();
    let updated = session
        .update_properties("doc-1", &named("b.txt"), cached.change_token())
        .await
        .unwrap();

    assert_eq!(updated.name(), Some("b.txt"));
    assert!(!session.cache().contains("doc-1"));
    let put = last(&mock, Method::Put);
    assert_eq!(put.header("Content-Type"), Some("application/atom+xml;type=entry"));
    assert!(put.body_text().contains("<cmis:value>b.txt</cmis:value>"));

    session.retrieve_object("doc-1", &options).await.unwrap();
    assert_eq!(mock.count(Method::Get, &object_url("doc-1")), 2);
}

#[tokio::test]
async fn test_update_without_edit_link_uses_self() {
    let mock = MockTransport::new();
    let session = connected(&mock).await;
    let links = r#"<link rel="self" href="http://repo/entry/doc-2"/>"#;
    mock.respond(Method::Get, &object_url("doc-2"), 200, entry_with_links("doc-2", "c.txt", links));
    mock.respond(Method::Put, "http://repo/entry/doc-2", 204, "");

    let updated = session
        .update_properties("doc-2", &named("d.txt"), None)
        .await
        .unwrap();
    // Empty response: the object is fetched again.
    assert_eq!(updated.object_id, "doc-2");
    assert_eq!(mock.count(Method::Put, "http://repo/entry/doc-2"), 1);
    assert_eq!(mock.count(Method::Get, &object_url("doc-2")), 2);
    assert!(!session.cache().contains("doc-2"));
}

#[tokio::test]
async fn test_delete_object_evicts_even_on_failure() {
    let mock = MockTransport::new();
    let session = connected(&mock).await;
    serve_object(&mock, "doc-1", "a.txt");
    serve_object(&mock, "doc-2", "b.txt");
    mock.respond(Method::Delete, "http://repo/entry/doc-1", 204, "");
    mock.respond(
        Method::Delete,
        "http://repo/entry/doc-2",
        409,
        "<!--exception-->versioning<!--/exception-->",
    );

    session.delete_object("doc-1", true).await.unwrap();
    assert!(!session.cache().contains("doc-1"));

    let err = session.delete_object("doc-2", false).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::Versioning);
    assert!(matches!(err, BindingError::Cmis { status: 409, .. }));
    assert!(err.body().is_some());
    assert!(!session.cache().contains("doc-2"));
}

#[tokio::test]
async fn test_create_folder_posts_entry_to_children() {
    let mock = MockTransport::new();
    let session = connected(&mock).await;
    serve_object(&mock, "root-A", "root");
    mock.respond(
        Method::Post,
        "http://repo/children/root-A",
        201,
        object_entry("folder-9", "reports"),
    );

    let id = session.create_folder("root-A", &named("reports")).await.unwrap();
    assert_eq!(id, "folder-9");

    let post = last(&mock, Method::Post);
    assert!(post.body_text().contains("<atom:title>reports</atom:title>"));
    assert!(post.body_text().contains("propertyDefinitionId=\"cmis:objectTypeId\""));
    assert!(!session.cache().contains("root-A"));
}

#[tokio::test]
async fn test_delete_tree_reports_failed_objects() {
    let mock = MockTransport::new();
    let session = connected(&mock).await;
    serve_object(&mock, "folder-1", "reports");
    serve_object(&mock, "folder-2", "archive");
    mock.respond(
        Method::Delete,
        "http://repo/tree/folder-1?unfileObjects=delete&continueOnFailure=true",
        204,
        "",
    );
    mock.respond(
        Method::Delete,
        "http://repo/tree/folder-2?unfileObjects=unfile&continueOnFailure=false",
        500,
        feed(&[("doc-3", "locked.txt")]),
    );

    let failed = session
        .delete_tree("folder-1", true, UnfileObject::Delete, true)
        .await
        .unwrap();
    assert!(failed.is_empty());
    assert!(!session.cache().contains("folder-1"));

    let failed = session
        .delete_tree("folder-2", false, UnfileObject::Unfile, false)
        .await
        .unwrap();
    assert_eq!(failed, ["doc-3"]);
}

#[tokio::test]
async fn test_delete_tree_error_without_feed() {
    let mock = MockTransport::new();
    let session = connected(&mock).await;
    serve_object(&mock, "folder-1", "reports");
    mock.respond(
        Method::Delete,
        "http://repo/tree/folder-1?unfileObjects=delete&continueOnFailure=false",
        403,
        "denied",
    );

    let err = session
        .delete_tree("folder-1", false, UnfileObject::default(), false)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::PermissionDenied);
}

#[tokio::test]
async fn test_streaming_operations_fail_fast_on_buffered_transport() {
    let mock = MockTransport::new();
    let session = connected(&mock).await;
    let before = mock.requests().len();

    let err = session
        .create_document(
            "root-A",
            &named("a.txt"),
            ContentSource::from_bytes("abc", "text/plain"),
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BindingError::NotSupported(_)));

    let sink = Box::new(tokio::io::sink());
    let err = session.download_content("doc-1", None, sink, None).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotSupported);
    assert_eq!(mock.requests().len(), before);
}

#[tokio::test]
async fn test_concurrent_mutation_leaves_no_stale_entry() {
    let mock = MockTransport::new();
    let session = Arc::new(connected(&mock).await);
    serve_object(&mock, "doc-1", "a.txt");
    mock.respond(Method::Delete, "http://repo/entry/doc-1", 204, "");
    session
        .retrieve_object("doc-1", &ObjectFetchOptions::new())
        .await
        .unwrap();

    let mut tasks = Vec::new();
    for i in 0..8 {
        let session = Arc::clone(&session);
        tasks.push(tokio::spawn(async move {
            if i == 4 {
                session.delete_object("doc-1", false).await.map(|_| ())
            } else {
                session
                    .retrieve_object("doc-1", &ObjectFetchOptions::new())
                    .await
                    .map(|_| ())
            }
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }
    assert!(session.cache().len() <= 1);
    assert_eq!(mock.count(Method::Delete, "http://repo/entry/doc-1"), 1);
}
