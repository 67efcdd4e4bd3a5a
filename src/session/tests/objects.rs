use std::sync::Arc;

use super::*;
use crate::atompub::ObjectFetchOptions;
use crate::atompub::constants::{MEDIATYPE_CMISTREE, MEDIATYPE_FEED, REL_ALLOWABLE_ACTIONS, REL_DOWN, REL_VERSION_HISTORY};
use crate::common::error::ErrorCode;
use crate::session::BindingError;

#[tokio::test]
async fn test_second_retrieve_is_cache_hit() {
    let mock = MockTransport::new();
    let session = connected(&mock).await;
    serve_object(&mock, "doc-1", "a.txt");

    let options = ObjectFetchOptions::new();
    let first = session.retrieve_object("doc-1", &options).await.unwrap();
    let second = session.retrieve_object("doc-1", &options).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.name(), Some("a.txt"));
    assert_eq!(mock.count(Method::Get, &object_url("doc-1")), 1);
}

#[tokio::test]
async fn test_only_supplied_options_are_sent() {
    let mock = MockTransport::new();
    let session = connected(&mock).await;
    let url = "http://repo/A/id?id=doc-1&includeAllowableActions=true&includeACL=false";
    mock.respond(Method::Get, url, 200, object_entry("doc-1", "a.txt"));
    serve_object(&mock, "doc-1", "a.txt");

    let options = ObjectFetchOptions::new()
        .include_acl(false)
        .include_allowable_actions(true);
    session.retrieve_object("doc-1", &options).await.unwrap();
    assert_eq!(mock.count(Method::Get, url), 1);

    // Cached under other options, so this one fetches and replaces it.
    session
        .retrieve_object("doc-1", &ObjectFetchOptions::new())
        .await
        .unwrap();
    assert_eq!(mock.count(Method::Get, &object_url("doc-1")), 1);
    assert_eq!(session.cache().len(), 1);
}

#[tokio::test]
async fn test_missing_object() {
    let mock = MockTransport::new();
    let session = connected(&mock).await;

    let err = session
        .retrieve_object("ghost", &ObjectFetchOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(&err, BindingError::ObjectNotFound { target, .. } if target == "ghost"));
    assert_eq!(err.code(), ErrorCode::ObjectNotFound);
}

#[tokio::test]
async fn test_resolve_link_not_supported_vs_not_found() {
    let mock = MockTransport::new();
    let session = connected(&mock).await;
    serve_object(&mock, "doc-1", "a.txt");

    let err = session
        .resolve_link("doc-1", REL_VERSION_HISTORY, None)
        .await
        .unwrap_err();
    assert!(matches!(err, BindingError::NotSupported(_)));

    let err = session.resolve_link("ghost", "self", None).await.unwrap_err();
    assert!(matches!(err, BindingError::ObjectNotFound { .. }));
}

#[tokio::test]
async fn test_resolve_link_prefers_typed_match() {
    let mock = MockTransport::new();
    let session = connected(&mock).await;
    serve_object(&mock, "doc-1", "a.txt");

    let tree = session
        .resolve_link("doc-1", REL_DOWN, Some(MEDIATYPE_CMISTREE))
        .await
        .unwrap();
    assert_eq!(tree, "http://repo/tree/doc-1");

    let fallback = session
        .resolve_link("doc-1", REL_DOWN, Some("application/json"))
        .await
        .unwrap();
    assert_eq!(fallback, "http://repo/children/doc-1");

    // Both resolutions used the object fetched once.
    assert_eq!(mock.count(Method::Get, &object_url("doc-1")), 1);
}

#[tokio::test]
async fn test_by_path_is_cached_by_id() {
    let mock = MockTransport::new();
    let session = connected(&mock).await;
    mock.respond(
        Method::Get,
        "http://repo/A/path?path=%2Freports%2Fa.txt",
        200,
        object_entry("doc-7", "a.txt"),
    );

    let object = session
        .retrieve_object_by_path("/reports/a.txt", &ObjectFetchOptions::new())
        .await
        .unwrap();
    assert_eq!(object.object_id, "doc-7");
    assert!(session.cache().contains("doc-7"));

    let again = session
        .retrieve_object("doc-7", &ObjectFetchOptions::new())
        .await
        .unwrap();
    assert_eq!(again, object);
    assert_eq!(mock.count(Method::Get, &object_url("doc-7")), 0);
}

#[tokio::test]
async fn test_allowable_actions_via_link() {
    let mock = MockTransport::new();
    let session = connected(&mock).await;
    serve_object(&mock, "doc-1", "a.txt");
    mock.respond(
        Method::Get,
        "http://repo/actions/doc-1",
        200,
        r#"<cmis:allowableActions xmlns:cmis="http://docs.oasis-open.org/ns/cmis/core/200908/">
            <cmis:canGetProperties>true</cmis:canGetProperties>
            <cmis:canDeleteObject>false</cmis:canDeleteObject>
        </cmis:allowableActions>"#,
    );

    let actions = session.retrieve_allowable_actions("doc-1").await.unwrap();
    assert_eq!(actions.get("canGetProperties"), Some(true));
    assert_eq!(actions.get("canDeleteObject"), Some(false));
    assert_eq!(actions.object_id.as_deref(), Some("doc-1"));
    assert_eq!(
        session.resolve_link("doc-1", REL_ALLOWABLE_ACTIONS, None).await.unwrap(),
        "http://repo/actions/doc-1"
    );
}

#[tokio::test]
async fn test_children_feed() {
    let mock = MockTransport::new();
    let session = connected(&mock).await;
    serve_object(&mock, "folder-1", "reports");
    mock.respond(
        Method::Get,
        "http://repo/children/folder-1",
        200,
        feed(&[("doc-1", "a.txt"), ("doc-2", "b.txt")]),
    );

    let children = session.retrieve_children("folder-1").await.unwrap();
    let ids: Vec<_> = children.iter().map(|c| c.object_id.as_str()).collect();
    assert_eq!(ids, ["doc-1", "doc-2"]);
    assert_eq!(mock.last_request().unwrap().header("Accept"), Some("application/atom+xml;type=feed"));
}

#[tokio::test]
async fn test_renditions_ignore_paging() {
    let mock = MockTransport::new();
    let session = connected(&mock).await;
    let url = "http://repo/A/id?id=doc-1&renditionFilter=cmis%3Athumbnail";
    mock.respond(Method::Get, url, 200, object_entry("doc-1", "a.txt"));

    let renditions = session
        .retrieve_renditions("doc-1", "cmis:thumbnail", Some(1), Some(5))
        .await
        .unwrap();
    assert_eq!(renditions.len(), 1);
    assert_eq!(renditions[0].stream_id, "thumb-doc-1");
    assert_eq!(mock.count(Method::Get, url), 1);
}

#[tokio::test]
async fn test_decode_errors_propagate() {
    let mock = MockTransport::new();
    let session = connected(&mock).await;
    mock.respond(Method::Get, &object_url("doc-1"), 200, "<entry><unclosed></entry>");

    let err = session
        .retrieve_object("doc-1", &ObjectFetchOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, BindingError::Decode(_)));
    assert!(session.cache().is_empty());
}

#[tokio::test]
async fn test_fetch_racing_eviction_does_not_repopulate() {
    let mock = MockTransport::new();
    let session = Arc::new(connected(&mock).await);
    serve_object(&mock, "doc-1", "a.txt");
    mock.hold();

    let fetching = Arc::clone(&session);
    let task = tokio::spawn(async move {
        fetching
            .retrieve_object("doc-1", &ObjectFetchOptions::new())
            .await
    });
    while mock.held_count() == 0 {
        tokio::task::yield_now().await;
    }

    // A mutation finished while the fetch was in flight.
    session.cache().evict("doc-1");
    assert_eq!(mock.release_held(), vec![true]);

    let object = task.await.unwrap().unwrap();
    assert_eq!(object.object_id, "doc-1");
    assert!(!session.cache().contains("doc-1"));
}

#[tokio::test]
async fn test_fetch_racing_repository_switch_does_not_repopulate() {
    let mock = MockTransport::new();
    mock.respond(Method::Get, SERVICE_URL, 200, service_document(&["A", "B"]));
    let session = Arc::new(BindingSession::new(parameters(), Arc::new(mock.clone())));
    session.connect().await.unwrap();
    serve_object(&mock, "doc-1", "a.txt");
    mock.hold();

    let fetching = Arc::clone(&session);
    let task = tokio::spawn(async move {
        fetching
            .retrieve_object("doc-1", &ObjectFetchOptions::new())
            .await
    });
    while mock.held_count() == 0 {
        tokio::task::yield_now().await;
    }

    session.select_repository("B").unwrap();
    assert_eq!(mock.release_held(), vec![true]);

    // The object of repository A is returned but never cached under B.
    let object = task.await.unwrap().unwrap();
    assert_eq!(object.object_id, "doc-1");
    assert!(session.cache().is_empty());
}

#[tokio::test]
async fn test_uncached_id_without_template_is_not_found() {
    let mock = MockTransport::new();
    let document = service_document(&["A"]).replace(
        "<cmisra:type>objectbyid</cmisra:type>",
        "<cmisra:type>typebyid</cmisra:type>",
    );
    mock.respond(Method::Get, SERVICE_URL, 200, document);
    let session = BindingSession::new(parameters(), Arc::new(mock.clone()));
    session.connect().await.unwrap();
    let before = mock.requests().len();

    let err = session
        .resolve_link("doc-9", REL_DOWN, Some(MEDIATYPE_FEED))
        .await
        .unwrap_err();
    assert!(matches!(err, BindingError::ObjectNotFound { ref target, .. } if target == "doc-9"));

    let err = session
        .retrieve_object("doc-9", &ObjectFetchOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ObjectNotFound);
    assert_eq!(mock.requests().len(), before);
}

#[tokio::test]
async fn test_abandoned_retrieve_cancels_request() {
    let mock = MockTransport::new();
    let session = Arc::new(connected(&mock).await);
    serve_object(&mock, "doc-1", "a.txt");
    mock.hold();

    let fetching = Arc::clone(&session);
    let task = tokio::spawn(async move {
        fetching
            .retrieve_object("doc-1", &ObjectFetchOptions::new())
            .await
    });
    while mock.held_count() == 0 {
        tokio::task::yield_now().await;
    }
    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());

    // The late response is dropped; exactly one terminal delivery happened.
    assert_eq!(mock.release_held(), vec![false]);
    assert!(session.cache().is_empty());
}
