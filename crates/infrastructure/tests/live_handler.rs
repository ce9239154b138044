//! Cases sent over the network to a local axum server.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, mpsc};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use pretty_assertions::assert_eq;
use restit_application::{
    CaseError, Context, HandlerError, JsonTest, Response, describe_json, length_is, nth,
    status_code_is,
};
use restit_domain::{Node, Noun};
use restit_infrastructure::{
    HandlerConfig, http_service, http_service_from_lookup, http_service_with_config,
    init_tracing,
};
use serde_json::{Value, json};

type Store = Arc<Mutex<BTreeMap<String, Value>>>;

async fn list_posts(
    State(store): State<Store>,
    Query(query): Query<BTreeMap<String, String>>,
) -> Json<Value> {
    let posts = store.lock().unwrap();
    let list: Vec<&Value> = posts
        .values()
        .filter(|post| query.get("author").is_none_or(|a| post["author"] == *a))
        .collect();
    Json(json!({ "posts": list }))
}

async fn create_post(
    State(store): State<Store>,
    headers: HeaderMap,
    Json(post): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if headers.get("x-token").is_none_or(|v| v != "secret") {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "no token" })));
    }
    let id = post["id"].as_str().unwrap_or_default().to_string();
    store.lock().unwrap().insert(id, post.clone());
    (StatusCode::CREATED, Json(json!({ "posts": [post] })))
}

async fn get_post(
    State(store): State<Store>,
    Path(id): Path<String>,
) -> (StatusCode, Json<Value>) {
    match store.lock().unwrap().get(&id) {
        Some(post) => (StatusCode::OK, Json(json!({ "posts": [post] }))),
        None => (StatusCode::NOT_FOUND, Json(json!({ "posts": [] }))),
    }
}

async fn delete_post(State(store): State<Store>, Path(id): Path<String>) -> Json<Value> {
    let removed: Vec<Value> = store.lock().unwrap().remove(&id).into_iter().collect();
    Json(json!({ "posts": removed }))
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_secs(2)).await;
    "late"
}

/// Serves the post API on an ephemeral port from a background thread.
fn spawn_server(store: Store) -> SocketAddr {
    let app = Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route("/post/{id}", get(get_post).delete(delete_post))
        .route("/slow", get(slow))
        .with_state(store);

    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap()).unwrap();
            axum::serve(listener, app).await.unwrap();
        });
    });
    rx.recv().unwrap()
}

fn seeded_store() -> Store {
    let mut posts = BTreeMap::new();
    posts.insert(
        "a".to_string(),
        json!({ "id": "a", "author": "ann", "title": "first" }),
    );
    posts.insert(
        "b".to_string(),
        json!({ "id": "b", "author": "bob", "title": "second" }),
    );
    Arc::new(Mutex::new(posts))
}

fn title_is(want: &'static str) -> impl JsonTest {
    describe_json(format!("title is {want:?}"), move |node: &Node| {
        let have = node.get("title").string();
        if have == want {
            Ok(())
        } else {
            Err(format!("got {have:?}").into())
        }
    })
}

#[test]
fn test_list_and_filter() {
    init_tracing("restit_application=debug,restit_infrastructure=debug");
    let addr = spawn_server(seeded_store());
    let service = http_service(format!("http://{addr}")).unwrap();

    service
        .list(&["posts"])
        .unwrap()
        .expect(status_code_is(200))
        .expect(length_is("posts", 2))
        .run()
        .unwrap();

    service
        .list(&["posts"])
        .unwrap()
        .add_query("author", "bob")
        .expect(length_is("posts", 1))
        .expect(nth(0).of("posts").is(title_is("second")))
        .run()
        .unwrap();
}

#[test]
fn test_noun_paths_and_headers() {
    init_tracing("restit_application=debug,restit_infrastructure=debug");
    let store = seeded_store();
    let addr = spawn_server(Arc::clone(&store));
    let service = http_service(format!("http://{addr}"))
        .unwrap()
        .with_noun(Noun::new("post", "posts"))
        .unwrap();

    let err = service
        .create(&json!({ "id": "c", "title": "third" }), &[])
        .unwrap()
        .expect(status_code_is(201))
        .run()
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        r#"expectation=0 desc="status code is 201" message="expected 201, got 401" ref="header status code""#
    );

    service
        .create(&json!({ "id": "c", "title": "third" }), &[])
        .unwrap()
        .add_header("X-Token", "secret")
        .expect(status_code_is(201))
        .run()
        .unwrap();

    service
        .retrieve(&["c"])
        .unwrap()
        .expect(nth(0).of("posts").is(title_is("third")))
        .run()
        .unwrap();

    service
        .delete(&["c"])
        .unwrap()
        .expect(length_is("posts", 1))
        .run()
        .unwrap();
    assert!(!store.lock().unwrap().contains_key("c"));
}

#[test]
fn test_response_body_after_run() {
    let addr = spawn_server(seeded_store());
    let service = http_service(format!("http://{addr}")).unwrap();

    let mut resp = service
        .retrieve(&["post", "a"])
        .unwrap()
        .expect(status_code_is(200))
        .expect(length_is("posts", 1))
        .run()
        .unwrap();

    assert_eq!(resp.headers()["content-type"], "application/json");
    let node = resp.json().unwrap();
    let first = node.get("posts").get_n(0).unwrap();
    assert_eq!(first.get("author").string(), "ann");
}

#[test]
fn test_context_deadline_limits_request() {
    let addr = spawn_server(seeded_store());
    let service = http_service(format!("http://{addr}")).unwrap();

    let ctx = Context::background().with_timeout(Duration::from_millis(200));
    let err = service
        .retrieve(&["slow"])
        .unwrap()
        .with_context(ctx)
        .run()
        .unwrap_err();
    assert!(matches!(err, CaseError::Dispatch(HandlerError::Cancelled(_))));
    assert_eq!(err.to_string(), "request cancelled: context deadline exceeded");
}

#[test]
fn test_config_timeout_applies() {
    let addr = spawn_server(seeded_store());
    let config = HandlerConfig {
        timeout_ms: 100,
        ..HandlerConfig::default()
    };
    let service = http_service_with_config(format!("http://{addr}"), config).unwrap();

    let err = service.retrieve(&["slow"]).unwrap().run().unwrap_err();
    assert_eq!(err.to_string(), "request timed out after 100ms");
}

#[test]
fn test_lookup_timeout_applies() {
    let addr = spawn_server(seeded_store());
    let service = http_service_from_lookup(format!("http://{addr}"), |var| {
        (var == "RESTIT_TIMEOUT_MS").then(|| "150".to_string())
    })
    .unwrap();

    let err = service.retrieve(&["slow"]).unwrap().run().unwrap_err();
    assert_eq!(err.to_string(), "request timed out after 150ms");
}

#[test]
fn test_connection_refused() {
    let service = http_service("http://127.0.0.1:9").unwrap();
    let err = service.list(&["posts"]).unwrap().run().unwrap_err();
    assert!(matches!(err, CaseError::Dispatch(HandlerError::ConnectionFailed(_))));
}
