use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use themekit_core::{PageUpsert, ThemeTarget};
use themekit_infra::net::default_http_client;
use themekit_infra::{HttpRemoteClient, RemoteClient};

#[derive(Clone, Default)]
struct Recorded {
    cursors: Arc<Mutex<Vec<Option<String>>>>,
    bodies: Arc<Mutex<Vec<Value>>>,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers.get("authorization").and_then(|v| v.to_str().ok()) == Some("Bearer tok")
        && headers.get("square-version").and_then(|v| v.to_str().ok()) == Some("2021-05-13")
}

async fn list_files(
    State(rec): State<Recorded>,
    headers: HeaderMap,
    Query(q): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({})));
    }

    // Single-file lookups carry a `path` query.
    if let Some(path) = q.get("path") {
        let body = match path.as_str() {
            "theme/img/dot.png" => json!({
                "files": [{
                    "path": "theme/img/dot.png",
                    "binary_encoding_type": "base64",
                    "content": "aGVsbG8="
                }]
            }),
            "theme/css/a.css" => json!({
                "files": [{ "path": "theme/css/a.css", "content": "body{}" }]
            }),
            _ => json!({}),
        };
        return (StatusCode::OK, Json(body));
    }

    rec.cursors.lock().unwrap().push(q.get("cursor").cloned());
    let body = match q.get("cursor").map(String::as_str) {
        None => json!({
            "files": [
                { "path": "theme/a.css", "checksum": "c1" },
                { "path": "theme/b.css", "checksum": "c2" }
            ],
            "cursor": "next"
        }),
        Some("next") => json!({
            "files": [{ "path": "theme/c.css", "checksum": "c3" }]
        }),
        Some(_) => json!({}),
    };
    (StatusCode::OK, Json(body))
}

async fn forbidden_settings() -> (StatusCode, Json<Value>) {
    (
        StatusCode::FORBIDDEN,
        Json(json!({
            "errors": [{
                "category": "AUTHENTICATION_ERROR",
                "code": "INSUFFICIENT_SCOPES",
                "detail": "missing scope"
            }]
        })),
    )
}

async fn create_page(State(rec): State<Recorded>, Json(body): Json<Value>) -> Json<Value> {
    let page = body["page"].clone();
    rec.bodies.lock().unwrap().push(body);
    Json(json!({
        "page": {
            "id": "page-1",
            "name": page["name"],
            "route": page["route"],
            "properties": page["properties"]
        }
    }))
}

async fn start_mock_server(rec: Recorded) -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let app = Router::new()
        .route("/v2/sites/s1/themes/t1/files", get(list_files))
        .route(
            "/v2/sites/s1/site-themes/t1/settings",
            delete(forbidden_settings).get(forbidden_settings),
        )
        .route("/v2/sites/s1/site-themes/t1/pages", post(create_page))
        .with_state(rec);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, handle)
}

fn client(addr: SocketAddr) -> HttpRemoteClient {
    HttpRemoteClient::new(default_http_client().unwrap(), &format!("http://{addr}"), "tok").unwrap()
}

#[tokio::test]
async fn test_theme_file_listing_follows_cursor() {
    let rec = Recorded::default();
    let (addr, server) = start_mock_server(rec.clone()).await;
    let target = ThemeTarget::new("s1", "t1");

    let files = client(addr).list_theme_files(&target).await.unwrap();

    let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["theme/a.css", "theme/b.css", "theme/c.css"]);
    assert_eq!(
        *rec.cursors.lock().unwrap(),
        vec![None, Some("next".to_string())]
    );

    server.abort();
}

#[tokio::test]
async fn test_download_decodes_base64_content() {
    let (addr, server) = start_mock_server(Recorded::default()).await;
    let target = ThemeTarget::new("s1", "t1");
    let client = client(addr);

    let png = client
        .download_theme_file(&target, "/theme/img/dot.png")
        .await
        .unwrap();
    assert_eq!(png.as_deref(), Some(&b"hello"[..]));

    let css = client
        .download_theme_file(&target, "/theme/css/a.css")
        .await
        .unwrap();
    assert_eq!(css.as_deref(), Some(&b"body{}"[..]));

    let missing = client
        .download_theme_file(&target, "/theme/gone.css")
        .await
        .unwrap();
    assert!(missing.is_none());

    server.abort();
}

#[tokio::test]
async fn test_forbidden_is_a_permission_error() {
    let (addr, server) = start_mock_server(Recorded::default()).await;
    let target = ThemeTarget::new("s1", "t1");

    let err = client(addr)
        .delete_setting(&target, "colors")
        .await
        .unwrap_err();

    assert!(err.is_permission_error());
    assert_eq!(err.status(), Some(403));
    assert!(err.to_string().contains("INSUFFICIENT_SCOPES"));

    server.abort();
}

#[tokio::test]
async fn test_wrong_token_is_a_permission_error() {
    let (addr, server) = start_mock_server(Recorded::default()).await;
    let target = ThemeTarget::new("s1", "t1");
    let client = HttpRemoteClient::new(
        default_http_client().unwrap(),
        &format!("http://{addr}"),
        "wrong",
    )
    .unwrap();

    let err = client.list_theme_files(&target).await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert!(err.is_permission_error());

    server.abort();
}

#[tokio::test]
async fn test_create_page_sends_idempotency_key() {
    let rec = Recorded::default();
    let (addr, server) = start_mock_server(rec.clone()).await;
    let target = ThemeTarget::new("s1", "t1");

    let page = client(addr)
        .create_page(
            &target,
            &PageUpsert {
                name: "about".into(),
                route: "/about".into(),
                properties: r#"{"title":"About"}"#.into(),
            },
        )
        .await
        .unwrap();

    assert_eq!(page.id, "page-1");
    assert_eq!(page.name, "about");
    let bodies = rec.bodies.lock().unwrap();
    assert_eq!(bodies[0]["page"]["route"], "/about");
    assert!(bodies[0]["idempotency_key"].as_str().is_some_and(|k| !k.is_empty()));

    server.abort();
}
