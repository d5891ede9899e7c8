//! End-to-end checks over the HTTP router: REST and MCP share one store
//! and one set of validators.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use second_brain::app::{notes_app, tasks_app};
use second_brain::record::{format_date, today};
use second_brain::{Config, parse_tools};

fn config(assets: &std::path::Path) -> Config {
    Config {
        assets_dir: assets.to_path_buf(),
        base_url: "https://brain.example.com".into(),
        ..Config::default()
    }
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&v).unwrap())
        }
        None => Body::empty(),
    };
    let resp = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, body).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn rpc(app: &Router, method: &str, params: Value) -> Value {
    let body = json!({"jsonrpc": "2.0", "id": 7, "method": method, "params": params});
    let (status, value) = send_json(app, "POST", "/mcp", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    value
}

#[tokio::test]
async fn rest_create_assigns_id_and_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let app = notes_app(&config(dir.path()));

    let (status, created) = send_json(&app, "POST", "/notes", Some(json!({"title": "X"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], "4");
    assert_eq!(created["title"], "X");
    assert_eq!(created["createdAt"], format_date(today()));
    assert_eq!(created["category"], "general");
    assert_eq!(created["tags"], json!([]));

    let (status, fetched) = send_json(&app, "GET", "/notes/4", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (_, all) = send_json(&app, "GET", "/notes", None).await;
    assert_eq!(all.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn rest_unknown_id_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = notes_app(&config(dir.path()));

    let (status, body) = send_json(&app, "GET", "/notes/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "note 99 not found");
}

#[tokio::test]
async fn rest_non_json_body_is_400() {
    let dir = tempfile::tempdir().unwrap();
    let app = notes_app(&config(dir.path()));

    let req = Request::builder()
        .method("POST")
        .uri("/notes")
        .header("content-type", "application/json")
        .body(Body::from("not json"))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rest_and_mcp_reject_the_same_payload_the_same_way() {
    let dir = tempfile::tempdir().unwrap();
    let app = notes_app(&config(dir.path()));

    for payload in [
        json!({}),
        json!({"title": ""}),
        json!({"title": 5}),
        json!({"title": "ok", "tags": ["a", 1]}),
        json!({"title": 5, "tags": "x"}),
        json!({"title": "ok", "description": 5, "category": 6}),
        json!({"title": "", "createdAt": 3}),
        json!([1]),
    ] {
        let (status, rest) = send_json(&app, "POST", "/notes", Some(payload.clone())).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "payload {payload}");

        let mcp = rpc(&app, "tools/call", json!({"name": "create_note", "arguments": payload})).await;
        assert_eq!(mcp["error"]["code"], -32602, "payload {payload}");
        assert_eq!(mcp["error"]["data"], rest["detail"], "payload {payload}");
    }

    let (_, all) = send_json(&app, "GET", "/notes", None).await;
    assert_eq!(all.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn rest_created_records_satisfy_advertised_schemas() {
    let dir = tempfile::tempdir().unwrap();
    let app = tasks_app(&config(dir.path()));

    let listed = rpc(&app, "tools/list", json!({})).await;
    let raw = serde_json::to_vec(&listed["result"]["tools"]).unwrap();
    let tools = parse_tools(&raw).unwrap();
    let create = tools.iter().find(|t| t.name == "create_task").unwrap();

    let (status, created) = send_json(
        &app,
        "POST",
        "/tasks",
        Some(json!({"title": "Ship it", "dueDate": "2030-01-01", "priority": "high"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let mut args = created.clone();
    args.as_object_mut().unwrap().remove("id");
    create.validate_arguments(&args).unwrap();
}

#[tokio::test]
async fn patch_is_idempotent_and_unknown_ids_leave_store_alone() {
    let dir = tempfile::tempdir().unwrap();
    let app = tasks_app(&config(dir.path()));

    let (_, before) = send_json(&app, "GET", "/tasks", None).await;

    let (status, missing) =
        send_json(&app, "PATCH", "/tasks/9", Some(json!({"completed": true}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(missing["detail"], "task 9 not found");
    let (_, after) = send_json(&app, "GET", "/tasks", None).await;
    assert_eq!(before, after);

    let (status, first) =
        send_json(&app, "PATCH", "/tasks/1", Some(json!({"completed": true}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["completed"], true);
    let (_, second) = send_json(&app, "PATCH", "/tasks/1", Some(json!({"completed": true}))).await;
    assert_eq!(first, second);

    let (status, body) =
        send_json(&app, "PATCH", "/tasks/1", Some(json!({"completed": "yes"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"], json!({"field": "completed", "reason": "must be a boolean"}));
}

#[tokio::test]
async fn mcp_status_update_on_unknown_task() {
    let dir = tempfile::tempdir().unwrap();
    let app = tasks_app(&config(dir.path()));

    let resp = rpc(
        &app,
        "tools/call",
        json!({"name": "update_task_status", "arguments": {"task_id": "9", "completed": true}}),
    )
    .await;
    assert_eq!(resp["id"], 7);
    assert_eq!(resp["error"]["code"], -32602);

    let resp = rpc(
        &app,
        "tools/call",
        json!({"name": "update_task_status", "arguments": {"task_id": "2", "completed": true}}),
    )
    .await;
    assert_eq!(resp["result"]["structuredContent"]["task"]["completed"], true);

    let (_, task) = send_json(&app, "GET", "/tasks/2", None).await;
    assert_eq!(task["completed"], true);
}

#[tokio::test]
async fn widget_resource_embeds_the_rest_listing() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("second-brain.html"),
        r#"<html><head><script src="/assets/app.js"></script></head><body></body></html>"#,
    )
    .unwrap();
    let app = notes_app(&config(dir.path()));

    send_json(&app, "POST", "/notes", Some(json!({"title": "ends with </script>"}))).await;

    let resp = rpc(
        &app,
        "resources/read",
        json!({"uri": "ui://widget/second-brain.html"}),
    )
    .await;
    let content = &resp["result"]["contents"][0];
    assert_eq!(content["mimeType"], "text/html+skybridge");
    let html = content["text"].as_str().unwrap();
    assert!(html.contains(r#"src="https://brain.example.com/assets/app.js""#));
    assert!(!html.contains("</script>\"")); // data blob never closes the script element

    let start = html.find("window.__NOTES_DATA__ = ").unwrap() + "window.__NOTES_DATA__ = ".len();
    let end = start + html[start..].find(";\n</script>").unwrap();
    let embedded: Value = serde_json::from_str(&html[start..end]).unwrap();

    let (_, listed) = send_json(&app, "GET", "/notes", None).await;
    assert_eq!(embedded, listed);

    let (status, page) = send(&app, "GET", "/widget", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(page).unwrap().contains("window.__NOTES_DATA__"));
}

#[tokio::test]
async fn missing_widget_renders_diagnostics() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("other.html"), "<html></html>").unwrap();
    let app = tasks_app(&config(dir.path()));

    let (status, page) = send(&app, "GET", "/widget", None).await;
    assert_eq!(status, StatusCode::OK);
    let page = String::from_utf8(page).unwrap();
    assert!(page.contains("Widget 'task-manager' not found"));
    assert!(page.contains("other.html"));
    assert!(page.contains("npm run build"));
}

#[tokio::test]
async fn card_summarizes_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let app = tasks_app(&config(dir.path()));

    for i in 0..4 {
        send_json(&app, "POST", "/tasks", Some(json!({"title": format!("extra {i}")}))).await;
    }

    let (status, page) = send(&app, "GET", "/card", None).await;
    assert_eq!(status, StatusCode::OK);
    let page = String::from_utf8(page).unwrap();
    assert!(page.contains(r#"data-count="7""#));
    assert!(page.contains("Review pull requests"));
    assert!(!page.contains("extra 3"));
    assert!(page.contains("https://brain.example.com/widget"));
}

#[tokio::test]
async fn root_and_health_describe_the_variant() {
    let dir = tempfile::tempdir().unwrap();
    let app = tasks_app(&config(dir.path()));

    let (_, root) = send_json(&app, "GET", "/", None).await;
    assert_eq!(root["name"], "Task Manager MCP Server");
    assert_eq!(root["status"], "running");
    assert_eq!(root["endpoints"]["tasks"], "/tasks");

    let (_, health) = send_json(&app, "GET", "/health", None).await;
    assert_eq!(health, json!({"status": "healthy", "tasks_count": 3}));
}
