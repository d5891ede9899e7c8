use std::sync::Arc;

use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::record::Record;
use crate::rest::{self, AppState};
use crate::task::Task;
use crate::types::{ERR_CODE_INVALID_REQ, ERR_CODE_PARSE, JsonRpcRequest, new_error_response};

/// Create the full HTTP router for collection `R`: REST routes, widgets and
/// the MCP endpoint.
pub fn http_router<R: Record>(state: Arc<AppState<R>>) -> Router {
    let router = collection_routes::<R>().route(&item_path::<R>(), get(rest::get_one::<R>));
    finish(router, &state).with_state(state)
}

/// [`http_router`] for tasks, plus `PATCH /tasks/{id}`.
pub fn tasks_router(state: Arc<AppState<Task>>) -> Router {
    let router = collection_routes::<Task>().route(
        &item_path::<Task>(),
        get(rest::get_one::<Task>).patch(rest::update_status),
    );
    finish(router, &state).with_state(state)
}

fn item_path<R: Record>() -> String {
    format!("/{}/{{id}}", R::COLLECTION)
}

fn collection_routes<R: Record>() -> Router<Arc<AppState<R>>> {
    Router::new()
        .route("/", get(rest::root::<R>))
        .route("/health", get(rest::health::<R>))
        .route(
            &format!("/{}", R::COLLECTION),
            get(rest::list::<R>).post(rest::create::<R>),
        )
        .route("/widget", get(rest::widget::<R>))
        .route("/card", get(rest::card::<R>))
        .route("/mcp", post(handle_mcp::<R>).options(handle_mcp_options))
        .route("/mcp/tools", get(handle_mcp_tools::<R>))
}

/// Static assets and CORS.
fn finish<R: Record>(
    router: Router<Arc<AppState<R>>>,
    state: &AppState<R>,
) -> Router<Arc<AppState<R>>> {
    let assets = state.widgets.templates().assets_dir().join("assets");
    let router = if assets.is_dir() {
        tracing::info!(dir = %assets.display(), "serving static assets");
        router.nest_service("/assets", ServeDir::new(assets))
    } else {
        router
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    router.layer(cors)
}

async fn handle_mcp<R: Record>(State(state): State<Arc<AppState<R>>>, body: Bytes) -> Response {
    let value: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "unparseable mcp request");
            let resp = new_error_response(None, ERR_CODE_PARSE, format!("Parse error: {}", e));
            return (StatusCode::OK, Json(resp)).into_response();
        }
    };

    // Valid JSON but not a request envelope: answer with whatever id it carried.
    let id = value.get("id").cloned();
    let req: JsonRpcRequest = match serde_json::from_value(value) {
        Ok(req) => req,
        Err(e) => {
            tracing::warn!(error = %e, "invalid mcp request envelope");
            let resp = new_error_response(id, ERR_CODE_INVALID_REQ, format!("Invalid Request: {}", e));
            return (StatusCode::OK, Json(resp)).into_response();
        }
    };

    let resp = state.mcp.handle(req).await;

    // Notification: return 202 with no body.
    if resp.is_notification() {
        return (StatusCode::ACCEPTED, Body::empty()).into_response();
    }

    Json(resp).into_response()
}

async fn handle_mcp_options() -> Json<Value> {
    Json(json!({}))
}

/// Debug mirror of the tool catalogue outside the JSON-RPC envelope.
async fn handle_mcp_tools<R: Record>(State(state): State<Arc<AppState<R>>>) -> Json<Value> {
    Json(json!({
        "tools": state.mcp.tool_names(),
        "note": "Use POST /mcp with JSON-RPC 2.0 envelopes for actual MCP communication",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::note::Note;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_router() -> Router {
        let config = Config {
            assets_dir: "/nonexistent".into(),
            ..Config::default()
        };
        http_router(crate::app::app_state::<Note>(&config, "test", |_, _| {}))
    }

    fn json_body(body: Value) -> Body {
        Body::from(serde_json::to_vec(&body).unwrap())
    }

    async fn body_json(resp: Response) -> Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn mcp_post(body: Body) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/mcp")
            .header("content-type", "application/json")
            .body(body)
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = test_router();
        let req = Request::builder()
            .method("GET")
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body_json(resp).await,
            json!({"status": "healthy", "notes_count": 3})
        );
    }

    #[tokio::test]
    async fn test_notification_returns_202() {
        let app = test_router();
        let body = json!({"jsonrpc": "2.0", "method": "notifications/initialized"});
        let resp = app.oneshot(mcp_post(json_body(body))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_tools_list() {
        let app = test_router();
        let body = json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"});
        let resp = app.oneshot(mcp_post(json_body(body))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let value = body_json(resp).await;
        assert_eq!(value["id"], 1);
        assert_eq!(value["result"]["tools"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_invalid_json_is_parse_error() {
        let app = test_router();
        let resp = app.oneshot(mcp_post(Body::from("{bad json"))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let value = body_json(resp).await;
        assert_eq!(value["error"]["code"], ERR_CODE_PARSE);
        assert!(value.get("id").is_none());
    }

    #[tokio::test]
    async fn test_invalid_envelope_keeps_id() {
        let app = test_router();
        let resp = app
            .clone()
            .oneshot(mcp_post(json_body(json!({"id": 42, "method": "initialize"}))))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let value = body_json(resp).await;
        assert_eq!(value["id"], 42);
        assert_eq!(value["error"]["code"], ERR_CODE_INVALID_REQ);

        let resp = app
            .oneshot(mcp_post(json_body(json!({"jsonrpc": "2.0", "id": "abc"}))))
            .await
            .unwrap();
        let value = body_json(resp).await;
        assert_eq!(value["id"], "abc");
        assert_eq!(value["error"]["code"], ERR_CODE_INVALID_REQ);
    }

    #[tokio::test]
    async fn test_notification_method_with_id_gets_a_reply() {
        let app = test_router();
        let body = json!({"jsonrpc": "2.0", "id": 3, "method": "notifications/initialized"});
        let resp = app.oneshot(mcp_post(json_body(body))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let value = body_json(resp).await;
        assert_eq!(value["id"], 3);
        assert_eq!(value["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn test_options_preflight() {
        let app = test_router();
        let req = Request::builder()
            .method("OPTIONS")
            .uri("/mcp")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_cors_headers_present() {
        let app = test_router();
        let req = Request::builder()
            .method("GET")
            .uri("/notes")
            .header("origin", "https://chat.example.com")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(
            resp.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_method_not_allowed() {
        let app = test_router();
        let req = Request::builder()
            .method("DELETE")
            .uri("/mcp")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_notes_have_no_patch_route() {
        let app = test_router();
        let req = Request::builder()
            .method("PATCH")
            .uri("/notes/1")
            .header("content-type", "application/json")
            .body(json_body(json!({"completed": true})))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_debug_tool_catalogue() {
        let app = test_router();
        let req = Request::builder()
            .method("GET")
            .uri("/mcp/tools")
            .body(Body::empty())
            .unwrap();
        let value = body_json(app.oneshot(req).await.unwrap()).await;
        assert_eq!(value["tools"], json!(["get_notes", "create_note", "get_note"]));
    }
}
