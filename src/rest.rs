//! REST routes over a collection, generic over the record type.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Html;
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::record::{Record, today};
use crate::server::Server;
use crate::store::RecordStore;
use crate::task::{StatusPatch, Task};
use crate::widget::WidgetRenderer;

/// Everything the HTTP handlers of one collection share.
pub struct AppState<R> {
    pub store: Arc<RecordStore<R>>,
    pub widgets: Arc<WidgetRenderer>,
    pub mcp: Server,
}

pub type SharedState<R> = State<Arc<AppState<R>>>;

pub async fn list<R: Record>(State(state): SharedState<R>) -> Json<Vec<R>> {
    Json(state.store.list().await)
}

pub async fn get_one<R: Record>(
    State(state): SharedState<R>,
    Path(id): Path<String>,
) -> Result<Json<R>, ApiError> {
    Ok(Json(state.store.get(&id).await?))
}

pub async fn create<R: Record>(
    State(state): SharedState<R>,
    body: Bytes,
) -> Result<(StatusCode, Json<R>), ApiError> {
    let input = parse_body(&body)?;
    let record = R::from_input(&input, today())?;
    let created = state.store.append(record).await;
    tracing::info!(collection = R::COLLECTION, id = %created.id(), "created via rest");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_status(
    State(state): SharedState<Task>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Task>, ApiError> {
    let patch = StatusPatch::from_input(&parse_body(&body)?)?;
    let task = state.store.update(&id, |t| patch.apply(t)).await?;
    tracing::info!(id = %task.id, completed = task.completed, "task status updated via rest");
    Ok(Json(task))
}

pub async fn health<R: Record>(State(state): SharedState<R>) -> Json<Value> {
    let count = state.store.len().await;
    Json(json!({
        "status": "healthy",
        (format!("{}_count", R::COLLECTION)): count,
    }))
}

pub async fn root<R: Record>(State(state): SharedState<R>) -> Json<Value> {
    Json(json!({
        "name": state.mcp.name(),
        "version": state.mcp.version(),
        "status": "running",
        "endpoints": {
            (R::COLLECTION): format!("/{}", R::COLLECTION),
            "widget": "/widget",
            "card": "/card",
            "mcp": "/mcp",
            "mcp_tools": "/mcp/tools",
        },
    }))
}

pub async fn widget<R: Record>(State(state): SharedState<R>) -> Html<String> {
    let records = state.store.list().await;
    Html(state.widgets.render_full(&records))
}

pub async fn card<R: Record>(State(state): SharedState<R>) -> Html<String> {
    let records = state.store.list().await;
    Html(state.widgets.render_card(&records))
}

/// Parse a request body as JSON. Shape checks are left to the validators.
fn parse_body(body: &[u8]) -> Result<Value, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(e.to_string()))
}
