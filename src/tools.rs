use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::record::{Record, today};
use crate::server::{FnToolHandler, ResourceHandler, Server};
use crate::store::RecordStore;
use crate::task::{StatusPatch, Task};
use crate::types::{McpError, ResourceContent, ToolResult, structured_result};
use crate::widget::WidgetRenderer;

/// Shared dependencies for the handlers of one collection.
pub struct Deps<R> {
    pub store: Arc<RecordStore<R>>,
    pub widgets: Arc<WidgetRenderer>,
}

impl<R> Clone for Deps<R> {
    fn clone(&self) -> Self {
        Deps {
            store: Arc::clone(&self.store),
            widgets: Arc::clone(&self.widgets),
        }
    }
}

/// Build the MCP server for collection `R`, catalogue and handlers included.
pub fn build_server<R: Record>(deps: Deps<R>, name: &str, version: &str) -> Server {
    let mut srv = Server::builder()
        .tools_json(R::TOOLS_JSON)
        .resources_json(R::RESOURCES_JSON)
        .server_info(name, version)
        .build();
    register_collection(&mut srv, deps);
    srv
}

/// Register `get_<collection>`, `get_<kind>`, `create_<kind>` and the widget resource.
pub fn register_collection<R: Record>(srv: &mut Server, deps: Deps<R>) {
    let d = deps.clone();
    srv.handle_tool(
        format!("get_{}", R::COLLECTION),
        FnToolHandler::new(move |_args: Value| {
            let deps = d.clone();
            async move { handle_list(&deps).await }
        }),
    );

    let d = deps.clone();
    srv.handle_tool(
        format!("get_{}", R::KIND),
        FnToolHandler::new(move |args: Value| {
            let deps = d.clone();
            async move { handle_get(&deps, args).await }
        }),
    );

    // `from_input` owns field types so REST and MCP report the same field first.
    let d = deps.clone();
    srv.handle_self_typed_tool(
        format!("create_{}", R::KIND),
        FnToolHandler::new(move |args: Value| {
            let deps = d.clone();
            async move { handle_create(&deps, args).await }
        }),
    );

    srv.handle_resource(R::WIDGET_NAME, Arc::new(WidgetResource { deps }));
}

/// Register `update_task_status`.
pub fn register_status_updates(srv: &mut Server, store: Arc<RecordStore<Task>>) {
    srv.handle_tool(
        "update_task_status",
        FnToolHandler::new(move |args: Value| {
            let store = Arc::clone(&store);
            async move { handle_update_status(&store, args).await }
        }),
    );
}

async fn handle_list<R: Record>(deps: &Deps<R>) -> Result<ToolResult, McpError> {
    let records = deps.store.list().await;
    let text = format!("You have {} {}(s).", records.len(), R::KIND);
    Ok(structured_result(text, json!({ (R::COLLECTION): records })))
}

async fn handle_get<R: Record>(deps: &Deps<R>, args: Value) -> Result<ToolResult, McpError> {
    let id = id_argument::<R>(&args);
    let record = deps.store.get(id).await?;
    let text = format!("Found {}: \"{}\".", R::KIND, record.title());
    Ok(structured_result(text, json!({ (R::COLLECTION): [record] })))
}

async fn handle_create<R: Record>(deps: &Deps<R>, args: Value) -> Result<ToolResult, McpError> {
    let record = R::from_input(&args, today())?;
    let created = deps.store.append(record).await;
    tracing::info!(collection = R::COLLECTION, id = %created.id(), "created via mcp");

    let text = format!("Created {}: \"{}\".", R::KIND, created.title());
    let all = deps.store.list().await;
    Ok(structured_result(
        text,
        json!({ (R::KIND): created, (R::COLLECTION): all }),
    ))
}

async fn handle_update_status(
    store: &RecordStore<Task>,
    args: Value,
) -> Result<ToolResult, McpError> {
    let id = id_argument::<Task>(&args);
    let patch = StatusPatch::from_input(&args)?;
    let task = store.update(id, |t| patch.apply(t)).await?;
    tracing::info!(id = %task.id, completed = task.completed, "task status updated via mcp");

    let state = if task.completed { "completed" } else { "pending" };
    let text = format!("Task \"{}\" marked as {}.", task.title, state);
    let all = store.list().await;
    Ok(structured_result(text, json!({ "task": task, "tasks": all })))
}

/// The `<kind>_id` argument. Presence and type are checked against the catalogue first.
fn id_argument<R: Record>(args: &Value) -> &str {
    args.get(format!("{}_id", R::KIND))
        .and_then(Value::as_str)
        .unwrap_or_default()
}

/// Serves the collection's full widget as an MCP resource.
struct WidgetResource<R> {
    deps: Deps<R>,
}

#[async_trait]
impl<R: Record> ResourceHandler for WidgetResource<R> {
    async fn call(&self, uri: &str) -> Result<ResourceContent, McpError> {
        let records = self.deps.store.list().await;
        Ok(ResourceContent {
            uri: uri.to_string(),
            mime_type: Some("text/html+skybridge".into()),
            text: Some(self.deps.widgets.render_full(&records)),
            meta: Some(json!({ "openai/widgetPrefersBorder": false })),
        })
    }
}
