use std::sync::Arc;

use axum::Router;

use crate::config::{Config, Variant};
use crate::note::Note;
use crate::record::{Record, today};
use crate::rest::AppState;
use crate::server::Server;
use crate::store::RecordStore;
use crate::task::Task;
use crate::tools::{self, Deps};
use crate::transport_http;
use crate::widget::WidgetRenderer;

pub const NOTES_SERVER_NAME: &str = "Second Brain MCP Server";
pub const TASKS_SERVER_NAME: &str = "Task Manager MCP Server";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Seed the store for `R` and wire its REST + MCP handlers.
///
/// `extra` registers tools beyond the common get/create set.
pub fn app_state<R: Record>(
    config: &Config,
    server_name: &str,
    extra: impl FnOnce(&mut Server, Arc<RecordStore<R>>),
) -> Arc<AppState<R>> {
    let store = Arc::new(RecordStore::new(R::seed(today())));
    let widgets = Arc::new(WidgetRenderer::new(&config.assets_dir, &config.base_url));
    let deps = Deps {
        store: Arc::clone(&store),
        widgets: Arc::clone(&widgets),
    };
    let mut mcp = tools::build_server(deps, server_name, SERVER_VERSION);
    extra(&mut mcp, Arc::clone(&store));
    Arc::new(AppState {
        store,
        widgets,
        mcp,
    })
}

pub fn notes_app(config: &Config) -> Router {
    transport_http::http_router(app_state::<Note>(config, NOTES_SERVER_NAME, |_, _| {}))
}

pub fn tasks_app(config: &Config) -> Router {
    let state = app_state::<Task>(config, TASKS_SERVER_NAME, tools::register_status_updates);
    transport_http::tasks_router(state)
}

/// The router for the configured variant.
pub fn build_router(config: &Config) -> Router {
    match config.variant {
        Variant::Notes => notes_app(config),
        Variant::Tasks => tasks_app(config),
    }
}
