//! `second_brain` serves a small in-memory collection (notes or tasks) in two
//! ways: a REST API and an MCP (Model Context Protocol) JSON-RPC 2.0 endpoint
//! for chat-assistant hosts. It also renders HTML widgets the host can embed.
//!
//! Both surfaces share one [`RecordStore`] and one set of validators, so a
//! payload is accepted or rejected identically whichever way it arrives.
//!
//! # Quick start
//!
//! ```rust
//! use second_brain::{Config, JsonRpcRequest, Note, RecordStore, WidgetRenderer};
//! use second_brain::tools::{build_server, Deps};
//! use second_brain::record::{Record, today};
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let config = Config::default();
//! let deps = Deps {
//!     store: Arc::new(RecordStore::new(Note::seed(today()))),
//!     widgets: Arc::new(WidgetRenderer::new(&config.assets_dir, &config.base_url)),
//! };
//! let server = build_server(deps, "second-brain", "0.1.0");
//!
//! let req: JsonRpcRequest = serde_json::from_str(
//!     r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"get_notes"}}"#,
//! ).unwrap();
//! let resp = server.handle(req).await;
//! assert!(resp.error.is_none());
//! # }
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod loader;
pub mod note;
pub mod record;
pub mod rest;
pub mod server;
pub mod store;
pub mod task;
pub mod tools;
pub mod transport_http;
pub mod types;
mod validate;
pub mod widget;

// Re-export the most commonly used items at the crate root.
pub use app::build_router;
pub use config::{Config, Variant};
pub use error::{ApiError, StoreError, ValidationError};
pub use loader::{parse_resources, parse_tools};
pub use note::Note;
pub use record::Record;
pub use server::{FnToolHandler, ResourceHandler, Server, ServerBuilder, ToolHandler};
pub use store::RecordStore;
pub use task::{StatusPatch, Task};
pub use transport_http::{http_router, tasks_router};
pub use types::{
    ContentBlock, JsonRpcRequest, JsonRpcResponse, McpError, PROTOCOL_VERSION, Resource,
    ResourceContent, RpcError, Tool, ToolResult, error_result, new_error_response,
    structured_result, text_result,
};
pub use widget::{TemplateCache, WidgetRenderer};
