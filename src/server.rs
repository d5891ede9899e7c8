use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::loader;
use crate::types::*;

/// Handler trait for MCP tools. Implement this or use closures.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: Value) -> Result<ToolResult, McpError>;
}

/// Handler trait for MCP resources.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    async fn call(&self, uri: &str) -> Result<ResourceContent, McpError>;
}

/// Wraps an async closure into a ToolHandler.
pub struct FnToolHandler<F> {
    f: F,
}

impl<F, Fut> FnToolHandler<F>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<ToolResult, McpError>> + Send + 'static,
{
    pub fn new(f: F) -> Arc<dyn ToolHandler> {
        Arc::new(Self { f })
    }
}

#[async_trait]
impl<F, Fut> ToolHandler for FnToolHandler<F>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<ToolResult, McpError>> + Send + 'static,
{
    async fn call(&self, args: Value) -> Result<ToolResult, McpError> {
        (self.f)(args).await
    }
}

/// The MCP server. Create with `ServerBuilder`, register handlers, then serve.
///
/// Stateless: every request is answered on its own, so `initialize` is not a
/// prerequisite for the other methods.
pub struct Server {
    pub(crate) server_name: String,
    pub(crate) server_version: String,
    pub(crate) tools: HashMap<String, Tool>,
    pub(crate) tool_list: Vec<Tool>,
    pub(crate) resources: HashMap<String, Resource>,
    pub(crate) resource_list: Vec<Resource>,
    pub(crate) tool_handlers: HashMap<String, Arc<dyn ToolHandler>>,
    pub(crate) resource_handlers: HashMap<String, Arc<dyn ResourceHandler>>,
    /// Tools whose handlers check argument types themselves.
    pub(crate) self_typed: HashSet<String>,
}

impl Server {
    /// Create a new server builder.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    /// Register a tool handler.
    pub fn handle_tool(&mut self, name: impl Into<String>, handler: Arc<dyn ToolHandler>) {
        self.tool_handlers.insert(name.into(), handler);
    }

    /// Register a tool handler that checks argument types itself.
    ///
    /// The catalogue schema then only enforces presence (required fields,
    /// oneOf, dependencies), so the first reported failure is the handler's.
    pub fn handle_self_typed_tool(&mut self, name: impl Into<String>, handler: Arc<dyn ToolHandler>) {
        let name = name.into();
        self.self_typed.insert(name.clone());
        self.tool_handlers.insert(name, handler);
    }

    /// Register a resource handler.
    pub fn handle_resource(&mut self, name: impl Into<String>, handler: Arc<dyn ResourceHandler>) {
        self.resource_handlers.insert(name.into(), handler);
    }

    pub fn name(&self) -> &str {
        &self.server_name
    }

    pub fn version(&self) -> &str {
        &self.server_version
    }

    /// Catalogue tool names, in catalogue order.
    pub fn tool_names(&self) -> Vec<&str> {
        self.tool_list.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tool_list
    }

    pub fn tool(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    /// Route a JSON-RPC request to the appropriate MCP handler.
    pub async fn handle(&self, req: JsonRpcRequest) -> JsonRpcResponse {
        if req.jsonrpc != "2.0" {
            return new_error_response(req.id, ERR_CODE_INVALID_REQ, "jsonrpc must be '2.0'");
        }

        tracing::debug!(method = %req.method, id = ?req.id, "mcp request");

        match req.method.as_str() {
            "initialize" => self.handle_initialize(req),
            "ping" => self.handle_ping(req),
            m if m.starts_with("notifications/") && req.id.is_none() => notification_response(),
            "tools/list" => self.handle_tools_list(req),
            "tools/call" => self.handle_tools_call(req).await,
            "resources/list" => self.handle_resources_list(req),
            "resources/read" => self.handle_resources_read(req).await,
            _ => new_error_response(
                req.id,
                ERR_CODE_NO_METHOD,
                format!("Method not found: {}", req.method),
            ),
        }
    }

    fn handle_initialize(&self, req: JsonRpcRequest) -> JsonRpcResponse {
        if let Some(params) = &req.params {
            if let Ok(p) = serde_json::from_value::<InitializeParams>(params.clone()) {
                let client_name = p.client_info.as_ref().map_or("", |c| c.name.as_str());
                let client_version = p.client_info.as_ref().map_or("", |c| c.version.as_str());
                tracing::info!(
                    client_name,
                    client_version,
                    protocol_version = ?p.protocol_version,
                    "initialize"
                );
            }
        }

        let result = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {"listChanged": false},
                "resources": {"subscribe": false, "listChanged": false},
            },
            "serverInfo": {
                "name": self.server_name,
                "version": self.server_version,
            },
        });

        new_ok_response(req.id, result)
    }

    fn handle_ping(&self, req: JsonRpcRequest) -> JsonRpcResponse {
        new_ok_response(req.id, json!({}))
    }

    fn handle_tools_list(&self, req: JsonRpcRequest) -> JsonRpcResponse {
        let result = json!({ "tools": self.tool_list });
        new_ok_response(req.id, result)
    }

    async fn handle_tools_call(&self, req: JsonRpcRequest) -> JsonRpcResponse {
        let params: ToolCallParams = match req.params.as_ref() {
            Some(p) => match serde_json::from_value(p.clone()) {
                Ok(p) => p,
                Err(e) => {
                    return new_error_response(
                        req.id,
                        ERR_CODE_BAD_PARAMS,
                        format!("invalid params: {}", e),
                    );
                }
            },
            None => {
                return new_error_response(req.id, ERR_CODE_BAD_PARAMS, "params required");
            }
        };

        let args = if params.arguments.is_null() {
            json!({})
        } else {
            params.arguments
        };

        let Some(tool) = self.tools.get(&params.name) else {
            return new_error_response(
                req.id,
                ERR_CODE_NO_METHOD,
                format!("Unknown tool: {}", params.name),
            );
        };

        let checked = if self.self_typed.contains(&params.name) {
            tool.check_presence(&args)
        } else {
            tool.validate_arguments(&args)
        };
        if let Err(e) = checked {
            tracing::warn!(tool = %params.name, field = %e.field, reason = %e.reason, "rejected arguments");
            return invalid_input_response(req.id, &e);
        }

        let Some(handler) = self.tool_handlers.get(&params.name) else {
            return new_error_response(
                req.id,
                ERR_CODE_INTERNAL,
                format!("no handler for tool: {}", params.name),
            );
        };

        let result = match handler.call(args).await {
            Ok(r) => r,
            Err(McpError::InvalidInput(e)) => return invalid_input_response(req.id, &e),
            Err(McpError::NotFound(msg)) => {
                return new_error_response(req.id, ERR_CODE_BAD_PARAMS, msg);
            }
            Err(e) => {
                tracing::error!(tool = %params.name, error = %e, "tool failed");
                error_result(e.to_string())
            }
        };

        match serde_json::to_value(&result) {
            Ok(value) => new_ok_response(req.id, value),
            Err(e) => new_error_response(req.id, ERR_CODE_INTERNAL, format!("encode result: {}", e)),
        }
    }

    fn handle_resources_list(&self, req: JsonRpcRequest) -> JsonRpcResponse {
        let result = json!({ "resources": self.resource_list });
        new_ok_response(req.id, result)
    }

    async fn handle_resources_read(&self, req: JsonRpcRequest) -> JsonRpcResponse {
        let params: ResourceReadParams = match req.params.as_ref() {
            Some(p) => match serde_json::from_value(p.clone()) {
                Ok(p) => p,
                Err(e) => {
                    return new_error_response(
                        req.id,
                        ERR_CODE_BAD_PARAMS,
                        format!("invalid params: {}", e),
                    );
                }
            },
            None => {
                return new_error_response(req.id, ERR_CODE_BAD_PARAMS, "params required");
            }
        };

        if params.name.is_none() && params.uri.is_none() {
            return new_error_response(
                req.id,
                ERR_CODE_BAD_PARAMS,
                "either name or uri must be provided",
            );
        }

        let target = if let Some(name) = &params.name {
            self.resources.get(name).cloned()
        } else {
            let uri = params.uri.as_deref().unwrap_or_default();
            self.resource_list.iter().find(|r| r.uri == uri).cloned()
        };

        let Some(target) = target else {
            let requested = params.uri.or(params.name).unwrap_or_default();
            return new_error_response(
                req.id,
                ERR_CODE_BAD_PARAMS,
                format!("Resource not found: {}", requested),
            );
        };

        if let Some(handler) = self.resource_handlers.get(&target.name) {
            match handler.call(&target.uri).await {
                Ok(content) => {
                    let result = json!({ "contents": [content] });
                    new_ok_response(req.id, result)
                }
                Err(e) => new_error_response(
                    req.id,
                    ERR_CODE_INTERNAL,
                    format!("read resource: {}", e),
                ),
            }
        } else {
            // No handler: metadata only.
            let result = json!({
                "contents": [{
                    "uri": target.uri,
                    "mimeType": target.mime_type,
                    "text": "",
                }],
            });
            new_ok_response(req.id, result)
        }
    }
}

fn invalid_input_response(
    id: Option<Value>,
    err: &crate::error::ValidationError,
) -> JsonRpcResponse {
    new_error_response_with_data(
        id,
        ERR_CODE_BAD_PARAMS,
        format!("Invalid params: {}", err),
        json!({ "field": err.field, "reason": err.reason }),
    )
}

/// Builder for constructing an MCP Server.
#[derive(Default)]
pub struct ServerBuilder {
    tools: Vec<Tool>,
    resources: Vec<Resource>,
    server_name: Option<String>,
    server_version: Option<String>,
}

impl ServerBuilder {
    /// Parse tool definitions from raw JSON bytes.
    pub fn tools_json(mut self, data: &[u8]) -> Self {
        match loader::parse_tools(data) {
            Ok(tools) => self.tools.extend(tools),
            Err(e) => tracing::error!("parse tools json: {}", e),
        }
        self
    }

    /// Parse resource definitions from raw JSON bytes.
    pub fn resources_json(mut self, data: &[u8]) -> Self {
        match loader::parse_resources(data) {
            Ok(resources) => self.resources.extend(resources),
            Err(e) => tracing::error!("parse resources json: {}", e),
        }
        self
    }

    /// Set server name and version.
    pub fn server_info(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self.server_version = Some(version.into());
        self
    }

    /// Build the server.
    pub fn build(self) -> Server {
        let tool_map: HashMap<String, Tool> =
            self.tools.iter().map(|t| (t.name.clone(), t.clone())).collect();
        let res_map: HashMap<String, Resource> =
            self.resources.iter().map(|r| (r.name.clone(), r.clone())).collect();

        Server {
            server_name: self.server_name.unwrap_or_else(|| "second-brain".into()),
            server_version: self.server_version.unwrap_or_else(|| "1.0.0".into()),
            tools: tool_map,
            tool_list: self.tools,
            resources: res_map,
            resource_list: self.resources,
            tool_handlers: HashMap::new(),
            resource_handlers: HashMap::new(),
            self_typed: HashSet::new(),
        }
    }
}
