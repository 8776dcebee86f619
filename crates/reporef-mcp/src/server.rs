//! MCP Server implementation
//!
//! Reads newline-delimited JSON-RPC messages, dispatches them and writes one
//! response line per request. Notifications get no response.

use std::sync::Arc;

use reporef_core::{Config, RepoService};
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::handlers::handle_tool_call;
use crate::protocol::{
    INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, InitializeParams, InitializeResult,
    JSONRPC_VERSION, JsonRpcRequest, JsonRpcResponse, METHOD_NOT_FOUND, PARSE_ERROR,
    PROTOCOL_VERSION, ServerCapabilities, ServerInfo, ToolCallParams, ToolsCapability,
};
use crate::tools::{ToolDefinition, get_tool_definitions};
use crate::{Error, Result};

pub const SERVER_NAME: &str = "reporef";

/// MCP server over a shared [`RepoService`].
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use reporef_mcp::ReporefServer;
///
/// let server = ReporefServer::new(Arc::new(service));
/// server.run().await?;
/// ```
pub struct ReporefServer {
    service: Arc<RepoService>,
    tools: Vec<ToolDefinition>,
    instructions: String,
}

impl ReporefServer {
    pub fn new(service: Arc<RepoService>) -> Self {
        let instructions = build_instructions(service.config());
        Self {
            service,
            tools: get_tool_definitions(),
            instructions,
        }
    }

    /// Serve on stdin/stdout until stdin closes.
    pub async fn run(&self) -> Result<()> {
        tracing::info!(repos = self.service.config().repos.len(), "MCP server ready, listening on stdio");
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Serve line-delimited messages from `reader`, answering on `writer`.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            tracing::debug!(request = %line, "Received message");

            let response = match self.handle_message(line).await {
                Ok(response) => response,
                Err(e) => serde_json::to_string(&JsonRpcResponse::error(
                    None,
                    INTERNAL_ERROR,
                    format!("Internal error: {e}"),
                ))?,
            };
            if response.is_empty() {
                continue;
            }
            writer.write_all(response.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
        tracing::info!("stdin closed, shutting down");
        Ok(())
    }

    /// Handle a single MCP message
    ///
    /// Returns the JSON-RPC response as a string, or an empty string for
    /// notifications.
    pub async fn handle_message(&self, message: &str) -> Result<String> {
        let request: JsonRpcRequest = match serde_json::from_str(message) {
            Ok(request) => request,
            Err(e) => {
                let response =
                    JsonRpcResponse::error(None, PARSE_ERROR, format!("Parse error: {e}"));
                return serde_json::to_string(&response).map_err(Error::from);
            }
        };

        if request.is_notification() {
            tracing::debug!(method = %request.method, "Notification received");
            return Ok(String::new());
        }

        let response = if request.jsonrpc != JSONRPC_VERSION {
            JsonRpcResponse::error(
                request.id,
                INVALID_REQUEST,
                format!("Unsupported jsonrpc version: {}", request.jsonrpc),
            )
        } else {
            match request.method.as_str() {
                "initialize" => self.handle_initialize(request.id, request.params)?,
                "ping" => JsonRpcResponse::success(request.id, json!({})),
                "tools/list" => self.handle_tools_list(request.id),
                "tools/call" => self.handle_tools_call(request.id, request.params).await?,
                _ => JsonRpcResponse::error(
                    request.id,
                    METHOD_NOT_FOUND,
                    format!("Method not found: {}", request.method),
                ),
            }
        };

        serde_json::to_string(&response).map_err(Error::from)
    }

    fn handle_initialize(&self, id: Option<Value>, params: Value) -> Result<JsonRpcResponse> {
        let params: InitializeParams = serde_json::from_value(params).unwrap_or_default();
        if let Some(client) = &params.client_info {
            tracing::info!(
                client = %client.name,
                version = %client.version,
                protocol = params.protocol_version.as_deref().unwrap_or("unknown"),
                "Client connected"
            );
        }

        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: Some(self.instructions.clone()),
        };

        Ok(JsonRpcResponse::success(id, serde_json::to_value(result)?))
    }

    fn handle_tools_list(&self, id: Option<Value>) -> JsonRpcResponse {
        JsonRpcResponse::success(id, json!({ "tools": self.tools }))
    }

    /// Tool failures are successful responses carrying `isError: true`; only
    /// malformed params and unknown tools become JSON-RPC errors.
    async fn handle_tools_call(&self, id: Option<Value>, params: Value) -> Result<JsonRpcResponse> {
        let params: ToolCallParams = match serde_json::from_value(params) {
            Ok(params) => params,
            Err(e) => {
                return Ok(JsonRpcResponse::error(
                    id,
                    INVALID_PARAMS,
                    format!("Invalid params: {e}"),
                ));
            }
        };

        match handle_tool_call(&self.service, &params.name, params.arguments).await {
            Ok(result) => Ok(JsonRpcResponse::success(id, serde_json::to_value(result)?)),
            Err(e @ (Error::InvalidArguments { .. } | Error::UnknownTool(_))) => {
                Ok(JsonRpcResponse::error(id, INVALID_PARAMS, e.to_string()))
            }
            Err(e) => Ok(JsonRpcResponse::error(id, INTERNAL_ERROR, e.to_string())),
        }
    }
}

/// Server instructions: what the tools are for plus the repository list.
pub fn build_instructions(config: &Config) -> String {
    let mut text = String::from(
        "This server gives read access to the source of configured Git repositories. \
         Use it to look up code and documentation a task depends on.",
    );
    if let Some(global) = config.global_description.as_deref().filter(|d| !d.is_empty()) {
        text.push_str(&format!(" Reach for it when: {global}"));
    }

    text.push_str("\n\nAvailable repositories:\n");
    if config.repos.is_empty() {
        text.push_str("No repositories available now.");
    }
    let lines: Vec<String> = config
        .repos
        .iter()
        .map(|repo| match &repo.alias {
            Some(alias) => format!("- {} (alias: {alias}): {}", repo.name, repo.description),
            None => format!("- {}: {}", repo.name, repo.description),
        })
        .collect();
    text.push_str(&lines.join("\n"));
    text
}
