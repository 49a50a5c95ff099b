//! MCP server implementation
//!
//! Implements the Model Context Protocol server for stdio transport.
//! One JSON-RPC message per line: requests come in on stdin, responses go
//! out on stdout. During `generate_note` the server turns the channel
//! around and issues a sampling request of its own, blocking on stdin for
//! the client's answer before finishing the tool call.

use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::error::{McpError, NotesMcpError, Result};
use crate::mcp::prompts::PromptHandler;
use crate::mcp::resources::ResourceHandler;
use crate::mcp::tools::{Sampler, ToolHandler};
use crate::mcp::types::*;
use crate::notes::store::NoteStore;

/// MCP Server info
const SERVER_NAME: &str = "notes";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Line-delimited stdio transport
///
/// Holds the process-wide handles rather than their locks so the sampling
/// bridge can interleave a write-then-read inside a request that is still
/// being handled.
pub struct StdioTransport {
    stdin: std::io::Stdin,
    stdout: std::io::Stdout,
    next_sampling_id: i64,
}

impl StdioTransport {
    fn new() -> Self {
        Self {
            stdin: std::io::stdin(),
            stdout: std::io::stdout(),
            next_sampling_id: 0,
        }
    }

    /// Read the next line, `None` on EOF
    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let n = self.stdin.read_line(&mut line)?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    fn write_line(&mut self, message: &str) -> Result<()> {
        let mut stdout = self.stdout.lock();
        writeln!(stdout, "{}", message)?;
        stdout.flush()?;
        Ok(())
    }
}

#[async_trait]
impl Sampler for StdioTransport {
    /// Issue a sampling/createMessage request to the client and block
    /// until the matching response arrives
    async fn create_message(&mut self, params: CreateMessageParams) -> Result<CreateMessageResult> {
        self.next_sampling_id += 1;
        let id = RequestId::Number(self.next_sampling_id);
        let request = JsonRpcRequest::new(
            id.clone(),
            methods::CREATE_MESSAGE,
            Some(serde_json::to_value(params)?),
        );
        self.write_line(&serde_json::to_string(&request)?)?;

        loop {
            let line = self
                .read_line()?
                .ok_or(NotesMcpError::Mcp(McpError::ConnectionClosed))?;
            if line.trim().is_empty() {
                continue;
            }

            let response: JsonRpcResponse = match serde_json::from_str(&line) {
                Ok(r) => r,
                Err(_) => {
                    // The protocol is sequential; anything else arriving
                    // here is unexpected traffic
                    warn!("dropping non-response message while awaiting sampling result");
                    continue;
                }
            };

            if response.id != id {
                warn!("dropping response with unexpected id while awaiting sampling result");
                continue;
            }

            if let Some(err) = response.error {
                return Err(NotesMcpError::Mcp(McpError::ProtocolError {
                    message: format!("sampling request rejected ({}): {}", err.code, err.message),
                }));
            }

            let result = response.result.unwrap_or(Value::Null);
            return Ok(serde_json::from_value(result)?);
        }
    }
}

/// MCP server for notes
pub struct McpServer {
    /// Tool handler
    tool_handler: ToolHandler,

    /// Resource handler
    resource_handler: ResourceHandler,

    /// Prompt handler
    prompt_handler: PromptHandler,

    /// Whether initialized
    initialized: bool,
}

impl McpServer {
    /// Create a new MCP server over a note store
    pub fn new(store: Arc<NoteStore>) -> Self {
        Self {
            tool_handler: ToolHandler::new(store.clone()),
            resource_handler: ResourceHandler::new(store),
            prompt_handler: PromptHandler,
            initialized: false,
        }
    }

    /// Run the server on stdio until EOF
    pub async fn run_stdio(&mut self) -> Result<()> {
        let mut transport = StdioTransport::new();

        while let Some(line) = transport.read_line()? {
            if line.trim().is_empty() {
                continue;
            }

            match self.handle_message(&line, &mut transport).await {
                Ok(Some(response)) => {
                    transport.write_line(&serde_json::to_string(&response)?)?;
                }
                Ok(None) => {
                    // Notification, no response needed
                }
                Err(e) => {
                    error!(error = %e, "error handling message");
                }
            }
        }

        Ok(())
    }

    /// Handle an incoming JSON-RPC message
    async fn handle_message(
        &mut self,
        message: &str,
        transport: &mut StdioTransport,
    ) -> Result<Option<JsonRpcResponse>> {
        // Try to parse as request
        let request: JsonRpcRequest = match serde_json::from_str(message) {
            Ok(req) => req,
            Err(e) => {
                return Ok(Some(JsonRpcResponse::error(
                    RequestId::Number(0),
                    JsonRpcError::parse_error(e.to_string()),
                )));
            }
        };

        debug!(method = %request.method, "handling request");

        // Handle the request
        match request.method.as_str() {
            methods::INITIALIZE => {
                let result = self.handle_initialize(&request)?;
                Ok(Some(JsonRpcResponse::success(request.id, result)))
            }
            methods::INITIALIZED => {
                self.initialized = true;
                Ok(None) // Notification, no response
            }
            methods::PING => Ok(Some(JsonRpcResponse::success(
                request.id,
                serde_json::json!({}),
            ))),
            methods::LIST_TOOLS => {
                let result = self.handle_list_tools()?;
                Ok(Some(JsonRpcResponse::success(request.id, result)))
            }
            methods::CALL_TOOL => {
                let result = self.handle_call_tool(&request, transport).await;
                Ok(Some(JsonRpcResponse::success(request.id, result)))
            }
            methods::LIST_RESOURCES => {
                let result = serde_json::to_value(ListResourcesResult {
                    resources: self.resource_handler.list_resources(),
                })?;
                Ok(Some(JsonRpcResponse::success(request.id, result)))
            }
            methods::READ_RESOURCE => Ok(Some(self.handle_read_resource(request))),
            methods::LIST_PROMPTS => {
                let result = serde_json::to_value(ListPromptsResult {
                    prompts: self.prompt_handler.list_prompts(),
                })?;
                Ok(Some(JsonRpcResponse::success(request.id, result)))
            }
            methods::GET_PROMPT => Ok(Some(self.handle_get_prompt(request))),
            _ => Ok(Some(JsonRpcResponse::error(
                request.id,
                JsonRpcError::method_not_found(&request.method),
            ))),
        }
    }

    /// Handle initialize request
    fn handle_initialize(&self, _request: &JsonRpcRequest) -> Result<Value> {
        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
            },
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {}),
                resources: Some(ResourcesCapability::default()),
                prompts: Some(PromptsCapability::default()),
            },
        };

        Ok(serde_json::to_value(result)?)
    }

    /// Handle list tools request
    fn handle_list_tools(&self) -> Result<Value> {
        let result = ListToolsResult {
            tools: self.tool_handler.list_tools(),
        };

        Ok(serde_json::to_value(result)?)
    }

    /// Handle call tool request
    async fn handle_call_tool(
        &self,
        request: &JsonRpcRequest,
        transport: &mut StdioTransport,
    ) -> Value {
        let params: CallToolParams = match request.params.as_ref() {
            Some(p) => match serde_json::from_value(p.clone()) {
                Ok(params) => params,
                Err(e) => {
                    return serde_json::to_value(CallToolResult::error(format!(
                        "Invalid tool parameters: {}",
                        e
                    )))
                    .unwrap_or(Value::Null);
                }
            },
            None => {
                return serde_json::to_value(CallToolResult::error("Missing tool parameters"))
                    .unwrap_or(Value::Null);
            }
        };

        let result = self
            .tool_handler
            .call_tool(&params.name, params.arguments, transport)
            .await;
        serde_json::to_value(result).unwrap_or_else(|e| {
            serde_json::to_value(CallToolResult::error(e.to_string())).unwrap_or(Value::Null)
        })
    }

    /// Handle read resource request
    fn handle_read_resource(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let params: ReadResourceParams = match request
            .params
            .map(serde_json::from_value)
            .transpose()
        {
            Ok(Some(p)) => p,
            _ => {
                return JsonRpcResponse::error(
                    request.id,
                    JsonRpcError::invalid_params("Missing resource uri"),
                );
            }
        };

        if !self.resource_handler.handles(&params.uri) {
            return JsonRpcResponse::error(
                request.id,
                JsonRpcError::invalid_params(format!("Unknown resource: {}", params.uri)),
            );
        }

        match self.resource_handler.read_resource(&params.uri) {
            Ok(result) => match serde_json::to_value(result) {
                Ok(value) => JsonRpcResponse::success(request.id, value),
                Err(e) => {
                    JsonRpcResponse::error(request.id, JsonRpcError::internal_error(e.to_string()))
                }
            },
            Err(e) => {
                JsonRpcResponse::error(request.id, JsonRpcError::internal_error(e.to_string()))
            }
        }
    }

    /// Handle get prompt request
    fn handle_get_prompt(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let params: GetPromptParams = match request.params.map(serde_json::from_value).transpose() {
            Ok(Some(p)) => p,
            _ => {
                return JsonRpcResponse::error(
                    request.id,
                    JsonRpcError::invalid_params("Missing prompt name"),
                );
            }
        };

        match self
            .prompt_handler
            .get_prompt(&params.name, params.arguments.as_ref())
        {
            Some(result) => match serde_json::to_value(result) {
                Ok(value) => JsonRpcResponse::success(request.id, value),
                Err(e) => {
                    JsonRpcResponse::error(request.id, JsonRpcError::internal_error(e.to_string()))
                }
            },
            None => JsonRpcResponse::error(
                request.id,
                JsonRpcError::invalid_params(format!("Unknown prompt: {}", params.name)),
            ),
        }
    }
}
