//! MCP client session
//!
//! Connects to a tool-hosting server over a subprocess stdio transport,
//! drives the initialize handshake, and exchanges sequential JSON-RPC
//! requests. While waiting on a response the session services
//! server-initiated sampling requests by delegating to the configured
//! handler.

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info, warn};

use crate::error::{McpError, NotesMcpError, Result};
use crate::mcp::types::*;

/// Services server-initiated sampling/createMessage requests
#[async_trait]
pub trait SamplingHandler: Send + Sync {
    async fn create_message(&self, params: CreateMessageParams) -> Result<CreateMessageResult>;
}

/// An active session with a tool-hosting server subprocess
pub struct McpSession {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
    next_id: i64,
    sampling: Arc<dyn SamplingHandler>,
}

impl McpSession {
    /// Spawn the server subprocess and run the initialize handshake
    ///
    /// The server program is chosen by extension inspection of the script
    /// path; only `.py` and `.js` scripts are supported.
    pub async fn connect(
        script_path: &str,
        sampling: Arc<dyn SamplingHandler>,
    ) -> Result<Self> {
        let command = interpreter_for(script_path)?;

        let mut child = Command::new(command)
            .arg(script_path)
            .env("PYTHONUNBUFFERED", "1")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()?;

        let stdin = child.stdin.take().ok_or_else(|| {
            NotesMcpError::Mcp(McpError::TransportError {
                message: "child stdin unavailable".to_string(),
            })
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            NotesMcpError::Mcp(McpError::TransportError {
                message: "child stdout unavailable".to_string(),
            })
        })?;

        let mut session = Self {
            child,
            stdin: Some(stdin),
            stdout: BufReader::new(stdout),
            next_id: 0,
            sampling,
        };

        session.initialize().await?;
        Ok(session)
    }

    /// Run the initialize request/notification handshake
    async fn initialize(&mut self) -> Result<()> {
        let params = InitializeParams {
            protocol_version: MCP_VERSION.to_string(),
            client_info: ClientInfo {
                name: "notes-mcp-client".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            capabilities: ClientCapabilities {
                experimental: None,
                sampling: Some(serde_json::json!({})),
            },
        };

        let result = self
            .request(methods::INITIALIZE, Some(serde_json::to_value(params)?))
            .await?;
        let init: InitializeResult = serde_json::from_value(result)?;
        info!(
            server = %init.server_info.name,
            version = %init.server_info.version,
            "connected to MCP server"
        );

        self.write_message(&serde_json::to_string(&JsonRpcNotification::new(
            methods::INITIALIZED,
        ))?)
        .await?;

        Ok(())
    }

    /// Fetch the live tool catalog
    pub async fn list_tools(&mut self) -> Result<Vec<ToolDescriptor>> {
        let result = self.request(methods::LIST_TOOLS, None).await?;
        let listed: ListToolDescriptorsResult = serde_json::from_value(result)?;
        Ok(listed.tools)
    }

    /// Invoke a tool on the server
    pub async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<CallToolResult> {
        let params = CallToolParams {
            name: name.to_string(),
            arguments,
        };
        let result = self
            .request(methods::CALL_TOOL, Some(serde_json::to_value(params)?))
            .await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Send a request and wait for its response, servicing any
    /// server-initiated requests that arrive in between
    async fn request(&mut self, method: &str, params: Option<Value>) -> Result<Value> {
        self.next_id += 1;
        let id = RequestId::Number(self.next_id);
        let request = JsonRpcRequest::new(id.clone(), method, params);
        self.write_message(&serde_json::to_string(&request)?).await?;

        loop {
            let line = self.read_message().await?;
            let value: Value = serde_json::from_str(&line).map_err(|e| {
                NotesMcpError::Mcp(McpError::ProtocolError {
                    message: format!("unparseable message from server: {}", e),
                })
            })?;

            if value.get("method").is_some() {
                if value.get("id").is_some() {
                    // Server-initiated request (sampling)
                    let incoming: JsonRpcRequest = serde_json::from_value(value)?;
                    self.handle_server_request(incoming).await?;
                } else {
                    debug!("ignoring server notification");
                }
                continue;
            }

            let response: JsonRpcResponse = serde_json::from_value(value)?;
            if response.id != id {
                warn!("dropping response with unexpected id");
                continue;
            }

            if let Some(error) = response.error {
                return Err(NotesMcpError::Mcp(McpError::ServerError {
                    code: error.code,
                    message: error.message,
                }));
            }
            return Ok(response.result.unwrap_or(Value::Null));
        }
    }

    /// Answer a server-initiated request
    async fn handle_server_request(&mut self, request: JsonRpcRequest) -> Result<()> {
        let response = match request.method.as_str() {
            methods::CREATE_MESSAGE => {
                let params: CreateMessageParams =
                    serde_json::from_value(request.params.unwrap_or(Value::Null))?;
                match self.sampling.create_message(params).await {
                    Ok(result) => {
                        JsonRpcResponse::success(request.id, serde_json::to_value(result)?)
                    }
                    Err(e) => JsonRpcResponse::error(
                        request.id,
                        JsonRpcError::internal_error(e.to_string()),
                    ),
                }
            }
            other => JsonRpcResponse::error(request.id, JsonRpcError::method_not_found(other)),
        };

        self.write_message(&serde_json::to_string(&response)?).await
    }

    async fn write_message(&mut self, message: &str) -> Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| NotesMcpError::Mcp(McpError::ConnectionClosed))?;
        stdin.write_all(message.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.flush().await?;
        Ok(())
    }

    async fn read_message(&mut self) -> Result<String> {
        loop {
            let mut line = String::new();
            let n = self.stdout.read_line(&mut line).await?;
            if n == 0 {
                return Err(NotesMcpError::Mcp(McpError::ConnectionClosed));
            }
            if !line.trim().is_empty() {
                return Ok(line);
            }
        }
    }

    /// Release the session: close the child's stdin first, then reap the
    /// process. Called on success and failure paths alike.
    pub async fn shutdown(mut self) -> Result<()> {
        drop(self.stdin.take());

        match self.child.wait().await {
            Ok(status) => {
                debug!(%status, "MCP server exited");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "failed to reap MCP server, killing it");
                self.child.kill().await?;
                Ok(())
            }
        }
    }
}

/// Select the interpreter for a server script by file extension
fn interpreter_for(script_path: &str) -> Result<&'static str> {
    if script_path.ends_with(".py") {
        Ok("python")
    } else if script_path.ends_with(".js") {
        Ok("node")
    } else {
        Err(NotesMcpError::Mcp(McpError::UnsupportedScript {
            path: script_path.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpreter_for_python() {
        assert_eq!(interpreter_for("server.py").unwrap(), "python");
    }

    #[test]
    fn test_interpreter_for_node() {
        assert_eq!(interpreter_for("server.js").unwrap(), "node");
    }

    #[test]
    fn test_interpreter_rejects_other_extensions() {
        let err = interpreter_for("server.sh").unwrap_err();
        assert!(matches!(
            err,
            NotesMcpError::Mcp(McpError::UnsupportedScript { .. })
        ));
    }
}
