//! Chat/tool orchestrator
//!
//! Resolves one natural-language query into a final answer, transparently
//! executing tools when the model requests them. The protocol is a fixed
//! two-round exchange: one completion with tools attached, sequential
//! execution of any requested invocations, then one completion with tool
//! use disabled. Tool results are never fed back for a third round.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use crate::chat::catalog::openai_tools;
use crate::chat::client::CompletionBackend;
use crate::chat::types::{ChatMessage, ToolChoice};
use crate::error::{McpError, NotesMcpError, Result};
use crate::mcp::client::McpSession;
use crate::mcp::types::{CallToolResult, ToolDescriptor};

/// A host that advertises and executes tools
#[async_trait]
pub trait ToolHost: Send {
    /// The live tool catalog
    async fn list_tools(&mut self) -> Result<Vec<ToolDescriptor>>;

    /// Execute one tool invocation
    async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<CallToolResult>;
}

#[async_trait]
impl ToolHost for McpSession {
    async fn list_tools(&mut self) -> Result<Vec<ToolDescriptor>> {
        McpSession::list_tools(self).await
    }

    async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<CallToolResult> {
        McpSession::call_tool(self, name, arguments).await
    }
}

/// Drives queries through the two-round chat/tool protocol
pub struct Orchestrator<H: ToolHost> {
    chat: std::sync::Arc<dyn CompletionBackend>,
    session: Option<H>,
}

impl<H: ToolHost> Orchestrator<H> {
    /// Create an orchestrator with no tool-host session
    pub fn new(chat: std::sync::Arc<dyn CompletionBackend>) -> Self {
        Self {
            chat,
            session: None,
        }
    }

    /// Create an orchestrator bound to a tool-host session
    pub fn with_session(chat: std::sync::Arc<dyn CompletionBackend>, session: H) -> Self {
        Self {
            chat,
            session: Some(session),
        }
    }

    /// Take back the session for release
    pub fn into_session(self) -> Option<H> {
        self.session
    }

    /// Pull the live catalog and adapt it for function calling
    ///
    /// No active session yields an empty catalog rather than an error.
    pub async fn tool_catalog(&mut self) -> Result<Vec<Value>> {
        match self.session.as_mut() {
            None => Ok(Vec::new()),
            Some(session) => Ok(openai_tools(&session.list_tools().await?)),
        }
    }

    /// Resolve one query into a final answer
    pub async fn process_query(&mut self, query: &str) -> Result<String> {
        // The catalog is refreshed per query so server-side changes are
        // always picked up
        let tools = self.tool_catalog().await?;

        let mut messages = vec![ChatMessage::user(query)];

        let assistant = self
            .chat
            .complete(&messages, &tools, ToolChoice::Auto)
            .await?;
        let tool_calls = assistant.requested_tool_calls().to_vec();
        let direct_answer = assistant.content.clone();
        messages.push(assistant);

        if tool_calls.is_empty() {
            return Ok(direct_answer.unwrap_or_default());
        }

        let session = self.session.as_mut().ok_or_else(|| {
            NotesMcpError::Mcp(McpError::ProtocolError {
                message: "model requested tools without an active session".to_string(),
            })
        })?;

        // One invocation at a time, in request order
        for call in &tool_calls {
            let arguments: Value = serde_json::from_str(&call.function.arguments)?;
            if !arguments.is_object() {
                return Err(NotesMcpError::Mcp(McpError::InvalidArguments {
                    message: format!(
                        "arguments for {} did not parse to an object",
                        call.function.name
                    ),
                }));
            }

            info!(tool = %call.function.name, "executing requested tool call");
            let result = session.call_tool(&call.function.name, arguments).await?;
            debug!(tool = %call.function.name, is_error = result.is_error, "tool call finished");

            messages.push(ChatMessage::tool(&call.id, result.first_text()));
        }

        let final_message = self
            .chat
            .complete(&messages, &tools, ToolChoice::None)
            .await?;
        Ok(final_message.content.unwrap_or_default())
    }
}
