//! Chat completions API client
//!
//! Reqwest-backed client for an OpenAI-compatible chat completions
//! endpoint, behind the `CompletionBackend` trait so the orchestrator can
//! be exercised against scripted backends in tests. The same client
//! services reverse-sampling requests from the MCP server.

use async_trait::async_trait;
use serde_json::Value;

use crate::chat::types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Role, ToolChoice,
};
use crate::config::Config;
use crate::error::{ChatApiError, NotesMcpError, Result};
use crate::mcp::client::SamplingHandler;
use crate::mcp::types::{CreateMessageParams, CreateMessageResult, SamplingRole, TextContent};

/// A chat completion backend
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Run one completion and return the assistant's message
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[Value],
        tool_choice: ToolChoice,
    ) -> Result<ChatMessage>;
}

/// Chat completions API client
#[derive(Debug)]
pub struct ChatClient {
    /// HTTP client
    http_client: reqwest::Client,

    /// Bearer token for the API
    api_key: String,

    /// Endpoint base URL
    api_base_url: String,

    /// Model used for every completion
    model: String,
}

impl ChatClient {
    /// Create a new chat client from the resolved configuration
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| ChatApiError::MissingApiKey {
                var: "OPENAI_API_KEY".to_string(),
            })?;

        Ok(Self {
            http_client: reqwest::Client::new(),
            api_key,
            api_base_url: config.api_base_url.clone(),
            model: config.model.clone(),
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base_url)
    }

    /// Post a completion request and return the first choice's message
    async fn create(&self, request: ChatCompletionRequest) -> Result<ChatMessage> {
        let response = self
            .http_client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(NotesMcpError::Chat(ChatApiError::RequestFailed {
                status,
                message: text,
            }));
        }

        let body: ChatCompletionResponse = response.json().await?;
        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or(ChatApiError::EmptyResponse)?;
        Ok(choice.message)
    }
}

#[async_trait]
impl CompletionBackend for ChatClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[Value],
        tool_choice: ToolChoice,
    ) -> Result<ChatMessage> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            tools: tools.to_vec(),
            tool_choice: if tools.is_empty() {
                None
            } else {
                Some(tool_choice)
            },
            max_tokens: None,
        };
        self.create(request).await
    }
}

#[async_trait]
impl SamplingHandler for ChatClient {
    /// Service a reverse-sampling request: map the sampling messages onto
    /// chat turns role-for-role, complete without tools, and hand the text
    /// back as a content block
    async fn create_message(&self, params: CreateMessageParams) -> Result<CreateMessageResult> {
        let messages: Vec<ChatMessage> = params
            .messages
            .into_iter()
            .map(|m| ChatMessage {
                role: match m.role {
                    SamplingRole::User => Role::User,
                    SamplingRole::Assistant => Role::Assistant,
                },
                content: Some(m.content.text),
                tool_calls: None,
                tool_call_id: None,
            })
            .collect();

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            tools: Vec::new(),
            tool_choice: None,
            max_tokens: Some(params.max_tokens),
        };

        let reply = self.create(request).await?;
        let text = reply.content.ok_or_else(|| ChatApiError::SamplingFailed {
            message: "completion returned no text content".to_string(),
        })?;

        Ok(CreateMessageResult {
            role: SamplingRole::Assistant,
            content: TextContent::new(text),
            model: Some(self.model.clone()),
            stop_reason: Some("endTurn".to_string()),
        })
    }
}
