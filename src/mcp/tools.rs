//! MCP tool definitions and handlers
//!
//! Defines the note tools and their implementations over the store.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::error::Result;
use crate::mcp::types::{
    CallToolResult, CreateMessageParams, CreateMessageResult, SamplingMessage, SamplingRole,
    TextContent, Tool,
};
use crate::notes::store::NoteStore;
use crate::notes::types::NewNote;

/// Sends sampling requests back to the connected client
///
/// `generate_note` needs the model, and the only path to it runs through
/// the client session that initiated the tool call.
#[async_trait]
pub trait Sampler: Send {
    async fn create_message(&mut self, params: CreateMessageParams) -> Result<CreateMessageResult>;
}

/// Tool handler
pub struct ToolHandler {
    store: Arc<NoteStore>,
}

impl ToolHandler {
    /// Create a new tool handler
    pub fn new(store: Arc<NoteStore>) -> Self {
        Self { store }
    }

    /// List all available tools
    pub fn list_tools(&self) -> Vec<Tool> {
        vec![
            tool_def(
                "create_notes",
                "Create a new note with title, content, tags, and due date.",
                create_notes_schema(),
            ),
            tool_def(
                "generate_note",
                "Generate a note for the title.",
                generate_note_schema(),
            ),
        ]
    }

    /// Call a tool by name
    pub async fn call_tool(
        &self,
        name: &str,
        args: Value,
        sampler: &mut dyn Sampler,
    ) -> CallToolResult {
        match name {
            "create_notes" => self.handle_create_notes(args),
            "generate_note" => self.handle_generate_note(args, sampler).await,
            _ => CallToolResult::error(format!("Unknown tool: {}", name)),
        }
    }

    // ==================== Tool Handlers ====================

    fn handle_create_notes(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        struct Args {
            title: String,
            content: String,
            #[serde(default)]
            tags: Vec<String>,
            #[serde(default)]
            due_date: Option<String>,
        }

        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };

        info!(title = %args.title, tags = ?args.tags, due_date = ?args.due_date, "creating note");

        let note = NewNote {
            title: args.title,
            content: args.content,
            tags: args.tags,
            due_date: args.due_date,
        };

        match self.store.insert(&note) {
            Ok(()) => CallToolResult::text(format!(
                "Note created: title={}, content={}, tags=[{}], due_date={}",
                note.title,
                note.content,
                note.tags.join(", "),
                note.due_date.as_deref().unwrap_or("None"),
            )),
            Err(e) => CallToolResult::error(e.to_string()),
        }
    }

    async fn handle_generate_note(&self, args: Value, sampler: &mut dyn Sampler) -> CallToolResult {
        #[derive(Deserialize)]
        struct Args {
            title: String,
        }

        /// Shape the model is instructed to produce
        #[derive(Deserialize)]
        struct GeneratedNote {
            title: String,
            content: String,
            #[serde(default)]
            tags: Vec<String>,
        }

        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };

        let prompt = format!(
            "Return only json with properties title, content, tags and due_date \
             with generated content and tags for the {}",
            args.title
        );

        // The instruction goes out under the assistant role, matching the
        // behavior this server replaces
        let params = CreateMessageParams {
            messages: vec![SamplingMessage {
                role: SamplingRole::Assistant,
                content: TextContent::new(prompt),
            }],
            max_tokens: 100,
        };

        let result = match sampler.create_message(params).await {
            Ok(r) => r,
            Err(e) => return CallToolResult::error(format!("Sampling failed: {}", e)),
        };

        info!(content_type = %result.content.content_type, "sampling result received");

        if result.content.content_type == "text" {
            let generated: GeneratedNote =
                match serde_json::from_str(result.content.text.trim()) {
                    Ok(g) => g,
                    Err(e) => {
                        return CallToolResult::error(format!(
                            "Generated note body was not valid JSON: {}",
                            e
                        ))
                    }
                };

            let note = NewNote {
                title: generated.title,
                content: generated.content,
                tags: generated.tags,
                due_date: None,
            };

            if let Err(e) = self.store.insert(&note) {
                return CallToolResult::error(e.to_string());
            }
            info!(title = %note.title, "generated note stored");
        }

        CallToolResult::text(result.content.content_type)
    }
}

// ==================== Schema Definitions ====================

fn tool_def(name: &str, description: &str, input_schema: Value) -> Tool {
    Tool {
        name: name.to_string(),
        description: Some(description.to_string()),
        input_schema,
    }
}

fn create_notes_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "title": {
                "type": "string",
                "description": "The title of the note"
            },
            "content": {
                "type": "string",
                "description": "The content/body of the note"
            },
            "tags": {
                "type": "array",
                "items": {"type": "string"},
                "description": "A list of tags for the note"
            },
            "due_date": {
                "type": "string",
                "description": "Due date in ISO format (YYYY-MM-DD)"
            }
        },
        "required": ["title", "content", "tags"]
    })
}

fn generate_note_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "title": {
                "type": "string",
                "description": "Title to generate a note for"
            }
        },
        "required": ["title"]
    })
}
