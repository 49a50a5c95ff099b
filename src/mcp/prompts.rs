//! MCP prompt templates

use serde_json::Value;

use crate::mcp::types::{
    GetPromptResult, Prompt, PromptArgument, PromptMessage, SamplingRole, TextContent,
};

/// Prompt handler
pub struct PromptHandler;

impl PromptHandler {
    /// List all available prompts
    pub fn list_prompts(&self) -> Vec<Prompt> {
        vec![Prompt {
            name: "relevant_content".to_string(),
            description: Some("Generate a content prompt".to_string()),
            arguments: vec![PromptArgument {
                name: "title".to_string(),
                description: Some("Note title to write content for".to_string()),
                required: true,
            }],
        }]
    }

    /// Render a prompt by name
    pub fn get_prompt(
        &self,
        name: &str,
        arguments: Option<&serde_json::Map<String, Value>>,
    ) -> Option<GetPromptResult> {
        match name {
            "relevant_content" => {
                let title = arguments
                    .and_then(|args| args.get("title"))
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                Some(GetPromptResult {
                    description: Some("Generate a content prompt".to_string()),
                    messages: vec![PromptMessage {
                        role: SamplingRole::User,
                        content: TextContent::new(format!(
                            "Please write a relevant note content for the title - {}.",
                            title
                        )),
                    }],
                })
            }
            _ => None,
        }
    }
}
