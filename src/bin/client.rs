//! Notes MCP Client
//!
//! Connects to an MCP notes server over a subprocess stdio transport,
//! bridges its tool catalog to the chat completions API, and resolves a
//! single query through the two-round tool protocol.

use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use notes_mcp_rust::chat::client::ChatClient;
use notes_mcp_rust::chat::orchestrator::Orchestrator;
use notes_mcp_rust::config::Config;
use notes_mcp_rust::error::Result;
use notes_mcp_rust::mcp::client::McpSession;

/// Query used when none is given, mirroring the demo this client drives
const DEFAULT_QUERY: &str = "can you create a new note with the title 'Buy miter saw' \
     with content as 'miter saw to make angle cuts' and tags as wood_work, learning, hobby \
     and due date 2025-09-09";

/// Notes MCP Client
#[derive(Parser)]
#[command(name = "notes-mcp-client")]
#[command(author, version, about = "Notes MCP Client - chat with tools from an MCP server")]
struct Cli {
    /// Path to the server script (.py or .js)
    server_script: String,

    /// Query to resolve
    #[arg(long)]
    query: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let query = cli.query.unwrap_or_else(|| DEFAULT_QUERY.to_string());

    // Load configuration
    let config = Config::new()?;

    let chat = Arc::new(ChatClient::new(&config)?);

    // Connection setup failures are fatal; there is nothing to release yet
    let mut session = McpSession::connect(&cli.server_script, chat.clone()).await?;

    let tools = session.list_tools().await?;
    let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
    info!(tools = ?names, "connected to server");

    let mut orchestrator = Orchestrator::with_session(chat, session);

    println!("Query: {}", query);
    let outcome = orchestrator.process_query(&query).await;

    // Release the session on success and failure paths alike: stdin
    // first, then the subprocess
    if let Some(session) = orchestrator.into_session() {
        if let Err(e) = session.shutdown().await {
            warn!(error = %e, "failed to shut down server session");
        }
    }

    let answer = outcome?;
    println!("Response: {}", answer);

    Ok(())
}
