//! Notes MCP Server
//!
//! A Model Context Protocol (MCP) server for note taking. Exposes tools
//! for creating and generating notes, resources for reading them back,
//! and a prompt template, all backed by a SQLite database.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use notes_mcp_rust::config::Config;
use notes_mcp_rust::error::Result;
use notes_mcp_rust::mcp::server::McpServer;
use notes_mcp_rust::notes::store::NoteStore;

/// Notes MCP Server
#[derive(Parser)]
#[command(name = "notes-mcp-server")]
#[command(author, version, about = "Notes MCP Server - a Model Context Protocol server for notes")]
struct Cli {
    /// Override the notes database path
    #[arg(long)]
    db_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::new()?;
    if let Some(db_path) = cli.db_path {
        config.db_path = db_path;
    }

    init_tracing(&config)?;

    // Open the store, creating the schema on first run
    let store = Arc::new(NoteStore::open(&config.db_path)?);

    // Create and run the MCP server
    let mut server = McpServer::new(store);
    server.run_stdio().await?;

    Ok(())
}

/// Initialize logging
///
/// Stdout carries the protocol, so logs go to the configured file when
/// one is set and to stderr otherwise.
fn init_tracing(config: &Config) -> Result<()> {
    let builder = tracing_subscriber::fmt().with_env_filter(
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::INFO.into()),
    );

    match &config.log_path {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            builder.with_writer(Arc::new(file)).with_ansi(false).init();
        }
        None => {
            builder.with_writer(std::io::stderr).init();
        }
    }

    Ok(())
}
