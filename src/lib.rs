//! Notes MCP Library
//!
//! A demonstration pairing of a Model Context Protocol (MCP) server
//! exposing note-taking tools over a SQLite store, and a client bridging
//! the server's tool catalog to a chat completions API's function-calling
//! interface.

pub mod chat;
pub mod config;
pub mod error;
pub mod mcp;
pub mod notes;

pub use config::Config;
pub use error::{NotesMcpError, Result};
