//! Chat completion module
//!
//! Contains the wire types for the chat completions API, the HTTP client,
//! the tool catalog adapter, and the query orchestrator.

pub mod catalog;
pub mod client;
pub mod orchestrator;
pub mod types;
