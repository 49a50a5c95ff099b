//! Error types for the notes MCP pairing
//!
//! This module defines the error hierarchy for both the server and the
//! client binaries.

use thiserror::Error;

/// Main error type for the notes MCP crate
#[derive(Error, Debug)]
pub enum NotesMcpError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Chat completion API errors
    #[error("Chat API error: {0}")]
    Chat(#[from] ChatApiError),

    /// MCP protocol errors
    #[error("MCP protocol error: {0}")]
    Mcp(#[from] McpError),

    /// Note store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Chat completion API errors
#[derive(Error, Debug)]
pub enum ChatApiError {
    #[error("Missing API key: environment variable {var} not set")]
    MissingApiKey { var: String },

    #[error("API request failed ({status}): {message}")]
    RequestFailed { status: u16, message: String },

    #[error("Response contained no choices")]
    EmptyResponse,

    #[error("Sampling request failed: {message}")]
    SamplingFailed { message: String },
}

/// Configuration errors
#[derive(Error, Debug)]
#[allow(dead_code)] // Some variants reserved for future use
pub enum ConfigError {
    #[error("Config directory not found: {path}")]
    DirNotFound { path: String },

    #[error("Failed to create config directory: {path}")]
    DirCreationFailed { path: String },

    #[error("Missing required environment variable: {var}")]
    MissingEnvVar { var: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// MCP protocol errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Invalid tool arguments: {message}")]
    InvalidArguments { message: String },

    #[error("Server script must be a .py or .js file: {path}")]
    UnsupportedScript { path: String },

    #[error("Server closed the connection")]
    ConnectionClosed,

    #[error("Protocol error: {message}")]
    ProtocolError { message: String },

    #[error("Transport error: {message}")]
    TransportError { message: String },

    #[error("Server returned error {code}: {message}")]
    ServerError { code: i32, message: String },
}

/// Note store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to open database at {path}: {message}")]
    OpenFailed { path: String, message: String },

    #[error("Store lock poisoned")]
    LockPoisoned,
}

/// Result type alias for notes MCP operations
pub type Result<T> = std::result::Result<T, NotesMcpError>;

impl From<rusqlite::Error> for NotesMcpError {
    fn from(err: rusqlite::Error) -> Self {
        NotesMcpError::Store(StoreError::from(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = McpError::UnsupportedScript {
            path: "server.sh".to_string(),
        };
        assert!(err.to_string().contains("server.sh"));
    }

    #[test]
    fn test_error_conversion() {
        let mcp_err = McpError::ConnectionClosed;
        let err: NotesMcpError = mcp_err.into();
        assert!(matches!(err, NotesMcpError::Mcp(_)));
    }

    #[test]
    fn test_chat_error_status() {
        let err = ChatApiError::RequestFailed {
            status: 401,
            message: "invalid key".to_string(),
        };
        assert!(err.to_string().contains("401"));
    }
}
