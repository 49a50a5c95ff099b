//! Configuration management for the notes MCP pairing
//!
//! Handles paths, environment variables, and configuration loading.
//! All settings are resolved once at startup into an explicit struct;
//! nothing reads the environment after construction.

use std::path::PathBuf;

use crate::error::{ConfigError, NotesMcpError, Result};

/// Configuration shared by the server and client binaries
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory for storing configuration and data files
    pub config_dir: PathBuf,

    /// Path to the SQLite notes database
    pub db_path: PathBuf,

    /// Optional log file path (server logs here when set, since stdout
    /// carries the protocol)
    pub log_path: Option<PathBuf>,

    /// Base URL of the chat completions API
    pub api_base_url: String,

    /// API key for the chat completions API
    pub api_key: Option<String>,

    /// Model name for chat completions
    pub model: String,
}

impl Config {
    /// Create a new configuration from the environment with default paths
    pub fn new() -> Result<Self> {
        let config_dir = Self::get_config_dir()?;

        let db_path = std::env::var("NOTES_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir.join("notes.db"));

        let log_path = std::env::var("NOTES_LOG_PATH").ok().map(PathBuf::from);

        let api_base_url = std::env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| openai::API_BASE_URL.to_string());

        let api_key = std::env::var("OPENAI_API_KEY").ok();

        let model =
            std::env::var("OPENAI_MODEL").unwrap_or_else(|_| openai::DEFAULT_MODEL.to_string());

        Ok(Self {
            config_dir,
            db_path,
            log_path,
            api_base_url,
            api_key,
            model,
        })
    }

    /// Get the configuration directory, creating it if necessary
    fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::home_dir()
            .ok_or_else(|| {
                NotesMcpError::Config(ConfigError::DirNotFound {
                    path: "~".to_string(),
                })
            })?
            .join(".notes-mcp");

        // Create directory if it doesn't exist
        if !config_dir.exists() {
            std::fs::create_dir_all(&config_dir).map_err(|_| {
                NotesMcpError::Config(ConfigError::DirCreationFailed {
                    path: config_dir.display().to_string(),
                })
            })?;
        }

        Ok(config_dir)
    }

}

/// Chat completions API constants
pub mod openai {
    /// Base URL for the OpenAI-compatible chat API
    pub const API_BASE_URL: &str = "https://api.openai.com/v1";

    /// Default model when OPENAI_MODEL is not set
    pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = Config::new();
        assert!(config.is_ok());
    }

    #[test]
    fn test_default_model() {
        if std::env::var("OPENAI_MODEL").is_err() {
            let config = Config::new().unwrap();
            assert_eq!(config.model, openai::DEFAULT_MODEL);
        }
    }

    #[test]
    fn test_db_path_defaults_into_config_dir() {
        if std::env::var("NOTES_DB_PATH").is_err() {
            let config = Config::new().unwrap();
            assert!(config.db_path.starts_with(&config.config_dir));
        }
    }
}
