//! Error types for RedirectConsole
//!
//! This module defines all error types used throughout the crate.
//! None of these cross the host event boundary: the session controller
//! logs them and surfaces failures only through status notifications.

use std::io;
use thiserror::Error;

/// Main error type for RedirectConsole
#[derive(Error, Debug)]
pub enum RedirectError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Session lifecycle errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Redirection engine errors
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    #[error("Configuration directory not found: {0}")]
    DirectoryNotFound(String),

    #[error("Failed to create configuration directory: {0}")]
    DirectoryCreationFailed(String),
}

/// Session lifecycle errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Unknown encoding id {0}")]
    UnknownEncoding(u8),

    #[error("Session controller has shut down")]
    ControllerClosed,
}

/// Errors reported by, or raised while driving, the redirection engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Engine failed to start: {0}")]
    StartFailed(String),

    #[error("Transport open failed for {endpoint}: {reason}")]
    TransportOpenFailed { endpoint: String, reason: String },

    #[error("Transport closed: {0}")]
    TransportClosed(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Operation not supported by the {0} engine")]
    Unsupported(&'static str),
}

/// Type alias for Results using RedirectError
pub type Result<T> = std::result::Result<T, RedirectError>;

/// Type alias for Config Results
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Type alias for Session Results
pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// Type alias for Engine Results
pub type EngineResult<T> = std::result::Result<T, EngineError>;

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::LoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        ConfigError::SaveFailed(err.to_string())
    }
}
