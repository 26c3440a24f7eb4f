//! Configuration management for RedirectConsole
//!
//! This module handles application configuration including:
//! - Loading and saving the configuration file
//! - Managing the configuration directory
//! - Session timing defaults
//! - Building per-session transport configs

mod transport;

pub use transport::{RedirectionMode, RelayEndpoint, TransportConfig, DEFAULT_REDIRECTION_PORT};

use crate::error::{ConfigError, ConfigResult};
use crate::session::Encoding;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE_NAME: &str = "config.toml";

const DEFAULT_HANDSHAKE_DELAY_MS: u64 = 4000;
const DEFAULT_ENCODING_COOLDOWN_MS: u64 = 1000;
const DEFAULT_POINTER_THROTTLE_MS: u64 = 200;
const DEFAULT_ENCODING_ID: u8 = 1;

const RELAY_SCHEMES: [&str; 4] = ["ws://", "wss://", "http://", "https://"];

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Relay server configuration
    pub relay: RelayConfig,

    /// Session timing configuration
    pub session: SessionConfig,

    /// Virtual media configuration
    #[serde(default)]
    pub media: MediaConfig,
}

/// Relay server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Relay server base address
    pub server: String,

    /// Token presented to the relay
    pub auth_token: String,

    /// Redirection port on the managed device
    pub port: u16,
}

/// Session timing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Grace period between instantiating an engine and starting it
    pub handshake_delay_ms: u64,

    /// Wait between stop and restart on an encoding change
    pub encoding_cooldown_ms: u64,

    /// Minimum spacing of forwarded pointer-move events
    pub pointer_throttle_ms: u64,

    /// Encoding used for new desktop sessions
    pub default_encoding: u8,
}

/// Virtual media images offered to media sessions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Optical disc image
    pub optical_image: Option<PathBuf>,

    /// Floppy disk image
    pub floppy_image: Option<PathBuf>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            server: String::new(),
            auth_token: String::new(),
            port: DEFAULT_REDIRECTION_PORT,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            handshake_delay_ms: DEFAULT_HANDSHAKE_DELAY_MS,
            encoding_cooldown_ms: DEFAULT_ENCODING_COOLDOWN_MS,
            pointer_throttle_ms: DEFAULT_POINTER_THROTTLE_MS,
            default_encoding: DEFAULT_ENCODING_ID,
        }
    }
}

/// Timing values consumed by the session controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTiming {
    /// Delay between instantiation and engine start
    pub handshake_delay: Duration,
    /// Delay between stop and restart on encoding change
    pub encoding_cooldown: Duration,
    /// Pointer-move throttle window
    pub pointer_throttle: Duration,
}

impl Default for SessionTiming {
    fn default() -> Self {
        SessionConfig::default().timing()
    }
}

impl SessionConfig {
    /// Converts millisecond settings to durations
    pub fn timing(&self) -> SessionTiming {
        SessionTiming {
            handshake_delay: Duration::from_millis(self.handshake_delay_ms),
            encoding_cooldown: Duration::from_millis(self.encoding_cooldown_ms),
            pointer_throttle: Duration::from_millis(self.pointer_throttle_ms),
        }
    }
}

impl Config {
    /// Timing values for new session controllers
    pub fn session_timing(&self) -> SessionTiming {
        self.session.timing()
    }

    /// Builds a transport config for one device
    pub fn transport(&self, mode: RedirectionMode, device_id: impl Into<String>) -> TransportConfig {
        TransportConfig::new(
            mode,
            device_id,
            self.relay.server.clone(),
            self.relay.auth_token.clone(),
        )
        .with_port(self.relay.port)
    }

    /// Encoding used for new desktop sessions
    pub fn default_encoding(&self) -> ConfigResult<Encoding> {
        Encoding::from_id(self.session.default_encoding).ok_or_else(|| {
            ConfigError::InvalidValue(format!(
                "Unknown default encoding {}",
                self.session.default_encoding
            ))
        })
    }
}

/// Configuration manager
pub struct ConfigManager {
    config_dir: PathBuf,
    config_file: PathBuf,
}

impl ConfigManager {
    /// Creates a ConfigManager rooted at the platform config directory
    ///
    /// # Errors
    ///
    /// Returns error if project directory cannot be determined
    pub fn new() -> ConfigResult<Self> {
        let config_dir = Self::get_config_directory()?;
        Ok(Self::with_directory(config_dir))
    }

    /// Creates a ConfigManager rooted at an explicit directory
    pub fn with_directory(config_dir: impl Into<PathBuf>) -> Self {
        let config_dir = config_dir.into();
        let config_file = config_dir.join(CONFIG_FILE_NAME);
        Self {
            config_dir,
            config_file,
        }
    }

    fn get_config_directory() -> ConfigResult<PathBuf> {
        ProjectDirs::from("com", "redirectconsole", "RedirectConsole")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or_else(|| {
                ConfigError::DirectoryNotFound(
                    "Could not determine configuration directory".to_string(),
                )
            })
    }

    fn ensure_config_directory(&self) -> ConfigResult<()> {
        if !self.config_dir.exists() {
            fs::create_dir_all(&self.config_dir).map_err(|e| {
                ConfigError::DirectoryCreationFailed(format!(
                    "Failed to create config directory at {:?}: {}",
                    self.config_dir, e
                ))
            })?;
        }
        Ok(())
    }

    /// Loads configuration from file, or creates default if it doesn't exist
    ///
    /// # Errors
    ///
    /// Returns error if configuration cannot be loaded or created
    pub fn load_or_create_default(&self) -> ConfigResult<Config> {
        self.ensure_config_directory()?;

        if self.config_file.exists() {
            self.load()
        } else {
            let config = Config::default();
            self.save(&config)?;
            Ok(config)
        }
    }

    fn load(&self) -> ConfigResult<Config> {
        let content = fs::read_to_string(&self.config_file).map_err(|e| {
            ConfigError::LoadFailed(format!("Failed to read config file: {}", e))
        })?;

        let config: Config = toml::from_str(&content)?;
        self.validate(&config)?;

        Ok(config)
    }

    /// Saves configuration to file
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid or cannot be written
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        self.ensure_config_directory()?;
        self.validate(config)?;

        let content = toml::to_string_pretty(config)?;

        fs::write(&self.config_file, content).map_err(|e| {
            ConfigError::SaveFailed(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    fn validate(&self, config: &Config) -> ConfigResult<()> {
        let session = &config.session;
        if session.handshake_delay_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "Handshake delay must be greater than zero".to_string(),
            ));
        }

        if session.encoding_cooldown_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "Encoding cool-down must be greater than zero".to_string(),
            ));
        }

        if session.pointer_throttle_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "Pointer throttle interval must be greater than zero".to_string(),
            ));
        }

        config.default_encoding()?;

        let server = &config.relay.server;
        if !server.is_empty() && !RELAY_SCHEMES.iter().any(|s| server.starts_with(s)) {
            return Err(ConfigError::InvalidValue(format!(
                "Relay server must be a ws, wss, http or https address: {}",
                server
            )));
        }

        Ok(())
    }

    /// Gets the path to the configuration file
    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    /// Gets the configuration directory path
    pub fn config_directory(&self) -> &Path {
        &self.config_dir
    }
}
