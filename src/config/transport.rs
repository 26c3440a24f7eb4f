//! Transport configuration for a single redirection session
//!
//! A [`TransportConfig`] describes how to reach one managed device through the
//! relay server. It is immutable once handed to a session controller; a new
//! target requires a new controller.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default redirection port on the managed device
pub const DEFAULT_REDIRECTION_PORT: u16 = 16994;

/// Relay path appended to the relay server address
const RELAY_PATH: &str = "webrelay.ashx";

/// Kind of traffic a session carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedirectionMode {
    /// Keyboard, video and mouse redirection
    Desktop,
    /// Virtual removable-media redirection
    Media,
}

impl RedirectionMode {
    /// Mode name understood by the relay
    pub fn relay_name(&self) -> &'static str {
        match self {
            RedirectionMode::Desktop => "kvm",
            RedirectionMode::Media => "ider",
        }
    }
}

impl fmt::Display for RedirectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedirectionMode::Desktop => write!(f, "desktop"),
            RedirectionMode::Media => write!(f, "media"),
        }
    }
}

/// How to reach a device through the relay
///
/// `user`, `pass`, `tls` and `tls1only` are reserved by the redirection
/// protocol and currently inert. They are carried so the engine sees the
/// same shape it always has.
#[derive(Clone, PartialEq, Eq)]
pub struct TransportConfig {
    mode: RedirectionMode,
    device_id: String,
    relay_server: String,
    auth_token: String,
    port: u16,
    user: String,
    pass: String,
    tls: bool,
    tls1only: bool,
}

impl TransportConfig {
    /// Creates a config with the default port and inert reserved fields
    pub fn new(
        mode: RedirectionMode,
        device_id: impl Into<String>,
        relay_server: impl Into<String>,
        auth_token: impl Into<String>,
    ) -> Self {
        Self {
            mode,
            device_id: device_id.into(),
            relay_server: relay_server.into(),
            auth_token: auth_token.into(),
            port: DEFAULT_REDIRECTION_PORT,
            user: String::new(),
            pass: String::new(),
            tls: false,
            tls1only: false,
        }
    }

    /// Overrides the device port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Session mode
    pub fn mode(&self) -> RedirectionMode {
        self.mode
    }

    /// Managed device identifier (the relay's `host`)
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Relay server base address
    pub fn relay_server(&self) -> &str {
        &self.relay_server
    }

    /// Bearer token presented to the relay
    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }

    /// Device port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Reserved credential fields
    pub fn credentials(&self) -> (&str, &str) {
        (&self.user, &self.pass)
    }

    /// Reserved TLS flags as `(tls, tls1only)`
    pub fn tls_flags(&self) -> (bool, bool) {
        (self.tls, self.tls1only)
    }

    /// Builds the relay endpoint the engine opens
    pub fn endpoint(&self) -> RelayEndpoint {
        RelayEndpoint::from_config(self)
    }
}

// Keeps the token and password out of logs
impl fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportConfig")
            .field("mode", &self.mode)
            .field("device_id", &self.device_id)
            .field("relay_server", &self.relay_server)
            .field("auth_token", &"<redacted>")
            .field("port", &self.port)
            .field("user", &self.user)
            .field("pass", &"<redacted>")
            .field("tls", &self.tls)
            .field("tls1only", &self.tls1only)
            .finish()
    }
}

/// Resolved relay address plus the token to present when opening it
#[derive(Clone, PartialEq, Eq)]
pub struct RelayEndpoint {
    url: String,
    auth_token: String,
}

impl RelayEndpoint {
    /// Renders the relay URL for a transport config
    pub fn from_config(config: &TransportConfig) -> Self {
        let (tls, tls1only) = config.tls_flags();
        let url = format!(
            "{}/{}?p=2&host={}&port={}&tls={}&tls1only={}&mode={}",
            config.relay_server().trim_end_matches('/'),
            RELAY_PATH,
            urlencoding::encode(config.device_id()),
            config.port(),
            u8::from(tls),
            u8::from(tls1only),
            config.mode().relay_name(),
        );

        Self {
            url,
            auth_token: config.auth_token().to_string(),
        }
    }

    /// Relay URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Token to present alongside the URL
    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }
}

// Keeps the token out of logs
impl fmt::Debug for RelayEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayEndpoint")
            .field("url", &self.url)
            .field("auth_token", &"<redacted>")
            .finish()
    }
}
