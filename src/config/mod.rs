//! Configuration module for the voxbridge server
//!
//! This module handles server configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//!
//! # Example
//! ```rust,no_run
//! use voxbridge::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config = ServerConfig::from_file(&PathBuf::from("config.yaml"))?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::core::realtime::{
    DEFAULT_PROTOCOL_VERSION, DEFAULT_REALTIME_MODEL, DEFAULT_TEMPERATURE, DEFAULT_VOICE,
    Modality, OPENAI_REALTIME_URL, RealtimeAudioFormat,
};

mod env;
mod merge;
mod validation;
mod yaml;

pub use yaml::YamlConfig;

/// Default greeting spoken before the media stream is connected.
pub const DEFAULT_TWIML_GREETING: &str =
    "Connecting you to the AI voice assistant. You may start talking.";

/// Default voice for the TwiML `<Say>` verb.
pub const DEFAULT_TWIML_VOICE: &str = "alice";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid value for {key} ('{value}'): {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Secret credential, wiped from memory on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Raw key material. Only for building request headers.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

/// TLS configuration for HTTPS and WSS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// Realtime endpoint connection settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RealtimeSettings {
    /// WebSocket endpoint, without the model query parameter
    pub url: String,
    pub model: String,
    /// Value of the protocol-version header
    pub protocol_version: String,
    /// Upper bound on the WebSocket handshake
    pub connect_timeout: Duration,
    /// Upper bound on closing each leg at session teardown
    pub close_timeout: Duration,
}

impl Default for RealtimeSettings {
    fn default() -> Self {
        Self {
            url: OPENAI_REALTIME_URL.to_string(),
            model: DEFAULT_REALTIME_MODEL.to_string(),
            protocol_version: DEFAULT_PROTOCOL_VERSION.to_string(),
            connect_timeout: Duration::from_secs(10),
            close_timeout: Duration::from_secs(2),
        }
    }
}

/// Defaults for every session configuration sent upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub voice: String,
    pub temperature: f32,
    pub input_audio_format: RealtimeAudioFormat,
    pub output_audio_format: RealtimeAudioFormat,
    pub modalities: Vec<Modality>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            voice: DEFAULT_VOICE.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            input_audio_format: RealtimeAudioFormat::G711Ulaw,
            output_audio_format: RealtimeAudioFormat::G711Ulaw,
            modalities: Modality::defaults(),
        }
    }
}

/// Where assistant instructions come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSettings {
    pub dir: PathBuf,
    /// Prompt name loaded for every session
    pub system_prompt: String,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("prompts"),
            system_prompt: "system_prompt".to_string(),
        }
    }
}

/// Content of the call-answer document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwimlSettings {
    pub greeting: String,
    pub voice: String,
}

impl Default for TwimlSettings {
    fn default() -> Self {
        Self {
            greeting: DEFAULT_TWIML_GREETING.to_string(),
            voice: DEFAULT_TWIML_VOICE.to_string(),
        }
    }
}

/// Server configuration
///
/// Contains all configuration needed to run the relay server:
/// - Server settings (host, port, TLS, public URL)
/// - Realtime endpoint credentials and connection settings
/// - Session defaults (voice, temperature, formats, modalities)
/// - Prompt location and call-answer document
/// - Connection limits
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // TLS configuration (optional)
    pub tls: Option<TlsConfig>,

    /// Externally reachable base URL, used to build the media-stream URL
    pub public_url: Option<String>,

    /// Realtime API credential. Sessions fail to connect without it.
    pub openai_api_key: Option<ApiKey>,

    pub realtime: RealtimeSettings,
    pub session: SessionSettings,
    pub prompts: PromptSettings,
    pub twiml: TwimlSettings,

    // Connection limits
    /// Maximum concurrent WebSocket connections
    /// Default: None (unlimited)
    pub max_websocket_connections: Option<usize>,
    /// Maximum connections per IP address
    /// Default: 100
    pub max_connections_per_ip: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            tls: None,
            public_url: None,
            openai_api_key: None,
            realtime: RealtimeSettings::default(),
            session: SessionSettings::default(),
            prompts: PromptSettings::default(),
            twiml: TwimlSettings::default(),
            max_websocket_connections: None,
            max_connections_per_ip: 100,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables over defaults.
    ///
    /// The .env file is loaded in `main` before this runs.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = merge::merge_config(None)?;
        validation::validate_server_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let yaml_config = YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        validation::validate_server_config(&config)?;
        Ok(config)
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if TLS is enabled
    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    pub fn has_openai_api_key(&self) -> bool {
        self.openai_api_key.is_some()
    }
}
