use serde::Deserialize;
use std::path::Path;

use super::ConfigError;

/// Complete YAML configuration structure
///
/// This structure represents the full configuration that can be loaded from a YAML file.
/// All fields are optional to allow partial configuration. Values here override
/// environment variables.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 5000
///   public_url: "https://abc123.ngrok.app"
///   tls:
///     cert_path: "/etc/voxbridge/cert.pem"
///     key_path: "/etc/voxbridge/key.pem"
///
/// realtime:
///   api_key: "sk-..."
///   url: "wss://api.openai.com/v1/realtime"
///   model: "gpt-4o-realtime-preview-2024-10-01"
///   protocol_version: "realtime=v1"
///   connect_timeout_secs: 10
///   close_timeout_secs: 2
///
/// session:
///   voice: "alloy"
///   temperature: 0.8
///   input_audio_format: "g711_ulaw"
///   output_audio_format: "g711_ulaw"
///   modalities: ["text", "audio"]
///
/// prompts:
///   dir: "prompts"
///   system_prompt: "system_prompt"
///
/// twiml:
///   greeting: "Connecting you to the AI voice assistant. You may start talking."
///   voice: "alice"
///
/// security:
///   max_websocket_connections: 1000
///   max_connections_per_ip: 100
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub realtime: Option<RealtimeYaml>,
    pub session: Option<SessionYaml>,
    pub prompts: Option<PromptsYaml>,
    pub twiml: Option<TwimlYaml>,
    pub security: Option<SecurityYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub public_url: Option<String>,
    pub tls: Option<TlsYaml>,
}

/// TLS configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TlsYaml {
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

/// Realtime endpoint configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RealtimeYaml {
    pub api_key: Option<String>,
    pub url: Option<String>,
    pub model: Option<String>,
    pub protocol_version: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    pub close_timeout_secs: Option<u64>,
}

/// Session defaults from YAML
///
/// Audio formats are kept as strings so that aliases (`mulaw`, `pcm`) and
/// error messages match the environment variable path.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SessionYaml {
    pub voice: Option<String>,
    pub temperature: Option<f32>,
    pub input_audio_format: Option<String>,
    pub output_audio_format: Option<String>,
    pub modalities: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PromptsYaml {
    pub dir: Option<String>,
    pub system_prompt: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TwimlYaml {
    pub greeting: Option<String>,
    pub voice: Option<String>,
}

/// Security configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SecurityYaml {
    /// Maximum concurrent WebSocket connections
    pub max_websocket_connections: Option<usize>,
    /// Maximum connections per IP address
    pub max_connections_per_ip: Option<u32>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be read
    /// - The YAML is malformed
    /// - Required fields have invalid types
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: YamlConfig = serde_yaml::from_str(&contents)?;
        Ok(config)
    }
}
