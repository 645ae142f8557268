//! Environment variable loading.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::ConfigError;
use crate::core::realtime::{Modality, RealtimeAudioFormat};

/// Every variable this module reads.
pub(super) const ENV_KEYS: &[&str] = &[
    "HOST",
    "PORT",
    "TLS_CERT_PATH",
    "TLS_KEY_PATH",
    "PUBLIC_URL",
    "NGROK_URL",
    "OPENAI_API_KEY",
    "OPENAI_REALTIME_URL",
    "OPENAI_REALTIME_MODEL",
    "OPENAI_BETA_HEADER",
    "REALTIME_CONNECT_TIMEOUT_SECS",
    "REALTIME_CLOSE_TIMEOUT_SECS",
    "REALTIME_VOICE",
    "REALTIME_TEMPERATURE",
    "REALTIME_INPUT_AUDIO_FORMAT",
    "REALTIME_OUTPUT_AUDIO_FORMAT",
    "REALTIME_MODALITIES",
    "PROMPTS_DIR",
    "SYSTEM_PROMPT_NAME",
    "TWIML_GREETING",
    "TWIML_VOICE",
    "MAX_WEBSOCKET_CONNECTIONS",
    "MAX_CONNECTIONS_PER_IP",
];

/// Values found in the environment. `None` means "not set".
#[derive(Debug, Default)]
pub(super) struct EnvConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub tls_cert_path: Option<PathBuf>,
    pub tls_key_path: Option<PathBuf>,
    pub public_url: Option<String>,
    pub openai_api_key: Option<String>,
    pub realtime_url: Option<String>,
    pub realtime_model: Option<String>,
    pub protocol_version: Option<String>,
    pub connect_timeout: Option<Duration>,
    pub close_timeout: Option<Duration>,
    pub voice: Option<String>,
    pub temperature: Option<f32>,
    pub input_audio_format: Option<RealtimeAudioFormat>,
    pub output_audio_format: Option<RealtimeAudioFormat>,
    pub modalities: Option<Vec<Modality>>,
    pub prompts_dir: Option<PathBuf>,
    pub system_prompt: Option<String>,
    pub twiml_greeting: Option<String>,
    pub twiml_voice: Option<String>,
    pub max_websocket_connections: Option<usize>,
    pub max_connections_per_ip: Option<u32>,
}

impl EnvConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            host: var("HOST"),
            port: parse("PORT")?,
            tls_cert_path: var("TLS_CERT_PATH").map(PathBuf::from),
            tls_key_path: var("TLS_KEY_PATH").map(PathBuf::from),
            public_url: var("PUBLIC_URL").or_else(|| var("NGROK_URL")),
            openai_api_key: var("OPENAI_API_KEY"),
            realtime_url: var("OPENAI_REALTIME_URL"),
            realtime_model: var("OPENAI_REALTIME_MODEL"),
            protocol_version: var("OPENAI_BETA_HEADER"),
            connect_timeout: parse::<u64>("REALTIME_CONNECT_TIMEOUT_SECS")?
                .map(Duration::from_secs),
            close_timeout: parse::<u64>("REALTIME_CLOSE_TIMEOUT_SECS")?.map(Duration::from_secs),
            voice: var("REALTIME_VOICE"),
            temperature: parse("REALTIME_TEMPERATURE")?,
            input_audio_format: parse("REALTIME_INPUT_AUDIO_FORMAT")?,
            output_audio_format: parse("REALTIME_OUTPUT_AUDIO_FORMAT")?,
            modalities: var("REALTIME_MODALITIES")
                .map(|raw| parse_modalities("REALTIME_MODALITIES", raw.split(',')))
                .transpose()?,
            prompts_dir: var("PROMPTS_DIR").map(PathBuf::from),
            system_prompt: var("SYSTEM_PROMPT_NAME"),
            twiml_greeting: var("TWIML_GREETING"),
            twiml_voice: var("TWIML_VOICE"),
            max_websocket_connections: parse("MAX_WEBSOCKET_CONNECTIONS")?,
            max_connections_per_ip: parse("MAX_CONNECTIONS_PER_IP")?,
        })
    }
}

/// Non-empty, trimmed value of `key`.
fn var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse<T>(key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    var(key)
        .map(|value| {
            value.parse::<T>().map_err(|e| ConfigError::InvalidValue {
                key,
                reason: e.to_string(),
                value,
            })
        })
        .transpose()
}

/// Parse a list of modality names, skipping blanks.
pub(super) fn parse_modalities<'a>(
    key: &'static str,
    items: impl IntoIterator<Item = &'a str>,
) -> Result<Vec<Modality>, ConfigError> {
    items
        .into_iter()
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse::<Modality>()
                .map_err(|reason| ConfigError::InvalidValue {
                    key,
                    value: item.to_string(),
                    reason,
                })
        })
        .collect()
}
