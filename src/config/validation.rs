//! Configuration validation logic.

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use super::{ConfigError, ServerConfig, TlsConfig};
use crate::core::realtime::{KNOWN_VOICES, Modality};

/// Validate a fully merged configuration.
pub(super) fn validate_server_config(config: &ServerConfig) -> Result<(), ConfigError> {
    validate_temperature(config.session.temperature)?;
    validate_modalities(&config.session.modalities)?;
    validate_voice(&config.session.voice)?;
    validate_timeout("realtime connect timeout", config.realtime.connect_timeout)?;
    validate_timeout("realtime close timeout", config.realtime.close_timeout)?;
    if let Some(public_url) = &config.public_url {
        validate_public_url(public_url)?;
    }
    if config.max_connections_per_ip == 0 {
        return Err(ConfigError::Validation(
            "max_connections_per_ip must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// TLS needs both paths or neither.
pub(super) fn validate_tls_paths(
    cert_path: Option<PathBuf>,
    key_path: Option<PathBuf>,
) -> Result<Option<TlsConfig>, ConfigError> {
    match (cert_path, key_path) {
        (Some(cert_path), Some(key_path)) => Ok(Some(TlsConfig {
            cert_path,
            key_path,
        })),
        (None, None) => Ok(None),
        _ => Err(ConfigError::Validation(
            "TLS requires both a certificate path and a key path".to_string(),
        )),
    }
}

pub(super) fn validate_temperature(temperature: f32) -> Result<(), ConfigError> {
    if !(0.0..=2.0).contains(&temperature) {
        return Err(ConfigError::Validation(format!(
            "temperature must be between 0.0 and 2.0, got {temperature}"
        )));
    }
    Ok(())
}

pub(super) fn validate_modalities(modalities: &[Modality]) -> Result<(), ConfigError> {
    if modalities.is_empty() {
        return Err(ConfigError::Validation(
            "at least one modality is required".to_string(),
        ));
    }
    Ok(())
}

fn validate_voice(voice: &str) -> Result<(), ConfigError> {
    if voice.trim().is_empty() {
        return Err(ConfigError::Validation("voice must not be empty".to_string()));
    }
    if !KNOWN_VOICES.contains(&voice) {
        warn!(voice, "Voice is not in the known voice list, passing it through");
    }
    Ok(())
}

fn validate_timeout(name: &str, timeout: Duration) -> Result<(), ConfigError> {
    if timeout.is_zero() {
        return Err(ConfigError::Validation(format!(
            "{name} must be greater than zero"
        )));
    }
    Ok(())
}

fn validate_public_url(public_url: &str) -> Result<(), ConfigError> {
    let url = url::Url::parse(public_url).map_err(|e| ConfigError::InvalidValue {
        key: "public_url",
        value: public_url.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https" | "ws" | "wss") {
        return Err(ConfigError::InvalidValue {
            key: "public_url",
            value: public_url.to_string(),
            reason: "scheme must be http, https, ws or wss".to_string(),
        });
    }
    Ok(())
}
