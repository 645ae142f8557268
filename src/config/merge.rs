//! Layering of defaults, environment and YAML into a [`ServerConfig`].

use std::path::PathBuf;
use std::time::Duration;

use super::env::{EnvConfig, parse_modalities};
use super::validation::validate_tls_paths;
use super::yaml::YamlConfig;
use super::{ApiKey, ConfigError, ServerConfig};
use crate::core::realtime::RealtimeAudioFormat;

/// Build a configuration from defaults, then environment, then YAML.
pub(super) fn merge_config(yaml: Option<YamlConfig>) -> Result<ServerConfig, ConfigError> {
    let env = EnvConfig::load()?;
    let yaml = yaml.unwrap_or_default();
    let mut config = ServerConfig::default();

    apply_env(&mut config, env)?;
    apply_yaml(&mut config, yaml)?;
    Ok(config)
}

fn apply_env(config: &mut ServerConfig, env: EnvConfig) -> Result<(), ConfigError> {
    if let Some(host) = env.host {
        config.host = host;
    }
    if let Some(port) = env.port {
        config.port = port;
    }
    config.tls = validate_tls_paths(env.tls_cert_path, env.tls_key_path)?;
    if env.public_url.is_some() {
        config.public_url = env.public_url;
    }
    if let Some(key) = env.openai_api_key {
        config.openai_api_key = Some(ApiKey::new(key));
    }

    let realtime = &mut config.realtime;
    if let Some(url) = env.realtime_url {
        realtime.url = url;
    }
    if let Some(model) = env.realtime_model {
        realtime.model = model;
    }
    if let Some(version) = env.protocol_version {
        realtime.protocol_version = version;
    }
    if let Some(timeout) = env.connect_timeout {
        realtime.connect_timeout = timeout;
    }
    if let Some(timeout) = env.close_timeout {
        realtime.close_timeout = timeout;
    }

    let session = &mut config.session;
    if let Some(voice) = env.voice {
        session.voice = voice;
    }
    if let Some(temperature) = env.temperature {
        session.temperature = temperature;
    }
    if let Some(format) = env.input_audio_format {
        session.input_audio_format = format;
    }
    if let Some(format) = env.output_audio_format {
        session.output_audio_format = format;
    }
    if let Some(modalities) = env.modalities {
        session.modalities = modalities;
    }

    if let Some(dir) = env.prompts_dir {
        config.prompts.dir = dir;
    }
    if let Some(name) = env.system_prompt {
        config.prompts.system_prompt = name;
    }
    if let Some(greeting) = env.twiml_greeting {
        config.twiml.greeting = greeting;
    }
    if let Some(voice) = env.twiml_voice {
        config.twiml.voice = voice;
    }

    if env.max_websocket_connections.is_some() {
        config.max_websocket_connections = env.max_websocket_connections;
    }
    if let Some(limit) = env.max_connections_per_ip {
        config.max_connections_per_ip = limit;
    }
    Ok(())
}

fn apply_yaml(config: &mut ServerConfig, yaml: YamlConfig) -> Result<(), ConfigError> {
    if let Some(server) = yaml.server {
        if let Some(host) = server.host {
            config.host = host;
        }
        if let Some(port) = server.port {
            config.port = port;
        }
        if server.public_url.is_some() {
            config.public_url = server.public_url;
        }
        if let Some(tls) = server.tls {
            let tls = validate_tls_paths(
                tls.cert_path.map(PathBuf::from),
                tls.key_path.map(PathBuf::from),
            )?;
            if tls.is_some() {
                config.tls = tls;
            }
        }
    }

    if let Some(realtime) = yaml.realtime {
        if let Some(key) = realtime.api_key {
            config.openai_api_key = Some(ApiKey::new(key));
        }
        if let Some(url) = realtime.url {
            config.realtime.url = url;
        }
        if let Some(model) = realtime.model {
            config.realtime.model = model;
        }
        if let Some(version) = realtime.protocol_version {
            config.realtime.protocol_version = version;
        }
        if let Some(secs) = realtime.connect_timeout_secs {
            config.realtime.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = realtime.close_timeout_secs {
            config.realtime.close_timeout = Duration::from_secs(secs);
        }
    }

    if let Some(session) = yaml.session {
        if let Some(voice) = session.voice {
            config.session.voice = voice;
        }
        if let Some(temperature) = session.temperature {
            config.session.temperature = temperature;
        }
        if let Some(format) = session.input_audio_format {
            config.session.input_audio_format =
                parse_format("session.input_audio_format", format)?;
        }
        if let Some(format) = session.output_audio_format {
            config.session.output_audio_format =
                parse_format("session.output_audio_format", format)?;
        }
        if let Some(modalities) = session.modalities {
            config.session.modalities =
                parse_modalities("session.modalities", modalities.iter().map(String::as_str))?;
        }
    }

    if let Some(prompts) = yaml.prompts {
        if let Some(dir) = prompts.dir {
            config.prompts.dir = PathBuf::from(dir);
        }
        if let Some(name) = prompts.system_prompt {
            config.prompts.system_prompt = name;
        }
    }

    if let Some(twiml) = yaml.twiml {
        if let Some(greeting) = twiml.greeting {
            config.twiml.greeting = greeting;
        }
        if let Some(voice) = twiml.voice {
            config.twiml.voice = voice;
        }
    }

    if let Some(security) = yaml.security {
        if security.max_websocket_connections.is_some() {
            config.max_websocket_connections = security.max_websocket_connections;
        }
        if let Some(limit) = security.max_connections_per_ip {
            config.max_connections_per_ip = limit;
        }
    }
    Ok(())
}

fn parse_format(key: &'static str, value: String) -> Result<RealtimeAudioFormat, ConfigError> {
    value
        .parse()
        .map_err(|reason| ConfigError::InvalidValue { key, value, reason })
}
