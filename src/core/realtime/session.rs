//! Session configuration builder.

use super::config::{DEFAULT_TEMPERATURE, Modality, RealtimeAudioFormat};
use super::messages::SessionConfig;
use crate::config::SessionSettings;

/// Holds the per-deployment session defaults and stamps out one
/// [`SessionConfig`] per call.
///
/// `build` is pure: no I/O, no clock, no randomness. The prompt text is
/// loaded by the caller beforehand.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfigBuilder {
    pub input_audio_format: RealtimeAudioFormat,
    pub output_audio_format: RealtimeAudioFormat,
    pub modalities: Vec<Modality>,
    pub temperature: f32,
}

impl Default for SessionConfigBuilder {
    fn default() -> Self {
        Self {
            input_audio_format: RealtimeAudioFormat::G711Ulaw,
            output_audio_format: RealtimeAudioFormat::G711Ulaw,
            modalities: Modality::defaults(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl SessionConfigBuilder {
    /// Builder seeded from server configuration.
    pub fn from_settings(settings: &SessionSettings) -> Self {
        Self {
            input_audio_format: settings.input_audio_format,
            output_audio_format: settings.output_audio_format,
            modalities: settings.modalities.clone(),
            temperature: settings.temperature,
        }
    }

    pub fn build(&self, prompt_text: &str, voice: &str) -> SessionConfig {
        SessionConfig {
            input_audio_format: self.input_audio_format,
            output_audio_format: self.output_audio_format,
            voice: voice.to_string(),
            instructions: prompt_text.to_string(),
            modalities: self.modalities.clone(),
            temperature: self.temperature,
        }
    }
}
