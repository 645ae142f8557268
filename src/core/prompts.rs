//! Instruction text providers.
//!
//! The relay asks for a prompt by name once per session. A missing or
//! unreadable prompt is never fatal: the provider logs a warning and the
//! session runs with empty instructions.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

/// Loads assistant instructions by name.
#[async_trait]
pub trait PromptProvider: Send + Sync {
    /// Instruction text for `name`, or an empty string when unavailable.
    async fn load(&self, name: &str) -> String;
}

/// Reads `<dir>/<name>.txt` from disk.
#[derive(Debug, Clone)]
pub struct FilePromptProvider {
    dir: PathBuf,
}

impl FilePromptProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> Option<PathBuf> {
        // Names are plain file stems, never paths
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return None;
        }
        Some(self.dir.join(format!("{name}.txt")))
    }
}

#[async_trait]
impl PromptProvider for FilePromptProvider {
    async fn load(&self, name: &str) -> String {
        let Some(path) = self.path_for(name) else {
            warn!(prompt = name, "Invalid prompt name, using empty instructions");
            return String::new();
        };

        match tokio::fs::read_to_string(&path).await {
            Ok(text) => {
                let text = text.trim().to_string();
                debug!(prompt = name, chars = text.len(), "Loaded prompt");
                text
            }
            Err(e) => {
                warn!(
                    prompt = name,
                    path = %path.display(),
                    error = %e,
                    "Could not load prompt, using empty instructions"
                );
                String::new()
            }
        }
    }
}
