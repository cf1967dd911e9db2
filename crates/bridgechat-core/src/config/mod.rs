use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{defaults, endpoints, generation};
use crate::error::BridgeError;
use crate::llm::GeminiClient;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub llm: LlmSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub model: String,
    pub api_key_env: String,
    pub base_url: Option<String>,
    /// Replaces the built-in grounding instruction when set.
    pub system_instruction: Option<String>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: defaults::MODEL.to_string(),
            api_key_env: defaults::API_KEY_ENV.to_string(),
            base_url: None,
            system_instruction: None,
        }
    }
}

impl Settings {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(defaults::CONFIG_DIR)
            .join(defaults::CONFIG_FILE)
    }

    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Read settings from `path`, falling back to defaults when the file is
    /// missing or does not parse.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(settings) => settings,
                Err(e) => {
                    tracing::warn!("Ignoring invalid config at {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Could not read config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), BridgeError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| BridgeError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the API key from the environment variable specified in settings.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.llm.api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
    }

    pub fn base_url(&self) -> &str {
        self.llm
            .base_url
            .as_deref()
            .unwrap_or(endpoints::GEMINI_BASE_URL)
    }

    pub fn system_instruction(&self) -> &str {
        self.llm
            .system_instruction
            .as_deref()
            .unwrap_or(generation::SYSTEM_INSTRUCTION)
    }

    /// Build the Gemini client described by these settings. The key itself is
    /// resolved per request, so a missing variable is not an error here.
    pub fn build_client(&self) -> GeminiClient {
        GeminiClient::new(self.llm.api_key_env.clone())
            .with_model(self.llm.model.clone())
            .with_base_url(self.base_url())
            .with_system_instruction(self.system_instruction())
    }
}
