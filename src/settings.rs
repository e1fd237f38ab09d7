//! Global settings carried inside every snapshot.
//!
//! Every field has a default so that partial or older settings objects
//! normalize instead of failing to load.

use serde::{Deserialize, Serialize};

/// Text-generation backend used by the pipeline collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LlmProvider {
    #[default]
    Stub,
    Ollama,
    OpenaiCompatible,
}

/// Text-generation settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LlmSettings {
    pub enabled: bool,
    pub provider: LlmProvider,
    pub model: String,
    pub base_url: String,
    pub api_key: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: LlmProvider::Stub,
            model: "local-stub".to_string(),
            base_url: "http://localhost:11434".to_string(),
            api_key: String::new(),
        }
    }
}

/// Editor presentation toggles.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UiSettings {
    pub focus_mode: bool,
    pub typewriter_mode: bool,
    pub export_theme_id: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            focus_mode: false,
            typewriter_mode: false,
            export_theme_id: "classic".to_string(),
        }
    }
}

/// Application-wide settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub llm: LlmSettings,
    pub ui: UiSettings,
}
