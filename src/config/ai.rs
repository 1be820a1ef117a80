// src/config/ai.rs
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use super::settings::Settings;

fn default_daily_limit() -> u32 {
    200
}
fn default_timeout_secs() -> u64 {
    20
}

/// Summarizer configuration. Read from `config/ai.json` when present,
/// otherwise derived from the environment settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    pub enabled: bool,
    /// "openai" (case-insensitive)
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    /// "ENV" means: use OPENAI_API_KEY from the environment settings.
    #[serde(default)]
    pub api_key: String,
    /// Real provider calls allowed per UTC day.
    #[serde(default = "default_daily_limit")]
    pub daily_limit: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl SummarizerConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            enabled: settings.has_openai(),
            provider: "openai".to_string(),
            model: Some(settings.summarizer_model.clone()),
            api_key: settings.openai_api_key.clone(),
            daily_limit: default_daily_limit(),
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P, settings: &Settings) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)?;
        let mut cfg: SummarizerConfig = serde_json::from_str(&data)?;

        cfg.provider = cfg.provider.to_lowercase();
        if cfg.provider != "openai" {
            anyhow::bail!("Unsupported summarizer provider in config: {}", cfg.provider);
        }

        if cfg.api_key.trim().is_empty() || cfg.api_key.trim().eq_ignore_ascii_case("env") {
            if settings.openai_api_key.is_empty() && cfg.enabled {
                anyhow::bail!("Missing OPENAI_API_KEY env var");
            }
            cfg.api_key = settings.openai_api_key.clone();
        }
        if cfg.model.as_deref().map_or(true, |m| m.trim().is_empty()) {
            cfg.model = Some(settings.summarizer_model.clone());
        }
        if cfg.timeout_secs == 0 {
            cfg.timeout_secs = default_timeout_secs();
        }

        Ok(cfg)
    }

    /// File config if it exists and parses, else environment-derived.
    pub fn resolve(settings: &Settings) -> Self {
        let path = &settings.ai_config_path;
        if !path.exists() {
            return Self::from_settings(settings);
        }
        match Self::load_from_file(path, settings) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "summarizer config unusable, using env");
                Self::from_settings(settings)
            }
        }
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(super::settings::DEFAULT_SUMMARIZER_MODEL)
    }
}
