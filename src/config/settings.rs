// src/config/settings.rs
//! Process settings resolved once at startup from the environment (after
//! `dotenvy::dotenv()` has loaded `.env` in local/dev runs).

use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::DEFAULT_TTL_SECS;

pub const DEFAULT_CONFIG_PATH: &str = "config/likability.toml";
pub const DEFAULT_AI_CONFIG_PATH: &str = "config/ai.json";
pub const DEFAULT_REDDIT_USER_AGENT: &str = "LikabilityBot/1.0";
pub const DEFAULT_SUMMARIZER_MODEL: &str = "gpt-4o-mini";
/// `CACHE_TTL_HOURS` above this is clamped.
pub const MAX_TTL_HOURS: u64 = 24 * 365;

#[derive(Debug, Clone)]
pub struct Settings {
    pub openai_api_key: String,
    pub newsapi_key: String,
    pub reddit_client_id: String,
    pub reddit_client_secret: String,
    pub reddit_user_agent: String,
    pub cache_ttl: Duration,
    pub summarizer_model: String,
    pub config_path: PathBuf,
    pub ai_config_path: PathBuf,
    /// `AI_TEST_MODE=mock`: deterministic summarizer, no network.
    pub ai_mock: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Resolve settings through an arbitrary key lookup (env, map in tests).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).unwrap_or_default();

        let ttl_hours = lookup("CACHE_TTL_HOURS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|h| *h > 0);
        let cache_ttl = match ttl_hours {
            Some(h) => Duration::from_secs(h.min(MAX_TTL_HOURS) * 3600),
            None => Duration::from_secs(DEFAULT_TTL_SECS),
        };

        let non_empty_or = |k: &str, default: &str| {
            let v = get(k);
            if v.is_empty() {
                default.to_string()
            } else {
                v
            }
        };

        Self {
            openai_api_key: get("OPENAI_API_KEY"),
            newsapi_key: get("NEWSAPI_KEY"),
            reddit_client_id: get("REDDIT_CLIENT_ID"),
            reddit_client_secret: get("REDDIT_CLIENT_SECRET"),
            reddit_user_agent: non_empty_or("REDDIT_USER_AGENT", DEFAULT_REDDIT_USER_AGENT),
            cache_ttl,
            summarizer_model: non_empty_or("SUMMARIZER_MODEL", DEFAULT_SUMMARIZER_MODEL),
            config_path: PathBuf::from(non_empty_or("LIKABILITY_CONFIG_PATH", DEFAULT_CONFIG_PATH)),
            ai_config_path: PathBuf::from(non_empty_or("AI_CONFIG_PATH", DEFAULT_AI_CONFIG_PATH)),
            ai_mock: get("AI_TEST_MODE").eq_ignore_ascii_case("mock"),
        }
    }

    pub fn has_openai(&self) -> bool {
        !self.openai_api_key.is_empty()
    }

    pub fn has_newsapi(&self) -> bool {
        !self.newsapi_key.is_empty()
    }

    pub fn has_reddit(&self) -> bool {
        !self.reddit_client_id.is_empty() && !self.reddit_client_secret.is_empty()
    }

    pub fn sources(&self) -> SourcesConfig {
        SourcesConfig {
            news_enabled: self.has_newsapi(),
            social_enabled: self.has_reddit(),
        }
    }

    pub fn status(&self) -> ConfigStatus {
        ConfigStatus {
            openai: self.has_openai(),
            newsapi: self.has_newsapi(),
            reddit: self.has_reddit(),
            rss: true,
        }
    }
}

/// Which optional fetchers get wired. RSS needs no credentials and is always on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourcesConfig {
    pub news_enabled: bool,
    pub social_enabled: bool,
}

/// Client-facing view of configured sources, served by `/api/config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConfigStatus {
    pub openai: bool,
    pub newsapi: bool,
    pub reddit: bool,
    pub rss: bool,
}
