// tests/config_env.rs
//
// Settings resolution from process env, summarizer selection and scoring
// config files. Serialized because we mutate process env.

use std::env;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use serial_test::serial;

use likability_analyzer::analyze::build_summarizer;
use likability_analyzer::config::Settings;
use likability_analyzer::fetch::SignalHub;
use likability_analyzer::ScoringConfig;

const KEYS: &[&str] = &[
    "OPENAI_API_KEY",
    "NEWSAPI_KEY",
    "REDDIT_CLIENT_ID",
    "REDDIT_CLIENT_SECRET",
    "REDDIT_USER_AGENT",
    "CACHE_TTL_HOURS",
    "SUMMARIZER_MODEL",
    "LIKABILITY_CONFIG_PATH",
    "AI_CONFIG_PATH",
    "AI_TEST_MODE",
];

/// Small RAII helper to snapshot & restore env vars in each test.
struct EnvSnapshot {
    saved: Vec<(String, Option<String>)>,
}

impl EnvSnapshot {
    /// Clears every known key, then applies `pairs`.
    fn set(pairs: &[(&str, &str)]) -> Self {
        let saved = KEYS
            .iter()
            .map(|k| (k.to_string(), env::var(k).ok()))
            .collect();
        for k in KEYS {
            env::remove_var(k);
        }
        // never pick up a developer's real summarizer config
        env::set_var("AI_CONFIG_PATH", "does/not/exist.json");
        for (k, v) in pairs {
            env::set_var(k, v);
        }
        Self { saved }
    }
}

impl Drop for EnvSnapshot {
    fn drop(&mut self) {
        for (k, maybe_v) in self.saved.drain(..) {
            match maybe_v {
                Some(v) => env::set_var(&k, v),
                None => env::remove_var(&k),
            }
        }
    }
}

fn write_tmp(body: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    write!(f, "{body}").unwrap();
    f
}

#[test]
#[serial]
fn settings_read_from_process_env() {
    let _env = EnvSnapshot::set(&[
        ("NEWSAPI_KEY", " news-key "),
        ("CACHE_TTL_HOURS", "2"),
        ("REDDIT_USER_AGENT", "TestAgent/0.1"),
    ]);
    let s = Settings::from_env();
    assert_eq!(s.newsapi_key, "news-key");
    assert_eq!(s.cache_ttl, Duration::from_secs(7_200));
    assert_eq!(s.reddit_user_agent, "TestAgent/0.1");
    assert!(s.has_newsapi());
    assert!(!s.has_reddit());
    assert!(!s.has_openai());

    let status = serde_json::to_value(s.status()).unwrap();
    assert_eq!(
        status,
        serde_json::json!({"openai": false, "newsapi": true, "reddit": false, "rss": true})
    );
}

#[test]
#[serial]
fn hub_wires_rss_plus_credentialed_sources() {
    let _env = EnvSnapshot::set(&[]);
    assert_eq!(SignalHub::from_settings(&Settings::from_env()).len(), 1);

    let _env = EnvSnapshot::set(&[
        ("NEWSAPI_KEY", "k"),
        ("REDDIT_CLIENT_ID", "id"),
        ("REDDIT_CLIENT_SECRET", "secret"),
    ]);
    assert_eq!(SignalHub::from_settings(&Settings::from_env()).len(), 3);
}

#[test]
#[serial]
fn summarizer_selection_follows_env() {
    let _env = EnvSnapshot::set(&[("AI_TEST_MODE", "mock")]);
    assert_eq!(build_summarizer(&Settings::from_env()).provider_name(), "mock");

    let _env = EnvSnapshot::set(&[]);
    assert_eq!(
        build_summarizer(&Settings::from_env()).provider_name(),
        "disabled"
    );

    let _env = EnvSnapshot::set(&[("OPENAI_API_KEY", "sk-test")]);
    assert_eq!(
        build_summarizer(&Settings::from_env()).provider_name(),
        "openai"
    );
}

#[test]
#[serial]
fn summarizer_file_can_disable_provider() {
    let f = write_tmp(r#"{"enabled": false, "provider": "openai", "api_key": "ENV"}"#);
    let path = f.path().to_string_lossy().to_string();
    let _env = EnvSnapshot::set(&[("OPENAI_API_KEY", "sk-test")]);
    env::set_var("AI_CONFIG_PATH", &path);
    assert_eq!(
        build_summarizer(&Settings::from_env()).provider_name(),
        "disabled"
    );
}

#[test]
#[serial]
fn scoring_config_path_from_env() {
    let f = write_tmp("[weights]\nnews = 0.5\nsocial = 0.5\nrss = 0.0\nengagement = 0.0\ntrend = 0.0\n");
    let path = f.path().to_string_lossy().to_string();
    let _env = EnvSnapshot::set(&[("LIKABILITY_CONFIG_PATH", path.as_str())]);

    let s = Settings::from_env();
    let cfg = ScoringConfig::load_or_default(&s.config_path);
    assert_eq!(cfg.weights.news, 0.5);
    assert_eq!(cfg.weights.rss, 0.0);
    assert_eq!(cfg.thresholds, ScoringConfig::default().thresholds);
}

#[test]
fn scoring_config_missing_or_broken_falls_back() {
    let missing = ScoringConfig::load_or_default(Path::new("no/such/likability.toml"));
    assert_eq!(missing, ScoringConfig::default());

    let broken = write_tmp("[weights\nnews = ");
    assert_eq!(ScoringConfig::load_or_default(broken.path()), ScoringConfig::default());

    let negative = write_tmp("[weights]\nnews = -1.0\n");
    assert_eq!(
        ScoringConfig::load_or_default(negative.path()).weights,
        ScoringConfig::default().weights
    );
}

#[test]
fn shipped_config_matches_defaults() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/likability.toml");
    let cfg = ScoringConfig::load(&path).expect("shipped config parses");
    assert_eq!(cfg, ScoringConfig::default());
}
