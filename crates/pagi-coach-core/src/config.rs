//! Coach configuration loaded from defaults, an optional TOML file and the environment.
//!
//! Precedence (lowest to highest): built-in defaults < `PAGI_COACH_CONFIG` file
//! (default `config/coach.toml`, skipped when absent) < environment variables.
//!
//! | Env | Required | Default |
//! |-----|----------|---------|
//! | OPENAI_API_KEY | yes | |
//! | PINECONE_API_KEY | yes | |
//! | ZOOM_API_KEY | yes | |
//! | ZOOM_API_SECRET | yes | |
//! | SECRET_TOKEN | no | `change-me` (placeholder, override it) |
//! | OPENAI_MODEL | no | `gpt-3.5-turbo` |
//! | OPENAI_EMBEDDING_MODEL | no | `text-embedding-ada-002` |
//! | OPENAI_API_BASE | no | `https://api.openai.com/v1` |
//! | PINECONE_INDEX_HOST | no | unset (context index unavailable) |
//! | ZOOM_API_BASE | no | `https://api.zoom.us/v2` |
//! | BIND_ADDR | no | `127.0.0.1:8000` |
//! | DATA_DIR | no | `./data` |
//! | CONTEXT_CACHE_CAPACITY | no | `128` |
//! | PROVIDER_TIMEOUT_SECS | no | `60` |

use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Bearer secret used when `SECRET_TOKEN` is not set. Never acceptable in a real deployment.
pub const PLACEHOLDER_SECRET_TOKEN: &str = "change-me";

const DEFAULT_CONFIG_PATH: &str = "config/coach.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required configuration: {}", .0.join(", "))]
    MissingKeys(Vec<&'static str>),
    #[error("invalid configuration: {0}")]
    Source(#[from] config::ConfigError),
}

/// Shape of the merged sources before required keys are checked.
#[derive(Deserialize)]
struct RawConfig {
    openai_api_key: Option<String>,
    pinecone_api_key: Option<String>,
    zoom_api_key: Option<String>,
    zoom_api_secret: Option<String>,
    secret_token: Option<String>,
    pinecone_index_host: Option<String>,
    openai_model: String,
    openai_embedding_model: String,
    openai_api_base: String,
    zoom_api_base: String,
    bind_addr: String,
    data_dir: String,
    context_cache_capacity: usize,
    provider_timeout_secs: u64,
}

/// Process configuration. Secrets are redacted from `Debug` output.
#[derive(Clone)]
pub struct CoachConfig {
    pub openai_api_key: String,
    pub openai_api_base: String,
    pub openai_model: String,
    pub openai_embedding_model: String,
    pub pinecone_api_key: String,
    pub pinecone_index_host: Option<String>,
    pub zoom_api_key: String,
    pub zoom_api_secret: String,
    pub zoom_api_base: String,
    pub secret_token: String,
    pub bind_addr: String,
    pub data_dir: PathBuf,
    pub context_cache_capacity: usize,
    pub provider_timeout: Duration,
}

impl CoachConfig {
    /// Load from `PAGI_COACH_CONFIG` (or `config/coach.toml`) and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("PAGI_COACH_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::build(Some(Path::new(&config_path)), config::Environment::default())
    }

    /// Load from an explicit variable map instead of the process environment (no file source).
    pub fn from_env_map(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::build(None, config::Environment::default().source(Some(vars)))
    }

    fn build(file: Option<&Path>, env: config::Environment) -> Result<Self, ConfigError> {
        let builder = config::Config::builder()
            .set_default("openai_model", "gpt-3.5-turbo")?
            .set_default("openai_embedding_model", "text-embedding-ada-002")?
            .set_default("openai_api_base", "https://api.openai.com/v1")?
            .set_default("zoom_api_base", "https://api.zoom.us/v2")?
            .set_default("bind_addr", "127.0.0.1:8000")?
            .set_default("data_dir", "./data")?
            .set_default("context_cache_capacity", 128_i64)?
            .set_default("provider_timeout_secs", 60_i64)?;

        let builder = match file {
            Some(path) if path.exists() => builder
                .add_source(config::File::from(path).format(config::FileFormat::Toml)),
            _ => builder,
        };

        let raw: RawConfig = builder.add_source(env).build()?.try_deserialize()?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let mut missing = Vec::new();
        let mut require = |value: Option<String>, key: &'static str| match non_empty(value) {
            Some(v) => v,
            None => {
                missing.push(key);
                String::new()
            }
        };
        let openai_api_key = require(raw.openai_api_key, "OPENAI_API_KEY");
        let pinecone_api_key = require(raw.pinecone_api_key, "PINECONE_API_KEY");
        let zoom_api_key = require(raw.zoom_api_key, "ZOOM_API_KEY");
        let zoom_api_secret = require(raw.zoom_api_secret, "ZOOM_API_SECRET");
        if !missing.is_empty() {
            return Err(ConfigError::MissingKeys(missing));
        }

        Ok(Self {
            openai_api_key,
            openai_api_base: raw.openai_api_base.trim().trim_end_matches('/').to_string(),
            openai_model: raw.openai_model.trim().to_string(),
            openai_embedding_model: raw.openai_embedding_model.trim().to_string(),
            pinecone_api_key,
            pinecone_index_host: non_empty(raw.pinecone_index_host),
            zoom_api_key,
            zoom_api_secret,
            zoom_api_base: raw.zoom_api_base.trim().trim_end_matches('/').to_string(),
            secret_token: non_empty(raw.secret_token)
                .unwrap_or_else(|| PLACEHOLDER_SECRET_TOKEN.to_string()),
            bind_addr: raw.bind_addr.trim().to_string(),
            data_dir: PathBuf::from(raw.data_dir.trim()),
            context_cache_capacity: raw.context_cache_capacity,
            provider_timeout: Duration::from_secs(raw.provider_timeout_secs),
        })
    }

    /// True when the bearer secret was never overridden.
    pub fn uses_placeholder_token(&self) -> bool {
        self.secret_token == PLACEHOLDER_SECRET_TOKEN
    }
}

impl fmt::Debug for CoachConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const REDACTED: &str = "<redacted>";
        f.debug_struct("CoachConfig")
            .field("openai_api_key", &REDACTED)
            .field("openai_api_base", &self.openai_api_base)
            .field("openai_model", &self.openai_model)
            .field("openai_embedding_model", &self.openai_embedding_model)
            .field("pinecone_api_key", &REDACTED)
            .field("pinecone_index_host", &self.pinecone_index_host)
            .field("zoom_api_key", &REDACTED)
            .field("zoom_api_secret", &REDACTED)
            .field("zoom_api_base", &self.zoom_api_base)
            .field("secret_token", &REDACTED)
            .field("bind_addr", &self.bind_addr)
            .field("data_dir", &self.data_dir)
            .field("context_cache_capacity", &self.context_cache_capacity)
            .field("provider_timeout", &self.provider_timeout)
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required_vars() -> HashMap<String, String> {
        [
            ("OPENAI_API_KEY", "sk-test"),
            ("PINECONE_API_KEY", "pc-test"),
            ("ZOOM_API_KEY", "zoom-key"),
            ("ZOOM_API_SECRET", "zoom-secret"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn defaults_apply_when_only_required_keys_are_set() {
        let cfg = CoachConfig::from_env_map(required_vars()).unwrap();
        assert_eq!(cfg.openai_api_key, "sk-test");
        assert_eq!(cfg.openai_model, "gpt-3.5-turbo");
        assert_eq!(cfg.bind_addr, "127.0.0.1:8000");
        assert_eq!(cfg.data_dir, PathBuf::from("./data"));
        assert_eq!(cfg.context_cache_capacity, 128);
        assert_eq!(cfg.provider_timeout, Duration::from_secs(60));
        assert!(cfg.pinecone_index_host.is_none());
        assert!(cfg.uses_placeholder_token());
    }

    #[test]
    fn missing_required_keys_are_all_reported() {
        let mut vars = required_vars();
        vars.remove("PINECONE_API_KEY");
        vars.insert("ZOOM_API_SECRET".to_string(), "   ".to_string());
        match CoachConfig::from_env_map(vars) {
            Err(ConfigError::MissingKeys(keys)) => {
                assert_eq!(keys, vec!["PINECONE_API_KEY", "ZOOM_API_SECRET"]);
            }
            other => panic!("expected MissingKeys, got {:?}", other),
        }
    }

    #[test]
    fn overrides_are_read_from_environment() {
        let mut vars = required_vars();
        vars.insert("SECRET_TOKEN".to_string(), "s3cret".to_string());
        vars.insert("CONTEXT_CACHE_CAPACITY".to_string(), "16".to_string());
        vars.insert("PINECONE_INDEX_HOST".to_string(), "coach-abc.svc.pinecone.io".to_string());
        vars.insert("OPENAI_API_BASE".to_string(), "http://localhost:9000/v1/".to_string());
        let cfg = CoachConfig::from_env_map(vars).unwrap();
        assert_eq!(cfg.secret_token, "s3cret");
        assert!(!cfg.uses_placeholder_token());
        assert_eq!(cfg.context_cache_capacity, 16);
        assert_eq!(cfg.pinecone_index_host.as_deref(), Some("coach-abc.svc.pinecone.io"));
        assert_eq!(cfg.openai_api_base, "http://localhost:9000/v1");
    }

    #[test]
    fn debug_output_hides_secrets() {
        let cfg = CoachConfig::from_env_map(required_vars()).unwrap();
        let printed = format!("{:?}", cfg);
        assert!(!printed.contains("sk-test"));
        assert!(!printed.contains("zoom-secret"));
        assert!(printed.contains("<redacted>"));
    }
}
