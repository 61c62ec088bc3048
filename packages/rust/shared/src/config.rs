//! Application configuration for ArticleSmith.
//!
//! Lookup order: an explicit `--config` path, `./articlesmith.toml`, then
//! `~/.articlesmith/articlesmith.toml`. Missing files fall back to defaults.
//! The publishing token is never stored in the file, only the name of the
//! environment variable holding it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ArticleSmithError, Result};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "articlesmith.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".articlesmith";

// ---------------------------------------------------------------------------
// Config structs (matching articlesmith.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Data file locations.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Language-model service settings.
    #[serde(default)]
    pub model: ModelSettings,

    /// Publishing API settings.
    #[serde(default)]
    pub publisher: PublisherSettings,

    /// Batch pacing.
    #[serde(default)]
    pub batch: BatchSettings,
}

/// `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_persona_csv")]
    pub persona_csv: PathBuf,
    #[serde(default = "default_keyword_csv")]
    pub keyword_csv: PathBuf,
    #[serde(default = "default_article_csv")]
    pub article_csv: PathBuf,
    /// JSON array of `{id, name, slug}` category entries.
    #[serde(default = "default_catalog")]
    pub catalog: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            persona_csv: default_persona_csv(),
            keyword_csv: default_keyword_csv(),
            article_csv: default_article_csv(),
            catalog: default_catalog(),
        }
    }
}

fn default_persona_csv() -> PathBuf {
    "data/personas.csv".into()
}
fn default_keyword_csv() -> PathBuf {
    "data/keywords.csv".into()
}
fn default_article_csv() -> PathBuf {
    "data/articles.csv".into()
}
fn default_catalog() -> PathBuf {
    "data/categories.json".into()
}

/// `[model]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Base URL of the Ollama-compatible service.
    #[serde(default = "default_model_base_url")]
    pub base_url: String,

    /// Model used for the first-pass draft.
    #[serde(default = "default_generation_model")]
    pub generation_model: String,

    /// Model used for SEO optimization.
    #[serde(default = "default_optimization_model")]
    pub optimization_model: String,

    /// Per-request timeout.
    #[serde(default = "default_model_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            base_url: default_model_base_url(),
            generation_model: default_generation_model(),
            optimization_model: default_optimization_model(),
            timeout_secs: default_model_timeout(),
            temperature: default_temperature(),
            top_p: default_top_p(),
        }
    }
}

fn default_model_base_url() -> String {
    "http://localhost:11434".into()
}
fn default_generation_model() -> String {
    "qwen2.5:14b".into()
}
fn default_optimization_model() -> String {
    "qwen2.5:14b".into()
}
fn default_model_timeout() -> u64 {
    120
}
fn default_temperature() -> f32 {
    0.7
}
fn default_top_p() -> f32 {
    0.9
}

/// `[publisher]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherSettings {
    /// Article creation endpoint (POST).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Health check endpoint (GET).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_endpoint: Option<String>,

    /// Name of the env var holding the bearer token (never store the token itself).
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Simulate successful publication without any network access.
    #[serde(default)]
    pub mock: bool,

    #[serde(default = "default_publish_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_health_timeout")]
    pub health_timeout_secs: u64,
}

impl Default for PublisherSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            health_endpoint: None,
            token_env: default_token_env(),
            mock: false,
            timeout_secs: default_publish_timeout(),
            health_timeout_secs: default_health_timeout(),
        }
    }
}

fn default_token_env() -> String {
    "ARTICLE_API_TOKEN".into()
}
fn default_publish_timeout() -> u64 {
    30
}
fn default_health_timeout() -> u64 {
    10
}

/// `[batch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSettings {
    /// Pause between successive generation tasks.
    #[serde(default = "default_generate_delay")]
    pub generate_delay_ms: u64,

    /// Pause between successive publish calls.
    #[serde(default = "default_publish_delay")]
    pub publish_delay_ms: u64,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            generate_delay_ms: default_generate_delay(),
            publish_delay_ms: default_publish_delay(),
        }
    }
}

fn default_generate_delay() -> u64 {
    2000
}
fn default_publish_delay() -> u64 {
    1000
}

// ---------------------------------------------------------------------------
// Runtime configs (derived once, passed into constructors)
// ---------------------------------------------------------------------------

/// Runtime settings for the model clients.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub base_url: String,
    pub generation_model: String,
    pub optimization_model: String,
    pub timeout: Duration,
    pub temperature: f32,
    pub top_p: f32,
}

impl From<&AppConfig> for ModelConfig {
    fn from(config: &AppConfig) -> Self {
        let model = &config.model;
        Self {
            base_url: model.base_url.trim_end_matches('/').to_string(),
            generation_model: model.generation_model.clone(),
            optimization_model: model.optimization_model.clone(),
            timeout: Duration::from_secs(model.timeout_secs),
            temperature: model.temperature,
            top_p: model.top_p,
        }
    }
}

/// Runtime settings for the publisher, with the token already read from the environment.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    pub endpoint: Option<String>,
    pub health_endpoint: Option<String>,
    pub token: Option<String>,
    pub mock: bool,
    pub timeout: Duration,
    pub health_timeout: Duration,
}

impl From<&AppConfig> for PublisherConfig {
    fn from(config: &AppConfig) -> Self {
        let publisher = &config.publisher;
        let token = std::env::var(&publisher.token_env)
            .ok()
            .filter(|v| !v.is_empty());
        Self {
            endpoint: publisher.endpoint.clone().filter(|s| !s.is_empty()),
            health_endpoint: publisher.health_endpoint.clone().filter(|s| !s.is_empty()),
            token,
            mock: publisher.mock,
            timeout: Duration::from_secs(publisher.timeout_secs),
            health_timeout: Duration::from_secs(publisher.health_timeout_secs),
        }
    }
}

/// Runtime pacing for the batch drivers.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub generate_delay: Duration,
    pub publish_delay: Duration,
}

impl From<&AppConfig> for BatchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            generate_delay: Duration::from_millis(config.batch.generate_delay_ms),
            publish_delay: Duration::from_millis(config.batch.publish_delay_ms),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.articlesmith/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ArticleSmithError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the user config file (`~/.articlesmith/articlesmith.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config.
///
/// An explicit path must exist. Without one, `./articlesmith.toml` and then the
/// user config file are tried; defaults are returned if neither exists.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(ArticleSmithError::config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        return load_config_from(path);
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return load_config_from(&local);
    }

    let path = config_file_path()?;
    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load and validate the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ArticleSmithError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        ArticleSmithError::config(format!("failed to parse {}: {e}", path.display()))
    })?;

    validate_config(&config)?;
    tracing::debug!(?path, "loaded config");
    Ok(config)
}

/// Check that every configured URL parses.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    check_url("model.base_url", &config.model.base_url)?;
    if let Some(endpoint) = &config.publisher.endpoint {
        check_url("publisher.endpoint", endpoint)?;
    }
    if let Some(endpoint) = &config.publisher.health_endpoint {
        check_url("publisher.health_endpoint", endpoint)?;
    }
    Ok(())
}

fn check_url(key: &str, value: &str) -> Result<()> {
    Url::parse(value)
        .map(|_| ())
        .map_err(|e| ArticleSmithError::config(format!("{key} is not a valid URL '{value}': {e}")))
}

/// Write a default config file. Defaults to the user config path.
/// Returns the path to the created file.
pub fn init_config(target: Option<&Path>) -> Result<PathBuf> {
    let path = match target {
        Some(p) => p.to_path_buf(),
        None => config_file_path()?,
    };
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| ArticleSmithError::io(dir, e))?;
    }

    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ArticleSmithError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ArticleSmithError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("article_csv"));
        assert!(toml_str.contains("ARTICLE_API_TOKEN"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.model.timeout_secs, 120);
        assert_eq!(parsed.batch.generate_delay_ms, 2000);
        assert_eq!(parsed.batch.publish_delay_ms, 1000);
    }

    #[test]
    fn partial_config_uses_defaults() {
        let toml_str = r#"
[publisher]
endpoint = "https://example.com/api/articles"
mock = true
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert!(config.publisher.mock);
        assert_eq!(config.publisher.timeout_secs, 30);
        assert_eq!(config.publisher.health_timeout_secs, 10);
        assert_eq!(config.model.base_url, "http://localhost:11434");
    }

    #[test]
    fn runtime_configs_from_app_config() {
        let mut app = AppConfig::default();
        app.model.base_url = "http://localhost:11434/".into();

        let model = ModelConfig::from(&app);
        assert_eq!(model.base_url, "http://localhost:11434");
        assert_eq!(model.timeout, Duration::from_secs(120));

        let batch = BatchConfig::from(&app);
        assert_eq!(batch.generate_delay, Duration::from_millis(2000));
        assert_eq!(batch.publish_delay, Duration::from_millis(1000));
    }

    #[test]
    fn publisher_token_read_from_named_env_var() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.publisher.token_env = "AS_TEST_NONEXISTENT_TOKEN_12345".into();
        let publisher = PublisherConfig::from(&config);
        assert!(publisher.token.is_none());
        assert!(!publisher.mock);
    }

    #[test]
    fn invalid_url_rejected() {
        let mut config = AppConfig::default();
        config.publisher.endpoint = Some("not a url".into());
        let err = validate_config(&config).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("publisher.endpoint"));
    }

    #[test]
    fn explicit_missing_path_is_config_error() {
        let path = std::env::temp_dir().join(format!("as_missing_{}.toml", uuid::Uuid::now_v7()));
        let err = load_config(Some(&path)).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn init_then_load() {
        let path = std::env::temp_dir()
            .join(format!("as_cfg_{}", uuid::Uuid::now_v7()))
            .join(CONFIG_FILE_NAME);
        let written = init_config(Some(&path)).expect("init config");
        let loaded = load_config(Some(&written)).expect("load config");
        assert_eq!(loaded.paths.article_csv, PathBuf::from("data/articles.csv"));
    }
}
