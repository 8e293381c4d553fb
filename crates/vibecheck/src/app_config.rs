//! 🔧 Configuration: where the API key lives, which models to ask, and how long to wait.
//!
//! 🦆 Everything has a default except the parts only you can know (the source and the scorers).
//!
//! 🏗️ Powered by Figment. Env vars (`VIBECHECK_*`, nested keys split on `__`)
//! form the base layer, an optional TOML file goes on top.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use tracing::info;

/// 📦 The AppConfig: one struct to rule them all.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub source: SourceConfig,
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// 🚪 Where the HTTP front door listens.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

/// ⏱️ Knobs for the dispatcher loop.
#[derive(Debug, Deserialize, Clone)]
pub struct RuntimeConfig {
    /// Budget for each stage (fetch, score), in seconds. Independent per stage.
    #[serde(default = "default_stage_timeout_secs", alias = "timeout_threshold")]
    pub stage_timeout_secs: u64,
    /// Extra comment pages to follow after the first one.
    #[serde(default = "default_max_pages", alias = "pages")]
    pub max_pages: usize,
    /// Keep author/likes/replies and skip the length filter on scoring input.
    #[serde(default)]
    pub rich_comments: bool,
}

fn default_stage_timeout_secs() -> u64 {
    10
}

fn default_max_pages() -> usize {
    1
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stage_timeout_secs: default_stage_timeout_secs(),
            max_pages: default_max_pages(),
            rich_comments: false,
        }
    }
}

impl RuntimeConfig {
    pub fn stage_timeout(&self) -> Duration {
        Duration::from_secs(self.stage_timeout_secs)
    }
}

/// 📡 Where comments come from.
///
/// Figment lowercases env keys, so each variant also answers to its lowercase name:
/// `VIBECHECK_SOURCE__YOUTUBE__API_KEY` lands on `YouTube`.
#[derive(Debug, Deserialize, Clone)]
pub enum SourceConfig {
    #[serde(alias = "youtube")]
    YouTube(YouTubeSourceConfig),
    #[serde(alias = "inmemory")]
    InMemory(InMemorySourceConfig),
}

/// 📺 YouTube Data API v3. The `api_key` is the provider credential.
#[derive(Debug, Deserialize, Clone)]
pub struct YouTubeSourceConfig {
    pub api_key: String,
    #[serde(default = "default_youtube_base_url")]
    pub base_url: String,
    /// `maxResults` per page. The API caps this at 100.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_youtube_base_url() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}

fn default_page_size() -> u32 {
    100
}

/// 🧪 Canned comments keyed by video ID. For local dev and demos, not production.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct InMemorySourceConfig {
    #[serde(default)]
    pub videos: HashMap<String, Vec<String>>,
}

/// 🧠 The three classification pipelines behind the scoring resource.
#[derive(Debug, Deserialize, Clone)]
pub struct ScoringConfig {
    pub sentiment: ClassifierConfig,
    pub emotion: ClassifierConfig,
    pub sarcasm: ClassifierConfig,
    /// Label the sarcasm pipeline uses for "yes, that was sarcastic".
    #[serde(default = "default_sarcastic_label")]
    pub sarcastic_label: String,
}

fn default_sarcastic_label() -> String {
    "LABEL_1".to_string()
}

/// 🎭 One classification pipeline.
#[derive(Debug, Deserialize, Clone)]
pub enum ClassifierConfig {
    #[serde(alias = "http")]
    Http(HttpClassifierConfig),
    #[serde(alias = "inmemory")]
    InMemory(InMemoryClassifierConfig),
}

/// 📡 A hosted text-classification endpoint.
#[derive(Debug, Deserialize, Clone)]
pub struct HttpClassifierConfig {
    pub url: String,
    #[serde(default)]
    pub api_token: Option<String>,
}

/// 🧪 Says the same thing about everything. Like a horoscope.
#[derive(Debug, Deserialize, Clone)]
pub struct InMemoryClassifierConfig {
    pub label: String,
    #[serde(default = "default_in_memory_score")]
    pub score: f64,
}

fn default_in_memory_score() -> f64 {
    1.0
}

impl AppConfig {
    /// 🔒 Reject configs that would only blow up later, on the first request.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.runtime.stage_timeout_secs == 0 {
            anyhow::bail!(
                "💀 runtime.stage_timeout_secs is 0. Every stage would time out before it started. Give it at least a second."
            );
        }
        if let SourceConfig::YouTube(youtube) = &self.source {
            if youtube.api_key.trim().is_empty() {
                anyhow::bail!("💀 source.YouTube.api_key is empty. The provider will not talk to strangers.");
            }
            if youtube.page_size == 0 || youtube.page_size > 100 {
                anyhow::bail!(
                    "💀 source.YouTube.page_size must be between 1 and 100, got {}",
                    youtube.page_size
                );
            }
        }
        Ok(())
    }
}

/// 🚀 Load the config from env vars and, if given, a TOML file.
///
/// 📐 `None` means env vars only. `Some(path)` means env vars + TOML, TOML wins on conflicts.
/// No silent fallback to a default file name.
pub fn load_config(config_file_name: Option<&Path>) -> anyhow::Result<AppConfig> {
    match config_file_name {
        Some(path) => info!("🔧 Loading configuration from '{}' plus VIBECHECK_* env", path.display()),
        None => info!("🔧 Loading configuration from VIBECHECK_* env only"),
    }

    let config = Figment::new().merge(Env::prefixed("VIBECHECK_").split("__"));
    let config = match config_file_name {
        Some(file_name) => config.merge(Toml::file(file_name)),
        None => config,
    };

    let context_msg = match config_file_name {
        Some(path) => format!(
            "💀 Failed to parse configuration from file '{}' and environment variables (VIBECHECK_*).",
            path.display()
        ),
        None => "💀 Failed to parse configuration from environment variables (VIBECHECK_*). \
                 No file was provided, so this one's all on the environment."
            .to_string(),
    };

    let app_config: AppConfig = config.extract().context(context_msg)?;
    app_config
        .validate()
        .context("💀 Configuration parsed, but it doesn't make sense")?;
    Ok(app_config)
}
