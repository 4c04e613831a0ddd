//! Lightweight configuration loader, typed settings sections and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (`APP_RETRIEVAL__K=8` sets `retrieval.k`). Missing sections fall back to
//! their defaults.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::types::{DistanceMetric, MetadataField};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Load `config.toml` and the env overlay from `dir`, then `APP_*` vars.
    pub fn load_from(dir: &Path) -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file(dir.join("config.toml")));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate_for_env(&env_name)?;
        Ok(config)
    }

    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Like `get`, but an absent key yields `default` instead of an error.
    pub fn get_or<T>(&self, key: &str, default: T) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        if self.figment.find_value(key).is_err() {
            return Ok(default);
        }
        self.get(key)
    }

    pub fn data(&self) -> anyhow::Result<DataSettings> {
        self.get_or("data", DataSettings::default())
    }

    pub fn embedding(&self) -> anyhow::Result<EmbeddingSettings> {
        self.get_or("embedding", EmbeddingSettings::default())
    }

    pub fn index(&self) -> anyhow::Result<IndexSettings> {
        self.get_or("index", IndexSettings::default())
    }

    pub fn retrieval(&self) -> anyhow::Result<RetrievalSettings> {
        let settings: RetrievalSettings = self.get_or("retrieval", RetrievalSettings::default())?;
        if settings.k == 0 {
            return Err(Error::InvalidConfig("retrieval.k must be positive".into()).into());
        }
        if !settings.similarity_threshold.is_finite() {
            return Err(Error::InvalidConfig("retrieval.similarity_threshold must be finite".into()).into());
        }
        Ok(settings)
    }

    pub fn assistant(&self) -> anyhow::Result<AssistantSettings> {
        self.get_or("assistant", AssistantSettings::default())
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        match env {
            "prod" | "production" => {
                if self.embedding()?.fake {
                    return Err(Error::InvalidConfig("embedding.fake is not allowed in production".into()).into());
                }
            }
            "dev" | "development" => {}
            "test" | "testing" => {}
            _ => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub qa_file: String,
    pub reservations_file: String,
    pub store_dir: String,
    pub table: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            qa_file: "data/extracted_qa_pairs.json".into(),
            reservations_file: "data/reservations.json".into(),
            store_dir: "data/store".into(),
            table: "faq".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub model_dir: Option<String>,
    pub fake: bool,
    pub fake_dim: usize,
    pub max_len: usize,
    pub batch_size: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self { model_dir: None, fake: false, fake_dim: 384, max_len: 256, batch_size: 32 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub metric: DistanceMetric,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub k: usize,
    pub similarity_threshold: f32,
    pub strict_fields: Vec<MetadataField>,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { k: 5, similarity_threshold: 0.3, strict_fields: Vec::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantSettings {
    pub api_base: String,
    pub assistant_id: Option<String>,
    pub timeout_secs: u64,
    pub history_messages: usize,
    pub poll_max_attempts: u32,
    pub poll_initial_delay_ms: u64,
    pub poll_max_delay_ms: u64,
    pub poll_multiplier: f32,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".into(),
            assistant_id: None,
            timeout_secs: 30,
            history_messages: 10,
            poll_max_attempts: 60,
            poll_initial_delay_ms: 500,
            poll_max_delay_ms: 4000,
            poll_multiplier: 2.0,
        }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
