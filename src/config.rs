use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{LensError, Result};
use crate::exemplars::ExemplarCorpus;
use crate::profile::CultureRegistry;
use crate::scenario::ScenarioCatalog;
use crate::stereotype::DEFAULT_INDICATORS;

/// Main configuration structure loaded from cultural_lens.toml and environment variables
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub system: SystemConfig,
    pub data: DataConfig,
    pub stereotype: StereotypeConfig,
    /// Runtime configuration loaded from environment variables
    #[serde(skip)]
    pub runtime: RuntimeConfig,
}

/// Embedding provider selection
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SystemConfig {
    /// `auto`, `openai`, `local` or `fake`
    pub embedding_provider: String,
    pub embedding_model: String,
    pub embedding_dimensions: usize,
    pub embed_retries: u32,
    /// Directory of the local sentence model
    pub model_dir: PathBuf,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            embedding_provider: "auto".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            embedding_dimensions: 1536,
            embed_retries: 3,
            model_dir: PathBuf::from("./models/all-MiniLM-L6-v2"),
        }
    }
}

/// Dataset overrides. Unset paths use the bundled datasets.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DataConfig {
    pub cultures_path: Option<PathBuf>,
    pub scenarios_path: Option<PathBuf>,
    pub exemplars_path: Option<PathBuf>,
}

impl DataConfig {
    pub fn cultures(&self) -> Result<CultureRegistry> {
        match &self.cultures_path {
            Some(path) => CultureRegistry::load(path),
            None => CultureRegistry::builtin(),
        }
    }

    pub fn scenarios(&self) -> Result<ScenarioCatalog> {
        match &self.scenarios_path {
            Some(path) => ScenarioCatalog::load(path),
            None => ScenarioCatalog::builtin(),
        }
    }

    pub fn exemplars(&self) -> Result<ExemplarCorpus> {
        match &self.exemplars_path {
            Some(path) => ExemplarCorpus::load(path),
            None => ExemplarCorpus::builtin(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StereotypeConfig {
    pub indicators: Vec<String>,
}

impl Default for StereotypeConfig {
    fn default() -> Self {
        Self {
            indicators: DEFAULT_INDICATORS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Runtime configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub openai_api_key: Option<String>,
    pub embed_strict: bool,
    pub log_level: String,
    pub embed_timeout_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            embed_strict: false,
            log_level: "cultural_lens=info".to_string(),
            embed_timeout_ms: 20_000,
        }
    }
}

impl RuntimeConfig {
    /// Load runtime configuration from environment variables
    pub fn load_from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            openai_api_key: lookup("OPENAI_API_KEY"),
            embed_strict: lookup("LENS_EMBED_STRICT").is_some_and(|v| v == "true" || v == "1"),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            embed_timeout_ms: lookup("LENS_EMBED_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.embed_timeout_ms),
        }
    }
}

impl Config {
    /// Load configuration from TOML file and environment variables
    /// Uses CULTURAL_LENS_CONFIG environment variable or defaults to "cultural_lens.toml"
    pub fn load() -> Result<Self> {
        // LENS_ENV_FILE if set, otherwise ./.env
        if let Ok(env_path) = std::env::var("LENS_ENV_FILE") {
            let _ = dotenvy::from_path(env_path);
        } else {
            let _ = dotenvy::from_path(".env");
        }

        let config_path = std::env::var("CULTURAL_LENS_CONFIG")
            .unwrap_or_else(|_| "cultural_lens.toml".to_string());
        let mut config = Self::load_file(&config_path)?;

        config.apply_overrides(|key| std::env::var(key).ok());
        config.runtime = RuntimeConfig::load_from_env();
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML file; a missing file yields defaults.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("Config file {} not found, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(LensError::Config {
                message: format!("cannot read {}: {}", path.display(), e),
            }),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply env-first overrides for the file-backed settings.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(provider) = lookup("LENS_EMBED_PROVIDER") {
            self.system.embedding_provider = provider.trim().to_lowercase();
        }
        if let Some(model) = lookup("LENS_EMBED_MODEL") {
            self.system.embedding_model = model;
        }
        if let Some(dim) = lookup("LENS_EMBED_DIM").and_then(|v| v.parse().ok()) {
            self.system.embedding_dimensions = dim;
        }
        if let Some(retries) = lookup("LENS_EMBED_RETRIES").and_then(|v| v.parse().ok()) {
            self.system.embed_retries = retries;
        }
        if let Some(dir) = lookup("LENS_MODEL_DIR") {
            self.system.model_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup("LENS_CULTURES_PATH") {
            self.data.cultures_path = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup("LENS_SCENARIOS_PATH") {
            self.data.scenarios_path = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup("LENS_EXEMPLARS_PATH") {
            self.data.exemplars_path = Some(PathBuf::from(path));
        }
    }

    /// Clamp retries, check provider/dimension coherence and the indicator list.
    pub fn validate(&mut self) -> Result<()> {
        if self.system.embed_retries == 0 {
            self.system.embed_retries = 1;
        } else if self.system.embed_retries > 10 {
            tracing::warn!(
                "embed_retries {} exceeds max 10, clamping to 10",
                self.system.embed_retries
            );
            self.system.embed_retries = 10;
        }

        let dims = self.system.embedding_dimensions;
        match self.system.embedding_provider.as_str() {
            "openai" => match self.system.embedding_model.as_str() {
                "text-embedding-3-small" if dims != 1536 => tracing::warn!(
                    "OpenAI text-embedding-3-small should use 1536 dimensions, got {}",
                    dims
                ),
                "text-embedding-3-large" if dims != 3072 => tracing::warn!(
                    "OpenAI text-embedding-3-large should use 3072 dimensions, got {}",
                    dims
                ),
                "text-embedding-3-small" | "text-embedding-3-large" => {}
                other => tracing::warn!(
                    "Unknown OpenAI embedding model '{}', dimension validation skipped",
                    other
                ),
            },
            "candle" | "local" => {
                if self.system.embedding_model != "all-MiniLM-L6-v2" {
                    tracing::warn!(
                        "Local provider expects 'all-MiniLM-L6-v2' model, got '{}'",
                        self.system.embedding_model
                    );
                }
                if dims != 384 {
                    tracing::warn!("Local MiniLM model expects 384 dimensions, got {}", dims);
                }
            }
            "auto" | "fake" => {}
            other => tracing::warn!("Unknown embedding provider '{}', validation skipped", other),
        }

        if self
            .stereotype
            .indicators
            .iter()
            .all(|s| s.trim().is_empty())
        {
            return Err(LensError::Config {
                message: "stereotype.indicators must contain at least one phrase".to_string(),
            });
        }
        Ok(())
    }
}
