//! Layered configuration using figment.
//!
//! Sources, highest priority last:
//! 1. Built-in defaults
//! 2. `audience.toml` in the working directory (or the path given)
//! 3. `AUDIENCE_*` environment variables, `__` separating sections
//!    (`AUDIENCE_CACHE__BACKEND=sqlite`)
//! 4. The provider keys under their usual names: `GEMINI_API_KEY`,
//!    `ELEVENLABS_API_KEY`, `OPENAI_API_KEY`

use crate::cache::{CacheStore, FileCache, MemoryCache, SqliteCache};
use crate::error::ConfigError;
use crate::generative::{gemini, GeminiModel};
use crate::speech::{
    ElevenLabsProvider, Narrator, OpenAiSpeechProvider, SpeechProvider, DEFAULT_VOICE_ID,
    ELEVENLABS_BASE_URL, OPENAI_BASE_URL,
};
use crate::whitelist::Whitelist;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "audience.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub whitelist: WhitelistConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Memory,
    File,
    Sqlite,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// Directory for `file`, database file for `sqlite`
    pub path: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::File,
            path: PathBuf::from(".classifier-cache"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeminiConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: gemini::DEFAULT_MODEL.to_string(),
            base_url: gemini::DEFAULT_BASE_URL.to_string(),
            timeout_secs: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpeechConfig {
    #[serde(default)]
    pub elevenlabs_api_key: Option<String>,
    pub elevenlabs_voice_id: String,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    /// Audio cache directory; `None` disables caching
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            elevenlabs_api_key: None,
            elevenlabs_voice_id: DEFAULT_VOICE_ID.to_string(),
            openai_api_key: None,
            cache_dir: Some(PathBuf::from(".tts-cache")),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WhitelistConfig {
    /// Extra curated rows (`alias,name,type,focus,ceo,thesis`)
    #[serde(default)]
    pub extra_csv: Option<PathBuf>,
}

impl AppConfig {
    /// Load `.env`, then every source with the default config file.
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    pub fn load_from(config_file: &Path) -> Result<Self, ConfigError> {
        let config: AppConfig = Self::figment(config_file).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// The provider chain, public so tests can layer on top of it.
    pub fn figment(config_file: &Path) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if config_file.exists() {
            figment = figment.merge(Toml::file(config_file));
        }

        figment
            .merge(Env::prefixed("AUDIENCE_").split("__"))
            .merge(Env::raw().only(&["GEMINI_API_KEY"]).map(|_| "gemini.api_key".into()))
            .merge(
                Env::raw()
                    .only(&["ELEVENLABS_API_KEY"])
                    .map(|_| "speech.elevenlabs_api_key".into()),
            )
            .merge(
                Env::raw()
                    .only(&["OPENAI_API_KEY"])
                    .map(|_| "speech.openai_api_key".into()),
            )
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.gemini.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "gemini.timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.speech.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "speech.timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.cache.backend != CacheBackend::Memory && self.cache.path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "cache.path".to_string(),
                reason: "required for file and sqlite backends".to_string(),
            });
        }
        Ok(())
    }

    // ========================================================================
    // BUILDERS
    // ========================================================================

    pub fn build_cache(&self) -> Result<Arc<dyn CacheStore>> {
        Ok(match self.cache.backend {
            CacheBackend::Memory => Arc::new(MemoryCache::new()),
            CacheBackend::File => Arc::new(FileCache::new(&self.cache.path)),
            CacheBackend::Sqlite => Arc::new(
                SqliteCache::open(&self.cache.path)
                    .with_context(|| format!("Failed to open cache database {:?}", self.cache.path))?,
            ),
        })
    }

    pub fn build_model(&self) -> Result<GeminiModel> {
        if self.gemini.api_key.as_deref().map_or(true, str::is_empty) {
            tracing::warn!("GEMINI_API_KEY not set; unknown names will get the fallback result");
        }

        GeminiModel::new(
            &self.gemini.base_url,
            &self.gemini.model,
            self.gemini.api_key.clone(),
            Duration::from_secs(self.gemini.timeout_secs),
        )
        .context("Failed to build Gemini client")
    }

    pub fn build_whitelist(&self) -> Result<Whitelist> {
        let mut whitelist = Whitelist::with_defaults();
        if let Some(path) = &self.whitelist.extra_csv {
            let added = whitelist.extend_from_csv(path)?;
            tracing::info!(added, path = %path.display(), "extra whitelist entries loaded");
        }
        Ok(whitelist)
    }

    /// ElevenLabs first, then OpenAI; only providers with a key are included.
    pub fn build_narrator(&self) -> Result<Narrator> {
        let timeout = Duration::from_secs(self.speech.timeout_secs);
        let mut providers: Vec<Box<dyn SpeechProvider>> = Vec::new();

        if let Some(key) = self.speech.elevenlabs_api_key.as_deref().filter(|k| !k.is_empty()) {
            providers.push(Box::new(ElevenLabsProvider::new(
                ELEVENLABS_BASE_URL,
                key,
                &self.speech.elevenlabs_voice_id,
                timeout,
            )?));
        }
        if let Some(key) = self.speech.openai_api_key.as_deref().filter(|k| !k.is_empty()) {
            providers.push(Box::new(OpenAiSpeechProvider::new(OPENAI_BASE_URL, key, timeout)?));
        }

        Ok(Narrator::new(providers, self.speech.cache_dir.clone()))
    }
}
