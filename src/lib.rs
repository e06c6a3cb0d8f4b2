// Audience Classifier - Core Library
// Resolves a visiting organization's name to a {type, focus} audience profile
// that drives deck personalization. Shared by the CLI and the API server.

pub mod taxonomy;
pub mod normalize;
pub mod whitelist;
pub mod record;
pub mod extract;
pub mod generative;
pub mod cache;
pub mod classifier;
pub mod speech;
pub mod config;
pub mod error;

// Re-export commonly used types
pub use taxonomy::{
    OrgType, OrgFocus, Correction,
    allowed_focuses, default_focus, is_legal, validate_and_correct, audience_language,
};
pub use normalize::{cache_key, whitelist_key};
pub use whitelist::{Whitelist, WhitelistEntry};
pub use record::{ClassificationResult, Status, Source};
pub use extract::{ModelReply, extract_json_object, parse_model_reply};
pub use generative::{GenerativeModel, GeminiModel, MockModel, classification_prompt};
pub use cache::{CacheStore, MemoryCache, FileCache, SqliteCache};
pub use classifier::{Classifier, MIN_NAME_CHARS, REJECT_BELOW, ACCEPT_AT, FALLBACK_CONFIDENCE};
pub use speech::{Narrator, SpeechProvider, ElevenLabsProvider, OpenAiSpeechProvider};
pub use config::{AppConfig, CacheBackend};
pub use error::{ExtractError, GenerativeError, CacheError, SpeechError, ConfigError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the fmt subscriber. `AUDIENCE_LOG` overrides `default_filter`.
pub fn init_tracing(default_filter: &str) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_env("AUDIENCE_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
