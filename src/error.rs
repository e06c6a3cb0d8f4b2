//! Error types for the classifier's external boundaries.
//!
//! None of these reach a caller of [`crate::Classifier::classify`]; they are
//! logged and turned into a fallback value at the tier that produced them.

use thiserror::Error;

/// Failure to pull a classification record out of free model text.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// No balanced `{...}` object anywhere in the text.
    #[error("no JSON object in model response")]
    NoObject,

    /// An object was found but is not valid JSON.
    #[error("invalid JSON in model response: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// Valid JSON, wrong shape (e.g. `confidence` is a string).
    #[error("model response does not match the classification shape: {0}")]
    SchemaMismatch(#[source] serde_json::Error),
}

/// Failure of the generative model call itself.
#[derive(Debug, Error)]
pub enum GenerativeError {
    #[error("generative model is not configured (missing API key)")]
    NotConfigured,

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("model endpoint returned {code}: {body}")]
    Status { code: u16, body: String },

    #[error("model returned no text")]
    EmptyResponse,
}

/// Cache write failure. Reads never fail; a bad entry is a miss.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("cache database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("cache lock poisoned")]
    Poisoned,
}

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("no text provided")]
    EmptyText,

    #[error("no speech provider succeeded")]
    Unavailable,

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{provider} returned {code}")]
    Status { provider: String, code: u16 },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Figment extraction or merge error.
    #[error("configuration error: {0}")]
    Figment(#[from] figment::Error),

    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}
