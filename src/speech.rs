// 🔊 Narration - Text → audio bytes through external speech providers
//
// Outside the classification core. Providers are tried in order; the first
// success is cached on disk under the SHA-256 of the text.

use crate::error::SpeechError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ELEVENLABS_BASE_URL: &str = "https://api.elevenlabs.io/v1";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// "Daniel", professional British narrator
pub const DEFAULT_VOICE_ID: &str = "onwK4e9ZLuTAKqWW03F9";

#[async_trait]
pub trait SpeechProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError>;
}

fn http_client(timeout: Duration) -> Result<Client, SpeechError> {
    Ok(Client::builder().timeout(timeout).build()?)
}

async fn read_audio(provider: &str, response: reqwest::Response) -> Result<Vec<u8>, SpeechError> {
    let status = response.status();
    if !status.is_success() {
        return Err(SpeechError::Status {
            provider: provider.to_string(),
            code: status.as_u16(),
        });
    }
    Ok(response.bytes().await?.to_vec())
}

// ============================================================================
// ELEVENLABS
// ============================================================================

pub struct ElevenLabsProvider {
    client: Client,
    base_url: String,
    api_key: String,
    voice_id: String,
}

impl ElevenLabsProvider {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        voice_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SpeechError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            voice_id: voice_id.into(),
        })
    }
}

#[async_trait]
impl SpeechProvider for ElevenLabsProvider {
    fn name(&self) -> &str {
        "elevenlabs"
    }

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
        let response = self
            .client
            .post(format!("{}/text-to-speech/{}", self.base_url, self.voice_id))
            .header("xi-api-key", &self.api_key)
            .json(&json!({
                "text": text,
                "model_id": "eleven_multilingual_v2",
                "voice_settings": {
                    "stability": 0.6,
                    "similarity_boost": 0.8,
                    "style": 0.3,
                },
            }))
            .send()
            .await?;

        read_audio(self.name(), response).await
    }
}

// ============================================================================
// OPENAI
// ============================================================================

pub struct OpenAiSpeechProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenAiSpeechProvider {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SpeechError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl SpeechProvider for OpenAiSpeechProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
        let response = self
            .client
            .post(format!("{}/audio/speech", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": "tts-1",
                "input": text,
                "voice": "nova",
            }))
            .send()
            .await?;

        read_audio(self.name(), response).await
    }
}

// ============================================================================
// NARRATOR
// ============================================================================

pub struct Narrator {
    providers: Vec<Box<dyn SpeechProvider>>,
    cache_dir: Option<PathBuf>,
}

impl Narrator {
    pub fn new(providers: Vec<Box<dyn SpeechProvider>>, cache_dir: Option<PathBuf>) -> Self {
        Narrator {
            providers,
            cache_dir,
        }
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Hex SHA-256 of the text; the audio cache file stem
    pub fn cache_key(text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn cache_path(&self, text: &str) -> Option<PathBuf> {
        self.cache_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.mp3", Self::cache_key(text))))
    }

    pub async fn narrate(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
        if text.trim().is_empty() {
            return Err(SpeechError::EmptyText);
        }

        let path = self.cache_path(text);
        if let Some(path) = &path {
            if let Ok(audio) = tokio::fs::read(path).await {
                tracing::debug!(path = %path.display(), "audio cache hit");
                return Ok(audio);
            }
        }

        for provider in &self.providers {
            match provider.synthesize(text).await {
                Ok(audio) => {
                    if let Some(path) = &path {
                        self.store(path, &audio).await;
                    }
                    return Ok(audio);
                }
                Err(e) => {
                    tracing::warn!(provider = provider.name(), error = %e, "speech provider failed");
                }
            }
        }

        Err(SpeechError::Unavailable)
    }

    async fn store(&self, path: &Path, audio: &[u8]) {
        if let Some(parent) = path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                tracing::warn!(error = %e, "audio cache directory unavailable");
                return;
            }
        }
        if let Err(e) = tokio::fs::write(path, audio).await {
            tracing::warn!(path = %path.display(), error = %e, "audio cache write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct Scripted {
        audio: Option<Vec<u8>>,
        calls: Arc<AtomicU32>,
    }

    #[async_trait]
    impl SpeechProvider for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn synthesize(&self, _text: &str) -> Result<Vec<u8>, SpeechError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.audio.clone().ok_or(SpeechError::Unavailable)
        }
    }

    #[tokio::test]
    async fn test_empty_text() {
        let narrator = Narrator::new(Vec::new(), None);
        assert!(matches!(narrator.narrate("  ").await, Err(SpeechError::EmptyText)));
    }

    #[tokio::test]
    async fn test_no_providers() {
        let narrator = Narrator::new(Vec::new(), None);
        assert!(matches!(narrator.narrate("hello").await, Err(SpeechError::Unavailable)));
    }

    #[tokio::test]
    async fn test_falls_through_to_next_provider_and_caches() {
        let dir = tempfile::tempdir().unwrap();
        let first_calls = Arc::new(AtomicU32::new(0));
        let second_calls = Arc::new(AtomicU32::new(0));

        let narrator = Narrator::new(
            vec![
                Box::new(Scripted { audio: None, calls: first_calls.clone() }),
                Box::new(Scripted { audio: Some(vec![1, 2, 3]), calls: second_calls.clone() }),
            ],
            Some(dir.path().to_path_buf()),
        );

        assert_eq!(narrator.narrate("Welcome").await.unwrap(), vec![1, 2, 3]);
        assert!(dir.path().join(format!("{}.mp3", Narrator::cache_key("Welcome"))).exists());

        // Served from disk the second time
        assert_eq!(narrator.narrate("Welcome").await.unwrap(), vec![1, 2, 3]);
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cache_key_is_sha256_hex() {
        assert_eq!(
            Narrator::cache_key("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn test_elevenlabs_request_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/text-to-speech/{}", DEFAULT_VOICE_ID)))
            .and(header("xi-api-key", "k"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![9u8, 9, 9]))
            .expect(1)
            .mount(&server)
            .await;

        let provider =
            ElevenLabsProvider::new(server.uri(), "k", DEFAULT_VOICE_ID, Duration::from_secs(5)).unwrap();
        assert_eq!(provider.synthesize("hi").await.unwrap(), vec![9, 9, 9]);
    }

    #[tokio::test]
    async fn test_openai_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/speech"))
            .and(header("authorization", "Bearer k"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let provider = OpenAiSpeechProvider::new(server.uri(), "k", Duration::from_secs(5)).unwrap();
        let err = provider.synthesize("hi").await.unwrap_err();
        assert!(matches!(err, SpeechError::Status { code: 401, .. }));
    }
}
