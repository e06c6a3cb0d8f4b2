//! Gemini `generateContent` backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::GenerativeModel;
use crate::error::GenerativeError;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

pub struct GeminiModel {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiModel {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, GenerativeError> {
        let client = Client::builder()
            .user_agent(concat!("audience-classifier/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }

    fn generate_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<PartRequest<'a>>,
}

#[derive(Debug, Serialize)]
struct PartRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Debug, Deserialize)]
struct PartResponse {
    #[serde(default)]
    text: Option<String>,
}

#[async_trait]
impl GenerativeModel for GeminiModel {
    fn id(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerativeError> {
        let api_key = self.api_key.as_deref().ok_or(GenerativeError::NotConfigured)?;

        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![PartRequest { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.generate_url())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerativeError::Status {
                code: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response.json().await?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GenerativeError::EmptyResponse);
        }

        tracing::debug!(model = %self.model, chars = text.len(), "gemini reply received");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn model_for(server: &MockServer, key: Option<&str>) -> GeminiModel {
        GeminiModel::new(
            server.uri(),
            DEFAULT_MODEL,
            key.map(str::to_string),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_concatenates_candidate_parts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.0-flash:generateContent"))
            .and(header("x-goog-api-key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": { "parts": [ { "text": "{\"name\":" }, { "text": "\"KfW\"}" } ] }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = model_for(&server, Some("secret")).generate("prompt").await.unwrap();
        assert_eq!(text, "{\"name\":\"KfW\"}");
    }

    #[tokio::test]
    async fn test_http_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota"))
            .mount(&server)
            .await;

        let err = model_for(&server, Some("secret")).generate("prompt").await.unwrap_err();
        assert!(matches!(err, GenerativeError::Status { code: 429, .. }));
    }

    #[tokio::test]
    async fn test_empty_candidates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&server)
            .await;

        let err = model_for(&server, Some("secret")).generate("prompt").await.unwrap_err();
        assert!(matches!(err, GenerativeError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_missing_key_skips_network() {
        let server = MockServer::start().await;
        let err = model_for(&server, None).generate("prompt").await.unwrap_err();
        assert!(matches!(err, GenerativeError::NotConfigured));
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
