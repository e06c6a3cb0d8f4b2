// Audience Classifier - Web Server
// REST API consumed by the pitch deck: classification + narration

use audience_classifier::{AppConfig, ClassificationResult, Classifier, Narrator, SpeechError};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::Instrument;

/// Shared application state
#[derive(Clone)]
struct AppState {
    classifier: Arc<Classifier>,
    narrator: Arc<Narrator>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    whitelist_entries: usize,
    speech_providers: usize,
}

#[derive(Deserialize)]
struct SpeechRequest {
    #[serde(default)]
    text: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse { error: message.into() })).into_response()
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "OK",
        version: audience_classifier::VERSION,
        whitelist_entries: state.classifier.whitelist().len(),
        speech_providers: state.narrator.provider_count(),
    })
}

/// POST /api/classify (also /api/gemini) - Classify an organization name
///
/// Always 200. A malformed body is an input rejection, not an HTTP error.
async fn classify(State(state): State<AppState>, body: Bytes) -> Response {
    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("classify", %request_id);

    let result = async {
        match serde_json::from_slice::<serde_json::Value>(&body) {
            Ok(value) => state.classifier.classify_value(&value).await,
            Err(e) => {
                tracing::debug!(error = %e, "unparseable classify body");
                ClassificationResult::invalid_input()
            }
        }
    }
    .instrument(span)
    .await;

    let mut response = Json(result).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store, no-cache"),
    );
    response
}

/// POST /api/tts - Narrate text as MP3
async fn narrate(State(state): State<AppState>, body: Bytes) -> Response {
    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("narrate", %request_id);

    let text = match serde_json::from_slice::<SpeechRequest>(&body) {
        Ok(request) => request.text,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "No text provided"),
    };

    match state.narrator.narrate(&text).instrument(span).await {
        Ok(audio) => ([(header::CONTENT_TYPE, "audio/mpeg")], audio).into_response(),
        Err(SpeechError::EmptyText) => error_response(StatusCode::BAD_REQUEST, "No text provided"),
        Err(SpeechError::Unavailable) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "No TTS service configured")
        }
        Err(e) => {
            tracing::error!(error = %e, "narration failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "TTS failed")
        }
    }
}

fn app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/classify", post(classify))
        .route("/gemini", post(classify))
        .route("/tts", post(narrate))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    audience_classifier::init_tracing("audience_server=info,audience_classifier=info")?;

    let config = AppConfig::load()?;

    let cache = config.build_cache()?;
    tracing::info!(backend = cache.name(), path = ?config.cache.path, "cache ready");

    let classifier = Classifier::new(
        config.build_whitelist()?,
        cache,
        Arc::new(config.build_model()?),
    );

    let state = AppState {
        classifier: Arc::new(classifier),
        narrator: Arc::new(config.build_narrator()?),
    };

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!(addr = %config.server.bind, "🚀 audience server listening");

    axum::serve(listener, app(state)).await?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use audience_classifier::{MemoryCache, MockModel, Whitelist};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_app(model: MockModel) -> Router {
        let classifier = Classifier::new(
            Whitelist::with_defaults(),
            Arc::new(MemoryCache::new()),
            Arc::new(model),
        );
        app(AppState {
            classifier: Arc::new(classifier),
            narrator: Arc::new(Narrator::new(Vec::new(), None)),
        })
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_classify_whitelisted() {
        let response = test_app(MockModel::failing())
            .oneshot(post_json("/api/gemini", r#"{"fundName":"a16z"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "no-store, no-cache"
        );

        let body = json_body(response).await;
        assert_eq!(body["name"], "Andreessen Horowitz");
        assert_eq!(body["type"], "VC");
        assert_eq!(body["focus"], "DEEP_TECH");
        assert_eq!(body["ceo"], "Marc Andreessen");
        assert_eq!(body["status"], "OK");
        assert_eq!(body["confidence"], 1.0);
        assert_eq!(body["source"], "whitelist");
    }

    #[tokio::test]
    async fn test_classify_bad_bodies_are_rejections() {
        for body in ["not json", r#"{"fundName":7}"#, r#"{"fundName":"a"}"#] {
            let response = test_app(MockModel::failing())
                .oneshot(post_json("/api/classify", body))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let json = json_body(response).await;
            assert_eq!(json["status"], "REJECTED", "body {}", body);
            assert_eq!(json["message"], "Please enter a valid organization name.");
        }
    }

    #[tokio::test]
    async fn test_classify_fallback_when_model_fails() {
        let response = test_app(MockModel::failing())
            .oneshot(post_json("/api/classify", r#"{"fundName":"Obscure Capital"}"#))
            .await
            .unwrap();

        let body = json_body(response).await;
        assert_eq!(body["status"], "UNCERTAIN");
        assert_eq!(body["confidence"], 0.4);
        assert_eq!(body["type"], "VC");
        assert_eq!(body["focus"], "DEEP_TECH");
    }

    #[tokio::test]
    async fn test_tts_without_providers() {
        let response = test_app(MockModel::failing())
            .oneshot(post_json("/api/tts", r#"{"text":"Welcome to the deck"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["error"], "No TTS service configured");

        let response = test_app(MockModel::failing())
            .oneshot(post_json("/api/tts", r#"{"text":""}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app(MockModel::failing())
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "OK");
        assert_eq!(body["speech_providers"], 0);
    }
}
