// 🏷️ Audience Classifier - Free-text organization name → validated {type, focus}
//
// Tiers, first hit wins:
//   1. whitelist   exact match on curated names        (confidence 1.0)
//   2. cache       prior high-confidence model result  (returned as stored)
//   3. generative  model call → extract → validate/correct → maybe cache
//
// `classify` never fails. Every external boundary degrades to a fixed value.

use crate::cache::CacheStore;
use crate::extract::parse_model_reply;
use crate::generative::{classification_prompt, GenerativeModel};
use crate::normalize::cache_key;
use crate::record::{ClassificationResult, Source, Status};
use crate::taxonomy::{audience_language, validate_and_correct, OrgFocus, OrgType};
use crate::whitelist::{Whitelist, WhitelistEntry};
use std::sync::Arc;

/// Shortest accepted name, in characters, after trimming
pub const MIN_NAME_CHARS: usize = 2;

/// Below this the organization is not investment-relevant
pub const REJECT_BELOW: f64 = 0.3;

/// At or above this a result is OK and gets cached
pub const ACCEPT_AT: f64 = 0.7;

/// Confidence of the degraded result when the model tier fails
pub const FALLBACK_CONFIDENCE: f64 = 0.4;

pub const INVALID_NAME_MESSAGE: &str = "Please enter a valid organization name.";
pub const UNVERIFIED_MESSAGE: &str = "Could not fully verify this organization. Proceed?";

const DEFAULT_THESIS: &str = "Investment organization";
const FALLBACK_THESIS: &str = "Organization";

// ============================================================================
// RESULT CONSTRUCTORS
// ============================================================================

impl ClassificationResult {
    /// Input that never reaches a tier
    pub fn invalid_input() -> Self {
        ClassificationResult {
            name: String::new(),
            org_type: None,
            focus: None,
            thesis: String::new(),
            ceo: None,
            confidence: 0.0,
            status: Status::Rejected,
            corrected: false,
            source: None,
            language: None,
            message: Some(INVALID_NAME_MESSAGE.to_string()),
        }
    }

    pub fn from_whitelist(entry: &WhitelistEntry) -> Self {
        ClassificationResult {
            name: entry.name.clone(),
            org_type: Some(entry.org_type),
            focus: Some(entry.focus),
            thesis: entry.thesis.clone(),
            ceo: Some(entry.ceo.clone()),
            confidence: 1.0,
            status: Status::Ok,
            corrected: false,
            source: Some(Source::Whitelist),
            language: Some(audience_language(entry.org_type, entry.focus)),
            message: None,
        }
    }

    /// Model judged the name irrelevant
    pub fn low_confidence(name: &str, confidence: f64) -> Self {
        ClassificationResult {
            name: name.to_string(),
            org_type: None,
            focus: None,
            thesis: String::new(),
            ceo: None,
            confidence,
            status: Status::Rejected,
            corrected: false,
            source: Some(Source::Generative),
            language: None,
            message: Some(format!(
                "\"{}\" is not identified as a potential investment partner.",
                name
            )),
        }
    }

    /// Degraded result when the generative tier fails for any reason
    pub fn fallback(name: &str) -> Self {
        ClassificationResult {
            name: name.to_string(),
            org_type: Some(OrgType::Vc),
            focus: Some(OrgFocus::DeepTech),
            thesis: FALLBACK_THESIS.to_string(),
            ceo: None,
            confidence: FALLBACK_CONFIDENCE,
            status: Status::Uncertain,
            corrected: false,
            source: Some(Source::Generative),
            language: Some(audience_language(OrgType::Vc, OrgFocus::DeepTech)),
            message: Some(UNVERIFIED_MESSAGE.to_string()),
        }
    }
}

// ============================================================================
// CLASSIFIER
// ============================================================================

pub struct Classifier {
    whitelist: Whitelist,
    cache: Arc<dyn CacheStore>,
    model: Arc<dyn GenerativeModel>,
}

impl Classifier {
    pub fn new(
        whitelist: Whitelist,
        cache: Arc<dyn CacheStore>,
        model: Arc<dyn GenerativeModel>,
    ) -> Self {
        Classifier {
            whitelist,
            cache,
            model,
        }
    }

    pub fn whitelist(&self) -> &Whitelist {
        &self.whitelist
    }

    /// Request-body form: `{"fundName": "..."}`. A missing or non-string
    /// name is an input rejection.
    pub async fn classify_value(&self, body: &serde_json::Value) -> ClassificationResult {
        match body.get("fundName").and_then(|v| v.as_str()) {
            Some(name) => self.classify(name).await,
            None => ClassificationResult::invalid_input(),
        }
    }

    pub async fn classify(&self, raw_name: &str) -> ClassificationResult {
        let trimmed = raw_name.trim();
        if trimmed.chars().count() < MIN_NAME_CHARS {
            tracing::debug!(input = raw_name, "rejected: name too short");
            return ClassificationResult::invalid_input();
        }

        // Tier 1: whitelist
        if let Some(entry) = self.whitelist.lookup(raw_name) {
            tracing::debug!(input = raw_name, name = %entry.name, "whitelist hit");
            return ClassificationResult::from_whitelist(entry);
        }

        // Tier 2: cache. A name with no storable characters skips the cache.
        let key = cache_key(raw_name);
        if !key.is_empty() {
            if let Some(mut cached) = self.cache.get(&key) {
                tracing::debug!(key = %key, backend = self.cache.name(), "cache hit");
                cached.source = Some(Source::Cache);
                return cached;
            }
        }

        // Tier 3: generative
        self.classify_generative(raw_name, &key).await
    }

    async fn classify_generative(&self, raw_name: &str, key: &str) -> ClassificationResult {
        let prompt = classification_prompt(raw_name);

        let text = match self.model.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(model = self.model.id(), error = %e, "generative call failed, using fallback");
                return ClassificationResult::fallback(raw_name);
            }
        };

        let reply = match parse_model_reply(&text) {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(model = self.model.id(), error = %e, "unusable model reply, using fallback");
                return ClassificationResult::fallback(raw_name);
            }
        };

        let confidence = reply.confidence();
        if confidence < REJECT_BELOW {
            tracing::info!(input = raw_name, confidence, "rejected by model");
            return ClassificationResult::low_confidence(raw_name, confidence);
        }

        let correction = validate_and_correct(
            reply.org_type.as_deref().unwrap_or_default(),
            reply.focus.as_deref().unwrap_or_default(),
        );
        if correction.type_coerced {
            tracing::debug!(input = raw_name, given = ?reply.org_type, "unknown type coerced to VC");
        }
        if correction.corrected {
            tracing::debug!(input = raw_name, given = ?reply.focus, focus = %correction.focus, "focus corrected");
        }

        let status = if confidence >= ACCEPT_AT {
            Status::Ok
        } else {
            Status::Uncertain
        };

        let result = ClassificationResult {
            name: reply.name().unwrap_or(raw_name).to_string(),
            org_type: Some(correction.org_type),
            focus: Some(correction.focus),
            thesis: reply.thesis().unwrap_or(DEFAULT_THESIS).to_string(),
            ceo: reply.ceo().map(str::to_string),
            confidence,
            status,
            corrected: correction.corrected,
            source: Some(Source::Generative),
            language: Some(audience_language(correction.org_type, correction.focus)),
            message: None,
        };

        // Uncertain results stay uncached so a later call can do better
        if status == Status::Ok && !key.is_empty() {
            if let Err(e) = self.cache.put(key, &result) {
                tracing::warn!(key, backend = self.cache.name(), error = %e, "cache write failed");
            }
        }

        result
    }
}

// ============================================================================
// TESTS
// ============================================================================
