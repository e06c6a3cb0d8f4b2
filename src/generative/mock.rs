//! Scripted generative model for tests and offline runs.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};

use super::GenerativeModel;
use crate::error::GenerativeError;

enum Script {
    Reply(String),
    Fail,
}

/// Returns the same scripted reply (or failure) on every call and counts calls.
pub struct MockModel {
    script: Script,
    call_count: AtomicU32,
}

impl MockModel {
    /// Always answers with `reply`
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            script: Script::Reply(reply.into()),
            call_count: AtomicU32::new(0),
        }
    }

    /// Always fails as if the network were down
    pub fn failing() -> Self {
        Self {
            script: Script::Fail,
            call_count: AtomicU32::new(0),
        }
    }

    /// Number of times `generate` was called
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerativeModel for MockModel {
    fn id(&self) -> &str {
        "mock-model"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, GenerativeError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        match &self.script {
            Script::Reply(text) => Ok(text.clone()),
            Script::Fail => Err(GenerativeError::Status {
                code: 503,
                body: "scripted failure".to_string(),
            }),
        }
    }
}
