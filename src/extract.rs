// 🔎 Reply extraction - Free model text → typed classification candidate
//
// The model is asked for JSON only but routinely wraps it in prose or code
// fences. Three failure modes are kept apart: no object, bad JSON, wrong shape.

use crate::error::ExtractError;
use serde::Deserialize;

/// Confidence assumed when the model omits it
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Untrusted classification candidate as the model wrote it
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ModelReply {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(rename = "type", default)]
    pub org_type: Option<String>,

    #[serde(default)]
    pub focus: Option<String>,

    #[serde(default)]
    pub thesis: Option<String>,

    #[serde(default)]
    pub ceo: Option<String>,

    #[serde(default)]
    pub confidence: Option<f64>,
}

impl ModelReply {
    /// Stated confidence, 0.5 when absent, clamped to [0, 1]
    pub fn confidence(&self) -> f64 {
        self.confidence.unwrap_or(DEFAULT_CONFIDENCE).clamp(0.0, 1.0)
    }

    pub fn name(&self) -> Option<&str> {
        non_empty(&self.name)
    }

    pub fn thesis(&self) -> Option<&str> {
        non_empty(&self.thesis)
    }

    /// CEO name; empty strings and a literal "null" count as absent
    pub fn ceo(&self) -> Option<&str> {
        non_empty(&self.ceo).filter(|c| !c.eq_ignore_ascii_case("null"))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// First balanced `{...}` substring of `text`.
///
/// Braces inside JSON string literals do not count toward the balance.
pub fn extract_json_object(text: &str) -> Result<&str, ExtractError> {
    let start = text.find('{').ok_or(ExtractError::NoObject)?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    Err(ExtractError::NoObject)
}

/// Extract, parse and shape-check a model reply.
pub fn parse_model_reply(text: &str) -> Result<ModelReply, ExtractError> {
    let object = extract_json_object(text)?;
    let value: serde_json::Value =
        serde_json::from_str(object).map_err(ExtractError::InvalidJson)?;
    serde_json::from_value(value).map_err(ExtractError::SchemaMismatch)
}
