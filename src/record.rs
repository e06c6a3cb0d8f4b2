// 📇 Classification record - what the presentation layer receives
// Serialized as a flat JSON object.

use crate::taxonomy::{OrgFocus, OrgType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// Safe to drive full personalization
    Ok,
    /// Personalize, but offer a confirmation affordance
    Uncertain,
    /// Do not personalize
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Whitelist,
    Cache,
    Generative,
}

impl Status {
    /// Wire name, identical to the serde encoding
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Uncertain => "UNCERTAIN",
            Status::Rejected => "REJECTED",
        }
    }
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Whitelist => "whitelist",
            Source::Cache => "cache",
            Source::Generative => "generative",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub name: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub org_type: Option<OrgType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus: Option<OrgFocus>,

    #[serde(default)]
    pub thesis: String,

    #[serde(default)]
    pub ceo: Option<String>,

    pub confidence: f64,

    pub status: Status,

    #[serde(default)]
    pub corrected: bool,

    /// Absent only for input rejections, which never reach a tier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,

    /// Personalization hint, e.g. "climate, vc"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// User-facing message for rejected or unverified results
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ClassificationResult {
    pub fn is_personalizable(&self) -> bool {
        self.status != Status::Rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serializes_flat_with_type_key() {
        let record = ClassificationResult {
            name: "World Fund".to_string(),
            org_type: Some(OrgType::Vc),
            focus: Some(OrgFocus::Climate),
            thesis: "Climate tech VC".to_string(),
            ceo: None,
            confidence: 0.9,
            status: Status::Ok,
            corrected: false,
            source: Some(Source::Generative),
            language: Some("climate, vc".to_string()),
            message: None,
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "World Fund",
                "type": "VC",
                "focus": "CLIMATE",
                "thesis": "Climate tech VC",
                "ceo": null,
                "confidence": 0.9,
                "status": "OK",
                "corrected": false,
                "source": "generative",
                "language": "climate, vc",
            })
        );
    }

    #[test]
    fn test_rejection_omits_type_and_source() {
        let record = ClassificationResult {
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
            message: Some("nope".to_string()),
        };

        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("type").is_none());
        assert!(value.get("source").is_none());
        assert_eq!(value["status"], "REJECTED");
        assert!(!record.is_personalizable());
    }

    #[test]
    fn test_labels_match_wire_names() {
        for status in [Status::Ok, Status::Uncertain, Status::Rejected] {
            assert_eq!(serde_json::to_value(status).unwrap(), status.as_str());
        }
        for source in [Source::Whitelist, Source::Cache, Source::Generative] {
            assert_eq!(serde_json::to_value(source).unwrap(), source.as_str());
        }
    }
}
