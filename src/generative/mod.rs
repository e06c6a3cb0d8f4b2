//! Generative model seam.
//!
//! The classifier treats the model as a black box: a prompt goes in, free
//! text comes out. Everything after that (extraction, validation,
//! correction) lives in the classifier.

pub mod gemini;
mod mock;

pub use gemini::GeminiModel;
pub use mock::MockModel;

use crate::error::GenerativeError;
use crate::taxonomy::{allowed_focuses, OrgFocus, OrgType};
use async_trait::async_trait;

#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Model identifier, used in logs
    fn id(&self) -> &str;

    /// Single completion. No retry; a failure is final for this request.
    async fn generate(&self, prompt: &str) -> Result<String, GenerativeError>;
}

/// Prompt embedding the full taxonomy and the legal-combination table.
pub fn classification_prompt(name: &str) -> String {
    let types = join(OrgType::ALL.iter().map(|t| t.as_str()), " | ");
    let focuses = join(OrgFocus::ALL.iter().map(|f| f.as_str()), " | ");

    let combinations = OrgType::ALL
        .iter()
        .map(|t| {
            let legal = allowed_focuses(*t);
            let rendered = if legal.len() == OrgFocus::ALL.len() {
                "any focus".to_string()
            } else {
                join(legal.iter().map(|f| f.as_str()), ", ")
            };
            format!("- {}: {}", t.as_str(), rendered)
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Analyze the organization "{name}".

Is this a legitimate investment organization, corporate partner, or government body that might invest in or partner with a deep-tech hardware startup?

If YES, classify it:
TYPE (exactly one): {types}
FOCUS (exactly one): {focuses}

VALID COMBINATIONS:
{combinations}

If NO (random text, spam, competitor, irrelevant), return confidence: 0.

Return ONLY JSON:
{{"name":"Official name","type":"TYPE","focus":"FOCUS","thesis":"one sentence","ceo":"CEO name or null","confidence":0.0-1.0}}"#
    )
}

fn join<'a>(parts: impl Iterator<Item = &'a str>, sep: &str) -> String {
    parts.collect::<Vec<_>>().join(sep)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_taxonomy() {
        let prompt = classification_prompt("Lakestar");

        assert!(prompt.contains("\"Lakestar\""));
        assert!(prompt.contains("GRANT | VC | CVC | FAMILY_OFFICE | BANK | STRATEGIC | GOVERNMENT"));
        assert!(prompt.contains(
            "DEEP_TECH | CLIMATE | DEFENCE | ENERGY | INDUSTRIAL | INFRASTRUCTURE | SOCIAL_IMPACT"
        ));
        assert!(prompt.contains("- VC: any focus"));
        assert!(prompt.contains("- BANK: INDUSTRIAL\n"));
        assert!(prompt.contains("- CVC: CLIMATE, ENERGY, INDUSTRIAL, INFRASTRUCTURE"));
        assert!(prompt.contains(r#"{"name":"Official name","type":"TYPE""#));
    }
}
