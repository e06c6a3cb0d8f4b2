// 🧭 Taxonomy - Organization types, focus areas and their legal combinations
// Every classification that leaves this crate is a legal (type, focus) pair.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ORGANIZATION TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrgType {
    /// Public grant programme (EIC, Horizon Europe)
    Grant,

    /// Venture capital fund
    Vc,

    /// Corporate venture arm
    Cvc,

    /// Family office
    FamilyOffice,

    /// Bank / development bank
    Bank,

    /// Strategic corporate partner
    Strategic,

    /// Government body or agency
    Government,
}

impl OrgType {
    pub const ALL: [OrgType; 7] = [
        OrgType::Grant,
        OrgType::Vc,
        OrgType::Cvc,
        OrgType::FamilyOffice,
        OrgType::Bank,
        OrgType::Strategic,
        OrgType::Government,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrgType::Grant => "GRANT",
            OrgType::Vc => "VC",
            OrgType::Cvc => "CVC",
            OrgType::FamilyOffice => "FAMILY_OFFICE",
            OrgType::Bank => "BANK",
            OrgType::Strategic => "STRATEGIC",
            OrgType::Government => "GOVERNMENT",
        }
    }

    /// Exact match on the canonical spelling. No case folding.
    pub fn parse(value: &str) -> Option<OrgType> {
        OrgType::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

impl fmt::Display for OrgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ORGANIZATION FOCUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrgFocus {
    DeepTech,
    Climate,
    Defence,
    Energy,
    Industrial,
    Infrastructure,
    SocialImpact,
}

impl OrgFocus {
    pub const ALL: [OrgFocus; 7] = [
        OrgFocus::DeepTech,
        OrgFocus::Climate,
        OrgFocus::Defence,
        OrgFocus::Energy,
        OrgFocus::Industrial,
        OrgFocus::Infrastructure,
        OrgFocus::SocialImpact,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrgFocus::DeepTech => "DEEP_TECH",
            OrgFocus::Climate => "CLIMATE",
            OrgFocus::Defence => "DEFENCE",
            OrgFocus::Energy => "ENERGY",
            OrgFocus::Industrial => "INDUSTRIAL",
            OrgFocus::Infrastructure => "INFRASTRUCTURE",
            OrgFocus::SocialImpact => "SOCIAL_IMPACT",
        }
    }

    pub fn parse(value: &str) -> Option<OrgFocus> {
        OrgFocus::ALL.into_iter().find(|f| f.as_str() == value)
    }
}

impl fmt::Display for OrgFocus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ADJACENCY MATRIX
// ============================================================================

/// Focus areas that are legal for an organization type.
pub fn allowed_focuses(org_type: OrgType) -> &'static [OrgFocus] {
    use OrgFocus::*;

    match org_type {
        OrgType::Grant => &[DeepTech, Climate, Defence, Energy, Infrastructure, SocialImpact],
        OrgType::Vc => &OrgFocus::ALL,
        OrgType::Cvc => &[Climate, Energy, Industrial, Infrastructure],
        OrgType::FamilyOffice => &[Climate, Energy, Industrial, SocialImpact],
        OrgType::Bank => &[Industrial],
        OrgType::Strategic => &[Defence, Energy, Industrial, Infrastructure],
        OrgType::Government => &[Climate, Defence, Energy, Infrastructure, SocialImpact],
    }
}

/// Replacement focus used when an observed focus is illegal for its type.
/// Must itself be a member of `allowed_focuses(org_type)`.
pub fn default_focus(org_type: OrgType) -> OrgFocus {
    match org_type {
        OrgType::Grant => OrgFocus::DeepTech,
        OrgType::Vc => OrgFocus::DeepTech,
        OrgType::Cvc => OrgFocus::Energy,
        OrgType::FamilyOffice => OrgFocus::Industrial,
        OrgType::Bank => OrgFocus::Industrial,
        OrgType::Strategic => OrgFocus::Infrastructure,
        OrgType::Government => OrgFocus::Defence,
    }
}

pub fn is_legal(org_type: OrgType, focus: OrgFocus) -> bool {
    allowed_focuses(org_type).contains(&focus)
}

/// Lowercase "focus, type" hint used by the presentation layer
/// (e.g. "deep tech, vc").
pub fn audience_language(org_type: OrgType, focus: OrgFocus) -> String {
    format!(
        "{}, {}",
        focus.as_str().to_lowercase().replace('_', " "),
        org_type.as_str().to_lowercase().replace('_', " ")
    )
}

// ============================================================================
// AUTO-CORRECTION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Correction {
    pub org_type: OrgType,
    pub focus: OrgFocus,

    /// Focus was replaced by the type's default focus
    pub corrected: bool,

    /// Type was outside the taxonomy and forced to VC.
    /// Deliberately not folded into `corrected`.
    pub type_coerced: bool,
}

/// Repair an untrusted (type, focus) pair into a legal one.
///
/// An unknown type becomes `VC`, the one type that accepts every focus.
/// A focus that is unknown or illegal for the (possibly coerced) type is
/// replaced by `default_focus`, which sets `corrected`.
pub fn validate_and_correct(org_type: &str, focus: &str) -> Correction {
    let (org_type, type_coerced) = match OrgType::parse(org_type) {
        Some(t) => (t, false),
        None => (OrgType::Vc, true),
    };

    match OrgFocus::parse(focus) {
        Some(f) if is_legal(org_type, f) => Correction {
            org_type,
            focus: f,
            corrected: false,
            type_coerced,
        },
        _ => Correction {
            org_type,
            focus: default_focus(org_type),
            corrected: true,
            type_coerced,
        },
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_is_total_and_non_empty() {
        for t in OrgType::ALL {
            assert!(!allowed_focuses(t).is_empty(), "{} has no legal focus", t);
        }
    }

    #[test]
    fn test_default_focus_is_legal() {
        for t in OrgType::ALL {
            assert!(is_legal(t, default_focus(t)), "default focus illegal for {}", t);
        }
    }

    #[test]
    fn test_bank_is_singleton_and_vc_is_universal() {
        assert_eq!(allowed_focuses(OrgType::Bank), &[OrgFocus::Industrial]);
        for f in OrgFocus::ALL {
            assert!(is_legal(OrgType::Vc, f));
        }
    }

    #[test]
    fn test_correction_is_total_over_all_pairs() {
        for t in OrgType::ALL {
            for f in OrgFocus::ALL {
                let c = validate_and_correct(t.as_str(), f.as_str());

                assert_eq!(c.org_type, t);
                assert!(is_legal(c.org_type, c.focus));
                assert!(!c.type_coerced);

                if is_legal(t, f) {
                    assert_eq!(c.focus, f);
                    assert!(!c.corrected);
                } else {
                    assert_eq!(c.focus, default_focus(t));
                    assert!(c.corrected);
                }
            }
        }
    }

    #[test]
    fn test_unknown_type_becomes_vc_without_corrected_flag() {
        let c = validate_and_correct("ANGEL", "CLIMATE");
        assert_eq!(c.org_type, OrgType::Vc);
        assert_eq!(c.focus, OrgFocus::Climate);
        assert!(c.type_coerced);
        assert!(!c.corrected);
    }

    #[test]
    fn test_unknown_focus_falls_back_to_default() {
        let c = validate_and_correct("CVC", "BIOTECH");
        assert_eq!(c.org_type, OrgType::Cvc);
        assert_eq!(c.focus, OrgFocus::Energy);
        assert!(c.corrected);

        let c = validate_and_correct("", "");
        assert_eq!((c.org_type, c.focus), (OrgType::Vc, OrgFocus::DeepTech));
        assert!(c.corrected && c.type_coerced);
    }

    #[test]
    fn test_bank_climate_is_repaired() {
        let c = validate_and_correct("BANK", "CLIMATE");
        assert_eq!(c.focus, OrgFocus::Industrial);
        assert!(c.corrected);
    }

    #[test]
    fn test_parse_is_exact() {
        assert_eq!(OrgType::parse("FAMILY_OFFICE"), Some(OrgType::FamilyOffice));
        assert_eq!(OrgType::parse("vc"), None);
        assert_eq!(OrgFocus::parse("SOCIAL_IMPACT"), Some(OrgFocus::SocialImpact));
        assert_eq!(OrgFocus::parse("Deep Tech"), None);
    }

    #[test]
    fn test_serde_uses_canonical_names() {
        let json = serde_json::to_string(&OrgType::FamilyOffice).unwrap();
        assert_eq!(json, "\"FAMILY_OFFICE\"");
        let focus: OrgFocus = serde_json::from_str("\"DEEP_TECH\"").unwrap();
        assert_eq!(focus, OrgFocus::DeepTech);
    }

    #[test]
    fn test_audience_language() {
        assert_eq!(audience_language(OrgType::Vc, OrgFocus::DeepTech), "deep tech, vc");
        assert_eq!(
            audience_language(OrgType::FamilyOffice, OrgFocus::SocialImpact),
            "social impact, family office"
        );
    }
}
