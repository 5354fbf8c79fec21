// 🎯 Canonicalizer - Candidate → official code
// Same real-world code must never split into several display variants

use crate::extractor::Candidate;
use crate::taxonomy::{CanonicalCode, ReferenceTaxonomy};
use serde::{Serialize, Serializer};
use std::fmt;

/// Result of matching one candidate against the taxonomy
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Found in the taxonomy, official casing
    Canonical(CanonicalCode),

    /// Plausible but unknown code, lower-cased; still counted
    Unmatched(String),
}

impl Classification {
    pub fn display_name(&self) -> &str {
        match self {
            Classification::Canonical(code) => code.as_str(),
            Classification::Unmatched(text) => text,
        }
    }

    pub fn is_canonical(&self) -> bool {
        matches!(self, Classification::Canonical(_))
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl Serialize for Classification {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.display_name())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Canonicalizer {
    taxonomy: ReferenceTaxonomy,
}

impl Canonicalizer {
    pub fn new(taxonomy: ReferenceTaxonomy) -> Self {
        Canonicalizer { taxonomy }
    }

    pub fn taxonomy(&self) -> &ReferenceTaxonomy {
        &self.taxonomy
    }

    /// Case-insensitive exact match, falling back to the lower-cased text
    pub fn canonicalize(&self, candidate: &str) -> Classification {
        match self.taxonomy.lookup(candidate) {
            Some(code) => Classification::Canonical(code.clone()),
            None => Classification::Unmatched(candidate.trim().to_lowercase()),
        }
    }

    /// `None` for the sentinel: callers drop it before tallying
    pub fn canonicalize_candidate(&self, candidate: &Candidate) -> Option<Classification> {
        match candidate {
            Candidate::Unclassified => None,
            Candidate::Code { text, .. } => Some(self.canonicalize(text)),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::MatchLayer;

    #[test]
    fn test_case_variants_share_one_code() {
        let canonicalizer = Canonicalizer::default();

        let a = canonicalizer.canonicalize("tab.abono");
        let b = canonicalizer.canonicalize("TAB.ABONO");
        let c = canonicalizer.canonicalize("Tab.Abono");

        assert_eq!(a, b);
        assert_eq!(b, c);
        assert!(a.is_canonical());
        assert_eq!(a.display_name(), "tab.abono");
    }

    #[test]
    fn test_official_casing_wins() {
        let canonicalizer = Canonicalizer::default();

        let code = canonicalizer.canonicalize("tab.sac");
        assert_eq!(code.display_name(), "tab.SAC");
    }

    #[test]
    fn test_unmatched_passes_through_lowercased() {
        let canonicalizer = Canonicalizer::default();

        let code = canonicalizer.canonicalize("Tab.NuevoProceso");
        assert_eq!(code, Classification::Unmatched("tab.nuevoproceso".to_string()));
        assert!(!code.is_canonical());
    }

    #[test]
    fn test_synthetic_vocabulary() {
        let canonicalizer = Canonicalizer::new(ReferenceTaxonomy::from_codes(["x.Uno", "x.dos"]));

        assert_eq!(canonicalizer.canonicalize("X.UNO").display_name(), "x.Uno");
        assert!(!canonicalizer.canonicalize("tab.abono").is_canonical());
    }

    #[test]
    fn test_sentinel_is_dropped() {
        let canonicalizer = Canonicalizer::default();

        assert!(canonicalizer.canonicalize_candidate(&Candidate::Unclassified).is_none());

        let candidate = Candidate::code("TAB.PORTACANCELADA", MatchLayer::Primary);
        assert_eq!(
            canonicalizer.canonicalize_candidate(&candidate).unwrap().display_name(),
            "tab.portacancelada"
        );
    }

    #[test]
    fn test_serializes_as_display_name() {
        let canonicalizer = Canonicalizer::default();
        let json = serde_json::to_string(&canonicalizer.canonicalize("TAB.CALLBACK")).unwrap();

        assert_eq!(json, "\"TAB.CallBack\"");
    }
}
