// 🔎 Code Extractor - Free text → candidate taxonomy codes
//
// Layered strategy chain. Each tier only runs when every tier before it
// came back empty:
//
//   tier 1  Primary "tab.x[.y]" + misspelled prefix ("tap.x" → "tab.x")
//   tier 2  Separator fallback ("Ticket - tab.x - urgente")
//   tier 3  Bare prefix anywhere ("revisar tab.x/algo")
//   tier 4  Keyword fallback ("customer", "soporte")
//   ----    Sentinel "Unclassified"

use crate::keywords::KeywordRules;
use crate::normalize::normalize_candidate;
use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Sentinel candidate for text with no recognizable reference
pub const UNCLASSIFIED: &str = "Unclassified";

// ============================================================================
// CORE TYPES
// ============================================================================

/// MatchLayer - Which strategy produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchLayer {
    Primary,
    Misspelling,
    Separator,
    BarePrefix,
    Keyword,
    Sentinel,
}

impl MatchLayer {
    /// Human-readable name for display
    pub fn name(&self) -> &'static str {
        match self {
            MatchLayer::Primary => "primary",
            MatchLayer::Misspelling => "misspelling",
            MatchLayer::Separator => "separator",
            MatchLayer::BarePrefix => "bare-prefix",
            MatchLayer::Keyword => "keyword",
            MatchLayer::Sentinel => "sentinel",
        }
    }

    /// Layers whose output goes through suffix normalization
    pub fn is_structured(&self) -> bool {
        matches!(
            self,
            MatchLayer::Primary
                | MatchLayer::Misspelling
                | MatchLayer::Separator
                | MatchLayer::BarePrefix
        )
    }
}

impl fmt::Display for MatchLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Candidate - A code-like substring found in a task name, or the sentinel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    Code { text: String, layer: MatchLayer },
    Unclassified,
}

impl Candidate {
    pub fn code(text: impl Into<String>, layer: MatchLayer) -> Self {
        Candidate::Code {
            text: text.into(),
            layer,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Candidate::Code { text, .. } => text,
            Candidate::Unclassified => UNCLASSIFIED,
        }
    }

    pub fn layer(&self) -> MatchLayer {
        match self {
            Candidate::Code { layer, .. } => *layer,
            Candidate::Unclassified => MatchLayer::Sentinel,
        }
    }

    pub fn is_unclassified(&self) -> bool {
        matches!(self, Candidate::Unclassified)
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// STRATEGY TRAIT
// ============================================================================

/// ExtractionStrategy - One layer of the chain
///
/// Receives the lower-cased task name and returns zero or more raw candidate
/// strings, left to right. Returning nothing defers to the next tier.
pub trait ExtractionStrategy: Send + Sync {
    fn layer(&self) -> MatchLayer;

    fn extract(&self, lowered: &str) -> Vec<String>;
}

/// Regex scan for `<prefix>.<letters/digits>[.<letters/digits>]`, accented
/// letters included, optionally rewriting the matched prefix (used for the
/// "tap." misspelling).
pub struct PatternStrategy {
    pattern: Regex,
    layer: MatchLayer,
    matched_prefix: String,
    canonical_prefix: String,
}

impl PatternStrategy {
    /// Primary scan: matches are kept as-is
    pub fn primary(prefix: &str) -> Result<Self> {
        Self::build(prefix, prefix, MatchLayer::Primary)
    }

    /// Misspelling scan: `misspelled` prefix is corrected to `prefix`
    pub fn misspelling(misspelled: &str, prefix: &str) -> Result<Self> {
        Self::build(misspelled, prefix, MatchLayer::Misspelling)
    }

    fn build(matched_prefix: &str, canonical_prefix: &str, layer: MatchLayer) -> Result<Self> {
        let matched_prefix = matched_prefix.trim().to_lowercase();
        let canonical_prefix = canonical_prefix.trim().to_lowercase();

        if matched_prefix.is_empty() || canonical_prefix.is_empty() {
            bail!("Code prefix must not be empty");
        }

        let source = format!(
            r"{}\.[\p{{L}}\p{{N}}]+(?:\.[\p{{L}}\p{{N}}]+)?",
            regex::escape(&matched_prefix)
        );
        let pattern = Regex::new(&source)
            .with_context(|| format!("Failed to compile code pattern: {}", source))?;

        Ok(PatternStrategy {
            pattern,
            layer,
            matched_prefix,
            canonical_prefix,
        })
    }
}

impl ExtractionStrategy for PatternStrategy {
    fn layer(&self) -> MatchLayer {
        self.layer
    }

    fn extract(&self, lowered: &str) -> Vec<String> {
        self.pattern
            .find_iter(lowered)
            .map(|m| {
                let found = m.as_str();
                if self.matched_prefix == self.canonical_prefix {
                    found.to_string()
                } else {
                    format!("{}{}", self.canonical_prefix, &found[self.matched_prefix.len()..])
                }
            })
            .collect()
    }
}

/// Split on delimiters; segments starting with the prefix token yield the
/// run up to the next whitespace.
pub struct SeparatorStrategy {
    token: String,
    delimiters: Vec<char>,
}

impl SeparatorStrategy {
    pub fn new(token: &str, delimiters: &[char]) -> Self {
        SeparatorStrategy {
            token: token.to_lowercase(),
            delimiters: delimiters.to_vec(),
        }
    }
}

impl ExtractionStrategy for SeparatorStrategy {
    fn layer(&self) -> MatchLayer {
        MatchLayer::Separator
    }

    fn extract(&self, lowered: &str) -> Vec<String> {
        lowered
            .split(|c: char| self.delimiters.contains(&c))
            .map(str::trim)
            .filter(|segment| segment.starts_with(&self.token))
            .filter_map(|segment| segment.split_whitespace().next())
            .map(str::to_string)
            .collect()
    }
}

/// First occurrence of the prefix token anywhere, up to the next whitespace
pub struct BarePrefixStrategy {
    token: String,
}

impl BarePrefixStrategy {
    pub fn new(token: &str) -> Self {
        BarePrefixStrategy {
            token: token.to_lowercase(),
        }
    }
}

impl ExtractionStrategy for BarePrefixStrategy {
    fn layer(&self) -> MatchLayer {
        MatchLayer::BarePrefix
    }

    fn extract(&self, lowered: &str) -> Vec<String> {
        let Some(start) = lowered.find(&self.token) else {
            return Vec::new();
        };

        lowered[start..]
            .split_whitespace()
            .next()
            .map(|run| vec![run.to_string()])
            .unwrap_or_default()
    }
}

/// Domain keywords mapped to fixed labels
pub struct KeywordStrategy {
    rules: KeywordRules,
}

impl KeywordStrategy {
    pub fn new(rules: KeywordRules) -> Self {
        KeywordStrategy { rules }
    }
}

impl ExtractionStrategy for KeywordStrategy {
    fn layer(&self) -> MatchLayer {
        MatchLayer::Keyword
    }

    fn extract(&self, lowered: &str) -> Vec<String> {
        // a label spelled like the sentinel would leak it into reports
        self.rules
            .labels_for(lowered)
            .into_iter()
            .filter(|label| !label.trim().eq_ignore_ascii_case(UNCLASSIFIED))
            .collect()
    }
}

// ============================================================================
// EXTRACTOR
// ============================================================================

/// Strategies whose outputs are concatenated; the chain stops at the first
/// tier that produces anything.
pub type Tier = Vec<Box<dyn ExtractionStrategy>>;

pub struct CodeExtractor {
    prefix: String,
    tiers: Vec<Tier>,
}

impl CodeExtractor {
    /// Build the standard chain.
    ///
    /// # Arguments
    /// * `prefix` - Code namespace ("tab")
    /// * `misspelled_prefixes` - Typos corrected to `prefix` ("tap")
    /// * `delimiters` - Separator fallback split characters
    /// * `keywords` - Keyword fallback rules
    pub fn new(
        prefix: &str,
        misspelled_prefixes: &[String],
        delimiters: &[char],
        keywords: KeywordRules,
    ) -> Result<Self> {
        let prefix = prefix.trim().to_lowercase();
        if prefix.is_empty() {
            bail!("Code prefix must not be empty");
        }
        let token = format!("{}.", prefix);

        let mut direct: Tier = vec![Box::new(PatternStrategy::primary(&prefix)?)];
        for misspelled in misspelled_prefixes {
            direct.push(Box::new(PatternStrategy::misspelling(misspelled, &prefix)?));
        }

        let separator: Box<dyn ExtractionStrategy> =
            Box::new(SeparatorStrategy::new(&token, delimiters));
        let bare_prefix: Box<dyn ExtractionStrategy> = Box::new(BarePrefixStrategy::new(&token));
        let keyword: Box<dyn ExtractionStrategy> = Box::new(KeywordStrategy::new(keywords));

        Ok(CodeExtractor::from_tiers(
            &prefix,
            vec![direct, vec![separator], vec![bare_prefix], vec![keyword]],
        ))
    }

    /// Build from an explicit chain (custom layers in tests or embedders)
    pub fn from_tiers(prefix: &str, tiers: Vec<Tier>) -> Self {
        CodeExtractor {
            prefix: prefix.trim().to_lowercase(),
            tiers,
        }
    }

    /// Extract candidates from one task name. Never returns an empty list.
    pub fn extract(&self, text: &str) -> Vec<Candidate> {
        let lowered = text.to_lowercase();

        if lowered.trim().is_empty() {
            return vec![Candidate::Unclassified];
        }

        for tier in &self.tiers {
            let candidates: Vec<Candidate> = tier
                .iter()
                .flat_map(|strategy| {
                    let layer = strategy.layer();
                    strategy
                        .extract(&lowered)
                        .into_iter()
                        .filter_map(move |raw| self.finish(raw, layer))
                })
                .collect();

            if !candidates.is_empty() {
                debug!(
                    text,
                    layer = %candidates[0].layer(),
                    count = candidates.len(),
                    "candidates extracted"
                );
                return candidates;
            }
        }

        debug!(text, "no candidates, unclassified");
        vec![Candidate::Unclassified]
    }

    /// Post-process one raw candidate; `None` when nothing code-like is left
    fn finish(&self, raw: String, layer: MatchLayer) -> Option<Candidate> {
        let text = if layer.is_structured() {
            normalize_candidate(&raw)
        } else {
            raw.trim().to_string()
        };

        if text.is_empty() || (layer.is_structured() && self.is_bare_prefix(&text)) {
            return None;
        }

        Some(Candidate::code(text, layer))
    }

    fn is_bare_prefix(&self, text: &str) -> bool {
        text.trim_end_matches('.').eq_ignore_ascii_case(&self.prefix)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keywords::KeywordRule;

    fn extractor() -> CodeExtractor {
        CodeExtractor::new(
            "tab",
            &["tap".to_string()],
            &['-', ':', '|', '–', '—'],
            KeywordRules::with_defaults(),
        )
        .unwrap()
    }

    fn texts(candidates: &[Candidate]) -> Vec<&str> {
        candidates.iter().map(Candidate::as_str).collect()
    }

    #[test]
    fn test_primary_match() {
        let candidates = extractor().extract("Gestión TAB.ABONO cliente");

        assert_eq!(texts(&candidates), vec!["tab.abono"]);
        assert_eq!(candidates[0].layer(), MatchLayer::Primary);
    }

    #[test]
    fn test_primary_two_segments() {
        let candidates = extractor().extract("tab.cambioplan.upgrade por solicitud");
        assert_eq!(texts(&candidates), vec!["tab.cambioplan.upgrade"]);
    }

    #[test]
    fn test_primary_keeps_every_mention_in_order() {
        let candidates = extractor().extract("tab.baja y luego tab.abono, otra vez tab.baja");
        assert_eq!(texts(&candidates), vec!["tab.baja", "tab.abono", "tab.baja"]);
    }

    #[test]
    fn test_primary_strips_sequence_number() {
        let candidates = extractor().extract("tab.abono2");
        assert_eq!(texts(&candidates), vec!["tab.abono"]);
    }

    #[test]
    fn test_misspelling_corrected() {
        let candidates = extractor().extract("tap.abono v2");

        assert_eq!(texts(&candidates), vec!["tab.abono"]);
        assert_eq!(candidates[0].layer(), MatchLayer::Misspelling);
    }

    #[test]
    fn test_misspelling_appended_after_primary() {
        let candidates = extractor().extract("tap.baja luego tab.abono");

        assert_eq!(texts(&candidates), vec!["tab.abono", "tab.baja"]);
        assert_eq!(candidates[0].layer(), MatchLayer::Primary);
        assert_eq!(candidates[1].layer(), MatchLayer::Misspelling);
    }

    #[test]
    fn test_primary_accepts_accented_segments() {
        let candidates = extractor().extract("tab.facturación pendiente");

        assert_eq!(texts(&candidates), vec!["tab.facturación"]);
        assert_eq!(candidates[0].layer(), MatchLayer::Primary);

        let candidates = extractor().extract("Caso - TAB.SEÑAL caida");
        assert_eq!(texts(&candidates), vec!["tab.señal"]);
        assert_eq!(candidates[0].layer(), MatchLayer::Primary);
    }

    #[test]
    fn test_separator_fallback() {
        // "_" right after the dot stops the primary pattern
        let candidates = extractor().extract("Caso | tab._nuevo urgente | cerrado");

        assert_eq!(texts(&candidates), vec!["tab._nuevo"]);
        assert_eq!(candidates[0].layer(), MatchLayer::Separator);
    }

    #[test]
    fn test_bare_prefix_fallback() {
        let candidates = extractor().extract("revisar (tab._nuevo) hoy");

        assert_eq!(texts(&candidates), vec!["tab._nuevo)"]);
        assert_eq!(candidates[0].layer(), MatchLayer::BarePrefix);
    }

    #[test]
    fn test_separator_runs_before_bare_prefix() {
        // bare prefix alone would take the first run, "tab._pendiente/x"
        let candidates = extractor().extract("revisar tab._pendiente/x | tab._nuevo fin");

        assert_eq!(texts(&candidates), vec!["tab._nuevo"]);
        assert_eq!(candidates[0].layer(), MatchLayer::Separator);
    }

    #[test]
    fn test_bare_prefix_alone_is_discarded() {
        let candidates = extractor().extract("tab. sin codigo");
        assert_eq!(candidates, vec![Candidate::Unclassified]);
    }

    #[test]
    fn test_ordinary_words_are_not_codes() {
        let candidates = extractor().extract("Tabla de tarifas - revisar");
        assert_eq!(candidates, vec![Candidate::Unclassified]);
    }

    #[test]
    fn test_keyword_fallback() {
        let candidates = extractor().extract("Consulta customer billing");

        assert_eq!(texts(&candidates), vec!["customer"]);
        assert_eq!(candidates[0].layer(), MatchLayer::Keyword);
    }

    #[test]
    fn test_keyword_not_used_when_code_found() {
        let candidates = extractor().extract("soporte tab.soportehfc");
        assert_eq!(texts(&candidates), vec!["tab.soportehfc"]);
    }

    #[test]
    fn test_sentinel_label_is_not_a_candidate() {
        let keywords = KeywordRules::from_rules(vec![
            KeywordRule::new("reclamo", " UNCLASSIFIED "),
            KeywordRule::new("customer", "customer"),
        ]);
        let extractor = CodeExtractor::new("tab", &[], &['-'], keywords).unwrap();

        assert_eq!(extractor.extract("Reclamo sin clasificar"), vec![Candidate::Unclassified]);
        assert_eq!(texts(&extractor.extract("reclamo customer")), vec!["customer"]);
    }

    #[test]
    fn test_sentinel() {
        assert_eq!(
            extractor().extract("Reclamo sin clasificar"),
            vec![Candidate::Unclassified]
        );
    }

    #[test]
    fn test_empty_and_whitespace_text() {
        assert_eq!(extractor().extract(""), vec![Candidate::Unclassified]);
        assert_eq!(extractor().extract("   \t "), vec![Candidate::Unclassified]);
    }

    #[test]
    fn test_never_empty() {
        let inputs = [
            "",
            "tab.",
            "tap.",
            "---",
            "|||:::",
            "tab.tab.tab.tab",
            "—– tab.x —",
            "12345",
            "ＴＡＢ．ａｂｏｎｏ",
        ];

        for input in inputs {
            assert!(!extractor().extract(input).is_empty(), "empty for {:?}", input);
        }
    }

    #[test]
    fn test_empty_prefix_rejected() {
        assert!(CodeExtractor::new("  ", &[], &['-'], KeywordRules::new()).is_err());
    }

    #[test]
    fn test_custom_tiers() {
        struct Fixed;

        impl ExtractionStrategy for Fixed {
            fn layer(&self) -> MatchLayer {
                MatchLayer::Keyword
            }

            fn extract(&self, _lowered: &str) -> Vec<String> {
                vec!["fijo".to_string()]
            }
        }

        let fixed: Box<dyn ExtractionStrategy> = Box::new(Fixed);
        let extractor = CodeExtractor::from_tiers("tab", vec![vec![fixed]]);
        assert_eq!(texts(&extractor.extract("lo que sea")), vec!["fijo"]);
    }
}
