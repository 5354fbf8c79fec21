// ⚙️ Engine Configuration - Everything the engine needs, passed in explicitly
//
// A JSON file may override any subset of fields:
// {
//   "prefix": "tab",
//   "misspelled_prefixes": ["tap"],
//   "delimiters": ["-", ":", "|", "–", "—"],
//   "keywords": [{ "keyword": "customer", "label": "customer" }],
//   "taxonomy": ["tab.abono", "tab.baja"],
//   "tie_break": "first_seen",
//   "default_limit": 10
// }

use crate::aggregator::{Aggregator, TieBreak};
use crate::canonicalizer::Canonicalizer;
use crate::extractor::{CodeExtractor, UNCLASSIFIED};
use crate::keywords::{KeywordRule, KeywordRules};
use crate::taxonomy::ReferenceTaxonomy;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Code namespace ("tab")
    pub prefix: String,

    /// Common typos of the prefix, corrected during extraction
    pub misspelled_prefixes: Vec<String>,

    /// Split characters for the separator fallback
    pub delimiters: Vec<char>,

    /// Keyword fallback rules
    pub keywords: Vec<KeywordRule>,

    /// Reference vocabulary; `None` = built-in codes
    pub taxonomy: Option<Vec<String>>,

    pub tie_break: TieBreak,

    /// Report length when the caller does not ask for one
    pub default_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            prefix: "tab".to_string(),
            misspelled_prefixes: vec!["tap".to_string()],
            delimiters: vec!['-', ':', '|', '–', '—'],
            keywords: KeywordRules::with_defaults().rules().to_vec(),
            taxonomy: None,
            tie_break: TieBreak::FirstSeen,
            default_limit: 10,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file (missing fields use defaults)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: EngineConfig =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;

        config.validate()?;
        debug!(path = ?path.as_ref(), "engine config loaded");
        Ok(config)
    }

    /// Config file if given, defaults otherwise
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.prefix.trim().is_empty() {
            bail!("Config error: prefix must not be empty");
        }

        if self.prefix.contains('.') {
            bail!("Config error: prefix must not contain '.' ({})", self.prefix);
        }

        if let Some(bad) = self
            .misspelled_prefixes
            .iter()
            .find(|p| p.trim().is_empty() || p.contains('.'))
        {
            bail!("Config error: invalid misspelled prefix {:?}", bad);
        }

        if let Some(rule) = self
            .keywords
            .iter()
            .find(|rule| rule.label.trim().eq_ignore_ascii_case(UNCLASSIFIED))
        {
            bail!(
                "Config error: keyword {:?} uses the reserved label {:?}",
                rule.keyword,
                rule.label
            );
        }

        Ok(())
    }

    pub fn reference_taxonomy(&self) -> ReferenceTaxonomy {
        match &self.taxonomy {
            Some(codes) => ReferenceTaxonomy::from_codes(codes),
            None => ReferenceTaxonomy::with_defaults(),
        }
    }

    /// Build the immutable engine
    pub fn build(&self) -> Result<Aggregator> {
        self.validate()?;

        let extractor = CodeExtractor::new(
            &self.prefix,
            &self.misspelled_prefixes,
            &self.delimiters,
            KeywordRules::from_rules(self.keywords.clone()),
        )?;
        let canonicalizer = Canonicalizer::new(self.reference_taxonomy());

        Ok(Aggregator::new(extractor, canonicalizer).with_tie_break(self.tie_break))
    }
}

// ============================================================================
// TESTS
// ============================================================================
