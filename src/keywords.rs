// 🏷️ Keyword Rules - Last structured chance before "Unclassified"
// Rules as data: keyword → label, checked against the lower-cased task name

use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// ============================================================================
// RULE DEFINITION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRule {
    /// Substring to look for (case-insensitive)
    pub keyword: String,

    /// Candidate emitted when the keyword is present
    pub label: String,

    /// Priority (higher = reported first)
    #[serde(default = "default_priority")]
    pub priority: i32,
}

fn default_priority() -> i32 {
    0
}

impl KeywordRule {
    pub fn new(keyword: &str, label: &str) -> Self {
        KeywordRule {
            keyword: keyword.to_string(),
            label: label.to_string(),
            priority: default_priority(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Check if the keyword occurs in an already lower-cased text
    pub fn matches(&self, lowered: &str) -> bool {
        let keyword = self.keyword.trim().to_lowercase();
        !keyword.is_empty() && lowered.contains(&keyword)
    }
}

// ============================================================================
// RULE SET
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct KeywordRules {
    rules: Vec<KeywordRule>,
}

impl KeywordRules {
    /// Create an empty rule set
    pub fn new() -> Self {
        KeywordRules { rules: Vec::new() }
    }

    /// Customer-service and support keywords seen in the dashboards
    pub fn with_defaults() -> Self {
        KeywordRules::from_rules(vec![
            KeywordRule::new("customer", "customer"),
            KeywordRule::new("soporte", "soporte"),
        ])
    }

    /// Load rules from a JSON array of `{ "keyword", "label", "priority"? }`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read keyword file: {:?}", path.as_ref()))?;

        let rules: Vec<KeywordRule> =
            serde_json::from_str(&content).context("Failed to parse keyword JSON")?;

        Ok(KeywordRules::from_rules(rules))
    }

    /// Create from a list of rules (stable by priority, higher first)
    pub fn from_rules(mut rules: Vec<KeywordRule>) -> Self {
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        KeywordRules { rules }
    }

    pub fn add_rule(&mut self, rule: KeywordRule) {
        self.rules.push(rule);
        self.rules.sort_by(|a, b| b.priority.cmp(&a.priority));
    }

    /// Labels of every matching rule, in rule order, without repeats
    pub fn labels_for(&self, lowered: &str) -> Vec<String> {
        let mut labels: Vec<String> = Vec::new();

        for rule in self.rules.iter().filter(|rule| rule.matches(lowered)) {
            if !labels.contains(&rule.label) {
                labels.push(rule.label.clone());
            }
        }

        labels
    }

    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

// ============================================================================
// TESTS
// ============================================================================
