// 📊 Aggregator - Task names → ranked top-N of process codes
//
// Counting is per record: a task that mentions the same code twice adds 1,
// not 2. Unclassified tasks never reach the report.

use crate::canonicalizer::{Canonicalizer, Classification};
use crate::extractor::{Candidate, CodeExtractor, MatchLayer};
use crate::records::TaskRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

// ============================================================================
// TIE BREAK
// ============================================================================

/// Ordering among entries with equal counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Keep the order in which codes were first encountered
    #[default]
    FirstSeen,

    /// Display name ascending (input-order independent)
    Alphabetical,
}

// ============================================================================
// REPORT TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregationEntry {
    pub code: Classification,
    pub count: usize,
}

impl AggregationEntry {
    pub fn display_name(&self) -> &str {
        self.code.display_name()
    }
}

/// Descending by count, at most `limit` entries, never "Unclassified"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RankedReport {
    entries: Vec<AggregationEntry>,
}

impl RankedReport {
    pub fn entries(&self) -> &[AggregationEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AggregationEntry> {
        self.entries.iter()
    }

    /// Count for a display name, if it made the cut
    pub fn count_of(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|entry| entry.display_name() == name)
            .map(|entry| entry.count)
    }

    /// (display-name, count) pairs, ready for a chart
    pub fn to_pairs(&self) -> Vec<(String, usize)> {
        self.entries
            .iter()
            .map(|entry| (entry.display_name().to_string(), entry.count))
            .collect()
    }
}

/// What the chain did with one task name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordClassification {
    /// Raw extractor output, duplicates included
    pub candidates: Vec<Candidate>,

    /// Distinct classifications, first-seen order, sentinel removed
    pub codes: Vec<Classification>,

    /// Layer that produced the candidates
    pub layer: MatchLayer,
}

impl RecordClassification {
    pub fn is_unclassified(&self) -> bool {
        self.codes.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregationSummary {
    /// Records seen
    pub records: usize,

    /// Records contributing at least one code
    pub classified: usize,

    /// Records resolved to "Unclassified"
    pub unclassified: usize,

    /// Distinct codes before truncation
    pub distinct_codes: usize,

    /// Records per winning layer
    pub by_layer: BTreeMap<MatchLayer, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationOutcome {
    pub report: RankedReport,
    pub summary: AggregationSummary,
}

// ============================================================================
// AGGREGATOR
// ============================================================================

pub struct Aggregator {
    extractor: CodeExtractor,
    canonicalizer: Canonicalizer,
    tie_break: TieBreak,
}

impl Aggregator {
    pub fn new(extractor: CodeExtractor, canonicalizer: Canonicalizer) -> Self {
        Aggregator {
            extractor,
            canonicalizer,
            tie_break: TieBreak::default(),
        }
    }

    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    pub fn canonicalizer(&self) -> &Canonicalizer {
        &self.canonicalizer
    }

    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    /// Run the chain on one task name and dedupe its codes
    pub fn classify(&self, text: &str) -> RecordClassification {
        let candidates = self.extractor.extract(text);
        let layer = candidates
            .first()
            .map(Candidate::layer)
            .unwrap_or(MatchLayer::Sentinel);

        let mut codes: Vec<Classification> = Vec::new();
        for code in candidates
            .iter()
            .filter_map(|candidate| self.canonicalizer.canonicalize_candidate(candidate))
        {
            if !codes.contains(&code) {
                codes.push(code);
            }
        }

        RecordClassification {
            candidates,
            codes,
            layer,
        }
    }

    /// Ranked top-`limit` report over a collection of task names
    pub fn rank<I, S>(&self, texts: I, limit: usize) -> RankedReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.aggregate(texts, limit).report
    }

    /// Ranked report over task records (missing names count as empty text)
    pub fn aggregate_records(&self, records: &[TaskRecord], limit: usize) -> AggregationOutcome {
        self.aggregate(records.iter().map(TaskRecord::raw_text), limit)
    }

    /// Ranked report plus run summary
    pub fn aggregate<I, S>(&self, texts: I, limit: usize) -> AggregationOutcome
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut summary = AggregationSummary::default();

        // Insertion-ordered tally: `entries` keeps first-seen order
        let mut entries: Vec<AggregationEntry> = Vec::new();
        let mut positions: HashMap<Classification, usize> = HashMap::new();

        for text in texts {
            let classification = self.classify(text.as_ref());

            summary.records += 1;
            *summary.by_layer.entry(classification.layer).or_insert(0) += 1;

            if classification.is_unclassified() {
                summary.unclassified += 1;
                continue;
            }
            summary.classified += 1;

            for code in classification.codes {
                match positions.get(&code) {
                    Some(&position) => entries[position].count += 1,
                    None => {
                        positions.insert(code.clone(), entries.len());
                        entries.push(AggregationEntry { code, count: 1 });
                    }
                }
            }
        }

        summary.distinct_codes = entries.len();

        // sort_by is stable: equal counts stay in first-seen order
        match self.tie_break {
            TieBreak::FirstSeen => entries.sort_by(|a, b| b.count.cmp(&a.count)),
            TieBreak::Alphabetical => entries.sort_by(|a, b| {
                b.count
                    .cmp(&a.count)
                    .then_with(|| a.display_name().cmp(b.display_name()))
            }),
        }
        entries.truncate(limit);

        info!(
            records = summary.records,
            classified = summary.classified,
            unclassified = summary.unclassified,
            distinct = summary.distinct_codes,
            reported = entries.len(),
            "aggregation finished"
        );
        debug!(?summary.by_layer, "records per layer");

        AggregationOutcome {
            report: RankedReport { entries },
            summary,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
