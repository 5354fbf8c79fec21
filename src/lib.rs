// Tabulación Ranking - Core Library
// Free-text task names → canonical process codes → ranked top-N report

pub mod taxonomy;
pub mod normalize;
pub mod keywords;
pub mod extractor;
pub mod canonicalizer;
pub mod aggregator;
pub mod config;
pub mod records;
pub mod export;

// Re-export commonly used types
pub use taxonomy::{CanonicalCode, ReferenceTaxonomy, DEFAULT_CODES};
pub use normalize::normalize_candidate;
pub use keywords::{KeywordRule, KeywordRules};
pub use extractor::{
    Candidate, CodeExtractor, ExtractionStrategy, MatchLayer, UNCLASSIFIED,
    PatternStrategy, SeparatorStrategy, BarePrefixStrategy, KeywordStrategy,
};
pub use canonicalizer::{Canonicalizer, Classification};
pub use aggregator::{
    Aggregator, AggregationEntry, AggregationOutcome, AggregationSummary,
    RankedReport, RecordClassification, TieBreak,
};
pub use config::EngineConfig;
pub use records::{TaskRecord, load_csv, load_json, load_text, load_records};
pub use export::{ReportEnvelope, ReportRow, report_fingerprint, write_csv};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Rank task names with the built-in configuration.
///
/// ```
/// let report = tabulacion_ranking::rank_default(["tab.abono 2", "TAB.ABONO", "tap.abono v2"], 10)?;
/// assert_eq!(report.to_pairs(), vec![("tab.abono".to_string(), 3)]);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn rank_default<I, S>(texts: I, limit: usize) -> anyhow::Result<RankedReport>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Ok(EngineConfig::default().build()?.rank(texts, limit))
}
