// 📤 Report Export - RankedReport → JSON / CSV for the presentation layer

use crate::aggregator::{AggregationOutcome, AggregationSummary, RankedReport};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::io::Write;

/// One chart bar
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub code: String,
    pub count: usize,
    pub in_taxonomy: bool,
}

/// Report plus run metadata
#[derive(Debug, Clone, Serialize)]
pub struct ReportEnvelope {
    pub generated_at: DateTime<Utc>,
    pub limit: usize,
    pub fingerprint: String,
    pub summary: AggregationSummary,
    pub entries: Vec<ReportRow>,
}

impl ReportEnvelope {
    pub fn new(outcome: &AggregationOutcome, limit: usize) -> Self {
        ReportEnvelope {
            generated_at: Utc::now(),
            limit,
            fingerprint: report_fingerprint(&outcome.report),
            summary: outcome.summary.clone(),
            entries: rows(&outcome.report),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize report")
    }
}

pub fn rows(report: &RankedReport) -> Vec<ReportRow> {
    report
        .iter()
        .map(|entry| ReportRow {
            code: entry.display_name().to_string(),
            count: entry.count,
            in_taxonomy: entry.code.is_canonical(),
        })
        .collect()
}

/// SHA-256 over the ordered (code, count) pairs.
/// Two reports with the same ranking share a fingerprint.
pub fn report_fingerprint(report: &RankedReport) -> String {
    let mut hasher = Sha256::new();
    for entry in report.iter() {
        hasher.update(format!("{}\t{}\n", entry.display_name(), entry.count));
    }
    format!("{:x}", hasher.finalize())
}

/// Write `code,count` CSV (header included)
pub fn write_csv<W: Write>(report: &RankedReport, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record(["code", "count"])
        .context("Failed to write CSV header")?;
    for entry in report.iter() {
        let count = entry.count.to_string();
        wtr.write_record([entry.display_name(), count.as_str()])
            .context("Failed to write CSV row")?;
    }

    wtr.flush().context("Failed to flush CSV output")?;
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
