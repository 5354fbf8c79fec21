// 🧹 Candidate Normalization - Strip operator noise from extracted codes
//
// Operators append things to the code they type:
// - "tab.abono 2", "tab.abono(3)"   → sequence numbers
// - "tab.abono v2", "tab.abono_V3"  → version tokens
// - "tab.abono.pdf"                 → file names pasted from attachments
// All of that is removed; what is left is the code itself.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::trace;

lazy_static! {
    /// " V10", "_v3", ".v2" at the end; a separator is required so "tv2" stays "tv"
    static ref VERSION_SUFFIX: Regex = Regex::new(r"(?i)(?:^|[\s._-]+)v\d+$").unwrap();

    /// "2", " 12", "(3)", " (3)" at the end
    static ref SEQUENCE_SUFFIX: Regex = Regex::new(r"\s*\(?\d+\)?$").unwrap();

    /// Fixed list only: a free-form ".xyz" rule would eat real second segments
    static ref EXTENSION_SUFFIX: Regex =
        Regex::new(r"(?i)\.(?:pdf|docx?|xlsx?|csv|txt|png|jpe?g)$").unwrap();
}

/// Normalize one extracted candidate.
///
/// Rules are re-applied until nothing changes, so
/// `normalize_candidate(&normalize_candidate(x)) == normalize_candidate(x)`.
///
/// # Examples:
/// ```
/// use tabulacion_ranking::normalize::normalize_candidate;
///
/// assert_eq!(normalize_candidate("tab.abono 2"), "tab.abono");
/// assert_eq!(normalize_candidate("tab.abono v2"), "tab.abono");
/// assert_eq!(normalize_candidate("tab.abono.pdf"), "tab.abono");
/// ```
pub fn normalize_candidate(raw: &str) -> String {
    let mut current = raw.trim().to_string();

    loop {
        let next = strip_once(&current);
        if next == current {
            trace!(raw, normalized = current.as_str(), "candidate normalized");
            return current;
        }
        current = next;
    }
}

/// One pass over every suffix rule
fn strip_once(s: &str) -> String {
    let stripped = VERSION_SUFFIX.replace(s, "");
    let stripped = SEQUENCE_SUFFIX.replace(&stripped, "");
    let stripped = EXTENSION_SUFFIX.replace(&stripped, "");

    stripped
        .trim_end_matches(|c: char| c == '.' || c == '_' || c == '-' || c.is_whitespace())
        .trim_start()
        .to_string()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_sequence_numbers() {
        assert_eq!(normalize_candidate("tab.abono 2"), "tab.abono");
        assert_eq!(normalize_candidate("tab.abono2"), "tab.abono");
        assert_eq!(normalize_candidate("tab.abono(3)"), "tab.abono");
        assert_eq!(normalize_candidate("tab.abono (12)"), "tab.abono");
    }

    #[test]
    fn test_strips_version_tokens() {
        assert_eq!(normalize_candidate("tab.abono v2"), "tab.abono");
        assert_eq!(normalize_candidate("tab.abono V10"), "tab.abono");
        assert_eq!(normalize_candidate("tab.abono_v3"), "tab.abono");
        assert_eq!(normalize_candidate("tab.sac.v2"), "tab.sac");
    }

    #[test]
    fn test_glued_v_digits_are_not_versions() {
        assert_eq!(normalize_candidate("tab.tv2"), "tab.tv");
        assert_eq!(normalize_candidate("tab.pago.nov2023"), "tab.pago.nov");
        assert_eq!(normalize_candidate("tab.abonov2"), "tab.abonov");
    }

    #[test]
    fn test_strips_known_extensions_only() {
        assert_eq!(normalize_candidate("tab.abono.pdf"), "tab.abono");
        assert_eq!(normalize_candidate("tab.abono.XLSX"), "tab.abono");
        assert_eq!(normalize_candidate("tab.app.acceso"), "tab.app.acceso");
        assert_eq!(normalize_candidate("tab.web.acceso"), "tab.web.acceso");
    }

    #[test]
    fn test_stacked_suffixes() {
        assert_eq!(normalize_candidate("tab.abono v2 (3)"), "tab.abono");
        assert_eq!(normalize_candidate("tab.abono.pdf 2"), "tab.abono");
        assert_eq!(normalize_candidate("tab.abono.2"), "tab.abono");
    }

    #[test]
    fn test_trims_whitespace() {
        assert_eq!(normalize_candidate("   tab.portacancelada  "), "tab.portacancelada");
        assert_eq!(normalize_candidate(""), "");
        assert_eq!(normalize_candidate("   "), "");
    }

    #[test]
    fn test_keeps_clean_codes() {
        assert_eq!(normalize_candidate("tab.soportefanftth"), "tab.soportefanftth");
        assert_eq!(normalize_candidate("tab.cambioplan.upgrade"), "tab.cambioplan.upgrade");
    }

    #[test]
    fn test_idempotence() {
        let inputs = [
            "tab.abono 2",
            "tab.abono v2 (3)",
            "tab.abono.pdf 2",
            "tab.sac.v2",
            "tab.123",
            "  tab.reclamo.cobro_v1.docx ",
            "v2",
            "(7)",
            "",
        ];

        for input in inputs {
            let once = normalize_candidate(input);
            let twice = normalize_candidate(&once);
            assert_eq!(once, twice, "not idempotent for {:?}", input);
        }
    }
}
