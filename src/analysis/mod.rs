//! Text cleaning and field extraction
//!
//! Pure functions over recognized strings: strip OCR noise from card
//! names, pull the set code and collector number out of the collector
//! band, and rank candidate lines for the lookup cascade.

use regex::Regex;
use std::sync::OnceLock;
use uuid::Uuid;

/// Set code + collector number pulled from the collector-info band
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorInfo {
    /// Set code, upper-cased (e.g. "MID")
    pub set_code: String,
    /// Collector number within the set (e.g. "245")
    pub collector_number: String,
}

/// Cleaned candidates extracted from one scan: transient, never persisted
#[derive(Debug, Clone)]
pub struct ScanAttempt {
    /// Correlation id for log spans
    pub id: Uuid,
    /// Collector info, when the bottom band produced a usable match
    pub collector: Option<CollectorInfo>,
    /// Ranked name candidates in OCR top-to-bottom order
    pub candidates: Vec<String>,
}

impl ScanAttempt {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            collector: None,
            candidates: Vec::new(),
        }
    }

    /// True when nothing usable was extracted from any zone
    pub fn is_empty(&self) -> bool {
        self.collector.is_none() && self.candidates.is_empty()
    }
}

impl Default for ScanAttempt {
    fn default() -> Self {
        Self::new()
    }
}

/// Candidates closer than this (normalized Levenshtein) are duplicates
const DUPLICATE_SIMILARITY: f64 = 0.85;

fn collector_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)([A-Za-z0-9]{3,})\s*(\d+)").expect("collector pattern is valid")
    })
}

/// Strip a recognized card name down to Latin letters and whitespace.
///
/// Card names in the source language are pure text; OCR noise injects
/// digits and punctuation that would poison the fuzzy match. Internal
/// whitespace is collapsed, the result trimmed.
pub fn clean_name(raw: &str) -> String {
    let filtered: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphabetic() || c.is_whitespace())
        .collect();

    filtered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Locate a set code and collector number anywhere in the collector-band
/// text. First match wins; no match yields `None`, the signal to fall
/// back to name-based search.
pub fn extract_collector_info(raw: &str) -> Option<CollectorInfo> {
    let caps = collector_regex().captures(raw)?;
    Some(CollectorInfo {
        set_code: caps[1].to_uppercase(),
        collector_number: caps[2].to_string(),
    })
}

/// Split recognized text into cleaned candidate lines, keeping only lines
/// longer than `min_len` characters, in OCR top-to-bottom order.
pub fn candidate_lines(raw: &str, min_len: usize) -> Vec<String> {
    raw.lines()
        .map(clean_name)
        .filter(|line| line.chars().count() > min_len)
        .collect()
}

/// Merge candidates from a later recognition pass into an existing ranked
/// list, suppressing near-duplicates so repeated passes at different
/// thresholds don't flood the cascade with OCR jitter of the same name.
/// First-seen order is preserved.
pub fn merge_candidates(existing: &mut Vec<String>, incoming: Vec<String>) {
    for candidate in incoming {
        let duplicate = existing.iter().any(|seen| {
            strsim::normalized_levenshtein(&seen.to_lowercase(), &candidate.to_lowercase())
                >= DUPLICATE_SIMILARITY
        });
        if !duplicate {
            existing.push(candidate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_name_strips_non_latin() {
        assert_eq!(clean_name("Lightning; Bolt! 3"), "Lightning Bolt");
        assert_eq!(clean_name("  Opt\t"), "Opt");
        assert_eq!(clean_name("123 456"), "");
    }

    #[test]
    fn test_clean_name_collapses_whitespace() {
        assert_eq!(clean_name("Serra   \u{a0}  Angel"), "Serra Angel");
        let cleaned = clean_name("  Giant Growth  ");
        assert!(!cleaned.starts_with(' ') && !cleaned.ends_with(' '));
    }

    #[test]
    fn test_clean_name_removes_rather_than_splits() {
        // Noise inside a word must not break the word apart
        assert_eq!(clean_name("Fa3ct0ory W-orker"), "Factory Worker");
        let cleaned = clean_name("Fa3ct?ory Wo_rker #7");
        assert!(cleaned
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c == ' '));
    }

    #[test]
    fn test_extract_collector_info_direct_hit() {
        let info = extract_collector_info("MID 245").unwrap();
        assert_eq!(info.set_code, "MID");
        assert_eq!(info.collector_number, "245");
    }

    #[test]
    fn test_extract_collector_info_from_noisy_band() {
        // Collector bands carry rarity letters and artist credits around the code
        let info = extract_collector_info("~ mid 245/277 U — J. Artist").unwrap();
        assert_eq!(info.set_code, "MID");
        assert_eq!(info.collector_number, "245");
    }

    #[test]
    fn test_extract_collector_info_first_match_wins() {
        let info = extract_collector_info("NEO 17 ... DMU 42").unwrap();
        assert_eq!(info.set_code, "NEO");
        assert_eq!(info.collector_number, "17");
    }

    #[test]
    fn test_extract_collector_info_requires_three_alnum() {
        assert!(extract_collector_info("M 245").is_none());
        assert!(extract_collector_info("no digits here").is_none());
        assert!(extract_collector_info("").is_none());
    }

    #[test]
    fn test_candidate_lines_keeps_order_and_drops_short() {
        let text = "Lightning Bolt\nxqz\n3: Instant spell\nok";
        let candidates = candidate_lines(text, 4);
        assert_eq!(candidates, vec!["Lightning Bolt", "Instant spell"]);
    }

    #[test]
    fn test_candidate_lines_short_noise_yields_nothing() {
        assert!(candidate_lines("xqz", 4).is_empty());
    }

    #[test]
    fn test_merge_candidates_suppresses_near_duplicates() {
        let mut ranked = vec!["Lightning Bolt".to_string()];
        merge_candidates(
            &mut ranked,
            vec!["Lightning Bolf".to_string(), "Shock".to_string()],
        );
        assert_eq!(ranked, vec!["Lightning Bolt", "Shock"]);
    }

    #[test]
    fn test_merge_candidates_preserves_first_seen_order() {
        let mut ranked = vec!["Opt".to_string()];
        merge_candidates(&mut ranked, vec!["Ponder".to_string(), "Opt".to_string()]);
        assert_eq!(ranked, vec!["Opt", "Ponder"]);
    }

    #[test]
    fn test_scan_attempt_emptiness() {
        let mut attempt = ScanAttempt::new();
        assert!(attempt.is_empty());
        attempt.collector = Some(CollectorInfo {
            set_code: "MID".to_string(),
            collector_number: "245".to_string(),
        });
        assert!(!attempt.is_empty());
    }
}
