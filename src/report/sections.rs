//! Section Parser
//!
//! Splits report text from either composer path into an ordered
//! section-name → body map. Headings are recognized by exact-line matching
//! against a small table of accepted spellings after normalization:
//!
//! - markdown `#` / `*` markers are ignored
//! - a leading ordinal (`3.` or `3)`) is ignored
//! - a trailing `:` or `-` is ignored
//! - case is ignored and `&` matches `AND`
//!
//! A body runs from the line after its heading to the next recognized heading
//! of any kind, or to the end of the text.

use tracing::debug;

use crate::types::ReportSections;

/// The nine sections every report carries, in the order they are requested
pub const REQUIRED_SECTIONS: [&str; 9] = [
    "SCOPE & LIMITATIONS",
    "EXECUTIVE SUMMARY",
    "COST ESTIMATES",
    "TIME ESTIMATES",
    "MATERIALS LIST",
    "CONTRACTOR RECOMMENDATIONS",
    "DETAILED FINDINGS",
    "RECOMMENDATIONS",
    "CONCLUSION",
];

/// Key used when no recognized heading appears anywhere in the text
pub const CATCH_ALL_SECTION: &str = "REPORT CONTENT";

struct SectionHeading {
    key: &'static str,
    /// Normalized spellings (uppercase, `&` written as `AND`)
    spellings: &'static [&'static str],
}

/// Priority order: earlier entries claim their heading first
const SECTION_TABLE: &[SectionHeading] = &[
    SectionHeading {
        key: "SCOPE & LIMITATIONS",
        spellings: &["SCOPE AND LIMITATIONS", "SCOPE OF INSPECTION"],
    },
    SectionHeading {
        key: "EXECUTIVE SUMMARY",
        spellings: &["EXECUTIVE SUMMARY"],
    },
    SectionHeading {
        key: "COST ESTIMATES",
        spellings: &["COST ESTIMATES", "COST ESTIMATE", "ESTIMATED COSTS"],
    },
    SectionHeading {
        key: "TIME ESTIMATES",
        spellings: &["TIME ESTIMATES", "TIME ESTIMATE"],
    },
    SectionHeading {
        key: "MATERIALS LIST",
        spellings: &["MATERIALS LIST", "MATERIALS REQUIRED"],
    },
    SectionHeading {
        key: "CONTRACTOR RECOMMENDATIONS",
        spellings: &["CONTRACTOR RECOMMENDATIONS", "RECOMMENDED CONTRACTORS"],
    },
    SectionHeading {
        key: "DETAILED FINDINGS",
        spellings: &["DETAILED FINDINGS", "FINDINGS"],
    },
    SectionHeading {
        key: "RECOMMENDATIONS",
        spellings: &["RECOMMENDATIONS"],
    },
    SectionHeading {
        key: "CONCLUSION",
        spellings: &["CONCLUSION", "CONCLUSIONS"],
    },
    SectionHeading {
        key: CATCH_ALL_SECTION,
        spellings: &["REPORT CONTENT"],
    },
];

#[derive(Debug, Default, Clone, Copy)]
pub struct SectionParser;

impl SectionParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse report text into sections ordered by where they appear.
    /// Never fails; text without headings becomes a single catch-all section.
    pub fn parse(&self, text: &str) -> ReportSections {
        let lines: Vec<&str> = text.lines().collect();

        let headings: Vec<(usize, &'static str)> = lines
            .iter()
            .enumerate()
            .filter_map(|(i, line)| canonical_key(line).map(|key| (i, key)))
            .collect();

        let mut sections = ReportSections::new();

        if headings.is_empty() {
            debug!("No recognized headings, using catch-all section");
            let body = text.trim();
            if !body.is_empty() {
                sections.insert(CATCH_ALL_SECTION, body);
            }
            return sections;
        }

        let mut found: Vec<(usize, &'static str, String)> = Vec::new();
        for spec in SECTION_TABLE {
            let Some(&(start, _)) = headings.iter().find(|(_, key)| *key == spec.key) else {
                continue;
            };

            let end = headings
                .iter()
                .map(|&(line, _)| line)
                .find(|&line| line > start)
                .unwrap_or(lines.len());

            let body = lines[start + 1..end].join("\n").trim().to_string();
            if body.is_empty() {
                debug!("Dropping empty section {}", spec.key);
                continue;
            }
            found.push((start, spec.key, body));
        }

        found.sort_by_key(|(start, _, _)| *start);
        for (_, key, body) in found {
            sections.insert(key, body);
        }

        sections
    }
}

/// Canonical key for a heading line, if it is one
fn canonical_key(line: &str) -> Option<&'static str> {
    let normalized = normalize_heading(line)?;
    SECTION_TABLE
        .iter()
        .find(|spec| spec.spellings.contains(&normalized.as_str()))
        .map(|spec| spec.key)
}

fn normalize_heading(line: &str) -> Option<String> {
    let stripped = line
        .trim()
        .trim_start_matches(|c: char| c == '#' || c == '*' || c.is_whitespace());
    let stripped = strip_ordinal(stripped)
        .trim_start_matches('*')
        .trim_end_matches(|c: char| matches!(c, ':' | '-' | '*') || c.is_whitespace());

    if stripped.is_empty() {
        return None;
    }

    let normalized = stripped
        .to_uppercase()
        .replace('&', " AND ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    Some(normalized)
}

/// Drop a leading `3.` or `3)` ordinal
fn strip_ordinal(s: &str) -> &str {
    let rest = s.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() == s.len() {
        return s;
    }
    match rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
        Some(after) => after.trim_start(),
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_heading_variants() {
        for line in [
            "Scope and Limitations",
            "SCOPE & LIMITATIONS",
            "## 1. Scope & Limitations:",
            "**Scope and Limitations**",
            "1) scope  &  limitations -",
        ] {
            assert_eq!(canonical_key(line), Some("SCOPE & LIMITATIONS"), "{}", line);
        }
        assert_eq!(canonical_key("Findings"), Some("DETAILED FINDINGS"));
        assert_eq!(canonical_key("The findings are below"), None);
        assert_eq!(canonical_key(""), None);
        assert_eq!(canonical_key("2024. A year"), None);
    }

    #[test]
    fn test_mixed_case_and_spelling() {
        let text = "Scope and Limitations\nVisual only.\n\nExecutive Summary\nTwo defects.";
        let sections = SectionParser::new().parse(text);

        assert_eq!(sections.get("SCOPE & LIMITATIONS"), Some("Visual only."));
        assert_eq!(sections.get("EXECUTIVE SUMMARY"), Some("Two defects."));
    }

    #[test]
    fn test_order_follows_text_not_table() {
        let text = "CONCLUSION\nDone.\nCOST ESTIMATES\n$10\nEXECUTIVE SUMMARY\nFine.";
        let sections = SectionParser::new().parse(text);
        let keys: Vec<_> = sections.keys().collect();
        assert_eq!(keys, vec!["CONCLUSION", "COST ESTIMATES", "EXECUTIVE SUMMARY"]);
        assert_eq!(sections.get("CONCLUSION"), Some("Done."));
    }

    #[test]
    fn test_body_stops_at_any_later_heading() {
        let text = "\
1. EXECUTIVE SUMMARY
Summary text.
7. Detailed Findings:
Finding text.
3. Cost Estimates
$500";
        let sections = SectionParser::new().parse(text);
        assert_eq!(sections.get("EXECUTIVE SUMMARY"), Some("Summary text."));
        assert_eq!(sections.get("DETAILED FINDINGS"), Some("Finding text."));
        assert_eq!(sections.get("COST ESTIMATES"), Some("$500"));
    }

    #[test]
    fn test_recommendations_not_confused_with_contractor_section() {
        let text = "CONTRACTOR RECOMMENDATIONS\nHire a mason.\n\nRECOMMENDATIONS\nFix the lintel first.";
        let sections = SectionParser::new().parse(text);
        assert_eq!(sections.get("CONTRACTOR RECOMMENDATIONS"), Some("Hire a mason."));
        assert_eq!(sections.get("RECOMMENDATIONS"), Some("Fix the lintel first."));
    }

    #[test]
    fn test_empty_sections_dropped() {
        let text = "EXECUTIVE SUMMARY\n\n   \nCONCLUSION\nAll good.";
        let sections = SectionParser::new().parse(text);
        assert!(!sections.contains("EXECUTIVE SUMMARY"));
        assert_eq!(sections.len(), 1);
    }

    #[test]
    fn test_first_occurrence_wins() {
        let text = "CONCLUSION\nFirst.\nCONCLUSION\nSecond.";
        let sections = SectionParser::new().parse(text);
        assert_eq!(sections.get("CONCLUSION"), Some("First."));
        assert_eq!(sections.len(), 1);
    }

    #[test]
    fn test_no_headings_is_catch_all() {
        let sections = SectionParser::new().parse("  Just some prose about a roof.\n");
        assert_eq!(sections.len(), 1);
        assert_eq!(
            sections.get(CATCH_ALL_SECTION),
            Some("Just some prose about a roof.")
        );

        assert!(SectionParser::new().parse("   \n ").is_empty());
    }

    #[test]
    fn test_reparse_is_idempotent() {
        let text = "Intro line\n## Executive Summary\nLine one.\n  Line two.\n\nConclusion:\nThe end.\n";
        let parser = SectionParser::new();
        let first = parser.parse(text);
        let second = parser.parse(&first.to_text());

        assert_eq!(first, second);
        assert_eq!(second.get("EXECUTIVE SUMMARY"), Some("Line one.\n  Line two."));
    }

    proptest! {
        #[test]
        fn prop_reparse_is_idempotent(
            bodies in proptest::collection::vec("[a-z]{1,8}( [a-z0-9$.]{1,8}){0,5}", 1..9),
            keys in proptest::sample::subsequence(REQUIRED_SECTIONS.to_vec(), 1..9),
        ) {
            let text = keys
                .iter()
                .zip(bodies.iter().cycle())
                .map(|(key, body)| format!("{}\n{}", key.to_lowercase(), body))
                .collect::<Vec<_>>()
                .join("\n\n");

            let parser = SectionParser::new();
            let first = parser.parse(&text);
            let second = parser.parse(&first.to_text());
            prop_assert_eq!(first, second);
        }
    }
}
