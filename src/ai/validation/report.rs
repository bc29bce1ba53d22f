//! Report Acceptance
//!
//! Minimum-content heuristics for AI-written reports: long enough, and
//! mentions enough of the required section names. No semantic checks are
//! made on the prose or the arithmetic inside it.

use crate::report::sections::REQUIRED_SECTIONS;

/// Thresholds an AI report must meet
#[derive(Debug, Clone, Copy)]
pub struct AcceptancePolicy {
    /// Trimmed character count must exceed this
    pub min_chars: usize,
    /// At least this many required section names must appear (case-insensitive)
    pub min_section_keywords: usize,
}

/// Why a report was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Empty,
    TooShort { chars: usize, min: usize },
    MissingSections { found: usize, min: usize },
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::Empty => write!(f, "empty response"),
            Rejection::TooShort { chars, min } => {
                write!(f, "response too short ({} chars, need more than {})", chars, min)
            }
            Rejection::MissingSections { found, min } => write!(
                f,
                "only {} required sections mentioned (need {})",
                found, min
            ),
        }
    }
}

impl AcceptancePolicy {
    pub fn check(&self, text: &str) -> Result<(), Rejection> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(Rejection::Empty);
        }

        let chars = trimmed.chars().count();
        if chars <= self.min_chars {
            return Err(Rejection::TooShort {
                chars,
                min: self.min_chars,
            });
        }

        let found = count_section_mentions(trimmed);
        if found < self.min_section_keywords {
            return Err(Rejection::MissingSections {
                found,
                min: self.min_section_keywords,
            });
        }

        Ok(())
    }
}

/// Number of required section names mentioned anywhere in the text.
/// "&" and "and" are interchangeable.
pub fn count_section_mentions(text: &str) -> usize {
    let haystack = text.to_lowercase().replace('&', "and");
    REQUIRED_SECTIONS
        .iter()
        .filter(|name| haystack.contains(&name.to_lowercase().replace('&', "and")))
        .count()
}
