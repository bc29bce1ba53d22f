//! JSON Extraction
//!
//! Best-effort recovery of a JSON object from vision model output.
//!
//! Handles common output issues:
//! - Markdown code fence wrapping (```json ... ```)
//! - JSON embedded in explanatory text
//! - Trailing commas inside the embedded object

use serde_json::Value;
use tracing::debug;

/// Extract and parse a JSON object from a model response.
///
/// Non-object JSON (an array wrapping the object, say) is searched for its
/// first embedded object. Returns `None` when no parseable JSON object can be
/// recovered; the caller decides how to degrade.
pub fn extract_json_from_response(content: &str) -> Option<Value> {
    JsonRepairer::new().parse_or_repair(content)
}

/// JSON recovery strategies, tried from least to most invasive
#[derive(Debug, Default)]
pub struct JsonRepairer;

impl JsonRepairer {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_or_repair(&self, raw: &str) -> Option<Value> {
        let cleaned = self.preprocess(raw);

        match serde_json::from_str::<Value>(&cleaned) {
            Ok(value) if value.is_object() => return Some(value),
            Ok(_) => debug!("Response is JSON but not an object, searching inside it"),
            Err(_) => debug!("Direct JSON parse failed, searching for embedded object"),
        }

        let region = self.extract_balanced_object(&cleaned)?;
        if let Ok(value) = serde_json::from_str::<Value>(region) {
            return Some(value);
        }

        let repaired = self.fix_trailing_commas(region);
        match serde_json::from_str::<Value>(&repaired) {
            Ok(value) => {
                debug!("JSON recovered after removing trailing commas");
                Some(value)
            }
            Err(e) => {
                debug!("Embedded JSON object is not parseable: {}", e);
                None
            }
        }
    }

    /// Trim, strip code fences and BOM
    fn preprocess(&self, raw: &str) -> String {
        let s = raw.trim().trim_start_matches('\u{feff}');
        self.strip_code_fences(s).trim().to_string()
    }

    /// Remove a leading ```lang line and a trailing ``` marker
    fn strip_code_fences<'a>(&self, s: &'a str) -> &'a str {
        let mut result = s;

        if result.starts_with("```") {
            result = match result.find('\n') {
                Some(first_newline) => &result[first_newline + 1..],
                None => result.trim_start_matches('`').trim_start_matches("json"),
            };
        }

        if let Some(stripped) = result.trim_end().strip_suffix("```") {
            result = stripped;
        }

        result
    }

    /// First `{...}` region whose braces balance, ignoring braces inside strings
    fn extract_balanced_object<'a>(&self, s: &'a str) -> Option<&'a str> {
        let start = s.find('{')?;
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escape = false;

        for (i, ch) in s[start..].char_indices() {
            if escape {
                escape = false;
                continue;
            }

            match ch {
                '\\' if in_string => escape = true,
                '"' => in_string = !in_string,
                '{' if !in_string => depth += 1,
                '}' if !in_string => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(&s[start..start + i + 1]);
                    }
                }
                _ => {}
            }
        }

        None
    }

    /// Drop commas that directly precede `]` or `}` outside strings
    fn fix_trailing_commas(&self, s: &str) -> String {
        let chars: Vec<char> = s.chars().collect();
        let mut result = String::with_capacity(s.len());
        let mut in_string = false;
        let mut escape = false;

        for (i, &ch) in chars.iter().enumerate() {
            if escape {
                escape = false;
                result.push(ch);
                continue;
            }

            match ch {
                '\\' if in_string => escape = true,
                '"' => in_string = !in_string,
                ',' if !in_string => {
                    let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                    if matches!(next, Some(']') | Some('}')) {
                        continue;
                    }
                }
                _ => {}
            }

            result.push(ch);
        }

        result
    }
}
