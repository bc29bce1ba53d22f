//! Defect and per-image analysis values
//!
//! Provider JSON is loosely shaped; everything is funnelled through the
//! validating factories here so the rest of the pipeline only ever sees
//! well-formed values.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::analysis as consts;

// =============================================================================
// Severity
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Severity {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl Severity {
    /// Parse a provider severity label, falling back to `Medium`
    pub fn parse_lossy(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "critical" | "severe" => Severity::Critical,
            "high" | "major" => Severity::High,
            "medium" | "moderate" => Severity::Medium,
            "low" | "minor" => Severity::Low,
            _ => Severity::default(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }

    /// Critical and High share the top cost/time tier
    pub fn is_high_tier(&self) -> bool {
        matches!(self, Severity::Critical | Severity::High)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Defect
// =============================================================================

/// A single observed defect. Immutable once built; `confidence_score` is
/// always within `0..=100`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct Defect {
    #[serde(rename = "type")]
    defect_type: String,
    location: String,
    severity: Severity,
    confidence_score: u8,
    description: String,
}

impl Defect {
    pub fn new(
        defect_type: impl Into<String>,
        location: impl Into<String>,
        severity: Severity,
        confidence_score: i64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            defect_type: defect_type.into(),
            location: location.into(),
            severity,
            confidence_score: clamp_confidence(confidence_score),
            description: description.into(),
        }
    }

    /// Build from a provider JSON record, substituting defaults for every
    /// missing or malformed field.
    pub fn from_json(value: &Value) -> Self {
        let defect_type = string_field(value, "type")
            .unwrap_or_else(|| consts::DEFAULT_DEFECT_TYPE.to_string());
        let location =
            string_field(value, "location").unwrap_or_else(|| consts::DEFAULT_LOCATION.to_string());
        let severity = value
            .get("severity")
            .and_then(Value::as_str)
            .map(Severity::parse_lossy)
            .unwrap_or_default();
        let confidence = value
            .get("confidence_score")
            .or_else(|| value.get("confidence"))
            .map(parse_confidence)
            .unwrap_or(consts::DEFAULT_CONFIDENCE);
        let description = string_field(value, "description").unwrap_or_default();

        Self {
            defect_type,
            location,
            severity,
            confidence_score: confidence,
            description,
        }
    }

    pub fn defect_type(&self) -> &str {
        &self.defect_type
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn confidence_score(&self) -> u8 {
        self.confidence_score
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether this defect warrants a structural engineer
    pub fn needs_structural_review(&self) -> bool {
        self.severity.is_high_tier() || self.defect_type.to_lowercase().contains("crack")
    }
}

impl From<Value> for Defect {
    fn from(value: Value) -> Self {
        Defect::from_json(&value)
    }
}

fn clamp_confidence(raw: i64) -> u8 {
    raw.clamp(0, consts::MAX_CONFIDENCE as i64) as u8
}

/// Accepts integers, floats and numeric strings; anything else is the default
fn parse_confidence(value: &Value) -> u8 {
    let numeric = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64)),
        Value::String(s) => {
            let trimmed = s.trim().trim_end_matches('%').trim();
            trimmed.parse::<i64>().ok().or_else(|| {
                trimmed
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.round() as i64)
            })
        }
        _ => None,
    };

    numeric
        .map(clamp_confidence)
        .unwrap_or(consts::DEFAULT_CONFIDENCE)
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// =============================================================================
// AnalysisResult
// =============================================================================

/// Findings for one successfully analyzed image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// 1-based position of the source image in the input list
    pub image_index: usize,
    pub description: String,
    pub overall_condition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_type: Option<String>,
    #[serde(default)]
    pub defects: Vec<Defect>,
}

impl AnalysisResult {
    /// Build from a parsed provider payload. Non-object payloads yield a
    /// degraded result carrying the serialized value.
    pub fn from_json(image_index: usize, value: &Value) -> Self {
        if !value.is_object() {
            return Self::degraded(image_index, &value.to_string());
        }

        let defects = value
            .get("defects")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter(|item| item.is_object())
                    .map(Defect::from_json)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            image_index,
            description: string_field(value, "description").unwrap_or_default(),
            overall_condition: string_field(value, "overall_condition")
                .unwrap_or_else(|| consts::DEFAULT_CONDITION.to_string()),
            material_type: string_field(value, "material_type"),
            defects,
        }
    }

    /// Result used when a provider answered but the answer held no usable JSON
    pub fn degraded(image_index: usize, raw: &str) -> Self {
        Self {
            image_index,
            description: raw
                .trim()
                .chars()
                .take(consts::DEGRADED_DESCRIPTION_CHARS)
                .collect(),
            overall_condition: consts::DEGRADED_CONDITION.to_string(),
            material_type: None,
            defects: Vec::new(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.overall_condition == consts::DEGRADED_CONDITION
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_defect_defaults() {
        let defect = Defect::from_json(&json!({"type": "Crack"}));
        assert_eq!(defect.defect_type(), "Crack");
        assert_eq!(defect.location(), "Not specified");
        assert_eq!(defect.severity(), Severity::Medium);
        assert_eq!(defect.confidence_score(), 50);
        assert_eq!(defect.description(), "");
    }

    #[test]
    fn test_confidence_variants() {
        let cases = [
            (json!(87), 87),
            (json!(150), 100),
            (json!(-4), 0),
            (json!(72.6), 73),
            (json!("64"), 64),
            (json!("90%"), 90),
            (json!("very sure"), 50),
            (json!(null), 50),
            (json!([1, 2]), 50),
        ];
        for (raw, expected) in cases {
            let defect = Defect::from_json(&json!({"confidence_score": raw}));
            assert_eq!(defect.confidence_score(), expected, "input {}", raw);
        }
    }

    #[test]
    fn test_severity_parse_lossy() {
        assert_eq!(Severity::parse_lossy("HIGH"), Severity::High);
        assert_eq!(Severity::parse_lossy(" critical "), Severity::Critical);
        assert_eq!(Severity::parse_lossy("minor"), Severity::Low);
        assert_eq!(Severity::parse_lossy("catastrophic?"), Severity::Medium);
    }

    #[test]
    fn test_needs_structural_review() {
        let crack = Defect::new("Hairline crack", "Wall", Severity::Low, 80, "");
        let stain = Defect::new("Stain", "Ceiling", Severity::Low, 80, "");
        let rot = Defect::new("Rot", "Joist", Severity::High, 80, "");
        assert!(crack.needs_structural_review());
        assert!(!stain.needs_structural_review());
        assert!(rot.needs_structural_review());
    }

    #[test]
    fn test_analysis_from_json() {
        let value = json!({
            "description": "Brick facade with efflorescence",
            "material_type": "Brick",
            "overall_condition": "Fair",
            "defects": [
                {"type": "Efflorescence", "location": "Lower courses", "severity": "Low",
                 "confidence_score": 88, "description": "White salt deposits"},
                "not an object",
                {"type": "Spalling", "severity": "High", "confidence_score": "n/a"}
            ]
        });
        let result = AnalysisResult::from_json(2, &value);
        assert_eq!(result.image_index, 2);
        assert_eq!(result.material_type.as_deref(), Some("Brick"));
        assert_eq!(result.defects.len(), 2);
        assert_eq!(result.defects[1].severity(), Severity::High);
        assert_eq!(result.defects[1].confidence_score(), 50);
        assert!(!result.is_degraded());
    }

    #[test]
    fn test_analysis_blank_material_is_none() {
        let result = AnalysisResult::from_json(1, &json!({"material_type": "  "}));
        assert_eq!(result.material_type, None);
        assert_eq!(result.overall_condition, "Unknown");
    }

    #[test]
    fn test_degraded_truncates() {
        let raw = "x".repeat(800);
        let result = AnalysisResult::degraded(4, &raw);
        assert_eq!(result.description.chars().count(), 500);
        assert_eq!(result.overall_condition, "Unknown - Analysis incomplete");
        assert!(result.defects.is_empty());
        assert!(result.is_degraded());
    }

    #[test]
    fn test_deserialize_validates() {
        let json = r#"{"image_index": 1, "description": "d", "overall_condition": "Good",
            "defects": [{"type": "Crack", "severity": "Low", "confidence_score": 400}]}"#;
        let result: AnalysisResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.defects[0].confidence_score(), 100);

        let round_trip: AnalysisResult =
            serde_json::from_str(&serde_json::to_string(&result).unwrap()).unwrap();
        assert_eq!(round_trip, result);
    }

    proptest! {
        #[test]
        fn prop_confidence_always_in_range(n in any::<i64>()) {
            let defect = Defect::from_json(&json!({"confidence_score": n}));
            prop_assert!(defect.confidence_score() <= 100);
        }

        #[test]
        fn prop_confidence_string_in_range(s in ".*") {
            let defect = Defect::from_json(&json!({"confidence_score": s}));
            prop_assert!(defect.confidence_score() <= 100);
        }

        #[test]
        fn prop_confidence_float_in_range(f in any::<f64>()) {
            let defect = Defect::from_json(&json!({"confidence_score": f}));
            prop_assert!(defect.confidence_score() <= 100);
        }
    }
}
