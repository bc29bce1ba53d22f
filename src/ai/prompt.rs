//! Prompt Construction
//!
//! Two prompts drive the pipeline:
//!
//! 1. **Image analysis**: fixed instructions asking a vision model for one
//!    JSON object per photograph.
//! 2. **Report generation**: transcript, per-image findings, and the nine
//!    required sections in their fixed order.

use crate::report::sections::REQUIRED_SECTIONS;
use crate::report::template::ReportContext;
use crate::types::AnalysisResult;

/// Prompt section types
#[derive(Debug, Clone)]
enum PromptSection {
    Role { expertise: String, task: String },
    Objectives(Vec<String>),
    Section { header: String, content: String },
    Rules(Vec<String>),
}

/// Builder for consistently structured prompts
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    sections: Vec<PromptSection>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn role(mut self, expertise: &str, task: &str) -> Self {
        self.sections.push(PromptSection::Role {
            expertise: expertise.to_string(),
            task: task.to_string(),
        });
        self
    }

    pub fn objectives(mut self, objectives: Vec<&str>) -> Self {
        self.sections.push(PromptSection::Objectives(
            objectives.into_iter().map(String::from).collect(),
        ));
        self
    }

    /// Text section with a `#` header
    pub fn section(mut self, header: &str, content: &str) -> Self {
        self.sections.push(PromptSection::Section {
            header: header.to_string(),
            content: content.to_string(),
        });
        self
    }

    /// Hard constraints on the output
    pub fn rules(mut self, rules: Vec<&str>) -> Self {
        self.sections
            .push(PromptSection::Rules(rules.into_iter().map(String::from).collect()));
        self
    }

    pub fn build(self) -> String {
        let mut prompt = String::new();

        for section in self.sections {
            match section {
                PromptSection::Role { expertise, task } => {
                    prompt.push_str("<ROLE>\n");
                    prompt.push_str(&format!(
                        "You are an expert {} specializing in {}.\n",
                        expertise, task
                    ));
                    prompt.push_str("</ROLE>\n\n");
                }
                PromptSection::Objectives(objectives) => {
                    prompt.push_str("<OBJECTIVES>\n");
                    for (i, obj) in objectives.iter().enumerate() {
                        prompt.push_str(&format!("{}. {}\n", i + 1, obj));
                    }
                    prompt.push_str("</OBJECTIVES>\n\n");
                }
                PromptSection::Section { header, content } => {
                    prompt.push_str(&format!("# {}\n\n", header));
                    prompt.push_str(&content);
                    prompt.push_str("\n\n");
                }
                PromptSection::Rules(rules) => {
                    prompt.push_str("<RULES>\n");
                    for rule in rules {
                        prompt.push_str(&format!("- {}\n", rule));
                    }
                    prompt.push_str("</RULES>\n\n");
                }
            }
        }

        prompt.trim_end().to_string()
    }
}

const ANALYSIS_SCHEMA: &str = r#"{
  "description": "What the photograph shows",
  "material_type": "Primary building material (e.g. brick, timber, concrete)",
  "overall_condition": "Excellent | Good | Fair | Poor | Critical",
  "defects": [
    {
      "type": "Defect name (e.g. Crack, Water damage, Rot)",
      "location": "Where in the image the defect is",
      "severity": "Critical | High | Medium | Low",
      "confidence_score": 0-100,
      "description": "What is wrong and why it matters"
    }
  ]
}"#;

/// Instructions sent with every image
pub fn analysis_instructions() -> String {
    PromptBuilder::new()
        .role("building inspector", "visual defect assessment of site photographs")
        .objectives(vec![
            "Describe what the photograph shows",
            "Identify the primary building material",
            "Rate the overall condition",
            "List every visible defect with its location, severity and your confidence",
        ])
        .section("Output Format", ANALYSIS_SCHEMA)
        .rules(vec![
            "Respond with a single JSON object and nothing else",
            "Use an empty defects array when nothing is wrong",
            "confidence_score is an integer between 0 and 100",
        ])
        .build()
}

/// Prompt for the long-form report
pub fn report_prompt(analyses: &[AnalysisResult], ctx: &ReportContext) -> String {
    let transcript = if ctx.transcript.trim().is_empty() {
        "(no notes recorded)".to_string()
    } else {
        ctx.transcript.trim().to_string()
    };

    let findings = analyses
        .iter()
        .map(format_analysis)
        .collect::<Vec<_>>()
        .join("\n\n");

    let structure = REQUIRED_SECTIONS
        .iter()
        .enumerate()
        .map(|(i, name)| format!("{}. {}", i + 1, name))
        .collect::<Vec<_>>()
        .join("\n");

    PromptBuilder::new()
        .role("building surveyor", "professional property inspection reports")
        .objectives(vec![
            "Write a complete inspection report from the findings below",
            "Estimate repair costs, durations, materials and contractors for every defect",
            "Prioritize recommendations by urgency",
        ])
        .section(
            "Inspection Details",
            &format!(
                "Location: {}\nRegional cost multiplier: {:.2}",
                ctx.location_or_default(),
                ctx.cost_multiplier
            ),
        )
        .section("Inspector Notes", &transcript)
        .section("Image Findings", &findings)
        .section("Required Sections", &structure)
        .rules(vec![
            "Emit exactly these nine sections in this order",
            "Put each section heading on its own line, in capitals, exactly as listed",
            "Scale every cost figure by the regional cost multiplier",
            "Include a 12% contingency and a grand total in Cost Estimates",
            "Do not invent defects that are not in the findings",
        ])
        .build()
}

fn format_analysis(analysis: &AnalysisResult) -> String {
    let mut block = format!(
        "Image {}:\n- Description: {}\n- Material: {}\n- Condition: {}",
        analysis.image_index,
        analysis.description,
        analysis.material_type.as_deref().unwrap_or("Not identified"),
        analysis.overall_condition,
    );

    if analysis.defects.is_empty() {
        block.push_str("\n- Defects: none observed");
    } else {
        block.push_str("\n- Defects:");
        for (i, defect) in analysis.defects.iter().enumerate() {
            block.push_str(&format!(
                "\n  {}. {} ({}, {}% confidence) at {}: {}",
                i + 1,
                defect.defect_type(),
                defect.severity(),
                defect.confidence_score(),
                defect.location(),
                defect.description()
            ));
        }
    }

    block
}
