//! Template Engine
//!
//! Deterministic, network-free report synthesis. Used as the fallback when the
//! AI path is unavailable or rejected, and as the reference for which sections
//! a complete report carries. Rendering never fails and never emits an empty
//! section.

use chrono::NaiveDate;

use super::sections::REQUIRED_SECTIONS;
use crate::constants::template as consts;
use crate::types::{AnalysisResult, Defect, Severity};

/// Inputs besides the analyses that shape a report
#[derive(Debug, Clone, PartialEq)]
pub struct ReportContext {
    /// Combined inspector notes
    pub transcript: String,
    /// Regional cost multiplier applied to materials and labor
    pub cost_multiplier: f64,
    pub location: Option<String>,
    /// Printed in the report; omitted when unknown
    pub inspection_date: Option<NaiveDate>,
}

impl ReportContext {
    pub fn new(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            cost_multiplier: 1.0,
            location: None,
            inspection_date: None,
        }
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.cost_multiplier = multiplier;
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.inspection_date = Some(date);
        self
    }

    /// Location collapsed to a single line for use in prose
    pub fn location_or_default(&self) -> String {
        self.location
            .as_deref()
            .map(one_line)
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| consts::DEFAULT_LOCATION.to_string())
    }

    /// Multiplier actually used for arithmetic; non-positive or non-finite
    /// values fall back to 1.0
    fn effective_multiplier(&self) -> f64 {
        if self.cost_multiplier.is_finite() && self.cost_multiplier > 0.0 {
            self.cost_multiplier
        } else {
            1.0
        }
    }
}

// =============================================================================
// Cost and time models
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct CostLine {
    pub label: String,
    pub materials: f64,
    pub labor: f64,
}

impl CostLine {
    pub fn total(&self) -> f64 {
        self.materials + self.labor
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CostEstimate {
    pub lines: Vec<CostLine>,
    pub subtotal: f64,
    pub contingency: f64,
    pub grand_total: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeLine {
    pub label: String,
    pub days: u32,
    pub crew: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeEstimate {
    pub lines: Vec<TimeLine>,
    /// Sequential sum of every line
    pub total_days: u32,
}

fn material_base(severity: Severity) -> f64 {
    match severity {
        Severity::Critical | Severity::High => consts::material_base::HIGH,
        Severity::Medium => consts::material_base::MEDIUM,
        Severity::Low => consts::material_base::LOW,
    }
}

fn labor_factor(severity: Severity) -> f64 {
    match severity {
        Severity::Critical | Severity::High => consts::labor_factor::HIGH,
        Severity::Medium => consts::labor_factor::MEDIUM,
        Severity::Low => consts::labor_factor::LOW,
    }
}

fn duration_days(severity: Severity) -> u32 {
    match severity {
        Severity::Critical | Severity::High => consts::duration_days::HIGH,
        Severity::Medium => consts::duration_days::MEDIUM,
        Severity::Low => consts::duration_days::LOW,
    }
}

fn crew_size(days: u32) -> u32 {
    if days >= consts::CREW_OF_TWO_MIN_DAYS { 2 } else { 1 }
}

/// Routine allowance used when no defect was found: (item, base cost, days)
const ROUTINE_MAINTENANCE: &[(&str, f64, u32)] = &[
    ("Gutter and drainage clearance", 150.0, 1),
    ("General upkeep and minor touch-ups", 250.0, 1),
];

const MATERIALS_CATALOGUE: &[(&str, &str, f64)] = &[
    ("Exterior-grade sealant", "10 tubes", 85.0),
    ("Mortar and repair mix", "4 bags", 60.0),
    ("Primer and exterior paint", "2 gallons", 120.0),
    ("Timber preservative", "1 gallon", 45.0),
    ("Flashing tape and membrane", "1 roll", 70.0),
    ("Fixings and consumables", "assorted", 40.0),
];

const CONTRACTOR_CATALOGUE: &[(&str, &str)] = &[
    ("General Contractor", "coordinates the repair programme and minor works"),
    ("Mason", "mortar, brick and render repairs"),
    ("Roofer", "roof coverings, flashing and drainage"),
    ("Painter and Decorator", "surface preparation and protective coatings"),
];

const STRUCTURAL_ENGINEER: (&str, &str) = (
    "Structural Engineer",
    "assess cracking and high-severity defects before repairs begin",
);

fn money(amount: f64) -> String {
    format!("${:.2}", amount)
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{} {}", count, word)
    } else {
        format!("{} {}s", count, word)
    }
}

/// Collapse whitespace so free text stays on one line
fn one_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn defect_label(image_index: usize, defect: &Defect) -> String {
    format!(
        "{} ({}) - Image {}, {}",
        one_line(defect.defect_type()),
        defect.severity(),
        image_index,
        one_line(defect.location())
    )
}

fn all_defects(analyses: &[AnalysisResult]) -> impl Iterator<Item = (usize, &Defect)> {
    analyses
        .iter()
        .flat_map(|a| a.defects.iter().map(move |d| (a.image_index, d)))
}

// =============================================================================
// Template Engine
// =============================================================================

#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateEngine;

impl TemplateEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn cost_estimate(&self, analyses: &[AnalysisResult], multiplier: f64) -> CostEstimate {
        let lines: Vec<CostLine> = all_defects(analyses)
            .map(|(image_index, defect)| {
                let materials = material_base(defect.severity()) * multiplier;
                CostLine {
                    label: defect_label(image_index, defect),
                    materials,
                    labor: materials * labor_factor(defect.severity()),
                }
            })
            .collect();

        let subtotal: f64 = lines.iter().map(CostLine::total).sum();
        let contingency = subtotal * consts::CONTINGENCY_RATE;

        CostEstimate {
            lines,
            subtotal,
            contingency,
            grand_total: subtotal + contingency,
        }
    }

    pub fn time_estimate(&self, analyses: &[AnalysisResult]) -> TimeEstimate {
        let lines: Vec<TimeLine> = all_defects(analyses)
            .map(|(image_index, defect)| {
                let days = duration_days(defect.severity());
                TimeLine {
                    label: defect_label(image_index, defect),
                    days,
                    crew: crew_size(days),
                }
            })
            .collect();

        let total_days = lines.iter().map(|l| l.days).sum();
        TimeEstimate { lines, total_days }
    }

    /// Render the complete report text
    pub fn render(&self, analyses: &[AnalysisResult], ctx: &ReportContext) -> String {
        let multiplier = ctx.effective_multiplier();
        let cost = self.cost_estimate(analyses, multiplier);
        let time = self.time_estimate(analyses);

        let bodies = [
            self.scope(analyses, ctx),
            self.executive_summary(analyses, ctx, &cost, &time),
            self.cost_section(&cost, multiplier),
            self.time_section(&time),
            self.materials_section(),
            self.contractor_section(analyses),
            self.findings_section(analyses),
            self.recommendations_section(analyses),
            self.conclusion(analyses, ctx),
        ];

        REQUIRED_SECTIONS
            .iter()
            .zip(bodies)
            .map(|(name, body)| format!("{}\n{}", name, body))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn scope(&self, analyses: &[AnalysisResult], ctx: &ReportContext) -> String {
        let mut lines = vec![format!(
            "This report presents a visual, non-invasive inspection of {} based on {}.",
            ctx.location_or_default(),
            plural(analyses.len(), "analyzed photograph")
        )];
        if let Some(date) = ctx.inspection_date {
            lines.push(format!("Inspection date: {}", date.format("%Y-%m-%d")));
        }
        lines.push(
            "Limitations: concealed, inaccessible and covered areas were not inspected. \
             No destructive testing, sampling or services testing was carried out. \
             Findings are limited to what is visible in the supplied images."
                .to_string(),
        );
        let notes = one_line(&ctx.transcript);
        if !notes.is_empty() {
            lines.push(format!("Inspector notes: {}", notes));
        }
        lines.join("\n")
    }

    fn executive_summary(
        &self,
        analyses: &[AnalysisResult],
        ctx: &ReportContext,
        cost: &CostEstimate,
        time: &TimeEstimate,
    ) -> String {
        let count = |tier: fn(&Severity) -> bool| {
            all_defects(analyses)
                .filter(|(_, d)| tier(&d.severity()))
                .count()
        };
        let total = all_defects(analyses).count();
        let high = count(Severity::is_high_tier);
        let medium = count(|s| *s == Severity::Medium);
        let low = count(|s| *s == Severity::Low);

        let mut lines = vec![format!(
            "The inspection of {} reviewed {} and identified {} ({} high priority, {} medium, {} low).",
            ctx.location_or_default(),
            plural(analyses.len(), "image"),
            plural(total, "defect"),
            high,
            medium,
            low
        )];

        let conditions = analyses
            .iter()
            .map(|a| format!("Image {}: {}", a.image_index, one_line(&a.overall_condition)))
            .collect::<Vec<_>>()
            .join("; ");
        lines.push(format!("Overall condition ratings: {}.", conditions));

        if total == 0 {
            lines.push(format!(
                "No repairs are required. A routine maintenance allowance of {} is recommended.",
                money(routine_total(ctx.effective_multiplier()) * (1.0 + consts::CONTINGENCY_RATE))
            ));
        } else {
            lines.push(format!(
                "Estimated repair cost is {} including contingency, over approximately {}.",
                money(cost.grand_total),
                plural(time.total_days as usize, "working day")
            ));
        }
        lines.join("\n")
    }

    fn cost_section(&self, cost: &CostEstimate, multiplier: f64) -> String {
        let mut lines = vec![format!(
            "All figures in USD with a regional cost multiplier of {:.2}.",
            multiplier
        )];

        let (subtotal, contingency, grand_total) = if cost.lines.is_empty() {
            lines.push("No defects requiring repair were identified. Routine maintenance allowance:".to_string());
            for (item, base, _) in ROUTINE_MAINTENANCE {
                lines.push(format!("- {}: {}", item, money(base * multiplier)));
            }
            let subtotal = routine_total(multiplier);
            let contingency = subtotal * consts::CONTINGENCY_RATE;
            (subtotal, contingency, subtotal + contingency)
        } else {
            for (i, line) in cost.lines.iter().enumerate() {
                lines.push(format!(
                    "{}. {}: Materials {} + Labor {} = Line total: {}",
                    i + 1,
                    line.label,
                    money(line.materials),
                    money(line.labor),
                    money(line.total())
                ));
            }
            (cost.subtotal, cost.contingency, cost.grand_total)
        };

        lines.push(format!("Subtotal: {}", money(subtotal)));
        lines.push(format!(
            "Contingency ({:.0}%): {}",
            consts::CONTINGENCY_RATE * 100.0,
            money(contingency)
        ));
        lines.push(format!("GRAND TOTAL: {}", money(grand_total)));
        lines.join("\n")
    }

    fn time_section(&self, time: &TimeEstimate) -> String {
        let mut lines = Vec::new();

        if time.lines.is_empty() {
            for (item, _, days) in ROUTINE_MAINTENANCE {
                lines.push(format!(
                    "- {}: {}, crew of {}",
                    item,
                    plural(*days as usize, "day"),
                    crew_size(*days)
                ));
            }
            let days: u32 = ROUTINE_MAINTENANCE.iter().map(|(_, _, d)| d).sum();
            lines.push(format!(
                "Total estimated duration: {} of routine maintenance",
                plural(days as usize, "day")
            ));
        } else {
            for (i, line) in time.lines.iter().enumerate() {
                lines.push(format!(
                    "{}. {}: {}, crew of {}",
                    i + 1,
                    line.label,
                    plural(line.days as usize, "day"),
                    line.crew
                ));
            }
            lines.push(format!(
                "Total estimated duration: {} if carried out sequentially",
                plural(time.total_days as usize, "day")
            ));
        }
        lines.join("\n")
    }

    fn materials_section(&self) -> String {
        let mut lines: Vec<String> = MATERIALS_CATALOGUE
            .iter()
            .map(|(item, qty, cost)| format!("- {} ({}): {}", item, qty, money(*cost)))
            .collect();
        let total: f64 = MATERIALS_CATALOGUE.iter().map(|(_, _, c)| c).sum();
        lines.push(format!("Estimated materials total: {}", money(total)));
        lines.join("\n")
    }

    fn contractor_section(&self, analyses: &[AnalysisResult]) -> String {
        let structural = all_defects(analyses).any(|(_, d)| d.needs_structural_review());

        CONTRACTOR_CATALOGUE
            .iter()
            .chain(structural.then_some(&STRUCTURAL_ENGINEER))
            .map(|(trade, scope)| format!("- {}: {}", trade, scope))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn findings_section(&self, analyses: &[AnalysisResult]) -> String {
        if analyses.is_empty() {
            return "No images were available for analysis.".to_string();
        }

        analyses
            .iter()
            .map(|analysis| {
                let mut lines = vec![
                    format!(
                        "Image {} - Condition: {}",
                        analysis.image_index,
                        one_line(&analysis.overall_condition)
                    ),
                    format!(
                        "Material: {}",
                        analysis
                            .material_type
                            .as_deref()
                            .map(one_line)
                            .unwrap_or_else(|| "Not identified".to_string())
                    ),
                ];
                let description = one_line(&analysis.description);
                if !description.is_empty() {
                    lines.push(format!("Description: {}", description));
                }
                if analysis.defects.is_empty() {
                    lines.push("Defects: none observed".to_string());
                } else {
                    lines.push("Defects:".to_string());
                    for defect in &analysis.defects {
                        let mut line = format!(
                            "  - {} ({}, confidence {}%) at {}",
                            one_line(defect.defect_type()),
                            defect.severity(),
                            defect.confidence_score(),
                            one_line(defect.location())
                        );
                        let detail = one_line(defect.description());
                        if !detail.is_empty() {
                            line.push_str(": ");
                            line.push_str(&detail);
                        }
                        lines.push(line);
                    }
                }
                lines.join("\n")
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn recommendations_section(&self, analyses: &[AnalysisResult]) -> String {
        let bucket = |keep: fn(Severity) -> bool| -> Vec<String> {
            all_defects(analyses)
                .filter(|(_, d)| keep(d.severity()))
                .map(|(image_index, d)| {
                    format!(
                        "- Repair {} at {} (Image {})",
                        one_line(d.defect_type()).to_lowercase(),
                        one_line(d.location()),
                        image_index
                    )
                })
                .collect()
        };

        let mut immediate = bucket(|s| s.is_high_tier());
        let mut short_term = bucket(|s| s == Severity::Medium);
        let mut long_term = bucket(|s| s == Severity::Low);

        if immediate.is_empty() {
            immediate.push("- No urgent repairs identified".to_string());
        }
        if short_term.is_empty() {
            short_term.push("- Monitor the areas photographed for any change".to_string());
        }
        long_term.push("- Schedule a follow-up inspection within 12 months".to_string());

        let mut lines = vec!["Immediate (within 30 days):".to_string()];
        lines.extend(immediate);
        lines.push("Short term (1 to 6 months):".to_string());
        lines.extend(short_term);
        lines.push("Long term (6 to 12 months):".to_string());
        lines.extend(long_term);
        lines.join("\n")
    }

    fn conclusion(&self, analyses: &[AnalysisResult], ctx: &ReportContext) -> String {
        let total = all_defects(analyses).count();
        let structural = all_defects(analyses).any(|(_, d)| d.needs_structural_review());

        let mut text = if total == 0 {
            format!(
                "The inspection of {} found no defects across {}. The property should be kept under routine maintenance.",
                ctx.location_or_default(),
                plural(analyses.len(), "image")
            )
        } else {
            format!(
                "The inspection of {} identified {} across {}. Addressing the immediate items first will limit further deterioration.",
                ctx.location_or_default(),
                plural(total, "defect"),
                plural(analyses.len(), "image")
            )
        };
        if structural {
            text.push_str(" A structural engineer should be consulted before repairs begin.");
        }
        text
    }
}

fn routine_total(multiplier: f64) -> f64 {
    ROUTINE_MAINTENANCE
        .iter()
        .map(|(_, base, _)| base * multiplier)
        .sum()
}
