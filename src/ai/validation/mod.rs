//! AI Response Validation
//!
//! - JSON recovery for vision model output
//! - Acceptance heuristics for AI-written reports

mod json_repair;
mod report;

pub use json_repair::{JsonRepairer, extract_json_from_response};
pub use report::{AcceptancePolicy, Rejection, count_section_mentions};
