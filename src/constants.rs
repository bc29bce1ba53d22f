//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Per-image analysis constants
pub mod analysis {
    /// Condition recorded when a provider answered but no JSON could be recovered
    pub const DEGRADED_CONDITION: &str = "Unknown - Analysis incomplete";

    /// Characters of the raw response kept as the description of a degraded result
    pub const DEGRADED_DESCRIPTION_CHARS: usize = 500;

    /// Confidence used when the provider value is missing or not numeric
    pub const DEFAULT_CONFIDENCE: u8 = 50;

    /// Upper bound of the confidence scale
    pub const MAX_CONFIDENCE: u8 = 100;

    pub const DEFAULT_LOCATION: &str = "Not specified";

    pub const DEFAULT_DEFECT_TYPE: &str = "Unspecified defect";

    pub const DEFAULT_CONDITION: &str = "Unknown";

    /// Output token budget for a single image analysis
    pub const MAX_OUTPUT_TOKENS: u32 = 2048;
}

/// Report composition constants
pub mod composer {
    /// Minimum characters an AI report must exceed to be accepted
    pub const MIN_REPORT_CHARS: usize = 500;

    /// Minimum number of required section names an AI report must mention
    pub const MIN_SECTION_KEYWORDS: usize = 5;

    /// Elevated output token budget for long-form report generation
    pub const REPORT_MAX_TOKENS: u32 = 8192;
}

/// Template engine constants
pub mod template {
    /// Contingency applied on top of the cost subtotal
    pub const CONTINGENCY_RATE: f64 = 0.12;

    /// Material base cost per defect, by severity tier (before regional multiplier)
    pub mod material_base {
        pub const HIGH: f64 = 200.0;
        pub const MEDIUM: f64 = 120.0;
        pub const LOW: f64 = 80.0;
    }

    /// Labor cost as a multiple of the material cost, by severity tier
    pub mod labor_factor {
        pub const HIGH: f64 = 2.5;
        pub const MEDIUM: f64 = 2.0;
        pub const LOW: f64 = 1.5;
    }

    /// Repair duration per defect in working days, by severity tier
    pub mod duration_days {
        pub const HIGH: u32 = 3;
        pub const MEDIUM: u32 = 2;
        pub const LOW: u32 = 1;
    }

    /// Durations at or above this many days get a two-person crew
    pub const CREW_OF_TWO_MIN_DAYS: u32 = 2;

    /// Location phrase used when the caller supplies none
    pub const DEFAULT_LOCATION: &str = "the inspected property";
}

/// HTTP/Network constants
pub mod network {
    /// Default request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

    /// Deadline for a single vision analysis call (seconds)
    pub const ANALYSIS_CALL_TIMEOUT_SECS: u64 = 90;

    /// Deadline for the long-form report generation call (seconds)
    pub const GENERATION_CALL_TIMEOUT_SECS: u64 = 300;
}
