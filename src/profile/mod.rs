mod derive;

pub use derive::{derive_profile, OnboardingAnswers};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How the user primarily works. Drives baseline activity weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkArchetype {
    Programmer,
    Researcher,
    Writer,
    Designer,
    Manager,
    #[serde(other)]
    Custom,
}

/// Coarse self-reported distraction sensitivity from onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistractionSensitivity {
    High,
    Low,
    // fallback must stay the last variant for the serde derive
    #[serde(other)]
    Medium,
}

impl DistractionSensitivity {
    /// Numeric sensitivity in [0, 1]. Lower means more easily distracted.
    pub fn as_factor(self) -> f64 {
        match self {
            DistractionSensitivity::High => 0.3,
            DistractionSensitivity::Medium => 0.6,
            DistractionSensitivity::Low => 0.9,
        }
    }
}

/// How aggressively drift should be flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftDetectionStyle {
    Strict,
    Gentle,
    // fallback must stay the last variant for the serde derive
    #[serde(other)]
    Balanced,
}

/// Clock rendering preference, passed through to the reflection collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockFormat {
    #[serde(rename = "24h")]
    TwentyFourHour,
    // fallback must stay the last variant for the serde derive
    #[serde(rename = "12h")]
    #[serde(other)]
    TwelveHour,
}

/// Per-user activity baselines in events per minute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baselines {
    pub keystrokes_per_min: f64,
    pub clicks_per_min: f64,
    pub scrolls_per_min: f64,
    pub avg_switch_frequency: f64,
}

/// Classification thresholds derived from drift style and archetype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Scales the weighted activity score; strict styles sit below 1 so more
    /// raw activity is needed to count as engaged, gentle styles above
    pub activity_multiplier: f64,
    pub reading_scroll_threshold: f64,
    /// Tolerated app switches per minute before switching reads as drift
    pub switch_tolerance: f64,
}

/// Per-user configuration derived once at onboarding.
///
/// `baselines`, `thresholds`, and `category_focus_multiplier` are pure
/// functions of the categorical answers; edit the answers and call
/// [`FocusProfile::recompute_derived`] rather than mutating them directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusProfile {
    pub user_name: String,
    pub work_archetype: WorkArchetype,
    pub primary_goal: String,
    pub priority_category: String,
    pub preferred_focus_length_minutes: u32,
    pub sensitivity_to_distraction: f64,
    pub drift_detection_style: DriftDetectionStyle,
    #[serde(default = "default_persona")]
    pub reflection_persona: String,
    #[serde(default = "default_clock_format")]
    pub clock_format: ClockFormat,
    pub baselines: Baselines,
    pub thresholds: Thresholds,
    pub category_focus_multiplier: HashMap<String, f64>,
}

fn default_persona() -> String {
    "calm_coach".to_string()
}

fn default_clock_format() -> ClockFormat {
    ClockFormat::TwelveHour
}

impl FocusProfile {
    /// Recompute the derived fields from the categorical answers.
    /// Called after persona/category edits in settings.
    pub fn recompute_derived(&mut self) {
        let (baselines, thresholds, multipliers) = derive::derive_fields(
            self.work_archetype,
            self.sensitivity_to_distraction,
            self.drift_detection_style,
            &self.priority_category,
        );
        self.baselines = baselines;
        self.thresholds = thresholds;
        self.category_focus_multiplier = multipliers;
    }

    /// Multiplier for a bucket's category tag, 1.0 when no boost applies.
    pub fn category_multiplier(&self, category: &str) -> f64 {
        self.category_focus_multiplier
            .get(category)
            .copied()
            .unwrap_or(1.0)
    }
}

impl Default for FocusProfile {
    fn default() -> Self {
        derive_profile(&OnboardingAnswers::default())
    }
}
