use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{
    Baselines, ClockFormat, DistractionSensitivity, DriftDetectionStyle, FocusProfile, Thresholds,
    WorkArchetype,
};

/// Reference activity rates a "standard" focused user produces per minute.
const REF_KEYSTROKES_PER_MIN: f64 = 40.0;
const REF_CLICKS_PER_MIN: f64 = 10.0;
const REF_SCROLLS_PER_MIN: f64 = 5.0;
const REF_SWITCHES_PER_MIN: f64 = 0.5;

/// Boost applied to the activity score for the user's priority category.
const PRIORITY_CATEGORY_BOOST: f64 = 1.15;

/// Supported focus block lengths; odd answers snap to the nearest one.
const FOCUS_LENGTHS_MIN: [u32; 3] = [25, 50, 90];

/// Raw onboarding questionnaire answers. All fields are constrained-choice
/// except `user_name`, so defaults make every combination a valid profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingAnswers {
    #[serde(default)]
    pub user_name: String,
    #[serde(default = "default_archetype")]
    pub work_archetype: WorkArchetype,
    #[serde(default)]
    pub primary_goal: String,
    #[serde(default)]
    pub priority_category: String,
    #[serde(default = "default_focus_length")]
    pub preferred_focus_length_minutes: u32,
    #[serde(default = "default_sensitivity")]
    pub sensitivity: DistractionSensitivity,
    #[serde(default = "default_drift_style")]
    pub drift_detection_style: DriftDetectionStyle,
    #[serde(default = "default_persona")]
    pub reflection_persona: String,
    #[serde(default = "default_clock_format")]
    pub clock_format: ClockFormat,
}

fn default_archetype() -> WorkArchetype {
    WorkArchetype::Custom
}

fn default_focus_length() -> u32 {
    50
}

fn default_sensitivity() -> DistractionSensitivity {
    DistractionSensitivity::Medium
}

fn default_drift_style() -> DriftDetectionStyle {
    DriftDetectionStyle::Balanced
}

fn default_persona() -> String {
    "calm_coach".to_string()
}

fn default_clock_format() -> ClockFormat {
    ClockFormat::TwelveHour
}

impl Default for OnboardingAnswers {
    fn default() -> Self {
        Self {
            user_name: String::new(),
            work_archetype: default_archetype(),
            primary_goal: "deep_focus".to_string(),
            priority_category: "editor".to_string(),
            preferred_focus_length_minutes: default_focus_length(),
            sensitivity: default_sensitivity(),
            drift_detection_style: default_drift_style(),
            reflection_persona: default_persona(),
            clock_format: default_clock_format(),
        }
    }
}

/// Multiplicative baseline weights per archetype:
/// (keystrokes, clicks, scrolls, switches).
fn archetype_weights(archetype: WorkArchetype) -> (f64, f64, f64, f64) {
    match archetype {
        WorkArchetype::Programmer => (1.3, 0.8, 0.6, 0.8),
        WorkArchetype::Researcher => (0.6, 0.9, 1.6, 1.1),
        WorkArchetype::Writer => (1.5, 0.5, 0.5, 0.6),
        WorkArchetype::Designer => (0.5, 1.6, 1.0, 1.0),
        WorkArchetype::Manager => (0.7, 1.2, 0.9, 1.6),
        WorkArchetype::Custom => (1.0, 1.0, 1.0, 1.0),
    }
}

/// Base thresholds per drift style:
/// (activity_multiplier, reading_scroll_threshold, switch_tolerance per min).
fn style_thresholds(style: DriftDetectionStyle) -> (f64, f64, f64) {
    match style {
        DriftDetectionStyle::Strict => (0.85, 2.5, 2.0),
        DriftDetectionStyle::Balanced => (1.0, 2.0, 3.0),
        DriftDetectionStyle::Gentle => (1.2, 1.5, 4.0),
    }
}

/// Derive a complete profile from onboarding answers. Pure; no I/O.
pub fn derive_profile(answers: &OnboardingAnswers) -> FocusProfile {
    let user_name = if answers.user_name.trim().is_empty() {
        "User".to_string()
    } else {
        answers.user_name.trim().to_string()
    };

    let sensitivity = answers.sensitivity.as_factor();
    let (baselines, thresholds, category_focus_multiplier) = derive_fields(
        answers.work_archetype,
        sensitivity,
        answers.drift_detection_style,
        &answers.priority_category,
    );

    FocusProfile {
        user_name,
        work_archetype: answers.work_archetype,
        primary_goal: answers.primary_goal.clone(),
        priority_category: answers.priority_category.clone(),
        preferred_focus_length_minutes: snap_focus_length(answers.preferred_focus_length_minutes),
        sensitivity_to_distraction: sensitivity,
        drift_detection_style: answers.drift_detection_style,
        reflection_persona: answers.reflection_persona.clone(),
        clock_format: answers.clock_format,
        baselines,
        thresholds,
        category_focus_multiplier,
    }
}

/// Compute the derived fields for a given answer combination.
pub(super) fn derive_fields(
    archetype: WorkArchetype,
    sensitivity: f64,
    style: DriftDetectionStyle,
    priority_category: &str,
) -> (Baselines, Thresholds, HashMap<String, f64>) {
    let (w_keys, w_clicks, w_scrolls, w_switches) = archetype_weights(archetype);

    let baselines = Baselines {
        keystrokes_per_min: REF_KEYSTROKES_PER_MIN * w_keys,
        clicks_per_min: REF_CLICKS_PER_MIN * w_clicks,
        scrolls_per_min: REF_SCROLLS_PER_MIN * w_scrolls,
        avg_switch_frequency: REF_SWITCHES_PER_MIN * w_switches,
    };

    let (activity_multiplier, scroll_base, tolerance_base) = style_thresholds(style);

    // Sensitivity shrinks or widens the switch tolerance: an easily
    // distracted user (0.3) gets drift flagged on fewer switches.
    let thresholds = Thresholds {
        activity_multiplier,
        reading_scroll_threshold: scroll_base * w_scrolls,
        switch_tolerance: tolerance_base * w_switches * (0.5 + sensitivity),
    };

    let mut multipliers = HashMap::new();
    if !priority_category.is_empty() {
        multipliers.insert(priority_category.to_string(), PRIORITY_CATEGORY_BOOST);
    }

    (baselines, thresholds, multipliers)
}

fn snap_focus_length(minutes: u32) -> u32 {
    FOCUS_LENGTHS_MIN
        .iter()
        .copied()
        .min_by_key(|len| len.abs_diff(minutes))
        .unwrap_or(50)
}
