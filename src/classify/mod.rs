use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::ingest::BucketMetrics;
use crate::profile::FocusProfile;

/// Attention state assigned to one timeline point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttentionState {
    FocusPeak,
    LightFocus,
    DriftZone,
    RecoveryPoint,
    Idle,
    IdleGap,
}

impl AttentionState {
    /// Human-facing label used by the UI and reflection collaborators.
    pub fn as_str(self) -> &'static str {
        match self {
            AttentionState::FocusPeak => "Focus Peak",
            AttentionState::LightFocus => "Light Focus",
            AttentionState::DriftZone => "Drift Zone",
            AttentionState::RecoveryPoint => "Recovery Point",
            AttentionState::Idle => "Idle",
            AttentionState::IdleGap => "Idle Gap",
        }
    }

    /// Focus states count toward streaks and stability.
    pub fn is_focus(self) -> bool {
        matches!(self, AttentionState::FocusPeak | AttentionState::LightFocus)
    }
}

/// Classifier output for one bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub state: AttentionState,
    /// Activity score clamped to [0, 1]; rendering weight only
    pub intensity: f64,
}

/// Maps bucket metrics to attention states against a user's profile.
///
/// Stateful across one ordered pass: the RecoveryPoint marker depends on the
/// previously emitted state, and recent recoveries are debounced so rapid
/// drift/focus oscillation does not spray markers.
pub struct StateClassifier<'a> {
    profile: &'a FocusProfile,
    config: &'a EngineConfig,
    prev_state: Option<AttentionState>,
    buckets_since_recovery: usize,
}

impl<'a> StateClassifier<'a> {
    pub fn new(profile: &'a FocusProfile, config: &'a EngineConfig) -> Self {
        Self {
            profile,
            config,
            prev_state: None,
            buckets_since_recovery: config.recovery_debounce_buckets,
        }
    }

    /// Classify one bucket. Never fails: unclassifiable input degrades to
    /// LightFocus with intensity 0.1.
    pub fn classify(&mut self, bucket: &BucketMetrics) -> Classification {
        let result = self.decide(bucket);

        self.prev_state = Some(result.state);
        if result.state == AttentionState::RecoveryPoint {
            self.buckets_since_recovery = 0;
        } else {
            self.buckets_since_recovery = self.buckets_since_recovery.saturating_add(1);
        }

        result
    }

    fn decide(&self, bucket: &BucketMetrics) -> Classification {
        if bucket.idle {
            return Classification {
                state: AttentionState::Idle,
                intensity: 0.0,
            };
        }

        if bucket.width_secs <= 0 {
            return Classification {
                state: AttentionState::LightFocus,
                intensity: 0.1,
            };
        }

        let activity = self.activity_score(bucket);
        let switch_score = self.switch_score(bucket);
        let intensity = activity.clamp(0.0, 1.0);

        // Atypical app-hopping without matching activity reads as drift.
        if switch_score > 1.0 && activity < 1.0 {
            return Classification {
                state: AttentionState::DriftZone,
                intensity,
            };
        }

        if activity >= 1.0 && switch_score <= 1.0 {
            let coming_from_lapse = matches!(
                self.prev_state,
                Some(AttentionState::DriftZone | AttentionState::Idle | AttentionState::IdleGap)
            );
            if coming_from_lapse && self.buckets_since_recovery >= self.config.recovery_debounce_buckets
            {
                return Classification {
                    state: AttentionState::RecoveryPoint,
                    intensity,
                };
            }

            let state = if activity >= self.config.focus_peak_score {
                AttentionState::FocusPeak
            } else {
                AttentionState::LightFocus
            };
            return Classification { state, intensity };
        }

        // Ambiguous signals default to LightFocus rather than spurious drift.
        Classification {
            state: AttentionState::LightFocus,
            intensity,
        }
    }

    /// Weighted mean of per-minute rates normalized against the profile
    /// baselines. Weights renormalize over the signals present in the bucket,
    /// so a keystrokes-only bucket scores exactly rate/baseline.
    fn activity_score(&self, bucket: &BucketMetrics) -> f64 {
        let baselines = &self.profile.baselines;
        let signals = [
            (
                self.config.weight_keystrokes,
                bucket.keystrokes,
                bucket.keystrokes_per_min(),
                baselines.keystrokes_per_min,
            ),
            (
                self.config.weight_clicks,
                bucket.clicks,
                bucket.clicks_per_min(),
                baselines.clicks_per_min,
            ),
            (
                self.config.weight_scrolls,
                bucket.scrolls,
                bucket.scrolls_per_min(),
                baselines.scrolls_per_min,
            ),
        ];

        let mut weighted = 0.0;
        let mut weight_total = 0.0;
        for (weight, count, rate, baseline) in signals {
            if count == 0 || baseline <= 0.0 || weight <= 0.0 {
                continue;
            }
            weighted += weight * (rate / baseline);
            weight_total += weight;
        }

        if weight_total <= 0.0 {
            return 0.0;
        }

        let mut score = (weighted / weight_total) * self.profile.thresholds.activity_multiplier;
        score *= self.profile.category_multiplier(&bucket.category);

        // Scroll-dominant reading counts as engaged work even when the raw
        // rate sits under the keystroke-centric threshold.
        if self.is_reading(bucket) {
            score = score.max(1.0);
        }

        score
    }

    fn is_reading(&self, bucket: &BucketMetrics) -> bool {
        let baselines = &self.profile.baselines;
        if baselines.scrolls_per_min <= 0.0 {
            return false;
        }
        let scroll_ratio = bucket.scrolls_per_min() / baselines.scrolls_per_min;
        bucket.scrolls > bucket.keystrokes + bucket.clicks
            && scroll_ratio >= self.profile.thresholds.reading_scroll_threshold
    }

    fn switch_score(&self, bucket: &BucketMetrics) -> f64 {
        let tolerance = self.profile.thresholds.switch_tolerance;
        if tolerance <= 0.0 {
            return 0.0;
        }
        bucket.switches_per_min() / tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{derive_profile, DriftDetectionStyle, OnboardingAnswers};

    fn minute_config() -> EngineConfig {
        EngineConfig {
            bucket_width_secs: 60,
            ..EngineConfig::default()
        }
    }

    fn bucket(keystrokes: u32, clicks: u32, scrolls: u32, switches: u32) -> BucketMetrics {
        BucketMetrics {
            start_ts: 0,
            width_secs: 60,
            keystrokes,
            clicks,
            scrolls,
            switches,
            sample_count: 12,
            dominant_app: "Code".to_string(),
            category: "editor".to_string(),
            idle: keystrokes == 0 && clicks == 0 && scrolls == 0 && switches == 0,
        }
    }

    fn flat_profile() -> FocusProfile {
        // Custom archetype, balanced style, no category boost on "editor"
        let mut profile = derive_profile(&OnboardingAnswers {
            priority_category: "design".to_string(),
            ..OnboardingAnswers::default()
        });
        profile.thresholds.activity_multiplier = 1.0;
        profile
    }

    #[test]
    fn double_baseline_keystrokes_is_focus_peak_with_clamped_intensity() {
        let profile = flat_profile();
        let config = minute_config();
        let mut classifier = StateClassifier::new(&profile, &config);

        // 80 keys/min against a 40 keys/min baseline: activity score 2.0
        let result = classifier.classify(&bucket(80, 0, 0, 0));
        assert_eq!(result.state, AttentionState::FocusPeak);
        assert_eq!(result.intensity, 1.0);
    }

    #[test]
    fn moderate_activity_is_light_focus() {
        let profile = flat_profile();
        let config = minute_config();
        let mut classifier = StateClassifier::new(&profile, &config);

        // 48 keys/min -> score 1.2, under the 1.5 peak cutoff
        let result = classifier.classify(&bucket(48, 0, 0, 0));
        assert_eq!(result.state, AttentionState::LightFocus);
        assert!((result.intensity - 1.0).abs() < 1e-9);
    }

    #[test]
    fn high_switching_with_low_activity_is_drift() {
        let profile = flat_profile();
        let config = minute_config();
        let mut classifier = StateClassifier::new(&profile, &config);

        let result = classifier.classify(&bucket(5, 0, 0, 8));
        assert_eq!(result.state, AttentionState::DriftZone);
    }

    #[test]
    fn idle_bucket_is_idle_with_zero_intensity() {
        let profile = flat_profile();
        let config = minute_config();
        let mut classifier = StateClassifier::new(&profile, &config);

        let result = classifier.classify(&bucket(0, 0, 0, 0));
        assert_eq!(result.state, AttentionState::Idle);
        assert_eq!(result.intensity, 0.0);
    }

    #[test]
    fn recovery_marks_the_transition_bucket_only() {
        let profile = flat_profile();
        let config = minute_config();
        let mut classifier = StateClassifier::new(&profile, &config);

        assert_eq!(
            classifier.classify(&bucket(5, 0, 0, 8)).state,
            AttentionState::DriftZone
        );
        assert_eq!(
            classifier.classify(&bucket(80, 0, 0, 0)).state,
            AttentionState::RecoveryPoint
        );
        // Sustained high activity reverts to a focus label.
        assert_eq!(
            classifier.classify(&bucket(80, 0, 0, 0)).state,
            AttentionState::FocusPeak
        );
    }

    #[test]
    fn recovery_is_debounced_during_oscillation() {
        let profile = flat_profile();
        let config = minute_config();
        let mut classifier = StateClassifier::new(&profile, &config);

        classifier.classify(&bucket(5, 0, 0, 8));
        assert_eq!(
            classifier.classify(&bucket(80, 0, 0, 0)).state,
            AttentionState::RecoveryPoint
        );
        classifier.classify(&bucket(5, 0, 0, 8));
        // Second flicker inside the debounce window: no new marker.
        assert_eq!(
            classifier.classify(&bucket(80, 0, 0, 0)).state,
            AttentionState::FocusPeak
        );
    }

    #[test]
    fn scroll_heavy_reading_counts_as_engaged() {
        let profile = flat_profile();
        let config = minute_config();
        let mut classifier = StateClassifier::new(&profile, &config);

        // 12 scrolls/min on a 5/min baseline, no typing: reading mode
        let result = classifier.classify(&bucket(0, 0, 12, 0));
        assert!(result.state.is_focus() || result.state == AttentionState::RecoveryPoint);
        assert!(result.intensity >= 1.0 - 1e-9);
    }

    #[test]
    fn priority_category_boost_applies() {
        let profile = derive_profile(&OnboardingAnswers::default()); // boosts "editor"
        let config = minute_config();
        let mut classifier = StateClassifier::new(&profile, &config);

        // 56 keys/min: 1.4 raw, 1.61 boosted -> FocusPeak
        let result = classifier.classify(&bucket(56, 0, 0, 0));
        assert_eq!(result.state, AttentionState::FocusPeak);
    }

    #[test]
    fn strict_style_needs_more_activity_for_a_peak_than_gentle() {
        let config = minute_config();
        let mut answers = OnboardingAnswers {
            priority_category: "design".to_string(),
            ..OnboardingAnswers::default()
        };

        answers.drift_detection_style = DriftDetectionStyle::Gentle;
        let gentle = derive_profile(&answers);
        answers.drift_detection_style = DriftDetectionStyle::Strict;
        let strict = derive_profile(&answers);

        // 56 keys/min is 1.4x baseline: a peak under the gentle multiplier
        // (1.68), ordinary light focus under the strict one (1.19)
        let metrics = bucket(56, 0, 0, 0);
        assert_eq!(
            StateClassifier::new(&gentle, &config).classify(&metrics).state,
            AttentionState::FocusPeak
        );
        assert_eq!(
            StateClassifier::new(&strict, &config).classify(&metrics).state,
            AttentionState::LightFocus
        );
    }

    #[test]
    fn degenerate_bucket_width_degrades_to_light_focus() {
        let profile = flat_profile();
        let config = minute_config();
        let mut classifier = StateClassifier::new(&profile, &config);

        let mut broken = bucket(10, 0, 0, 0);
        broken.width_secs = 0;
        let result = classifier.classify(&broken);
        assert_eq!(result.state, AttentionState::LightFocus);
        assert_eq!(result.intensity, 0.1);
    }
}
