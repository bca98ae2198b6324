use crate::classify::StateClassifier;
use crate::config::EngineConfig;
use crate::ingest::{RawSample, SampleBuffer};
use crate::profile::FocusProfile;
use crate::reflection::{build_reflection, ReflectionSummary};
use crate::stats::{aggregate_daily, aggregate_passport, DailyStatistics, PassportStatistics};
use crate::timeline::{build_timeline, ClassifiedBucket, Timeline};

/// Facade over the whole pipeline: bucketing, classification, timeline
/// assembly, and aggregation behind one profile-aware entry point.
///
/// The engine itself is stateless between calls; classifier state (recovery
/// debouncing) lives only for the span of one ordered batch.
pub struct FocusEngine {
    profile: FocusProfile,
    config: EngineConfig,
}

impl FocusEngine {
    pub fn new(profile: FocusProfile, config: EngineConfig) -> Self {
        Self { profile, config }
    }

    pub fn profile(&self) -> &FocusProfile {
        &self.profile
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replace the active profile, e.g. after a settings edit.
    pub fn set_profile(&mut self, profile: FocusProfile) {
        self.profile = profile;
    }

    /// Run ordered raw samples through the full pipeline.
    pub fn process_samples(&self, samples: &[RawSample]) -> Timeline {
        let buckets = SampleBuffer::bucketize(&self.config, samples);

        let mut classifier = StateClassifier::new(&self.profile, &self.config);
        let classified: Vec<ClassifiedBucket> = buckets
            .into_iter()
            .map(|metrics| {
                let classification = classifier.classify(&metrics);
                ClassifiedBucket {
                    metrics,
                    classification,
                }
            })
            .collect();

        build_timeline(&classified, &self.config)
    }

    pub fn daily_stats(&self, timeline: &Timeline) -> DailyStatistics {
        aggregate_daily(timeline, &self.profile, &self.config)
    }

    pub fn passport(&self, timelines: &[Timeline]) -> PassportStatistics {
        aggregate_passport(timelines, &self.profile, &self.config)
    }

    pub fn reflection_summary(
        &self,
        timeline: &Timeline,
        stats: &DailyStatistics,
    ) -> ReflectionSummary {
        build_reflection(timeline, stats, &self.profile, &self.config)
    }
}

impl Default for FocusEngine {
    fn default() -> Self {
        Self::new(FocusProfile::default(), EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::AttentionState;
    use pretty_assertions::assert_eq;

    fn sample(ts: i64, keystrokes: u32, switches: u32) -> RawSample {
        RawSample {
            timestamp: ts,
            keystrokes,
            clicks: 0,
            scrolls: 0,
            switches,
            dominant_app: Some("Code".to_string()),
            category: None,
        }
    }

    #[test]
    fn typing_session_produces_a_focus_timeline() {
        let engine = FocusEngine::default();
        // 5s cadence, ~7 keys per tick: 84 keys/min against a 46/min baseline
        let samples: Vec<RawSample> = (0..60).map(|i| sample(i * 5, 7, 0)).collect();

        let timeline = engine.process_samples(&samples);
        assert!(!timeline.is_empty());
        assert!(timeline
            .points()
            .iter()
            .all(|p| p.state.is_focus() || p.state == AttentionState::RecoveryPoint));

        let stats = engine.daily_stats(&timeline);
        assert!(stats.total_focus_hours > 0.0);
        assert_eq!(stats.total_drift_hours, 0.0);
        assert_eq!(stats.attention_stability_score, 1.0);
    }

    #[test]
    fn untouched_machine_produces_only_idle_time() {
        let engine = FocusEngine::default();
        let samples: Vec<RawSample> = (0..20).map(|i| sample(i * 5, 0, 0)).collect();

        let timeline = engine.process_samples(&samples);
        let stats = engine.daily_stats(&timeline);
        assert_eq!(stats.total_focus_hours, 0.0);
        assert!(stats.total_idle_hours > 0.0);
        assert_eq!(stats.attention_stability_score, 0.0);
    }

    #[test]
    fn passport_spans_multiple_days() {
        let engine = FocusEngine::default();
        let day1 = engine.process_samples(&(0..60).map(|i| sample(i * 5, 7, 0)).collect::<Vec<_>>());
        let day2 = engine
            .process_samples(&(0..60).map(|i| sample(86_400 + i * 5, 7, 0)).collect::<Vec<_>>());

        let passport = engine.passport(&[day1, day2]);
        assert_eq!(passport.days_tracked, 2);
        assert!(passport.average_daily_focus_minutes > 0.0);
    }
}
