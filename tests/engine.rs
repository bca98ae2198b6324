use focusgraph::profile::{DistractionSensitivity, DriftDetectionStyle};
use focusgraph::{
    derive_profile, AttentionState, EngineConfig, FocusEngine, FocusProfile, OnboardingAnswers,
    RawSample, Store,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn sample(ts: i64, keystrokes: u32, switches: u32, app: &str) -> RawSample {
    RawSample {
        timestamp: ts,
        keystrokes,
        clicks: 0,
        scrolls: 0,
        switches,
        dominant_app: Some(app.to_string()),
        category: None,
    }
}

/// A morning's worth of 5-second ticks: an hour of typing, twenty minutes of
/// app-hopping, then the machine goes quiet.
fn workday_samples(start: i64) -> Vec<RawSample> {
    let mut samples = Vec::new();
    let mut ts = start;

    for _ in 0..720 {
        samples.push(sample(ts, 7, 0, "Code"));
        ts += 5;
    }
    for _ in 0..240 {
        samples.push(sample(ts, 1, 1, "Slack"));
        ts += 5;
    }
    for _ in 0..120 {
        samples.push(sample(ts, 0, 0, "Code"));
        ts += 5;
    }

    samples
}

#[test]
fn full_day_replay_produces_consistent_statistics() {
    let engine = FocusEngine::default();
    let start = 9 * 3600; // 09:00 UTC
    let timeline = engine.process_samples(&workday_samples(start));

    assert!(!timeline.is_empty());

    // The quiet tail collapsed into a single gap point.
    let gaps: Vec<_> = timeline
        .points()
        .iter()
        .filter(|p| p.state == AttentionState::IdleGap)
        .collect();
    assert_eq!(gaps.len(), 1);
    assert_eq!(gaps[0].gap_duration_secs, 600);

    let stats = engine.daily_stats(&timeline);
    assert!(stats.total_focus_hours > 0.9);
    assert!(stats.total_drift_hours > 0.2);
    assert!(stats.attention_stability_score > 0.5);
    assert_eq!(stats.total_idle_hours, 600.0 / 3600.0);

    // Slack hopping is the day's nemesis.
    assert_eq!(stats.nemesis_category.as_deref(), Some("messaging"));
    assert_eq!(stats.nemesis_app.as_deref(), Some("Slack"));

    // Focus concentrated in the 9 o'clock hour.
    assert_eq!(stats.best_hour_of_day, 9);

    let shares: f64 = stats.focus_by_category.iter().map(|c| c.share).sum();
    assert!((shares - 1.0).abs() < 1e-9);

    // All focus time sat in the profile's priority category (editor)
    assert!((stats.priority_focus_share - 1.0).abs() < 1e-9);
}

#[test]
fn reflection_narrates_the_long_focus_block() {
    let engine = FocusEngine::default();
    let timeline = engine.process_samples(&workday_samples(9 * 3600));
    let stats = engine.daily_stats(&timeline);
    let summary = engine.reflection_summary(&timeline, &stats);

    assert_eq!(summary.top_categories[0], "editor");
    assert!(summary
        .notable_blocks
        .iter()
        .any(|line| line.contains("Focus Peak")));
    assert!(summary.recovery_count == stats.total_recovery_points);
}

#[test]
fn profile_shapes_classification() {
    // A gentle profile tolerates the app-hopping a strict one flags.
    let strict = FocusEngine::new(
        derive_profile(&OnboardingAnswers {
            drift_detection_style: DriftDetectionStyle::Strict,
            sensitivity: DistractionSensitivity::High,
            ..OnboardingAnswers::default()
        }),
        EngineConfig::default(),
    );
    let gentle = FocusEngine::new(
        derive_profile(&OnboardingAnswers {
            drift_detection_style: DriftDetectionStyle::Gentle,
            sensitivity: DistractionSensitivity::Low,
            ..OnboardingAnswers::default()
        }),
        EngineConfig::default(),
    );

    // Moderate typing with one switch every other tick (6/min)
    let samples: Vec<RawSample> = (0..120)
        .map(|i| sample(i * 5, 3, (i % 2) as u32, "Chrome"))
        .collect();

    let strict_stats = strict.daily_stats(&strict.process_samples(&samples));
    let gentle_stats = gentle.daily_stats(&gentle.process_samples(&samples));

    assert!(strict_stats.total_drift_hours > gentle_stats.total_drift_hours);
}

#[tokio::test]
async fn samples_persist_and_replay_through_the_store() {
    let dir = TempDir::new().unwrap();
    let store = Store::new(dir.path().join("focusgraph.db")).unwrap();

    let profile = FocusProfile::default();
    store.save_profile(&profile).await.unwrap();

    let samples = workday_samples(9 * 3600);
    store.insert_samples(samples.clone()).await.unwrap();

    let loaded_profile = store.load_profile().await.unwrap().unwrap();
    let loaded_samples = store.samples_in_range(0, i64::MAX).await.unwrap();
    assert_eq!(loaded_samples.len(), samples.len());

    let engine = FocusEngine::new(loaded_profile, EngineConfig::default());
    let from_store = engine.daily_stats(&engine.process_samples(&loaded_samples));
    let direct = engine.daily_stats(&engine.process_samples(&samples));
    assert_eq!(from_store, direct);
}
