use serde::{Deserialize, Serialize};

use crate::classify::{AttentionState, Classification};
use crate::config::EngineConfig;
use crate::ingest::BucketMetrics;

/// A classified bucket awaiting timeline placement.
#[derive(Debug, Clone)]
pub struct ClassifiedBucket {
    pub metrics: BucketMetrics,
    pub classification: Classification,
}

/// One point on the attention timeline, ordered by timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub timestamp: i64,
    pub state: AttentionState,
    /// Classification intensity in [0, 1]
    pub intensity: f64,
    /// Smoothed rendering intensity; kept separate so smoothing can never
    /// alter classification outcomes
    pub display_intensity: f64,
    pub dominant_app: Option<String>,
    pub category: Option<String>,
    /// Span covered by an IdleGap point, 0 for every other state
    pub gap_duration_secs: i64,
}

/// Immutable, timestamp-ordered attention timeline for one query window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    points: Vec<TimelinePoint>,
}

impl Timeline {
    pub fn points(&self) -> &[TimelinePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Build a timeline from ordered classified buckets: merge idle runs into
/// IdleGap points, mark clock skips, and smooth display intensity.
pub fn build_timeline(buckets: &[ClassifiedBucket], config: &EngineConfig) -> Timeline {
    let width = config.bucket_width_secs.max(1);

    let mut points: Vec<TimelinePoint> = Vec::new();
    let mut idle_run: Vec<&ClassifiedBucket> = Vec::new();
    let mut prev_ts: Option<i64> = None;

    for bucket in buckets {
        // A clock skip between buckets becomes its own gap point, splitting
        // any idle run in progress.
        if let Some(prev) = prev_ts {
            let delta = bucket.metrics.start_ts - prev;
            if delta > config.gap_threshold_secs {
                flush_idle_run(&mut idle_run, &mut points, config, width);
                points.push(gap_point(prev + delta / 2, delta));
            }
        }
        prev_ts = Some(bucket.metrics.start_ts);

        if bucket.classification.state == AttentionState::Idle {
            idle_run.push(bucket);
        } else {
            flush_idle_run(&mut idle_run, &mut points, config, width);
            points.push(bucket_point(bucket));
        }
    }
    flush_idle_run(&mut idle_run, &mut points, config, width);

    collapse_adjacent_gaps(&mut points);
    smooth_display_intensity(&mut points);

    Timeline { points }
}

/// Runs of at least `idle_merge_min_run` idle buckets collapse into one
/// IdleGap point; shorter runs stay as individual Idle points.
fn flush_idle_run(
    run: &mut Vec<&ClassifiedBucket>,
    points: &mut Vec<TimelinePoint>,
    config: &EngineConfig,
    width: i64,
) {
    if run.is_empty() {
        return;
    }

    if run.len() >= config.idle_merge_min_run {
        points.push(gap_point(
            run[0].metrics.start_ts,
            run.len() as i64 * width,
        ));
    } else {
        for bucket in run.iter() {
            points.push(bucket_point(bucket));
        }
    }
    run.clear();
}

fn bucket_point(bucket: &ClassifiedBucket) -> TimelinePoint {
    let dominant_app = if bucket.metrics.dominant_app == "Unknown" {
        None
    } else {
        Some(bucket.metrics.dominant_app.clone())
    };

    TimelinePoint {
        timestamp: bucket.metrics.start_ts,
        state: bucket.classification.state,
        intensity: bucket.classification.intensity,
        display_intensity: bucket.classification.intensity,
        dominant_app,
        category: Some(bucket.metrics.category.clone()),
        gap_duration_secs: 0,
    }
}

fn gap_point(timestamp: i64, gap_duration_secs: i64) -> TimelinePoint {
    TimelinePoint {
        timestamp,
        state: AttentionState::IdleGap,
        intensity: 0.0,
        display_intensity: 0.0,
        dominant_app: None,
        category: None,
        gap_duration_secs,
    }
}

/// No two consecutive points may both be IdleGap: adjacent gaps collapse
/// into one span with summed duration at the earlier timestamp.
fn collapse_adjacent_gaps(points: &mut Vec<TimelinePoint>) {
    let mut collapsed: Vec<TimelinePoint> = Vec::with_capacity(points.len());
    for point in points.drain(..) {
        if point.state == AttentionState::IdleGap {
            if let Some(last) = collapsed.last_mut() {
                if last.state == AttentionState::IdleGap {
                    last.gap_duration_secs += point.gap_duration_secs;
                    continue;
                }
            }
        }
        collapsed.push(point);
    }
    *points = collapsed;
}

/// 3-point moving average over display intensity for interior non-gap
/// points. First/last points and IdleGap points keep raw intensity.
fn smooth_display_intensity(points: &mut [TimelinePoint]) {
    if points.len() < 3 {
        return;
    }

    let raw: Vec<f64> = points.iter().map(|p| p.intensity).collect();
    for i in 1..points.len() - 1 {
        let window_clear = points[i - 1].state != AttentionState::IdleGap
            && points[i].state != AttentionState::IdleGap
            && points[i + 1].state != AttentionState::IdleGap;
        if window_clear {
            points[i].display_intensity = (raw[i - 1] + raw[i] + raw[i + 1]) / 3.0;
        }
    }
}
