use chrono::{DateTime, FixedOffset, Offset, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::classify::AttentionState;
use crate::config::EngineConfig;
use crate::profile::FocusProfile;
use crate::timeline::{Timeline, TimelinePoint};

/// One category's share of focus (or drift) time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub category: String,
    /// Fraction of total focus time, shares sum to 1.0
    pub share: f64,
    pub dominant_app: Option<String>,
}

/// Rollup over a single day's timeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyStatistics {
    pub total_focus_hours: f64,
    pub total_drift_hours: f64,
    pub total_idle_hours: f64,
    /// focus / (focus + drift), 0 with no active time
    pub attention_stability_score: f64,
    pub longest_focus_streak_minutes: u32,
    pub total_recovery_points: u32,
    /// Interval counts per local hour 0..23
    pub hourly_focus_map: [u32; 24],
    pub hourly_drift_map: [u32; 24],
    pub hourly_recovery_map: [u32; 24],
    pub focus_by_category: Vec<CategoryShare>,
    /// Fraction of focus time spent in the profile's priority category
    pub priority_focus_share: f64,
    pub nemesis_category: Option<String>,
    pub nemesis_app: Option<String>,
    pub best_hour_of_day: u32,
}

/// Long-horizon rollup over many days (the "passport" report).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassportStatistics {
    pub days_tracked: u32,
    pub total_focus_hours: f64,
    pub total_drift_hours: f64,
    pub total_idle_hours: f64,
    pub attention_stability_score: f64,
    pub longest_focus_streak_minutes: u32,
    pub total_recovery_points: u32,
    pub average_daily_focus_minutes: f64,
    /// Isolated one-point drift blips inside otherwise focused stretches
    pub micro_leak_events: u32,
    pub hourly_focus_map: [u32; 24],
    pub hourly_drift_map: [u32; 24],
    pub hourly_recovery_map: [u32; 24],
    pub focus_by_category: Vec<CategoryShare>,
    pub priority_focus_share: f64,
    pub nemesis_category: Option<String>,
    pub nemesis_app: Option<String>,
    pub best_hour_of_day: u32,
    pub toughest_hour_of_day: u32,
}

/// Aggregate one day's timeline. Pure and idempotent.
pub fn aggregate_daily(
    timeline: &Timeline,
    profile: &FocusProfile,
    config: &EngineConfig,
) -> DailyStatistics {
    let mut accum = Accum::default();
    accum.absorb(timeline, config);
    accum.into_daily(profile)
}

/// Aggregate many days into a passport report. Per-day accumulation is
/// associative and commutative (sums and histogram merges), so callers may
/// aggregate days independently and merge.
pub fn aggregate_passport(
    timelines: &[Timeline],
    profile: &FocusProfile,
    config: &EngineConfig,
) -> PassportStatistics {
    let mut accum = Accum::default();
    let mut days_tracked = 0u32;
    for timeline in timelines {
        if !timeline.is_empty() {
            days_tracked += 1;
        }
        accum.absorb(timeline, config);
    }
    accum.into_passport(profile, days_tracked)
}

const SECS_PER_HOUR: f64 = 3600.0;

/// Per-category duration bookkeeping, with first-seen order for stable ties.
#[derive(Debug, Default)]
struct CategoryAccum {
    secs: i64,
    first_seen: usize,
    app_secs: HashMap<String, (i64, usize)>,
}

#[derive(Debug, Default)]
struct Accum {
    focus_secs: i64,
    drift_secs: i64,
    idle_secs: i64,
    recovery_points: u32,
    micro_leaks: u32,
    longest_streak_points: usize,
    hourly_focus_count: [u32; 24],
    hourly_drift_count: [u32; 24],
    hourly_recovery_count: [u32; 24],
    hourly_focus_secs: [i64; 24],
    hourly_drift_secs: [i64; 24],
    focus_categories: HashMap<String, CategoryAccum>,
    drift_categories: HashMap<String, CategoryAccum>,
    seen_counter: usize,
    bucket_width_secs: i64,
}

impl Accum {
    fn absorb(&mut self, timeline: &Timeline, config: &EngineConfig) {
        self.bucket_width_secs = config.bucket_width_secs.max(1);
        let points = timeline.points();
        let offset = hour_offset(config);

        let mut streak = 0usize;
        for (i, point) in points.iter().enumerate() {
            let duration = point_duration(points, i, config);

            match point.state {
                AttentionState::FocusPeak | AttentionState::LightFocus => {
                    self.focus_secs += duration;
                    streak += 1;
                    self.longest_streak_points = self.longest_streak_points.max(streak);
                    if let Some(hour) = local_hour(point.timestamp, offset) {
                        self.hourly_focus_count[hour] += 1;
                        self.hourly_focus_secs[hour] += duration;
                    }
                    self.record_category(point, duration, true);
                }
                AttentionState::DriftZone => {
                    self.drift_secs += duration;
                    streak = 0;
                    if let Some(hour) = local_hour(point.timestamp, offset) {
                        self.hourly_drift_count[hour] += 1;
                        self.hourly_drift_secs[hour] += duration;
                    }
                    self.record_category(point, duration, false);
                    if is_micro_leak(points, i) {
                        self.micro_leaks += 1;
                    }
                }
                AttentionState::RecoveryPoint => {
                    self.recovery_points += 1;
                    streak = 0;
                    if let Some(hour) = local_hour(point.timestamp, offset) {
                        self.hourly_recovery_count[hour] += 1;
                    }
                }
                AttentionState::Idle => {
                    self.idle_secs += duration;
                    streak = 0;
                }
                AttentionState::IdleGap => {
                    self.idle_secs += point.gap_duration_secs.max(0);
                    streak = 0;
                }
            }
        }
    }

    fn record_category(&mut self, point: &TimelinePoint, duration: i64, focus: bool) {
        let category = point.category.clone().unwrap_or_else(|| "other".to_string());
        let target = if focus {
            &mut self.focus_categories
        } else {
            &mut self.drift_categories
        };

        self.seen_counter += 1;
        let order = self.seen_counter;
        let entry = target.entry(category).or_insert_with(|| CategoryAccum {
            secs: 0,
            first_seen: order,
            app_secs: HashMap::new(),
        });
        entry.secs += duration;

        if let Some(app) = &point.dominant_app {
            let app_order = entry.app_secs.len();
            let app_entry = entry.app_secs.entry(app.clone()).or_insert((0, app_order));
            app_entry.0 += duration;
        }
    }

    fn stability(&self) -> f64 {
        let active = self.focus_secs + self.drift_secs;
        if active == 0 {
            return 0.0;
        }
        self.focus_secs as f64 / active as f64
    }

    fn streak_minutes(&self) -> u32 {
        let secs = self.longest_streak_points as i64 * self.bucket_width_secs.max(1);
        (secs / 60) as u32
    }

    fn focus_by_category(&self) -> Vec<CategoryShare> {
        let total: i64 = self.focus_categories.values().map(|c| c.secs).sum();
        if total <= 0 {
            return Vec::new();
        }

        let mut shares: Vec<(&String, &CategoryAccum)> = self.focus_categories.iter().collect();
        shares.sort_by(|(_, a), (_, b)| {
            b.secs.cmp(&a.secs).then(a.first_seen.cmp(&b.first_seen))
        });

        shares
            .into_iter()
            .map(|(category, accum)| CategoryShare {
                category: category.clone(),
                share: accum.secs as f64 / total as f64,
                dominant_app: dominant_app(&accum.app_secs),
            })
            .collect()
    }

    fn nemesis(&self) -> (Option<String>, Option<String>) {
        let worst = self
            .drift_categories
            .iter()
            .filter(|(_, accum)| accum.secs > 0)
            .max_by(|(_, a), (_, b)| {
                a.secs.cmp(&b.secs).then(b.first_seen.cmp(&a.first_seen))
            });

        match worst {
            Some((category, accum)) => (Some(category.clone()), dominant_app(&accum.app_secs)),
            None => (None, None),
        }
    }

    /// Share of focus time that landed in the profile's priority category,
    /// 0 when no focus time was recorded.
    fn priority_share(&self, profile: &FocusProfile) -> f64 {
        let total: i64 = self.focus_categories.values().map(|c| c.secs).sum();
        if total <= 0 {
            return 0.0;
        }
        let priority = self
            .focus_categories
            .get(&profile.priority_category)
            .map(|c| c.secs)
            .unwrap_or(0);
        priority as f64 / total as f64
    }

    fn into_daily(self, profile: &FocusProfile) -> DailyStatistics {
        let (nemesis_category, nemesis_app) = self.nemesis();
        let priority_focus_share = self.priority_share(profile);
        DailyStatistics {
            total_focus_hours: self.focus_secs as f64 / SECS_PER_HOUR,
            total_drift_hours: self.drift_secs as f64 / SECS_PER_HOUR,
            total_idle_hours: self.idle_secs as f64 / SECS_PER_HOUR,
            attention_stability_score: self.stability(),
            longest_focus_streak_minutes: self.streak_minutes(),
            total_recovery_points: self.recovery_points,
            hourly_focus_map: self.hourly_focus_count,
            hourly_drift_map: self.hourly_drift_count,
            hourly_recovery_map: self.hourly_recovery_count,
            focus_by_category: self.focus_by_category(),
            priority_focus_share,
            nemesis_category,
            nemesis_app,
            best_hour_of_day: peak_hour(&self.hourly_focus_secs),
        }
    }

    fn into_passport(self, profile: &FocusProfile, days_tracked: u32) -> PassportStatistics {
        let (nemesis_category, nemesis_app) = self.nemesis();
        let priority_focus_share = self.priority_share(profile);
        let focus_minutes = self.focus_secs as f64 / 60.0;
        let average_daily_focus_minutes = if days_tracked == 0 {
            0.0
        } else {
            focus_minutes / f64::from(days_tracked)
        };

        PassportStatistics {
            days_tracked,
            total_focus_hours: self.focus_secs as f64 / SECS_PER_HOUR,
            total_drift_hours: self.drift_secs as f64 / SECS_PER_HOUR,
            total_idle_hours: self.idle_secs as f64 / SECS_PER_HOUR,
            attention_stability_score: self.stability(),
            longest_focus_streak_minutes: self.streak_minutes(),
            total_recovery_points: self.recovery_points,
            average_daily_focus_minutes,
            micro_leak_events: self.micro_leaks,
            hourly_focus_map: self.hourly_focus_count,
            hourly_drift_map: self.hourly_drift_count,
            hourly_recovery_map: self.hourly_recovery_count,
            focus_by_category: self.focus_by_category(),
            priority_focus_share,
            nemesis_category,
            nemesis_app,
            best_hour_of_day: peak_hour(&self.hourly_focus_secs),
            toughest_hour_of_day: peak_hour(&self.hourly_drift_secs),
        }
    }
}

/// Duration of point i: gap span for IdleGap, else the distance to the next
/// point capped at the clock-jump sentinel; the final point gets one bucket
/// width.
pub(crate) fn point_duration(points: &[TimelinePoint], i: usize, config: &EngineConfig) -> i64 {
    let width = config.bucket_width_secs.max(1);
    let point = &points[i];

    if point.state == AttentionState::IdleGap {
        return point.gap_duration_secs.max(0);
    }

    match points.get(i + 1) {
        Some(next) => (next.timestamp - point.timestamp)
            .clamp(0, config.max_point_duration_secs.max(width)),
        None => width,
    }
}

/// A drift point sandwiched between focus points: a short attention leak.
fn is_micro_leak(points: &[TimelinePoint], i: usize) -> bool {
    let before_focus = i > 0 && points[i - 1].state.is_focus();
    let after_focus = points.get(i + 1).map(|p| p.state.is_focus()).unwrap_or(false);
    before_focus && after_focus
}

pub(crate) fn hour_offset(config: &EngineConfig) -> FixedOffset {
    FixedOffset::east_opt(config.utc_offset_secs).unwrap_or_else(|| Utc.fix())
}

fn local_hour(timestamp: i64, offset: FixedOffset) -> Option<usize> {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .map(|dt| dt.with_timezone(&offset).hour() as usize)
}

/// Hour with the highest duration sum; earliest hour wins full ties.
fn peak_hour(hourly_secs: &[i64; 24]) -> u32 {
    let mut best = 0usize;
    for (hour, secs) in hourly_secs.iter().enumerate() {
        if *secs > hourly_secs[best] {
            best = hour;
        }
    }
    best as u32
}

fn dominant_app(app_secs: &HashMap<String, (i64, usize)>) -> Option<String> {
    app_secs
        .iter()
        .max_by(|(_, (secs_a, order_a)), (_, (secs_b, order_b))| {
            secs_a.cmp(secs_b).then(order_b.cmp(order_a))
        })
        .map(|(app, _)| app.clone())
}
