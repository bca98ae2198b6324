use chrono::{DateTime, FixedOffset, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::classify::AttentionState;
use crate::config::EngineConfig;
use crate::profile::{ClockFormat, FocusProfile};
use crate::stats::{hour_offset, point_duration, DailyStatistics};
use crate::timeline::Timeline;

/// Minimum span a same-state stretch needs before it earns a summary line.
const NOTABLE_BLOCK_MIN_SECS: i64 = 600;

/// Structured input handed to the reflection/narration collaborator. The
/// engine never writes prose itself; it surfaces the day's shape and lets the
/// persona layer phrase it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReflectionSummary {
    pub user_name: String,
    pub persona: String,
    pub focus_minutes: u32,
    pub drift_minutes: u32,
    pub attention_stability_score: f64,
    pub longest_focus_streak_minutes: u32,
    pub recovery_count: u32,
    /// Category names ordered by focus share, largest first
    pub top_categories: Vec<String>,
    pub best_hour_label: String,
    pub nemesis_app: Option<String>,
    /// One line per notable same-state stretch, e.g. "9:05 AM–9:40 AM Focus Peak"
    pub notable_blocks: Vec<String>,
}

/// Condense a day into the summary the reflection persona narrates from.
pub fn build_reflection(
    timeline: &Timeline,
    stats: &DailyStatistics,
    profile: &FocusProfile,
    config: &EngineConfig,
) -> ReflectionSummary {
    let clock = profile.clock_format;

    ReflectionSummary {
        user_name: profile.user_name.clone(),
        persona: profile.reflection_persona.clone(),
        focus_minutes: (stats.total_focus_hours * 60.0).round() as u32,
        drift_minutes: (stats.total_drift_hours * 60.0).round() as u32,
        attention_stability_score: stats.attention_stability_score,
        longest_focus_streak_minutes: stats.longest_focus_streak_minutes,
        recovery_count: stats.total_recovery_points,
        top_categories: stats
            .focus_by_category
            .iter()
            .take(3)
            .map(|share| share.category.clone())
            .collect(),
        best_hour_label: format_hour(stats.best_hour_of_day, clock),
        nemesis_app: stats.nemesis_app.clone(),
        notable_blocks: notable_blocks(timeline, config, clock),
    }
}

/// Contiguous same-state stretches longer than ten minutes, rendered as
/// "start–end label" lines in timeline order. Idle and gap spans are skipped:
/// absence is not worth narrating.
fn notable_blocks(timeline: &Timeline, config: &EngineConfig, clock: ClockFormat) -> Vec<String> {
    let points = timeline.points();
    let offset = hour_offset(config);

    let mut blocks = Vec::new();
    let mut i = 0;
    while i < points.len() {
        let state = points[i].state;
        let mut end = i;
        let mut span = point_duration(points, i, config);
        while end + 1 < points.len() && points[end + 1].state == state {
            end += 1;
            span += point_duration(points, end, config);
        }

        let narratable = !matches!(state, AttentionState::Idle | AttentionState::IdleGap);
        if narratable && span >= NOTABLE_BLOCK_MIN_SECS {
            let start_ts = points[i].timestamp;
            let end_ts = points[i].timestamp + span;
            blocks.push(format!(
                "{}–{} {}",
                format_clock(start_ts, offset, clock),
                format_clock(end_ts, offset, clock),
                state.as_str()
            ));
        }

        i = end + 1;
    }
    blocks
}

fn format_clock(timestamp: i64, offset: FixedOffset, clock: ClockFormat) -> String {
    let local = match DateTime::<Utc>::from_timestamp(timestamp, 0) {
        Some(dt) => dt.with_timezone(&offset),
        None => return "?".to_string(),
    };

    match clock {
        ClockFormat::TwentyFourHour => format!("{:02}:{:02}", local.hour(), local.minute()),
        ClockFormat::TwelveHour => {
            let (is_pm, hour12) = local.hour12();
            let meridiem = if is_pm { "PM" } else { "AM" };
            format!("{}:{:02} {}", hour12, local.minute(), meridiem)
        }
    }
}

fn format_hour(hour: u32, clock: ClockFormat) -> String {
    match clock {
        ClockFormat::TwentyFourHour => format!("{hour:02}:00"),
        ClockFormat::TwelveHour => {
            let meridiem = if hour >= 12 { "PM" } else { "AM" };
            let hour12 = match hour % 12 {
                0 => 12,
                h => h,
            };
            format!("{hour12} {meridiem}")
        }
    }
}
