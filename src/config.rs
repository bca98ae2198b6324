/// Configuration for the classification pipeline with tunable thresholds.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Width of one ingestion bucket in seconds (capture cadence)
    pub bucket_width_secs: i64,

    /// Minimum run of consecutive Idle buckets that collapses into one IdleGap
    pub idle_merge_min_run: usize,

    /// Clock skips larger than this (seconds) get a synthetic IdleGap point
    pub gap_threshold_secs: i64,

    /// Per-point duration cap for aggregation (guards against clock jumps)
    pub max_point_duration_secs: i64,

    /// Buckets that must pass after a RecoveryPoint before another may fire
    pub recovery_debounce_buckets: usize,

    /// Activity score at or above this is FocusPeak (else LightFocus)
    pub focus_peak_score: f64,

    /// Activity-score weights for keystrokes / clicks / scrolls
    pub weight_keystrokes: f64,
    pub weight_clicks: f64,
    pub weight_scrolls: f64,

    /// Offset from UTC (seconds) used for local-hour histograms
    pub utc_offset_secs: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bucket_width_secs: 5,
            idle_merge_min_run: 3,
            gap_threshold_secs: 300,
            max_point_duration_secs: 300,
            recovery_debounce_buckets: 3,
            focus_peak_score: 1.5,
            weight_keystrokes: 0.5,
            weight_clicks: 0.3,
            weight_scrolls: 0.2,
            utc_offset_secs: 0,
        }
    }
}
