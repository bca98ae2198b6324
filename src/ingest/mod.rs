use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::category::map_app_to_category;
use crate::config::EngineConfig;

/// One capture tick from the input/activity collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSample {
    /// Unix seconds
    pub timestamp: i64,
    pub keystrokes: u32,
    pub clicks: u32,
    pub scrolls: u32,
    /// App-foreground changes since the previous sample
    pub switches: u32,
    #[serde(default)]
    pub dominant_app: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl RawSample {
    pub fn is_idle(&self) -> bool {
        self.keystrokes == 0 && self.clicks == 0 && self.scrolls == 0 && self.switches == 0
    }
}

/// A closed ingestion bucket: summed activity over one fixed-width interval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketMetrics {
    pub start_ts: i64,
    pub width_secs: i64,
    pub keystrokes: u32,
    pub clicks: u32,
    pub scrolls: u32,
    pub switches: u32,
    pub sample_count: u32,
    /// Most-sampled non-null app, "Unknown" when none observed
    pub dominant_app: String,
    /// Category tag for the dominant app
    pub category: String,
    pub idle: bool,
}

impl BucketMetrics {
    pub fn keystrokes_per_min(&self) -> f64 {
        per_minute(self.keystrokes, self.width_secs)
    }

    pub fn clicks_per_min(&self) -> f64 {
        per_minute(self.clicks, self.width_secs)
    }

    pub fn scrolls_per_min(&self) -> f64 {
        per_minute(self.scrolls, self.width_secs)
    }

    pub fn switches_per_min(&self) -> f64 {
        per_minute(self.switches, self.width_secs)
    }
}

fn per_minute(count: u32, width_secs: i64) -> f64 {
    if width_secs <= 0 {
        return 0.0;
    }
    f64::from(count) * 60.0 / width_secs as f64
}

#[derive(Debug)]
struct OpenBucket {
    start_ts: i64,
    keystrokes: u32,
    clicks: u32,
    scrolls: u32,
    switches: u32,
    sample_count: u32,
    // value is (sample count, first-seen order) so ties resolve deterministically
    app_counts: HashMap<String, (u32, usize)>,
    category_counts: HashMap<String, (u32, usize)>,
}

impl OpenBucket {
    fn new(start_ts: i64) -> Self {
        Self {
            start_ts,
            keystrokes: 0,
            clicks: 0,
            scrolls: 0,
            switches: 0,
            sample_count: 0,
            app_counts: HashMap::new(),
            category_counts: HashMap::new(),
        }
    }

    fn absorb(&mut self, sample: &RawSample) {
        self.keystrokes += sample.keystrokes;
        self.clicks += sample.clicks;
        self.scrolls += sample.scrolls;
        self.switches += sample.switches;
        self.sample_count += 1;

        if let Some(app) = &sample.dominant_app {
            let next_order = self.app_counts.len();
            let entry = self.app_counts.entry(app.clone()).or_insert((0, next_order));
            entry.0 += 1;
        }
        if let Some(category) = &sample.category {
            let next_order = self.category_counts.len();
            let entry = self
                .category_counts
                .entry(category.clone())
                .or_insert((0, next_order));
            entry.0 += 1;
        }
    }

    fn close(self, width_secs: i64) -> BucketMetrics {
        let dominant_app =
            most_sampled(&self.app_counts).unwrap_or_else(|| "Unknown".to_string());
        let category = most_sampled(&self.category_counts)
            .unwrap_or_else(|| map_app_to_category(&dominant_app).to_string());

        let idle = self.keystrokes == 0 && self.clicks == 0 && self.scrolls == 0 && self.switches == 0;

        BucketMetrics {
            start_ts: self.start_ts,
            width_secs,
            keystrokes: self.keystrokes,
            clicks: self.clicks,
            scrolls: self.scrolls,
            switches: self.switches,
            sample_count: self.sample_count,
            dominant_app,
            category,
            idle,
        }
    }
}

/// Highest sample count wins; ties break toward the first app seen.
fn most_sampled(counts: &HashMap<String, (u32, usize)>) -> Option<String> {
    counts
        .iter()
        .max_by(|(_, (count_a, order_a)), (_, (count_b, order_b))| {
            count_a.cmp(count_b).then(order_b.cmp(order_a))
        })
        .map(|(name, _)| name.clone())
}

/// Accumulates raw samples into fixed-width buckets. Single writer: the
/// ingestion path owns the open bucket, and only closed buckets leave.
#[derive(Debug)]
pub struct SampleBuffer {
    bucket_width_secs: i64,
    open: Option<OpenBucket>,
    last_accepted_ts: Option<i64>,
}

impl SampleBuffer {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            bucket_width_secs: config.bucket_width_secs.max(1),
            open: None,
            last_accepted_ts: None,
        }
    }

    /// Ingest one sample. Returns the previous bucket when this sample opens
    /// a new interval. Out-of-order samples are dropped with a diagnostic and
    /// never touch the open bucket.
    pub fn ingest(&mut self, sample: RawSample) -> Option<BucketMetrics> {
        if let Some(last) = self.last_accepted_ts {
            if sample.timestamp < last {
                warn!(
                    "dropping out-of-order sample at {} (last accepted {})",
                    sample.timestamp, last
                );
                return None;
            }
        }
        self.last_accepted_ts = Some(sample.timestamp);

        let mut closed = None;
        if let Some(open) = &self.open {
            if sample.timestamp >= open.start_ts + self.bucket_width_secs {
                closed = self.flush_bucket();
            }
        }

        let open = self
            .open
            .get_or_insert_with(|| OpenBucket::new(sample.timestamp));
        open.absorb(&sample);

        closed
    }

    /// Close and return the open bucket, resetting buffer state.
    pub fn flush_bucket(&mut self) -> Option<BucketMetrics> {
        let bucket = self.open.take()?.close(self.bucket_width_secs);
        debug!(
            "closed bucket at {}: {} samples, idle={}",
            bucket.start_ts, bucket.sample_count, bucket.idle
        );
        Some(bucket)
    }

    /// Batch helper: bucket an ordered slice of samples, flushing the tail.
    pub fn bucketize(config: &EngineConfig, samples: &[RawSample]) -> Vec<BucketMetrics> {
        let mut buffer = SampleBuffer::new(config);
        let mut buckets = Vec::new();
        for sample in samples {
            if let Some(bucket) = buffer.ingest(sample.clone()) {
                buckets.push(bucket);
            }
        }
        if let Some(bucket) = buffer.flush_bucket() {
            buckets.push(bucket);
        }
        buckets
    }
}
