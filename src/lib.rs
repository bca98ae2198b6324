pub mod category;
pub mod classify;
pub mod config;
pub mod engine;
pub mod ingest;
pub mod profile;
pub mod reflection;
pub mod stats;
pub mod store;
pub mod timeline;

pub use classify::{AttentionState, Classification, StateClassifier};
pub use config::EngineConfig;
pub use engine::FocusEngine;
pub use ingest::{BucketMetrics, RawSample, SampleBuffer};
pub use profile::{derive_profile, FocusProfile, OnboardingAnswers};
pub use reflection::{build_reflection, ReflectionSummary};
pub use stats::{
    aggregate_daily, aggregate_passport, CategoryShare, DailyStatistics, PassportStatistics,
};
pub use store::Store;
pub use timeline::{build_timeline, ClassifiedBucket, Timeline, TimelinePoint};
