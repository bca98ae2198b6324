use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::Serialize;

use focusgraph::{
    DailyStatistics, EngineConfig, FocusEngine, FocusProfile, RawSample, ReflectionSummary, Store,
    Timeline,
};

#[derive(Serialize)]
struct ReplayOutput {
    timeline: Timeline,
    daily: DailyStatistics,
    reflection: ReflectionSummary,
}

/// Replay a capture log through the engine and print the day's rollup.
///
/// Usage: focusgraph <samples.json> [--db <path>]
///
/// The samples file is a JSON array of raw capture ticks. With --db, samples
/// are also persisted and the stored profile (if any) drives classification.
#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (samples_path, db_path) = parse_args(&args)?;

    let raw = fs::read_to_string(&samples_path)
        .with_context(|| format!("failed to read samples file {}", samples_path.display()))?;
    let samples: Vec<RawSample> =
        serde_json::from_str(&raw).context("samples file is not a JSON array of samples")?;

    log::info!("replaying {} samples", samples.len());

    let mut profile = FocusProfile::default();
    if let Some(path) = db_path {
        let store = Store::new(path)?;
        if let Some(stored) = store.load_profile().await? {
            profile = stored;
        }
        store.insert_samples(samples.clone()).await?;
    }

    let engine = FocusEngine::new(profile, EngineConfig::default());
    let timeline = engine.process_samples(&samples);
    let daily = engine.daily_stats(&timeline);
    let reflection = engine.reflection_summary(&timeline, &daily);

    let output = ReplayOutput {
        timeline,
        daily,
        reflection,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

fn parse_args(args: &[String]) -> Result<(PathBuf, Option<PathBuf>)> {
    let mut samples_path = None;
    let mut db_path = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--db" => {
                let value = args
                    .get(i + 1)
                    .context("--db requires a path argument")?;
                db_path = Some(PathBuf::from(value));
                i += 2;
            }
            flag if flag.starts_with("--") => bail!("unknown flag: {flag}"),
            path => {
                if samples_path.is_some() {
                    bail!("unexpected extra argument: {path}");
                }
                samples_path = Some(PathBuf::from(path));
                i += 1;
            }
        }
    }

    let samples_path = samples_path.context("usage: focusgraph <samples.json> [--db <path>]")?;
    Ok((samples_path, db_path))
}
