use clap::Parser;
use screenmatch::capture::memory::{BlitBackend, DuplicationBackend, SharedDisplay};
use screenmatch::image::io::{load_bgra_image, load_template};
use screenmatch::{
    CycleRunner, FrameSource, MatchEngine, MatchResult, SearchRegion, Settings, SharedState,
    StatsSnapshot, DEFAULT_PERIOD,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "ScreenMatch CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
struct RegionConfig {
    x: i32,
    y: i32,
    width: usize,
    height: usize,
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    /// Image standing in for the display contents.
    screen_path: String,
    /// Square template images; file stems become template names.
    template_paths: Vec<String>,
    /// Search regions; empty means one region covering the whole screen.
    regions: Vec<RegionConfig>,
    /// Flat key/value settings, e.g. {"Tolerance": "12"}.
    settings: BTreeMap<String, String>,
    /// Cycles to run synchronously. Ignored when `watch_ms` is set.
    cycles: u32,
    /// Run the background cycle thread for this long instead.
    watch_ms: Option<u64>,
    /// Learning statistics to resume from.
    stats_in: Option<String>,
    /// Where to persist learning statistics.
    stats_out: Option<String>,
    /// Where to write the statistics CSV report.
    csv_out: Option<String>,
    /// Match report destination; stdout when unset.
    output_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            screen_path: String::new(),
            template_paths: Vec::new(),
            regions: Vec::new(),
            settings: BTreeMap::new(),
            cycles: 1,
            watch_ms: None,
            stats_in: None,
            stats_out: None,
            csv_out: None,
            output_path: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct MatchRecord {
    template: String,
    region: String,
    x: i32,
    y: i32,
    score: f32,
    matched_at_secs: u64,
}

impl From<&MatchResult> for MatchRecord {
    fn from(value: &MatchResult) -> Self {
        Self {
            template: value.template_name.clone(),
            region: value.region_name.clone(),
            x: value.x,
            y: value.y,
            score: value.score,
            matched_at_secs: value.matched_at_secs,
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    matches: Vec<MatchRecord>,
    cycles: u64,
    last_cycle_ms: f64,
    fps: f32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive("screenmatch=info".parse()?),
            )
            .with_target(false)
            .init();
    }

    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.screen_path.is_empty() {
        return Err("screen_path must be set in the config".into());
    }
    if config.template_paths.is_empty() {
        return Err("template_paths must name at least one template".into());
    }

    let screen = load_bgra_image(&config.screen_path)?;
    let (screen_w, screen_h) = (screen.width(), screen.height());
    let display = SharedDisplay::new(screen);
    let source = FrameSource::new(
        DuplicationBackend::new(display.clone()),
        BlitBackend::new(display.clone()),
    );

    let state = SharedState::new(Settings::default());
    state.apply_settings(
        config
            .settings
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str())),
    );

    for path in &config.template_paths {
        let template = load_template(path)?;
        state.add_template(template)?;
    }

    if config.regions.is_empty() {
        state.add_region(SearchRegion::new(0, 0, screen_w, screen_h, "screen"));
    } else {
        for r in &config.regions {
            state.add_region(SearchRegion::new(r.x, r.y, r.width, r.height, r.name.clone()));
        }
    }

    if let Some(path) = &config.stats_in {
        if let Ok(text) = fs::read_to_string(path) {
            let snapshot: StatsSnapshot = serde_json::from_str(&text).unwrap_or_default();
            state.restore_stats(&snapshot);
        }
    }

    let mut engine = MatchEngine::new(Arc::clone(&state), source, (screen_w, screen_h));

    if let Some(ms) = config.watch_ms {
        let runner = CycleRunner::spawn(engine, DEFAULT_PERIOD)?;
        std::thread::sleep(Duration::from_millis(ms));
        runner.join()?;
    } else {
        for _ in 0..config.cycles {
            engine.run_cycle()?;
        }
    }

    let telemetry = state.telemetry();
    let output = Output {
        matches: state.matches().iter().map(MatchRecord::from).collect(),
        cycles: telemetry.cycles,
        last_cycle_ms: telemetry.last_cycle.as_secs_f64() * 1000.0,
        fps: telemetry.fps,
    };
    let json = serde_json::to_string_pretty(&output)?;
    match &config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    if let Some(path) = &config.stats_out {
        fs::write(path, state.stats_snapshot().to_json()?)?;
    }
    if let Some(path) = &config.csv_out {
        fs::write(path, state.export_stats_csv())?;
    }

    Ok(())
}
