mod config;
mod panel;
mod render;
mod scheduler;
mod source;
mod tracker;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::oneshot;

use crate::config::{Config, ConfigError};
use crate::panel::{DisplayError, FramePanel, Panel};
use crate::render::{Assets, RasterSize, RenderError, TrajectoryRenderer};
use crate::scheduler::{AcquisitionScheduler, SchedulerSettings};
use crate::source::OpenNotifySource;
use crate::tracker::{in_range, Fix, PositionSample, SampleStore};

#[derive(Parser)]
#[command(name = "iss-o-mat")]
#[command(about = "ISS position tracker for two-colour e-paper panels")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Track the station and refresh the panel until interrupted
    Run {
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Render a JSON list of positions once
    Render {
        #[arg(short, long)]
        positions: String,
        #[arg(short, long)]
        config: Option<String>,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Blank the panel, e.g. before storing it
    Clear {
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Validate a config file and its assets
    Validate {
        #[arg(short, long)]
        config: Option<String>,
    },
}

/// One entry of a `render` positions file.
#[derive(Debug, Deserialize)]
struct Waypoint {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config } => run(config.as_deref()).await,
        Commands::Render {
            positions,
            config,
            out,
        } => render_once(&positions, config.as_deref(), out),
        Commands::Clear { config } => clear(config.as_deref()),
        Commands::Validate { config } => validate(config.as_deref()),
    }
}

fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => Config::from_file(path),
        None => {
            log::info!("No config file given, using defaults");
            Ok(Config::default())
        }
    }
}

fn build_renderer(config: &Config) -> Result<TrajectoryRenderer, RenderError> {
    let assets = Assets::load(&config.assets.base_map, &config.assets.icon)?;
    let size = RasterSize {
        width: config.raster.width,
        height: config.raster.height,
    };
    let renderer =
        TrajectoryRenderer::new(assets, config.projection, size, config.intervals_per_marker())?;
    Ok(renderer.rotated(config.raster.rotate_180))
}

fn build_panel(config: &Config, out: Option<PathBuf>) -> FramePanel {
    let output_dir = out.unwrap_or_else(|| config.panel.output_dir.clone());
    FramePanel::new(output_dir, config.raster.width, config.raster.height)
}

fn prepare(path: Option<&str>) -> Option<(Config, TrajectoryRenderer)> {
    let config = match load_config(path) {
        Ok(c) => c,
        Err(e) => {
            log::error!("Config error: {}", e);
            return None;
        }
    };
    match build_renderer(&config) {
        Ok(renderer) => Some((config, renderer)),
        Err(e) => {
            log::error!("Cannot render: {}", e);
            None
        }
    }
}

async fn run(path: Option<&str>) -> ExitCode {
    let Some((config, renderer)) = prepare(path) else {
        return ExitCode::FAILURE;
    };

    let source = match OpenNotifySource::new(config.source.url.clone(), config.source.timeout) {
        Ok(s) => s,
        Err(e) => {
            log::error!("Cannot create HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };
    log::info!("Polling {}", source.url());

    let panel = build_panel(&config, None);
    log::info!("Writing frames to {}", panel.output_dir().display());

    let store = SampleStore::new(config.sampling.capacity);
    log::info!("Keeping the last {} positions", store.capacity());

    let mut scheduler = AcquisitionScheduler::new(
        source,
        panel,
        renderer,
        store,
        SchedulerSettings {
            sampling_interval: config.sampling.interval,
            display_refresh_divisor: config.sampling.display_refresh_divisor,
            max_display_failures: config.panel.max_consecutive_failures,
        },
    );

    let (stop_tx, stop_rx) = oneshot::channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                log::info!("Interrupted, stopping after the current cycle");
                let _ = stop_tx.send(());
            }
            Err(e) => {
                log::warn!("Cannot listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    });

    let result = scheduler.run(stop_rx).await;

    if let Some(last) = scheduler.store().latest() {
        log::info!(
            "Last position #{}: lat {:.4}, lon {:.4} at {}",
            last.sequence,
            last.latitude,
            last.longitude,
            last.timestamp
        );
    }

    let mut panel = scheduler.into_panel();
    log::info!("{} panel refreshes this session", panel.refreshes());
    if let Err(e) = panel.power_off() {
        log::error!("Failed to power off panel: {}", e);
    }
    log::info!("Clear the panel with `iss-o-mat clear` before storing it, to prevent burn-in");

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn render_once(positions: &str, path: Option<&str>, out: Option<PathBuf>) -> ExitCode {
    let Some((config, renderer)) = prepare(path) else {
        return ExitCode::FAILURE;
    };

    let waypoints: Vec<Waypoint> = match fs::read_to_string(positions)
        .map_err(|e| e.to_string())
        .and_then(|c| serde_json::from_str(&c).map_err(|e| e.to_string()))
    {
        Ok(w) => w,
        Err(e) => {
            log::error!("Cannot read positions from {}: {}", positions, e);
            return ExitCode::FAILURE;
        }
    };

    let samples = match to_samples(waypoints, Utc::now()) {
        Ok(s) => s,
        Err(e) => {
            log::error!("Bad position in {}: {}", positions, e);
            return ExitCode::FAILURE;
        }
    };

    let frame = renderer.render(&samples);
    let mut panel = build_panel(&config, out);
    match panel.refresh(&frame) {
        Ok(()) => {
            println!(
                "Rendered {} positions to {}",
                samples.len(),
                panel.output_dir().display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Panel error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Numbers waypoints in file order, rejecting any outside the valid
/// latitude/longitude range.
fn to_samples(waypoints: Vec<Waypoint>, now: DateTime<Utc>) -> Result<Vec<PositionSample>, String> {
    waypoints
        .into_iter()
        .enumerate()
        .map(|(i, w)| {
            if !in_range(w.latitude, w.longitude) {
                return Err(format!(
                    "entry {}: lat {}, lon {} out of range",
                    i, w.latitude, w.longitude
                ));
            }
            let fix = Fix::new(w.latitude, w.longitude, w.timestamp.unwrap_or(now));
            Ok(fix.into_sample(i as u64))
        })
        .collect()
}

fn clear(path: Option<&str>) -> ExitCode {
    let config = match load_config(path) {
        Ok(c) => c,
        Err(e) => {
            log::error!("Config error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut panel = build_panel(&config, None);
    match clear_panel(&mut panel) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Panel error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn clear_panel<P: Panel>(panel: &mut P) -> Result<(), DisplayError> {
    panel.power_on()?;
    panel.clear()?;
    panel.sleep()?;
    panel.power_off()
}

fn validate(path: Option<&str>) -> ExitCode {
    let Some((config, renderer)) = prepare(path) else {
        return ExitCode::FAILURE;
    };

    let size = renderer.size();
    let sampling = &config.sampling;
    println!("Config is valid");
    println!("  source:   {} (timeout {:?})", config.source.url, config.source.timeout);
    println!("  raster:   {}x{}", size.width, size.height);
    println!(
        "  sampling: every {:?}, keeping {} positions",
        sampling.interval, sampling.capacity
    );
    println!(
        "  panel:    refresh every {} sample(s), marker every {} sample(s)",
        sampling.display_refresh_divisor,
        renderer.intervals_per_marker()
    );
    ExitCode::SUCCESS
}
