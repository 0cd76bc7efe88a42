mod render;
mod source;

use std::{
    path::PathBuf,
    thread,
    time::{Duration, Instant},
};

use clap::{Parser, Subcommand, ValueEnum};
use insole_viewer_core::{AppConfig, ClockState, HeatmapMode, Player, Session, SourceKind};
use tracing_subscriber::EnvFilter;

use crate::{render::ConsoleRenderer, source::SensorSimulator};

/// Upper bound on how long the host loop sleeps between clock updates.
const FRAME: Duration = Duration::from_millis(16);

fn main() -> insole_viewer_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::from_json_file(path)?,
        None => AppConfig::default(),
    };

    match cli.command {
        Commands::Play {
            input,
            demo_seconds,
            rate,
            from,
            heatmap,
        } => run_play(&config, input, demo_seconds, rate, from, heatmap.into()),
        Commands::Live {
            duration_ms,
            record,
            heatmap,
        } => run_live(&config, duration_ms, record, heatmap.into()),
    }
}

fn run_play(
    config: &AppConfig,
    input: Option<PathBuf>,
    demo_seconds: u32,
    rate: f64,
    from: i64,
    heatmap: HeatmapMode,
) -> insole_viewer_core::Result<()> {
    let store = match &input {
        Some(path) => source::load_recording(path, &config.calibration)?,
        None => source::demo_recording(
            demo_seconds,
            config.playback.sample_rate_hz,
            &config.calibration,
        ),
    };
    tracing::info!(?input, samples = store.len(), rate, "starting playback");

    let mut player = Player::new(config)?;
    player
        .hub_mut()
        .on_window_update(ConsoleRenderer::new(heatmap));
    player.enable(store);
    if player.state() == ClockState::Disabled {
        tracing::warn!("nothing to play");
        return Ok(());
    }

    player.set_rate(rate)?;
    player.set_head(from);
    player.play();

    let mut last = Instant::now();
    while player.state() == ClockState::Playing {
        thread::sleep(player.clock().tick_interval().min(FRAME));
        let now = Instant::now();
        player.advance(now - last);
        last = now;
    }

    let labels = player.timestamps();
    tracing::info!(
        start = %labels.start,
        head = %labels.head,
        end = %labels.end,
        "playback finished"
    );
    Ok(())
}

fn run_live(
    config: &AppConfig,
    duration_ms: u64,
    record: Option<PathBuf>,
    heatmap: HeatmapMode,
) -> insole_viewer_core::Result<()> {
    tracing::info!(duration_ms, record = record.is_some(), "starting live mode");

    let mut session = Session::new(config)?;
    session
        .player_mut()
        .hub_mut()
        .on_window_update(ConsoleRenderer::new(heatmap));
    session.select(SourceKind::Live);
    if record.is_some() {
        session.start_recording();
    }

    let simulator = SensorSimulator::new(config.playback.sample_rate_hz);
    let interval = Duration::from_millis(simulator.interval_ms());
    let started = Instant::now();
    let frames = simulator.take_while(|(timestamp_ms, _)| *timestamp_ms < duration_ms);
    for (timestamp_ms, raw) in frames {
        let due = started + Duration::from_millis(timestamp_ms);
        if let Some(wait) = due.checked_duration_since(Instant::now()) {
            thread::sleep(wait.min(interval));
        }
        session.ingest(timestamp_ms, raw);
    }

    if let Some(path) = record {
        let recording = session.stop_recording();
        source::save_recording(&path, recording)?;
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Pressure insole viewer", long_about = None)]
struct Cli {
    /// JSON configuration file; built-in defaults are used when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play back a recording, or simulated data when no input is given.
    Play {
        /// JSON recording to load.
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Length of the simulated recording used without `--input`.
        #[arg(long, default_value_t = 5)]
        demo_seconds: u32,
        /// Playback speed multiplier.
        #[arg(short, long, default_value_t = 1.0)]
        rate: f64,
        /// Sample index to start playing from.
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        from: i64,
        #[arg(long, value_enum, default_value_t = HeatmapArg::Head)]
        heatmap: HeatmapArg,
    },
    /// Stream simulated sensor data through the live view.
    Live {
        /// How long to stream for.
        #[arg(short, long, default_value_t = 3_000)]
        duration_ms: u64,
        /// Record the stream and save it to this JSON file.
        #[arg(short, long)]
        record: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = HeatmapArg::Head)]
        heatmap: HeatmapArg,
    },
}

/// Heat map source selectable from the command line.
#[derive(ValueEnum, Clone, Copy, Debug)]
enum HeatmapArg {
    Head,
    Average,
}

impl From<HeatmapArg> for HeatmapMode {
    fn from(value: HeatmapArg) -> Self {
        match value {
            HeatmapArg::Head => HeatmapMode::Head,
            HeatmapArg::Average => HeatmapMode::Average,
        }
    }
}
