//! Neonrace - procedural racetracks and reactive race audio
//!
//! Developer tool: dump level layouts as JSON, render scripted race
//! sessions to WAV, or (with `live-audio`) play them on the speakers.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use neonrace::cli::{create_recording_config, Args, Command};
use neonrace::params::{AudioConfig, Settings, TrackConfig};
use neonrace::session::record_session;
use neonrace::track::{LevelLayout, ObstacleKind, ParallaxLayer, TrackGenerator};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    let settings: Settings = args.load_settings().context("Failed to load settings")?;

    match args.command {
        Command::Track { level, seed, out } => {
            generate_track(settings.track, level, seed, out.as_deref())
        }
        Command::Render { seconds, out, seed } => {
            render_session(&settings.audio, seconds, out, seed)
        }
        #[cfg(feature = "live-audio")]
        Command::Play {
            seconds,
            record,
            seed,
        } => play_session(settings.audio, seconds, record, seed),
    }
}

fn generate_track(
    config: TrackConfig,
    level: u32,
    seed: Option<u64>,
    out: Option<&Path>,
) -> Result<()> {
    let layout = match seed {
        Some(seed) => TrackGenerator::with_seed(config, seed).generate_level(level),
        None => TrackGenerator::new(config).generate_level(level),
    };

    match out {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &layout)?;
            writer.flush()?;
            print_summary(&layout);
            println!("Wrote {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, &layout)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

fn print_summary(layout: &LevelLayout) {
    let barriers = layout
        .obstacles
        .iter()
        .filter(|o| o.kind == ObstacleKind::Barrier)
        .count();
    let near = layout
        .buildings
        .iter()
        .filter(|b| b.layer == ParallaxLayer::Near)
        .count();
    let span = layout.points.last().map_or(0.0, |p| p.x);

    println!("Level {}", layout.level);
    println!("  Points:    {} (x span {:.0})", layout.points.len(), span);
    println!(
        "  Obstacles: {} ({} barriers, {} debris)",
        layout.obstacles.len(),
        barriers,
        layout.obstacles.len() - barriers
    );
    println!(
        "  Buildings: {} ({} near, {} far)",
        layout.buildings.len(),
        near,
        layout.buildings.len() - near
    );
}

fn render_session(config: &AudioConfig, seconds: f32, out: PathBuf, seed: u64) -> Result<()> {
    let recording = create_recording_config(seconds, out);
    println!(
        "Rendering {}s session @ {}Hz",
        recording.duration_secs, config.sample_rate_hz
    );

    let samples = record_session(config, &recording, seed).with_context(|| {
        format!(
            "Failed to render session to {}",
            recording.audio_path.display()
        )
    })?;

    println!(
        "Wrote {} samples to {}",
        samples,
        recording.audio_path.display()
    );
    Ok(())
}

#[cfg(feature = "live-audio")]
fn play_session(
    mut config: AudioConfig,
    seconds: f32,
    record: Option<PathBuf>,
    seed: u64,
) -> Result<()> {
    use std::time::Duration;

    use neonrace::audio::{AudioGraph, AudioManager, AudioSystem, SharedGraph, SoftwareGraph};
    use neonrace::session::{RaceSession, MIN_SESSION_SECS};

    config.sample_rate_hz = AudioSystem::device_sample_rate()?;
    let recording = record.map(|path| create_recording_config(seconds, path));

    let graph = SharedGraph::new(SoftwareGraph::new(config.sample_rate_hz as f32));
    let system = AudioSystem::new(graph.clone(), recording.as_ref())?;
    let mut audio = AudioManager::new(graph, config, seed);
    audio.init()?;

    let duration = seconds.max(MIN_SESSION_SECS) as f64;
    let mut session = RaceSession::new(seconds);

    println!("\nNeonrace session is playing ({}s)\n", duration);

    // Game loop at ~60 fps
    loop {
        let now = audio.graph().current_time();
        if now >= duration {
            break;
        }
        session.advance(&mut audio, now)?;
        std::thread::sleep(Duration::from_millis(16));
    }

    system.finish()?;
    if let Some(recording) = recording {
        println!("Recorded to {}", recording.audio_path.display());
    }
    Ok(())
}
