//! Command-line argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::params::{ConfigError, RecordingConfig, Settings};
use crate::session::MIN_SESSION_SECS;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "neonrace")]
#[command(about = "Procedural tracks and reactive audio for a neon racer", long_about = None)]
#[command(version)]
pub struct Args {
    /// Settings file (TOML) overriding track and audio defaults
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a level layout and write it as JSON
    Track {
        /// Level number (0 and 1 share the beginner layout)
        #[arg(long, value_name = "N", default_value = "1")]
        level: u32,

        /// Seed for the random parts of the level
        #[arg(long, value_name = "SEED")]
        seed: Option<u64>,

        /// Output file (stdout when omitted)
        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Render a scripted race session to a WAV file
    Render {
        /// Session length (seconds)
        #[arg(long, value_name = "SECONDS", default_value = "20")]
        seconds: f32,

        /// Output WAV file
        #[arg(short, long, value_name = "FILE", default_value = "session.wav")]
        out: PathBuf,

        /// Seed for the impact noise
        #[arg(long, value_name = "SEED", default_value = "0")]
        seed: u64,
    },

    /// Play a scripted race session on the default output device
    #[cfg(feature = "live-audio")]
    Play {
        /// Session length (seconds)
        #[arg(long, value_name = "SECONDS", default_value = "20")]
        seconds: f32,

        /// Also record what is played to this WAV file
        #[arg(long, value_name = "FILE")]
        record: Option<PathBuf>,

        /// Seed for the impact noise
        #[arg(long, value_name = "SEED", default_value = "0")]
        seed: u64,
    },
}

impl Args {
    /// Load settings from `--config`, or defaults
    pub fn load_settings(&self) -> Result<Settings, ConfigError> {
        match &self.config {
            Some(path) => {
                println!("Settings: {}", path.display());
                Settings::load(path)
            }
            None => Ok(Settings::default()),
        }
    }
}

/// Create recording configuration, stretching sessions that are too short
pub fn create_recording_config(seconds: f32, out: PathBuf) -> RecordingConfig {
    if seconds < MIN_SESSION_SECS {
        eprintln!(
            "Warning: session needs at least {}s, recording {}s",
            MIN_SESSION_SECS, MIN_SESSION_SECS
        );
    }
    RecordingConfig::new(seconds.max(MIN_SESSION_SECS), out)
}
