//! Parameter definitions with physical units and documented semantics.
//!
//! All magic numbers are extracted here with:
//! - Units (track units, seconds, Hz, linear gain)
//! - Documented ranges and meanings
//! - Type safety where possible

mod audio;
mod render;
mod settings;
mod track;

// Re-export all types
pub use audio::{audio_constants, AudioConfig, EngineTuning};
pub use render::RecordingConfig;
pub use settings::{ConfigError, Settings};
pub use track::{TrackConfig, CANVAS_HEIGHT, CANVAS_WIDTH};
