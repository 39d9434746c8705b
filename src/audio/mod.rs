//! Reactive game audio over a Web-Audio-style node graph.
//!
//! The [`AudioManager`] drives any [`AudioGraph`]; [`SoftwareGraph`] renders
//! one in software, offline through [`WavRecorder`] or live through
//! `AudioSystem` (feature `live-audio`).

mod automation;
mod error;
mod graph;
mod manager;
mod recorder;
mod software;
mod state;
mod voice;
#[cfg(feature = "live-audio")]
mod system;

// Re-export public types
pub use error::AudioError;
pub use graph::{
    AudioGraph, Automation, BufferId, ContextState, FilterKind, NodeId, Param, Waveform,
};
pub use manager::AudioManager;
pub use recorder::WavRecorder;
pub use software::{SharedGraph, SoftwareGraph};
pub use state::{Ambience, GameState};
#[cfg(feature = "live-audio")]
pub use system::AudioSystem;
