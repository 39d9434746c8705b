//! Recording configuration.

use std::path::PathBuf;

/// Offline recording configuration
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Duration to record (seconds)
    pub duration_secs: f32,

    /// Output WAV file
    pub audio_path: PathBuf,
}

impl RecordingConfig {
    pub fn new(duration_secs: f32, audio_path: impl Into<PathBuf>) -> Self {
        Self {
            duration_secs,
            audio_path: audio_path.into(),
        }
    }

    /// Total number of samples to capture at the given rate
    pub fn total_samples(&self, sample_rate_hz: u32) -> usize {
        (self.duration_secs.max(0.0) * sample_rate_hz as f32).ceil() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_samples() {
        let config = RecordingConfig::new(1.5, "out.wav");
        assert_eq!(config.total_samples(44100), 66150);

        let negative = RecordingConfig::new(-1.0, "out.wav");
        assert_eq!(negative.total_samples(44100), 0);
    }
}
