//! Audio engine configuration and constants.

use serde::{Deserialize, Serialize};

/// Engine voice tuning for one kind of racer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineTuning {
    /// Oscillator frequency when the voice is created (Hz)
    pub idle_hz: f32,

    /// Oscillator frequency at speed ratio 0 (Hz)
    pub base_hz: f32,

    /// Oscillator frequency at speed ratio 1 (Hz)
    pub top_hz: f32,

    /// Gain at speed ratio 0 (linear)
    pub base_volume: f32,

    /// Extra gain per unit of speed ratio (linear)
    pub volume_per_ratio: f32,
}

impl EngineTuning {
    /// Oscillator frequency for a (clamped) speed ratio
    pub fn frequency(&self, ratio: f32) -> f32 {
        self.base_hz + ratio * (self.top_hz - self.base_hz)
    }

    /// Unscaled gain for a (clamped) speed ratio
    pub fn volume(&self, ratio: f32) -> f32 {
        self.base_volume + ratio * self.volume_per_ratio
    }
}

/// Audio manager and software graph configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Software graph sample rate (Hz)
    pub sample_rate_hz: u32,

    /// Master gain when unmuted (linear)
    pub master_volume: f32,

    /// Mute/unmute fade length (seconds)
    pub volume_ramp_s: f64,

    /// Percussion beat period (seconds)
    pub beat_period_s: f64,

    /// Smoothing time constant for engine telemetry (seconds)
    pub engine_time_constant_s: f64,

    /// Speed ratios are clamped to [0, this]
    pub max_speed_ratio: f32,

    /// Engine filter cutoff range over the speed ratio (Hz)
    pub engine_filter_hz: (f32, f32),

    /// Player engine voice
    pub player_engine: EngineTuning,

    /// Rival engine voice (volume additionally scaled by the caller)
    pub rival_engine: EngineTuning,

    /// Length of the impact noise burst (seconds)
    pub impact_duration_s: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 44100,
            master_volume: 0.25,
            volume_ramp_s: 0.2,
            beat_period_s: 0.5,
            engine_time_constant_s: 0.1,
            max_speed_ratio: 1.2,
            engine_filter_hz: (150.0, 2500.0),
            player_engine: EngineTuning {
                idle_hz: 50.0,
                base_hz: 50.0,
                top_hz: 300.0,
                base_volume: 0.15,
                volume_per_ratio: 0.05,
            },
            rival_engine: EngineTuning {
                idle_hz: 60.0,
                base_hz: 70.0,
                top_hz: 400.0,
                base_volume: 0.05,
                volume_per_ratio: 0.02,
            },
            impact_duration_s: 0.5,
        }
    }
}

impl AudioConfig {
    /// Tuning for a player or rival voice
    pub fn engine(&self, is_player: bool) -> &EngineTuning {
        if is_player {
            &self.player_engine
        } else {
            &self.rival_engine
        }
    }

    /// Engine filter cutoff for a (clamped) speed ratio
    pub fn engine_filter(&self, ratio: f32) -> f32 {
        let (min, max) = self.engine_filter_hz;
        min + ratio * (max - min)
    }

    /// Validate configuration (sample rate, periods and ranges)
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate_hz == 0 {
            return Err("Sample rate must be > 0".to_string());
        }
        if !(self.beat_period_s > 0.0) {
            return Err(format!(
                "Beat period must be > 0, got {}",
                self.beat_period_s
            ));
        }
        if !(self.max_speed_ratio >= 0.0) || !self.max_speed_ratio.is_finite() {
            return Err(format!(
                "Max speed ratio must be finite and >= 0, got {}",
                self.max_speed_ratio
            ));
        }
        if !(self.engine_time_constant_s > 0.0) {
            return Err("Engine time constant must be > 0".to_string());
        }
        if !(self.impact_duration_s > 0.0) {
            return Err("Impact duration must be > 0".to_string());
        }
        Ok(())
    }
}

/// Audio constants (compile-time, match the software graph setup)
pub mod audio_constants {
    /// Audio block size (samples per render call)
    /// 128 = 2.9ms @ 44.1kHz
    pub const BLOCK_SIZE: usize = 128;
}
