//! Track geometry and level-population parameters.

use serde::{Deserialize, Serialize};

/// Logical canvas width shared with the rendering layer (pixels)
pub const CANVAS_WIDTH: f64 = 1920.0;

/// Logical canvas height shared with the rendering layer (pixels)
pub const CANVAS_HEIGHT: f64 = 1080.0;

/// Track generation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackConfig {
    /// First point of every track (track units)
    pub origin: [f64; 2],

    /// Distance between consecutive centerline samples along x (track units)
    pub step: f64,

    /// Ground line for buildings (pixels, buildings hang upward from here)
    pub canvas_height: f64,

    /// First level that gets obstacles (earlier levels are tutorials)
    pub first_obstacle_level: u32,

    /// Obstacles start this many points into the track
    pub obstacle_lead_in: f64,

    /// No obstacles within this many points of the finish
    pub obstacle_run_out: f64,

    /// Upper bound of the random extra stride between obstacles (points)
    pub obstacle_jitter: f64,

    /// Probability that an obstacle is a barrier rather than debris
    pub barrier_chance: f64,

    /// Track length per building (one building per this many points)
    pub building_divisor: usize,

    /// Horizontal spacing between consecutive buildings (pixels)
    pub building_spacing: f64,

    /// Upper bound of the random horizontal offset of a building (pixels)
    pub building_jitter: f64,

    /// Building width range (pixels, half-open)
    pub building_width: (f64, f64),

    /// Building height range (pixels, half-open)
    pub building_height: (f64, f64),
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            origin: [0.0, CANVAS_HEIGHT / 2.0 + 200.0],
            step: 5.0, // 5px resolution
            canvas_height: CANVAS_HEIGHT,
            first_obstacle_level: 5,
            obstacle_lead_in: 1000.0,
            obstacle_run_out: 1500.0,
            obstacle_jitter: 500.0,
            barrier_chance: 0.4,
            building_divisor: 200,
            building_spacing: 1000.0,
            building_jitter: 500.0,
            building_width: (100.0, 300.0),
            building_height: (300.0, 900.0),
        }
    }
}

impl TrackConfig {
    /// Base stride between obstacles for a level (points)
    ///
    /// Higher levels get denser obstacle fields.
    pub fn obstacle_density(&self, level: u32) -> f64 {
        match level {
            0..=5 => 500.0,
            6 => 350.0,
            7 => 250.0,
            8 => 200.0,
            9 => 180.0,
            _ => 150.0,
        }
    }

    /// Validate configuration (positive step, sane ranges)
    pub fn validate(&self) -> Result<(), String> {
        if !(self.step > 0.0) {
            return Err(format!("Track step must be > 0, got {}", self.step));
        }
        if !(self.obstacle_jitter >= 0.0) || !self.obstacle_jitter.is_finite() {
            return Err(format!(
                "Obstacle jitter must be finite and >= 0, got {}",
                self.obstacle_jitter
            ));
        }
        if !self.obstacle_lead_in.is_finite() || !self.obstacle_run_out.is_finite() {
            return Err("Obstacle lead-in and run-out must be finite".to_string());
        }
        if self.building_divisor == 0 {
            return Err("Building divisor must be > 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.barrier_chance) {
            return Err(format!(
                "Barrier chance must be within [0, 1], got {}",
                self.barrier_chance
            ));
        }
        if self.building_width.0 > self.building_width.1
            || self.building_height.0 > self.building_height.1
        {
            return Err("Building size ranges must be ordered (min, max)".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_origin() {
        let config = TrackConfig::default();
        assert_eq!(config.origin, [0.0, 740.0]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_obstacle_density_steps_down() {
        let config = TrackConfig::default();

        assert_eq!(config.obstacle_density(5), 500.0);
        assert_eq!(config.obstacle_density(6), 350.0);
        assert_eq!(config.obstacle_density(9), 180.0);
        assert_eq!(config.obstacle_density(10), 150.0);
        assert_eq!(config.obstacle_density(42), 150.0);
    }

    #[test]
    fn test_rejects_negative_obstacle_jitter() {
        for jitter in [-1000.0, f64::NAN, f64::INFINITY] {
            let config = TrackConfig {
                obstacle_jitter: jitter,
                ..TrackConfig::default()
            };
            assert!(config.validate().is_err(), "jitter {}", jitter);
        }
    }

    #[test]
    fn test_rejects_unbounded_lead_in() {
        let config = TrackConfig {
            obstacle_lead_in: f64::NEG_INFINITY,
            ..TrackConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_step() {
        let config = TrackConfig {
            step: 0.0,
            ..TrackConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
