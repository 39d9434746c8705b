//! Per-level track plans as data.

use serde::{Deserialize, Serialize};

use super::Segment;

/// Ordered list of segments describing a whole track
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackPlan {
    pub segments: Vec<Segment>,
}

impl TrackPlan {
    /// Sum of all segment lengths (track units)
    pub fn total_length(&self) -> f64 {
        self.segments.iter().map(Segment::length).sum()
    }

    /// Number of points the plan produces at the given resolution
    pub fn point_count(&self, step: f64) -> usize {
        self.segments.iter().map(|s| s.steps(step)).sum()
    }

    /// True if generating this plan never consumes randomness
    pub fn is_deterministic(&self) -> bool {
        !self.segments.iter().any(Segment::is_random)
    }
}

const fn line(length: f64, angle_deg: f64) -> Segment {
    Segment::Line { length, angle_deg }
}

const fn sine(length: f64, amplitude: f64, frequency: f64) -> Segment {
    Segment::Sine {
        length,
        amplitude,
        frequency,
    }
}

const fn saw(length: f64, height: f64, width: f64) -> Segment {
    Segment::Sawtooth {
        length,
        height,
        width,
    }
}

const fn noise(length: f64, roughness: f64) -> Segment {
    Segment::Noise { length, roughness }
}

/// Start straight shared by every level
const PREFIX: [Segment; 1] = [line(800.0, 0.0)];

/// Long low-frequency swell added to the easy levels
const EASY_SWELL: Segment = sine(800.0, 300.0, 0.015);

/// Closing wiggle shared by every level
const SUFFIX: [Segment; 4] = [
    line(500.0, 0.0),
    line(300.0, -45.0),
    line(300.0, 0.0),
    line(300.0, 45.0),
];

const FINISH_STRAIGHT: Segment = line(1000.0, 0.0);

const DEFAULT_BODY: &[Segment] = &[line(400.0, -30.0), line(600.0, 45.0), sine(1200.0, 150.0, 0.01)];

const LEVEL_2: &[Segment] = &[
    line(400.0, -30.0),
    line(600.0, 45.0),
    line(500.0, -60.0),
    sine(1000.0, 200.0, 0.03),
    line(600.0, 70.0),
    line(1000.0, 0.0),
];

const LEVEL_3: &[Segment] = &[
    line(400.0, -30.0),
    line(600.0, 45.0),
    sine(1200.0, 50.0, 0.1),
    line(600.0, -75.0),
    line(700.0, 80.0),
    line(500.0, 0.0),
    sine(1000.0, 300.0, 0.02),
];

const LEVEL_4: &[Segment] = &[
    line(600.0, 45.0),
    saw(1000.0, 80.0, 100.0),
    line(800.0, 85.0),
    line(600.0, -10.0),
    sine(1500.0, 40.0, 0.2),
    line(800.0, -70.0),
    line(600.0, 0.0),
    sine(1200.0, 250.0, 0.03),
];

const LEVEL_5: &[Segment] = &[
    line(500.0, -30.0),
    saw(800.0, 60.0, 50.0),
    line(1000.0, 60.0),
    noise(1500.0, 15.0),
    line(400.0, -80.0),
    line(400.0, 80.0),
    sine(1200.0, 30.0, 0.2),
    line(800.0, -45.0),
];

const LEVEL_6: &[Segment] = &[
    line(1200.0, 75.0),
    noise(2500.0, 30.0),
    line(1000.0, -65.0),
    saw(2000.0, 120.0, 60.0),
    line(3000.0, 15.0),
    sine(1500.0, 180.0, 0.15),
    line(1500.0, 60.0),
    saw(1200.0, 60.0, 40.0),
    line(1000.0, -45.0),
];

const LEVEL_7: &[Segment] = &[
    line(1500.0, 80.0),
    noise(3000.0, 45.0),
    line(1000.0, -85.0),
    saw(2500.0, 150.0, 40.0),
    sine(2000.0, 200.0, 0.15),
    line(3500.0, 10.0),
    noise(2500.0, 60.0),
    line(1000.0, -50.0),
    line(1000.0, 50.0),
];

const LEVEL_8: &[Segment] = &[
    line(2000.0, 85.0),
    noise(4000.0, 80.0),
    saw(3000.0, 180.0, 30.0),
    line(1500.0, -80.0),
    sine(2500.0, 250.0, 0.2),
    noise(3000.0, 100.0),
    line(1000.0, 60.0),
    saw(2000.0, 100.0, 20.0),
    line(4000.0, 0.0),
    line(1000.0, -45.0),
];

const LEVEL_9: &[Segment] = &[
    line(2000.0, -55.0),
    saw(4000.0, 200.0, 40.0),
    line(1500.0, 85.0),
    noise(5000.0, 120.0),
    line(1000.0, 0.0),
    saw(3000.0, 150.0, 20.0),
    sine(2500.0, 300.0, 0.15),
    line(1500.0, -65.0),
    line(1000.0, 45.0),
];

const LEVEL_10: &[Segment] = &[
    line(1500.0, 10.0),
    line(3000.0, 88.0),
    noise(6000.0, 150.0),
    sine(4000.0, 400.0, 0.3),
    line(2000.0, -88.0),
    saw(3000.0, 200.0, 30.0),
    line(1000.0, 80.0),
    line(1000.0, -80.0),
    noise(4000.0, 200.0),
    line(2000.0, 0.0),
];

/// Endgame body for every level past 10
const ENDGAME: &[Segment] = &[
    line(2000.0, 15.0),
    noise(5000.0, 200.0),
    line(3000.0, -60.0),
    line(3000.0, 60.0),
    saw(4000.0, 250.0, 25.0),
    sine(2000.0, 300.0, 0.1),
    line(500.0, 0.0),
    sine(2000.0, 300.0, 0.1),
    line(2500.0, 89.0),
    noise(6000.0, 250.0),
    line(3000.0, -30.0),
];

fn body(level: u32) -> &'static [Segment] {
    match level {
        2 => LEVEL_2,
        3 => LEVEL_3,
        4 => LEVEL_4,
        5 => LEVEL_5,
        6 => LEVEL_6,
        7 => LEVEL_7,
        8 => LEVEL_8,
        9 => LEVEL_9,
        10 => LEVEL_10,
        11.. => ENDGAME,
        _ => DEFAULT_BODY,
    }
}

/// Closing sine modulation (amplitude, frequency) per level
fn finale(level: u32) -> (f64, f64) {
    match level {
        2 => (150.0, 0.04),
        3 => (180.0, 0.06),
        4 => (200.0, 0.08),
        5.. => (100.0, 0.1),
        _ => (100.0, 0.02),
    }
}

/// Build the full plan for a level
///
/// Unlisted levels (including 0) fall back to the level 1 layout.
pub fn plan_for_level(level: u32) -> TrackPlan {
    let mut segments = Vec::with_capacity(32);

    segments.extend_from_slice(&PREFIX);
    segments.extend_from_slice(body(level));

    if level < 4 {
        segments.push(EASY_SWELL);
    }

    segments.extend_from_slice(&SUFFIX);

    let (amplitude, frequency) = finale(level);
    segments.push(sine(1500.0, amplitude, frequency));
    segments.push(FINISH_STRAIGHT);

    TrackPlan { segments }
}
