//! Track path primitives.
//!
//! Every primitive samples the path at a fixed x-resolution (`step`), appending
//! `floor(length / step)` points starting at the cursor, and hands back the
//! last appended point as the new cursor.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::Point;

/// One piece of a track plan
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Segment {
    /// Straight ray at `angle_deg` (positive angles point down the screen)
    Line { length: f64, angle_deg: f64 },

    /// Smooth hills: `y = cursor.y + amplitude * sin(frequency * px)`
    Sine {
        length: f64,
        amplitude: f64,
        frequency: f64,
    },

    /// Jagged repeated bumps with period `width`
    Sawtooth { length: f64, height: f64, width: f64 },

    /// Random cumulative jitter drifting down then back up
    Noise { length: f64, roughness: f64 },
}

impl Segment {
    pub fn length(&self) -> f64 {
        match *self {
            Segment::Line { length, .. }
            | Segment::Sine { length, .. }
            | Segment::Sawtooth { length, .. }
            | Segment::Noise { length, .. } => length,
        }
    }

    /// Number of points this segment appends at the given resolution
    pub fn steps(&self, step: f64) -> usize {
        let steps = (self.length() / step).floor();
        if steps.is_finite() && steps > 0.0 {
            steps as usize
        } else {
            0
        }
    }

    /// Whether the segment consumes randomness
    pub fn is_random(&self) -> bool {
        matches!(self, Segment::Noise { .. })
    }

    /// Append this segment's points and return the new cursor
    pub fn extend<R: Rng + ?Sized>(
        &self,
        points: &mut Vec<Point>,
        cursor: Point,
        step: f64,
        rng: &mut R,
    ) -> Point {
        let steps = self.steps(step);
        points.reserve(steps);

        match *self {
            Segment::Line { angle_deg, .. } => {
                let direction = Point::from_angle(angle_deg.to_radians());
                for i in 0..steps {
                    let px = i as f64 * step;
                    points.push(cursor + direction * px);
                }
            }
            Segment::Sine {
                amplitude,
                frequency,
                ..
            } => {
                for i in 0..steps {
                    let px = i as f64 * step;
                    points.push(Point::new(
                        cursor.x + px,
                        cursor.y + (px * frequency).sin() * amplitude,
                    ));
                }
            }
            Segment::Sawtooth { height, width, .. } => {
                let rise = height / (width / 10.0);
                let mut y = cursor.y;
                let mut direction = -1.0; // -1 up, 1 down

                for i in 0..steps {
                    let px = i as f64 * step;
                    let cycle = px % width;

                    if cycle < step {
                        direction = -1.0;
                    } else if cycle > width / 2.0 {
                        direction = 1.0;
                    }

                    y += direction * rise;
                    points.push(Point::new(cursor.x + px, y));
                }
            }
            Segment::Noise { roughness, .. } => {
                let half = steps as f64 * 0.5;
                let mut y = cursor.y;

                for i in 0..steps {
                    let px = i as f64 * step;
                    y += (rng.gen::<f64>() - 0.5) * roughness;

                    // Drift down for the first half, back up for the second
                    if (i as f64) < half {
                        y += 0.5;
                    } else {
                        y -= 0.5;
                    }

                    points.push(Point::new(cursor.x + px, y));
                }
            }
        }

        if steps == 0 {
            cursor
        } else {
            points.last().copied().unwrap_or(cursor)
        }
    }
}
