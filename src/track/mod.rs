//! Procedural racetrack generation: centerline, obstacles and background buildings.

mod generator;
mod plan;
mod segment;

// Re-export public types
pub use generator::{LevelLayout, TrackGenerator};
pub use plan::{plan_for_level, TrackPlan};
pub use segment::Segment;

use serde::{Deserialize, Serialize};

/// A centerline sample in track space (x along the track, y screen-down)
pub type Point = glam::DVec2;

/// Serde adapter writing a point list as `[{"x": .., "y": ..}, ..]`
pub(crate) mod point_list {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::Point;

    #[derive(Serialize, Deserialize)]
    struct Xy {
        x: f64,
        y: f64,
    }

    pub fn serialize<S: Serializer>(points: &[Point], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(points.iter().map(|p| Xy { x: p.x, y: p.y }))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Point>, D::Error> {
        let points = Vec::<Xy>::deserialize(deserializer)?;
        Ok(points.into_iter().map(|p| Point::new(p.x, p.y)).collect())
    }
}

/// Obstacle variants
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObstacleKind {
    Barrier,
    Debris,
}

/// An obstacle sitting on the track at a centerline index
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Index into the track's point sequence
    pub path_index: usize,
    pub kind: ObstacleKind,
}

/// Parallax depth of a background building
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ParallaxLayer {
    Near,
    Far,
}

impl ParallaxLayer {
    /// Layer number used by the renderer (1 = near, 2 = far)
    pub fn depth(self) -> u8 {
        match self {
            Self::Near => 1,
            Self::Far => 2,
        }
    }
}

impl From<ParallaxLayer> for u8 {
    fn from(layer: ParallaxLayer) -> Self {
        layer.depth()
    }
}

impl TryFrom<u8> for ParallaxLayer {
    type Error = String;

    fn try_from(depth: u8) -> Result<Self, Self::Error> {
        match depth {
            1 => Ok(Self::Near),
            2 => Ok(Self::Far),
            other => Err(format!("Unknown parallax layer {}", other)),
        }
    }
}

/// Background decoration rectangle
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub x: f64,
    /// Ground line the building stands on
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub layer: ParallaxLayer,
}
