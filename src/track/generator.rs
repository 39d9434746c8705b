//! Track, obstacle and building generation with an injected random source.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::plan::{plan_for_level, TrackPlan};
use super::{Building, Obstacle, ObstacleKind, ParallaxLayer, Point};
use crate::params::TrackConfig;

/// Everything the game needs to load one level
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelLayout {
    pub level: u32,
    #[serde(with = "super::point_list")]
    pub points: Vec<Point>,
    pub obstacles: Vec<Obstacle>,
    pub buildings: Vec<Building>,
}

/// Level geometry generator
///
/// Randomness only enters through noise segments, obstacle strides and
/// building placement; seed the generator for reproducible levels.
pub struct TrackGenerator<R = ChaCha8Rng> {
    config: TrackConfig,
    rng: R,
}

impl TrackGenerator<ChaCha8Rng> {
    /// Create a generator seeded from OS entropy
    pub fn new(config: TrackConfig) -> Self {
        Self::with_rng(config, ChaCha8Rng::from_entropy())
    }

    /// Create a reproducible generator
    pub fn with_seed(config: TrackConfig, seed: u64) -> Self {
        Self::with_rng(config, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> TrackGenerator<R> {
    pub fn with_rng(config: TrackConfig, rng: R) -> Self {
        Self { config, rng }
    }

    pub fn config(&self) -> &TrackConfig {
        &self.config
    }

    /// Generate the centerline for a level
    pub fn generate_track(&mut self, level: u32) -> Vec<Point> {
        let plan = plan_for_level(level);
        self.trace_plan(&plan)
    }

    /// Run any plan from the configured origin
    pub fn trace_plan(&mut self, plan: &TrackPlan) -> Vec<Point> {
        let step = self.config.step;
        let mut points = Vec::with_capacity(plan.point_count(step));
        let mut cursor = Point::from_array(self.config.origin);

        for segment in &plan.segments {
            cursor = segment.extend(&mut points, cursor, step, &mut self.rng);
        }

        points
    }

    /// Scatter background buildings along a track of `track_length` points
    pub fn generate_buildings(&mut self, track_length: usize) -> Vec<Building> {
        let config = &self.config;
        let count = track_length / config.building_divisor;
        let (min_w, max_w) = config.building_width;
        let (min_h, max_h) = config.building_height;

        (0..count)
            .map(|i| {
                let x = i as f64 * config.building_spacing
                    + self.rng.gen::<f64>() * config.building_jitter;
                let w = min_w + self.rng.gen::<f64>() * (max_w - min_w);
                let h = min_h + self.rng.gen::<f64>() * (max_h - min_h);
                let layer = if self.rng.gen::<f64>() > 0.5 {
                    ParallaxLayer::Near
                } else {
                    ParallaxLayer::Far
                };

                Building {
                    x,
                    y: config.canvas_height,
                    w,
                    h,
                    layer,
                }
            })
            .collect()
    }

    /// Place obstacles along a track of `track_length` points
    ///
    /// Tutorial levels get none; later levels get progressively denser fields.
    pub fn generate_obstacles(&mut self, level: u32, track_length: usize) -> Vec<Obstacle> {
        let config = &self.config;
        if level < config.first_obstacle_level {
            return Vec::new();
        }

        let density = config.obstacle_density(level);
        let end = track_length as f64 - config.obstacle_run_out;
        let mut obstacles = Vec::new();
        let mut cursor = config.obstacle_lead_in;

        while cursor < end {
            let kind = if self.rng.gen::<f64>() > 1.0 - config.barrier_chance {
                ObstacleKind::Barrier
            } else {
                ObstacleKind::Debris
            };

            obstacles.push(Obstacle {
                path_index: cursor.floor() as usize,
                kind,
            });

            // At least one point per stride so an unvalidated config still terminates
            let stride = density + self.rng.gen::<f64>() * config.obstacle_jitter;
            cursor += stride.max(1.0);
        }

        obstacles
    }

    /// Generate a complete level: centerline, then buildings, then obstacles
    pub fn generate_level(&mut self, level: u32) -> LevelLayout {
        let points = self.generate_track(level);
        let buildings = self.generate_buildings(points.len());
        let obstacles = self.generate_obstacles(level, points.len());

        tracing::debug!(
            level,
            points = points.len(),
            obstacles = obstacles.len(),
            buildings = buildings.len(),
            "generated level"
        );

        LevelLayout {
            level,
            points,
            obstacles,
            buildings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::Segment;

    fn seeded(seed: u64) -> TrackGenerator {
        TrackGenerator::with_seed(TrackConfig::default(), seed)
    }

    #[test]
    fn test_layout_points_serialize_as_objects() {
        let layout = seeded(3).generate_level(1);
        let value = serde_json::to_value(&layout).unwrap();
        assert_eq!(value["points"][0], serde_json::json!({"x": 0.0, "y": 740.0}));

        let back: LevelLayout = serde_json::from_value(value).unwrap();
        assert_eq!(back, layout);
    }

    #[test]
    fn test_track_starts_at_origin() {
        for level in [0, 1, 4, 7, 11] {
            let points = seeded(1).generate_track(level);
            assert_eq!(points[0], Point::new(0.0, 740.0), "level {}", level);
        }
    }

    #[test]
    fn test_point_count_matches_plan() {
        let config = TrackConfig::default();
        for level in 0..=12 {
            let points = seeded(3).generate_track(level);
            let expected = plan_for_level(level).point_count(config.step);
            assert_eq!(points.len(), expected, "level {}", level);
            assert!(!points.is_empty());
        }
    }

    #[test]
    fn test_early_levels_reproducible_without_seed() {
        for level in 1..=4 {
            let a = TrackGenerator::new(TrackConfig::default()).generate_track(level);
            let b = TrackGenerator::new(TrackConfig::default()).generate_track(level);
            assert_eq!(a, b, "level {}", level);
        }
    }

    #[test]
    fn test_noise_levels_reproducible_with_seed() {
        let a = seeded(99).generate_track(8);
        let b = seeded(99).generate_track(8);
        let c = seeded(100).generate_track(8);

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_segments_chain_from_last_point() {
        // Second segment starts where the first ended (duplicate joint point)
        let plan = TrackPlan {
            segments: vec![
                Segment::Line {
                    length: 20.0,
                    angle_deg: 0.0,
                },
                Segment::Line {
                    length: 20.0,
                    angle_deg: 0.0,
                },
            ],
        };
        let points = seeded(0).trace_plan(&plan);

        assert_eq!(points.len(), 8);
        assert_eq!(points[3], Point::new(15.0, 740.0));
        assert_eq!(points[4], points[3]);
        assert_eq!(points[7], Point::new(30.0, 740.0));
    }

    #[test]
    fn test_no_obstacles_on_tutorial_levels() {
        let mut generator = seeded(5);
        for level in 0..5 {
            assert!(generator.generate_obstacles(level, 10000).is_empty());
        }
    }

    #[test]
    fn test_obstacles_increasing_and_bounded() {
        let mut generator = seeded(11);
        let obstacles = generator.generate_obstacles(10, 10000);

        assert!(!obstacles.is_empty());
        assert_eq!(obstacles[0].path_index, 1000);
        for pair in obstacles.windows(2) {
            assert!(pair[0].path_index < pair[1].path_index);
        }
        for obstacle in &obstacles {
            assert!((1000..8500).contains(&obstacle.path_index));
            assert!(matches!(
                obstacle.kind,
                ObstacleKind::Barrier | ObstacleKind::Debris
            ));
        }
    }

    #[test]
    fn test_obstacle_stride_respects_density() {
        let mut generator = seeded(12);
        let obstacles = generator.generate_obstacles(5, 50000);

        for pair in obstacles.windows(2) {
            let stride = pair[1].path_index - pair[0].path_index;
            // floor() may shave up to one index off either end
            assert!((499..=1001).contains(&stride), "stride {}", stride);
        }
    }

    #[test]
    fn test_negative_jitter_still_terminates() {
        let config = TrackConfig {
            obstacle_jitter: -1000.0,
            ..TrackConfig::default()
        };
        let mut generator = TrackGenerator::with_seed(config, 31);
        let obstacles = generator.generate_obstacles(10, 10000);

        assert!(!obstacles.is_empty());
        assert!(obstacles.len() <= 7500);
        assert!(obstacles.iter().all(|o| (1000..8500).contains(&o.path_index)));
    }

    #[test]
    fn test_short_track_has_no_obstacles() {
        let mut generator = seeded(13);
        assert!(generator.generate_obstacles(10, 2500).is_empty());
        assert!(generator.generate_obstacles(10, 0).is_empty());
    }

    #[test]
    fn test_barrier_share_roughly_forty_percent() {
        let mut generator = seeded(21);
        let obstacles = generator.generate_obstacles(10, 2_000_000);
        let barriers = obstacles
            .iter()
            .filter(|o| o.kind == ObstacleKind::Barrier)
            .count();
        let share = barriers as f64 / obstacles.len() as f64;

        assert!((0.35..0.45).contains(&share), "share {}", share);
    }

    #[test]
    fn test_building_count_and_ranges() {
        let mut generator = seeded(17);
        let buildings = generator.generate_buildings(20000);

        assert_eq!(buildings.len(), 100);
        for (i, building) in buildings.iter().enumerate() {
            let base = i as f64 * 1000.0;
            assert!(building.x >= base && building.x < base + 500.0);
            assert_eq!(building.y, 1080.0);
            assert!((100.0..300.0).contains(&building.w));
            assert!((300.0..900.0).contains(&building.h));
        }
        assert!(buildings.iter().any(|b| b.layer == ParallaxLayer::Near));
        assert!(buildings.iter().any(|b| b.layer == ParallaxLayer::Far));
    }

    #[test]
    fn test_building_count_floors() {
        let mut generator = seeded(18);
        assert_eq!(generator.generate_buildings(199).len(), 0);
        assert_eq!(generator.generate_buildings(399).len(), 1);
    }

    #[test]
    fn test_generate_level_bundle() {
        let layout = seeded(23).generate_level(6);

        assert_eq!(layout.level, 6);
        assert_eq!(layout.buildings.len(), layout.points.len() / 200);
        let limit = layout.points.len() - 1500;
        assert!(layout.obstacles.iter().all(|o| o.path_index < limit));
        assert_eq!(layout, seeded(23).generate_level(6));
    }
}
