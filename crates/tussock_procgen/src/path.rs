use glam::Vec3;
use noise::{NoiseFn, Perlin};
use rand::Rng;
use std::f32::consts::TAU;

use crate::buffers::symmetric;

/// Radius multiplier applied to child strands
pub const CHILD_RADIUS_FACTOR: f32 = 0.7;

/// Direction shaping applied along every strand
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthRecipe {
    pub segments: u32,
    pub normal_factor: f32,
    pub gravity: f32,
    pub noise_factor: f32,
    pub noise_scale: f32,
    pub wave_frequency: f32,
    pub wave_amplitude: f32,
    pub kink_frequency: f32,
    pub kink_amplitude: f32,
}

impl Default for GrowthRecipe {
    fn default() -> Self {
        Self {
            segments: 6,
            normal_factor: 1.0,
            gravity: 0.0,
            noise_factor: 0.1,
            noise_scale: 1.0,
            wave_frequency: 0.0,
            wave_amplitude: 0.0,
            kink_frequency: 0.0,
            kink_amplitude: 0.0,
        }
    }
}

/// Root and tip thickness of tube strands
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusProfile {
    pub root_radius: f32,
    pub tip_radius: f32,
    pub radius_random: f32,
}

impl Default for RadiusProfile {
    fn default() -> Self {
        Self {
            root_radius: 0.005,
            tip_radius: 0.001,
            radius_random: 0.2,
        }
    }
}

/// Centerline of one strand and the tube radius at each point
#[derive(Debug, Clone, PartialEq)]
pub struct StrandPath {
    pub points: Vec<Vec3>,
    pub radii: Vec<f32>,
}

impl StrandPath {
    pub fn segment_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }
}

/// Samples 3D coherent noise at `p`, roughly in [-1, 1]
pub fn noise3(perlin: &Perlin, p: Vec3) -> f32 {
    perlin.get([p.x as f64, p.y as f64, p.z as f64]) as f32
}

/// Computes the `segments + 1` centerline points of a strand
///
/// Every point is placed along its own direction from `start`, so the
/// deformation terms bend the strand progressively towards the tip.
pub fn generate_strand_path(
    start: Vec3,
    normal: Vec3,
    length: f32,
    recipe: &GrowthRecipe,
    perlin: &Perlin,
) -> Vec<Vec3> {
    let segments = recipe.segments.max(1);
    let noise_origin = start * recipe.noise_scale;
    let mut points = Vec::with_capacity(segments as usize + 1);

    for i in 0..=segments {
        let t = i as f32 / segments as f32;

        let mut direction = normal * recipe.normal_factor;

        if recipe.gravity != 0.0 {
            direction += Vec3::new(0.0, 0.0, -recipe.gravity) * t;
        }

        if recipe.noise_factor > 0.0 {
            // Offset each axis so the three channels do not move together
            let offset = Vec3::new(
                noise3(perlin, noise_origin + Vec3::new(0.0, 0.0, t * 10.0)),
                noise3(perlin, noise_origin + Vec3::new(0.0, t * 10.0, 0.0)),
                noise3(perlin, noise_origin + Vec3::new(t * 10.0, 0.0, 0.0)),
            );
            direction += offset * recipe.noise_factor * t;
        }

        if recipe.wave_frequency > 0.0 && recipe.wave_amplitude > 0.0 {
            let wave = (t * recipe.wave_frequency * TAU).sin() * recipe.wave_amplitude;
            direction += Vec3::X * wave;
        }

        if recipe.kink_frequency > 0.0 && recipe.kink_amplitude > 0.0 {
            let kink = (t * recipe.kink_frequency * TAU).sin() * recipe.kink_amplitude;
            direction += Vec3::Y * kink;
        }

        let direction = direction.normalize_or_zero();
        points.push(start + direction * length * t);
    }

    points
}

/// Linear root-to-tip radii for `point_count` points
///
/// Children are thinner by [`CHILD_RADIUS_FACTOR`]; one random factor scales
/// both ends so the profile keeps its direction.
pub fn strand_radii<R: Rng + ?Sized>(
    point_count: usize,
    profile: &RadiusProfile,
    is_child: bool,
    rng: &mut R,
) -> Vec<f32> {
    let child_factor = if is_child { CHILD_RADIUS_FACTOR } else { 1.0 };
    let radius_mult = 1.0 + symmetric(rng, profile.radius_random);
    let root = profile.root_radius * child_factor * radius_mult;
    let tip = profile.tip_radius * child_factor * radius_mult;

    if point_count == 1 {
        return vec![root];
    }

    (0..point_count)
        .map(|i| {
            let t = i as f32 / (point_count - 1) as f32;
            root * (1.0 - t) + tip * t
        })
        .collect()
}

/// Builds path and radii together
pub fn generate_strand<R: Rng + ?Sized>(
    start: Vec3,
    normal: Vec3,
    length: f32,
    recipe: &GrowthRecipe,
    profile: &RadiusProfile,
    is_child: bool,
    perlin: &Perlin,
    rng: &mut R,
) -> StrandPath {
    let points = generate_strand_path(start, normal, length, recipe, perlin);
    let radii = strand_radii(points.len(), profile, is_child, rng);
    StrandPath { points, radii }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn straight() -> GrowthRecipe {
        GrowthRecipe {
            noise_factor: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_straight_path_follows_normal() {
        let perlin = Perlin::new(1);
        let points = generate_strand_path(Vec3::ZERO, Vec3::Z, 2.0, &straight(), &perlin);

        assert_eq!(points.len(), 7);
        assert_eq!(points[0], Vec3::ZERO);
        assert!((points[6] - Vec3::new(0.0, 0.0, 2.0)).length() < 1e-5);
        assert!((points[3] - Vec3::new(0.0, 0.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn test_gravity_bends_down() {
        let perlin = Perlin::new(1);
        let recipe = GrowthRecipe {
            gravity: 1.0,
            ..straight()
        };
        let points = generate_strand_path(Vec3::ZERO, Vec3::X, 1.0, &recipe, &perlin);

        // Tip direction is normalize((1, 0, -1))
        let tip = points.last().unwrap();
        assert!((tip.x - tip.z.abs()).abs() < 1e-5);
        assert!(tip.z < 0.0);
        // Lengths stay within the strand length
        assert!(points.iter().all(|p| p.length() <= 1.0 + 1e-5));
    }

    #[test]
    fn test_wave_and_kink_offsets() {
        let perlin = Perlin::new(1);
        let recipe = GrowthRecipe {
            segments: 4,
            wave_frequency: 1.0,
            wave_amplitude: 0.5,
            kink_frequency: 1.0,
            kink_amplitude: 0.5,
            ..straight()
        };
        let points = generate_strand_path(Vec3::ZERO, Vec3::Z, 1.0, &recipe, &perlin);

        // At t = 0.25 both sines peak
        assert!(points[1].x > 0.0 && points[1].y > 0.0);
        // At t = 0.75 both sines are negative
        assert!(points[3].x < 0.0 && points[3].y < 0.0);
    }

    #[test]
    fn test_zero_direction_collapses_to_root() {
        let perlin = Perlin::new(1);
        let recipe = GrowthRecipe {
            normal_factor: 0.0,
            ..straight()
        };
        let points = generate_strand_path(Vec3::ONE, Vec3::Z, 1.0, &recipe, &perlin);
        assert!(points.iter().all(|&p| p == Vec3::ONE));
    }

    #[test]
    fn test_radius_monotonic() {
        let profile = RadiusProfile {
            root_radius: 0.005,
            tip_radius: 0.001,
            radius_random: 0.0,
        };
        let mut rng = StdRng::seed_from_u64(3);
        let radii = strand_radii(7, &profile, false, &mut rng);

        assert_eq!(radii.len(), 7);
        assert!((radii[0] - 0.005).abs() < 1e-7);
        assert!((radii[6] - 0.001).abs() < 1e-7);
        assert!(radii.windows(2).all(|w| w[1] <= w[0]));
    }

    #[test]
    fn test_child_radius_and_shared_randomization() {
        let profile = RadiusProfile {
            root_radius: 0.01,
            tip_radius: 0.005,
            radius_random: 0.5,
        };
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..100 {
            let radii = strand_radii(3, &profile, true, &mut rng);
            // Both ends share one multiplier, so the ratio is preserved
            assert!((radii[0] / radii[2] - 2.0).abs() < 1e-4);
            assert!(radii[0] <= 0.01 * CHILD_RADIUS_FACTOR * 1.5 + 1e-6);
        }
    }
}
