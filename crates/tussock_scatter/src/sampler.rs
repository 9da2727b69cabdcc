use glam::{Mat4, Vec2, Vec3};
use noise::Perlin;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tussock_procgen::LoopTriangle;

use crate::error::ScatterError;
use crate::noise_util::mask_value;
use crate::sample::SurfaceSample;

/// How accepted positions are filtered after area-weighted selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionMode {
    Random,
    #[default]
    Even,
    /// Accept with probability equal to the interpolated vertex weight
    Density,
    /// Reject where the remapped noise falls below a threshold
    Noise,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SamplerRecipe {
    pub mode: DistributionMode,
    pub noise_scale: f32,
    pub noise_threshold: f32,
    pub slope_mask: bool,
    /// Radians from +Z
    pub slope_max_angle: f32,
    /// Draw budget as a multiple of the requested count
    pub attempt_factor: usize,
    pub transform: Mat4,
}

impl Default for SamplerRecipe {
    fn default() -> Self {
        Self {
            mode: DistributionMode::Even,
            noise_scale: 5.0,
            noise_threshold: 0.5,
            slope_mask: false,
            slope_max_angle: 60f32.to_radians(),
            attempt_factor: 10,
            transform: Mat4::IDENTITY,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SampleSet {
    pub samples: Vec<SurfaceSample>,
    pub requested: usize,
    pub attempts: usize,
}

impl SampleSet {
    pub fn is_complete(&self) -> bool {
        self.samples.len() >= self.requested
    }
}

/// Running sum of triangle areas, used for area-weighted selection
pub fn cumulative_areas(triangles: &[LoopTriangle]) -> Vec<f64> {
    let mut total = 0.0f64;
    triangles
        .iter()
        .map(|tri| {
            total += tri.area.max(0.0) as f64;
            total
        })
        .collect()
}

/// First triangle whose cumulative area reaches `draw`
pub fn pick_triangle(cumulative: &[f64], draw: f64) -> usize {
    cumulative
        .partition_point(|&c| c < draw)
        .min(cumulative.len().saturating_sub(1))
}

/// Angle in radians between a world normal and +Z
pub fn slope_angle(normal: Vec3) -> f32 {
    normal.dot(Vec3::Z).clamp(-1.0, 1.0).acos()
}

/// Area-weighted rejection sampling over a triangulated surface
///
/// Runs at most `count * attempt_factor` draws. A short result is not an
/// error; the caller compares `samples.len()` with `requested`.
/// Zero-area triangles are never selected. Normals go through the plain
/// linear part of `recipe.transform`, so they assume uniform scale.
pub fn sample_surface<R: Rng + ?Sized>(
    triangles: &[LoopTriangle],
    weights: Option<&[f32]>,
    count: usize,
    recipe: &SamplerRecipe,
    perlin: &Perlin,
    rng: &mut R,
) -> Result<SampleSet, ScatterError> {
    let surface: Vec<LoopTriangle> = triangles
        .iter()
        .filter(|t| t.area > 0.0)
        .copied()
        .collect();
    let cumulative = cumulative_areas(&surface);
    let total = cumulative.last().copied().unwrap_or(0.0);
    if total <= 0.0 {
        return Err(ScatterError::EmptySurface {
            triangles: triangles.len(),
        });
    }

    let max_attempts = count.saturating_mul(recipe.attempt_factor);
    let mut samples = Vec::with_capacity(count);
    let mut attempts = 0;

    while samples.len() < count && attempts < max_attempts {
        attempts += 1;

        let tri = &surface[pick_triangle(&cumulative, rng.gen_range(0.0..=total))];

        // Cheapest check first
        let world_normal = recipe.transform.transform_vector3(tri.normal).normalize_or_zero();
        if recipe.slope_mask && slope_angle(world_normal) > recipe.slope_max_angle {
            continue;
        }

        let mut r1: f32 = rng.gen();
        let mut r2: f32 = rng.gen();
        if r1 + r2 > 1.0 {
            r1 = 1.0 - r1;
            r2 = 1.0 - r2;
        }
        let r3 = 1.0 - r1 - r2;

        let [v0, v1, v2] = tri.positions;
        let local = v0 * r1 + v1 * r2 + v2 * r3;
        let position = recipe.transform.transform_point3(local);

        let accept = match recipe.mode {
            DistributionMode::Density => match weights {
                Some(weights) => {
                    let w = |v: u32| weights.get(v as usize).copied().unwrap_or(0.0);
                    let [a, b, c] = tri.vertices;
                    let weight = w(a) * r1 + w(b) * r2 + w(c) * r3;
                    rng.gen::<f32>() <= weight
                }
                None => true,
            },
            DistributionMode::Noise => {
                mask_value(perlin, position, recipe.noise_scale) >= recipe.noise_threshold
            }
            DistributionMode::Random | DistributionMode::Even => true,
        };
        if !accept {
            continue;
        }

        let uv = tri
            .uvs
            .map(|[a, b, c]: [Vec2; 3]| a * r1 + b * r2 + c * r3);

        samples.push(SurfaceSample {
            position,
            normal: world_normal,
            uv,
            face_index: Some(tri.polygon_index),
            is_child: false,
            parent_length: None,
        });
    }

    if samples.len() < count {
        log::info!(
            "Generated {}/{} points due to distribution constraints",
            samples.len(),
            count
        );
    }

    Ok(SampleSet {
        samples,
        requested: count,
        attempts,
    })
}
