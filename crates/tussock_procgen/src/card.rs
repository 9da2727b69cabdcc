use glam::{Quat, Vec2, Vec3};
use noise::Perlin;
use rand::Rng;
use std::f32::consts::PI;

use crate::buffers::{GeometryBuffers, UV_JITTER};
use crate::path::noise3;

/// Recipe for flat hair cards
#[derive(Debug, Clone, PartialEq)]
pub struct CardRecipe {
    pub width: f32,
    pub subdivisions: u32,
    /// Randomize width and roll each card about its axis
    pub variation: bool,
    pub gravity: f32,
}

impl Default for CardRecipe {
    fn default() -> Self {
        Self {
            width: 0.02,
            subdivisions: 3,
            variation: true,
            gravity: 0.0,
        }
    }
}

/// Growth direction of a card: the surface normal pushed by gravity and noise
pub fn card_direction(
    start: Vec3,
    normal: Vec3,
    gravity: f32,
    noise_factor: f32,
    noise_scale: f32,
    perlin: &Perlin,
) -> Vec3 {
    let mut direction = normal;

    if gravity != 0.0 {
        direction += Vec3::new(0.0, 0.0, -gravity) * 0.5;
    }

    if noise_factor > 0.0 {
        let p = start * noise_scale;
        let offset = Vec3::new(
            noise3(perlin, p),
            noise3(perlin, p + Vec3::new(100.0, 0.0, 0.0)),
            noise3(perlin, p + Vec3::new(0.0, 100.0, 0.0)),
        );
        direction += offset * noise_factor;
    }

    direction.normalize_or_zero()
}

/// Width of one card, varied by up to ±30% when variation is on
pub fn card_width<R: Rng + ?Sized>(recipe: &CardRecipe, rng: &mut R) -> f32 {
    if recipe.variation {
        let width_factor = 1.0 + rng.gen_range(-0.3..=0.3);
        recipe.width * f32::max(0.3, width_factor)
    } else {
        recipe.width
    }
}

/// Emits a subdivided ribbon of `subdivisions + 1` cross-sections
///
/// The card narrows by 30% towards the tip and droops quadratically with
/// gravity. Each step between cross-sections becomes two triangles.
#[allow(clippy::too_many_arguments)]
pub fn emit_card<R: Rng + ?Sized>(
    buffers: &mut GeometryBuffers,
    start: Vec3,
    direction: Vec3,
    length: f32,
    width: f32,
    recipe: &CardRecipe,
    material_index: u32,
    source_uv: Option<Vec2>,
    rng: &mut R,
) {
    let base_index = buffers.vertex_offset();
    let forward = direction.normalize_or_zero();

    let reference = if forward.dot(Vec3::Z).abs() > 0.9 { Vec3::X } else { Vec3::Z };
    let mut right = forward.cross(reference).normalize_or_zero();

    if recipe.variation && forward != Vec3::ZERO {
        let angle = rng.gen_range(-PI * 0.2..=PI * 0.2);
        right = Quat::from_axis_angle(forward, angle) * right;
    }

    let subdivisions = recipe.subdivisions.max(1);

    for i in 0..=subdivisions {
        let t = i as f32 / subdivisions as f32;

        // 30% narrower at the tip
        let width_at_t = width * (1.0 - t * 0.3);

        let mut center = start + forward * (length * t);
        if t > 0.0 {
            let bend = t * t * recipe.gravity * 0.1;
            center += Vec3::new(0.0, 0.0, -bend);
        }

        let half = right * (width_at_t * 0.5);
        let (left_uv, right_uv) = match source_uv {
            Some(uv) => (card_uv(rng, uv, 0.0, t), card_uv(rng, uv, 1.0, t)),
            None => (Vec2::new(0.0, t), Vec2::new(1.0, t)),
        };

        buffers.push_vertex(center - half, left_uv);
        buffers.push_vertex(center + half, right_uv);
    }

    for i in 0..subdivisions {
        let curr_left = base_index + i * 2;
        let curr_right = curr_left + 1;
        let next_left = base_index + (i + 1) * 2;
        let next_right = next_left + 1;

        buffers.push_face([curr_left, curr_right, next_right], material_index);
        buffers.push_face([curr_left, next_right, next_left], material_index);
    }
}

fn card_uv<R: Rng + ?Sized>(rng: &mut R, source: Vec2, side: f32, t: f32) -> Vec2 {
    let offset_u = rng.gen_range(-UV_JITTER..=UV_JITTER);
    let offset_v = rng.gen_range(-UV_JITTER..=UV_JITTER);
    Vec2::new(
        (source.x + offset_u + side * 0.1).clamp(0.0, 1.0),
        (source.y + offset_v + t * 0.1).clamp(0.0, 1.0),
    )
}
