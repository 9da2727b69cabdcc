use glam::{Vec2, Vec3};
use rand::Rng;
use std::f32::consts::TAU;

use crate::buffers::{jitter_uv, GeometryBuffers};
use crate::path::StrandPath;

/// Sweeps a ring of `sides` vertices along the strand path
///
/// Produces `(segments + 1) * sides` vertices and `2 * segments * sides`
/// triangles. Paths with fewer than two points emit nothing.
pub fn emit_tube<R: Rng + ?Sized>(
    buffers: &mut GeometryBuffers,
    path: &StrandPath,
    sides: u32,
    material_index: u32,
    source_uv: Option<Vec2>,
    rng: &mut R,
) {
    let points = &path.points;
    if points.len() < 2 || sides == 0 {
        return;
    }

    let base_index = buffers.vertex_offset();
    let sides_usize = sides as usize;

    let mut right = Vec3::ZERO;
    let mut up;

    for (i, (&point, &radius)) in points.iter().zip(&path.radii).enumerate() {
        if i == 0 {
            let forward = (points[1] - points[0]).normalize_or_zero();

            // Pick a reference that cannot be parallel to the strand
            let reference = if forward.z.abs() < 0.9 { Vec3::Z } else { Vec3::X };
            right = forward.cross(reference).normalize_or_zero();
            up = right.cross(forward).normalize_or_zero();
        } else {
            let forward = if i < points.len() - 1 {
                (points[i + 1] - points[i - 1]).normalize_or_zero()
            } else {
                (points[i] - points[i - 1]).normalize_or_zero()
            };

            // Carry the previous frame forward and re-orthogonalize
            up = right.cross(forward).normalize_or_zero();
            right = forward.cross(up).normalize_or_zero();
        }

        for j in 0..sides_usize {
            let angle = j as f32 / sides as f32 * TAU;
            let offset = (right * angle.cos() + up * angle.sin()) * radius;

            let uv = match source_uv {
                Some(uv) => jitter_uv(rng, uv),
                None => Vec2::ZERO,
            };
            buffers.push_vertex(point + offset, uv);
        }
    }

    let segments = points.len() - 1;
    for i in 0..segments {
        for j in 0..sides_usize {
            let j_next = (j + 1) % sides_usize;

            let v1 = base_index + (i * sides_usize + j) as u32;
            let v2 = base_index + (i * sides_usize + j_next) as u32;
            let v3 = base_index + ((i + 1) * sides_usize + j_next) as u32;
            let v4 = base_index + ((i + 1) * sides_usize + j) as u32;

            // Two triangles per side quad
            buffers.push_face([v1, v2, v3], material_index);
            buffers.push_face([v1, v3, v4], material_index);
        }
    }
}
