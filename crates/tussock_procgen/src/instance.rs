use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
use rand::Rng;
use std::f32::consts::TAU;

use crate::buffers::{jitter_uv, symmetric, GeometryBuffers};
use crate::mesh::MeshData;

/// Placement rules for copying a source object onto every strand root
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceRecipe {
    pub scale: f32,
    pub scale_random: f32,
    /// Fraction of a full turn about the surface normal
    pub rotation_random: f32,
    pub align_to_normal: bool,
    pub use_instance_materials: bool,
}

impl Default for InstanceRecipe {
    fn default() -> Self {
        Self {
            scale: 1.0,
            scale_random: 0.3,
            rotation_random: 1.0,
            align_to_normal: true,
            use_instance_materials: true,
        }
    }
}

/// Rotation taking local +Z onto `normal`, columns (right, forward, up)
pub fn align_to_normal(normal: Vec3) -> Mat4 {
    let up = normal;
    let reference = if up.z.abs() < 0.9 { Vec3::Z } else { Vec3::X };

    let right = up.cross(reference).normalize_or_zero();
    let forward = right.cross(up).normalize_or_zero();

    Mat4::from_cols(
        right.extend(0.0),
        forward.extend(0.0),
        up.extend(0.0),
        Vec4::W,
    )
}

/// World transform of one instance: translation, then rotation, then uniform scale
pub fn instance_transform<R: Rng + ?Sized>(
    position: Vec3,
    normal: Vec3,
    child_length: Option<f32>,
    recipe: &InstanceRecipe,
    rng: &mut R,
) -> Mat4 {
    let mut scale = recipe.scale;
    if let Some(factor) = child_length {
        scale *= factor;
    }
    if recipe.scale_random > 0.0 {
        scale *= 1.0 + symmetric(rng, recipe.scale_random);
    }

    let mut rotation = if recipe.align_to_normal {
        align_to_normal(normal)
    } else {
        Mat4::IDENTITY
    };

    if recipe.rotation_random > 0.0 {
        let angle = rng.gen_range(0.0..=recipe.rotation_random * TAU);
        let axis = normal.normalize_or_zero();
        if axis != Vec3::ZERO {
            rotation = Mat4::from_quat(Quat::from_axis_angle(axis, angle)) * rotation;
        }
    }

    Mat4::from_translation(position) * rotation * Mat4::from_scale(Vec3::splat(scale))
}

/// Copies every vertex and polygon of `instance` into the buffers
///
/// Polygons are fan-triangulated. With instance materials the face keeps
/// its own material index shifted past the emitter's materials and, when the
/// instance has UVs, its per-loop UVs overwrite the vertex UVs.
#[allow(clippy::too_many_arguments)]
pub fn emit_instance<R: Rng + ?Sized>(
    buffers: &mut GeometryBuffers,
    instance: &MeshData,
    transform: Mat4,
    material_index: u32,
    source_uv: Option<Vec2>,
    use_instance_materials: bool,
    emitter_material_count: u32,
    rng: &mut R,
) {
    let vertex_offset = buffers.vertex_offset();
    let instance_uvs = use_instance_materials && instance.has_uv_layer();

    for position in &instance.positions {
        let uv = if instance_uvs {
            Vec2::ZERO
        } else if let Some(uv) = source_uv {
            jitter_uv(rng, uv)
        } else {
            Vec2::ZERO
        };
        buffers.push_vertex(transform.transform_point3(*position), uv);
    }

    for polygon in instance.polygons() {
        let face_material = if use_instance_materials {
            polygon.material_index + emitter_material_count
        } else {
            material_index
        };

        let corners = &polygon.vertices;
        if corners.len() < 3 {
            continue;
        }
        for k in 1..corners.len() - 1 {
            buffers.push_face(
                [
                    vertex_offset + corners[0],
                    vertex_offset + corners[k],
                    vertex_offset + corners[k + 1],
                ],
                face_material,
            );
        }

        if instance_uvs {
            if let Some(loop_uvs) = &polygon.uvs {
                for (vertex, uv) in corners.iter().zip(loop_uvs) {
                    let slot = (vertex_offset + vertex) as usize;
                    if let Some(target) = buffers.uv_coords.get_mut(slot) {
                        *target = *uv;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn quad_instance() -> MeshData {
        let mut mesh = MeshData::new("Leaf");
        mesh.add_vertex(Vec3::new(-0.5, 0.0, 0.0));
        mesh.add_vertex(Vec3::new(0.5, 0.0, 0.0));
        mesh.add_vertex(Vec3::new(0.5, 0.0, 1.0));
        mesh.add_vertex(Vec3::new(-0.5, 0.0, 1.0));
        let uvs = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        mesh.ensure_uv_layer();
        mesh.add_polygon(&[0, 1, 2, 3], 1, Some(&uvs)).unwrap();
        mesh
    }

    #[test]
    fn test_align_maps_z_to_normal() {
        let normal = Vec3::new(1.0, 0.0, 0.0);
        let rotation = align_to_normal(normal);
        let mapped = rotation.transform_vector3(Vec3::Z);
        assert!((mapped - normal).length() < 1e-6);

        let flat = align_to_normal(Vec3::Z);
        assert!((flat.transform_vector3(Vec3::Z) - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_transform_order() {
        let recipe = InstanceRecipe {
            scale: 2.0,
            scale_random: 0.0,
            rotation_random: 0.0,
            align_to_normal: false,
            use_instance_materials: false,
        };
        let mut rng = StdRng::seed_from_u64(0);
        let position = Vec3::new(1.0, 2.0, 3.0);
        let transform = instance_transform(position, Vec3::Z, Some(0.5), &recipe, &mut rng);

        // scale 2 * child length 0.5, then translate
        let p = transform.transform_point3(Vec3::new(1.0, 0.0, 0.0));
        assert!((p - Vec3::new(2.0, 2.0, 3.0)).length() < 1e-6);
    }

    #[test]
    fn test_instance_quad_split_and_materials() {
        let instance = quad_instance();
        let mut rng = StdRng::seed_from_u64(3);
        let mut buffers = GeometryBuffers::new();
        buffers.push_vertex(Vec3::ZERO, Vec2::ZERO);

        emit_instance(&mut buffers, &instance, Mat4::IDENTITY, 7, Some(Vec2::splat(0.5)), true, 2, &mut rng);

        assert_eq!(buffers.vertices.len(), 5);
        assert_eq!(buffers.faces, vec![[1, 2, 3], [1, 3, 4]]);
        assert_eq!(buffers.material_indices, vec![3, 3]);
        // per-loop UVs from the instance win over the emitter UV
        assert_eq!(buffers.uv_coords[3], Vec2::new(1.0, 1.0));
        assert!(buffers.is_consistent());
    }

    #[test]
    fn test_instance_inherits_emitter_material() {
        let instance = quad_instance();
        let mut rng = StdRng::seed_from_u64(3);
        let mut buffers = GeometryBuffers::new();

        emit_instance(&mut buffers, &instance, Mat4::IDENTITY, 7, Some(Vec2::splat(0.5)), false, 2, &mut rng);

        assert_eq!(buffers.material_indices, vec![7, 7]);
        for uv in &buffers.uv_coords {
            assert!((*uv - Vec2::splat(0.5)).abs().max_element() <= 0.01 + 1e-6);
        }
    }
}
