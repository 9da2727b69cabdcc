use tussock_procgen::{BlendMode, Material, MeshData};

pub const CARD_MATERIAL: &str = "HairCard_Material";
pub const CARD_TEXTURED_MATERIAL: &str = "HairCard_Textured";

/// Brings an instance's materials into the generated mesh
///
/// Instance faces were emitted with indices shifted past the
/// `emitter_materials` the mesh started with. When the emitter's faces are
/// kept the instance materials are appended so those indices line up;
/// otherwise they replace the list and the shifted indices move back down.
pub fn merge_instance_materials(
    mesh: &mut MeshData,
    instance_materials: &[Material],
    emitter_materials: u32,
    keep_emitter_geometry: bool,
) {
    if instance_materials.is_empty() {
        return;
    }

    if keep_emitter_geometry {
        mesh.append_materials(instance_materials.iter().cloned());
        log::info!(
            "Added {} instance materials (preserving {} emitter materials)",
            instance_materials.len(),
            emitter_materials
        );
        return;
    }

    mesh.materials.clear();
    mesh.append_materials(instance_materials.iter().cloned());
    for index in 0..mesh.face_count() {
        let current = mesh.polygons()[index].material_index;
        if current >= emitter_materials {
            mesh.set_material_index(index, current - emitter_materials);
        }
    }
    log::info!(
        "Replaced materials with {} instance materials",
        instance_materials.len()
    );
}

/// Semi-transparent material for hair cards, textured when an image is given
pub fn card_material(hair_color: [f32; 4], texture: Option<&str>) -> Material {
    match texture {
        None => Material {
            name: CARD_MATERIAL.to_string(),
            base_color: hair_color,
            alpha: 0.8,
            blend: BlendMode::AlphaBlend,
            texture: None,
        },
        Some(path) => Material {
            name: CARD_TEXTURED_MATERIAL.to_string(),
            base_color: [1.0, 1.0, 1.0, 1.0],
            alpha: 1.0,
            blend: BlendMode::AlphaBlend,
            texture: Some(path.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn mesh_with_faces(indices: &[u32]) -> MeshData {
        let mut mesh = MeshData::new("HairMesh_Preview");
        mesh.append_materials([Material::new("Ground"), Material::new("Moss")]);
        for (i, &material) in indices.iter().enumerate() {
            let x = i as f32 * 2.0;
            let a = mesh.add_vertex(Vec3::new(x, 0.0, 0.0));
            let b = mesh.add_vertex(Vec3::new(x + 1.0, 0.0, 0.0));
            let c = mesh.add_vertex(Vec3::new(x, 1.0, 0.0));
            mesh.add_polygon(&[a, b, c], material, None).unwrap();
        }
        mesh
    }

    #[test]
    fn test_merge_appends_when_keeping_emitter() {
        let mut mesh = mesh_with_faces(&[0, 1, 2, 3]);
        let instance = [Material::new("Leaf"), Material::new("Stem")];
        merge_instance_materials(&mut mesh, &instance, 2, true);

        let names: Vec<&str> = mesh.materials.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["Ground", "Moss", "Leaf", "Stem"]);
        let indices: Vec<u32> = mesh.polygons().iter().map(|p| p.material_index).collect();
        assert_eq!(indices, [0, 1, 2, 3]);
    }

    #[test]
    fn test_merge_replaces_and_shifts() {
        let mut mesh = mesh_with_faces(&[2, 3, 2]);
        let instance = [Material::new("Leaf"), Material::new("Stem")];
        merge_instance_materials(&mut mesh, &instance, 2, false);

        assert_eq!(mesh.materials.len(), 2);
        assert_eq!(mesh.materials[0].name, "Leaf");
        let indices: Vec<u32> = mesh.polygons().iter().map(|p| p.material_index).collect();
        assert_eq!(indices, [0, 1, 0]);
    }

    #[test]
    fn test_merge_without_instance_materials() {
        let mut mesh = mesh_with_faces(&[2]);
        merge_instance_materials(&mut mesh, &[], 2, false);
        assert_eq!(mesh.materials.len(), 2);
        assert_eq!(mesh.polygons()[0].material_index, 2);
    }

    #[test]
    fn test_card_materials() {
        let flat = card_material([0.2, 0.6, 0.1, 1.0], None);
        assert_eq!(flat.name, CARD_MATERIAL);
        assert_eq!(flat.alpha, 0.8);
        assert_eq!(flat.blend, BlendMode::AlphaBlend);

        let textured = card_material([0.2, 0.6, 0.1, 1.0], Some("cards/HairCard_Basic.png"));
        assert_eq!(textured.name, CARD_TEXTURED_MATERIAL);
        assert_eq!(textured.texture.as_deref(), Some("cards/HairCard_Basic.png"));
    }
}
