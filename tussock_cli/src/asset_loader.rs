//! Wavefront OBJ loading into [`MeshData`].

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use glam::{Vec2, Vec3};
use tussock_procgen::{BlendMode, Material, MeshData};

/// Loads every model of an OBJ file into one mesh
///
/// Faces are kept as n-gons. Corner UVs come from the file's texture
/// coordinates, and materials from its MTL library when one resolves.
pub fn load_obj(path: &Path) -> Result<MeshData> {
    let options = tobj::LoadOptions {
        single_index: false,
        triangulate: false,
        ignore_points: true,
        ignore_lines: true,
        ..Default::default()
    };
    let (models, materials) = tobj::load_obj(path, &options)
        .with_context(|| format!("failed to load OBJ {}", path.display()))?;

    let materials = match materials {
        Ok(materials) => materials,
        Err(e) => {
            log::warn!("No materials loaded for {}: {}", path.display(), e);
            Vec::new()
        }
    };

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Mesh".to_string());
    let mut mesh = MeshData::new(name);
    if models.iter().any(|m| !m.mesh.texcoord_indices.is_empty()) {
        mesh.ensure_uv_layer();
    }
    mesh.materials = materials.iter().map(convert_material).collect();

    let mut skipped = 0usize;
    for model in &models {
        skipped += append_model(&mut mesh, &model.mesh);
    }
    if skipped > 0 {
        log::warn!("Skipped {} invalid faces in {}", skipped, path.display());
    }

    log::info!(
        "Loaded '{}': {} vertices, {} faces, {} materials",
        mesh.name,
        mesh.vertex_count(),
        mesh.face_count(),
        mesh.materials.len()
    );
    Ok(mesh)
}

/// Returns the number of faces that could not be added
fn append_model(mesh: &mut MeshData, source: &tobj::Mesh) -> usize {
    let base = mesh.vertex_count() as u32;
    for p in source.positions.chunks_exact(3) {
        mesh.add_vertex(Vec3::new(p[0], p[1], p[2]));
    }

    let texcoords: Vec<Vec2> = source
        .texcoords
        .chunks_exact(2)
        .map(|t| Vec2::new(t[0], t[1]))
        .collect();
    let has_uvs = source.texcoord_indices.len() == source.indices.len();
    let material_index = source.material_id.unwrap_or(0) as u32;

    // An empty arity list means every face is a triangle
    let arities: Vec<usize> = if source.face_arities.is_empty() {
        vec![3; source.indices.len() / 3]
    } else {
        source.face_arities.iter().map(|&a| a as usize).collect()
    };

    let mut skipped = 0;
    let mut start = 0;
    for arity in arities {
        let end = start + arity;
        let Some(corners) = source.indices.get(start..end) else {
            break;
        };
        let vertices: Vec<u32> = corners.iter().map(|&i| base + i).collect();
        let uvs: Option<Vec<Vec2>> = if has_uvs {
            source.texcoord_indices[start..end]
                .iter()
                .map(|&i| texcoords.get(i as usize).copied())
                .collect()
        } else {
            None
        };

        if let Err(e) = mesh.add_polygon(&vertices, material_index, uvs.as_deref()) {
            log::debug!("Dropping face {:?}: {}", vertices, e);
            skipped += 1;
        }
        start = end;
    }
    skipped
}

fn convert_material(source: &tobj::Material) -> Material {
    let [r, g, b] = source.diffuse.unwrap_or([0.8, 0.8, 0.8]);
    let alpha = source.dissolve.unwrap_or(1.0);
    Material {
        name: source.name.clone(),
        base_color: [r, g, b, 1.0],
        alpha,
        blend: if alpha < 1.0 {
            BlendMode::AlphaBlend
        } else {
            BlendMode::Opaque
        },
        texture: source.diffuse_texture.clone(),
    }
}

/// Reads `{"group": [w0, w1, ...]}` and attaches the groups to `mesh`
///
/// Each list must have one weight per vertex.
pub fn load_vertex_groups(mesh: &mut MeshData, path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read weights {}", path.display()))?;
    let groups: HashMap<String, Vec<f32>> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse weights {}", path.display()))?;

    for (name, weights) in groups {
        anyhow::ensure!(
            weights.len() == mesh.vertex_count(),
            "vertex group '{}' has {} weights for {} vertices",
            name,
            weights.len(),
            mesh.vertex_count()
        );
        log::info!("Loaded vertex group '{}'", name);
        mesh.vertex_groups.insert(name, weights);
    }
    Ok(())
}
