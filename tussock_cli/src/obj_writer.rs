//! Wavefront OBJ/MTL output.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tussock_procgen::{BlendMode, Material, MeshData};

/// Writes `mesh` to `path`, plus a sibling `.mtl` when it has materials
pub fn write_obj(mesh: &MeshData, path: &Path) -> Result<()> {
    let mtl_path = path.with_extension("mtl");
    let mtl_name = if mesh.materials.is_empty() {
        None
    } else {
        let file = File::create(&mtl_path)
            .with_context(|| format!("failed to create {}", mtl_path.display()))?;
        let mut out = BufWriter::new(file);
        write_mtl_to(&mesh.materials, &mut out)?;
        out.flush()?;
        mtl_path.file_name().map(|n| n.to_string_lossy().into_owned())
    };

    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    write_obj_to(mesh, mtl_name.as_deref(), &mut out)?;
    out.flush()?;

    log::info!(
        "Wrote {} ({} vertices, {} faces)",
        path.display(),
        mesh.vertex_count(),
        mesh.face_count()
    );
    Ok(())
}

pub fn write_obj_to<W: Write>(mesh: &MeshData, mtl_name: Option<&str>, out: &mut W) -> Result<()> {
    writeln!(out, "# tussock")?;
    if let Some(mtl) = mtl_name {
        writeln!(out, "mtllib {}", mtl)?;
    }
    writeln!(out, "o {}", mesh.name)?;

    for p in &mesh.positions {
        writeln!(out, "v {} {} {}", p.x, p.y, p.z)?;
    }

    let polygons = mesh.polygons();
    let uvs = mesh.has_uv_layer();
    if uvs {
        for polygon in polygons {
            for uv in polygon.uvs.iter().flatten() {
                writeln!(out, "vt {} {}", uv.x, uv.y)?;
            }
        }
    }

    // Smooth meshes get one normal per vertex, flat ones one per face
    let smooth = mesh.vertex_normals();
    let normals = smooth.unwrap_or(mesh.face_normals());
    for n in normals {
        writeln!(out, "vn {} {} {}", n.x, n.y, n.z)?;
    }
    writeln!(out, "s {}", if smooth.is_some() { "1" } else { "off" })?;

    let mut current_material = None;
    let mut uv_index = 1usize;
    for (face, polygon) in polygons.iter().enumerate() {
        if let Some(material) = mesh.materials.get(polygon.material_index as usize) {
            if current_material != Some(polygon.material_index) {
                writeln!(out, "usemtl {}", material.name)?;
                current_material = Some(polygon.material_index);
            }
        }

        write!(out, "f")?;
        for &v in &polygon.vertices {
            let vertex = v as usize + 1;
            let normal = if smooth.is_some() { vertex } else { face + 1 };
            if uvs {
                write!(out, " {}/{}/{}", vertex, uv_index, normal)?;
                uv_index += 1;
            } else {
                write!(out, " {}//{}", vertex, normal)?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn write_mtl_to<W: Write>(materials: &[Material], out: &mut W) -> Result<()> {
    for material in materials {
        let [r, g, b, _] = material.base_color;
        writeln!(out, "newmtl {}", material.name)?;
        writeln!(out, "Kd {} {} {}", r, g, b)?;
        match material.blend {
            BlendMode::Opaque => writeln!(out, "d 1")?,
            BlendMode::AlphaBlend => writeln!(out, "d {}", material.alpha)?,
        }
        writeln!(out, "illum 2")?;
        if let Some(texture) = &material.texture {
            writeln!(out, "map_Kd {}", texture)?;
            writeln!(out, "map_d {}", texture)?;
        }
        writeln!(out)?;
    }
    Ok(())
}
