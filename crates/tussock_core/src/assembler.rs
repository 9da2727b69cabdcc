use tussock_procgen::{GeometryBuffers, MeshData};

/// Outcome of committing generated geometry into a mesh
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitReport {
    pub created: usize,
    pub skipped: usize,
    pub vertices: usize,
}

/// Bulk-inserts `buffers` into `mesh`
///
/// Faces the mesh rejects (out-of-range index, repeated corner, or a vertex
/// set already present) are counted as skipped; the rest still go in.
pub fn commit_geometry(mesh: &mut MeshData, buffers: GeometryBuffers) -> CommitReport {
    let GeometryBuffers {
        vertices,
        faces,
        material_indices,
        uv_coords,
    } = buffers;

    let base = mesh.vertex_count() as u32;
    let vertex_count = vertices.len();
    for position in vertices {
        mesh.add_vertex(position);
    }

    let use_uvs = !uv_coords.is_empty() && uv_coords.len() == vertex_count;
    if use_uvs {
        mesh.ensure_uv_layer();
    }

    let mut report = CommitReport {
        vertices: vertex_count,
        ..Default::default()
    };

    for (face, material_index) in faces.iter().zip(material_indices.iter().copied().chain(std::iter::repeat(0))) {
        let corners = face.map(|v| base + v);
        let uvs = use_uvs.then(|| face.map(|v| uv_coords.get(v as usize).copied().unwrap_or_default()));

        match mesh.add_polygon(&corners, material_index, uvs.as_ref().map(|uv| uv.as_slice())) {
            Ok(_) => report.created += 1,
            Err(e) => {
                log::trace!("Skipped face {:?}: {}", face, e);
                report.skipped += 1;
            }
        }
    }

    mesh.recalculate_normals();

    log::info!(
        "Committed {} vertices, {} faces ({} skipped) into '{}'",
        report.vertices,
        report.created,
        report.skipped,
        mesh.name
    );

    report
}
