use tussock_procgen::MeshData;

/// Vertices closer than this are merged after pruning
pub const WELD_DISTANCE: f32 = 1e-4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub faces_removed: usize,
    pub loose_vertices: usize,
    pub welded: usize,
}

/// Strips the emitter's own faces from a generated mesh
///
/// The first `original_faces` polygons are removed, vertices left without a
/// face are deleted, then near-duplicate vertices are welded.
pub fn prune_original_geometry(mesh: &mut MeshData, original_faces: usize) -> PruneReport {
    let faces_removed = mesh.remove_leading_polygons(original_faces);
    let loose_vertices = mesh.delete_loose_vertices();
    let welded = mesh.weld_vertices(WELD_DISTANCE);

    log::info!(
        "Pruned {} original faces from '{}' ({} loose vertices, {} welded)",
        faces_removed,
        mesh.name,
        loose_vertices,
        welded
    );

    PruneReport {
        faces_removed,
        loose_vertices,
        welded,
    }
}
