use std::collections::{HashMap, HashSet};

use glam::{Vec2, Vec3};
use thiserror::Error;

/// Reasons a polygon can be refused by [`MeshData::add_polygon`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FaceError {
    #[error("a face needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),
    #[error("vertex index {index} out of range ({count} vertices)")]
    IndexOutOfRange { index: u32, count: usize },
    #[error("face uses vertex {0} more than once")]
    Degenerate(u32),
    #[error("a face with the same vertices already exists")]
    Duplicate,
    #[error("face has {uvs} uv coordinates for {vertices} corners")]
    UvMismatch { uvs: usize, vertices: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    #[default]
    Opaque,
    AlphaBlend,
}

/// Surface material carried along with the mesh
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub base_color: [f32; 4],
    pub alpha: f32,
    pub blend: BlendMode,
    pub texture: Option<String>,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_color: [0.8, 0.8, 0.8, 1.0],
            alpha: 1.0,
            blend: BlendMode::Opaque,
            texture: None,
        }
    }
}

/// One n-gon of the mesh
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub vertices: Vec<u32>,
    pub material_index: u32,
    /// Per-corner UVs, present exactly when the mesh has a UV layer
    pub uvs: Option<Vec<Vec2>>,
}

/// Triangle of a polygon's fan triangulation, with everything the
/// surface sampler needs resolved up front
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopTriangle {
    pub vertices: [u32; 3],
    pub positions: [Vec3; 3],
    pub normal: Vec3,
    pub uvs: Option<[Vec2; 3]>,
    pub polygon_index: usize,
    pub area: f32,
}

impl LoopTriangle {
    pub fn new(
        vertices: [u32; 3],
        positions: [Vec3; 3],
        uvs: Option<[Vec2; 3]>,
        polygon_index: usize,
    ) -> Self {
        let cross = (positions[1] - positions[0]).cross(positions[2] - positions[0]);
        Self {
            vertices,
            positions,
            normal: cross.normalize_or_zero(),
            uvs,
            polygon_index,
            area: cross.length() * 0.5,
        }
    }
}

/// Editable polygon mesh
///
/// Plays the role of the host mesh: emitters are read from it, instance
/// objects are copied out of it and generated strands are committed into it.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub vertex_groups: HashMap<String, Vec<f32>>,
    pub materials: Vec<Material>,
    polygons: Vec<Polygon>,
    uv_layer: bool,
    face_normals: Vec<Vec3>,
    vertex_normals: Option<Vec<Vec3>>,
    face_keys: HashSet<Vec<u32>>,
}

impl MeshData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn face_count(&self) -> usize {
        self.polygons.len()
    }

    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    pub fn has_uv_layer(&self) -> bool {
        self.uv_layer
    }

    pub fn face_normals(&self) -> &[Vec3] {
        &self.face_normals
    }

    /// Smooth vertex normals, available after [`MeshData::shade_smooth`]
    pub fn vertex_normals(&self) -> Option<&[Vec3]> {
        self.vertex_normals.as_deref()
    }

    pub fn add_vertex(&mut self, position: Vec3) -> u32 {
        self.positions.push(position);
        (self.positions.len() - 1) as u32
    }

    /// Creates the UV layer if missing; existing corners get (0, 0)
    pub fn ensure_uv_layer(&mut self) {
        if self.uv_layer {
            return;
        }
        for polygon in &mut self.polygons {
            polygon.uvs = Some(vec![Vec2::ZERO; polygon.vertices.len()]);
        }
        self.uv_layer = true;
    }

    /// Adds a polygon after checking its topology
    ///
    /// Corners without UVs on a mesh with a UV layer are set to (0, 0);
    /// UVs passed to a mesh without a layer are dropped.
    pub fn add_polygon(
        &mut self,
        vertices: &[u32],
        material_index: u32,
        uvs: Option<&[Vec2]>,
    ) -> Result<usize, FaceError> {
        if vertices.len() < 3 {
            return Err(FaceError::TooFewVertices(vertices.len()));
        }
        let count = self.positions.len();
        if let Some(&index) = vertices.iter().find(|&&v| v as usize >= count) {
            return Err(FaceError::IndexOutOfRange { index, count });
        }
        if let Some(uvs) = uvs {
            if uvs.len() != vertices.len() {
                return Err(FaceError::UvMismatch {
                    uvs: uvs.len(),
                    vertices: vertices.len(),
                });
            }
        }

        let key = face_key(vertices);
        if let Some(pair) = key.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(FaceError::Degenerate(pair[0]));
        }
        if self.face_keys.contains(&key) {
            return Err(FaceError::Duplicate);
        }
        self.face_keys.insert(key);

        let uvs = if self.uv_layer {
            Some(
                uvs.map(|uvs| uvs.to_vec())
                    .unwrap_or_else(|| vec![Vec2::ZERO; vertices.len()]),
            )
        } else {
            None
        };

        self.polygons.push(Polygon {
            vertices: vertices.to_vec(),
            material_index,
            uvs,
        });
        self.face_normals.push(polygon_normal(&self.positions, vertices));
        Ok(self.polygons.len() - 1)
    }

    pub fn set_material_index(&mut self, polygon: usize, material_index: u32) {
        if let Some(p) = self.polygons.get_mut(polygon) {
            p.material_index = material_index;
        }
    }

    pub fn append_materials<I>(&mut self, materials: I)
    where
        I: IntoIterator<Item = Material>,
    {
        self.materials.extend(materials);
    }

    /// Weight of `vertex` in the named vertex group, 0 when either is absent
    pub fn vertex_weight(&self, group: &str, vertex: u32) -> f32 {
        self.vertex_groups
            .get(group)
            .and_then(|weights| weights.get(vertex as usize))
            .copied()
            .unwrap_or(0.0)
    }

    /// Fan-triangulates every polygon (quads split 0-1-2 / 0-2-3)
    pub fn loop_triangles(&self) -> Vec<LoopTriangle> {
        let mut triangles = Vec::with_capacity(self.polygons.len() * 2);

        for (polygon_index, polygon) in self.polygons.iter().enumerate() {
            let v = &polygon.vertices;
            for k in 1..v.len() - 1 {
                let corners = [0, k, k + 1];
                let vertices = corners.map(|c| v[c]);
                let positions = vertices.map(|i| self.positions[i as usize]);
                let uvs = polygon.uvs.as_ref().map(|uvs| corners.map(|c| uvs[c]));
                triangles.push(LoopTriangle::new(vertices, positions, uvs, polygon_index));
            }
        }

        triangles
    }

    pub fn recalculate_normals(&mut self) {
        self.face_normals = self
            .polygons
            .iter()
            .map(|p| polygon_normal(&self.positions, &p.vertices))
            .collect();
        if self.vertex_normals.is_some() {
            self.vertex_normals = Some(self.smooth_normals());
        }
    }

    /// Switches to smooth shading by averaging face normals per vertex
    pub fn shade_smooth(&mut self) {
        self.vertex_normals = Some(self.smooth_normals());
    }

    fn smooth_normals(&self) -> Vec<Vec3> {
        let mut normals = vec![Vec3::ZERO; self.positions.len()];

        for (polygon, face_normal) in self.polygons.iter().zip(&self.face_normals) {
            for &v in &polygon.vertices {
                normals[v as usize] += *face_normal;
            }
        }

        for normal in &mut normals {
            *normal = normal.normalize_or_zero();
        }
        normals
    }

    /// Removes the first `count` polygons, keeping every vertex
    pub fn remove_leading_polygons(&mut self, count: usize) -> usize {
        let count = count.min(self.polygons.len());
        self.polygons.drain(..count);
        self.face_normals.drain(..count);
        self.rebuild_face_keys();
        count
    }

    /// Deletes vertices not referenced by any polygon and compacts indices
    pub fn delete_loose_vertices(&mut self) -> usize {
        let mut used = vec![false; self.positions.len()];
        for polygon in &self.polygons {
            for &v in &polygon.vertices {
                used[v as usize] = true;
            }
        }

        let remap: Vec<Option<u32>> = {
            let mut next = 0u32;
            used.iter()
                .map(|&u| {
                    u.then(|| {
                        next += 1;
                        next - 1
                    })
                })
                .collect()
        };
        let removed = used.iter().filter(|&&u| !u).count();
        if removed == 0 {
            return 0;
        }

        self.apply_vertex_remap(&remap);
        removed
    }

    /// Merges vertices closer than `distance` into the first one seen
    ///
    /// Polygons left with fewer than three distinct corners, or duplicating
    /// an existing polygon, are dropped. Returns the merged vertex count.
    pub fn weld_vertices(&mut self, distance: f32) -> usize {
        if self.positions.is_empty() || distance <= 0.0 {
            return 0;
        }

        let cell_size = distance;
        let cell_of = |p: Vec3| (p / cell_size).floor().as_ivec3();
        let mut grid: HashMap<glam::IVec3, Vec<u32>> = HashMap::new();
        let mut target: Vec<u32> = Vec::with_capacity(self.positions.len());
        let distance_sq = distance * distance;

        for (i, &p) in self.positions.iter().enumerate() {
            let cell = cell_of(p);
            let mut found = None;
            'search: for dz in -1..=1 {
                for dy in -1..=1 {
                    for dx in -1..=1 {
                        let key = cell + glam::IVec3::new(dx, dy, dz);
                        if let Some(bucket) = grid.get(&key) {
                            if let Some(&rep) = bucket.iter().find(|&&rep| {
                                self.positions[rep as usize].distance_squared(p) <= distance_sq
                            }) {
                                found = Some(rep);
                                break 'search;
                            }
                        }
                    }
                }
            }

            match found {
                Some(rep) => target.push(rep),
                None => {
                    grid.entry(cell).or_default().push(i as u32);
                    target.push(i as u32);
                }
            }
        }

        let merged = target
            .iter()
            .enumerate()
            .filter(|(i, &t)| *i as u32 != t)
            .count();
        if merged == 0 {
            return 0;
        }

        // Collapse corners onto their representatives
        let polygons = std::mem::take(&mut self.polygons);
        self.face_keys.clear();
        for mut polygon in polygons {
            let mut vertices = Vec::with_capacity(polygon.vertices.len());
            let mut uvs = polygon.uvs.as_ref().map(|_| Vec::new());
            for (corner, &v) in polygon.vertices.iter().enumerate() {
                let t = target[v as usize];
                if vertices.contains(&t) {
                    continue;
                }
                vertices.push(t);
                if let (Some(out), Some(src)) = (uvs.as_mut(), polygon.uvs.as_ref()) {
                    out.push(src[corner]);
                }
            }
            if vertices.len() < 3 {
                continue;
            }
            let key = face_key(&vertices);
            if !self.face_keys.insert(key) {
                continue;
            }
            polygon.vertices = vertices;
            polygon.uvs = uvs;
            self.polygons.push(polygon);
        }

        self.recalculate_normals();
        self.delete_loose_vertices();
        log::debug!(
            "Welded {} vertices of '{}', {} polygons left",
            merged,
            self.name,
            self.polygons.len()
        );
        merged
    }

    fn apply_vertex_remap(&mut self, remap: &[Option<u32>]) {
        let positions = std::mem::take(&mut self.positions);
        self.positions = positions
            .into_iter()
            .zip(remap)
            .filter_map(|(p, r)| r.map(|_| p))
            .collect();

        for weights in self.vertex_groups.values_mut() {
            let old = std::mem::take(weights);
            *weights = old
                .into_iter()
                .zip(remap)
                .filter_map(|(w, r)| r.map(|_| w))
                .collect();
        }

        for polygon in &mut self.polygons {
            for v in &mut polygon.vertices {
                // Polygons only reference kept vertices
                *v = remap[*v as usize].unwrap_or(0);
            }
        }

        if let Some(normals) = self.vertex_normals.take() {
            self.vertex_normals = Some(
                normals
                    .into_iter()
                    .zip(remap)
                    .filter_map(|(n, r)| r.map(|_| n))
                    .collect(),
            );
        }

        self.rebuild_face_keys();
    }

    fn rebuild_face_keys(&mut self) {
        self.face_keys = self.polygons.iter().map(|p| face_key(&p.vertices)).collect();
    }
}

fn face_key(vertices: &[u32]) -> Vec<u32> {
    let mut key = vertices.to_vec();
    key.sort_unstable();
    key
}

/// Newell normal, robust for non-planar n-gons
fn polygon_normal(positions: &[Vec3], vertices: &[u32]) -> Vec3 {
    let mut normal = Vec3::ZERO;
    for (i, &a) in vertices.iter().enumerate() {
        let b = vertices[(i + 1) % vertices.len()];
        let (p, q) = (positions[a as usize], positions[b as usize]);
        normal.x += (p.y - q.y) * (p.z + q.z);
        normal.y += (p.z - q.z) * (p.x + q.x);
        normal.z += (p.x - q.x) * (p.y + q.y);
    }
    normal.normalize_or_zero()
}
