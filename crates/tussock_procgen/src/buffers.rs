use glam::{Vec2, Vec3};
use rand::Rng;
use thiserror::Error;

/// Largest offset applied per axis by [`jitter_uv`]
pub const UV_JITTER: f32 = 0.01;

/// Vertices one buffer can address with `u32` face indices
pub const MAX_VERTICES: usize = u32::MAX as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("geometry needs {needed} vertices, more than {} addressable by u32 indices", MAX_VERTICES)]
pub struct VertexOverflow {
    pub needed: usize,
}

/// Flat geometry accumulated by the strand emitters before it is committed
///
/// Face indices are `u32`, so one buffer holds at most [`MAX_VERTICES`].
/// Emitters write single strands into small buffers; [`GeometryBuffers::append`]
/// enforces the limit when those are merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryBuffers {
    pub vertices: Vec<Vec3>,
    pub faces: Vec<[u32; 3]>,
    pub material_indices: Vec<u32>,
    pub uv_coords: Vec<Vec2>,
}

impl GeometryBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertices: usize, faces: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
            faces: Vec::with_capacity(faces),
            material_indices: Vec::with_capacity(faces),
            uv_coords: Vec::with_capacity(vertices),
        }
    }

    /// Index the next pushed vertex will get
    pub fn vertex_offset(&self) -> u32 {
        self.vertices.len() as u32
    }

    pub fn push_vertex(&mut self, position: Vec3, uv: Vec2) {
        self.vertices.push(position);
        self.uv_coords.push(uv);
    }

    pub fn push_face(&mut self, face: [u32; 3], material_index: u32) {
        self.faces.push(face);
        self.material_indices.push(material_index);
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.faces.is_empty()
    }

    pub fn has_uvs(&self) -> bool {
        !self.uv_coords.is_empty()
    }

    /// Checks the per-face and per-vertex array lengths agree
    pub fn is_consistent(&self) -> bool {
        self.material_indices.len() == self.faces.len()
            && (self.uv_coords.is_empty() || self.uv_coords.len() == self.vertices.len())
    }

    /// Appends `other` after the current contents, rebasing its face
    /// indices onto this buffer's vertex range
    ///
    /// Fails without modifying either buffer when the merged vertex count
    /// would not fit the index range.
    pub fn append(&mut self, other: GeometryBuffers) -> Result<(), VertexOverflow> {
        let offset = checked_offset(self.vertices.len(), other.vertices.len())?;
        let had_uvs = self.has_uvs() || self.vertices.is_empty();

        self.vertices.extend(other.vertices.iter().copied());
        if had_uvs && other.uv_coords.len() == other.vertices.len() {
            self.uv_coords.extend(other.uv_coords);
        } else {
            self.uv_coords.clear();
        }
        self.faces.extend(
            other
                .faces
                .into_iter()
                .map(|[a, b, c]| [a + offset, b + offset, c + offset]),
        );
        self.material_indices.extend(other.material_indices);
        Ok(())
    }
}

/// Index of the first appended vertex, if `current + incoming` vertices fit
fn checked_offset(current: usize, incoming: usize) -> Result<u32, VertexOverflow> {
    let needed = current.saturating_add(incoming);
    if needed > MAX_VERTICES {
        return Err(VertexOverflow { needed });
    }
    Ok(current as u32)
}

/// Source UV nudged by up to ±[`UV_JITTER`] per axis, clamped to [0, 1]
pub fn jitter_uv<R: Rng + ?Sized>(rng: &mut R, source: Vec2) -> Vec2 {
    let offset = Vec2::new(
        rng.gen_range(-UV_JITTER..=UV_JITTER),
        rng.gen_range(-UV_JITTER..=UV_JITTER),
    );
    (source + offset).clamp(Vec2::ZERO, Vec2::ONE)
}

/// Uniform draw in `[-amount, amount]`, exactly 0 when `amount` is not positive
pub fn symmetric<R: Rng + ?Sized>(rng: &mut R, amount: f32) -> f32 {
    if amount > 0.0 {
        rng.gen_range(-amount..=amount)
    } else {
        0.0
    }
}
