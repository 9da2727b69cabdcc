use glam::{Vec2, Vec3};

/// A strand root on the emitter surface
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceSample {
    pub position: Vec3,
    /// Unit world-space face normal
    pub normal: Vec3,
    pub uv: Option<Vec2>,
    /// Emitter polygon the sample came from
    pub face_index: Option<usize>,
    pub is_child: bool,
    /// Length drawn for a clump center, set only on center copies
    pub parent_length: Option<f32>,
}

impl SurfaceSample {
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self {
            position,
            normal,
            uv: None,
            face_index: None,
            is_child: false,
            parent_length: None,
        }
    }
}
