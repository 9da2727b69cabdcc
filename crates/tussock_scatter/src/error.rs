use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScatterError {
    #[error("emitter surface has zero sampleable area ({triangles} triangles)")]
    EmptySurface { triangles: usize },
}
