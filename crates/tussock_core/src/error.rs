//! Error and warning types for strand generation

use std::fmt;
use thiserror::Error;
use tussock_procgen::VertexOverflow;
use tussock_scatter::ScatterError;

/// Fatal errors; a run that fails leaves the emitter untouched
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Scatter(#[from] ScatterError),

    #[error(transparent)]
    Geometry(#[from] VertexOverflow),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Non-fatal conditions collected over a run and reported once
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    InsufficientSamples { produced: usize, requested: usize },
    InvalidInstanceConfig(String),
    FacesSkipped { count: usize },
    MissingVertexGroup(String),
    MissingUvLayer,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::InsufficientSamples { produced, requested } => write!(
                f,
                "generated {}/{} points due to distribution constraints",
                produced, requested
            ),
            Warning::InvalidInstanceConfig(reason) => {
                write!(f, "object render type needs a mesh instance: {}", reason)
            }
            Warning::FacesSkipped { count } => {
                write!(f, "skipped {} degenerate or duplicate faces", count)
            }
            Warning::MissingVertexGroup(name) => write!(
                f,
                "vertex group '{}' not found, using default distribution",
                name
            ),
            Warning::MissingUvLayer => write!(f, "emitter has no UV layer"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_display() {
        let warning = Warning::InsufficientSamples {
            produced: 0,
            requested: 10,
        };
        assert_eq!(
            warning.to_string(),
            "generated 0/10 points due to distribution constraints"
        );
    }

    #[test]
    fn test_scatter_error_converts() {
        let error: Error = ScatterError::EmptySurface { triangles: 0 }.into();
        assert!(matches!(error, Error::Scatter(_)));
    }

    #[test]
    fn test_vertex_overflow_converts() {
        let error: Error = VertexOverflow { needed: 5_000_000_000 }.into();
        assert!(matches!(error, Error::Geometry(_)));
        assert!(error.to_string().contains("5000000000"));
    }
}
