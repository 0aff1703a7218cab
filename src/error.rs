//! Error types shared across the crate.

use std::io;
use std::path::PathBuf;

/// A record that cannot enter the annotation store.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnnotationError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("degenerate box ({x1}, {y1}, {x2}, {y2})")]
    InvalidBox { x1: i32, y1: i32, x2: i32, y2: i32 },

    #[error("confidence {0} outside [0, 1]")]
    InvalidConfidence(f32),

    #[error("frame size {width}x{height} is empty")]
    EmptyFrame { width: u32, height: u32 },
}

/// Failure reported by a detection or segmentation backend for one frame.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    #[error("inference failed: {0}")]
    Inference(String),

    #[error("backend panicked: {0}")]
    Panicked(String),
}

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("failed to spawn worker thread `{name}`: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: io::Error,
    },
}

/// A frame that could not be materialized for export.
#[derive(Debug, thiserror::Error)]
pub enum FrameReadError {
    #[error("frame {0} is not available")]
    NotFound(u64),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("no manual annotations to export")]
    NoAnnotations,

    #[error("i/o error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("i/o error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed session file: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
