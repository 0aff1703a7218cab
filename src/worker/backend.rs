//! Trait for object detection inference backends.

use std::sync::Arc;

use crate::error::BackendError;
use crate::frame::Frame;

/// How the backend should treat a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferenceMode {
    /// Plain detection; no track identity is carried over.
    Detect,
    /// Detection plus tracking, persisting track ids across calls.
    Track,
}

/// One box reported by a backend, in the pixel space of the frame it was
/// computed on.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxDetection {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub confidence: f32,
    pub class_id: usize,
    /// Present only when the backend ran in [`InferenceMode::Track`].
    pub track_id: Option<u64>,
}

impl BoxDetection {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, confidence: f32, class_id: usize) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            confidence,
            class_id,
            track_id: None,
        }
    }

    pub fn with_track_id(mut self, track_id: u64) -> Self {
        self.track_id = Some(track_id);
        self
    }
}

/// A loaded detection model.
///
/// Implement this trait to connect any detector or detector+tracker to the
/// [`DetectionWorker`](super::DetectionWorker).
///
/// # Example
///
/// ```ignore
/// use annotrack_rs::{BoxDetection, DetectionBackend, Frame, InferenceMode};
/// use annotrack_rs::error::BackendError;
///
/// struct MyDetector { /* model handle */ }
///
/// impl DetectionBackend for MyDetector {
///     fn infer(&self, frame: &Frame, mode: InferenceMode) -> Result<Vec<BoxDetection>, BackendError> {
///         Ok(vec![])
///     }
/// }
/// ```
pub trait DetectionBackend: Send + Sync {
    /// Run inference on one frame.
    ///
    /// Called from the worker thread only, one frame at a time. Errors are
    /// logged by the worker and treated as an empty result.
    fn infer(&self, frame: &Frame, mode: InferenceMode) -> Result<Vec<BoxDetection>, BackendError>;

    /// Human-readable name for a class id, if the model carries one.
    fn class_name(&self, _class_id: usize) -> Option<String> {
        None
    }
}

/// Backend reference shared between the caller and the worker thread.
pub type SharedBackend = Arc<dyn DetectionBackend>;
