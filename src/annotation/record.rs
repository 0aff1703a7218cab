use std::fmt;

use serde::{Deserialize, Serialize};

use super::bbox::BBox;
use crate::error::AnnotationError;

/// Source id used for camera input, which has no file path.
pub const LIVE_SOURCE: &str = "Live";

/// Where a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnnotationKind {
    /// Produced by the detection backend.
    #[serde(rename = "auto")]
    Automatic,
    /// Drawn by the user.
    #[serde(rename = "manual")]
    Manual,
    /// Imported for training; exported like `Manual`, left out of reports.
    #[serde(rename = "training")]
    Training,
}

impl AnnotationKind {
    /// Only automatic records are subject to the confidence threshold and
    /// to best-per-track merging.
    #[inline]
    pub fn is_automatic(self) -> bool {
        self == AnnotationKind::Automatic
    }

    /// Records that feed the training dataset.
    #[inline]
    pub fn is_exportable(self) -> bool {
        matches!(self, AnnotationKind::Manual | AnnotationKind::Training)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AnnotationKind::Automatic => "auto",
            AnnotationKind::Manual => "manual",
            AnnotationKind::Training => "training",
        }
    }
}

/// Store-assigned identity of a record. Unique within one store, also for
/// manual records, which carry no track id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnnotationId(u64);

impl AnnotationId {
    /// Id of a record that has not been added to a store yet.
    pub const UNASSIGNED: AnnotationId = AnnotationId(0);

    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn is_assigned(self) -> bool {
        self != Self::UNASSIGNED
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Size of the frame a box was drawn or detected on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// One detection or annotation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    #[serde(skip)]
    pub id: AnnotationId,
    #[serde(rename = "type")]
    pub kind: AnnotationKind,
    #[serde(flatten)]
    pub bbox: BBox,
    #[serde(rename = "frame_dimensions")]
    pub frame_size: FrameSize,
    #[serde(rename = "class")]
    pub class_label: String,
    pub confidence: f32,
    /// Backend track id; `None` for manual records and plain detections.
    pub track_id: Option<u64>,
    /// `HH:MM:SS` position in the source, or a wall-clock time for live input.
    pub timestamp: String,
    /// Video path, dataset session, or [`LIVE_SOURCE`].
    #[serde(rename = "video_path")]
    pub source_id: String,
    #[serde(rename = "frame_number")]
    pub frame_index: u64,
}

impl Annotation {
    /// Check everything a stored record must satisfy.
    pub fn validate(&self) -> Result<(), AnnotationError> {
        if self.source_id.trim().is_empty() {
            return Err(AnnotationError::MissingField("source_id"));
        }
        self.validate_shape()
    }

    /// All checks except the source, which the store may still fill in.
    pub(crate) fn validate_shape(&self) -> Result<(), AnnotationError> {
        if self.class_label.trim().is_empty() {
            return Err(AnnotationError::MissingField("class"));
        }
        if !self.bbox.is_valid() {
            let BBox { x1, y1, x2, y2 } = self.bbox;
            return Err(AnnotationError::InvalidBox { x1, y1, x2, y2 });
        }
        if self.frame_size.width == 0 || self.frame_size.height == 0 {
            return Err(AnnotationError::EmptyFrame {
                width: self.frame_size.width,
                height: self.frame_size.height,
            });
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(AnnotationError::InvalidConfidence(self.confidence));
        }
        Ok(())
    }

    /// Box mapped onto a frame of `width`×`height`.
    pub fn bbox_for(&self, width: u32, height: u32) -> BBox {
        self.bbox.rescale(self.frame_size.as_tuple(), (width, height))
    }
}

/// Loosely typed record as it appears in session files. Every field may be
/// missing; conversion reports the first one that is.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawAnnotation {
    #[serde(rename = "type")]
    pub kind: Option<AnnotationKind>,
    pub x1: Option<i32>,
    pub y1: Option<i32>,
    pub x2: Option<i32>,
    pub y2: Option<i32>,
    pub frame_dimensions: Option<FrameSize>,
    pub class: Option<String>,
    pub confidence: Option<f32>,
    pub track_id: Option<u64>,
    pub timestamp: Option<String>,
    pub video_path: Option<String>,
    pub frame_number: Option<u64>,
}
