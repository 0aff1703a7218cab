//! Builder for creating annotation records from various input formats.

use super::bbox::BBox;
use super::record::{Annotation, AnnotationId, AnnotationKind, FrameSize, RawAnnotation};
use super::timestamp::timestamp_for_frame;
use crate::error::AnnotationError;

/// Builder for creating [`Annotation`] records.
///
/// Manual and training records default to confidence 1.0; automatic
/// records must state theirs. The source may be left empty for manual
/// records, the store fills in the active source on `add`.
#[derive(Debug, Clone, Default)]
pub struct AnnotationBuilder {
    kind: Option<AnnotationKind>,
    bbox: Option<BBox>,
    frame_size: Option<FrameSize>,
    class_label: Option<String>,
    confidence: Option<f32>,
    track_id: Option<u64>,
    timestamp: Option<String>,
    fps: Option<f64>,
    source_id: String,
    frame_index: Option<u64>,
}

impl AnnotationBuilder {
    /// Create a builder with no kind set.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn manual() -> Self {
        Self::new().kind(AnnotationKind::Manual)
    }

    pub fn automatic() -> Self {
        Self::new().kind(AnnotationKind::Automatic)
    }

    pub fn training() -> Self {
        Self::new().kind(AnnotationKind::Training)
    }

    pub fn kind(mut self, kind: AnnotationKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Set bounding box in TLBR format (x1, y1, x2, y2).
    pub fn tlbr(mut self, x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        self.bbox = Some(BBox::new(x1, y1, x2, y2));
        self
    }

    /// Set bounding box in TLWH format (left, top, width, height).
    pub fn tlwh(mut self, left: i32, top: i32, w: i32, h: i32) -> Self {
        self.bbox = Some(BBox::from_tlwh(left, top, w, h));
        self
    }

    /// Set bounding box in XYWH format (center_x, center_y, width, height).
    pub fn xywh(mut self, cx: f32, cy: f32, w: f32, h: f32) -> Self {
        self.bbox = Some(BBox::from_f32_tlbr(
            cx - w / 2.0,
            cy - h / 2.0,
            cx + w / 2.0,
            cy + h / 2.0,
        ));
        self
    }

    pub fn bbox(mut self, bbox: BBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    /// Size of the frame the box coordinates refer to.
    pub fn frame_size(mut self, width: u32, height: u32) -> Self {
        self.frame_size = Some(FrameSize::new(width, height));
        self
    }

    pub fn class(mut self, label: impl Into<String>) -> Self {
        self.class_label = Some(label.into());
        self
    }

    pub fn confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn track_id(mut self, track_id: Option<u64>) -> Self {
        self.track_id = track_id;
        self
    }

    pub fn frame(mut self, frame_index: u64) -> Self {
        self.frame_index = Some(frame_index);
        self
    }

    pub fn source(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = source_id.into();
        self
    }

    /// Set an explicit timestamp. Takes precedence over [`at_fps`](Self::at_fps).
    pub fn timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Derive the timestamp from the frame index at `fps`.
    pub fn at_fps(mut self, fps: f64) -> Self {
        self.fps = Some(fps);
        self
    }

    /// Build the final `Annotation`.
    pub fn build(self) -> Result<Annotation, AnnotationError> {
        let kind = self.kind.ok_or(AnnotationError::MissingField("type"))?;
        let bbox = self.bbox.ok_or(AnnotationError::MissingField("bbox"))?;
        let frame_size = self
            .frame_size
            .ok_or(AnnotationError::MissingField("frame_dimensions"))?;
        let class_label = self.class_label.ok_or(AnnotationError::MissingField("class"))?;
        let frame_index = self
            .frame_index
            .ok_or(AnnotationError::MissingField("frame_number"))?;
        let confidence = match (self.confidence, kind) {
            (Some(c), _) => c,
            (None, AnnotationKind::Automatic) => {
                return Err(AnnotationError::MissingField("confidence"));
            }
            (None, _) => 1.0,
        };
        let timestamp = match (self.timestamp, self.fps) {
            (Some(ts), _) => ts,
            (None, Some(fps)) => timestamp_for_frame(frame_index, fps),
            (None, None) => String::new(),
        };

        let record = Annotation {
            id: AnnotationId::UNASSIGNED,
            kind,
            bbox,
            frame_size,
            class_label,
            confidence,
            track_id: self.track_id,
            timestamp,
            source_id: self.source_id,
            frame_index,
        };
        record.validate_shape()?;
        Ok(record)
    }
}

impl TryFrom<RawAnnotation> for Annotation {
    type Error = AnnotationError;

    fn try_from(raw: RawAnnotation) -> Result<Self, Self::Error> {
        let x1 = raw.x1.ok_or(AnnotationError::MissingField("x1"))?;
        let y1 = raw.y1.ok_or(AnnotationError::MissingField("y1"))?;
        let x2 = raw.x2.ok_or(AnnotationError::MissingField("x2"))?;
        let y2 = raw.y2.ok_or(AnnotationError::MissingField("y2"))?;
        let size = raw
            .frame_dimensions
            .ok_or(AnnotationError::MissingField("frame_dimensions"))?;

        let mut builder = AnnotationBuilder::new()
            .tlbr(x1, y1, x2, y2)
            .frame_size(size.width, size.height)
            .track_id(raw.track_id)
            .source(raw.video_path.unwrap_or_default());
        if let Some(kind) = raw.kind {
            builder = builder.kind(kind);
        }
        if let Some(class) = raw.class {
            builder = builder.class(class);
        }
        if let Some(confidence) = raw.confidence {
            builder = builder.confidence(confidence);
        }
        if let Some(frame) = raw.frame_number {
            builder = builder.frame(frame);
        }
        if let Some(ts) = raw.timestamp {
            builder = builder.timestamp(ts);
        }
        builder.build()
    }
}
