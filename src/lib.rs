//! Detection hand-off, annotation consolidation and dataset export for video labeling.
//!
//! The crate sits between a frame source and a detection backend:
//!
//! - [`worker`] runs inference on a dedicated thread behind a single-slot mailbox,
//!   so only the most recent frame is ever waiting.
//! - [`dedup`] suppresses frames that look the same as the last one submitted.
//! - [`annotation`] keeps every automatic and manual record and computes
//!   filtered, best-per-track views on demand.
//! - [`export`] turns manual annotations into a YOLO train/val dataset.

pub mod annotation;
pub mod config;
pub mod dedup;
pub mod error;
pub mod export;
pub mod frame;
pub mod worker;

pub use annotation::{
    Annotation, AnnotationBuilder, AnnotationId, AnnotationKind, AnnotationStore, BBox, FrameSize,
    ViewFilter,
};
pub use config::{Config, DedupConfig, ExportConfig};
pub use dedup::{FrameDeduplicator, FrameThrottle, ThrottleDecision};
pub use error::{
    AnnotationError, BackendError, ConfigError, ExportError, FrameReadError, SessionError,
    WorkerError,
};
pub use export::{DatasetExporter, DatasetFrames, ExportReport, FrameProvider, VideoFrames};
pub use frame::Frame;
pub use worker::{
    BoxDetection, DetectionBackend, DetectionBatch, DetectionWorker, InferenceMode, ModelState,
    SegmentationBackend, SegmentationWorker,
};
