//! Background inference workers.
//!
//! Each worker owns one thread and a single-slot [`Mailbox`]. Submitting a
//! frame overwrites whatever is still waiting, so a slow backend only ever
//! sees the newest frame. Results leave the thread through a
//! `crossbeam_channel` or a listener closure, never while the mailbox lock
//! is held.

mod backend;
mod detection;
mod mailbox;
mod mode;
mod segmentation;
mod thread;

pub use backend::{BoxDetection, DetectionBackend, InferenceMode, SharedBackend};
pub use detection::{DetectionBatch, DetectionWorker};
pub use mailbox::{Deposit, Mailbox};
pub use mode::ModelState;
pub use segmentation::{
    Mask, MaskResult, PointPrompt, PromptLabel, SEGMENTATION_SCORE, SegmentationBackend,
    SegmentationEvent, SegmentationWorker, SharedSegmenter,
};
