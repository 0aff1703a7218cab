//! Interactive segmentation worker driven by point prompts.

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use ndarray::Array2;
use tracing::{debug, info, trace, warn};

use super::mailbox::{Deposit, Mailbox};
use super::thread::{WorkerThread, guarded, notify};
use crate::error::{BackendError, WorkerError};
use crate::frame::Frame;

const WORKER_NAME: &str = "segmentation-worker";

/// Score attached to every mask; segmentation backends report none.
pub const SEGMENTATION_SCORE: f32 = 0.95;

/// Binary mask, `(height, width)`.
pub type Mask = Array2<bool>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptLabel {
    Background,
    Foreground,
}

/// A clicked point guiding the segmentation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointPrompt {
    pub x: f32,
    pub y: f32,
    pub label: PromptLabel,
}

impl PointPrompt {
    pub fn foreground(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            label: PromptLabel::Foreground,
        }
    }

    pub fn background(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            label: PromptLabel::Background,
        }
    }
}

pub trait SegmentationBackend: Send + Sync {
    /// Produce masks for `frame` guided by `prompts` (never empty).
    fn segment(&self, frame: &Frame, prompts: &[PointPrompt]) -> Result<Vec<Mask>, BackendError>;
}

pub type SharedSegmenter = Arc<dyn SegmentationBackend>;

#[derive(Debug, Clone)]
pub struct MaskResult {
    /// All masks, best first.
    pub masks: Vec<Mask>,
    pub scores: Vec<f32>,
    /// `(height, width)` of the source frame.
    pub orig_shape: (u32, u32),
    pub frame: Frame,
    pub frame_index: u64,
}

impl MaskResult {
    /// The primary mask.
    pub fn segmentation(&self) -> Option<&Mask> {
        self.masks.first()
    }
}

#[derive(Debug, Clone)]
pub enum SegmentationEvent {
    Mask(MaskResult),
    Error(String),
}

struct SegmentationJob {
    frame: Frame,
    frame_index: u64,
    prompts: Vec<PointPrompt>,
}

/// Same hand-off as [`DetectionWorker`](super::DetectionWorker), for a
/// prompt-driven segmentation model.
pub struct SegmentationWorker {
    mailbox: Arc<Mailbox<SegmentationJob, Option<SharedSegmenter>>>,
    thread: WorkerThread,
}

impl SegmentationWorker {
    pub fn spawn(
        backend: Option<SharedSegmenter>,
    ) -> Result<(Self, Receiver<SegmentationEvent>), WorkerError> {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mailbox = Arc::new(Mailbox::new(backend));
        let thread = WorkerThread::spawn(WORKER_NAME, Arc::clone(&mailbox), move |job, backend| {
            process_job(job, backend, &tx);
        })?;
        Ok((Self { mailbox, thread }, rx))
    }

    /// Queue a frame with its prompts, replacing anything not yet started.
    pub fn submit(&self, frame: Frame, frame_index: u64, prompts: Vec<PointPrompt>) -> bool {
        let job = SegmentationJob {
            frame,
            frame_index,
            prompts,
        };
        match self.mailbox.put(job) {
            Deposit::Closed => {
                debug!(frame_index, "submit after stop ignored");
                false
            }
            _ => true,
        }
    }

    /// Drop the prompts of the pending submission, if any.
    pub fn clear_prompts(&self) {
        self.mailbox.update_pending(|job| job.prompts.clear());
    }

    pub fn set_model(&self, backend: Option<SharedSegmenter>) {
        let loaded = backend.is_some();
        self.mailbox.update_context(|slot| *slot = backend);
        info!(loaded, "segmentation model set");
    }

    pub fn has_model(&self) -> bool {
        self.mailbox.context().is_some()
    }

    pub fn stop(&mut self) {
        self.mailbox.close();
        self.thread.join();
    }
}

impl Drop for SegmentationWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn process_job(
    job: SegmentationJob,
    backend: Option<SharedSegmenter>,
    events: &Sender<SegmentationEvent>,
) {
    let SegmentationJob {
        frame,
        frame_index,
        prompts,
    } = job;
    let Some(backend) = backend else {
        trace!(frame_index, "no segmentation model, frame skipped");
        return;
    };
    if prompts.is_empty() {
        trace!(frame_index, "no prompts, frame skipped");
        return;
    }

    let event = match guarded(|| backend.segment(&frame, &prompts)) {
        Ok(masks) if masks.is_empty() => SegmentationEvent::Error("No masks generated".to_string()),
        Ok(masks) => {
            debug!(frame_index, count = masks.len(), "masks ready");
            SegmentationEvent::Mask(MaskResult {
                scores: vec![SEGMENTATION_SCORE; masks.len()],
                masks,
                orig_shape: (frame.height(), frame.width()),
                frame,
                frame_index,
            })
        }
        Err(err) => {
            warn!(frame_index, error = %err, "segmentation failed");
            SegmentationEvent::Error(format!("segmentation error: {err}"))
        }
    };

    notify(WORKER_NAME, || {
        let _ = events.send(event);
    });
}
