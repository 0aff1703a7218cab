//! Detection worker: latest-frame-wins inference on a dedicated thread.

use std::sync::Arc;

use crossbeam_channel::Receiver;
use tracing::{debug, info, trace, warn};

use super::backend::{BoxDetection, InferenceMode, SharedBackend};
use super::mailbox::{Deposit, Mailbox};
use super::mode::ModelState;
use super::thread::{WorkerThread, guarded, notify};
use crate::error::WorkerError;
use crate::frame::Frame;

const WORKER_NAME: &str = "detection-worker";

/// Detections computed on one frame (worker thread → consumer).
#[derive(Debug, Clone)]
pub struct DetectionBatch {
    pub detections: Vec<BoxDetection>,
    /// The frame the boxes were computed on.
    pub frame: Frame,
    pub frame_index: u64,
    pub mode: InferenceMode,
}

struct FrameJob {
    frame: Frame,
    frame_index: u64,
}

/// Model reference plus its mode state, guarded by the mailbox mutex.
#[derive(Clone, Default)]
struct ModelSlot {
    backend: Option<SharedBackend>,
    state: ModelState,
    /// Bumped on every `set_model`, so a step that finishes after a swap
    /// does not advance the new model's state.
    generation: u64,
}

/// Runs a [`DetectionBackend`](super::DetectionBackend) on its own thread.
///
/// At most one frame waits in the mailbox; a new submission replaces it.
/// Batches with at least one detection are delivered on the channel
/// returned by [`spawn`](Self::spawn) or to the listener given to
/// [`spawn_with_listener`](Self::spawn_with_listener).
pub struct DetectionWorker {
    mailbox: Arc<Mailbox<FrameJob, ModelSlot>>,
    thread: WorkerThread,
}

impl DetectionWorker {
    /// Start a worker whose results arrive on the returned receiver.
    pub fn spawn(
        backend: Option<SharedBackend>,
    ) -> Result<(Self, Receiver<DetectionBatch>), WorkerError> {
        let (tx, rx) = crossbeam_channel::unbounded();
        let worker = Self::spawn_with_listener(backend, move |batch| {
            // The consumer may have gone away; results are simply dropped then.
            let _ = tx.send(batch);
        })?;
        Ok((worker, rx))
    }

    /// Start a worker that calls `listener` on the worker thread for every
    /// non-empty batch. The mailbox lock is never held during the call.
    pub fn spawn_with_listener<F>(
        backend: Option<SharedBackend>,
        listener: F,
    ) -> Result<Self, WorkerError>
    where
        F: Fn(DetectionBatch) + Send + 'static,
    {
        let mailbox = Arc::new(Mailbox::new(ModelSlot {
            backend,
            ..ModelSlot::default()
        }));

        let step_mailbox = Arc::clone(&mailbox);
        let thread = WorkerThread::spawn(WORKER_NAME, Arc::clone(&mailbox), move |job, slot| {
            process_frame(&step_mailbox, job, slot, &listener);
        })?;

        Ok(Self { mailbox, thread })
    }

    /// Queue `frame` for inference, replacing any frame not yet started.
    ///
    /// Never blocks on inference. Returns `false` after [`stop`](Self::stop).
    pub fn submit(&self, frame: Frame, frame_index: u64) -> bool {
        match self.mailbox.put(FrameJob { frame, frame_index }) {
            Deposit::Stored => true,
            Deposit::Replaced => {
                trace!(frame_index, "replaced unprocessed frame");
                true
            }
            Deposit::Closed => {
                debug!(frame_index, "submit after stop ignored");
                false
            }
        }
    }

    /// Swap the model. A step already running finishes with the model it
    /// captured; the next one uses `backend` and starts in detect mode.
    ///
    /// `None` pauses inference: frames are still accepted but produce nothing.
    pub fn set_model(&self, backend: Option<SharedBackend>) {
        let loaded = backend.is_some();
        self.mailbox.update_context(|slot| {
            slot.backend = backend;
            slot.state = ModelState::FreshModel;
            slot.generation += 1;
        });
        info!(loaded, "detection model set");
    }

    pub fn has_model(&self) -> bool {
        self.mailbox.context().backend.is_some()
    }

    pub fn model_state(&self) -> ModelState {
        self.mailbox.context().state
    }

    pub fn is_running(&self) -> bool {
        self.mailbox.is_open() && self.thread.is_running()
    }

    /// Stop the worker and wait for its thread to exit.
    ///
    /// An in-flight step runs to completion first; once this returns no
    /// further results are delivered. Calling it again is a no-op.
    pub fn stop(&mut self) {
        self.mailbox.close();
        self.thread.join();
    }
}

impl Drop for DetectionWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn process_frame<F>(
    mailbox: &Mailbox<FrameJob, ModelSlot>,
    job: FrameJob,
    slot: ModelSlot,
    listener: &F,
) where
    F: Fn(DetectionBatch),
{
    let FrameJob { frame, frame_index } = job;
    let Some(backend) = slot.backend else {
        trace!(frame_index, "no model loaded, frame skipped");
        return;
    };

    let mode = slot.state.mode();
    let detections = match guarded(|| backend.infer(&frame, mode)) {
        Ok(detections) => detections,
        Err(err) => {
            warn!(frame_index, ?mode, error = %err, "inference failed, treating frame as empty");
            return;
        }
    };

    mailbox.update_context(|current| {
        if current.generation == slot.generation {
            current.state = current.state.after_success();
        }
    });

    if detections.is_empty() {
        return;
    }

    debug!(frame_index, ?mode, count = detections.len(), "detections ready");
    notify(WORKER_NAME, || {
        listener(DetectionBatch {
            detections,
            frame,
            frame_index,
            mode,
        })
    });
}
