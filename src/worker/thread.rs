//! Thread plumbing shared by the detection and segmentation workers.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, error};

use super::mailbox::Mailbox;
use crate::error::{BackendError, WorkerError};

/// A running worker loop: one thread draining one mailbox.
pub(crate) struct WorkerThread {
    name: &'static str,
    handle: Option<JoinHandle<()>>,
}

impl WorkerThread {
    /// Spawn a thread that calls `step` for every item taken from `mailbox`
    /// until the mailbox is closed.
    pub(crate) fn spawn<T, C, F>(
        name: &'static str,
        mailbox: Arc<Mailbox<T, C>>,
        mut step: F,
    ) -> Result<Self, WorkerError>
    where
        T: Send + 'static,
        C: Clone + Send + 'static,
        F: FnMut(T, C) + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                debug!(worker = name, "worker started");
                while let Some((item, context)) = mailbox.take() {
                    step(item, context);
                }
                debug!(worker = name, "worker exited");
            })
            .map_err(|source| WorkerError::Spawn { name, source })?;

        Ok(Self {
            name,
            handle: Some(handle),
        })
    }

    /// Wait for the thread to exit. The mailbox must already be closed.
    pub(crate) fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!(worker = self.name, "worker thread panicked");
            }
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

/// Run a backend call, turning a panic into a [`BackendError`].
pub(crate) fn guarded<R>(call: impl FnOnce() -> Result<R, BackendError>) -> Result<R, BackendError> {
    panic::catch_unwind(AssertUnwindSafe(call))
        .unwrap_or_else(|payload| Err(BackendError::Panicked(panic_message(payload.as_ref()))))
}

/// Run a listener callback, logging instead of unwinding through the loop.
pub(crate) fn notify(worker: &'static str, call: impl FnOnce()) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(call)) {
        error!(
            worker,
            panic = %panic_message(payload.as_ref()),
            "result listener panicked"
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
