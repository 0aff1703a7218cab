//! Single-slot hand-off between a producer and one consumer thread.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Outcome of [`Mailbox::put`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deposit {
    /// The slot was empty.
    Stored,
    /// An unconsumed item was overwritten and dropped.
    Replaced,
    /// The mailbox is closed; the item was dropped.
    Closed,
}

struct Inner<T, C> {
    slot: Option<T>,
    context: C,
    open: bool,
}

/// A mailbox holding at most one pending item plus a shared context.
///
/// The context (for workers, the current model) lives under the same mutex
/// as the slot, so [`take`](Self::take) hands back the item together with
/// the context as it was at dequeue time.
pub struct Mailbox<T, C> {
    inner: Mutex<Inner<T, C>>,
    ready: Condvar,
}

impl<T, C> Mailbox<T, C> {
    pub fn new(context: C) -> Self {
        Self {
            inner: Mutex::new(Inner {
                slot: None,
                context,
                open: true,
            }),
            ready: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T, C>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `item`, overwriting any pending one. Never blocks beyond the
    /// lock acquisition.
    pub fn put(&self, item: T) -> Deposit {
        let mut inner = self.lock();
        if !inner.open {
            return Deposit::Closed;
        }
        let previous = inner.slot.replace(item);
        drop(inner);
        self.ready.notify_one();
        if previous.is_some() {
            Deposit::Replaced
        } else {
            Deposit::Stored
        }
    }

    /// Block until an item is available or the mailbox is closed.
    ///
    /// Closing wins over a pending item: once closed, `None` is returned
    /// even if something is still in the slot.
    pub fn take(&self) -> Option<(T, C)>
    where
        C: Clone,
    {
        let mut inner = self.lock();
        loop {
            if !inner.open {
                return None;
            }
            if let Some(item) = inner.slot.take() {
                return Some((item, inner.context.clone()));
            }
            inner = self
                .ready
                .wait(inner)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Mutate the pending item in place, if there is one.
    pub fn update_pending(&self, f: impl FnOnce(&mut T)) {
        if let Some(item) = self.lock().slot.as_mut() {
            f(item);
        }
    }

    pub fn update_context<R>(&self, f: impl FnOnce(&mut C) -> R) -> R {
        f(&mut self.lock().context)
    }

    pub fn context(&self) -> C
    where
        C: Clone,
    {
        self.lock().context.clone()
    }

    /// Close the mailbox and wake the consumer. Idempotent.
    pub fn close(&self) {
        let mut inner = self.lock();
        inner.open = false;
        inner.slot = None;
        drop(inner);
        self.ready.notify_all();
    }

    pub fn is_open(&self) -> bool {
        self.lock().open
    }

    pub fn has_pending(&self) -> bool {
        self.lock().slot.is_some()
    }
}
