//! Bounded-resource gate.
//!
//! A counting semaphore with blocking `obtain`, non-blocking `release` and a
//! one-way `close`. The held-slot counter lives behind a `Mutex` and waiters
//! park on a `Condvar`; `closed` is a separate atomic flag checked when an
//! `obtain` starts.
//!
//! Closing does not wake threads already blocked in `obtain`: they keep
//! waiting for a slot or for their own cancellation.

mod cancel;
mod guard;

pub use cancel::{CancelToken, Cancellation};
pub use guard::{OwnedSlotGuard, SlotGuard};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

/// Counting semaphore limiting concurrent holders to a fixed capacity.
///
/// No fairness: any waiter may win a freed slot.
#[derive(Debug)]
pub struct Semaphore {
    capacity: usize,
    held: Mutex<usize>,
    freed: Condvar,
    closed: AtomicBool,
}

impl Semaphore {
    /// Create a semaphore with `capacity` slots (0 is raised to 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            held: Mutex::new(0),
            freed: Condvar::new(),
            closed: AtomicBool::new(false),
        }
    }

    // The counter stays consistent even if a holder panicked, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, usize> {
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take one slot, blocking until one frees up or `cancel` fires.
    ///
    /// Returns false without waiting if the semaphore is closed, and false
    /// with no slot taken if cancelled.
    pub fn obtain(&self, cancel: &Cancellation) -> bool {
        if self.closed() {
            return false;
        }
        let mut held = self.lock();
        loop {
            if *held < self.capacity {
                *held += 1;
                return true;
            }
            if cancel.is_cancelled() {
                return false;
            }
            held = match cancel.next_wait() {
                None => self
                    .freed
                    .wait(held)
                    .unwrap_or_else(PoisonError::into_inner),
                Some(d) => {
                    self.freed
                        .wait_timeout(held, d)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        }
    }

    /// Like `obtain`, but the slot is released when the guard drops.
    pub fn obtain_guard(&self, cancel: &Cancellation) -> Option<SlotGuard<'_>> {
        self.obtain(cancel).then(|| SlotGuard::new(self))
    }

    /// `obtain_guard` for a shared semaphore; the guard can move to another thread.
    pub fn obtain_owned(self: &Arc<Self>, cancel: &Cancellation) -> Option<OwnedSlotGuard> {
        self.obtain(cancel)
            .then(|| OwnedSlotGuard::new(Arc::clone(self)))
    }

    /// Give back one slot. Never blocks; returns false if nothing is held.
    pub fn release(&self) -> bool {
        {
            let mut held = self.lock();
            if *held == 0 {
                return false;
            }
            *held -= 1;
        }
        self.freed.notify_one();
        true
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots held right now. Racy under concurrent use; diagnostics only.
    pub fn count(&self) -> usize {
        *self.lock()
    }

    /// Stop handing out slots. Later `obtain` calls return false immediately.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::debug!("semaphore closed with {} slot(s) held", self.count());
        }
    }

    pub fn closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
