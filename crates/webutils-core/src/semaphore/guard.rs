//! RAII guards that give a slot back when dropped.

use super::Semaphore;
use std::sync::Arc;

/// Holds one slot of a borrowed semaphore.
#[derive(Debug)]
pub struct SlotGuard<'a> {
    sema: &'a Semaphore,
}

impl<'a> SlotGuard<'a> {
    pub(super) fn new(sema: &'a Semaphore) -> Self {
        Self { sema }
    }
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        self.sema.release();
    }
}

/// Holds one slot of a shared semaphore; can be moved into another thread or task.
#[derive(Debug)]
pub struct OwnedSlotGuard {
    sema: Arc<Semaphore>,
}

impl OwnedSlotGuard {
    pub(super) fn new(sema: Arc<Semaphore>) -> Self {
        Self { sema }
    }

    pub fn semaphore(&self) -> &Arc<Semaphore> {
        &self.sema
    }
}

impl Drop for OwnedSlotGuard {
    fn drop(&mut self) {
        self.sema.release();
    }
}
