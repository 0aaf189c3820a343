//! Target cell of a rebindable call site.

use std::cell::UnsafeCell;
use std::hint;
use std::mem;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering::SeqCst};

use crate::invoke::handle::MethodHandle;

/// Two-slot cell. Readers register on the active slot and clone its handle
/// without taking a lock; a writer fills the idle slot once its readers have
/// left, then flips the active index.
pub(crate) struct TargetCell {
    slots: [UnsafeCell<MethodHandle>; 2],
    readers: [AtomicUsize; 2],
    active: AtomicUsize,
    writer: Mutex<()>,
}

// SAFETY: a slot is only written by the writer holding `writer`, while the
// slot is idle and has no registered readers. Readers only dereference a slot
// that was active after they registered on it.
unsafe impl Sync for TargetCell {}

impl TargetCell {
    pub(crate) fn new(target: MethodHandle) -> Self {
        TargetCell {
            slots: [UnsafeCell::new(target.clone()), UnsafeCell::new(target)],
            readers: [AtomicUsize::new(0), AtomicUsize::new(0)],
            active: AtomicUsize::new(0),
            writer: Mutex::new(()),
        }
    }

    pub(crate) fn load(&self) -> MethodHandle {
        loop {
            let index = self.active.load(SeqCst);
            self.readers[index].fetch_add(1, SeqCst);
            if self.active.load(SeqCst) == index {
                // SAFETY: registered while `index` was active, so no writer
                // touches the slot until we deregister.
                let target = unsafe { (*self.slots[index].get()).clone() };
                self.readers[index].fetch_sub(1, SeqCst);
                return target;
            }
            self.readers[index].fetch_sub(1, SeqCst);
        }
    }

    /// Installs `target`. Every load that starts after this returns sees it
    /// or a later target.
    pub(crate) fn store(&self, target: MethodHandle) {
        let _guard = self
            .writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let idle = 1 - self.active.load(SeqCst);
        while self.readers[idle].load(SeqCst) != 0 {
            hint::spin_loop();
        }
        // SAFETY: `idle` is inactive with no registered readers. Readers that
        // register on it from here on see another active index and back out
        // until the flip below.
        let stale = unsafe { mem::replace(&mut *self.slots[idle].get(), target) };
        self.active.store(idle, SeqCst);
        drop(stale);
    }
}
