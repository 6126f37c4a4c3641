//! Bounded frame pipelining.
//!
//! The CPU may run ahead of the GPU by at most `slots` frames. Each frame takes
//! one permit of a counting semaphore before touching its camera slot, and the
//! permit is given back once the GPU reports the frame's submission as done.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use futures_intrusive::sync::Semaphore;

/// A claimed in-flight slot. The slot's uniform buffers belong to the CPU until
/// the frame is submitted.
#[derive(Debug, PartialEq, Eq)]
pub struct FrameSlot {
    index: usize,
}

impl FrameSlot {
    pub fn index(&self) -> usize {
        self.index
    }
}

pub struct InFlightFrames {
    semaphore: Arc<Semaphore>,
    outstanding: Arc<AtomicUsize>,
    slots: usize,
    current: usize,
}

impl InFlightFrames {
    pub fn new(slots: usize) -> Self {
        assert!(slots > 0, "at least one frame slot is required");
        Self {
            semaphore: Arc::new(Semaphore::new(false, slots)),
            outstanding: Arc::new(AtomicUsize::new(0)),
            slots,
            // the first frame lands on slot 0
            current: slots - 1,
        }
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    /// Frames acquired but not yet completed by the GPU.
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Claims the next slot if a permit is free.
    pub fn try_begin(&mut self) -> Option<FrameSlot> {
        // The permit is handed back by the completion callback, not on drop.
        self.semaphore.try_acquire(1)?.disarm();
        self.outstanding.fetch_add(1, Ordering::AcqRel);
        self.current = (self.current + 1) % self.slots;
        Some(FrameSlot {
            index: self.current,
        })
    }

    /// Claims the next slot, calling `wait` until the GPU frees a permit.
    ///
    /// `wait` is expected to block on the device so that completion callbacks
    /// get a chance to run.
    pub fn begin(&mut self, mut wait: impl FnMut()) -> FrameSlot {
        loop {
            if let Some(slot) = self.try_begin() {
                return slot;
            }
            log::trace!("all {} frame slots in flight, waiting on the GPU", self.slots);
            wait();
        }
    }

    /// Callback releasing `slot` once the GPU has consumed it. Pass it to
    /// `wgpu::Queue::on_submitted_work_done`.
    pub fn completion(&self, slot: FrameSlot) -> impl FnOnce() + Send + 'static {
        let semaphore = self.semaphore.clone();
        let outstanding = self.outstanding.clone();
        move || {
            log::trace!("frame slot {} completed", slot.index);
            outstanding.fetch_sub(1, Ordering::AcqRel);
            semaphore.release(1);
        }
    }

    /// Gives a slot back without submitting any work for it.
    pub fn abandon(&self, slot: FrameSlot) {
        (self.completion(slot))();
    }
}
