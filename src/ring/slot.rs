//! Slot storage
//!
//! One cell of the ring: the record, a reusable scratch buffer for building
//! the record body, the last-update timestamp, and the completion gate for
//! the current write cycle.

use crate::ring::gate::ReadyGate;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU64, Ordering};

/// A single ring cell.
///
/// The record and scratch buffer live in an `UnsafeCell`; access is
/// coordinated by the gate protocol rather than a lock. The producer writes
/// the payload only while the slot is armed, and releases the gate after the
/// write; readers dereference the payload only once the gate reports
/// released, so they observe the fully written record.
pub(crate) struct Slot<T> {
    payload: UnsafeCell<Payload<T>>,
    /// Nanoseconds since ring creation at the start of the last handoff,
    /// stored atomically so the stall supervisor can poll it from another
    /// thread.
    updated_at: AtomicU64,
    ready: ReadyGate,
}

struct Payload<T> {
    record: T,
    /// Created on first acquire, cleared (capacity retained) on each reuse.
    scratch: Option<Vec<u8>>,
}

impl<T> Slot<T> {
    pub(crate) fn new(record: T) -> Self {
        Self {
            payload: UnsafeCell::new(Payload {
                record,
                scratch: None,
            }),
            updated_at: AtomicU64::new(0),
            ready: ReadyGate::new(),
        }
    }

    pub(crate) fn gate(&self) -> &ReadyGate {
        &self.ready
    }

    /// Stamp the slot with the current ring-relative time.
    pub(crate) fn touch(&self, nanos: u64) {
        self.updated_at.store(nanos, Ordering::Release);
    }

    pub(crate) fn updated_at_nanos(&self) -> u64 {
        self.updated_at.load(Ordering::Acquire)
    }

    /// Read the record.
    ///
    /// # Safety
    /// The caller must hold a happens-before edge to the last write of this
    /// slot (a completed `wait` on the gate, or the single-writer contract).
    /// A reader that trails the producer by more than the ring capacity may
    /// observe a newer record than the one it targeted; bounding the cursor
    /// to the retention window is the caller's contract.
    pub(crate) unsafe fn record(&self) -> &T {
        &(*self.payload.get()).record
    }

    /// Mutable access to the record.
    ///
    /// # Safety
    /// Producer thread only, and only while this slot is armed. The
    /// single-writer contract guarantees no second mutable alias exists.
    #[allow(clippy::mut_from_ref)]
    pub(crate) unsafe fn record_mut(&self) -> &mut T {
        &mut (*self.payload.get()).record
    }

    /// The scratch buffer, lazily created on first use and cleared on every
    /// subsequent acquire. Clearing keeps the allocation, so a slot that has
    /// been through a full ring pass reuses its buffer instead of
    /// reallocating.
    ///
    /// # Safety
    /// Same contract as [`record_mut`](Self::record_mut).
    #[allow(clippy::mut_from_ref)]
    pub(crate) unsafe fn acquire_scratch(&self) -> &mut Vec<u8> {
        let payload = &mut *self.payload.get();
        let scratch = payload.scratch.get_or_insert_with(Vec::new);
        scratch.clear();
        scratch
    }
}

impl<T> std::fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slot")
            .field("updated_at", &self.updated_at_nanos())
            .field("ready", &self.ready)
            .finish_non_exhaustive()
    }
}

// SAFETY: Slot<T> is shared across the producer, readers and the supervisor.
// The payload cell is only written by the single producer thread while the
// slot is armed, and only read by consumers after the gate release
// establishes the happens-before edge to that write. Timestamp and gate are
// internally synchronized.
unsafe impl<T: Send + Sync> Send for Slot<T> {}
unsafe impl<T: Send + Sync> Sync for Slot<T> {}
