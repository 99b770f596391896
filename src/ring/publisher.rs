//! Producer handle and disposal protocol
//!
//! This module provides the [`Publisher`], the single producer handle of a
//! broadcast ring, and the [`Disposer`], the supervisor handle that can
//! force-terminate the stream from another thread.
//!
//! The producer/disposal race is the only supported concurrent-write hazard
//! in the system. It is resolved by a tri-state flag driven purely by
//! compare-and-swap:
//!
//! - `IDLE`: no write in flight, disposal may claim the ring directly;
//! - `WRITING`: an [`advance`](Publisher::advance) is mid-handoff, disposal
//!   defers the final release to it;
//! - `DISPOSED`: terminal, all further advances are abandoned.
//!
//! Under every interleaving, the slot armed before the race and the slot
//! armed during it are each released exactly once, so no reader blocks
//! forever and no gate is released twice.

use crate::ring::core::RingCore;
use crate::ring::reader::Reader;
use crate::ring::Result;
use crossbeam_utils::CachePadded;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const IDLE: u8 = 0;
const WRITING: u8 = 1;
const DISPOSED: u8 = 2;

/// State shared between the producer handle and its disposer handles.
///
/// Readers never reference this block: a reader carries only the slot array
/// and its own cursor, so it cannot touch the disposal state by accident.
#[derive(Debug)]
struct ProducerShared {
    /// Tri-state dispose flag, IDLE / WRITING / DISPOSED.
    flag: CachePadded<AtomicU8>,
    /// Index of the currently armed slot. Written only by the producer;
    /// read by disposers and the stall check.
    cursor: CachePadded<AtomicUsize>,
}

impl ProducerShared {
    fn new() -> Self {
        Self {
            flag: CachePadded::new(AtomicU8::new(IDLE)),
            cursor: CachePadded::new(AtomicUsize::new(0)),
        }
    }

    fn transition(&self, from: u8, to: u8) -> bool {
        self.flag
            .compare_exchange(from, to, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn is_disposed(&self) -> bool {
        self.flag.load(Ordering::Acquire) == DISPOSED
    }
}

/// The single producer handle of a broadcast ring.
///
/// A `Publisher` owns the write cursor and the disposal state. It is not
/// `Clone`: the write/advance protocol is a single-writer contract, enforced
/// by convention at the call site rather than by locking the hot path.
/// Calling [`advance`](Self::advance) concurrently from two threads corrupts
/// cursor ordering and is unsupported.
///
/// Reader handles are created with [`reader`](Self::reader); a supervisor
/// handle restricted to disposal and stall checks is created with
/// [`disposer`](Self::disposer).
///
/// Dropping the publisher disposes the ring, so readers never hang on a
/// producer that went away without an explicit [`dispose`](Self::dispose).
#[derive(Debug)]
pub struct Publisher<T>
where
    T: Send + Sync,
{
    pub(crate) core: Arc<RingCore<T>>,
    shared: Arc<ProducerShared>,
}

impl<T> Publisher<T>
where
    T: Send + Sync,
{
    /// Create a ring of `2^exponent` slots with `Default` records.
    ///
    /// Slot 0 is armed immediately: the ring starts with one outstanding
    /// unit of work meaning "not yet written", so a reader created before
    /// the first write blocks until that write completes.
    ///
    /// # Errors
    /// Returns `RingError::InvalidSizeExponent` if `exponent` is zero or
    /// larger than [`MAX_SIZE_EXPONENT`](crate::ring::MAX_SIZE_EXPONENT).
    pub fn new(exponent: u32) -> Result<Self>
    where
        T: Default,
    {
        Self::with_factory(exponent, T::default)
    }

    /// Create a ring of `2^exponent` slots with records built by `factory`.
    ///
    /// # Errors
    /// Returns `RingError::InvalidSizeExponent` if `exponent` is zero or
    /// larger than [`MAX_SIZE_EXPONENT`](crate::ring::MAX_SIZE_EXPONENT).
    pub fn with_factory<F>(exponent: u32, factory: F) -> Result<Self>
    where
        F: FnMut() -> T,
    {
        let core = RingCore::new(exponent, factory)?;
        core.slot(0).gate().arm();
        tracing::debug!(slots = core.capacity(), "created broadcast ring");
        Ok(Self {
            core: Arc::new(core),
            shared: Arc::new(ProducerShared::new()),
        })
    }

    /// Number of slots in the ring; the retention window bounding reader
    /// staleness.
    pub fn capacity(&self) -> usize {
        self.core.capacity()
    }

    /// Index of the slot currently being written.
    pub fn cursor(&self) -> usize {
        self.shared.cursor.load(Ordering::Acquire)
    }

    /// `(cursor + delta) & (capacity - 1)`. Pure cursor arithmetic.
    pub fn offset(&self, delta: isize) -> usize {
        self.core.offset(self.cursor(), delta)
    }

    /// The current slot's scratch buffer: lazily created on first use,
    /// cleared (capacity retained) on every later call. The producer builds
    /// the record body here without reallocating each cycle.
    pub fn scratch(&mut self) -> &mut Vec<u8> {
        let slot = self.core.slot(self.producer_cursor());
        // SAFETY: &mut self on the sole producer handle gives exclusive
        // producer-side access to the armed slot's payload.
        unsafe { slot.acquire_scratch() }
    }

    /// Mutable access to the current slot's record, for payloads not staged
    /// through the scratch buffer.
    pub fn record_mut(&mut self) -> &mut T {
        let slot = self.core.slot(self.producer_cursor());
        // SAFETY: &mut self on the sole producer handle gives exclusive
        // producer-side access to the armed slot's payload.
        unsafe { slot.record_mut() }
    }

    /// Publish the record just written and move to the next slot.
    ///
    /// Called once per completed record, producer thread only. The handoff:
    ///
    /// 1. stamp the current slot's update time;
    /// 2. claim the ring (`IDLE -> WRITING`); if disposal claimed it first
    ///    the record is discarded and nothing else changes;
    /// 3. arm the next slot, move the cursor onto it, release the slot just
    ///    filled (waking every reader waiting on it);
    /// 4. return the ring (`WRITING -> IDLE`); if a disposal arrived during
    ///    step 3 it deferred its release to us, so the freshly armed slot is
    ///    released here as well, and no reader waits on a ring that will
    ///    never be written again.
    ///
    /// Returns `true` if the record was published, `false` if the ring was
    /// disposed and the record discarded. A `false` return is final: every
    /// later call returns `false` too.
    pub fn advance(&mut self) -> bool {
        let now = self.core.now_nanos();
        let index = self.producer_cursor();
        let filled = self.core.slot(index);
        filled.touch(now);

        if !self.shared.transition(IDLE, WRITING) {
            tracing::trace!(index, "advance abandoned, ring already disposed");
            return false;
        }

        let next = self.core.offset(index, 1);
        let armed = self.core.slot(next);
        armed.gate().arm();
        // Stamp the armed slot as well: its write cycle starts now, and the
        // stall check measures against the slot the cursor points at.
        armed.touch(now);
        self.shared.cursor.store(next, Ordering::Release);
        filled.gate().release();

        if !self.shared.transition(WRITING, IDLE) {
            // A disposal won the WRITING state while we were mid-handoff and
            // left the freshly armed slot to us.
            tracing::debug!(index = next, "disposal raced the write, releasing armed slot");
            self.core.slot(next).gate().release();
        }
        true
    }

    /// Force-terminate the stream. See [`Disposer::dispose`] for the full
    /// protocol; the publisher-side call is identical and idempotent.
    pub fn dispose(&self) {
        dispose_ring(&self.core, &self.shared);
    }

    /// Whether the ring has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.shared.is_disposed()
    }

    /// Whether the producer has gone quiet: true once more than `threshold`
    /// has elapsed since the last handoff. Purely advisory; a supervisor
    /// polls this to decide whether to [`dispose`](Self::dispose).
    #[must_use]
    pub fn is_stalled(&self, threshold: Duration) -> bool {
        ring_stalled(&self.core, &self.shared, threshold)
    }

    /// Create a reader trailing this publisher.
    ///
    /// The reader shares the slot array but owns an independent cursor,
    /// starting one slot behind the producer so that its first
    /// [`read_next`](Reader::read_next) lands on the slot currently being
    /// written.
    pub fn reader(&self) -> Reader<T> {
        let start = self.core.offset(self.cursor(), -1);
        Reader::new(Arc::clone(&self.core), start)
    }

    /// Create a supervisor handle for this ring, restricted to disposal and
    /// stall checks.
    pub fn disposer(&self) -> Disposer<T> {
        Disposer {
            core: Arc::clone(&self.core),
            shared: Arc::clone(&self.shared),
        }
    }

    /// Cursor load on the producer's own thread; only `advance` ever stores
    /// it, so a relaxed load suffices here.
    fn producer_cursor(&self) -> usize {
        self.shared.cursor.load(Ordering::Relaxed)
    }
}

impl<T> Drop for Publisher<T>
where
    T: Send + Sync,
{
    fn drop(&mut self) {
        dispose_ring(&self.core, &self.shared);
    }
}

/// Supervisor handle: disposal and stall checks, nothing else.
///
/// `Disposer` is `Clone` and `Send`; a stall supervisor typically owns one
/// and polls [`is_stalled`](Self::is_stalled) on a timer. It shares the
/// disposal state with the publisher it came from, while readers carry no
/// disposal state at all.
#[derive(Debug)]
pub struct Disposer<T>
where
    T: Send + Sync,
{
    core: Arc<RingCore<T>>,
    shared: Arc<ProducerShared>,
}

impl<T> Disposer<T>
where
    T: Send + Sync,
{
    /// Force-terminate the stream, releasing every reader currently blocked.
    ///
    /// Safe to call from any thread, at any time, any number of times:
    ///
    /// - no write in flight (`IDLE -> DISPOSED`): the currently armed slot
    ///   is released here, waking all of its waiters now;
    /// - a write in flight (`WRITING -> DISPOSED`): no release happens here;
    ///   the in-flight [`advance`](Publisher::advance) observes the claim
    ///   when it tries to return to `IDLE` and releases the freshly armed
    ///   slot on our behalf;
    /// - already disposed: no-op.
    ///
    /// Only one caller can win each transition, so concurrent disposals are
    /// idempotent by construction.
    pub fn dispose(&self) {
        dispose_ring(&self.core, &self.shared);
    }

    /// Whether the ring has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.shared.is_disposed()
    }

    /// Whether the producer has gone quiet for more than `threshold`.
    #[must_use]
    pub fn is_stalled(&self, threshold: Duration) -> bool {
        ring_stalled(&self.core, &self.shared, threshold)
    }
}

impl<T> Clone for Disposer<T>
where
    T: Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
            shared: Arc::clone(&self.shared),
        }
    }
}

fn dispose_ring<T>(core: &RingCore<T>, shared: &ProducerShared)
where
    T: Send + Sync,
{
    if shared.transition(IDLE, DISPOSED) {
        // No write in flight: the cursor is stable and the slot it points at
        // is the armed one. Release it so every blocked reader wakes now.
        let index = shared.cursor.load(Ordering::Acquire);
        core.slot(index).gate().release();
        tracing::debug!(index, "ring disposed, released armed slot");
    } else if shared.transition(WRITING, DISPOSED) {
        // Mid-write: the in-flight advance() fails its WRITING -> IDLE
        // transition and releases the newly armed slot for us.
        tracing::debug!("ring disposed during write, release deferred to writer");
    }
    // Neither transition succeeded: already disposed, nothing to do.
}

fn ring_stalled<T>(core: &RingCore<T>, shared: &ProducerShared, threshold: Duration) -> bool
where
    T: Send + Sync,
{
    let index = shared.cursor.load(Ordering::Acquire);
    let updated = core.slot(index).updated_at_nanos();
    let threshold = u64::try_from(threshold.as_nanos()).unwrap_or(u64::MAX);
    core.now_nanos().saturating_sub(updated) > threshold
}
