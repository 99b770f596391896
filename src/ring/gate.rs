//! Re-armable completion signal
//!
//! Each slot carries a [`ReadyGate`]: a single-shot broadcast signal that can
//! be re-armed for the next write cycle. While armed, waiters block; once
//! released, the current waiters and every future waiter pass immediately
//! until the gate is armed again. This replaces a one-shot broadcast (consumed
//! on release) with an explicit arm/release cycle that is safe to restart
//! while a waiter from the previous cycle is still waking up.

use parking_lot::{Condvar, Mutex};

/// A single-shot, re-armable broadcast gate.
///
/// The gate tracks a cycle counter alongside the released flag. A waiter
/// records the cycle it entered on and unblocks when either that cycle is
/// released or the gate has moved on to a later cycle. The ring protocol
/// only re-arms a slot after its previous cycle was released (the producer
/// has to wrap the whole ring first), so observing a newer cycle proves the
/// awaited release already happened. That check is what makes re-arming safe
/// against a waiter still parked on the prior cycle.
///
/// A new gate starts released: a slot that was never armed holds no pending
/// write, so readers pass straight through it.
#[derive(Debug, Default)]
pub struct ReadyGate {
    state: Mutex<GateState>,
    ready: Condvar,
}

#[derive(Debug)]
struct GateState {
    /// Bumped on every arm; lets waiters detect a completed cycle they slept
    /// through.
    cycle: u64,
    released: bool,
}

impl Default for GateState {
    fn default() -> Self {
        Self {
            cycle: 0,
            released: true,
        }
    }
}

impl ReadyGate {
    /// Create a new gate in the released state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a new write cycle: waiters arriving after this call block until
    /// [`release`](Self::release).
    ///
    /// Must only be called on a released gate; the ring arms a slot exactly
    /// once per pass and always after the previous cycle completed.
    pub fn arm(&self) {
        let mut state = self.state.lock();
        debug_assert!(
            state.released,
            "gate re-armed before its previous cycle was released"
        );
        state.cycle = state.cycle.wrapping_add(1);
        state.released = false;
    }

    /// Complete the current cycle and wake every waiter.
    ///
    /// Called exactly once per armed cycle; the ring's write/advance and
    /// disposal protocols guarantee the exactly-once property between them.
    pub fn release(&self) {
        let mut state = self.state.lock();
        debug_assert!(!state.released, "gate released twice in one cycle");
        state.released = true;
        drop(state);
        self.ready.notify_all();
    }

    /// Block the calling thread until the cycle observed at entry is
    /// released.
    ///
    /// Returns immediately if the gate is already released. If the gate was
    /// re-armed while this thread slept, the awaited release necessarily
    /// happened in between, and the wait returns rather than blocking into
    /// the next cycle.
    pub fn wait(&self) {
        let mut state = self.state.lock();
        let entered = state.cycle;
        while !state.released && state.cycle == entered {
            self.ready.wait(&mut state);
        }
    }

    /// Non-blocking probe of the released flag.
    pub fn is_released(&self) -> bool {
        self.state.lock().released
    }
}
