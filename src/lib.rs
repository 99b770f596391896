//! `Ringcast` - Broadcast Ring for Live Stream Distribution
//!
//! A fixed-capacity circular buffer that distributes a continuous sequence of
//! time-stamped records from exactly one producer to any number of
//! independent consumers, with bounded memory, no locking on the hot path,
//! and bounded staleness instead of backpressure.
//!
//! This is the synchronization core of a live-data distribution engine, e.g.
//! streaming of audio/video frames: the producer must never block on slow
//! consumers, consumers must never see a slot before it is fully written, and
//! a supervisor can forcibly unblock every waiting consumer when the producer
//! stalls or disconnects.
//!
//! ## Features
//!
//! - **Never blocks the producer**: slow consumers are lapped, not waited on
//! - **Zero-allocation steady state**: slots and scratch buffers are reused,
//!   never reallocated
//! - **Per-slot completion signals**: a consumer observing "ready" always
//!   sees the fully written record
//! - **Race-safe disposal**: a tri-state compare-and-swap protocol lets a
//!   supervisor terminate the stream concurrently with an in-flight write,
//!   releasing every slot exactly once
//! - **Independent consumers**: each reader owns its cursor; blocking is
//!   scoped to the calling thread only
//!
//! ## Quick Start
//!
//! ```rust
//! use ringcast::Publisher;
//! use std::thread;
//!
//! // Four slots: the retention window of the stream.
//! let mut publisher = Publisher::<String>::new(2).unwrap();
//! let mut reader = publisher.reader();
//!
//! // A reader blocks until the record it points at is published.
//! let consumer = thread::spawn(move || {
//!     assert_eq!(reader.read_next(), "frame-1");
//!     assert_eq!(reader.read_next(), "frame-2");
//! });
//!
//! for frame in ["frame-1", "frame-2"] {
//!     let record = publisher.record_mut();
//!     record.clear();
//!     record.push_str(frame);
//!     publisher.advance();
//! }
//!
//! consumer.join().unwrap();
//! ```
//!
//! ## Architecture
//!
//! - [`ReadyGate`]: re-armable single-shot broadcast signal, one per slot
//! - `Slot`: one cell holding a record, a reusable scratch buffer, and the
//!   last-update timestamp
//! - [`Publisher`]: the single producer handle; owns the write cursor and
//!   the disposal state
//! - [`Reader`]: a consumer handle; shares the slot array, owns its cursor
//! - [`Disposer`]: a supervisor handle restricted to disposal and stall
//!   checks
//!
//! ## Staleness model
//!
//! There is no backpressure anywhere: if the producer wraps the ring before
//! a consumer finishes reading an old slot, that consumer silently observes
//! the overwritten record. The ring capacity (`2^exponent`) is the only
//! lever bounding staleness - a deliberate latency-over-completeness
//! trade-off for live data. Consumers needing replay or guaranteed delivery
//! belong on a different primitive.

pub mod ring;

// Re-export the main types for convenience
pub use ring::{
    slot_count,

    // Supervisor side
    Disposer,
    // Producer side
    Publisher,
    // Consumer side
    Reader,

    // Completion signal
    ReadyGate,

    // Error types
    RingError,

    Result,

    // Constants
    MAX_SIZE_EXPONENT,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the version of the `Ringcast` library
#[must_use]
pub fn version() -> &'static str {
    VERSION
}
