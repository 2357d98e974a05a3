//! Single-slot trigger signal shared across tasks.
//!
//! [`TriggerSignal`] hands a "start dispensing" event from two producer
//! tasks (the Bluetooth handler and the cloud cycle) to the one dispenser
//! task. It is a coalescing single-slot signal, not a queue: the physical
//! dispenser cannot usefully double-fire while already dispensing, so
//! raising while a trigger is pending is a silent no-op.
//!
//! # Example
//!
//! ```rust
//! use rs_dispenser::TriggerSignal;
//!
//! let signal = TriggerSignal::new();
//!
//! signal.raise();
//! signal.raise(); // coalesced, still one pending trigger
//!
//! assert!(signal.try_consume());
//! assert!(!signal.try_consume()); // cleared by the first consume
//! ```

use std::sync::{Condvar, Mutex};

/// Coalescing single-slot signal.
///
/// At most one trigger is pending at any time, regardless of how many
/// [`raise`](Self::raise) calls race. Share it between tasks with
/// `Arc<TriggerSignal>`.
#[derive(Debug, Default)]
pub struct TriggerSignal {
    pending: Mutex<bool>,
    raised: Condvar,
}

impl TriggerSignal {
    /// Create a signal in the clear state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the signal to pending; a no-op if already pending.
    ///
    /// Callable from any task. Wakes the consumer if it is blocked in
    /// [`consume_blocking`](Self::consume_blocking).
    pub fn raise(&self) {
        let mut pending = self.pending.lock().unwrap();
        if !*pending {
            *pending = true;
            self.raised.notify_one();
        }
    }

    /// Block until the signal is pending, then atomically clear it.
    ///
    /// This is the single consumption point; exactly one task should call
    /// it.
    pub fn consume_blocking(&self) {
        let mut pending = self.pending.lock().unwrap();
        while !*pending {
            pending = self.raised.wait(pending).unwrap();
        }
        *pending = false;
    }

    /// Clear and return `true` if pending, without blocking.
    pub fn try_consume(&self) -> bool {
        let mut pending = self.pending.lock().unwrap();
        let was_pending = *pending;
        *pending = false;
        was_pending
    }
}
