//! Layered input routing for the editing subsystem.
//!
//! Raw pointer/keyboard/touch/scroll events enter through
//! [`InputRouter::dispatch`] and are walked down a list of control handles
//! sorted by descending priority. A handle whose capture set matches the
//! event consumes it; lower handles see nothing for that dispatch. Consumers
//! poll their handle's mirrored state once per frame and the router clears
//! per-frame edges in [`InputRouter::end_frame`].
//!
//! # Invariants
//! - The handle list is non-increasing in priority under any interleaving of
//!   bind/release calls; ties keep bind order.
//! - `bind` and `release` never fail.
//! - Pointer and touch deltas are written by events and zeroed once per frame.

pub mod event;
pub mod router;
pub mod state;

pub use event::{InputEvent, Key, Modifiers, PointerButton};
pub use router::{BindOptions, Capture, HandleId, InputRouter, priority};
pub use state::{ButtonState, LockState, PointerMirror, PointerState, TouchPoint};
