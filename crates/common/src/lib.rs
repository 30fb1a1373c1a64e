//! Shared types for the atelier editing subsystem.
//!
//! # Invariants
//! - Ids are opaque v4 uuids; equality is the only meaningful comparison.
//! - `Signal` is the one-way channel to UI layers; nothing in here calls back.

pub mod role;
pub mod signal;
pub mod types;

pub use role::{Role, can_build};
pub use signal::{MenuAction, MenuDescriptor, Signal};
pub use types::{BlueprintId, ClientId, EntityId, Transform};
