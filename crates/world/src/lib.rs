//! World collaborator surface for the editing subsystem.
//!
//! The editor and clipboard layers mutate shared entities through the types
//! here: a `BTreeMap` entity store carrying the single-writer authority
//! fields, the blueprint registry, content-addressed asset plumbing, the
//! network channel trait plus a recording impl, raycast and snap-index
//! collaborators, and the bounded undo history.
//!
//! # Invariants
//! - At most one client id occupies an entity's `mover` at any time; only
//!   that client mutates the transform locally.
//! - The undo history never exceeds [`history::HISTORY_LIMIT`] entries;
//!   oldest evicted first.
//! - The snap index is read-only for editing consumers.

pub mod assets;
pub mod blueprint;
pub mod entity;
pub mod history;
pub mod network;
pub mod raycast;
pub mod snap;

pub use assets::{AssetCache, AssetError, AssetFetcher, AssetFile, AssetKind, MemoryFetcher};
pub use blueprint::{Blueprint, BlueprintStore};
pub use entity::{Entity, EntityStore, StateMap};
pub use history::{EntitySnapshot, HISTORY_LIMIT, History, UndoEntry};
pub use network::{NetworkChannel, NetworkError, RecordedMessage, RecordingChannel, SEND_RATE, wire};
pub use raycast::{MAX_PROJECT_DISTANCE, PlaneRaycaster, Ray, RayHit, Raycaster};
pub use snap::SnapIndex;
