//! Build-mode scene editor.
//!
//! `SceneEditor` runs inside the host update loop: it polls a bound control
//! handle, walks the `Disabled → Idle → Selected` state machine, computes
//! the dragged transform from raycasts plus snapping, and pushes throttled
//! diffs to the network channel.
//!
//! # Invariants
//! - The entity transform is only mutated locally while `mover == self`.
//! - Placement sends exactly one final authority-clear message; forced
//!   deselection (authority stolen, entity destroyed) sends none.
//! - Snapping applies unless the override modifier is held.

pub mod editor;
pub mod gizmo;

pub use editor::{EditorCtx, SCROLL_YAW_RATE, SNAP_DEGREES, SNAP_RADIUS, SceneEditor};
pub use gizmo::{Gizmo, GizmoMode};
