use glam::Vec2;
use std::collections::HashMap;

/// Per-key/button state mirrored into each control handle.
///
/// `pressed` and `released` are edges valid for exactly one frame; the
/// router clears them in `end_frame`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonState {
    pub down: bool,
    pub pressed: bool,
    pub released: bool,
}

/// Pointer-lock lifecycle. `Pending` means the host was asked for exclusive
/// capture but has not confirmed; hosts may silently refuse and leave us
/// here forever, which callers must tolerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockState {
    #[default]
    Unlocked,
    Pending,
    Locked,
}

/// Canonical pointer state owned by the router. Mutated once per raw event,
/// consumed once per frame; `delta` is zeroed after each frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerState {
    pub lock: LockState,
    pub should_lock: bool,
    /// Normalized coordinates in [0,1]².
    pub normalized: Vec2,
    pub position: Vec2,
    pub delta: Vec2,
}

impl PointerState {
    pub fn locked(&self) -> bool {
        self.lock == LockState::Locked
    }
}

/// Per-handle mirror of pointer movement. Only updated while dispatch
/// reaches the handle, so a consuming higher-priority layer hides movement
/// from the layers below it.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerMirror {
    pub position: Vec2,
    pub normalized: Vec2,
    pub delta: Vec2,
}

/// One active touch. Created on touch-start, removed on touch-end; `delta`
/// accumulates between moves and is cleared post-frame like the pointer
/// delta.
#[derive(Debug, Clone, Copy)]
pub struct TouchPoint {
    pub position: Vec2,
    pub prev_position: Vec2,
    pub delta: Vec2,
}

/// Keyed map of live touches.
pub type TouchState = HashMap<u64, TouchPoint>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_state_defaults_clear() {
        let b = ButtonState::default();
        assert!(!b.down && !b.pressed && !b.released);
    }

    #[test]
    fn lock_state_defaults_unlocked() {
        let p = PointerState::default();
        assert_eq!(p.lock, LockState::Unlocked);
        assert!(!p.locked());
        assert!(!p.should_lock);
    }
}
