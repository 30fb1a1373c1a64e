use glam::Vec2;
use std::collections::{HashMap, HashSet};

use crate::event::{InputEvent, Key, Modifiers, PointerButton};
use crate::state::{ButtonState, LockState, PointerMirror, PointerState, TouchPoint, TouchState};

/// Well-known priority bands. Callers may bind at any value; these keep the
/// common layers consistently ordered.
pub mod priority {
    /// Avatar locomotion and camera defaults.
    pub const PLAYER: i32 = 0;
    /// In-world app scripts.
    pub const APP: i32 = 50;
    /// Build-mode editor and clipboard layer.
    pub const EDITOR: i32 = 100;
    /// System overlays that pre-empt everything.
    pub const SYSTEM: i32 = 200;
}

/// Identifier for a bound control handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleId(pub u64);

/// Declarative consumption set for a handle. An event matching the set is
/// consumed at that handle and never reaches lower priorities. Adjusted at
/// runtime via [`InputRouter::set_capture`] (e.g. the editor only captures
/// its shortcuts while build mode is on).
#[derive(Debug, Clone, Default)]
pub struct Capture {
    keys: HashSet<Key>,
    buttons: HashSet<PointerButton>,
    scroll: bool,
    pointer_move: bool,
    touch: bool,
}

impl Capture {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn keys(mut self, keys: impl IntoIterator<Item = Key>) -> Self {
        self.keys.extend(keys);
        self
    }

    pub fn buttons(mut self, buttons: impl IntoIterator<Item = PointerButton>) -> Self {
        self.buttons.extend(buttons);
        self
    }

    pub fn scroll(mut self) -> Self {
        self.scroll = true;
        self
    }

    pub fn pointer_move(mut self) -> Self {
        self.pointer_move = true;
        self
    }

    pub fn touch(mut self) -> Self {
        self.touch = true;
        self
    }

    fn matches(&self, event: &InputEvent) -> bool {
        match event {
            InputEvent::KeyDown { key, .. } | InputEvent::KeyUp { key, .. } => {
                self.keys.contains(key)
            }
            InputEvent::PointerDown { button, .. } | InputEvent::PointerUp { button, .. } => {
                self.buttons.contains(button)
            }
            InputEvent::PointerMove { .. } => self.pointer_move,
            InputEvent::Scroll { .. } => self.scroll,
            InputEvent::TouchStart { .. }
            | InputEvent::TouchMove { .. }
            | InputEvent::TouchEnd { .. } => self.touch,
            InputEvent::Blur | InputEvent::PointerLockChanged(_) => false,
        }
    }
}

/// Options for [`InputRouter::bind`].
#[derive(Debug, Clone, Default)]
pub struct BindOptions {
    pub priority: i32,
    pub capture: Capture,
}

impl BindOptions {
    pub fn at(priority: i32) -> Self {
        Self {
            priority,
            capture: Capture::none(),
        }
    }

    pub fn capture(mut self, capture: Capture) -> Self {
        self.capture = capture;
        self
    }
}

/// One record in the priority-sorted handle list.
struct HandleRecord {
    id: HandleId,
    priority: i32,
    /// Bind order, breaks priority ties (earlier bind dispatches first).
    seq: u64,
    capture: Capture,
    keys: HashMap<Key, ButtonState>,
    buttons: HashMap<PointerButton, ButtonState>,
    pointer: PointerMirror,
    scroll: f32,
    touches: TouchState,
    camera_claim: bool,
}

impl HandleRecord {
    fn new(id: HandleId, priority: i32, seq: u64, capture: Capture) -> Self {
        Self {
            id,
            priority,
            seq,
            capture,
            keys: HashMap::new(),
            buttons: HashMap::new(),
            pointer: PointerMirror::default(),
            scroll: 0.0,
            touches: TouchState::new(),
            camera_claim: false,
        }
    }

    fn apply(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::KeyDown { key, .. } => {
                let state = self.keys.entry(key).or_default();
                // Host key-repeat fires repeated downs; only the first is an edge.
                if !state.down {
                    state.down = true;
                    state.pressed = true;
                }
            }
            InputEvent::KeyUp { key, .. } => {
                if let Some(state) = self.keys.get_mut(&key)
                    && state.down
                {
                    state.down = false;
                    state.released = true;
                }
            }
            InputEvent::PointerDown { button, .. } => {
                let state = self.buttons.entry(button).or_default();
                if !state.down {
                    state.down = true;
                    state.pressed = true;
                }
            }
            InputEvent::PointerUp { button, .. } => {
                if let Some(state) = self.buttons.get_mut(&button)
                    && state.down
                {
                    state.down = false;
                    state.released = true;
                }
            }
            InputEvent::PointerMove {
                position,
                normalized,
                delta,
            } => {
                self.pointer.position = position;
                self.pointer.normalized = normalized;
                self.pointer.delta += delta;
            }
            InputEvent::Scroll { delta } => {
                self.scroll += delta;
            }
            InputEvent::TouchStart { id, position } => {
                self.touches.insert(
                    id,
                    TouchPoint {
                        position,
                        prev_position: position,
                        delta: Vec2::ZERO,
                    },
                );
            }
            InputEvent::TouchMove { id, position } => {
                if let Some(touch) = self.touches.get_mut(&id) {
                    touch.delta += position - touch.position;
                    touch.position = position;
                }
            }
            InputEvent::TouchEnd { id } => {
                self.touches.remove(&id);
            }
            InputEvent::Blur | InputEvent::PointerLockChanged(_) => {}
        }
    }

    fn force_release(&mut self) {
        for state in self.keys.values_mut() {
            if state.down {
                state.down = false;
                state.released = true;
            }
        }
        for state in self.buttons.values_mut() {
            if state.down {
                state.down = false;
                state.released = true;
            }
        }
    }

    fn clear_frame(&mut self) {
        for state in self.keys.values_mut() {
            state.pressed = false;
            state.released = false;
        }
        for state in self.buttons.values_mut() {
            state.pressed = false;
            state.released = false;
        }
        self.pointer.delta = Vec2::ZERO;
        self.scroll = 0.0;
        for touch in self.touches.values_mut() {
            touch.prev_position = touch.position;
            touch.delta = Vec2::ZERO;
        }
    }
}

/// Owns raw input state and the prioritized handle list.
///
/// One router per world session; consumers hold a [`HandleId`] and poll
/// their mirrored state each frame.
pub struct InputRouter {
    handles: Vec<HandleRecord>,
    next_id: u64,
    next_seq: u64,
    pointer: PointerState,
    touches: TouchState,
    modifiers: Modifiers,
}

impl InputRouter {
    pub fn new() -> Self {
        Self {
            handles: Vec::new(),
            next_id: 0,
            next_seq: 0,
            pointer: PointerState::default(),
            touches: TouchState::new(),
            modifiers: Modifiers::default(),
        }
    }

    /// Insert a new handle, keeping the list sorted by descending priority.
    /// Equal priorities keep bind order. Never fails.
    pub fn bind(&mut self, options: BindOptions) -> HandleId {
        let id = HandleId(self.next_id);
        self.next_id += 1;
        let seq = self.next_seq;
        self.next_seq += 1;

        let record = HandleRecord::new(id, options.priority, seq, options.capture);
        let at = self
            .handles
            .iter()
            .position(|h| h.priority < options.priority)
            .unwrap_or(self.handles.len());
        self.handles.insert(at, record);
        tracing::debug!(handle = id.0, priority = options.priority, "bound control handle");
        id
    }

    /// Remove a handle. Releasing an unknown id is a no-op.
    pub fn release(&mut self, id: HandleId) {
        self.handles.retain(|h| h.id != id);
        tracing::debug!(handle = id.0, "released control handle");
    }

    /// Replace a handle's capture set.
    pub fn set_capture(&mut self, id: HandleId, capture: Capture) {
        if let Some(record) = self.record_mut(id) {
            record.capture = capture;
        }
    }

    /// Route one raw event: update canonical state, then walk handles
    /// high→low priority, stopping at the first whose capture set matches.
    /// Returns whether the event was consumed.
    pub fn dispatch(&mut self, event: &InputEvent) -> bool {
        match *event {
            InputEvent::Blur => {
                tracing::debug!("window blur, force-releasing all input");
                self.force_release_all();
                return false;
            }
            InputEvent::PointerLockChanged(granted) => {
                if granted {
                    self.pointer.lock = LockState::Locked;
                } else {
                    // Host-driven loss must not leave should_lock stale.
                    self.pointer.lock = LockState::Unlocked;
                    self.pointer.should_lock = false;
                }
                return false;
            }
            InputEvent::KeyUp { key, modifiers } if key.is_modifier() => {
                self.modifiers = modifiers;
                // A modifier release with no recorded down means the host
                // swallowed events while the modifier was held; everything
                // still marked down may be stuck.
                let matched = self
                    .handles
                    .iter()
                    .any(|h| h.keys.get(&key).is_some_and(|s| s.down));
                if !matched {
                    tracing::debug!(?key, "unmatched modifier release, force-releasing all input");
                    self.force_release_all();
                    return false;
                }
            }
            InputEvent::KeyDown { modifiers, .. }
            | InputEvent::KeyUp { modifiers, .. }
            | InputEvent::PointerDown { modifiers, .. }
            | InputEvent::PointerUp { modifiers, .. } => {
                self.modifiers = modifiers;
            }
            InputEvent::PointerMove {
                position,
                normalized,
                delta,
            } => {
                self.pointer.position = position;
                self.pointer.normalized = normalized;
                self.pointer.delta += delta;
            }
            InputEvent::TouchStart { id, position } => {
                self.touches.insert(
                    id,
                    TouchPoint {
                        position,
                        prev_position: position,
                        delta: Vec2::ZERO,
                    },
                );
            }
            InputEvent::TouchMove { id, position } => {
                if let Some(touch) = self.touches.get_mut(&id) {
                    touch.delta += position - touch.position;
                    touch.position = position;
                }
            }
            InputEvent::TouchEnd { id } => {
                self.touches.remove(&id);
            }
            InputEvent::Scroll { .. } => {}
        }

        for record in &mut self.handles {
            record.apply(event);
            if record.capture.matches(event) {
                tracing::trace!(handle = record.id.0, ?event, "event consumed");
                return true;
            }
        }
        false
    }

    /// Clear per-frame edges and deltas. Call once per frame after all
    /// consumers have polled.
    pub fn end_frame(&mut self) {
        self.pointer.delta = Vec2::ZERO;
        for touch in self.touches.values_mut() {
            touch.prev_position = touch.position;
            touch.delta = Vec2::ZERO;
        }
        for record in &mut self.handles {
            record.clear_frame();
        }
    }

    /// Force-release every down key and button across all handles,
    /// generating release edges. The stuck-input safety net.
    pub fn force_release_all(&mut self) {
        for record in &mut self.handles {
            record.force_release();
        }
        self.modifiers = Modifiers::default();
    }

    // --- pointer lock ---

    /// Request exclusive pointer capture from the host. The request may be
    /// silently refused; `locked` only flips when the host confirms via a
    /// `PointerLockChanged` event.
    pub fn lock_pointer(&mut self) {
        self.pointer.should_lock = true;
        if self.pointer.lock == LockState::Unlocked {
            self.pointer.lock = LockState::Pending;
        }
    }

    /// Drop the lock request. If the host already granted capture, it stays
    /// granted until the host reports the exit.
    pub fn unlock_pointer(&mut self) {
        self.pointer.should_lock = false;
        if self.pointer.lock == LockState::Pending {
            self.pointer.lock = LockState::Unlocked;
        }
    }

    /// Whether the host should be holding (or acquiring) pointer capture.
    pub fn wants_pointer_lock(&self) -> bool {
        self.pointer.should_lock
    }

    // --- camera claim ---

    /// Mark or clear a handle's claim on camera output.
    pub fn claim_camera(&mut self, id: HandleId, claim: bool) {
        if let Some(record) = self.record_mut(id) {
            record.camera_claim = claim;
        }
    }

    /// Resolve the camera owner for this frame: the highest-priority
    /// claimant wins; the render rig syncs its pose from that handle only.
    pub fn camera_owner(&self) -> Option<HandleId> {
        self.handles.iter().find(|h| h.camera_claim).map(|h| h.id)
    }

    // --- per-handle state queries ---

    pub fn key(&self, id: HandleId, key: Key) -> ButtonState {
        self.record(id)
            .and_then(|r| r.keys.get(&key).copied())
            .unwrap_or_default()
    }

    pub fn button(&self, id: HandleId, button: PointerButton) -> ButtonState {
        self.record(id)
            .and_then(|r| r.buttons.get(&button).copied())
            .unwrap_or_default()
    }

    pub fn pointer_mirror(&self, id: HandleId) -> PointerMirror {
        self.record(id).map(|r| r.pointer).unwrap_or_default()
    }

    pub fn scroll(&self, id: HandleId) -> f32 {
        self.record(id).map(|r| r.scroll).unwrap_or(0.0)
    }

    pub fn handle_touches(&self, id: HandleId) -> Option<&TouchState> {
        self.record(id).map(|r| &r.touches)
    }

    // --- canonical state ---

    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    pub fn touches(&self) -> &TouchState {
        &self.touches
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn handle_count(&self) -> usize {
        self.handles.len()
    }

    /// Priorities in dispatch order, for diagnostics and tests.
    pub fn handle_priorities(&self) -> Vec<i32> {
        self.handles.iter().map(|h| h.priority).collect()
    }

    /// Bind sequence numbers in dispatch order, for diagnostics and tests.
    pub fn handle_order(&self) -> Vec<(i32, u64)> {
        self.handles.iter().map(|h| (h.priority, h.seq)).collect()
    }

    fn record(&self, id: HandleId) -> Option<&HandleRecord> {
        self.handles.iter().find(|h| h.id == id)
    }

    fn record_mut(&mut self, id: HandleId) -> Option<&mut HandleRecord> {
        self.handles.iter_mut().find(|h| h.id == id)
    }
}

impl Default for InputRouter {
    fn default() -> Self {
        Self::new()
    }
}
