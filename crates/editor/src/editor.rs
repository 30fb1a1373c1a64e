use std::collections::HashSet;

use serde_json::json;

use atelier_common::{EntityId, Role, Signal, Transform, can_build};
use atelier_input::{BindOptions, Capture, HandleId, InputRouter, Key, PointerButton, priority};
use atelier_world::raycast::project_or_hit;
use atelier_world::{
    BlueprintStore, Entity, EntityStore, History, NetworkChannel, Raycaster, SEND_RATE, SnapIndex,
    UndoEntry, wire,
};

use crate::gizmo::{Gizmo, GizmoMode};

/// Yaw snap increment in degrees.
pub const SNAP_DEGREES: f32 = 5.0;
/// Radius within which a registered snap point captures the drag position.
pub const SNAP_RADIUS: f32 = 1.0;
/// Scroll-to-yaw rate: radians per scroll unit per second.
pub const SCROLL_YAW_RATE: f32 = 1.0;

/// Borrowed collaborators for one editor update. The session owns all of
/// these and lends them per frame; the editor holds no world state itself.
pub struct EditorCtx<'a> {
    pub router: &'a mut InputRouter,
    pub store: &'a mut EntityStore,
    pub blueprints: &'a mut BlueprintStore,
    pub channel: &'a mut dyn NetworkChannel,
    pub raycaster: &'a dyn Raycaster,
    pub snap: &'a SnapIndex,
    pub history: &'a mut History,
    pub signals: &'a mut Vec<Signal>,
}

/// Build-mode state machine.
#[derive(Debug, Clone)]
enum Mode {
    Disabled,
    Idle,
    Selected(Selection),
}

/// Working state for a grabbed entity.
#[derive(Debug, Clone)]
struct Selection {
    entity: EntityId,
    /// Transform at grab time, restored by Escape.
    original: Transform,
    /// Unsnapped yaw accumulator; snapping rounds a copy on apply.
    yaw: f32,
    send_accumulator: f32,
}

/// The build-mode editor. One per world session, bound to one
/// editor-priority control handle shared with the clipboard layer.
pub struct SceneEditor {
    handle: HandleId,
    roles: HashSet<Role>,
    mode: Mode,
    gizmo_mode: GizmoMode,
}

/// While disabled only Tab is consumed; everything else falls through to
/// lower layers.
fn disabled_capture() -> Capture {
    Capture::none().keys([Key::Tab])
}

/// The full build-mode binding set, including the clipboard chords that
/// share this handle.
fn enabled_capture() -> Capture {
    Capture::none()
        .keys([
            Key::Tab,
            Key::Escape,
            Key::Delete,
            Key::Backspace,
            Key::KeyC,
            Key::KeyG,
            Key::KeyP,
            Key::KeyR,
            Key::KeyU,
            Key::KeyV,
            Key::KeyX,
            Key::KeyZ,
        ])
        .buttons([
            PointerButton::Left,
            PointerButton::Right,
            PointerButton::Middle,
        ])
        .scroll()
}

impl SceneEditor {
    /// Bind the editor layer onto the router. Starts disabled.
    pub fn new(router: &mut InputRouter, roles: HashSet<Role>) -> Self {
        let handle = router.bind(BindOptions::at(priority::EDITOR).capture(disabled_capture()));
        Self {
            handle,
            roles,
            mode: Mode::Disabled,
            gizmo_mode: GizmoMode::default(),
        }
    }

    /// The bound control handle, shared with the clipboard layer.
    pub fn handle(&self) -> HandleId {
        self.handle
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self.mode, Mode::Disabled)
    }

    /// The grabbed entity, if any.
    pub fn selected(&self) -> Option<EntityId> {
        match &self.mode {
            Mode::Selected(sel) => Some(sel.entity),
            _ => None,
        }
    }

    pub fn set_roles(&mut self, roles: HashSet<Role>) {
        self.roles = roles;
    }

    pub fn gizmo_mode(&self) -> GizmoMode {
        self.gizmo_mode
    }

    /// Translate → Rotate → Scale → Translate.
    pub fn cycle_gizmo_mode(&mut self) {
        self.gizmo_mode = self.gizmo_mode.next();
    }

    /// The gizmo rig for the current selection, if any.
    pub fn gizmo(&self, store: &EntityStore, blueprints: &BlueprintStore) -> Option<Gizmo> {
        let entity = store.get(self.selected()?)?;
        let blueprint = blueprints.get(entity.blueprint)?;
        Some(Gizmo::for_entity(self.gizmo_mode, entity, blueprint))
    }

    /// Emit the inspect event for an entity (or close the pane with None).
    /// Works regardless of build mode.
    pub fn inspect(&self, entity: Option<EntityId>, signals: &mut Vec<Signal>) {
        signals.push(Signal::Inspect(entity));
    }

    /// Unbind from the router. The editor is inert afterwards.
    pub fn detach(self, router: &mut InputRouter) {
        router.release(self.handle);
    }

    /// One frame of editor logic. Call between `dispatch` and `end_frame`.
    pub fn update(&mut self, dt: f32, ctx: &mut EditorCtx<'_>) {
        let handle = self.handle;

        if ctx.router.key(handle, Key::Tab).pressed {
            self.toggle(ctx);
        }
        if !self.is_enabled() {
            return;
        }

        let pointer = ctx.router.pointer_mirror(handle).normalized;
        let hovered = ctx
            .raycaster
            .raycast(pointer)
            .and_then(|hit| hit.entity)
            .filter(|id| ctx.store.contains(*id));
        let command = ctx.router.modifiers().command();

        // Camera control on middle hold; Ctrl at press grabs a duplicate.
        let middle = ctx.router.button(handle, PointerButton::Middle);
        if middle.pressed {
            ctx.router.claim_camera(handle, true);
            if ctx.router.modifiers().control
                && let Some(id) = hovered
            {
                self.duplicate(id, ctx);
            }
        }
        if middle.released {
            ctx.router.claim_camera(handle, false);
        }

        if ctx.router.key(handle, Key::KeyG).pressed {
            self.cycle_gizmo_mode();
        }
        if ctx.router.key(handle, Key::KeyZ).pressed && command {
            ctx.history.undo(ctx.store, ctx.channel, ctx.signals);
        }

        // Shortcut target: the grabbed entity, else whatever is under the
        // pointer.
        let target = self.selected().or(hovered);
        if let Some(id) = target {
            if ctx.router.key(handle, Key::KeyR).pressed && !command {
                self.duplicate(id, ctx);
            }
            if ctx.router.key(handle, Key::KeyP).pressed {
                self.toggle_pin(id, ctx);
            }
            if ctx.router.key(handle, Key::KeyU).pressed {
                self.unlink(id, ctx);
            }
            let destroy_pressed = (ctx.router.key(handle, Key::KeyX).pressed && !command)
                || ctx.router.key(handle, Key::Delete).pressed
                || ctx.router.key(handle, Key::Backspace).pressed;
            if destroy_pressed {
                self.destroy(id, ctx);
            }
        }

        match self.mode {
            Mode::Disabled => {}
            Mode::Idle => {
                if ctx.router.button(handle, PointerButton::Left).pressed
                    && let Some(id) = hovered
                {
                    self.select(id, ctx);
                }
            }
            Mode::Selected(_) => self.update_selected(dt, ctx),
        }
    }

    /// Flip Disabled/Enabled. Gated by build permission; toggling off while
    /// holding an entity places it first so authority never leaks.
    pub fn toggle(&mut self, ctx: &mut EditorCtx<'_>) {
        if matches!(self.mode, Mode::Disabled) {
            if !can_build(&self.roles) {
                ctx.signals
                    .push(Signal::Toast("You don't have build permission".into()));
                return;
            }
            self.mode = Mode::Idle;
            ctx.router.set_capture(self.handle, enabled_capture());
            ctx.signals.push(Signal::BuildMode(true));
            tracing::debug!("build mode enabled");
        } else {
            if matches!(self.mode, Mode::Selected(_)) {
                self.place(ctx);
            }
            self.mode = Mode::Disabled;
            ctx.router.set_capture(self.handle, disabled_capture());
            ctx.signals.push(Signal::BuildMode(false));
            tracing::debug!("build mode disabled");
        }
    }

    /// Grab an entity: claim authority and start the transform loop.
    ///
    /// If another live client holds `mover`, the grab is refused; claim
    /// arbitration belongs to the network collaborator and we only react to
    /// authority we actually observe.
    pub fn select(&mut self, id: EntityId, ctx: &mut EditorCtx<'_>) {
        if !can_build(&self.roles) {
            ctx.signals
                .push(Signal::Toast("You don't have build permission".into()));
            return;
        }
        let self_id = ctx.channel.client_id();
        let Some(entity) = ctx.store.get_mut(id) else {
            return;
        };
        if let Some(other) = entity.mover
            && other != self_id
        {
            ctx.signals
                .push(Signal::Toast("Someone else is moving that".into()));
            return;
        }
        entity.mover = Some(self_id);
        let original = entity.transform;
        ctx.channel
            .send(wire::ENTITY_MODIFIED, json!({ "id": id, "mover": self_id }));
        self.mode = Mode::Selected(Selection {
            entity: id,
            original,
            yaw: original.yaw(),
            send_accumulator: 0.0,
        });
        tracing::debug!(entity = %id.0, "claimed authority");
    }

    /// Place the grabbed entity: release authority and send the one final
    /// authoritative modify message.
    fn place(&mut self, ctx: &mut EditorCtx<'_>) {
        let Mode::Selected(sel) = &self.mode else {
            return;
        };
        let id = sel.entity;
        self.mode = Mode::Idle;
        let Some(entity) = ctx.store.get_mut(id) else {
            return;
        };
        entity.mover = None;
        ctx.channel.send(
            wire::ENTITY_MODIFIED,
            json!({
                "id": id,
                "position": entity.transform.position,
                "quaternion": entity.transform.rotation,
                "mover": null,
                "state": entity.state,
            }),
        );
        tracing::debug!(entity = %id.0, "placed entity");
    }

    /// Escape: restore the grab-time transform, then release as a placement.
    fn cancel(&mut self, ctx: &mut EditorCtx<'_>) {
        let Mode::Selected(sel) = &self.mode else {
            return;
        };
        let original = sel.original;
        let id = sel.entity;
        if let Some(entity) = ctx.store.get_mut(id) {
            entity.transform = original;
        }
        self.place(ctx);
    }

    fn update_selected(&mut self, dt: f32, ctx: &mut EditorCtx<'_>) {
        let handle = self.handle;
        let Mode::Selected(sel) = &self.mode else {
            return;
        };
        let id = sel.entity;

        // Forced deselection: entity gone, or authority stolen by another
        // client. Authority is already lost, so no placement message.
        let self_id = ctx.channel.client_id();
        match ctx.store.get(id) {
            None => {
                tracing::debug!(entity = %id.0, "selected entity destroyed, deselecting");
                self.mode = Mode::Idle;
                return;
            }
            Some(entity) if entity.mover != Some(self_id) => {
                tracing::debug!(entity = %id.0, "authority lost, deselecting");
                self.mode = Mode::Idle;
                return;
            }
            Some(_) => {}
        }

        if ctx.router.key(handle, Key::Escape).pressed {
            self.cancel(ctx);
            return;
        }
        if ctx.router.button(handle, PointerButton::Left).pressed {
            self.place(ctx);
            return;
        }

        // Continuous transform: raycast target point plus scroll yaw.
        let pointer = ctx.router.pointer_mirror(handle).normalized;
        let mut position = project_or_hit(ctx.raycaster, pointer);
        let scroll = ctx.router.scroll(handle);
        let override_held = ctx.router.modifiers().control;

        let Mode::Selected(sel) = &mut self.mode else {
            return;
        };
        sel.yaw += scroll * SCROLL_YAW_RATE * dt;
        let mut yaw = sel.yaw;
        if !override_held {
            let step = SNAP_DEGREES.to_radians();
            yaw = (yaw / step).round() * step;
            if let Some(point) = ctx.snap.nearest_within(position, SNAP_RADIUS) {
                position = point;
            }
        }

        if let Some(entity) = ctx.store.get_mut(id) {
            entity.transform.position = position;
            entity.transform = entity.transform.with_yaw(yaw);

            // Throttled diff: bounded by SEND_RATE regardless of frame rate.
            sel.send_accumulator += dt;
            if sel.send_accumulator >= SEND_RATE {
                sel.send_accumulator -= SEND_RATE;
                ctx.channel.send(
                    wire::ENTITY_MODIFIED,
                    json!({
                        "id": id,
                        "position": entity.transform.position,
                        "quaternion": entity.transform.rotation,
                    }),
                );
            }
        }
    }

    /// Spawn a copy of an entity and grab it. Unique blueprints are forked
    /// first so the copy is independent.
    pub fn duplicate(&mut self, id: EntityId, ctx: &mut EditorCtx<'_>) {
        if !can_build(&self.roles) {
            ctx.signals
                .push(Signal::Toast("You don't have build permission".into()));
            return;
        }
        let Some(source) = ctx.store.get(id) else {
            return;
        };
        let transform = source.transform;
        let state = source.state.clone();
        let mut blueprint_id = source.blueprint;

        if ctx.blueprints.get(blueprint_id).is_some_and(|b| b.unique)
            && let Some(forked) = ctx.blueprints.fork(blueprint_id)
        {
            blueprint_id = forked;
            if let Some(blueprint) = ctx.blueprints.get(forked) {
                let payload = serde_json::to_value(blueprint).unwrap_or_default();
                ctx.channel.send(wire::BLUEPRINT_ADDED, payload);
            }
        }

        let mut entity = Entity::new(blueprint_id, transform);
        entity.state = state;
        entity.mover = Some(ctx.channel.client_id());
        let payload = entity.wire_payload();
        let new_id = ctx.store.spawn(entity);
        ctx.channel.send(wire::ENTITY_ADDED, payload);
        ctx.history.push(UndoEntry::Create { entity: new_id });

        self.mode = Mode::Selected(Selection {
            entity: new_id,
            original: transform,
            yaw: transform.yaw(),
            send_accumulator: 0.0,
        });
        tracing::debug!(source = %id.0, copy = %new_id.0, "duplicated entity");
    }

    /// Destroy an entity. Pinned entities are refused; a full snapshot goes
    /// on the undo stack first.
    pub fn destroy(&mut self, id: EntityId, ctx: &mut EditorCtx<'_>) {
        if !can_build(&self.roles) {
            ctx.signals
                .push(Signal::Toast("You don't have build permission".into()));
            return;
        }
        let Some(entity) = ctx.store.get(id) else {
            return;
        };
        if entity.pinned {
            ctx.signals
                .push(Signal::Toast("That item is pinned".into()));
            return;
        }
        if self.selected() == Some(id) {
            // Authority dies with the entity; no placement message.
            self.mode = Mode::Idle;
        }
        let Some(entity) = ctx.store.destroy(id) else {
            return;
        };
        ctx.history.push(UndoEntry::Delete {
            snapshot: entity.snapshot(),
        });
        ctx.channel
            .send(wire::ENTITY_REMOVED, json!({ "id": id }));
    }

    /// Pin/unpin toggle. Pinned entities cannot be destroyed.
    pub fn toggle_pin(&mut self, id: EntityId, ctx: &mut EditorCtx<'_>) {
        if !can_build(&self.roles) {
            return;
        }
        let Some(entity) = ctx.store.get_mut(id) else {
            return;
        };
        entity.pinned = !entity.pinned;
        let pinned = entity.pinned;
        ctx.channel.send(
            wire::ENTITY_MODIFIED,
            json!({ "id": id, "pinned": pinned }),
        );
        ctx.signals.push(Signal::Toast(
            if pinned { "Pinned" } else { "Unpinned" }.into(),
        ));
    }

    /// Fork a private copy of the entity's blueprint and reassign it.
    pub fn unlink(&mut self, id: EntityId, ctx: &mut EditorCtx<'_>) {
        if !can_build(&self.roles) {
            return;
        }
        let Some(entity) = ctx.store.get(id) else {
            return;
        };
        let Some(forked) = ctx.blueprints.fork(entity.blueprint) else {
            return;
        };
        if let Some(blueprint) = ctx.blueprints.get(forked) {
            let payload = serde_json::to_value(blueprint).unwrap_or_default();
            ctx.channel.send(wire::BLUEPRINT_ADDED, payload);
        }
        if let Some(entity) = ctx.store.get_mut(id) {
            entity.blueprint = forked;
        }
        ctx.channel.send(
            wire::ENTITY_MODIFIED,
            json!({ "id": id, "blueprint": forked }),
        );
        ctx.signals.push(Signal::Toast("Unlinked".into()));
    }
}
