use std::collections::HashSet;

use serde_json::json;

use atelier_common::{
    EntityId, MenuAction, MenuDescriptor, Role, Signal, Transform, can_build,
};
use atelier_input::{HandleId, InputRouter, Key, PointerButton};
use atelier_world::raycast::project_or_hit;
use atelier_world::{
    AssetCache, AssetError, AssetFetcher, AssetFile, AssetKind, Blueprint, BlueprintStore, Entity,
    EntityStore, History, NetworkChannel, NetworkError, Raycaster, UndoEntry, assets, wire,
};

use crate::backend::{ClipboardBackend, ClipboardError};
use crate::document::ClipboardDocument;

/// A right-click held longer than this opens camera/drag behavior elsewhere,
/// not the context menu.
pub const QUICK_CLICK_SECONDS: f32 = 0.3;
/// Pointer travel beyond this between right press and release cancels the
/// context menu.
pub const QUICK_CLICK_TRAVEL_PX: f32 = 30.0;

/// Borrowed collaborators for one clipboard update.
pub struct ClipboardCtx<'a> {
    pub router: &'a InputRouter,
    pub store: &'a mut EntityStore,
    pub blueprints: &'a mut BlueprintStore,
    pub channel: &'a mut dyn NetworkChannel,
    pub raycaster: &'a dyn Raycaster,
    pub fetcher: &'a dyn AssetFetcher,
    pub cache: &'a mut AssetCache,
    pub history: &'a mut History,
    pub signals: &'a mut Vec<Signal>,
    /// The editor's current selection, preferred over the hovered entity as
    /// the chord target.
    pub selected: Option<EntityId>,
}

/// An in-flight right press, tracked until release to distinguish a quick
/// context click from a camera drag.
#[derive(Debug, Clone, Copy)]
struct RightPress {
    elapsed: f32,
    travel: f32,
}

/// Clipboard and context-menu layer. Shares the editor's control handle;
/// the editor owns the capture set, this layer only polls mirrored state.
pub struct ClipboardHistory {
    handle: HandleId,
    roles: HashSet<Role>,
    /// Absolute base URL for the world's hosted assets.
    asset_domain: String,
    /// Clipboard tiers, tried in order. Below all of them sits the
    /// in-process last-copied buffer, which cannot fail.
    backends: Vec<Box<dyn ClipboardBackend>>,
    buffer: Option<String>,
    right_press: Option<RightPress>,
    menu_open: bool,
}

impl ClipboardHistory {
    pub fn new(
        handle: HandleId,
        roles: HashSet<Role>,
        asset_domain: impl Into<String>,
        backends: Vec<Box<dyn ClipboardBackend>>,
    ) -> Self {
        Self {
            handle,
            roles,
            asset_domain: asset_domain.into(),
            backends,
            buffer: None,
            right_press: None,
            menu_open: false,
        }
    }

    pub fn set_roles(&mut self, roles: HashSet<Role>) {
        self.roles = roles;
    }

    /// One frame of clipboard logic. The context menu works in any mode;
    /// the copy/cut/paste chords only while `enabled` (build mode).
    pub fn update(&mut self, dt: f32, enabled: bool, ctx: &mut ClipboardCtx<'_>) {
        let handle = self.handle;
        let pointer = ctx.router.pointer_mirror(handle);
        let hovered = ctx
            .raycaster
            .raycast(pointer.normalized)
            .and_then(|hit| hit.entity)
            .filter(|id| ctx.store.contains(*id));

        self.track_right_click(dt, hovered, ctx);

        if self.menu_open
            && (ctx.router.button(handle, PointerButton::Left).pressed
                || ctx.router.key(handle, Key::Escape).pressed)
        {
            self.close_menu(ctx.signals);
        }

        if enabled && ctx.router.modifiers().command() {
            let target = ctx.selected.or(hovered);
            if ctx.router.key(handle, Key::KeyC).pressed
                && let Some(id) = target
            {
                self.copy(id, ctx);
            }
            if ctx.router.key(handle, Key::KeyX).pressed
                && let Some(id) = target
            {
                self.cut(id, ctx);
            }
            if ctx.router.key(handle, Key::KeyV).pressed {
                self.paste(ctx);
            }
        }
    }

    fn track_right_click(&mut self, dt: f32, hovered: Option<EntityId>, ctx: &mut ClipboardCtx<'_>) {
        let right = ctx.router.button(self.handle, PointerButton::Right);
        let delta = ctx.router.pointer_mirror(self.handle).delta;

        if right.pressed {
            self.right_press = Some(RightPress {
                elapsed: 0.0,
                travel: 0.0,
            });
        }
        if let Some(press) = &mut self.right_press {
            press.elapsed += dt;
            press.travel += delta.length();
        }
        if right.released
            && let Some(press) = self.right_press.take()
            && press.elapsed < QUICK_CLICK_SECONDS
            && press.travel < QUICK_CLICK_TRAVEL_PX
            && let Some(id) = hovered
        {
            self.open_menu(id, ctx);
        }
    }

    /// Build and emit the context menu descriptor for an entity. Actions
    /// are gated by role and by upload completion.
    fn open_menu(&mut self, id: EntityId, ctx: &mut ClipboardCtx<'_>) {
        let Some(entity) = ctx.store.get(id) else {
            return;
        };
        let mut actions = vec![MenuAction::Inspect];
        if entity.uploader.is_none() {
            actions.push(MenuAction::CopyLink);
            actions.push(MenuAction::CopyJson);
            if can_build(&self.roles) {
                actions.extend([
                    MenuAction::Move,
                    MenuAction::Duplicate,
                    MenuAction::Unlink,
                    MenuAction::Destroy,
                ]);
            }
        }
        tracing::debug!(entity = %id.0, count = actions.len(), "context menu opened");
        ctx.signals
            .push(Signal::ContextMenu(Some(MenuDescriptor {
                entity: id,
                actions,
            })));
        self.menu_open = true;
    }

    fn close_menu(&mut self, signals: &mut Vec<Signal>) {
        self.menu_open = false;
        signals.push(Signal::ContextMenu(None));
    }

    /// Apply a menu choice routed back from the UI layer. Returns false for
    /// the editing actions (move/duplicate/unlink/destroy), which the host
    /// forwards to the editor instead.
    pub fn menu_action(
        &mut self,
        action: MenuAction,
        id: EntityId,
        ctx: &mut ClipboardCtx<'_>,
    ) -> bool {
        if self.menu_open {
            self.close_menu(ctx.signals);
        }
        match action {
            MenuAction::Inspect => {
                ctx.signals.push(Signal::Inspect(Some(id)));
                true
            }
            MenuAction::CopyLink => {
                self.copy_link(id, ctx);
                true
            }
            MenuAction::CopyJson => {
                self.copy(id, ctx);
                true
            }
            MenuAction::Move
            | MenuAction::Duplicate
            | MenuAction::Unlink
            | MenuAction::Destroy => false,
        }
    }

    /// Serialize an entity to the portable document and write it through
    /// the clipboard tiers.
    pub fn copy(&mut self, id: EntityId, ctx: &mut ClipboardCtx<'_>) {
        let Some(entity) = ctx.store.get(id) else {
            return;
        };
        let Some(blueprint) = ctx.blueprints.get(entity.blueprint) else {
            return;
        };
        let doc = ClipboardDocument::for_entity(entity, blueprint, &self.asset_domain);
        match doc.to_json() {
            Ok(text) => {
                self.write_tiers(&text);
                ctx.signals.push(Signal::Toast("Copied".into()));
            }
            Err(err) => {
                tracing::warn!(%err, "copy serialization failed");
                ctx.signals.push(Signal::Toast("Copy failed".into()));
            }
        }
    }

    /// Copy the entity's model as an absolute fetchable link.
    pub fn copy_link(&mut self, id: EntityId, ctx: &mut ClipboardCtx<'_>) {
        let Some(entity) = ctx.store.get(id) else {
            return;
        };
        let Some(blueprint) = ctx.blueprints.get(entity.blueprint) else {
            return;
        };
        let url = assets::absolutize(&self.asset_domain, &blueprint.model);
        self.write_tiers(&url);
        ctx.signals.push(Signal::Toast("Link copied".into()));
    }

    /// Copy, then destroy with a full undo snapshot.
    pub fn cut(&mut self, id: EntityId, ctx: &mut ClipboardCtx<'_>) {
        if !can_build(&self.roles) {
            ctx.signals
                .push(Signal::Toast("You don't have build permission".into()));
            return;
        }
        let Some(entity) = ctx.store.get(id) else {
            return;
        };
        if entity.pinned {
            ctx.signals.push(Signal::Toast("That item is pinned".into()));
            return;
        }
        self.copy(id, ctx);
        let Some(entity) = ctx.store.destroy(id) else {
            return;
        };
        ctx.history.push(UndoEntry::Delete {
            snapshot: entity.snapshot(),
        });
        ctx.channel.send(wire::ENTITY_REMOVED, json!({ "id": id }));
        tracing::debug!(entity = %id.0, "cut entity");
    }

    /// Read the clipboard tiers, parse the document, rehost every asset,
    /// then spawn. All-or-nothing: any failure aborts before the store is
    /// touched.
    pub fn paste(&mut self, ctx: &mut ClipboardCtx<'_>) {
        if !can_build(&self.roles) {
            ctx.signals
                .push(Signal::Toast("You don't have build permission".into()));
            return;
        }
        let Some(text) = self.read_tiers() else {
            ctx.signals.push(Signal::Toast("Nothing to paste".into()));
            return;
        };
        let doc = match ClipboardDocument::from_json(&text) {
            Ok(doc) => doc,
            Err(err) => {
                tracing::debug!(%err, "clipboard text is not a document");
                ctx.signals
                    .push(Signal::Toast("Clipboard has nothing placeable".into()));
                return;
            }
        };

        let rehosted = self
            .rehost(&doc.blueprint.model, AssetKind::Model, ctx)
            .and_then(|model| {
                let script = doc
                    .blueprint
                    .script
                    .as_deref()
                    .map(|url| self.rehost(url, AssetKind::Script, ctx))
                    .transpose()?;
                Ok((model, script))
            });
        let (model, script) = match rehosted {
            Ok(urls) => urls,
            Err(err) => {
                tracing::warn!(%err, "paste aborted");
                ctx.signals.push(Signal::Toast(format!("Paste failed: {err}")));
                return;
            }
        };

        self.spawn_pasted(&doc, model, script, ctx);
    }

    /// Fetch one asset from its absolute URL, gate its size, upload it and
    /// register it in the local cache under its content-addressed ref.
    fn rehost(
        &self,
        url: &str,
        kind: AssetKind,
        ctx: &mut ClipboardCtx<'_>,
    ) -> Result<String, ClipboardError> {
        let fetched = ctx.fetcher.fetch(url)?;
        let ext = assets::extension(url)
            .ok_or_else(|| AssetError::NoExtension(url.to_string()))?;
        let size = fetched.data.len() as u64;
        let limit = ctx.channel.max_upload_size();
        if size > limit {
            return Err(NetworkError::UploadTooLarge { size, limit }.into());
        }
        let internal = assets::internal_ref(&fetched.data, ext);
        let name = url.rsplit('/').next().unwrap_or(url).to_string();
        let file = AssetFile {
            kind,
            name,
            data: fetched.data,
        };
        ctx.channel.upload(&file)?;
        ctx.cache.insert(internal.clone(), file);
        tracing::debug!(url, internal, "rehosted asset");
        Ok(internal)
    }

    /// All assets are ready: register the blueprint if unknown and spawn the
    /// entity at the pointer, optimistic then immediately confirmed.
    fn spawn_pasted(
        &mut self,
        doc: &ClipboardDocument,
        model: String,
        script: Option<String>,
        ctx: &mut ClipboardCtx<'_>,
    ) {
        let blueprint_id = doc.blueprint.id;
        if ctx.blueprints.get(blueprint_id).is_none() {
            let blueprint = Blueprint {
                id: blueprint_id,
                model,
                script,
                config: doc.blueprint.config.clone(),
                preload: doc.blueprint.preload,
                unique: false,
                extents: glam::Vec3::ONE,
            };
            let payload = serde_json::to_value(&blueprint).unwrap_or_default();
            ctx.blueprints.add(blueprint);
            ctx.channel.send(wire::BLUEPRINT_ADDED, payload);
        }

        let pointer = ctx.router.pointer_mirror(self.handle).normalized;
        let position = project_or_hit(ctx.raycaster, pointer);
        let self_id = ctx.channel.client_id();

        let mut entity = Entity::new(
            blueprint_id,
            Transform {
                position,
                rotation: doc.quaternion,
                scale: doc.scale,
            },
        );
        entity.state = doc.state.clone();
        entity.mover = Some(self_id);
        entity.uploader = Some(self_id);
        let payload = entity.wire_payload();
        let id = ctx.store.spawn(entity);
        ctx.channel.send(wire::ENTITY_ADDED, payload);

        // Uploads resolved above; confirm for other observers and release.
        if let Some(entity) = ctx.store.get_mut(id) {
            entity.mover = None;
            entity.uploader = None;
        }
        ctx.channel.send(
            wire::ENTITY_MODIFIED,
            json!({ "id": id, "mover": null, "uploader": null }),
        );
        ctx.history.push(UndoEntry::Create { entity: id });
        tracing::debug!(entity = %id.0, "pasted entity");
    }

    /// Write through the tiers; the first success wins. The last-copied
    /// buffer is updated regardless so an in-process paste always works.
    pub(crate) fn write_tiers(&mut self, text: &str) {
        for backend in &mut self.backends {
            match backend.write(text) {
                Ok(()) => {
                    tracing::debug!(tier = backend.name(), "clipboard write");
                    break;
                }
                Err(err) => {
                    tracing::debug!(tier = backend.name(), %err, "clipboard tier failed, falling through");
                }
            }
        }
        self.buffer = Some(text.to_string());
    }

    /// Read the first tier that has content, else the in-process buffer.
    pub(crate) fn read_tiers(&self) -> Option<String> {
        for backend in &self.backends {
            match backend.read() {
                Ok(text) => return Some(text),
                Err(err) => {
                    tracing::trace!(tier = backend.name(), %err, "clipboard tier empty, falling through");
                }
            }
        }
        self.buffer.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MemoryBackend, UnavailableBackend};
    use atelier_input::{BindOptions, Capture, InputEvent, Modifiers, priority};
    use atelier_world::{MemoryFetcher, PlaneRaycaster, RecordingChannel};
    use glam::{Quat, Vec2, Vec3};

    const DOMAIN: &str = "https://assets.example.com";

    struct Rig {
        router: InputRouter,
        handle: HandleId,
        store: EntityStore,
        blueprints: BlueprintStore,
        channel: RecordingChannel,
        raycaster: PlaneRaycaster,
        fetcher: MemoryFetcher,
        cache: AssetCache,
        history: History,
        signals: Vec<Signal>,
        selected: Option<EntityId>,
        clipboard: ClipboardHistory,
    }

    impl Rig {
        fn new() -> Self {
            Self::with(
                vec![Box::new(MemoryBackend::new())],
                [Role::Builder].into(),
            )
        }

        fn with(backends: Vec<Box<dyn ClipboardBackend>>, roles: HashSet<Role>) -> Self {
            let mut router = InputRouter::new();
            let handle = router.bind(
                BindOptions::at(priority::EDITOR).capture(
                    Capture::none()
                        .keys([Key::KeyC, Key::KeyV, Key::KeyX, Key::Escape])
                        .buttons([
                            PointerButton::Left,
                            PointerButton::Right,
                            PointerButton::Middle,
                        ]),
                ),
            );
            let clipboard = ClipboardHistory::new(handle, roles, DOMAIN, backends);
            Self {
                router,
                handle,
                store: EntityStore::new(),
                blueprints: BlueprintStore::new(),
                channel: RecordingChannel::new(atelier_common::ClientId::new()),
                raycaster: PlaneRaycaster::new(Vec3::new(0.0, 10.0, 0.0), 20.0),
                fetcher: MemoryFetcher::new(),
                cache: AssetCache::new(),
                history: History::new(),
                signals: Vec::new(),
                selected: None,
                clipboard,
            }
        }

        /// Spawn an entity whose model (and optional script) is fetchable
        /// from the asset domain, so paste rehosting can succeed.
        fn spawn_fetchable(&mut self, position: Vec3, script: bool) -> EntityId {
            let model_data = b"model-bytes".to_vec();
            let model = assets::internal_ref(&model_data, "glb");
            self.fetcher.insert(
                assets::absolutize(DOMAIN, &model),
                AssetFile {
                    kind: AssetKind::Model,
                    name: "model.glb".into(),
                    data: model_data,
                },
            );
            let mut blueprint = Blueprint::new(model);
            if script {
                let script_data = b"script-bytes".to_vec();
                let url = assets::internal_ref(&script_data, "js");
                self.fetcher.insert(
                    assets::absolutize(DOMAIN, &url),
                    AssetFile {
                        kind: AssetKind::Script,
                        name: "script.js".into(),
                        data: script_data,
                    },
                );
                blueprint.script = Some(url);
            }
            let blueprint = self.blueprints.add(blueprint);
            let entity = Entity::new(
                blueprint,
                Transform {
                    position,
                    ..Transform::default()
                },
            );
            let id = self.store.spawn(entity);
            self.raycaster.add_target(id, position, 0.5);
            id
        }

        fn update(&mut self, dt: f32, enabled: bool) {
            let mut ctx = ClipboardCtx {
                router: &self.router,
                store: &mut self.store,
                blueprints: &mut self.blueprints,
                channel: &mut self.channel,
                raycaster: &self.raycaster,
                fetcher: &self.fetcher,
                cache: &mut self.cache,
                history: &mut self.history,
                signals: &mut self.signals,
                selected: self.selected,
            };
            self.clipboard.update(dt, enabled, &mut ctx);
            self.router.end_frame();
        }

        fn menu_action(&mut self, action: MenuAction, id: EntityId) -> bool {
            let mut ctx = ClipboardCtx {
                router: &self.router,
                store: &mut self.store,
                blueprints: &mut self.blueprints,
                channel: &mut self.channel,
                raycaster: &self.raycaster,
                fetcher: &self.fetcher,
                cache: &mut self.cache,
                history: &mut self.history,
                signals: &mut self.signals,
                selected: self.selected,
            };
            self.clipboard.menu_action(action, id, &mut ctx)
        }

        fn point_at(&mut self, nx: f32, ny: f32) {
            self.router.dispatch(&InputEvent::PointerMove {
                position: Vec2::new(nx * 1280.0, ny * 720.0),
                normalized: Vec2::new(nx, ny),
                delta: Vec2::ZERO,
            });
        }

        fn drag(&mut self, delta: Vec2) {
            self.router.dispatch(&InputEvent::PointerMove {
                position: Vec2::new(640.0, 360.0) + delta,
                normalized: Vec2::new(0.5, 0.5),
                delta,
            });
        }

        fn right_down(&mut self) {
            self.router.dispatch(&InputEvent::PointerDown {
                button: PointerButton::Right,
                modifiers: Modifiers::default(),
            });
        }

        fn right_up(&mut self) {
            self.router.dispatch(&InputEvent::PointerUp {
                button: PointerButton::Right,
                modifiers: Modifiers::default(),
            });
        }

        fn chord(&mut self, key: Key) {
            self.router.dispatch(&InputEvent::KeyDown {
                key,
                modifiers: Modifiers {
                    control: true,
                    ..Modifiers::default()
                },
            });
        }

        fn menu_signal(&self) -> Option<&MenuDescriptor> {
            self.signals.iter().rev().find_map(|s| match s {
                Signal::ContextMenu(Some(desc)) => Some(desc),
                _ => None,
            })
        }
    }

    #[test]
    fn quick_right_click_opens_menu() {
        let mut rig = Rig::new();
        let id = rig.spawn_fetchable(Vec3::ZERO, false);
        rig.point_at(0.5, 0.5);
        rig.right_down();
        rig.update(0.05, true);
        rig.right_up();
        rig.update(0.05, true);

        let menu = rig.menu_signal().expect("menu opened");
        assert_eq!(menu.entity, id);
        assert!(menu.actions.contains(&MenuAction::CopyJson));
        assert!(menu.actions.contains(&MenuAction::Destroy));
    }

    #[test]
    fn slow_right_click_is_not_a_menu() {
        let mut rig = Rig::new();
        rig.spawn_fetchable(Vec3::ZERO, false);
        rig.point_at(0.5, 0.5);
        rig.right_down();
        for _ in 0..8 {
            rig.update(0.05, true);
        }
        rig.right_up();
        rig.update(0.05, true);
        assert!(rig.menu_signal().is_none());
    }

    #[test]
    fn dragged_right_click_is_not_a_menu() {
        let mut rig = Rig::new();
        rig.spawn_fetchable(Vec3::ZERO, false);
        rig.point_at(0.5, 0.5);
        rig.right_down();
        rig.drag(Vec2::new(40.0, 0.0));
        rig.update(0.05, true);
        rig.right_up();
        rig.update(0.05, true);
        assert!(rig.menu_signal().is_none());
    }

    #[test]
    fn menu_dismissed_by_left_press() {
        let mut rig = Rig::new();
        rig.spawn_fetchable(Vec3::ZERO, false);
        rig.point_at(0.5, 0.5);
        rig.right_down();
        rig.update(0.05, true);
        rig.right_up();
        rig.update(0.05, true);
        assert!(rig.menu_signal().is_some());

        rig.router.dispatch(&InputEvent::PointerDown {
            button: PointerButton::Left,
            modifiers: Modifiers::default(),
        });
        rig.update(0.05, true);
        assert_eq!(rig.signals.last(), Some(&Signal::ContextMenu(None)));
    }

    #[test]
    fn visitor_menu_has_no_editing_actions() {
        let mut rig = Rig::with(
            vec![Box::new(MemoryBackend::new())],
            [Role::Visitor].into(),
        );
        rig.spawn_fetchable(Vec3::ZERO, false);
        rig.point_at(0.5, 0.5);
        rig.right_down();
        rig.update(0.05, true);
        rig.right_up();
        rig.update(0.05, true);

        let menu = rig.menu_signal().expect("menu opened");
        assert_eq!(
            menu.actions,
            vec![
                MenuAction::Inspect,
                MenuAction::CopyLink,
                MenuAction::CopyJson
            ]
        );
    }

    #[test]
    fn uploading_entity_menu_is_inspect_only() {
        let mut rig = Rig::new();
        let id = rig.spawn_fetchable(Vec3::ZERO, false);
        rig.store.get_mut(id).unwrap().uploader = Some(atelier_common::ClientId::new());
        rig.point_at(0.5, 0.5);
        rig.right_down();
        rig.update(0.05, true);
        rig.right_up();
        rig.update(0.05, true);

        let menu = rig.menu_signal().expect("menu opened");
        assert_eq!(menu.actions, vec![MenuAction::Inspect]);
    }

    #[test]
    fn inspect_menu_action_emits_signal_and_closes() {
        let mut rig = Rig::new();
        let id = rig.spawn_fetchable(Vec3::ZERO, false);
        assert!(rig.menu_action(MenuAction::Inspect, id));
        assert!(rig.signals.contains(&Signal::Inspect(Some(id))));
    }

    #[test]
    fn editing_menu_actions_are_not_handled_here() {
        let mut rig = Rig::new();
        let id = rig.spawn_fetchable(Vec3::ZERO, false);
        assert!(!rig.menu_action(MenuAction::Destroy, id));
        assert!(rig.store.contains(id));
    }

    #[test]
    fn copy_chord_writes_absolutized_document() {
        let mut rig = Rig::new();
        rig.spawn_fetchable(Vec3::ZERO, true);
        rig.point_at(0.5, 0.5);
        rig.chord(Key::KeyC);
        rig.update(0.016, true);

        let text = rig.clipboard.read_tiers().expect("copied");
        let doc = ClipboardDocument::from_json(&text).unwrap();
        assert!(doc.blueprint.model.starts_with(DOMAIN));
        assert!(doc.blueprint.script.as_deref().is_some_and(|s| s.starts_with(DOMAIN)));
        assert!(rig.signals.contains(&Signal::Toast("Copied".into())));
    }

    #[test]
    fn copy_falls_through_unavailable_tiers() {
        let mut rig = Rig::with(
            vec![Box::new(UnavailableBackend), Box::new(MemoryBackend::new())],
            [Role::Builder].into(),
        );
        rig.spawn_fetchable(Vec3::ZERO, false);
        rig.point_at(0.5, 0.5);
        rig.chord(Key::KeyC);
        rig.update(0.016, true);

        let text = rig.clipboard.read_tiers().expect("second tier holds it");
        assert!(ClipboardDocument::from_json(&text).is_ok());
    }

    #[test]
    fn buffer_serves_paste_when_all_backends_fail() {
        let mut rig = Rig::with(vec![Box::new(UnavailableBackend)], [Role::Builder].into());
        rig.spawn_fetchable(Vec3::ZERO, false);
        rig.point_at(0.5, 0.5);
        rig.chord(Key::KeyC);
        rig.update(0.016, true);
        assert!(rig.clipboard.read_tiers().is_some());
    }

    #[test]
    fn chords_are_inert_outside_build_mode() {
        let mut rig = Rig::new();
        rig.spawn_fetchable(Vec3::ZERO, false);
        rig.point_at(0.5, 0.5);
        rig.chord(Key::KeyC);
        rig.update(0.016, false);
        assert!(rig.clipboard.read_tiers().is_none());
    }

    #[test]
    fn cut_destroys_and_records_undo() {
        let mut rig = Rig::new();
        rig.spawn_fetchable(Vec3::new(1.0, 0.0, 1.0), false);
        rig.point_at(0.55, 0.55);
        rig.chord(Key::KeyX);
        rig.update(0.016, true);

        assert!(rig.store.is_empty());
        assert_eq!(rig.history.len(), 1);
        assert_eq!(rig.channel.sent(wire::ENTITY_REMOVED).len(), 1);
        assert!(rig.clipboard.read_tiers().is_some());
    }

    #[test]
    fn cut_refuses_pinned_entity() {
        let mut rig = Rig::new();
        let id = rig.spawn_fetchable(Vec3::ZERO, false);
        rig.store.get_mut(id).unwrap().pinned = true;
        rig.point_at(0.5, 0.5);
        rig.chord(Key::KeyX);
        rig.update(0.016, true);

        assert!(rig.store.contains(id));
        assert!(rig.history.is_empty());
    }

    #[test]
    fn paste_round_trips_into_a_fresh_world() {
        let mut source = Rig::new();
        let id = source.spawn_fetchable(Vec3::ZERO, true);
        {
            let entity = source.store.get_mut(id).unwrap();
            entity.transform.rotation = Quat::from_rotation_y(1.0);
            entity.transform.scale = Vec3::new(2.0, 2.0, 2.0);
            entity
                .state
                .insert("open".into(), serde_json::Value::Bool(true));
        }
        let original = source.store.get(id).unwrap().clone();
        let original_blueprint = source.blueprints.get(original.blueprint).unwrap().clone();
        source.point_at(0.5, 0.5);
        source.chord(Key::KeyC);
        source.update(0.016, true);
        let text = source.clipboard.read_tiers().unwrap();

        // A different client in a different world pastes the document.
        let mut target = Rig::new();
        target.fetcher = source.fetcher.clone();
        target.clipboard.write_tiers(&text);
        target.point_at(0.6, 0.65);
        target.chord(Key::KeyV);
        target.update(0.016, true);

        assert_eq!(target.store.len(), 1);
        let (_, pasted) = target.store.iter().next().unwrap();
        assert_ne!(pasted.id, original.id);
        assert_eq!(pasted.transform.rotation, original.transform.rotation);
        assert_eq!(pasted.transform.scale, original.transform.scale);
        assert_eq!(pasted.state, original.state);
        assert!(pasted.transform.position.distance(Vec3::new(2.0, 0.0, 3.0)) < 1e-3);
        assert_eq!(pasted.mover, None);
        assert_eq!(pasted.uploader, None);

        // Blueprint content survives; asset refs are re-derived to the same
        // content-addressed internal form.
        let blueprint = target.blueprints.get(pasted.blueprint).unwrap();
        assert_eq!(blueprint.model, original_blueprint.model);
        assert_eq!(blueprint.script, original_blueprint.script);
        assert_eq!(blueprint.config, original_blueprint.config);
        assert_eq!(blueprint.preload, original_blueprint.preload);
        assert!(target.cache.contains(&blueprint.model));

        assert_eq!(target.channel.sent(wire::BLUEPRINT_ADDED).len(), 1);
        assert_eq!(target.channel.sent(wire::ENTITY_ADDED).len(), 1);
        assert_eq!(target.channel.uploads.len(), 2);
        // The optimistic spawn is confirmed once uploads resolve.
        let confirmed = target.channel.sent(wire::ENTITY_MODIFIED);
        assert!(confirmed.iter().any(|m| m.payload["uploader"].is_null()));
        assert_eq!(target.history.len(), 1);
    }

    #[test]
    fn paste_reuses_a_known_blueprint() {
        let mut rig = Rig::new();
        rig.spawn_fetchable(Vec3::ZERO, false);
        rig.point_at(0.5, 0.5);
        rig.chord(Key::KeyC);
        rig.update(0.016, true);

        rig.point_at(0.6, 0.65);
        rig.chord(Key::KeyV);
        rig.update(0.016, true);

        assert_eq!(rig.store.len(), 2);
        assert_eq!(rig.blueprints.len(), 1);
        assert!(rig.channel.sent(wire::BLUEPRINT_ADDED).is_empty());
    }

    #[test]
    fn paste_aborts_when_fetch_fails() {
        let mut rig = Rig::new();
        rig.spawn_fetchable(Vec3::ZERO, false);
        rig.point_at(0.5, 0.5);
        rig.chord(Key::KeyC);
        rig.update(0.016, true);

        // Asset host went away.
        rig.fetcher = MemoryFetcher::new();
        rig.store = EntityStore::new();
        rig.blueprints = BlueprintStore::new();
        rig.chord(Key::KeyV);
        rig.update(0.016, true);

        assert!(rig.store.is_empty());
        assert!(rig.channel.sent(wire::ENTITY_ADDED).is_empty());
        assert!(
            rig.signals
                .iter()
                .any(|s| matches!(s, Signal::Toast(m) if m.contains("Paste failed")))
        );
    }

    #[test]
    fn paste_aborts_on_oversized_asset() {
        let mut rig = Rig::new();
        rig.channel = RecordingChannel::new(atelier_common::ClientId::new())
            .with_max_upload_size(4);
        rig.spawn_fetchable(Vec3::ZERO, false);
        rig.point_at(0.5, 0.5);
        rig.chord(Key::KeyC);
        rig.update(0.016, true);

        rig.store = EntityStore::new();
        rig.blueprints = BlueprintStore::new();
        rig.chord(Key::KeyV);
        rig.update(0.016, true);

        assert!(rig.store.is_empty());
        assert!(rig.channel.uploads.is_empty());
        assert!(
            rig.signals
                .iter()
                .any(|s| matches!(s, Signal::Toast(m) if m.contains("exceeds")))
        );
    }

    #[test]
    fn paste_aborts_on_upload_failure() {
        let mut rig = Rig::new();
        rig.spawn_fetchable(Vec3::ZERO, false);
        rig.point_at(0.5, 0.5);
        rig.chord(Key::KeyC);
        rig.update(0.016, true);

        rig.channel.fail_uploads = Some("offline".into());
        rig.store = EntityStore::new();
        rig.blueprints = BlueprintStore::new();
        rig.chord(Key::KeyV);
        rig.update(0.016, true);

        assert!(rig.store.is_empty());
        assert!(rig.channel.sent(wire::ENTITY_ADDED).is_empty());
    }

    #[test]
    fn paste_with_empty_clipboard_toasts() {
        let mut rig = Rig::new();
        rig.chord(Key::KeyV);
        rig.update(0.016, true);
        assert!(rig.signals.contains(&Signal::Toast("Nothing to paste".into())));
    }

    #[test]
    fn visitor_cannot_paste() {
        let mut rig = Rig::with(
            vec![Box::new(MemoryBackend::new())],
            [Role::Visitor].into(),
        );
        rig.clipboard.write_tiers("{}");
        rig.chord(Key::KeyV);
        rig.update(0.016, true);
        assert!(rig.store.is_empty());
        assert!(
            rig.signals
                .iter()
                .any(|s| matches!(s, Signal::Toast(m) if m.contains("permission")))
        );
    }

    #[test]
    fn undo_after_paste_removes_the_entity() {
        let mut rig = Rig::new();
        rig.spawn_fetchable(Vec3::ZERO, false);
        rig.point_at(0.5, 0.5);
        rig.chord(Key::KeyC);
        rig.update(0.016, true);
        rig.chord(Key::KeyV);
        rig.update(0.016, true);
        assert_eq!(rig.store.len(), 2);

        assert!(rig.history.undo(&mut rig.store, &mut rig.channel, &mut rig.signals));
        assert_eq!(rig.store.len(), 1);
    }

    #[test]
    fn selected_entity_wins_over_hovered_for_chords() {
        let mut rig = Rig::new();
        let hovered = rig.spawn_fetchable(Vec3::ZERO, false);
        let selected = rig.spawn_fetchable(Vec3::new(5.0, 0.0, 5.0), false);
        rig.selected = Some(selected);
        rig.point_at(0.5, 0.5);
        rig.chord(Key::KeyX);
        rig.update(0.016, true);

        assert!(!rig.store.contains(selected));
        assert!(rig.store.contains(hovered));
    }
}
