use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::{Vec2, Vec3};
use tracing_subscriber::EnvFilter;

use atelier_clipboard::{ClipboardCtx, ClipboardDocument, ClipboardHistory, MemoryBackend};
use atelier_common::{ClientId, EntityId, MenuAction, Role, Transform};
use atelier_editor::{EditorCtx, SCROLL_YAW_RATE, SNAP_DEGREES, SNAP_RADIUS, SceneEditor};
use atelier_input::{InputEvent, InputRouter, Key, Modifiers, PointerButton};
use atelier_world::{
    AssetCache, Blueprint, BlueprintStore, Entity, EntityStore, HISTORY_LIMIT, History,
    MAX_PROJECT_DISTANCE, MemoryFetcher, PlaneRaycaster, RecordingChannel, SEND_RATE, SnapIndex,
    assets,
};

#[derive(Parser)]
#[command(name = "atelier", about = "Tools for the atelier scene-editing subsystem")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate info and tuning constants
    Info,
    /// Run a scripted editing session over the reference collaborators
    Demo {
        /// Skip registering a snap point near the drop position
        #[arg(long)]
        no_snap: bool,
    },
    /// Parse and validate a clipboard document JSON file
    CheckDoc { file: PathBuf },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => info(),
        Commands::Demo { no_snap } => demo(no_snap),
        Commands::CheckDoc { file } => check_doc(&file),
    }
}

fn info() -> anyhow::Result<()> {
    println!("atelier-cli v{}", env!("CARGO_PKG_VERSION"));
    println!("send rate: every {SEND_RATE}s");
    println!("projection limit: {MAX_PROJECT_DISTANCE} units");
    println!("yaw snap: {SNAP_DEGREES}°, position snap: {SNAP_RADIUS} units");
    println!("scroll yaw rate: {SCROLL_YAW_RATE} rad/unit/s");
    println!("undo history: {HISTORY_LIMIT} entries");
    Ok(())
}

/// One world session wired to the reference collaborators: plane raycaster,
/// recording network channel, in-memory clipboard.
struct Session {
    router: InputRouter,
    editor: SceneEditor,
    clipboard: ClipboardHistory,
    store: EntityStore,
    blueprints: BlueprintStore,
    channel: RecordingChannel,
    raycaster: PlaneRaycaster,
    snap: SnapIndex,
    cache: AssetCache,
    fetcher: MemoryFetcher,
    history: History,
    signals: Vec<atelier_common::Signal>,
}

impl Session {
    fn new() -> Self {
        let mut router = InputRouter::new();
        let roles: HashSet<Role> = [Role::Builder].into();
        let editor = SceneEditor::new(&mut router, roles.clone());
        let clipboard = ClipboardHistory::new(
            editor.handle(),
            roles,
            "https://assets.atelier.example",
            vec![Box::new(MemoryBackend::new())],
        );
        Self {
            router,
            editor,
            clipboard,
            store: EntityStore::new(),
            blueprints: BlueprintStore::new(),
            channel: RecordingChannel::new(ClientId::new()),
            raycaster: PlaneRaycaster::new(Vec3::new(0.0, 10.0, 0.0), 20.0),
            snap: SnapIndex::default(),
            cache: AssetCache::new(),
            fetcher: MemoryFetcher::new(),
            history: History::new(),
            signals: Vec::new(),
        }
    }

    fn frame(&mut self, dt: f32, events: &[InputEvent]) {
        for event in events {
            self.router.dispatch(event);
        }
        {
            let mut ctx = EditorCtx {
                router: &mut self.router,
                store: &mut self.store,
                blueprints: &mut self.blueprints,
                channel: &mut self.channel,
                raycaster: &self.raycaster,
                snap: &self.snap,
                history: &mut self.history,
                signals: &mut self.signals,
            };
            self.editor.update(dt, &mut ctx);
        }
        let enabled = self.editor.is_enabled();
        let selected = self.editor.selected();
        {
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
                selected,
            };
            self.clipboard.update(dt, enabled, &mut ctx);
        }
        self.router.end_frame();
    }

    /// Route a context-menu choice. The clipboard layer handles its own
    /// actions and returns false for the editing ones, which forward to the
    /// editor.
    fn menu_action(&mut self, action: MenuAction, id: EntityId) {
        let selected = self.editor.selected();
        let handled = {
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
                selected,
            };
            self.clipboard.menu_action(action, id, &mut ctx)
        };
        if handled {
            return;
        }
        let mut ctx = EditorCtx {
            router: &mut self.router,
            store: &mut self.store,
            blueprints: &mut self.blueprints,
            channel: &mut self.channel,
            raycaster: &self.raycaster,
            snap: &self.snap,
            history: &mut self.history,
            signals: &mut self.signals,
        };
        match action {
            MenuAction::Move => self.editor.select(id, &mut ctx),
            MenuAction::Duplicate => self.editor.duplicate(id, &mut ctx),
            MenuAction::Unlink => self.editor.unlink(id, &mut ctx),
            MenuAction::Destroy => self.editor.destroy(id, &mut ctx),
            MenuAction::Inspect | MenuAction::CopyLink | MenuAction::CopyJson => {}
        }
    }
}

fn pointer_move(nx: f32, ny: f32) -> InputEvent {
    InputEvent::PointerMove {
        position: Vec2::new(nx * 1280.0, ny * 720.0),
        normalized: Vec2::new(nx, ny),
        delta: Vec2::ZERO,
    }
}

fn demo(no_snap: bool) -> anyhow::Result<()> {
    let mut session = Session::new();
    if !no_snap {
        session.snap.insert(Vec3::new(2.2, 0.0, 3.2));
    }

    let blueprint = session
        .blueprints
        .add(Blueprint::new("asset://cube.glb"));
    let entity = session
        .store
        .spawn(Entity::new(blueprint, Transform::default()));
    session.raycaster.add_target(entity, Vec3::ZERO, 0.5);

    let dt = 1.0 / 60.0;
    let left_down = InputEvent::PointerDown {
        button: PointerButton::Left,
        modifiers: Modifiers::default(),
    };
    let left_up = InputEvent::PointerUp {
        button: PointerButton::Left,
        modifiers: Modifiers::default(),
    };

    // Enter build mode and grab the cube under the pointer.
    session.frame(dt, &[InputEvent::KeyDown {
        key: Key::Tab,
        modifiers: Modifiers::default(),
    }]);
    session.frame(dt, &[pointer_move(0.5, 0.5), left_down]);
    session.frame(dt, &[left_up]);

    // Drag toward (2, 0, 3) with a little scroll yaw, then place.
    for i in 0..20 {
        let t = (i + 1) as f32 / 20.0;
        let nx = 0.5 + 0.1 * t;
        let ny = 0.5 + 0.15 * t;
        session.frame(dt, &[pointer_move(nx, ny), InputEvent::Scroll { delta: 1.0 }]);
    }
    session.frame(dt, &[left_down, left_up]);

    let placed = session
        .store
        .get(entity)
        .context("demo entity disappeared")?
        .transform;
    println!("placed at {:?}", placed.position);
    println!("yaw {:.1}°", placed.yaw().to_degrees());

    // Context-menu destroy, routed back through the host like a UI would.
    session.menu_action(MenuAction::Destroy, entity);
    println!("menu destroy: {} entities left", session.store.len());
    println!();
    println!("signals:");
    for signal in &session.signals {
        println!("  {signal:?}");
    }
    println!();
    println!("network transcript ({} messages):", session.channel.messages.len());
    for message in &session.channel.messages {
        println!("  {} {}", message.event, message.payload);
    }
    Ok(())
}

fn check_doc(file: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let doc = ClipboardDocument::from_json(&text)
        .with_context(|| format!("parsing {}", file.display()))?;

    println!("blueprint {}", doc.blueprint.id.0);
    println!("model: {}", doc.blueprint.model);
    if let Some(script) = &doc.blueprint.script {
        println!("script: {script}");
    }
    println!("preload: {}", doc.blueprint.preload);
    println!("state keys: {}", doc.state.len());

    let leaks: Vec<&str> = doc
        .asset_urls()
        .filter(|url| assets::is_internal(url))
        .collect();
    if leaks.is_empty() {
        println!("ok: all asset references are absolute");
        Ok(())
    } else {
        for url in &leaks {
            println!("leak: internal reference {url}");
        }
        anyhow::bail!("{} internal asset reference(s) leaked", leaks.len())
    }
}
