use crate::EntityId;

/// An action offered by the entity context menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    CopyLink,
    CopyJson,
    Inspect,
    Move,
    Duplicate,
    Unlink,
    Destroy,
}

/// Descriptor for an open context menu: the target entity and the actions
/// the current client is allowed to take on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuDescriptor {
    pub entity: EntityId,
    pub actions: Vec<MenuAction>,
}

/// One-way notifications to presentation layers (phone OS apps, HUD).
///
/// The editing subsystem pushes these into a caller-provided sink each
/// update; it never waits on a response.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// Open (Some) or close (None) the inspect pane for an entity.
    Inspect(Option<EntityId>),
    /// Transient user-facing message.
    Toast(String),
    /// Build mode was switched on or off.
    BuildMode(bool),
    /// Open (Some) or dismiss (None) the context menu.
    ContextMenu(Option<MenuDescriptor>),
}
