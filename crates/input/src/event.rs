use glam::Vec2;

/// Logical keys the subsystem cares about. Anything else arrives as `Other`
/// and is routed but never matched by default bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Tab,
    Escape,
    Delete,
    Backspace,
    KeyC,
    KeyG,
    KeyP,
    KeyR,
    KeyU,
    KeyV,
    KeyX,
    KeyZ,
    Control,
    Meta,
    Shift,
    Alt,
    Other(u32),
}

impl Key {
    /// Modifier keys get special treatment in the stuck-input safety net:
    /// hosts are known to swallow their release events.
    pub fn is_modifier(self) -> bool {
        matches!(self, Self::Control | Self::Meta | Self::Shift | Self::Alt)
    }
}

/// Pointer buttons in the default binding set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Left,
    Right,
    Middle,
}

/// Modifier snapshot carried on key and button events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub control: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    /// Ctrl on most hosts, Cmd on macOS. Used for the clipboard and undo
    /// chords.
    pub fn command(self) -> bool {
        self.control || self.meta
    }
}

/// A raw host event, already translated out of the windowing layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyDown { key: Key, modifiers: Modifiers },
    KeyUp { key: Key, modifiers: Modifiers },
    PointerDown { button: PointerButton, modifiers: Modifiers },
    PointerUp { button: PointerButton, modifiers: Modifiers },
    /// Pointer moved: pixel position, normalized [0,1]² coordinates, and the
    /// delta since the previous move.
    PointerMove { position: Vec2, normalized: Vec2, delta: Vec2 },
    Scroll { delta: f32 },
    TouchStart { id: u64, position: Vec2 },
    TouchMove { id: u64, position: Vec2 },
    TouchEnd { id: u64 },
    /// The window lost focus. Triggers the force-release safety net.
    Blur,
    /// Host notification that pointer capture was granted or dropped.
    PointerLockChanged(bool),
}
