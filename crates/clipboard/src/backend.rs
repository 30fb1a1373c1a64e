use atelier_world::{AssetError, NetworkError};

/// Errors inside the clipboard layer. Most are absorbed before they reach
/// the user: backend failures fall through tiers, paste failures surface as
/// a toast.
#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
    #[error("clipboard is empty")]
    Empty,
    #[error("malformed clipboard document: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unsupported clipboard document type: {0:?}")]
    UnsupportedType(String),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Network(#[from] NetworkError),
}

/// One clipboard tier. The host provides system and legacy-selection
/// implementations; the in-process buffer below all tiers always succeeds.
pub trait ClipboardBackend {
    /// Tier name for fall-through logging.
    fn name(&self) -> &str;

    fn write(&mut self, text: &str) -> Result<(), ClipboardError>;

    fn read(&self) -> Result<String, ClipboardError>;
}

/// In-memory backend, used by tests and the CLI demo in place of a real
/// system clipboard.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    content: Option<String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }
}

impl ClipboardBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    fn write(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.content = Some(text.to_string());
        Ok(())
    }

    fn read(&self) -> Result<String, ClipboardError> {
        self.content.clone().ok_or(ClipboardError::Empty)
    }
}

#[cfg(test)]
pub(crate) struct UnavailableBackend;

#[cfg(test)]
impl ClipboardBackend for UnavailableBackend {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn write(&mut self, _text: &str) -> Result<(), ClipboardError> {
        Err(ClipboardError::Unavailable("permission denied".into()))
    }

    fn read(&self) -> Result<String, ClipboardError> {
        Err(ClipboardError::Unavailable("permission denied".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_backend_round_trips() {
        let mut backend = MemoryBackend::new();
        assert!(matches!(backend.read(), Err(ClipboardError::Empty)));
        backend.write("{\"type\":\"app\"}").unwrap();
        assert_eq!(backend.read().unwrap(), "{\"type\":\"app\"}");
    }

    #[test]
    fn unavailable_backend_always_fails() {
        let mut backend = UnavailableBackend;
        assert!(backend.write("x").is_err());
        assert!(backend.read().is_err());
    }
}
