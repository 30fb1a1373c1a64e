use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Kind tag for cached asset files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Model,
    Avatar,
    Script,
    Image,
}

/// An asset payload moving through the cache/upload pipeline.
#[derive(Debug, Clone)]
pub struct AssetFile {
    pub kind: AssetKind,
    pub name: String,
    pub data: Vec<u8>,
}

/// Errors from asset fetching and rehosting.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    NotFound(String),
    #[error("asset fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },
    #[error("asset url has no file extension: {0}")]
    NoExtension(String),
}

const INTERNAL_SCHEME: &str = "asset://";

/// Compute the internal content-addressed reference for a payload:
/// `asset://<sha256-hex>.<ext>`.
pub fn internal_ref(data: &[u8], ext: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let hash = hasher.finalize();
    format!("{INTERNAL_SCHEME}{:x}.{ext}", hash)
}

/// Whether a url uses the internal short-hand scheme.
pub fn is_internal(url: &str) -> bool {
    url.starts_with(INTERNAL_SCHEME)
}

/// Convert an internal reference to an absolute fetchable URL under the
/// world's asset domain. Already-absolute urls pass through unchanged.
/// The clipboard contract requires the absolute form, never the short-hand.
pub fn absolutize(domain: &str, url: &str) -> String {
    match url.strip_prefix(INTERNAL_SCHEME) {
        Some(rest) => format!("{}/{rest}", domain.trim_end_matches('/')),
        None => url.to_string(),
    }
}

/// File extension of a url, if any.
pub fn extension(url: &str) -> Option<&str> {
    let name = url.rsplit('/').next()?;
    let (_, ext) = name.rsplit_once('.')?;
    (!ext.is_empty()).then_some(ext)
}

/// In-process cache of asset files keyed by internal url. The renderer and
/// script host read from here; paste rehosting writes into it.
#[derive(Debug, Clone, Default)]
pub struct AssetCache {
    entries: HashMap<String, AssetFile>,
}

impl AssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, url: impl Into<String>, file: AssetFile) {
        self.entries.insert(url.into(), file);
    }

    pub fn get(&self, url: &str) -> Option<&AssetFile> {
        self.entries.get(url)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fetch an asset by absolute URL. The network transport implements this;
/// tests and the CLI use [`MemoryFetcher`].
pub trait AssetFetcher {
    fn fetch(&self, url: &str) -> Result<AssetFile, AssetError>;
}

/// In-memory fetcher backed by a url → file map.
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher {
    files: HashMap<String, AssetFile>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, url: impl Into<String>, file: AssetFile) {
        self.files.insert(url.into(), file);
    }
}

impl AssetFetcher for MemoryFetcher {
    fn fetch(&self, url: &str) -> Result<AssetFile, AssetError> {
        self.files
            .get(url)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(url.to_string()))
    }
}
