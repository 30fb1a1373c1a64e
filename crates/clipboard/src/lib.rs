//! Clipboard and context-menu layer.
//!
//! `ClipboardHistory` shares the editor's control handle and reacts to the
//! copy/cut/paste chords and to quick right-clicks. Entities travel between
//! worlds (and across process restarts) as [`ClipboardDocument`] JSON with
//! all asset references in absolute fetchable form; paste rehosts every
//! asset before any entity is spawned.
//!
//! # Invariants
//! - Copy always succeeds: backend tiers fall through to the in-process
//!   buffer, which cannot fail.
//! - Paste is all-or-nothing: any fetch, size or upload failure aborts with
//!   no partial entity and no store mutation.
//! - The document contract never carries an `asset://` reference.

pub mod backend;
pub mod clipboard;
pub mod document;

pub use backend::{ClipboardBackend, ClipboardError, MemoryBackend};
pub use clipboard::{ClipboardCtx, ClipboardHistory, QUICK_CLICK_SECONDS, QUICK_CLICK_TRAVEL_PX};
pub use document::{ClipboardDocument, DocumentBlueprint};
