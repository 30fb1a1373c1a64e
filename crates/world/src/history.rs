use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use atelier_common::{BlueprintId, EntityId, Signal, Transform};

use crate::entity::{Entity, EntityStore, StateMap};
use crate::network::{NetworkChannel, wire};

/// Maximum number of undo entries kept. Pushing beyond evicts the oldest.
pub const HISTORY_LIMIT: usize = 50;

/// Everything needed to rebuild a destroyed entity. Ids are not preserved:
/// a respawn mints a fresh one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub blueprint: BlueprintId,
    pub transform: Transform,
    pub state: StateMap,
}

/// An inverse operation on the undo stack.
///
/// Entries are never mutated in place, only pushed and popped. There is no
/// redo: the forward command is deliberately not recorded alongside.
#[derive(Debug, Clone, PartialEq)]
pub enum UndoEntry {
    /// Something was deleted; undo respawns it from the snapshot.
    Delete { snapshot: EntitySnapshot },
    /// Something was created; undo destroys it.
    Create { entity: EntityId },
}

/// Bounded FIFO-evicting undo stack, shared by the editor shortcuts and the
/// clipboard layer. Process-scoped; torn down with the world session.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: VecDeque<UndoEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push an entry, evicting the oldest once past [`HISTORY_LIMIT`].
    pub fn push(&mut self, entry: UndoEntry) {
        if self.entries.len() == HISTORY_LIMIT {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn pop(&mut self) -> Option<UndoEntry> {
        self.entries.pop_back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oldest surviving entry, for diagnostics and tests.
    pub fn oldest(&self) -> Option<&UndoEntry> {
        self.entries.front()
    }

    /// Pop and apply the most recent entry. Returns whether anything was
    /// undone. A missing undo target is reported as a toast, never an error.
    pub fn undo(
        &mut self,
        store: &mut EntityStore,
        channel: &mut dyn NetworkChannel,
        signals: &mut Vec<Signal>,
    ) -> bool {
        let Some(entry) = self.pop() else {
            return false;
        };
        match entry {
            UndoEntry::Delete { snapshot } => {
                let mut entity = Entity::new(snapshot.blueprint, snapshot.transform);
                entity.state = snapshot.state;
                let payload = entity.wire_payload();
                let id = store.spawn(entity);
                channel.send(wire::ENTITY_ADDED, payload);
                tracing::debug!(entity = %id.0, "undo respawned entity");
                true
            }
            UndoEntry::Create { entity } => {
                if store.destroy(entity).is_none() {
                    signals.push(Signal::Toast("Nothing to undo".to_string()));
                    return false;
                }
                channel.send(
                    wire::ENTITY_REMOVED,
                    serde_json::json!({ "id": entity }),
                );
                tracing::debug!(entity = %entity.0, "undo destroyed entity");
                true
            }
        }
    }
}
