use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use atelier_common::BlueprintId;

use crate::entity::StateMap;

/// Shared template describing an entity's visual model, script and
/// configuration. Entities reference one by id; `unique` blueprints are
/// forked instead of shared when duplicated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blueprint {
    pub id: BlueprintId,
    /// Model asset reference. Internal short-hand (`asset://…`) inside the
    /// world; absolutized whenever it crosses the clipboard boundary.
    pub model: String,
    pub script: Option<String>,
    pub config: StateMap,
    pub preload: bool,
    pub unique: bool,
    /// Full bounding-box size of the model, used to anchor and scale gizmos.
    pub extents: Vec3,
}

impl Blueprint {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            id: BlueprintId::new(),
            model: model.into(),
            script: None,
            config: StateMap::new(),
            preload: false,
            unique: false,
            extents: Vec3::ONE,
        }
    }
}

/// Blueprint registry keyed by id.
#[derive(Debug, Clone, Default)]
pub struct BlueprintStore {
    blueprints: BTreeMap<BlueprintId, Blueprint>,
}

impl BlueprintStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, blueprint: Blueprint) -> BlueprintId {
        let id = blueprint.id;
        self.blueprints.insert(id, blueprint);
        id
    }

    pub fn get(&self, id: BlueprintId) -> Option<&Blueprint> {
        self.blueprints.get(&id)
    }

    pub fn get_mut(&mut self, id: BlueprintId) -> Option<&mut Blueprint> {
        self.blueprints.get_mut(&id)
    }

    /// Clone a blueprint under a fresh id. Used when duplicating a `unique`
    /// blueprint and when unlinking an entity from a shared one.
    pub fn fork(&mut self, id: BlueprintId) -> Option<BlueprintId> {
        let mut copy = self.blueprints.get(&id)?.clone();
        copy.id = BlueprintId::new();
        tracing::debug!(from = %id.0, to = %copy.id.0, "forked blueprint");
        Some(self.add(copy))
    }

    pub fn len(&self) -> usize {
        self.blueprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blueprints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_get() {
        let mut store = BlueprintStore::new();
        let id = store.add(Blueprint::new("asset://abc.glb"));
        assert_eq!(store.get(id).unwrap().model, "asset://abc.glb");
    }

    #[test]
    fn fork_gets_fresh_id_and_same_content() {
        let mut store = BlueprintStore::new();
        let mut original = Blueprint::new("asset://abc.glb");
        original.script = Some("asset://s.js".into());
        original.unique = true;
        let id = store.add(original);

        let forked_id = store.fork(id).unwrap();
        assert_ne!(forked_id, id);
        let forked = store.get(forked_id).unwrap();
        assert_eq!(forked.model, "asset://abc.glb");
        assert_eq!(forked.script.as_deref(), Some("asset://s.js"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn fork_missing_is_none() {
        let mut store = BlueprintStore::new();
        assert!(store.fork(BlueprintId::new()).is_none());
    }
}
