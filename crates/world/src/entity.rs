use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use atelier_common::{BlueprintId, ClientId, EntityId, Transform};

use crate::history::EntitySnapshot;

/// Free-form per-entity state bag, shipped verbatim in network payloads and
/// clipboard documents.
pub type StateMap = serde_json::Map<String, serde_json::Value>;

/// A shared world entity referencing a blueprint.
///
/// `mover` is the optimistic single-writer authority token: the client id
/// currently permitted to author the transform. `uploader` marks a client
/// still completing an asset upload for a freshly spawned entity; observers
/// treat the entity as provisional until it clears.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub blueprint: BlueprintId,
    pub transform: Transform,
    pub mover: Option<ClientId>,
    pub uploader: Option<ClientId>,
    pub pinned: bool,
    pub state: StateMap,
}

impl Entity {
    pub fn new(blueprint: BlueprintId, transform: Transform) -> Self {
        Self {
            id: EntityId::new(),
            blueprint,
            transform,
            mover: None,
            uploader: None,
            pinned: false,
            state: StateMap::new(),
        }
    }

    /// Flat wire form used by `entityAdded` and final `entityModified`
    /// messages: rotation travels under the `quaternion` key.
    pub fn wire_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "blueprint": self.blueprint,
            "position": self.transform.position,
            "quaternion": self.transform.rotation,
            "scale": self.transform.scale,
            "mover": self.mover,
            "uploader": self.uploader,
            "pinned": self.pinned,
            "state": self.state,
        })
    }

    /// Capture the fields undo needs to rebuild this entity later.
    pub fn snapshot(&self) -> EntitySnapshot {
        EntitySnapshot {
            blueprint: self.blueprint,
            transform: self.transform,
            state: self.state.clone(),
        }
    }
}

/// Entity storage keyed by id. BTreeMap for deterministic iteration order.
///
/// The store is deliberately dumb: the authority protocol (who may set
/// `mover`, when modify messages go out) lives in the editor layer.
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    entities: BTreeMap<EntityId, Entity>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a freshly built entity. Returns its id.
    pub fn spawn(&mut self, entity: Entity) -> EntityId {
        let id = entity.id;
        tracing::debug!(entity = %id.0, "spawned entity");
        self.entities.insert(id, entity);
        id
    }

    /// Remove an entity, returning its final data if it existed.
    pub fn destroy(&mut self, id: EntityId) -> Option<Entity> {
        let removed = self.entities.remove(&id);
        if removed.is_some() {
            tracing::debug!(entity = %id.0, "destroyed entity");
        }
        removed
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &Entity)> {
        self.entities.iter()
    }
}
