use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use atelier_common::BlueprintId;
use atelier_world::{Blueprint, Entity, StateMap, assets};

use crate::backend::ClipboardError;

/// Document discriminator. Other document kinds may share the clipboard in
/// the future; paste only accepts this one.
pub const DOCUMENT_KIND: &str = "app";

/// Blueprint fields carried by a clipboard document. Asset references are
/// absolute fetchable URLs, never the internal `asset://` short-hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentBlueprint {
    pub id: BlueprintId,
    pub model: String,
    pub script: Option<String>,
    pub config: StateMap,
    pub preload: bool,
}

/// The portable clipboard wire contract. Field names and order are frozen:
/// copy and paste interoperate across process restarts byte-for-byte.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipboardDocument {
    #[serde(rename = "type")]
    pub kind: String,
    pub blueprint: DocumentBlueprint,
    pub quaternion: Quat,
    pub scale: Vec3,
    pub state: StateMap,
}

impl ClipboardDocument {
    /// Build the document for an entity, absolutizing every asset reference
    /// under the world's asset domain.
    pub fn for_entity(entity: &Entity, blueprint: &Blueprint, domain: &str) -> Self {
        Self {
            kind: DOCUMENT_KIND.to_string(),
            blueprint: DocumentBlueprint {
                id: blueprint.id,
                model: assets::absolutize(domain, &blueprint.model),
                script: blueprint
                    .script
                    .as_deref()
                    .map(|url| assets::absolutize(domain, url)),
                config: blueprint.config.clone(),
                preload: blueprint.preload,
            },
            quaternion: entity.transform.rotation,
            scale: entity.transform.scale,
            state: entity.state.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, ClipboardError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse and validate clipboard text. Anything that is not an `app`
    /// document is rejected here, before paste touches any store.
    pub fn from_json(text: &str) -> Result<Self, ClipboardError> {
        let doc: Self = serde_json::from_str(text)?;
        if doc.kind != DOCUMENT_KIND {
            return Err(ClipboardError::UnsupportedType(doc.kind));
        }
        Ok(doc)
    }

    /// Every asset URL the document references, in rehost order.
    pub fn asset_urls(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.blueprint.model.as_str()).chain(self.blueprint.script.as_deref())
    }
}
