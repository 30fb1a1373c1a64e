use glam::Vec3;

use atelier_world::{Blueprint, Entity};

/// Manipulation mode for the on-screen gizmo rig. Exactly one is active at
/// a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GizmoMode {
    #[default]
    Translate,
    Rotate,
    Scale,
}

impl GizmoMode {
    /// Translate → Rotate → Scale → Translate.
    pub fn next(self) -> Self {
        match self {
            Self::Translate => Self::Rotate,
            Self::Rotate => Self::Scale,
            Self::Scale => Self::Translate,
        }
    }
}

/// Transient visual aid anchored to the selected entity. Never persisted or
/// synced; rebuilt every frame from the entity's current bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gizmo {
    pub mode: GizmoMode,
    /// Bounding-box center in world space.
    pub center: Vec3,
    /// Rig scale, proportional to the largest bound dimension.
    pub scale: f32,
}

/// How much larger than the entity's largest dimension the rig renders.
const RIG_SCALE: f32 = 1.2;

impl Gizmo {
    /// Build the rig for an entity. Model origins sit at the base, so the
    /// box center is half the scaled height above the position.
    pub fn for_entity(mode: GizmoMode, entity: &Entity, blueprint: &Blueprint) -> Self {
        let size = blueprint.extents * entity.transform.scale;
        Self {
            mode,
            center: entity.transform.position + Vec3::new(0.0, size.y * 0.5, 0.0),
            scale: RIG_SCALE * size.max_element(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_common::Transform;

    #[test]
    fn mode_cycles_through_all_three() {
        let mut mode = GizmoMode::Translate;
        mode = mode.next();
        assert_eq!(mode, GizmoMode::Rotate);
        mode = mode.next();
        assert_eq!(mode, GizmoMode::Scale);
        mode = mode.next();
        assert_eq!(mode, GizmoMode::Translate);
    }

    #[test]
    fn rig_anchored_to_bounds_center_and_sized() {
        let mut blueprint = Blueprint::new("asset://m.glb");
        blueprint.extents = Vec3::new(2.0, 4.0, 1.0);
        let mut entity = Entity::new(blueprint.id, Transform::default());
        entity.transform.position = Vec3::new(1.0, 0.0, 1.0);

        let gizmo = Gizmo::for_entity(GizmoMode::Rotate, &entity, &blueprint);
        assert_eq!(gizmo.center, Vec3::new(1.0, 2.0, 1.0));
        assert!((gizmo.scale - 4.8).abs() < 1e-5);
    }

    #[test]
    fn rig_scales_with_entity_scale() {
        let blueprint = Blueprint::new("asset://m.glb");
        let mut entity = Entity::new(blueprint.id, Transform::default());
        entity.transform.scale = Vec3::splat(3.0);

        let gizmo = Gizmo::for_entity(GizmoMode::Translate, &entity, &blueprint);
        assert!((gizmo.scale - 3.6).abs() < 1e-5);
    }
}
