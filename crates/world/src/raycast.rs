use glam::{Vec2, Vec3};

use atelier_common::EntityId;

/// Maximum projection distance for placement, in world units. Hits beyond
/// this, or misses, fall back to projecting along the view ray at exactly
/// this distance.
pub const MAX_PROJECT_DISTANCE: f32 = 50.0;

/// A world-space ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

/// A raycast result against world geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vec3,
    pub distance: f32,
    /// The entity owning the hit geometry, if any.
    pub entity: Option<EntityId>,
}

/// Raycast collaborator owned by the rendering engine. Pointer coordinates
/// are normalized [0,1]².
pub trait Raycaster {
    /// Cast from the camera through the pointer; `None` on a clean miss.
    /// A miss is not an error: callers project along [`Raycaster::view_ray`]
    /// at [`MAX_PROJECT_DISTANCE`] instead.
    fn raycast(&self, pointer: Vec2) -> Option<RayHit>;

    /// The camera ray through the pointer, for miss fallback projection.
    fn view_ray(&self, pointer: Vec2) -> Ray;
}

/// Resolve the drag target point: the hit point when one exists within the
/// projection limit, else the fixed-distance projection along the view ray.
pub fn project_or_hit(raycaster: &dyn Raycaster, pointer: Vec2) -> Vec3 {
    match raycaster.raycast(pointer) {
        Some(hit) if hit.distance <= MAX_PROJECT_DISTANCE => hit.point,
        _ => raycaster.view_ray(pointer).at(MAX_PROJECT_DISTANCE),
    }
}

/// Reference raycaster: a camera above a ground plane at y = 0, with
/// optional spherical entity targets. Pointer [0,1]² maps linearly onto a
/// `span`-sized patch of ground centered under the camera.
#[derive(Debug, Clone)]
pub struct PlaneRaycaster {
    pub eye: Vec3,
    pub span: f32,
    targets: Vec<(EntityId, Vec3, f32)>,
}

impl PlaneRaycaster {
    pub fn new(eye: Vec3, span: f32) -> Self {
        Self {
            eye,
            span,
            targets: Vec::new(),
        }
    }

    /// Register a pickable sphere so tests and the demo can put an entity
    /// under the pointer.
    pub fn add_target(&mut self, entity: EntityId, center: Vec3, radius: f32) {
        self.targets.push((entity, center, radius));
    }

    pub fn clear_targets(&mut self) {
        self.targets.clear();
    }

    fn ground_point(&self, pointer: Vec2) -> Vec3 {
        Vec3::new(
            (pointer.x - 0.5) * self.span,
            0.0,
            (pointer.y - 0.5) * self.span,
        )
    }
}

impl Raycaster for PlaneRaycaster {
    fn raycast(&self, pointer: Vec2) -> Option<RayHit> {
        let ray = self.view_ray(pointer);

        // Nearest sphere target pierced by the ray wins over the ground.
        let mut best: Option<RayHit> = None;
        for (entity, center, radius) in &self.targets {
            let to_center = *center - ray.origin;
            let along = to_center.dot(ray.direction);
            if along <= 0.0 {
                continue;
            }
            let closest = ray.at(along);
            if closest.distance(*center) <= *radius
                && best.is_none_or(|b| along < b.distance)
            {
                best = Some(RayHit {
                    point: *center,
                    distance: along,
                    entity: Some(*entity),
                });
            }
        }
        if best.is_some() {
            return best;
        }

        if ray.direction.y >= 0.0 {
            return None;
        }
        let t = -ray.origin.y / ray.direction.y;
        Some(RayHit {
            point: ray.at(t),
            distance: t,
            entity: None,
        })
    }

    fn view_ray(&self, pointer: Vec2) -> Ray {
        let target = self.ground_point(pointer);
        Ray {
            origin: self.eye,
            direction: (target - self.eye).normalize_or_zero(),
        }
    }
}
