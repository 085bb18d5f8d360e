use bitflags::bitflags;

use crate::state::{EntityId, ObjectKind, Vec3};

bitflags! {
    /// Collision layers used to filter physics queries.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct CollisionLayers: u32 {
        const CHARACTERS = 1 << 0;
        const PROJECTILES = 1 << 1;
        const PROPS = 1 << 2;
        /// Objects actions may target (characters and breakable props).
        const TARGETABLE = Self::CHARACTERS.bits() | Self::PROPS.bits();
    }
}

impl CollisionLayers {
    /// Layer an object of the given kind lives on.
    pub fn of(kind: ObjectKind) -> Self {
        match kind {
            ObjectKind::Character => Self::CHARACTERS,
            ObjectKind::Projectile => Self::PROJECTILES,
            ObjectKind::Prop => Self::PROPS,
        }
    }
}

/// A single raycast hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RaycastHit {
    pub entity: EntityId,
    /// Distance from the ray origin to the hit surface.
    pub distance: f32,
}

/// Black-box physics query service.
///
/// Implementations must return raycast hits ordered by ascending distance.
/// Overlap queries may return hits in any order; callers sort them.
pub trait PhysicsOracle {
    /// Casts a ray and returns every hit up to `max_distance`, nearest first.
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: CollisionLayers,
    ) -> Vec<RaycastHit>;

    /// Returns every object whose collider intersects the sphere.
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: CollisionLayers) -> Vec<EntityId>;

    /// Returns every object inside the cone defined by apex, axis, range and
    /// half angle (degrees).
    fn overlap_cone(
        &self,
        origin: Vec3,
        direction: Vec3,
        range: f32,
        half_angle_deg: f32,
        mask: CollisionLayers,
    ) -> Vec<EntityId>;
}
