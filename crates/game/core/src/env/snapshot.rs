//! In-process physics adapter backed by a collider snapshot.
//!
//! The host captures a snapshot from the world arena at the start of every
//! tick and hands it to the scheduler as its [`PhysicsOracle`]. Colliders are
//! spheres; queries are brute force, which is plenty for a match-sized arena.

use crate::state::{EntityId, Vec3, World};

use super::{CollisionLayers, PhysicsOracle, RaycastHit};

/// Sphere collider captured from a world object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Collider {
    pub entity: EntityId,
    pub center: Vec3,
    pub radius: f32,
    pub layer: CollisionLayers,
}

/// Immutable collider set implementing [`PhysicsOracle`].
#[derive(Clone, Debug, Default)]
pub struct PhysicsSnapshot {
    colliders: Vec<Collider>,
}

impl PhysicsSnapshot {
    /// Captures every live object with a positive radius.
    pub fn capture(world: &World) -> Self {
        let colliders = world
            .iter()
            .filter(|object| object.radius > 0.0 && object.is_alive())
            .map(|object| Collider {
                entity: object.id,
                center: object.position,
                radius: object.radius,
                layer: CollisionLayers::of(object.kind),
            })
            .collect();
        Self { colliders }
    }

    pub fn from_colliders(colliders: Vec<Collider>) -> Self {
        Self { colliders }
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    fn masked(&self, mask: CollisionLayers) -> impl Iterator<Item = &Collider> {
        self.colliders
            .iter()
            .filter(move |collider| mask.intersects(collider.layer))
    }
}

impl PhysicsOracle for PhysicsSnapshot {
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: CollisionLayers,
    ) -> Vec<RaycastHit> {
        let dir = direction.normalized();
        if dir == Vec3::ZERO {
            return Vec::new();
        }

        let mut hits: Vec<RaycastHit> = self
            .masked(mask)
            .filter_map(|collider| {
                // Ray-sphere intersection; origins inside the sphere hit at 0.
                let to_center = collider.center - origin;
                let along = to_center.dot(dir);
                let closest_sq = to_center.dot(to_center) - along * along;
                let radius_sq = collider.radius * collider.radius;
                if closest_sq > radius_sq {
                    return None;
                }
                let half_chord = (radius_sq - closest_sq).sqrt();
                let entry = along - half_chord;
                let distance = if entry < 0.0 { along + half_chord } else { entry };
                if distance < 0.0 || distance > max_distance {
                    return None;
                }
                let distance = if entry < 0.0 { 0.0 } else { distance };
                Some(RaycastHit {
                    entity: collider.entity,
                    distance,
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.entity.cmp(&b.entity))
        });
        hits
    }

    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: CollisionLayers) -> Vec<EntityId> {
        self.masked(mask)
            .filter(|collider| collider.center.distance(center) <= radius + collider.radius)
            .map(|collider| collider.entity)
            .collect()
    }

    fn overlap_cone(
        &self,
        origin: Vec3,
        direction: Vec3,
        range: f32,
        half_angle_deg: f32,
        mask: CollisionLayers,
    ) -> Vec<EntityId> {
        let axis = direction.normalized();
        let cos_limit = half_angle_deg.clamp(0.0, 180.0).to_radians().cos();

        self.masked(mask)
            .filter(|collider| {
                let offset = collider.center - origin;
                let distance = offset.length();
                if distance > range + collider.radius {
                    return false;
                }
                // Colliders wrapping the apex are always inside.
                if distance <= collider.radius || axis == Vec3::ZERO {
                    return true;
                }
                offset.dot(axis) / distance >= cos_limit
            })
            .map(|collider| collider.entity)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collider(id: u32, x: f32, z: f32) -> Collider {
        Collider {
            entity: EntityId(id),
            center: Vec3::new(x, 0.0, z),
            radius: 0.5,
            layer: CollisionLayers::CHARACTERS,
        }
    }

    #[test]
    fn raycast_orders_hits_by_distance() {
        let physics = PhysicsSnapshot::from_colliders(vec![
            collider(1, 0.0, 6.0),
            collider(2, 0.0, 2.0),
            collider(3, 4.0, 4.0),
        ]);

        let hits = physics.raycast(Vec3::ZERO, Vec3::FORWARD, 10.0, CollisionLayers::TARGETABLE);
        let ids: Vec<_> = hits.iter().map(|hit| hit.entity).collect();
        assert_eq!(ids, vec![EntityId(2), EntityId(1)]);
        assert!((hits[0].distance - 1.5).abs() < 1e-4);
    }

    #[test]
    fn raycast_respects_max_distance_and_mask() {
        let mut far = collider(1, 0.0, 20.0);
        far.layer = CollisionLayers::CHARACTERS;
        let mut projectile = collider(2, 0.0, 2.0);
        projectile.layer = CollisionLayers::PROJECTILES;
        let physics = PhysicsSnapshot::from_colliders(vec![far, projectile]);

        let hits = physics.raycast(Vec3::ZERO, Vec3::FORWARD, 10.0, CollisionLayers::TARGETABLE);
        assert!(hits.is_empty());
    }

    #[test]
    fn cone_filters_by_angle() {
        let physics = PhysicsSnapshot::from_colliders(vec![
            collider(1, 0.0, 3.0),
            collider(2, 3.0, 0.0),
            collider(3, 0.0, -3.0),
        ]);

        let mut hits = physics.overlap_cone(
            Vec3::ZERO,
            Vec3::FORWARD,
            5.0,
            45.0,
            CollisionLayers::CHARACTERS,
        );
        hits.sort();
        assert_eq!(hits, vec![EntityId(1)]);
    }

    #[test]
    fn sphere_includes_touching_colliders() {
        let physics =
            PhysicsSnapshot::from_colliders(vec![collider(1, 0.0, 2.4), collider(2, 0.0, 2.6)]);
        let hits = physics.overlap_sphere(Vec3::ZERO, 2.0, CollisionLayers::CHARACTERS);
        assert_eq!(hits, vec![EntityId(1)]);
    }
}
