//! Targeting system for actions.
//!
//! Turns a resolved origin and a request's explicit ids into an ordered list
//! of target handles, using the physics oracle for spatial modes:
//! - None: no targets
//! - SelfOnly: the owner
//! - Explicit: request ids that still resolve, deduplicated
//! - Raycast / Sphere / Cone: physics hits, nearest first
//!
//! Physics modes never return the owner and break distance ties by handle so
//! resolution is deterministic.

use std::cmp::Ordering;

use crate::config::EngineConfig;
use crate::env::{CollisionLayers, PhysicsOracle};
use crate::state::{EntityId, Vec3, World};

use super::request::{ActionRequest, ResolvedOrigin};

// ============================================================================
// Targeting Mode
// ============================================================================

/// How an action selects targets.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TargetingMode {
    /// No target required.
    #[default]
    None,

    /// Action only targets the owner (self-buffs, projectile launches).
    SelfOnly,

    /// Ids supplied by the request.
    Explicit { max_targets: u8 },

    /// Objects along the aim direction.
    Raycast { range: f32, pierce: u8 },

    /// Objects overlapping a sphere around the origin.
    Sphere { radius: f32, max_hits: u8 },

    /// Objects inside a cone from the origin along the aim direction.
    Cone {
        range: f32,
        half_angle_deg: f32,
        max_hits: u8,
    },
}

impl TargetingMode {
    /// Returns true if this mode queries the physics oracle.
    pub fn uses_physics(&self) -> bool {
        matches!(
            self,
            Self::Raycast { .. } | Self::Sphere { .. } | Self::Cone { .. }
        )
    }

    /// Returns true if this mode consumes the request's target ids.
    pub fn requires_explicit_targets(&self) -> bool {
        matches!(self, Self::Explicit { .. })
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolves the targets of one lifecycle call.
pub fn resolve_targets(
    mode: &TargetingMode,
    owner: EntityId,
    origin: &ResolvedOrigin,
    request: &ActionRequest,
    world: &World,
    physics: &dyn PhysicsOracle,
) -> Vec<EntityId> {
    match *mode {
        TargetingMode::None => Vec::new(),

        TargetingMode::SelfOnly => vec![owner],

        TargetingMode::Explicit { max_targets } => {
            let cap = usize::from(max_targets).min(EngineConfig::MAX_REQUEST_TARGETS);
            let mut targets: Vec<EntityId> = Vec::with_capacity(cap);
            for &id in &request.targets {
                if targets.len() == cap {
                    break;
                }
                if world.contains(id) && !targets.contains(&id) {
                    targets.push(id);
                }
            }
            targets
        }

        TargetingMode::Raycast { range, pierce } => physics
            .raycast(
                origin.position,
                origin.direction,
                range,
                CollisionLayers::TARGETABLE,
            )
            .into_iter()
            .map(|hit| hit.entity)
            .filter(|&id| id != owner && world.contains(id))
            .take(usize::from(pierce.max(1)))
            .collect(),

        TargetingMode::Sphere { radius, max_hits } => {
            let hits = physics.overlap_sphere(origin.position, radius, CollisionLayers::TARGETABLE);
            nearest(hits, owner, origin.position, world, max_hits)
        }

        TargetingMode::Cone {
            range,
            half_angle_deg,
            max_hits,
        } => {
            let hits = physics.overlap_cone(
                origin.position,
                origin.direction,
                range,
                half_angle_deg,
                CollisionLayers::TARGETABLE,
            );
            nearest(hits, owner, origin.position, world, max_hits)
        }
    }
}

/// Sorts overlap hits by distance (ties by handle), drops the owner, caps.
fn nearest(
    hits: Vec<EntityId>,
    owner: EntityId,
    center: Vec3,
    world: &World,
    max_hits: u8,
) -> Vec<EntityId> {
    let mut ranked: Vec<(f32, EntityId)> = hits
        .into_iter()
        .filter(|&id| id != owner)
        .filter_map(|id| world.get(id).map(|o| (o.position.distance(center), id)))
        .collect();

    ranked.sort_by(|a, b| match a.0.total_cmp(&b.0) {
        Ordering::Equal => a.1.cmp(&b.1),
        other => other,
    });
    ranked.dedup_by_key(|(_, id)| *id);

    ranked
        .into_iter()
        .take(usize::from(max_hits))
        .map(|(_, id)| id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::types::ActionId;
    use crate::env::PhysicsSnapshot;
    use crate::state::{GameObject, Team};

    struct Scene {
        world: World,
        owner: EntityId,
        near: EntityId,
        far: EntityId,
        behind: EntityId,
    }

    fn scene() -> Scene {
        let mut world = World::new();
        let owner = world.spawn(GameObject::character(Team::Heroes, Vec3::ZERO, 10));
        let far = world.spawn(GameObject::character(
            Team::Monsters,
            Vec3::new(0.0, 0.0, 6.0),
            10,
        ));
        let near = world.spawn(GameObject::character(
            Team::Monsters,
            Vec3::new(0.0, 0.0, 3.0),
            10,
        ));
        let behind = world.spawn(GameObject::character(
            Team::Monsters,
            Vec3::new(0.0, 0.0, -3.0),
            10,
        ));
        Scene {
            world,
            owner,
            near,
            far,
            behind,
        }
    }

    fn origin() -> ResolvedOrigin {
        ResolvedOrigin {
            position: Vec3::ZERO,
            direction: Vec3::FORWARD,
        }
    }

    #[test]
    fn explicit_drops_stale_handles_and_duplicates() {
        let mut scene = scene();
        scene.world.despawn(scene.far);
        let request = ActionRequest::new(ActionId(1)).with_targets([
            scene.far,
            scene.near,
            scene.near,
            scene.behind,
        ]);
        let physics = PhysicsSnapshot::capture(&scene.world);

        let targets = resolve_targets(
            &TargetingMode::Explicit { max_targets: 4 },
            scene.owner,
            &origin(),
            &request,
            &scene.world,
            &physics,
        );

        assert_eq!(targets, vec![scene.near, scene.behind]);
    }

    #[test]
    fn raycast_excludes_owner_and_caps_at_pierce() {
        let scene = scene();
        let physics = PhysicsSnapshot::capture(&scene.world);
        let request = ActionRequest::new(ActionId(1));

        let single = resolve_targets(
            &TargetingMode::Raycast {
                range: 10.0,
                pierce: 1,
            },
            scene.owner,
            &origin(),
            &request,
            &scene.world,
            &physics,
        );
        assert_eq!(single, vec![scene.near]);

        let piercing = resolve_targets(
            &TargetingMode::Raycast {
                range: 10.0,
                pierce: 5,
            },
            scene.owner,
            &origin(),
            &request,
            &scene.world,
            &physics,
        );
        assert_eq!(piercing, vec![scene.near, scene.far]);
    }

    #[test]
    fn sphere_orders_by_distance_then_id() {
        let mut scene = scene();
        let tie = scene.world.spawn(GameObject::character(
            Team::Monsters,
            Vec3::new(3.0, 0.0, 0.0),
            10,
        ));
        let physics = PhysicsSnapshot::capture(&scene.world);

        let targets = resolve_targets(
            &TargetingMode::Sphere {
                radius: 4.0,
                max_hits: 3,
            },
            scene.owner,
            &origin(),
            &ActionRequest::new(ActionId(1)),
            &scene.world,
            &physics,
        );

        // near, tie and behind are all 3.0 away; far is out of range.
        assert_eq!(targets, vec![scene.near, scene.behind, tie]);
    }

    #[test]
    fn cone_only_hits_in_front() {
        let scene = scene();
        let physics = PhysicsSnapshot::capture(&scene.world);

        let targets = resolve_targets(
            &TargetingMode::Cone {
                range: 8.0,
                half_angle_deg: 30.0,
                max_hits: 8,
            },
            scene.owner,
            &origin(),
            &ActionRequest::new(ActionId(1)),
            &scene.world,
            &physics,
        );

        assert_eq!(targets, vec![scene.near, scene.far]);
    }
}
