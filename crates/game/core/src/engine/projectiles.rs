//! Projectile flight and hit resolution.
//!
//! Projectiles are world objects carrying a [`ProjectileBody`]. Each tick they
//! sweep their path with a raycast, re-enter the effect pipeline once per hit
//! (at `Execution`, against the single hit object) and expire when they run
//! out of range or pierce.

use tracing::debug;

use crate::action::{Invocation, LifecyclePoint, ResolvedOrigin, apply_effects};
use crate::env::CollisionLayers;
use crate::state::{EntityId, ProjectileBody, Relation, Vec3};

use super::TickContext;

/// Advances every projectile by one step. Returns the number of hits.
pub fn tick_projectiles(ctx: &mut TickContext<'_>) -> usize {
    let mut hits_total = 0;

    for id in ctx.world.projectile_ids() {
        let Some((position, radius, body)) = ctx
            .world
            .get(id)
            .and_then(|object| Some((object.position, object.radius, object.projectile.clone()?)))
        else {
            continue;
        };

        let direction = body.velocity.normalized();
        let travel = (body.velocity.length() * ctx.delta.as_secs_f32()).min(body.remaining_range);
        let (body, spent) = sweep(ctx, id, position, radius, travel, body, &mut hits_total);

        if spent || body.remaining_range - travel <= 0.0 {
            ctx.world.despawn(id);
            continue;
        }
        if let Some(object) = ctx.world.get_mut(id) {
            object.position = position + direction * travel;
            object.projectile = Some(ProjectileBody {
                remaining_range: body.remaining_range - travel,
                ..body
            });
        }
    }

    hits_total
}

/// Applies hit effects along this step's path. Returns the updated body and
/// whether the projectile used up its pierce.
fn sweep(
    ctx: &mut TickContext<'_>,
    id: EntityId,
    position: Vec3,
    radius: f32,
    travel: f32,
    mut body: ProjectileBody,
    hits_total: &mut usize,
) -> (ProjectileBody, bool) {
    let direction = body.velocity.normalized();
    let hits = ctx.physics.raycast(
        position,
        direction,
        travel + radius,
        CollisionLayers::TARGETABLE,
    );

    for hit in hits {
        let target = hit.entity;
        if target == body.owner || body.already_hit.contains(&target) {
            continue;
        }
        if !ctx.world.get(target).is_some_and(|object| object.is_alive()) {
            continue;
        }
        if matches!(
            ctx.world.relation(body.owner, target),
            Relation::Itself | Relation::Ally
        ) {
            continue;
        }

        let invocation = Invocation {
            owner: body.owner,
            action: body.source_action,
            origin: ResolvedOrigin {
                position,
                direction,
            },
            power: body.power,
            now: ctx.now,
        };
        apply_effects(
            LifecyclePoint::Execution,
            &body.on_hit,
            &invocation,
            &[target],
            ctx.world,
            ctx.outbox,
        );
        body.already_hit.push(target);
        *hits_total += 1;

        debug!(
            target: "game_core::projectiles",
            projectile = %id,
            owner = %body.owner,
            hit = %target,
            pierce_left = body.pierce_left,
            "projectile hit"
        );

        if body.pierce_left == 0 {
            return (body, true);
        }
        body.pierce_left -= 1;
    }

    (body, false)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::action::{ActionEffect, ActionId, DamageEffect};
    use crate::engine::{Outbox, TickContext};
    use crate::env::PhysicsSnapshot;
    use crate::state::{GameObject, GameTime, Team, World};

    struct Arena {
        world: World,
        hero: EntityId,
        outbox: Outbox,
    }

    impl Arena {
        fn new() -> Self {
            let mut world = World::new();
            let hero = world.spawn(GameObject::character(Team::Heroes, Vec3::ZERO, 100));
            Self {
                world,
                hero,
                outbox: Outbox::new(),
            }
        }

        fn fire(&mut self, speed: f32, range: f32, pierce: u8) -> EntityId {
            let on_hit: Arc<[ActionEffect]> =
                Arc::from(vec![ActionEffect::new(DamageEffect::new(10).scaled().into())]);
            let body = ProjectileBody {
                owner: self.hero,
                source_action: ActionId(1),
                velocity: Vec3::FORWARD * speed,
                remaining_range: range,
                pierce_left: pierce,
                power: 2.0,
                already_hit: Vec::new(),
                on_hit,
            };
            self.world
                .spawn(GameObject::projectile(Team::Heroes, Vec3::ZERO, 0.2, body))
        }

        fn step(&mut self, millis: u64) -> usize {
            let physics = PhysicsSnapshot::capture(&self.world);
            let delta = GameTime::from_millis(millis);
            let mut ctx = TickContext::new(delta, delta, &mut self.world, &physics, &mut self.outbox);
            tick_projectiles(&mut ctx)
        }

        fn health(&self, id: EntityId) -> u32 {
            self.world
                .get(id)
                .and_then(|object| object.health)
                .map_or(0, |hp| hp.current)
        }
    }

    #[test]
    fn hit_applies_scaled_effects_and_despawns() {
        let mut arena = Arena::new();
        let enemy = arena.world.spawn(GameObject::character(
            Team::Monsters,
            Vec3::new(0.0, 0.0, 4.0),
            100,
        ));
        let projectile = arena.fire(10.0, 20.0, 0);

        assert_eq!(arena.step(100), 0);
        assert!(arena.world.contains(projectile));
        assert_eq!(arena.step(500), 1);

        assert_eq!(arena.health(enemy), 80);
        assert!(!arena.world.contains(projectile));
        assert_eq!(arena.health(arena.hero), 100);
    }

    #[test]
    fn pierce_hits_each_target_once() {
        let mut arena = Arena::new();
        let near = arena.world.spawn(GameObject::character(
            Team::Monsters,
            Vec3::new(0.0, 0.0, 2.0),
            100,
        ));
        let far = arena.world.spawn(GameObject::character(
            Team::Monsters,
            Vec3::new(0.0, 0.0, 5.0),
            100,
        ));
        let projectile = arena.fire(10.0, 20.0, 1);

        assert_eq!(arena.step(300), 1);
        assert!(arena.world.contains(projectile));
        assert_eq!(arena.step(300), 1);

        assert_eq!(arena.health(near), 80);
        assert_eq!(arena.health(far), 80);
        assert!(!arena.world.contains(projectile));
    }

    #[test]
    fn allies_are_passed_through_and_range_expires() {
        let mut arena = Arena::new();
        let ally = arena.world.spawn(GameObject::character(
            Team::Heroes,
            Vec3::new(0.0, 0.0, 1.0),
            100,
        ));
        let projectile = arena.fire(10.0, 3.0, 0);

        assert_eq!(arena.step(200), 0);
        assert!(arena.world.contains(projectile));
        assert_eq!(arena.step(200), 0);
        assert_eq!(arena.health(ally), 100);
        assert!(!arena.world.contains(projectile));
    }
}
