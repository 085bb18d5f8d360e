//! Effect pipeline.
//!
//! Applies every effect registered for a lifecycle point to a resolved target
//! set:
//! - targets are visited in resolution order, effects in definition order
//! - an effect reaches a target only if its `affects` filter admits the
//!   target's relation to the owner
//! - `auto_target_self` effects reach the owner exactly once
//!
//! ## Error Handling
//!
//! A failing effect never aborts the pipeline. Each error is logged with its
//! code and the pipeline moves on to the next (effect, target) pair.

mod context;

use tracing::warn;

use crate::action::effect::{ActionEffect, LifecyclePoint};
use crate::action::types::EffectOutcome;
use crate::engine::Outbox;
use crate::error::GameError;
use crate::state::{EntityId, Relation, World};

pub use context::{EffectContext, Invocation};

/// Applies the effects registered for `point` to `targets`.
///
/// Returns one outcome per effect application that succeeded.
pub fn apply_effects(
    point: LifecyclePoint,
    effects: &[ActionEffect],
    invocation: &Invocation,
    targets: &[EntityId],
    world: &mut World,
    outbox: &mut Outbox,
) -> Vec<EffectOutcome> {
    let effects: Vec<&ActionEffect> = effects.iter().filter(|e| e.point == point).collect();
    if effects.is_empty() {
        return Vec::new();
    }

    let mut outcomes = Vec::new();

    for &target in targets {
        let relation = world.relation(invocation.owner, target);
        for effect in effects.iter().filter(|e| e.affects.admits(relation)) {
            apply_one(effect, invocation, target, world, outbox, &mut outcomes);
        }
    }

    let owner_targeted = targets.contains(&invocation.owner);
    for effect in effects.iter().filter(|e| e.auto_target_self) {
        if owner_targeted && effect.affects.admits(Relation::Itself) {
            continue;
        }
        apply_one(effect, invocation, invocation.owner, world, outbox, &mut outcomes);
    }

    outcomes
}

fn apply_one(
    effect: &ActionEffect,
    invocation: &Invocation,
    target: EntityId,
    world: &mut World,
    outbox: &mut Outbox,
    outcomes: &mut Vec<EffectOutcome>,
) {
    let mut ctx = EffectContext::new(invocation, target, world, outbox);
    match effect.kind.apply(&mut ctx) {
        Ok(value) => outcomes.push(EffectOutcome { target, value }),
        Err(error) => warn!(
            target: "game_core::effects",
            action = %invocation.action,
            effect = effect.kind.name(),
            entity = %target,
            code = error.error_code(),
            error = %error,
            "effect skipped"
        ),
    }
}
