//! Effect execution context.

use crate::action::request::ResolvedOrigin;
use crate::action::types::ActionId;
use crate::engine::Outbox;
use crate::state::{EntityId, GameTime, Relation, World};

/// Per-invocation values shared by every effect applied at one lifecycle point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Invocation {
    /// Character whose action (or projectile) applies the effects.
    pub owner: EntityId,
    pub action: ActionId,
    pub origin: ResolvedOrigin,
    /// Charge multiplier; 1.0 outside charged executions.
    pub power: f32,
    pub now: GameTime,
}

/// Context for a single effect applied to a single target.
pub struct EffectContext<'a> {
    pub owner: EntityId,
    pub target: EntityId,
    pub action: ActionId,
    pub origin: ResolvedOrigin,
    pub power: f32,
    pub now: GameTime,

    /// Mutable world state.
    pub world: &'a mut World,

    /// Activities raised by effects (e.g., `AttackedByEnemy`) for later delivery.
    pub outbox: &'a mut Outbox,
}

impl<'a> EffectContext<'a> {
    pub fn new(
        invocation: &Invocation,
        target: EntityId,
        world: &'a mut World,
        outbox: &'a mut Outbox,
    ) -> Self {
        Self {
            owner: invocation.owner,
            target,
            action: invocation.action,
            origin: invocation.origin,
            power: invocation.power,
            now: invocation.now,
            world,
            outbox,
        }
    }

    /// Relation of the current target as seen from the owner.
    pub fn relation(&self) -> Relation {
        self.world.relation(self.owner, self.target)
    }
}
