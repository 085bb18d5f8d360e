use crate::env::PhysicsOracle;
use crate::state::{GameTime, World};

use super::Outbox;

/// Everything a scheduler needs for one call: the clock, the world, physics
/// queries and the outbox.
pub struct TickContext<'a> {
    pub now: GameTime,
    /// Length of the current step.
    pub delta: GameTime,
    pub world: &'a mut World,
    pub physics: &'a dyn PhysicsOracle,
    pub outbox: &'a mut Outbox,
}

impl<'a> TickContext<'a> {
    pub fn new(
        now: GameTime,
        delta: GameTime,
        world: &'a mut World,
        physics: &'a dyn PhysicsOracle,
        outbox: &'a mut Outbox,
    ) -> Self {
        Self {
            now,
            delta,
            world,
            physics,
            outbox,
        }
    }
}
