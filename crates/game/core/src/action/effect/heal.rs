//! Healing effect implementation.

use crate::action::error::ActionError;
use crate::action::execute::EffectContext;
use crate::action::types::{AppliedValue, GameplayActivity};

/// Restore health to target, capped at its maximum.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HealEffect {
    pub amount: u32,
}

impl HealEffect {
    pub fn new(amount: u32) -> Self {
        Self { amount }
    }

    pub fn apply(&self, ctx: &mut EffectContext<'_>) -> Result<AppliedValue, ActionError> {
        let target = ctx
            .world
            .get_mut(ctx.target)
            .ok_or(ActionError::TargetNotFound(ctx.target))?;

        // Dead objects stay dead.
        if !target.is_alive() {
            return Ok(AppliedValue::Nothing);
        }
        let Some(health) = target.health.as_mut() else {
            return Ok(AppliedValue::Nothing);
        };

        let planned = (self.amount as f32 * target.modifiers.healing_received)
            .round()
            .max(0.0) as u32;
        let actual = health.restore(planned);

        if actual > 0 {
            ctx.outbox.activity(ctx.target, GameplayActivity::Healed);
        }

        Ok(AppliedValue::Healing { planned, actual })
    }
}
