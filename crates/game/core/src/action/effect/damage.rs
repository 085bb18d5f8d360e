//! Damage effect implementation.

use crate::action::error::ActionError;
use crate::action::execute::EffectContext;
use crate::action::types::{AppliedValue, GameplayActivity};
use crate::state::Relation;

/// Deal damage to target.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageEffect {
    pub amount: u32,
    /// Multiply by the instance power (charge stage multiplier).
    #[cfg_attr(feature = "serde", serde(default))]
    pub scales_with_charge: bool,
}

impl DamageEffect {
    pub fn new(amount: u32) -> Self {
        Self {
            amount,
            scales_with_charge: false,
        }
    }

    pub fn scaled(mut self) -> Self {
        self.scales_with_charge = true;
        self
    }

    /// Apply damage to target.
    ///
    /// Enemies that take damage receive `AttackedByEnemy`. A target reaching
    /// zero health is left in the arena; the host handles death.
    pub fn apply(&self, ctx: &mut EffectContext<'_>) -> Result<AppliedValue, ActionError> {
        let power = if self.scales_with_charge { ctx.power } else { 1.0 };
        let relation = ctx.relation();

        let target = ctx
            .world
            .get_mut(ctx.target)
            .ok_or(ActionError::TargetNotFound(ctx.target))?;

        if !target.is_alive() {
            return Ok(AppliedValue::Nothing);
        }
        let Some(health) = target.health.as_mut() else {
            return Ok(AppliedValue::Nothing);
        };

        let planned = (self.amount as f32 * power * target.modifiers.damage_received)
            .round()
            .max(0.0) as u32;
        let actual = health.drain(planned);

        if actual > 0 && relation == Relation::Enemy {
            ctx.outbox
                .activity(ctx.target, GameplayActivity::AttackedByEnemy);
        }

        Ok(AppliedValue::Damage { planned, actual })
    }
}
