//! Stun effect implementation.

use crate::action::error::ActionError;
use crate::action::execute::EffectContext;
use crate::action::types::{AppliedValue, GameplayActivity};
use crate::state::{GameTime, ObjectKind, StatusFlags};

/// Stun the target for a fixed duration.
///
/// Overlapping stuns keep the later expiry.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StunEffect {
    pub duration: GameTime,
}

impl StunEffect {
    pub fn new(duration: GameTime) -> Self {
        Self { duration }
    }

    pub fn apply(&self, ctx: &mut EffectContext<'_>) -> Result<AppliedValue, ActionError> {
        let until = ctx.now + self.duration;
        let target = ctx
            .world
            .get_mut(ctx.target)
            .ok_or(ActionError::TargetNotFound(ctx.target))?;

        if target.kind != ObjectKind::Character || !target.is_alive() {
            return Ok(AppliedValue::Nothing);
        }

        target.status.insert(StatusFlags::STUNNED);
        target.stunned_until = target.stunned_until.max(until);
        let until = target.stunned_until;

        ctx.outbox.activity(ctx.target, GameplayActivity::Stunned);

        Ok(AppliedValue::Stunned { until })
    }
}
