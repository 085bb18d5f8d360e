//! Knockback effect implementation.

use crate::action::error::ActionError;
use crate::action::execute::EffectContext;
use crate::action::types::AppliedValue;
use crate::state::{ObjectKind, Vec3};

/// Push the target away from the action origin along the ground plane.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KnockbackEffect {
    pub distance: f32,
}

impl KnockbackEffect {
    pub fn new(distance: f32) -> Self {
        Self { distance }
    }

    pub fn apply(&self, ctx: &mut EffectContext<'_>) -> Result<AppliedValue, ActionError> {
        let origin = ctx.origin;
        let target = ctx
            .world
            .get_mut(ctx.target)
            .ok_or(ActionError::TargetNotFound(ctx.target))?;

        if target.kind == ObjectKind::Prop {
            return Ok(AppliedValue::Nothing);
        }

        // Targets standing on the origin are pushed along the aim direction.
        let mut away = (target.position - origin.position).flat().normalized();
        if away == Vec3::ZERO {
            away = origin.direction.flat().normalized();
        }

        let from = target.position;
        target.position = from + away * self.distance;

        Ok(AppliedValue::Movement {
            from,
            to: target.position,
        })
    }
}
