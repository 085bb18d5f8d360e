//! Projectile spawn effect implementation.

use std::sync::Arc;

use crate::action::error::ActionError;
use crate::action::execute::EffectContext;
use crate::action::types::AppliedValue;
use crate::state::{GameObject, ProjectileBody, Team};

use super::ActionEffect;

/// Spawn a projectile at the action origin, flying along the aim direction.
///
/// The target the effect is applied to is irrelevant; definitions usually
/// apply it once to the owner. `on_hit` effects fire at `Execution` against
/// each object the projectile hits.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpawnProjectileEffect {
    /// Units per second.
    pub speed: f32,
    /// Distance travelled before the projectile expires.
    pub range: f32,
    pub radius: f32,
    /// Additional objects passed through after the first hit.
    #[cfg_attr(feature = "serde", serde(default))]
    pub pierce: u8,
    pub on_hit: Arc<[ActionEffect]>,
}

impl SpawnProjectileEffect {
    pub fn new(speed: f32, range: f32, on_hit: Vec<ActionEffect>) -> Self {
        Self {
            speed,
            range,
            radius: 0.2,
            pierce: 0,
            on_hit: on_hit.into(),
        }
    }

    pub fn with_pierce(mut self, pierce: u8) -> Self {
        self.pierce = pierce;
        self
    }

    pub fn apply(&self, ctx: &mut EffectContext<'_>) -> Result<AppliedValue, ActionError> {
        let team = ctx
            .world
            .get(ctx.owner)
            .map_or(Team::Neutral, |owner| owner.team);

        let body = ProjectileBody {
            owner: ctx.owner,
            source_action: ctx.action,
            velocity: ctx.origin.direction.normalized() * self.speed,
            remaining_range: self.range,
            pierce_left: self.pierce,
            power: ctx.power,
            already_hit: Vec::new(),
            on_hit: Arc::clone(&self.on_hit),
        };
        let projectile = ctx.world.spawn(GameObject::projectile(
            team,
            ctx.origin.position,
            self.radius,
            body,
        ));

        Ok(AppliedValue::ProjectileSpawned { projectile })
    }
}
