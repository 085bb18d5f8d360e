//! Effect kind enum and dispatcher.

use crate::action::error::ActionError;
use crate::action::execute::EffectContext;
use crate::action::types::AppliedValue;

use super::damage::DamageEffect;
use super::heal::HealEffect;
use super::knockback::KnockbackEffect;
use super::projectile::SpawnProjectileEffect;
use super::stun::StunEffect;

/// The actual effect to apply.
///
/// Each variant delegates to its corresponding struct implementation.
#[derive(Clone, Debug, PartialEq, strum::IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectKind {
    Damage(DamageEffect),
    Heal(HealEffect),
    Knockback(KnockbackEffect),
    Stun(StunEffect),
    SpawnProjectile(SpawnProjectileEffect),
}

impl EffectKind {
    /// Dispatch to the concrete effect.
    pub fn apply(&self, ctx: &mut EffectContext<'_>) -> Result<AppliedValue, ActionError> {
        match self {
            Self::Damage(effect) => effect.apply(ctx),
            Self::Heal(effect) => effect.apply(ctx),
            Self::Knockback(effect) => effect.apply(ctx),
            Self::Stun(effect) => effect.apply(ctx),
            Self::SpawnProjectile(effect) => effect.apply(ctx),
        }
    }

    pub fn name(&self) -> &'static str {
        self.into()
    }
}

impl From<DamageEffect> for EffectKind {
    fn from(effect: DamageEffect) -> Self {
        Self::Damage(effect)
    }
}

impl From<HealEffect> for EffectKind {
    fn from(effect: HealEffect) -> Self {
        Self::Heal(effect)
    }
}

impl From<KnockbackEffect> for EffectKind {
    fn from(effect: KnockbackEffect) -> Self {
        Self::Knockback(effect)
    }
}

impl From<StunEffect> for EffectKind {
    fn from(effect: StunEffect) -> Self {
        Self::Stun(effect)
    }
}

impl From<SpawnProjectileEffect> for EffectKind {
    fn from(effect: SpawnProjectileEffect) -> Self {
        Self::SpawnProjectile(effect)
    }
}
