//! Action effect system - stateless, parametrized effects applied to targets.
//!
//! An action carries a list of [`ActionEffect`]s, each keyed by the lifecycle
//! point at which it fires and filtered by how the target relates to the owner.
//!
//! # Architecture
//!
//! Same enum + struct hybrid used throughout the action module:
//! - Individual effect types are structs (`DamageEffect`, `StunEffect`, ...)
//! - [`EffectKind`] wraps them for serialization and `match` dispatch
//! - Each struct implements `apply(&self, &mut EffectContext)`
//!
//! Effects hold no state of their own. Projectiles spawned by
//! [`SpawnProjectileEffect`] own their lifetime through a projectile body on a
//! world object and re-enter the pipeline on hit.

mod damage;
mod heal;
mod kinds;
mod knockback;
mod phase;
mod projectile;
mod stun;

use bitflags::bitflags;

use crate::state::Relation;

pub use damage::DamageEffect;
pub use heal::HealEffect;
pub use kinds::EffectKind;
pub use knockback::KnockbackEffect;
pub use phase::LifecyclePoint;
pub use projectile::SpawnProjectileEffect;
pub use stun::StunEffect;

bitflags! {
    /// Relations an effect is allowed to reach.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct AffectedTypes: u8 {
        const SELF = 1 << 0;
        const ALLIES = 1 << 1;
        const ENEMIES = 1 << 2;
        const OTHERS = 1 << 3;
    }
}

impl AffectedTypes {
    /// Whether a target with the given relation to the owner passes the filter.
    pub fn admits(self, relation: Relation) -> bool {
        let required = match relation {
            Relation::Itself => Self::SELF,
            Relation::Ally => Self::ALLIES,
            Relation::Enemy => Self::ENEMIES,
            Relation::Other => Self::OTHERS,
        };
        self.contains(required)
    }
}

impl Default for AffectedTypes {
    fn default() -> Self {
        Self::all()
    }
}

// ============================================================================
// Action Effect (with lifecycle point and target filter)
// ============================================================================

/// Complete effect specification as stored on a definition.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionEffect {
    /// The actual effect to apply.
    pub kind: EffectKind,

    /// Lifecycle point at which the effect fires.
    #[cfg_attr(feature = "serde", serde(default))]
    pub point: LifecyclePoint,

    /// Target relations that receive the effect.
    #[cfg_attr(feature = "serde", serde(default))]
    pub affects: AffectedTypes,

    /// Always apply to the owner exactly once, even when not resolved as a target.
    #[cfg_attr(feature = "serde", serde(default))]
    pub auto_target_self: bool,
}

impl ActionEffect {
    /// Creates an effect firing at `Execution` for every relation.
    pub fn new(kind: EffectKind) -> Self {
        Self {
            kind,
            point: LifecyclePoint::Execution,
            affects: AffectedTypes::all(),
            auto_target_self: false,
        }
    }

    /// Builder: set lifecycle point.
    pub fn at(mut self, point: LifecyclePoint) -> Self {
        self.point = point;
        self
    }

    /// Builder: restrict the relations reached.
    pub fn affecting(mut self, affects: AffectedTypes) -> Self {
        self.affects = affects;
        self
    }

    /// Builder: always include the owner.
    pub fn on_self(mut self) -> Self {
        self.auto_target_self = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affected_types_filter_relations() {
        let hostile = AffectedTypes::ENEMIES | AffectedTypes::OTHERS;
        assert!(hostile.admits(Relation::Enemy));
        assert!(hostile.admits(Relation::Other));
        assert!(!hostile.admits(Relation::Ally));
        assert!(!hostile.admits(Relation::Itself));
        assert!(AffectedTypes::default().admits(Relation::Itself));
    }
}
