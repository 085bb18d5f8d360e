//! Core identifier and event types shared by the action system.

use std::fmt;

use crate::state::{EntityId, GameTime, Vec3};

/// Identifier of an [`ActionDefinition`](super::ActionDefinition).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ActionId(pub u16);

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "action:{}", self.0)
    }
}

/// Input slot an action was triggered from (e.g., hotbar index).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SlotId(pub u8);

/// Pool-assigned identity of an action instance; stable across reuse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId(pub u32);

/// Derived value that running actions may modulate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::IntoStaticStr, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BuffKind {
    /// Multiplier on incoming damage.
    DamageReceived,
    /// Multiplier on incoming healing.
    HealingReceived,
    /// Multiplier on movement speed.
    MoveSpeed,
}

impl BuffKind {
    /// Baseline before any running action modifies it.
    pub const fn unbuffed_value(self) -> f32 {
        match self {
            Self::DamageReceived | Self::HealingReceived | Self::MoveSpeed => 1.0,
        }
    }
}

/// Opaque gameplay events broadcast to a character's running actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GameplayActivity {
    /// The character started a hostile action.
    UsedAttack,
    /// The character took damage from an enemy.
    AttackedByEnemy,
    /// The character was healed.
    Healed,
    /// The character was stunned.
    Stunned,
    /// The player released the input that is charging an action.
    StoppedChargingUp,
}

/// What an effect actually did to its target.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AppliedValue {
    /// Damage was dealt.
    Damage {
        /// Damage after charge power and the target's modifier.
        planned: u32,
        /// Health actually removed.
        actual: u32,
    },

    /// Healing was applied.
    Healing { planned: u32, actual: u32 },

    /// Target was pushed.
    Movement { from: Vec3, to: Vec3 },

    /// Target is stunned until the given time.
    Stunned { until: GameTime },

    /// A projectile object was spawned.
    ProjectileSpawned { projectile: EntityId },

    /// The target could not receive the effect (no health, already dead).
    Nothing,
}

/// Result of applying one effect to one target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectOutcome {
    pub target: EntityId,
    pub value: AppliedValue,
}
