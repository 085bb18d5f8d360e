//! Closed set of action behaviors.
//!
//! Behaviors decide how an instance progresses between start and end. The
//! per-variant logic lives on [`ActionInstance`](super::ActionInstance); this
//! module only holds the data carried by each variant.

use super::types::{BuffKind, GameplayActivity};

/// How an action progresses once started.
#[derive(Clone, Copy, Debug, Default, PartialEq, strum::IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionBehavior {
    /// Executes at the execution delay (plus retrigger repeats), then finishes.
    #[default]
    Strike,

    /// Charges until released or full, executing once with the stage multiplier.
    Charged,

    /// Multiplies a buffed value for as long as it runs.
    Buff { kind: BuffKind, multiplier: f32 },

    /// Hides the owner until it attacks or is attacked.
    Stealth,

    /// Moves the owner toward its first target until within the close distance.
    Chase { speed_multiplier: f32 },
}

impl ActionBehavior {
    /// Whether the behavior reacts to `activity` at all.
    pub fn listens_to(&self, activity: GameplayActivity) -> bool {
        match self {
            Self::Charged => activity == GameplayActivity::StoppedChargingUp,
            Self::Stealth => matches!(
                activity,
                GameplayActivity::UsedAttack | GameplayActivity::AttackedByEnemy
            ),
            Self::Strike | Self::Buff { .. } | Self::Chase { .. } => false,
        }
    }

    pub fn name(&self) -> &'static str {
        self.into()
    }
}
