//! Action definitions - the immutable template behind every instance.
//!
//! Definitions are loaded from RON data files by the content crate and shared
//! read-only through [`ActionRegistry`](super::ActionRegistry).

use crate::state::GameTime;

use super::behavior::ActionBehavior;
use super::effect::{ActionEffect, LifecyclePoint};
use super::targeting::TargetingMode;
use super::types::ActionId;

/// When an action occupies the owner's single blocking slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BlockingMode {
    /// Blocks until the action ends.
    #[default]
    EntireDuration,
    /// Blocks until the action has executed, then keeps running in the background.
    OnlyDuringExecutionTime,
    /// Runs in the background from the moment it starts.
    Never,
}

/// Granularity of the cooldown ledger entry written on start.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CooldownScope {
    /// One cooldown per action, regardless of the slot it was used from.
    #[default]
    Action,
    /// Separate cooldown per (action, slot) pair.
    Slot,
}

/// Charge-up parameters; presence makes an action chargeable.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ChargeParams {
    /// Charge releases automatically after this long. Zero charges until released.
    pub max_charge_time: GameTime,
    /// Execute even when released before `max_charge_time`.
    pub execute_if_not_full: bool,
    /// Charge time at which each stage is reached, ascending.
    pub stage_times: Vec<GameTime>,
    /// Power multiplier per stage; same length as `stage_times`.
    pub stage_multipliers: Vec<f32>,
}

impl ChargeParams {
    /// Multiplier of the highest stage reached after charging for `charge_time`.
    pub fn multiplier_at(&self, charge_time: GameTime) -> f32 {
        self.stage_times
            .iter()
            .zip(&self.stage_multipliers)
            .filter(|(reached_at, _)| **reached_at <= charge_time)
            .map(|(_, multiplier)| *multiplier)
            .last()
            .unwrap_or(1.0)
    }

    pub fn is_full(&self, charge_time: GameTime) -> bool {
        !self.max_charge_time.is_zero() && charge_time >= self.max_charge_time
    }
}

/// Burst parameters: extra executions after the first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RetriggerParams {
    pub repeats: u8,
    pub interval: GameTime,
}

/// Which running actions a new one may displace, and whether it can be displaced.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct InterruptionRules {
    /// A non-queued submit may cancel this action while it is the blocking head.
    pub interruptible: bool,
    /// On submit and start, cancel running actions listed in `cancellable`.
    pub cancels_other_actions: bool,
    /// Actions this one may cancel even when they are not interruptible.
    pub cancellable: Vec<ActionId>,
    /// Only cancel `cancellable` actions running from the same slot.
    pub require_shared_slot: bool,
}

impl Default for InterruptionRules {
    fn default() -> Self {
        Self {
            interruptible: true,
            cancels_other_actions: false,
            cancellable: Vec::new(),
            require_shared_slot: false,
        }
    }
}

/// Complete, immutable description of an action.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionDefinition {
    pub id: ActionId,
    pub name: String,
    pub behavior: ActionBehavior,

    #[cfg_attr(feature = "serde", serde(default))]
    pub targeting: TargetingMode,

    /// Time from start to the first execution.
    #[cfg_attr(feature = "serde", serde(default))]
    pub execution_delay: GameTime,

    #[cfg_attr(feature = "serde", serde(default))]
    pub cooldown: GameTime,

    #[cfg_attr(feature = "serde", serde(default))]
    pub cooldown_scope: CooldownScope,

    #[cfg_attr(feature = "serde", serde(default))]
    pub blocking: BlockingMode,

    /// Hard lifetime cap. Zero means no cap.
    #[cfg_attr(feature = "serde", serde(default))]
    pub max_active_duration: GameTime,

    #[cfg_attr(feature = "serde", serde(default))]
    pub charge: Option<ChargeParams>,

    #[cfg_attr(feature = "serde", serde(default))]
    pub retrigger: Option<RetriggerParams>,

    #[cfg_attr(feature = "serde", serde(default))]
    pub interruption: InterruptionRules,

    #[cfg_attr(feature = "serde", serde(default))]
    pub effects: Vec<ActionEffect>,

    /// Stop distance used when a chase is synthesized in front of this action.
    #[cfg_attr(feature = "serde", serde(default))]
    pub range: f32,

    /// Follow-up submitted after this action ends normally.
    #[cfg_attr(feature = "serde", serde(default))]
    pub chain: Option<ActionId>,

    /// Starting a hostile action breaks the owner's stealth.
    #[cfg_attr(feature = "serde", serde(default))]
    pub hostile: bool,

    /// Clients may start the visual before the server confirms it.
    #[cfg_attr(feature = "serde", serde(default))]
    pub client_anticipate: bool,
}

impl ActionDefinition {
    /// Creates a definition with default timing, no effects and no targeting.
    pub fn new(id: ActionId, name: impl Into<String>, behavior: ActionBehavior) -> Self {
        Self {
            id,
            name: name.into(),
            behavior,
            targeting: TargetingMode::None,
            execution_delay: GameTime::ZERO,
            cooldown: GameTime::ZERO,
            cooldown_scope: CooldownScope::Action,
            blocking: BlockingMode::EntireDuration,
            max_active_duration: GameTime::ZERO,
            charge: None,
            retrigger: None,
            interruption: InterruptionRules::default(),
            effects: Vec::new(),
            range: 0.0,
            chain: None,
            hostile: false,
            client_anticipate: false,
        }
    }

    pub fn with_targeting(mut self, targeting: TargetingMode) -> Self {
        self.targeting = targeting;
        self
    }

    pub fn with_execution_delay(mut self, delay: GameTime) -> Self {
        self.execution_delay = delay;
        self
    }

    pub fn with_cooldown(mut self, cooldown: GameTime, scope: CooldownScope) -> Self {
        self.cooldown = cooldown;
        self.cooldown_scope = scope;
        self
    }

    pub fn with_blocking(mut self, blocking: BlockingMode) -> Self {
        self.blocking = blocking;
        self
    }

    pub fn with_max_duration(mut self, duration: GameTime) -> Self {
        self.max_active_duration = duration;
        self
    }

    pub fn with_charge(mut self, charge: ChargeParams) -> Self {
        self.charge = Some(charge);
        self
    }

    pub fn with_retrigger(mut self, repeats: u8, interval: GameTime) -> Self {
        self.retrigger = Some(RetriggerParams { repeats, interval });
        self
    }

    pub fn with_interruption(mut self, rules: InterruptionRules) -> Self {
        self.interruption = rules;
        self
    }

    pub fn uninterruptible(mut self) -> Self {
        self.interruption.interruptible = false;
        self
    }

    pub fn cancelling(mut self, actions: impl IntoIterator<Item = ActionId>) -> Self {
        self.interruption.cancels_other_actions = true;
        self.interruption.cancellable.extend(actions);
        self
    }

    pub fn with_effect(mut self, effect: ActionEffect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_range(mut self, range: f32) -> Self {
        self.range = range;
        self
    }

    pub fn with_chain(mut self, next: ActionId) -> Self {
        self.chain = Some(next);
        self
    }

    pub fn hostile(mut self) -> Self {
        self.hostile = true;
        self
    }

    pub fn anticipated(mut self) -> Self {
        self.client_anticipate = true;
        self
    }

    /// Number of executions a non-charged action performs.
    pub fn execution_count(&self) -> u8 {
        self.retrigger.map_or(0, |r| r.repeats).saturating_add(1)
    }

    /// Time from start to the `index`-th execution (0-based).
    pub fn execution_time(&self, index: u8) -> GameTime {
        let interval = self.retrigger.map_or(GameTime::ZERO, |r| r.interval);
        self.execution_delay + interval * u64::from(index)
    }

    /// Time from start to the last scheduled execution.
    pub fn last_execution_time(&self) -> GameTime {
        self.execution_time(self.execution_count() - 1)
    }

    /// How long an entry of this action holds the blocking queue.
    ///
    /// `EntireDuration` actions without a lifetime cap count until their last
    /// execution.
    pub fn blocking_time(&self) -> GameTime {
        match self.blocking {
            BlockingMode::Never => GameTime::ZERO,
            BlockingMode::OnlyDuringExecutionTime => self.execution_delay,
            BlockingMode::EntireDuration if !self.max_active_duration.is_zero() => {
                self.max_active_duration
            }
            BlockingMode::EntireDuration => self.last_execution_time(),
        }
    }

    pub fn effects_at(&self, point: LifecyclePoint) -> impl Iterator<Item = &ActionEffect> {
        self.effects.iter().filter(move |effect| effect.point == point)
    }

    pub fn has_effects_at(&self, point: LifecyclePoint) -> bool {
        self.effects_at(point).next().is_some()
    }

    pub fn lists_cancellable(&self, other: ActionId) -> bool {
        self.interruption.cancellable.contains(&other)
    }
}
