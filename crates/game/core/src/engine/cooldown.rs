//! Cooldown ledger.

use std::collections::HashMap;

use crate::action::{ActionDefinition, ActionId, CooldownScope, SlotId};
use crate::state::GameTime;

/// Ledger key: the action, plus the slot for slot-scoped cooldowns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CooldownKey {
    pub action: ActionId,
    pub slot: Option<SlotId>,
}

impl CooldownKey {
    pub fn for_definition(definition: &ActionDefinition, slot: SlotId) -> Self {
        Self {
            action: definition.id,
            slot: match definition.cooldown_scope {
                CooldownScope::Action => None,
                CooldownScope::Slot => Some(slot),
            },
        }
    }
}

/// Last activation time per key. Entries are recorded or overwritten, never removed.
#[derive(Clone, Debug, Default)]
pub struct CooldownLedger {
    last_used: HashMap<CooldownKey, GameTime>,
}

impl CooldownLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, key: CooldownKey, at: GameTime) {
        self.last_used.insert(key, at);
    }

    pub fn last_used(&self, key: CooldownKey) -> Option<GameTime> {
        self.last_used.get(&key).copied()
    }

    /// Most recent activation of `action` under any key.
    pub fn last_used_any(&self, action: ActionId) -> Option<GameTime> {
        self.last_used
            .iter()
            .filter(|(key, _)| key.action == action)
            .map(|(_, at)| *at)
            .max()
    }

    /// True while `now` is strictly before `last use + cooldown`.
    pub fn is_on_cooldown(&self, key: CooldownKey, cooldown: GameTime, now: GameTime) -> bool {
        !cooldown.is_zero()
            && self
                .last_used(key)
                .is_some_and(|at| now < at + cooldown)
    }

    pub fn len(&self) -> usize {
        self.last_used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_used.is_empty()
    }
}
