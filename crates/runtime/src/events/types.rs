//! Event types for different topics.

use game_core::{EntityId, GameTime, GameplayActivity};
use serde::{Deserialize, Serialize};

use crate::channel::ClientId;

/// Events describing the simulation itself (not replicated to action players).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameplayEvent {
    /// A fixed step finished.
    TickCompleted {
        tick: u64,
        now: GameTime,
        notifications: usize,
        projectile_hits: usize,
    },

    /// A character's health reached zero; its actions were cancelled.
    CharacterDied { entity: EntityId, at: GameTime },

    /// A gameplay activity was delivered to a character's scheduler.
    ActivityDelivered {
        recipient: EntityId,
        activity: GameplayActivity,
    },

    /// Client input failed request-channel validation and was dropped.
    InputRejected {
        client: ClientId,
        code: String,
        reason: String,
    },
}
