use crate::action::ActionId;
use crate::state::GameTime;

/// Engine configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Queued (`SHOULD_QUEUE`) requests are dropped once the blocking queue
    /// holds at least this much pending blocking time.
    pub max_queue_time_depth: GameTime,

    /// Action synthesized in front of `SHOULD_CLOSE` requests to close the
    /// distance to their target. `None` disables chase synthesis.
    pub chase_action: Option<ActionId>,

    /// Upper bound on synthesized (chained) requests submitted per tick.
    pub max_synthesized_per_tick: usize,

    /// How long the client keeps an anticipated instance alive without a
    /// server confirmation before cancelling it.
    pub anticipation_timeout: GameTime,

    /// Fixed simulation step.
    pub tick_interval: GameTime,
}

impl EngineConfig {
    // ===== compile-time constants used as type parameters =====
    pub const MAX_ATTACHMENT_SLOTS: usize = 4;
    pub const MAX_REQUEST_TARGETS: usize = 8;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_MAX_QUEUE_TIME_DEPTH: GameTime = GameTime::from_millis(1600);
    pub const DEFAULT_MAX_SYNTHESIZED_PER_TICK: usize = 4;
    pub const DEFAULT_ANTICIPATION_TIMEOUT: GameTime = GameTime::from_secs(1);
    pub const DEFAULT_TICK_INTERVAL: GameTime = GameTime::from_millis(50);

    pub fn new() -> Self {
        Self {
            max_queue_time_depth: Self::DEFAULT_MAX_QUEUE_TIME_DEPTH,
            chase_action: None,
            max_synthesized_per_tick: Self::DEFAULT_MAX_SYNTHESIZED_PER_TICK,
            anticipation_timeout: Self::DEFAULT_ANTICIPATION_TIMEOUT,
            tick_interval: Self::DEFAULT_TICK_INTERVAL,
        }
    }

    pub fn with_chase_action(mut self, chase: ActionId) -> Self {
        self.chase_action = Some(chase);
        self
    }

    pub fn with_tick_interval(mut self, interval: GameTime) -> Self {
        self.tick_interval = interval;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
