//! Action execution engine shared by the server runtime and clients.
//!
//! `game-core` defines the canonical rules: data-driven action definitions,
//! their per-use instances, the effect pipeline and the per-character
//! scheduler. It has no I/O; hosts supply the world, a physics oracle and the
//! clock, and drain an [`engine::Outbox`] after every step.
pub mod action;
pub mod config;
pub mod engine;
pub mod env;
pub mod error;
pub mod state;

pub use action::{
    ActionBehavior, ActionDefinition, ActionEffect, ActionError, ActionId, ActionInstance,
    ActionOrigin, ActionPool, ActionRegistry, ActionRequest, BlockingMode, BuffKind, ConfigError,
    EffectKind, GameplayActivity, LifecyclePoint, RequestFlags, SlotId, TargetingMode,
};
pub use config::EngineConfig;
pub use engine::{
    ActionScheduler, ActivityNotice, CancelReason, Notification, Outbox, SubmitOutcome,
    TickContext, tick_projectiles,
};
pub use env::{PhysicsOracle, PhysicsSnapshot};
pub use error::{ErrorSeverity, GameError};
pub use state::{EntityId, GameObject, GameTime, StatusFlags, Team, Vec3, World};
