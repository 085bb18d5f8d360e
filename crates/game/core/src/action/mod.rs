//! Action domain - definitions, requests, instances and effects.
//!
//! The action system is data-driven:
//! - `ActionDefinition`: immutable template loaded from content
//! - `ActionRequest`: one invocation (origin, targets, slot, flags)
//! - `ActionInstance`: definition + request + runtime progress
//! - `ActionEffect`: stateless effects keyed by lifecycle point
//! - `TargetingMode`: how an instance resolves its targets
//!
//! # Module Structure
//!
//! - `types`: identifiers, buff kinds, gameplay activities, effect outcomes
//! - `request`: requests, origins and request flags
//! - `definition`: definitions and their timing/interruption parameters
//! - `behavior`: the closed set of behaviors
//! - `effect`: effect definitions (Damage, Heal, Knockback, Stun, SpawnProjectile)
//! - `targeting`: targeting modes and the resolver
//! - `execute`: effect pipeline
//! - `instance`: per-use lifecycle (start, update, end, cancel)
//! - `pool`: per-character instance recycling
//! - `registry`: validated definition lookup
//! - `error`: `ActionError` and `ConfigError`

pub mod behavior;
pub mod definition;
pub mod effect;
pub mod error;
pub mod execute;
pub mod instance;
pub mod pool;
pub mod registry;
pub mod request;
pub mod targeting;
pub mod types;

// Re-export commonly used types
pub use behavior::ActionBehavior;
pub use definition::{
    ActionDefinition, BlockingMode, ChargeParams, CooldownScope, InterruptionRules,
    RetriggerParams,
};
pub use effect::{
    ActionEffect, AffectedTypes, DamageEffect, EffectKind, HealEffect, KnockbackEffect,
    LifecyclePoint, SpawnProjectileEffect, StunEffect,
};
pub use error::{ActionError, ConfigError};
pub use execute::{EffectContext, Invocation, apply_effects};
pub use instance::ActionInstance;
pub use pool::{ActionPool, PoolStats};
pub use registry::ActionRegistry;
pub use request::{ActionOrigin, ActionRequest, RequestFlags, ResolvedOrigin};
pub use targeting::{TargetingMode, resolve_targets};
pub use types::{
    ActionId, AppliedValue, BuffKind, EffectOutcome, GameplayActivity, InstanceId, SlotId,
};
