//! Validated set of action definitions.
//!
//! The registry is the only source of prototypes for action pools. It is built
//! once from content, validated eagerly, and shared read-only through `Arc`.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::EngineConfig;

use super::behavior::ActionBehavior;
use super::definition::ActionDefinition;
use super::effect::{ActionEffect, EffectKind, LifecyclePoint};
use super::error::ConfigError;
use super::targeting::TargetingMode;
use super::types::ActionId;

/// Immutable lookup of definitions by id.
#[derive(Clone, Debug, Default)]
pub struct ActionRegistry {
    definitions: BTreeMap<ActionId, Arc<ActionDefinition>>,
}

impl ActionRegistry {
    /// Builds and validates a registry.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found: duplicate ids, references to
    /// unknown actions, inconsistent charge stages, empty cancel lists,
    /// projectile hit effects outside `Execution`, or non-positive ranges.
    pub fn new(definitions: impl IntoIterator<Item = ActionDefinition>) -> Result<Self, ConfigError> {
        let mut map = BTreeMap::new();
        for definition in definitions {
            let id = definition.id;
            if map.insert(id, Arc::new(definition)).is_some() {
                return Err(ConfigError::DuplicateAction(id));
            }
        }

        let registry = Self { definitions: map };
        for definition in registry.definitions.values() {
            registry.validate(definition)?;
        }
        Ok(registry)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ActionId) -> Option<&Arc<ActionDefinition>> {
        self.definitions.get(&id)
    }

    pub fn contains(&self, id: ActionId) -> bool {
        self.definitions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ActionDefinition>> {
        self.definitions.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = ActionId> + '_ {
        self.definitions.keys().copied()
    }

    /// Checks references made by the engine configuration.
    pub fn check_config(&self, config: &EngineConfig) -> Result<(), ConfigError> {
        if let Some(chase) = config.chase_action {
            let definition = self.get(chase).ok_or(ConfigError::UnknownAction(chase))?;
            if !matches!(definition.behavior, ActionBehavior::Chase { .. }) {
                return Err(ConfigError::Invalid {
                    action: chase,
                    reason: "configured chase action does not have chase behavior",
                });
            }
        }
        Ok(())
    }

    fn validate(&self, definition: &ActionDefinition) -> Result<(), ConfigError> {
        let id = definition.id;

        if let Some(next) = definition.chain {
            self.require(id, next, "chain")?;
        }
        for &other in &definition.interruption.cancellable {
            self.require(id, other, "cancellable")?;
        }
        if definition.interruption.cancels_other_actions
            && definition.interruption.cancellable.is_empty()
        {
            return Err(ConfigError::Invalid {
                action: id,
                reason: "cancels other actions but lists none",
            });
        }

        match (&definition.behavior, &definition.charge) {
            (ActionBehavior::Charged, None) => {
                return Err(ConfigError::Invalid {
                    action: id,
                    reason: "charged behavior requires charge parameters",
                });
            }
            (_, Some(charge)) if charge.stage_times.len() != charge.stage_multipliers.len() => {
                return Err(ConfigError::ChargeStageMismatch {
                    action: id,
                    times: charge.stage_times.len(),
                    multipliers: charge.stage_multipliers.len(),
                });
            }
            (_, Some(charge)) if !charge.stage_times.is_sorted() => {
                return Err(ConfigError::Invalid {
                    action: id,
                    reason: "charge stage times must be ascending",
                });
            }
            _ => {}
        }

        if definition
            .retrigger
            .is_some_and(|retrigger| retrigger.repeats == u8::MAX)
        {
            return Err(ConfigError::Invalid {
                action: id,
                reason: "retrigger repeats must be below 255",
            });
        }

        if let ActionBehavior::Chase { speed_multiplier } = definition.behavior
            && speed_multiplier <= 0.0
        {
            return Err(ConfigError::Invalid {
                action: id,
                reason: "chase speed multiplier must be positive",
            });
        }

        if definition.range < 0.0 {
            return Err(ConfigError::Invalid {
                action: id,
                reason: "close range must not be negative",
            });
        }
        validate_targeting(id, &definition.targeting)?;
        validate_effects(id, &definition.effects)
    }

    fn require(&self, action: ActionId, referenced: ActionId, field: &'static str) -> Result<(), ConfigError> {
        if self.contains(referenced) {
            Ok(())
        } else {
            Err(ConfigError::UnknownReference {
                action,
                referenced,
                field,
            })
        }
    }
}

fn validate_targeting(id: ActionId, targeting: &TargetingMode) -> Result<(), ConfigError> {
    let invalid = |reason| Err(ConfigError::Invalid { action: id, reason });
    match *targeting {
        TargetingMode::Raycast { range, .. } if range <= 0.0 => invalid("raycast range must be positive"),
        TargetingMode::Sphere { radius, .. } if radius <= 0.0 => invalid("sphere radius must be positive"),
        TargetingMode::Cone {
            range,
            half_angle_deg,
            ..
        } if range <= 0.0 || half_angle_deg <= 0.0 || half_angle_deg > 180.0 => {
            invalid("cone needs a positive range and a half angle in (0, 180]")
        }
        TargetingMode::Explicit { max_targets: 0 } => invalid("explicit targeting needs max_targets > 0"),
        _ => Ok(()),
    }
}

fn validate_effects(id: ActionId, effects: &[ActionEffect]) -> Result<(), ConfigError> {
    for effect in effects {
        if let EffectKind::SpawnProjectile(projectile) = &effect.kind {
            if projectile.speed <= 0.0 || projectile.range <= 0.0 || projectile.radius < 0.0 {
                return Err(ConfigError::Invalid {
                    action: id,
                    reason: "projectile needs a positive speed and range",
                });
            }
            if projectile
                .on_hit
                .iter()
                .any(|hit| hit.point != LifecyclePoint::Execution)
            {
                return Err(ConfigError::Invalid {
                    action: id,
                    reason: "projectile hit effects must fire at Execution",
                });
            }
            validate_effects(id, &projectile.on_hit)?;
        }
    }
    Ok(())
}
