//! Per-character instance pool.
//!
//! Instances are recycled per definition. A pool belongs to exactly one
//! scheduler, so it needs no locking; definitions come from the shared
//! registry.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use crate::state::EntityId;

use super::error::ConfigError;
use super::instance::ActionInstance;
use super::registry::ActionRegistry;
use super::types::{ActionId, InstanceId};

/// Lifetime counters of a pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolStats {
    /// Instances allocated because no free one was available.
    pub created: u64,
    pub acquired: u64,
    pub released: u64,
    /// Free instances dropped by `purge_all`.
    pub purged: u64,
}

impl PoolStats {
    /// Instances currently outside the pool.
    pub fn outstanding(&self) -> u64 {
        self.acquired - self.released
    }
}

/// Free lists of reusable instances keyed by action id.
#[derive(Debug)]
pub struct ActionPool {
    owner: EntityId,
    registry: Arc<ActionRegistry>,
    free: HashMap<ActionId, Vec<ActionInstance>>,
    next_instance: u32,
    stats: PoolStats,
}

impl ActionPool {
    pub fn new(owner: EntityId, registry: Arc<ActionRegistry>) -> Self {
        Self {
            owner,
            registry,
            free: HashMap::new(),
            next_instance: 0,
            stats: PoolStats::default(),
        }
    }

    pub fn registry(&self) -> &Arc<ActionRegistry> {
        &self.registry
    }

    /// Takes a free instance of `action`, creating one if the free list is empty.
    ///
    /// # Errors
    ///
    /// `ConfigError::UnknownAction` if the registry has no prototype for `action`.
    pub fn acquire(&mut self, action: ActionId) -> Result<ActionInstance, ConfigError> {
        let recycled = self.free.get_mut(&action).and_then(Vec::pop);
        let instance = match recycled {
            Some(instance) => instance,
            None => {
                let definition = self
                    .registry
                    .get(action)
                    .ok_or(ConfigError::UnknownAction(action))?;
                let id = InstanceId(self.next_instance);
                self.next_instance += 1;
                self.stats.created += 1;
                trace!(
                    target: "game_core::pool",
                    owner = %self.owner,
                    %action,
                    instance = id.0,
                    "instance created"
                );
                ActionInstance::new(id, self.owner, Arc::clone(definition))
            }
        };
        self.stats.acquired += 1;
        Ok(instance)
    }

    /// Resets `instance` and returns it to its free list.
    ///
    /// Taking the instance by value is what guarantees a single release.
    pub fn release(&mut self, mut instance: ActionInstance) {
        instance.reset();
        self.stats.released += 1;
        self.free
            .entry(instance.action_id())
            .or_default()
            .push(instance);
    }

    /// Drops every free instance.
    pub fn purge_all(&mut self) {
        let dropped: usize = self.free.values().map(Vec::len).sum();
        self.stats.purged += dropped as u64;
        self.free.clear();
    }

    /// Total free instances across all actions.
    pub fn free_count(&self) -> usize {
        self.free.values().map(Vec::len).sum()
    }

    pub fn free_count_of(&self, action: ActionId) -> usize {
        self.free.get(&action).map_or(0, Vec::len)
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionBehavior, ActionDefinition, ActionRequest};

    fn pool() -> ActionPool {
        let registry = ActionRegistry::new([ActionDefinition::new(
            ActionId(1),
            "slash",
            ActionBehavior::Strike,
        )])
        .unwrap();
        ActionPool::new(EntityId(0), Arc::new(registry))
    }

    #[test]
    fn released_instances_are_reused_and_reset() {
        let mut pool = pool();
        let mut first = pool.acquire(ActionId(1)).unwrap();
        let first_id = first.id();
        first.bind(ActionRequest::new(ActionId(1)).with_target(EntityId(5)));
        first.set_anticipated(true);
        pool.release(first);

        assert_eq!(pool.free_count_of(ActionId(1)), 1);
        let second = pool.acquire(ActionId(1)).unwrap();
        assert_eq!(second.id(), first_id);
        assert!(second.request().targets.is_empty());
        assert!(!second.is_anticipated());
        assert!(!second.is_started());

        let stats = pool.stats();
        assert_eq!(stats.created, 1);
        assert_eq!(stats.acquired, 2);
        assert_eq!(stats.released, 1);
        assert_eq!(stats.outstanding(), 1);
    }

    #[test]
    fn unknown_prototype_is_a_config_error() {
        let mut pool = pool();
        assert_eq!(
            pool.acquire(ActionId(99)).unwrap_err(),
            ConfigError::UnknownAction(ActionId(99))
        );
    }

    #[test]
    fn purge_drops_free_instances() {
        let mut pool = pool();
        let a = pool.acquire(ActionId(1)).unwrap();
        let b = pool.acquire(ActionId(1)).unwrap();
        pool.release(a);
        pool.release(b);
        pool.purge_all();

        assert_eq!(pool.free_count(), 0);
        assert_eq!(pool.stats().purged, 2);
        assert_eq!(pool.acquire(ActionId(1)).unwrap().id(), InstanceId(2));
    }
}
