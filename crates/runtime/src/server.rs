//! Authoritative action host.
//!
//! [`ActionServer`] owns the world arena, one [`ActionScheduler`] per
//! character and the request channel sessions. It is synchronous: the
//! simulation worker drives it on a fixed interval, tests drive it directly.
//!
//! Tick order:
//! 1. physics snapshot capture
//! 2. modifier refresh (buffed values written into world objects)
//! 3. scheduler ticks, characters in id order
//! 4. projectile flight and hits
//! 5. activity delivery (stuns clear the blocking queue)
//! 6. death handling (cancel-all)
//! 7. notification drain

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use game_core::engine::{ActiveActionInfo, CancelReason, SubmitOutcome};
use game_core::state::ObjectKind;
use game_core::{
    ActionError, ActionId, ActionRegistry, ActionRequest, ActionScheduler, BuffKind, EngineConfig,
    EntityId, GameError, GameObject, GameTime, GameplayActivity, Notification, Outbox,
    PhysicsSnapshot, SlotId, TickContext, World, tick_projectiles,
};

use crate::channel::{ClientId, InputEdge, ProtocolError, RequestValidator, Sessions};
use crate::events::GameplayEvent;

/// Everything one tick produced.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    pub tick: u64,
    pub now: GameTime,
    pub notifications: Vec<Notification>,
    pub gameplay: Vec<GameplayEvent>,
    pub projectile_hits: usize,
}

/// Synchronous authoritative host for every character's actions.
pub struct ActionServer {
    registry: Arc<ActionRegistry>,
    config: EngineConfig,
    world: World,
    schedulers: BTreeMap<EntityId, ActionScheduler>,
    sessions: Sessions,
    dead: BTreeSet<EntityId>,
    outbox: Outbox,
    /// Events raised between ticks (rejected input), flushed with the next report.
    pending_events: Vec<GameplayEvent>,
    now: GameTime,
    tick: u64,
}

impl ActionServer {
    pub fn new(registry: Arc<ActionRegistry>, config: EngineConfig) -> Self {
        Self::with_world(registry, config, World::new())
    }

    /// Hosts an existing world. Every character in it gets a scheduler.
    pub fn with_world(registry: Arc<ActionRegistry>, config: EngineConfig, world: World) -> Self {
        let schedulers = world
            .iter()
            .filter(|object| object.kind == ObjectKind::Character)
            .map(|object| {
                (
                    object.id,
                    ActionScheduler::new(object.id, Arc::clone(&registry), config.clone()),
                )
            })
            .collect();

        Self {
            registry,
            config,
            world,
            schedulers,
            sessions: Sessions::new(),
            dead: BTreeSet::new(),
            outbox: Outbox::new(),
            pending_events: Vec::new(),
            now: GameTime::ZERO,
            tick: 0,
        }
    }

    // ========================================================================
    // World management
    // ========================================================================

    /// Spawns an object. Characters get a scheduler and, with `client`, a session.
    pub fn spawn(&mut self, object: GameObject, client: Option<ClientId>) -> EntityId {
        let kind = object.kind;
        let id = self.world.spawn(object);
        if kind == ObjectKind::Character {
            self.schedulers.insert(
                id,
                ActionScheduler::new(id, Arc::clone(&self.registry), self.config.clone()),
            );
            if let Some(client) = client {
                self.sessions.bind(client, id);
            }
        }
        info!(
            target: "runtime::server",
            entity = %id,
            kind = <&'static str>::from(kind),
            client = client.map(|c| c.0),
            "object spawned"
        );
        id
    }

    /// Removes a character: cancels its actions, drops its scheduler and session.
    pub fn despawn(&mut self, id: EntityId) -> Option<GameObject> {
        if let Some(mut scheduler) = self.schedulers.remove(&id) {
            let physics = PhysicsSnapshot::capture(&self.world);
            let mut ctx = TickContext::new(
                self.now,
                GameTime::ZERO,
                &mut self.world,
                &physics,
                &mut self.outbox,
            );
            scheduler.cancel_all(CancelReason::Disconnected, &mut ctx);
        }
        self.dead.remove(&id);
        self.world.despawn(id)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn registry(&self) -> &Arc<ActionRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn now(&self) -> GameTime {
        self.now
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn scheduler(&self, id: EntityId) -> Option<&ActionScheduler> {
        self.schedulers.get(&id)
    }

    pub fn sessions(&self) -> &Sessions {
        &self.sessions
    }

    pub fn bind_client(&mut self, client: ClientId, character: EntityId) {
        self.sessions.bind(client, character);
    }

    // ========================================================================
    // Input
    // ========================================================================

    /// Handles one input edge from a client.
    ///
    /// Rejected input is logged, reported on the next tick and returned.
    pub fn handle_input(
        &mut self,
        client: ClientId,
        edge: InputEdge,
    ) -> Result<Option<SubmitOutcome>, ProtocolError> {
        match edge {
            InputEdge::Press(wire) => {
                let validated = RequestValidator {
                    sessions: &self.sessions,
                    registry: &self.registry,
                    world: &self.world,
                }
                .validate(client, wire);

                let (owner, request) = match validated {
                    Ok(validated) => validated,
                    Err(error) => {
                        self.reject(client, &error);
                        return Err(error);
                    }
                };
                // Validation already checked the action id and the owner.
                match self.submit(owner, request) {
                    Ok(outcome) => Ok(Some(outcome)),
                    Err(error) => {
                        warn!(
                            target: "runtime::server",
                            %client,
                            code = error.error_code(),
                            %error,
                            "validated request failed to submit"
                        );
                        Ok(None)
                    }
                }
            }
            InputEdge::Release => {
                let owner = match self.sessions.character_of(client) {
                    Ok(owner) => owner,
                    Err(error) => {
                        self.reject(client, &error);
                        return Err(error);
                    }
                };
                if let Some(scheduler) = self.schedulers.get_mut(&owner) {
                    scheduler.on_gameplay_activity(GameplayActivity::StoppedChargingUp);
                }
                Ok(None)
            }
        }
    }

    /// Submits a trusted request for `owner`.
    ///
    /// # Errors
    ///
    /// `ActionError::OwnerNotFound` if `owner` has no scheduler, or whatever
    /// [`ActionScheduler::submit`] reports.
    pub fn submit(
        &mut self,
        owner: EntityId,
        request: ActionRequest,
    ) -> Result<SubmitOutcome, ActionError> {
        let scheduler = self
            .schedulers
            .get_mut(&owner)
            .ok_or(ActionError::OwnerNotFound(owner))?;
        let physics = PhysicsSnapshot::capture(&self.world);
        let mut ctx = TickContext::new(
            self.now,
            GameTime::ZERO,
            &mut self.world,
            &physics,
            &mut self.outbox,
        );
        scheduler.submit(request, &mut ctx)
    }

    pub fn get_buffed_value(&self, owner: EntityId, kind: BuffKind) -> Option<f32> {
        self.schedulers
            .get(&owner)
            .map(|scheduler| scheduler.get_buffed_value(kind))
    }

    pub fn is_action_on_cooldown(
        &self,
        owner: EntityId,
        action: ActionId,
        slot: SlotId,
    ) -> bool {
        self.schedulers
            .get(&owner)
            .is_some_and(|scheduler| scheduler.is_action_on_cooldown(action, slot, self.now))
    }

    pub fn active_action(&self, owner: EntityId) -> Option<ActiveActionInfo> {
        self.schedulers
            .get(&owner)
            .and_then(ActionScheduler::active_action_info)
    }

    fn reject(&mut self, client: ClientId, error: &ProtocolError) {
        warn!(
            target: "runtime::server",
            %client,
            code = error.error_code(),
            %error,
            "input rejected"
        );
        self.pending_events.push(GameplayEvent::InputRejected {
            client,
            code: error.error_code().to_owned(),
            reason: error.to_string(),
        });
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advances the simulation by `delta`.
    pub fn tick(&mut self, delta: GameTime) -> TickReport {
        self.now += delta;
        self.tick += 1;

        let physics = PhysicsSnapshot::capture(&self.world);
        self.refresh_modifiers();

        let mut ctx = TickContext::new(
            self.now,
            delta,
            &mut self.world,
            &physics,
            &mut self.outbox,
        );
        for scheduler in self.schedulers.values_mut() {
            scheduler.tick(&mut ctx);
        }
        let projectile_hits = tick_projectiles(&mut ctx);

        let mut gameplay = std::mem::take(&mut self.pending_events);
        Self::deliver_activities(&mut self.schedulers, &mut ctx, &mut gameplay);
        Self::handle_deaths(&mut self.schedulers, &mut self.dead, &mut ctx, &mut gameplay);

        let notifications = self.outbox.take_notifications();
        gameplay.push(GameplayEvent::TickCompleted {
            tick: self.tick,
            now: self.now,
            notifications: notifications.len(),
            projectile_hits,
        });

        TickReport {
            tick: self.tick,
            now: self.now,
            notifications,
            gameplay,
            projectile_hits,
        }
    }

    /// Writes every character's buffed values into its world object.
    fn refresh_modifiers(&mut self) {
        for (id, scheduler) in &self.schedulers {
            if let Some(object) = self.world.get_mut(*id) {
                object.modifiers.damage_received =
                    scheduler.get_buffed_value(BuffKind::DamageReceived);
                object.modifiers.healing_received =
                    scheduler.get_buffed_value(BuffKind::HealingReceived);
                object.modifiers.move_speed = scheduler.get_buffed_value(BuffKind::MoveSpeed);
            }
        }
    }

    fn deliver_activities(
        schedulers: &mut BTreeMap<EntityId, ActionScheduler>,
        ctx: &mut TickContext<'_>,
        gameplay: &mut Vec<GameplayEvent>,
    ) {
        for notice in ctx.outbox.take_activities() {
            let Some(scheduler) = schedulers.get_mut(&notice.recipient) else {
                continue;
            };
            if notice.activity == GameplayActivity::Stunned {
                let cancelled = scheduler.clear_actions(false, ctx);
                debug!(
                    target: "runtime::server",
                    entity = %notice.recipient,
                    cancelled,
                    "stunned, blocking queue cleared"
                );
            }
            scheduler.on_gameplay_activity(notice.activity);
            gameplay.push(GameplayEvent::ActivityDelivered {
                recipient: notice.recipient,
                activity: notice.activity,
            });
        }
    }

    fn handle_deaths(
        schedulers: &mut BTreeMap<EntityId, ActionScheduler>,
        dead: &mut BTreeSet<EntityId>,
        ctx: &mut TickContext<'_>,
        gameplay: &mut Vec<GameplayEvent>,
    ) {
        for (id, scheduler) in schedulers.iter_mut() {
            let alive = ctx.world.get(*id).is_some_and(GameObject::is_alive);
            if alive || !dead.insert(*id) {
                continue;
            }
            scheduler.cancel_all(CancelReason::Death, ctx);
            info!(target: "runtime::server", entity = %id, at = %ctx.now, "character died");
            gameplay.push(GameplayEvent::CharacterDied {
                entity: *id,
                at: ctx.now,
            });
        }
    }
}
