//! Server action scheduler.
//!
//! One scheduler per character. It owns:
//! - the blocking queue, whose head is the single running blocking action
//! - the non-blocking set, in registration order
//! - the cooldown ledger
//! - the synthesized request FIFO (chained follow-ups)
//! - the character's instance pool
//!
//! Every instance is in exactly one of those containers or in the pool, and is
//! released exactly once: `ActionPool::release` takes it by value.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::action::{
    ActionBehavior, ActionDefinition, ActionError, ActionId, ActionInstance, ActionPool,
    ActionRegistry, ActionRequest, BuffKind, GameplayActivity, PoolStats, RequestFlags, SlotId,
};
use crate::config::EngineConfig;
use crate::error::GameError;
use crate::state::{EntityId, GameTime, StatusFlags, World};

use super::cooldown::{CooldownKey, CooldownLedger};
use super::{Notification, TickContext};

/// What happened to a submitted request by the time `submit` returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::IntoStaticStr)]
pub enum SubmitOutcome {
    /// Running, either as the blocking head or in the background.
    Started,
    /// Waiting in the blocking queue.
    Queued,
    /// Rejected at start (cooldown, failed start).
    Skipped,
    /// Not accepted (queue too deep, owner stunned or dead).
    Dropped,
}

/// Why every action of a character was cancelled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::IntoStaticStr)]
pub enum CancelReason {
    Death,
    Disconnected,
    Requested,
}

/// Snapshot of the running blocking action.
#[derive(Clone, Debug, PartialEq)]
pub struct ActiveActionInfo {
    pub action: ActionId,
    pub slot: SlotId,
    pub started_at: GameTime,
    pub targets: Vec<EntityId>,
}

enum StartResult {
    /// Started and stays at the head of the blocking queue.
    Running(ActionInstance),
    /// Started and moved to the non-blocking set.
    Promoted,
    /// Rejected and released.
    Skipped,
    /// A chase was inserted in front; the head changed.
    Deferred,
}

/// Per-character action scheduler.
#[derive(Debug)]
pub struct ActionScheduler {
    owner: EntityId,
    config: EngineConfig,
    pool: ActionPool,
    blocking: VecDeque<ActionInstance>,
    non_blocking: Vec<ActionInstance>,
    cooldowns: CooldownLedger,
    synthesized: VecDeque<ActionRequest>,
}

impl ActionScheduler {
    pub fn new(owner: EntityId, registry: Arc<ActionRegistry>, config: EngineConfig) -> Self {
        Self {
            owner,
            config,
            pool: ActionPool::new(owner, registry),
            blocking: VecDeque::new(),
            non_blocking: Vec::new(),
            cooldowns: CooldownLedger::new(),
            synthesized: VecDeque::new(),
        }
    }

    pub fn owner(&self) -> EntityId {
        self.owner
    }

    pub fn registry(&self) -> &Arc<ActionRegistry> {
        self.pool.registry()
    }

    // ========================================================================
    // Submission
    // ========================================================================

    /// Submits a request.
    ///
    /// # Errors
    ///
    /// - `ActionError::UnknownAction` if no definition exists (logged, no-op)
    /// - `ActionError::OwnerNotFound` if the owner left the world
    pub fn submit(
        &mut self,
        request: ActionRequest,
        ctx: &mut TickContext<'_>,
    ) -> Result<SubmitOutcome, ActionError> {
        let Some(definition) = self.pool.registry().get(request.action).cloned() else {
            warn!(
                target: "game_core::scheduler",
                owner = %self.owner,
                action = %request.action,
                "unknown action requested"
            );
            return Err(ActionError::UnknownAction(request.action));
        };

        let owner = ctx
            .world
            .get(self.owner)
            .ok_or(ActionError::OwnerNotFound(self.owner))?;
        if !owner.is_alive() || owner.is_stunned(ctx.now) {
            debug!(
                target: "game_core::scheduler",
                owner = %self.owner,
                action = %definition.id,
                "owner cannot act, request dropped"
            );
            return Ok(SubmitOutcome::Dropped);
        }

        if request.should_queue() {
            let depth = self.queue_time_depth(ctx.now);
            if !self.blocking.is_empty() && depth >= self.config.max_queue_time_depth {
                debug!(
                    target: "game_core::scheduler",
                    owner = %self.owner,
                    action = %definition.id,
                    %depth,
                    "queue too deep, request dropped"
                );
                return Ok(SubmitOutcome::Dropped);
            }
        } else if self.head_interruptible_by(&definition, request.slot) {
            self.cancel_blocking_queue(ctx);
        }

        let mut instance = match self.pool.acquire(request.action) {
            Ok(instance) => instance,
            Err(error) => {
                warn!(
                    target: "game_core::scheduler",
                    owner = %self.owner,
                    code = error.error_code(),
                    %error,
                    "no prototype for request"
                );
                return Err(ActionError::UnknownAction(request.action));
            }
        };
        let slot = request.slot;
        instance.bind(request);
        let instance_id = instance.id();

        if definition.interruption.cancels_other_actions {
            self.cancel_listed(&definition, slot, ctx);
        }

        self.blocking.push_back(instance);
        self.advance(ctx);

        let outcome = if let Some(entry) = self.blocking.iter().find(|i| i.id() == instance_id) {
            if entry.is_started() {
                SubmitOutcome::Started
            } else {
                SubmitOutcome::Queued
            }
        } else if self.non_blocking.iter().any(|i| i.id() == instance_id) {
            SubmitOutcome::Started
        } else {
            SubmitOutcome::Skipped
        };
        Ok(outcome)
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advances every running action by one step.
    ///
    /// Order: synthesized submissions, head promotion, head update,
    /// non-blocking updates (newest first).
    pub fn tick(&mut self, ctx: &mut TickContext<'_>) {
        for _ in 0..self.config.max_synthesized_per_tick {
            let Some(request) = self.synthesized.pop_front() else {
                break;
            };
            trace!(
                target: "game_core::scheduler",
                owner = %self.owner,
                action = %request.action,
                "submitting synthesized request"
            );
            match self.submit(request, ctx) {
                Ok(_) | Err(ActionError::UnknownAction(_)) => {}
                Err(error) => warn!(
                    target: "game_core::scheduler",
                    owner = %self.owner,
                    code = error.error_code(),
                    %error,
                    "synthesized request failed"
                ),
            }
        }

        self.advance(ctx);
        self.promote_head(ctx);
        self.update_head(ctx);
        self.update_non_blocking(ctx);
    }

    // ========================================================================
    // Cancellation
    // ========================================================================

    /// Cancels every running action and drops everything pending.
    pub fn cancel_all(&mut self, reason: CancelReason, ctx: &mut TickContext<'_>) {
        let blocking = std::mem::take(&mut self.blocking);
        for mut instance in blocking {
            if instance.is_started() {
                instance.cancel(ctx);
            }
            self.pool.release(instance);
        }
        for mut instance in std::mem::take(&mut self.non_blocking) {
            instance.cancel(ctx);
            self.pool.release(instance);
        }
        self.synthesized.clear();
        self.sync_status(ctx.world);

        ctx.outbox.notify(Notification::CancelAll { owner: self.owner });
        debug!(
            target: "game_core::scheduler",
            owner = %self.owner,
            reason = <&'static str>::from(reason),
            "all actions cancelled"
        );
    }

    /// Cancels the whole blocking queue, and the non-blocking set when
    /// `cancel_non_blocking` is set. Returns the number of running instances
    /// cancelled.
    pub fn clear_actions(&mut self, cancel_non_blocking: bool, ctx: &mut TickContext<'_>) -> usize {
        let mut cancelled = self.cancel_blocking_queue(ctx);
        if cancel_non_blocking {
            for instance in std::mem::take(&mut self.non_blocking) {
                self.cancel_instance(instance, ctx);
                cancelled += 1;
            }
        }
        cancelled
    }

    /// Cancels running instances of `action` (only those in `slot`, if given)
    /// and drops matching queued requests. Returns the number cancelled.
    pub fn cancel_by_id(
        &mut self,
        action: ActionId,
        slot: Option<SlotId>,
        ctx: &mut TickContext<'_>,
    ) -> usize {
        let matches = |instance: &ActionInstance| {
            instance.action_id() == action && slot.is_none_or(|slot| instance.slot() == slot)
        };
        let mut cancelled = 0;

        let mut kept = VecDeque::with_capacity(self.blocking.len());
        for instance in std::mem::take(&mut self.blocking) {
            if !matches(&instance) {
                kept.push_back(instance);
            } else if instance.is_started() {
                self.cancel_instance(instance, ctx);
                cancelled += 1;
            } else {
                self.pool.release(instance);
            }
        }
        self.blocking = kept;

        let mut kept = Vec::with_capacity(self.non_blocking.len());
        for instance in std::mem::take(&mut self.non_blocking) {
            if matches(&instance) {
                self.cancel_instance(instance, ctx);
                cancelled += 1;
            } else {
                kept.push(instance);
            }
        }
        self.non_blocking = kept;

        self.advance(ctx);
        cancelled
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Baseline value of `kind` folded through the head, then the
    /// non-blocking set in registration order.
    pub fn get_buffed_value(&self, kind: BuffKind) -> f32 {
        let mut value = kind.unbuffed_value();
        for instance in self.running() {
            instance.buff_value(kind, &mut value);
        }
        value
    }

    /// Broadcasts a gameplay activity to every running action.
    pub fn on_gameplay_activity(&mut self, activity: GameplayActivity) {
        if let Some(head) = self.blocking.front_mut() {
            head.on_gameplay_activity(activity);
        }
        for instance in &mut self.non_blocking {
            instance.on_gameplay_activity(activity);
        }
    }

    pub fn is_action_on_cooldown(&self, action: ActionId, slot: SlotId, now: GameTime) -> bool {
        self.pool.registry().get(action).is_some_and(|definition| {
            let key = CooldownKey::for_definition(definition, slot);
            self.cooldowns.is_on_cooldown(key, definition.cooldown, now)
        })
    }

    /// True when no use of `action` from any slot is still cooling down.
    pub fn is_reuse_time_elapsed(&self, action: ActionId, now: GameTime) -> bool {
        let Some(definition) = self.pool.registry().get(action) else {
            return true;
        };
        self.cooldowns
            .last_used_any(action)
            .is_none_or(|at| now >= at + definition.cooldown)
    }

    pub fn active_action_info(&self) -> Option<ActiveActionInfo> {
        let head = self.blocking.front()?;
        Some(ActiveActionInfo {
            action: head.action_id(),
            slot: head.slot(),
            started_at: head.time_started()?,
            targets: head.request().targets.clone(),
        })
    }

    /// Pending blocking time: every entry's blocking time minus what the head
    /// has already run.
    pub fn queue_time_depth(&self, now: GameTime) -> GameTime {
        let total = self
            .blocking
            .iter()
            .fold(GameTime::ZERO, |sum, instance| sum + instance.definition().blocking_time());
        let elapsed = self
            .blocking
            .front()
            .map_or(GameTime::ZERO, |head| head.time_running(now));
        total - elapsed
    }

    /// Started instances: the blocking head, then the non-blocking set.
    pub fn running(&self) -> impl Iterator<Item = &ActionInstance> {
        self.blocking
            .front()
            .filter(|head| head.is_started())
            .into_iter()
            .chain(self.non_blocking.iter())
    }

    pub fn blocking(&self) -> impl Iterator<Item = &ActionInstance> {
        self.blocking.iter()
    }

    pub fn non_blocking(&self) -> impl Iterator<Item = &ActionInstance> {
        self.non_blocking.iter()
    }

    pub fn blocking_len(&self) -> usize {
        self.blocking.len()
    }

    pub fn non_blocking_len(&self) -> usize {
        self.non_blocking.len()
    }

    pub fn pending_synthesized(&self) -> usize {
        self.synthesized.len()
    }

    pub fn is_idle(&self) -> bool {
        self.blocking.is_empty() && self.non_blocking.is_empty() && self.synthesized.is_empty()
    }

    pub fn pool(&self) -> &ActionPool {
        &self.pool
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    pub fn purge_pool(&mut self) {
        self.pool.purge_all();
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Starts heads until one keeps running or the queue is empty.
    fn advance(&mut self, ctx: &mut TickContext<'_>) {
        while let Some(instance) = self.blocking.pop_front() {
            if instance.is_started() {
                self.blocking.push_front(instance);
                return;
            }
            match self.start(instance, ctx) {
                StartResult::Running(instance) => {
                    self.blocking.push_front(instance);
                    return;
                }
                StartResult::Promoted | StartResult::Skipped | StartResult::Deferred => {}
            }
        }
    }

    fn start(&mut self, mut instance: ActionInstance, ctx: &mut TickContext<'_>) -> StartResult {
        let definition = Arc::clone(instance.definition());
        let now = ctx.now;

        if instance.request().should_close() {
            instance.request_mut().flags.remove(RequestFlags::SHOULD_CLOSE);
            if let Some(chase) = self.synthesize_chase(&instance, &definition) {
                self.blocking.push_front(instance);
                self.blocking.push_front(chase);
                return StartResult::Deferred;
            }
        }

        let key = CooldownKey::for_definition(&definition, instance.slot());
        if self.cooldowns.is_on_cooldown(key, definition.cooldown, now) {
            debug!(
                target: "game_core::scheduler",
                owner = %self.owner,
                action = %definition.id,
                "on cooldown, skipped"
            );
            self.pool.release(instance);
            return StartResult::Skipped;
        }

        if definition.interruption.cancels_other_actions {
            self.cancel_listed(&definition, instance.slot(), ctx);
        }

        match instance.on_start(ctx) {
            Ok(true) => {}
            Ok(false) => {
                debug!(
                    target: "game_core::scheduler",
                    owner = %self.owner,
                    action = %definition.id,
                    "action declined to start"
                );
                self.pool.release(instance);
                return StartResult::Skipped;
            }
            Err(error) => {
                warn!(
                    target: "game_core::scheduler",
                    owner = %self.owner,
                    action = %definition.id,
                    code = error.error_code(),
                    %error,
                    "action failed to start"
                );
                self.pool.release(instance);
                return StartResult::Skipped;
            }
        }

        self.cooldowns.record(key, now);
        ctx.outbox.notify(Notification::ActionStarted {
            owner: self.owner,
            request: instance.request().clone(),
            started_at: now,
        });
        debug!(
            target: "game_core::scheduler",
            owner = %self.owner,
            action = %definition.id,
            behavior = definition.behavior.name(),
            "action started"
        );

        if definition.hostile {
            for other in &mut self.non_blocking {
                other.on_gameplay_activity(GameplayActivity::UsedAttack);
            }
        }

        if instance.should_become_non_blocking(now) {
            self.non_blocking.push(instance);
            StartResult::Promoted
        } else {
            StartResult::Running(instance)
        }
    }

    fn synthesize_chase(
        &mut self,
        instance: &ActionInstance,
        definition: &ActionDefinition,
    ) -> Option<ActionInstance> {
        let chase_id = self.config.chase_action?;
        if matches!(definition.behavior, ActionBehavior::Chase { .. }) {
            return None;
        }
        let target = instance.request().primary_target()?;

        let request = ActionRequest {
            action: chase_id,
            origin: instance.request().origin,
            targets: vec![target],
            slot: instance.slot(),
            flags: RequestFlags::empty(),
            close_distance: Some(definition.range),
        };
        match self.pool.acquire(chase_id) {
            Ok(mut chase) => {
                chase.bind(request);
                trace!(
                    target: "game_core::scheduler",
                    owner = %self.owner,
                    action = %definition.id,
                    %target,
                    "chase synthesized"
                );
                Some(chase)
            }
            Err(error) => {
                warn!(
                    target: "game_core::scheduler",
                    owner = %self.owner,
                    %error,
                    "chase action unavailable"
                );
                None
            }
        }
    }

    fn promote_head(&mut self, ctx: &mut TickContext<'_>) {
        while self
            .blocking
            .front()
            .is_some_and(|head| head.should_become_non_blocking(ctx.now))
        {
            if let Some(head) = self.blocking.pop_front() {
                trace!(
                    target: "game_core::scheduler",
                    owner = %self.owner,
                    action = %head.action_id(),
                    "head promoted to non-blocking"
                );
                self.non_blocking.push(head);
            }
            self.advance(ctx);
        }
    }

    fn update_head(&mut self, ctx: &mut TickContext<'_>) {
        let Some(mut head) = self.blocking.pop_front() else {
            return;
        };
        if !head.is_started() || Self::keep_running(&mut head, ctx) {
            self.blocking.push_front(head);
            return;
        }
        self.finish(head, ctx);
        self.advance(ctx);
    }

    fn update_non_blocking(&mut self, ctx: &mut TickContext<'_>) {
        for index in (0..self.non_blocking.len()).rev() {
            if Self::keep_running(&mut self.non_blocking[index], ctx) {
                continue;
            }
            let instance = self.non_blocking.remove(index);
            self.finish(instance, ctx);
        }
    }

    /// One update; lifecycle errors are logged and stop the instance.
    fn keep_running(instance: &mut ActionInstance, ctx: &mut TickContext<'_>) -> bool {
        let running = match instance.on_update(ctx) {
            Ok(running) => running,
            Err(error) => {
                warn!(
                    target: "game_core::scheduler",
                    owner = %instance.owner(),
                    action = %instance.action_id(),
                    code = error.error_code(),
                    %error,
                    "update failed, ending action"
                );
                false
            }
        };
        running && !instance.is_expired(ctx.now)
    }

    /// Ends, notifies and releases.
    fn finish(&mut self, mut instance: ActionInstance, ctx: &mut TickContext<'_>) {
        if let Some(follow_up) = instance.end(ctx) {
            self.synthesized.push_back(follow_up);
        }
        ctx.outbox.notify(Notification::ActionEnded {
            owner: self.owner,
            action: instance.action_id(),
            slot: instance.slot(),
        });
        debug!(
            target: "game_core::scheduler",
            owner = %self.owner,
            action = %instance.action_id(),
            "action ended"
        );
        self.pool.release(instance);
        self.sync_status(ctx.world);
    }

    /// Cancels, notifies and releases a started instance.
    fn cancel_instance(&mut self, mut instance: ActionInstance, ctx: &mut TickContext<'_>) {
        instance.cancel(ctx);
        ctx.outbox.notify(Notification::CancelActions {
            owner: self.owner,
            action: instance.action_id(),
            slot: instance.slot(),
        });
        debug!(
            target: "game_core::scheduler",
            owner = %self.owner,
            action = %instance.action_id(),
            "action cancelled"
        );
        self.pool.release(instance);
        self.sync_status(ctx.world);
    }

    /// Rebuilds the owner's action-held flags from the running instances.
    fn sync_status(&self, world: &mut World) {
        let held = self
            .running()
            .fold(StatusFlags::empty(), |held, instance| held | instance.held_status());
        if let Some(owner) = world.get_mut(self.owner) {
            owner.status.remove(StatusFlags::ACTION_HELD);
            owner.status.insert(held);
        }
    }

    /// Cancels the started head and releases the unstarted rest.
    fn cancel_blocking_queue(&mut self, ctx: &mut TickContext<'_>) -> usize {
        let mut cancelled = 0;
        for instance in std::mem::take(&mut self.blocking) {
            if instance.is_started() {
                self.cancel_instance(instance, ctx);
                cancelled += 1;
            } else {
                self.pool.release(instance);
            }
        }
        cancelled
    }

    fn head_interruptible_by(&self, definition: &ActionDefinition, slot: SlotId) -> bool {
        self.blocking.front().is_some_and(|head| {
            head.is_started()
                && (head.definition().interruption.interruptible
                    || may_cancel(definition, head, slot))
        })
    }

    /// Cancels running instances listed by `definition`.
    fn cancel_listed(&mut self, definition: &ActionDefinition, slot: SlotId, ctx: &mut TickContext<'_>) {
        if self
            .blocking
            .front()
            .is_some_and(|head| head.is_started() && may_cancel(definition, head, slot))
            && let Some(head) = self.blocking.pop_front()
        {
            self.cancel_instance(head, ctx);
        }

        let mut kept = Vec::with_capacity(self.non_blocking.len());
        for instance in std::mem::take(&mut self.non_blocking) {
            if may_cancel(definition, &instance, slot) {
                self.cancel_instance(instance, ctx);
            } else {
                kept.push(instance);
            }
        }
        self.non_blocking = kept;
    }
}

/// Whether `definition` (submitted from `slot`) lists `running` as cancellable.
fn may_cancel(definition: &ActionDefinition, running: &ActionInstance, slot: SlotId) -> bool {
    definition.lists_cancellable(running.action_id())
        && (!definition.interruption.require_shared_slot || running.slot() == slot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{
        ActionEffect, AffectedTypes, BlockingMode, ChargeParams, CooldownScope, DamageEffect,
        LifecyclePoint, TargetingMode,
    };
    use crate::engine::Outbox;
    use crate::env::PhysicsSnapshot;
    use crate::state::{GameObject, Team, Vec3};

    const SLASH: ActionId = ActionId(1);
    const HEAVY: ActionId = ActionId(2);
    const AURA: ActionId = ActionId(3);
    const FINISHER: ActionId = ActionId(4);
    const CHASE: ActionId = ActionId(5);
    const BOW: ActionId = ActionId(6);
    const GUARD: ActionId = ActionId(7);
    const HASTE: ActionId = ActionId(8);
    const VANISH: ActionId = ActionId(9);
    const ANCHOR: ActionId = ActionId(10);
    const FLURRY: ActionId = ActionId(11);

    fn definitions() -> Vec<ActionDefinition> {
        let hit = |amount| {
            ActionEffect::new(DamageEffect::new(amount).into()).affecting(AffectedTypes::ENEMIES)
        };
        let melee = TargetingMode::Explicit { max_targets: 1 };
        vec![
            ActionDefinition::new(SLASH, "slash", ActionBehavior::Strike)
                .with_targeting(melee)
                .with_execution_delay(GameTime::from_millis(200))
                .with_cooldown(GameTime::from_secs(2), CooldownScope::Action)
                .with_effect(hit(10))
                .with_range(1.5)
                .hostile(),
            ActionDefinition::new(HEAVY, "heavy", ActionBehavior::Strike)
                .with_targeting(melee)
                .with_execution_delay(GameTime::from_secs(1))
                .with_effect(hit(30))
                .hostile(),
            ActionDefinition::new(
                AURA,
                "aura",
                ActionBehavior::Buff {
                    kind: BuffKind::DamageReceived,
                    multiplier: 0.5,
                },
            )
            .with_blocking(BlockingMode::Never)
            .with_max_duration(GameTime::from_secs(3)),
            ActionDefinition::new(FINISHER, "finisher", ActionBehavior::Strike)
                .with_targeting(melee)
                .with_effect(hit(5))
                .with_chain(SLASH),
            ActionDefinition::new(
                CHASE,
                "chase",
                ActionBehavior::Chase {
                    speed_multiplier: 1.0,
                },
            )
            .with_targeting(melee),
            ActionDefinition::new(BOW, "bow", ActionBehavior::Charged)
                .with_targeting(melee)
                .with_charge(ChargeParams {
                    max_charge_time: GameTime::from_secs(2),
                    execute_if_not_full: false,
                    stage_times: vec![GameTime::from_millis(500), GameTime::from_millis(1500)],
                    stage_multipliers: vec![2.0, 4.0],
                })
                .with_effect(
                    ActionEffect::new(DamageEffect::new(5).scaled().into())
                        .affecting(AffectedTypes::ENEMIES),
                ),
            ActionDefinition::new(GUARD, "guard", ActionBehavior::Strike)
                .with_execution_delay(GameTime::from_secs(2))
                .uninterruptible(),
            ActionDefinition::new(
                HASTE,
                "haste",
                ActionBehavior::Buff {
                    kind: BuffKind::DamageReceived,
                    multiplier: 0.8,
                },
            )
            .with_blocking(BlockingMode::Never)
            .cancelling([AURA]),
            ActionDefinition::new(VANISH, "vanish", ActionBehavior::Stealth)
                .with_blocking(BlockingMode::Never),
            ActionDefinition::new(ANCHOR, "anchor", ActionBehavior::Strike)
                .with_execution_delay(GameTime::from_millis(500))
                .with_blocking(BlockingMode::OnlyDuringExecutionTime)
                .with_max_duration(GameTime::from_secs(1))
                .with_effect(
                    ActionEffect::new(DamageEffect::new(1).into())
                        .at(LifecyclePoint::Cancelled)
                        .on_self(),
                ),
            ActionDefinition::new(FLURRY, "flurry", ActionBehavior::Strike)
                .with_targeting(melee)
                .with_execution_delay(GameTime::from_millis(100))
                .with_retrigger(2, GameTime::from_millis(150))
                .with_effect(hit(10))
                .hostile(),
        ]
    }

    struct Harness {
        world: World,
        hero: EntityId,
        enemy: EntityId,
        scheduler: ActionScheduler,
        outbox: Outbox,
        now: GameTime,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_config(EngineConfig::new().with_chase_action(CHASE))
        }

        fn with_config(config: EngineConfig) -> Self {
            let registry = Arc::new(ActionRegistry::new(definitions()).unwrap());
            let mut world = World::new();
            let hero = world.spawn(GameObject::character(Team::Heroes, Vec3::ZERO, 100));
            let enemy = world.spawn(GameObject::character(
                Team::Monsters,
                Vec3::new(0.0, 0.0, 1.0),
                100,
            ));
            Self {
                world,
                hero,
                enemy,
                scheduler: ActionScheduler::new(hero, registry, config),
                outbox: Outbox::default(),
                now: GameTime::ZERO,
            }
        }

        fn with_ctx<R>(&mut self, delta: GameTime, f: impl FnOnce(&mut ActionScheduler, &mut TickContext<'_>) -> R) -> R {
            let physics = PhysicsSnapshot::capture(&self.world);
            let mut ctx = TickContext::new(self.now, delta, &mut self.world, &physics, &mut self.outbox);
            f(&mut self.scheduler, &mut ctx)
        }

        fn submit(&mut self, request: ActionRequest) -> SubmitOutcome {
            self.with_ctx(GameTime::ZERO, |scheduler, ctx| scheduler.submit(request, ctx))
                .unwrap()
        }

        fn attack(&mut self, action: ActionId) -> SubmitOutcome {
            let request = ActionRequest::new(action).with_target(self.enemy);
            self.submit(request)
        }

        /// Advances the clock by `millis` and ticks once.
        fn step(&mut self, millis: u64) {
            let delta = GameTime::from_millis(millis);
            self.now += delta;
            self.with_ctx(delta, |scheduler, ctx| scheduler.tick(ctx));
        }

        fn run_for(&mut self, millis: u64) {
            for _ in 0..millis / 50 {
                self.step(50);
            }
        }

        fn notifications(&mut self) -> Vec<Notification> {
            self.outbox.take_notifications()
        }

        fn enemy_health(&self) -> u32 {
            self.world
                .get(self.enemy)
                .and_then(|o| o.health)
                .map_or(0, |hp| hp.current)
        }

        fn assert_conservation(&self) {
            let stats = self.scheduler.pool_stats();
            let live = self.scheduler.blocking_len() + self.scheduler.non_blocking_len();
            assert_eq!(
                stats.created - stats.purged,
                (self.scheduler.pool().free_count() + live) as u64
            );
            let started = self.scheduler.blocking().filter(|i| i.is_started()).count();
            assert!(started <= 1);
            assert!(self.scheduler.blocking().skip(1).all(|i| !i.is_started()));
        }
    }

    fn ended(notifications: &[Notification], action: ActionId) -> usize {
        notifications
            .iter()
            .filter(|n| matches!(n, Notification::ActionEnded { action: a, .. } if *a == action))
            .count()
    }

    fn cancelled(notifications: &[Notification], action: ActionId) -> usize {
        notifications
            .iter()
            .filter(|n| matches!(n, Notification::CancelActions { action: a, .. } if *a == action))
            .count()
    }

    fn started(notifications: &[Notification], action: ActionId) -> usize {
        notifications
            .iter()
            .filter(|n| matches!(n, Notification::ActionStarted { request, .. } if request.action == action))
            .count()
    }

    #[test]
    fn non_queued_submit_interrupts_running_head() {
        let mut h = Harness::new();
        assert_eq!(h.attack(HEAVY), SubmitOutcome::Started);
        h.step(50);

        assert_eq!(h.attack(SLASH), SubmitOutcome::Started);
        let notes = h.notifications();
        assert_eq!(cancelled(&notes, HEAVY), 1);
        assert_eq!(ended(&notes, HEAVY), 0);
        assert_eq!(h.scheduler.active_action_info().map(|i| i.action), Some(SLASH));
        h.assert_conservation();
    }

    #[test]
    fn queued_submit_waits_for_head() {
        let mut h = Harness::new();
        h.attack(SLASH);
        let queued = ActionRequest::new(HEAVY).with_target(h.enemy).queued();
        assert_eq!(h.submit(queued), SubmitOutcome::Queued);
        h.assert_conservation();

        h.run_for(250);
        let notes = h.notifications();
        assert_eq!(ended(&notes, SLASH), 1);
        assert_eq!(started(&notes, HEAVY), 1);
        assert_eq!(h.enemy_health(), 90);
        h.assert_conservation();
    }

    #[test]
    fn uninterruptible_head_is_kept() {
        let mut h = Harness::new();
        h.submit(ActionRequest::new(GUARD));
        assert_eq!(h.attack(SLASH), SubmitOutcome::Queued);
        assert_eq!(h.scheduler.active_action_info().map(|i| i.action), Some(GUARD));
    }

    #[test]
    fn never_blocking_action_is_promoted_at_start() {
        let mut h = Harness::new();
        assert_eq!(h.submit(ActionRequest::new(AURA)), SubmitOutcome::Started);
        assert_eq!(h.scheduler.blocking_len(), 0);
        assert_eq!(h.scheduler.non_blocking_len(), 1);

        // A blocking action can start alongside it.
        assert_eq!(h.attack(HEAVY), SubmitOutcome::Started);
        assert_eq!(h.scheduler.non_blocking_len(), 1);
        h.assert_conservation();
    }

    #[test]
    fn cooldown_skips_restart_until_elapsed() {
        let mut h = Harness::new();
        assert_eq!(h.attack(SLASH), SubmitOutcome::Started);
        h.run_for(500);
        h.notifications();

        assert!(h.scheduler.is_action_on_cooldown(SLASH, SlotId(0), h.now));
        assert!(!h.scheduler.is_reuse_time_elapsed(SLASH, h.now));
        assert_eq!(h.attack(SLASH), SubmitOutcome::Skipped);
        let notes = h.notifications();
        assert_eq!(started(&notes, SLASH), 0);
        assert_eq!(ended(&notes, SLASH), 0);

        h.run_for(1500);
        assert!(h.scheduler.is_reuse_time_elapsed(SLASH, h.now));
        assert_eq!(h.attack(SLASH), SubmitOutcome::Started);
        h.assert_conservation();
    }

    #[test]
    fn failed_start_gets_no_end_or_cancel() {
        let mut h = Harness::new();
        // Already within the close distance: the chase declines to start.
        let request = ActionRequest {
            close_distance: Some(2.0),
            ..ActionRequest::new(CHASE).with_target(h.enemy)
        };
        assert_eq!(h.submit(request), SubmitOutcome::Skipped);
        h.step(50);

        let notes = h.notifications();
        assert!(notes.is_empty());
        assert!(h.scheduler.is_idle());
        assert_eq!(h.scheduler.pool_stats().outstanding(), 0);
    }

    #[test]
    fn chained_follow_up_is_submitted_next_tick() {
        let mut h = Harness::new();
        h.attack(FINISHER);
        h.notifications();

        // Zero delay: executes on start, finishes on the first update.
        h.step(50);
        assert_eq!(ended(&h.notifications(), FINISHER), 1);
        assert_eq!(h.scheduler.pending_synthesized(), 1);

        h.step(50);
        assert_eq!(started(&h.notifications(), SLASH), 1);
        assert_eq!(h.scheduler.pending_synthesized(), 0);
    }

    #[test]
    fn synthesized_request_for_departed_owner_is_dropped() {
        let mut h = Harness::new();
        h.attack(FINISHER);
        h.step(50);
        assert_eq!(h.scheduler.pending_synthesized(), 1);
        h.notifications();

        h.world.despawn(h.hero);
        h.step(50);
        assert_eq!(h.scheduler.pending_synthesized(), 0);
        assert!(h.scheduler.is_idle());
        assert!(h.notifications().is_empty());
        h.assert_conservation();
    }

    #[test]
    fn should_close_synthesizes_chase_first() {
        let mut h = Harness::new();
        if let Some(enemy) = h.world.get_mut(h.enemy) {
            enemy.position = Vec3::new(0.0, 0.0, 6.0);
        }
        let request = ActionRequest::new(SLASH)
            .with_target(h.enemy)
            .with_flags(RequestFlags::SHOULD_CLOSE);
        assert_eq!(h.submit(request), SubmitOutcome::Queued);
        assert_eq!(h.scheduler.active_action_info().map(|i| i.action), Some(CHASE));

        // 4.5 units at 5 u/s.
        h.run_for(1000);
        let notes = h.notifications();
        assert_eq!(ended(&notes, CHASE), 1);
        assert_eq!(started(&notes, SLASH), 1);
        let hero = h.world.get(h.hero).map(|o| o.position).unwrap();
        assert!((hero.distance(Vec3::new(0.0, 0.0, 6.0)) - 1.5).abs() < 1e-3);
    }

    #[test]
    fn charged_release_scales_damage_by_stage() {
        let mut h = Harness::new();
        h.attack(BOW);
        h.run_for(600);
        assert_eq!(h.enemy_health(), 100);

        h.scheduler.on_gameplay_activity(GameplayActivity::StoppedChargingUp);
        h.step(50);
        // Released before full without execute_if_not_full: nothing fires.
        assert_eq!(h.enemy_health(), 100);
        assert_eq!(ended(&h.notifications(), BOW), 1);

        h.attack(BOW);
        h.run_for(2000);
        // Full charge: highest stage multiplier applies.
        assert_eq!(h.enemy_health(), 80);
    }

    #[test]
    fn buffs_fold_in_registration_order() {
        let mut h = Harness::new();
        assert_eq!(h.scheduler.get_buffed_value(BuffKind::DamageReceived), 1.0);
        h.submit(ActionRequest::new(AURA));
        assert_eq!(h.scheduler.get_buffed_value(BuffKind::DamageReceived), 0.5);
        assert_eq!(h.scheduler.get_buffed_value(BuffKind::MoveSpeed), 1.0);

        // Haste cancels the aura it lists.
        h.submit(ActionRequest::new(HASTE));
        assert_eq!(h.scheduler.get_buffed_value(BuffKind::DamageReceived), 0.8);
        assert_eq!(cancelled(&h.notifications(), AURA), 1);

        h.submit(ActionRequest::new(AURA));
        assert!((h.scheduler.get_buffed_value(BuffKind::DamageReceived) - 0.4).abs() < 1e-6);
    }

    #[test]
    fn hostile_start_breaks_stealth() {
        let mut h = Harness::new();
        h.submit(ActionRequest::new(VANISH));
        let stealthed = |h: &Harness| {
            h.world
                .get(h.hero)
                .is_some_and(|o| o.status.contains(StatusFlags::STEALTHED))
        };
        h.run_for(500);
        assert!(stealthed(&h));

        h.attack(SLASH);
        h.step(50);
        assert!(!stealthed(&h));
        assert_eq!(ended(&h.notifications(), VANISH), 1);
    }

    #[test]
    fn prevent_movement_roots_until_end() {
        let mut h = Harness::new();
        let rooted = |h: &Harness| {
            h.world
                .get(h.hero)
                .is_some_and(|o| o.status.contains(StatusFlags::ROOTED))
        };
        h.submit(
            ActionRequest::new(SLASH)
                .with_target(h.enemy)
                .with_flags(RequestFlags::PREVENT_MOVEMENT),
        );
        assert!(rooted(&h));
        h.run_for(300);
        assert!(!rooted(&h));
    }

    #[test]
    fn root_holds_while_any_rooting_action_runs() {
        let mut h = Harness::new();
        let rooted = |h: &Harness| {
            h.world
                .get(h.hero)
                .is_some_and(|o| o.status.contains(StatusFlags::ROOTED))
        };
        h.submit(ActionRequest::new(AURA).with_flags(RequestFlags::PREVENT_MOVEMENT));
        h.submit(
            ActionRequest::new(SLASH)
                .with_target(h.enemy)
                .with_flags(RequestFlags::PREVENT_MOVEMENT),
        );
        assert!(rooted(&h));

        // The slash ends at 200ms; the aura still holds the root.
        h.run_for(1000);
        assert_eq!(ended(&h.notifications(), SLASH), 1);
        assert_eq!(h.scheduler.non_blocking_len(), 1);
        assert!(rooted(&h));

        h.run_for(2500);
        assert_eq!(ended(&h.notifications(), AURA), 1);
        assert!(!rooted(&h));
    }

    #[test]
    fn broken_stealth_leaves_other_root_in_place() {
        let mut h = Harness::new();
        h.submit(ActionRequest::new(VANISH));
        h.submit(
            ActionRequest::new(SLASH)
                .with_target(h.enemy)
                .with_flags(RequestFlags::PREVENT_MOVEMENT),
        );
        h.step(50);

        let status = h.world.get(h.hero).map(|o| o.status).unwrap();
        assert!(!status.contains(StatusFlags::STEALTHED));
        assert!(status.contains(StatusFlags::ROOTED));
        assert_eq!(ended(&h.notifications(), VANISH), 1);
    }

    #[test]
    fn retriggered_strike_executes_each_interval_then_ends() {
        let mut h = Harness::new();
        assert_eq!(h.attack(FLURRY), SubmitOutcome::Started);
        assert_eq!(h.enemy_health(), 100);

        h.run_for(100);
        assert_eq!(h.enemy_health(), 90);
        h.run_for(150);
        assert_eq!(h.enemy_health(), 80);
        h.run_for(100);
        assert_eq!(h.enemy_health(), 80);
        assert_eq!(ended(&h.notifications(), FLURRY), 0);

        h.step(50);
        assert_eq!(h.enemy_health(), 70);
        assert_eq!(ended(&h.notifications(), FLURRY), 1);

        h.run_for(500);
        assert_eq!(h.enemy_health(), 70);
        assert!(h.scheduler.is_idle());
        h.assert_conservation();
    }

    #[test]
    fn deep_queue_drops_queued_requests() {
        let mut h = Harness::with_config(EngineConfig {
            max_queue_time_depth: GameTime::from_millis(1500),
            ..EngineConfig::new()
        });
        h.attack(HEAVY);
        assert_eq!(
            h.submit(ActionRequest::new(SLASH).queued()),
            SubmitOutcome::Queued
        );
        assert_eq!(h.scheduler.queue_time_depth(h.now), GameTime::from_millis(1200));

        h.submit(ActionRequest::new(HEAVY).queued());
        assert_eq!(h.scheduler.queue_time_depth(h.now), GameTime::from_millis(2200));
        assert_eq!(
            h.submit(ActionRequest::new(SLASH).queued()),
            SubmitOutcome::Dropped
        );
        h.step(500);
        assert_eq!(h.scheduler.queue_time_depth(h.now), GameTime::from_millis(1700));
        h.assert_conservation();
    }

    #[test]
    fn cancel_all_clears_everything() {
        let mut h = Harness::new();
        h.submit(ActionRequest::new(AURA));
        h.attack(HEAVY);
        h.submit(ActionRequest::new(SLASH).queued());

        h.with_ctx(GameTime::ZERO, |scheduler, ctx| {
            scheduler.cancel_all(CancelReason::Death, ctx)
        });

        assert!(h.scheduler.is_idle());
        let notes = h.notifications();
        assert_eq!(notes.last(), Some(&Notification::CancelAll { owner: h.hero }));
        assert_eq!(h.scheduler.pool_stats().outstanding(), 0);
        h.assert_conservation();
    }

    #[test]
    fn clear_actions_spares_background_unless_asked() {
        let mut h = Harness::new();
        h.submit(ActionRequest::new(AURA));
        h.attack(HEAVY);

        let cancelled_count =
            h.with_ctx(GameTime::ZERO, |scheduler, ctx| scheduler.clear_actions(false, ctx));
        assert_eq!(cancelled_count, 1);
        assert_eq!(h.scheduler.blocking_len(), 0);
        assert_eq!(h.scheduler.non_blocking_len(), 1);

        let cancelled_count =
            h.with_ctx(GameTime::ZERO, |scheduler, ctx| scheduler.clear_actions(true, ctx));
        assert_eq!(cancelled_count, 1);
        assert!(h.scheduler.is_idle());
    }

    #[test]
    fn cancel_by_id_respects_slot() {
        let mut h = Harness::new();
        h.submit(ActionRequest::new(AURA).in_slot(SlotId(2)));

        let none = h.with_ctx(GameTime::ZERO, |scheduler, ctx| {
            scheduler.cancel_by_id(AURA, Some(SlotId(1)), ctx)
        });
        assert_eq!(none, 0);

        let one = h.with_ctx(GameTime::ZERO, |scheduler, ctx| {
            scheduler.cancel_by_id(AURA, Some(SlotId(2)), ctx)
        });
        assert_eq!(one, 1);
        assert_eq!(cancelled(&h.notifications(), AURA), 1);
    }

    #[test]
    fn promoted_instance_finishes_exactly_once() {
        let mut h = Harness::new();
        h.submit(ActionRequest::new(ANCHOR));
        h.run_for(400);
        assert_eq!(h.scheduler.blocking_len(), 1);

        h.run_for(200);
        assert_eq!(h.scheduler.blocking_len(), 0);
        assert_eq!(h.scheduler.non_blocking_len(), 1);

        h.run_for(1000);
        let notes = h.notifications();
        assert_eq!(ended(&notes, ANCHOR), 1);
        assert_eq!(cancelled(&notes, ANCHOR), 0);
        assert!(h.scheduler.is_idle());
        h.assert_conservation();
    }

    #[test]
    fn unknown_action_is_rejected_without_side_effects() {
        let mut h = Harness::new();
        let err = h
            .with_ctx(GameTime::ZERO, |scheduler, ctx| {
                scheduler.submit(ActionRequest::new(ActionId(999)), ctx)
            })
            .unwrap_err();
        assert_eq!(err, ActionError::UnknownAction(ActionId(999)));
        assert!(h.scheduler.is_idle());
        assert!(h.notifications().is_empty());
    }

    #[test]
    fn stunned_owner_cannot_submit() {
        let mut h = Harness::new();
        if let Some(hero) = h.world.get_mut(h.hero) {
            hero.status.insert(StatusFlags::STUNNED);
            hero.stunned_until = GameTime::from_secs(1);
        }
        assert_eq!(h.attack(SLASH), SubmitOutcome::Dropped);
    }
}
