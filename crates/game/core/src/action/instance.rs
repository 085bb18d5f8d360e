//! Running action instances.
//!
//! An [`ActionInstance`] pairs a shared definition with one request and the
//! runtime progress of a single use. Instances are created and recycled by the
//! [`ActionPool`](super::ActionPool) and are owned by exactly one of: the pool
//! free list, the scheduler's blocking queue, or its non-blocking set. Moving
//! the value between those containers is the ownership transfer.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::engine::TickContext;
use crate::error::GameError;
use crate::state::{EntityId, GameTime, StatusFlags, World};

use super::behavior::ActionBehavior;
use super::definition::{ActionDefinition, BlockingMode};
use super::effect::LifecyclePoint;
use super::error::ActionError;
use super::execute::{Invocation, apply_effects};
use super::request::{ActionRequest, RequestFlags};
use super::targeting::resolve_targets;
use super::types::{ActionId, BuffKind, GameplayActivity, InstanceId, SlotId};

/// Behavior progress of one use; cleared on reset.
#[derive(Clone, Debug, PartialEq)]
struct Progress {
    executions_done: u8,
    release_pending: bool,
    power: f32,
    finished: bool,
    /// Status flags this instance holds on its owner while running.
    held_status: StatusFlags,
}

impl Progress {
    fn new() -> Self {
        Self {
            executions_done: 0,
            release_pending: false,
            power: 1.0,
            finished: false,
            held_status: StatusFlags::empty(),
        }
    }
}

/// Definition + request + runtime state of one action use.
#[derive(Debug)]
pub struct ActionInstance {
    id: InstanceId,
    owner: EntityId,
    definition: Arc<ActionDefinition>,
    request: ActionRequest,
    time_started: Option<GameTime>,
    is_anticipated: bool,
    progress: Progress,
}

impl ActionInstance {
    pub(crate) fn new(id: InstanceId, owner: EntityId, definition: Arc<ActionDefinition>) -> Self {
        Self {
            id,
            owner,
            definition,
            request: ActionRequest::default(),
            time_started: None,
            is_anticipated: false,
            progress: Progress::new(),
        }
    }

    // ===== accessors =====

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn owner(&self) -> EntityId {
        self.owner
    }

    pub fn definition(&self) -> &Arc<ActionDefinition> {
        &self.definition
    }

    pub fn action_id(&self) -> ActionId {
        self.definition.id
    }

    pub fn request(&self) -> &ActionRequest {
        &self.request
    }

    pub fn slot(&self) -> SlotId {
        self.request.slot
    }

    pub fn time_started(&self) -> Option<GameTime> {
        self.time_started
    }

    pub fn is_started(&self) -> bool {
        self.time_started.is_some()
    }

    pub fn is_anticipated(&self) -> bool {
        self.is_anticipated
    }

    pub fn set_anticipated(&mut self, anticipated: bool) {
        self.is_anticipated = anticipated;
    }

    /// Current charge multiplier (1.0 until a charged execution).
    pub fn power(&self) -> f32 {
        self.progress.power
    }

    pub fn executions_done(&self) -> u8 {
        self.progress.executions_done
    }

    pub fn has_executed(&self) -> bool {
        self.progress.executions_done > 0
    }

    /// Flags this instance holds on its owner. The scheduler rebuilds the
    /// owner's held flags from its running instances after every teardown.
    pub fn held_status(&self) -> StatusFlags {
        self.progress.held_status
    }

    pub fn time_running(&self, now: GameTime) -> GameTime {
        self.time_started
            .map_or(GameTime::ZERO, |started| now.since(started))
    }

    /// Stop distance for chase behaviors.
    pub fn close_distance(&self) -> f32 {
        self.request.close_distance.unwrap_or(self.definition.range)
    }

    // ===== pool lifecycle =====

    /// Attaches `request` to an unstarted instance.
    pub fn bind(&mut self, request: ActionRequest) {
        debug_assert!(!self.is_started(), "binding a started instance");
        self.request = request;
    }

    pub(crate) fn request_mut(&mut self) -> &mut ActionRequest {
        &mut self.request
    }

    /// Returns the instance to its pooled state.
    pub(crate) fn reset(&mut self) {
        self.request = ActionRequest::default();
        self.time_started = None;
        self.is_anticipated = false;
        self.progress = Progress::new();
    }

    /// Stamps the start time without running any gameplay logic.
    ///
    /// The client player uses this for visual-only instances.
    pub fn begin(&mut self, now: GameTime) {
        self.time_started = Some(now);
    }

    // ===== blocking / expiry queries =====

    /// Whether the instance should leave the blocking slot.
    pub fn should_become_non_blocking(&self, now: GameTime) -> bool {
        if !self.is_started() {
            return false;
        }
        match self.definition.blocking {
            BlockingMode::Never => true,
            BlockingMode::EntireDuration => false,
            BlockingMode::OnlyDuringExecutionTime => match self.definition.behavior {
                ActionBehavior::Charged => self.has_executed(),
                _ => self.time_running(now) >= self.definition.execution_delay,
            },
        }
    }

    /// True once the lifetime cap (if any) has elapsed.
    pub fn is_expired(&self, now: GameTime) -> bool {
        let cap = self.definition.max_active_duration;
        self.is_started() && !cap.is_zero() && self.time_running(now) >= cap
    }

    // ===== gameplay lifecycle =====

    /// Starts the instance. `Ok(false)` means "do not run"; the caller must
    /// release the instance without ending or cancelling it.
    ///
    /// # Errors
    ///
    /// - `ActionError::OwnerNotFound` if the owner left the world
    /// - origin resolution errors (missing source, invalid slot)
    pub fn on_start(&mut self, ctx: &mut TickContext<'_>) -> Result<bool, ActionError> {
        self.begin(ctx.now);

        let owner = ctx
            .world
            .get(self.owner)
            .ok_or(ActionError::OwnerNotFound(self.owner))?;

        if let ActionBehavior::Chase { .. } = self.definition.behavior {
            let target = self
                .request
                .primary_target()
                .and_then(|id| ctx.world.get(id))
                .filter(|target| target.is_alive());
            let Some(target) = target else {
                debug!(
                    target: "game_core::action",
                    owner = %self.owner,
                    action = %self.action_id(),
                    "chase target missing"
                );
                return Ok(false);
            };
            if owner.position.flat().distance(target.position.flat()) <= self.close_distance() {
                trace!(
                    target: "game_core::action",
                    owner = %self.owner,
                    "already in range, chase not needed"
                );
                return Ok(false);
            }
        }

        self.fire(LifecyclePoint::Start, ctx)?;

        match self.definition.behavior {
            ActionBehavior::Strike | ActionBehavior::Buff { .. } | ActionBehavior::Stealth => {
                self.run_due_executions(ctx)?;
            }
            ActionBehavior::Charged | ActionBehavior::Chase { .. } => {}
        }

        let mut status = StatusFlags::empty();
        if self.request.prevents_movement() {
            status |= StatusFlags::ROOTED;
        }
        if self.definition.behavior == ActionBehavior::Stealth {
            status |= StatusFlags::STEALTHED;
        }
        self.hold_status(ctx.world, status);

        Ok(true)
    }

    /// Advances the instance by one tick. `Ok(false)` means it has finished.
    pub fn on_update(&mut self, ctx: &mut TickContext<'_>) -> Result<bool, ActionError> {
        if self.progress.finished {
            return Ok(false);
        }

        match self.definition.behavior {
            ActionBehavior::Strike => {
                self.run_due_executions(ctx)?;
                let complete = self.progress.executions_done >= self.definition.execution_count();
                Ok(!complete || !self.definition.max_active_duration.is_zero())
            }
            ActionBehavior::Charged => self.update_charge(ctx),
            ActionBehavior::Buff { .. } | ActionBehavior::Stealth => {
                self.run_due_executions(ctx)?;
                Ok(true)
            }
            ActionBehavior::Chase { speed_multiplier } => self.update_chase(speed_multiplier, ctx),
        }
    }

    /// Ends the instance normally and returns the chained follow-up, if any.
    pub fn end(&mut self, ctx: &mut TickContext<'_>) -> Option<ActionRequest> {
        if let Err(error) = self.fire(LifecyclePoint::End, ctx) {
            self.log_lifecycle_error("end", &error);
        }
        self.progress.held_status = StatusFlags::empty();

        self.definition.chain.map(|next| ActionRequest {
            action: next,
            origin: self.request.origin,
            targets: self.request.targets.clone(),
            slot: self.request.slot,
            flags: self.request.flags & RequestFlags::PREVENT_MOVEMENT,
            close_distance: None,
        })
    }

    /// Cancels the instance. Cancelled instances never chain.
    pub fn cancel(&mut self, ctx: &mut TickContext<'_>) {
        if let Err(error) = self.fire(LifecyclePoint::Cancelled, ctx) {
            self.log_lifecycle_error("cancel", &error);
        }
        self.progress.held_status = StatusFlags::empty();
    }

    /// Folds this instance's buff into `value`.
    pub fn buff_value(&self, kind: BuffKind, value: &mut f32) {
        if !self.is_started() {
            return;
        }
        if let ActionBehavior::Buff {
            kind: buffed,
            multiplier,
        } = self.definition.behavior
            && buffed == kind
        {
            *value *= multiplier;
        }
    }

    pub fn on_gameplay_activity(&mut self, activity: GameplayActivity) {
        if !self.is_started() || !self.definition.behavior.listens_to(activity) {
            return;
        }
        trace!(
            target: "game_core::action",
            owner = %self.owner,
            action = %self.action_id(),
            activity = <&'static str>::from(activity),
            "activity received"
        );
        match self.definition.behavior {
            ActionBehavior::Charged => self.progress.release_pending = true,
            ActionBehavior::Stealth => self.progress.finished = true,
            _ => {}
        }
    }

    // ===== internals =====

    fn run_due_executions(&mut self, ctx: &mut TickContext<'_>) -> Result<(), ActionError> {
        let elapsed = self.time_running(ctx.now);
        let count = self.definition.execution_count();
        while self.progress.executions_done < count
            && elapsed >= self.definition.execution_time(self.progress.executions_done)
        {
            self.execute(ctx)?;
        }
        Ok(())
    }

    fn execute(&mut self, ctx: &mut TickContext<'_>) -> Result<(), ActionError> {
        self.fire(LifecyclePoint::Execution, ctx)?;
        self.progress.executions_done = self.progress.executions_done.saturating_add(1);
        Ok(())
    }

    fn update_charge(&mut self, ctx: &mut TickContext<'_>) -> Result<bool, ActionError> {
        let keep_alive = !self.definition.max_active_duration.is_zero();
        if self.has_executed() {
            return Ok(keep_alive);
        }

        let definition = Arc::clone(&self.definition);
        let Some(charge) = definition.charge.as_ref() else {
            return Ok(false);
        };

        let charge_time = self.time_running(ctx.now);
        let full = charge.is_full(charge_time);
        if !full && !self.progress.release_pending {
            return Ok(true);
        }
        if !full && !charge.execute_if_not_full {
            debug!(
                target: "game_core::action",
                owner = %self.owner,
                action = %definition.id,
                charged = %charge_time,
                "released before full charge"
            );
            self.progress.finished = true;
            return Ok(false);
        }

        self.progress.power = charge.multiplier_at(charge_time);
        self.execute(ctx)?;
        Ok(keep_alive)
    }

    fn update_chase(
        &mut self,
        speed_multiplier: f32,
        ctx: &mut TickContext<'_>,
    ) -> Result<bool, ActionError> {
        let target_position = self
            .request
            .primary_target()
            .and_then(|id| ctx.world.get(id))
            .filter(|target| target.is_alive())
            .map(|target| target.position);
        let Some(target_position) = target_position else {
            return Ok(false);
        };

        let stop = self.close_distance();
        let owner = ctx
            .world
            .get_mut(self.owner)
            .ok_or(ActionError::OwnerNotFound(self.owner))?;

        let offset = (target_position - owner.position).flat();
        let distance = offset.length();
        if distance <= stop {
            return Ok(false);
        }

        let direction = offset.normalized();
        owner.facing = direction;
        if owner.status.contains(StatusFlags::ROOTED) || owner.is_stunned(ctx.now) {
            return Ok(true);
        }

        let speed = owner.move_speed * owner.modifiers.move_speed * speed_multiplier;
        let step = speed * ctx.delta.as_secs_f32();
        if distance - step <= stop {
            owner.position = owner.position + direction * (distance - stop);
            return Ok(false);
        }
        owner.position = owner.position + direction * step;
        Ok(true)
    }

    /// Resolves targets and applies the effects registered for `point`.
    fn fire(&self, point: LifecyclePoint, ctx: &mut TickContext<'_>) -> Result<(), ActionError> {
        if !self.definition.has_effects_at(point) {
            return Ok(());
        }

        let origin = self.request.origin.resolve(ctx.world)?;
        let targets = resolve_targets(
            &self.definition.targeting,
            self.owner,
            &origin,
            &self.request,
            ctx.world,
            ctx.physics,
        );
        let invocation = Invocation {
            owner: self.owner,
            action: self.definition.id,
            origin,
            power: match point {
                LifecyclePoint::Execution => self.progress.power,
                _ => 1.0,
            },
            now: ctx.now,
        };

        let outcomes = apply_effects(
            point,
            &self.definition.effects,
            &invocation,
            &targets,
            ctx.world,
            ctx.outbox,
        );
        trace!(
            target: "game_core::action",
            owner = %self.owner,
            action = %self.definition.id,
            point = <&'static str>::from(point),
            targets = targets.len(),
            applied = outcomes.len(),
            "effects fired"
        );
        Ok(())
    }

    fn hold_status(&mut self, world: &mut World, status: StatusFlags) {
        if status.is_empty() {
            return;
        }
        if let Some(owner) = world.get_mut(self.owner) {
            owner.status.insert(status);
            self.progress.held_status = status;
        }
    }

    fn log_lifecycle_error(&self, stage: &'static str, error: &ActionError) {
        warn!(
            target: "game_core::action",
            owner = %self.owner,
            action = %self.action_id(),
            stage,
            code = error.error_code(),
            error = %error,
            "lifecycle effects failed"
        );
    }
}
