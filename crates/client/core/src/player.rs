//! Client-side visual mirror of one character's actions.
//!
//! The player never runs gameplay logic. It plays visuals for actions the
//! server reports through replication notifications and may start them early
//! (anticipation) when a definition opts in. Anticipated instances that the
//! server does not confirm within the configured timeout are cancelled.
//!
//! # Architecture
//!
//! - `PlayerChanges`: bitflags describing what a call changed (for selective redraw)
//! - `ClientActionPlayer`: owns a pool shard and the playing instances

use std::sync::Arc;

use bitflags::bitflags;
use tracing::{debug, trace, warn};

use game_core::action::PoolStats;
use game_core::{
    ActionId, ActionInstance, ActionPool, ActionRegistry, ActionRequest, EngineConfig, EntityId,
    GameTime, Notification, SlotId,
};
use runtime::Event;

use crate::sink::VisualSink;

bitflags! {
    /// What a player call changed.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct PlayerChanges: u8 {
        const STARTED   = 0b00001;
        const CONFIRMED = 0b00010;
        const UNBLOCKED = 0b00100;
        const ENDED     = 0b01000;
        const CANCELLED = 0b10000;

        /// Anything that removed an instance.
        const STOPPED = Self::ENDED.bits() | Self::CANCELLED.bits();
    }
}

struct Playing {
    instance: ActionInstance,
    /// Visually blocking until the instance would leave the blocking slot.
    blocking: bool,
}

/// Visual action player for one character.
pub struct ClientActionPlayer {
    owner: EntityId,
    pool: ActionPool,
    anticipation_timeout: GameTime,
    /// In start order.
    playing: Vec<Playing>,
}

impl ClientActionPlayer {
    pub fn new(owner: EntityId, registry: Arc<ActionRegistry>, config: &EngineConfig) -> Self {
        Self {
            owner,
            pool: ActionPool::new(owner, registry),
            anticipation_timeout: config.anticipation_timeout,
            playing: Vec::new(),
        }
    }

    pub fn owner(&self) -> EntityId {
        self.owner
    }

    /// Starts the visual of `request` before the server confirms it.
    ///
    /// Returns `false` (and plays nothing) for unknown actions and for
    /// definitions that do not allow anticipation.
    pub fn anticipate(
        &mut self,
        request: ActionRequest,
        now: GameTime,
        sink: &mut impl VisualSink,
    ) -> bool {
        let action = request.action;
        let allowed = self
            .pool
            .registry()
            .get(action)
            .map(|definition| definition.client_anticipate);
        match allowed {
            None => {
                warn!(
                    target: "client_core::player",
                    owner = %self.owner,
                    %action,
                    "cannot anticipate unknown action"
                );
                false
            }
            Some(false) => false,
            Some(true) => {
                self.start(request, now, true, sink);
                true
            }
        }
    }

    /// Mirrors one replication notification. Notifications for other owners
    /// are ignored.
    pub fn on_notification(
        &mut self,
        notification: &Notification,
        sink: &mut impl VisualSink,
    ) -> PlayerChanges {
        if notification.owner() != self.owner {
            return PlayerChanges::empty();
        }

        match notification {
            Notification::ActionStarted {
                request,
                started_at,
                ..
            } => self.confirm_or_start(request, *started_at, sink),
            Notification::CancelAll { .. } => self.cancel_all(sink),
            Notification::CancelActions { action, slot, .. } => {
                match self.find_confirmed(*action, *slot) {
                    Some(index) => {
                        self.stop(index, false, sink);
                        PlayerChanges::CANCELLED
                    }
                    None => PlayerChanges::empty(),
                }
            }
            Notification::ActionEnded { action, slot, .. } => {
                match self.find_confirmed(*action, *slot) {
                    Some(index) => {
                        self.stop(index, true, sink);
                        PlayerChanges::ENDED
                    }
                    None => {
                        trace!(
                            target: "client_core::player",
                            owner = %self.owner,
                            %action,
                            "end for an action that is not playing"
                        );
                        PlayerChanges::empty()
                    }
                }
            }
        }
    }

    /// Feeds a runtime event; only replication events matter.
    pub fn apply_event(&mut self, event: &Event, sink: &mut impl VisualSink) -> PlayerChanges {
        match event {
            Event::Replication(notification) => self.on_notification(notification, sink),
            Event::Gameplay(_) => PlayerChanges::empty(),
        }
    }

    /// Expires unconfirmed anticipations and updates the visual blocking split.
    pub fn update(&mut self, now: GameTime, sink: &mut impl VisualSink) -> PlayerChanges {
        let mut changes = PlayerChanges::empty();

        let mut index = 0;
        while index < self.playing.len() {
            let instance = &self.playing[index].instance;
            if instance.is_anticipated()
                && instance.time_running(now) >= self.anticipation_timeout
            {
                debug!(
                    target: "client_core::player",
                    owner = %self.owner,
                    action = %instance.action_id(),
                    "anticipation not confirmed in time"
                );
                self.stop(index, false, sink);
                changes |= PlayerChanges::CANCELLED;
                continue;
            }
            index += 1;
        }

        for entry in &mut self.playing {
            if entry.blocking && entry.instance.should_become_non_blocking(now) {
                entry.blocking = false;
                sink.on_visual_unblocked(&entry.instance);
                changes |= PlayerChanges::UNBLOCKED;
            }
        }

        changes
    }

    /// Cancels every playing instance, anticipated ones included.
    pub fn cancel_all(&mut self, sink: &mut impl VisualSink) -> PlayerChanges {
        if self.playing.is_empty() {
            return PlayerChanges::empty();
        }
        while !self.playing.is_empty() {
            self.stop(self.playing.len() - 1, false, sink);
        }
        PlayerChanges::CANCELLED
    }

    /// Whether any playing instance still blocks the character visually.
    pub fn is_visually_blocking(&self) -> bool {
        self.playing.iter().any(|entry| entry.blocking)
    }

    pub fn playing(&self) -> impl Iterator<Item = &ActionInstance> {
        self.playing.iter().map(|entry| &entry.instance)
    }

    pub fn anticipated_count(&self) -> usize {
        self.playing
            .iter()
            .filter(|entry| entry.instance.is_anticipated())
            .count()
    }

    pub fn len(&self) -> usize {
        self.playing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.playing.is_empty()
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    fn confirm_or_start(
        &mut self,
        request: &ActionRequest,
        started_at: GameTime,
        sink: &mut impl VisualSink,
    ) -> PlayerChanges {
        let anticipated = self.playing.iter_mut().find(|entry| {
            entry.instance.is_anticipated() && entry.instance.action_id() == request.action
        });
        if let Some(entry) = anticipated {
            entry.instance.set_anticipated(false);
            sink.on_visual_confirmed(&entry.instance);
            return PlayerChanges::CONFIRMED;
        }

        if self.start(request.clone(), started_at, false, sink) {
            PlayerChanges::STARTED
        } else {
            PlayerChanges::empty()
        }
    }

    fn start(
        &mut self,
        request: ActionRequest,
        now: GameTime,
        anticipated: bool,
        sink: &mut impl VisualSink,
    ) -> bool {
        let action = request.action;
        let mut instance = match self.pool.acquire(action) {
            Ok(instance) => instance,
            Err(error) => {
                warn!(
                    target: "client_core::player",
                    owner = %self.owner,
                    %action,
                    %error,
                    "cannot play action"
                );
                return false;
            }
        };
        instance.bind(request);
        instance.begin(now);
        instance.set_anticipated(anticipated);

        let blocking = !instance.should_become_non_blocking(now);
        sink.on_visual_start(&instance, anticipated);
        trace!(
            target: "client_core::player",
            owner = %self.owner,
            %action,
            anticipated,
            blocking,
            "visual started"
        );
        self.playing.push(Playing { instance, blocking });
        true
    }

    /// First confirmed instance with this id and slot, in start order.
    fn find_confirmed(&self, action: ActionId, slot: SlotId) -> Option<usize> {
        self.playing.iter().position(|entry| {
            !entry.instance.is_anticipated()
                && entry.instance.action_id() == action
                && entry.instance.slot() == slot
        })
    }

    fn stop(&mut self, index: usize, ended: bool, sink: &mut impl VisualSink) {
        let entry = self.playing.remove(index);
        if ended {
            sink.on_visual_end(&entry.instance);
        } else {
            sink.on_visual_cancel(&entry.instance);
        }
        self.pool.release(entry.instance);
    }
}
