//! Simulation worker that owns the authoritative [`ActionServer`].
//!
//! Receives commands from [`crate::RuntimeHandle`], advances the server on a
//! fixed interval (or on explicit `Step` commands) and publishes every tick's
//! output to the [`EventBus`].

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, trace};

use game_core::engine::{ActiveActionInfo, SubmitOutcome};
use game_core::{ActionError, ActionRequest, BuffKind, EntityId, GameObject, World};

use crate::api::{Result, RuntimeError};
use crate::channel::{ClientId, InputEdge};
use crate::events::{Event, EventBus};
use crate::server::{ActionServer, TickReport};

/// Commands that can be sent to the simulation worker
pub enum Command {
    /// Client input routed through the request channel.
    Input {
        client: ClientId,
        edge: InputEdge,
        reply: oneshot::Sender<Result<Option<SubmitOutcome>>>,
    },
    /// Trusted submission on behalf of a character.
    Submit {
        owner: EntityId,
        request: ActionRequest,
        reply: oneshot::Sender<Result<SubmitOutcome>>,
    },
    Spawn {
        object: Box<GameObject>,
        client: Option<ClientId>,
        reply: oneshot::Sender<EntityId>,
    },
    /// Advance one fixed step immediately.
    Step { reply: oneshot::Sender<TickReport> },
    /// Query the current world (read-only).
    QueryWorld { reply: oneshot::Sender<World> },
    ActiveAction {
        owner: EntityId,
        reply: oneshot::Sender<Result<Option<ActiveActionInfo>>>,
    },
    BuffedValue {
        owner: EntityId,
        kind: BuffKind,
        reply: oneshot::Sender<Result<f32>>,
    },
}

/// Background task that processes gameplay commands.
pub struct SimulationWorker {
    server: ActionServer,
    command_rx: mpsc::Receiver<Command>,
    event_bus: EventBus,
    /// `None` when ticks are driven by `Step` commands only.
    ticker: Option<Interval>,
}

impl SimulationWorker {
    pub fn new(
        server: ActionServer,
        command_rx: mpsc::Receiver<Command>,
        event_bus: EventBus,
        auto_tick: bool,
    ) -> Self {
        let ticker = auto_tick.then(|| {
            let period = Duration::from_millis(server.config().tick_interval.as_millis());
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        Self {
            server,
            command_rx,
            event_bus,
            ticker,
        }
    }

    /// Main worker loop. Exits once every handle is dropped.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                _ = Self::next_tick(&mut self.ticker) => {
                    self.step();
                }
                cmd = self.command_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },
            }
        }
        debug!(
            target: "runtime::worker",
            ticks = self.server.tick_count(),
            "simulation worker stopped"
        );
    }

    async fn next_tick(ticker: &mut Option<Interval>) {
        match ticker {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending().await,
        }
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Input {
                client,
                edge,
                reply,
            } => {
                let result = self
                    .server
                    .handle_input(client, edge)
                    .map_err(RuntimeError::from);
                let _ = reply.send(result);
            }
            Command::Submit {
                owner,
                request,
                reply,
            } => {
                let result = self.server.submit(owner, request).map_err(|e| match e {
                    ActionError::OwnerNotFound(id) => RuntimeError::UnknownCharacter(id),
                    other => RuntimeError::Action(other),
                });
                let _ = reply.send(result);
            }
            Command::Spawn {
                object,
                client,
                reply,
            } => {
                let _ = reply.send(self.server.spawn(*object, client));
            }
            Command::Step { reply } => {
                let _ = reply.send(self.step());
            }
            Command::QueryWorld { reply } => {
                let _ = reply.send(self.server.world().clone());
            }
            Command::ActiveAction { owner, reply } => {
                let result = self
                    .server
                    .scheduler(owner)
                    .map(|scheduler| scheduler.active_action_info())
                    .ok_or(RuntimeError::UnknownCharacter(owner));
                let _ = reply.send(result);
            }
            Command::BuffedValue { owner, kind, reply } => {
                let result = self
                    .server
                    .get_buffed_value(owner, kind)
                    .ok_or(RuntimeError::UnknownCharacter(owner));
                let _ = reply.send(result);
            }
        }
    }

    fn step(&mut self) -> TickReport {
        let delta = self.server.config().tick_interval;
        let report = self.server.tick(delta);

        for notification in &report.notifications {
            self.event_bus
                .publish(Event::Replication(notification.clone()));
        }
        for event in &report.gameplay {
            self.event_bus.publish(Event::Gameplay(event.clone()));
        }

        trace!(
            target: "runtime::worker",
            tick = report.tick,
            notifications = report.notifications.len(),
            "tick published"
        );
        report
    }
}
