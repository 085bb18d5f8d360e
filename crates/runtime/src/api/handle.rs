//! Cloneable façade for issuing commands to the runtime.
//!
//! [`RuntimeHandle`] hides channel plumbing and offers async helpers for
//! submitting input, stepping the simulation or streaming events from
//! specific topics.
use tokio::sync::{broadcast, mpsc, oneshot};

use game_core::engine::{ActiveActionInfo, SubmitOutcome};
use game_core::{ActionRequest, BuffKind, EntityId, GameObject, World};

use super::errors::{Result, RuntimeError};
use crate::channel::{ClientId, InputEdge};
use crate::events::{Event, EventBus, Topic};
use crate::server::TickReport;
use crate::workers::Command;

/// Client-facing handle to interact with the runtime
#[derive(Clone)]
pub struct RuntimeHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl RuntimeHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            command_tx,
            event_bus,
        }
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(build(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Deliver client input through the request channel.
    ///
    /// Returns `None` for releases, which never submit anything.
    pub async fn input(&self, client: ClientId, edge: InputEdge) -> Result<Option<SubmitOutcome>> {
        self.request(|reply| Command::Input {
            client,
            edge,
            reply,
        })
        .await?
    }

    /// Release a held input (stops charging).
    pub async fn release(&self, client: ClientId) -> Result<()> {
        self.input(client, InputEdge::Release).await.map(|_| ())
    }

    /// Submit a trusted request on behalf of a character (server-side AI, scripts).
    pub async fn submit(&self, owner: EntityId, request: ActionRequest) -> Result<SubmitOutcome> {
        self.request(|reply| Command::Submit {
            owner,
            request,
            reply,
        })
        .await?
    }

    /// Spawn a character, optionally controlled by `client`.
    pub async fn spawn(&self, object: GameObject, client: Option<ClientId>) -> Result<EntityId> {
        self.request(|reply| Command::Spawn {
            object: Box::new(object),
            client,
            reply,
        })
        .await
    }

    /// Advance the simulation by one fixed step.
    pub async fn step(&self) -> Result<TickReport> {
        self.request(|reply| Command::Step { reply }).await
    }

    /// Query the current world (read-only snapshot)
    pub async fn query_world(&self) -> Result<World> {
        self.request(|reply| Command::QueryWorld { reply }).await
    }

    /// Running blocking action of a character.
    pub async fn active_action(&self, owner: EntityId) -> Result<Option<ActiveActionInfo>> {
        self.request(|reply| Command::ActiveAction { owner, reply })
            .await?
    }

    /// Current buffed multiplier of a character.
    pub async fn buffed_value(&self, owner: EntityId, kind: BuffKind) -> Result<f32> {
        self.request(|reply| Command::BuffedValue { owner, kind, reply })
            .await?
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Replication` - notifications for client action players
    /// - `Topic::Gameplay` - tick summaries, deaths, rejected input
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use runtime::Topic;
    ///
    /// let mut replication = handle.subscribe(Topic::Replication);
    /// while let Ok(event) = replication.recv().await {
    ///     // Feed the client action player
    /// }
    /// ```
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> std::collections::HashMap<Topic, broadcast::Receiver<Event>> {
        self.event_bus.subscribe_multiple(topics)
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}
