//! Server-side host for the action execution engine.
//!
//! This crate wires the per-character schedulers from `game-core` into an
//! authoritative [`server::ActionServer`], validates client input on the
//! request channel and publishes replication notifications. Consumers embed
//! [`Runtime`] to drive the simulation and subscribe to events through
//! [`RuntimeHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`server`] is the synchronous authoritative host, usable without tokio
//! - [`channel`] validates client requests before they reach a scheduler
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides the topic-based event bus
//! - `workers` keeps background tasks internal to the crate
pub mod api;
pub mod channel;
pub mod events;
pub mod runtime;
pub mod server;

mod workers;

pub use api::{Result, RuntimeError, RuntimeHandle};
pub use channel::{ClientId, InputEdge, ProtocolError, RequestValidator, Sessions, WireActionRequest};
pub use events::{Event, EventBus, GameplayEvent, Topic};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
pub use server::{ActionServer, TickReport};
