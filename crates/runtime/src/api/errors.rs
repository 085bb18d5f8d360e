//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination, content loading, and the request
//! channel so clients can bubble them up with consistent context.
use thiserror::Error;
use tokio::sync::oneshot;

use game_core::{ActionError, ConfigError, EntityId};

use crate::channel::ProtocolError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("simulation worker command channel closed")]
    CommandChannelClosed,

    #[error("simulation worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("simulation worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("failed to load content")]
    Content(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error("no scheduler for character {0}")]
    UnknownCharacter(EntityId),
}
