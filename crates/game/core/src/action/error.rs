//! Action errors.
//!
//! `ActionError` covers per-request and per-instance failures, which are always
//! recoverable at the scheduler level. `ConfigError` covers broken definitions,
//! which are fatal and surface when the registry is built.

use crate::error::{ErrorSeverity, GameError};
use crate::state::EntityId;

use super::types::ActionId;

// ============================================================================
// Action Execution Errors
// ============================================================================

/// Errors that can occur while submitting or running an action.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    /// No definition is registered for the requested id.
    #[error("unknown action {0}")]
    UnknownAction(ActionId),

    /// The character owning the scheduler is gone.
    #[error("owner {0} not found")]
    OwnerNotFound(EntityId),

    /// The source object of the request origin is gone.
    #[error("origin source {0} not found")]
    SourceNotFound(EntityId),

    /// The requested attachment slot does not exist on the source.
    #[error("object {object} has no attachment slot {slot_index}")]
    InvalidSlot { object: EntityId, slot_index: u8 },

    /// The effect target is gone or cannot receive the effect.
    #[error("target {0} not found")]
    TargetNotFound(EntityId),
}

impl GameError for ActionError {
    fn severity(&self) -> ErrorSeverity {
        use ActionError::*;
        match self {
            UnknownAction(_) | InvalidSlot { .. } => ErrorSeverity::Validation,
            OwnerNotFound(_) | SourceNotFound(_) | TargetNotFound(_) => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        use ActionError::*;
        match self {
            UnknownAction(_) => "ACTION_UNKNOWN",
            OwnerNotFound(_) => "ACTION_OWNER_NOT_FOUND",
            SourceNotFound(_) => "ACTION_SOURCE_NOT_FOUND",
            InvalidSlot { .. } => "ACTION_INVALID_SLOT",
            TargetNotFound(_) => "ACTION_TARGET_NOT_FOUND",
        }
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Malformed or inconsistent action configuration.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("duplicate action id {0}")]
    DuplicateAction(ActionId),

    /// A prototype lookup referenced an id with no definition.
    #[error("no prototype registered for {0}")]
    UnknownAction(ActionId),

    #[error("action {action} references unknown action {referenced} in {field}")]
    UnknownReference {
        action: ActionId,
        referenced: ActionId,
        field: &'static str,
    },

    #[error(
        "action {action} has {times} charge stage times but {multipliers} stage multipliers"
    )]
    ChargeStageMismatch {
        action: ActionId,
        times: usize,
        multipliers: usize,
    },

    #[error("action {action} is invalid: {reason}")]
    Invalid {
        action: ActionId,
        reason: &'static str,
    },
}

impl GameError for ConfigError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Fatal
    }

    fn error_code(&self) -> &'static str {
        use ConfigError::*;
        match self {
            DuplicateAction(_) => "CONFIG_DUPLICATE_ACTION",
            UnknownAction(_) => "CONFIG_UNKNOWN_ACTION",
            UnknownReference { .. } => "CONFIG_UNKNOWN_REFERENCE",
            ChargeStageMismatch { .. } => "CONFIG_CHARGE_STAGE_MISMATCH",
            Invalid { .. } => "CONFIG_INVALID",
        }
    }
}
