//! Per-character action scheduling.
//!
//! Each character owns an [`ActionScheduler`]. The host drives every
//! scheduler through a [`TickContext`] once per step, advances projectiles
//! with [`tick_projectiles`], then drains the shared [`Outbox`]:
//! notifications are replicated to clients, activity notices are delivered
//! back to the recipients' schedulers.
mod context;
mod cooldown;
mod events;
mod projectiles;
mod scheduler;

pub use context::TickContext;
pub use cooldown::{CooldownKey, CooldownLedger};
pub use events::{ActivityNotice, Notification, Outbox};
pub use projectiles::tick_projectiles;
pub use scheduler::{ActionScheduler, ActiveActionInfo, CancelReason, SubmitOutcome};
