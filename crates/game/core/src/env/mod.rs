//! Interfaces to collaborators outside the engine.
//!
//! The engine consumes physics queries as a black-box service through
//! [`PhysicsOracle`]. [`PhysicsSnapshot`] is the in-process implementation the
//! runtime and tests use; any other backend only has to implement the trait.
mod physics;
mod snapshot;

pub use physics::{CollisionLayers, PhysicsOracle, RaycastHit};
pub use snapshot::{Collider, PhysicsSnapshot};
