//! Authoritative world state representation.
//!
//! This module owns the arena of live objects and the primitive value types
//! (handles, simulation time, vectors) shared by the rest of the crate. The
//! scheduler and effect pipeline mutate it; the physics snapshot and the
//! client only read it.
mod common;
mod object;
mod world;

pub use common::{EntityId, GameTime, ResourceMeter, Team, Vec3};
pub use object::{GameObject, Modifiers, ObjectKind, ProjectileBody, StatusFlags};
pub use world::{Relation, World};
