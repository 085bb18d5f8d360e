//! Data-driven content definitions and loaders.
//!
//! This crate houses the shipped action set and engine configuration and
//! provides loaders for RON/TOML data files:
//! - Action definitions (data-driven via RON, one list per file)
//! - Engine configuration (data-driven via TOML)
//!
//! Everything loaded here is validated before it reaches the engine: a broken
//! reference is a load error, never a per-tick failure.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{ActionLoader, ConfigLoader, ContentFactory, LoadResult};
