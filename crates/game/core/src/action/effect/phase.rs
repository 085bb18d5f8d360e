//! Lifecycle points at which effects fire.

/// Lifecycle point an effect is keyed by.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, strum::IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LifecyclePoint {
    /// When the instance starts.
    Start,

    /// Each time the behavior executes (and on every projectile hit).
    #[default]
    Execution,

    /// When the instance ends normally.
    End,

    /// When the instance is cancelled.
    Cancelled,
}
