use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// Stable handle for any object tracked in the [`World`](super::World).
///
/// Handles are allocated monotonically and never reused, so a handle that
/// outlives its object simply fails to resolve instead of aliasing a new one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct EntityId(pub u32);

impl EntityId {
    /// Placeholder owner used by pooled instances that are not bound to a character.
    pub const NONE: Self = Self(u32::MAX);

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == Self::NONE.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Simulation time in milliseconds.
///
/// Used both as an instant (time since match start) and as a span (delays,
/// cooldowns, durations). Integer milliseconds keep cooldown comparisons exact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct GameTime(pub u64);

impl GameTime {
    pub const ZERO: Self = Self(0);

    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self(secs * 1000)
    }

    /// Converts fractional seconds, rounding to the nearest millisecond.
    pub fn from_secs_f32(secs: f32) -> Self {
        Self((secs.max(0.0) * 1000.0).round() as u64)
    }

    pub const fn as_millis(self) -> u64 {
        self.0
    }

    pub fn as_secs_f32(self) -> f32 {
        self.0 as f32 / 1000.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Span elapsed since `earlier`, clamped at zero.
    pub const fn since(self, earlier: GameTime) -> GameTime {
        GameTime(self.0.saturating_sub(earlier.0))
    }
}

impl Add for GameTime {
    type Output = GameTime;
    fn add(self, rhs: GameTime) -> GameTime {
        GameTime(self.0 + rhs.0)
    }
}

impl AddAssign for GameTime {
    fn add_assign(&mut self, rhs: GameTime) {
        self.0 += rhs.0;
    }
}

impl Sub for GameTime {
    type Output = GameTime;
    fn sub(self, rhs: GameTime) -> GameTime {
        self.since(rhs)
    }
}

impl Mul<u64> for GameTime {
    type Output = GameTime;
    fn mul(self, rhs: u64) -> GameTime {
        GameTime(self.0 * rhs)
    }
}

impl fmt::Display for GameTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}s", self.0 / 1000, self.0 % 1000)
    }
}

/// World-space vector used for positions and directions.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const FORWARD: Self = Self::new(0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn distance(self, other: Vec3) -> f32 {
        (other - self).length()
    }

    /// Unit vector in the same direction, or zero for degenerate input.
    pub fn normalized(self) -> Vec3 {
        let len = self.length();
        if len <= f32::EPSILON {
            Vec3::ZERO
        } else {
            self * (1.0 / len)
        }
    }

    /// Projection onto the ground plane (y = 0).
    pub fn flat(self) -> Vec3 {
        Vec3::new(self.x, 0.0, self.z)
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

/// Integer resource meter (e.g., health) tracked per object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourceMeter {
    pub current: u32,
    pub maximum: u32,
}

impl ResourceMeter {
    pub fn new(current: u32, maximum: u32) -> Self {
        Self { current, maximum }
    }

    pub fn full(maximum: u32) -> Self {
        Self::new(maximum, maximum)
    }

    pub fn is_depleted(&self) -> bool {
        self.current == 0
    }

    /// Removes up to `amount`, returning how much was actually removed.
    pub fn drain(&mut self, amount: u32) -> u32 {
        let actual = amount.min(self.current);
        self.current -= actual;
        actual
    }

    /// Restores up to `amount` without exceeding the maximum.
    pub fn restore(&mut self, amount: u32) -> u32 {
        let actual = amount.min(self.maximum.saturating_sub(self.current));
        self.current += actual;
        actual
    }
}

/// Allegiance used by effect filters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, strum::IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Team {
    Heroes,
    Monsters,
    #[default]
    Neutral,
}
