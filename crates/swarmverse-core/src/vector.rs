//! Plane vector arithmetic used throughout the engine.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

/// 2D vector over `f32`. Plain `Copy` value; every operation is total for
/// finite inputs.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

/// Coordinate axis selector for reflections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Both,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Construct a new vector.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean length.
    #[must_use]
    pub fn modulus(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Squared length, for comparisons that do not need the square root.
    #[must_use]
    pub fn modulus_squared(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    /// Scale to unit length. The zero vector passes through unchanged; this
    /// is a documented special case, not an error.
    #[must_use]
    pub fn normalize(self) -> Self {
        let scale = self.modulus();
        if scale == 0.0 {
            return self;
        }
        Self::new(self.x / scale, self.y / scale)
    }

    /// Negate the selected component(s).
    #[must_use]
    pub fn reflect(self, axis: Axis) -> Self {
        match axis {
            Axis::X => Self::new(-self.x, self.y),
            Axis::Y => Self::new(self.x, -self.y),
            Axis::Both => Self::new(-self.x, -self.y),
        }
    }

    /// Whether both components are finite.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl MulAssign<f32> for Vec2 {
    fn mul_assign(&mut self, rhs: f32) {
        self.x *= rhs;
        self.y *= rhs;
    }
}

impl Neg for Vec2 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

/// Vector from `a` to `b`.
#[must_use]
pub fn distance(a: Vec2, b: Vec2) -> Vec2 {
    b - a
}

/// Sum of a vector sequence; zero for empty input.
#[must_use]
pub fn sum<I: IntoIterator<Item = Vec2>>(vectors: I) -> Vec2 {
    vectors.into_iter().fold(Vec2::ZERO, |acc, v| acc + v)
}

/// Unit vector with uniformly random direction.
#[must_use]
pub fn random_unit<R: Rng + ?Sized>(rng: &mut R) -> Vec2 {
    let angle = rng.random_range(0.0..std::f32::consts::TAU);
    Vec2::new(angle.cos(), angle.sin())
}
