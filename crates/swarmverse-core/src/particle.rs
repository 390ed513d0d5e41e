//! Particle types and the mutable simulation entity.

use crate::attractor::Attractor;
use crate::vector::{Axis, Vec2};
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Stable handle for particles backed by a generational slot map.
    pub struct ParticleId;
}

/// Number of distinct particle types in the universe.
pub const TYPE_COUNT: usize = 8;

/// Opaque particle category. Rendered as colors by external layers; the
/// engine treats the variants purely as labels into the affinity matrix.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ParticleType {
    Azure,
    Emerald,
    Amber,
    Cyan,
    Crimson,
    Magenta,
    Tangerine,
    Pearl,
}

impl ParticleType {
    /// All types, in matrix order.
    pub const ALL: [Self; TYPE_COUNT] = [
        Self::Azure,
        Self::Emerald,
        Self::Amber,
        Self::Cyan,
        Self::Crimson,
        Self::Magenta,
        Self::Tangerine,
        Self::Pearl,
    ];

    /// Dense index into per-type tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Mutable simulation entity: category, kinematic state, and the force
/// accumulated for the current frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Particle {
    ptype: ParticleType,
    position: Vec2,
    velocity: Vec2,
    force: Vec2,
}

impl Particle {
    /// Create a particle with no accumulated force.
    #[must_use]
    pub const fn new(ptype: ParticleType, position: Vec2, velocity: Vec2) -> Self {
        Self {
            ptype,
            position,
            velocity,
            force: Vec2::ZERO,
        }
    }

    #[must_use]
    pub const fn ptype(&self) -> ParticleType {
        self.ptype
    }

    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    #[must_use]
    pub const fn velocity(&self) -> Vec2 {
        self.velocity
    }

    #[must_use]
    pub const fn accumulated_force(&self) -> Vec2 {
        self.force
    }

    /// Single-particle attractor proxy (unit weight at the current position).
    #[must_use]
    pub const fn attractor(&self) -> Attractor {
        Attractor::new(self.ptype, self.position, 1.0)
    }

    /// Add a force contribution for this frame.
    pub fn apply_force(&mut self, force: Vec2) {
        self.force += force;
    }

    /// Mirror the particle back across a violated wall. `overshoot` points
    /// from the particle to the wall line; the position moves by twice that
    /// vector and the velocity reflects on the violated axis (or axes).
    pub fn reflect(&mut self, overshoot: Vec2) {
        self.position += overshoot * 2.0;
        if overshoot.x != 0.0 {
            self.velocity = self.velocity.reflect(Axis::X);
        }
        if overshoot.y != 0.0 {
            self.velocity = self.velocity.reflect(Axis::Y);
        }
    }

    /// Euler integration step: accelerate from the accumulated force, cap
    /// the velocity unconditionally, apply viscosity damping, translate, and
    /// reset the accumulator.
    pub fn advance(&mut self, delta: f32, mass: f32, velocity_cap: f32, viscosity: f32) {
        let acceleration = if mass != 0.0 {
            self.force * (1.0 / mass)
        } else {
            Vec2::ZERO
        };
        self.velocity += acceleration * delta;

        if self.velocity.modulus() >= velocity_cap {
            self.velocity = self.velocity.normalize() * velocity_cap;
        }
        self.velocity *= 1.0 - viscosity;

        self.position += self.velocity * delta;
        self.force = Vec2::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_indices_are_dense_and_unique() {
        for (expected, ptype) in ParticleType::ALL.iter().enumerate() {
            assert_eq!(ptype.index(), expected);
        }
    }

    #[test]
    fn advance_integrates_and_resets_force() {
        let mut particle = Particle::new(ParticleType::Azure, Vec2::ZERO, Vec2::ZERO);
        particle.apply_force(Vec2::new(4.0, 0.0));
        particle.advance(0.5, 2.0, 1e6, 0.0);
        // a = F/m = 2, v = a*dt = 1, x = v*dt = 0.5
        assert_eq!(particle.velocity(), Vec2::new(1.0, 0.0));
        assert_eq!(particle.position(), Vec2::new(0.5, 0.0));
        assert_eq!(particle.accumulated_force(), Vec2::ZERO);
    }

    #[test]
    fn velocity_cap_is_unconditional() {
        for magnitude in [1e3, 1e9, 1e30] {
            let mut particle = Particle::new(ParticleType::Amber, Vec2::ZERO, Vec2::ZERO);
            particle.apply_force(Vec2::new(magnitude, magnitude));
            particle.advance(1.0, 1.0, 10.0, 0.0);
            assert!(particle.velocity().modulus() <= 10.0 + 1e-3);
        }
    }

    #[test]
    fn viscosity_damps_velocity() {
        let mut particle = Particle::new(ParticleType::Cyan, Vec2::ZERO, Vec2::new(100.0, 0.0));
        particle.advance(1.0, 1.0, 1e6, 0.25);
        assert_eq!(particle.velocity(), Vec2::new(75.0, 0.0));
    }

    #[test]
    fn zero_mass_does_not_accelerate() {
        let mut particle = Particle::new(ParticleType::Pearl, Vec2::ZERO, Vec2::ZERO);
        particle.apply_force(Vec2::new(1e6, 0.0));
        particle.advance(1.0, 0.0, 1e6, 0.0);
        assert_eq!(particle.velocity(), Vec2::ZERO);
    }

    #[test]
    fn reflect_mirrors_position_and_velocity() {
        let mut particle = Particle::new(
            ParticleType::Crimson,
            Vec2::new(-10.0, 50.0),
            Vec2::new(-3.0, 2.0),
        );
        // Overshoot past the left wall: wall vector points from the particle
        // back to x = 0.
        particle.reflect(Vec2::new(10.0, 0.0));
        assert_eq!(particle.position(), Vec2::new(10.0, 50.0));
        assert_eq!(particle.velocity(), Vec2::new(3.0, 2.0));
    }
}
