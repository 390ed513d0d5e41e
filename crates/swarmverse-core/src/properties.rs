//! Per-type mass and affinity tables.

use crate::config::UniverseConfig;
use crate::particle::{ParticleType, TYPE_COUNT};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Per-type mass plus the directional affinity matrix. Affinity is not
/// guaranteed symmetric: `affinity(A, B)` and `affinity(B, A)` are drawn
/// independently. Owned by the universe; particles only ever look values up.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyTable {
    masses: [f32; TYPE_COUNT],
    affinities: [[f32; TYPE_COUNT]; TYPE_COUNT],
}

impl PropertyTable {
    /// Draw a fresh table from the configured ranges.
    #[must_use]
    pub fn generate<R: Rng + ?Sized>(config: &UniverseConfig, rng: &mut R) -> Self {
        let mut table = Self {
            masses: [0.0; TYPE_COUNT],
            affinities: [[0.0; TYPE_COUNT]; TYPE_COUNT],
        };
        table.regenerate(config, rng);
        table
    }

    /// Re-draw every mass and affinity independently. Debug placement pins
    /// every affinity to 1 so the seeded pair interacts predictably.
    pub fn regenerate<R: Rng + ?Sized>(&mut self, config: &UniverseConfig, rng: &mut R) {
        for mass in &mut self.masses {
            *mass = rng.random_range(config.mass_min..=config.mass_max);
        }
        for row in &mut self.affinities {
            for affinity in row {
                *affinity = if config.debug_placement {
                    1.0
                } else {
                    rng.random_range(config.affinity_min..=config.affinity_max)
                };
            }
        }
    }

    /// Periodic re-randomization with sign inversion relative to the prior
    /// value, keeping the simulation from settling into a static attractor.
    pub fn drift<R: Rng + ?Sized>(&mut self, config: &UniverseConfig, rng: &mut R) {
        for row in &mut self.affinities {
            for affinity in row {
                let draw = rng.random_range(config.affinity_min..=config.affinity_max);
                *affinity = -crate::force::sign(*affinity) * draw;
            }
        }
    }

    /// Mass of a particle type.
    #[must_use]
    pub fn mass(&self, ptype: ParticleType) -> f32 {
        self.masses[ptype.index()]
    }

    /// Directional affinity of `of` toward `toward`.
    #[must_use]
    pub fn affinity(&self, of: ParticleType, toward: ParticleType) -> f32 {
        self.affinities[of.index()][toward.index()]
    }

    /// Override a single mass (config UI hook and tests).
    pub fn set_mass(&mut self, ptype: ParticleType, mass: f32) {
        self.masses[ptype.index()] = mass;
    }

    /// Override a single directional affinity (config UI hook and tests).
    pub fn set_affinity(&mut self, of: ParticleType, toward: ParticleType, affinity: f32) {
        self.affinities[of.index()][toward.index()] = affinity;
    }
}
