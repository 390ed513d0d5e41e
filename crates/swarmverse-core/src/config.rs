//! Simulation-wide configuration and validation.

use rand::{SeedableRng, rngs::SmallRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest force range the sector grid is sized for.
pub const MIN_FORCE_DISTANCE_CAP: f32 = 400.0;

/// Errors produced when validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Indicates a configuration value that cannot be used.
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Static configuration for a particle universe. Replaced wholesale on
/// reconfiguration; never mutated mid-step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UniverseConfig {
    /// World width in simulation units.
    pub size_x: f32,
    /// World height in simulation units.
    pub size_y: f32,
    /// Minimum particles seeded per type on repopulation.
    pub particle_count_min: u32,
    /// Maximum particles seeded per type on repopulation.
    pub particle_count_max: u32,
    /// Lower bound of per-type mass draws.
    pub mass_min: f32,
    /// Upper bound of per-type mass draws.
    pub mass_max: f32,
    /// Lower bound of affinity draws.
    pub affinity_min: f32,
    /// Upper bound of affinity draws.
    pub affinity_max: f32,
    /// Affinity applied to wall repulsion (only its magnitude matters; walls
    /// always repel).
    pub wall_affinity: f32,
    /// Hard ceiling on particle speed after any integration step.
    pub velocity_cap: f32,
    /// Per-axis bound of initial velocity draws on repopulation.
    pub velocity_max: f32,
    /// Force evaluation cutoff; interactions past this distance are zero by
    /// definition, which is what makes sector-local evaluation valid.
    pub force_distance_cap: f32,
    /// When set, interaction strength derives from the probe's affinity
    /// alone (`sign(a)·a²`); otherwise both directions multiply.
    pub asymmetric_interactions: bool,
    /// Fractional velocity loss per step, in `[0, 1]`.
    pub viscosity: f32,
    /// Baseline time-step scale factor.
    pub slow_mo_factor: f32,
    /// Target upper bound on per-step displacement of the fastest particle,
    /// in simulation units. Enables adaptive time dilation when set.
    pub desired_precision: Option<f32>,
    /// Milliseconds of simulated wall-clock time between affinity drifts;
    /// zero disables drift.
    pub drift_period: f32,
    /// Maximum number of frame summaries retained in memory.
    pub history_capacity: usize,
    /// Seed the universe with a deterministic two-particle pair instead of
    /// random pools (force-law inspection aid).
    pub debug_placement: bool,
    /// Optional RNG seed for reproducible universes.
    pub rng_seed: Option<u64>,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            size_x: 18_000.0,
            size_y: 8_000.0,
            particle_count_min: 500,
            particle_count_max: 500,
            mass_min: 0.1,
            mass_max: 1.5,
            affinity_min: -10.0,
            affinity_max: 10.0,
            wall_affinity: -10.0,
            velocity_cap: 42e4,
            velocity_max: 2_700.0 / 40.0,
            force_distance_cap: 1_500.0,
            asymmetric_interactions: true,
            viscosity: 1e-9,
            slow_mo_factor: 1e-4,
            desired_precision: Some(1e2),
            drift_period: 0.0,
            history_capacity: 256,
            debug_placement: false,
            rng_seed: None,
        }
    }
}

impl UniverseConfig {
    /// Validate every invariant the engine assumes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.size_x > 0.0 && self.size_y > 0.0) {
            return Err(ConfigError::Invalid("world dimensions must be positive"));
        }
        if self.particle_count_min > self.particle_count_max {
            return Err(ConfigError::Invalid(
                "particle_count_min must not exceed particle_count_max",
            ));
        }
        if !(0.0 <= self.mass_min && self.mass_min <= self.mass_max) {
            return Err(ConfigError::Invalid(
                "mass range must be non-negative and ordered",
            ));
        }
        if !(self.affinity_min <= self.affinity_max) {
            return Err(ConfigError::Invalid("affinity range must be ordered"));
        }
        if !(self.force_distance_cap >= MIN_FORCE_DISTANCE_CAP) {
            return Err(ConfigError::Invalid(
                "force_distance_cap below the supported minimum",
            ));
        }
        if !(self.velocity_cap > 0.0) {
            return Err(ConfigError::Invalid("velocity_cap must be positive"));
        }
        if !(self.velocity_max >= 0.0) {
            return Err(ConfigError::Invalid("velocity_max must be non-negative"));
        }
        if !(0.0..=1.0).contains(&self.viscosity) {
            return Err(ConfigError::Invalid("viscosity must lie in [0, 1]"));
        }
        if !(self.slow_mo_factor > 0.0) {
            return Err(ConfigError::Invalid("slow_mo_factor must be positive"));
        }
        if let Some(precision) = self.desired_precision
            && !(precision > 0.0)
        {
            return Err(ConfigError::Invalid("desired_precision must be positive"));
        }
        if !(self.drift_period >= 0.0) {
            return Err(ConfigError::Invalid("drift_period must be non-negative"));
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::Invalid("history_capacity must be non-zero"));
        }
        Ok(())
    }

    /// Whether replacing `self` with `other` invalidates the sector grid.
    #[must_use]
    pub fn spatial_layout_differs(&self, other: &Self) -> bool {
        self.size_x != other.size_x
            || self.size_y != other.size_y
            || self.force_distance_cap != other.force_distance_cap
    }

    /// RNG seeded from configuration, falling back to entropy.
    #[must_use]
    pub fn seeded_rng(&self) -> SmallRng {
        match self.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => {
                let seed: u64 = rand::random();
                SmallRng::seed_from_u64(seed)
            }
        }
    }
}
