//! The universe orchestrator: owns the configuration, property tables,
//! particle space, and RNG, and drives the staged per-frame pipeline.
//!
//! A frame runs in fixed stages: affinity drift (if due), force
//! accumulation over sector attractors and walls, an adaptive time-dilation
//! scan, Euler integration with boundary reflection and sector re-filing,
//! and finally an attractor refresh that discards incremental rounding
//! drift. Force accumulation is the only parallel stage; it reads a frozen
//! view of the space and writes back serially, so no stage ever observes a
//! half-updated frame.

use std::collections::VecDeque;

use ordered_float::OrderedFloat;
use rand::{Rng, SeedableRng, rngs::SmallRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::attractor::exclude;
use crate::config::{ConfigError, UniverseConfig};
use crate::force::{InteractionMode, force};
use crate::particle::{Particle, ParticleId, ParticleType};
use crate::properties::PropertyTable;
use crate::sector::Sector;
use crate::space::{Space, fix_particle_position, wall_proximity};
use crate::vector::{Vec2, distance};

/// Immutable per-particle view handed to consumers after a step. Carries
/// the type's mass so a renderer can size particles without a property
/// lookup.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ParticleSnapshot {
    pub ptype: ParticleType,
    pub position: Vec2,
    pub velocity: Vec2,
    pub mass: f32,
}

/// Per-frame statistics, retained in a bounded history.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FrameSummary {
    /// 1-based frame counter since the last repopulation.
    pub frame: u64,
    /// Total simulated wall-clock milliseconds fed to `step`.
    pub elapsed_ms: f32,
    /// Time-step scale applied this frame.
    pub dilation: f32,
    /// Live particles after the frame.
    pub particle_count: usize,
    /// Fastest particle speed observed in the pre-integration scan.
    pub max_velocity: f32,
    /// Whether the affinity matrix drifted this frame.
    pub drifted: bool,
}

/// Complete output of one step: statistics plus a particle snapshot.
#[derive(Debug, Clone)]
pub struct Frame {
    pub summary: FrameSummary,
    pub particles: Vec<ParticleSnapshot>,
}

/// A running simulation.
#[derive(Debug)]
pub struct Universe {
    config: UniverseConfig,
    properties: PropertyTable,
    space: Space,
    rng: SmallRng,
    frame: u64,
    elapsed_ms: f32,
    last_drift_ms: f32,
    history: VecDeque<FrameSummary>,
}

impl Universe {
    /// Build and populate a universe from a validated configuration.
    pub fn new(config: UniverseConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = config.seeded_rng();
        let properties = PropertyTable::generate(&config, &mut rng);
        let space = Space::new(&config);
        let mut universe = Self {
            config,
            properties,
            space,
            rng,
            frame: 0,
            elapsed_ms: 0.0,
            last_drift_ms: 0.0,
            history: VecDeque::new(),
        };
        universe.repopulate();
        Ok(universe)
    }

    #[must_use]
    pub const fn config(&self) -> &UniverseConfig {
        &self.config
    }

    #[must_use]
    pub const fn properties(&self) -> &PropertyTable {
        &self.properties
    }

    /// Mutable property access for external tuning between steps.
    pub const fn properties_mut(&mut self) -> &mut PropertyTable {
        &mut self.properties
    }

    #[must_use]
    pub const fn space(&self) -> &Space {
        &self.space
    }

    /// Frames stepped since the last repopulation.
    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Simulated milliseconds accumulated since the last repopulation.
    #[must_use]
    pub const fn elapsed_ms(&self) -> f32 {
        self.elapsed_ms
    }

    #[must_use]
    pub fn particle_count(&self) -> usize {
        self.space.particle_count()
    }

    /// Retained frame summaries, oldest first.
    #[must_use]
    pub const fn history(&self) -> &VecDeque<FrameSummary> {
        &self.history
    }

    /// Current per-particle state.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ParticleSnapshot> {
        self.space
            .particles()
            .values()
            .map(|particle| ParticleSnapshot {
                ptype: particle.ptype(),
                position: particle.position(),
                velocity: particle.velocity(),
                mass: self.properties.mass(particle.ptype()),
            })
            .collect()
    }

    /// Redraw the per-type mass and affinity tables from the configured
    /// ranges. An explicit operation, deliberately not part of
    /// `repopulate`.
    pub fn regenerate_properties(&mut self) {
        self.properties.regenerate(&self.config, &mut self.rng);
    }

    /// Discard all particles and history and seed fresh particle pools.
    /// Property tables are untouched.
    pub fn repopulate(&mut self) {
        self.space.clear_particles();
        self.frame = 0;
        self.elapsed_ms = 0.0;
        self.last_drift_ms = 0.0;
        self.history.clear();

        let world = self.space.world();
        if self.config.debug_placement {
            // A lone interacting pair on the horizontal axis through the
            // world center, for inspecting the raw force law.
            let center = world * 0.5;
            let offset = Vec2::new(self.config.force_distance_cap / 10.0, 0.0);
            self.space
                .add_particle(ParticleType::Azure, center - offset, Vec2::ZERO);
            self.space
                .add_particle(ParticleType::Azure, center + offset, Vec2::ZERO);
            return;
        }

        for ptype in ParticleType::ALL {
            let count = self
                .rng
                .random_range(self.config.particle_count_min..=self.config.particle_count_max);
            for _ in 0..count {
                let position = Vec2::new(
                    self.rng.random_range(0.0..=world.x),
                    self.rng.random_range(0.0..=world.y),
                );
                let velocity = Vec2::new(
                    self.rng
                        .random_range(-self.config.velocity_max..=self.config.velocity_max),
                    self.rng
                        .random_range(-self.config.velocity_max..=self.config.velocity_max),
                );
                self.space.add_particle(ptype, position, velocity);
            }
        }
    }

    /// Replace the configuration. A change to the world size or force range
    /// invalidates the grid topology, so the sector grid is rebuilt and the
    /// universe repopulated; other changes apply without disruption.
    /// Property tables are kept either way.
    pub fn set_config(&mut self, config: UniverseConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let rebuild = self.config.spatial_layout_differs(&config);
        self.config = config;

        if rebuild {
            self.space = Space::new(&self.config);
            self.repopulate();
        }
        while self.history.len() > self.config.history_capacity {
            self.history.pop_front();
        }
        Ok(())
    }

    /// Insert a single particle, clamping its position into the world.
    pub fn spawn_particle(
        &mut self,
        ptype: ParticleType,
        position: Vec2,
        velocity: Vec2,
    ) -> ParticleId {
        let world = self.space.world();
        self.space
            .add_particle(ptype, clamp_to_world(position, world), velocity)
    }

    /// Advance the simulation by `delta_ms` simulated wall-clock
    /// milliseconds (scaled internally by the time dilation).
    pub fn step(&mut self, delta_ms: f32) -> Frame {
        let drifted = self.maybe_drift();
        let frame_seed: u64 = self.rng.random();
        self.stage_forces(frame_seed);

        let max_velocity = self.max_velocity();
        let dilation = self.dilation(delta_ms, max_velocity);
        self.stage_integration(delta_ms * dilation);
        self.space.refresh_attractors();

        self.frame += 1;
        self.elapsed_ms += delta_ms;
        let summary = FrameSummary {
            frame: self.frame,
            elapsed_ms: self.elapsed_ms,
            dilation,
            particle_count: self.space.particle_count(),
            max_velocity,
            drifted,
        };
        self.history.push_back(summary);
        while self.history.len() > self.config.history_capacity {
            self.history.pop_front();
        }

        Frame {
            summary,
            particles: self.snapshot(),
        }
    }

    fn maybe_drift(&mut self) -> bool {
        if self.config.drift_period <= 0.0 {
            return false;
        }
        if self.elapsed_ms - self.last_drift_ms < self.config.drift_period {
            return false;
        }
        self.properties.drift(&self.config, &mut self.rng);
        self.last_drift_ms = self.elapsed_ms;
        true
    }

    /// Parallel force accumulation. Each sector's particles gather pulls
    /// from the attractors of the sector itself (own type excluded from its
    /// aggregate), of every neighbor sector whose attractor lies within
    /// force range of the home sector center, and of the four walls.
    /// Contributions are collected and written back serially.
    fn stage_forces(&mut self, frame_seed: u64) {
        let cap = self.config.force_distance_cap;
        let asymmetric = self.config.asymmetric_interactions;
        // Walls always repel regardless of the configured sign.
        let wall_affinity = -self.config.wall_affinity.abs();
        let world = self.space.world();
        let properties = &self.properties;
        let sectors = self.space.sectors();
        let particles = self.space.particles();

        let contributions: Vec<(ParticleId, Vec2)> = sectors
            .par_iter()
            .enumerate()
            .flat_map_iter(|(index, sector)| {
                let mut rng = SmallRng::seed_from_u64(
                    frame_seed ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15),
                );
                let mut local = Vec::with_capacity(sector.count());
                for id in sector.iter_particles() {
                    let Some(probe) = particles.get(id) else {
                        continue;
                    };
                    let mut total =
                        attractor_pull(probe, sector, None, properties, asymmetric, cap, &mut rng);
                    for &neighbor in sector.neighbors() {
                        total += attractor_pull(
                            probe,
                            &sectors[neighbor],
                            Some(sector.center()),
                            properties,
                            asymmetric,
                            cap,
                            &mut rng,
                        );
                    }
                    total += wall_pull(probe, world, wall_affinity, cap, &mut rng);
                    local.push((id, total));
                }
                local
            })
            .collect();

        for (id, contribution) in contributions {
            if let Some(particle) = self.space.particle_mut(id) {
                particle.apply_force(contribution);
            }
        }
    }

    fn max_velocity(&self) -> f32 {
        self.space
            .particles()
            .values()
            .map(|particle| OrderedFloat(particle.velocity().modulus()))
            .max()
            .map_or(0.0, |fastest| fastest.0)
    }

    /// Time-step scale for this frame. The adaptive bound keeps the fastest
    /// particle's displacement under `desired_precision`; the baseline
    /// slow-motion factor is never exceeded.
    fn dilation(&self, delta_ms: f32, max_velocity: f32) -> f32 {
        let base = self.config.slow_mo_factor;
        match self.config.desired_precision {
            Some(precision) if max_velocity > 0.0 => {
                (precision / (max_velocity * delta_ms)).min(base)
            }
            _ => base,
        }
    }

    /// Serial integration: each particle advances once, reflects off any
    /// violated wall, and is re-filed if it left its sector.
    fn stage_integration(&mut self, delta: f32) {
        let layout = self.space.layout();
        let world = layout.world();
        let velocity_cap = self.config.velocity_cap;
        let viscosity = self.config.viscosity;

        for id in self.space.particle_ids() {
            let from;
            let to;
            {
                let Some(particle) = self.space.particle_mut(id) else {
                    continue;
                };
                let mass = self.properties.mass(particle.ptype());
                from = layout.sector_index(particle.position());
                particle.advance(delta, mass, velocity_cap, viscosity);
                fix_particle_position(particle, world);
                to = layout.sector_index(particle.position());
            }
            if from != to {
                self.space.transfer_particle(id, from, to);
            }
        }
    }
}

fn clamp_to_world(position: Vec2, world: Vec2) -> Vec2 {
    Vec2::new(position.x.clamp(0.0, world.x), position.y.clamp(0.0, world.y))
}

/// Pull exerted on `probe` by one sector's per-type attractors.
///
/// For the probe's own sector (`home_center` is `None`) the probe's
/// contribution is subtracted from its type's aggregate before evaluation.
/// For neighbor sectors `home_center` carries the probe's home sector
/// center, and any aggregate farther than the force range from that center
/// is skipped before per-probe evaluation. Attractors past the force range
/// of the probe itself contribute nothing either way.
fn attractor_pull<R: Rng + ?Sized>(
    probe: &Particle,
    sector: &Sector,
    home_center: Option<Vec2>,
    properties: &PropertyTable,
    asymmetric: bool,
    cap: f32,
    rng: &mut R,
) -> Vec2 {
    let probe_attractor = probe.attractor();
    let mut total = Vec2::ZERO;
    for ptype in ParticleType::ALL {
        let Some(aggregate) = sector.attractor(ptype) else {
            continue;
        };
        let aggregate = match home_center {
            None => {
                if ptype == probe.ptype() {
                    match exclude(&probe_attractor, &aggregate) {
                        Some(rest) => rest,
                        None => continue,
                    }
                } else {
                    aggregate
                }
            }
            Some(center) => {
                if distance(center, aggregate.position).modulus() > cap {
                    continue;
                }
                aggregate
            }
        };

        let r = distance(probe.position(), aggregate.position);
        let d = r.modulus();
        if d > cap {
            continue;
        }
        let affinity_a = properties.affinity(probe.ptype(), ptype);
        let mode = if asymmetric {
            InteractionMode::Asymmetric
        } else {
            InteractionMode::Symmetric {
                affinity_b: properties.affinity(ptype, probe.ptype()),
            }
        };
        total += force(r, d, affinity_a, mode, rng) * aggregate.weight;
    }
    total
}

/// Repulsion from each wall line within force range of `probe`.
fn wall_pull<R: Rng + ?Sized>(
    probe: &Particle,
    world: Vec2,
    wall_affinity: f32,
    cap: f32,
    rng: &mut R,
) -> Vec2 {
    let walls = wall_proximity(probe.position(), world);
    let mut total = Vec2::ZERO;
    for wall in [walls.left, walls.right, walls.top, walls.bottom] {
        let d = wall.modulus();
        if d > cap {
            continue;
        }
        total += force(wall, d, wall_affinity, InteractionMode::Asymmetric, rng);
    }
    total
}
