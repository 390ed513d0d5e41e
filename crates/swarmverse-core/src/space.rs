//! World partitioning: the sector grid, particle placement, and wall
//! geometry.

use crate::config::UniverseConfig;
use crate::particle::{Particle, ParticleId, ParticleType};
use crate::sector::Sector;
use crate::vector::Vec2;
use slotmap::SlotMap;

/// Grid resolution multiplier over the force range.
const GRID_MULTIPLIER: f32 = 2.0;
/// Lower bound on cells per axis, so small worlds still partition usefully.
const GRID_MINIMUM: usize = 20;

/// Geometry of the sector grid: world size, cells per axis, and cell size.
/// Resolution is chosen so that the precomputed neighbor window always
/// covers the full force range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    world: Vec2,
    resolution: usize,
    sector_size: Vec2,
}

impl GridLayout {
    /// Derive a layout from the world size and force range.
    #[must_use]
    pub fn new(world: Vec2, force_distance_cap: f32) -> Self {
        let spread = world.x.max(world.y) / force_distance_cap;
        let resolution = ((spread * GRID_MULTIPLIER).ceil() as usize).max(GRID_MINIMUM);
        Self {
            world,
            resolution,
            sector_size: Vec2::new(world.x / resolution as f32, world.y / resolution as f32),
        }
    }

    #[must_use]
    pub const fn world(&self) -> Vec2 {
        self.world
    }

    /// Cells per axis.
    #[must_use]
    pub const fn resolution(&self) -> usize {
        self.resolution
    }

    #[must_use]
    pub const fn sector_size(&self) -> Vec2 {
        self.sector_size
    }

    /// Total number of sectors.
    #[must_use]
    pub const fn sector_count(&self) -> usize {
        self.resolution * self.resolution
    }

    fn clamp_cell(&self, raw: f32) -> usize {
        let last = self.resolution - 1;
        if raw <= 0.0 {
            0
        } else {
            (raw as usize).min(last)
        }
    }

    /// Map a point to the flat index of its containing sector. Positions
    /// outside the world clamp to the nearest border sector.
    #[must_use]
    pub fn sector_index(&self, position: Vec2) -> usize {
        let col = self.clamp_cell((position.x / self.sector_size.x).floor());
        let row = self.clamp_cell((position.y / self.sector_size.y).floor());
        row * self.resolution + col
    }

    /// Bounds of the sector at a flat index.
    #[must_use]
    pub fn sector_bounds(&self, index: usize) -> (Vec2, Vec2) {
        let col = (index % self.resolution) as f32;
        let row = (index / self.resolution) as f32;
        let top_left = Vec2::new(col * self.sector_size.x, row * self.sector_size.y);
        (top_left, top_left + self.sector_size)
    }

    /// Flat indices of every sector whose cell falls within the rectangular
    /// window of `force_distance_cap` around `index`, excluding `index`
    /// itself.
    #[must_use]
    pub fn neighbor_indices(&self, index: usize, force_distance_cap: f32) -> Vec<usize> {
        let reach_x = (force_distance_cap / self.sector_size.x).ceil() as isize;
        let reach_y = (force_distance_cap / self.sector_size.y).ceil() as isize;
        let col = (index % self.resolution) as isize;
        let row = (index / self.resolution) as isize;
        let limit = self.resolution as isize;

        let mut neighbors =
            Vec::with_capacity(((2 * reach_x + 1) * (2 * reach_y + 1) - 1) as usize);
        for dy in -reach_y..=reach_y {
            let other_row = row + dy;
            if !(0..limit).contains(&other_row) {
                continue;
            }
            for dx in -reach_x..=reach_x {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let other_col = col + dx;
                if !(0..limit).contains(&other_col) {
                    continue;
                }
                neighbors.push((other_row * limit + other_col) as usize);
            }
        }
        neighbors
    }
}

/// Vectors from a position to each of the four wall lines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallProximity {
    pub left: Vec2,
    pub right: Vec2,
    pub top: Vec2,
    pub bottom: Vec2,
}

/// The full sector grid plus the particle arena. Every particle is resident
/// in exactly one sector at any time: the one whose bounds contain its
/// position.
#[derive(Debug)]
pub struct Space {
    layout: GridLayout,
    sectors: Vec<Sector>,
    particles: SlotMap<ParticleId, Particle>,
}

impl Space {
    /// Build the grid for a validated configuration, precomputing each
    /// sector's neighbor list.
    #[must_use]
    pub fn new(config: &UniverseConfig) -> Self {
        let layout = GridLayout::new(
            Vec2::new(config.size_x, config.size_y),
            config.force_distance_cap,
        );
        let mut sectors = Vec::with_capacity(layout.sector_count());
        for index in 0..layout.sector_count() {
            let (top_left, bottom_right) = layout.sector_bounds(index);
            sectors.push(Sector::new(top_left, bottom_right));
        }
        for index in 0..sectors.len() {
            let neighbors = layout.neighbor_indices(index, config.force_distance_cap);
            sectors[index].set_neighbors(neighbors);
        }
        Self {
            layout,
            sectors,
            particles: SlotMap::with_key(),
        }
    }

    #[must_use]
    pub const fn layout(&self) -> GridLayout {
        self.layout
    }

    /// World dimensions.
    #[must_use]
    pub const fn world(&self) -> Vec2 {
        self.layout.world
    }

    #[must_use]
    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    #[must_use]
    pub fn sector(&self, index: usize) -> &Sector {
        &self.sectors[index]
    }

    /// Borrow the particle arena.
    #[must_use]
    pub const fn particles(&self) -> &SlotMap<ParticleId, Particle> {
        &self.particles
    }

    #[must_use]
    pub fn particle(&self, id: ParticleId) -> Option<&Particle> {
        self.particles.get(id)
    }

    #[must_use]
    pub fn particle_mut(&mut self, id: ParticleId) -> Option<&mut Particle> {
        self.particles.get_mut(id)
    }

    /// Snapshot of all live particle ids.
    #[must_use]
    pub fn particle_ids(&self) -> Vec<ParticleId> {
        self.particles.keys().collect()
    }

    /// Number of live particles.
    #[must_use]
    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    /// Create a particle and file it into its containing sector.
    pub fn add_particle(&mut self, ptype: ParticleType, position: Vec2, velocity: Vec2) -> ParticleId {
        let particle = Particle::new(ptype, position, velocity);
        let id = self.particles.insert(particle);
        let index = self.layout.sector_index(position);
        self.sectors[index].add_particle(id, particle.attractor());
        id
    }

    /// Move a particle's sector membership after its position changed.
    pub fn transfer_particle(&mut self, id: ParticleId, from: usize, to: usize) {
        debug_assert_ne!(from, to);
        let Some(proxy) = self.particles.get(id).map(Particle::attractor) else {
            debug_assert!(false, "transferring a dead particle");
            return;
        };
        self.sectors[from].remove_particle(id, proxy);
        self.sectors[to].add_particle(id, proxy);
    }

    /// Rebuild every sector's per-type attractors from current membership.
    pub fn refresh_attractors(&mut self) {
        let particles = &self.particles;
        for sector in &mut self.sectors {
            sector.refresh_attractors(particles);
        }
    }

    /// Remove all particles, leaving the grid topology intact.
    pub fn clear_particles(&mut self) {
        self.particles.clear();
        for sector in &mut self.sectors {
            sector.clear();
        }
    }

    /// Vectors from `position` to each wall line of the world rectangle.
    #[must_use]
    pub fn wall_proximity(&self, position: Vec2) -> WallProximity {
        wall_proximity(position, self.world())
    }
}

/// Vectors from `position` to each wall line of a `world`-sized rectangle.
#[must_use]
pub fn wall_proximity(position: Vec2, world: Vec2) -> WallProximity {
    WallProximity {
        left: Vec2::new(-position.x, 0.0),
        right: Vec2::new(world.x - position.x, 0.0),
        top: Vec2::new(0.0, -position.y),
        bottom: Vec2::new(0.0, world.y - position.y),
    }
}

/// Reflect an out-of-bounds particle back inside the world, repeating until
/// no wall is violated. A single step can overshoot by more than one world
/// width before adaptive stepping tunes the time step down, so one
/// reflection is not always enough.
pub fn fix_particle_position(particle: &mut Particle, world: Vec2) {
    loop {
        let walls = wall_proximity(particle.position(), world);
        let mut violated = false;
        if walls.left.x > 0.0 {
            particle.reflect(walls.left);
            violated = true;
        }
        if walls.right.x < 0.0 {
            particle.reflect(walls.right);
            violated = true;
        }
        if walls.top.y > 0.0 {
            particle.reflect(walls.top);
            violated = true;
        }
        if walls.bottom.y < 0.0 {
            particle.reflect(walls.bottom);
            violated = true;
        }
        if !violated {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> UniverseConfig {
        UniverseConfig::default()
    }

    #[test]
    fn layout_resolution_covers_the_force_range() {
        let layout = GridLayout::new(Vec2::new(18_000.0, 8_000.0), 1_500.0);
        // ceil(18000 / 1500 * 2) = 24
        assert_eq!(layout.resolution(), 24);
        assert_eq!(layout.sector_count(), 24 * 24);
        assert_eq!(layout.sector_size(), Vec2::new(750.0, 8_000.0 / 24.0));
    }

    #[test]
    fn layout_enforces_the_minimum_resolution() {
        let layout = GridLayout::new(Vec2::new(1_000.0, 1_000.0), 1_500.0);
        assert_eq!(layout.resolution(), 20);
    }

    #[test]
    fn sector_index_clamps_to_the_grid() {
        let layout = GridLayout::new(Vec2::new(18_000.0, 8_000.0), 1_500.0);
        assert_eq!(layout.sector_index(Vec2::ZERO), 0);
        let last = layout.sector_count() - 1;
        assert_eq!(layout.sector_index(Vec2::new(18_000.0, 8_000.0)), last);
        assert_eq!(layout.sector_index(Vec2::new(-50.0, -50.0)), 0);
        assert_eq!(layout.sector_index(Vec2::new(1e9, 1e9)), last);
    }

    #[test]
    fn sector_bounds_contain_their_own_index() {
        let layout = GridLayout::new(Vec2::new(18_000.0, 8_000.0), 1_500.0);
        for index in [0, 7, 100, layout.sector_count() - 1] {
            let (top_left, bottom_right) = layout.sector_bounds(index);
            let center = (top_left + bottom_right) * 0.5;
            assert_eq!(layout.sector_index(center), index);
        }
    }

    #[test]
    fn neighbor_window_spans_the_force_range() {
        let layout = GridLayout::new(Vec2::new(18_000.0, 8_000.0), 1_500.0);
        let index = layout.sector_index(Vec2::new(9_000.0, 4_000.0));
        let neighbors = layout.neighbor_indices(index, 1_500.0);
        assert!(!neighbors.is_empty());
        assert!(!neighbors.contains(&index));

        // Every sector center within the cap must be in the window.
        let center = {
            let (tl, br) = layout.sector_bounds(index);
            (tl + br) * 0.5
        };
        for other in 0..layout.sector_count() {
            if other == index {
                continue;
            }
            let (tl, br) = layout.sector_bounds(other);
            let other_center = (tl + br) * 0.5;
            if (other_center - center).modulus() <= 1_500.0 {
                assert!(
                    neighbors.contains(&other),
                    "sector {other} lies in range but is missing from the window"
                );
            }
        }
    }

    #[test]
    fn space_files_particles_into_containing_sectors() {
        let mut space = Space::new(&config());
        let position = Vec2::new(123.0, 456.0);
        let id = space.add_particle(ParticleType::Azure, position, Vec2::ZERO);

        let index = space.layout().sector_index(position);
        assert!(space.sector(index).contains(position));
        assert!(space.sector(index).particles_of(ParticleType::Azure).contains(&id));
        assert_eq!(space.particle_count(), 1);
    }

    #[test]
    fn transfer_moves_membership_and_caches() {
        let mut space = Space::new(&config());
        let from_pos = Vec2::new(100.0, 100.0);
        let id = space.add_particle(ParticleType::Cyan, from_pos, Vec2::ZERO);
        let from = space.layout().sector_index(from_pos);

        let to_pos = Vec2::new(9_000.0, 4_000.0);
        let to = space.layout().sector_index(to_pos);
        // Simulate the integrated move before re-filing.
        if let Some(particle) = space.particle_mut(id) {
            *particle = Particle::new(ParticleType::Cyan, to_pos, Vec2::ZERO);
        }
        space.transfer_particle(id, from, to);

        assert!(space.sector(from).is_empty());
        assert!(space.sector(from).attractor(ParticleType::Cyan).is_none());
        assert_eq!(space.sector(to).count(), 1);
        let cached = space.sector(to).attractor(ParticleType::Cyan).expect("cache");
        assert_eq!(cached.position, to_pos);
    }

    #[test]
    fn wall_vectors_point_at_the_walls() {
        let world = Vec2::new(18_000.0, 8_000.0);
        let walls = wall_proximity(Vec2::new(100.0, 7_900.0), world);
        assert_eq!(walls.left, Vec2::new(-100.0, 0.0));
        assert_eq!(walls.right, Vec2::new(17_900.0, 0.0));
        assert_eq!(walls.top, Vec2::new(0.0, -7_900.0));
        assert_eq!(walls.bottom, Vec2::new(0.0, 100.0));
    }

    #[test]
    fn fix_position_reflects_single_overshoot() {
        let world = Vec2::new(1_000.0, 1_000.0);
        let mut particle = Particle::new(
            ParticleType::Pearl,
            Vec2::new(-40.0, 500.0),
            Vec2::new(-10.0, 5.0),
        );
        fix_particle_position(&mut particle, world);
        assert_eq!(particle.position(), Vec2::new(40.0, 500.0));
        assert_eq!(particle.velocity(), Vec2::new(10.0, 5.0));
    }

    #[test]
    fn fix_position_handles_multi_width_overshoot() {
        let world = Vec2::new(1_000.0, 1_000.0);
        let mut particle = Particle::new(
            ParticleType::Pearl,
            Vec2::new(2_500.0, -1_300.0),
            Vec2::new(900.0, -700.0),
        );
        fix_particle_position(&mut particle, world);
        let position = particle.position();
        assert!((0.0..=world.x).contains(&position.x), "x = {}", position.x);
        assert!((0.0..=world.y).contains(&position.y), "y = {}", position.y);
    }

    #[test]
    fn clear_particles_keeps_topology() {
        let mut space = Space::new(&config());
        space.add_particle(ParticleType::Amber, Vec2::new(10.0, 10.0), Vec2::ZERO);
        let sector_count = space.sectors().len();
        space.clear_particles();
        assert_eq!(space.particle_count(), 0);
        assert_eq!(space.sectors().len(), sector_count);
        assert!(space.sectors().iter().all(Sector::is_empty));
    }
}
