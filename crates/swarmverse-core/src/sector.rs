//! Spatial grid cells owning particle membership and attractor caches.

use crate::attractor::{Attractor, exclude, merge};
use crate::particle::{Particle, ParticleId, ParticleType, TYPE_COUNT};
use crate::vector::Vec2;
use slotmap::SlotMap;

/// One rectangular cell of the sector grid. Owns the ids of the particles
/// currently inside its bounds, a per-type attractor cache kept
/// incrementally consistent on add/remove, and the precomputed list of
/// neighbor sectors within force range.
///
/// The maintenance policy (incremental merge/exclude plus a from-scratch
/// refresh at frame end) is entirely private to this type, so a
/// recompute-only policy could be substituted without touching the
/// orchestrator.
#[derive(Debug, Clone)]
pub struct Sector {
    top_left: Vec2,
    bottom_right: Vec2,
    center: Vec2,
    particles: [Vec<ParticleId>; TYPE_COUNT],
    attractors: [Option<Attractor>; TYPE_COUNT],
    neighbors: Vec<usize>,
    count: usize,
}

impl Sector {
    /// Create an empty sector with the given bounds.
    #[must_use]
    pub fn new(top_left: Vec2, bottom_right: Vec2) -> Self {
        let center = (top_left + bottom_right) * 0.5;
        Self {
            top_left,
            bottom_right,
            center,
            particles: std::array::from_fn(|_| Vec::new()),
            attractors: [None; TYPE_COUNT],
            neighbors: Vec::new(),
            count: 0,
        }
    }

    #[must_use]
    pub const fn top_left(&self) -> Vec2 {
        self.top_left
    }

    #[must_use]
    pub const fn bottom_right(&self) -> Vec2 {
        self.bottom_right
    }

    #[must_use]
    pub const fn center(&self) -> Vec2 {
        self.center
    }

    /// Whether `position` lies within the sector bounds (edges inclusive;
    /// ownership on shared edges is decided by grid indexing, not by this
    /// predicate).
    #[must_use]
    pub fn contains(&self, position: Vec2) -> bool {
        position.x >= self.top_left.x
            && position.x <= self.bottom_right.x
            && position.y >= self.top_left.y
            && position.y <= self.bottom_right.y
    }

    /// Total resident particles.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Indices of sectors whose cells fall within force range.
    #[must_use]
    pub fn neighbors(&self) -> &[usize] {
        &self.neighbors
    }

    pub(crate) fn set_neighbors(&mut self, neighbors: Vec<usize>) {
        self.neighbors = neighbors;
    }

    /// Resident particle ids of one type.
    #[must_use]
    pub fn particles_of(&self, ptype: ParticleType) -> &[ParticleId] {
        &self.particles[ptype.index()]
    }

    /// Iterate over all resident particle ids.
    pub fn iter_particles(&self) -> impl Iterator<Item = ParticleId> + '_ {
        self.particles.iter().flatten().copied()
    }

    /// Cached aggregate attractor for a type, if any particles of that type
    /// are resident.
    #[must_use]
    pub fn attractor(&self, ptype: ParticleType) -> Option<Attractor> {
        self.attractors[ptype.index()]
    }

    /// File a particle into this sector, folding it into the type's cached
    /// attractor in O(1).
    pub fn add_particle(&mut self, id: ParticleId, proxy: Attractor) {
        self.particles[proxy.ptype.index()].push(id);
        self.count += 1;

        let slot = &mut self.attractors[proxy.ptype.index()];
        *slot = match slot {
            Some(existing) => Some(existing.merge_with(&proxy)),
            None => Some(proxy),
        };
    }

    /// Remove a particle, subtracting its contribution from the cached
    /// attractor. `proxy` must describe the particle as currently stored.
    pub fn remove_particle(&mut self, id: ParticleId, proxy: Attractor) {
        let bucket = &mut self.particles[proxy.ptype.index()];
        let Some(index) = bucket.iter().position(|&member| member == id) else {
            debug_assert!(false, "removing a particle this sector does not own");
            return;
        };
        bucket.swap_remove(index);
        self.count -= 1;

        let slot = &mut self.attractors[proxy.ptype.index()];
        *slot = match slot {
            Some(aggregate) => exclude(&proxy, aggregate),
            None => {
                debug_assert!(false, "attractor cache missing for resident type");
                None
            }
        };
    }

    /// Recompute one type's attractor from the resident particles,
    /// discarding incremental rounding drift.
    pub fn refresh_attractor(&mut self, ptype: ParticleType, arena: &SlotMap<ParticleId, Particle>) {
        let bucket = &self.particles[ptype.index()];
        let merged = merge(
            bucket
                .iter()
                .filter_map(|&id| arena.get(id))
                .map(Particle::attractor),
        );
        self.attractors[ptype.index()] = merged.into_iter().next();
    }

    /// Recompute every type's attractor from scratch.
    pub fn refresh_attractors(&mut self, arena: &SlotMap<ParticleId, Particle>) {
        for ptype in ParticleType::ALL {
            self.refresh_attractor(ptype, arena);
        }
    }

    /// Drop all membership and cached attractors.
    pub fn clear(&mut self) {
        for bucket in &mut self.particles {
            bucket.clear();
        }
        self.attractors = [None; TYPE_COUNT];
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sector() -> Sector {
        Sector::new(Vec2::ZERO, Vec2::new(100.0, 100.0))
    }

    fn arena_with(particles: &[Particle]) -> (SlotMap<ParticleId, Particle>, Vec<ParticleId>) {
        let mut arena: SlotMap<ParticleId, Particle> = SlotMap::with_key();
        let ids = particles.iter().map(|&p| arena.insert(p)).collect();
        (arena, ids)
    }

    #[test]
    fn center_and_containment() {
        let sector = sector();
        assert_eq!(sector.center(), Vec2::new(50.0, 50.0));
        assert!(sector.contains(Vec2::new(0.0, 100.0)));
        assert!(sector.contains(Vec2::new(42.0, 17.0)));
        assert!(!sector.contains(Vec2::new(-0.1, 50.0)));
        assert!(!sector.contains(Vec2::new(50.0, 100.1)));
    }

    #[test]
    fn add_maintains_attractor_cache_incrementally() {
        let mut sector = sector();
        let a = Particle::new(ParticleType::Azure, Vec2::new(10.0, 10.0), Vec2::ZERO);
        let b = Particle::new(ParticleType::Azure, Vec2::new(30.0, 10.0), Vec2::ZERO);
        let (_, ids) = arena_with(&[a, b]);

        sector.add_particle(ids[0], a.attractor());
        sector.add_particle(ids[1], b.attractor());

        let cached = sector.attractor(ParticleType::Azure).expect("cache");
        assert_eq!(cached.weight, 2.0);
        assert_eq!(cached.position, Vec2::new(20.0, 10.0));
        assert_eq!(sector.count(), 2);
        assert!(sector.attractor(ParticleType::Pearl).is_none());
    }

    #[test]
    fn remove_excludes_from_the_cache() {
        let mut sector = sector();
        let a = Particle::new(ParticleType::Emerald, Vec2::new(10.0, 10.0), Vec2::ZERO);
        let b = Particle::new(ParticleType::Emerald, Vec2::new(30.0, 50.0), Vec2::ZERO);
        let (_, ids) = arena_with(&[a, b]);
        sector.add_particle(ids[0], a.attractor());
        sector.add_particle(ids[1], b.attractor());

        sector.remove_particle(ids[0], a.attractor());
        let cached = sector.attractor(ParticleType::Emerald).expect("cache");
        assert_eq!(cached.weight, 1.0);
        assert!((cached.position - b.position()).modulus() < 1e-3);

        sector.remove_particle(ids[1], b.attractor());
        assert!(sector.attractor(ParticleType::Emerald).is_none());
        assert!(sector.is_empty());
    }

    #[test]
    fn refresh_matches_membership_exactly() {
        let mut sector = sector();
        let particles = [
            Particle::new(ParticleType::Amber, Vec2::new(0.0, 0.0), Vec2::ZERO),
            Particle::new(ParticleType::Amber, Vec2::new(60.0, 30.0), Vec2::ZERO),
            Particle::new(ParticleType::Cyan, Vec2::new(90.0, 90.0), Vec2::ZERO),
        ];
        let (arena, ids) = arena_with(&particles);
        for (&id, particle) in ids.iter().zip(&particles) {
            sector.add_particle(id, particle.attractor());
        }

        sector.refresh_attractors(&arena);
        let amber = sector.attractor(ParticleType::Amber).expect("amber");
        assert_eq!(amber.weight, 2.0);
        assert_eq!(amber.position, Vec2::new(30.0, 15.0));
        let cyan = sector.attractor(ParticleType::Cyan).expect("cyan");
        assert_eq!(cyan.weight, 1.0);
        assert!(sector.attractor(ParticleType::Pearl).is_none());
    }

    #[test]
    fn clear_drops_everything() {
        let mut sector = sector();
        let a = Particle::new(ParticleType::Magenta, Vec2::new(5.0, 5.0), Vec2::ZERO);
        let (_, ids) = arena_with(&[a]);
        sector.add_particle(ids[0], a.attractor());

        sector.clear();
        assert!(sector.is_empty());
        assert!(sector.attractor(ParticleType::Magenta).is_none());
        assert_eq!(sector.iter_particles().count(), 0);
    }
}
