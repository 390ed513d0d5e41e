//! Weighted-centroid attractor aggregation.
//!
//! An attractor stands in for one or more same-type particles in force
//! calculations: merging collapses a group into its weighted centroid, and
//! exclusion inverts a merge to remove a single member's contribution. This
//! is the device that turns O(n²) pairwise evaluation into one evaluation
//! per sector and type.

use crate::particle::{ParticleType, TYPE_COUNT};
use crate::vector::Vec2;
use serde::{Deserialize, Serialize};

/// Weighted-centroid proxy for one or more particles of a single type.
/// Purely derived data; the weight always equals the number of particles
/// represented.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Attractor {
    pub ptype: ParticleType,
    pub position: Vec2,
    pub weight: f32,
}

impl Attractor {
    #[must_use]
    pub const fn new(ptype: ParticleType, position: Vec2, weight: f32) -> Self {
        Self {
            ptype,
            position,
            weight,
        }
    }

    /// Combine two same-type attractors into their weighted centroid.
    #[must_use]
    pub fn merge_with(&self, other: &Self) -> Self {
        debug_assert_eq!(self.ptype, other.ptype);
        let weight = self.weight + other.weight;
        let position =
            (self.position * self.weight + other.position * other.weight) * (1.0 / weight);
        Self::new(self.ptype, position, weight)
    }
}

/// Merge a sequence of attractors, collapsing same-type entries into one
/// weighted centroid each. Different types pass through untouched; the
/// first-seen type order is preserved.
#[must_use]
pub fn merge<I: IntoIterator<Item = Attractor>>(attractors: I) -> Vec<Attractor> {
    let mut slots: [Option<Attractor>; TYPE_COUNT] = [None; TYPE_COUNT];
    let mut order: Vec<usize> = Vec::new();

    for attractor in attractors {
        let slot = &mut slots[attractor.ptype.index()];
        match slot {
            Some(existing) => *existing = existing.merge_with(&attractor),
            None => {
                *slot = Some(attractor);
                order.push(attractor.ptype.index());
            }
        }
    }

    order.into_iter().filter_map(|index| slots[index]).collect()
}

/// Invert a merge: the attractor representing every member of `aggregate`
/// except `single`. Returns `None` when the subtraction is degenerate
/// (`single` was the entire aggregate). A type mismatch indicates a caller
/// bug; the aggregate passes through unchanged in that case.
#[must_use]
pub fn exclude(single: &Attractor, aggregate: &Attractor) -> Option<Attractor> {
    if single.ptype != aggregate.ptype {
        return Some(*aggregate);
    }
    let weight = aggregate.weight - single.weight;
    if weight <= 0.0 {
        return None;
    }
    let position =
        (aggregate.position * aggregate.weight - single.position * single.weight) * (1.0 / weight);
    Some(Attractor::new(aggregate.ptype, position, weight))
}
