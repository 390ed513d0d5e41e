//! Lennard-Jones-like pairwise force law.
//!
//! The potential has an attractive well past the equilibrium distance and a
//! hard repulsive core below it. Distances under the flattening floor are
//! clamped, so the short-range regime is a constant-coefficient repulsion
//! rather than a singularity. Everything beyond `Config.force_distance_cap`
//! is defined as zero force; callers skip evaluation past the cap, which is
//! what makes the sector partitioning a valid approximation rather than a
//! shortcut.

use crate::vector::{Vec2, random_unit};
use rand::Rng;

/// Equilibrium distance of the potential.
pub const ED: f32 = 5.0;
/// Overall force multiplier.
pub const A: f32 = 10.0;
/// Primary (attractive) component amplifier.
pub const A1: f32 = 0.5;
/// Repulsive component amplifier.
pub const A2: f32 = 1.0;
/// Primary factor power; must stay below the repulsion power.
pub const M: f32 = 1.0;
/// Repulsion factor power.
pub const N: f32 = 2.0;

/// Offset from the equilibrium to the law's singular distance,
/// `(a2/a1)^(1/(m-n))`.
#[must_use]
pub fn singular_distance() -> f32 {
    (A2 / A1).powf(1.0 / (M - N))
}

/// Flattening floor: distances below this are clamped before evaluating the
/// law, keeping the short-range force finite.
#[must_use]
pub fn flattening_distance() -> f32 {
    ED - 1e-6
}

/// Whether the interaction strength is derived from one affinity or two.
///
/// Asymmetric mode squares the probe's affinity and keeps its sign, so a
/// type's self-interaction always has the attract-then-repel shape.
/// Symmetric mode multiplies both directions' affinities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractionMode {
    Asymmetric,
    Symmetric { affinity_b: f32 },
}

/// Sign of `x` as `-1`, `0`, or `1`, with `NaN` mapping to `0`.
#[must_use]
pub fn sign(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn effective_affinity(affinity_a: f32, mode: InteractionMode) -> f32 {
    match mode {
        InteractionMode::Asymmetric => sign(affinity_a) * affinity_a * affinity_a,
        InteractionMode::Symmetric { affinity_b } => affinity_a * affinity_b,
    }
}

/// Force exerted on a probe particle by a source at displacement `r`
/// (pointing from the probe toward the source), with `d == r.modulus()`
/// precomputed by the caller.
///
/// Coincident entities (`d == 0`) are given a random unit displacement so
/// they separate instead of producing an undefined force.
#[must_use]
pub fn force<R: Rng + ?Sized>(
    r: Vec2,
    d: f32,
    affinity_a: f32,
    mode: InteractionMode,
    rng: &mut R,
) -> Vec2 {
    let mut r = r;
    let mut d = d;
    if d == 0.0 {
        r = random_unit(rng);
        d = r.modulus();
    }
    let fd = flattening_distance();
    if d <= fd {
        d = fd;
    }

    let strength = effective_affinity(affinity_a, mode);
    let offset = (d - ED - singular_distance()).abs();
    let coefficient =
        strength.abs() * A * (sign(strength) * (A1 / offset).powf(M) - (A2 / offset).powf(N));

    r * coefficient
}
