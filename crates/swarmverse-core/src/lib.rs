//! Sector-partitioned particle-life simulation engine.
//!
//! Particles of a small set of types attract or repel each other according
//! to a per-type affinity matrix. Pairwise evaluation is made tractable by
//! partitioning the world into sectors and collapsing each sector's
//! same-type particles into a single weighted-centroid attractor, so the
//! per-frame cost is proportional to sectors-in-range rather than particle
//! pairs.

pub mod attractor;
pub mod config;
pub mod force;
pub mod particle;
pub mod properties;
pub mod sector;
pub mod space;
pub mod universe;
pub mod vector;

pub use attractor::{Attractor, exclude, merge};
pub use config::{ConfigError, UniverseConfig};
pub use force::{InteractionMode, force};
pub use particle::{Particle, ParticleId, ParticleType, TYPE_COUNT};
pub use properties::PropertyTable;
pub use sector::Sector;
pub use space::{GridLayout, Space, WallProximity};
pub use universe::{Frame, FrameSummary, ParticleSnapshot, Universe};
pub use vector::{Axis, Vec2, distance, sum};
