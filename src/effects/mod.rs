//! Decorative particle effects. The page animates the particles; this module
//! owns when they exist.

mod confetti;
mod particles;
mod snow;

pub use confetti::{ConfettiBurst, CONFETTI_COUNT};
pub use particles::{Particle, ParticleLayer};
pub use snow::SnowController;
