//! Physics module for collision detection and response
//!
//! The tick pipeline lives in [`world`]; [`narrow`] and [`contact`] hold the
//! SAT and manifold-extraction math, [`ray`] the raycaster, and [`runner`]
//! the fixed-interval thread that drives it all.

pub mod contact;
pub mod narrow;
pub mod ray;
pub mod runner;
pub mod world;

pub use contact::ContactManifold;
pub use narrow::SatHit;
pub use ray::{Ray, RayHit};
pub use runner::PhysicsRunner;
pub use world::{PhysicsStats, PhysicsWorld, RegistrationQueue};

/// Errors from physics infrastructure (never from per-tick math, which
/// degrades to "no effect" instead)
#[derive(thiserror::Error, Debug)]
pub enum PhysicsError {
    /// The dedicated tick thread could not be spawned
    #[error("failed to spawn physics tick thread: {0}")]
    ThreadSpawn(#[from] std::io::Error),
}
