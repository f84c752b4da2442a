//! # Phys Engine
//!
//! The physics/collision core of a real-time engine: octree broad phase, SAT
//! narrow phase over oriented bounding boxes, contact extraction via polygon
//! clipping, and impulse-based response with friction, restitution, and sleep
//! management.
//!
//! ## Features
//!
//! - **Octree Spatial Index**: containment-based insertion, range queries,
//!   and a reusable frustum-culling walk for the render side
//! - **Deferred Registration**: lock-guarded pending queues merged once per
//!   tick, safe to call from any thread
//! - **SAT Narrow Phase**: exact OBB-OBB tests with minimum-penetration
//!   resolution axes
//! - **Contact Manifolds**: vertex/edge/face classification with
//!   Sutherland-Hodgman clipping
//! - **Sleep Management**: bodies at rest stop integrating until an impulse
//!   wakes them
//! - **Fixed-Step Runner**: dedicated tick thread, skipping (never queueing)
//!   overlapping ticks
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::{Arc, Mutex};
//! use phys_engine::prelude::*;
//!
//! fn main() -> Result<(), PhysicsError> {
//!     let config = PhysicsConfig::default();
//!     let fixed_dt = config.fixed_timestep;
//!     let world = PhysicsWorld::new(config);
//!     let queue = world.queue();
//!
//!     // Register a frozen floor and a falling crate from any thread.
//!     let floor_transform = Transform::from_position(Vec3::new(0.0, -1.0, 0.0)).into_shared();
//!     let mut floor = Collider::new(
//!         floor_transform,
//!         MeshBounds::new(Vec3::new(-10.0, -0.5, -10.0), Vec3::new(10.0, 0.5, 10.0)),
//!     );
//!     floor.set_frozen(true);
//!     queue.register_static(floor);
//!
//!     let crate_transform = Transform::from_position(Vec3::new(0.0, 5.0, 0.0)).into_shared();
//!     let crate_id = queue.register_static(Collider::new(crate_transform, MeshBounds::unit_cube()));
//!     queue.register_dynamic(crate_id, RigidBody::new());
//!
//!     // Tick on a dedicated thread until shutdown.
//!     let world = Arc::new(Mutex::new(world));
//!     let runner = PhysicsRunner::start(Arc::clone(&world), fixed_dt)?;
//!     // ... game loop ...
//!     drop(runner);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod body;
pub mod collider;
pub mod config;
pub mod foundation;
pub mod geometry;
pub mod physics;
pub mod spatial;

pub use body::{BodySnapshot, RigidBody};
pub use collider::{Collider, ColliderId, MeshBounds};
pub use config::{Config, ConfigError, PhysicsConfig};
pub use physics::{PhysicsError, PhysicsRunner, PhysicsWorld, Ray, RayHit, RegistrationQueue};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        body::RigidBody,
        collider::{Collider, ColliderId, MeshBounds},
        config::{Config, PhysicsConfig},
        foundation::math::{Quat, Transform, Vec3},
        geometry::{BoundingSphere, Frustum, Plane, AABB, OBB},
        physics::{
            ContactManifold, PhysicsError, PhysicsRunner, PhysicsStats, PhysicsWorld, Ray,
            RayHit, RegistrationQueue,
        },
        spatial::Octree,
    };
}
