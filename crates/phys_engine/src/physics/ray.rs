//! Ray casting against registered collider AABBs
//!
//! Linear slab-method scan. A ray that starts inside a box never reports a
//! hit against that box, so a camera or character origin embedded in its own
//! collider cannot pick itself.

use crate::collider::ColliderId;
use crate::foundation::math::Vec3;
use crate::geometry::AABB;

/// A ray for picking and line-of-sight queries
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// The origin point of the ray in world space
    pub origin: Vec3,
    /// The direction of the ray (normalized on construction)
    pub direction: Vec3,
    /// Maximum hit distance; hits beyond it are discarded
    pub range: f32,
}

impl Ray {
    /// Creates an unbounded ray with the given origin and direction
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
            range: f32::MAX,
        }
    }

    /// Creates a ray limited to the given range
    pub fn with_range(origin: Vec3, direction: Vec3, range: f32) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
            range,
        }
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Result of a successful ray cast
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    /// The collider that was hit
    pub collider: ColliderId,
    /// The distance from the ray origin to the hit point
    pub distance: f32,
    /// The point of intersection in world space
    pub point: Vec3,
}

/// Slab-method ray/AABB test returning the entry distance
///
/// `None` when the ray misses, when the box lies behind the origin, when the
/// entry point exceeds the ray's range, or when the origin is inside the box.
pub(crate) fn intersect_aabb(ray: &Ray, aabb: &AABB) -> Option<f32> {
    let t_min = (aabb.min - ray.origin).component_div(&ray.direction);
    let t_max = (aabb.max - ray.origin).component_div(&ray.direction);

    let mut near = t_min.x.min(t_max.x);
    let mut far = t_min.x.max(t_max.x);

    near = near.max(t_min.y.min(t_max.y));
    far = far.min(t_min.y.max(t_max.y));

    near = near.max(t_min.z.min(t_max.z));
    far = far.min(t_min.z.max(t_max.z));

    if near > far || far < 0.0 {
        return None;
    }

    // Origin inside the box: never a hit.
    if near < 0.0 {
        return None;
    }

    (near <= ray.range).then_some(near)
}
