//! Bounding volumes and culling geometry
//!
//! World-space bounding volumes used by the broad phase (sphere, AABB), the
//! narrow phase (OBB), and the render-side frustum-culling walk (plane,
//! frustum).

use crate::foundation::math::{Mat4, Vec3};

/// Axis-Aligned Bounding Box for spatial queries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl AABB {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a point with given extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Check if this AABB fully contains another AABB
    pub fn contains_aabb(&self, other: &AABB) -> bool {
        other.min.x >= self.min.x
            && other.max.x <= self.max.x
            && other.min.y >= self.min.y
            && other.max.y <= self.max.y
            && other.min.z >= self.min.z
            && other.max.z <= self.max.z
    }

    /// Check if this AABB intersects another AABB
    pub fn intersects(&self, other: &AABB) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }
}

/// A bounding sphere for broad-phase rejection
#[derive(Debug, Clone, Copy)]
pub struct BoundingSphere {
    /// The center position of the sphere in world space
    pub center: Vec3,
    /// The radius of the sphere
    pub radius: f32,
}

impl BoundingSphere {
    /// Creates a new bounding sphere with the given center and radius
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Sphere enclosing an AABB: centered on the box, radius to a corner
    pub fn from_aabb(aabb: &AABB) -> Self {
        Self {
            center: aabb.center(),
            radius: aabb.extents().magnitude(),
        }
    }

    /// Check if this sphere intersects with another
    pub fn intersects(&self, other: &BoundingSphere) -> bool {
        let distance_squared = (self.center - other.center).magnitude_squared();
        let radius_sum = self.radius + other.radius;
        distance_squared <= radius_sum * radius_sum
    }
}

/// Oriented Bounding Box: center, orthonormal axes, half-extents
///
/// The axes carry the owner's world rotation; half-extents carry its scale.
#[derive(Debug, Clone)]
pub struct OBB {
    /// Center in world space
    pub center: Vec3,
    /// Orthonormal world-space axes
    pub axes: [Vec3; 3],
    /// Half-extent along each axis
    pub half_extents: Vec3,
}

/// Index pairs describing the 12 edges of a box whose corners come from
/// [`OBB::corners`]
const EDGE_PAIRS: [(usize, usize); 12] = [
    (0, 1),
    (1, 3),
    (3, 2),
    (2, 0),
    (4, 5),
    (5, 7),
    (7, 6),
    (6, 4),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

impl OBB {
    /// Create a new OBB
    pub fn new(center: Vec3, axes: [Vec3; 3], half_extents: Vec3) -> Self {
        Self {
            center,
            axes,
            half_extents,
        }
    }

    /// Axis-aligned unit-sized OBB centered at the origin (identity basis)
    pub fn unit() -> Self {
        Self {
            center: Vec3::zeros(),
            axes: [Vec3::x(), Vec3::y(), Vec3::z()],
            half_extents: Vec3::new(0.5, 0.5, 0.5),
        }
    }

    /// The 8 world-space corners, ordered by sign combination (-,-,-) .. (+,+,+)
    /// with x varying slowest
    pub fn corners(&self) -> [Vec3; 8] {
        let mut corners = [Vec3::zeros(); 8];
        let mut i = 0;
        for x in [-1.0f32, 1.0] {
            for y in [-1.0f32, 1.0] {
                for z in [-1.0f32, 1.0] {
                    corners[i] = self.center
                        + self.axes[0] * (self.half_extents.x * x)
                        + self.axes[1] * (self.half_extents.y * y)
                        + self.axes[2] * (self.half_extents.z * z);
                    i += 1;
                }
            }
        }
        corners
    }

    /// The 6 world-space face normals (positive and negative of each axis)
    pub fn face_normals(&self) -> [Vec3; 6] {
        [
            self.axes[0],
            -self.axes[0],
            self.axes[1],
            -self.axes[1],
            self.axes[2],
            -self.axes[2],
        ]
    }

    /// The 12 world-space edge vectors between adjacent corners
    pub fn edges(&self) -> [Vec3; 12] {
        let corners = self.corners();
        let mut edges = [Vec3::zeros(); 12];
        for (i, &(from, to)) in EDGE_PAIRS.iter().enumerate() {
            edges[i] = corners[to] - corners[from];
        }
        edges
    }

    /// Project all corners onto an axis, returning the (min, max) interval
    pub fn project_onto(&self, axis: Vec3) -> (f32, f32) {
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        for corner in self.corners() {
            let projection = corner.dot(&axis);
            min = min.min(projection);
            max = max.max(projection);
        }
        (min, max)
    }

    /// Closest point on (or inside) the box to the given point
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        let offset = point - self.center;
        let mut closest = self.center;
        let half = [self.half_extents.x, self.half_extents.y, self.half_extents.z];
        for (axis, extent) in self.axes.iter().zip(half) {
            let distance = offset.dot(axis).clamp(-extent, extent);
            closest += axis * distance;
        }
        closest
    }

    /// Check whether a world-space point lies inside the box
    pub fn contains_point(&self, point: Vec3) -> bool {
        let offset = point - self.center;
        let half = [self.half_extents.x, self.half_extents.y, self.half_extents.z];
        self.axes
            .iter()
            .zip(half)
            .all(|(axis, extent)| offset.dot(axis).abs() <= extent)
    }

    /// Distance from a point to the box surface (0 when inside)
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        let offset = point - self.center;
        let half = [self.half_extents.x, self.half_extents.y, self.half_extents.z];
        let mut sum = 0.0f32;
        for (axis, extent) in self.axes.iter().zip(half) {
            let outside = (offset.dot(axis).abs() - extent).max(0.0);
            sum += outside * outside;
        }
        sum.sqrt()
    }
}

/// Plane defined by normal and distance from origin
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    /// Normal vector (should be normalized)
    pub normal: Vec3,
    /// Distance from origin along the normal
    pub distance: f32,
}

impl Plane {
    /// Create a new plane from normal and distance, normalizing both
    pub fn new(normal: Vec3, distance: f32) -> Self {
        let length = normal.magnitude();
        Self {
            normal: normal / length,
            distance: distance / length,
        }
    }

    /// Calculate signed distance from plane to point
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) + self.distance
    }
}

/// Frustum for visibility culling
#[derive(Debug, Clone)]
pub struct Frustum {
    /// Six planes defining the frustum (left, right, bottom, top, near, far)
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Create a frustum from six planes
    pub fn new(planes: [Plane; 6]) -> Self {
        Self { planes }
    }

    /// Extract frustum planes from a view-projection matrix
    ///
    /// Gribb-Hartmann extraction: each plane is the fourth row of the matrix
    /// plus or minus one of the other rows.
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let row = |i: usize| Vec3::new(vp[(i, 0)], vp[(i, 1)], vp[(i, 2)]);
        let w = |i: usize| vp[(i, 3)];

        let plane = |n: Vec3, d: f32| Plane::new(n, d);
        Self {
            planes: [
                plane(row(3) + row(0), w(3) + w(0)),
                plane(row(3) - row(0), w(3) - w(0)),
                plane(row(3) + row(1), w(3) + w(1)),
                plane(row(3) - row(1), w(3) - w(1)),
                plane(row(3) + row(2), w(3) + w(2)),
                plane(row(3) - row(2), w(3) - w(2)),
            ],
        }
    }

    /// Check if an AABB lies fully outside the frustum
    ///
    /// Tests the box corner most aligned with each plane normal; if that
    /// corner is behind any plane, the whole box is.
    pub fn outside_aabb(&self, aabb: &AABB) -> bool {
        for plane in &self.planes {
            let positive_corner = Vec3::new(
                if plane.normal.x > 0.0 { aabb.max.x } else { aabb.min.x },
                if plane.normal.y > 0.0 { aabb.max.y } else { aabb.min.y },
                if plane.normal.z > 0.0 { aabb.max.z } else { aabb.min.z },
            );

            if plane.distance_to_point(positive_corner) < 0.0 {
                return true;
            }
        }

        false
    }
}
