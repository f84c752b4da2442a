//! Colliders: mesh-derived bounding volumes attached to scene objects
//!
//! A collider owns nothing but bounds: the local-space extents come from an
//! external mesh asset, the world transform from an externally owned
//! [`SharedTransform`]. World-space AABB, bounding sphere, and OBB are
//! recomputed on demand for moving objects and cached for frozen ones.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::foundation::math::{Point3, SharedTransform, Transform, Vec3};
use crate::geometry::{BoundingSphere, AABB, OBB};
use crate::spatial::OctreeKey;

/// Local-space bounds of a mesh, as provided by the asset layer
#[derive(Debug, Clone, Copy)]
pub struct MeshBounds {
    /// Minimum corner in mesh-local space
    pub min: Vec3,
    /// Maximum corner in mesh-local space
    pub max: Vec3,
}

impl MeshBounds {
    /// Create mesh bounds from local min/max corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Unit cube bounds centered at the local origin
    pub fn unit_cube() -> Self {
        Self {
            min: Vec3::new(-0.5, -0.5, -0.5),
            max: Vec3::new(0.5, 0.5, 0.5),
        }
    }

    /// World-space AABB: transform all 8 local corners and take the
    /// component-wise min/max
    pub fn world_aabb(&self, transform: &Transform) -> AABB {
        let matrix = transform.to_matrix();
        let corners = [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ];

        let mut min = Vec3::from_element(f32::MAX);
        let mut max = Vec3::from_element(f32::MIN);
        for corner in corners {
            let transformed = matrix.transform_point(&Point3::from(corner));
            min = min.inf(&transformed.coords);
            max = max.sup(&transformed.coords);
        }

        AABB::new(min, max)
    }

    /// World-space OBB: rotate the local axes, scale the half-extents, and
    /// transform the local center
    pub fn world_obb(&self, transform: &Transform) -> OBB {
        let local_center = (self.min + self.max) * 0.5;
        let local_half = (self.max - self.min) * 0.5;

        let center = transform
            .transform_point(Point3::from(local_center))
            .coords;
        let axes = [
            transform.rotation * Vec3::x(),
            transform.rotation * Vec3::y(),
            transform.rotation * Vec3::z(),
        ];
        let half_extents = local_half.component_mul(&transform.scale.abs());

        OBB::new(center, axes, half_extents)
    }
}

/// Opaque collider handle
///
/// Allocated from an atomic counter so registration can be requested from any
/// thread before the physics tick has merged it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColliderId(u64);

static NEXT_COLLIDER_ID: AtomicU64 = AtomicU64::new(1);

impl ColliderId {
    /// Allocate a fresh, process-unique id
    pub fn fresh() -> Self {
        Self(NEXT_COLLIDER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value, for logs and debug output
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ColliderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "collider#{}", self.0)
    }
}

/// A collider: cached world-space bounding volumes over an external transform
#[derive(Debug, Clone)]
pub struct Collider {
    transform: SharedTransform,
    local_bounds: MeshBounds,
    frozen: bool,

    aabb: AABB,
    sphere: BoundingSphere,
    obb: OBB,
    position: Vec3,

    octree_key: Option<OctreeKey>,
}

impl Collider {
    /// Create a collider over an externally owned transform and mesh bounds
    ///
    /// Bounds are computed immediately so the collider is queryable before its
    /// first tick.
    pub fn new(transform: SharedTransform, local_bounds: MeshBounds) -> Self {
        let snapshot = transform
            .read()
            .map(|t| t.clone())
            .unwrap_or_default();

        let aabb = local_bounds.world_aabb(&snapshot);
        let obb = local_bounds.world_obb(&snapshot);
        Self {
            transform,
            local_bounds,
            frozen: false,
            aabb,
            sphere: BoundingSphere::from_aabb(&aabb),
            obb,
            position: snapshot.position,
            octree_key: None,
        }
    }

    /// Recompute world-space bounds from the current transform
    ///
    /// No-op for frozen colliders: their cache stands until unfrozen. A
    /// poisoned transform lock keeps the cached bounds and logs a warning.
    pub fn compute_bounds(&mut self) {
        if self.frozen {
            return;
        }

        let snapshot = match self.transform.read() {
            Ok(transform) => transform.clone(),
            Err(_) => {
                log::warn!("transform lock poisoned; keeping cached bounds");
                return;
            }
        };

        self.position = snapshot.position;
        self.aabb = self.local_bounds.world_aabb(&snapshot);
        self.obb = self.local_bounds.world_obb(&snapshot);
        self.sphere = BoundingSphere::from_aabb(&self.aabb);
    }

    /// Mark the owner as immovable; cached bounds stop updating
    pub fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
    }

    /// Whether the owner is currently immovable
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Shared handle to the owner's transform
    pub fn transform(&self) -> &SharedTransform {
        &self.transform
    }

    /// Cached world-space AABB
    pub fn aabb(&self) -> &AABB {
        &self.aabb
    }

    /// Cached world-space bounding sphere
    pub fn sphere(&self) -> &BoundingSphere {
        &self.sphere
    }

    /// Cached world-space OBB
    pub fn obb(&self) -> &OBB {
        &self.obb
    }

    /// Cached world position of the owner
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// The 8 world-space OBB corners
    pub fn world_points(&self) -> [Vec3; 8] {
        self.obb.corners()
    }

    /// The 6 world-space face normals
    pub fn world_normals(&self) -> [Vec3; 6] {
        self.obb.face_normals()
    }

    /// The 12 world-space edge vectors
    pub fn world_edges(&self) -> [Vec3; 12] {
        self.obb.edges()
    }

    /// Project the OBB corners onto an axis, returning the (min, max) interval
    pub fn project_onto(&self, axis: Vec3) -> (f32, f32) {
        self.obb.project_onto(axis)
    }

    pub(crate) fn set_octree_key(&mut self, key: OctreeKey) {
        self.octree_key = Some(key);
    }

    pub(crate) fn take_octree_key(&mut self) -> Option<OctreeKey> {
        self.octree_key.take()
    }

    pub(crate) fn octree_key(&self) -> Option<OctreeKey> {
        self.octree_key
    }
}
