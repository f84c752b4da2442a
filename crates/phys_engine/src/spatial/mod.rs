//! Spatial partitioning data structures
//!
//! Provides the octree used for broad-phase collision queries and for the
//! render-side frustum-culling walk.

mod octree;

pub use octree::{Octree, OctreeKey, OctreeNode};
