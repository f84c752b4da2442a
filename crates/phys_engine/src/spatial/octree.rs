//! Octree spatial partitioning structure
//!
//! Recursive 8-way subdivision of a fixed world volume. Components are stored
//! at the deepest node whose bounds fully contain them (or at the max-depth
//! node), never duplicated across siblings. The same tree doubles as the
//! render-culling structure: a visibility walk stamps a `culled` flag on every
//! node.

use crate::collider::ColliderId;
use crate::foundation::math::Vec3;
use crate::geometry::{Frustum, AABB};

/// Opaque key recording where a component was inserted
///
/// Removal and culling lookups retrace the containment path with the same
/// bounds the component was inserted with.
pub type OctreeKey = (Vec3, Vec3);

/// Single node in the octree hierarchy
#[derive(Debug, Clone)]
pub struct OctreeNode {
    /// World-space bounds of this node
    pub bounds: AABB,

    /// Components stored at this node
    components: Vec<ColliderId>,

    /// Child octants, None if this is a leaf
    octants: Option<Box<[OctreeNode; 8]>>,

    /// Whether this node is fully outside the camera frustum
    pub culled: bool,
}

impl OctreeNode {
    fn new(bounds: AABB) -> Self {
        Self {
            bounds,
            components: Vec::new(),
            octants: None,
            culled: false,
        }
    }

    /// Check if this node is a leaf (has no children)
    pub fn is_leaf(&self) -> bool {
        self.octants.is_none()
    }

    /// Subdivide this node into 8 octants
    fn divide(&mut self) {
        let min = self.bounds.min;
        let max = self.bounds.max;
        let center = self.bounds.center();

        let octant = |min: Vec3, max: Vec3| OctreeNode::new(AABB::new(min, max));
        self.octants = Some(Box::new([
            // Bottom four, -Y half
            octant(min, center),
            octant(
                Vec3::new(center.x, min.y, min.z),
                Vec3::new(max.x, center.y, center.z),
            ),
            octant(
                Vec3::new(min.x, min.y, center.z),
                Vec3::new(center.x, center.y, max.z),
            ),
            octant(
                Vec3::new(center.x, min.y, center.z),
                Vec3::new(max.x, center.y, max.z),
            ),
            // Top four, +Y half
            octant(
                Vec3::new(min.x, center.y, min.z),
                Vec3::new(center.x, max.y, center.z),
            ),
            octant(
                Vec3::new(center.x, center.y, min.z),
                Vec3::new(max.x, max.y, center.z),
            ),
            octant(
                Vec3::new(min.x, center.y, center.z),
                Vec3::new(center.x, max.y, max.z),
            ),
            octant(center, max),
        ]));
    }

    fn insert(&mut self, id: ColliderId, bounds: &AABB, depth: u32, max_depth: u32) {
        // At max depth the component stays here regardless of fit.
        if depth >= max_depth {
            self.components.push(id);
            return;
        }

        if self.octants.is_none() {
            self.divide();
        }

        if let Some(octants) = self.octants.as_deref_mut() {
            for child in octants.iter_mut() {
                if child.bounds.contains_aabb(bounds) {
                    return child.insert(id, bounds, depth + 1, max_depth);
                }
            }
        }

        // No child fully contains it; it straddles the center planes.
        self.components.push(id);
    }

    fn remove(&mut self, id: ColliderId, bounds: &AABB) -> bool {
        if let Some(index) = self.components.iter().position(|c| *c == id) {
            self.components.swap_remove(index);
            return true;
        }

        if self.is_leaf() {
            return false;
        }

        let mut removed = false;
        if let Some(octants) = self.octants.as_deref_mut() {
            for child in octants.iter_mut() {
                if child.bounds.contains_aabb(bounds) && child.remove(id, bounds) {
                    removed = true;
                    break;
                }
            }
        }

        if removed {
            self.collapse_if_empty();
        }
        removed
    }

    /// Collapse back to a leaf once the entire subtree is empty
    fn collapse_if_empty(&mut self) {
        let empty = self
            .octants
            .as_deref()
            .map_or(false, |octants| {
                octants
                    .iter()
                    .all(|child| child.components.is_empty() && child.is_leaf())
            });

        if empty {
            self.octants = None;
        }
    }

    fn query(&self, bounds: &AABB, results: &mut Vec<ColliderId>) {
        if !self.bounds.intersects(bounds) {
            return;
        }

        // Interior nodes hold straddling components, so every overlapping
        // node along the path contributes, not just leaves.
        results.extend_from_slice(&self.components);

        if let Some(octants) = self.octants.as_deref() {
            for child in octants {
                child.query(bounds, results);
            }
        }
    }

    fn recalculate_visibility(&mut self, frustum: &Frustum, force_cull: bool) {
        // A culled ancestor forces all descendants culled without re-testing.
        self.culled = force_cull || frustum.outside_aabb(&self.bounds);

        if let Some(octants) = self.octants.as_deref_mut() {
            for child in octants.iter_mut() {
                child.recalculate_visibility(frustum, self.culled);
            }
        }
    }

    fn culled_for(&self, bounds: &AABB) -> bool {
        if let Some(octants) = self.octants.as_deref() {
            for child in octants {
                if child.bounds.contains_aabb(bounds) {
                    return child.culled_for(bounds);
                }
            }
        }
        self.culled
    }

    fn count_components(&self) -> usize {
        let mut count = self.components.len();
        if let Some(octants) = self.octants.as_deref() {
            for child in octants {
                count += child.count_components();
            }
        }
        count
    }
}

/// Octree over a fixed world volume
#[derive(Debug, Clone)]
pub struct Octree {
    /// Root node covering the entire world volume
    root: OctreeNode,

    /// Maximum subdivision depth
    max_depth: u32,

    /// Display name used in log lines
    name: String,
}

impl Octree {
    /// Create a new octree with the given world bounds and max depth
    pub fn new(bounds: AABB, max_depth: u32, name: impl Into<String>) -> Self {
        Self {
            root: OctreeNode::new(bounds),
            max_depth,
            name: name.into(),
        }
    }

    /// Insert a component, returning the key needed to remove it later
    ///
    /// The component lands at the deepest node that fully contains its
    /// bounds, or at the max-depth node on that path.
    pub fn insert(&mut self, id: ColliderId, bounds: &AABB) -> OctreeKey {
        self.root.insert(id, bounds, 0, self.max_depth);
        log::debug!("{} added to {}", id, self.name);
        (bounds.min, bounds.max)
    }

    /// Remove a component by the key returned at insertion
    pub fn remove(&mut self, id: ColliderId, key: OctreeKey) -> bool {
        let bounds = AABB::new(key.0, key.1);
        let removed = self.root.remove(id, &bounds);
        if removed {
            log::debug!("{} removed from {}", id, self.name);
        } else {
            log::warn!("{} not found in {} during removal", id, self.name);
        }
        removed
    }

    /// Collect every stored component along all paths overlapping `bounds`
    pub fn query(&self, bounds: &AABB) -> Vec<ColliderId> {
        let mut results = Vec::new();
        self.root.query(bounds, &mut results);
        results
    }

    /// Walk the tree, marking nodes fully outside the frustum as culled
    ///
    /// Reused by the render side for frustum culling; descendants of a culled
    /// node are culled unconditionally.
    pub fn recalculate_visibility(&mut self, frustum: &Frustum) {
        self.root.recalculate_visibility(frustum, false);
    }

    /// Whether the node owning the given key is currently culled
    pub fn is_culled(&self, key: OctreeKey) -> bool {
        let bounds = AABB::new(key.0, key.1);
        self.root.culled_for(&bounds)
    }

    /// Total number of stored components
    pub fn component_count(&self) -> usize {
        self.root.count_components()
    }

    /// Root node, exposed for render-side traversal
    pub fn root(&self) -> &OctreeNode {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Plane;

    fn world() -> AABB {
        AABB::new(
            Vec3::new(-100.0, -100.0, -100.0),
            Vec3::new(100.0, 100.0, 100.0),
        )
    }

    fn small_box(center: Vec3) -> AABB {
        AABB::from_center_extents(center, Vec3::new(1.0, 1.0, 1.0))
    }

    fn all_pass_frustum() -> Frustum {
        let keep = Plane::new(Vec3::y(), 1.0e9);
        Frustum::new([keep; 6])
    }

    #[test]
    fn test_insert_descends_to_containing_child() {
        let mut tree = Octree::new(world(), 7, "test");
        let id = ColliderId::fresh();

        tree.insert(id, &small_box(Vec3::new(50.0, 50.0, 50.0)));

        assert_eq!(tree.component_count(), 1);
        // The box fits entirely in one octant, so the root subdivided.
        assert!(!tree.root().is_leaf());
    }

    #[test]
    fn test_straddling_component_stays_at_root() {
        let mut tree = Octree::new(world(), 7, "test");
        let id = ColliderId::fresh();

        // Centered on the origin: no octant fully contains it.
        tree.insert(id, &small_box(Vec3::zeros()));

        assert_eq!(tree.component_count(), 1);
        let hits = tree.query(&small_box(Vec3::zeros()));
        assert_eq!(hits, vec![id]);
    }

    #[test]
    fn test_insert_then_remove_restores_count_and_collapses() {
        let mut tree = Octree::new(world(), 7, "test");
        let id = ColliderId::fresh();
        let bounds = small_box(Vec3::new(50.0, 50.0, 50.0));

        let before = tree.component_count();
        let key = tree.insert(id, &bounds);
        assert_eq!(tree.component_count(), before + 1);

        assert!(tree.remove(id, key));
        assert_eq!(tree.component_count(), before);
        // Every subtree emptied, so the root collapsed back to a leaf.
        assert!(tree.root().is_leaf());
    }

    #[test]
    fn test_remove_unknown_component_reports_false() {
        let mut tree = Octree::new(world(), 7, "test");
        let id = ColliderId::fresh();
        let bounds = small_box(Vec3::new(50.0, 50.0, 50.0));

        assert!(!tree.remove(id, (bounds.min, bounds.max)));
    }

    #[test]
    fn test_query_prunes_disjoint_subtrees() {
        let mut tree = Octree::new(world(), 7, "test");
        let near = ColliderId::fresh();
        let far = ColliderId::fresh();

        tree.insert(near, &small_box(Vec3::new(50.0, 50.0, 50.0)));
        tree.insert(far, &small_box(Vec3::new(-50.0, -50.0, -50.0)));

        let hits = tree.query(&AABB::from_center_extents(
            Vec3::new(50.0, 50.0, 50.0),
            Vec3::new(5.0, 5.0, 5.0),
        ));

        assert!(hits.contains(&near));
        assert!(!hits.contains(&far));
    }

    #[test]
    fn test_query_includes_interior_node_components() {
        let mut tree = Octree::new(world(), 7, "test");
        let straddler = ColliderId::fresh();
        let deep = ColliderId::fresh();

        tree.insert(straddler, &small_box(Vec3::zeros()));
        tree.insert(deep, &small_box(Vec3::new(50.0, 50.0, 50.0)));

        // Querying near the deep component still passes through the root,
        // which holds the straddler.
        let hits = tree.query(&small_box(Vec3::new(50.0, 50.0, 50.0)));
        assert!(hits.contains(&straddler));
        assert!(hits.contains(&deep));
    }

    #[test]
    fn test_visibility_walk_marks_and_propagates() {
        let mut tree = Octree::new(world(), 7, "test");
        let id = ColliderId::fresh();
        let key = tree.insert(id, &small_box(Vec3::new(50.0, 50.0, 50.0)));

        // Nothing is visible: a plane everything is behind.
        let cull_all = Plane::new(Vec3::y(), -1.0e9);
        let keep = Plane::new(Vec3::y(), 1.0e9);
        tree.recalculate_visibility(&Frustum::new([cull_all, keep, keep, keep, keep, keep]));
        assert!(tree.is_culled(key));

        tree.recalculate_visibility(&all_pass_frustum());
        assert!(!tree.is_culled(key));
    }

    #[test]
    fn test_max_depth_insertion_terminates() {
        // Tiny component that would recurse forever without the depth cap.
        let mut tree = Octree::new(world(), 3, "test");
        let id = ColliderId::fresh();

        let bounds = AABB::from_center_extents(
            Vec3::new(60.0, 60.0, 60.0),
            Vec3::new(1.0e-3, 1.0e-3, 1.0e-3),
        );
        let key = tree.insert(id, &bounds);

        assert_eq!(tree.component_count(), 1);
        assert!(tree.remove(id, key));
    }
}
