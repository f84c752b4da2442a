//! Contact manifold generation
//!
//! Given the SAT resolution axis, classifies each box's penetrating corners
//! into a vertex, edge, or face "intersecting shape" and reduces the pair to a
//! single contact point: directly for vertex contacts, via segment math for
//! edges, and via 2D Sutherland-Hodgman polygon clipping for face-face
//! contacts. Degenerate geometry (NaN centroids, empty clip output) means no
//! contact, never a propagated error.

use std::cmp::Ordering;

use crate::collider::Collider;
use crate::foundation::math::{Vec2, Vec3};

use super::narrow::{self, SatHit};

/// Transient description of a single contact between two colliders
#[derive(Debug, Clone, Copy)]
pub struct ContactManifold {
    /// Unit resolution axis, oriented from collider A toward collider B
    pub axis: Vec3,
    /// Penetration depth along the axis
    pub depth: f32,
    /// World-space contact point
    pub point: Vec3,
}

impl ContactManifold {
    /// Resolution vector: axis scaled by penetration depth
    pub fn resolution(&self) -> Vec3 {
        self.axis * self.depth
    }
}

/// Full narrow-phase pipeline for one pair: SAT, then contact extraction
///
/// `None` either means no collision or a contact too degenerate to anchor a
/// response; both degrade to "no effect" by policy.
pub fn manifold(a: &Collider, b: &Collider, epsilon: f32) -> Option<ContactManifold> {
    let SatHit {
        axis,
        depth,
        resolution,
    } = narrow::sat_obb(a, b, epsilon)?;

    let point = contact_point(a, b, axis)?;

    Some(ContactManifold {
        axis: resolution / depth,
        depth,
        point,
    })
}

/// A 2D-projected vertex that remembers its 3D origin through clipping
#[derive(Debug, Clone, Copy)]
struct ClipVertex {
    flat: Vec2,
    world: Vec3,
}

/// Reduce a colliding pair to a single contact point along the SAT axis
pub fn contact_point(a: &Collider, b: &Collider, axis: Vec3) -> Option<Vec3> {
    let (min_a, max_a) = a.project_onto(axis);
    let (min_b, max_b) = b.project_onto(axis);
    let overlap_start = min_a.max(min_b);
    let overlap_end = max_a.min(max_b);

    let a_shape = points_in_overlap(&a.world_points(), axis, overlap_start, overlap_end);
    let b_shape = points_in_overlap(&b.world_points(), axis, overlap_start, overlap_end);

    let clipped_a: Vec<Vec3> = a_shape
        .iter()
        .copied()
        .filter(|point| vertex_inside_shape(&b_shape, axis, *point))
        .collect();
    let clipped_b: Vec<Vec3> = b_shape
        .iter()
        .copied()
        .filter(|point| vertex_inside_shape(&a_shape, axis, *point))
        .collect();

    // Vertex contact: a lone corner must actually be on the other's surface.
    if a_shape.len() == 1 && clipped_a.is_empty() {
        return None;
    }
    if b_shape.len() == 1 && clipped_b.is_empty() {
        return None;
    }
    if clipped_a.len() == 1 {
        return Some(clipped_a[0]);
    }
    if clipped_b.len() == 1 {
        return Some(clipped_b[0]);
    }

    // Edge contact: both endpoints on-surface, the midpoint serves.
    if a_shape.len() == 2 && clipped_a.len() == 2 {
        return Some((clipped_a[0] + clipped_a[1]) * 0.5);
    }
    if b_shape.len() == 2 && clipped_b.len() == 2 {
        return Some((clipped_b[0] + clipped_b[1]) * 0.5);
    }

    // Edge against edge: closest approach of the two segments.
    if a_shape.len() == 2 && b_shape.len() == 2 {
        return Some(edge_intersection(
            a_shape[0], a_shape[1], b_shape[0], b_shape[1],
        ));
    }

    // Edge against face: project the face centroid onto the edge.
    if a_shape.len() == 2 && b_shape.len() >= 3 {
        let midpoint = polygon_midpoint(&b_shape);
        let point = closest_point_on_segment(midpoint, a_shape[0], a_shape[1]);
        if vertex_inside_shape(&b_shape, axis, point) {
            return Some(point);
        }
    }
    if b_shape.len() == 2 && a_shape.len() >= 3 {
        let midpoint = polygon_midpoint(&a_shape);
        let point = closest_point_on_segment(midpoint, b_shape[0], b_shape[1]);
        if vertex_inside_shape(&a_shape, axis, point) {
            return Some(point);
        }
    }

    if clipped_a.is_empty() && clipped_b.is_empty() {
        return None;
    }

    // Face against face: clip one polygon by the other and take the centroid.
    if b_shape.len() >= 3 {
        let clipped = if clipped_b.is_empty() {
            sutherland_hodgman(&a_shape, &b_shape, axis)
        } else {
            sutherland_hodgman(&b_shape, &a_shape, axis)
        };
        return face_contact(&clipped);
    }
    if a_shape.len() >= 3 {
        let clipped = if clipped_a.is_empty() {
            sutherland_hodgman(&b_shape, &a_shape, axis)
        } else {
            sutherland_hodgman(&a_shape, &b_shape, axis)
        };
        return face_contact(&clipped);
    }

    log::warn!(
        "unhandled contact configuration ({} vs {} intersecting points)",
        a_shape.len(),
        b_shape.len()
    );
    None
}

/// Corners of one box whose axis projection falls inside the overlap interval
fn points_in_overlap(points: &[Vec3], axis: Vec3, start: f32, end: f32) -> Vec<Vec3> {
    points
        .iter()
        .copied()
        .filter(|point| {
            let projection = point.dot(&axis);
            projection >= start && projection <= end
        })
        .collect()
}

/// Centroid of a clipped face polygon; degenerate results become "no contact"
fn face_contact(clipped: &[Vec3]) -> Option<Vec3> {
    if clipped.is_empty() {
        log::warn!("face clipping produced an empty polygon; dropping contact");
        return None;
    }

    let point = polygon_midpoint(clipped);
    if point.iter().any(|c| c.is_nan()) {
        log::warn!("face clipping produced a NaN centroid; dropping contact");
        return None;
    }

    Some(point)
}

/// Project a 3D point into the 2D plane perpendicular to `axis`
fn project_to_2d(point: Vec3, axis: Vec3) -> Vec2 {
    let mut u = axis.cross(&Vec3::x());
    if u.magnitude_squared() < 1.0e-6 {
        u = axis.cross(&Vec3::y());
    }
    let u = u.normalize();
    let v = axis.cross(&u).normalize();

    Vec2::new(point.dot(&u), point.dot(&v))
}

fn polar_angle(centroid: Vec2, point: Vec2) -> f32 {
    (point.y - centroid.y).atan2(point.x - centroid.x)
}

/// Sort 2D points counterclockwise around their own centroid so projected
/// corner sets form a consistent convex winding
fn polar_sort_by<T>(items: &mut [T], flat: impl Fn(&T) -> Vec2) {
    if items.is_empty() {
        return;
    }

    let centroid = items.iter().fold(Vec2::zeros(), |acc, item| acc + flat(item))
        / items.len() as f32;

    items.sort_by(|p, q| {
        polar_angle(centroid, flat(p))
            .partial_cmp(&polar_angle(centroid, flat(q)))
            .unwrap_or(Ordering::Equal)
    });
}

/// Point-in-convex-polygon test; the polygon must be wound counterclockwise
fn point_inside_polygon(point: Vec2, polygon: &[Vec2]) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    for i in 0..polygon.len() {
        let a = polygon[i];
        let b = polygon[(i + 1) % polygon.len()];

        let cross = (b.x - a.x) * (point.y - a.y) - (b.y - a.y) * (point.x - a.x);
        if cross < -1.0e-6 {
            return false;
        }
    }
    true
}

/// Whether a 3D point lies inside a shape's 2D footprint perpendicular to the
/// axis; shapes with fewer than 3 points have no footprint
fn vertex_inside_shape(shape: &[Vec3], axis: Vec3, point: Vec3) -> bool {
    if shape.len() < 3 {
        return false;
    }

    let mut flattened: Vec<Vec2> = shape
        .iter()
        .map(|vertex| project_to_2d(*vertex, axis))
        .collect();
    polar_sort_by(&mut flattened, |p| *p);

    point_inside_polygon(project_to_2d(point, axis), &flattened)
}

fn closest_point_on_segment(point: Vec3, a: Vec3, b: Vec3) -> Vec3 {
    let ab = b - a;
    let t = (point - a).dot(&ab) / ab.dot(&ab);
    a + ab * t.clamp(0.0, 1.0)
}

/// Midpoint of the closest approach between two edge segments
fn edge_intersection(a1: Vec3, a2: Vec3, b1: Vec3, b2: Vec3) -> Vec3 {
    let dir_a = (a2 - a1).normalize();
    let dir_b = (b2 - b1).normalize();
    let r = a1 - b1;

    let aa = dir_a.dot(&dir_a);
    let ab = dir_a.dot(&dir_b);
    let bb = dir_b.dot(&dir_b);
    let ar = dir_a.dot(&r);
    let br = dir_b.dot(&r);
    let denom = aa * bb - ab * ab;

    if denom.abs() < 1.0e-6 {
        return (a1 + b1) * 0.5; // Parallel edges
    }

    let s = (ab * br - bb * ar) / denom;
    let t = (aa * br - ab * ar) / denom;
    let closest_a = a1 + dir_a * s;
    let closest_b = b1 + dir_b * t;
    (closest_a + closest_b) * 0.5
}

fn polygon_midpoint(polygon: &[Vec3]) -> Vec3 {
    let sum = polygon.iter().fold(Vec3::zeros(), |acc, p| acc + *p);
    sum / polygon.len() as f32
}

fn is_inside_edge(point: Vec2, edge_start: Vec2, edge_end: Vec2) -> bool {
    (edge_end.x - edge_start.x) * (point.y - edge_start.y)
        - (edge_end.y - edge_start.y) * (point.x - edge_start.x)
        >= 0.0
}

fn line_intersection(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> Vec2 {
    let dir_a = a2 - a1;
    let dir_b = b2 - b1;
    let r = a1 - b1;

    let denom = dir_a.x * dir_b.y - dir_a.y * dir_b.x;
    if denom.abs() < 1.0e-6 {
        return (a1 + b1) * 0.5;
    }

    let t = (r.x * dir_b.y - r.y * dir_b.x) / denom;
    a1 + dir_a * t
}

/// Clip intersection carrying the interpolated 3D position
fn intersect_clip_edge(
    prev: &ClipVertex,
    curr: &ClipVertex,
    edge_start: Vec2,
    edge_end: Vec2,
) -> ClipVertex {
    let flat = line_intersection(prev.flat, curr.flat, edge_start, edge_end);

    let total = (curr.flat - prev.flat).magnitude();
    let partial = (flat - prev.flat).magnitude();
    let t = if total > 1.0e-6 { partial / total } else { 0.5 };

    ClipVertex {
        flat,
        world: prev.world + (curr.world - prev.world) * t,
    }
}

/// Sutherland-Hodgman clipping of `subject` by `clip`, in the 2D plane
/// perpendicular to `axis`
///
/// Fast-pathed when either polygon fully contains the other: the contained
/// polygon is returned unclipped, in its original 3D form.
fn sutherland_hodgman(subject: &[Vec3], clip: &[Vec3], axis: Vec3) -> Vec<Vec3> {
    let mut subject_polygon: Vec<ClipVertex> = subject
        .iter()
        .map(|&point| ClipVertex {
            flat: project_to_2d(point, axis),
            world: point,
        })
        .collect();
    polar_sort_by(&mut subject_polygon, |v| v.flat);

    let mut clip_polygon: Vec<Vec2> = clip
        .iter()
        .map(|&point| project_to_2d(point, axis))
        .collect();
    polar_sort_by(&mut clip_polygon, |p| *p);

    // Containment fast paths.
    if subject_polygon
        .iter()
        .all(|vertex| point_inside_polygon(vertex.flat, &clip_polygon))
    {
        return subject.to_vec();
    }

    let subject_flats: Vec<Vec2> = subject_polygon.iter().map(|v| v.flat).collect();
    if clip_polygon
        .iter()
        .all(|point| point_inside_polygon(*point, &subject_flats))
    {
        return clip.to_vec();
    }

    let mut output = subject_polygon;
    for i in 0..clip_polygon.len() {
        let edge_start = clip_polygon[i];
        let edge_end = clip_polygon[(i + 1) % clip_polygon.len()];

        let input = std::mem::take(&mut output);
        if input.is_empty() {
            continue;
        }

        let mut prev = input[input.len() - 1];
        for curr in input {
            let curr_inside = is_inside_edge(curr.flat, edge_start, edge_end);
            let prev_inside = is_inside_edge(prev.flat, edge_start, edge_end);

            if curr_inside {
                if !prev_inside {
                    output.push(intersect_clip_edge(&prev, &curr, edge_start, edge_end));
                }
                output.push(curr);
            } else if prev_inside {
                output.push(intersect_clip_edge(&prev, &curr, edge_start, edge_end));
            }
            prev = curr;
        }
    }

    output.into_iter().map(|vertex| vertex.world).collect()
}
