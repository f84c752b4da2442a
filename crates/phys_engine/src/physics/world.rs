//! The physics world: collider/body registry and the per-tick pipeline
//!
//! All external mutation funnels through four lock-guarded pending queues,
//! drained exactly once at the start of each tick; the live stores (collider
//! map, dynamic body map, octree) are only ever touched by whoever holds the
//! world. A tick runs: merge -> integrate -> bounds -> sphere -> AABB -> SAT
//! -> contacts -> response, with contacts resolved in descending contact
//! height.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::body::{BodySnapshot, RigidBody};
use crate::collider::{Collider, ColliderId};
use crate::config::PhysicsConfig;
use crate::foundation::time::Timer;
use crate::geometry::Frustum;
use crate::spatial::Octree;

use super::contact::{self, ContactManifold};
use super::narrow;
use super::ray::{self, Ray, RayHit};

fn lock_or_recover<'a, T>(mutex: &'a Mutex<T>, what: &str) -> MutexGuard<'a, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        log::warn!("{what} lock poisoned; recovering contents");
        poisoned.into_inner()
    })
}

#[derive(Default)]
struct PendingQueues {
    add_static: Mutex<Vec<(ColliderId, Collider)>>,
    remove_static: Mutex<Vec<ColliderId>>,
    add_dynamic: Mutex<Vec<(ColliderId, RigidBody)>>,
    remove_dynamic: Mutex<Vec<ColliderId>>,
}

/// Cloneable, thread-safe handle for registering colliders and bodies
///
/// Requests land in pending queues and take effect at the start of the next
/// tick; nothing mutates the live collision sets mid-scan.
#[derive(Clone, Default)]
pub struct RegistrationQueue {
    pending: Arc<PendingQueues>,
}

impl RegistrationQueue {
    /// Queue a collider for registration, returning its id immediately
    ///
    /// The collider enters the octree-backed static set at the next merge; it
    /// stays in the collider set even if a body is attached later.
    pub fn register_static(&self, collider: Collider) -> ColliderId {
        let id = ColliderId::fresh();
        lock_or_recover(&self.pending.add_static, "pending static adds").push((id, collider));
        id
    }

    /// Queue a collider for removal from the world
    pub fn unregister_static(&self, id: ColliderId) {
        let mut pending = lock_or_recover(&self.pending.remove_static, "pending static removes");
        if !pending.contains(&id) {
            pending.push(id);
        }
    }

    /// Queue a rigid body to attach to an already-registered collider
    ///
    /// At merge the collider leaves the octree: dynamic bodies move every
    /// tick, so they are rescanned directly instead of re-indexed.
    pub fn register_dynamic(&self, id: ColliderId, body: RigidBody) {
        let mut pending = lock_or_recover(&self.pending.add_dynamic, "pending dynamic adds");
        if !pending.iter().any(|(existing, _)| *existing == id) {
            pending.push((id, body));
        }
    }

    /// Queue a rigid body for detachment; the collider itself stays registered
    pub fn unregister_dynamic(&self, id: ColliderId) {
        let mut pending = lock_or_recover(&self.pending.remove_dynamic, "pending dynamic removes");
        if !pending.contains(&id) {
            pending.push(id);
        }
    }
}

/// Per-tick counters, mirrored into logs and debug overlays
#[derive(Debug, Default, Clone)]
pub struct PhysicsStats {
    /// Ticks executed since world creation
    pub tick_count: u64,
    /// Achieved tick rate, from wall-clock time between ticks
    pub ticks_per_second: f32,
    /// Registered colliders after the last merge
    pub collider_count: usize,
    /// Registered dynamic bodies after the last merge
    pub body_count: usize,
    /// Sphere rejection tests in the last tick
    pub sphere_checks: u32,
    /// AABB rejection tests in the last tick
    pub aabb_checks: u32,
    /// SAT tests in the last tick
    pub obb_checks: u32,
    /// Contacts that produced a response in the last tick
    pub contacts_resolved: u32,
}

/// The authoritative physics state: octree, collider set, dynamic body map
pub struct PhysicsWorld {
    config: PhysicsConfig,
    octree: Octree,
    colliders: HashMap<ColliderId, Collider>,
    bodies: HashMap<ColliderId, RigidBody>,
    queue: RegistrationQueue,
    timer: Timer,
    clock: f32,
    stats: PhysicsStats,
}

impl PhysicsWorld {
    /// Create a world sized by the config's bounds and octree depth
    pub fn new(config: PhysicsConfig) -> Self {
        let octree = Octree::new(
            config.world_bounds(),
            config.octree_max_depth,
            "physics octree",
        );

        Self {
            config,
            octree,
            colliders: HashMap::new(),
            bodies: HashMap::new(),
            queue: RegistrationQueue::default(),
            timer: Timer::new(),
            clock: 0.0,
            stats: PhysicsStats::default(),
        }
    }

    /// The active configuration
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// A registration handle, cloneable and usable from any thread
    pub fn queue(&self) -> RegistrationQueue {
        self.queue.clone()
    }

    /// Look up a registered collider
    pub fn collider(&self, id: ColliderId) -> Option<&Collider> {
        self.colliders.get(&id)
    }

    /// Look up a registered dynamic body
    pub fn body(&self, id: ColliderId) -> Option<&RigidBody> {
        self.bodies.get(&id)
    }

    /// Number of registered colliders
    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    /// Number of registered dynamic bodies
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Counters from the most recent tick
    pub fn stats(&self) -> &PhysicsStats {
        &self.stats
    }

    /// Human-readable stats block for debug overlays
    pub fn short_info(&self) -> String {
        format!(
            "Physics TPS - {:.2}\nColliders - {}\nDynamic Objects - {}\nSphere Checks - {}\nAABB Checks - {}\nOBB Checks - {}",
            self.stats.ticks_per_second,
            self.stats.collider_count,
            self.stats.body_count,
            self.stats.sphere_checks,
            self.stats.aabb_checks,
            self.stats.obb_checks,
        )
    }

    /// Advance the world one fixed step
    pub fn step(&mut self, dt: f32) {
        self.timer.update();
        self.clock += dt;
        self.stats.tick_count += 1;
        let wall_delta = self.timer.delta_time();
        self.stats.ticks_per_second = if wall_delta > 0.0 { 1.0 / wall_delta } else { 0.0 };

        self.merge_pending();
        self.integrate_bodies(dt);
        self.refresh_bounds();

        let sphere_conflicts = self.broad_phase_sphere();
        let aabb_conflicts = self.broad_phase_aabb(sphere_conflicts);
        let contacts = self.narrow_phase(aabb_conflicts);

        self.stats.contacts_resolved = contacts.len() as u32;
        for (a, b, manifold) in contacts {
            self.resolve(a, b, &manifold);
        }
    }

    /// Drain the pending queues into the live stores
    ///
    /// The single synchronization point per tick; everything after runs on
    /// stable collections.
    fn merge_pending(&mut self) {
        let added: Vec<_> =
            lock_or_recover(&self.queue.pending.add_static, "pending static adds")
                .drain(..)
                .collect();
        for (id, mut collider) in added {
            let key = self.octree.insert(id, collider.aabb());
            collider.set_octree_key(key);
            self.colliders.insert(id, collider);
        }

        let removed: Vec<_> =
            lock_or_recover(&self.queue.pending.remove_static, "pending static removes")
                .drain(..)
                .collect();
        for id in removed {
            match self.colliders.remove(&id) {
                Some(mut collider) => {
                    if let Some(key) = collider.take_octree_key() {
                        self.octree.remove(id, key);
                    }
                    // A deleted collider takes its body with it.
                    self.bodies.remove(&id);
                }
                None => log::warn!("{id} unregistered but was never registered"),
            }
        }

        let added_dynamic: Vec<_> =
            lock_or_recover(&self.queue.pending.add_dynamic, "pending dynamic adds")
                .drain(..)
                .collect();
        for (id, mut body) in added_dynamic {
            match self.colliders.get_mut(&id) {
                Some(collider) => {
                    if let Some(key) = collider.take_octree_key() {
                        self.octree.remove(id, key);
                    }
                    body.touch(self.clock);
                    if self.bodies.insert(id, body).is_some() {
                        log::warn!("{id} already had a body; replacing it");
                    }
                }
                None => {
                    log::warn!("{id} has no registered collider; dropping body registration");
                }
            }
        }

        let removed_dynamic: Vec<_> =
            lock_or_recover(&self.queue.pending.remove_dynamic, "pending dynamic removes")
                .drain(..)
                .collect();
        for id in removed_dynamic {
            if self.bodies.remove(&id).is_some() {
                // The collider lives on as a static: back into the octree.
                if let Some(collider) = self.colliders.get_mut(&id) {
                    let key = self.octree.insert(id, collider.aabb());
                    collider.set_octree_key(key);
                }
            }
        }

        self.stats.collider_count = self.colliders.len();
        self.stats.body_count = self.bodies.len();
    }

    fn integrate_bodies(&mut self, dt: f32) {
        for (id, body) in &mut self.bodies {
            match self.colliders.get(id) {
                Some(collider) => {
                    body.integrate(collider.transform(), &self.config, self.clock, dt);
                }
                None => log::warn!("{id} has a body but no collider; skipping integration"),
            }
        }
    }

    fn refresh_bounds(&mut self) {
        // No-op for frozen colliders; everything else re-reads its transform.
        for collider in self.colliders.values_mut() {
            collider.compute_bounds();
        }
    }

    /// Sphere rejection over octree candidates plus every dynamic body
    fn broad_phase_sphere(&mut self) -> Vec<(ColliderId, ColliderId)> {
        self.stats.sphere_checks = 0;
        let mut conflicts = Vec::new();

        for (&id, body) in &self.bodies {
            if !body.is_awake() {
                continue;
            }
            let Some(collider) = self.colliders.get(&id) else {
                continue;
            };

            let mut candidates = self.octree.query(collider.aabb());
            // Dynamics are not in the octree; always test against them.
            candidates.extend(self.bodies.keys().copied());

            for other in candidates {
                if other == id {
                    continue;
                }
                let Some(other_collider) = self.colliders.get(&other) else {
                    continue;
                };

                self.stats.sphere_checks += 1;
                if narrow::sphere_overlap(collider, other_collider) {
                    conflicts.push((id, other));
                }
            }
        }

        conflicts
    }

    fn broad_phase_aabb(
        &mut self,
        sphere_conflicts: Vec<(ColliderId, ColliderId)>,
    ) -> Vec<(ColliderId, ColliderId)> {
        self.stats.aabb_checks = 0;
        let mut conflicts = Vec::new();

        for (a, b) in sphere_conflicts {
            let (Some(collider_a), Some(collider_b)) =
                (self.colliders.get(&a), self.colliders.get(&b))
            else {
                continue;
            };

            self.stats.aabb_checks += 1;
            if narrow::aabb_overlap(collider_a, collider_b) {
                conflicts.push((a, b));
            }
        }

        conflicts
    }

    /// SAT plus contact generation, sorted by contact height descending
    fn narrow_phase(
        &mut self,
        aabb_conflicts: Vec<(ColliderId, ColliderId)>,
    ) -> Vec<(ColliderId, ColliderId, ContactManifold)> {
        self.stats.obb_checks = 0;
        let mut contacts = Vec::new();

        for (a, b) in aabb_conflicts {
            let (Some(collider_a), Some(collider_b)) =
                (self.colliders.get(&a), self.colliders.get(&b))
            else {
                continue;
            };

            self.stats.obb_checks += 1;
            if let Some(manifold) =
                contact::manifold(collider_a, collider_b, self.config.penetration_epsilon)
            {
                contacts.push((a, b, manifold));
            }
        }

        contacts.sort_by(|x, y| {
            y.2.point
                .y
                .partial_cmp(&x.2.point.y)
                .unwrap_or(Ordering::Equal)
        });
        contacts
    }

    /// Apply response to whichever side(s) of the contact carry a body
    fn resolve(&mut self, a: ColliderId, b: ColliderId, manifold: &ContactManifold) {
        let resolution = manifold.resolution();
        let snapshot_a = self.bodies.get(&a).map(BodySnapshot::of);
        let snapshot_b = self.bodies.get(&b).map(BodySnapshot::of);

        if let Some(transform) = self.colliders.get(&a).map(|c| c.transform().clone()) {
            if let Some(body) = self.bodies.get_mut(&a) {
                body.respond_to_collision(
                    &transform,
                    manifold.point,
                    resolution,
                    snapshot_b,
                    &self.config,
                    self.clock,
                );
            }
        }

        if let Some(transform) = self.colliders.get(&b).map(|c| c.transform().clone()) {
            if let Some(body) = self.bodies.get_mut(&b) {
                body.respond_to_collision(
                    &transform,
                    manifold.point,
                    -resolution,
                    snapshot_a,
                    &self.config,
                    self.clock,
                );
            }
        }
    }

    /// Nearest ray hit against registered collider AABBs
    pub fn raycast(&self, ray: &Ray) -> Option<RayHit> {
        self.raycast_all(ray).into_iter().next()
    }

    /// Every ray hit, sorted ascending by distance; empty means no hit
    pub fn raycast_all(&self, ray: &Ray) -> Vec<RayHit> {
        let mut hits = Vec::new();

        for (&id, collider) in &self.colliders {
            if let Some(distance) = ray::intersect_aabb(ray, collider.aabb()) {
                hits.push(RayHit {
                    collider: id,
                    distance,
                    point: ray.point_at(distance),
                });
            }
        }

        hits.sort_by(|h1, h2| {
            h1.distance
                .partial_cmp(&h2.distance)
                .unwrap_or(Ordering::Equal)
        });
        hits
    }

    /// Re-run frustum culling over the octree for the render side
    pub fn recalculate_visibility(&mut self, frustum: &Frustum) {
        self.octree.recalculate_visibility(frustum);
    }

    /// Whether the octree node holding this collider is culled
    ///
    /// Dynamic bodies are not in the octree and always report visible.
    pub fn is_culled(&self, id: ColliderId) -> bool {
        self.colliders
            .get(&id)
            .and_then(|collider| collider.octree_key())
            .map_or(false, |key| self.octree.is_culled(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collider::MeshBounds;
    use crate::foundation::math::{Transform, Vec3};
    use approx::assert_relative_eq;

    fn static_box(
        queue: &RegistrationQueue,
        position: Vec3,
        half_extents: Vec3,
    ) -> ColliderId {
        let transform = Transform::from_position(position).into_shared();
        let mut collider = Collider::new(
            transform,
            MeshBounds::new(-half_extents, half_extents),
        );
        collider.set_frozen(true);
        queue.register_static(collider)
    }

    fn dynamic_cube(queue: &RegistrationQueue, position: Vec3) -> ColliderId {
        let transform = Transform::from_position(position).into_shared();
        let collider = Collider::new(transform, MeshBounds::unit_cube());
        let id = queue.register_static(collider);
        queue.register_dynamic(id, RigidBody::new());
        id
    }

    #[test]
    fn test_registrations_apply_only_at_merge() {
        let mut world = PhysicsWorld::new(PhysicsConfig::default());
        let queue = world.queue();

        let id = static_box(&queue, Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(world.collider_count(), 0);

        world.step(world.config().fixed_timestep);
        assert_eq!(world.collider_count(), 1);
        assert!(world.collider(id).is_some());

        queue.unregister_static(id);
        assert_eq!(world.collider_count(), 1);
        world.step(world.config().fixed_timestep);
        assert_eq!(world.collider_count(), 0);
    }

    #[test]
    fn test_dynamic_registration_leaves_octree() {
        let mut world = PhysicsWorld::new(PhysicsConfig::default());
        let queue = world.queue();

        let id = dynamic_cube(&queue, Vec3::new(10.0, 10.0, 10.0));
        world.step(world.config().fixed_timestep);

        assert_eq!(world.collider_count(), 1);
        assert_eq!(world.body_count(), 1);
        // Out of the octree, so the collider no longer owns a key.
        assert!(world.collider(id).expect("collider").octree_key().is_none());
    }

    #[test]
    fn test_detached_body_returns_collider_to_octree() {
        let mut world = PhysicsWorld::new(PhysicsConfig::default());
        let queue = world.queue();

        let id = dynamic_cube(&queue, Vec3::new(10.0, 10.0, 10.0));
        world.step(world.config().fixed_timestep);
        assert!(world.collider(id).expect("collider").octree_key().is_none());

        queue.unregister_dynamic(id);
        world.step(world.config().fixed_timestep);

        assert_eq!(world.body_count(), 0);
        assert_eq!(world.collider_count(), 1);
        // Static again: re-indexed under a fresh octree key.
        assert!(world.collider(id).expect("collider").octree_key().is_some());
    }

    #[test]
    fn test_unregister_static_drops_attached_body() {
        let mut world = PhysicsWorld::new(PhysicsConfig::default());
        let queue = world.queue();

        let id = dynamic_cube(&queue, Vec3::zeros());
        world.step(world.config().fixed_timestep);
        assert_eq!(world.body_count(), 1);

        queue.unregister_static(id);
        world.step(world.config().fixed_timestep);

        assert_eq!(world.collider_count(), 0);
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn test_body_without_collider_is_dropped() {
        let mut world = PhysicsWorld::new(PhysicsConfig::default());
        let queue = world.queue();

        queue.register_dynamic(ColliderId::fresh(), RigidBody::new());
        world.step(world.config().fixed_timestep);

        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn test_disjoint_pair_never_reaches_sat() {
        // Zero gravity keeps the pair exactly where it spawned.
        let config = PhysicsConfig {
            gravity: Vec3::zeros(),
            ..Default::default()
        };
        let mut world = PhysicsWorld::new(config);
        let queue = world.queue();

        dynamic_cube(&queue, Vec3::new(-20.0, 0.0, 0.0));
        dynamic_cube(&queue, Vec3::new(20.0, 0.0, 0.0));
        world.step(world.config().fixed_timestep);

        // The pair was sphere-tested and rejected before SAT ever ran.
        assert!(world.stats().sphere_checks > 0);
        assert_eq!(world.stats().obb_checks, 0);
        assert_eq!(world.stats().contacts_resolved, 0);
    }

    #[test]
    fn test_raycast_hits_nearest_static_collider() {
        let mut world = PhysicsWorld::new(PhysicsConfig::default());
        let queue = world.queue();

        let near = static_box(&queue, Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let far = static_box(&queue, Vec3::new(0.0, 0.0, -10.0), Vec3::new(1.0, 1.0, 1.0));
        world.step(world.config().fixed_timestep);

        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let hit = world.raycast(&ray).expect("hit");
        assert_eq!(hit.collider, near);
        assert_relative_eq!(hit.distance, 4.0, epsilon = 1.0e-5);
        assert_relative_eq!(hit.point.z, 1.0, epsilon = 1.0e-5);

        let all = world.raycast_all(&ray);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].collider, near);
        assert_eq!(all[1].collider, far);
        assert!(all[0].distance < all[1].distance);

        // From inside the near box nothing is self-hit; only the far box.
        let inside = Ray::new(Vec3::zeros(), Vec3::new(0.0, 0.0, -1.0));
        let hit = world.raycast(&inside).expect("hit");
        assert_eq!(hit.collider, far);
    }

    #[test]
    fn test_resting_body_settles_and_sleeps() {
        let mut world = PhysicsWorld::new(PhysicsConfig::default());
        let queue = world.queue();

        // Wide static floor with its top face at y = -0.5.
        static_box(&queue, Vec3::new(0.0, -1.0, 0.0), Vec3::new(5.0, 0.5, 5.0));
        // Unit cube dropped from slightly above the floor.
        let cube = dynamic_cube(&queue, Vec3::new(0.0, 0.2, 0.0));

        let dt = world.config().fixed_timestep;
        for _ in 0..400 {
            world.step(dt);
        }

        let body = world.body(cube).expect("body");
        assert!(!body.is_awake(), "resting body should have gone to sleep");
        assert_relative_eq!(body.velocity.magnitude(), 0.0);
        assert_relative_eq!(body.angular_velocity.magnitude(), 0.0);

        // The cube rests on the floor instead of sinking through it.
        let collider = world.collider(cube).expect("collider");
        let center_y = collider.aabb().center().y;
        assert!(
            center_y > -0.3 && center_y < 0.3,
            "cube should rest near y = 0, found {center_y}"
        );
    }

    #[test]
    fn test_visibility_walk_marks_static_colliders() {
        use crate::geometry::Plane;

        let mut world = PhysicsWorld::new(PhysicsConfig::default());
        let queue = world.queue();
        let id = static_box(&queue, Vec3::new(0.0, 10.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        world.step(world.config().fixed_timestep);

        let keep = Plane::new(Vec3::y(), 1.0e9);
        let cull_all = Plane::new(Vec3::y(), -1.0e9);

        world.recalculate_visibility(&Frustum::new([cull_all, keep, keep, keep, keep, keep]));
        assert!(world.is_culled(id));

        world.recalculate_visibility(&Frustum::new([keep; 6]));
        assert!(!world.is_culled(id));
    }
}
