//! Rigid bodies: semi-implicit Euler integration, sleep management, and
//! impulse-based collision response
//!
//! A body never owns its transform; it integrates and corrects the externally
//! owned [`SharedTransform`] of the collider it is attached to. Angular
//! response goes through a fixed approximate inverse inertia of `1/(2*mass)`
//! instead of a true tensor.

use crate::config::PhysicsConfig;
use crate::foundation::math::{Quat, SharedTransform, Vec3};

/// Immutable view of the other body in a contact, captured before resolution
///
/// Response is applied one body at a time; the counterpart's state is
/// snapshotted so both sides of a dynamic-dynamic pair resolve against the
/// same values.
#[derive(Debug, Clone, Copy)]
pub struct BodySnapshot {
    /// Mass of the other body
    pub mass: f32,
    /// Linear velocity of the other body
    pub velocity: Vec3,
    /// Angular velocity of the other body
    pub angular_velocity: Vec3,
}

impl BodySnapshot {
    /// Capture the fields response needs from a body
    pub fn of(body: &RigidBody) -> Self {
        Self {
            mass: body.mass,
            velocity: body.velocity,
            angular_velocity: body.angular_velocity,
        }
    }
}

/// A dynamic rigid body attached to exactly one collider
#[derive(Debug, Clone)]
pub struct RigidBody {
    /// Linear velocity in world units per second
    pub velocity: Vec3,
    /// Angular velocity in radians per second about each world axis
    pub angular_velocity: Vec3,
    /// Mass; also drives the approximate inverse inertia
    pub mass: f32,
    /// Linear velocity damping per second
    pub linear_drag: f32,
    /// Angular velocity damping per second
    pub angular_drag: f32,
    /// Bounciness of collision response
    pub restitution: f32,
    /// Linear friction coefficient when resting
    pub static_friction: f32,
    /// Linear friction coefficient when sliding
    pub kinetic_friction: f32,
    /// Angular friction coefficient when resting
    pub angular_static_friction: f32,
    /// Angular friction coefficient when spinning against a contact
    pub angular_kinetic_friction: f32,
    /// Zero out angular state and skip angular integration entirely
    pub disable_rotation: bool,

    awake: bool,
    last_interacted: f32,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self {
            velocity: Vec3::zeros(),
            angular_velocity: Vec3::zeros(),
            mass: 1.0,
            linear_drag: 0.5,
            angular_drag: 0.5,
            restitution: 0.2,
            static_friction: 0.6,
            kinetic_friction: 0.4,
            angular_static_friction: 0.1,
            angular_kinetic_friction: 0.1,
            disable_rotation: false,
            awake: true,
            last_interacted: 0.0,
        }
    }
}

impl RigidBody {
    /// Create a body with default tuning
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a body with the given mass and default tuning otherwise
    pub fn with_mass(mass: f32) -> Self {
        Self {
            mass,
            ..Default::default()
        }
    }

    /// Whether the body is currently participating in integration and scans
    pub fn is_awake(&self) -> bool {
        self.awake
    }

    /// Reset the sleep timer, e.g. when the body first enters the world
    pub fn touch(&mut self, now: f32) {
        self.last_interacted = now;
    }

    /// Advance the body one fixed step
    ///
    /// Sleeping bodies only have their velocities pinned to zero. Awake bodies
    /// get gravity, drag, and position/rotation updates, then a sleep check:
    /// below the speed threshold on both channels for longer than the timeout
    /// puts the body to sleep.
    pub fn integrate(
        &mut self,
        transform: &SharedTransform,
        config: &PhysicsConfig,
        now: f32,
        dt: f32,
    ) {
        if !self.awake {
            self.velocity = Vec3::zeros();
            self.angular_velocity = Vec3::zeros();
            return;
        }

        let mut guard = match transform.write() {
            Ok(guard) => guard,
            Err(_) => {
                log::warn!("transform lock poisoned; skipping integration step");
                return;
            }
        };

        self.velocity += config.gravity * dt;
        self.velocity *= 1.0 - self.linear_drag * dt;
        guard.position += self.velocity * dt;

        if self.disable_rotation {
            self.angular_velocity = Vec3::zeros();
        } else {
            let delta = self.angular_velocity * dt;
            let delta_rotation = Quat::from_euler_angles(delta.x, delta.y, delta.z);
            guard.rotation = delta_rotation * guard.rotation;
            self.angular_velocity *= 1.0 - self.angular_drag * dt;
        }
        drop(guard);

        if self.velocity.magnitude_squared() < config.sleep_speed_squared
            && self.angular_velocity.magnitude_squared() < config.sleep_speed_squared
            && now > self.last_interacted + config.sleep_timeout
        {
            self.velocity = Vec3::zeros();
            self.angular_velocity = Vec3::zeros();
            self.awake = false;
        }
    }

    /// Respond to a contact
    ///
    /// `resolution` is the penetration axis scaled by depth, oriented from
    /// this body toward the other; `other` is `None` against a static
    /// collider. Applies positional correction, then a normal impulse with
    /// linear and angular friction. Contacts whose relative normal velocity
    /// is already separating receive only the positional correction.
    pub fn respond_to_collision(
        &mut self,
        transform: &SharedTransform,
        contact_point: Vec3,
        resolution: Vec3,
        other: Option<BodySnapshot>,
        config: &PhysicsConfig,
        now: f32,
    ) {
        let other_mass = other.map_or(0.0, |o| o.mass);
        let total_mass = self.mass + other_mass;

        // A static counterpart absorbs none of the correction; a dynamic pair
        // splits it by mass share, damped to keep stacked bodies stable.
        let correction_strength = match other {
            None => 1.0,
            Some(_) => (other_mass / total_mass) * 0.4,
        };
        let correction = resolution * correction_strength;

        let body_position = {
            let mut guard = match transform.write() {
                Ok(guard) => guard,
                Err(_) => {
                    log::warn!("transform lock poisoned; skipping collision response");
                    return;
                }
            };
            guard.position -= correction;
            guard.position
        };

        let other_velocity = other.map_or(Vec3::zeros(), |o| o.velocity);
        let normal = if resolution.magnitude_squared() > 0.0 {
            resolution.normalize()
        } else {
            Vec3::zeros()
        };
        let relative_velocity = self.velocity - other_velocity;
        let velocity_along_normal = relative_velocity.dot(&normal);

        // Already separating along the normal; the contact self-resolves.
        if velocity_along_normal < 0.0 {
            return;
        }

        let mut impulse_scalar = -(1.0 + self.restitution) * velocity_along_normal;
        if other.is_some() {
            impulse_scalar /= total_mass;
        }

        let linear_impulse = normal * impulse_scalar;
        let tangential_velocity = relative_velocity - normal * velocity_along_normal;
        if tangential_velocity.magnitude_squared() > 0.0 {
            let friction_direction = tangential_velocity.normalize();
            let coefficient = if velocity_along_normal == 0.0 {
                self.static_friction
            } else {
                self.kinetic_friction
            };
            let max_friction = coefficient * impulse_scalar.abs();
            let magnitude = max_friction.min(tangential_velocity.magnitude());
            let friction_impulse = -friction_direction * magnitude;

            self.apply_impulse(linear_impulse + friction_impulse, config, now, false);
        } else {
            self.apply_impulse(linear_impulse, config, now, false);
        }

        let relative_position = contact_point - body_position;
        let mut angular_impulse = relative_position.cross(&linear_impulse);

        let other_angular = other.map_or(Vec3::zeros(), |o| o.angular_velocity);
        let relative_angular = self.angular_velocity - other_angular;
        let angular_along_normal = normal * relative_angular.dot(&normal);
        let tangential_angular = relative_angular - angular_along_normal;

        if tangential_angular.magnitude_squared() > 0.0 {
            let direction = tangential_angular.normalize();
            let coefficient = if velocity_along_normal == 0.0 {
                self.angular_static_friction
            } else {
                self.angular_kinetic_friction
            };
            let max_friction = coefficient * impulse_scalar.abs();
            let magnitude = max_friction.min(tangential_angular.magnitude());
            angular_impulse += -direction * magnitude;
        }

        // Approximate inverse inertia; a real tensor would need the collider
        // shape, which response deliberately does not see.
        let inverse_inertia = 1.0 / (2.0 * self.mass);
        self.apply_torque(angular_impulse * inverse_inertia, config, now, false);
    }

    /// Apply a linear impulse
    ///
    /// Impulses below the wake floor are discarded. Impulses above the sleep
    /// threshold (or with `force_awake`) reset the sleep timer and wake the
    /// body.
    pub fn apply_impulse(
        &mut self,
        impulse: Vec3,
        config: &PhysicsConfig,
        now: f32,
        force_awake: bool,
    ) {
        if impulse.magnitude_squared() < config.wake_impulse_squared {
            return;
        }

        self.velocity += impulse;
        if impulse.magnitude_squared() > config.sleep_speed_squared || force_awake {
            self.last_interacted = now;
            self.awake = true;
        }
    }

    /// Apply an angular impulse; ignored when rotation is disabled
    pub fn apply_torque(
        &mut self,
        impulse: Vec3,
        config: &PhysicsConfig,
        now: f32,
        force_awake: bool,
    ) {
        if self.disable_rotation {
            return;
        }

        if impulse.magnitude_squared() < config.wake_impulse_squared {
            return;
        }

        self.angular_velocity += impulse;
        if impulse.magnitude_squared() > config.sleep_speed_squared || force_awake {
            self.last_interacted = now;
            self.awake = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Transform;
    use approx::assert_relative_eq;

    fn step_many(body: &mut RigidBody, transform: &SharedTransform, config: &PhysicsConfig, steps: u32) -> f32 {
        let dt = config.fixed_timestep;
        let mut now = 0.0;
        for _ in 0..steps {
            now += dt;
            body.integrate(transform, config, now, dt);
        }
        now
    }

    #[test]
    fn test_gravity_accelerates_body_downward() {
        let config = PhysicsConfig {
            gravity: Vec3::new(0.0, -9.8, 0.0),
            ..Default::default()
        };
        let transform = Transform::identity().into_shared();
        let mut body = RigidBody::new();
        body.linear_drag = 0.0;
        body.touch(1000.0); // keep the sleep timer out of the way

        step_many(&mut body, &transform, &config, 60);

        assert!(body.velocity.y < -9.0);
        assert!(transform.read().expect("transform").position.y < 0.0);
    }

    #[test]
    fn test_body_sleeps_below_threshold_past_timeout() {
        let config = PhysicsConfig {
            gravity: Vec3::zeros(),
            ..Default::default()
        };
        let transform = Transform::identity().into_shared();
        let mut body = RigidBody::new();
        body.velocity = Vec3::new(0.1, 0.0, 0.0); // below sleep speed

        // 3 simulated seconds at 60 Hz: past the 2 s timeout.
        step_many(&mut body, &transform, &config, 180);

        assert!(!body.is_awake());
        assert_relative_eq!(body.velocity.magnitude(), 0.0);
        assert_relative_eq!(body.angular_velocity.magnitude(), 0.0);
    }

    #[test]
    fn test_impulse_wakes_sleeping_body() {
        let config = PhysicsConfig {
            gravity: Vec3::zeros(),
            ..Default::default()
        };
        let transform = Transform::identity().into_shared();
        let mut body = RigidBody::new();
        let now = step_many(&mut body, &transform, &config, 180);
        assert!(!body.is_awake());

        body.apply_impulse(Vec3::new(1.0, 0.0, 0.0), &config, now, false);
        assert!(body.is_awake());
        assert_relative_eq!(body.velocity.x, 1.0);
    }

    #[test]
    fn test_tiny_impulse_is_discarded() {
        let config = PhysicsConfig::default();
        let mut body = RigidBody::new();

        body.apply_impulse(Vec3::new(1.0e-4, 0.0, 0.0), &config, 0.0, false);
        assert_relative_eq!(body.velocity.x, 0.0);
    }

    #[test]
    fn test_disable_rotation_zeroes_angular_state() {
        let config = PhysicsConfig {
            gravity: Vec3::zeros(),
            ..Default::default()
        };
        let transform = Transform::identity().into_shared();
        let mut body = RigidBody::new();
        body.disable_rotation = true;
        body.angular_velocity = Vec3::new(0.0, 3.0, 0.0);
        body.touch(1000.0);

        body.integrate(&transform, &config, 0.016, config.fixed_timestep);

        assert_relative_eq!(body.angular_velocity.magnitude(), 0.0);
        body.apply_torque(Vec3::new(0.0, 5.0, 0.0), &config, 0.0, false);
        assert_relative_eq!(body.angular_velocity.magnitude(), 0.0);
    }

    #[test]
    fn test_separating_contact_applies_only_positional_correction() {
        let config = PhysicsConfig::default();
        let transform = Transform::identity().into_shared();
        let mut body = RigidBody::new();
        // Moving away from the other along the resolution axis.
        body.velocity = Vec3::new(-1.0, 0.0, 0.0);

        let resolution = Vec3::new(0.1, 0.0, 0.0);
        body.respond_to_collision(&transform, Vec3::zeros(), resolution, None, &config, 0.0);

        // Full correction against a static counterpart, no impulse.
        let position = transform.read().expect("transform").position;
        assert_relative_eq!(position.x, -0.1);
        assert_relative_eq!(body.velocity.x, -1.0);
    }

    #[test]
    fn test_approaching_contact_receives_restitution_impulse() {
        let config = PhysicsConfig::default();
        let transform = Transform::identity().into_shared();
        let mut body = RigidBody::new();
        body.velocity = Vec3::new(1.0, 0.0, 0.0); // toward the other body

        let resolution = Vec3::new(0.1, 0.0, 0.0);
        body.respond_to_collision(&transform, Vec3::zeros(), resolution, None, &config, 0.0);

        // impulse = -(1 + 0.2) * 1.0 along +x, so the velocity reverses.
        assert_relative_eq!(body.velocity.x, -0.2, epsilon = 1.0e-5);
    }
}
