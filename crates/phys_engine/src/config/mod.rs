//! Configuration system
//!
//! Serde-backed configuration with TOML and RON file support. Simulation
//! constants (gravity, timestep, sleep thresholds) live in [`PhysicsConfig`]
//! so hosts can tune them from a config file instead of recompiling.

pub use serde::{Deserialize, Serialize};

use crate::foundation::math::Vec3;
use crate::geometry::AABB;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, Default::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Tunable constants for the physics core
///
/// Defaults reproduce the engine's reference behavior; hosts normally load
/// these once at startup and hand them to
/// [`PhysicsWorld::new`](crate::physics::PhysicsWorld::new).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsConfig {
    /// World-space gravity applied to every awake body each step
    pub gravity: Vec3,

    /// Fixed timestep of the physics tick, in seconds
    pub fixed_timestep: f32,

    /// Minimum corner of the octree's world bounds
    pub world_min: Vec3,

    /// Maximum corner of the octree's world bounds
    pub world_max: Vec3,

    /// Maximum subdivision depth of the octree
    pub octree_max_depth: u32,

    /// Seconds a body must rest below the sleep threshold before sleeping
    pub sleep_timeout: f32,

    /// Squared speed below which a body is considered at rest
    ///
    /// Also the squared impulse magnitude that resets the sleep timer.
    pub sleep_speed_squared: f32,

    /// Squared magnitude below which an impulse is discarded entirely
    pub wake_impulse_squared: f32,

    /// SAT penetration depths below this are treated as not colliding
    ///
    /// Anti-jitter threshold for merely-touching surfaces.
    pub penetration_epsilon: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.8, 0.0),
            fixed_timestep: 1.0 / 60.0,
            world_min: Vec3::new(-500.0, -500.0, -500.0),
            world_max: Vec3::new(500.0, 500.0, 500.0),
            octree_max_depth: 7,
            sleep_timeout: 2.0,
            sleep_speed_squared: 0.5 * 0.5,
            wake_impulse_squared: 0.01 * 0.01,
            penetration_epsilon: 0.002,
        }
    }
}

impl Config for PhysicsConfig {}

impl PhysicsConfig {
    /// World bounds as an AABB, used to size the octree
    pub fn world_bounds(&self) -> AABB {
        AABB::new(self.world_min, self.world_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_constants() {
        let config = PhysicsConfig::default();
        assert_eq!(config.gravity.y, -9.8);
        assert_eq!(config.octree_max_depth, 7);
        assert_eq!(config.sleep_timeout, 2.0);
        assert_eq!(config.penetration_epsilon, 0.002);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = PhysicsConfig {
            gravity: Vec3::new(0.0, -3.7, 0.0),
            sleep_timeout: 5.0,
            ..Default::default()
        };

        let text = toml::to_string_pretty(&config).expect("serialize");
        let restored: PhysicsConfig = toml::from_str(&text).expect("deserialize");

        assert_eq!(restored.gravity, config.gravity);
        assert_eq!(restored.sleep_timeout, config.sleep_timeout);
        assert_eq!(restored.fixed_timestep, config.fixed_timestep);
    }

    #[test]
    fn test_unsupported_format_is_rejected() {
        let result = PhysicsConfig::load_from_file("physics.yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
