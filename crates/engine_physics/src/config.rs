//! Physics settings.

use engine_math::Vec3;
use serde::{Deserialize, Serialize};

/// Standard gravity used when none is configured.
pub const DEFAULT_GRAVITY: Vec3 = Vec3::new(0.0, -9.780_33, 0.0);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Per-component tolerance below which transforms count as unchanged.
    pub epsilon: f32,
    pub gravity: Vec3,
    /// Duration of one simulation step, in seconds.
    pub fixed_timestep: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            epsilon: 0.001,
            gravity: DEFAULT_GRAVITY,
            fixed_timestep: 1.0 / 60.0,
        }
    }
}

impl PhysicsConfig {
    #[must_use]
    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    #[must_use]
    pub fn with_epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon;
        self
    }

    #[must_use]
    pub fn with_fixed_timestep(mut self, fixed_timestep: f32) -> Self {
        self.fixed_timestep = fixed_timestep;
        self
    }
}
