//! # Physics World Configuration
//!
//! The configuration value handed to [`Engine::init`](crate::physics::Engine::init):
//! world gravity, the fixed sub-step policy, and the engine-wide material
//! combine rule.

use serde::{Serialize, Deserialize};

use super::Config;
use crate::error::{PhysicsError, Result};
use crate::foundation::math::{utils::is_finite_vec, Vec3};

/// How the friction and restitution of two colliders are merged for a contact pair
///
/// One rule is used engine-wide so every pair is combined the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombineRule {
    /// `(a + b) / 2`
    #[default]
    Average,
    /// `a * b`
    Multiply,
    /// `min(a, b)`
    Min,
    /// `max(a, b)`
    Max,
}

/// World configuration recognized by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity acceleration in world units per second squared
    pub gravity: Vec3,
    /// Largest time slice handed to the solver in one sub-step (seconds)
    pub max_sub_step: f32,
    /// Upper bound on sub-steps per `step()` call; excess frame time is dropped
    pub max_sub_steps_per_frame: u32,
    /// Friction/restitution combine rule for every contact pair
    pub combine_rule: CombineRule,
}

impl PhysicsConfig {
    /// Default gravity: 9.8 m/s² down the Y axis
    pub const DEFAULT_GRAVITY: [f32; 3] = [0.0, -9.8, 0.0];

    /// Create a configuration with the default values
    pub fn new() -> Self {
        Self {
            gravity: Vec3::from(Self::DEFAULT_GRAVITY),
            max_sub_step: 1.0 / 60.0,
            max_sub_steps_per_frame: 10,
            combine_rule: CombineRule::Average,
        }
    }

    /// Set gravity
    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    /// Set the maximum sub-step size in seconds
    pub fn with_max_sub_step(mut self, seconds: f32) -> Self {
        self.max_sub_step = seconds;
        self
    }

    /// Set the maximum number of sub-steps per frame
    pub fn with_max_sub_steps_per_frame(mut self, count: u32) -> Self {
        self.max_sub_steps_per_frame = count;
        self
    }

    /// Set the material combine rule
    pub fn with_combine_rule(mut self, rule: CombineRule) -> Self {
        self.combine_rule = rule;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !is_finite_vec(&self.gravity) {
            return Err(PhysicsError::invalid_argument(format!(
                "gravity must be finite, got {:?}",
                self.gravity
            )));
        }
        if !(self.max_sub_step.is_finite() && self.max_sub_step > 0.0) {
            return Err(PhysicsError::invalid_argument(format!(
                "max_sub_step must be a positive number of seconds, got {}",
                self.max_sub_step
            )));
        }
        if self.max_sub_steps_per_frame == 0 {
            return Err(PhysicsError::invalid_argument(
                "max_sub_steps_per_frame must be at least 1",
            ));
        }
        Ok(())
    }

    /// Split a frame time into `(sub_step_count, sub_step_dt)`
    ///
    /// Every sub-step is at most `max_sub_step` long. When the frame needs more
    /// than `max_sub_steps_per_frame` sub-steps the count is clamped and the
    /// remaining time is dropped; the third value reports whether that happened.
    pub fn sub_steps(&self, dt: f32) -> (u32, f32, bool) {
        let needed = (dt / self.max_sub_step).ceil().max(1.0);
        if needed > self.max_sub_steps_per_frame as f32 {
            (self.max_sub_steps_per_frame, self.max_sub_step, true)
        } else {
            let count = needed as u32;
            (count, dt / count as f32, false)
        }
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for PhysicsConfig {}
