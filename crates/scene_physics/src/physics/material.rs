//! Surface response coefficients attached to a collider

use serde::{Deserialize, Serialize};

use crate::error::{PhysicsError, Result};

/// Friction and restitution of one collider
///
/// The coefficients of the two colliders in a contact are merged with the
/// engine-wide [`CombineRule`](crate::config::CombineRule).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    friction: f32,
    restitution: f32,
}

impl Material {
    /// Default friction coefficient
    pub const DEFAULT_FRICTION: f32 = 0.5;

    /// Default restitution (perfectly inelastic)
    pub const DEFAULT_RESTITUTION: f32 = 0.0;

    /// Create a material
    ///
    /// # Errors
    /// `InvalidArgument` unless `friction` is finite and `>= 0` and
    /// `restitution` lies in `[0, 1]`.
    pub fn new(friction: f32, restitution: f32) -> Result<Self> {
        if !(friction.is_finite() && friction >= 0.0) {
            return Err(PhysicsError::invalid_argument(format!(
                "friction must be finite and non-negative, got {friction}"
            )));
        }
        if !(0.0..=1.0).contains(&restitution) {
            return Err(PhysicsError::invalid_argument(format!(
                "restitution must lie in [0, 1], got {restitution}"
            )));
        }
        Ok(Self { friction, restitution })
    }

    /// Friction coefficient
    pub fn friction(&self) -> f32 {
        self.friction
    }

    /// Restitution coefficient
    pub fn restitution(&self) -> f32 {
        self.restitution
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            friction: Self::DEFAULT_FRICTION,
            restitution: Self::DEFAULT_RESTITUTION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_material() {
        let material = Material::default();
        assert_eq!(material.friction(), 0.5);
        assert_eq!(material.restitution(), 0.0);
    }

    #[test]
    fn test_validation() {
        assert!(Material::new(0.0, 1.0).is_ok());
        assert!(Material::new(2.5, 0.3).is_ok());
        assert!(Material::new(-0.1, 0.0).is_err());
        assert!(Material::new(f32::INFINITY, 0.0).is_err());
        assert!(Material::new(0.5, 1.5).is_err());
        assert!(Material::new(0.5, f32::NAN).is_err());
    }
}
