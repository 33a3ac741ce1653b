//! Ray queries against the physics world

use super::engine::ColliderHandle;
use crate::error::{PhysicsError, Result};
use crate::foundation::math::{utils::is_finite_vec, Vec3};

/// A ray for ray casting and picking
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    origin: Vec3,
    direction: Vec3,
}

impl Ray {
    /// Creates a ray; the direction is normalized
    ///
    /// # Errors
    /// `InvalidArgument` for a non-finite origin or a zero/non-finite direction.
    pub fn new(origin: Vec3, direction: Vec3) -> Result<Self> {
        if !is_finite_vec(&origin) || !is_finite_vec(&direction) {
            return Err(PhysicsError::invalid_argument("ray origin and direction must be finite"));
        }
        let direction = direction
            .try_normalize(f32::EPSILON)
            .ok_or_else(|| PhysicsError::invalid_argument("ray direction must be non-zero"))?;
        Ok(Self { origin, direction })
    }

    /// World-space origin
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Unit direction
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Result of a ray cast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// The collider that was hit
    pub collider: ColliderHandle,
    /// The distance from the ray origin to the hit point
    pub distance: f32,
    /// The point of intersection in world space
    pub point: Vec3,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_direction_is_normalized() {
        let ray = Ray::new(Vec3::zeros(), Vec3::new(0.0, -4.0, 0.0)).unwrap();
        assert_relative_eq!(ray.direction(), Vec3::new(0.0, -1.0, 0.0));
        assert_relative_eq!(ray.point_at(2.5), Vec3::new(0.0, -2.5, 0.0));
    }

    #[test]
    fn test_degenerate_rays_are_rejected() {
        assert!(Ray::new(Vec3::zeros(), Vec3::zeros()).is_err());
        assert!(Ray::new(Vec3::new(f32::NAN, 0.0, 0.0), Vec3::x()).is_err());
    }
}
