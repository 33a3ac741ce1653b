//! Math types shared by the scene graph and the physics bridge
//!
//! All aliases resolve to nalgebra `f32` types, the same ones rapier3d uses,
//! so poses cross the backend boundary without conversion.

pub use nalgebra::{Matrix4, Quaternion, Unit, Vector3};

/// 3D vector
pub type Vec3 = Vector3<f32>;

/// 4x4 homogeneous matrix
pub type Mat4 = Matrix4<f32>;

/// 3D point
pub type Point3 = nalgebra::Point3<f32>;

/// Unit quaternion rotation
pub type Quat = Unit<Quaternion<f32>>;

/// Rigid pose (rotation and translation, no scale)
pub type Isometry = nalgebra::Isometry3<f32>;

/// Node transform: translation, rotation and per-axis scale
///
/// Physics only ever reads or writes the rigid part; scale belongs to the
/// scene side and survives synchronization untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Translation
    pub position: Vec3,
    /// Orientation
    pub rotation: Quat,
    /// Per-axis scale
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::from_position_rotation(Vec3::zeros(), Quat::identity())
    }
}

impl Transform {
    /// Identity pose with unit scale
    pub fn identity() -> Self {
        Self::default()
    }

    /// Translation only
    pub fn from_position(position: Vec3) -> Self {
        Self::from_position_rotation(position, Quat::identity())
    }

    /// Translation and rotation with unit scale
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            scale: Vec3::repeat(1.0),
        }
    }

    /// Replace the scale
    #[must_use]
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Express `child` (given relative to `self`) in the frame `self` lives in
    pub fn combine(&self, child: &Self) -> Self {
        Self {
            position: self.position + self.rotation * self.scale.component_mul(&child.position),
            rotation: self.rotation * child.rotation,
            scale: self.scale.component_mul(&child.scale),
        }
    }

    /// Inverse under [`Transform::combine`]
    ///
    /// Exact for uniform scale. With non-uniform scale and a rotation the true
    /// inverse has a shear that a TRS transform cannot hold.
    pub fn inverse(&self) -> Self {
        let scale = self.scale.map(f32::recip);
        let rotation = self.rotation.inverse();
        Self {
            position: (rotation * -self.position).component_mul(&scale),
            rotation,
            scale,
        }
    }

    /// True when no component is NaN or infinite
    pub fn is_finite(&self) -> bool {
        utils::is_finite_vec(&self.position)
            && self.rotation.coords.iter().all(|c| c.is_finite())
            && utils::is_finite_vec(&self.scale)
    }

    /// Rigid part of this transform, scale dropped
    pub fn to_isometry(&self) -> Isometry {
        Isometry::from_parts(self.position.into(), self.rotation)
    }

    /// Unit-scale transform from a rigid pose
    pub fn from_isometry(isometry: &Isometry) -> Self {
        Self::from_position_rotation(isometry.translation.vector, isometry.rotation)
    }

    /// Take position and rotation from `pose`, keep own scale
    #[must_use]
    pub fn with_pose(mut self, pose: &Self) -> Self {
        self.position = pose.position;
        self.rotation = pose.rotation;
        self
    }
}

/// Small numeric helpers
pub mod utils {
    use super::Vec3;

    /// True when every component of the vector is finite
    pub fn is_finite_vec(v: &Vec3) -> bool {
        v.iter().all(|c| c.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_inverse_round_trip_uniform_scale() {
        let rotation = Quat::from_axis_angle(&Vec3::y_axis(), 0.7);
        let parent = Transform::from_position_rotation(Vec3::new(1.0, 2.0, 3.0), rotation)
            .with_scale(Vec3::new(2.0, 2.0, 2.0));
        let child = Transform::from_position(Vec3::new(-4.0, 0.5, 1.0));

        let world = parent.combine(&child);
        let local = parent.inverse().combine(&world);

        assert_relative_eq!(local.position, child.position, epsilon = 1e-5);
        assert_relative_eq!(local.scale, child.scale, epsilon = 1e-5);
        assert!(local.rotation.angle_to(&child.rotation) < 1e-5);
    }

    #[test]
    fn test_isometry_conversion_drops_scale() {
        let t = Transform::from_position(Vec3::new(1.0, -1.0, 0.0)).with_scale(Vec3::new(3.0, 3.0, 3.0));
        let back = Transform::from_isometry(&t.to_isometry());

        assert_eq!(back.position, t.position);
        assert_eq!(back.scale, Vec3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_with_pose_keeps_scale() {
        let node = Transform::identity().with_scale(Vec3::new(100.0, 100.0, 1.0));
        let pose = Transform::from_position(Vec3::new(0.0, 5.0, 0.0));
        let synced = node.with_pose(&pose);

        assert_eq!(synced.position, pose.position);
        assert_eq!(synced.scale, node.scale);
    }

    #[test]
    fn test_is_finite() {
        let mut t = Transform::identity();
        assert!(t.is_finite());
        t.position.x = f32::NAN;
        assert!(!t.is_finite());
    }
}
