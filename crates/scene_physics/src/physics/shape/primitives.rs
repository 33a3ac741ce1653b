//! Primitive collision shapes
//!
//! Each payload validates its parameters on construction and is immutable
//! afterwards. Round, capped shapes are aligned with the local Y axis.

use crate::error::{PhysicsError, Result};
use crate::foundation::math::{utils::is_finite_vec, Vec3};

/// Validate a strictly positive, finite dimension
pub(crate) fn positive(name: &str, value: f32) -> Result<f32> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(PhysicsError::invalid_argument(format!(
            "{name} must be a positive finite number, got {value}"
        )))
    }
}

/// Box given by its half extents
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cuboid {
    half_extents: Vec3,
}

impl Cuboid {
    pub(crate) fn new(half_extents: Vec3) -> Result<Self> {
        positive("half_extents.x", half_extents.x)?;
        positive("half_extents.y", half_extents.y)?;
        positive("half_extents.z", half_extents.z)?;
        Ok(Self { half_extents })
    }

    /// Half extents along X, Y and Z
    pub fn half_extents(&self) -> Vec3 {
        self.half_extents
    }
}

/// Sphere centered at the local origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    radius: f32,
}

impl Sphere {
    pub(crate) fn new(radius: f32) -> Result<Self> {
        Ok(Self { radius: positive("radius", radius)? })
    }

    /// Sphere radius
    pub fn radius(&self) -> f32 {
        self.radius
    }
}

/// Y-aligned cylinder
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cylinder {
    radius: f32,
    height: f32,
    segments: u32,
}

impl Cylinder {
    /// Fewest segments that still describe a closed prism
    pub const MIN_SEGMENTS: u32 = 3;

    pub(crate) fn new(radius: f32, height: f32, segments: u32) -> Result<Self> {
        if segments < Self::MIN_SEGMENTS {
            return Err(PhysicsError::invalid_argument(format!(
                "cylinder needs at least {} segments, got {segments}",
                Self::MIN_SEGMENTS
            )));
        }
        Ok(Self {
            radius: positive("radius", radius)?,
            height: positive("height", height)?,
            segments,
        })
    }

    /// Cylinder radius
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Full height along Y
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Tessellation hint kept for debug geometry; collision uses the exact cylinder
    pub fn segments(&self) -> u32 {
        self.segments
    }
}

/// Y-aligned capsule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capsule {
    radius: f32,
    height: f32,
}

impl Capsule {
    pub(crate) fn new(radius: f32, height: f32) -> Result<Self> {
        Ok(Self {
            radius: positive("radius", radius)?,
            height: positive("height", height)?,
        })
    }

    /// Hemisphere radius
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Distance between the two hemisphere centres
    pub fn height(&self) -> f32 {
        self.height
    }
}

/// Y-aligned cone, apex up, centred on half its height
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cone {
    radius: f32,
    height: f32,
}

impl Cone {
    pub(crate) fn new(radius: f32, height: f32) -> Result<Self> {
        Ok(Self {
            radius: positive("radius", radius)?,
            height: positive("height", height)?,
        })
    }

    /// Base radius
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Full height along Y
    pub fn height(&self) -> f32 {
        self.height
    }
}

/// Infinite plane `normal · x = constant`
///
/// Static-only: a body carrying a plane never moves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticPlane {
    normal: Vec3,
    constant: f32,
}

impl StaticPlane {
    pub(crate) fn new(normal: Vec3, constant: f32) -> Result<Self> {
        if !is_finite_vec(&normal) || !constant.is_finite() {
            return Err(PhysicsError::invalid_argument("plane normal and constant must be finite"));
        }
        let length = normal.magnitude();
        if length <= f32::EPSILON {
            return Err(PhysicsError::invalid_argument("plane normal must be non-zero"));
        }
        // Non-unit normals describe the same plane once both sides are divided by |n|.
        Ok(Self {
            normal: normal / length,
            constant: constant / length,
        })
    }

    /// Unit plane normal
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// Plane offset along the normal
    pub fn constant(&self) -> f32 {
        self.constant
    }
}

impl Default for StaticPlane {
    fn default() -> Self {
        Self {
            normal: Vec3::y(),
            constant: 0.0,
        }
    }
}
