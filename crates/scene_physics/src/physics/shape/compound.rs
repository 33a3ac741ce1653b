//! Compound shapes built from child shapes at fixed local offsets

use std::sync::Arc;

use super::Shape;
use crate::error::{PhysicsError, Result};
use crate::foundation::math::{Transform, Vec3};

/// Scale tolerance for child transforms; scale must be baked into the child shape
const UNIT_SCALE_TOLERANCE: f32 = 1.0e-4;

/// One child of a compound, placed in the compound's local frame
#[derive(Debug, Clone)]
pub struct CompoundChild {
    shape: Arc<Shape>,
    transform: Transform,
}

impl CompoundChild {
    /// Create a child; validation happens when the compound is built
    pub fn new(shape: impl Into<Arc<Shape>>, transform: Transform) -> Self {
        Self {
            shape: shape.into(),
            transform,
        }
    }

    /// Child shape
    pub fn shape(&self) -> &Arc<Shape> {
        &self.shape
    }

    /// Local placement inside the compound
    pub fn transform(&self) -> &Transform {
        &self.transform
    }
}

/// Rigid union of child shapes
#[derive(Debug, Clone)]
pub struct Compound {
    children: Vec<CompoundChild>,
}

impl Compound {
    pub(crate) fn new(children: Vec<CompoundChild>) -> Result<Self> {
        if children.is_empty() {
            return Err(PhysicsError::invalid_argument("compound needs at least one child"));
        }

        for (index, child) in children.iter().enumerate() {
            validate_child_transform(index, &child.transform)?;
            if matches!(*child.shape, Shape::StaticPlane(_) | Shape::BvhTriangleMesh(_)) {
                return Err(PhysicsError::invalid_argument(format!(
                    "compound child {index} is a {:?} shape, which cannot be nested",
                    child.shape.kind()
                )));
            }
        }

        Ok(Self { children })
    }

    /// Children in insertion order
    pub fn children(&self) -> &[CompoundChild] {
        &self.children
    }

    /// Model-space bounding sphere radius around the compound origin
    pub fn local_bounding_radius(&self) -> f32 {
        self.children
            .iter()
            .map(|child| child.transform.position.magnitude() + child.shape.bounding_radius())
            .fold(0.0, f32::max)
    }
}

fn validate_child_transform(index: usize, transform: &Transform) -> Result<()> {
    if !transform.is_finite() {
        return Err(PhysicsError::invalid_argument(format!(
            "compound child {index} has a non-finite transform"
        )));
    }
    if transform.rotation.quaternion().norm() <= f32::EPSILON {
        return Err(PhysicsError::invalid_argument(format!(
            "compound child {index} has a singular rotation"
        )));
    }
    let scale_error = (transform.scale - Vec3::new(1.0, 1.0, 1.0)).amax();
    if scale_error > UNIT_SCALE_TOLERANCE {
        return Err(PhysicsError::invalid_argument(format!(
            "compound child {index} has scale {:?}; bake scale into the child shape",
            transform.scale
        )));
    }
    Ok(())
}
