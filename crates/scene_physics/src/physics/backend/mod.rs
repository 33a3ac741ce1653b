//! Physics backend contract
//!
//! The engine drives the solver only through [`PhysicsBackend`]; it never
//! looks at backend internals. [`RapierBackend`] is the default
//! implementation.

mod rapier;

use std::sync::Arc;

use thiserror::Error;

pub use rapier::RapierBackend;

use super::collision_layers::LayerFilter;
use super::collision_object::BodyKind;
use super::material::Material;
use super::query::Ray;
use super::shape::{Shape, ShapeKind};
use crate::foundation::math::{Isometry, Vec3};

/// Faults reported by a physics backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    /// The backend could not turn a validated shape into its own geometry
    #[error("Failed to build {kind:?} shape: {reason}")]
    ShapeBuild {
        /// Shape variant that failed
        kind: ShapeKind,
        /// Backend-specific reason
        reason: String,
    },

    /// The handle does not name a body of this backend world
    #[error("Unknown body handle {0:?}")]
    UnknownHandle(BackendHandle),

    /// Non-recoverable internal fault (corrupted state, solver divergence)
    #[error("Internal backend fault: {0}")]
    Internal(String),
}

/// Opaque body handle into a backend world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BackendHandle {
    index: u32,
    generation: u32,
}

impl BackendHandle {
    /// Build a handle from backend-specific raw parts
    pub fn from_raw_parts(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Raw `(index, generation)` pair
    pub fn into_raw_parts(self) -> (u32, u32) {
        (self.index, self.generation)
    }
}

/// Everything a backend needs to create one body
#[derive(Debug, Clone)]
pub struct BodyDesc {
    /// Collision geometry
    pub shape: Arc<Shape>,
    /// Initial world pose
    pub pose: Isometry,
    /// Simulation category
    pub kind: BodyKind,
    /// Mass (ignored unless dynamic)
    pub mass: f32,
    /// Linear velocity damping
    pub linear_damping: f32,
    /// Angular velocity damping
    pub angular_damping: f32,
    /// Surface coefficients
    pub material: Material,
    /// Layer membership and filter
    pub layers: LayerFilter,
}

/// One contact point or overlap between two bodies after a step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackendContact {
    /// First body
    pub body1: BackendHandle,
    /// Second body
    pub body2: BackendHandle,
    /// World-space contact point
    pub point: Vec3,
    /// Unit normal pointing from `body1` toward `body2` (zero when undefined)
    pub normal: Vec3,
    /// Normal impulse applied by the solver (zero for overlaps)
    pub impulse: f32,
}

/// Closest hit of a ray cast against a backend world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackendRayHit {
    /// Body that was hit
    pub body: BackendHandle,
    /// Distance along the ray
    pub distance: f32,
}

/// Rigid-body solver driven by the [`Engine`](super::Engine)
pub trait PhysicsBackend: Send {
    /// Human-readable backend name
    fn name(&self) -> &str;

    /// Create a body in the world
    fn add_body(&mut self, desc: &BodyDesc) -> Result<BackendHandle, BackendError>;

    /// Release a body and everything attached to it
    fn remove_body(&mut self, handle: BackendHandle) -> Result<(), BackendError>;

    /// Advance the world by one sub-step
    fn step_simulation(&mut self, sub_dt: f32) -> Result<(), BackendError>;

    /// Current world pose of a body
    fn world_transform(&self, handle: BackendHandle) -> Result<Isometry, BackendError>;

    /// Teleport a body
    fn set_world_transform(&mut self, handle: BackendHandle, pose: &Isometry) -> Result<(), BackendError>;

    /// Linear velocity of a body
    fn linear_velocity(&self, handle: BackendHandle) -> Result<Vec3, BackendError>;

    /// Angular velocity of a body
    fn angular_velocity(&self, handle: BackendHandle) -> Result<Vec3, BackendError>;

    /// Apply an impulse at a world-space point of a dynamic body
    fn apply_impulse(&mut self, handle: BackendHandle, impulse: Vec3, point: Vec3) -> Result<(), BackendError>;

    /// Contacts and overlaps produced by the last step
    fn contacts(&self) -> Vec<BackendContact>;

    /// Closest non-sensor hit along a ray
    fn cast_ray(&self, ray: &Ray, max_distance: f32) -> Option<BackendRayHit>;

    /// World gravity
    fn gravity(&self) -> Vec3;

    /// Change world gravity
    fn set_gravity(&mut self, gravity: Vec3);
}
