//! Rigid bodies and ghost objects
//!
//! A [`CollisionObject`] is created detached. It becomes live when the
//! [`Collider`](super::Collider) wrapping it is registered with an
//! [`Engine`](super::Engine), which records the backend binding here.
//!
//! Clones share one registration slot, so every copy of an object sees the
//! same registration no matter when the copy was made.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::backend::BackendHandle;
use super::engine::EngineId;
use super::shape::Shape;
use crate::error::{PhysicsError, Result};

/// Simulation category of a collision object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyKind {
    /// Moved by gravity and collision response
    Dynamic,
    /// Immovable, infinite effective mass
    Static,
    /// Overlap sensor without collision response
    Ghost,
}

/// Where a registered object lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Binding {
    pub engine: EngineId,
    pub handle: BackendHandle,
}

/// Registration state shared by all clones of one object
#[derive(Debug, Clone, Default)]
pub(crate) struct RegistrationSlot(Arc<Mutex<Option<Binding>>>);

impl RegistrationSlot {
    fn lock(&self) -> MutexGuard<'_, Option<Binding>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn get(&self) -> Option<Binding> {
        *self.lock()
    }

    fn set(&self, binding: Option<Binding>) {
        *self.lock() = binding;
    }
}

/// Solid body taking part in collision response
#[derive(Debug, Clone)]
pub struct RigidBody {
    shape: Arc<Shape>,
    mass: f32,
    linear_damping: f32,
    angular_damping: f32,
    slot: RegistrationSlot,
}

impl RigidBody {
    /// Collision shape
    pub fn shape(&self) -> &Arc<Shape> {
        &self.shape
    }

    /// Mass in kilograms; zero for static bodies
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Linear velocity damping
    pub fn linear_damping(&self) -> f32 {
        self.linear_damping
    }

    /// Angular velocity damping
    pub fn angular_damping(&self) -> f32 {
        self.angular_damping
    }

    /// Whether the body is immovable
    pub fn is_static(&self) -> bool {
        self.mass == 0.0 || self.shape.is_static_only()
    }
}

/// Sensor volume reporting overlaps only
#[derive(Debug, Clone)]
pub struct GhostObject {
    shape: Arc<Shape>,
    slot: RegistrationSlot,
}

impl GhostObject {
    /// Sensor shape
    pub fn shape(&self) -> &Arc<Shape> {
        &self.shape
    }
}

/// Physics-side half of a collider
#[derive(Debug, Clone)]
pub enum CollisionObject {
    /// Dynamic or static rigid body
    RigidBody(RigidBody),
    /// Trigger volume
    Ghost(GhostObject),
}

impl CollisionObject {
    /// Rigid body; `mass == 0` makes it static
    ///
    /// A positive mass on a static-only shape (BVH mesh, plane) is accepted
    /// but the body is still static.
    ///
    /// # Errors
    /// `InvalidArgument` for a negative or non-finite mass.
    pub fn rigid_body(shape: impl Into<Arc<Shape>>, mass: f32) -> Result<Self> {
        if !(mass.is_finite() && mass >= 0.0) {
            return Err(PhysicsError::invalid_argument(format!(
                "mass must be finite and non-negative, got {mass}"
            )));
        }
        let shape = shape.into();
        if mass > 0.0 && shape.is_static_only() {
            log::warn!(
                "{:?} shapes are static-only; ignoring mass {mass} and creating a static body",
                shape.kind()
            );
        }
        Ok(Self::RigidBody(RigidBody {
            shape,
            mass,
            linear_damping: 0.0,
            angular_damping: 0.0,
            slot: RegistrationSlot::default(),
        }))
    }

    /// Ghost object around `shape`
    pub fn ghost(shape: impl Into<Arc<Shape>>) -> Self {
        Self::Ghost(GhostObject {
            shape: shape.into(),
            slot: RegistrationSlot::default(),
        })
    }

    /// Set linear damping (ignored with a warning on static bodies and ghosts)
    pub fn with_linear_damping(mut self, damping: f32) -> Result<Self> {
        let damping = validate_damping("linear_damping", damping)?;
        if let Some(body) = self.damped_body("linear", damping) {
            body.linear_damping = damping;
        }
        Ok(self)
    }

    /// Set angular damping (ignored with a warning on static bodies and ghosts)
    pub fn with_angular_damping(mut self, damping: f32) -> Result<Self> {
        let damping = validate_damping("angular_damping", damping)?;
        if let Some(body) = self.damped_body("angular", damping) {
            body.angular_damping = damping;
        }
        Ok(self)
    }

    fn damped_body(&mut self, which: &str, damping: f32) -> Option<&mut RigidBody> {
        match self {
            Self::RigidBody(body) if !body.is_static() => Some(body),
            Self::RigidBody(_) => {
                if damping != 0.0 {
                    log::warn!("{which} damping {damping} has no effect on a static body");
                }
                None
            }
            Self::Ghost(_) => {
                log::debug!("ghost objects ignore {which} damping");
                None
            }
        }
    }

    /// Simulation category
    pub fn kind(&self) -> BodyKind {
        match self {
            Self::RigidBody(body) if body.is_static() => BodyKind::Static,
            Self::RigidBody(_) => BodyKind::Dynamic,
            Self::Ghost(_) => BodyKind::Ghost,
        }
    }

    /// Dynamic rigid body
    pub fn is_dynamic(&self) -> bool {
        self.kind() == BodyKind::Dynamic
    }

    /// Static rigid body
    pub fn is_static(&self) -> bool {
        self.kind() == BodyKind::Static
    }

    /// Ghost object
    pub fn is_ghost(&self) -> bool {
        matches!(self, Self::Ghost(_))
    }

    /// Mass; always zero for ghosts and static bodies
    pub fn mass(&self) -> f32 {
        match self {
            Self::RigidBody(body) if !body.is_static() => body.mass,
            _ => 0.0,
        }
    }

    /// `(linear, angular)` damping; zero for ghosts
    pub fn damping(&self) -> (f32, f32) {
        match self {
            Self::RigidBody(body) => (body.linear_damping, body.angular_damping),
            Self::Ghost(_) => (0.0, 0.0),
        }
    }

    /// Collision shape
    pub fn shape(&self) -> &Arc<Shape> {
        match self {
            Self::RigidBody(body) => &body.shape,
            Self::Ghost(ghost) => &ghost.shape,
        }
    }

    /// Whether this object, or any clone of it, is live in some engine
    pub fn is_registered(&self) -> bool {
        self.binding().is_some()
    }

    fn slot(&self) -> &RegistrationSlot {
        match self {
            Self::RigidBody(body) => &body.slot,
            Self::Ghost(ghost) => &ghost.slot,
        }
    }

    pub(crate) fn binding(&self) -> Option<Binding> {
        self.slot().get()
    }

    pub(crate) fn set_binding(&self, binding: Option<Binding>) {
        self.slot().set(binding);
    }
}

fn validate_damping(name: &str, damping: f32) -> Result<f32> {
    if damping.is_finite() && damping >= 0.0 {
        Ok(damping)
    } else {
        Err(PhysicsError::invalid_argument(format!(
            "{name} must be finite and non-negative, got {damping}"
        )))
    }
}
