//! Error taxonomy for the physics bridge
//!
//! Every variant is a programmer error detected synchronously at the call that
//! violates a contract. Nothing is retried internally.

use thiserror::Error;

use crate::physics::backend::BackendError;

/// Bridge-level errors
#[derive(Error, Debug)]
pub enum PhysicsError {
    /// Bad construction parameters, non-positive `dt`, unknown scene node
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Mesh-derived shape without usable triangles or volume
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// The collider is already registered with this engine
    #[error("Collider is already registered with this engine")]
    DuplicateRegistration,

    /// The collider handle does not name a live registration of this engine
    #[error("Collider is not registered with this engine")]
    NotRegistered,

    /// `init()` called on an engine that is already running
    #[error("Engine is already initialized")]
    AlreadyInitialized,

    /// Operation not valid for the object or engine state
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Non-recoverable fault reported by the physics backend
    #[error("Physics engine fault: {0}")]
    Engine(#[from] BackendError),
}

/// Result alias used throughout the crate
pub type Result<T, E = PhysicsError> = std::result::Result<T, E>;

impl PhysicsError {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub(crate) fn degenerate(message: impl Into<String>) -> Self {
        Self::DegenerateGeometry(message.into())
    }

    pub(crate) fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation(message.into())
    }
}
