//! Physics bridge
//!
//! Shapes and collision objects describe what to simulate, colliders bind
//! them to scene nodes, and the [`Engine`] steps the backend world and keeps
//! the scene graph in sync with it.

pub mod backend;
pub mod collider;
pub mod collision_layers;
pub mod collision_object;
pub mod commands;
pub mod engine;
pub mod material;
pub mod query;
pub mod shape;

#[cfg(test)]
mod tests;

pub use backend::{BackendError, BackendHandle, PhysicsBackend, RapierBackend};
pub use collider::{Collider, CollisionEvent, CollisionHandler, Contact};
pub use collision_layers::{CollisionLayers, LayerFilter};
pub use collision_object::{BodyKind, CollisionObject, GhostObject, RigidBody};
pub use commands::{Command, DeferredCommands};
pub use engine::{ColliderHandle, Engine, EngineId, EngineState, StepStats};
pub use material::Material;
pub use query::{Ray, RayHit};
pub use shape::{CompoundChild, Shape, ShapeKind};
