//! # Scene Physics
//!
//! Bridge between a rigid-body physics backend and a scene graph.
//!
//! ## Features
//!
//! - **Shapes**: primitives plus convex, BVH and hull shapes snapshotted from render meshes
//! - **Collision objects**: dynamic and static rigid bodies, ghost trigger volumes
//! - **Colliders**: bind an object to a scene node and dispatch collision events
//! - **Engine**: sub-stepped simulation with transform synchronization
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_physics::prelude::*;
//!
//! fn main() -> Result<(), PhysicsError> {
//!     let mut engine = Engine::new(PhysicsConfig::default());
//!     engine.init()?;
//!
//!     let mut nodes = NodeTable::new();
//!     let node = nodes.insert("ball", Transform::from_position(Vec3::new(0.0, 10.0, 0.0)));
//!     let ball = Collider::new(
//!         CollisionObject::rigid_body(Shape::sphere(1.0)?, 1.0)?,
//!         Material::default(),
//!         node,
//!     );
//!     engine.add_collider(ball, &nodes)?;
//!
//!     for _ in 0..60 {
//!         engine.step(1.0 / 60.0, &mut nodes)?;
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod error;
pub mod foundation;
pub mod physics;
pub mod scene;

pub use config::{CombineRule, PhysicsConfig};
pub use error::{PhysicsError, Result};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{CombineRule, Config, PhysicsConfig},
        error::PhysicsError,
        foundation::math::{Quat, Transform, Vec3},
        physics::{
            BodyKind, Collider, ColliderHandle, CollisionEvent, CollisionLayers, CollisionObject,
            CompoundChild, Contact, DeferredCommands, Engine, Material, Ray, Shape, StepStats,
        },
        scene::{GeometrySource, MeshGeometry, NodeId, NodeTable, SceneNodes},
    };
}
