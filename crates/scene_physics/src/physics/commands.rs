//! Engine mutations requested from inside collision handlers
//!
//! Handlers cannot touch the engine while it is dispatching. They queue
//! commands here instead; the engine applies the queue, in order, once the
//! whole dispatch phase of the same `step()` call has finished.

use super::engine::ColliderHandle;
use crate::foundation::math::{Transform, Vec3};

/// One deferred engine mutation
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// [`Engine::apply_impulse`](super::Engine::apply_impulse)
    ApplyImpulse {
        /// Target collider (must be dynamic)
        collider: ColliderHandle,
        /// World-space impulse
        impulse: Vec3,
        /// World-space application point
        point: Vec3,
    },
    /// [`Engine::set_world_transform`](super::Engine::set_world_transform)
    SetWorldTransform {
        /// Target collider
        collider: ColliderHandle,
        /// New world pose (scale ignored)
        transform: Transform,
    },
    /// [`Engine::remove_collider`](super::Engine::remove_collider)
    RemoveCollider(ColliderHandle),
}

/// Command queue handed to collision handlers
#[derive(Debug, Default)]
pub struct DeferredCommands {
    queue: Vec<Command>,
}

impl DeferredCommands {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an impulse on a dynamic collider
    pub fn apply_impulse(&mut self, collider: ColliderHandle, impulse: Vec3, point: Vec3) {
        self.queue.push(Command::ApplyImpulse { collider, impulse, point });
    }

    /// Queue a teleport
    pub fn set_world_transform(&mut self, collider: ColliderHandle, transform: Transform) {
        self.queue.push(Command::SetWorldTransform { collider, transform });
    }

    /// Queue an unregistration
    pub fn remove_collider(&mut self, collider: ColliderHandle) {
        self.queue.push(Command::RemoveCollider(collider));
    }

    /// Number of queued commands
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub(crate) fn take(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.queue)
    }
}
