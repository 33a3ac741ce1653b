//! Colliders: a collision object bound to a scene node
//!
//! A [`Collider`] couples one [`CollisionObject`] with a [`Material`], the
//! [`NodeId`] of the scene node it drives, and the handlers subscribed to its
//! collision events. It is inert until registered with an
//! [`Engine`](super::Engine).

use std::fmt;
use std::sync::Arc;

use super::collision_layers::{CollisionLayers, LayerFilter};
use super::collision_object::{BodyKind, CollisionObject};
use super::commands::DeferredCommands;
use super::engine::ColliderHandle;
use super::material::Material;
use crate::foundation::math::Vec3;
use crate::scene::NodeId;

/// One contact between the event's collider and another collider
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// The paired collider
    pub other: ColliderHandle,
    /// Category of the paired collider
    pub other_kind: BodyKind,
    /// World-space contact point
    pub point: Vec3,
    /// Unit normal pointing from this collider toward `other`
    pub normal: Vec3,
    /// Normal impulse the solver applied (zero for ghost overlaps)
    pub impulse: f32,
}

/// Every contact of one collider during one step
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionEvent {
    /// Collider receiving the event
    pub collider: ColliderHandle,
    /// Contacts with other colliders, at least one
    pub contacts: Vec<Contact>,
}

/// Subscriber to collision events
///
/// Handlers run synchronously inside `Engine::step`, after transforms have
/// been synchronized. Engine mutations go through `commands`.
pub trait CollisionHandler: Send + Sync {
    /// Handle one event
    fn on_collision(&self, event: &CollisionEvent, commands: &mut DeferredCommands);
}

impl<F> CollisionHandler for F
where
    F: Fn(&CollisionEvent, &mut DeferredCommands) + Send + Sync,
{
    fn on_collision(&self, event: &CollisionEvent, commands: &mut DeferredCommands) {
        self(event, commands);
    }
}

/// Physics object + material + scene node + subscribers
#[derive(Clone)]
pub struct Collider {
    object: CollisionObject,
    material: Material,
    node: NodeId,
    force_static: bool,
    layers: LayerFilter,
    handlers: Vec<Arc<dyn CollisionHandler>>,
}

impl Collider {
    /// Create an unregistered collider driving `node`
    pub fn new(object: CollisionObject, material: Material, node: NodeId) -> Self {
        Self {
            object,
            material,
            node,
            force_static: false,
            layers: LayerFilter::default(),
            handlers: Vec::new(),
        }
    }

    /// Never overwrite the node transform, even when the object is dynamic
    ///
    /// Static objects are never synchronized; `false` does not change that.
    pub fn with_static(mut self, is_static: bool) -> Self {
        self.force_static = is_static;
        self
    }

    /// Restrict which colliders this one interacts with
    pub fn with_layers(mut self, membership: CollisionLayers, filter: CollisionLayers) -> Self {
        self.layers = LayerFilter::new(membership, filter);
        self
    }

    /// Subscribe a handler; handlers run in subscription order
    pub fn on_collision(&mut self, handler: impl CollisionHandler + 'static) -> &mut Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    /// Builder-style [`Collider::on_collision`]
    pub fn with_handler(mut self, handler: impl CollisionHandler + 'static) -> Self {
        self.on_collision(handler);
        self
    }

    /// Collision object
    pub fn object(&self) -> &CollisionObject {
        &self.object
    }

    /// Surface material
    pub fn material(&self) -> &Material {
        &self.material
    }

    /// Driven scene node
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Layer membership and filter
    pub fn layers(&self) -> LayerFilter {
        self.layers
    }

    /// Whether synchronization skips this collider's node
    pub fn is_static(&self) -> bool {
        self.force_static || self.object.is_static()
    }

    /// Whether the object is a ghost
    pub fn is_ghost_object(&self) -> bool {
        self.object.is_ghost()
    }

    /// Category of the wrapped object
    pub fn kind(&self) -> BodyKind {
        self.object.kind()
    }

    /// Number of subscribed handlers
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Whether the collider is live in some engine
    pub fn is_registered(&self) -> bool {
        self.object.is_registered()
    }

    pub(crate) fn dispatch(&self, event: &CollisionEvent, commands: &mut DeferredCommands) {
        for handler in &self.handlers {
            handler.on_collision(event, commands);
        }
    }
}

impl fmt::Debug for Collider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collider")
            .field("object", &self.object)
            .field("material", &self.material)
            .field("node", &self.node)
            .field("force_static", &self.force_static)
            .field("layers", &self.layers)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
