//! The physics engine: world ownership, collider registry and the step loop
//!
//! `step(dt)` runs three phases in a fixed order:
//! 1. advance the backend by one or more sub-steps,
//! 2. copy every non-static body pose into its scene node,
//! 3. dispatch collision events to subscribed colliders.
//!
//! Handlers therefore always observe synchronized transforms. Engine
//! mutations they request are applied after phase 3 (see
//! [`DeferredCommands`]).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use super::backend::{BackendHandle, BodyDesc, PhysicsBackend, RapierBackend};
use super::collider::{Collider, CollisionEvent, CollisionHandler, Contact};
use super::collision_object::{Binding, BodyKind};
use super::commands::{Command, DeferredCommands};
use super::query::{Ray, RayHit};
use crate::config::PhysicsConfig;
use crate::error::{PhysicsError, Result};
use crate::foundation::collections::{ColliderKey, SecondaryMap, SlotMap};
use crate::foundation::math::{utils::is_finite_vec, Transform, Vec3};
use crate::scene::SceneNodes;

static NEXT_ENGINE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one engine instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EngineId(u64);

impl EngineId {
    pub(crate) fn next() -> Self {
        Self(NEXT_ENGINE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Handle of a registered collider
///
/// Only valid for the engine that issued it; stale after removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColliderHandle {
    engine: EngineId,
    key: ColliderKey,
}

impl ColliderHandle {
    /// Engine that issued this handle
    pub fn engine(&self) -> EngineId {
        self.engine
    }
}

/// Engine lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Created, no backend world yet
    Uninitialized,
    /// Backend world live; colliders can be registered and stepped
    Initialized,
    /// Backend world released; the engine is unusable
    Destroyed,
}

/// Summary of one `step()` call
#[derive(Debug, Default)]
pub struct StepStats {
    /// Sub-steps the backend was advanced by
    pub sub_steps: u32,
    /// Simulated seconds (less than `dt` when the frame was clamped)
    pub simulated_time: f32,
    /// Contact points and overlaps between registered colliders whose layers interact
    pub contact_count: usize,
    /// Deferred commands that failed, in queue order
    pub command_errors: Vec<PhysicsError>,
}

type BackendFactory = Box<dyn FnOnce(&PhysicsConfig) -> Box<dyn PhysicsBackend> + Send>;

struct Registration {
    collider: Collider,
    body: BackendHandle,
}

/// Physics world, collider registry and stepping loop
///
/// Instances are fully independent; nothing is shared between engines.
pub struct Engine {
    id: EngineId,
    config: PhysicsConfig,
    state: EngineState,
    factory: Option<BackendFactory>,
    backend: Option<Box<dyn PhysicsBackend>>,
    registry: SlotMap<ColliderKey, Registration>,
    order: Vec<ColliderKey>,
    by_body: HashMap<BackendHandle, ColliderKey>,
}

impl Engine {
    /// Create an uninitialized engine backed by rapier3d
    pub fn new(config: PhysicsConfig) -> Self {
        Self::with_backend(config, |config: &PhysicsConfig| {
            Box::new(RapierBackend::new(config)) as Box<dyn PhysicsBackend>
        })
    }

    /// Create an uninitialized engine whose world `factory` builds at `init()`
    pub fn with_backend<F>(config: PhysicsConfig, factory: F) -> Self
    where
        F: FnOnce(&PhysicsConfig) -> Box<dyn PhysicsBackend> + Send + 'static,
    {
        Self {
            id: EngineId::next(),
            config,
            state: EngineState::Uninitialized,
            factory: Some(Box::new(factory)),
            backend: None,
            registry: SlotMap::with_key(),
            order: Vec::new(),
            by_body: HashMap::new(),
        }
    }

    /// Create the backend world
    ///
    /// # Errors
    /// - `AlreadyInitialized` when called twice
    /// - `InvalidOperation` after `destroy()`
    /// - `InvalidArgument` for an invalid configuration
    pub fn init(&mut self) -> Result<()> {
        match self.state {
            EngineState::Initialized => return Err(PhysicsError::AlreadyInitialized),
            EngineState::Destroyed => {
                return Err(PhysicsError::invalid_operation("engine has been destroyed"))
            }
            EngineState::Uninitialized => {}
        }
        self.config.validate()?;

        let factory = self
            .factory
            .take()
            .ok_or_else(|| PhysicsError::invalid_operation("backend factory already consumed"))?;
        let backend = factory(&self.config);
        log::info!(
            "Physics engine {:?} initialized ({} backend, gravity {:?}, sub-step {}s x{})",
            self.id,
            backend.name(),
            self.config.gravity,
            self.config.max_sub_step,
            self.config.max_sub_steps_per_frame
        );
        self.backend = Some(backend);
        self.state = EngineState::Initialized;
        Ok(())
    }

    /// Release every registered body and the backend world
    ///
    /// # Errors
    /// `InvalidOperation` when already destroyed.
    pub fn destroy(&mut self) -> Result<()> {
        if self.state == EngineState::Destroyed {
            return Err(PhysicsError::invalid_operation("engine has already been destroyed"));
        }
        self.release_all();
        self.factory = None;
        self.state = EngineState::Destroyed;
        log::info!("Physics engine {:?} destroyed", self.id);
        Ok(())
    }

    fn release_all(&mut self) {
        if let Some(backend) = self.backend.as_mut() {
            for key in self.order.drain(..) {
                if let Some(registration) = self.registry.get(key) {
                    if let Err(err) = backend.remove_body(registration.body) {
                        log::warn!("Failed to release body {:?}: {err}", registration.body);
                    }
                    registration.collider.object().set_binding(None);
                }
            }
        }
        self.order.clear();
        self.registry.clear();
        self.by_body.clear();
        self.backend = None;
    }

    /// Lifecycle state
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Identity of this engine
    pub fn id(&self) -> EngineId {
        self.id
    }

    /// Configuration the world was (or will be) created with
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Backend name, once initialized
    pub fn backend_name(&self) -> Option<&str> {
        self.backend.as_deref().map(|backend| backend.name())
    }

    fn backend_mut(&mut self) -> Result<&mut Box<dyn PhysicsBackend>> {
        match (self.state, self.backend.as_mut()) {
            (EngineState::Initialized, Some(backend)) => Ok(backend),
            (EngineState::Uninitialized, _) => Err(PhysicsError::invalid_operation("engine is not initialized")),
            _ => Err(PhysicsError::invalid_operation("engine has been destroyed")),
        }
    }

    fn key_of(&self, handle: ColliderHandle) -> Option<ColliderKey> {
        (handle.engine == self.id && self.registry.contains_key(handle.key)).then_some(handle.key)
    }

    fn handle_of(&self, key: ColliderKey) -> ColliderHandle {
        ColliderHandle { engine: self.id, key }
    }

    /// Register a collider; its body starts at the node's world pose
    ///
    /// # Errors
    /// - `DuplicateRegistration` when the collider is already live here
    /// - `InvalidArgument` when it is live in another engine or its node is missing
    /// - `InvalidOperation` when the engine is not initialized
    pub fn add_collider(&mut self, collider: Collider, nodes: &dyn SceneNodes) -> Result<ColliderHandle> {
        self.backend_mut()?;

        if let Some(binding) = collider.object().binding() {
            if binding.engine != self.id {
                return Err(PhysicsError::invalid_argument(
                    "collision object already belongs to another engine",
                ));
            }
            if self.by_body.contains_key(&binding.handle) {
                return Err(PhysicsError::DuplicateRegistration);
            }
            // Binding to a body this engine no longer has
            collider.object().set_binding(None);
        }

        let node = collider.node();
        let pose = nodes
            .world_transform(node)
            .ok_or_else(|| PhysicsError::invalid_argument(format!("scene node {node:?} does not exist")))?;
        if !pose.is_finite() {
            return Err(PhysicsError::invalid_argument(format!(
                "scene node {node:?} has a non-finite transform"
            )));
        }

        let object = collider.object();
        let (linear_damping, angular_damping) = object.damping();
        let desc = BodyDesc {
            shape: object.shape().clone(),
            pose: pose.to_isometry(),
            kind: object.kind(),
            mass: object.mass(),
            linear_damping,
            angular_damping,
            material: *collider.material(),
            layers: collider.layers(),
        };

        let body = self.backend_mut()?.add_body(&desc)?;
        collider.object().set_binding(Some(Binding { engine: self.id, handle: body }));

        let kind = desc.kind;
        let shape_kind = desc.shape.kind();
        let key = self.registry.insert(Registration { collider, body });
        self.order.push(key);
        self.by_body.insert(body, key);

        log::debug!(
            "Registered {kind:?} {shape_kind:?} collider {key:?} on node {node:?} ({} live)",
            self.registry.len()
        );
        Ok(self.handle_of(key))
    }

    /// Unregister a collider and release its backend body
    ///
    /// The returned collider is detached and can be registered again.
    ///
    /// # Errors
    /// `NotRegistered` for unknown or stale handles.
    pub fn remove_collider(&mut self, handle: ColliderHandle) -> Result<Collider> {
        let key = self.key_of(handle).ok_or(PhysicsError::NotRegistered)?;
        let body = self.registry[key].body;
        self.backend_mut()?.remove_body(body)?;

        let Registration { collider, .. } = self
            .registry
            .remove(key)
            .ok_or(PhysicsError::NotRegistered)?;
        self.order.retain(|k| *k != key);
        self.by_body.remove(&body);
        collider.object().set_binding(None);

        log::debug!("Removed collider {key:?} ({} live)", self.registry.len());
        Ok(collider)
    }

    /// Advance the simulation by `dt` seconds
    ///
    /// Sub-steps the backend, synchronizes non-static scene nodes, dispatches
    /// collision events, then applies commands queued by the handlers.
    ///
    /// # Errors
    /// - `InvalidArgument` for `dt <= 0` or non-finite `dt` (nothing moves)
    /// - `InvalidOperation` when the engine is not initialized
    /// - `Engine` when the backend faults; no node is written and no event
    ///   is dispatched in that case. Sub-steps completed before the fault stay
    ///   applied, so body queries see the partially advanced world. The
    ///   rapier backend puts a diverged body back at its last finite pose.
    pub fn step(&mut self, dt: f32, nodes: &mut dyn SceneNodes) -> Result<StepStats> {
        self.backend_mut()?;
        if !(dt.is_finite() && dt > 0.0) {
            return Err(PhysicsError::invalid_argument(format!(
                "dt must be a positive number of seconds, got {dt}"
            )));
        }

        let (sub_steps, sub_dt, clamped) = self.config.sub_steps(dt);
        if clamped {
            log::warn!(
                "Frame time {dt}s exceeds {sub_steps} sub-steps of {sub_dt}s; dropping {}s",
                dt - sub_steps as f32 * sub_dt
            );
        }

        {
            let backend = self.backend_mut()?;
            for _ in 0..sub_steps {
                backend.step_simulation(sub_dt)?;
            }
        }

        let poses = self.collect_poses()?;
        self.synchronize(&poses, nodes);

        let (contact_count, commands) = self.dispatch();
        log::trace!("Step {dt}s: {sub_steps} sub-steps, {contact_count} contacts");

        let command_errors = self.apply_commands(commands, nodes);
        Ok(StepStats {
            sub_steps,
            simulated_time: sub_steps as f32 * sub_dt,
            contact_count,
            command_errors,
        })
    }

    fn collect_poses(&self) -> Result<Vec<(ColliderKey, Transform)>> {
        let Some(backend) = self.backend.as_deref() else {
            return Ok(Vec::new());
        };
        self.order
            .iter()
            .filter(|key| !self.registry[**key].collider.is_static())
            .map(|key| {
                let pose = backend.world_transform(self.registry[*key].body)?;
                Ok((*key, Transform::from_isometry(&pose)))
            })
            .collect()
    }

    fn synchronize(&self, poses: &[(ColliderKey, Transform)], nodes: &mut dyn SceneNodes) {
        for (key, pose) in poses {
            let node = self.registry[*key].collider.node();
            let written = nodes
                .world_transform(node)
                .is_some_and(|current| nodes.set_world_transform(node, current.with_pose(pose)));
            if !written {
                log::warn!("Scene node {node:?} of collider {key:?} is gone; skipping synchronization");
            }
        }
    }

    fn dispatch(&self) -> (usize, DeferredCommands) {
        let mut commands = DeferredCommands::new();
        let Some(backend) = self.backend.as_deref() else {
            return (0, commands);
        };

        let raw = backend.contacts();
        let mut kept = 0;
        let mut grouped: SecondaryMap<ColliderKey, Vec<Contact>> = SecondaryMap::new();
        for contact in &raw {
            let (Some(&a), Some(&b)) = (self.by_body.get(&contact.body1), self.by_body.get(&contact.body2)) else {
                continue;
            };
            if !self.registry[a].collider.layers().interacts_with(&self.registry[b].collider.layers()) {
                continue;
            }
            kept += 1;
            let sides = [(a, b, contact.normal), (b, a, -contact.normal)];
            for (this, other, normal) in sides {
                let entry = grouped.entry(this).map(|entry| entry.or_default());
                if let Some(list) = entry {
                    list.push(Contact {
                        other: self.handle_of(other),
                        other_kind: self.registry[other].collider.kind(),
                        point: contact.point,
                        normal,
                        impulse: contact.impulse,
                    });
                }
            }
        }

        for key in &self.order {
            let collider = &self.registry[*key].collider;
            if collider.handler_count() == 0 {
                continue;
            }
            let Some(contacts) = grouped.remove(*key) else {
                continue;
            };
            let event = CollisionEvent {
                collider: self.handle_of(*key),
                contacts,
            };
            collider.dispatch(&event, &mut commands);
        }

        (kept, commands)
    }

    fn apply_commands(&mut self, mut commands: DeferredCommands, nodes: &mut dyn SceneNodes) -> Vec<PhysicsError> {
        let mut errors = Vec::new();
        for command in commands.take() {
            let result = match &command {
                Command::ApplyImpulse { collider, impulse, point } => self.apply_impulse(*collider, *impulse, *point),
                Command::SetWorldTransform { collider, transform } => {
                    self.set_world_transform(*collider, transform, nodes)
                }
                Command::RemoveCollider(collider) => self.remove_collider(*collider).map(|_| ()),
            };
            if let Err(err) = result {
                log::warn!("Deferred {command:?} failed: {err}");
                errors.push(err);
            }
        }
        errors
    }

    /// Apply an impulse at a world-space point of a dynamic collider
    ///
    /// # Errors
    /// - `InvalidOperation` for static bodies, ghosts and unregistered colliders
    /// - `InvalidArgument` for non-finite vectors
    pub fn apply_impulse(&mut self, handle: ColliderHandle, impulse: Vec3, point: Vec3) -> Result<()> {
        let key = self
            .key_of(handle)
            .ok_or_else(|| PhysicsError::invalid_operation("impulse on a collider that is not registered"))?;
        let registration = &self.registry[key];
        let kind = registration.collider.kind();
        if kind != BodyKind::Dynamic {
            return Err(PhysicsError::invalid_operation(format!(
                "impulses only apply to dynamic bodies, not {kind:?}"
            )));
        }
        if !is_finite_vec(&impulse) || !is_finite_vec(&point) {
            return Err(PhysicsError::invalid_argument("impulse and point must be finite"));
        }
        let body = registration.body;
        self.backend_mut()?.apply_impulse(body, impulse, point)?;
        Ok(())
    }

    /// Teleport a collider's body and write the pose into its node
    ///
    /// The node keeps its scale; the transform's scale is ignored.
    ///
    /// # Errors
    /// `NotRegistered` for unknown handles, `InvalidArgument` for a
    /// non-finite transform.
    pub fn set_world_transform(
        &mut self,
        handle: ColliderHandle,
        transform: &Transform,
        nodes: &mut dyn SceneNodes,
    ) -> Result<()> {
        let key = self.key_of(handle).ok_or(PhysicsError::NotRegistered)?;
        if !transform.is_finite() {
            return Err(PhysicsError::invalid_argument("transform must be finite"));
        }
        let body = self.registry[key].body;
        self.backend_mut()?.set_world_transform(body, &transform.to_isometry())?;

        let node = self.registry[key].collider.node();
        if let Some(current) = nodes.world_transform(node) {
            nodes.set_world_transform(node, current.with_pose(transform));
        }
        Ok(())
    }

    /// Current physics pose of a collider (unit scale)
    pub fn world_transform(&self, handle: ColliderHandle) -> Result<Transform> {
        let (backend, body) = self.backend_and_body(handle)?;
        Ok(Transform::from_isometry(&backend.world_transform(body)?))
    }

    /// Linear velocity of a collider's body
    pub fn linear_velocity(&self, handle: ColliderHandle) -> Result<Vec3> {
        let (backend, body) = self.backend_and_body(handle)?;
        Ok(backend.linear_velocity(body)?)
    }

    /// Angular velocity of a collider's body
    pub fn angular_velocity(&self, handle: ColliderHandle) -> Result<Vec3> {
        let (backend, body) = self.backend_and_body(handle)?;
        Ok(backend.angular_velocity(body)?)
    }

    fn backend_and_body(&self, handle: ColliderHandle) -> Result<(&dyn PhysicsBackend, BackendHandle)> {
        let key = self.key_of(handle).ok_or(PhysicsError::NotRegistered)?;
        let backend = self
            .backend
            .as_deref()
            .ok_or_else(|| PhysicsError::invalid_operation("engine is not initialized"))?;
        Ok((backend, self.registry[key].body))
    }

    /// Closest non-ghost collider along a ray, as of the last completed step
    pub fn cast_ray(&self, ray: &Ray, max_distance: f32) -> Option<RayHit> {
        let hit = self.backend.as_deref()?.cast_ray(ray, max_distance)?;
        let key = *self.by_body.get(&hit.body)?;
        Some(RayHit {
            collider: self.handle_of(key),
            distance: hit.distance,
            point: ray.point_at(hit.distance),
        })
    }

    /// World gravity
    pub fn gravity(&self) -> Vec3 {
        self.backend
            .as_deref()
            .map_or(self.config.gravity, |backend| backend.gravity())
    }

    /// Change world gravity
    ///
    /// # Errors
    /// `InvalidArgument` for a non-finite vector.
    pub fn set_gravity(&mut self, gravity: Vec3) -> Result<()> {
        if !is_finite_vec(&gravity) {
            return Err(PhysicsError::invalid_argument(format!("gravity must be finite, got {gravity:?}")));
        }
        self.config.gravity = gravity;
        if let Some(backend) = self.backend.as_mut() {
            backend.set_gravity(gravity);
        }
        Ok(())
    }

    /// Subscribe a handler to a registered collider
    ///
    /// # Errors
    /// `NotRegistered` for unknown handles.
    pub fn subscribe(&mut self, handle: ColliderHandle, handler: impl CollisionHandler + 'static) -> Result<()> {
        let key = self.key_of(handle).ok_or(PhysicsError::NotRegistered)?;
        self.registry[key].collider.on_collision(handler);
        Ok(())
    }

    /// Registered collider
    pub fn collider(&self, handle: ColliderHandle) -> Option<&Collider> {
        self.key_of(handle).map(|key| &self.registry[key].collider)
    }

    /// Registered colliders in registration order
    pub fn colliders(&self) -> impl Iterator<Item = (ColliderHandle, &Collider)> + '_ {
        self.order
            .iter()
            .map(move |key| (self.handle_of(*key), &self.registry[*key].collider))
    }

    /// Whether `handle` names a live registration of this engine
    pub fn contains(&self, handle: ColliderHandle) -> bool {
        self.key_of(handle).is_some()
    }

    /// Number of registered colliders
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Whether no collider is registered
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if self.state == EngineState::Initialized {
            self.release_all();
            log::debug!("Physics engine {:?} dropped", self.id);
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("backend", &self.backend_name())
            .field("colliders", &self.registry.len())
            .finish_non_exhaustive()
    }
}
