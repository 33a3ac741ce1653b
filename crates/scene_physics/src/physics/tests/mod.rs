//! Scenario tests for the engine, against rapier3d and a scripted backend

mod simulation;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::foundation::math::{Isometry, Transform, Vec3};
use crate::physics::backend::{
    BackendContact, BackendError, BackendHandle, BackendRayHit, BodyDesc, PhysicsBackend,
};
use crate::physics::query::Ray;
use crate::physics::{BodyKind, Collider, CollisionObject, Engine, Material, Shape};
use crate::scene::{NodeId, NodeTable};
use crate::config::PhysicsConfig;

/// State shared between a test and the [`ScriptedBackend`] owned by its engine
#[derive(Debug, Default)]
pub(super) struct Script {
    pub bodies: HashMap<BackendHandle, (Isometry, BodyKind)>,
    pub contacts: Vec<BackendContact>,
    pub fail_next_step: bool,
    pub steps: Vec<f32>,
    pub impulses: Vec<(BackendHandle, Vec3)>,
    next_index: u32,
}

/// Backend that moves nothing on its own and reports scripted contacts
pub(super) struct ScriptedBackend {
    script: Arc<Mutex<Script>>,
    gravity: Vec3,
}

impl ScriptedBackend {
    fn with_script<T>(&self, f: impl FnOnce(&mut Script) -> T) -> T {
        let mut script = self.script.lock().unwrap();
        f(&mut script)
    }
}

impl PhysicsBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    fn add_body(&mut self, desc: &BodyDesc) -> Result<BackendHandle, BackendError> {
        Ok(self.with_script(|script| {
            let handle = BackendHandle::from_raw_parts(script.next_index, 0);
            script.next_index += 1;
            script.bodies.insert(handle, (desc.pose, desc.kind));
            handle
        }))
    }

    fn remove_body(&mut self, handle: BackendHandle) -> Result<(), BackendError> {
        self.with_script(|script| script.bodies.remove(&handle))
            .map(|_| ())
            .ok_or(BackendError::UnknownHandle(handle))
    }

    fn step_simulation(&mut self, sub_dt: f32) -> Result<(), BackendError> {
        self.with_script(|script| {
            if std::mem::take(&mut script.fail_next_step) {
                return Err(BackendError::Internal("scripted solver fault".into()));
            }
            script.steps.push(sub_dt);
            for (pose, kind) in script.bodies.values_mut() {
                if *kind == BodyKind::Dynamic {
                    pose.translation.vector.y -= 1.0;
                }
            }
            Ok(())
        })
    }

    fn world_transform(&self, handle: BackendHandle) -> Result<Isometry, BackendError> {
        self.with_script(|script| script.bodies.get(&handle).map(|(pose, _)| *pose))
            .ok_or(BackendError::UnknownHandle(handle))
    }

    fn set_world_transform(&mut self, handle: BackendHandle, pose: &Isometry) -> Result<(), BackendError> {
        self.with_script(|script| {
            let (current, _) = script.bodies.get_mut(&handle).ok_or(BackendError::UnknownHandle(handle))?;
            *current = *pose;
            Ok(())
        })
    }

    fn linear_velocity(&self, _handle: BackendHandle) -> Result<Vec3, BackendError> {
        Ok(Vec3::zeros())
    }

    fn angular_velocity(&self, _handle: BackendHandle) -> Result<Vec3, BackendError> {
        Ok(Vec3::zeros())
    }

    fn apply_impulse(&mut self, handle: BackendHandle, impulse: Vec3, _point: Vec3) -> Result<(), BackendError> {
        self.with_script(|script| script.impulses.push((handle, impulse)));
        Ok(())
    }

    fn contacts(&self) -> Vec<BackendContact> {
        self.with_script(|script| script.contacts.clone())
    }

    fn cast_ray(&self, _ray: &Ray, _max_distance: f32) -> Option<BackendRayHit> {
        None
    }

    fn gravity(&self) -> Vec3 {
        self.gravity
    }

    fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = gravity;
    }
}

/// Initialized engine on a [`ScriptedBackend`], plus the script controlling it
pub(super) fn scripted_engine() -> (Engine, Arc<Mutex<Script>>) {
    let script = Arc::new(Mutex::new(Script::default()));
    let shared = script.clone();
    let mut engine = Engine::with_backend(PhysicsConfig::default(), move |config: &PhysicsConfig| {
        Box::new(ScriptedBackend {
            script: shared,
            gravity: config.gravity,
        }) as Box<dyn PhysicsBackend>
    });
    engine.init().unwrap();
    (engine, script)
}

/// Initialized engine on rapier3d with default configuration
pub(super) fn rapier_engine() -> Engine {
    let mut engine = Engine::new(PhysicsConfig::default());
    engine.init().unwrap();
    engine
}

pub(super) fn node_at(nodes: &mut NodeTable, name: &str, position: Vec3) -> NodeId {
    nodes.insert(name, Transform::from_position(position))
}

pub(super) fn sphere_collider(nodes: &mut NodeTable, position: Vec3, radius: f32, mass: f32) -> Collider {
    let node = node_at(nodes, "sphere", position);
    Collider::new(
        CollisionObject::rigid_body(Shape::sphere(radius).unwrap(), mass).unwrap(),
        Material::default(),
        node,
    )
}

pub(super) fn ghost_collider(nodes: &mut NodeTable, position: Vec3, radius: f32) -> Collider {
    let node = node_at(nodes, "ghost", position);
    Collider::new(
        CollisionObject::ghost(Shape::sphere(radius).unwrap()),
        Material::default(),
        node,
    )
}

pub(super) fn floor_collider(nodes: &mut NodeTable) -> Collider {
    let node = node_at(nodes, "floor", Vec3::zeros());
    Collider::new(
        CollisionObject::rigid_body(Shape::static_plane(Vec3::y(), 0.0).unwrap(), 0.0).unwrap(),
        Material::default(),
        node,
    )
}

pub(super) fn body_of(engine: &Engine, handle: crate::physics::ColliderHandle) -> BackendHandle {
    engine
        .collider(handle)
        .and_then(|collider| collider.object().binding())
        .map(|binding| binding.handle)
        .unwrap()
}
