//! [`RapierBackend`]: the default backend, built on raw `rapier3d`

use rapier3d::geometry::Ray as RapierRay;
use rapier3d::prelude::{
    ActiveCollisionTypes, CCDSolver, CoefficientCombineRule, ColliderBuilder, ColliderSet,
    DefaultBroadPhase, Group, ImpulseJointSet, IntegrationParameters, InteractionGroups,
    IslandManager, MultibodyJointSet, NarrowPhase, PhysicsPipeline, QueryFilter, QueryPipeline,
    RigidBodyBuilder, RigidBodyHandle, RigidBodySet, SharedShape,
};

use super::{BackendContact, BackendError, BackendHandle, BackendRayHit, BodyDesc, PhysicsBackend};
use crate::config::{CombineRule, PhysicsConfig};
use crate::foundation::math::{utils::is_finite_vec, Isometry, Point3, Vec3};
use crate::physics::collision_object::BodyKind;
use crate::physics::query::Ray;
use crate::physics::shape::Shape;

/// Rapier world state
///
/// `PhysicsPipeline::step()` needs every set mutably at once, so they all
/// live together.
pub struct RapierBackend {
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,

    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,

    integration_parameters: IntegrationParameters,
    gravity: Vec3,
    combine_rule: CoefficientCombineRule,
}

impl RapierBackend {
    /// Create an empty world from the engine configuration
    pub fn new(config: &PhysicsConfig) -> Self {
        Self {
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            integration_parameters: IntegrationParameters::default(),
            gravity: config.gravity,
            combine_rule: combine_rule(config.combine_rule),
        }
    }

    /// Number of live bodies
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Map a validated shape onto rapier geometry
    ///
    /// Returns the shape plus its offset relative to the body frame (only
    /// planes use one).
    pub fn build_shape(shape: &Shape) -> Result<(SharedShape, Isometry), BackendError> {
        let shape_error = |reason: &str| BackendError::ShapeBuild {
            kind: shape.kind(),
            reason: reason.to_owned(),
        };

        let built = match shape {
            Shape::Box(cuboid) => {
                let h = cuboid.half_extents();
                SharedShape::cuboid(h.x, h.y, h.z)
            }
            Shape::Sphere(sphere) => SharedShape::ball(sphere.radius()),
            Shape::Cylinder(cylinder) => SharedShape::cylinder(cylinder.height() * 0.5, cylinder.radius()),
            Shape::Capsule(capsule) => SharedShape::capsule_y(capsule.height() * 0.5, capsule.radius()),
            Shape::Cone(cone) => SharedShape::cone(cone.height() * 0.5, cone.radius()),
            Shape::ConvexTriangleMesh(mesh) => SharedShape::convex_hull(&mesh.referenced_vertices())
                .ok_or_else(|| shape_error("convex hull computation failed"))?,
            // the snapshot is non-empty with in-range indices, which trimesh requires
            Shape::BvhTriangleMesh(mesh) => SharedShape::trimesh(mesh.vertices().to_vec(), mesh.indices().to_vec()),
            Shape::ConvexHull(hull) => SharedShape::convex_hull(hull.points())
                .ok_or_else(|| shape_error("convex hull computation failed"))?,
            Shape::StaticPlane(plane) => {
                let normal = nalgebra::Unit::new_normalize(plane.normal());
                let offset = Isometry::translation(
                    plane.normal().x * plane.constant(),
                    plane.normal().y * plane.constant(),
                    plane.normal().z * plane.constant(),
                );
                return Ok((SharedShape::halfspace(normal), offset));
            }
            Shape::Compound(_) => {
                let mut parts = Vec::new();
                flatten_compound(shape, Isometry::identity(), &mut parts)?;
                SharedShape::compound(parts)
            }
        };
        Ok((built, Isometry::identity()))
    }

    fn body_handle(&self, handle: BackendHandle) -> Result<RigidBodyHandle, BackendError> {
        let (index, generation) = handle.into_raw_parts();
        let raw = RigidBodyHandle::from_raw_parts(index, generation);
        if self.bodies.contains(raw) {
            Ok(raw)
        } else {
            Err(BackendError::UnknownHandle(handle))
        }
    }

    fn backend_handle(handle: RigidBodyHandle) -> BackendHandle {
        let (index, generation) = handle.into_raw_parts();
        BackendHandle::from_raw_parts(index, generation)
    }

    fn dynamic_poses(&self) -> Vec<(RigidBodyHandle, Isometry)> {
        self.bodies
            .iter()
            .filter(|(_, body)| body.is_dynamic())
            .map(|(handle, body)| (handle, *body.position()))
            .collect()
    }

    /// Put every dynamic body whose state went non-finite back at its pose in
    /// `before`, at rest
    fn recover_diverged(&mut self, before: &[(RigidBodyHandle, Isometry)]) -> Result<(), BackendError> {
        let mut diverged = Vec::new();
        for &(handle, pose) in before {
            let Some(body) = self.bodies.get_mut(handle) else {
                continue;
            };
            let finite = is_finite_vec(body.translation())
                && body.rotation().coords.iter().all(|c| c.is_finite())
                && is_finite_vec(body.linvel())
                && is_finite_vec(body.angvel());
            if finite {
                continue;
            }
            body.set_position(pose, false);
            body.set_linvel(Vec3::zeros(), false);
            body.set_angvel(Vec3::zeros(), false);
            diverged.push(handle.into_raw_parts());
        }

        if diverged.is_empty() {
            return Ok(());
        }
        log::warn!("Restored diverged bodies {diverged:?} to their last finite pose");
        Err(BackendError::Internal(format!(
            "bodies {diverged:?} diverged to a non-finite state"
        )))
    }
}

/// Collect compound children, flattening nested compounds into one level
fn flatten_compound(
    shape: &Shape,
    parent: Isometry,
    parts: &mut Vec<(Isometry, SharedShape)>,
) -> Result<(), BackendError> {
    let Shape::Compound(compound) = shape else {
        let (built, offset) = RapierBackend::build_shape(shape)?;
        parts.push((parent * offset, built));
        return Ok(());
    };
    for child in compound.children() {
        flatten_compound(child.shape(), parent * child.transform().to_isometry(), parts)?;
    }
    Ok(())
}

fn combine_rule(rule: CombineRule) -> CoefficientCombineRule {
    match rule {
        CombineRule::Average => CoefficientCombineRule::Average,
        CombineRule::Multiply => CoefficientCombineRule::Multiply,
        CombineRule::Min => CoefficientCombineRule::Min,
        CombineRule::Max => CoefficientCombineRule::Max,
    }
}

impl PhysicsBackend for RapierBackend {
    fn name(&self) -> &str {
        "rapier3d"
    }

    fn add_body(&mut self, desc: &BodyDesc) -> Result<BackendHandle, BackendError> {
        let (shape, offset) = Self::build_shape(&desc.shape)?;

        let body = match desc.kind {
            BodyKind::Dynamic => RigidBodyBuilder::dynamic()
                .linear_damping(desc.linear_damping)
                .angular_damping(desc.angular_damping)
                .soft_ccd_prediction(desc.shape.bounding_radius()),
            BodyKind::Static => RigidBodyBuilder::fixed(),
            BodyKind::Ghost => RigidBodyBuilder::kinematic_position_based(),
        }
        .position(desc.pose)
        .build();

        let groups = InteractionGroups::new(
            Group::from_bits_truncate(desc.layers.membership.bits()),
            Group::from_bits_truncate(desc.layers.filter.bits()),
        );
        let mut collider = ColliderBuilder::new(shape)
            .position(offset)
            .friction(desc.material.friction())
            .restitution(desc.material.restitution())
            .friction_combine_rule(self.combine_rule)
            .restitution_combine_rule(self.combine_rule)
            .collision_groups(groups);
        collider = match desc.kind {
            BodyKind::Dynamic => collider.mass(desc.mass),
            BodyKind::Static => collider,
            BodyKind::Ghost => collider.sensor(true).active_collision_types(ActiveCollisionTypes::all()),
        };

        let handle = self.bodies.insert(body);
        self.colliders.insert_with_parent(collider.build(), handle, &mut self.bodies);
        log::trace!("rapier body {:?} created as {:?}", handle.into_raw_parts(), desc.kind);
        Ok(Self::backend_handle(handle))
    }

    fn remove_body(&mut self, handle: BackendHandle) -> Result<(), BackendError> {
        let raw = self.body_handle(handle)?;
        self.bodies.remove(
            raw,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        Ok(())
    }

    fn step_simulation(&mut self, sub_dt: f32) -> Result<(), BackendError> {
        let before = self.dynamic_poses();
        self.integration_parameters.dt = sub_dt;
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
        self.recover_diverged(&before)
    }

    fn world_transform(&self, handle: BackendHandle) -> Result<Isometry, BackendError> {
        let raw = self.body_handle(handle)?;
        Ok(*self.bodies[raw].position())
    }

    fn set_world_transform(&mut self, handle: BackendHandle, pose: &Isometry) -> Result<(), BackendError> {
        let raw = self.body_handle(handle)?;
        self.bodies[raw].set_position(*pose, true);
        Ok(())
    }

    fn linear_velocity(&self, handle: BackendHandle) -> Result<Vec3, BackendError> {
        let raw = self.body_handle(handle)?;
        Ok(*self.bodies[raw].linvel())
    }

    fn angular_velocity(&self, handle: BackendHandle) -> Result<Vec3, BackendError> {
        let raw = self.body_handle(handle)?;
        Ok(*self.bodies[raw].angvel())
    }

    fn apply_impulse(&mut self, handle: BackendHandle, impulse: Vec3, point: Vec3) -> Result<(), BackendError> {
        let raw = self.body_handle(handle)?;
        self.bodies[raw].apply_impulse_at_point(impulse, Point3::from(point), true);
        Ok(())
    }

    fn contacts(&self) -> Vec<BackendContact> {
        let parent = |collider| {
            self.colliders
                .get(collider)
                .and_then(|c| c.parent())
        };
        let mut contacts = Vec::new();

        for pair in self.narrow_phase.contact_pairs() {
            if !pair.has_any_active_contact {
                continue;
            }
            let (Some(body1), Some(body2)) = (parent(pair.collider1), parent(pair.collider2)) else {
                continue;
            };
            let Some(collider1) = self.colliders.get(pair.collider1) else {
                continue;
            };
            for manifold in &pair.manifolds {
                if manifold.data.solver_contacts.is_empty() {
                    continue;
                }
                let frame = collider1.position() * manifold.subshape_pos1.unwrap_or_else(Isometry::identity);
                for point in &manifold.points {
                    contacts.push(BackendContact {
                        body1: Self::backend_handle(body1),
                        body2: Self::backend_handle(body2),
                        point: (frame * point.local_p1).coords,
                        normal: manifold.data.normal,
                        impulse: point.data.impulse,
                    });
                }
            }
        }

        for (collider1, collider2, intersecting) in self.narrow_phase.intersection_pairs() {
            if !intersecting {
                continue;
            }
            let (Some(body1), Some(body2)) = (parent(collider1), parent(collider2)) else {
                continue;
            };
            let origin1 = *self.bodies[body1].translation();
            let origin2 = *self.bodies[body2].translation();
            contacts.push(BackendContact {
                body1: Self::backend_handle(body1),
                body2: Self::backend_handle(body2),
                point: (origin1 + origin2) * 0.5,
                normal: (origin2 - origin1).try_normalize(f32::EPSILON).unwrap_or_else(Vec3::zeros),
                impulse: 0.0,
            });
        }

        contacts
    }

    fn cast_ray(&self, ray: &Ray, max_distance: f32) -> Option<BackendRayHit> {
        let rapier_ray = RapierRay::new(Point3::from(ray.origin()), ray.direction());
        let (collider, distance) = self.query_pipeline.cast_ray(
            &self.bodies,
            &self.colliders,
            &rapier_ray,
            max_distance,
            true,
            QueryFilter::default().exclude_sensors(),
        )?;
        let body = self.colliders.get(collider)?.parent()?;
        Some(BackendRayHit {
            body: Self::backend_handle(body),
            distance,
        })
    }

    fn gravity(&self) -> Vec3 {
        self.gravity
    }

    fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = gravity;
        for (_, body) in self.bodies.iter_mut() {
            if body.is_dynamic() {
                body.wake_up(true);
            }
        }
    }
}
