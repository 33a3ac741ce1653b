//! Collision geometry
//!
//! [`Shape`] is a closed set of collision geometries. Every constructor
//! validates its input and the result is immutable, so one shape can be
//! shared through an `Arc` by any number of collision objects.

mod compound;
mod mesh;
mod primitives;

pub use compound::{Compound, CompoundChild};
pub use mesh::{ConvexHull, Triangle, TriangleMesh};
pub use primitives::{Capsule, Cone, Cuboid, Cylinder, Sphere, StaticPlane};

use crate::error::{PhysicsError, Result};
use crate::foundation::math::Vec3;
use crate::scene::GeometrySource;

/// Discriminant of a [`Shape`], used for logging and diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// Axis-aligned box
    Box,
    /// Sphere
    Sphere,
    /// Y-aligned cylinder
    Cylinder,
    /// Y-aligned capsule
    Capsule,
    /// Y-aligned cone
    Cone,
    /// Convex mesh derived from render geometry
    ConvexTriangleMesh,
    /// Spatially indexed concave mesh (static only)
    BvhTriangleMesh,
    /// Convex hull of a point cloud
    ConvexHull,
    /// Infinite plane (static only)
    StaticPlane,
    /// Rigid union of child shapes
    Compound,
}

/// Collision geometry descriptor
#[derive(Debug, Clone)]
pub enum Shape {
    /// Box given by half extents
    Box(Cuboid),
    /// Sphere
    Sphere(Sphere),
    /// Y-aligned cylinder
    Cylinder(Cylinder),
    /// Y-aligned capsule
    Capsule(Capsule),
    /// Y-aligned cone
    Cone(Cone),
    /// Convex mesh; the backend collides against the hull of its vertices
    ConvexTriangleMesh(TriangleMesh),
    /// Concave mesh with a bounding-volume hierarchy
    BvhTriangleMesh(TriangleMesh),
    /// Convex hull computed from input points
    ConvexHull(ConvexHull),
    /// Infinite plane
    StaticPlane(StaticPlane),
    /// Child shapes at fixed local offsets
    Compound(Compound),
}

impl Shape {
    /// Box from half extents
    pub fn cuboid(half_extents: Vec3) -> Result<Self> {
        Ok(Self::Box(Cuboid::new(half_extents)?))
    }

    /// Sphere from radius
    pub fn sphere(radius: f32) -> Result<Self> {
        Ok(Self::Sphere(Sphere::new(radius)?))
    }

    /// Cylinder from radius, full height and tessellation hint
    pub fn cylinder(radius: f32, height: f32, segments: u32) -> Result<Self> {
        Ok(Self::Cylinder(Cylinder::new(radius, height, segments)?))
    }

    /// Capsule from hemisphere radius and distance between hemisphere centres
    pub fn capsule(radius: f32, height: f32) -> Result<Self> {
        Ok(Self::Capsule(Capsule::new(radius, height)?))
    }

    /// Cone from base radius and full height
    pub fn cone(radius: f32, height: f32) -> Result<Self> {
        Ok(Self::Cone(Cone::new(radius, height)?))
    }

    /// Convex mesh from a snapshot of render geometry
    ///
    /// # Errors
    /// `DegenerateGeometry` when no triangle survives or the mesh is flat.
    pub fn convex_triangle_mesh(source: &impl GeometrySource) -> Result<Self> {
        let mesh = TriangleMesh::from_source(source)?;
        let points: Vec<Vec3> = mesh.referenced_vertices().iter().map(|p| p.coords).collect();
        if !mesh::spans_volume(&points) {
            return Err(PhysicsError::degenerate("convex triangle mesh has zero volume"));
        }
        Ok(Self::ConvexTriangleMesh(mesh))
    }

    /// Concave, spatially indexed mesh from a snapshot of render geometry
    ///
    /// Static-only: a rigid body carrying it never moves.
    pub fn bvh_triangle_mesh(source: &impl GeometrySource) -> Result<Self> {
        Ok(Self::BvhTriangleMesh(TriangleMesh::from_source(source)?))
    }

    /// Convex hull of explicit points
    pub fn convex_hull(points: &[Vec3]) -> Result<Self> {
        Ok(Self::ConvexHull(ConvexHull::from_points(points)?))
    }

    /// Convex hull of every vertex of a geometry source
    pub fn convex_hull_from(source: &impl GeometrySource) -> Result<Self> {
        Self::convex_hull(source.positions())
    }

    /// Infinite plane `normal · x = constant`
    pub fn static_plane(normal: Vec3, constant: f32) -> Result<Self> {
        Ok(Self::StaticPlane(StaticPlane::new(normal, constant)?))
    }

    /// Rigid union of children
    pub fn compound(children: Vec<CompoundChild>) -> Result<Self> {
        Ok(Self::Compound(Compound::new(children)?))
    }

    /// Variant discriminant
    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Box(_) => ShapeKind::Box,
            Self::Sphere(_) => ShapeKind::Sphere,
            Self::Cylinder(_) => ShapeKind::Cylinder,
            Self::Capsule(_) => ShapeKind::Capsule,
            Self::Cone(_) => ShapeKind::Cone,
            Self::ConvexTriangleMesh(_) => ShapeKind::ConvexTriangleMesh,
            Self::BvhTriangleMesh(_) => ShapeKind::BvhTriangleMesh,
            Self::ConvexHull(_) => ShapeKind::ConvexHull,
            Self::StaticPlane(_) => ShapeKind::StaticPlane,
            Self::Compound(_) => ShapeKind::Compound,
        }
    }

    /// Whether a body with this shape can only ever be static
    pub fn is_static_only(&self) -> bool {
        matches!(self, Self::BvhTriangleMesh(_) | Self::StaticPlane(_))
    }

    /// Model-space bounding sphere radius around the local origin
    ///
    /// Infinite for planes.
    pub fn bounding_radius(&self) -> f32 {
        match self {
            Self::Box(cuboid) => cuboid.half_extents().magnitude(),
            Self::Sphere(sphere) => sphere.radius(),
            Self::Cylinder(cylinder) => cylinder.radius().hypot(cylinder.height() * 0.5),
            Self::Capsule(capsule) => capsule.height() * 0.5 + capsule.radius(),
            Self::Cone(cone) => cone.radius().hypot(cone.height() * 0.5),
            Self::ConvexTriangleMesh(mesh) | Self::BvhTriangleMesh(mesh) => mesh.local_bounding_radius(),
            Self::ConvexHull(hull) => hull.local_bounding_radius(),
            Self::StaticPlane(_) => f32::INFINITY,
            Self::Compound(compound) => compound.local_bounding_radius(),
        }
    }
}
