//! Mesh-derived collision geometry
//!
//! Render geometry is copied into a model-space snapshot when the shape is
//! built. The snapshot owns its buffers, so mutating or dropping the source
//! mesh afterwards has no effect on the shape.

use crate::error::{PhysicsError, Result};
use crate::foundation::math::{utils::is_finite_vec, Point3, Vec3};
use crate::scene::GeometrySource;

/// Twice the area below which a triangle is treated as degenerate
const MIN_DOUBLE_AREA: f32 = 1.0e-10;

/// Relative extent below which a point set is treated as flat
const FLATNESS_TOLERANCE: f32 = 1.0e-5;

/// A triangle for collision geometry validation
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    /// First vertex
    pub v0: Vec3,
    /// Second vertex
    pub v1: Vec3,
    /// Third vertex
    pub v2: Vec3,
}

impl Triangle {
    /// Creates a new triangle
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        Self { v0, v1, v2 }
    }

    /// Unnormalized face normal (right-hand rule); its length is twice the area
    pub fn scaled_normal(&self) -> Vec3 {
        (self.v1 - self.v0).cross(&(self.v2 - self.v0))
    }

    /// Whether the triangle has (numerically) zero area
    pub fn is_degenerate(&self) -> bool {
        self.scaled_normal().magnitude() <= MIN_DOUBLE_AREA
    }
}

/// Model-space triangle mesh snapshot shared by the convex and BVH mesh shapes
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleMesh {
    vertices: Vec<Point3>,
    indices: Vec<[u32; 3]>,
    local_bounding_radius: f32,
}

impl TriangleMesh {
    /// Snapshot a geometry source, dropping zero-area triangles
    ///
    /// # Errors
    /// - `InvalidArgument` for non-finite positions, a ragged index list or
    ///   indices out of range
    /// - `DegenerateGeometry` when no triangle with non-zero area remains
    pub fn from_source(source: &dyn GeometrySource) -> Result<Self> {
        let positions = source.positions();
        validate_positions(positions)?;

        let triangles: Vec<[u32; 3]> = match source.indices() {
            Some(indices) => {
                if indices.len() % 3 != 0 {
                    return Err(PhysicsError::invalid_argument(format!(
                        "index count {} is not a multiple of 3",
                        indices.len()
                    )));
                }
                if let Some(&bad) = indices.iter().find(|&&i| i as usize >= positions.len()) {
                    return Err(PhysicsError::invalid_argument(format!(
                        "index {bad} out of range for {} vertices",
                        positions.len()
                    )));
                }
                indices.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect()
            }
            None => {
                if positions.len() % 3 != 0 {
                    return Err(PhysicsError::invalid_argument(format!(
                        "non-indexed vertex count {} is not a multiple of 3",
                        positions.len()
                    )));
                }
                let count = u32::try_from(positions.len())
                    .map_err(|_| PhysicsError::invalid_argument("mesh has too many vertices"))?;
                (0..count).step_by(3).map(|i| [i, i + 1, i + 2]).collect()
            }
        };

        let indices: Vec<[u32; 3]> = triangles
            .into_iter()
            .filter(|[a, b, c]| {
                !Triangle::new(positions[*a as usize], positions[*b as usize], positions[*c as usize])
                    .is_degenerate()
            })
            .collect();

        if indices.is_empty() {
            return Err(PhysicsError::degenerate("mesh has no triangle with non-zero area"));
        }

        let local_bounding_radius = indices
            .iter()
            .flatten()
            .map(|&i| positions[i as usize].magnitude())
            .fold(0.0f32, f32::max);

        Ok(Self {
            vertices: positions.iter().map(|p| Point3::from(*p)).collect(),
            indices,
            local_bounding_radius,
        })
    }

    /// Vertex buffer snapshot
    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    /// Non-degenerate triangles
    pub fn indices(&self) -> &[[u32; 3]] {
        &self.indices
    }

    /// Number of non-degenerate triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    /// Vertices referenced by at least one triangle
    pub fn referenced_vertices(&self) -> Vec<Point3> {
        let mut used = vec![false; self.vertices.len()];
        for &i in self.indices.iter().flatten() {
            used[i as usize] = true;
        }
        self.vertices
            .iter()
            .zip(used)
            .filter_map(|(p, keep)| keep.then_some(*p))
            .collect()
    }

    /// Model-space bounding sphere radius around the origin
    pub fn local_bounding_radius(&self) -> f32 {
        self.local_bounding_radius
    }
}

/// Point cloud whose convex hull is the collision shape
#[derive(Debug, Clone, PartialEq)]
pub struct ConvexHull {
    points: Vec<Point3>,
}

impl ConvexHull {
    /// Build from an explicit point cloud
    ///
    /// # Errors
    /// - `InvalidArgument` for non-finite points
    /// - `DegenerateGeometry` when the points span no volume
    pub fn from_points(points: &[Vec3]) -> Result<Self> {
        validate_positions(points)?;
        if !spans_volume(points) {
            return Err(PhysicsError::degenerate(format!(
                "convex hull of {} points has zero volume",
                points.len()
            )));
        }
        Ok(Self {
            points: points.iter().map(|p| Point3::from(*p)).collect(),
        })
    }

    /// Input points (the hull itself is computed by the backend)
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    /// Model-space bounding sphere radius around the origin
    pub fn local_bounding_radius(&self) -> f32 {
        self.points.iter().map(|p| p.coords.magnitude()).fold(0.0, f32::max)
    }
}

fn validate_positions(positions: &[Vec3]) -> Result<()> {
    match positions.iter().position(|p| !is_finite_vec(p)) {
        Some(index) => Err(PhysicsError::invalid_argument(format!(
            "vertex {index} is not finite: {:?}",
            positions[index]
        ))),
        None => Ok(()),
    }
}

/// Whether the points are not all (numerically) coplanar
///
/// Picks a far pair, the point farthest from their line and the point
/// farthest from their plane; a zero extent at any stage means no volume.
pub(crate) fn spans_volume(points: &[Vec3]) -> bool {
    let Some(&p0) = points.first() else {
        return false;
    };

    let farthest = |score: &dyn Fn(&Vec3) -> f32| -> Option<(Vec3, f32)> {
        points
            .iter()
            .map(|p| (*p, score(p)))
            .max_by(|a, b| a.1.total_cmp(&b.1))
    };

    let Some((p1, extent)) = farthest(&|p| (p - p0).magnitude()) else {
        return false;
    };
    if extent <= f32::EPSILON {
        return false;
    }
    let tolerance = FLATNESS_TOLERANCE * extent;

    let axis = (p1 - p0) / extent;
    let Some((p2, off_line)) = farthest(&|p| (p - p0).cross(&axis).magnitude()) else {
        return false;
    };
    if off_line <= tolerance {
        return false;
    }

    let normal = (p1 - p0).cross(&(p2 - p0)).normalize();
    farthest(&|p| (p - p0).dot(&normal).abs())
        .is_some_and(|(_, off_plane)| off_plane > tolerance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::MeshGeometry;

    fn tetrahedron() -> Vec<Vec3> {
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        ]
    }

    #[test]
    fn test_snapshot_drops_degenerate_triangles() {
        let geometry = MeshGeometry::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(2.0, 0.0, 0.0),
            ],
            // second triangle is collinear
            vec![0, 1, 2, 0, 1, 3],
        );
        let mesh = TriangleMesh::from_source(&geometry).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn test_snapshot_is_independent_of_source() {
        let mut geometry = MeshGeometry::cube(Vec3::new(1.0, 1.0, 1.0));
        let mesh = TriangleMesh::from_source(&geometry).unwrap();
        let before = mesh.clone();

        geometry.positions[0] = Vec3::new(50.0, 50.0, 50.0);
        geometry.indices = Some(Vec::new());

        assert_eq!(mesh, before);
        assert_eq!(mesh.triangle_count(), 12);
    }

    #[test]
    fn test_zero_triangles_is_degenerate() {
        let empty = MeshGeometry::new(vec![Vec3::zeros(); 3], vec![]);
        assert!(matches!(
            TriangleMesh::from_source(&empty),
            Err(PhysicsError::DegenerateGeometry(_))
        ));

        let collapsed = MeshGeometry::non_indexed(vec![Vec3::new(1.0, 1.0, 1.0); 6]);
        assert!(matches!(
            TriangleMesh::from_source(&collapsed),
            Err(PhysicsError::DegenerateGeometry(_))
        ));
    }

    #[test]
    fn test_bad_indices_are_invalid_arguments() {
        let out_of_range = MeshGeometry::new(tetrahedron(), vec![0, 1, 9]);
        assert!(matches!(
            TriangleMesh::from_source(&out_of_range),
            Err(PhysicsError::InvalidArgument(_))
        ));

        let ragged = MeshGeometry::new(tetrahedron(), vec![0, 1, 2, 3]);
        assert!(matches!(
            TriangleMesh::from_source(&ragged),
            Err(PhysicsError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_spans_volume() {
        assert!(spans_volume(&tetrahedron()));

        let flat = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 1.0),
        ];
        assert!(!spans_volume(&flat));
        assert!(!spans_volume(&[Vec3::new(1.0, 2.0, 3.0); 5]));
        assert!(!spans_volume(&[]));
    }

    #[test]
    fn test_convex_hull_rejects_flat_cloud() {
        let flat = vec![
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 1.0),
            Vec3::new(5.0, 1.0, 5.0),
        ];
        assert!(matches!(
            ConvexHull::from_points(&flat),
            Err(PhysicsError::DegenerateGeometry(_))
        ));
        assert_eq!(ConvexHull::from_points(&tetrahedron()).unwrap().points().len(), 4);
    }

    #[test]
    fn test_referenced_vertices_skips_unused() {
        let mut positions = tetrahedron();
        positions.push(Vec3::new(9.0, 9.0, 9.0));
        let geometry = MeshGeometry::new(positions, vec![0, 1, 2, 0, 2, 3]);
        let mesh = TriangleMesh::from_source(&geometry).unwrap();
        assert_eq!(mesh.referenced_vertices().len(), 4);
    }
}
