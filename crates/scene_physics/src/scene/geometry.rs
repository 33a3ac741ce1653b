//! Render geometry as seen by the shape builders
//!
//! Mesh-derived collision shapes copy vertex and index data out of a
//! [`GeometrySource`] once, at construction time. Later edits to the render
//! geometry never reach an already-built shape.

use crate::foundation::math::{Mat4, Point3, Vec3};

/// Read access to a triangle mesh owned by the renderer or asset system
pub trait GeometrySource {
    /// Vertex positions in model space
    fn positions(&self) -> &[Vec3];

    /// Triangle-list indices, or `None` for non-indexed geometry
    /// (every three consecutive positions form a triangle)
    fn indices(&self) -> Option<&[u32]>;
}

/// Plain in-memory triangle mesh
///
/// Positions only; normals and texture coordinates are irrelevant to
/// collision geometry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshGeometry {
    /// Vertex positions (model space)
    pub positions: Vec<Vec3>,
    /// Triangle-list indices; `None` means non-indexed
    pub indices: Option<Vec<u32>>,
}

impl MeshGeometry {
    /// Create indexed geometry
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            indices: Some(indices),
        }
    }

    /// Create non-indexed geometry (triangle soup)
    pub fn non_indexed(positions: Vec<Vec3>) -> Self {
        Self {
            positions,
            indices: None,
        }
    }

    /// Axis-aligned box centered at the origin
    pub fn cube(half_extents: Vec3) -> Self {
        let (x, y, z) = (half_extents.x, half_extents.y, half_extents.z);
        let positions = vec![
            Vec3::new(-x, -y, -z),
            Vec3::new(x, -y, -z),
            Vec3::new(x, y, -z),
            Vec3::new(-x, y, -z),
            Vec3::new(-x, -y, z),
            Vec3::new(x, -y, z),
            Vec3::new(x, y, z),
            Vec3::new(-x, y, z),
        ];
        #[rustfmt::skip]
        let indices = vec![
            0, 2, 1, 0, 3, 2, // -Z
            4, 5, 6, 4, 6, 7, // +Z
            0, 1, 5, 0, 5, 4, // -Y
            3, 6, 2, 3, 7, 6, // +Y
            0, 4, 7, 0, 7, 3, // -X
            1, 2, 6, 1, 6, 5, // +X
        ];
        Self::new(positions, indices)
    }

    /// UV sphere; low segment counts give the faceted convex "gems" of the shapes demo
    pub fn uv_sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let width_segments = width_segments.max(3);
        let height_segments = height_segments.max(2);
        let mut positions = Vec::with_capacity(((width_segments + 1) * (height_segments + 1)) as usize);

        for row in 0..=height_segments {
            let theta = std::f32::consts::PI * row as f32 / height_segments as f32;
            for column in 0..=width_segments {
                let phi = std::f32::consts::TAU * column as f32 / width_segments as f32;
                positions.push(Vec3::new(
                    -radius * phi.cos() * theta.sin(),
                    radius * theta.cos(),
                    radius * phi.sin() * theta.sin(),
                ));
            }
        }

        let stride = width_segments + 1;
        let mut indices = Vec::with_capacity((width_segments * height_segments * 6) as usize);
        for row in 0..height_segments {
            for column in 0..width_segments {
                let a = row * stride + column;
                let b = a + stride;
                indices.extend_from_slice(&[a, b, a + 1, b, b + 1, a + 1]);
            }
        }
        // Pole rows produce zero-area triangles; shape builders drop them.
        Self::new(positions, indices)
    }

    /// Bake a transformation matrix into the positions
    pub fn apply_transform(&mut self, matrix: &Mat4) {
        for position in &mut self.positions {
            let p = matrix.transform_point(&Point3::from(*position));
            *position = p.coords;
        }
    }

    /// Number of triangles described by the index (or vertex) list
    pub fn triangle_count(&self) -> usize {
        match &self.indices {
            Some(indices) => indices.len() / 3,
            None => self.positions.len() / 3,
        }
    }
}

impl GeometrySource for MeshGeometry {
    fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    fn indices(&self) -> Option<&[u32]> {
        self.indices.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cube_layout() {
        let cube = MeshGeometry::cube(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(cube.positions.len(), 8);
        assert_eq!(cube.triangle_count(), 12);
    }

    #[test]
    fn test_uv_sphere_vertices_on_surface() {
        let sphere = MeshGeometry::uv_sphere(2.0, 4, 4);
        for p in &sphere.positions {
            assert_relative_eq!(p.magnitude(), 2.0, epsilon = 1e-5);
        }
        assert_eq!(sphere.triangle_count(), 4 * 4 * 2);
    }

    #[test]
    fn test_apply_transform_scales_positions() {
        let mut cube = MeshGeometry::cube(Vec3::new(1.0, 1.0, 1.0));
        cube.apply_transform(&Mat4::new_scaling(3.0));
        assert_relative_eq!(cube.positions[6], Vec3::new(3.0, 3.0, 3.0));
    }
}
