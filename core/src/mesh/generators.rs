//! Mesh generators for the shapes Prism draws.
//!
//! Every generator produces a [`CpuMesh`] using the interleaved
//! `position_normal_uv` layout (32 bytes per vertex). The graphics crate
//! uploads each kind at most once through its mesh cache.

use std::f32::consts::PI;

use super::data::{CpuMesh, MeshVertex, PrimitiveTopology};
use super::layout::VertexLayout;

/// Segment count used for the display sphere in both directions.
pub const SPHERE_SEGMENTS: u32 = 64;

/// The shapes available to the bake stages and the live pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshKind {
    /// 64x64 UV sphere of radius 2.
    Sphere,
    /// The [-1, 1] cube drawn from the inside during cube bakes.
    Cube,
    /// Full-screen quad for 2D bakes.
    Quad,
}

impl MeshKind {
    /// All kinds, in cache slot order.
    pub const ALL: [MeshKind; 3] = [MeshKind::Sphere, MeshKind::Cube, MeshKind::Quad];

    /// Stable slot index for this kind.
    pub fn index(&self) -> usize {
        match self {
            Self::Sphere => 0,
            Self::Cube => 1,
            Self::Quad => 2,
        }
    }

    /// Human readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sphere => "sphere",
            Self::Cube => "cube",
            Self::Quad => "quad",
        }
    }

    /// Generate the CPU data for this kind.
    pub fn generate(&self) -> CpuMesh {
        match self {
            Self::Sphere => generate_uv_sphere(SPHERE_SEGMENTS, SPHERE_SEGMENTS),
            Self::Cube => generate_cube(),
            Self::Quad => generate_screen_quad(),
        }
    }
}

impl std::fmt::Display for MeshKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Generate a UV sphere of radius 2 drawn as a single triangle strip.
///
/// Sample `(x, y)` lives at vertex `y * (x_segments + 1) + x`. Rows of the
/// strip alternate direction so consecutive rows share an edge without
/// degenerate restarts. The normal equals the (unnormalized) position.
pub fn generate_uv_sphere(x_segments: u32, y_segments: u32) -> CpuMesh {
    let row_width = x_segments + 1;
    let mut vertices = Vec::with_capacity((row_width * (y_segments + 1)) as usize);

    for y in 0..=y_segments {
        let ys = y as f32 / y_segments as f32;
        for x in 0..=x_segments {
            let xs = x as f32 / x_segments as f32;
            let position = [
                2.0 * (xs * 2.0 * PI).cos() * (ys * PI).sin(),
                2.0 * (ys * PI).cos(),
                2.0 * (xs * 2.0 * PI).sin() * (ys * PI).sin(),
            ];
            vertices.push(MeshVertex::new(position, position, [xs, ys]));
        }
    }

    let mut indices = Vec::with_capacity((2 * y_segments * row_width) as usize);
    for row in 0..y_segments {
        if row % 2 == 0 {
            for x in 0..=x_segments {
                indices.push(row * row_width + x);
                indices.push((row + 1) * row_width + x);
            }
        } else {
            for x in (0..=x_segments).rev() {
                indices.push((row + 1) * row_width + x);
                indices.push(row * row_width + x);
            }
        }
    }

    CpuMesh::new(VertexLayout::position_normal_uv())
        .with_vertices(&vertices)
        .with_indices_u32(&indices)
        .with_topology(PrimitiveTopology::TriangleStrip)
        .with_label("sphere")
}

const fn cube_vertex(p: [f32; 3], n: [f32; 3], uv: [f32; 2]) -> MeshVertex {
    MeshVertex::new(p, n, uv)
}

#[rustfmt::skip]
const CUBE_VERTICES: [MeshVertex; 36] = [
    // back
    cube_vertex([-1.0, -1.0, -1.0], [0.0, 0.0, -1.0], [0.0, 0.0]),
    cube_vertex([ 1.0,  1.0, -1.0], [0.0, 0.0, -1.0], [1.0, 1.0]),
    cube_vertex([ 1.0, -1.0, -1.0], [0.0, 0.0, -1.0], [1.0, 0.0]),
    cube_vertex([ 1.0,  1.0, -1.0], [0.0, 0.0, -1.0], [1.0, 1.0]),
    cube_vertex([-1.0, -1.0, -1.0], [0.0, 0.0, -1.0], [0.0, 0.0]),
    cube_vertex([-1.0,  1.0, -1.0], [0.0, 0.0, -1.0], [0.0, 1.0]),
    // front
    cube_vertex([-1.0, -1.0,  1.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
    cube_vertex([ 1.0, -1.0,  1.0], [0.0, 0.0, 1.0], [1.0, 0.0]),
    cube_vertex([ 1.0,  1.0,  1.0], [0.0, 0.0, 1.0], [1.0, 1.0]),
    cube_vertex([ 1.0,  1.0,  1.0], [0.0, 0.0, 1.0], [1.0, 1.0]),
    cube_vertex([-1.0,  1.0,  1.0], [0.0, 0.0, 1.0], [0.0, 1.0]),
    cube_vertex([-1.0, -1.0,  1.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
    // left
    cube_vertex([-1.0,  1.0,  1.0], [-1.0, 0.0, 0.0], [1.0, 0.0]),
    cube_vertex([-1.0,  1.0, -1.0], [-1.0, 0.0, 0.0], [1.0, 1.0]),
    cube_vertex([-1.0, -1.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0]),
    cube_vertex([-1.0, -1.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0]),
    cube_vertex([-1.0, -1.0,  1.0], [-1.0, 0.0, 0.0], [0.0, 0.0]),
    cube_vertex([-1.0,  1.0,  1.0], [-1.0, 0.0, 0.0], [1.0, 0.0]),
    // right
    cube_vertex([ 1.0,  1.0,  1.0], [1.0, 0.0, 0.0], [1.0, 0.0]),
    cube_vertex([ 1.0, -1.0, -1.0], [1.0, 0.0, 0.0], [0.0, 1.0]),
    cube_vertex([ 1.0,  1.0, -1.0], [1.0, 0.0, 0.0], [1.0, 1.0]),
    cube_vertex([ 1.0, -1.0, -1.0], [1.0, 0.0, 0.0], [0.0, 1.0]),
    cube_vertex([ 1.0,  1.0,  1.0], [1.0, 0.0, 0.0], [1.0, 0.0]),
    cube_vertex([ 1.0, -1.0,  1.0], [1.0, 0.0, 0.0], [0.0, 0.0]),
    // bottom
    cube_vertex([-1.0, -1.0, -1.0], [0.0, -1.0, 0.0], [0.0, 1.0]),
    cube_vertex([ 1.0, -1.0, -1.0], [0.0, -1.0, 0.0], [1.0, 1.0]),
    cube_vertex([ 1.0, -1.0,  1.0], [0.0, -1.0, 0.0], [1.0, 0.0]),
    cube_vertex([ 1.0, -1.0,  1.0], [0.0, -1.0, 0.0], [1.0, 0.0]),
    cube_vertex([-1.0, -1.0,  1.0], [0.0, -1.0, 0.0], [0.0, 0.0]),
    cube_vertex([-1.0, -1.0, -1.0], [0.0, -1.0, 0.0], [0.0, 1.0]),
    // top
    cube_vertex([-1.0,  1.0, -1.0], [0.0, 1.0, 0.0], [0.0, 1.0]),
    cube_vertex([ 1.0,  1.0,  1.0], [0.0, 1.0, 0.0], [1.0, 0.0]),
    cube_vertex([ 1.0,  1.0, -1.0], [0.0, 1.0, 0.0], [1.0, 1.0]),
    cube_vertex([ 1.0,  1.0,  1.0], [0.0, 1.0, 0.0], [1.0, 0.0]),
    cube_vertex([-1.0,  1.0, -1.0], [0.0, 1.0, 0.0], [0.0, 1.0]),
    cube_vertex([-1.0,  1.0,  1.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
];

/// Generate the [-1, 1] cube: 36 vertices, 12 triangles, no indices.
pub fn generate_cube() -> CpuMesh {
    CpuMesh::new(VertexLayout::position_normal_uv())
        .with_vertices(&CUBE_VERTICES)
        .with_topology(PrimitiveTopology::TriangleList)
        .with_label("cube")
}

/// Generate a full-screen quad drawn as a 4-vertex triangle strip.
///
/// Covers [-1, 1] in X and Y at z = 0. UV (0, 0) is the bottom-left corner.
pub fn generate_screen_quad() -> CpuMesh {
    let normal = [0.0, 0.0, 1.0];
    let vertices = [
        MeshVertex::new([-1.0, 1.0, 0.0], normal, [0.0, 1.0]),
        MeshVertex::new([-1.0, -1.0, 0.0], normal, [0.0, 0.0]),
        MeshVertex::new([1.0, 1.0, 0.0], normal, [1.0, 1.0]),
        MeshVertex::new([1.0, -1.0, 0.0], normal, [1.0, 0.0]),
    ];

    CpuMesh::new(VertexLayout::position_normal_uv())
        .with_vertices(&vertices)
        .with_topology(PrimitiveTopology::TriangleStrip)
        .with_label("quad")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_counts() {
        let mesh = generate_uv_sphere(8, 4);
        // (8+1) * (4+1)
        assert_eq!(mesh.vertex_count(), 45);
        // 2 * 4 * (8+1)
        assert_eq!(mesh.index_count(), 72);
        assert_eq!(mesh.topology(), PrimitiveTopology::TriangleStrip);
    }

    #[test]
    fn test_default_sphere_counts() {
        let mesh = MeshKind::Sphere.generate();
        assert_eq!(mesh.vertex_count(), 65 * 65);
        assert_eq!(mesh.draw_count(), 2 * 64 * 65);
    }

    #[test]
    fn test_sphere_vertices_on_radius_two() {
        let mesh = generate_uv_sphere(16, 8);
        for v in mesh.vertices() {
            let len = (v.position[0].powi(2) + v.position[1].powi(2) + v.position[2].powi(2))
                .sqrt();
            assert!((len - 2.0).abs() < 1e-4, "radius {len}");
            assert_eq!(v.position, v.normal);
            assert!((0.0..=1.0).contains(&v.uv[0]));
            assert!((0.0..=1.0).contains(&v.uv[1]));
        }
    }

    #[test]
    fn test_sphere_indices_in_range() {
        for (x, y) in [(4, 4), (7, 3), (3, 9)] {
            let mesh = generate_uv_sphere(x, y);
            let max = mesh.indices_u32().iter().copied().max().unwrap();
            assert!(max < mesh.vertex_count());
        }
    }

    #[test]
    fn test_sphere_strip_rows_alternate() {
        let mesh = generate_uv_sphere(2, 2);
        let w: u32 = 3;
        let expected = [0, w, 1, w + 1, 2, w + 2, 2 * w + 2, w + 2, 2 * w + 1, w + 1, 2 * w, w];
        assert_eq!(mesh.indices_u32(), &expected);
    }

    #[test]
    fn test_sphere_index_addresses_sample() {
        let mesh = generate_uv_sphere(6, 3);
        let vertices = mesh.vertices();
        // Second pair of the first row points at sample (1, 1).
        let v = vertices[mesh.indices_u32()[3] as usize];
        assert!((v.uv[0] - 1.0 / 6.0).abs() < 1e-6);
        assert!((v.uv[1] - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_cube_faces() {
        let mesh = generate_cube();
        assert_eq!(mesh.vertex_count(), 36);
        assert!(!mesh.is_indexed());
        assert_eq!(mesh.topology().triangle_count(mesh.draw_count()), 12);

        for face in mesh.vertices().chunks(6) {
            let normal = face[0].normal;
            let axis = normal.iter().position(|c| c.abs() == 1.0).unwrap();
            for v in face {
                assert_eq!(v.normal, normal);
                assert_eq!(v.position[axis], normal[axis]);
            }
        }
    }

    #[test]
    fn test_screen_quad() {
        let mesh = generate_screen_quad();
        assert_eq!(mesh.vertex_count(), 4);
        assert!(!mesh.is_indexed());
        assert_eq!(mesh.topology(), PrimitiveTopology::TriangleStrip);
        for v in mesh.vertices() {
            assert_eq!(v.position[2], 0.0);
            assert_eq!(v.uv[0], (v.position[0] + 1.0) / 2.0);
            assert_eq!(v.uv[1], (v.position[1] + 1.0) / 2.0);
        }
    }

    #[test]
    fn test_mesh_kind_slots_are_distinct() {
        let slots: Vec<usize> = MeshKind::ALL.iter().map(|k| k.index()).collect();
        assert_eq!(slots, vec![0, 1, 2]);
        assert_eq!(MeshKind::Cube.to_string(), "cube");
    }
}
