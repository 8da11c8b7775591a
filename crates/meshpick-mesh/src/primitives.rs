//! Procedural meshes: a flat grid, a UV sphere and a cube.
//!
//! These stand in for loaded assets in the CLI, tests and benchmarks. Sizes
//! are caller-controlled, so the grid and sphere check their triangle count
//! against the `u32` id range before allocating anything.

use std::f64::consts::PI;

use meshpick_math::Point3;

use crate::aabb::Aabb;
use crate::error::{MeshError, Result};
use crate::mesh::{Mesh, Vertex};
use crate::overlay::BOX_FACES;

/// Square grid of `cols x rows` cells in the `z = 0` plane, centered on the
/// origin with side length `size`. Two triangles per cell.
///
/// Fails with [`MeshError::TooManyTriangles`] when the grid has more
/// triangles than a `u32` id can address.
pub fn grid(cols: u32, rows: u32, size: f64) -> Result<Mesh> {
    let cols = cols.max(1);
    let rows = rows.max(1);
    let triangles = triangle_budget(2 * u128::from(cols) * u128::from(rows))?;
    let half = size / 2.0;

    let mut positions = Vec::with_capacity((cols as usize + 1) * (rows as usize + 1));
    for j in 0..=rows {
        for i in 0..=cols {
            positions.push(Point3::new(
                -half + size * f64::from(i) / f64::from(cols),
                -half + size * f64::from(j) / f64::from(rows),
                0.0,
            ));
        }
    }

    let mut faces = Vec::with_capacity(3 * triangles);
    let stride = cols + 1;
    for j in 0..rows {
        for i in 0..cols {
            let a = j * stride + i;
            let b = a + 1;
            let c = a + stride;
            let d = c + 1;
            faces.extend_from_slice(&[a, b, d, a, d, c]);
        }
    }

    build(positions, faces)
}

/// UV sphere centered on the origin with `segments` slices around the Y
/// axis and `rings` stacks from pole to pole.
///
/// Produces `2 * segments * (rings - 1)` triangles, failing with
/// [`MeshError::TooManyTriangles`] when that exceeds the `u32` id range.
pub fn uv_sphere(radius: f64, segments: u32, rings: u32) -> Result<Mesh> {
    let segments = segments.max(3);
    let rings = rings.max(2);
    let triangles = triangle_budget(2 * u128::from(segments) * u128::from(rings - 1))?;

    let mut positions = Vec::with_capacity(triangles / 2 + 2);
    positions.push(Point3::new(0.0, radius, 0.0));
    for r in 1..rings {
        let phi = PI * f64::from(r) / f64::from(rings);
        let (sin_phi, cos_phi) = phi.sin_cos();
        for s in 0..segments {
            let theta = 2.0 * PI * f64::from(s) / f64::from(segments);
            let (sin_theta, cos_theta) = theta.sin_cos();
            positions.push(Point3::new(
                radius * sin_phi * cos_theta,
                radius * cos_phi,
                radius * sin_phi * sin_theta,
            ));
        }
    }
    let south = positions.len() as u32;
    positions.push(Point3::new(0.0, -radius, 0.0));

    let ring_start = |r: u32| 1 + (r - 1) * segments;
    let mut faces = Vec::with_capacity(3 * triangles);

    // North cap
    for s in 0..segments {
        let next = (s + 1) % segments;
        faces.extend_from_slice(&[0, ring_start(1) + next, ring_start(1) + s]);
    }
    // Bands between consecutive rings
    for r in 1..rings - 1 {
        let top = ring_start(r);
        let bottom = ring_start(r + 1);
        for s in 0..segments {
            let next = (s + 1) % segments;
            faces.extend_from_slice(&[top + s, top + next, bottom + s]);
            faces.extend_from_slice(&[top + next, bottom + next, bottom + s]);
        }
    }
    // South cap
    let last = ring_start(rings - 1);
    for s in 0..segments {
        let next = (s + 1) % segments;
        faces.extend_from_slice(&[south, last + s, last + next]);
    }

    build(positions, faces)
}

/// Axis-aligned cube of edge `size` centered on the origin, 8 shared
/// vertices and 12 triangles.
pub fn cube(size: f64) -> Mesh {
    let h = size / 2.0;
    let vertices = Aabb::new(Point3::new(-h, -h, -h), Point3::new(h, h, h))
        .corners()
        .into_iter()
        .map(Vertex::at)
        .collect();
    let mut mesh = Mesh::from_parts(vertices, BOX_FACES.to_vec());
    mesh.recompute_normals();
    mesh
}

/// Triangle count as a buffer size, or an error when ids would not fit in
/// `u32`.
fn triangle_budget(count: u128) -> Result<usize> {
    match u32::try_from(count) {
        Ok(n) => Ok(n as usize),
        Err(_) => Err(MeshError::TooManyTriangles(
            usize::try_from(count).unwrap_or(usize::MAX),
        )),
    }
}

fn build(positions: Vec<Point3>, faces: Vec<u32>) -> Result<Mesh> {
    let mesh = Mesh::from_positions(positions, faces)?;
    log::debug!(
        "generated mesh: {} vertices, {} triangles",
        mesh.num_vertices(),
        mesh.num_triangles()
    );
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn indices_in_range(mesh: &Mesh) -> bool {
        mesh.faces()
            .iter()
            .all(|&i| (i as usize) < mesh.num_vertices())
    }

    #[test]
    fn test_grid_counts() {
        let mesh = grid(4, 3, 2.0).unwrap();
        assert_eq!(mesh.num_vertices(), 20);
        assert_eq!(mesh.num_triangles(), 24);
        assert!(indices_in_range(&mesh));
        assert_relative_eq!(mesh.bounding_box().min.x, -1.0);
        assert_relative_eq!(mesh.bounding_box().max.y, 1.0);
    }

    #[test]
    fn test_grid_normals_face_up() {
        let mesh = grid(2, 2, 1.0).unwrap();
        for v in mesh.vertices() {
            assert!(v.normal.z > 0.0);
        }
    }

    #[test]
    fn test_sphere_counts() {
        let mesh = uv_sphere(1.0, 8, 4).unwrap();
        assert_eq!(mesh.num_vertices(), 8 * 3 + 2);
        assert_eq!(mesh.num_triangles(), 2 * 8 * 3);
        assert!(indices_in_range(&mesh));
    }

    #[test]
    fn test_sphere_vertices_on_surface() {
        let mesh = uv_sphere(2.5, 12, 6).unwrap();
        for v in mesh.vertices() {
            assert_relative_eq!(v.position.coords.norm(), 2.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_sphere_normals_point_outward() {
        let mesh = uv_sphere(1.0, 16, 8).unwrap();
        for v in mesh.vertices() {
            assert!(v.normal.dot(&v.position.coords) > 0.0);
        }
    }

    #[test]
    fn test_cube() {
        let mesh = cube(2.0);
        assert_eq!(mesh.num_vertices(), 8);
        assert_eq!(mesh.num_triangles(), 12);
        assert_eq!(mesh.bounding_box().max, Point3::new(1.0, 1.0, 1.0));
        for tri in mesh.triangles() {
            let n = mesh.face_normal(tri);
            // outward: normal agrees with the centroid direction
            assert!(n.dot(&tri.centroid.coords) > 0.0);
        }
    }

    #[test]
    fn test_oversized_grid_is_rejected() {
        // 2 * 70_000^2 triangles: far past the u32 id range
        let err = grid(70_000, 70_000, 2.0).unwrap_err();
        assert_eq!(err, MeshError::TooManyTriangles(9_800_000_000));
        // one triangle past the limit
        let err = grid(1, 1 << 31, 1.0).unwrap_err();
        assert_eq!(err, MeshError::TooManyTriangles(1 << 32));
    }

    #[test]
    fn test_oversized_sphere_is_rejected() {
        let err = uv_sphere(1.0, u32::MAX, u32::MAX).unwrap_err();
        assert!(matches!(err, MeshError::TooManyTriangles(_)));
    }

    #[test]
    fn test_triangle_budget_limit() {
        assert_eq!(triangle_budget(u128::from(u32::MAX)), Ok(u32::MAX as usize));
        assert!(triangle_budget(u128::from(u32::MAX) + 1).is_err());
    }
}
