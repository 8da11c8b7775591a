//! Overlay geometry built from an existing mesh for the renderer: the
//! highlight for a picked triangle and the bounding-box visualisation.

use meshpick_math::Vec3;

use crate::mesh::{Mesh, Vertex};

/// Color of a picked-triangle overlay.
pub const HIGHLIGHT_COLOR: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

/// Color of the bounding-box overlay.
pub const BOUNDING_BOX_COLOR: [f32; 4] = [1.0, 0.0, 0.0, 0.3];

// Indices into `Aabb::corners()`, two triangles per box side.
pub(crate) const BOX_FACES: [u32; 36] = [
    0, 2, 1, 1, 2, 3, // -z
    4, 5, 6, 5, 7, 6, // +z
    0, 1, 4, 1, 5, 4, // -y
    2, 6, 3, 3, 6, 7, // +y
    0, 4, 2, 2, 4, 6, // -x
    1, 3, 5, 3, 7, 5, // +x
];

impl Mesh {
    /// Three-vertex overlay covering triangle `id`, lifted `offset` units
    /// along its unit normal so it wins the depth test.
    ///
    /// The overlay shares this mesh's model matrix and is wound `0, 2, 1`.
    /// Returns `None` for an unknown id.
    pub fn highlight_triangle(&self, id: u32, offset: f64) -> Option<Mesh> {
        let triangle = self.triangle(id)?;
        let normal = self
            .face_normal(triangle)
            .try_normalize(f64::EPSILON)
            .unwrap_or_else(Vec3::zeros);
        let vertices = self
            .get_triangle_vertices(triangle)
            .iter()
            .map(|p| Vertex {
                position: p + normal * offset,
                color: HIGHLIGHT_COLOR,
                normal,
            })
            .collect();
        let mut overlay = Mesh::from_parts(vertices, vec![0, 2, 1]);
        overlay.set_model_matrix(*self.model_matrix());
        Some(overlay)
    }

    /// Translucent box enclosing this mesh's bounding box, or `None` for an
    /// empty mesh.
    pub fn bounding_box_mesh(&self) -> Option<Mesh> {
        let aabb = self.bounding_box();
        if aabb.is_empty() {
            return None;
        }
        let center = aabb.center();
        let vertices = aabb
            .corners()
            .iter()
            .map(|p| Vertex {
                position: *p,
                color: BOUNDING_BOX_COLOR,
                normal: p - center,
            })
            .collect();
        let mut overlay = Mesh::from_parts(vertices, BOX_FACES.to_vec());
        overlay.set_model_matrix(*self.model_matrix());
        Some(overlay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use meshpick_math::Point3;

    fn raised() -> Mesh {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ];
        let mut mesh = Mesh::from_positions(positions, vec![0, 1, 2]).unwrap();
        mesh.translate(0.0, 0.0, 3.0);
        mesh
    }

    #[test]
    fn test_highlight_offsets_along_unit_normal() {
        let mesh = raised();
        let overlay = mesh.highlight_triangle(0, 0.5).unwrap();
        assert_eq!(overlay.num_triangles(), 1);
        assert_eq!(overlay.faces(), &[0, 2, 1]);
        for v in overlay.vertices() {
            assert_relative_eq!(v.position.z, 0.5);
            assert_relative_eq!(v.normal.norm(), 1.0);
            assert_eq!(v.color, HIGHLIGHT_COLOR);
        }
        assert_eq!(overlay.model_matrix(), mesh.model_matrix());
    }

    #[test]
    fn test_highlight_unknown_triangle() {
        assert!(raised().highlight_triangle(7, 0.5).is_none());
    }

    #[test]
    fn test_highlight_degenerate_triangle_is_not_offset() {
        let positions = vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)];
        let mesh = Mesh::from_positions(positions, vec![0, 1, 2]).unwrap();
        let overlay = mesh.highlight_triangle(0, 0.5).unwrap();
        assert_eq!(overlay.vertices()[1].position, Point3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_bounding_box_mesh() {
        let mesh = raised();
        let overlay = mesh.bounding_box_mesh().unwrap();
        assert_eq!(overlay.num_vertices(), 8);
        assert_eq!(overlay.num_triangles(), 12);
        assert_eq!(overlay.bounding_box(), mesh.bounding_box());
        assert!(Mesh::empty().bounding_box_mesh().is_none());
    }
}
