//! Indexed triangle mesh with per-triangle derived data.

use meshpick_math::{Dir3, Point3, Transform, Vec3};

use crate::aabb::Aabb;
use crate::error::{MeshError, Result};

/// Base color given to vertices that arrive without one.
pub const DEFAULT_VERTEX_COLOR: [f32; 4] = [0.753, 0.753, 0.753, 1.0];

/// Largest extent a mesh is scaled to by [`Mesh::fit_to_view`].
pub const FIT_EXTENT: f64 = 1.45;

/// A mesh vertex as uploaded to the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Object-space position.
    pub position: Point3,
    /// RGBA color.
    pub color: [f32; 4],
    /// Accumulated (not normalized) normal.
    pub normal: Vec3,
}

impl Vertex {
    /// Vertex at `position` with the default color and a zero normal.
    pub fn at(position: Point3) -> Self {
        Self {
            position,
            color: DEFAULT_VERTEX_COLOR,
            normal: Vec3::zeros(),
        }
    }
}

/// A triangle of a [`Mesh`], addressed through the mesh's index buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// Stable id; the value reported by a successful pick.
    pub id: u32,
    /// Position of the first of this triangle's three entries in
    /// [`Mesh::faces`].
    pub first_vertex_idx: usize,
    /// Mean of the three vertex positions.
    pub centroid: Point3,
}

/// Triangle mesh owning its vertex and index buffers.
///
/// Triangles, centroids and the bounding box are derived once at
/// construction; the buffers are immutable afterwards. Only the model
/// matrix (a rendering concern) can change.
#[derive(Debug, Clone)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    faces: Vec<u32>,
    triangles: Vec<Triangle>,
    bounding_box: Aabb,
    center: Point3,
    model_matrix: Transform,
}

impl Mesh {
    /// Build a mesh from a vertex buffer and a flat index buffer (one triple
    /// per triangle). Vertex normals are kept as supplied.
    pub fn new(vertices: Vec<Vertex>, faces: Vec<u32>) -> Result<Self> {
        validate(&vertices, &faces)?;
        Ok(Self::from_parts(vertices, faces))
    }

    /// Build a mesh from bare positions. Vertices get the default color and
    /// normals accumulated from the adjacent faces.
    pub fn from_positions(positions: Vec<Point3>, faces: Vec<u32>) -> Result<Self> {
        let vertices = positions.into_iter().map(Vertex::at).collect::<Vec<_>>();
        validate(&vertices, &faces)?;
        let mut mesh = Self::from_parts(vertices, faces);
        mesh.recompute_normals();
        Ok(mesh)
    }

    /// Mesh without vertices or triangles.
    pub fn empty() -> Self {
        Self::from_parts(Vec::new(), Vec::new())
    }

    /// Assemble a mesh from buffers already known to be consistent.
    pub(crate) fn from_parts(vertices: Vec<Vertex>, faces: Vec<u32>) -> Self {
        let bounding_box = Aabb::from_points(vertices.iter().map(|v| &v.position));
        let center = if vertices.is_empty() {
            Point3::origin()
        } else {
            let sum = vertices
                .iter()
                .fold(Vec3::zeros(), |acc, v| acc + v.position.coords);
            Point3::from(sum / vertices.len() as f64)
        };

        let mut mesh = Self {
            vertices,
            faces,
            triangles: Vec::new(),
            bounding_box,
            center,
            model_matrix: Transform::identity(),
        };
        let triangles = (0..mesh.faces.len() / 3)
            .map(|i| {
                let first_vertex_idx = 3 * i;
                let [p0, p1, p2] = mesh.positions_at(first_vertex_idx);
                Triangle {
                    id: i as u32,
                    first_vertex_idx,
                    centroid: Point3::from((p0.coords + p1.coords + p2.coords) / 3.0),
                }
            })
            .collect();
        mesh.triangles = triangles;
        mesh
    }

    /// Positions of the three vertices of `triangle`, resolved through the
    /// index buffer.
    pub fn get_triangle_vertices(&self, triangle: &Triangle) -> [Point3; 3] {
        self.positions_at(triangle.first_vertex_idx)
    }

    /// Positions of the three vertices of the triangle with id `id`.
    pub fn triangle_vertices(&self, id: u32) -> Option<[Point3; 3]> {
        self.triangle(id).map(|t| self.get_triangle_vertices(t))
    }

    /// Unnormalized face normal `(p1 - p0) x (p2 - p0)`.
    pub fn face_normal(&self, triangle: &Triangle) -> Vec3 {
        let [p0, p1, p2] = self.get_triangle_vertices(triangle);
        (p1 - p0).cross(&(p2 - p0))
    }

    fn positions_at(&self, first: usize) -> [Point3; 3] {
        let face = &self.faces[first..first + 3];
        [
            self.vertices[face[0] as usize].position,
            self.vertices[face[1] as usize].position,
            self.vertices[face[2] as usize].position,
        ]
    }

    /// Reset every vertex normal to the sum of its adjacent face normals.
    ///
    /// The sums are area-weighted and left unnormalized.
    pub fn recompute_normals(&mut self) {
        for v in &mut self.vertices {
            v.normal = Vec3::zeros();
        }
        for i in 0..self.triangles.len() {
            let normal = self.face_normal(&self.triangles[i]);
            let first = self.triangles[i].first_vertex_idx;
            for k in 0..3 {
                let idx = self.faces[first + k] as usize;
                self.vertices[idx].normal += normal;
            }
        }
    }

    /// Vertex buffer.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Flat index buffer.
    pub fn faces(&self) -> &[u32] {
        &self.faces
    }

    /// Triangles, indexed by id.
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Triangle with the given id.
    pub fn triangle(&self, id: u32) -> Option<&Triangle> {
        self.triangles.get(id as usize)
    }

    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// True when the mesh has no triangles.
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Bounding box of every vertex position.
    pub fn bounding_box(&self) -> &Aabb {
        &self.bounding_box
    }

    /// Mean vertex position.
    pub fn center(&self) -> Point3 {
        self.center
    }

    /// Object-to-world transform.
    pub fn model_matrix(&self) -> &Transform {
        &self.model_matrix
    }

    /// Replace the object-to-world transform.
    pub fn set_model_matrix(&mut self, model_matrix: Transform) -> &mut Self {
        self.model_matrix = model_matrix;
        self
    }

    /// Post-multiply a uniform scale onto the model matrix.
    pub fn scale(&mut self, s: f64) -> &mut Self {
        self.scale_xyz(s, s, s)
    }

    /// Post-multiply a non-uniform scale onto the model matrix.
    pub fn scale_xyz(&mut self, sx: f64, sy: f64, sz: f64) -> &mut Self {
        self.model_matrix = self.model_matrix.then(&Transform::scale(sx, sy, sz));
        self
    }

    /// Post-multiply a translation onto the model matrix.
    pub fn translate(&mut self, dx: f64, dy: f64, dz: f64) -> &mut Self {
        self.model_matrix = self.model_matrix.then(&Transform::translation(dx, dy, dz));
        self
    }

    /// Post-multiply a rotation of `degrees` about `axis` onto the model
    /// matrix. A zero axis leaves the matrix unchanged.
    pub fn rotate(&mut self, degrees: f64, axis: Vec3) -> &mut Self {
        if let Some(axis) = Dir3::try_new(axis, f64::EPSILON) {
            self.model_matrix = self
                .model_matrix
                .then(&Transform::rotation_about_axis(&axis, degrees.to_radians()));
        }
        self
    }

    /// Scale the largest extent to [`FIT_EXTENT`] and turn Z-up models Y-up.
    pub fn fit_to_view(&mut self) -> &mut Self {
        if self.bounding_box.is_empty() {
            return self;
        }
        let extent = self.bounding_box.extent();
        let largest = extent.x.max(extent.y).max(extent.z);
        if largest > 0.0 {
            self.scale(FIT_EXTENT / largest);
        }
        self.rotate(-90.0, Vec3::x())
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::empty()
    }
}

fn validate(vertices: &[Vertex], faces: &[u32]) -> Result<()> {
    if faces.len() % 3 != 0 {
        return Err(MeshError::IndexCount(faces.len()));
    }
    let triangle_count = faces.len() / 3;
    if u32::try_from(triangle_count).is_err() {
        return Err(MeshError::TooManyTriangles(triangle_count));
    }
    if let Some(pos) = faces.iter().position(|&i| i as usize >= vertices.len()) {
        return Err(MeshError::IndexOutOfRange {
            face: pos / 3,
            index: faces[pos],
            vertex_count: vertices.len(),
        });
    }
    Ok(())
}
