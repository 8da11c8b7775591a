#![warn(missing_docs)]

//! Math types for meshpick.
//!
//! Thin wrappers around nalgebra providing the point, vector and matrix
//! types shared by the mesh, ray tracing and viewer crates, plus the
//! viewing transforms (perspective, look-at) and the window-space
//! projection used to turn a cursor position into a picking ray.

use nalgebra::{Matrix4, Unit, Vector3, Vector4};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// A point in window space (pixels).
pub type Point2 = nalgebra::Point2<f64>;

/// A 4x4 homogeneous transformation matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// The underlying 4x4 matrix.
    pub matrix: Matrix4<f64>,
}

impl Transform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Translation by `(dx, dy, dz)`.
    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 3)] = dx;
        m[(1, 3)] = dy;
        m[(2, 3)] = dz;
        Self { matrix: m }
    }

    /// Non-uniform scale by `(sx, sy, sz)`.
    pub fn scale(sx: f64, sy: f64, sz: f64) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 0)] = sx;
        m[(1, 1)] = sy;
        m[(2, 2)] = sz;
        Self { matrix: m }
    }

    /// Rotation about the X axis by `angle` radians.
    pub fn rotation_x(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Matrix4::identity();
        m[(1, 1)] = c;
        m[(1, 2)] = -s;
        m[(2, 1)] = s;
        m[(2, 2)] = c;
        Self { matrix: m }
    }

    /// Rotation about the Y axis by `angle` radians.
    pub fn rotation_y(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Matrix4::identity();
        m[(0, 0)] = c;
        m[(0, 2)] = s;
        m[(2, 0)] = -s;
        m[(2, 2)] = c;
        Self { matrix: m }
    }

    /// Rotation about an arbitrary axis through the origin by `angle` radians.
    ///
    /// Uses Rodrigues' rotation formula.
    pub fn rotation_about_axis(axis: &Dir3, angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        let t = 1.0 - c;
        let (x, y, z) = (axis.x, axis.y, axis.z);
        let mut m = Matrix4::identity();
        m[(0, 0)] = t * x * x + c;
        m[(0, 1)] = t * x * y - s * z;
        m[(0, 2)] = t * x * z + s * y;
        m[(1, 0)] = t * x * y + s * z;
        m[(1, 1)] = t * y * y + c;
        m[(1, 2)] = t * y * z - s * x;
        m[(2, 0)] = t * x * z - s * y;
        m[(2, 1)] = t * y * z + s * x;
        m[(2, 2)] = t * z * z + c;
        Self { matrix: m }
    }

    /// Right-handed perspective projection with OpenGL clip conventions
    /// (window depth 0 maps to the near plane, 1 to the far plane).
    ///
    /// `fovy_degrees` is the vertical field of view.
    pub fn perspective(fovy_degrees: f64, aspect: f64, znear: f64, zfar: f64) -> Self {
        Self {
            matrix: Matrix4::new_perspective(aspect, fovy_degrees.to_radians(), znear, zfar),
        }
    }

    /// Right-handed view matrix looking from `eye` towards `target`.
    pub fn look_at(eye: &Point3, target: &Point3, up: &Vec3) -> Self {
        Self {
            matrix: Matrix4::look_at_rh(eye, target, up),
        }
    }

    /// Compose: `self` then `other` (self * other).
    ///
    /// Applying the result to a point applies `other` first.
    pub fn then(&self, other: &Transform) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Transform a point.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        let v = self.matrix * Vector4::new(p.x, p.y, p.z, 1.0);
        Point3::new(v.x, v.y, v.z)
    }

    /// Transform a direction vector (ignores translation).
    pub fn apply_vec(&self, v: &Vec3) -> Vec3 {
        let r = self.matrix * Vector4::new(v.x, v.y, v.z, 0.0);
        Vec3::new(r.x, r.y, r.z)
    }

    /// Inverse of this transform, if it exists.
    pub fn inverse(&self) -> Option<Self> {
        self.matrix.try_inverse().map(|matrix| Self { matrix })
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Window-space rectangle that normalized device coordinates map onto.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Left edge in pixels.
    pub x: f64,
    /// Bottom edge in pixels.
    pub y: f64,
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Viewport {
    /// Viewport anchored at the origin with the given size.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
        }
    }

    /// Width over height. Returns 1.0 for a zero-height viewport.
    pub fn aspect(&self) -> f64 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }

    /// True when both dimensions are positive.
    pub fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Map an object-space point to window coordinates.
///
/// The returned `z` is the window depth in `[0, 1]` for points between the
/// clip planes. Returns `None` when the point lies on the camera plane
/// (clip `w == 0`) or the viewport is empty.
pub fn project(
    point: &Point3,
    view_model: &Transform,
    proj: &Transform,
    viewport: &Viewport,
) -> Option<Point3> {
    if !viewport.is_valid() {
        return None;
    }
    let clip = proj.matrix * view_model.matrix * Vector4::new(point.x, point.y, point.z, 1.0);
    if clip.w.abs() < f64::EPSILON {
        return None;
    }
    let ndc = clip.xyz() / clip.w;
    Some(Point3::new(
        viewport.x + (ndc.x * 0.5 + 0.5) * viewport.width,
        viewport.y + (ndc.y * 0.5 + 0.5) * viewport.height,
        ndc.z * 0.5 + 0.5,
    ))
}

/// Map window coordinates (with depth in `[0, 1]`) back to object space
/// through `inverse(proj * view_model)`.
///
/// Returns `None` when the combined matrix is singular, the homogeneous
/// result lies at infinity, or the viewport is empty.
pub fn unproject(
    window: &Point3,
    view_model: &Transform,
    proj: &Transform,
    viewport: &Viewport,
) -> Option<Point3> {
    if !viewport.is_valid() {
        return None;
    }
    let inverse = proj.then(view_model).inverse()?;
    let ndc = Vector4::new(
        (window.x - viewport.x) / viewport.width * 2.0 - 1.0,
        (window.y - viewport.y) / viewport.height * 2.0 - 1.0,
        window.z * 2.0 - 1.0,
        1.0,
    );
    let obj = inverse.matrix * ndc;
    if obj.w.abs() < f64::EPSILON {
        return None;
    }
    Some(Point3::new(obj.x / obj.w, obj.y / obj.w, obj.z / obj.w))
}
