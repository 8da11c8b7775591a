//! Cursor-to-triangle picking.

use meshpick_math::{unproject, Point2, Point3, Transform, Viewport};
use serde::{Deserialize, Serialize};

use crate::bvh::Bvh;
use crate::Ray;

/// How a pick resolves a ray that crosses several triangles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PickMode {
    /// First triangle found by a left-first walk. Cheapest, but may report
    /// a triangle behind another one.
    #[default]
    FirstHit,
    /// Closest triangle along the ray.
    Nearest,
}

impl std::fmt::Display for PickMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PickMode::FirstHit => write!(f, "first-hit"),
            PickMode::Nearest => write!(f, "nearest"),
        }
    }
}

/// Turn a cursor position (window pixels, origin top-left) into an
/// object-space ray.
///
/// The cursor is unprojected at window depth 0 and 1 through
/// `inverse(proj * view_model)`; the ray starts on the near plane and points
/// at the far one. Its direction is normalized, so hit distances are in
/// object-space units. Returns `None` for an empty viewport or a singular
/// transform.
pub fn mouse_to_object_space(
    mouse: &Point2,
    viewport: &Viewport,
    view_model: &Transform,
    proj: &Transform,
) -> Option<Ray> {
    let y = viewport.height - mouse.y;
    let near = unproject(&Point3::new(mouse.x, y, 0.0), view_model, proj, viewport)?;
    let far = unproject(&Point3::new(mouse.x, y, 1.0), view_model, proj, viewport)?;
    Ray::through(near, far)
}

/// Id of the triangle under the cursor, first-hit traversal.
///
/// `view` is the camera matrix; the mesh's own model matrix is applied on
/// top of it.
pub fn check_intersection(
    mouse: &Point2,
    viewport: &Viewport,
    bvh: &Bvh,
    view: &Transform,
    proj: &Transform,
) -> Option<u32> {
    check_intersection_with_mode(mouse, viewport, bvh, view, proj, PickMode::FirstHit)
}

/// [`check_intersection`] with an explicit [`PickMode`].
pub fn check_intersection_with_mode(
    mouse: &Point2,
    viewport: &Viewport,
    bvh: &Bvh,
    view: &Transform,
    proj: &Transform,
    mode: PickMode,
) -> Option<u32> {
    let view_model = view.then(bvh.mesh().model_matrix());
    let ray = mouse_to_object_space(mouse, viewport, &view_model, proj)?;
    bvh.pick_with_mode(&ray, mode)
}
