#![warn(missing_docs)]

//! Ray casting and BVH-accelerated triangle picking.
//!
//! Given a cursor position and the current camera and projection, this
//! crate finds which triangle of a [`Mesh`](meshpick_mesh::Mesh) lies under
//! the cursor without testing every triangle.
//!
//! # Architecture
//!
//! - [`Ray`] - Origin and unit direction, with triangle and box tests
//! - [`Bvh`] - Flat bounding volume hierarchy built once per mesh
//! - [`mouse_to_object_space`] / [`check_intersection`] - Cursor to ray to
//!   triangle id
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use meshpick_math::{Point3, Vec3};
//! use meshpick_mesh::primitives;
//! use meshpick_raytrace::{Bvh, Ray};
//!
//! let bvh = Bvh::build(Arc::new(primitives::cube(2.0)));
//! let ray = Ray::new(Point3::new(0.1, 0.2, 5.0), Vec3::new(0.0, 0.0, -1.0));
//! let hit = bvh.pick_nearest(&ray).unwrap();
//! assert!((hit.t - 4.0).abs() < 1e-12);
//! ```

pub mod bvh;
mod pick;
mod ray;

pub use bvh::{Bvh, BvhNode, BvhStats, PickHit, TraversalStats};
pub use pick::{check_intersection, check_intersection_with_mode, mouse_to_object_space, PickMode};
pub use ray::{Ray, TriangleHit, EPSILON};
