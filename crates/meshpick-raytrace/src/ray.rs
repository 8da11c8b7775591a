//! Ray representation and ray-primitive intersection tests.

use meshpick_math::{Dir3, Point3, Vec3};
use meshpick_mesh::{Aabb, Mesh, Triangle};

use crate::bvh::Bvh;

/// Tolerance for parallel and behind-the-origin rejections: machine epsilon
/// of the coordinate type.
pub const EPSILON: f64 = f64::EPSILON;

/// A ray in 3D space defined by origin and unit direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Origin point of the ray.
    pub origin: Point3,
    /// Unit direction of the ray.
    pub direction: Dir3,
}

/// Result of a ray-triangle intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    /// Distance along the ray to the hit point.
    pub t: f64,
    /// Barycentric weight of the second vertex.
    pub u: f64,
    /// Barycentric weight of the third vertex.
    pub v: f64,
}

impl Ray {
    /// Create a new ray from origin and direction.
    ///
    /// The direction will be normalized; it must not be zero.
    pub fn new(origin: Point3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: Dir3::new_normalize(direction),
        }
    }

    /// Like [`Ray::new`], but returns `None` for a (near) zero direction.
    pub fn try_new(origin: Point3, direction: Vec3) -> Option<Self> {
        Dir3::try_new(direction, EPSILON).map(|direction| Self { origin, direction })
    }

    /// Ray from `origin` aimed at `target`. `None` if the two coincide.
    pub fn through(origin: Point3, target: Point3) -> Option<Self> {
        Self::try_new(origin, target - origin)
    }

    /// Evaluate the ray at parameter `t`: `origin + t * direction`.
    #[inline]
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + t * self.direction.as_ref()
    }

    /// Moller-Trumbore ray-triangle intersection.
    ///
    /// Hits only in front of the origin (`t > EPSILON`). Rays parallel to
    /// the triangle plane and degenerate triangles never hit.
    pub fn intersect_triangle(&self, vertices: &[Point3; 3]) -> Option<TriangleHit> {
        let [p0, p1, p2] = vertices;
        let dir = self.direction.as_ref();
        let e1 = p1 - p0;
        let e2 = p2 - p0;

        let h = dir.cross(&e2);
        let det = e1.dot(&h);
        if det.abs() < EPSILON {
            return None;
        }

        let inv_det = 1.0 / det;
        let s = self.origin - p0;
        let u = inv_det * s.dot(&h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(&e1);
        let v = inv_det * dir.dot(&q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = inv_det * q.dot(&e2);
        (t > EPSILON).then_some(TriangleHit { t, u, v })
    }

    /// Intersect with a triangle of `mesh`, resolving its vertices through
    /// the index buffer.
    pub fn intersect_mesh_triangle(&self, mesh: &Mesh, triangle: &Triangle) -> Option<TriangleHit> {
        self.intersect_triangle(&mesh.get_triangle_vertices(triangle))
    }

    /// Slab test against an axis-aligned box.
    ///
    /// Returns the entry distance, clamped to 0 when the origin is inside.
    /// Axes the ray runs parallel to only constrain the origin. An interval
    /// that shrinks to a single point still counts, so flat boxes (planar
    /// geometry seen face-on) are hit.
    pub fn intersect_aabb(&self, aabb: &Aabb) -> Option<f64> {
        let mut t_near = 0.0_f64;
        let mut t_far = f64::MAX;

        for i in 0..3 {
            let o = self.origin[i];
            let d = self.direction[i];

            if d.abs() < EPSILON {
                if o < aabb.min[i] || o > aabb.max[i] {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / d;
            let mut near = inv * (aabb.min[i] - o);
            let mut far = inv * (aabb.max[i] - o);
            if near > far {
                std::mem::swap(&mut near, &mut far);
            }

            t_near = t_near.max(near);
            t_far = t_far.min(far);
            if t_far < t_near {
                return None;
            }
        }

        Some(t_near)
    }

    /// Branch-free variant of [`Ray::intersect_aabb`] working on whole
    /// vectors.
    ///
    /// Near-zero direction components use `f64::MAX` as their reciprocal.
    pub fn intersect_aabb_vectorized(&self, aabb: &Aabb) -> Option<f64> {
        let inv_dir = self
            .direction
            .into_inner()
            .map(|d| if d.abs() < EPSILON { f64::MAX } else { 1.0 / d });

        let near = (aabb.min - self.origin).component_mul(&inv_dir);
        let far = (aabb.max - self.origin).component_mul(&inv_dir);

        let t_near = near.inf(&far).max().max(0.0);
        let t_far = near.sup(&far).min().min(f64::MAX);

        (t_near <= t_far).then_some(t_near)
    }

    /// Entry distance to `aabb`, or `f64::INFINITY` on a miss.
    pub fn dist_to_aabb(&self, aabb: &Aabb) -> f64 {
        self.intersect_aabb(aabb).unwrap_or(f64::INFINITY)
    }

    /// First-hit BVH query; see [`Bvh::pick`].
    pub fn intersect_bvh(&self, bvh: &Bvh) -> Option<u32> {
        bvh.pick(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn unit_triangle() -> [Point3; 3] {
        [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]
    }

    fn unit_box() -> Aabb {
        Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0))
    }

    fn random_point(rng: &mut StdRng, range: f64) -> Point3 {
        Point3::new(
            rng.random_range(-range..range),
            rng.random_range(-range..range),
            rng.random_range(-range..range),
        )
    }

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Point3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 3.0, 0.0));
        let p = ray.at(2.0);
        assert_relative_eq!(p.x, 1.0);
        assert_relative_eq!(p.y, 2.0);
        assert_relative_eq!(ray.direction.norm(), 1.0);
    }

    #[test]
    fn test_zero_direction() {
        assert!(Ray::try_new(Point3::origin(), Vec3::zeros()).is_none());
        assert!(Ray::through(Point3::origin(), Point3::origin()).is_none());
    }

    #[test]
    fn test_unit_triangle_hit() {
        let ray = Ray::through(Point3::new(0.2, 0.2, 1.0), Point3::new(0.2, 0.2, -1.0)).unwrap();
        let hit = ray.intersect_triangle(&unit_triangle()).unwrap();
        assert_relative_eq!(hit.t, 1.0, epsilon = 1e-12);
        assert_relative_eq!(hit.u, 0.2, epsilon = 1e-12);
        assert_relative_eq!(hit.v, 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_unit_triangle_miss() {
        let ray = Ray::through(Point3::new(5.0, 5.0, 1.0), Point3::new(5.0, 5.0, -1.0)).unwrap();
        assert!(ray.intersect_triangle(&unit_triangle()).is_none());
    }

    #[test]
    fn test_triangle_behind_origin() {
        let ray = Ray::new(Point3::new(0.2, 0.2, 1.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(ray.intersect_triangle(&unit_triangle()).is_none());
    }

    #[test]
    fn test_ray_parallel_to_triangle_never_hits() {
        // In the plane of the triangle and passing straight through it.
        let ray = Ray::new(Point3::new(-1.0, 0.2, 0.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(ray.intersect_triangle(&unit_triangle()).is_none());
        // Above the plane.
        let ray = Ray::new(Point3::new(-1.0, 0.2, 0.5), Vec3::new(1.0, 0.3, 0.0));
        assert!(ray.intersect_triangle(&unit_triangle()).is_none());
    }

    #[test]
    fn test_degenerate_triangle_never_hits() {
        let tri = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let ray = Ray::new(Point3::new(0.5, 0.0, 1.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(ray.intersect_triangle(&tri).is_none());
    }

    #[test]
    fn test_barycentric_coordinates_recovered() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut checked = 0;
        while checked < 500 {
            let tri = [
                random_point(&mut rng, 10.0),
                random_point(&mut rng, 10.0),
                random_point(&mut rng, 10.0),
            ];
            let e1 = tri[1] - tri[0];
            let e2 = tri[2] - tri[0];
            let normal = e1.cross(&e2);
            if normal.norm() < 1.0 {
                continue;
            }

            let mut u = rng.random_range(0.05..0.9);
            let mut v = rng.random_range(0.05..0.9);
            if u + v > 0.95 {
                u = 0.95 - u;
                v = 0.95 - v;
            }
            if u < 0.05 || v < 0.05 {
                continue;
            }
            let target = tri[0] + u * e1 + v * e2;

            // Start off the plane on either side.
            let side = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
            let offset = normal.normalize() * side * rng.random_range(0.5..5.0)
                + random_point(&mut rng, 2.0).coords;
            let origin = target + offset;
            if offset.normalize().dot(&normal.normalize()).abs() < 0.1 {
                continue;
            }

            let ray = Ray::through(origin, target).unwrap();
            let hit = ray.intersect_triangle(&tri).unwrap();
            assert_relative_eq!(hit.u, u, epsilon = 1e-6);
            assert_relative_eq!(hit.v, v, epsilon = 1e-6);
            assert_relative_eq!(hit.t, offset.norm(), epsilon = 1e-6);
            checked += 1;
        }
    }

    #[test]
    fn test_mesh_triangle_uses_index_buffer() {
        let positions = vec![
            Point3::new(5.0, 5.0, 5.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
        ];
        let mesh = Mesh::from_positions(positions, vec![2, 3, 1]).unwrap();
        let ray = Ray::new(Point3::new(0.25, 0.25, 1.0), Vec3::new(0.0, 0.0, -1.0));
        let hit = ray.intersect_mesh_triangle(&mesh, &mesh.triangles()[0]).unwrap();
        assert_relative_eq!(hit.u, 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_ray_aabb_hit() {
        let ray = Ray::new(Point3::new(-5.0, 0.5, 0.5), Vec3::new(1.0, 0.0, 0.0));
        let t = ray.intersect_aabb(&unit_box()).unwrap();
        assert_relative_eq!(t, 5.0, epsilon = 1e-10);
        assert_relative_eq!(ray.dist_to_aabb(&unit_box()), 5.0, epsilon = 1e-10);
    }

    #[test]
    fn test_ray_aabb_pointing_away() {
        let ray = Ray::new(Point3::new(-5.0, 0.5, 0.5), Vec3::new(-1.0, 0.0, 0.0));
        assert!(ray.intersect_aabb(&unit_box()).is_none());
        assert!(ray.intersect_aabb_vectorized(&unit_box()).is_none());
        assert_eq!(ray.dist_to_aabb(&unit_box()), f64::INFINITY);
    }

    #[test]
    fn test_ray_parallel_outside_slab() {
        let ray = Ray::new(Point3::new(-5.0, 5.0, 0.5), Vec3::new(1.0, 0.0, 0.0));
        assert!(ray.intersect_aabb(&unit_box()).is_none());
        assert!(ray.intersect_aabb_vectorized(&unit_box()).is_none());
    }

    #[test]
    fn test_ray_inside_aabb() {
        let ray = Ray::new(Point3::new(0.5, 0.5, 0.5), Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(ray.intersect_aabb(&unit_box()), Some(0.0));
        assert_eq!(ray.intersect_aabb_vectorized(&unit_box()), Some(0.0));
    }

    #[test]
    fn test_flat_box_hit_face_on() {
        let flat = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.0));
        let ray = Ray::new(Point3::new(0.2, 0.2, 1.0), Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(ray.intersect_aabb(&flat), Some(1.0));
        assert_eq!(ray.intersect_aabb_vectorized(&flat), Some(1.0));
    }

    #[test]
    fn test_scalar_and_vectorized_aabb_agree() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut hits = 0;
        for _ in 0..10_000 {
            let a = random_point(&mut rng, 5.0);
            let b = random_point(&mut rng, 5.0);
            let aabb = Aabb::from_points(&[a, b]);
            let origin = random_point(&mut rng, 10.0);
            let ray = match Ray::try_new(origin, random_point(&mut rng, 1.0).coords) {
                Some(ray) => ray,
                None => continue,
            };

            let scalar = ray.intersect_aabb(&aabb);
            let vectorized = ray.intersect_aabb_vectorized(&aabb);
            assert_eq!(scalar.is_some(), vectorized.is_some(), "{ray:?} {aabb:?}");
            if let (Some(s), Some(v)) = (scalar, vectorized) {
                assert_relative_eq!(s, v, epsilon = 1e-9);
                hits += 1;
            }
        }
        // Both outcomes are exercised.
        assert!(hits > 100);
        assert!(hits < 10_000);
    }
}
