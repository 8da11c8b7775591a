//! Bounding Volume Hierarchy over the triangles of a mesh.
//!
//! Nodes live in a flat array sized `2n - 1` up front. Each node owns a
//! contiguous slice of the `tris` permutation; a split partitions that slice
//! in place around the midpoint of the node's longest axis, using triangle
//! centroids as keys.

use std::sync::Arc;
use std::time::Instant;

use meshpick_mesh::{Aabb, Mesh};
use serde::Serialize;

use crate::pick::PickMode;
use crate::Ray;

/// Largest number of triangles kept in a leaf.
pub const MAX_LEAF_SIZE: u32 = 2;

/// A node of the flattened hierarchy.
///
/// Internal nodes have `prim_count == 0` and children at `left` and
/// `left + 1`. Leaves have `prim_count > 0` and own
/// `tris[first_prim_idx..first_prim_idx + prim_count]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BvhNode {
    /// Bounds of every triangle below this node.
    pub aabb: Aabb,
    /// Index of the left child; the right child follows it.
    pub left: u32,
    /// Start of this leaf's slice of [`Bvh::tris`].
    pub first_prim_idx: u32,
    /// Number of triangles in this leaf, 0 for internal nodes.
    pub prim_count: u32,
}

impl BvhNode {
    /// True for nodes that hold triangles directly.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.prim_count > 0
    }

    /// Index of the right child of an internal node.
    #[inline]
    pub fn right(&self) -> u32 {
        self.left + 1
    }

    fn prims(&self) -> std::ops::Range<usize> {
        let first = self.first_prim_idx as usize;
        first..first + self.prim_count as usize
    }
}

impl Default for BvhNode {
    fn default() -> Self {
        Self {
            aabb: Aabb::empty(),
            left: 0,
            first_prim_idx: 0,
            prim_count: 0,
        }
    }
}

/// Counters filled in by [`Bvh::pick_with_stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalStats {
    /// Nodes whose box was tested against the ray.
    pub nodes_visited: usize,
    /// Ray-triangle tests performed.
    pub triangles_tested: usize,
}

/// Shape summary of a built hierarchy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BvhStats {
    /// Triangles indexed.
    pub triangle_count: usize,
    /// Nodes in use.
    pub node_count: usize,
    /// Leaves among them.
    pub leaf_count: usize,
    /// Depth of the deepest leaf, the root being depth 0.
    pub max_depth: usize,
    /// Largest leaf.
    pub max_leaf_size: usize,
    /// Average triangles per leaf.
    pub mean_leaf_size: f64,
}

/// Result of a nearest-hit query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    /// Id of the triangle hit.
    pub triangle_id: u32,
    /// Distance along the ray.
    pub t: f64,
}

/// Bounding Volume Hierarchy for accelerated ray-mesh picking.
///
/// Holds a shared handle to the mesh it was built from; a different mesh
/// needs a new hierarchy.
#[derive(Debug, Clone)]
pub struct Bvh {
    mesh: Arc<Mesh>,
    nodes: Vec<BvhNode>,
    tris: Vec<u32>,
}

impl Bvh {
    /// Build the hierarchy over every triangle of `mesh`.
    ///
    /// An empty mesh yields a hierarchy without nodes that never hits.
    pub fn build(mesh: Arc<Mesh>) -> Self {
        let start = Instant::now();
        let n = mesh.num_triangles();
        let mut tris: Vec<u32> = (0..n as u32).collect();

        if n == 0 {
            log::debug!("BVH over empty mesh");
            return Self {
                mesh,
                nodes: Vec::new(),
                tris,
            };
        }

        let mut nodes = vec![BvhNode::default(); 2 * n - 1];
        nodes[0] = BvhNode {
            aabb: *mesh.bounding_box(),
            left: 0,
            first_prim_idx: 0,
            prim_count: n as u32,
        };
        let mut nodes_used = 1;

        let mut stack = vec![0usize];
        while let Some(idx) = stack.pop() {
            let node = nodes[idx];
            if node.prim_count <= MAX_LEAF_SIZE {
                continue;
            }

            let axis = node.aabb.longest_axis();
            let split = node.aabb.min[axis] + node.aabb.extent()[axis] * 0.5;
            let range = node.prims();
            let left_count = partition(&mesh, &mut tris[range.clone()], axis, split);

            if left_count == 0 || left_count == range.len() {
                log::trace!(
                    "degenerate split at node {idx} ({} triangles), keeping leaf",
                    node.prim_count
                );
                continue;
            }

            let left = nodes_used;
            nodes_used += 2;

            let (left_range, right_range) = (
                range.start..range.start + left_count,
                range.start + left_count..range.end,
            );
            nodes[left] = BvhNode {
                aabb: bounds(&mesh, &tris[left_range.clone()]),
                left: 0,
                first_prim_idx: left_range.start as u32,
                prim_count: left_range.len() as u32,
            };
            nodes[left + 1] = BvhNode {
                aabb: bounds(&mesh, &tris[right_range.clone()]),
                left: 0,
                first_prim_idx: right_range.start as u32,
                prim_count: right_range.len() as u32,
            };
            nodes[idx].left = left as u32;
            nodes[idx].prim_count = 0;

            stack.push(left + 1);
            stack.push(left);
        }

        nodes.truncate(nodes_used);
        let bvh = Self { mesh, nodes, tris };
        log::debug!(
            "built BVH: {} triangles, {} nodes in {:.2?}",
            n,
            bvh.nodes.len(),
            start.elapsed()
        );
        bvh
    }

    /// First-hit pick: the first triangle found in a left-before-right
    /// depth-first walk, not necessarily the closest.
    pub fn pick(&self, ray: &Ray) -> Option<u32> {
        self.pick_with_stats(ray, &mut TraversalStats::default())
    }

    /// [`Bvh::pick`], counting the work done into `stats`.
    pub fn pick_with_stats(&self, ray: &Ray, stats: &mut TraversalStats) -> Option<u32> {
        if self.nodes.is_empty() {
            return None;
        }
        let triangles = self.mesh.triangles();

        let mut stack = vec![0usize];
        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx];
            stats.nodes_visited += 1;
            if ray.intersect_aabb(&node.aabb).is_none() {
                continue;
            }

            if node.is_leaf() {
                for &tri in &self.tris[node.prims()] {
                    stats.triangles_tested += 1;
                    let triangle = &triangles[tri as usize];
                    if ray.intersect_mesh_triangle(&self.mesh, triangle).is_some() {
                        return Some(triangle.id);
                    }
                }
            } else {
                stack.push(node.right() as usize);
                stack.push(node.left as usize);
            }
        }
        None
    }

    /// Closest triangle along the ray.
    ///
    /// Children are visited nearest box first and subtrees whose entry
    /// distance is beyond the best hit so far are skipped.
    pub fn pick_nearest(&self, ray: &Ray) -> Option<PickHit> {
        self.pick_nearest_with_stats(ray, &mut TraversalStats::default())
    }

    /// [`Bvh::pick_nearest`], counting the work done into `stats`.
    pub fn pick_nearest_with_stats(
        &self,
        ray: &Ray,
        stats: &mut TraversalStats,
    ) -> Option<PickHit> {
        let root = self.nodes.first()?;
        stats.nodes_visited += 1;
        let root_t = ray.intersect_aabb(&root.aabb)?;
        let triangles = self.mesh.triangles();

        let mut best: Option<PickHit> = None;
        let mut best_t = f64::INFINITY;

        // (node, entry distance)
        let mut stack = vec![(0usize, root_t)];
        while let Some((idx, entry)) = stack.pop() {
            if entry >= best_t {
                continue;
            }
            let node = &self.nodes[idx];

            if node.is_leaf() {
                for &tri in &self.tris[node.prims()] {
                    stats.triangles_tested += 1;
                    let triangle = &triangles[tri as usize];
                    if let Some(hit) = ray.intersect_mesh_triangle(&self.mesh, triangle) {
                        if hit.t < best_t {
                            best_t = hit.t;
                            best = Some(PickHit {
                                triangle_id: triangle.id,
                                t: hit.t,
                            });
                        }
                    }
                }
                continue;
            }

            let left = node.left as usize;
            let right = node.right() as usize;
            stats.nodes_visited += 2;
            let left_t = ray.intersect_aabb(&self.nodes[left].aabb);
            let right_t = ray.intersect_aabb(&self.nodes[right].aabb);

            // Push the farther child first so the nearer one pops first.
            match (left_t, right_t) {
                (Some(lt), Some(rt)) => {
                    if lt < rt {
                        stack.push((right, rt));
                        stack.push((left, lt));
                    } else {
                        stack.push((left, lt));
                        stack.push((right, rt));
                    }
                }
                (Some(lt), None) => stack.push((left, lt)),
                (None, Some(rt)) => stack.push((right, rt)),
                (None, None) => {}
            }
        }
        best
    }

    /// Pick in the given mode, returning only the triangle id.
    pub fn pick_with_mode(&self, ray: &Ray, mode: PickMode) -> Option<u32> {
        match mode {
            PickMode::FirstHit => self.pick(ray),
            PickMode::Nearest => self.pick_nearest(ray).map(|hit| hit.triangle_id),
        }
    }

    /// The mesh this hierarchy indexes.
    pub fn mesh(&self) -> &Arc<Mesh> {
        &self.mesh
    }

    /// Nodes in use, root first.
    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    /// Triangle id permutation; leaves refer to slices of it.
    pub fn tris(&self) -> &[u32] {
        &self.tris
    }

    /// Collect shape statistics.
    pub fn stats(&self) -> BvhStats {
        let mut stats = BvhStats {
            triangle_count: self.tris.len(),
            node_count: self.nodes.len(),
            ..BvhStats::default()
        };
        if self.nodes.is_empty() {
            return stats;
        }

        let mut total = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((idx, depth)) = stack.pop() {
            let node = &self.nodes[idx];
            if node.is_leaf() {
                let size = node.prim_count as usize;
                stats.leaf_count += 1;
                stats.max_depth = stats.max_depth.max(depth);
                stats.max_leaf_size = stats.max_leaf_size.max(size);
                total += size;
            } else {
                stack.push((node.left as usize, depth + 1));
                stack.push((node.right() as usize, depth + 1));
            }
        }
        stats.mean_leaf_size = total as f64 / stats.leaf_count as f64;
        stats
    }
}

/// Two-ended in-place partition: triangles whose centroid lies below
/// `split` on `axis` move to the front. Returns how many did.
fn partition(mesh: &Mesh, tris: &mut [u32], axis: usize, split: f64) -> usize {
    let triangles = mesh.triangles();
    let mut i = 0;
    let mut j = tris.len();
    while i < j {
        if triangles[tris[i] as usize].centroid[axis] < split {
            i += 1;
        } else {
            j -= 1;
            tris.swap(i, j);
        }
    }
    i
}

/// Tight box around the vertices of the given triangles.
fn bounds(mesh: &Mesh, tris: &[u32]) -> Aabb {
    let triangles = mesh.triangles();
    let mut aabb = Aabb::empty();
    for &tri in tris {
        for p in &mesh.get_triangle_vertices(&triangles[tri as usize]) {
            aabb.include_point(p);
        }
    }
    aabb
}
