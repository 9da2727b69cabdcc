//! Static 3-d kd-tree for nearest-point queries.
//!
//! The tree is stored implicitly: for every index range the median element
//! is the node, the lower half its left subtree and the upper half its right
//! subtree. Split axes cycle x, y, z with depth.

use glam::Vec3;
use std::cmp::Ordering;

#[derive(Debug, Clone, Default)]
pub struct KdTree {
    points: Vec<Vec3>,
    order: Vec<u32>,
}

impl KdTree {
    pub fn build(points: Vec<Vec3>) -> Self {
        let mut order: Vec<u32> = (0..points.len() as u32).collect();
        build_node(&points, &mut order, 0);
        Self { points, order }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, index: usize) -> Vec3 {
        self.points[index]
    }

    /// Index of and distance to the closest point
    ///
    /// Equidistant points resolve to the lowest index, so results agree
    /// with a linear scan.
    pub fn nearest(&self, query: Vec3) -> Option<(usize, f32)> {
        let mut best: Option<(u32, f32)> = None;
        self.search(0, self.order.len(), 0, query, &mut best);
        best.map(|(index, distance_sq)| (index as usize, distance_sq.sqrt()))
    }

    fn search(&self, lo: usize, hi: usize, depth: usize, query: Vec3, best: &mut Option<(u32, f32)>) {
        if lo >= hi {
            return;
        }
        let mid = lo + (hi - lo) / 2;
        let index = self.order[mid];
        let point = self.points[index as usize];

        let distance_sq = point.distance_squared(query);
        if closer(distance_sq, index, *best) {
            *best = Some((index, distance_sq));
        }

        let axis = depth % 3;
        let diff = query[axis] - point[axis];
        let (near, far) = if diff < 0.0 {
            ((lo, mid), (mid + 1, hi))
        } else {
            ((mid + 1, hi), (lo, mid))
        };

        self.search(near.0, near.1, depth + 1, query, best);
        // Equal distances still need the far side for the index tie-break
        if best.map_or(true, |(_, d)| diff * diff <= d) {
            self.search(far.0, far.1, depth + 1, query, best);
        }
    }
}

fn closer(distance_sq: f32, index: u32, best: Option<(u32, f32)>) -> bool {
    match best {
        None => true,
        Some((best_index, best_sq)) => match distance_sq.total_cmp(&best_sq) {
            Ordering::Less => true,
            Ordering::Equal => index < best_index,
            Ordering::Greater => false,
        },
    }
}

fn build_node(points: &[Vec3], order: &mut [u32], depth: usize) {
    if order.len() <= 1 {
        return;
    }
    let axis = depth % 3;
    let mid = order.len() / 2;
    order.select_nth_unstable_by(mid, |&a, &b| {
        points[a as usize][axis]
            .total_cmp(&points[b as usize][axis])
            .then(a.cmp(&b))
    });

    let (left, rest) = order.split_at_mut(mid);
    build_node(points, left, depth + 1);
    build_node(points, &mut rest[1..], depth + 1);
}
