//! Bounding volume hierarchy over triangles, built with the binned surface
//! area heuristic

use crate::ray::Ray;
use msgview_core::{BoundingBox, Point3f, Vector3f};

const BUCKET_COUNT: usize = 12;
const RELATIVE_TRAVERSAL_COST: f32 = 1.2;
const MIN_TRIS_IN_LEAF: usize = 2;
const MAX_TRIS_IN_LEAF: usize = 255;

pub struct BoundingVolumeHierarchy {
    root: Node,
    depth: usize,
    leaf_count: usize,
}

enum Node {
    Leaf {
        indices: Vec<u32>,
        bounds: BoundingBox,
    },
    Inner {
        left: Box<Node>,
        right: Box<Node>,
        bounds: BoundingBox,
    },
}

impl Node {
    fn bounds(&self) -> &BoundingBox {
        match self {
            Node::Inner { bounds, .. } => bounds,
            Node::Leaf { bounds, .. } => bounds,
        }
    }
}

/// Closest hit found while traversing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BvhHit {
    pub index: u32,
    pub t: f32,
    pub u: f32,
    pub v: f32,
}

/// Primitive storage the hierarchy refers into by index
pub trait Primitives {
    fn intersect(&self, index: u32, ray: &Ray) -> Option<(f32, f32, f32)>;
}

/// Entry distance of `ray` into `bounds`, or `None` when it misses within
/// the ray's `[t_min, t_max]` range
pub fn intersect_box(bounds: &BoundingBox, ray: &Ray, inv_dir: &Vector3f) -> Option<f32> {
    let t0 = (bounds.min - ray.origin).component_mul(inv_dir);
    let t1 = (bounds.max - ray.origin).component_mul(inv_dir);

    let mut t_enter = ray.t_min;
    let mut t_exit = ray.t_max;
    for axis in 0..3 {
        t_enter = t_enter.max(t0[axis].min(t1[axis]));
        t_exit = t_exit.min(t0[axis].max(t1[axis]));
    }

    (t_enter <= t_exit).then_some(t_enter)
}

impl BoundingVolumeHierarchy {
    pub fn new(primitive_bounds: &[BoundingBox]) -> Self {
        let indices = (0..primitive_bounds.len() as u32).collect();
        let mut stats = BuildStats::default();
        let root = create_node(primitive_bounds, indices, 0, &mut stats);

        BoundingVolumeHierarchy {
            root,
            depth: stats.max_depth,
            leaf_count: stats.leaf_count,
        }
    }

    pub fn bounds(&self) -> &BoundingBox {
        self.root.bounds()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Find the closest primitive hit along `ray`
    pub fn intersect<P: Primitives>(&self, ray: &Ray, primitives: &P) -> Option<BvhHit> {
        let inv_dir = ray.direction.map(|d| 1.0 / d);
        let mut ray = *ray;
        let mut closest = None;

        if intersect_box(self.root.bounds(), &ray, &inv_dir).is_some() {
            intersect_node(&self.root, &mut ray, &inv_dir, primitives, &mut closest);
        }
        closest
    }

    /// True if anything blocks `ray` within its range
    pub fn occluded<P: Primitives>(&self, ray: &Ray, primitives: &P) -> bool {
        let inv_dir = ray.direction.map(|d| 1.0 / d);
        let mut stack = vec![&self.root];

        while let Some(node) = stack.pop() {
            if intersect_box(node.bounds(), ray, &inv_dir).is_none() {
                continue;
            }
            match node {
                Node::Leaf { indices, .. } => {
                    if indices.iter().any(|&i| primitives.intersect(i, ray).is_some()) {
                        return true;
                    }
                }
                Node::Inner { left, right, .. } => {
                    stack.push(left);
                    stack.push(right);
                }
            }
        }
        false
    }
}

// The ray's t_max shrinks to the closest hit so far, which prunes every box
// behind it.
fn intersect_node<P: Primitives>(
    node: &Node,
    ray: &mut Ray,
    inv_dir: &Vector3f,
    primitives: &P,
    closest: &mut Option<BvhHit>,
) {
    match node {
        Node::Leaf { indices, .. } => {
            for &index in indices {
                if let Some((t, u, v)) = primitives.intersect(index, ray) {
                    ray.t_max = t;
                    *closest = Some(BvhHit { index, t, u, v });
                }
            }
        }
        Node::Inner { left, right, .. } => {
            let hit_left = intersect_box(left.bounds(), ray, inv_dir);
            let hit_right = intersect_box(right.bounds(), ray, inv_dir);

            match (hit_left, hit_right) {
                (None, None) => {}
                (Some(_), None) => intersect_node(left, ray, inv_dir, primitives, closest),
                (None, Some(_)) => intersect_node(right, ray, inv_dir, primitives, closest),
                (Some(l_distance), Some(r_distance)) => {
                    let (first, second, second_distance) = if l_distance <= r_distance {
                        (left, right, r_distance)
                    } else {
                        (right, left, l_distance)
                    };

                    intersect_node(first, ray, inv_dir, primitives, closest);
                    if second_distance <= ray.t_max {
                        intersect_node(second, ray, inv_dir, primitives, closest);
                    }
                }
            }
        }
    }
}

#[derive(Default)]
struct BuildStats {
    max_depth: usize,
    leaf_count: usize,
}

fn create_node(primitive_bounds: &[BoundingBox], indices: Vec<u32>, depth: usize, stats: &mut BuildStats) -> Node {
    stats.max_depth = stats.max_depth.max(depth);

    let bounds = indices
        .iter()
        .fold(BoundingBox::empty(), |b, &i| b.union(&primitive_bounds[i as usize]));

    match surface_area_heuristic(primitive_bounds, indices, &bounds) {
        Split::Leaf(indices) => {
            stats.leaf_count += 1;
            Node::Leaf { indices, bounds }
        }
        Split::Inner(left_indices, right_indices) => {
            let left = create_node(primitive_bounds, left_indices, depth + 1, stats);
            let right = create_node(primitive_bounds, right_indices, depth + 1, stats);

            Node::Inner {
                left: Box::new(left),
                right: Box::new(right),
                bounds,
            }
        }
    }
}

enum Split {
    Leaf(Vec<u32>),
    Inner(Vec<u32>, Vec<u32>),
}

#[derive(Clone, Copy)]
struct Bucket {
    count: usize,
    bounds: BoundingBox,
}

fn surface_area(bounds: &BoundingBox) -> f32 {
    let e = bounds.size();
    2.0 * (e.x * e.y + e.x * e.z + e.y * e.z)
}

fn surface_area_heuristic(primitive_bounds: &[BoundingBox], indices: Vec<u32>, bounds: &BoundingBox) -> Split {
    if indices.len() <= MIN_TRIS_IN_LEAF {
        return Split::Leaf(indices);
    }

    let centroid = |i: u32| primitive_bounds[i as usize].center();
    let centroid_bounds: BoundingBox = indices.iter().map(|&i| centroid(i)).collect::<Vec<Point3f>>().iter().collect();
    let extent = centroid_bounds.size();

    // (cost, axis, split bucket)
    let mut best: Option<(f32, usize, usize)> = None;
    let parent_area = surface_area(bounds).max(f32::MIN_POSITIVE);

    for axis in 0..3 {
        if extent[axis] <= 0.0 {
            continue;
        }

        let bucket_index = |i: u32| {
            let x = (centroid(i)[axis] - centroid_bounds.min[axis]) / extent[axis];
            ((BUCKET_COUNT as f32 * x) as usize).min(BUCKET_COUNT - 1)
        };

        let mut buckets = [Bucket {
            count: 0,
            bounds: BoundingBox::empty(),
        }; BUCKET_COUNT];

        for &i in &indices {
            let bucket = &mut buckets[bucket_index(i)];
            bucket.count += 1;
            bucket.bounds = bucket.bounds.union(&primitive_bounds[i as usize]);
        }

        for split in 0..BUCKET_COUNT - 1 {
            let (below, above) = buckets.split_at(split + 1);
            let sum = |side: &[Bucket]| {
                side.iter().fold((0, BoundingBox::empty()), |(count, b), bucket| {
                    (count + bucket.count, b.union(&bucket.bounds))
                })
            };
            let (count0, b0) = sum(below);
            let (count1, b1) = sum(above);
            if count0 == 0 || count1 == 0 {
                continue;
            }

            let cost = RELATIVE_TRAVERSAL_COST
                + (count0 as f32 * surface_area(&b0) + count1 as f32 * surface_area(&b1)) / parent_area;

            if best.map_or(true, |(best_cost, ..)| cost < best_cost) {
                best = Some((cost, axis, split));
            }
        }
    }

    let Some((cost, axis, split)) = best else {
        // all centroids coincide; nothing to split on
        return Split::Leaf(indices);
    };

    if indices.len() <= MAX_TRIS_IN_LEAF && cost >= indices.len() as f32 {
        return Split::Leaf(indices);
    }

    let (left, right): (Vec<u32>, Vec<u32>) = indices.into_iter().partition(|&i| {
        let x = (centroid(i)[axis] - centroid_bounds.min[axis]) / extent[axis];
        ((BUCKET_COUNT as f32 * x) as usize).min(BUCKET_COUNT - 1) <= split
    });

    Split::Inner(left, right)
}
