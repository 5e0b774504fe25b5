use eframe::egui::{Vec2, vec2};

const QUADTREE_LEAF_CAPACITY: usize = 12;
const QUADTREE_MAX_DEPTH: usize = 10;

#[derive(Clone, Copy)]
pub(super) struct QuadBounds {
    pub(super) center: Vec2,
    pub(super) half_extent: f32,
}

impl QuadBounds {
    fn from_points(points: &[Vec2]) -> Option<Self> {
        let mut min = vec2(f32::INFINITY, f32::INFINITY);
        let mut max = vec2(f32::NEG_INFINITY, f32::NEG_INFINITY);

        for point in points.iter().filter(|point| point.is_finite()) {
            min = min.min(*point);
            max = max.max(*point);
        }

        if !min.is_finite() || !max.is_finite() {
            return None;
        }

        let span = (max - min).max(vec2(1.0, 1.0));
        Some(Self {
            center: (min + max) * 0.5,
            half_extent: (span.max_elem() * 0.5) + 1.0,
        })
    }

    pub(super) fn contains(self, point: Vec2) -> bool {
        let offset = (point - self.center).abs();
        offset.x <= self.half_extent && offset.y <= self.half_extent
    }

    fn child(self, quadrant: usize) -> Self {
        let quarter = self.half_extent * 0.5;
        let offset = match quadrant {
            0 => vec2(-quarter, -quarter),
            1 => vec2(quarter, -quarter),
            2 => vec2(-quarter, quarter),
            _ => vec2(quarter, quarter),
        };

        Self {
            center: self.center + offset,
            half_extent: quarter,
        }
    }

    fn quadrant_for(self, point: Vec2) -> usize {
        match (point.x >= self.center.x, point.y >= self.center.y) {
            (false, false) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (true, true) => 3,
        }
    }

    pub(super) fn side_length(self) -> f32 {
        self.half_extent * 2.0
    }

    pub(super) fn distance_sq_to(self, other: Self) -> f32 {
        let gap = (self.center - other.center).abs()
            - Vec2::splat(self.half_extent + other.half_extent);
        gap.max(Vec2::ZERO).length_sq()
    }
}

/// Spatial index over body positions.
///
/// Each cell aggregates the total charge of its bodies and a charge-weighted
/// center, so one tree serves both far-field repulsion and collision pruning.
pub(super) struct QuadNode {
    pub(super) bounds: QuadBounds,
    pub(super) center_of_charge: Vec2,
    pub(super) charge: f32,
    pub(super) count: usize,
    pub(super) indices: Vec<usize>,
    pub(super) children: [Option<Box<QuadNode>>; 4],
}

impl QuadNode {
    /// Non-finite positions are left out of the tree.
    pub(super) fn build(positions: &[Vec2], charges: &[f32]) -> Option<Self> {
        let bounds = QuadBounds::from_points(positions)?;
        let indices = (0..positions.len())
            .filter(|&index| positions[index].is_finite())
            .collect::<Vec<_>>();
        Some(Self::build_node(bounds, indices, positions, charges, 0))
    }

    fn build_node(
        bounds: QuadBounds,
        indices: Vec<usize>,
        positions: &[Vec2],
        charges: &[f32],
        depth: usize,
    ) -> Self {
        let mut weighted = Vec2::ZERO;
        let mut weight = 0.0;
        let mut charge = 0.0;
        for &index in &indices {
            let value = charges.get(index).copied().unwrap_or(0.0);
            weighted += positions[index] * value.abs();
            weight += value.abs();
            charge += value;
        }

        let center_of_charge = if weight > 0.0 {
            weighted / weight
        } else {
            bounds.center
        };

        let mut node = Self {
            bounds,
            center_of_charge,
            charge,
            count: indices.len(),
            indices,
            children: std::array::from_fn(|_| None),
        };

        if depth >= QUADTREE_MAX_DEPTH || node.indices.len() <= QUADTREE_LEAF_CAPACITY {
            return node;
        }

        let mut buckets = std::array::from_fn::<_, 4, _>(|_| Vec::new());
        for &index in &node.indices {
            buckets[bounds.quadrant_for(positions[index])].push(index);
        }

        if buckets.iter().filter(|bucket| !bucket.is_empty()).count() <= 1 {
            return node;
        }

        for (quadrant, bucket) in buckets.into_iter().enumerate() {
            if bucket.is_empty() {
                continue;
            }

            node.children[quadrant] = Some(Box::new(Self::build_node(
                bounds.child(quadrant),
                bucket,
                positions,
                charges,
                depth + 1,
            )));
        }
        node.indices.clear();
        node
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }

    fn children(&self) -> impl Iterator<Item = &QuadNode> {
        self.children.iter().filter_map(|child| child.as_deref())
    }

    /// Unordered index pairs whose cells lie within `max_distance` of each
    /// other. Pairs are emitted once, `(low, high)`.
    pub(super) fn candidate_pairs(&self, max_distance: f32, pairs: &mut Vec<(usize, usize)>) {
        collect_pairs(self, self, true, max_distance * max_distance, pairs);
    }
}

fn collect_pairs(
    node_a: &QuadNode,
    node_b: &QuadNode,
    same_node: bool,
    max_distance_sq: f32,
    pairs: &mut Vec<(usize, usize)>,
) {
    if node_a.bounds.distance_sq_to(node_b.bounds) > max_distance_sq {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for (offset, &from) in node_a.indices.iter().enumerate() {
                for &to in &node_a.indices[offset + 1..] {
                    pairs.push((from.min(to), from.max(to)));
                }
            }
        } else {
            for &from in &node_a.indices {
                for &to in &node_b.indices {
                    pairs.push((from.min(to), from.max(to)));
                }
            }
        }
        return;
    }

    if same_node {
        let children = node_a.children().collect::<Vec<_>>();
        for (first, child_a) in children.iter().enumerate() {
            collect_pairs(child_a, child_a, true, max_distance_sq, pairs);
            for child_b in &children[first + 1..] {
                collect_pairs(child_a, child_b, false, max_distance_sq, pairs);
            }
        }
        return;
    }

    let split_a = if node_a.is_leaf() {
        false
    } else if node_b.is_leaf() {
        true
    } else {
        node_a.bounds.half_extent >= node_b.bounds.half_extent
    };

    if split_a {
        for child in node_a.children() {
            collect_pairs(child, node_b, false, max_distance_sq, pairs);
        }
    } else {
        for child in node_b.children() {
            collect_pairs(node_a, child, false, max_distance_sq, pairs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(count: usize) -> Vec<Vec2> {
        (0..count)
            .map(|index| vec2((index % 8) as f32 * 30.0, (index / 8) as f32 * 30.0))
            .collect()
    }

    #[test]
    fn root_aggregates_every_charge() {
        let positions = grid(40);
        let charges = vec![-2.0; positions.len()];
        let tree = QuadNode::build(&positions, &charges).expect("finite positions");

        assert_eq!(tree.count, 40);
        assert!((tree.charge + 80.0).abs() < 1e-3);
        assert!(!tree.is_leaf());
    }

    #[test]
    fn pair_pruning_matches_brute_force() {
        let positions = grid(64);
        let charges = vec![1.0; positions.len()];
        let tree = QuadNode::build(&positions, &charges).expect("finite positions");

        let mut pairs = Vec::new();
        tree.candidate_pairs(45.0, &mut pairs);
        pairs.sort_unstable();
        pairs.dedup();

        for i in 0..positions.len() {
            for j in (i + 1)..positions.len() {
                if (positions[i] - positions[j]).length() < 45.0 {
                    assert!(pairs.binary_search(&(i, j)).is_ok(), "missing pair {i}-{j}");
                }
            }
        }
    }

    #[test]
    fn non_finite_positions_are_skipped() {
        let positions = vec![vec2(0.0, 0.0), vec2(f32::NAN, 1.0), vec2(10.0, 10.0)];
        let tree = QuadNode::build(&positions, &[1.0, 1.0, 1.0]).expect("two finite points");
        assert_eq!(tree.count, 2);
    }
}
