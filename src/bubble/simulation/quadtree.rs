use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 12;

/// Axis-aligned square cell.
#[derive(Clone, Copy, Debug)]
pub(super) struct Square {
    pub(super) center: Vec2,
    pub(super) half_extent: f32,
}

impl Square {
    fn around(points: &[Vec2]) -> Option<Self> {
        let mut min = vec2(f32::INFINITY, f32::INFINITY);
        let mut max = vec2(f32::NEG_INFINITY, f32::NEG_INFINITY);
        for point in points {
            min = min.min(*point);
            max = max.max(*point);
        }

        if !(min.x.is_finite() && min.y.is_finite() && max.x.is_finite() && max.y.is_finite()) {
            return None;
        }

        let span = (max - min).max(vec2(1.0, 1.0));
        Some(Self {
            center: (min + max) * 0.5,
            half_extent: span.x.max(span.y) * 0.5 + 1.0,
        })
    }

    pub(super) fn contains(self, point: Vec2) -> bool {
        let offset = (point - self.center).abs();
        offset.x <= self.half_extent && offset.y <= self.half_extent
    }

    pub(super) fn side(self) -> f32 {
        self.half_extent * 2.0
    }

    /// Squared gap between two squares, zero when they touch or overlap.
    pub(super) fn gap_sq(self, other: Self) -> f32 {
        let reach = self.half_extent + other.half_extent;
        let gap = ((self.center - other.center).abs() - vec2(reach, reach)).max(Vec2::ZERO);
        gap.length_sq()
    }

    fn quadrant(self, point: Vec2) -> usize {
        usize::from(point.x >= self.center.x) | (usize::from(point.y >= self.center.y) << 1)
    }

    fn child(self, quadrant: usize) -> Self {
        let quarter = self.half_extent * 0.5;
        let sign_x = if quadrant & 1 == 0 { -1.0 } else { 1.0 };
        let sign_y = if quadrant & 2 == 0 { -1.0 } else { 1.0 };
        Self {
            center: self.center + vec2(sign_x * quarter, sign_y * quarter),
            half_extent: quarter,
        }
    }
}

/// Point-region quadtree over node positions. Interior cells carry the
/// count and centroid of everything below them.
pub(super) struct QuadTree {
    pub(super) bounds: Square,
    pub(super) centroid: Vec2,
    pub(super) count: f32,
    pub(super) members: Vec<usize>,
    pub(super) children: [Option<Box<QuadTree>>; 4],
}

impl QuadTree {
    pub(super) fn build(points: &[Vec2]) -> Option<Self> {
        let bounds = Square::around(points)?;
        Some(Self::subdivide(bounds, (0..points.len()).collect(), points, 0))
    }

    fn subdivide(bounds: Square, members: Vec<usize>, points: &[Vec2], depth: usize) -> Self {
        let count = members.len() as f32;
        let centroid = if members.is_empty() {
            bounds.center
        } else {
            members.iter().fold(Vec2::ZERO, |sum, &index| sum + points[index]) / count
        };

        let mut cell = Self {
            bounds,
            centroid,
            count,
            members,
            children: std::array::from_fn(|_| None),
        };

        if depth >= MAX_DEPTH || cell.members.len() <= LEAF_CAPACITY {
            return cell;
        }

        let mut buckets: [Vec<usize>; 4] = std::array::from_fn(|_| Vec::new());
        for &index in &cell.members {
            buckets[bounds.quadrant(points[index])].push(index);
        }

        let first = points[cell.members[0]];
        if cell.members.iter().all(|&index| points[index] == first) {
            return cell;
        }

        for (quadrant, bucket) in buckets.into_iter().enumerate() {
            if !bucket.is_empty() {
                cell.children[quadrant] = Some(Box::new(Self::subdivide(
                    bounds.child(quadrant),
                    bucket,
                    points,
                    depth + 1,
                )));
            }
        }
        cell.members.clear();
        cell
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }

    pub(super) fn children(&self) -> impl Iterator<Item = &QuadTree> {
        self.children.iter().filter_map(|child| child.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interior_cells_summarise_members() {
        let points = (0..40)
            .map(|index| vec2((index % 7) as f32 * 10.0, (index / 7) as f32 * 10.0))
            .collect::<Vec<_>>();
        let tree = QuadTree::build(&points).unwrap();

        assert!(!tree.is_leaf());
        assert_eq!(tree.count, 40.0);
        let child_total: f32 = tree.children().map(|child| child.count).sum();
        assert_eq!(child_total, 40.0);
        for point in &points {
            assert!(tree.bounds.contains(*point));
        }
    }

    #[test]
    fn coincident_points_stay_in_one_leaf() {
        let points = vec![vec2(3.0, 3.0); 30];
        let tree = QuadTree::build(&points).unwrap();
        assert!(tree.is_leaf());
        assert_eq!(tree.members.len(), 30);
    }

    #[test]
    fn tight_cluster_keeps_splitting() {
        let mut points = (0..20)
            .map(|index| vec2(50.0 + (index % 5) as f32 * 0.5, 50.0 + (index / 5) as f32 * 0.5))
            .collect::<Vec<_>>();
        points.push(vec2(0.0, 0.0));
        let tree = QuadTree::build(&points).unwrap();

        fn largest_leaf(cell: &QuadTree) -> usize {
            if cell.is_leaf() {
                cell.members.len()
            } else {
                cell.children().map(largest_leaf).max().unwrap_or(0)
            }
        }
        assert!(largest_leaf(&tree) <= LEAF_CAPACITY);
    }

    #[test]
    fn non_finite_points_have_no_tree() {
        assert!(QuadTree::build(&[vec2(f32::NAN, 0.0)]).is_none());
        assert!(QuadTree::build(&[]).is_none());
    }

    #[test]
    fn square_gap() {
        let a = Square {
            center: vec2(0.0, 0.0),
            half_extent: 1.0,
        };
        let b = Square {
            center: vec2(5.0, 0.0),
            half_extent: 1.0,
        };
        assert_eq!(a.gap_sq(b), 9.0);
        assert_eq!(a.gap_sq(a), 0.0);
    }
}
