//! Area-proportional circle packing.
//!
//! Every node is a leaf under one synthetic root. Leaves are ordered by
//! descending value (stable, so equal values keep input order), placed with a
//! front-chain sibling pack and then scaled so the enclosing circle fits the
//! viewport. Radii are `sqrt(value)` scaled, floored at a minimum visible
//! radius; each circle is packed inflated by half the padding so neighbours
//! always keep at least `padding` between their boundaries.

mod enclose;

use eframe::egui::{Vec2, vec2};

use super::node::BubbleNode;
use enclose::enclose;

/// Extra separation per circle that absorbs the sibling pack's intersection
/// tolerance and the f64 to f32 conversion.
const PACK_SLACK: f64 = 1e-3;
const PACK_FIT_PASSES: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PackOptions {
    pub padding: f32,
    pub min_radius: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Circle {
    x: f64,
    y: f64,
    r: f64,
}

impl Circle {
    fn new(r: f64) -> Self {
        Self { x: 0.0, y: 0.0, r }
    }
}

/// The single-root tree over a batch: leaf order and leaf weights.
#[derive(Clone, Debug)]
pub struct Hierarchy {
    leaves: Vec<usize>,
    weights: Vec<f64>,
    total: f64,
}

impl Hierarchy {
    pub fn from_nodes(nodes: &[BubbleNode]) -> Self {
        let weights = nodes
            .iter()
            .map(|node| {
                if node.value.is_finite() {
                    node.value.max(0.0)
                } else {
                    0.0
                }
            })
            .collect::<Vec<_>>();

        let mut leaves = (0..nodes.len()).collect::<Vec<_>>();
        leaves.sort_by(|a, b| weights[*b].total_cmp(&weights[*a]));
        let total = weights.iter().sum();

        Self {
            leaves,
            weights,
            total,
        }
    }

    pub fn leaves(&self) -> &[usize] {
        &self.leaves
    }

    pub fn total(&self) -> f64 {
        self.total
    }
}

/// Assigns `position` and `radius` to every node. Reads `value`, writes
/// geometry only.
///
/// Returns `false` when the minimum radius and padding alone overflow the
/// viewport; the layout is still overlap-free but extends past the edges.
pub fn pack(nodes: &mut [BubbleNode], viewport: Vec2, options: PackOptions) -> bool {
    if nodes.is_empty() {
        return true;
    }

    let hierarchy = Hierarchy::from_nodes(nodes);
    let base_radii = hierarchy
        .leaves()
        .iter()
        .map(|&leaf| hierarchy.weights[leaf].sqrt())
        .collect::<Vec<_>>();

    let target = (f64::from(viewport.x.min(viewport.y)) * 0.5).max(1.0);
    let min_radius = f64::from(options.min_radius.max(0.5));
    let half_gap = f64::from(options.padding.max(0.0)) * 0.5 + PACK_SLACK;

    let mut scale = initial_scale(&base_radii, target);
    let mut radii = Vec::new();
    let mut circles = Vec::new();
    let mut enclosing = 0.0;
    for _ in 0..PACK_FIT_PASSES {
        radii = base_radii
            .iter()
            .map(|radius| (radius * scale).max(min_radius))
            .collect::<Vec<_>>();
        circles = radii
            .iter()
            .map(|radius| Circle::new(radius + half_gap))
            .collect::<Vec<_>>();
        enclosing = pack_siblings(&mut circles);

        if enclosing <= target || scale <= 0.0 {
            break;
        }
        let next = scale * (target / enclosing);
        if !next.is_finite() || (scale - next).abs() <= scale * 1e-4 {
            break;
        }
        scale = next;
    }

    let fits = enclosing <= target * 1.01;
    if !fits {
        log::warn!(
            "{} bubbles at min radius {min_radius} with padding {} need radius {enclosing:.0}, \
             viewport allows {target:.0}; some bubbles start off screen",
            nodes.len(),
            options.padding
        );
    }

    let center = viewport * 0.5;
    for (slot, &leaf) in hierarchy.leaves().iter().enumerate() {
        let circle = circles[slot];
        let node = &mut nodes[leaf];
        node.position = center + vec2(circle.x as f32, circle.y as f32);
        node.radius = radii[slot] as f32;
    }

    log::debug!(
        "packed {} leaves (total value {}) at scale {scale:.4}",
        nodes.len(),
        hierarchy.total()
    );
    fits
}

/// Scale that would make the unpadded pack fill the target radius.
fn initial_scale(base_radii: &[f64], target: f64) -> f64 {
    let largest = base_radii.iter().copied().fold(0.0, f64::max);
    if largest <= 0.0 {
        return 0.0;
    }

    let mut circles = base_radii
        .iter()
        .map(|radius| Circle::new(radius.max(largest * 0.01)))
        .collect::<Vec<_>>();
    let enclosing = pack_siblings(&mut circles);
    if enclosing > 0.0 {
        target / enclosing
    } else {
        0.0
    }
}

/// Places `c` tangent to both `a` and `b`.
fn place(b: Circle, a: Circle, radius: f64) -> (f64, f64) {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let d2 = dx * dx + dy * dy;
    if d2 <= 0.0 {
        return (a.x + radius, a.y);
    }

    let a2 = (a.r + radius).powi(2);
    let b2 = (b.r + radius).powi(2);
    if a2 > b2 {
        let x = (d2 + b2 - a2) / (2.0 * d2);
        let y = (b2 / d2 - x * x).max(0.0).sqrt();
        (b.x - x * dx - y * dy, b.y - x * dy + y * dx)
    } else {
        let x = (d2 + a2 - b2) / (2.0 * d2);
        let y = (a2 / d2 - x * x).max(0.0).sqrt();
        (a.x + x * dx - y * dy, a.y + x * dy + y * dx)
    }
}

fn intersects(a: Circle, b: Circle) -> bool {
    let dr = a.r + b.r - 1e-6;
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dr > 0.0 && dr * dr > dx * dx + dy * dy
}

/// Squared distance from the origin to the weighted midpoint of a front-chain
/// link.
fn score(circles: &[Circle], node: usize, next: &[usize]) -> f64 {
    let a = circles[node];
    let b = circles[next[node]];
    let ab = a.r + b.r;
    let dx = (a.x * b.r + b.x * a.r) / ab;
    let dy = (a.y * b.r + b.y * a.r) / ab;
    dx * dx + dy * dy
}

/// Packs circles in slice order around the origin and recentres them on
/// their enclosing circle. Returns the enclosing radius.
fn pack_siblings(circles: &mut [Circle]) -> f64 {
    let count = circles.len();
    if count == 0 {
        return 0.0;
    }

    circles[0].x = 0.0;
    circles[0].y = 0.0;
    if count == 1 {
        return circles[0].r;
    }

    circles[0].x = -circles[1].r;
    circles[1].x = circles[0].r;
    circles[1].y = 0.0;
    if count == 2 {
        return circles[0].r + circles[1].r;
    }

    let (x, y) = place(circles[1], circles[0], circles[2].r);
    circles[2].x = x;
    circles[2].y = y;

    // front chain as a circular doubly linked list over slice indices
    let mut next = vec![0usize; count];
    let mut prev = vec![0usize; count];
    next[0] = 1;
    prev[1] = 0;
    next[1] = 2;
    prev[2] = 1;
    next[2] = 0;
    prev[0] = 2;

    let mut a = 0usize;
    let mut b = 1usize;
    let mut index = 3usize;

    'pack: while index < count {
        let (x, y) = place(circles[a], circles[b], circles[index].r);
        circles[index].x = x;
        circles[index].y = y;
        let candidate = circles[index];

        let mut j = next[b];
        let mut k = prev[a];
        let mut sj = circles[b].r;
        let mut sk = circles[a].r;
        loop {
            if sj <= sk {
                if intersects(circles[j], candidate) {
                    b = j;
                    next[a] = b;
                    prev[b] = a;
                    continue 'pack;
                }
                sj += circles[j].r;
                j = next[j];
            } else {
                if intersects(circles[k], candidate) {
                    a = k;
                    next[a] = b;
                    prev[b] = a;
                    continue 'pack;
                }
                sk += circles[k].r;
                k = prev[k];
            }

            if j == next[k] {
                break;
            }
        }

        prev[index] = a;
        next[index] = b;
        next[a] = index;
        prev[b] = index;

        let mut best = score(circles, a, &next);
        let mut cursor = next[index];
        while cursor != index {
            let candidate_score = score(circles, cursor, &next);
            if candidate_score < best {
                a = cursor;
                best = candidate_score;
            }
            cursor = next[cursor];
        }
        b = next[a];
        index += 1;
    }

    let mut chain = vec![circles[b]];
    let mut cursor = next[b];
    while cursor != b {
        chain.push(circles[cursor]);
        cursor = next[cursor];
    }
    let outer = enclose(&chain);

    for circle in circles.iter_mut() {
        circle.x -= outer.x;
        circle.y -= outer.y;
    }
    outer.r
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bubble::node::Pin;

    const VIEWPORT: Vec2 = Vec2::new(1200.0, 800.0);
    const OPTIONS: PackOptions = PackOptions {
        padding: 8.0,
        min_radius: 4.0,
    };

    fn node(id: &str, value: f64) -> BubbleNode {
        BubbleNode {
            id: id.to_owned(),
            name: id.to_owned(),
            value,
            from: None,
            to: Some(id.to_owned()),
            record: 0,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            radius: 0.0,
            pin: Pin::Free,
        }
    }

    fn assert_separated(nodes: &[BubbleNode], padding: f32) {
        for i in 0..nodes.len() {
            for j in (i + 1)..nodes.len() {
                let distance = (nodes[i].position - nodes[j].position).length();
                let required = nodes[i].radius + nodes[j].radius + padding;
                assert!(
                    distance + 1e-3 >= required,
                    "{} and {} overlap: {distance} < {required}",
                    nodes[i].id,
                    nodes[j].id
                );
            }
        }
    }

    #[test]
    fn mixed_values_never_overlap() {
        let mut nodes = [
            5.0, 120.0, 0.0, 3_000.0, 42.0, 42.0, 7.5, 900.0, 1.0, 0.0, 64.0, 18.0,
        ]
        .iter()
        .enumerate()
        .map(|(index, value)| node(&format!("n{index}"), *value))
        .collect::<Vec<_>>();

        pack(&mut nodes, VIEWPORT, OPTIONS);
        assert_separated(&nodes, OPTIONS.padding);
        assert!(nodes.iter().all(|node| node.radius >= OPTIONS.min_radius));
    }

    #[test]
    fn many_equal_nodes_never_overlap() {
        let mut nodes = (0..150)
            .map(|index| node(&format!("n{index}"), 10.0))
            .collect::<Vec<_>>();
        pack(&mut nodes, VIEWPORT, OPTIONS);
        assert_separated(&nodes, OPTIONS.padding);
    }

    #[test]
    fn radius_grows_with_value() {
        let mut nodes = vec![node("small", 50.0), node("large", 100.0), node("tiny", 1.0)];
        pack(&mut nodes, VIEWPORT, OPTIONS);
        assert!(nodes[1].radius > nodes[0].radius);
        assert!(nodes[0].radius > nodes[2].radius);
    }

    #[test]
    fn layout_stays_near_viewport() {
        let mut nodes = (1..40)
            .map(|index| node(&format!("n{index}"), f64::from(index * index)))
            .collect::<Vec<_>>();
        pack(&mut nodes, VIEWPORT, OPTIONS);

        let center = VIEWPORT * 0.5;
        let limit = VIEWPORT.x.min(VIEWPORT.y) * 0.5 + 1.0;
        for node in &nodes {
            assert!((node.position - center).length() + node.radius <= limit);
        }
    }

    #[test]
    fn overcrowded_viewport_reports_overflow() {
        let options = PackOptions {
            padding: 30.0,
            min_radius: 4.0,
        };
        let mut nodes = (0..200).map(|index| node(&format!("z{index}"), 0.0)).collect::<Vec<_>>();
        assert!(!pack(&mut nodes, Vec2::new(400.0, 300.0), options));
        assert_separated(&nodes, options.padding);

        let mut roomy = vec![node("a", 3.0), node("b", 5.0)];
        assert!(pack(&mut roomy, VIEWPORT, OPTIONS));
    }

    #[test]
    fn single_zero_node_gets_minimum_radius() {
        let mut nodes = vec![node("only", 0.0)];
        pack(&mut nodes, VIEWPORT, OPTIONS);
        assert_eq!(nodes[0].radius, OPTIONS.min_radius);
        assert_eq!(nodes[0].position, VIEWPORT * 0.5);
    }

    #[test]
    fn all_zero_batch_is_valid() {
        let mut nodes = (0..6).map(|index| node(&format!("z{index}"), 0.0)).collect::<Vec<_>>();
        pack(&mut nodes, VIEWPORT, OPTIONS);
        assert!(nodes.iter().all(|node| node.radius > 0.0));
        assert_separated(&nodes, OPTIONS.padding);
    }

    #[test]
    fn single_valued_node_fills_viewport() {
        let mut nodes = vec![node("only", 10.0)];
        pack(&mut nodes, VIEWPORT, OPTIONS);
        let half = VIEWPORT.x.min(VIEWPORT.y) * 0.5;
        assert!(nodes[0].radius > half * 0.9);
        assert!(nodes[0].radius <= half);
    }

    #[test]
    fn hierarchy_is_stable_for_ties() {
        let nodes = vec![node("a", 5.0), node("b", 9.0), node("c", 5.0), node("d", 5.0)];
        let hierarchy = Hierarchy::from_nodes(&nodes);
        assert_eq!(hierarchy.leaves(), &[1, 0, 2, 3]);
        assert_eq!(hierarchy.total(), 24.0);
    }
}
