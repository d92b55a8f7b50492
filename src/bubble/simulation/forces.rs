use eframe::egui::{Vec2, vec2};

use super::quadtree::QuadTree;

/// Distances below this are treated as coincident.
pub(super) const MIN_SEPARATION: f32 = 1e-3;
/// Squared-distance floor for the charge force; keeps 1/d bounded.
const CHARGE_MIN_DISTANCE_SQ: f32 = 1.0;

/// Deterministic unit direction for separating coincident nodes.
pub(super) fn jiggle(first: usize, second: usize) -> Vec2 {
    let angle = ((first as f32) * 0.618_034 + (second as f32) * 0.414_214 + 0.11)
        * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin())
}

/// Weak pull of every free node toward `center`.
pub(super) fn apply_centering(
    positions: &[Vec2],
    pinned: &[bool],
    center: Vec2,
    strength: f32,
    velocities: &mut [Vec2],
) {
    for ((position, velocity), is_pinned) in positions.iter().zip(velocities).zip(pinned) {
        if !is_pinned {
            *velocity += (center - *position) * strength;
        }
    }
}

/// Barnes-Hut many-body force on one node. `strength` is already scaled by
/// alpha; negative values repel.
pub(super) fn accumulate_charge(
    cell: &QuadTree,
    index: usize,
    positions: &[Vec2],
    strength: f32,
    theta: f32,
    velocity: &mut Vec2,
) {
    if cell.count <= 0.0 {
        return;
    }

    let point = positions[index];

    if cell.is_leaf() {
        for &other in &cell.members {
            if other == index {
                continue;
            }
            let mut delta = positions[other] - point;
            if delta.length_sq() < MIN_SEPARATION * MIN_SEPARATION {
                delta = jiggle(index, other);
            }
            let distance_sq = delta.length_sq().max(CHARGE_MIN_DISTANCE_SQ);
            *velocity += delta * (strength / distance_sq);
        }
        return;
    }

    let delta = cell.centroid - point;
    let distance_sq = delta.length_sq().max(CHARGE_MIN_DISTANCE_SQ);
    let side = cell.bounds.side();
    let far_enough = !cell.bounds.contains(point) && side * side < theta * theta * distance_sq;
    if far_enough {
        *velocity += delta * (strength * cell.count / distance_sq);
        return;
    }

    for child in cell.children() {
        accumulate_charge(child, index, positions, strength, theta, velocity);
    }
}

#[derive(Clone, Copy)]
pub(super) struct CollisionParams {
    pub(super) padding: f32,
    pub(super) strength: f32,
    pub(super) reach_sq: f32,
}

pub(super) struct CollisionInput<'a> {
    pub(super) positions: &'a [Vec2],
    pub(super) radii: &'a [f32],
    pub(super) pinned: &'a [bool],
}

/// Pushes overlapping pairs apart. The correction is split by squared
/// radius so small bubbles yield to large ones; a pinned node never moves
/// and its partner takes the full correction.
fn resolve_pair(
    first: usize,
    second: usize,
    input: &CollisionInput<'_>,
    params: CollisionParams,
    corrections: &mut [Vec2],
) {
    let (first_pinned, second_pinned) = (input.pinned[first], input.pinned[second]);
    if first_pinned && second_pinned {
        return;
    }

    let required = input.radii[first] + input.radii[second] + params.padding;
    let delta = input.positions[first] - input.positions[second];
    let distance_sq = delta.length_sq();
    if distance_sq >= required * required {
        return;
    }

    let distance = distance_sq.sqrt();
    let direction = if distance > MIN_SEPARATION {
        delta / distance
    } else {
        jiggle(first, second)
    };
    let push = direction * ((required - distance) * params.strength);

    let first_area = input.radii[first] * input.radii[first];
    let second_area = input.radii[second] * input.radii[second];
    let first_share = if first_pinned {
        0.0
    } else if second_pinned {
        1.0
    } else if first_area + second_area > 0.0 {
        second_area / (first_area + second_area)
    } else {
        0.5
    };

    corrections[first] += push * first_share;
    corrections[second] -= push * (1.0 - first_share);
}

/// Dual-tree walk over cell pairs that are close enough to hold an
/// overlapping pair of circles.
pub(super) fn accumulate_collisions(
    cell_a: &QuadTree,
    cell_b: &QuadTree,
    same_cell: bool,
    input: &CollisionInput<'_>,
    params: CollisionParams,
    corrections: &mut [Vec2],
) {
    if cell_a.bounds.gap_sq(cell_b.bounds) > params.reach_sq {
        return;
    }

    if cell_a.is_leaf() && cell_b.is_leaf() {
        if same_cell {
            for (offset, &first) in cell_a.members.iter().enumerate() {
                for &second in &cell_a.members[offset + 1..] {
                    resolve_pair(first, second, input, params, corrections);
                }
            }
        } else {
            for &first in &cell_a.members {
                for &second in &cell_b.members {
                    resolve_pair(first, second, input, params, corrections);
                }
            }
        }
        return;
    }

    if same_cell {
        let children = cell_a.children().collect::<Vec<_>>();
        for (offset, child) in children.iter().enumerate() {
            accumulate_collisions(child, child, true, input, params, corrections);
            for other in &children[offset + 1..] {
                accumulate_collisions(child, other, false, input, params, corrections);
            }
        }
        return;
    }

    let split_a = !cell_a.is_leaf()
        && (cell_b.is_leaf() || cell_a.bounds.half_extent >= cell_b.bounds.half_extent);
    if split_a {
        for child in cell_a.children() {
            accumulate_collisions(child, cell_b, false, input, params, corrections);
        }
    } else {
        for child in cell_b.children() {
            accumulate_collisions(cell_a, child, false, input, params, corrections);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collide(positions: &[Vec2], radii: &[f32], pinned: &[bool], padding: f32) -> Vec<Vec2> {
        let tree = QuadTree::build(positions).unwrap();
        let max_radius = radii.iter().copied().fold(0.0, f32::max);
        let reach = max_radius * 2.0 + padding;
        let mut corrections = vec![Vec2::ZERO; positions.len()];
        accumulate_collisions(
            &tree,
            &tree,
            true,
            &CollisionInput {
                positions,
                radii,
                pinned,
            },
            CollisionParams {
                padding,
                strength: 1.0,
                reach_sq: reach * reach,
            },
            &mut corrections,
        );
        corrections
    }

    #[test]
    fn overlapping_equal_circles_split_the_push() {
        let corrections = collide(
            &[vec2(0.0, 0.0), vec2(6.0, 0.0)],
            &[5.0, 5.0],
            &[false, false],
            2.0,
        );
        assert!((corrections[0].x + 3.0).abs() < 1e-5);
        assert!((corrections[1].x - 3.0).abs() < 1e-5);
    }

    #[test]
    fn pinned_partner_does_not_move() {
        let corrections = collide(
            &[vec2(0.0, 0.0), vec2(6.0, 0.0)],
            &[5.0, 5.0],
            &[true, false],
            2.0,
        );
        assert_eq!(corrections[0], Vec2::ZERO);
        assert!((corrections[1].x - 6.0).abs() < 1e-5);
    }

    #[test]
    fn separated_circles_are_untouched() {
        let corrections = collide(
            &[vec2(0.0, 0.0), vec2(50.0, 0.0)],
            &[5.0, 5.0],
            &[false, false],
            2.0,
        );
        assert!(corrections.iter().all(|correction| *correction == Vec2::ZERO));
    }

    #[test]
    fn coincident_circles_still_separate() {
        let corrections = collide(
            &[vec2(1.0, 1.0), vec2(1.0, 1.0)],
            &[4.0, 4.0],
            &[false, false],
            0.0,
        );
        assert!(corrections[0].length() > 1.0);
        assert!(corrections.iter().all(|correction| correction.x.is_finite()));
    }

    #[test]
    fn charge_repels() {
        let positions = [vec2(0.0, 0.0), vec2(10.0, 0.0)];
        let tree = QuadTree::build(&positions).unwrap();
        let mut velocity = Vec2::ZERO;
        accumulate_charge(&tree, 0, &positions, -30.0, 0.9, &mut velocity);
        assert!(velocity.x < 0.0);
        assert_eq!(velocity.y, 0.0);
    }

    #[test]
    fn charge_on_coincident_nodes_is_finite() {
        let positions = [vec2(5.0, 5.0), vec2(5.0, 5.0)];
        let tree = QuadTree::build(&positions).unwrap();
        let mut velocity = Vec2::ZERO;
        accumulate_charge(&tree, 0, &positions, -30.0, 0.9, &mut velocity);
        assert!(velocity.x.is_finite() && velocity.y.is_finite());
        assert!(velocity.length() > 0.0);
    }
}
