use super::Circle;

const SHUFFLE_SEED: u32 = 1;

/// Deterministic linear congruential sequence in `[0, 1)`.
struct Lcg(u32);

impl Lcg {
    fn next_unit(&mut self) -> f64 {
        self.0 = self.0.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        f64::from(self.0) / 4_294_967_296.0
    }
}

/// Smallest circle enclosing every input circle (Welzl's move-to-front
/// scheme over circles). Falls back to a bounding-box circle if the basis
/// cannot be extended, which only happens on degenerate float input.
pub(super) fn enclose(circles: &[Circle]) -> Circle {
    if circles.is_empty() {
        return Circle::new(0.0);
    }

    let mut shuffled = circles.to_vec();
    let mut random = Lcg(SHUFFLE_SEED);
    let mut remaining = shuffled.len();
    while remaining > 0 {
        let pick = (random.next_unit() * remaining as f64) as usize;
        remaining -= 1;
        shuffled.swap(remaining, pick.min(remaining));
    }

    let mut budget = shuffled.len().saturating_mul(shuffled.len()).saturating_mul(8) + 64;
    let mut basis: Vec<Circle> = Vec::with_capacity(3);
    let mut enclosing: Option<Circle> = None;
    let mut index = 0usize;

    while index < shuffled.len() {
        let circle = shuffled[index];
        if enclosing.is_some_and(|outer| encloses_weak(outer, circle)) {
            index += 1;
            continue;
        }

        budget = budget.saturating_sub(1);
        let Some(next_basis) = extend_basis(&basis, circle).filter(|_| budget > 0) else {
            return bounding_circle(circles);
        };
        basis = next_basis;
        enclosing = Some(enclose_basis(&basis));
        index = 0;
    }

    enclosing
        .filter(|outer| outer.x.is_finite() && outer.y.is_finite() && outer.r.is_finite())
        .unwrap_or_else(|| bounding_circle(circles))
}

fn bounding_circle(circles: &[Circle]) -> Circle {
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for circle in circles {
        min_x = min_x.min(circle.x - circle.r);
        min_y = min_y.min(circle.y - circle.r);
        max_x = max_x.max(circle.x + circle.r);
        max_y = max_y.max(circle.y + circle.r);
    }

    let x = (min_x + max_x) * 0.5;
    let y = (min_y + max_y) * 0.5;
    let r = circles
        .iter()
        .map(|circle| ((circle.x - x).hypot(circle.y - y)) + circle.r)
        .fold(0.0, f64::max);
    Circle { x, y, r }
}

fn extend_basis(basis: &[Circle], circle: Circle) -> Option<Vec<Circle>> {
    if encloses_weak_all(circle, basis) {
        return Some(vec![circle]);
    }

    for &member in basis {
        if encloses_not(circle, member) && encloses_weak_all(enclose_pair(member, circle), basis) {
            return Some(vec![member, circle]);
        }
    }

    for first in 0..basis.len().saturating_sub(1) {
        for second in (first + 1)..basis.len() {
            let (a, b) = (basis[first], basis[second]);
            if encloses_not(enclose_pair(a, b), circle)
                && encloses_not(enclose_pair(a, circle), b)
                && encloses_not(enclose_pair(b, circle), a)
                && encloses_weak_all(enclose_triple(a, b, circle), basis)
            {
                return Some(vec![a, b, circle]);
            }
        }
    }

    None
}

fn encloses_not(outer: Circle, inner: Circle) -> bool {
    let dr = outer.r - inner.r;
    let dx = inner.x - outer.x;
    let dy = inner.y - outer.y;
    dr < 0.0 || dr * dr < dx * dx + dy * dy
}

fn encloses_weak(outer: Circle, inner: Circle) -> bool {
    let dr = outer.r - inner.r + outer.r.max(inner.r).max(1.0) * 1e-9;
    let dx = inner.x - outer.x;
    let dy = inner.y - outer.y;
    dr > 0.0 && dr * dr > dx * dx + dy * dy
}

fn encloses_weak_all(outer: Circle, basis: &[Circle]) -> bool {
    basis.iter().all(|&inner| encloses_weak(outer, inner))
}

fn enclose_basis(basis: &[Circle]) -> Circle {
    match basis {
        [a] => *a,
        [a, b] => enclose_pair(*a, *b),
        [a, b, c] => enclose_triple(*a, *b, *c),
        _ => bounding_circle(basis),
    }
}

fn enclose_pair(a: Circle, b: Circle) -> Circle {
    let x21 = b.x - a.x;
    let y21 = b.y - a.y;
    let r21 = b.r - a.r;
    let length = x21.hypot(y21);
    if length <= f64::EPSILON {
        return if a.r >= b.r { a } else { b };
    }

    Circle {
        x: (a.x + b.x + x21 / length * r21) * 0.5,
        y: (a.y + b.y + y21 / length * r21) * 0.5,
        r: (length + a.r + b.r) * 0.5,
    }
}

fn enclose_triple(a: Circle, b: Circle, c: Circle) -> Circle {
    let (x1, y1, r1) = (a.x, a.y, a.r);
    let a2 = x1 - b.x;
    let a3 = x1 - c.x;
    let b2 = y1 - b.y;
    let b3 = y1 - c.y;
    let c2 = b.r - r1;
    let c3 = c.r - r1;
    let d1 = x1 * x1 + y1 * y1 - r1 * r1;
    let d2 = d1 - b.x * b.x - b.y * b.y + b.r * b.r;
    let d3 = d1 - c.x * c.x - c.y * c.y + c.r * c.r;
    let ab = a3 * b2 - a2 * b3;
    let xa = (b2 * d3 - b3 * d2) / (ab * 2.0) - x1;
    let xb = (b3 * c2 - b2 * c3) / ab;
    let ya = (a3 * d2 - a2 * d3) / (ab * 2.0) - y1;
    let yb = (a2 * c3 - a3 * c2) / ab;
    let qa = xb * xb + yb * yb - 1.0;
    let qb = 2.0 * (r1 + xa * xb + ya * yb);
    let qc = xa * xa + ya * ya - r1 * r1;
    let r = -(if qa.abs() > 1e-6 {
        (qb + (qb * qb - 4.0 * qa * qc).sqrt()) / (2.0 * qa)
    } else {
        qc / qb
    });

    Circle {
        x: x1 + xa + xb * r,
        y: y1 + ya + yb * r,
        r,
    }
}
