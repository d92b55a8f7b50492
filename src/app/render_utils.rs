use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};

use crate::bubble::ViewTransform;

pub(super) fn world_to_screen(rect: Rect, view: ViewTransform, world: Vec2) -> Pos2 {
    rect.min + view.to_screen(world)
}

pub(super) fn screen_to_world(rect: Rect, view: ViewTransform, screen: Pos2) -> Vec2 {
    view.to_world(screen - rect.min)
}

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let mix = |from: u8, to: u8| (from as f32 + (to as f32 - from as f32) * amount) as u8;

    Color32::from_rgba_unmultiplied(
        mix(base.r(), overlay.r()),
        mix(base.g(), overlay.g()),
        mix(base.b(), overlay.b()),
        mix(base.a(), overlay.a()),
    )
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

/// Dark or light text, whichever reads better on `fill`.
pub(super) fn label_color(fill: Color32) -> Color32 {
    let luma = 0.299 * fill.r() as f32 + 0.587 * fill.g() as f32 + 0.114 * fill.b() as f32;
    if luma > 150.0 {
        Color32::from_gray(24)
    } else {
        Color32::from_gray(240)
    }
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, view: ViewTransform) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let step = (56.0 * view.scale.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.min + view.translate;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

/// Cheap bounding-box cull for a segment; may keep a few segments that miss
/// the rect diagonally.
pub(super) fn segment_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let bounds = Rect::from_two_pos(start, end).expand(padding);
    bounds.intersects(rect)
}

/// Segment between two circle boundaries, or `None` when the circles touch.
pub(super) fn link_endpoints(
    from: Pos2,
    from_radius: f32,
    to: Pos2,
    to_radius: f32,
) -> Option<(Pos2, Pos2)> {
    let delta = to - from;
    let length = delta.length();
    if length <= from_radius + to_radius + 1.0 {
        return None;
    }
    let direction = delta / length;
    Some((from + direction * from_radius, to - direction * to_radius))
}

pub(super) fn draw_arrow(painter: &Painter, start: Pos2, end: Pos2, stroke: Stroke, head: f32) {
    painter.line_segment([start, end], stroke);

    let delta = end - start;
    let length = delta.length();
    if length <= head {
        return;
    }
    let direction = delta / length;
    let normal = Vec2::new(-direction.y, direction.x);
    let base = end - direction * head;
    painter.line_segment([end, base + normal * (head * 0.5)], stroke);
    painter.line_segment([end, base - normal * (head * 0.5)], stroke);
}
