use eframe::egui::Vec2;

use super::simulation::Simulation;

pub const MIN_ZOOM: f32 = 0.05;
pub const MAX_ZOOM: f32 = 6.0;

/// Pointer-driven drag of a single node.
///
/// `Idle -> Dragging` pins the node where it is and reheats the simulation;
/// moves only re-pin; `Dragging -> Idle` frees the node and lets alpha decay.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        node: usize,
        /// Node position minus pointer position at grab time.
        grab_offset: Vec2,
    },
}

impl DragState {
    pub fn dragged_node(self) -> Option<usize> {
        match self {
            Self::Idle => None,
            Self::Dragging { node, .. } => Some(node),
        }
    }

    pub fn start(&mut self, simulation: &mut Simulation, node: usize, pointer: Vec2) -> bool {
        self.end(simulation);

        let Some(position) = simulation.node(node).map(|node| node.position) else {
            return false;
        };
        if !simulation.pin(node, position) {
            return false;
        }

        simulation.reheat();
        *self = Self::Dragging {
            node,
            grab_offset: position - pointer,
        };
        true
    }

    pub fn update(&mut self, simulation: &mut Simulation, pointer: Vec2) {
        if let Self::Dragging { node, grab_offset } = *self {
            simulation.pin(node, pointer + grab_offset);
        }
    }

    pub fn end(&mut self, simulation: &mut Simulation) {
        if let Self::Dragging { node, .. } = std::mem::take(self) {
            simulation.unpin(node);
            simulation.release();
        }
    }
}

/// Affine view of the whole scene: `screen = translate + world * scale`,
/// relative to the canvas origin. Never touches node or simulation state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub translate: Vec2,
    pub scale: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            translate: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

impl ViewTransform {
    pub fn to_screen(self, world: Vec2) -> Vec2 {
        self.translate + world * self.scale
    }

    pub fn to_world(self, screen: Vec2) -> Vec2 {
        (screen - self.translate) / self.scale
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        if delta.x.is_finite() && delta.y.is_finite() {
            self.translate += delta;
        }
    }

    /// Zooms by `factor` keeping the world point under `anchor` fixed.
    pub fn zoom_about(&mut self, anchor: Vec2, factor: f32) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let world = self.to_world(anchor);
        self.scale = (self.scale * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.translate = anchor - world * self.scale;
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;
    use crate::bubble::node::{BubbleNode, Pin};
    use crate::bubble::simulation::{SimulationParams, SimulationState};

    fn simulation() -> Simulation {
        let nodes = [("a", vec2(100.0, 100.0)), ("b", vec2(300.0, 100.0))]
            .into_iter()
            .map(|(id, position)| BubbleNode {
                id: id.to_owned(),
                name: id.to_owned(),
                value: 1.0,
                from: None,
                to: Some(id.to_owned()),
                record: 0,
                position,
                velocity: Vec2::ZERO,
                radius: 10.0,
                pin: Pin::Free,
            })
            .collect();
        Simulation::new(nodes, vec2(400.0, 200.0), 2.0, SimulationParams::default())
    }

    #[test]
    fn drag_pins_follows_and_releases() {
        let mut simulation = simulation();
        simulation.run(10_000);
        assert_eq!(simulation.state(), SimulationState::Settled);

        let mut drag = DragState::default();
        let grabbed_at = simulation.node(0).unwrap().position;
        assert!(drag.start(&mut simulation, 0, grabbed_at + vec2(3.0, 0.0)));
        assert_eq!(drag.dragged_node(), Some(0));
        assert_eq!(simulation.state(), SimulationState::Running);
        assert_eq!(simulation.node(0).unwrap().pin, Pin::Pinned(grabbed_at));

        drag.update(&mut simulation, vec2(50.0, 60.0));
        simulation.run(5);
        assert_eq!(simulation.node(0).unwrap().position, vec2(47.0, 60.0));

        drag.end(&mut simulation);
        assert_eq!(drag, DragState::Idle);
        assert_eq!(simulation.node(0).unwrap().pin.fixed_position(), None);

        let released_alpha = simulation.alpha();
        assert!(released_alpha > SimulationParams::default().alpha_min);
        let mut previous = released_alpha;
        for _ in 0..100 {
            simulation.tick();
            assert!(simulation.alpha() <= previous);
            previous = simulation.alpha();
        }
        assert!(previous < released_alpha);
    }

    #[test]
    fn moves_do_not_reheat() {
        let mut simulation = simulation();
        let mut drag = DragState::default();
        drag.start(&mut simulation, 1, vec2(300.0, 100.0));
        simulation.run(400);
        let alpha = simulation.alpha();

        drag.update(&mut simulation, vec2(200.0, 150.0));
        assert_eq!(simulation.alpha(), alpha);
    }

    #[test]
    fn starting_on_missing_node_stays_idle() {
        let mut simulation = simulation();
        let mut drag = DragState::default();
        assert!(!drag.start(&mut simulation, 9, Vec2::ZERO));
        assert_eq!(drag, DragState::Idle);
        drag.update(&mut simulation, Vec2::ZERO);
        drag.end(&mut simulation);
    }

    #[test]
    fn regrab_releases_previous_node() {
        let mut simulation = simulation();
        let mut drag = DragState::default();
        drag.start(&mut simulation, 0, vec2(100.0, 100.0));
        drag.start(&mut simulation, 1, vec2(300.0, 100.0));
        assert!(!simulation.node(0).unwrap().pin.is_pinned());
        assert!(simulation.node(1).unwrap().pin.is_pinned());
    }

    #[test]
    fn zoom_keeps_anchor_and_leaves_nodes_alone() {
        let simulation = simulation();
        let before = simulation.nodes().to_vec();

        let mut view = ViewTransform::default();
        let anchor = vec2(120.0, 80.0);
        let world = view.to_world(anchor);
        view.zoom_about(anchor, 2.5);
        view.pan_by(vec2(-30.0, 12.0));
        view.pan_by(vec2(30.0, -12.0));

        assert!((view.to_screen(world) - anchor).length() < 1e-4);
        assert_eq!(view.scale, 2.5);
        assert_eq!(simulation.nodes(), before.as_slice());
    }

    #[test]
    fn zoom_is_clamped() {
        let mut view = ViewTransform::default();
        view.zoom_about(Vec2::ZERO, 1000.0);
        assert_eq!(view.scale, MAX_ZOOM);
        view.zoom_about(Vec2::ZERO, 1e-6);
        assert_eq!(view.scale, MIN_ZOOM);
        view.zoom_about(Vec2::ZERO, f32::NAN);
        assert_eq!(view.scale, MIN_ZOOM);
    }
}
