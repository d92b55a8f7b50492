//! Alpha-driven force simulation over a batch's node table.
//!
//! Each tick cools `alpha` toward `alpha_target`, applies centering, charge
//! and collision to node velocities, then integrates free nodes. Pinned nodes
//! are snapped to their pin and only act as obstacles. Once alpha falls below
//! `alpha_min` (and nothing holds the target up) the simulation is settled
//! and ticks are no-ops until something reheats it.

mod forces;
mod quadtree;

use eframe::egui::Vec2;
use serde::Deserialize;

use crate::util::stable_pair;

use super::node::{BubbleNode, Pin};
use forces::{
    CollisionInput, CollisionParams, MIN_SEPARATION, accumulate_charge, accumulate_collisions,
    apply_centering,
};
use quadtree::QuadTree;

/// Ticks per simulated second when driven by wall-clock frames.
pub const TICKS_PER_SECOND: f32 = 60.0;
const MAX_TICKS_PER_ADVANCE: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    pub initial_alpha: f32,
    pub alpha_min: f32,
    pub alpha_decay: f32,
    pub velocity_decay: f32,
    /// Alpha a drag gesture reheats to and holds while the node is pinned.
    pub reheat_alpha: f32,
    pub center_strength: f32,
    pub charge_strength: f32,
    pub theta: f32,
    pub collision_strength: f32,
    pub collision_iterations: usize,
    /// Ticks run before the first frame is drawn.
    pub warmup_ticks: usize,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            initial_alpha: 1.0,
            alpha_min: 0.001,
            alpha_decay: 0.02,
            velocity_decay: 0.4,
            reheat_alpha: 0.3,
            center_strength: 0.05,
            charge_strength: -30.0,
            theta: 0.9,
            collision_strength: 1.0,
            collision_iterations: 1,
            warmup_ticks: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationState {
    Running,
    Settled,
}

impl SimulationState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Settled => "settled",
        }
    }
}

/// Read-only view of the simulation between ticks.
#[derive(Clone, Copy, Debug)]
pub struct LayoutSnapshot<'a> {
    pub nodes: &'a [BubbleNode],
    pub alpha: f32,
    pub state: SimulationState,
}

#[derive(Default)]
struct Scratch {
    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
    radii: Vec<f32>,
    pinned: Vec<bool>,
    corrections: Vec<Vec2>,
}

pub struct Simulation {
    nodes: Vec<BubbleNode>,
    params: SimulationParams,
    center: Vec2,
    padding: f32,
    alpha: f32,
    alpha_target: f32,
    state: SimulationState,
    pending_seconds: f32,
    ticks: u64,
    scratch: Scratch,
}

impl Default for Simulation {
    /// Empty and already settled.
    fn default() -> Self {
        let mut simulation = Self::new(Vec::new(), Vec2::ZERO, 0.0, SimulationParams::default());
        simulation.state = SimulationState::Settled;
        simulation
    }
}

impl Simulation {
    /// Takes ownership of the packed node table; positions are the initial
    /// condition.
    pub fn new(nodes: Vec<BubbleNode>, viewport: Vec2, padding: f32, params: SimulationParams) -> Self {
        let alpha = params.initial_alpha.max(params.alpha_min);
        Self {
            nodes,
            params,
            center: viewport * 0.5,
            padding: padding.max(0.0),
            alpha,
            alpha_target: 0.0,
            state: SimulationState::Running,
            pending_seconds: 0.0,
            ticks: 0,
            scratch: Scratch::default(),
        }
    }

    pub fn nodes(&self) -> &[BubbleNode] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&BubbleNode> {
        self.nodes.get(index)
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn snapshot(&self) -> LayoutSnapshot<'_> {
        LayoutSnapshot {
            nodes: &self.nodes,
            alpha: self.alpha,
            state: self.state,
        }
    }

    /// Raises alpha to at least the interaction level and holds the target
    /// there until [`Self::release`].
    pub fn reheat(&mut self) {
        let level = self.params.reheat_alpha.max(self.params.alpha_min * 2.0);
        self.alpha = self.alpha.max(level);
        self.alpha_target = level;
        self.set_state(SimulationState::Running);
    }

    /// Lets alpha resume its decay toward zero.
    pub fn release(&mut self) {
        self.alpha_target = 0.0;
    }

    /// Holds a node at `position`. Returns `false` for an unknown index.
    pub fn pin(&mut self, index: usize, position: Vec2) -> bool {
        let Some(node) = self.nodes.get_mut(index) else {
            return false;
        };
        if !(position.x.is_finite() && position.y.is_finite()) {
            return false;
        }
        node.pin = Pin::Pinned(position);
        node.position = position;
        node.velocity = Vec2::ZERO;
        true
    }

    pub fn unpin(&mut self, index: usize) {
        if let Some(node) = self.nodes.get_mut(index) {
            node.pin = Pin::Free;
        }
    }

    /// Runs whole ticks for `delta_seconds` of wall time at
    /// [`TICKS_PER_SECOND`], capped per call so a stalled frame cannot
    /// trigger a burst.
    pub fn advance(&mut self, delta_seconds: f32) -> SimulationState {
        if self.state == SimulationState::Settled {
            self.pending_seconds = 0.0;
            return self.state;
        }

        self.pending_seconds += delta_seconds.max(0.0);
        let due = ((self.pending_seconds + 1e-6) * TICKS_PER_SECOND).floor() as usize;
        if due >= MAX_TICKS_PER_ADVANCE {
            // drop the backlog instead of catching up
            self.pending_seconds = 0.0;
        } else {
            self.pending_seconds = (self.pending_seconds - due as f32 / TICKS_PER_SECOND).max(0.0);
        }

        for _ in 0..due.min(MAX_TICKS_PER_ADVANCE) {
            if self.tick() == SimulationState::Settled {
                self.pending_seconds = 0.0;
                break;
            }
        }
        self.state
    }

    /// Deterministic batch stepping; stops early once settled.
    pub fn run(&mut self, ticks: usize) -> SimulationState {
        for _ in 0..ticks {
            if self.tick() == SimulationState::Settled {
                break;
            }
        }
        self.state
    }

    /// One discrete step. A settled simulation is left untouched.
    pub fn tick(&mut self) -> SimulationState {
        if self.state == SimulationState::Settled {
            return self.state;
        }

        self.alpha += (self.alpha_target - self.alpha) * self.params.alpha_decay;
        self.apply_forces();
        self.integrate();
        self.ticks += 1;

        if self.alpha < self.params.alpha_min && self.alpha_target < self.params.alpha_min {
            self.set_state(SimulationState::Settled);
        }
        self.state
    }

    fn set_state(&mut self, state: SimulationState) {
        if self.state != state {
            log::debug!(
                "simulation {} -> {} at alpha {:.4} after {} ticks",
                self.state.label(),
                state.label(),
                self.alpha,
                self.ticks
            );
            self.state = state;
        }
    }

    fn apply_forces(&mut self) {
        let count = self.nodes.len();
        let scratch = &mut self.scratch;
        scratch.positions.clear();
        scratch.velocities.clear();
        scratch.radii.clear();
        scratch.pinned.clear();
        let mut max_radius = 0.0_f32;
        for node in &self.nodes {
            scratch.positions.push(node.position);
            scratch.velocities.push(node.velocity);
            scratch.radii.push(node.radius);
            scratch.pinned.push(node.pin.is_pinned());
            max_radius = max_radius.max(node.radius);
        }

        let alpha = self.alpha;
        apply_centering(
            &scratch.positions,
            &scratch.pinned,
            self.center,
            self.params.center_strength * alpha,
            &mut scratch.velocities,
        );

        if count > 1
            && self.params.charge_strength != 0.0
            && let Some(tree) = QuadTree::build(&scratch.positions)
        {
            let strength = self.params.charge_strength * alpha;
            for index in 0..count {
                if scratch.pinned[index] {
                    continue;
                }
                accumulate_charge(
                    &tree,
                    index,
                    &scratch.positions,
                    strength,
                    self.params.theta,
                    &mut scratch.velocities[index],
                );
            }
        }

        let reach = max_radius * 2.0 + self.padding;
        let params = CollisionParams {
            padding: self.padding,
            strength: self.params.collision_strength.clamp(0.0, 1.0),
            reach_sq: reach * reach,
        };
        for _ in 0..self.params.collision_iterations {
            if count < 2 {
                break;
            }

            // predicted positions, as the velocities stand after the other forces
            let predicted = (0..count)
                .map(|index| {
                    if scratch.pinned[index] {
                        scratch.positions[index]
                    } else {
                        scratch.positions[index] + scratch.velocities[index]
                    }
                })
                .collect::<Vec<_>>();
            let Some(tree) = QuadTree::build(&predicted) else {
                break;
            };

            scratch.corrections.clear();
            scratch.corrections.resize(count, Vec2::ZERO);
            accumulate_collisions(
                &tree,
                &tree,
                true,
                &CollisionInput {
                    positions: &predicted,
                    radii: &scratch.radii,
                    pinned: &scratch.pinned,
                },
                params,
                &mut scratch.corrections,
            );
            for (velocity, correction) in scratch.velocities.iter_mut().zip(&scratch.corrections) {
                *velocity += *correction;
            }
        }

        for (node, velocity) in self.nodes.iter_mut().zip(&scratch.velocities) {
            node.velocity = *velocity;
        }
    }

    fn integrate(&mut self) {
        let retain = 1.0 - self.params.velocity_decay.clamp(0.0, 1.0);
        let center = self.center;
        for node in &mut self.nodes {
            match node.pin {
                Pin::Pinned(position) => {
                    node.position = position;
                    node.velocity = Vec2::ZERO;
                }
                Pin::Free => {
                    node.velocity *= retain;
                    node.position += node.velocity;
                }
            }

            let finite = node.position.x.is_finite()
                && node.position.y.is_finite()
                && node.velocity.x.is_finite()
                && node.velocity.y.is_finite();
            if !finite {
                let (jx, jy) = stable_pair(&node.id);
                let offset = Vec2::new(jx, jy) * (node.radius.max(MIN_SEPARATION) * 2.0);
                log::debug!("reset non-finite position of {}", node.id);
                node.position = center + offset;
                node.velocity = Vec2::ZERO;
            }
        }
    }
}

/// Functional form of one frame: consumes the simulation, advances it by
/// `delta_seconds`, and hands it back.
pub fn step(mut simulation: Simulation, delta_seconds: f32) -> Simulation {
    simulation.advance(delta_seconds);
    simulation
}
