//! Everything between parsed ledger rows and a drawable, interactive scene.

mod color;
mod interaction;
mod links;
mod node;
mod normalize;
mod pack;
mod simulation;

use eframe::egui::Vec2;

use crate::ledger::TransactionRecord;

pub use color::{Palette, PaletteKind, ThresholdScale, sequential_blue};
pub use interaction::{DragState, ViewTransform};
pub use links::{Link, infer_links};
pub use node::BubbleNode;
pub use normalize::{AmountUnit, normalize};
pub use pack::{PackOptions, pack};
pub use simulation::{Simulation, SimulationParams, SimulationState, step};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BatchOptions {
    pub unit: AmountUnit,
    pub padding: f32,
    pub min_radius: f32,
    pub simulation: SimulationParams,
}

/// One loaded file turned into nodes, links and a running simulation.
///
/// A batch owns all of its state; replacing the batch drops the previous
/// simulation with it.
pub struct Batch {
    pub id: u64,
    pub source: String,
    pub unit: AmountUnit,
    pub records: Vec<TransactionRecord>,
    pub links: Vec<Link>,
    pub simulation: Simulation,
    /// Smallest and largest node value.
    pub extent: (f64, f64),
}

impl Batch {
    pub fn build(
        id: u64,
        source: impl Into<String>,
        records: Vec<TransactionRecord>,
        viewport: Vec2,
        options: &BatchOptions,
    ) -> Self {
        let source = source.into();
        let mut nodes = normalize(&records, options.unit);
        let fits = pack(
            &mut nodes,
            viewport,
            PackOptions {
                padding: options.padding,
                min_radius: options.min_radius,
            },
        );
        let links = infer_links(&nodes);

        let extent = nodes
            .iter()
            .map(|node| node.value)
            .fold(None, |extent: Option<(f64, f64)>, value| match extent {
                None => Some((value, value)),
                Some((min, max)) => Some((min.min(value), max.max(value))),
            })
            .unwrap_or((0.0, 0.0));

        log::info!(
            "batch {id} from {source}: {} nodes, {} links, values {:.2}..{:.2} ({}){}",
            nodes.len(),
            links.len(),
            extent.0,
            extent.1,
            options.unit.label(),
            if fits { "" } else { ", packed past the viewport" }
        );

        let mut simulation = Simulation::new(nodes, viewport, options.padding, options.simulation);
        if options.simulation.warmup_ticks > 0 {
            simulation.run(options.simulation.warmup_ticks);
        }
        Self {
            id,
            source,
            unit: options.unit,
            records,
            links,
            simulation,
            extent,
        }
    }

    pub fn nodes(&self) -> &[BubbleNode] {
        self.simulation.nodes()
    }

    pub fn record_of(&self, node: &BubbleNode) -> Option<&TransactionRecord> {
        self.records.get(node.record)
    }

    /// Topmost node under `world`. Later nodes are drawn over earlier ones.
    pub fn node_at(&self, world: Vec2) -> Option<usize> {
        self.nodes().iter().rposition(|node| node.contains(world))
    }

    /// Links touching `index`, as `(other node, is outgoing)`.
    pub fn neighbours(&self, index: usize) -> impl Iterator<Item = (usize, bool)> + '_ {
        self.links.iter().filter_map(move |link| {
            if link.source == index {
                Some((link.target, true))
            } else if link.target == index {
                Some((link.source, false))
            } else {
                None
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;

    const VIEWPORT: Vec2 = Vec2::new(600.0, 400.0);

    fn options() -> BatchOptions {
        BatchOptions {
            unit: AmountUnit::Raw,
            padding: 8.0,
            min_radius: 4.0,
            simulation: SimulationParams::default(),
        }
    }

    #[test]
    fn two_row_chain() {
        let records = vec![
            TransactionRecord::from_parts("A", "B", Some(100.0)),
            TransactionRecord::from_parts("B", "C", Some(50.0)),
        ];
        let batch = Batch::build(1, "chain.csv", records, VIEWPORT, &options());

        let nodes = batch.nodes();
        assert_eq!(nodes.len(), 2);
        assert_eq!((nodes[0].id.as_str(), nodes[1].id.as_str()), ("B", "C"));
        assert_eq!(batch.links, [Link { source: 0, target: 1 }]);
        assert!(nodes[0].radius > nodes[1].radius);
        assert_eq!(batch.extent, (50.0, 100.0));
        assert_eq!(batch.neighbours(1).collect::<Vec<_>>(), [(0, false)]);
    }

    #[test]
    fn single_zero_row() {
        let records = vec![TransactionRecord::from_parts("A", "B", Some(0.0))];
        let batch = Batch::build(1, "zero.csv", records, VIEWPORT, &options());

        assert_eq!(batch.nodes().len(), 1);
        assert_eq!(batch.nodes()[0].radius, 4.0);
        assert!(batch.links.is_empty());
    }

    #[test]
    fn warmup_ticks_run_before_first_frame() {
        let mut options = options();
        options.simulation.warmup_ticks = 10;
        let records = vec![TransactionRecord::from_parts("A", "B", Some(1.0))];
        let batch = Batch::build(1, "warm.csv", records, VIEWPORT, &options);
        assert_eq!(batch.simulation.ticks(), 10);
    }

    #[test]
    fn hit_test_prefers_topmost() {
        let records = vec![
            TransactionRecord::from_parts("A", "B", Some(100.0)),
            TransactionRecord::from_parts("B", "C", Some(50.0)),
        ];
        let mut batch = Batch::build(1, "hit.csv", records, VIEWPORT, &options());
        let spot = vec2(300.0, 200.0);
        batch.simulation.pin(0, spot);
        batch.simulation.pin(1, spot);

        assert_eq!(batch.node_at(spot), Some(1));
        assert_eq!(batch.node_at(vec2(-1000.0, -1000.0)), None);
    }

    #[test]
    fn replacing_a_batch_leaves_nothing_behind() {
        let first = Batch::build(
            1,
            "first.csv",
            vec![TransactionRecord::from_parts("A", "old", Some(3.0))],
            VIEWPORT,
            &options(),
        );
        let mut current = Some(first);
        if let Some(batch) = current.as_mut() {
            batch.simulation.run(5);
        }

        current = Some(Batch::build(
            2,
            "second.csv",
            vec![
                TransactionRecord::from_parts("X", "new", Some(1.0)),
                TransactionRecord::from_parts("new", "newer", Some(2.0)),
            ],
            VIEWPORT,
            &options(),
        ));

        let batch = current.unwrap();
        assert_eq!(batch.id, 2);
        assert!(batch.nodes().iter().all(|node| node.name != "old"));
        assert_eq!(batch.simulation.ticks(), 0);
        assert_eq!(batch.links.len(), 1);
    }
}
