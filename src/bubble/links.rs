use std::collections::HashMap;

use super::node::BubbleNode;

/// Directed edge between two nodes of the same batch, by node index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Link {
    pub source: usize,
    pub target: usize,
}

impl Link {
    pub fn is_self_link(self) -> bool {
        self.source == self.target
    }
}

/// One link per node whose `from` names the destination of a node in the
/// batch. When several nodes share a destination the first in input order
/// is the one referenced. References that resolve to nothing are dropped.
pub fn infer_links(nodes: &[BubbleNode]) -> Vec<Link> {
    let mut by_destination: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());
    for (index, node) in nodes.iter().enumerate() {
        if let Some(to) = node.to.as_deref() {
            by_destination.entry(to).or_insert(index);
        }
    }

    nodes
        .iter()
        .enumerate()
        .filter_map(|(target, node)| {
            let from = node.from.as_deref()?;
            by_destination
                .get(from)
                .map(|&source| Link { source, target })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bubble::normalize::{AmountUnit, normalize};
    use crate::ledger::TransactionRecord;

    fn nodes_for(rows: &[(&str, &str)]) -> Vec<BubbleNode> {
        let records = rows
            .iter()
            .map(|(from, to)| TransactionRecord::from_parts(from, to, Some(1.0)))
            .collect::<Vec<_>>();
        normalize(&records, AmountUnit::Raw)
    }

    #[test]
    fn chain_links_only_resolvable_sources() {
        let nodes = nodes_for(&[("A", "B"), ("B", "C")]);
        assert_eq!(infer_links(&nodes), vec![Link { source: 0, target: 1 }]);
    }

    #[test]
    fn order_does_not_matter() {
        let nodes = nodes_for(&[("B", "C"), ("A", "B")]);
        assert_eq!(infer_links(&nodes), vec![Link { source: 1, target: 0 }]);
    }

    #[test]
    fn self_links_are_kept() {
        let nodes = nodes_for(&[("A", "A")]);
        let links = infer_links(&nodes);
        assert_eq!(links.len(), 1);
        assert!(links[0].is_self_link());
    }

    #[test]
    fn dangling_and_missing_sources_are_omitted() {
        let nodes = nodes_for(&[("X", "B"), ("", "C"), ("Y", "")]);
        assert!(infer_links(&nodes).is_empty());
    }

    #[test]
    fn hub_fans_out() {
        let nodes = nodes_for(&[("A", "Hub"), ("Hub", "C"), ("Hub", "D"), ("Hub", "E")]);
        let links = infer_links(&nodes);
        assert_eq!(links.len(), 3);
        assert!(links.iter().all(|link| link.source == 0));

        let resolvable = nodes
            .iter()
            .filter(|node| {
                node.from
                    .as_deref()
                    .is_some_and(|from| nodes.iter().any(|other| other.to.as_deref() == Some(from)))
            })
            .count();
        assert!(links.len() <= resolvable);
    }
}
