use std::collections::{HashMap, HashSet};

use clap::ValueEnum;
use eframe::egui::Vec2;
use serde::Deserialize;

use crate::ledger::TransactionRecord;

use super::node::{BubbleNode, Pin};

/// Label used for rows with no destination.
pub const FALLBACK_NAME: &str = "Transfer";

/// Unit node values (and therefore color thresholds) are expressed in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum AmountUnit {
    /// The amount exactly as exported, usually integer base units.
    #[default]
    Raw,
    /// `amount / 10^decimals`.
    DecimalAdjusted,
}

impl AmountUnit {
    pub fn label(self) -> &'static str {
        match self {
            Self::Raw => "raw units",
            Self::DecimalAdjusted => "decimal-adjusted",
        }
    }
}

/// Non-negative finite value for a record; anything unusable becomes `0.0`.
pub fn record_value(record: &TransactionRecord, unit: AmountUnit) -> f64 {
    let Some(amount) = record.amount.filter(|amount| amount.is_finite()) else {
        return 0.0;
    };

    let value = match unit {
        AmountUnit::Raw => amount,
        AmountUnit::DecimalAdjusted => {
            let decimals = record.decimals.unwrap_or(0).min(i32::MAX as u32) as i32;
            amount / 10f64.powi(decimals)
        }
    };

    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

pub fn normalize(records: &[TransactionRecord], unit: AmountUnit) -> Vec<BubbleNode> {
    let mut seen: HashMap<&str, usize> = HashMap::with_capacity(records.len());
    let mut taken: HashSet<String> = HashSet::with_capacity(records.len());
    let mut degraded = 0usize;

    let nodes = records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            if !record.amount.is_some_and(|amount| amount.is_finite() && amount >= 0.0) {
                degraded += 1;
            }

            let name = record.to.as_deref().unwrap_or(FALLBACK_NAME);
            let occurrence = seen.entry(name).or_insert(0);
            *occurrence += 1;
            let mut id = if *occurrence == 1 {
                name.to_owned()
            } else {
                format!("{name}#{occurrence}")
            };
            // a literal "B#2" destination may already hold the suffixed id
            while taken.contains(&id) {
                *occurrence += 1;
                id = format!("{name}#{occurrence}");
            }
            taken.insert(id.clone());

            BubbleNode {
                id,
                name: name.to_owned(),
                value: record_value(record, unit),
                from: record.from.clone(),
                to: record.to.clone(),
                record: index,
                position: Vec2::ZERO,
                velocity: Vec2::ZERO,
                radius: 0.0,
                pin: Pin::Free,
            }
        })
        .collect::<Vec<_>>();

    if degraded > 0 {
        log::warn!("{degraded} of {} rows had a missing or unusable amount", records.len());
    }

    nodes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nodes_are_named_by_destination() {
        let records = vec![
            TransactionRecord::from_parts("A", "B", Some(100.0)),
            TransactionRecord::from_parts("B", "C", Some(50.0)),
        ];
        let nodes = normalize(&records, AmountUnit::Raw);

        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].id, "B");
        assert_eq!(nodes[0].from.as_deref(), Some("A"));
        assert_eq!(nodes[0].value, 100.0);
        assert_eq!(nodes[1].id, "C");
        assert_eq!(nodes[1].record, 1);
    }

    #[test]
    fn missing_destination_falls_back_to_transfer() {
        let records = vec![TransactionRecord::from_parts("A", "", Some(1.0))];
        let nodes = normalize(&records, AmountUnit::Raw);
        assert_eq!(nodes[0].name, FALLBACK_NAME);
        assert_eq!(nodes[0].to, None);
    }

    #[test]
    fn repeated_destinations_get_unique_ids() {
        let records = vec![
            TransactionRecord::from_parts("A", "B", Some(1.0)),
            TransactionRecord::from_parts("C", "B", Some(2.0)),
            TransactionRecord::from_parts("D", "B", Some(3.0)),
        ];
        let nodes = normalize(&records, AmountUnit::Raw);
        let ids = nodes.iter().map(|node| node.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, ["B", "B#2", "B#3"]);
        assert!(nodes.iter().all(|node| node.name == "B"));
    }

    #[test]
    fn suffixed_destination_does_not_collide() {
        let records = vec![
            TransactionRecord::from_parts("A", "B", Some(1.0)),
            TransactionRecord::from_parts("A", "B#2", Some(1.0)),
            TransactionRecord::from_parts("A", "B", Some(1.0)),
        ];
        let nodes = normalize(&records, AmountUnit::Raw);
        let ids = nodes.iter().map(|node| node.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, ["B", "B#2", "B#3"]);

        let unique = ids.iter().collect::<HashSet<_>>();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn bad_amounts_degrade_to_zero() {
        let records = vec![
            TransactionRecord::from_parts("A", "B", None),
            TransactionRecord::from_parts("A", "C", Some(f64::NAN)),
            TransactionRecord::from_parts("A", "D", Some(-5.0)),
        ];
        let nodes = normalize(&records, AmountUnit::Raw);
        assert!(nodes.iter().all(|node| node.value == 0.0));
    }

    #[test]
    fn decimal_adjusted_divides_by_decimals() {
        let mut record = TransactionRecord::from_parts("A", "B", Some(1_500_000.0));
        record.decimals = Some(6);
        assert_eq!(record_value(&record, AmountUnit::Raw), 1_500_000.0);
        assert!((record_value(&record, AmountUnit::DecimalAdjusted) - 1.5).abs() < 1e-12);

        record.decimals = None;
        assert_eq!(record_value(&record, AmountUnit::DecimalAdjusted), 1_500_000.0);
    }
}
