use eframe::egui::{self, RichText, Ui};

use crate::util::format_amount;

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        let Some(selected) = self.selected else {
            ui.label("Click a bubble to inspect its transaction.");
            return;
        };

        let Some(node) = self.batch.nodes().get(selected) else {
            ui.label("Selected bubble no longer exists in this batch.");
            return;
        };

        ui.label(RichText::new(node.name.as_str()).strong());
        if node.id != node.name {
            ui.small(format!("id: {}", node.id));
        }
        ui.label(format!(
            "Value: {} ({})",
            format_amount(node.value),
            self.batch.unit.label()
        ));
        match node.pin.fixed_position() {
            Some(pin) => ui.label(format!("Pinned at ({:.0}, {:.0})", pin.x, pin.y)),
            None => ui.label("Free"),
        };

        ui.separator();
        ui.label(RichText::new("Transaction").strong());
        if let Some(record) = self.batch.record_of(node) {
            let optional = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_owned());
            let text_or_dash = |value: &str| {
                if value.is_empty() { "-".to_owned() } else { value.to_owned() }
            };

            egui::Grid::new("record_fields")
                .num_columns(2)
                .striped(true)
                .show(ui, |ui| {
                    let rows = [
                        ("Signature", text_or_dash(&record.signature)),
                        ("Timestamp", text_or_dash(&record.timestamp)),
                        ("Type", text_or_dash(&record.kind)),
                        ("From", optional(&record.from)),
                        ("To", optional(&record.to)),
                        (
                            "Amount",
                            record
                                .amount
                                .map_or_else(|| "-".to_owned(), |amount| amount.to_string()),
                        ),
                        (
                            "Decimals",
                            record
                                .decimals
                                .map_or_else(|| "-".to_owned(), |decimals| decimals.to_string()),
                        ),
                        ("Token address", text_or_dash(&record.token_address)),
                    ];
                    for (label, value) in rows {
                        ui.label(label);
                        ui.label(value);
                        ui.end_row();
                    }
                });
        }

        ui.separator();
        ui.label(RichText::new("Links").strong());
        let neighbours = self.batch.neighbours(selected).collect::<Vec<_>>();
        if neighbours.is_empty() {
            ui.label("No links in this batch.");
            return;
        }

        let mut picked = None;
        egui::ScrollArea::vertical()
            .id_salt("links_scroll")
            .max_height(260.0)
            .auto_shrink([false, true])
            .show(ui, |ui| {
                for (other, outgoing) in neighbours {
                    let Some(other_node) = self.batch.nodes().get(other) else {
                        continue;
                    };
                    let arrow = if other == selected {
                        "self"
                    } else if outgoing {
                        "->"
                    } else {
                        "<-"
                    };
                    let label = format!(
                        "{arrow} {}  ({})",
                        other_node.name,
                        format_amount(other_node.value)
                    );
                    if ui.link(label).on_hover_text(other_node.id.as_str()).clicked() {
                        picked = Some(other);
                    }
                }
            });

        if picked.is_some() {
            self.set_selected(picked);
        }
    }
}
