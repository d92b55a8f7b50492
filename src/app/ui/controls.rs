use eframe::egui::{self, Align, Color32, Layout, RichText, Sense, Ui, vec2};

use crate::bubble::{PaletteKind, ViewTransform, sequential_blue};
use crate::util::{format_amount, short_label};

use super::super::ViewModel;

const MATCH_LIST_ROWS: usize = 40;

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Map Controls");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Search (account or token address)")
            .on_hover_text("Fuzzy-highlight matching bubbles without changing the layout.");
        ui.text_edit_singleline(&mut self.search)
            .on_hover_text("Type to highlight matching bubbles, then click one to select it.");
        self.draw_search_matches(ui);

        ui.separator();

        ui.label("Palette");
        ui.horizontal_wrapped(|ui| {
            for kind in PaletteKind::ALL {
                ui.selectable_value(&mut self.palette.kind, kind, kind.label());
            }
        });
        self.draw_legend(ui);

        ui.separator();

        ui.checkbox(&mut self.show_links, "Show links")
            .on_hover_text("Draw an arrow from each sender's bubble to the bubbles it paid.");
        ui.checkbox(&mut self.show_labels, "Show labels")
            .on_hover_text("Write name and amount inside bubbles large enough to hold them.");
        ui.checkbox(&mut self.paused, "Pause physics")
            .on_hover_text("Freeze the simulation; dragging still moves bubbles.");

        ui.horizontal(|ui| {
            if ui
                .button("Reheat")
                .on_hover_text("Wake the simulation and let it settle again.")
                .clicked()
            {
                log::debug!("manual reheat at alpha {:.4}", self.batch.simulation.alpha());
                self.batch.simulation.reheat();
                self.batch.simulation.release();
            }
            if ui.button("Reset view").clicked() {
                self.view = ViewTransform::default();
            }
        });
    }

    fn draw_search_matches(&mut self, ui: &mut Ui) {
        let Some(matches) = self.search_matches() else {
            return;
        };

        let mut indices = matches.iter().copied().collect::<Vec<_>>();
        indices.sort_by(|a, b| {
            let nodes = self.batch.nodes();
            nodes[*b].value.total_cmp(&nodes[*a].value).then(a.cmp(b))
        });
        ui.small(format!("{} matching bubbles", indices.len()));

        let mut picked = None;
        egui::ScrollArea::vertical()
            .id_salt("search_matches_scroll")
            .max_height(180.0)
            .auto_shrink([false, true])
            .show(ui, |ui| {
                for index in indices.into_iter().take(MATCH_LIST_ROWS) {
                    let node = &self.batch.nodes()[index];
                    let is_selected = self.selected == Some(index);
                    let clicked = ui
                        .horizontal(|ui| {
                            let clicked = ui
                                .selectable_label(is_selected, short_label(&node.name, 24))
                                .on_hover_text(node.id.as_str())
                                .clicked();
                            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                                ui.label(format_amount(node.value));
                            });
                            clicked
                        })
                        .inner;
                    if clicked {
                        picked = Some(index);
                    }
                }
            });

        if picked.is_some() {
            self.set_selected(picked);
        }
    }

    fn draw_legend(&self, ui: &mut Ui) {
        let swatch = |ui: &mut Ui, color: Color32, text: String| {
            ui.horizontal(|ui| {
                let (rect, _) = ui.allocate_exact_size(vec2(14.0, 14.0), Sense::hover());
                ui.painter().rect_filled(rect, 3.0, color);
                ui.label(text);
            });
        };

        match self.palette.kind {
            PaletteKind::Threshold => {
                let mut lower = None;
                for (upper, color) in self.palette.thresholds.buckets() {
                    let text = match (lower, upper) {
                        (None, Some(upper)) => format!("< {}", format_amount(upper)),
                        (Some(lower), Some(upper)) => {
                            format!("{} to {}", format_amount(lower), format_amount(upper))
                        }
                        (Some(lower), None) => format!(">= {}", format_amount(lower)),
                        (None, None) => "all values".to_owned(),
                    };
                    swatch(ui, color, text);
                    lower = upper;
                }
            }
            PaletteKind::Sequential => {
                let (min, max) = self.batch.extent;
                swatch(ui, sequential_blue(0.0), format!("{} (smallest)", format_amount(min)));
                swatch(ui, sequential_blue(1.0), format!("{} (largest)", format_amount(max)));
            }
        }
        ui.label(RichText::new(format!("values in {}", self.batch.unit.label())).small());
    }
}
