use eframe::egui::{self, Align, Context, Layout, Vec2};

use crate::bubble::{Batch, DragState, Palette, SimulationState, ViewTransform};

use super::super::{PanelRequests, ViewModel};

impl ViewModel {
    pub(in crate::app) fn new(batch: Batch, palette: Palette) -> Self {
        Self {
            batch,
            palette,
            view: ViewTransform::default(),
            drag: DragState::default(),
            press_target: None,
            search: String::new(),
            search_match_cache: None,
            selected: None,
            show_links: true,
            show_labels: true,
            paused: false,
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        loading: Option<&str>,
        canvas_size: &mut Vec2,
    ) -> PanelRequests {
        let mut requests = PanelRequests::default();

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("bubble-map");
                    ui.separator();
                    ui.label(format!("source: {}", self.batch.source));
                    if ui.button("Open file...").clicked() {
                        requests.open_dialog = true;
                    }
                    if let Some(name) = loading {
                        ui.spinner();
                        ui.label(format!("loading {name}"));
                    }
                });
            });

        egui::TopBottomPanel::bottom("status_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(self.status_text());
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(format!("zoom {:.2}x", self.view.scale));
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(280.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_map(ui, canvas_size));

        requests
    }

    fn status_text(&self) -> String {
        let snapshot = self.batch.simulation.snapshot();
        let state = if self.paused && snapshot.state == SimulationState::Running {
            "paused"
        } else {
            snapshot.state.label()
        };
        format!(
            "nodes: {}  |  links: {}  |  alpha: {:.3}  |  {} after {} ticks",
            snapshot.nodes.len(),
            self.batch.links.len(),
            snapshot.alpha,
            state,
            self.batch.simulation.ticks()
        )
    }
}
