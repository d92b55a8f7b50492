use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{self, Align2, Color32, FontId, Pos2, Sense, Stroke, Ui, Vec2, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::bubble::{SimulationState, step};
use crate::util::{format_amount, short_label};

use super::super::render_utils::{
    blend_color, circle_visible, dim_color, draw_arrow, draw_background, label_color,
    link_endpoints, segment_visible, world_to_screen,
};
use super::super::{SearchMatchCache, ViewModel};

const MIN_LABEL_FONT: f32 = 4.0;
const MAX_LABEL_FONT: f32 = 10.0;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

impl ViewModel {
    pub(in crate::app) fn search_matches(&mut self) -> Option<Arc<HashSet<usize>>> {
        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        if let Some(cached) = &self.search_match_cache
            && cached.batch_id == self.batch.id
            && cached.query == query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let matcher = SkimMatcherV2::default();
        let matches = self
            .batch
            .nodes()
            .iter()
            .enumerate()
            .filter(|(_, node)| {
                fuzzy_match_score(&matcher, &node.name, query).is_some()
                    || self.batch.record_of(node).is_some_and(|record| {
                        !record.token_address.is_empty()
                            && fuzzy_match_score(&matcher, &record.token_address, query).is_some()
                    })
            })
            .map(|(index, _)| index)
            .collect::<HashSet<_>>();
        let matches = Arc::new(matches);

        self.search_match_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            batch_id: self.batch.id,
            matches: Arc::clone(&matches),
        });

        Some(matches)
    }

    fn advance_simulation(&mut self, ui: &Ui) {
        if self.paused {
            return;
        }

        let delta_seconds = ui.ctx().input(|input| input.stable_dt).clamp(0.0, 0.25);
        let simulation = std::mem::take(&mut self.batch.simulation);
        self.batch.simulation = step(simulation, delta_seconds);
    }

    pub(in crate::app) fn draw_map(&mut self, ui: &mut Ui, canvas_size: &mut Vec2) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        *canvas_size = rect.size();
        let painter = ui.painter_at(rect);

        draw_background(&painter, rect, self.view);

        self.handle_map_zoom(ui, rect, &response);
        self.handle_map_pointer(ui, rect, &response);
        self.advance_simulation(ui);

        let running = self.batch.simulation.state() == SimulationState::Running;
        if (running && !self.paused) || self.drag.dragged_node().is_some() {
            ui.ctx().request_repaint();
        }

        let matches = self.search_matches();
        let search_active = matches.as_ref().is_some_and(|matches| !matches.is_empty());
        let hovered = self.hovered_index(ui, rect);
        if hovered.is_some() && self.drag.dragged_node().is_none() {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
        }

        let view = self.view;
        let snapshot = self.batch.simulation.snapshot();
        let screen = snapshot
            .nodes
            .iter()
            .map(|node| (world_to_screen(rect, view, node.position), node.radius * view.scale))
            .collect::<Vec<(Pos2, f32)>>();

        if self.show_links {
            let link_width = (1.2 * view.scale.sqrt()).clamp(0.6, 3.0);
            let head = (6.0 * view.scale.sqrt()).clamp(3.0, 12.0);
            for link in &self.batch.links {
                let (Some(&(from, from_radius)), Some(&(to, to_radius))) =
                    (screen.get(link.source), screen.get(link.target))
                else {
                    continue;
                };

                let focused = [self.selected, hovered]
                    .into_iter()
                    .flatten()
                    .any(|index| index == link.source || index == link.target);
                let color = if focused {
                    Color32::from_rgb(241, 146, 94)
                } else {
                    Color32::from_rgba_unmultiplied(150, 160, 172, 150)
                };
                let stroke = Stroke::new(if focused { link_width * 1.8 } else { link_width }, color);

                if link.is_self_link() {
                    // degenerate zero-length segment
                    if circle_visible(rect, from, from_radius) {
                        painter.line_segment([from, to], stroke);
                    }
                    continue;
                }
                if !segment_visible(rect, from, to, 2.0) {
                    continue;
                }
                if let Some((start, end)) = link_endpoints(from, from_radius, to, to_radius) {
                    draw_arrow(&painter, start, end, stroke, head);
                }
            }
        }

        let selected_color = Color32::from_rgb(245, 206, 93);
        for (index, node) in snapshot.nodes.iter().enumerate() {
            let (position, radius) = screen[index];
            if !circle_visible(rect, position, radius) {
                continue;
            }

            let base_color = self.palette.color_for(node.value, self.batch.extent);
            let is_match = matches.as_ref().is_some_and(|matches| matches.contains(&index));
            let is_hovered = hovered == Some(index);
            let is_selected = self.selected == Some(index);

            let fill = if is_hovered {
                blend_color(base_color, Color32::WHITE, 0.25)
            } else if is_match {
                blend_color(base_color, Color32::from_rgb(103, 196, 255), 0.55)
            } else if search_active {
                dim_color(base_color, 0.4)
            } else {
                base_color
            };

            painter.circle_filled(position, radius, fill);
            let (stroke_width, stroke_color) = if is_selected {
                (2.4, selected_color)
            } else if node.pin.is_pinned() {
                (1.8, Color32::from_gray(235))
            } else {
                (1.0, Color32::from_rgba_unmultiplied(15, 15, 15, 190))
            };
            painter.circle_stroke(position, radius, Stroke::new(stroke_width, stroke_color));

            let font_size = (radius / 5.0).min(MAX_LABEL_FONT);
            if self.show_labels && font_size >= MIN_LABEL_FONT {
                let max_chars = ((radius * 2.0) / (font_size * 0.62)).floor().max(3.0) as usize;
                let text_color = label_color(fill);
                painter.text(
                    position - vec2(0.0, font_size * 0.6),
                    Align2::CENTER_CENTER,
                    short_label(&node.name, max_chars),
                    FontId::proportional(font_size),
                    text_color,
                );
                painter.text(
                    position + vec2(0.0, font_size * 0.7),
                    Align2::CENTER_CENTER,
                    format_amount(node.value),
                    FontId::proportional(font_size * 0.9),
                    text_color,
                );
            }
        }

        if let Some(node) = hovered.and_then(|index| snapshot.nodes.get(index)) {
            let text = format!("{}: {}", node.name, node.value);
            let anchor = ui
                .input(|input| input.pointer.hover_pos())
                .unwrap_or_else(|| rect.left_top())
                + vec2(14.0, 14.0);
            let galley = painter.layout_no_wrap(text, FontId::proportional(13.0), Color32::from_gray(240));
            let tooltip = egui::Rect::from_min_size(anchor, galley.size()).expand(5.0);
            painter.rect_filled(tooltip, 4.0, Color32::from_rgba_unmultiplied(12, 14, 18, 230));
            painter.galley(anchor, galley, Color32::from_gray(240));
        }
    }
}
