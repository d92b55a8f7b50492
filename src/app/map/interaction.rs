use eframe::egui::{self, PointerButton, Rect, Response, Ui};

use super::super::ViewModel;
use super::super::render_utils::screen_to_world;

impl ViewModel {
    pub(in crate::app) fn handle_map_zoom(&mut self, ui: &Ui, rect: Rect, response: &Response) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.view.zoom_about(pointer - rect.min, zoom_factor);
    }

    /// Primary drag on a bubble moves it; primary drag on empty canvas, or a
    /// secondary/middle drag anywhere, pans.
    pub(in crate::app) fn handle_map_pointer(&mut self, ui: &Ui, rect: Rect, response: &Response) {
        if response.drag_started_by(PointerButton::Primary) {
            let origin = ui
                .input(|input| input.pointer.press_origin())
                .or_else(|| response.interact_pointer_pos());
            self.press_target = None;
            if let Some(origin) = origin {
                let world = screen_to_world(rect, self.view, origin);
                if let Some(index) = self.batch.node_at(world)
                    && self.drag.start(&mut self.batch.simulation, index, world)
                {
                    self.press_target = Some(index);
                    self.selected = Some(index);
                }
            }
        }

        if response.dragged_by(PointerButton::Primary) {
            match (self.press_target, response.interact_pointer_pos()) {
                (Some(_), Some(pointer)) => {
                    let world = screen_to_world(rect, self.view, pointer);
                    self.drag.update(&mut self.batch.simulation, world);
                }
                (None, _) => self.view.pan_by(response.drag_delta()),
                (Some(_), None) => {}
            }
        }

        if response.dragged_by(PointerButton::Secondary)
            || response.dragged_by(PointerButton::Middle)
        {
            self.view.pan_by(response.drag_delta());
        }

        if response.drag_stopped() {
            self.drag.end(&mut self.batch.simulation);
            self.press_target = None;
        }

        if response.clicked_by(PointerButton::Primary) {
            let hit = response
                .interact_pointer_pos()
                .and_then(|pointer| self.batch.node_at(screen_to_world(rect, self.view, pointer)));
            self.set_selected(hit);
        }

        if self.press_target.is_some() {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::Grabbing);
        }
    }

    pub(in crate::app) fn hovered_index(&self, ui: &Ui, rect: Rect) -> Option<usize> {
        if let Some(index) = self.drag.dragged_node() {
            return Some(index);
        }

        let pointer = ui.input(|input| input.pointer.hover_pos())?;
        if !rect.contains(pointer) {
            return None;
        }
        self.batch.node_at(screen_to_world(rect, self.view, pointer))
    }

    pub(in crate::app) fn set_selected(&mut self, selected: Option<usize>) {
        if self.selected != selected {
            log::debug!("selection {:?} -> {selected:?}", self.selected);
            self.selected = selected;
        }
    }
}
