use std::collections::HashMap;

use eframe::egui::{
    self, Align2, Color32, FontId, Rect, Sense, Shape, Stroke, StrokeKind, Ui, vec2,
};

use crate::animation::EdgeCurve;
use crate::graph::{GraphNode, Level, LinkStatus};
use crate::highlight::Emphasis;
use crate::interaction::HoverTarget;
use crate::physics::LevelBandForce;
use crate::short_label;
use crate::theme::node_radius;

use super::ViewModel;
use super::render_utils::{
    blend_color, circle_visible, curve_visible, draw_arrow_head, draw_background, draw_band_guide,
    draw_curve, draw_tooltip, fade_color, hexagon, tag,
};

const DIMMED_OPACITY: f32 = 0.2;
const DEGRADED_RING: Color32 = Color32::from_rgb(0xE0, 0x4F, 0x3A);

impl ViewModel {
    pub(in crate::app) fn draw_canvas(&mut self, ui: &mut Ui, dt: f32) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        self.canvas_rect = rect;
        self.layout.set_canvas(rect.width(), rect.height());

        let painter = ui.painter_at(rect);
        let view = *self.controller.view();
        draw_background(&painter, rect, &self.palette, view.pan, view.zoom);

        if self.model.is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No data flows match the current filters.",
                FontId::proportional(15.0),
                self.palette.accent2,
            );
            return;
        }

        self.handle_zoom(ui, rect, &response);
        self.handle_drag(rect, &response);

        let moving = self.layout.advance(dt);
        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .filter(|pointer| rect.contains(*pointer));
        let hovered_node = pointer
            .and_then(|pointer| self.controller.hit_test(&self.model, &self.layout, rect, pointer));
        let hovered_edge = match (&hovered_node, pointer) {
            (None, Some(pointer)) => {
                self.controller
                    .hit_test_edge(&self.model, &self.layout, rect, pointer)
            }
            _ => None,
        };

        if hovered_node.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        let target = hovered_node
            .clone()
            .map(HoverTarget::Node)
            .or(hovered_edge.map(HoverTarget::Edge));
        self.controller
            .hover(&self.model, target, pointer.unwrap_or(rect.center()));

        if response.clicked_by(egui::PointerButton::Primary)
            && let Some(node_id) = &hovered_node
        {
            let events = self.controller.click(&self.model, node_id);
            self.apply_selection_events(events);
        }

        self.refresh_highlight();

        if self.model.mode.is_tiered() {
            self.draw_band_guides(&painter, rect);
        }
        let curves = self.draw_edges(&painter, rect);
        if self.show_particles {
            let radius = self.animation.particle_radius * view.zoom.sqrt();
            for particle in self.particles.particles(|edge_id| curves.get(edge_id).cloned()) {
                let emphasis = self.highlight.edge_emphasis(particle.edge_id);
                let color = match emphasis {
                    Emphasis::Dimmed => fade_color(particle.color, DIMMED_OPACITY),
                    _ => particle.color,
                };
                painter.circle_filled(particle.position, radius, color);
            }
        }
        self.draw_nodes(&painter, rect);

        if let Some(tooltip) = self.controller.tooltip() {
            draw_tooltip(&painter, rect, tooltip, &self.palette);
        }

        if moving || response.dragged() {
            ui.ctx().request_repaint();
        }
    }

    fn handle_zoom(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
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
        let factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.controller.zoom_at(rect, pointer, factor);
    }

    /// Primary drag on a node moves it; anywhere else it pans. Secondary
    /// and middle drags always pan.
    fn handle_drag(&mut self, rect: Rect, response: &egui::Response) {
        if response.drag_started_by(egui::PointerButton::Primary)
            && let Some(pointer) = response.interact_pointer_pos()
            && let Some(node_id) =
                self.controller
                    .hit_test(&self.model, &self.layout, rect, pointer)
        {
            self.controller.begin_drag(&mut self.layout, &node_id);
        }

        if response.dragged_by(egui::PointerButton::Primary) {
            match response.interact_pointer_pos() {
                Some(pointer) if self.controller.dragging().is_some() => {
                    self.controller.drag_to(&mut self.layout, rect, pointer);
                }
                _ => self.controller.pan(response.drag_delta()),
            }
        }

        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.controller.pan(response.drag_delta());
        }

        if response.drag_stopped() {
            self.controller.end_drag(&mut self.layout);
        }
    }

    fn draw_band_guides(&self, painter: &egui::Painter, rect: Rect) {
        let view = self.controller.view();
        let height = self.layout.config().height;
        for level in Level::ALL {
            let world = vec2(0.0, LevelBandForce::band_y(level, height));
            let y = view.world_to_screen(rect, world).y;
            draw_band_guide(painter, rect, y, level.label(), self.palette.tertiary);
        }
    }

    /// Draws every edge and returns the screen-space curves for particles.
    fn draw_edges(&self, painter: &egui::Painter, rect: Rect) -> HashMap<&str, EdgeCurve> {
        let view = self.controller.view();
        let width_scale = view.zoom.sqrt();
        let mut curves = HashMap::with_capacity(self.model.edges().len());

        for edge in self.model.edges() {
            let (Some(source), Some(target)) = (
                self.layout.position(&edge.source),
                self.layout.position(&edge.target),
            ) else {
                continue;
            };

            let curve = EdgeCurve::for_edge(
                edge.kind,
                view.world_to_screen(rect, source),
                view.world_to_screen(rect, target),
            );
            if !curve_visible(rect, &curve, 8.0) {
                continue;
            }

            let base = self.palette.edge_color(edge);
            let width = (edge.weight * 1.5 * width_scale).max(0.6);
            let (color, width) = match self.highlight.edge_emphasis(&edge.id) {
                Emphasis::Selected => (base, width * 2.0),
                Emphasis::Dimmed => (fade_color(base, DIMMED_OPACITY), width),
                Emphasis::Connected | Emphasis::Neutral => (fade_color(base, 0.75), width),
            };

            let degraded = edge
                .diagnostics
                .as_ref()
                .is_some_and(|diagnostics| diagnostics.status == LinkStatus::Degraded);
            let color = if degraded {
                blend_color(color, DEGRADED_RING, 0.5)
            } else {
                color
            };

            draw_curve(painter, &curve, Stroke::new(width, color), edge.style);
            if let Some(node) = self.model.node(&edge.target) {
                let inset = node_radius(self.model.mode, node) * view.zoom;
                draw_arrow_head(painter, &curve, inset, color);
            }

            curves.insert(edge.id.as_str(), curve);
        }

        curves
    }

    fn active_step_interface(&self) -> Option<&str> {
        let flow = self.catalogue.flow(self.playback_flow.as_deref()?)?;
        if self.playback.step_count() == 0 {
            return None;
        }
        let steps = flow.ordered_steps();
        let step = steps.get(self.playback.current_step())?;
        step.has_interface().then(|| step.interface_id())
    }

    fn draw_nodes(&self, painter: &egui::Painter, rect: Rect) {
        let view = self.controller.view();
        let active_interface = self.active_step_interface();

        for node in self.model.nodes() {
            let Some(world) = self.layout.position(node.id()) else {
                continue;
            };
            let center = view.world_to_screen(rect, world);
            let radius = node_radius(self.model.mode, node) * view.zoom;
            if !circle_visible(rect, center, radius * 1.3) {
                continue;
            }

            let base = self.palette.node_color(node);
            let emphasis = self.highlight.node_emphasis(node.id());
            let (fill, outline) = match emphasis {
                Emphasis::Selected => (base, Stroke::new(3.0, self.palette.accent1)),
                Emphasis::Connected => (base, Stroke::new(2.0, self.palette.text)),
                Emphasis::Neutral => (base, Stroke::new(1.0, self.palette.text)),
                Emphasis::Dimmed => (
                    fade_color(base, DIMMED_OPACITY),
                    Stroke::new(1.0, fade_color(self.palette.text, DIMMED_OPACITY)),
                ),
            };

            match node {
                GraphNode::System(_) => {
                    let body = Rect::from_center_size(center, vec2(radius * 2.0, radius * 1.2));
                    painter.rect_filled(body, 6.0, fill);
                    painter.rect_stroke(body, 6.0, outline, StrokeKind::Inside);
                }
                GraphNode::Interface(_) => {
                    painter.add(Shape::convex_polygon(hexagon(center, radius), fill, outline));
                }
                GraphNode::Flow(flow) => {
                    painter.add(Shape::convex_polygon(tag(center, radius), fill, outline));
                    let failing = flow
                        .technical_metrics
                        .as_ref()
                        .is_some_and(|metrics| metrics.has_error);
                    if failing {
                        painter.circle_stroke(center, radius * 1.25, Stroke::new(2.0, DEGRADED_RING));
                    }
                }
            }

            if active_interface == Some(node.id()) {
                painter.circle_stroke(
                    center,
                    radius * 1.2,
                    Stroke::new(2.5, self.palette.accent1),
                );
            }

            if self.layout.body(node.id()).is_some_and(|body| body.pinned.is_some()) {
                painter.circle_filled(
                    center + vec2(radius * 0.8, -radius * 0.5),
                    3.0,
                    self.palette.primary,
                );
            }

            let label_color = match emphasis {
                Emphasis::Dimmed => fade_color(self.palette.text, 0.35),
                _ => self.palette.text,
            };
            let show_label = view.zoom > 0.55 || emphasis != Emphasis::Neutral || node.is_hub();
            if show_label {
                painter.text(
                    center + vec2(0.0, radius * 0.75 + 10.0),
                    Align2::CENTER_TOP,
                    short_label(node.label()),
                    FontId::proportional((11.0 * view.zoom.sqrt()).clamp(9.0, 15.0)),
                    label_color,
                );
            }
        }
    }
}
