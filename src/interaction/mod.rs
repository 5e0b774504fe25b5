//! Pointer gestures mapped onto view, layout and selection.

mod tooltip;
mod view;

use eframe::egui::{Pos2, Rect, Vec2};

use crate::animation::EdgeCurve;
use crate::catalog::flow_node_id;
use crate::graph::{GraphModel, GraphNode};
use crate::physics::LayoutEngine;
use crate::theme::node_radius;

pub use tooltip::{Tooltip, edge_tooltip, node_tooltip};
pub use view::{MAX_ZOOM, MIN_ZOOM, ViewTransform, ZOOM_IN_STEP, ZOOM_OUT_STEP};

const EDGE_HIT_DISTANCE: f32 = 6.0;
const EDGE_HIT_SEGMENTS: usize = 16;

/// Intent forwarded to whoever owns the selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectionEvent {
    SelectFlow(Option<String>),
    SelectSystem(Option<String>),
}

/// The outward-facing selection. At most one side is set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    pub flow: Option<String>,
    pub system: Option<String>,
}

impl Selection {
    pub fn flow(flow_id: impl Into<String>) -> Self {
        Self {
            flow: Some(flow_id.into()),
            system: None,
        }
    }

    pub fn system(name: impl Into<String>) -> Self {
        Self {
            flow: None,
            system: Some(name.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.flow.is_none() && self.system.is_none()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HoverTarget {
    Node(String),
    Edge(String),
}

#[derive(Debug, Default)]
pub struct InteractionController {
    view: ViewTransform,
    selection: Selection,
    focus: Option<String>,
    dragging: Option<String>,
    tooltip: Option<Tooltip>,
}

impl InteractionController {
    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ViewTransform {
        &mut self.view
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Node currently driving the highlight.
    pub fn focus(&self) -> Option<&str> {
        self.focus.as_deref()
    }

    /// A drag in progress takes over the highlight.
    pub fn highlight_target(&self) -> Option<&str> {
        self.dragging.as_deref().or(self.focus.as_deref())
    }

    pub fn tooltip(&self) -> Option<&Tooltip> {
        self.tooltip.as_ref()
    }

    pub fn pan(&mut self, delta: Vec2) {
        self.view.pan_by(delta);
    }

    pub fn zoom_at(&mut self, rect: Rect, pointer: Pos2, factor: f32) {
        self.view.zoom_at(rect, pointer, factor);
    }

    pub fn zoom_by(&mut self, rect: Rect, factor: f32) {
        self.view.zoom_by(rect, factor);
    }

    pub fn reset_view(&mut self) {
        self.view.reset();
    }

    fn select_flow(&mut self, flow_id: Option<String>, events: &mut Vec<SelectionEvent>) {
        if flow_id.is_some() && self.selection.system.take().is_some() {
            events.push(SelectionEvent::SelectSystem(None));
        }
        self.selection.flow = flow_id.clone();
        events.push(SelectionEvent::SelectFlow(flow_id));
    }

    fn select_system(&mut self, name: Option<String>, events: &mut Vec<SelectionEvent>) {
        if name.is_some() && self.selection.flow.take().is_some() {
            events.push(SelectionEvent::SelectFlow(None));
        }
        self.selection.system = name.clone();
        events.push(SelectionEvent::SelectSystem(name));
    }

    /// Handles a click on a node. Clicking the focused node again clears it.
    pub fn click(&mut self, model: &GraphModel, node_id: &str) -> Vec<SelectionEvent> {
        let Some(node) = model.node(node_id) else {
            return Vec::new();
        };

        let mut events = Vec::new();
        let again = self.focus.as_deref() == Some(node_id);

        match node {
            GraphNode::System(system) => {
                if again {
                    self.focus = None;
                    self.select_system(None, &mut events);
                } else {
                    self.focus = Some(system.id.clone());
                    self.select_system(Some(system.id.clone()), &mut events);
                }
            }
            GraphNode::Flow(flow) => {
                if again {
                    self.focus = None;
                    self.select_flow(None, &mut events);
                } else {
                    self.focus = Some(flow.id.clone());
                    self.select_flow(Some(flow.display_id.clone()), &mut events);
                }
            }
            GraphNode::Interface(interface) => {
                self.focus = (!again).then(|| interface.id.clone());
                let only_flow = match interface.flow_ids.as_slice() {
                    [flow_id] if !again => Some(flow_id.clone()),
                    _ => None,
                };
                self.select_flow(only_flow, &mut events);
            }
        }

        tracing::debug!(node = node_id, ?events, "selection dispatched");
        events
    }

    /// Adopts a selection made outside the canvas.
    pub fn sync_external(&mut self, model: &GraphModel, selection: &Selection) -> bool {
        let mut selection = selection.clone();
        if selection.flow.is_some() {
            selection.system = None;
        }
        if selection == self.selection {
            return false;
        }

        self.selection = selection;
        self.focus = self.selection_focus(model);
        true
    }

    /// Node the current selection points at, if the model has it.
    fn selection_focus(&self, model: &GraphModel) -> Option<String> {
        match (&self.selection.flow, &self.selection.system) {
            (Some(flow_id), _) => Some(flow_node_id(flow_id)),
            (None, Some(system)) => Some(system.clone()),
            (None, None) => None,
        }
        .filter(|id| model.node(id).is_some())
    }

    /// Reconciles focus with a rebuilt model. A focus that survived is kept;
    /// otherwise the selection's node takes over once it is back.
    pub fn retain_focus(&mut self, model: &GraphModel) {
        if !self.focus.as_deref().is_some_and(|id| model.node(id).is_some()) {
            self.focus = self.selection_focus(model);
        }
        if self.dragging.as_deref().is_some_and(|id| model.node(id).is_none()) {
            self.dragging = None;
        }
        self.tooltip = None;
    }

    pub fn begin_drag(&mut self, engine: &mut LayoutEngine, node_id: &str) -> bool {
        if !engine.begin_drag(node_id) {
            return false;
        }
        self.dragging = Some(node_id.to_owned());
        self.tooltip = None;
        true
    }

    pub fn drag_to(&mut self, engine: &mut LayoutEngine, rect: Rect, pointer: Pos2) {
        if self.dragging.is_some() {
            engine.drag_to(self.view.screen_to_world(rect, pointer));
        }
    }

    pub fn end_drag(&mut self, engine: &mut LayoutEngine) {
        if self.dragging.take().is_some() {
            engine.end_drag();
        }
    }

    pub fn dragging(&self) -> Option<&str> {
        self.dragging.as_deref()
    }

    pub fn hover(&mut self, model: &GraphModel, target: Option<HoverTarget>, pointer: Pos2) {
        let text = match target {
            Some(HoverTarget::Node(id)) => model.node(&id).map(|node| node_tooltip(model, node)),
            Some(HoverTarget::Edge(id)) => model.edge(&id).map(|edge| edge_tooltip(model, edge)),
            None => None,
        };
        self.tooltip = text
            .filter(|_| self.dragging.is_none())
            .map(|text| Tooltip::at(pointer, text));
    }

    /// Topmost node under the pointer.
    pub fn hit_test(
        &self,
        model: &GraphModel,
        engine: &LayoutEngine,
        rect: Rect,
        pointer: Pos2,
    ) -> Option<String> {
        model
            .nodes()
            .iter()
            .filter_map(|node| {
                let world = engine.position(node.id())?;
                let screen = self.view.world_to_screen(rect, world);
                let radius = node_radius(model.mode, node) * self.view.zoom;
                let distance = screen.distance(pointer);
                (distance <= radius).then_some((node.id(), distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id.to_owned())
    }

    pub fn hit_test_edge(
        &self,
        model: &GraphModel,
        engine: &LayoutEngine,
        rect: Rect,
        pointer: Pos2,
    ) -> Option<String> {
        model
            .edges()
            .iter()
            .filter_map(|edge| {
                let start = self
                    .view
                    .world_to_screen(rect, engine.position(&edge.source)?);
                let end = self
                    .view
                    .world_to_screen(rect, engine.position(&edge.target)?);
                let curve = EdgeCurve::for_edge(edge.kind, start, end);
                curve.length()?;

                let distance = curve
                    .polyline(EDGE_HIT_SEGMENTS)
                    .windows(2)
                    .map(|segment| distance_to_segment(pointer, segment[0], segment[1]))
                    .fold(f32::INFINITY, f32::min);
                (distance <= EDGE_HIT_DISTANCE).then_some((edge.id.as_str(), distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id.to_owned())
    }

    /// Forgets transient state when the view goes away.
    pub fn teardown(&mut self, engine: &mut LayoutEngine) {
        self.end_drag(engine);
        self.tooltip = None;
    }
}

fn distance_to_segment(point: Pos2, start: Pos2, end: Pos2) -> f32 {
    let span = end - start;
    let length_sq = span.length_sq();
    if length_sq <= f32::EPSILON {
        return point.distance(start);
    }

    let t = ((point - start).dot(span) / length_sq).clamp(0.0, 1.0);
    point.distance(start + span * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FlowRecord, ProcessStep, StepType};
    use crate::graph::{DisplayMode, build_graph};

    fn model() -> GraphModel {
        let flows = vec![
            FlowRecord::new("F1", "SYS-A", "SYS-B", "NOMINT")
                .with_step(ProcessStep::new(StepType::Delivery, "IF-1"))
                .with_step(ProcessStep::new(StepType::Reception, "IF-2")),
            FlowRecord::new("F2", "SYS-B", "SYS-C", "APERAK")
                .with_step(ProcessStep::new(StepType::Delivery, "IF-2")),
        ];
        build_graph(&flows, &[], DisplayMode::Overview)
    }

    #[test]
    fn interface_with_one_flow_selects_it() {
        let model = model();
        let mut controller = InteractionController::default();

        let events = controller.click(&model, "IF-1");
        assert_eq!(events, vec![SelectionEvent::SelectFlow(Some("F1".to_owned()))]);
        assert_eq!(controller.focus(), Some("IF-1"));

        let events = controller.click(&model, "IF-2");
        assert_eq!(events, vec![SelectionEvent::SelectFlow(None)]);
        assert_eq!(controller.selection(), &Selection::default());
    }

    #[test]
    fn external_selection_becomes_focus() {
        let model = model();
        let mut controller = InteractionController::default();

        assert!(controller.sync_external(&model, &Selection::flow("F2")));
        assert_eq!(controller.focus(), Some("flow-F2"));
        assert!(!controller.sync_external(&model, &Selection::flow("F2")));

        assert!(controller.sync_external(&model, &Selection::default()));
        assert_eq!(controller.focus(), None);
    }

    #[test]
    fn selected_flow_refocuses_when_it_reappears() {
        let full = model();
        let without_f1 = build_graph(
            &[FlowRecord::new("F2", "SYS-B", "SYS-C", "APERAK")
                .with_step(ProcessStep::new(StepType::Delivery, "IF-2"))],
            &[],
            DisplayMode::Overview,
        );
        let mut controller = InteractionController::default();
        controller.sync_external(&full, &Selection::flow("F1"));

        assert!(!controller.sync_external(&without_f1, &Selection::flow("F1")));
        controller.retain_focus(&without_f1);
        assert_eq!(controller.focus(), None);
        assert_eq!(controller.selection(), &Selection::flow("F1"));

        assert!(!controller.sync_external(&full, &Selection::flow("F1")));
        controller.retain_focus(&full);
        assert_eq!(controller.focus(), Some("flow-F1"));
    }

    #[test]
    fn surviving_interface_focus_is_kept() {
        let model = model();
        let mut controller = InteractionController::default();
        controller.click(&model, "IF-2");

        controller.retain_focus(&model);
        assert_eq!(controller.focus(), Some("IF-2"));
        assert_eq!(controller.selection(), &Selection::default());
    }

    #[test]
    fn segment_distance_clamps_to_ends() {
        let start = Pos2::new(0.0, 0.0);
        let end = Pos2::new(10.0, 0.0);
        assert_eq!(distance_to_segment(Pos2::new(5.0, 3.0), start, end), 3.0);
        assert_eq!(distance_to_segment(Pos2::new(-4.0, 3.0), start, end), 5.0);
    }
}
