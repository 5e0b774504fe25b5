use std::collections::HashSet;

use crate::graph::{GraphModel, GraphNode};

/// How strongly a node or edge is drawn under the current focus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Emphasis {
    Neutral,
    Selected,
    Connected,
    Dimmed,
}

/// Derived highlight sets for one focus. Always rebuilt from scratch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HighlightState {
    focus: Option<String>,
    highlighted_edges: HashSet<String>,
    connected_nodes: HashSet<String>,
}

/// Computes the highlight for `focus`. An id that is not in the graph
/// yields the neutral state.
pub fn focus(model: &GraphModel, focus: Option<&str>) -> HighlightState {
    let Some(node) = focus.and_then(|id| model.node(id)) else {
        return HighlightState::default();
    };

    let focus_id = node.id();
    let mut highlighted_edges = HashSet::new();
    let mut connected_nodes = HashSet::new();

    for edge in model.incident_edges(focus_id) {
        highlighted_edges.insert(edge.id.clone());
        if let Some(other) = edge.other_end(focus_id) {
            connected_nodes.insert(other.to_owned());
        }
    }

    // A flow's full route is spread over edges that do not all touch the
    // flow node, so collect everything tagged with it.
    if let GraphNode::Flow(flow) = node {
        for edge in model
            .edges()
            .iter()
            .filter(|edge| edge.belongs_to_flow(&flow.display_id))
        {
            highlighted_edges.insert(edge.id.clone());
            connected_nodes.insert(edge.source.clone());
            connected_nodes.insert(edge.target.clone());
        }
    }

    connected_nodes.remove(focus_id);

    tracing::debug!(
        focus = focus_id,
        edges = highlighted_edges.len(),
        nodes = connected_nodes.len(),
        "highlight recomputed"
    );

    HighlightState {
        focus: Some(focus_id.to_owned()),
        highlighted_edges,
        connected_nodes,
    }
}

impl HighlightState {
    pub fn focus(&self) -> Option<&str> {
        self.focus.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.focus.is_some()
    }

    pub fn highlighted_edges(&self) -> &HashSet<String> {
        &self.highlighted_edges
    }

    pub fn connected_nodes(&self) -> &HashSet<String> {
        &self.connected_nodes
    }

    pub fn node_emphasis(&self, id: &str) -> Emphasis {
        match self.focus.as_deref() {
            None => Emphasis::Neutral,
            Some(focus) if focus == id => Emphasis::Selected,
            Some(_) if self.connected_nodes.contains(id) => Emphasis::Connected,
            Some(_) => Emphasis::Dimmed,
        }
    }

    /// Highlighted edges report `Selected`.
    pub fn edge_emphasis(&self, id: &str) -> Emphasis {
        if self.focus.is_none() {
            Emphasis::Neutral
        } else if self.highlighted_edges.contains(id) {
            Emphasis::Selected
        } else {
            Emphasis::Dimmed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FlowRecord, ProcessStep, StepType};
    use crate::graph::{DisplayMode, build_graph};

    fn overview() -> GraphModel {
        let flows = vec![
            FlowRecord::new("F1", "SYS-A", "SYS-B", "NOMINT")
                .with_step(ProcessStep::new(StepType::Delivery, "IF-1")),
            FlowRecord::new("F2", "SYS-C", "SYS-D", "ALOCAT"),
        ];
        build_graph(&flows, &[], DisplayMode::Overview)
    }

    #[test]
    fn system_focus_marks_direct_neighbours() {
        let model = overview();
        let state = focus(&model, Some("SYS-A"));

        assert_eq!(state.node_emphasis("SYS-A"), Emphasis::Selected);
        assert_eq!(state.node_emphasis("IF-1"), Emphasis::Connected);
        assert_eq!(state.node_emphasis("SYS-B"), Emphasis::Connected);
        assert_eq!(state.node_emphasis("SYS-C"), Emphasis::Dimmed);
        assert!(!state.connected_nodes().contains("SYS-A"));
    }

    #[test]
    fn unknown_focus_is_neutral() {
        let model = overview();
        assert_eq!(focus(&model, Some("nowhere")), HighlightState::default());
        assert_eq!(
            focus(&model, None).edge_emphasis("SYS-A|SYS-B|system-to-system"),
            Emphasis::Neutral
        );
    }
}
