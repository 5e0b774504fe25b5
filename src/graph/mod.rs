use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::catalog::FlowRecord;

mod build;
mod classify;
mod diagnostics;

pub use build::{GraphModelBuilder, build_graph};
pub use classify::{ColorSlot, SystemGroup, classify_system, is_hub_system};
pub use diagnostics::{
    DiagnosticsSource, LinkStatus, SimulatedFlowMetrics, SimulatedLinkDiagnostics,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DisplayMode {
    #[default]
    Overview,
    Focused,
    Technical,
}

impl DisplayMode {
    pub const ALL: [Self; 3] = [Self::Overview, Self::Focused, Self::Technical];

    pub fn label(self) -> &'static str {
        match self {
            Self::Overview => "Overview",
            Self::Focused => "Focused",
            Self::Technical => "Technical",
        }
    }

    /// Overview and focused modes lay nodes out in vertical tiers.
    pub fn is_tiered(self) -> bool {
        matches!(self, Self::Overview | Self::Focused)
    }
}

/// Vertical tier of a node in the tiered modes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Level {
    System = 1,
    Interface = 2,
    Flow = 3,
}

impl Level {
    pub const ALL: [Self; 3] = [Self::System, Self::Interface, Self::Flow];

    /// Target band as a fraction of the canvas height.
    pub fn band(self) -> f32 {
        match self {
            Self::System => 0.2,
            Self::Interface => 0.5,
            Self::Flow => 0.8,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::System => "Systems",
            Self::Interface => "Interfaces",
            Self::Flow => "Data Flows",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    System,
    Interface,
    Flow,
}

impl NodeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::System => "System",
            Self::Interface => "Interface",
            Self::Flow => "Data Flow",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SystemNode {
    pub id: String,
    pub group: SystemGroup,
    pub hub: bool,
    pub level: Option<Level>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InterfaceNode {
    pub id: String,
    pub connected_systems: BTreeSet<String>,
    /// Step types seen on this interface, in first-seen order.
    pub step_types: Vec<String>,
    /// Ids of the flows routed through this interface, in catalogue order.
    pub flow_ids: Vec<String>,
    pub level: Option<Level>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FlowNode {
    pub id: String,
    pub display_id: String,
    pub format: String,
    pub source_system: String,
    pub target_system: String,
    pub interface_ids: Vec<String>,
    pub level: Option<Level>,
    pub technical_metrics: Option<SimulatedFlowMetrics>,
    pub record: Arc<FlowRecord>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GraphNode {
    System(SystemNode),
    Interface(InterfaceNode),
    Flow(FlowNode),
}

impl GraphNode {
    pub fn id(&self) -> &str {
        match self {
            Self::System(node) => &node.id,
            Self::Interface(node) => &node.id,
            Self::Flow(node) => &node.id,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Self::System(_) => NodeKind::System,
            Self::Interface(_) => NodeKind::Interface,
            Self::Flow(_) => NodeKind::Flow,
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self {
            Self::System(node) => node.level,
            Self::Interface(node) => node.level,
            Self::Flow(node) => node.level,
        }
    }

    pub fn is_hub(&self) -> bool {
        matches!(self, Self::System(node) if node.hub)
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Flow(node) => &node.display_id,
            other => other.id(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EdgeKind {
    SystemToInterface,
    InterfaceToFlow,
    SystemToSystem,
    SystemToFlow,
    FlowToInterface,
    InterfaceToInterface,
    InterfaceToSystem,
    FlowToSystem,
}

impl EdgeKind {
    pub fn code(self) -> &'static str {
        match self {
            Self::SystemToInterface => "system-to-interface",
            Self::InterfaceToFlow => "interface-to-dataflow",
            Self::SystemToSystem => "system-to-system",
            Self::SystemToFlow => "system-to-dataflow",
            Self::FlowToInterface => "dataflow-to-interface",
            Self::InterfaceToInterface => "interface-to-interface",
            Self::InterfaceToSystem => "interface-to-system",
            Self::FlowToSystem => "dataflow-to-system",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::SystemToInterface => "system to interface",
            Self::InterfaceToFlow => "interface to data flow",
            Self::SystemToSystem => "system to system",
            Self::SystemToFlow => "system to data flow",
            Self::FlowToInterface => "data flow to interface",
            Self::InterfaceToInterface => "interface to interface",
            Self::InterfaceToSystem => "interface to system",
            Self::FlowToSystem => "data flow to system",
        }
    }

    pub fn weight(self) -> f32 {
        match self {
            Self::SystemToInterface => 1.2,
            Self::InterfaceToFlow | Self::SystemToFlow | Self::FlowToSystem => 1.0,
            Self::FlowToInterface | Self::InterfaceToSystem => 0.7,
            Self::SystemToSystem | Self::InterfaceToInterface => 0.5,
        }
    }

    pub fn style(self) -> EdgeStyle {
        match self {
            Self::SystemToSystem | Self::FlowToInterface => EdgeStyle::Dashed,
            Self::InterfaceToInterface => EdgeStyle::Dotted,
            _ => EdgeStyle::Solid,
        }
    }

    pub fn touches_flow(self) -> bool {
        matches!(
            self,
            Self::InterfaceToFlow | Self::SystemToFlow | Self::FlowToInterface | Self::FlowToSystem
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeStyle {
    Solid,
    Dashed,
    Dotted,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
    pub weight: f32,
    pub style: EdgeStyle,
    pub associated_flow: Option<Arc<FlowRecord>>,
    pub step_type: Option<String>,
    pub step_index: Option<usize>,
    pub diagnostics: Option<SimulatedLinkDiagnostics>,
}

impl GraphEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>, kind: EdgeKind) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: edge_id(&source, &target, kind),
            source,
            target,
            kind,
            weight: kind.weight(),
            style: kind.style(),
            associated_flow: None,
            step_type: None,
            step_index: None,
            diagnostics: None,
        }
    }

    pub fn with_flow(mut self, flow: &Arc<FlowRecord>) -> Self {
        self.associated_flow = Some(Arc::clone(flow));
        self
    }

    pub fn with_step_type(mut self, step_type: impl Into<String>) -> Self {
        self.step_type = Some(step_type.into());
        self
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }

    pub fn belongs_to_flow(&self, flow_id: &str) -> bool {
        self.associated_flow
            .as_ref()
            .is_some_and(|flow| flow.id == flow_id)
    }

    pub fn other_end(&self, node_id: &str) -> Option<&str> {
        if self.source == node_id {
            Some(&self.target)
        } else if self.target == node_id {
            Some(&self.source)
        } else {
            None
        }
    }
}

/// Composite dedup key rendered as a readable id.
pub fn edge_id(source: &str, target: &str, kind: EdgeKind) -> String {
    format!("{source}|{target}|{}", kind.code())
}

/// One immutable graph snapshot; a mode or data change produces a new one.
#[derive(Clone, Debug, Default)]
pub struct GraphModel {
    pub mode: DisplayMode,
    pub focus_system: Option<String>,
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    index_by_id: HashMap<String, usize>,
    incident: Vec<Vec<usize>>,
}

impl GraphModel {
    pub(crate) fn new(
        mode: DisplayMode,
        focus_system: Option<String>,
        nodes: Vec<GraphNode>,
        edges: Vec<GraphEdge>,
    ) -> Self {
        let mut index_by_id = HashMap::with_capacity(nodes.len());
        for (index, node) in nodes.iter().enumerate() {
            index_by_id.insert(node.id().to_owned(), index);
        }

        let mut incident = vec![Vec::new(); nodes.len()];
        for (edge_index, edge) in edges.iter().enumerate() {
            if let Some(&source) = index_by_id.get(&edge.source) {
                incident[source].push(edge_index);
            }
            if let Some(&target) = index_by_id.get(&edge.target)
                && edge.source != edge.target
            {
                incident[target].push(edge_index);
            }
        }

        Self {
            mode,
            focus_system,
            nodes,
            edges,
            index_by_id,
            incident,
        }
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.index_of(id).map(|index| &self.nodes[index])
    }

    pub fn edge(&self, id: &str) -> Option<&GraphEdge> {
        self.edges.iter().find(|edge| edge.id == id)
    }

    /// Edges with `id` as source or target.
    pub fn incident_edges(&self, id: &str) -> impl Iterator<Item = &GraphEdge> {
        self.index_of(id)
            .map(|index| self.incident[index].as_slice())
            .unwrap_or(&[])
            .iter()
            .map(|&edge_index| &self.edges[edge_index])
    }

    pub fn degree(&self, id: &str) -> usize {
        self.index_of(id)
            .map(|index| self.incident[index].len())
            .unwrap_or(0)
    }

    pub fn flow_node(&self, flow_id: &str) -> Option<&FlowNode> {
        match self.node(&crate::catalog::flow_node_id(flow_id)) {
            Some(GraphNode::Flow(node)) => Some(node),
            _ => None,
        }
    }

    pub fn count(&self, kind: NodeKind) -> usize {
        self.nodes.iter().filter(|node| node.kind() == kind).count()
    }
}
