use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use crate::catalog::{FlowRecord, StepType, or_unknown};

use super::classify::{classify_system, is_hub_system};
use super::diagnostics::{DiagnosticsSource, simulate_flow, simulate_link};
use super::{
    DisplayMode, EdgeKind, FlowNode, GraphEdge, GraphModel, GraphNode, InterfaceNode, Level,
    SystemNode,
};

/// Turns flow records into a graph snapshot for one display mode.
#[derive(Clone, Debug, Default)]
pub struct GraphModelBuilder {
    mode: DisplayMode,
    focus_system: Option<String>,
    diagnostics: DiagnosticsSource,
}

pub fn build_graph(flows: &[FlowRecord], systems: &[String], mode: DisplayMode) -> GraphModel {
    GraphModelBuilder::new(mode).build(flows, systems)
}

/// Edge list that keeps the first edge per `(source, target, kind)`.
#[derive(Default)]
struct EdgeSet {
    edges: Vec<GraphEdge>,
    seen: HashSet<String>,
}

impl EdgeSet {
    fn push(&mut self, edge: GraphEdge) {
        if self.seen.insert(edge.id.clone()) {
            self.edges.push(edge);
        }
    }
}

impl GraphModelBuilder {
    pub fn new(mode: DisplayMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Only consulted in focused mode.
    pub fn focus_system(mut self, system: Option<impl Into<String>>) -> Self {
        self.focus_system = system.map(Into::into);
        self
    }

    pub fn diagnostics(mut self, source: DiagnosticsSource) -> Self {
        self.diagnostics = source;
        self
    }

    pub fn build(&self, flows: &[FlowRecord], systems: &[String]) -> GraphModel {
        let flows = flows.iter().cloned().map(Arc::new).collect::<Vec<_>>();
        let unnamed = flows
            .iter()
            .filter(|flow| {
                flow.source_system.trim().is_empty() || flow.target_system.trim().is_empty()
            })
            .count();
        if unnamed > 0 {
            tracing::warn!(flows = unnamed, "flows without a system name are drawn as Unknown");
        }

        let (nodes, edges) = match self.mode {
            DisplayMode::Overview | DisplayMode::Focused => {
                let (nodes, edges) = self.build_tiered(&flows, systems);
                match (self.mode, self.focus_system.as_deref()) {
                    (DisplayMode::Focused, Some(focus)) => {
                        retain_focus(nodes, edges, &flows, or_unknown(focus))
                    }
                    _ => (nodes, edges),
                }
            }
            DisplayMode::Technical => self.build_technical(&flows, systems),
        };

        tracing::debug!(
            mode = self.mode.label(),
            nodes = nodes.len(),
            edges = edges.len(),
            "built flow graph"
        );

        let focus_system = match self.mode {
            DisplayMode::Focused => self.focus_system.clone(),
            _ => None,
        };
        GraphModel::new(self.mode, focus_system, nodes, edges)
    }

    fn build_tiered(
        &self,
        flows: &[Arc<FlowRecord>],
        systems: &[String],
    ) -> (Vec<GraphNode>, Vec<GraphEdge>) {
        let system_nodes = system_nodes(flows, systems, Some(Level::System));
        let interface_nodes = interface_nodes(flows, Some(Level::Interface));
        let flow_nodes = flows
            .iter()
            .map(|flow| flow_node(flow, Some(Level::Flow), None))
            .collect::<Vec<_>>();

        let mut edges = EdgeSet::default();
        for interface in &interface_nodes {
            for system in &interface.connected_systems {
                edges.push(GraphEdge::new(
                    system.as_str(),
                    interface.id.as_str(),
                    EdgeKind::SystemToInterface,
                ));
            }
        }

        for (flow, node) in flows.iter().zip(&flow_nodes) {
            for interface_id in &node.interface_ids {
                edges.push(GraphEdge::new(
                    interface_id.as_str(),
                    node.id.as_str(),
                    EdgeKind::InterfaceToFlow,
                ));
            }

            edges.push(
                GraphEdge::new(flow.source(), flow.target(), EdgeKind::SystemToSystem)
                    .with_flow(flow),
            );
        }

        let nodes = assemble_nodes(system_nodes, interface_nodes, flow_nodes);
        (nodes, edges.edges)
    }

    fn build_technical(
        &self,
        flows: &[Arc<FlowRecord>],
        systems: &[String],
    ) -> (Vec<GraphNode>, Vec<GraphEdge>) {
        let simulated = self.diagnostics == DiagnosticsSource::Simulated;
        let system_nodes = system_nodes(flows, systems, None);
        let interface_nodes = interface_nodes(flows, None);
        let flow_nodes = flows
            .iter()
            .map(|flow| {
                let steps = simulated.then(|| flow.process_steps.len());
                flow_node(flow, None, steps)
            })
            .collect::<Vec<_>>();

        let mut edges = EdgeSet::default();
        for (flow, node) in flows.iter().zip(&flow_nodes) {
            for edge in technical_path(flow, &node.id) {
                let edge = if simulated {
                    let diagnostics = simulate_link(&edge.id);
                    GraphEdge {
                        diagnostics: Some(diagnostics),
                        ..edge
                    }
                } else {
                    edge
                };
                edges.push(edge);
            }
        }

        let nodes = assemble_nodes(system_nodes, interface_nodes, flow_nodes);
        (nodes, edges.edges)
    }
}

/// Source system, flow, every routed interface in step order, target system.
fn technical_path(flow: &Arc<FlowRecord>, flow_node_id: &str) -> Vec<GraphEdge> {
    let steps = flow.routed_steps();
    if steps.len() < flow.process_steps.len() {
        tracing::warn!(
            flow = flow.id.as_str(),
            skipped = flow.process_steps.len() - steps.len(),
            "process steps without an interface were skipped"
        );
    }

    let mut path = vec![
        GraphEdge::new(flow.source(), flow_node_id, EdgeKind::SystemToFlow).with_flow(flow),
    ];

    let Some(last) = steps.last() else {
        path.push(
            GraphEdge::new(flow_node_id, flow.target(), EdgeKind::FlowToSystem).with_flow(flow),
        );
        return path;
    };

    for (index, step) in steps.iter().enumerate() {
        let mut edge =
            GraphEdge::new(flow_node_id, step.interface_id(), EdgeKind::FlowToInterface)
                .with_flow(flow)
                .with_step_type(step.step_type.label());
        edge.step_index = Some(index);
        path.push(edge);
    }

    for pair in steps.windows(2) {
        if let [current, next] = pair {
            path.push(
                GraphEdge::new(
                    current.interface_id(),
                    next.interface_id(),
                    EdgeKind::InterfaceToInterface,
                )
                .with_flow(flow)
                .with_step_type(format!(
                    "{}-to-{}",
                    current.step_type.label(),
                    next.step_type.label()
                )),
            );
        }
    }

    path.push(
        GraphEdge::new(last.interface_id(), flow.target(), EdgeKind::InterfaceToSystem)
            .with_flow(flow)
            .with_step_type("final-delivery"),
    );
    path
}

fn system_nodes(
    flows: &[Arc<FlowRecord>],
    systems: &[String],
    level: Option<Level>,
) -> Vec<SystemNode> {
    let mut seen = HashSet::new();
    let mut nodes = Vec::new();

    let listed = systems.iter().map(|system| or_unknown(system));
    let referenced = flows.iter().flat_map(|flow| [flow.source(), flow.target()]);
    for name in listed.chain(referenced) {
        if !seen.insert(name) {
            continue;
        }

        let group = classify_system(name);
        nodes.push(SystemNode {
            id: name.to_owned(),
            group,
            hub: is_hub_system(name),
            level,
        });
    }

    nodes
}

fn interface_nodes(flows: &[Arc<FlowRecord>], level: Option<Level>) -> Vec<InterfaceNode> {
    let mut nodes: Vec<InterfaceNode> = Vec::new();
    let mut index_by_id: HashMap<String, usize> = HashMap::new();

    for flow in flows {
        for step in flow.routed_steps() {
            let id = step.interface_id();
            let index = *index_by_id.entry(id.to_owned()).or_insert_with(|| {
                nodes.push(InterfaceNode {
                    id: id.to_owned(),
                    connected_systems: BTreeSet::new(),
                    step_types: Vec::new(),
                    flow_ids: Vec::new(),
                    level,
                });
                nodes.len() - 1
            });

            let node = &mut nodes[index];
            match step.step_type {
                StepType::Reception => {
                    node.connected_systems.insert(flow.target().to_owned());
                }
                StepType::Delivery => {
                    node.connected_systems.insert(flow.source().to_owned());
                }
                StepType::Other(_) => {}
            }

            let step_type = step.step_type.label();
            if !step_type.is_empty() && !node.step_types.iter().any(|seen| seen == step_type) {
                node.step_types.push(step_type.to_owned());
            }
            if node.flow_ids.last() != Some(&flow.id) {
                node.flow_ids.push(flow.id.clone());
            }
        }
    }

    nodes
}

fn flow_node(flow: &Arc<FlowRecord>, level: Option<Level>, simulated_steps: Option<usize>) -> FlowNode {
    let id = flow.node_id();
    let technical_metrics = simulated_steps.map(|steps| simulate_flow(&id, steps));

    FlowNode {
        display_id: flow.id.clone(),
        format: flow.format_label().to_owned(),
        source_system: flow.source().to_owned(),
        target_system: flow.target().to_owned(),
        interface_ids: flow
            .routed_steps()
            .into_iter()
            .map(|step| step.interface_id().to_owned())
            .collect(),
        level,
        technical_metrics,
        record: Arc::clone(flow),
        id,
    }
}

fn assemble_nodes(
    systems: Vec<SystemNode>,
    interfaces: Vec<InterfaceNode>,
    flows: Vec<FlowNode>,
) -> Vec<GraphNode> {
    let mut seen = HashMap::new();
    systems
        .into_iter()
        .map(GraphNode::System)
        .chain(interfaces.into_iter().map(GraphNode::Interface))
        .chain(flows.into_iter().map(GraphNode::Flow))
        .filter(|node| match seen.entry(node.id().to_owned()) {
            Entry::Vacant(slot) => {
                slot.insert(node.kind());
                true
            }
            Entry::Occupied(kept) => {
                tracing::warn!(
                    id = node.id(),
                    dropped = node.kind().label(),
                    kept = kept.get().label(),
                    "node id already taken; its links attach to the existing node"
                );
                false
            }
        })
        .collect()
}

/// Focused-mode narrowing around one system.
fn retain_focus(
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    flows: &[Arc<FlowRecord>],
    focus: &str,
) -> (Vec<GraphNode>, Vec<GraphEdge>) {
    let focus_flows = flows
        .iter()
        .filter(|flow| flow.touches(focus))
        .collect::<Vec<_>>();

    let flow_ids = focus_flows
        .iter()
        .map(|flow| flow.node_id())
        .collect::<HashSet<_>>();
    let system_ids = focus_flows
        .iter()
        .flat_map(|flow| [flow.source(), flow.target()])
        .chain([focus])
        .collect::<HashSet<_>>();
    let interface_ids = edges
        .iter()
        .filter(|edge| edge.kind == EdgeKind::InterfaceToFlow && flow_ids.contains(&edge.target))
        .map(|edge| edge.source.clone())
        .collect::<HashSet<_>>();

    let nodes = nodes
        .into_iter()
        .filter(|node| match node {
            GraphNode::System(system) => system_ids.contains(system.id.as_str()),
            GraphNode::Interface(interface) => interface_ids.contains(&interface.id),
            GraphNode::Flow(flow) => flow_ids.contains(&flow.id),
        })
        .collect::<Vec<_>>();

    let kept = nodes.iter().map(GraphNode::id).collect::<HashSet<_>>();
    let edges = edges
        .into_iter()
        .filter(|edge| match edge.kind {
            EdgeKind::SystemToSystem => edge.touches(focus),
            _ => kept.contains(edge.source.as_str()) && kept.contains(edge.target.as_str()),
        })
        .collect::<Vec<_>>();

    (nodes, edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ProcessStep;
    use crate::graph::NodeKind;

    fn flow_with_steps(id: &str, steps: &[(StepType, &str)]) -> FlowRecord {
        steps.iter().fold(
            FlowRecord::new(id, "SYS-A", "SYS-B", "NOMINT"),
            |flow, (step_type, interface)| {
                flow.with_step(ProcessStep::new(step_type.clone(), *interface))
            },
        )
    }

    #[test]
    fn interface_systems_follow_step_direction() {
        let flows = vec![flow_with_steps(
            "F1",
            &[
                (StepType::Delivery, "IF-OUT"),
                (StepType::Reception, "IF-IN"),
                (StepType::Other("mapping".to_owned()), "IF-MAP"),
            ],
        )];
        let model = build_graph(&flows, &[], DisplayMode::Overview);

        let connected = |id: &str| match model.node(id) {
            Some(GraphNode::Interface(node)) => node.connected_systems.clone(),
            other => panic!("expected interface node, got {other:?}"),
        };
        assert_eq!(connected("IF-OUT"), BTreeSet::from(["SYS-A".to_owned()]));
        assert_eq!(connected("IF-IN"), BTreeSet::from(["SYS-B".to_owned()]));
        assert!(connected("IF-MAP").is_empty());
    }

    #[test]
    fn duplicate_edges_collapse_to_the_first() {
        let flows = vec![
            flow_with_steps("F1", &[(StepType::Delivery, "IF-1")]),
            flow_with_steps("F2", &[(StepType::Delivery, "IF-1")]),
        ];
        let model = build_graph(&flows, &[], DisplayMode::Overview);

        let shadows = model
            .edges()
            .iter()
            .filter(|edge| edge.kind == EdgeKind::SystemToSystem)
            .collect::<Vec<_>>();
        assert_eq!(shadows.len(), 1);
        assert!(shadows[0].belongs_to_flow("F1"));

        let ids = model.edges().iter().map(|edge| &edge.id).collect::<HashSet<_>>();
        assert_eq!(ids.len(), model.edges().len());
    }

    #[test]
    fn consecutive_steps_are_chained_in_technical_mode() {
        let flows = vec![flow_with_steps(
            "F1",
            &[(StepType::Reception, "IF-1"), (StepType::Delivery, "IF-2")],
        )];
        let model = build_graph(&flows, &[], DisplayMode::Technical);

        let hand_off = model
            .edge(&super::super::edge_id("IF-1", "IF-2", EdgeKind::InterfaceToInterface))
            .expect("hand-off edge");
        assert_eq!(hand_off.step_type.as_deref(), Some("reception-to-delivery"));
        assert!(hand_off.diagnostics.is_some());
        assert!(model.node("IF-1").is_some_and(|node| node.level().is_none()));
    }

    #[test]
    fn disabled_diagnostics_leave_slots_empty() {
        let flows = vec![flow_with_steps("F1", &[(StepType::Delivery, "IF-1")])];
        let model = GraphModelBuilder::new(DisplayMode::Technical)
            .diagnostics(DiagnosticsSource::Disabled)
            .build(&flows, &[]);

        assert!(model.edges().iter().all(|edge| edge.diagnostics.is_none()));
        assert!(
            model
                .flow_node("F1")
                .is_some_and(|node| node.technical_metrics.is_none())
        );
    }

    #[test]
    fn interface_named_like_a_system_yields_to_the_system() {
        let flows = vec![flow_with_steps(
            "F1",
            &[(StepType::Delivery, "SYS-B"), (StepType::Reception, "IF-1")],
        )];
        let model = build_graph(&flows, &[], DisplayMode::Overview);

        assert!(matches!(model.node("SYS-B"), Some(GraphNode::System(_))));
        assert_eq!(model.count(NodeKind::Interface), 1);
        let ids = model.nodes().iter().map(GraphNode::id).collect::<HashSet<_>>();
        assert_eq!(ids.len(), model.nodes().len());
    }

    #[test]
    fn blank_system_names_degrade_to_unknown() {
        let flows = vec![FlowRecord::new("F1", "", "SYS-B", "")];
        let model = build_graph(&flows, &[], DisplayMode::Overview);

        assert!(model.node("Unknown").is_some());
        assert_eq!(
            model.flow_node("F1").map(|node| node.format.as_str()),
            Some("Unknown")
        );
    }
}
