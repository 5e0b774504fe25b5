use eframe::egui::{Pos2, vec2};

use crate::graph::{DisplayMode, GraphEdge, GraphModel, GraphNode, LinkStatus};

/// Hover text placed next to the pointer.
#[derive(Clone, Debug, PartialEq)]
pub struct Tooltip {
    pub text: String,
    pub anchor: Pos2,
}

impl Tooltip {
    pub fn at(pointer: Pos2, text: String) -> Self {
        Self {
            text,
            anchor: pointer + vec2(10.0, -28.0),
        }
    }
}

fn flows_touching(model: &GraphModel, system: &str) -> usize {
    model
        .nodes()
        .iter()
        .filter(|node| {
            matches!(node, GraphNode::Flow(flow)
                if flow.source_system == system || flow.target_system == system)
        })
        .count()
}

pub fn node_tooltip(model: &GraphModel, node: &GraphNode) -> String {
    let lines = match (model.mode, node) {
        (DisplayMode::Technical, GraphNode::System(system)) => vec![
            system.id.clone(),
            format!("Type: {}", system.group.description()),
            "Status: Operational".to_owned(),
            format!("Connected Flows: {}", flows_touching(model, &system.id)),
            "Click for system details".to_owned(),
        ],
        (DisplayMode::Technical, GraphNode::Interface(interface)) => {
            let step_types = if interface.step_types.is_empty() {
                "None".to_owned()
            } else {
                interface.step_types.join(", ")
            };
            vec![
                interface.id.clone(),
                "Type: Interface".to_owned(),
                format!("Step Types: {step_types}"),
                format!("Used In: {} data flows", interface.flow_ids.len()),
                "Click for interface details".to_owned(),
            ]
        }
        (DisplayMode::Technical, GraphNode::Flow(flow)) => {
            let steps = flow
                .technical_metrics
                .as_ref()
                .map(|metrics| metrics.steps)
                .filter(|&steps| steps > 0)
                .map_or_else(|| "Direct".to_owned(), |steps| steps.to_string());
            let mut lines = vec![
                format!("{} ({})", flow.display_id, flow.format),
                format!("Name: {}", flow.record.display_name()),
                format!("Format: {}", flow.format),
                format!("Route: {} → {}", flow.source_system, flow.target_system),
                format!("Steps: {steps}"),
            ];
            if let Some(metrics) = &flow.technical_metrics {
                let status = if metrics.has_error { "Error" } else { "OK" };
                lines.push(format!("Status (simulated): {status}, {} ms", metrics.latency_ms));
            }
            lines.push("Click for flow details".to_owned());
            lines
        }
        (_, GraphNode::System(system)) => vec![
            format!("System: {}", system.id),
            format!("Connected with {} flows", flows_touching(model, &system.id)),
            "Click for system details".to_owned(),
        ],
        (_, GraphNode::Interface(interface)) => vec![
            format!("Interface: {}", interface.id),
            format!("Used in {} data flows", interface.flow_ids.len()),
            "Click for details".to_owned(),
        ],
        (_, GraphNode::Flow(flow)) => {
            let mut lines = vec![format!("Data Flow: {}", flow.display_id)];
            if !flow.record.name.trim().is_empty() {
                lines.push(flow.record.name.clone());
            }
            lines.push(format!("Format: {}", flow.format));
            lines.push(format!("{} → {}", flow.source_system, flow.target_system));
            lines.push("Click for flow details".to_owned());
            lines
        }
    };
    lines.join("\n")
}

pub fn edge_tooltip(model: &GraphModel, edge: &GraphEdge) -> String {
    let mut lines = Vec::new();

    if model.mode == DisplayMode::Technical {
        lines.push("Connection".to_owned());
        lines.push(format!("Type: {}", edge.kind.label()));
        if let Some(flow) = &edge.associated_flow {
            lines.push(format!("Flow: {}", flow.display_name()));
        }
        if let Some(step_type) = &edge.step_type {
            lines.push(format!("Step: {step_type}"));
        }
        if let Some(diagnostics) = &edge.diagnostics {
            let marker = match diagnostics.status {
                LinkStatus::Operational => "",
                LinkStatus::Degraded => " (!)",
            };
            lines.push(format!(
                "Status (simulated): {}{marker}, {} ms",
                diagnostics.status.label(),
                diagnostics.latency_ms
            ));
        }
        return lines.join("\n");
    }

    if edge.kind.touches_flow() {
        lines.push("Data Flow Connection".to_owned());
        if let Some(flow) = &edge.associated_flow {
            lines.push(flow.display_name().to_owned());
            if !flow.format.trim().is_empty() {
                lines.push(format!("Format: {}", flow.format));
            }
        }
    } else if let Some(step_type) = &edge.step_type {
        lines.push(format!("Process Step: {step_type}"));
    } else {
        lines.push("Connection".to_owned());
    }

    lines.push(format!("From: {}", edge.source));
    lines.push(format!("To: {}", edge.target));
    lines.join("\n")
}
