//! Illustrative technical-mode diagnostics.
//!
//! Nothing here is measured. Values are synthesized deterministically from
//! node and edge ids so the technical view has something to show; they must
//! never be read as telemetry.

use crate::util::stable_unit;

/// Whether the builder attaches simulated diagnostics in technical mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DiagnosticsSource {
    #[default]
    Simulated,
    Disabled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkStatus {
    Operational,
    Degraded,
}

impl LinkStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Operational => "operational",
            Self::Degraded => "degraded",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SimulatedFlowMetrics {
    pub steps: usize,
    pub has_error: bool,
    pub latency_ms: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SimulatedLinkDiagnostics {
    pub latency_ms: u32,
    pub status: LinkStatus,
}

pub(super) fn simulate_flow(node_id: &str, steps: usize) -> SimulatedFlowMetrics {
    SimulatedFlowMetrics {
        steps,
        has_error: stable_unit(&format!("{node_id}#error")) > 0.8,
        latency_ms: 50 + (stable_unit(&format!("{node_id}#latency")) * 200.0) as u32,
    }
}

pub(super) fn simulate_link(edge_id: &str) -> SimulatedLinkDiagnostics {
    let status = if stable_unit(&format!("{edge_id}#status")) > 0.9 {
        LinkStatus::Degraded
    } else {
        LinkStatus::Operational
    };

    SimulatedLinkDiagnostics {
        latency_ms: 5 + (stable_unit(&format!("{edge_id}#latency")) * 100.0) as u32,
        status,
    }
}
