use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use eframe::egui::Color32;
use serde::Deserialize;

use crate::graph::{ColorSlot, DisplayMode, EdgeKind, GraphEdge, GraphNode};

/// Named color slots shared by the canvas and the side panels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    pub primary: Color32,
    pub secondary: Color32,
    pub tertiary: Color32,
    pub accent1: Color32,
    pub accent2: Color32,
    pub background: Color32,
    pub text: Color32,
    pub light_gray: Color32,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            primary: Color32::from_rgb(0xC6, 0x34, 0x41),
            secondary: Color32::from_rgb(0x96, 0xBE, 0xBE),
            tertiary: Color32::from_rgb(0xC0, 0xBC, 0xAC),
            accent1: Color32::from_rgb(0xE1, 0xBA, 0x50),
            accent2: Color32::from_rgb(0x67, 0x74, 0x88),
            background: Color32::WHITE,
            text: Color32::from_rgb(0x33, 0x33, 0x33),
            light_gray: Color32::from_rgb(0xF5, 0xF5, 0xF7),
        }
    }
}

pub const UNKNOWN_GRAY: Color32 = Color32::from_rgb(0xAA, 0xAA, 0xAA);
pub const UNCLASSIFIED_GRAY: Color32 = Color32::from_rgb(0x99, 0x99, 0x99);
const LINK_FALLBACK: Color32 = Color32::from_rgb(0xCC, 0xCC, 0xCC);

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaletteOverrides {
    primary: Option<String>,
    secondary: Option<String>,
    tertiary: Option<String>,
    accent1: Option<String>,
    accent2: Option<String>,
    background: Option<String>,
    text: Option<String>,
    #[serde(alias = "light_gray")]
    light_gray: Option<String>,
}

/// Parses `#RRGGBB` (the leading `#` is optional).
pub fn parse_hex(value: &str) -> Option<Color32> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }

    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some(Color32::from_rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

impl Palette {
    pub fn slot(&self, slot: ColorSlot) -> Color32 {
        match slot {
            ColorSlot::Primary => self.primary,
            ColorSlot::Secondary => self.secondary,
            ColorSlot::Tertiary => self.tertiary,
            ColorSlot::Accent1 => self.accent1,
            ColorSlot::Accent2 => self.accent2,
            ColorSlot::Neutral => UNCLASSIFIED_GRAY,
        }
    }

    /// Applies a JSON object of hex overrides. Malformed entries keep the
    /// current color.
    pub fn with_overrides(mut self, raw: &str) -> Result<Self> {
        let overrides: PaletteOverrides =
            serde_json::from_str(raw).context("failed to decode palette overrides")?;

        let entries = [
            ("primary", overrides.primary, &mut self.primary),
            ("secondary", overrides.secondary, &mut self.secondary),
            ("tertiary", overrides.tertiary, &mut self.tertiary),
            ("accent1", overrides.accent1, &mut self.accent1),
            ("accent2", overrides.accent2, &mut self.accent2),
            ("background", overrides.background, &mut self.background),
            ("text", overrides.text, &mut self.text),
            ("lightGray", overrides.light_gray, &mut self.light_gray),
        ];

        for (name, value, slot) in entries {
            let Some(value) = value else {
                continue;
            };
            match parse_hex(&value) {
                Some(color) => *slot = color,
                None => tracing::warn!(slot = name, value = value.as_str(), "ignoring malformed palette color"),
            }
        }

        Ok(self)
    }

    pub fn node_color(&self, node: &GraphNode) -> Color32 {
        match node {
            GraphNode::System(system) => self.slot(system.group.color_slot()),
            GraphNode::Interface(_) => self.secondary,
            GraphNode::Flow(flow) => format_color(&flow.format),
        }
    }

    /// Flow format first, then step type, then edge kind.
    pub fn edge_color(&self, edge: &GraphEdge) -> Color32 {
        if let Some(flow) = edge.associated_flow.as_ref()
            && !flow.format.trim().is_empty()
        {
            return format_link_color(&flow.format);
        }

        if let Some(step_type) = edge.step_type.as_deref() {
            return step_type_color(step_type);
        }

        edge_kind_color(edge.kind)
    }
}

pub fn load_palette(path: &Path) -> Result<Palette> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read palette file {}", path.display()))?;
    let palette = Palette::default()
        .with_overrides(&raw)
        .with_context(|| format!("invalid palette file {}", path.display()))?;

    tracing::info!(path = %path.display(), "palette loaded");
    Ok(palette)
}

fn known_format_color(format: &str) -> Option<Color32> {
    let color = match format.trim() {
        "NOMINT" => Color32::from_rgb(0xC6, 0x34, 0x41),
        "CONTRL" => Color32::from_rgb(0x67, 0x74, 0x88),
        "APERAK" => Color32::from_rgb(0x96, 0xBE, 0xBE),
        "ACKNOW" | "INVOIC" => Color32::from_rgb(0xE1, 0xBA, 0x50),
        "NOMRES" => Color32::from_rgb(0xC0, 0xBC, 0xAC),
        "ALOCAT" => Color32::from_rgb(0xE1, 0x8B, 0x50),
        _ => return None,
    };
    Some(color)
}

pub fn format_color(format: &str) -> Color32 {
    known_format_color(format).unwrap_or(UNKNOWN_GRAY)
}

/// Links with an unknown format use a lighter gray than nodes.
pub fn format_link_color(format: &str) -> Color32 {
    known_format_color(format).unwrap_or(LINK_FALLBACK)
}

/// Compound step types such as `final-delivery` take the color of the
/// first known part they contain; reception wins over delivery.
pub fn step_type_color(step_type: &str) -> Color32 {
    if step_type.contains("reception") {
        Color32::from_rgb(0x4C, 0xAF, 0x50)
    } else if step_type.contains("delivery") {
        Color32::from_rgb(0xFF, 0x57, 0x22)
    } else {
        Color32::from_rgb(0x77, 0x77, 0x77)
    }
}

pub fn edge_kind_color(kind: EdgeKind) -> Color32 {
    match kind {
        EdgeKind::SystemToInterface => Color32::from_rgb(0x46, 0x82, 0xB4),
        EdgeKind::InterfaceToFlow => Color32::from_rgb(0x2E, 0x8B, 0x57),
        EdgeKind::SystemToSystem => UNCLASSIFIED_GRAY,
        _ => LINK_FALLBACK,
    }
}

/// Drawn radius in world units.
pub fn node_radius(mode: DisplayMode, node: &GraphNode) -> f32 {
    match (mode, node) {
        (DisplayMode::Technical, GraphNode::System(_)) => 45.0,
        (DisplayMode::Technical, GraphNode::Interface(_)) => 35.0,
        (DisplayMode::Technical, GraphNode::Flow(flow)) => {
            let failing = flow
                .technical_metrics
                .as_ref()
                .is_some_and(|metrics| metrics.has_error);
            if failing { 30.0 } else { 25.0 }
        }
        (_, GraphNode::System(_)) => 40.0,
        (_, GraphNode::Interface(_)) => 30.0,
        (_, GraphNode::Flow(_)) => 25.0,
    }
}
