use eframe::egui::{self, RichText, Ui};

use crate::catalog::{FlowRecord, or_unknown};
use crate::graph::{DisplayMode, NodeKind, classify_system};
use crate::interaction::Selection;
use crate::theme::format_color;

use super::super::ViewModel;

fn field(ui: &mut Ui, label: &str, value: &str) {
    ui.horizontal_wrapped(|ui| {
        ui.label(RichText::new(format!("{label}:")).strong());
        ui.label(or_unknown(value));
    });
}

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Details");
        ui.add_space(4.0);

        let selection = self.selection.clone();
        egui::ScrollArea::vertical().show(ui, |ui| {
            match (&selection.flow, &selection.system) {
                (Some(flow_id), _) => self.draw_flow_details(ui, flow_id),
                (None, Some(system)) => self.draw_system_details(ui, system),
                (None, None) => self.draw_summary(ui),
            }
        });
    }

    fn draw_summary(&self, ui: &mut Ui) {
        ui.label("Select a system or data flow on the canvas.");
        ui.add_space(6.0);
        field(ui, "Mode", self.mode.label());
        for kind in [NodeKind::System, NodeKind::Interface, NodeKind::Flow] {
            field(ui, kind.label(), &self.model.count(kind).to_string());
        }
        field(ui, "Links", &self.model.edges().len().to_string());
        field(
            ui,
            "Catalogue flows",
            &self.catalogue.flows.len().to_string(),
        );
    }

    fn draw_flow_details(&mut self, ui: &mut Ui, flow_id: &str) {
        let Some(flow) = self.catalogue.flow(flow_id).cloned() else {
            ui.label(format!("Flow {flow_id} is not in the catalogue."));
            return;
        };

        ui.label(RichText::new(flow.display_name()).heading());
        field(ui, "Id", &flow.id);
        if !flow.description.trim().is_empty() {
            ui.label(flow.description.as_str());
        }
        ui.add_space(4.0);
        field(ui, "Source", flow.source());
        field(ui, "Target", flow.target());
        ui.horizontal(|ui| {
            ui.label(RichText::new("Format:").strong());
            ui.label(RichText::new(flow.format_label()).color(format_color(&flow.format)));
        });
        field(ui, "Transmission", &flow.transmission_method);

        if self.mode == DisplayMode::Technical
            && let Some(metrics) = self
                .model
                .flow_node(&flow.id)
                .and_then(|node| node.technical_metrics.as_ref())
        {
            let status = if metrics.has_error { "Error" } else { "OK" };
            field(
                ui,
                "Status (simulated)",
                &format!("{status}, {} ms", metrics.latency_ms),
            );
        }

        ui.separator();
        self.draw_playback(ui, &flow);

        ui.add_space(6.0);
        if ui.button("Clear selection").clicked() {
            self.set_selection(Selection::default());
        }
    }

    fn draw_playback(&mut self, ui: &mut Ui, flow: &FlowRecord) {
        let steps = flow.ordered_steps();
        ui.label(RichText::new(format!("Process steps ({})", steps.len())).strong());
        if steps.is_empty() {
            ui.label("Direct transfer, no process steps.");
            return;
        }

        ui.horizontal(|ui| {
            let label = if self.playback.is_playing() { "Pause" } else { "Play" };
            if ui
                .add_enabled(steps.len() > 1, egui::Button::new(label))
                .clicked()
            {
                self.playback.toggle();
            }
            if ui.button("Stop").clicked() {
                self.playback.stop();
            }
            ui.label(format!(
                "Step {}/{}",
                self.playback.current_step() + 1,
                self.playback.step_count()
            ));
        });

        for (index, step) in steps.iter().enumerate() {
            let active = index == self.playback.current_step();
            let text = format!(
                "{}. {}  {}",
                index + 1,
                step.step_type.label(),
                or_unknown(step.interface_id())
            );
            let text = if active {
                RichText::new(text).strong().color(self.palette.primary)
            } else {
                RichText::new(text)
            };
            if ui.selectable_label(active, text).clicked() {
                self.playback.select(index);
            }
        }
    }

    fn draw_system_details(&mut self, ui: &mut Ui, system: &str) {
        let group = classify_system(system);
        ui.label(RichText::new(system).heading());
        field(ui, "Type", group.description());
        field(ui, "Connections", &self.model.degree(system).to_string());

        let flows = self
            .catalogue
            .flows
            .iter()
            .filter(|flow| flow.touches(system))
            .map(|flow| (flow.id.clone(), flow.display_name().to_owned(), flow.source() == system))
            .collect::<Vec<_>>();

        ui.separator();
        ui.label(RichText::new(format!("Data flows ({})", flows.len())).strong());

        let mut picked = None;
        for (flow_id, name, outgoing) in &flows {
            let arrow = if *outgoing { "→" } else { "←" };
            if ui.link(format!("{arrow} {name}")).clicked() {
                picked = Some(flow_id.clone());
            }
        }

        ui.add_space(6.0);
        if ui.button("Clear selection").clicked() {
            self.set_selection(Selection::default());
        } else if let Some(flow_id) = picked {
            self.set_selection(Selection::flow(flow_id));
        }
    }
}
