use eframe::egui::{self, Color32, Sense, Ui, vec2};

use crate::catalog::{matching_systems, search_flows};
use crate::graph::{DisplayMode, SystemGroup};
use crate::interaction::{Selection, ZOOM_IN_STEP, ZOOM_OUT_STEP};
use crate::theme::{format_color, step_type_color};

use super::super::ViewModel;

const LEGEND_GROUPS: [SystemGroup; 6] = [
    SystemGroup::MarketPartnerSystem,
    SystemGroup::ExternalPartner,
    SystemGroup::NetworkOperation,
    SystemGroup::BalanceGroupNetwork,
    SystemGroup::VirtualHubPortal,
    SystemGroup::Unclassified,
];

const LEGEND_STEP_TYPES: [&str; 3] = ["delivery", "reception", "other"];

/// Combo box over `options` with an "All" entry. Returns whether the value changed.
fn filter_combo(ui: &mut Ui, label: &str, value: &mut Option<String>, options: &[String]) -> bool {
    let mut changed = false;
    egui::ComboBox::from_label(label)
        .width(170.0)
        .selected_text(value.as_deref().unwrap_or("All"))
        .show_ui(ui, |ui| {
            changed |= ui.selectable_value(value, None, "All").changed();
            for option in options {
                changed |= ui
                    .selectable_value(value, Some(option.clone()), option.as_str())
                    .changed();
            }
        });
    changed
}

fn swatch(ui: &mut Ui, color: Color32, label: &str) {
    ui.horizontal(|ui| {
        let (rect, _) = ui.allocate_exact_size(vec2(12.0, 12.0), Sense::hover());
        ui.painter().rect_filled(rect, 2.0, color);
        ui.label(label);
    });
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Data Flows");
        ui.add_space(4.0);

        self.draw_search(ui);
        ui.separator();
        self.draw_filters(ui);
        ui.separator();
        self.draw_layout_controls(ui);
        ui.separator();

        egui::CollapsingHeader::new("Legend")
            .default_open(true)
            .show(ui, |ui| self.draw_legend(ui));
    }

    fn draw_search(&mut self, ui: &mut Ui) {
        ui.label("Search (id, name, system, format, interface)");
        let response = ui.add(
            egui::TextEdit::singleline(&mut self.search)
                .hint_text("e.g. NOMINT")
                .desired_width(f32::INFINITY),
        );
        if !response.changed() {
            if let Some(hits) = &self.search_hits {
                ui.small(format!("{} matching flows", hits.len()));
            }
            return;
        }

        let query = self.search.trim();
        if query.is_empty() {
            self.search_hits = None;
        } else {
            let hits = search_flows(&self.catalogue.flows, query)
                .into_iter()
                .map(|flow| flow.id.clone())
                .collect::<Vec<_>>();
            tracing::debug!(query, hits = hits.len(), "flow search");
            self.search_hits = Some(hits);

            let systems = matching_systems(&self.catalogue.systems, query);
            if let [system] = systems.as_slice() {
                let selection = Selection::system(*system);
                self.set_selection(selection);
            }
        }
        self.graph_dirty = true;
    }

    fn draw_filters(&mut self, ui: &mut Ui) {
        ui.label("Filters");
        let mut changed = false;
        changed |= filter_combo(
            ui,
            "Source system",
            &mut self.filter.source_system,
            &self.catalogue.systems,
        );
        changed |= filter_combo(
            ui,
            "Target system",
            &mut self.filter.target_system,
            &self.catalogue.systems,
        );
        changed |= filter_combo(ui, "Format", &mut self.filter.format, &self.catalogue.formats);
        changed |= filter_combo(
            ui,
            "Transmission",
            &mut self.filter.transmission_method,
            &self.catalogue.transmission_methods,
        );

        let clear = ui
            .add_enabled(!self.filter.is_empty(), egui::Button::new("Clear filters"))
            .clicked();
        if clear {
            self.filter = Default::default();
            changed = true;
        }

        if changed {
            tracing::debug!(filter = ?self.filter, "filters changed");
            self.graph_dirty = true;
        }
    }

    fn draw_layout_controls(&mut self, ui: &mut Ui) {
        ui.label("View");
        ui.horizontal(|ui| {
            let rect = self.canvas_rect;
            if ui.button("Zoom in").clicked() {
                self.controller.zoom_by(rect, ZOOM_IN_STEP);
            }
            if ui.button("Zoom out").clicked() {
                self.controller.zoom_by(rect, ZOOM_OUT_STEP);
            }
            if ui.button("Reset").clicked() {
                self.controller.reset_view();
            }
        });
        ui.small(format!("zoom {:.0}%", self.controller.view().zoom * 100.0));

        let pinned = self.layout.bodies().iter().filter(|body| body.pinned.is_some()).count();
        let release = ui
            .add_enabled(pinned > 0, egui::Button::new(format!("Release pinned nodes ({pinned})")))
            .clicked();
        if release {
            let released = self.layout.release_all();
            tracing::debug!(released, "released pinned nodes");
        }

        let toggled = ui
            .checkbox(&mut self.show_particles, "Animate data flow particles")
            .changed();
        if toggled && !self.show_particles {
            self.particles.stop();
        } else if toggled {
            let palette = self.palette;
            self.particles
                .rebuild(&self.model, |edge| palette.edge_color(edge));
        }

        if self.mode == DisplayMode::Focused && self.selection.system.is_none() {
            ui.small("Select a system to focus the diagram on it.");
        }
    }

    fn draw_legend(&self, ui: &mut Ui) {
        ui.label("Systems");
        for group in LEGEND_GROUPS {
            swatch(ui, self.palette.slot(group.color_slot()), group.description());
        }

        if !self.catalogue.formats.is_empty() {
            ui.add_space(4.0);
            ui.label("Formats");
            for format in &self.catalogue.formats {
                swatch(ui, format_color(format), format);
            }
        }

        if self.mode == DisplayMode::Technical {
            ui.add_space(4.0);
            ui.label("Process steps");
            for step_type in LEGEND_STEP_TYPES {
                swatch(ui, step_type_color(step_type), step_type);
            }
        }
    }
}
