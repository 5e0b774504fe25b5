use eframe::egui::{self, Align, Context, Layout, Pos2, Rect, vec2};

use crate::animation::{AnimationConfig, PathAnimator, StepPlayback};
use crate::catalog::{Catalogue, FlowFilter, FlowRecord};
use crate::graph::{DisplayMode, GraphModel, GraphModelBuilder, NodeKind};
use crate::highlight::{self, HighlightState};
use crate::interaction::{InteractionController, Selection, SelectionEvent};
use crate::physics::{LayoutConfig, LayoutEngine};
use crate::theme::Palette;

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn new(catalogue: Catalogue, mode: DisplayMode, palette: Palette) -> Self {
        let animation = AnimationConfig::default();
        let layout_config = LayoutConfig::default();

        tracing::info!(
            flows = catalogue.flows.len(),
            systems = catalogue.systems.len(),
            mode = mode.label(),
            "catalogue ready"
        );

        Self {
            catalogue,
            palette,
            mode,
            filter: FlowFilter::default(),
            search: String::new(),
            search_hits: None,
            selection: Selection::default(),
            model: GraphModel::default(),
            layout: LayoutEngine::new(layout_config),
            controller: InteractionController::default(),
            highlight: HighlightState::default(),
            highlight_key: None,
            canvas_rect: Rect::from_min_size(
                Pos2::ZERO,
                vec2(layout_config.width, layout_config.height),
            ),
            particles: PathAnimator::new(&animation),
            playback: StepPlayback::new(animation.step_interval),
            playback_flow: None,
            animation,
            show_particles: true,
            graph_dirty: true,
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        let dt = ctx.input(|input| input.stable_dt).clamp(1.0 / 240.0, 1.0 / 20.0);
        if self.graph_dirty {
            self.rebuild_graph();
        }

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("flow-atlas");
                    ui.separator();

                    let mut mode = self.mode;
                    for candidate in DisplayMode::ALL {
                        ui.selectable_value(&mut mode, candidate, candidate.label());
                    }
                    self.set_mode(mode);
                    ui.separator();

                    ui.label(format!("systems: {}", self.model.count(NodeKind::System)));
                    ui.label(format!("interfaces: {}", self.model.count(NodeKind::Interface)));
                    ui.label(format!("flows: {}", self.model.count(NodeKind::Flow)));
                    ui.label(format!("links: {}", self.model.edges().len()));

                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload catalogue"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if !self.layout.is_settled() {
                            ui.spinner();
                            ui.label("Simulating layout");
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE.fill(self.palette.background))
            .show(ctx, |ui| self.draw_canvas(ui, dt));

        if self.playback.advance(dt) {
            tracing::debug!(step = self.playback.current_step(), "playback advanced");
        }
        if self.show_particles {
            self.particles.advance(dt);
        }
        if self.playback.is_playing() || (self.show_particles && self.particles.is_running()) {
            ctx.request_repaint();
        }
    }

    fn set_mode(&mut self, mode: DisplayMode) {
        if mode == self.mode {
            return;
        }

        tracing::info!(from = self.mode.label(), to = mode.label(), "display mode changed");
        self.particles.stop();
        self.controller.teardown(&mut self.layout);
        self.mode = mode;
        self.graph_dirty = true;
    }

    /// Flow set handed to the builder: filters, then search, then the
    /// focused-mode narrowing.
    fn visible_flows(&self) -> Vec<FlowRecord> {
        let mut flows = self.filter.apply(&self.catalogue.flows);

        if let Some(hits) = &self.search_hits {
            flows.retain(|flow| hits.contains(&flow.id));
        }

        if self.mode == DisplayMode::Focused
            && let Some(system) = self.selection.system.as_deref()
        {
            flows.retain(|flow| flow.touches(system));
        }

        flows.into_iter().cloned().collect()
    }

    pub(in crate::app) fn rebuild_graph(&mut self) {
        let flows = self.visible_flows();
        let focus_system = match self.mode {
            DisplayMode::Focused => self.selection.system.clone(),
            _ => None,
        };

        self.model = GraphModelBuilder::new(self.mode)
            .focus_system(focus_system)
            .build(&flows, &self.catalogue.systems);
        self.layout.rebuild(&self.model);
        self.controller.sync_external(&self.model, &self.selection);
        self.controller.retain_focus(&self.model);

        let palette = self.palette;
        self.particles
            .rebuild(&self.model, |edge| palette.edge_color(edge));
        self.highlight_key = None;
        self.graph_dirty = false;
    }

    /// Applies a selection made outside the canvas (filters, search, lists).
    pub(in crate::app) fn set_selection(&mut self, selection: Selection) {
        if selection == self.selection {
            return;
        }

        let system_changed = selection.system != self.selection.system;
        self.selection = selection;
        self.controller.sync_external(&self.model, &self.selection);
        self.sync_playback();

        if system_changed && self.mode == DisplayMode::Focused {
            self.graph_dirty = true;
        }
    }

    pub(in crate::app) fn apply_selection_events(&mut self, events: Vec<SelectionEvent>) {
        let mut selection = self.selection.clone();
        for event in events {
            match event {
                SelectionEvent::SelectFlow(flow) => {
                    if flow.is_some() {
                        selection.system = None;
                    }
                    selection.flow = flow;
                }
                SelectionEvent::SelectSystem(system) => {
                    if system.is_some() {
                        selection.flow = None;
                    }
                    selection.system = system;
                }
            }
        }
        self.set_selection(selection);
    }

    fn sync_playback(&mut self) {
        if self.playback_flow == self.selection.flow {
            return;
        }

        self.playback_flow = self.selection.flow.clone();
        let steps = self
            .playback_flow
            .as_deref()
            .and_then(|flow_id| self.catalogue.flow(flow_id))
            .map_or(0, |flow| flow.ordered_steps().len());
        self.playback.load(steps);
    }

    /// Recomputes the highlight only when its target changes.
    pub(in crate::app) fn refresh_highlight(&mut self) {
        let target = self.controller.highlight_target().map(str::to_owned);
        if self.highlight_key.as_ref() == Some(&target) {
            return;
        }

        self.highlight = highlight::focus(&self.model, target.as_deref());
        self.highlight_key = Some(target);
    }

    pub(in crate::app) fn teardown(&mut self) {
        self.particles.stop();
        self.playback.stop();
        self.controller.teardown(&mut self.layout);
        self.layout.stop();
    }
}
