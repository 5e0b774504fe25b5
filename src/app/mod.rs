use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, Rect};

use crate::animation::{AnimationConfig, PathAnimator, StepPlayback};
use crate::catalog::{Catalogue, FlowFilter, load_catalogue, parse_catalogue};
use crate::graph::{DisplayMode, GraphModel};
use crate::highlight::HighlightState;
use crate::interaction::{InteractionController, Selection};
use crate::physics::LayoutEngine;
use crate::theme::Palette;

mod render_utils;
mod ui;
mod view;

const SAMPLE_CATALOGUE: &str = include_str!("../../data/sample_catalogue.json");

/// What the binary hands to the shell.
#[derive(Clone, Debug)]
pub struct LaunchOptions {
    pub catalogue: Option<PathBuf>,
    pub mode: DisplayMode,
    pub palette: Palette,
}

pub struct FlowAtlasApp {
    launch: LaunchOptions,
    state: AppState,
    reload_rx: Option<Receiver<Result<Catalogue, String>>>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<Catalogue, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    catalogue: Catalogue,
    palette: Palette,
    mode: DisplayMode,
    filter: FlowFilter,
    search: String,
    search_hits: Option<Vec<String>>,
    selection: Selection,
    model: GraphModel,
    layout: LayoutEngine,
    controller: InteractionController,
    highlight: HighlightState,
    highlight_key: Option<Option<String>>,
    canvas_rect: Rect,
    animation: AnimationConfig,
    particles: PathAnimator,
    playback: StepPlayback,
    playback_flow: Option<String>,
    show_particles: bool,
    graph_dirty: bool,
}

impl FlowAtlasApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, launch: LaunchOptions) -> Self {
        let state = Self::start_load(launch.catalogue.clone());
        Self {
            launch,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(source: Option<PathBuf>) -> Receiver<Result<Catalogue, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = match source {
                Some(path) => load_catalogue(&path),
                None => parse_catalogue(SAMPLE_CATALOGUE),
            };
            let _ = tx.send(result.map_err(|error| format!("{error:#}")));
        });

        rx
    }

    fn start_load(source: Option<PathBuf>) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(source),
        }
    }

    fn ready(&self, catalogue: Catalogue) -> AppState {
        AppState::Ready(Box::new(ViewModel::new(
            catalogue,
            self.launch.mode,
            self.launch.palette,
        )))
    }
}

impl eframe::App for FlowAtlasApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;
        let mut retry = false;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(result) => transition = Some(result),
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(Err("Catalogue loader disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading flow catalogue...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the flow catalogue");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    retry = ui.button("Retry").clicked();
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.launch.catalogue.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => transition = Some(result),
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition = Some(Err("Catalogue loader disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if retry {
            self.state = Self::start_load(self.launch.catalogue.clone());
            return;
        }

        if let Some(result) = transition {
            if let AppState::Ready(model) = &mut self.state {
                model.teardown();
            }

            self.reload_rx = None;
            self.state = match result {
                Ok(catalogue) => self.ready(catalogue),
                Err(error) => {
                    tracing::warn!(error = error.as_str(), "catalogue load failed");
                    AppState::Error(error)
                }
            };
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let AppState::Ready(model) = &mut self.state {
            model.teardown();
        }
    }
}
