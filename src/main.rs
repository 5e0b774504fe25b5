use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use flow_atlas::app::{FlowAtlasApp, LaunchOptions};
use flow_atlas::graph::DisplayMode;
use flow_atlas::theme::{Palette, load_palette};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Overview,
    Focused,
    Technical,
}

impl From<ModeArg> for DisplayMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Overview => Self::Overview,
            ModeArg::Focused => Self::Focused,
            ModeArg::Technical => Self::Technical,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Flow catalogue JSON; the bundled sample is shown when omitted.
    #[arg(long)]
    catalogue: Option<PathBuf>,
    #[arg(long, value_enum, default_value = "overview")]
    mode: ModeArg,
    /// JSON object of `#RRGGBB` palette overrides.
    #[arg(long)]
    palette: Option<PathBuf>,
    /// Default filter when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let palette = match &args.palette {
        Some(path) => load_palette(path)?,
        None => Palette::default(),
    };

    let launch = LaunchOptions {
        catalogue: args.catalogue,
        mode: args.mode.into(),
        palette,
    };
    tracing::info!(mode = launch.mode.label(), "starting flow-atlas");

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "flow-atlas",
        options,
        Box::new(move |cc| Ok(Box::new(FlowAtlasApp::new(cc, launch)))),
    )
    .map_err(|error| anyhow::anyhow!("{error}"))
    .context("desktop shell exited with an error")
}
