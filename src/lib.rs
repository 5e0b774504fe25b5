//! Interactive map of data flows between systems: graph construction,
//! force layout, highlighting and animation, plus an egui shell.

pub mod animation;
pub mod app;
pub mod catalog;
pub mod graph;
pub mod highlight;
pub mod interaction;
pub mod physics;
pub mod theme;
mod util;

pub use util::short_label;
