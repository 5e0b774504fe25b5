//! Frame-driven force layout.
//!
//! World space is centered on the canvas: `(0, 0)` is the canvas center and
//! the canvas spans `±width / 2` by `±height / 2`.

mod forces;
mod profile;
mod quadtree;

use std::collections::HashMap;

use eframe::egui::{Vec2, vec2};

use crate::graph::{DisplayMode, GraphModel, Level, NodeKind};
use crate::util::stable_pair;

pub use forces::{
    Axis, AxisForce, CenterForce, ClusterForce, CollisionForce, Force, KindTable, LevelBandForce,
    LevelSpreadForce, LinkForce, ManyBodyForce, RadialForce, Spring,
};
pub use profile::{collision_radius, link_strength, rest_length};

use profile::{Link, force_stack};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutConfig {
    pub width: f32,
    pub height: f32,
    /// Seconds after a rebuild before the energy target drops to zero.
    pub settle_window: f32,
    /// Hard stop for one relaxation run, in seconds.
    pub max_simulated_time: f32,
    pub rebuild_alpha: f32,
    pub warm_alpha_target: f32,
    pub drag_alpha_target: f32,
    /// Energy below which forces are switched off and the layout coasts.
    pub alpha_min: f32,
    pub alpha_decay: f32,
    /// Fraction of velocity lost per tick.
    pub velocity_decay: f32,
    pub max_speed: f32,
    /// Summed speed below which a cooled layout counts as at rest.
    pub epsilon: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let alpha_min = 0.001_f32;
        Self {
            width: 1200.0,
            height: 800.0,
            settle_window: 3.0,
            max_simulated_time: 20.0,
            rebuild_alpha: 0.5,
            warm_alpha_target: 0.08,
            drag_alpha_target: 0.3,
            alpha_min,
            alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
            velocity_decay: 0.4,
            max_speed: 60.0,
            epsilon: 0.5,
        }
    }
}

/// Simulation state of one node.
#[derive(Clone, Debug, PartialEq)]
pub struct Body {
    pub id: String,
    pub kind: NodeKind,
    pub level: Option<Level>,
    pub hub: bool,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Set by a drag; cleared only by an explicit release.
    pub pinned: Option<Vec2>,
}

impl Body {
    pub fn new(id: impl Into<String>, kind: NodeKind, position: Vec2) -> Self {
        Self {
            id: id.into(),
            kind,
            level: None,
            hub: false,
            position,
            velocity: Vec2::ZERO,
            pinned: None,
        }
    }
}

pub struct LayoutEngine {
    config: LayoutConfig,
    mode: DisplayMode,
    bodies: Vec<Body>,
    index_by_id: HashMap<String, usize>,
    links: Vec<Link>,
    forces: Vec<Box<dyn Force>>,
    alpha: f32,
    alpha_target: f32,
    warm: bool,
    since_rebuild: f32,
    since_reheat: f32,
    ticks: u64,
    dragging: Option<usize>,
    settled: bool,
    settled_speed: f32,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            mode: DisplayMode::default(),
            bodies: Vec::new(),
            index_by_id: HashMap::new(),
            links: Vec::new(),
            forces: Vec::new(),
            alpha: 0.0,
            alpha_target: 0.0,
            warm: false,
            since_rebuild: 0.0,
            since_reheat: 0.0,
            ticks: 0,
            dragging: None,
            settled: true,
            settled_speed: 0.0,
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    /// Reseeds the simulation for a new graph snapshot. Nodes that survive
    /// keep their last position; pins are dropped.
    pub fn rebuild(&mut self, model: &GraphModel) {
        let previous = self
            .bodies
            .drain(..)
            .filter(|body| body.position.is_finite())
            .map(|body| (body.id, body.position))
            .collect::<HashMap<_, _>>();

        self.mode = model.mode;
        self.bodies = model
            .nodes()
            .iter()
            .map(|node| {
                let level = node.level();
                let position = previous
                    .get(node.id())
                    .copied()
                    .unwrap_or_else(|| seed_position(node.id(), level, &self.config));
                let mut body = Body::new(node.id(), node.kind(), position);
                body.level = level;
                body.hub = node.is_hub();
                body
            })
            .collect();

        self.index_by_id = self
            .bodies
            .iter()
            .enumerate()
            .map(|(index, body)| (body.id.clone(), index))
            .collect();

        self.links = model
            .edges()
            .iter()
            .filter_map(|edge| {
                Some(Link {
                    source: self.index_by_id.get(&edge.source).copied()?,
                    target: self.index_by_id.get(&edge.target).copied()?,
                    kind: edge.kind,
                })
            })
            .collect();

        self.forces = force_stack(self.mode, &self.links, self.bodies.len(), &self.config);
        self.alpha = self.config.rebuild_alpha;
        self.alpha_target = self.config.warm_alpha_target;
        self.warm = true;
        self.since_rebuild = 0.0;
        self.since_reheat = 0.0;
        self.ticks = 0;
        self.dragging = None;
        self.settled = self.bodies.is_empty();
        self.settled_speed = 0.0;

        tracing::debug!(
            mode = self.mode.label(),
            bodies = self.bodies.len(),
            links = self.links.len(),
            carried = previous.len(),
            "layout reseeded"
        );
    }

    /// Canvas size feeds the band, spread and ring targets.
    pub fn set_canvas(&mut self, width: f32, height: f32) {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return;
        }
        if (self.config.width - width).abs() < 0.5 && (self.config.height - height).abs() < 0.5 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.forces = force_stack(self.mode, &self.links, self.bodies.len(), &self.config);
    }

    /// Runs one tick and advances the clocks by `dt` seconds. Returns whether
    /// the simulation is still running afterwards.
    pub fn advance(&mut self, dt: f32) -> bool {
        if self.settled || self.bodies.is_empty() {
            return false;
        }

        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.since_rebuild += dt;
        self.since_reheat += dt;
        if self.warm && self.since_rebuild >= self.config.settle_window {
            self.warm = false;
            if self.dragging.is_none() {
                self.alpha_target = 0.0;
            }
        }

        self.tick();

        let idle = self.dragging.is_none();
        let timed_out = idle && self.since_reheat >= self.config.max_simulated_time;
        let at_rest = idle && !self.warm && self.total_speed() < self.config.epsilon;
        if timed_out || at_rest {
            self.settle();
            return false;
        }

        true
    }

    fn tick(&mut self) {
        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
        if self.alpha_target == 0.0 && self.alpha < self.config.alpha_min {
            self.alpha = 0.0;
        }

        for force in &mut self.forces {
            force.apply(&mut self.bodies, self.alpha);
        }

        let keep = 1.0 - self.config.velocity_decay;
        let max_speed = self.config.max_speed;
        for body in &mut self.bodies {
            if let Some(pin) = body.pinned {
                body.position = pin;
                body.velocity = Vec2::ZERO;
                continue;
            }

            body.velocity *= keep;
            let speed = body.velocity.length();
            if speed > max_speed {
                body.velocity *= max_speed / speed;
            }
            body.position += body.velocity;

            if !body.position.is_finite() || !body.velocity.is_finite() {
                tracing::warn!(node = body.id.as_str(), "non-finite layout position reset");
                body.position = seed_position(&body.id, body.level, &self.config);
                body.velocity = Vec2::ZERO;
            }
        }

        self.ticks += 1;
    }

    fn settle(&mut self) {
        self.settled_speed = self.total_speed();
        for body in &mut self.bodies {
            body.velocity = Vec2::ZERO;
        }
        self.settled = true;
        self.alpha_target = 0.0;

        tracing::debug!(
            ticks = self.ticks,
            alpha = self.alpha,
            speed = self.settled_speed,
            elapsed = self.since_rebuild,
            "layout settled"
        );
    }

    /// Halts the simulation; used when the owning view goes away.
    pub fn stop(&mut self) {
        self.dragging = None;
        self.alpha = 0.0;
        self.warm = false;
        if !self.settled {
            self.settle();
        }
    }

    fn reheat(&mut self) {
        self.alpha_target = self.config.drag_alpha_target;
        self.since_reheat = 0.0;
        self.settled = self.bodies.is_empty();
    }

    /// Pins the node where it is and raises the energy target so its
    /// neighbours react while it moves.
    pub fn begin_drag(&mut self, id: &str) -> bool {
        let Some(index) = self.index_by_id.get(id).copied() else {
            return false;
        };

        let body = &mut self.bodies[index];
        body.pinned = Some(body.position);
        self.dragging = Some(index);
        self.reheat();
        true
    }

    pub fn drag_to(&mut self, position: Vec2) {
        let Some(index) = self.dragging else {
            return;
        };
        if !position.is_finite() {
            return;
        }

        let body = &mut self.bodies[index];
        body.pinned = Some(position);
        body.position = position;
        body.velocity = Vec2::ZERO;
    }

    /// Ends the drag; the node stays pinned until released.
    pub fn end_drag(&mut self) {
        if self.dragging.take().is_some() && !self.warm {
            self.alpha_target = 0.0;
        }
    }

    pub fn dragging(&self) -> Option<&str> {
        self.dragging.map(|index| self.bodies[index].id.as_str())
    }

    pub fn pin(&mut self, id: &str, position: Vec2) -> bool {
        let Some(index) = self.index_by_id.get(id).copied() else {
            return false;
        };
        if !position.is_finite() {
            return false;
        }

        let body = &mut self.bodies[index];
        body.pinned = Some(position);
        body.position = position;
        body.velocity = Vec2::ZERO;
        true
    }

    pub fn release_all(&mut self) -> usize {
        self.dragging = None;
        let released = self
            .bodies
            .iter_mut()
            .filter_map(|body| body.pinned.take())
            .count();
        if released > 0 {
            self.reheat();
            self.alpha_target = 0.0;
            self.alpha = self.alpha.max(self.config.drag_alpha_target * 0.5);
        }
        released
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn body(&self, id: &str) -> Option<&Body> {
        self.index_by_id.get(id).map(|&index| &self.bodies[index])
    }

    pub fn position(&self, id: &str) -> Option<Vec2> {
        self.body(id).map(|body| body.position)
    }

    pub fn positions(&self) -> impl Iterator<Item = (&str, Vec2)> {
        self.bodies
            .iter()
            .map(|body| (body.id.as_str(), body.position))
    }

    pub fn total_speed(&self) -> f32 {
        self.bodies.iter().map(|body| body.velocity.length()).sum()
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// Summed speed on the tick that ended the last run, measured before
    /// velocities were cleared.
    pub fn settled_speed(&self) -> f32 {
        self.settled_speed
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn alpha_target(&self) -> f32 {
        self.alpha_target
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

/// Deterministic starting point for a node first seen in a rebuild.
fn seed_position(id: &str, level: Option<Level>, config: &LayoutConfig) -> Vec2 {
    let (x, y) = stable_pair(id);
    match level {
        Some(level) => vec2(
            x * config.width * 0.45,
            LevelBandForce::band_y(level, config.height) + y * 30.0,
        ),
        None => vec2(x * config.width * 0.4, y * config.height * 0.4),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FlowRecord, ProcessStep, StepType};
    use crate::graph::build_graph;

    fn model(mode: DisplayMode) -> GraphModel {
        let flows = vec![
            FlowRecord::new("F1", "SYS-A", "SYS-B", "NOMINT")
                .with_step(ProcessStep::new(StepType::Delivery, "IF-1")),
            FlowRecord::new("F2", "SYS-B", "SYS-C", "APERAK"),
        ];
        build_graph(&flows, &[], mode)
    }

    #[test]
    fn rebuild_carries_positions_and_drops_pins() {
        let mut engine = LayoutEngine::default();
        engine.rebuild(&model(DisplayMode::Overview));
        assert!(engine.pin("SYS-A", vec2(42.0, -7.0)));

        engine.rebuild(&model(DisplayMode::Technical));
        let body = engine.body("SYS-A").expect("system survives");
        assert_eq!(body.position, vec2(42.0, -7.0));
        assert_eq!(body.pinned, None);
        assert_eq!(engine.alpha(), engine.config().rebuild_alpha);
    }

    #[test]
    fn drag_pins_and_reheats() {
        let mut engine = LayoutEngine::default();
        engine.rebuild(&model(DisplayMode::Overview));
        while engine.advance(1.0 / 60.0) {}
        assert!(engine.is_settled());

        assert!(engine.begin_drag("IF-1"));
        assert!(!engine.is_settled());
        assert_eq!(engine.alpha_target(), engine.config().drag_alpha_target);

        engine.drag_to(vec2(10.0, 10.0));
        assert!(engine.advance(1.0 / 60.0));
        assert_eq!(engine.position("IF-1"), Some(vec2(10.0, 10.0)));

        engine.end_drag();
        assert_eq!(engine.alpha_target(), 0.0);
        assert_eq!(engine.body("IF-1").and_then(|body| body.pinned), Some(vec2(10.0, 10.0)));
        assert_eq!(engine.release_all(), 1);
    }

    #[test]
    fn stop_halts_further_ticks() {
        let mut engine = LayoutEngine::default();
        engine.rebuild(&model(DisplayMode::Technical));
        assert!(engine.advance(1.0 / 60.0));

        engine.stop();
        let ticks = engine.ticks();
        assert!(!engine.advance(1.0 / 60.0));
        assert_eq!(engine.ticks(), ticks);
        assert_eq!(engine.total_speed(), 0.0);
        assert!(engine.settled_speed() > 0.0);
    }

    #[test]
    fn cooled_layout_coasts_until_at_rest() {
        let mut engine = LayoutEngine::default();
        engine.rebuild(&model(DisplayMode::Technical));
        while engine.advance(1.0 / 60.0) {}

        assert!(engine.is_settled());
        assert!(engine.settled_speed() < engine.config().epsilon);
        assert!(engine.settled_speed() > 0.0);
    }

    #[test]
    fn empty_graph_never_runs() {
        let mut engine = LayoutEngine::default();
        engine.rebuild(&GraphModel::default());
        assert!(engine.is_settled());
        assert!(!engine.advance(0.016));
    }
}
