//! Pluggable forces. Each one nudges body velocities (or, for centering,
//! positions) once per tick and is composed into a per-mode stack.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use eframe::egui::{Vec2, vec2};

use super::Body;
use super::quadtree::QuadNode;
use crate::graph::{Level, NodeKind};

const BARNES_HUT_THETA: f32 = 0.72;
const MIN_DISTANCE_SQ: f32 = 1.0;

pub trait Force {
    fn name(&self) -> &'static str;

    /// Called once per tick with the current cooling factor.
    fn apply(&mut self, bodies: &mut [Body], alpha: f32);
}

/// Per-kind parameter lookup.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KindTable<T> {
    pub system: T,
    pub interface: T,
    pub flow: T,
}

impl<T: Copy> KindTable<T> {
    pub fn get(&self, kind: NodeKind) -> T {
        match kind {
            NodeKind::System => self.system,
            NodeKind::Interface => self.interface,
            NodeKind::Flow => self.flow,
        }
    }
}

/// Direction used when two points coincide exactly.
fn fallback_direction(from: usize, to: usize) -> Vec2 {
    let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin())
}

#[derive(Clone, Copy, Debug)]
pub struct Spring {
    pub source: usize,
    pub target: usize,
    pub rest_length: f32,
    pub strength: f32,
}

/// Springs pulling linked bodies toward a rest length.
pub struct LinkForce {
    springs: Vec<Spring>,
    degree: Vec<usize>,
}

impl LinkForce {
    pub fn new(springs: Vec<Spring>, body_count: usize) -> Self {
        let springs = springs
            .into_iter()
            .filter(|spring| {
                spring.source < body_count
                    && spring.target < body_count
                    && spring.source != spring.target
            })
            .collect::<Vec<_>>();

        let mut degree = vec![0; body_count];
        for spring in &springs {
            degree[spring.source] += 1;
            degree[spring.target] += 1;
        }

        Self { springs, degree }
    }
}

impl Force for LinkForce {
    fn name(&self) -> &'static str {
        "link"
    }

    fn apply(&mut self, bodies: &mut [Body], alpha: f32) {
        for spring in &self.springs {
            let (Some(source), Some(target)) = (bodies.get(spring.source), bodies.get(spring.target))
            else {
                continue;
            };

            let mut delta = (target.position + target.velocity) - (source.position + source.velocity);
            let mut distance = delta.length();
            if distance <= f32::EPSILON {
                delta = fallback_direction(spring.source, spring.target) * 1e-3;
                distance = delta.length();
            }

            let stretch = (distance - spring.rest_length) / distance * alpha * spring.strength;
            let correction = delta * stretch;

            let source_degree = self.degree[spring.source] as f32;
            let target_degree = self.degree[spring.target] as f32;
            let bias = source_degree / (source_degree + target_degree);

            bodies[spring.target].velocity -= correction * bias;
            bodies[spring.source].velocity += correction * (1.0 - bias);
        }
    }
}

/// Mutual repulsion with per-kind charge, approximated with a quadtree.
pub struct ManyBodyForce {
    charge: KindTable<f32>,
    hub_charge: Option<f32>,
    positions: Vec<Vec2>,
    charges: Vec<f32>,
}

impl ManyBodyForce {
    pub fn new(charge: KindTable<f32>) -> Self {
        Self {
            charge,
            hub_charge: None,
            positions: Vec::new(),
            charges: Vec::new(),
        }
    }

    pub fn with_hub_charge(mut self, charge: f32) -> Self {
        self.hub_charge = Some(charge);
        self
    }

    fn charge_of(&self, body: &Body) -> f32 {
        match self.hub_charge {
            Some(charge) if body.hub => charge,
            _ => self.charge.get(body.kind),
        }
    }
}

fn accumulate_charge(
    node: &QuadNode,
    index: usize,
    positions: &[Vec2],
    charges: &[f32],
    alpha: f32,
    velocity: &mut Vec2,
) {
    if node.count == 0 || node.charge == 0.0 {
        return;
    }

    let point = positions[index];

    if node.is_leaf() {
        for &other in &node.indices {
            if other == index {
                continue;
            }

            let mut delta = positions[other] - point;
            if delta.length_sq() <= f32::EPSILON {
                delta = fallback_direction(index, other);
            }
            let distance_sq = delta.length_sq().max(MIN_DISTANCE_SQ);
            *velocity += delta * (charges[other] * alpha / distance_sq);
        }
        return;
    }

    let delta = node.center_of_charge - point;
    let distance_sq = delta.length_sq().max(MIN_DISTANCE_SQ);
    let can_approximate = !node.bounds.contains(point)
        && (node.bounds.side_length() / distance_sq.sqrt()) < BARNES_HUT_THETA
        && node.count > 1;

    if can_approximate {
        *velocity += delta * (node.charge * alpha / distance_sq);
        return;
    }

    for child in node.children.iter().filter_map(|child| child.as_deref()) {
        accumulate_charge(child, index, positions, charges, alpha, velocity);
    }
}

impl Force for ManyBodyForce {
    fn name(&self) -> &'static str {
        "charge"
    }

    fn apply(&mut self, bodies: &mut [Body], alpha: f32) {
        self.positions.clear();
        self.positions.extend(bodies.iter().map(|body| body.position));
        let charges = bodies
            .iter()
            .map(|body| self.charge_of(body))
            .collect::<Vec<_>>();
        self.charges = charges;

        let Some(tree) = QuadNode::build(&self.positions, &self.charges) else {
            return;
        };

        for (index, body) in bodies.iter_mut().enumerate() {
            if !body.position.is_finite() {
                continue;
            }
            accumulate_charge(
                &tree,
                index,
                &self.positions,
                &self.charges,
                alpha,
                &mut body.velocity,
            );
        }
    }
}

/// Minimum separation by per-kind radius, resolved over several passes.
pub struct CollisionForce {
    radius: KindTable<f32>,
    strength: f32,
    iterations: usize,
    pairs: Vec<(usize, usize)>,
}

impl CollisionForce {
    pub fn new(radius: KindTable<f32>, strength: f32, iterations: usize) -> Self {
        Self {
            radius,
            strength,
            iterations: iterations.max(1),
            pairs: Vec::new(),
        }
    }
}

impl Force for CollisionForce {
    fn name(&self) -> &'static str {
        "collide"
    }

    fn apply(&mut self, bodies: &mut [Body], _alpha: f32) {
        let radii = bodies
            .iter()
            .map(|body| self.radius.get(body.kind))
            .collect::<Vec<_>>();
        let max_radius = radii.iter().copied().fold(0.0_f32, f32::max);
        if max_radius <= 0.0 {
            return;
        }

        let unit = vec![1.0; bodies.len()];
        for _ in 0..self.iterations {
            let predicted = bodies
                .iter()
                .map(|body| body.position + body.velocity)
                .collect::<Vec<_>>();
            let Some(tree) = QuadNode::build(&predicted, &unit) else {
                return;
            };

            self.pairs.clear();
            tree.candidate_pairs(max_radius * 2.0, &mut self.pairs);

            for &(from, to) in &self.pairs {
                let reach = radii[from] + radii[to];
                let mut delta = predicted[from] - predicted[to];
                let mut distance_sq = delta.length_sq();
                if distance_sq >= reach * reach {
                    continue;
                }
                if distance_sq <= f32::EPSILON {
                    delta = fallback_direction(from, to) * 1e-3;
                    distance_sq = delta.length_sq();
                }

                let distance = distance_sq.sqrt();
                let push = delta * ((reach - distance) / distance * self.strength);
                let from_sq = radii[from] * radii[from];
                let to_sq = radii[to] * radii[to];
                let share = to_sq / (from_sq + to_sq);

                bodies[from].velocity += push * share;
                bodies[to].velocity -= push * (1.0 - share);
            }
        }
    }
}

/// Pulls every levelled body toward its level's band.
pub struct LevelBandForce {
    height: f32,
    strength: f32,
}

impl LevelBandForce {
    pub fn new(height: f32, strength: f32) -> Self {
        Self { height, strength }
    }

    /// World y of a level's band; world space is centered on the canvas.
    pub fn band_y(level: Level, height: f32) -> f32 {
        (level.band() - 0.5) * height
    }
}

impl Force for LevelBandForce {
    fn name(&self) -> &'static str {
        "level-band"
    }

    fn apply(&mut self, bodies: &mut [Body], alpha: f32) {
        for body in bodies {
            if let Some(level) = body.level {
                let target = Self::band_y(level, self.height);
                body.velocity.y += (target - body.position.y) * self.strength * alpha;
            }
        }
    }
}

/// Spreads bodies sharing a level evenly across the canvas width.
pub struct LevelSpreadForce {
    width: f32,
    strength: f32,
}

impl LevelSpreadForce {
    pub fn new(width: f32, strength: f32) -> Self {
        Self { width, strength }
    }
}

impl Force for LevelSpreadForce {
    fn name(&self) -> &'static str {
        "level-spread"
    }

    fn apply(&mut self, bodies: &mut [Body], alpha: f32) {
        let mut by_level: BTreeMap<Level, Vec<usize>> = BTreeMap::new();
        for (index, body) in bodies.iter().enumerate() {
            if let Some(level) = body.level {
                by_level.entry(level).or_default().push(index);
            }
        }

        for members in by_level.values_mut() {
            members.sort_by(|&a, &b| {
                bodies[a]
                    .position
                    .x
                    .partial_cmp(&bodies[b].position.x)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| bodies[a].id.cmp(&bodies[b].id))
            });

            let spacing = self.width / (members.len() as f32 + 1.0);
            for (slot, &index) in members.iter().enumerate() {
                let target = -self.width * 0.5 + spacing * (slot as f32 + 1.0);
                let body = &mut bodies[index];
                body.velocity.x += (target - body.position.x) * alpha * self.strength;
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Weak pull of every body toward a coordinate on one axis.
pub struct AxisForce {
    axis: Axis,
    target: f32,
    strength: f32,
}

impl AxisForce {
    pub fn new(axis: Axis, target: f32, strength: f32) -> Self {
        Self {
            axis,
            target,
            strength,
        }
    }
}

impl Force for AxisForce {
    fn name(&self) -> &'static str {
        match self.axis {
            Axis::X => "axis-x",
            Axis::Y => "axis-y",
        }
    }

    fn apply(&mut self, bodies: &mut [Body], alpha: f32) {
        for body in bodies {
            match self.axis {
                Axis::X => body.velocity.x += (self.target - body.position.x) * self.strength * alpha,
                Axis::Y => body.velocity.y += (self.target - body.position.y) * self.strength * alpha,
            }
        }
    }
}

/// Pulls systems onto a ring around the origin; hubs get the outer ring.
pub struct RadialForce {
    hub_radius: f32,
    radius: f32,
    strength: f32,
}

impl RadialForce {
    pub fn new(hub_radius: f32, radius: f32, strength: f32) -> Self {
        Self {
            hub_radius,
            radius,
            strength,
        }
    }
}

impl Force for RadialForce {
    fn name(&self) -> &'static str {
        "radial"
    }

    fn apply(&mut self, bodies: &mut [Body], alpha: f32) {
        for (index, body) in bodies.iter_mut().enumerate() {
            if body.kind != NodeKind::System {
                continue;
            }

            let ring = if body.hub { self.hub_radius } else { self.radius };
            let mut offset = body.position;
            if offset.length_sq() <= f32::EPSILON {
                offset = fallback_direction(index, 0) * 1e-3;
            }

            let distance = offset.length();
            let pull = (ring - distance) * self.strength * alpha / distance;
            body.velocity += offset * pull;
        }
    }
}

/// Shifts free bodies so their mean drifts toward the origin.
pub struct CenterForce {
    strength: f32,
}

impl CenterForce {
    pub fn new(strength: f32) -> Self {
        Self { strength }
    }
}

impl Force for CenterForce {
    fn name(&self) -> &'static str {
        "center"
    }

    fn apply(&mut self, bodies: &mut [Body], _alpha: f32) {
        let free = bodies.iter().filter(|body| body.pinned.is_none());
        let (sum, count) = free.fold((Vec2::ZERO, 0usize), |(sum, count), body| {
            (sum + body.position, count + 1)
        });
        if count == 0 {
            return;
        }

        let shift = (sum / count as f32) * self.strength;
        for body in bodies.iter_mut().filter(|body| body.pinned.is_none()) {
            body.position -= shift;
        }
    }
}

/// Pulls each kind toward its own centroid.
pub struct ClusterForce {
    centroids: KindTable<Vec2>,
    strength: f32,
}

impl ClusterForce {
    pub fn new(centroids: KindTable<Vec2>, strength: f32) -> Self {
        Self {
            centroids,
            strength,
        }
    }
}

impl Force for ClusterForce {
    fn name(&self) -> &'static str {
        "cluster"
    }

    fn apply(&mut self, bodies: &mut [Body], alpha: f32) {
        for body in bodies {
            let target = self.centroids.get(body.kind);
            body.velocity += (target - body.position) * self.strength * alpha;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(id: &str, kind: NodeKind, position: Vec2) -> Body {
        Body::new(id, kind, position)
    }

    #[test]
    fn stretched_spring_pulls_ends_together() {
        let mut bodies = vec![
            body("a", NodeKind::System, vec2(0.0, 0.0)),
            body("b", NodeKind::Interface, vec2(300.0, 0.0)),
        ];
        let mut force = LinkForce::new(
            vec![Spring {
                source: 0,
                target: 1,
                rest_length: 100.0,
                strength: 0.4,
            }],
            2,
        );

        force.apply(&mut bodies, 1.0);
        assert!(bodies[0].velocity.x > 0.0);
        assert!(bodies[1].velocity.x < 0.0);
    }

    #[test]
    fn spring_strength_scales_the_pull() {
        let pull = |strength: f32| {
            let mut bodies = vec![
                body("a", NodeKind::System, vec2(0.0, 0.0)),
                body("b", NodeKind::System, vec2(300.0, 0.0)),
            ];
            let spring = Spring {
                source: 0,
                target: 1,
                rest_length: 100.0,
                strength,
            };
            LinkForce::new(vec![spring], 2).apply(&mut bodies, 1.0);
            bodies[0].velocity.x
        };

        assert!(pull(0.4) > pull(0.1));
        assert!((pull(0.4) - 4.0 * pull(0.1)).abs() < 1e-3);
    }

    #[test]
    fn coincident_bodies_repel_without_nan() {
        let mut bodies = vec![
            body("a", NodeKind::System, Vec2::ZERO),
            body("b", NodeKind::System, Vec2::ZERO),
        ];
        let mut charge = ManyBodyForce::new(KindTable {
            system: -1200.0,
            interface: -600.0,
            flow: -400.0,
        });
        let mut collide = CollisionForce::new(
            KindTable {
                system: 100.0,
                interface: 50.0,
                flow: 60.0,
            },
            0.7,
            2,
        );

        charge.apply(&mut bodies, 0.5);
        collide.apply(&mut bodies, 0.5);

        assert!(bodies.iter().all(|body| body.velocity.is_finite()));
        assert!((bodies[0].velocity - bodies[1].velocity).length() > 0.0);
    }

    #[test]
    fn spread_targets_are_evenly_spaced() {
        let mut bodies = ["c", "a", "b"]
            .into_iter()
            .enumerate()
            .map(|(index, id)| {
                let mut body = body(id, NodeKind::Flow, vec2(index as f32, 0.0));
                body.level = Some(Level::Flow);
                body
            })
            .collect::<Vec<_>>();

        LevelSpreadForce::new(400.0, 0.3).apply(&mut bodies, 1.0);

        // targets -100, 0, 100 in x order
        assert!((bodies[0].velocity.x - (-100.0 * 0.3)).abs() < 1e-3);
        assert!((bodies[1].velocity.x - (-1.0 * 0.3)).abs() < 1e-3);
        assert!((bodies[2].velocity.x - (98.0 * 0.3)).abs() < 1e-3);
    }

    #[test]
    fn hubs_settle_on_the_outer_ring() {
        let mut hub = body("GAS-X-GRID", NodeKind::System, vec2(100.0, 0.0));
        hub.hub = true;
        let mut bodies = vec![hub, body("SAP", NodeKind::System, vec2(100.0, 0.0))];

        RadialForce::new(320.0, 200.0, 0.3).apply(&mut bodies, 1.0);
        assert!(bodies[0].velocity.x > bodies[1].velocity.x);
        assert!(bodies[1].velocity.x > 0.0);
    }
}
