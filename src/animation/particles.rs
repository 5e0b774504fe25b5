use eframe::egui::{Color32, Pos2};

use super::AnimationConfig;
use super::curve::EdgeCurve;
use crate::graph::{GraphEdge, GraphModel};

/// Looping particles on one edge, evenly phase-shifted.
#[derive(Clone, Debug, PartialEq)]
pub struct ParticleTrack {
    pub edge_id: String,
    pub color: Color32,
    pub phases: Vec<f32>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle<'a> {
    pub edge_id: &'a str,
    pub position: Pos2,
    pub color: Color32,
}

/// Ambient "data flowing" motion along edges whose flow carries a format.
#[derive(Clone, Debug, Default)]
pub struct PathAnimator {
    period: f32,
    per_edge: usize,
    elapsed: f32,
    tracks: Vec<ParticleTrack>,
    running: bool,
}

/// Only edges tied to a flow with a message format get particles.
pub fn carries_particles(edge: &GraphEdge) -> bool {
    edge.associated_flow
        .as_ref()
        .is_some_and(|flow| !flow.format.trim().is_empty())
}

impl PathAnimator {
    pub fn new(config: &AnimationConfig) -> Self {
        Self {
            period: config.particle_period.max(f32::EPSILON),
            per_edge: config.particles_per_edge.max(1),
            ..Self::default()
        }
    }

    /// Replaces every track for a new graph snapshot and restarts the clock.
    pub fn rebuild(&mut self, model: &GraphModel, color_of: impl Fn(&GraphEdge) -> Color32) {
        let per_edge = self.per_edge;
        self.tracks = model
            .edges()
            .iter()
            .filter(|edge| carries_particles(edge))
            .map(|edge| ParticleTrack {
                edge_id: edge.id.clone(),
                color: color_of(edge),
                phases: (0..per_edge)
                    .map(|slot| slot as f32 / per_edge as f32)
                    .collect(),
            })
            .collect();
        self.elapsed = 0.0;
        self.running = !self.tracks.is_empty();
    }

    pub fn advance(&mut self, dt: f32) {
        if self.running && dt.is_finite() && dt > 0.0 {
            self.elapsed = (self.elapsed + dt) % self.period;
        }
    }

    /// Drops all tracks; nothing moves until the next rebuild.
    pub fn stop(&mut self) {
        self.running = false;
        self.tracks.clear();
        self.elapsed = 0.0;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn tracks(&self) -> &[ParticleTrack] {
        &self.tracks
    }

    /// Arc-length fraction reached by a particle with the given phase.
    pub fn fraction(&self, phase: f32) -> f32 {
        ((self.elapsed / self.period) + phase).rem_euclid(1.0)
    }

    /// Current particle positions. Edges whose curve is unavailable or not
    /// yet measurable are skipped for this frame.
    pub fn particles<'a>(
        &'a self,
        curve_of: impl Fn(&str) -> Option<EdgeCurve>,
    ) -> Vec<Particle<'a>> {
        if !self.running {
            return Vec::new();
        }

        let mut particles = Vec::new();
        for track in &self.tracks {
            let Some(curve) = curve_of(&track.edge_id) else {
                continue;
            };

            for &phase in &track.phases {
                if let Some(position) = curve.point_at_length_fraction(self.fraction(phase)) {
                    particles.push(Particle {
                        edge_id: &track.edge_id,
                        position,
                        color: track.color,
                    });
                }
            }
        }
        particles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::pos2;

    fn animator(per_edge: usize) -> PathAnimator {
        PathAnimator::new(&AnimationConfig {
            particles_per_edge: per_edge,
            ..AnimationConfig::default()
        })
    }

    #[test]
    fn phases_spread_evenly() {
        let mut animator = animator(4);
        animator.running = true;
        animator.advance(0.75);

        let fractions = [0.0, 0.25, 0.5, 0.75].map(|phase| animator.fraction(phase));
        assert!((fractions[0] - 0.25).abs() < 1e-5);
        assert!((fractions[3] - 0.0).abs() < 1e-5);
    }

    #[test]
    fn unmeasurable_curves_are_deferred() {
        let mut animator = animator(1);
        animator.running = true;
        animator.tracks.push(ParticleTrack {
            edge_id: "a|b|system-to-system".to_owned(),
            color: Color32::RED,
            phases: vec![0.0],
        });

        let point = pos2(1.0, 1.0);
        let collapsed = animator.particles(|_| Some(EdgeCurve::quadratic(point, point, point)));
        assert!(collapsed.is_empty());

        let live = animator.particles(|_| {
            Some(EdgeCurve::quadratic(pos2(0.0, 0.0), pos2(5.0, 0.0), pos2(10.0, 0.0)))
        });
        assert_eq!(live.len(), 1);
    }
}
