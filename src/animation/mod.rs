//! Timer-free animation: everything here moves only when the host calls
//! `advance(dt)`.

mod curve;
mod particles;
mod playback;

pub use curve::EdgeCurve;
pub use particles::{Particle, ParticleTrack, PathAnimator, carries_particles};
pub use playback::StepPlayback;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationConfig {
    /// Seconds for one particle to cross its edge.
    pub particle_period: f32,
    pub particles_per_edge: usize,
    pub particle_radius: f32,
    /// Seconds between playback steps.
    pub step_interval: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            particle_period: 3.0,
            particles_per_edge: 1,
            particle_radius: 3.0,
            step_interval: 1.5,
        }
    }
}
