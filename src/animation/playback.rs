/// Stepped walk through one flow's process steps.
#[derive(Clone, Debug, PartialEq)]
pub struct StepPlayback {
    interval: f32,
    step_count: usize,
    current: usize,
    playing: bool,
    waited: f32,
}

impl StepPlayback {
    pub fn new(interval: f32) -> Self {
        Self {
            interval: interval.max(f32::EPSILON),
            step_count: 0,
            current: 0,
            playing: false,
            waited: 0.0,
        }
    }

    /// Loads a new flow: back to the first step, paused.
    pub fn load(&mut self, step_count: usize) {
        self.step_count = step_count;
        self.current = 0;
        self.playing = false;
        self.waited = 0.0;
    }

    /// Starting at the last step rewinds to the first.
    pub fn play(&mut self) {
        if self.step_count < 2 {
            return;
        }
        if self.current + 1 >= self.step_count {
            self.current = 0;
        }
        self.waited = 0.0;
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn toggle(&mut self) {
        if self.playing {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn stop(&mut self) {
        self.playing = false;
        self.waited = 0.0;
    }

    /// Returns whether the current step changed.
    pub fn advance(&mut self, dt: f32) -> bool {
        if !self.playing || !dt.is_finite() || dt <= 0.0 {
            return false;
        }

        self.waited += dt;
        let mut changed = false;
        while self.playing && self.waited >= self.interval {
            self.waited -= self.interval;
            self.current += 1;
            changed = true;
            if self.current + 1 >= self.step_count {
                self.current = self.step_count.saturating_sub(1);
                self.playing = false;
            }
        }
        changed
    }

    pub fn select(&mut self, step: usize) {
        if step < self.step_count {
            self.current = step;
            self.waited = 0.0;
        }
    }

    pub fn current_step(&self) -> usize {
        self.current
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stops_on_the_last_step() {
        let mut playback = StepPlayback::new(1.5);
        playback.load(3);
        playback.play();

        assert!(!playback.advance(1.0));
        assert!(playback.advance(0.5));
        assert_eq!(playback.current_step(), 1);

        assert!(playback.advance(10.0));
        assert_eq!(playback.current_step(), 2);
        assert!(!playback.is_playing());
        assert!(!playback.advance(1.5));
    }

    #[test]
    fn toggle_from_the_end_rewinds() {
        let mut playback = StepPlayback::new(1.5);
        playback.load(2);
        playback.select(1);

        playback.toggle();
        assert!(playback.is_playing());
        assert_eq!(playback.current_step(), 0);

        playback.toggle();
        assert!(!playback.is_playing());
    }

    #[test]
    fn single_step_flows_never_play() {
        let mut playback = StepPlayback::new(1.5);
        playback.load(1);
        playback.play();
        assert!(!playback.is_playing());
    }
}
