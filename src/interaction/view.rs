use eframe::egui::{Pos2, Rect, Vec2};

pub const MIN_ZOOM: f32 = 0.3;
pub const MAX_ZOOM: f32 = 5.0;
pub const ZOOM_IN_STEP: f32 = 1.3;
pub const ZOOM_OUT_STEP: f32 = 0.7;

/// Pan and zoom between world space and the canvas rectangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub pan: Vec2,
    pub zoom: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl ViewTransform {
    pub fn world_to_screen(&self, rect: Rect, world: Vec2) -> Pos2 {
        rect.center() + self.pan + (world * self.zoom)
    }

    pub fn screen_to_world(&self, rect: Rect, screen: Pos2) -> Vec2 {
        (screen - rect.center() - self.pan) / self.zoom.max(f32::EPSILON)
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        if delta.is_finite() {
            self.pan += delta;
        }
    }

    /// Zooms keeping the world point under `pointer` fixed.
    pub fn zoom_at(&mut self, rect: Rect, pointer: Pos2, factor: f32) {
        if !factor.is_finite() || factor <= 0.0 || !pointer.is_finite() {
            return;
        }

        let world_before = self.screen_to_world(rect, pointer);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.pan = pointer - rect.center() - (world_before * self.zoom);
    }

    pub fn zoom_by(&mut self, rect: Rect, factor: f32) {
        self.zoom_at(rect, rect.center(), factor);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::{pos2, vec2};

    fn canvas() -> Rect {
        Rect::from_min_size(Pos2::ZERO, vec2(800.0, 600.0))
    }

    #[test]
    fn zoom_is_bounded() {
        let mut view = ViewTransform::default();
        for _ in 0..20 {
            view.zoom_by(canvas(), ZOOM_IN_STEP);
        }
        assert_eq!(view.zoom, MAX_ZOOM);

        for _ in 0..40 {
            view.zoom_by(canvas(), ZOOM_OUT_STEP);
        }
        assert_eq!(view.zoom, MIN_ZOOM);
    }

    #[test]
    fn pointer_anchor_stays_put() {
        let mut view = ViewTransform::default();
        let pointer = pos2(600.0, 150.0);
        let before = view.screen_to_world(canvas(), pointer);

        view.zoom_at(canvas(), pointer, 1.3);
        let after = view.world_to_screen(canvas(), before);
        assert!(after.distance(pointer) < 1e-3);
    }
}
