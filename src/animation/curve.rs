use eframe::egui::{Pos2, Vec2, vec2};

use crate::graph::EdgeKind;

const ARC_SAMPLES: usize = 32;
const SHADOW_LIFT: f32 = 40.0;
const BEND: f32 = 5.0;

/// Quadratic Bézier used to draw an edge and to move particles along it.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeCurve {
    pub start: Pos2,
    pub control: Pos2,
    pub end: Pos2,
    /// Cumulative arc length at `ARC_SAMPLES + 1` evenly spaced parameters.
    arc: Vec<f32>,
}

impl EdgeCurve {
    pub fn quadratic(start: Pos2, control: Pos2, end: Pos2) -> Self {
        if !(start.is_finite() && control.is_finite() && end.is_finite()) {
            return Self::degenerate();
        }

        let mut curve = Self {
            start,
            control,
            end,
            arc: Vec::with_capacity(ARC_SAMPLES + 1),
        };

        let mut previous = start;
        let mut total = 0.0;
        curve.arc.push(0.0);
        for sample in 1..=ARC_SAMPLES {
            let point = curve.point_at(sample as f32 / ARC_SAMPLES as f32);
            total += point.distance(previous);
            curve.arc.push(total);
            previous = point;
        }
        curve
    }

    /// Shadow system links arch upward; everything else bends slightly to
    /// the side so parallel edges stay apart.
    pub fn for_edge(kind: EdgeKind, start: Pos2, end: Pos2) -> Self {
        if !(start.is_finite() && end.is_finite()) {
            return Self::degenerate();
        }

        let mid = start + (end - start) * 0.5;
        let control = match kind {
            EdgeKind::SystemToSystem => mid - vec2(0.0, SHADOW_LIFT),
            _ => {
                let delta = end - start;
                let length = delta.length();
                if length > f32::EPSILON {
                    mid + vec2(-delta.y, delta.x) / length * BEND
                } else {
                    mid
                }
            }
        };
        Self::quadratic(start, control, end)
    }

    /// Minimal valid path at the origin.
    pub fn degenerate() -> Self {
        Self {
            start: Pos2::ZERO,
            control: Pos2::ZERO,
            end: Pos2::ZERO,
            arc: vec![0.0; ARC_SAMPLES + 1],
        }
    }

    /// `None` while the curve cannot be measured yet.
    pub fn length(&self) -> Option<f32> {
        self.arc
            .last()
            .copied()
            .filter(|length| length.is_finite() && *length > f32::EPSILON)
    }

    pub fn point_at(&self, t: f32) -> Pos2 {
        let t = t.clamp(0.0, 1.0);
        let inverse = 1.0 - t;
        let weighted: Vec2 = self.start.to_vec2() * (inverse * inverse)
            + self.control.to_vec2() * (2.0 * inverse * t)
            + self.end.to_vec2() * (t * t);
        weighted.to_pos2()
    }

    /// Point at a fraction of the arc length.
    pub fn point_at_length_fraction(&self, fraction: f32) -> Option<Pos2> {
        let length = self.length()?;
        let wanted = fraction.clamp(0.0, 1.0) * length;

        let segment = self
            .arc
            .partition_point(|&covered| covered < wanted)
            .clamp(1, ARC_SAMPLES);
        let before = self.arc[segment - 1];
        let span = self.arc[segment] - before;
        let local = if span > f32::EPSILON {
            (wanted - before) / span
        } else {
            0.0
        };

        let t = ((segment - 1) as f32 + local) / ARC_SAMPLES as f32;
        Some(self.point_at(t))
    }

    /// Polyline approximation for drawing.
    pub fn polyline(&self, segments: usize) -> Vec<Pos2> {
        let segments = segments.max(1);
        (0..=segments)
            .map(|step| self.point_at(step as f32 / segments as f32))
            .collect()
    }

    pub fn midpoint(&self) -> Pos2 {
        self.point_at_length_fraction(0.5)
            .unwrap_or(self.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::pos2;

    #[test]
    fn shadow_edges_arch_above_the_chord() {
        let curve = EdgeCurve::for_edge(
            EdgeKind::SystemToSystem,
            pos2(0.0, 100.0),
            pos2(200.0, 100.0),
        );
        assert_eq!(curve.control, pos2(100.0, 60.0));
        assert!(curve.midpoint().y < 100.0);
    }

    #[test]
    fn arc_fraction_walks_a_straight_line_evenly() {
        let curve = EdgeCurve::quadratic(pos2(0.0, 0.0), pos2(50.0, 0.0), pos2(100.0, 0.0));
        let quarter = curve.point_at_length_fraction(0.25).expect("measurable");
        assert!((quarter.x - 25.0).abs() < 0.5);
        assert!((curve.length().unwrap_or_default() - 100.0).abs() < 1e-2);
    }

    #[test]
    fn zero_length_and_non_finite_curves_are_unmeasurable() {
        let point = pos2(3.0, 3.0);
        assert_eq!(EdgeCurve::for_edge(EdgeKind::SystemToFlow, point, point).length(), None);

        let broken = EdgeCurve::for_edge(EdgeKind::SystemToFlow, pos2(f32::NAN, 0.0), point);
        assert_eq!(broken, EdgeCurve::degenerate());
        assert_eq!(broken.point_at_length_fraction(0.5), None);
    }
}
