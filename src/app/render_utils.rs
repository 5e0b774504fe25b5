use std::f32::consts::TAU;

use eframe::egui::{
    Align2, Color32, FontId, Painter, Pos2, Rect, Shape, Stroke, StrokeKind, Vec2, vec2,
};

use crate::animation::EdgeCurve;
use crate::graph::EdgeStyle;
use crate::interaction::Tooltip;
use crate::theme::Palette;

const CURVE_SEGMENTS: usize = 24;

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

/// Fades toward transparent while keeping the hue.
pub(super) fn fade_color(color: Color32, opacity: f32) -> Color32 {
    let opacity = opacity.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        color.r(),
        color.g(),
        color.b(),
        (color.a() as f32 * opacity) as u8,
    )
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, palette: &Palette, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, palette.background);

    let step = (48.0 * zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.center() + pan;
    let stroke = Stroke::new(1.0, fade_color(palette.light_gray, 0.9));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

/// Dotted guide line with a caption, one per tier in the tiered modes.
pub(super) fn draw_band_guide(painter: &Painter, rect: Rect, y: f32, label: &str, color: Color32) {
    if y < rect.top() || y > rect.bottom() {
        return;
    }

    let points = [Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)];
    painter.extend(Shape::dashed_line(&points, Stroke::new(1.0, color), 4.0, 6.0));
    painter.text(
        Pos2::new(rect.left() + 8.0, y - 4.0),
        Align2::LEFT_BOTTOM,
        label,
        FontId::proportional(11.0),
        color,
    );
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

/// Bounding-box test against the curve's endpoints and control point.
pub(super) fn curve_visible(rect: Rect, curve: &EdgeCurve, padding: f32) -> bool {
    let bounds = Rect::from_points(&[curve.start, curve.control, curve.end]).expand(padding);
    bounds.intersects(rect)
}

pub(super) fn draw_curve(painter: &Painter, curve: &EdgeCurve, stroke: Stroke, style: EdgeStyle) {
    let points = curve.polyline(CURVE_SEGMENTS);
    if points.len() < 2 {
        return;
    }

    match style {
        EdgeStyle::Solid => {
            painter.add(Shape::line(points, stroke));
        }
        EdgeStyle::Dashed => {
            painter.extend(Shape::dashed_line(&points, stroke, 5.0, 5.0));
        }
        EdgeStyle::Dotted => {
            painter.extend(Shape::dotted_line(
                &points,
                stroke.color,
                4.0,
                (stroke.width * 0.6).max(0.8),
            ));
        }
    }
}

/// Arrow head at the curve's end, pulled back by the target radius.
pub(super) fn draw_arrow_head(painter: &Painter, curve: &EdgeCurve, inset: f32, color: Color32) {
    let Some(length) = curve.length() else {
        return;
    };
    if length <= inset * 2.0 {
        return;
    }

    let Some(tip) = curve.point_at_length_fraction(1.0 - inset / length) else {
        return;
    };
    let Some(back) = curve.point_at_length_fraction(1.0 - (inset + 8.0) / length) else {
        return;
    };

    let direction = (tip - back).normalized();
    if !direction.is_finite() {
        return;
    }
    let normal = vec2(-direction.y, direction.x) * 3.5;
    painter.add(Shape::convex_polygon(
        vec![tip, back + normal, back - normal],
        color,
        Stroke::NONE,
    ));
}

pub(super) fn hexagon(center: Pos2, radius: f32) -> Vec<Pos2> {
    (0..6)
        .map(|corner| {
            let angle = TAU * (corner as f32) / 6.0 + TAU / 12.0;
            center + vec2(angle.cos(), angle.sin()) * radius
        })
        .collect()
}

/// Tag outline: a box with a pointed right edge.
pub(super) fn tag(center: Pos2, radius: f32) -> Vec<Pos2> {
    let half_w = radius * 1.15;
    let half_h = radius * 0.6;
    vec![
        center + vec2(-half_w, -half_h),
        center + vec2(half_w - half_h, -half_h),
        center + vec2(half_w, 0.0),
        center + vec2(half_w - half_h, half_h),
        center + vec2(-half_w, half_h),
    ]
}

pub(super) fn draw_tooltip(painter: &Painter, rect: Rect, tooltip: &Tooltip, palette: &Palette) {
    let galley = painter.layout_no_wrap(
        tooltip.text.clone(),
        FontId::proportional(12.0),
        palette.text,
    );

    let padding = vec2(8.0, 6.0);
    let size = galley.size() + padding * 2.0;
    let mut min = tooltip.anchor;
    min.x = min.x.min(rect.right() - size.x).max(rect.left());
    min.y = min.y.min(rect.bottom() - size.y).max(rect.top());
    let frame = Rect::from_min_size(min, size);

    painter.rect_filled(frame, 4.0, fade_color(Color32::WHITE, 0.96));
    painter.rect_stroke(
        frame,
        4.0,
        Stroke::new(1.0, palette.tertiary),
        StrokeKind::Inside,
    );
    painter.galley(frame.min + padding, galley, palette.text);
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::pos2;

    #[test]
    fn blend_halfway_averages_channels() {
        let mixed = blend_color(Color32::from_rgb(0, 0, 0), Color32::from_rgb(200, 100, 50), 0.5);
        assert_eq!(mixed, Color32::from_rgb(100, 50, 25));
    }

    #[test]
    fn hexagon_corners_sit_on_radius() {
        let center = pos2(10.0, 10.0);
        for corner in hexagon(center, 12.0) {
            assert!((corner.distance(center) - 12.0).abs() < 1e-3);
        }
    }

    #[test]
    fn offscreen_circles_are_culled() {
        let rect = Rect::from_min_size(Pos2::ZERO, vec2(100.0, 100.0));
        assert!(circle_visible(rect, pos2(105.0, 50.0), 10.0));
        assert!(!circle_visible(rect, pos2(130.0, 50.0), 10.0));
    }
}
