//! Paints a [`GaugeScene`] with the egui painter.

use std::f32::consts::PI;

use client_core::gauge::{ArcStroke, GaugeScene, Point, Rgb, SurfaceSize};

pub const MIN_GAUGE_WIDTH: f32 = 240.0;
pub const MAX_GAUGE_WIDTH: f32 = 600.0;
/// Room under the surface for the angle label, which sits below the pivot.
pub const LABEL_SPACE: f32 = 44.0;
const SEGMENTS_PER_HALF_TURN: f32 = 64.0;

pub fn surface_for_width(available: f32) -> SurfaceSize {
    SurfaceSize::for_width(available.clamp(MIN_GAUGE_WIDTH, MAX_GAUGE_WIDTH))
}

pub fn color(rgb: Rgb) -> egui::Color32 {
    egui::Color32::from_rgb(rgb.0, rgb.1, rgb.2)
}

fn segments_for(arc: &ArcStroke) -> usize {
    ((arc.sweep().abs() / PI) * SEGMENTS_PER_HALF_TURN).ceil().max(1.0) as usize
}

/// Draws track, fill, needle, pivot and label relative to `origin`.
pub fn paint_gauge(painter: &egui::Painter, origin: egui::Pos2, scene: &GaugeScene) {
    let to_pos = |p: Point| origin + egui::vec2(p.x, p.y);

    for arc in [&scene.track, &scene.fill] {
        if arc.sweep() <= 0.0 || arc.radius <= 0.0 {
            continue;
        }
        let points = arc.points(segments_for(arc)).into_iter().map(to_pos).collect();
        painter.add(egui::Shape::line(
            points,
            egui::Stroke::new(arc.width, color(arc.color)),
        ));
    }

    painter.line_segment(
        [to_pos(scene.needle.from), to_pos(scene.needle.to)],
        egui::Stroke::new(scene.needle.width, color(scene.needle.color)),
    );
    painter.circle_filled(
        to_pos(scene.pivot.center),
        scene.pivot.radius,
        color(scene.pivot.color),
    );
    painter.text(
        to_pos(scene.label.anchor),
        egui::Align2::CENTER_CENTER,
        &scene.label.text,
        egui::FontId::proportional(scene.label.font_size),
        color(scene.label.color),
    );
}
