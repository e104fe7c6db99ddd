use super::*;

const SURFACE: SurfaceSize = SurfaceSize::new(600.0, 300.0);

fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-3,
        "expected {expected}, got {actual}"
    );
}

fn angle(value: f64) -> ServoAngle {
    ServoAngle::new(value).expect("finite angle")
}

#[test]
fn fill_arc_covers_proportional_share_of_half_circle() {
    for value in [0.0, 1.0, 45.0, 90.0, 133.5, 180.0] {
        let scene = gauge_scene(value, SURFACE);
        assert_close(scene.fill_fraction(), (value / 180.0) as f32);
        assert_close(scene.fill.start, PI);
        assert_close(scene.track.start, PI);
        assert_close(scene.track.end, 2.0 * PI);
    }
}

#[test]
fn label_shows_rounded_angle_with_degree_suffix() {
    assert_eq!(gauge_scene(0.0, SURFACE).label.text, "0°");
    assert_eq!(gauge_scene(44.6, SURFACE).label.text, "45°");
    assert_eq!(gauge_scene(90.0, SURFACE).label.text, "90°");
    assert_eq!(gauge_scene(179.4, SURFACE).label.text, "179°");
}

#[test]
fn out_of_range_angles_render_like_the_nearest_bound() {
    assert_eq!(gauge_scene(200.0, SURFACE), gauge_scene(180.0, SURFACE));
    assert_eq!(gauge_scene(-5.0, SURFACE), gauge_scene(0.0, SURFACE));
    assert_eq!(gauge_scene(f64::NAN, SURFACE), gauge_scene(0.0, SURFACE));
}

#[test]
fn rendering_is_idempotent() {
    assert_eq!(gauge_scene(73.0, SURFACE), gauge_scene(73.0, SURFACE));
}

#[test]
fn geometry_follows_surface_dimensions() {
    let scene = gauge_scene(0.0, SURFACE);
    let center_y = 300.0 / 1.05;
    assert_close(scene.track.center.x, 300.0);
    assert_close(scene.track.center.y, center_y);
    assert_close(scene.track.radius, center_y - EDGE_MARGIN);
    assert_eq!(scene.pivot.center, scene.track.center);
    assert_close(scene.label.anchor.y, center_y + LABEL_OFFSET);

    let narrow = gauge_scene(0.0, SurfaceSize::new(200.0, 300.0));
    assert_close(narrow.track.radius, 100.0 - EDGE_MARGIN);
}

#[test]
fn needle_points_at_the_midpoint_for_ninety_degrees() {
    let scene = gauge_scene(90.0, SURFACE);
    let center = scene.needle.from;
    let reach = scene.track.radius - NEEDLE_INSET;
    assert_close(scene.needle.to.x, center.x);
    assert_close(scene.needle.to.y, center.y - reach);
}

#[test]
fn needle_lies_on_the_horizontal_at_the_extremes() {
    let left = gauge_scene(0.0, SURFACE);
    let reach = left.track.radius - NEEDLE_INSET;
    assert_close(left.needle.to.x, left.needle.from.x - reach);
    assert_close(left.needle.to.y, left.needle.from.y);

    let right = gauge_scene(180.0, SURFACE);
    assert_close(right.needle.to.x, right.needle.from.x + reach);
    assert_close(right.needle.to.y, right.needle.from.y);
}

#[test]
fn tiny_surfaces_collapse_instead_of_going_negative() {
    let scene = gauge_scene(90.0, SurfaceSize::new(10.0, 5.0));
    assert_eq!(scene.track.radius, 0.0);
    assert_eq!(scene.needle.to, scene.needle.from);
}

#[test]
fn arc_points_span_the_stroke() {
    let scene = gauge_scene(180.0, SURFACE);
    let points = scene.fill.points(32);
    assert_eq!(points.len(), 33);
    let first = points[0];
    let last = points[32];
    assert_close(first.x, scene.fill.center.x - scene.fill.radius);
    assert_close(last.x, scene.fill.center.x + scene.fill.radius);
}

#[test]
fn renderer_redraws_on_resize_with_last_angle() {
    let mut renderer = GaugeRenderer::new(SURFACE);
    renderer.render(angle(120.0));
    let frames = renderer.frames();

    let resized = renderer.resize(SurfaceSize::for_width(400.0)).clone();
    assert_eq!(resized, gauge_scene(120.0, SurfaceSize::new(400.0, 200.0)));
    assert_eq!(renderer.frames(), frames + 1);

    renderer.resize(SurfaceSize::new(400.0, 200.0));
    assert_eq!(renderer.frames(), frames + 1);
}
