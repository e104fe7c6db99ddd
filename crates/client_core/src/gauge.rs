//! Semicircular servo gauge.
//!
//! [`gauge_scene`] turns an angle and a surface size into drawing primitives
//! in surface coordinates (origin top-left, y down). The arc runs from the
//! left horizontal (`PI`) over the top to the right horizontal (`2 * PI`).
//! Painting the primitives is left to the UI toolkit.

use std::f32::consts::PI;

use shared::domain::ServoAngle;

pub const TRACK_WIDTH: f32 = 14.0;
pub const NEEDLE_WIDTH: f32 = 4.0;
pub const NEEDLE_INSET: f32 = 18.0;
pub const PIVOT_RADIUS: f32 = 6.0;
pub const EDGE_MARGIN: f32 = 20.0;
pub const LABEL_OFFSET: f32 = 30.0;
pub const LABEL_FONT_SIZE: f32 = 18.0;
/// Pivot sits slightly above the bottom edge.
const CENTER_Y_DIVISOR: f32 = 1.05;
const SWEEP_START: f32 = PI;
const SWEEP: f32 = PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

pub const TRACK_COLOR: Rgb = Rgb(0xe6, 0xf3, 0xe8);
pub const FILL_COLOR: Rgb = Rgb(0x2e, 0x7a, 0x2e);
pub const NEEDLE_COLOR: Rgb = Rgb(0x2e, 0x2e, 0x2e);
pub const PIVOT_COLOR: Rgb = FILL_COLOR;
pub const LABEL_COLOR: Rgb = Rgb(0x18, 0x4d, 0x1a);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn polar(center: Point, radius: f32, theta: f32) -> Self {
        Self::new(
            center.x + theta.cos() * radius,
            center.y + theta.sin() * radius,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSize {
    pub width: f32,
    pub height: f32,
}

impl SurfaceSize {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// 2:1 surface for the given width.
    pub fn for_width(width: f32) -> Self {
        Self::new(width, width / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcStroke {
    pub center: Point,
    pub radius: f32,
    /// Radians, screen frame.
    pub start: f32,
    pub end: f32,
    pub width: f32,
    pub color: Rgb,
}

impl ArcStroke {
    pub fn sweep(&self) -> f32 {
        self.end - self.start
    }

    /// Polyline approximation with `segments + 1` points.
    pub fn points(&self, segments: usize) -> Vec<Point> {
        let segments = segments.max(1);
        (0..=segments)
            .map(|i| {
                let t = i as f32 / segments as f32;
                Point::polar(self.center, self.radius, self.start + self.sweep() * t)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStroke {
    pub from: Point,
    pub to: Point,
    pub width: f32,
    pub color: Rgb,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Disc {
    pub center: Point,
    pub radius: f32,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLabel {
    pub text: String,
    /// Horizontal centre and vertical centre of the text.
    pub anchor: Point,
    pub font_size: f32,
    pub color: Rgb,
}

/// Everything needed to draw one gauge frame, back to front.
#[derive(Debug, Clone, PartialEq)]
pub struct GaugeScene {
    pub angle: ServoAngle,
    pub track: ArcStroke,
    pub fill: ArcStroke,
    pub needle: LineStroke,
    pub pivot: Disc,
    pub label: TextLabel,
}

impl GaugeScene {
    /// Share of the half-circle covered by the fill arc, `0.0..=1.0`.
    pub fn fill_fraction(&self) -> f32 {
        self.fill.sweep() / self.track.sweep()
    }
}

pub fn gauge_center(surface: SurfaceSize) -> Point {
    Point::new(surface.width / 2.0, surface.height / CENTER_Y_DIVISOR)
}

pub fn gauge_radius(surface: SurfaceSize) -> f32 {
    let center = gauge_center(surface);
    (center.x - EDGE_MARGIN).min(center.y - EDGE_MARGIN).max(0.0)
}

/// Pure: identical inputs always produce identical scenes. Out-of-range or
/// non-finite angles are clamped first.
pub fn gauge_scene(angle: f64, surface: SurfaceSize) -> GaugeScene {
    let angle = ServoAngle::new(angle).unwrap_or_default();
    let center = gauge_center(surface);
    let radius = gauge_radius(surface);
    let fraction = (angle.value() / ServoAngle::BOUNDS.max) as f32;
    let theta = SWEEP_START + fraction * SWEEP;

    let track = ArcStroke {
        center,
        radius,
        start: SWEEP_START,
        end: SWEEP_START + SWEEP,
        width: TRACK_WIDTH,
        color: TRACK_COLOR,
    };
    let fill = ArcStroke {
        end: theta,
        color: FILL_COLOR,
        ..track
    };
    let needle = LineStroke {
        from: center,
        to: Point::polar(center, (radius - NEEDLE_INSET).max(0.0), theta),
        width: NEEDLE_WIDTH,
        color: NEEDLE_COLOR,
    };

    GaugeScene {
        angle,
        track,
        fill,
        needle,
        pivot: Disc {
            center,
            radius: PIVOT_RADIUS,
            color: PIVOT_COLOR,
        },
        label: TextLabel {
            text: format!("{}°", angle.rounded()),
            anchor: Point::new(center.x, center.y + LABEL_OFFSET),
            font_size: LABEL_FONT_SIZE,
            color: LABEL_COLOR,
        },
    }
}

/// Holds the last drawn angle and surface so the gauge can be redrawn on
/// resize without the caller tracking either.
#[derive(Debug, Clone)]
pub struct GaugeRenderer {
    surface: SurfaceSize,
    scene: GaugeScene,
    frames: u64,
}

impl GaugeRenderer {
    pub fn new(surface: SurfaceSize) -> Self {
        Self {
            surface,
            scene: gauge_scene(ServoAngle::default().value(), surface),
            frames: 1,
        }
    }

    pub fn render(&mut self, angle: ServoAngle) -> &GaugeScene {
        self.scene = gauge_scene(angle.value(), self.surface);
        self.frames += 1;
        &self.scene
    }

    /// Recomputes centre and radius for a new surface; no-op when unchanged.
    pub fn resize(&mut self, surface: SurfaceSize) -> &GaugeScene {
        if surface != self.surface {
            self.surface = surface;
            let angle = self.scene.angle;
            self.render(angle);
        }
        &self.scene
    }

    pub fn scene(&self) -> &GaugeScene {
        &self.scene
    }

    pub fn surface(&self) -> SurfaceSize {
        self.surface
    }

    pub fn angle(&self) -> ServoAngle {
        self.scene.angle
    }

    /// Number of frames computed so far, including the initial one.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
#[path = "tests/gauge_tests.rs"]
mod tests;
