//! Closed-form geometry for the circular face overlay: cover-fit scaling,
//! bounds clamping and hit-testing. Everything here is pure.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset_from(self, origin: Point) -> Vector {
        Vector {
            dx: self.x - origin.x,
            dy: self.y - origin.y,
        }
    }

    pub fn minus(self, offset: Vector) -> Point {
        Point::new(self.x - offset.dx, self.y - offset.dy)
    }

    pub fn distance_to(self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector {
    pub dx: f32,
    pub dy: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Position (top-left of the bounding square) and diameter of the overlay,
/// in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayState {
    pub position: Point,
    pub diameter: f32,
}

impl OverlayState {
    pub fn radius(&self) -> f32 {
        self.diameter / 2.0
    }

    pub fn center(&self) -> Point {
        let r = self.radius();
        Point::new(self.position.x + r, self.position.y + r)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayLimits {
    pub min_diameter: f32,
    pub max_diameter: f32,
    pub default_diameter: f32,
    pub default_position: Point,
}

impl Default for OverlayLimits {
    fn default() -> Self {
        Self {
            min_diameter: 80.0,
            max_diameter: 280.0,
            default_diameter: 160.0,
            default_position: Point::new(100.0, 40.0),
        }
    }
}

impl OverlayLimits {
    pub fn default_state(&self) -> OverlayState {
        OverlayState {
            position: self.default_position,
            diameter: self.default_diameter,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitTransform {
    pub scale: f32,
    pub draw_width: f32,
    pub draw_height: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

/// Cover-fit of a `bitmap_width` x `bitmap_height` image into a square of
/// side `diameter`. The shorter side lands exactly on `diameter`, overflow on
/// the longer side is centred.
///
/// Both bitmap dimensions must be non-zero.
pub fn fit_transform(diameter: f32, bitmap_width: u32, bitmap_height: u32) -> FitTransform {
    debug_assert!(bitmap_width > 0 && bitmap_height > 0);
    let width = bitmap_width as f32;
    let height = bitmap_height as f32;
    let scale = (diameter / width).max(diameter / height);
    let draw_width = width * scale;
    let draw_height = height * scale;
    FitTransform {
        scale,
        draw_width,
        draw_height,
        offset_x: (diameter - draw_width) / 2.0,
        offset_y: (diameter - draw_height) / 2.0,
    }
}

fn clamp_axis(value: f32, diameter: f32, extent: u32) -> f32 {
    let upper = (extent as f32 - diameter).max(0.0);
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, upper)
}

/// Keeps the overlay's bounding square inside the surface on both axes.
/// If the surface is smaller than the overlay on an axis, that axis pins to 0.
pub fn clamp_position(position: Point, diameter: f32, surface: SurfaceSize) -> Point {
    Point::new(
        clamp_axis(position.x, diameter, surface.width),
        clamp_axis(position.y, diameter, surface.height),
    )
}

pub fn clamp_diameter(diameter: f32, limits: &OverlayLimits) -> f32 {
    if !diameter.is_finite() {
        return limits.default_diameter;
    }
    diameter.clamp(limits.min_diameter, limits.max_diameter)
}

/// Inclusive on the boundary: `distance == radius` counts as inside.
pub fn hit_test(point: Point, state: &OverlayState) -> bool {
    point.distance_to(state.center()) <= state.radius()
}
