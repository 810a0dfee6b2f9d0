//! CPU raster compositor: base image stretched to the surface, face drawn
//! through a circular clip with cover-fit, then a translucent ring.
//!
//! Rendering is a pure function of its inputs. Every call redraws the whole
//! surface, there is no dirty-region tracking.

use image::{imageops, Rgba, RgbaImage};

use super::bitmap::Bitmap;
use super::geometry::{fit_transform, OverlayState, SurfaceSize};

pub const DEFAULT_SURFACE_SIZE: u32 = 1024;

const RING_WIDTH: f32 = 2.0;
const RING_COLOR: [f32; 4] = [255.0, 255.0, 255.0, 0.8];

#[derive(Debug, Clone)]
pub struct Surface {
    pixels: RgbaImage,
}

impl Default for Surface {
    fn default() -> Self {
        Self::new(DEFAULT_SURFACE_SIZE, DEFAULT_SURFACE_SIZE)
    }
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width.max(1), height.max(1)),
        }
    }

    pub fn size(&self) -> SurfaceSize {
        SurfaceSize::new(self.pixels.width(), self.pixels.height())
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    fn resize_and_clear(&mut self, width: u32, height: u32) {
        if self.pixels.width() == width && self.pixels.height() == height {
            for pixel in self.pixels.pixels_mut() {
                *pixel = Rgba([0, 0, 0, 0]);
            }
        } else {
            self.pixels = RgbaImage::new(width, height);
        }
    }
}

/// Draws `base` (stretched to the surface), then `overlay` clipped to the
/// circle described by `state`. With no base the surface is left untouched.
pub fn render(
    surface: &mut Surface,
    base: Option<&Bitmap>,
    overlay: Option<&Bitmap>,
    state: &OverlayState,
) {
    let Some(base) = base else {
        return;
    };

    surface.resize_and_clear(base.width(), base.height());
    draw_stretched(surface, base);

    if let Some(overlay) = overlay {
        draw_clipped_overlay(surface, overlay, state);
        stroke_ring(surface, state);
    }
}

fn draw_stretched(surface: &mut Surface, base: &Bitmap) {
    let size = surface.size();
    if size.width == base.width() && size.height == base.height() {
        surface.pixels.copy_from_slice(base.pixels().as_raw());
        return;
    }
    surface.pixels = imageops::resize(
        base.pixels(),
        size.width,
        size.height,
        imageops::FilterType::Triangle,
    );
}

/// Circle coverage of a pixel centre at distance `distance` from the circle
/// centre, with a one pixel anti-aliased edge.
fn edge_coverage(distance: f32, radius: f32) -> f32 {
    (radius - distance + 0.5).clamp(0.0, 1.0)
}

fn circle_bounds(state: &OverlayState, pad: f32, size: SurfaceSize) -> (u32, u32, u32, u32) {
    let x0 = (state.position.x - pad).floor().max(0.0) as u32;
    let y0 = (state.position.y - pad).floor().max(0.0) as u32;
    let x1 = ((state.position.x + state.diameter + pad).ceil().max(0.0) as u32).min(size.width);
    let y1 = ((state.position.y + state.diameter + pad).ceil().max(0.0) as u32).min(size.height);
    (x0, y0, x1, y1)
}

fn draw_clipped_overlay(surface: &mut Surface, overlay: &Bitmap, state: &OverlayState) {
    let fit = fit_transform(state.diameter, overlay.width(), overlay.height());
    let center = state.center();
    let radius = state.radius();
    let origin_x = state.position.x + fit.offset_x;
    let origin_y = state.position.y + fit.offset_y;
    let (x0, y0, x1, y1) = circle_bounds(state, 1.0, surface.size());

    for py in y0..y1 {
        for px in x0..x1 {
            let cx = px as f32 + 0.5;
            let cy = py as f32 + 0.5;
            let coverage = edge_coverage((cx - center.x).hypot(cy - center.y), radius);
            if coverage <= 0.0 {
                continue;
            }

            let u = (cx - origin_x) / fit.scale;
            let v = (cy - origin_y) / fit.scale;
            let sample = sample_bilinear(overlay, u, v);
            let dst = surface.pixels.get_pixel_mut(px, py);
            blend_over(dst, sample, coverage);
        }
    }
}

fn stroke_ring(surface: &mut Surface, state: &OverlayState) {
    let center = state.center();
    let radius = state.radius();
    let half_width = RING_WIDTH / 2.0;
    let (x0, y0, x1, y1) = circle_bounds(state, half_width + 1.0, surface.size());

    for py in y0..y1 {
        for px in x0..x1 {
            let cx = px as f32 + 0.5;
            let cy = py as f32 + 0.5;
            let distance = (cx - center.x).hypot(cy - center.y);
            let coverage = (half_width + 0.5 - (distance - radius).abs()).clamp(0.0, 1.0);
            if coverage <= 0.0 {
                continue;
            }
            let dst = surface.pixels.get_pixel_mut(px, py);
            blend_over(dst, RING_COLOR, coverage);
        }
    }
}

/// Samples `bitmap` at continuous coordinates `(u, v)` measured in source
/// pixels, edges clamped. Returns straight-alpha RGBA with alpha in `0..=1`.
fn sample_bilinear(bitmap: &Bitmap, u: f32, v: f32) -> [f32; 4] {
    let max_x = (bitmap.width() - 1) as f32;
    let max_y = (bitmap.height() - 1) as f32;
    let sx = (u - 0.5).clamp(0.0, max_x);
    let sy = (v - 0.5).clamp(0.0, max_y);
    let x0 = sx.floor() as u32;
    let y0 = sy.floor() as u32;
    let x1 = (x0 + 1).min(bitmap.width() - 1);
    let y1 = (y0 + 1).min(bitmap.height() - 1);
    let tx = sx - x0 as f32;
    let ty = sy - y0 as f32;

    let p00 = bitmap.pixel(x0, y0);
    let p10 = bitmap.pixel(x1, y0);
    let p01 = bitmap.pixel(x0, y1);
    let p11 = bitmap.pixel(x1, y1);

    let mut out = [0.0_f32; 4];
    for (channel, slot) in out.iter_mut().enumerate() {
        let top = p00[channel] as f32 * (1.0 - tx) + p10[channel] as f32 * tx;
        let bottom = p01[channel] as f32 * (1.0 - tx) + p11[channel] as f32 * tx;
        *slot = top * (1.0 - ty) + bottom * ty;
    }
    out[3] /= 255.0;
    out
}

/// Source-over blend of straight-alpha `src` scaled by `coverage`.
fn blend_over(dst: &mut Rgba<u8>, src: [f32; 4], coverage: f32) {
    let sa = src[3] * coverage;
    if sa <= 0.0 {
        return;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        *dst = Rgba([0, 0, 0, 0]);
        return;
    }
    for channel in 0..3 {
        let value = (src[channel] * sa + dst[channel] as f32 * da * (1.0 - sa)) / out_a;
        dst[channel] = value.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}
