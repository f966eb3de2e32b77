//! Rasterization of 2D primitives

use glam::Vec2;

use super::{Rgb, Surface};
use crate::sim::collision::raster_line;

/// Fill every pixel whose center lies within `radius` of `center`
pub fn fill_circle(surface: &mut Surface, center: Vec2, radius: i32, color: Rgb) {
    if radius < 0 {
        return;
    }
    let c = center.round().as_ivec2();
    let r2 = radius * radius;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= r2 {
                surface.put(c.x + dx, c.y + dy, color);
            }
        }
    }
}

/// Draw a line `width` pixels thick between two points
pub fn thick_line(surface: &mut Surface, from: Vec2, to: Vec2, width: i32, color: Rgb) {
    let half = width.max(1) / 2;
    for p in raster_line(from.as_ivec2(), to.as_ivec2()) {
        for dy in -half..=half {
            for dx in -half..=half {
                surface.put(p.x + dx, p.y + dy, color);
            }
        }
    }
}
