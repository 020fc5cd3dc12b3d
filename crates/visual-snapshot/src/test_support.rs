//! Fixtures shared by unit tests.

use crate::normalize::{encode_png, PixelGrid};
use image::Rgba;

/// Solid-color RGBA grid
pub(crate) fn solid(width: u32, height: u32, color: [u8; 4]) -> PixelGrid {
    PixelGrid::from_pixel(width, height, Rgba(color))
}

/// PNG bytes of a grid
pub(crate) fn png(grid: &PixelGrid) -> Vec<u8> {
    encode_png(grid).expect("encoding an in-memory grid succeeds")
}
