//! Decoding and size reconciliation of screenshot pixel grids.

use crate::result::{SnapshotError, SnapshotResult};
use image::imageops::{self, FilterType};
use image::{ImageEncoder, RgbaImage};
use std::borrow::Cow;

/// Pixel grid every comparison works on
pub type PixelGrid = RgbaImage;

/// Decode PNG (or any enabled format) bytes into an RGBA grid.
///
/// RGB inputs gain an opaque alpha channel so they compare cleanly against
/// RGBA ones.
///
/// # Errors
///
/// Returns [`SnapshotError::Decode`] on malformed data or a zero-sized image.
pub fn decode(bytes: &[u8], what: &str) -> SnapshotResult<PixelGrid> {
    let image =
        image::load_from_memory(bytes).map_err(|e| SnapshotError::decode(what, e.to_string()))?;
    let grid = image.to_rgba8();
    if grid.width() == 0 || grid.height() == 0 {
        return Err(SnapshotError::decode(what, "image has zero size"));
    }
    Ok(grid)
}

/// Bring the reference to the candidate's size.
///
/// The candidate is authoritative. When sizes differ the reference is
/// resampled with Lanczos3; the resampled copy is for comparison only.
#[must_use]
pub fn reconcile<'a>(
    reference: &'a PixelGrid,
    candidate: &'a PixelGrid,
) -> (Cow<'a, PixelGrid>, &'a PixelGrid) {
    if reference.dimensions() == candidate.dimensions() {
        return (Cow::Borrowed(reference), candidate);
    }

    let (width, height) = candidate.dimensions();
    tracing::debug!(
        from = ?reference.dimensions(),
        to = ?(width, height),
        "resampling reference to candidate size"
    );
    let resized = imageops::resize(reference, width, height, FilterType::Lanczos3);
    (Cow::Owned(resized), candidate)
}

/// Encode a grid as PNG
///
/// # Errors
///
/// Returns [`SnapshotError::ImageEncode`] if encoding fails.
pub fn encode_png(grid: &PixelGrid) -> SnapshotResult<Vec<u8>> {
    let mut buffer = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buffer)
        .write_image(
            grid.as_raw(),
            grid.width(),
            grid.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| SnapshotError::ImageEncode {
            message: e.to_string(),
        })?;
    Ok(buffer)
}
