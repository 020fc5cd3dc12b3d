//! Perceptual matching in YIQ space with anti-aliasing detection.
//!
//! Full scans go through the `pixelmatch` crate, which also renders the
//! diff mask. The fail-fast scan walks pixels with the same color-delta and
//! anti-aliasing rules and stops at the first real mismatch.

use super::{ratio, DiffOutcome, DifferenceSignal, Severity, Verdict};
use crate::normalize::{decode, encode_png, PixelGrid};
use crate::result::{SnapshotError, SnapshotResult};
use image::Rgba;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// Default matching threshold
pub const DEFAULT_PERCEPTUAL_THRESHOLD: f64 = 0.1;

/// Maximum possible YIQ delta between two colors
const MAX_YIQ_DELTA: f64 = 35215.0;

/// Color of mismatched pixels in the mask
const DIFF_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);

/// Perceptual pixel matching. Any mismatched pixel fails the comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptualPolicy {
    /// Matching threshold in [0, 1]; higher is more tolerant
    pub threshold: f64,
    /// Stop at the first mismatch instead of counting all of them
    pub fail_fast: bool,
}

impl Default for PerceptualPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_PERCEPTUAL_THRESHOLD,
            fail_fast: false,
        }
    }
}

impl PerceptualPolicy {
    /// Set the matching threshold
    #[must_use]
    pub const fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Enable or disable fail-fast scanning
    #[must_use]
    pub const fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub(crate) fn validate(&self) -> SnapshotResult<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(SnapshotError::invalid_config(format!(
                "perceptual threshold must be within [0, 1], got {}",
                self.threshold
            )));
        }
        Ok(())
    }

    pub(crate) fn compare(
        &self,
        reference: &PixelGrid,
        candidate: &PixelGrid,
    ) -> SnapshotResult<DiffOutcome> {
        self.validate()?;

        let (width, height) = candidate.dimensions();
        let total_pixels = (width as usize) * (height as usize);

        let (diff_pixels, mask, truncated) = if reference == candidate {
            (0, PixelGrid::new(width, height), false)
        } else if self.fail_fast {
            let mut mask = PixelGrid::new(width, height);
            match first_mismatch(reference, candidate, self.threshold) {
                Some((x, y)) => {
                    mask.put_pixel(x, y, DIFF_COLOR);
                    (1, mask, true)
                }
                None => (0, mask, false),
            }
        } else {
            let (count, mask) = self.full_scan(reference, candidate)?;
            (count, mask, false)
        };

        Ok(DiffOutcome {
            verdict: if diff_pixels > 0 {
                Verdict::Mismatch
            } else {
                Verdict::Match
            },
            diff_pixels,
            total_pixels,
            diff_ratio: ratio(diff_pixels, total_pixels),
            max_channel_diff: 0,
            truncated,
            severity: Severity::Hard,
            signal: DifferenceSignal::MismatchMask(mask),
        })
    }

    fn full_scan(
        &self,
        reference: &PixelGrid,
        candidate: &PixelGrid,
    ) -> SnapshotResult<(usize, PixelGrid)> {
        let actual_png = encode_png(candidate)?;
        let expected_png = encode_png(reference)?;
        let mut diff_png = Vec::new();

        let count = pixelmatch::pixelmatch(
            Cursor::new(&actual_png[..]),
            Cursor::new(&expected_png[..]),
            Some(&mut diff_png),
            Some(candidate.width()),
            Some(candidate.height()),
            Some(pixelmatch::Options {
                threshold: self.threshold,
                diff_mask: true,
                ..Default::default()
            }),
        )
        .map_err(|e| SnapshotError::Comparison {
            message: format!("pixelmatch failed: {e}"),
        })?;

        let mask = decode(&diff_png, "diff mask")?;
        Ok((count, mask))
    }
}

/// Position of the first pixel that differs beyond `threshold` and is not
/// explained by anti-aliasing, scanning row by row.
fn first_mismatch(
    reference: &PixelGrid,
    candidate: &PixelGrid,
    threshold: f64,
) -> Option<(u32, u32)> {
    let max_delta = MAX_YIQ_DELTA * threshold * threshold;
    candidate
        .enumerate_pixels()
        .find(|&(x, y, actual)| {
            let delta = color_delta(*actual, *reference.get_pixel(x, y), false);
            delta.abs() > max_delta
                && !antialiased(candidate, x, y, reference)
                && !antialiased(reference, x, y, candidate)
        })
        .map(|(x, y, _)| (x, y))
}

fn blend(channel: u8, alpha: f64) -> f64 {
    255.0 + (f64::from(channel) - 255.0) * alpha
}

/// Channels blended over white
fn opaque(pixel: Rgba<u8>) -> [f64; 3] {
    let Rgba([r, g, b, a]) = pixel;
    if a < 255 {
        let alpha = f64::from(a) / 255.0;
        [blend(r, alpha), blend(g, alpha), blend(b, alpha)]
    } else {
        [f64::from(r), f64::from(g), f64::from(b)]
    }
}

fn rgb2y([r, g, b]: [f64; 3]) -> f64 {
    r * 0.298_895_31 + g * 0.586_622_47 + b * 0.114_482_23
}

fn rgb2i([r, g, b]: [f64; 3]) -> f64 {
    r * 0.595_977_99 - g * 0.274_176_10 - b * 0.321_801_89
}

fn rgb2q([r, g, b]: [f64; 3]) -> f64 {
    r * 0.211_470_17 - g * 0.522_617_11 + b * 0.311_146_94
}

/// Signed squared YIQ distance; with `y_only` the plain brightness delta.
/// Negative when the first pixel is brighter.
fn color_delta(first: Rgba<u8>, second: Rgba<u8>, y_only: bool) -> f64 {
    if first == second {
        return 0.0;
    }
    let c1 = opaque(first);
    let c2 = opaque(second);
    let y1 = rgb2y(c1);
    let y2 = rgb2y(c2);
    let y = y1 - y2;
    if y_only {
        return y;
    }
    let i = rgb2i(c1) - rgb2i(c2);
    let q = rgb2q(c1) - rgb2q(c2);
    let delta = 0.5053 * y * y + 0.299 * i * i + 0.1957 * q * q;
    if y1 > y2 {
        -delta
    } else {
        delta
    }
}

/// Clamped 3x3 neighborhood bounds and whether the pixel sits on an edge
fn neighborhood(grid: &PixelGrid, x: u32, y: u32) -> (u32, u32, u32, u32, bool) {
    let x0 = x.saturating_sub(1);
    let y0 = y.saturating_sub(1);
    let x2 = (x + 1).min(grid.width() - 1);
    let y2 = (y + 1).min(grid.height() - 1);
    let on_edge = x == x0 || x == x2 || y == y0 || y == y2;
    (x0, y0, x2, y2, on_edge)
}

/// Whether the pixel at (x, y) looks like an anti-aliased edge in `grid`
fn antialiased(grid: &PixelGrid, x: u32, y: u32, other: &PixelGrid) -> bool {
    let (x0, y0, x2, y2, on_edge) = neighborhood(grid, x, y);
    let center = *grid.get_pixel(x, y);
    let mut zeroes = usize::from(on_edge);
    let mut min = 0.0;
    let mut max = 0.0;
    let mut min_at = None;
    let mut max_at = None;

    for nx in x0..=x2 {
        for ny in y0..=y2 {
            if nx == x && ny == y {
                continue;
            }
            let delta = color_delta(center, *grid.get_pixel(nx, ny), true);
            if delta == 0.0 {
                zeroes += 1;
                if zeroes > 2 {
                    return false;
                }
            } else if delta < min {
                min = delta;
                min_at = Some((nx, ny));
            } else if delta > max {
                max = delta;
                max_at = Some((nx, ny));
            }
        }
    }

    let (Some((min_x, min_y)), Some((max_x, max_y))) = (min_at, max_at) else {
        return false;
    };
    (has_many_siblings(grid, min_x, min_y) && has_many_siblings(other, min_x, min_y))
        || (has_many_siblings(grid, max_x, max_y) && has_many_siblings(other, max_x, max_y))
}

/// Whether at least three neighbors share the pixel's exact color
fn has_many_siblings(grid: &PixelGrid, x: u32, y: u32) -> bool {
    let (x0, y0, x2, y2, on_edge) = neighborhood(grid, x, y);
    let center = *grid.get_pixel(x, y);
    let mut zeroes = usize::from(on_edge);

    for nx in x0..=x2 {
        for ny in y0..=y2 {
            if nx == x && ny == y {
                continue;
            }
            if *grid.get_pixel(nx, ny) == center {
                zeroes += 1;
            }
            if zeroes > 2 {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::test_support::solid;

    #[test]
    fn test_defaults() {
        let policy = PerceptualPolicy::default();
        assert!((policy.threshold - 0.1).abs() < f64::EPSILON);
        assert!(!policy.fail_fast);
    }

    #[test]
    fn test_color_delta_basics() {
        let white = Rgba([255, 255, 255, 255]);
        let black = Rgba([0, 0, 0, 255]);
        assert_eq!(color_delta(white, white, false), 0.0);
        // White is brighter, so the sign is negative
        assert!(color_delta(white, black, false) < 0.0);
        assert!(color_delta(black, white, false) > 0.0);
        assert!(color_delta(black, white, false) <= MAX_YIQ_DELTA);
    }

    #[test]
    fn test_transparent_blends_over_white() {
        let clear = Rgba([0, 0, 0, 0]);
        let white = Rgba([255, 255, 255, 255]);
        assert!(color_delta(clear, white, false).abs() < 1e-9);
    }

    #[test]
    fn test_subtle_change_within_threshold() {
        let a = solid(8, 8, [100, 100, 100, 255]);
        let b = solid(8, 8, [102, 101, 100, 255]);
        let outcome = PerceptualPolicy::default().compare(&a, &b).unwrap();
        assert!(outcome.is_match());

        let strict = PerceptualPolicy::default().with_threshold(0.0);
        assert!(!strict.compare(&a, &b).unwrap().is_match());
    }

    #[test]
    fn test_fail_fast_stops_at_first_mismatch() {
        let a = solid(50, 50, [255, 255, 255, 255]);
        let mut b = a.clone();
        for x in 10..40 {
            for y in 20..30 {
                b.put_pixel(x, y, Rgba([0, 0, 0, 255]));
            }
        }

        let outcome = PerceptualPolicy::default()
            .with_fail_fast(true)
            .compare(&a, &b)
            .unwrap();

        assert_eq!(outcome.verdict, Verdict::Mismatch);
        assert_eq!(outcome.diff_pixels, 1);
        assert!(outcome.truncated);
        let mask = outcome.signal.grid();
        assert_eq!(*mask.get_pixel(10, 20), DIFF_COLOR);
        assert_eq!(mask.pixels().filter(|p| p.0[3] != 0).count(), 1);
    }

    #[test]
    fn test_full_scan_counts_block() {
        let a = solid(50, 50, [255, 255, 255, 255]);
        let mut b = a.clone();
        for x in 10..40 {
            for y in 20..30 {
                b.put_pixel(x, y, Rgba([0, 0, 0, 255]));
            }
        }
        let outcome = PerceptualPolicy::default().compare(&a, &b).unwrap();
        assert_eq!(outcome.diff_pixels, 300);
        assert_eq!(outcome.signal.grid().dimensions(), (50, 50));
    }

    #[test]
    fn test_antialiased_single_pixel_is_forgiven() {
        // A lone gray pixel between black and white halves reads as an
        // anti-aliased edge
        let mut a = PixelGrid::from_pixel(9, 9, Rgba([255, 255, 255, 255]));
        for x in 0..9 {
            for y in 0..4 {
                a.put_pixel(x, y, Rgba([0, 0, 0, 255]));
            }
        }
        let mut b = a.clone();
        b.put_pixel(4, 4, Rgba([128, 128, 128, 255]));

        assert!(antialiased(&b, 4, 4, &a));
        assert_eq!(first_mismatch(&a, &b, 0.1), None);
    }

    #[test]
    fn test_threshold_out_of_range() {
        let a = solid(1, 1, [0, 0, 0, 255]);
        for threshold in [-0.1, 1.1, f64::NAN] {
            let policy = PerceptualPolicy::default().with_threshold(threshold);
            assert!(policy.compare(&a, &a.clone()).is_err());
        }
    }
}
