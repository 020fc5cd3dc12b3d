//! Absolute-difference policy with pixel and ratio budgets.

use super::{ratio, DiffOutcome, DifferenceSignal, Severity, Verdict};
use crate::normalize::PixelGrid;
use crate::result::{SnapshotError, SnapshotResult};
use image::Rgba;
use serde::{Deserialize, Serialize};

/// Channel difference above which a pixel counts as changed
pub const DEFAULT_INTENSITY_THRESHOLD: u8 = 30;
/// Changed pixels tolerated before a mismatch
pub const DEFAULT_PIXEL_THRESHOLD: usize = 1000;
/// Changed-pixel ratio tolerated before a mismatch
pub const DEFAULT_RATIO_THRESHOLD: f64 = 0.1;

/// Counts pixels whose largest channel difference exceeds
/// `intensity_threshold`. The comparison fails when the count exceeds
/// `pixel_threshold` or the ratio exceeds `ratio_threshold`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdCountPolicy {
    /// Per-channel difference (0-255) a pixel must exceed to count
    pub intensity_threshold: u8,
    /// Maximum number of changed pixels
    pub pixel_threshold: usize,
    /// Maximum ratio of changed pixels (0.0-1.0)
    pub ratio_threshold: f64,
    /// Turn mismatches into hard failures
    pub escalate: bool,
}

impl Default for ThresholdCountPolicy {
    fn default() -> Self {
        Self {
            intensity_threshold: DEFAULT_INTENSITY_THRESHOLD,
            pixel_threshold: DEFAULT_PIXEL_THRESHOLD,
            ratio_threshold: DEFAULT_RATIO_THRESHOLD,
            escalate: false,
        }
    }
}

impl ThresholdCountPolicy {
    /// Set the per-channel intensity threshold
    #[must_use]
    pub const fn with_intensity_threshold(mut self, threshold: u8) -> Self {
        self.intensity_threshold = threshold;
        self
    }

    /// Set the changed-pixel budget
    #[must_use]
    pub const fn with_pixel_threshold(mut self, pixels: usize) -> Self {
        self.pixel_threshold = pixels;
        self
    }

    /// Set the changed-ratio budget
    #[must_use]
    pub const fn with_ratio_threshold(mut self, ratio: f64) -> Self {
        self.ratio_threshold = ratio;
        self
    }

    /// Make mismatches fail hard
    #[must_use]
    pub const fn with_escalate(mut self, escalate: bool) -> Self {
        self.escalate = escalate;
        self
    }

    pub(crate) fn validate(&self) -> SnapshotResult<()> {
        if !(0.0..=1.0).contains(&self.ratio_threshold) {
            return Err(SnapshotError::invalid_config(format!(
                "ratio_threshold must be within [0, 1], got {}",
                self.ratio_threshold
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
        let mut delta = PixelGrid::new(width, height);
        let mut diff_pixels = 0usize;
        let mut max_channel_diff = 0u8;

        for ((out, expected), actual) in delta
            .pixels_mut()
            .zip(reference.pixels())
            .zip(candidate.pixels())
        {
            let Rgba(e) = *expected;
            let Rgba(a) = *actual;
            let d = [
                e[0].abs_diff(a[0]),
                e[1].abs_diff(a[1]),
                e[2].abs_diff(a[2]),
                e[3].abs_diff(a[3]),
            ];
            let largest = d.iter().copied().max().unwrap_or(0);
            if largest > self.intensity_threshold {
                diff_pixels += 1;
            }
            max_channel_diff = max_channel_diff.max(largest);
            *out = Rgba(d);
        }

        let total_pixels = (width as usize) * (height as usize);
        let diff_ratio = ratio(diff_pixels, total_pixels);
        let verdict = if diff_pixels > self.pixel_threshold || diff_ratio > self.ratio_threshold {
            Verdict::Mismatch
        } else {
            Verdict::Match
        };

        Ok(DiffOutcome {
            verdict,
            diff_pixels,
            total_pixels,
            diff_ratio,
            max_channel_diff,
            truncated: false,
            severity: if self.escalate {
                Severity::Hard
            } else {
                Severity::Advisory
            },
            signal: DifferenceSignal::ChannelDelta(delta),
        })
    }
}
