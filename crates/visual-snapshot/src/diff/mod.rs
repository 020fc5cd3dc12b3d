//! Difference engine: turns two equal-sized grids into a verdict.
//!
//! Two policies are available behind [`ComparisonPolicy`]:
//!
//! - [`ThresholdCountPolicy`]: absolute per-channel difference, counted
//!   against a pixel budget and a ratio budget. Advisory unless escalated.
//! - [`PerceptualPolicy`]: YIQ perceptual matching with anti-aliasing
//!   detection. Any mismatch is a hard failure.

mod perceptual;
mod threshold_count;

pub use perceptual::{PerceptualPolicy, DEFAULT_PERCEPTUAL_THRESHOLD};
pub use threshold_count::{
    ThresholdCountPolicy, DEFAULT_INTENSITY_THRESHOLD, DEFAULT_PIXEL_THRESHOLD,
    DEFAULT_RATIO_THRESHOLD,
};

use crate::normalize::PixelGrid;
use crate::result::{SnapshotError, SnapshotResult};
use serde::{Deserialize, Serialize};

/// Outcome of one session comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Candidate matches the baseline within tolerance
    Match,
    /// Candidate differs from the baseline
    Mismatch,
    /// No baseline existed; the candidate became the baseline
    BaselineCreated,
    /// Update mode; the candidate replaced the baseline
    BaselineUpdated,
}

impl Verdict {
    /// Whether this verdict counts as passing
    #[must_use]
    pub const fn is_pass(self) -> bool {
        !matches!(self, Self::Mismatch)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Match => "match",
            Self::Mismatch => "mismatch",
            Self::BaselineCreated => "baseline created",
            Self::BaselineUpdated => "baseline updated",
        };
        f.write_str(label)
    }
}

/// How a mismatch is surfaced to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Logged and reported, the test continues
    Advisory,
    /// Returned as an error
    Hard,
}

/// Per-pixel difference data kept for rendering the diff image
#[derive(Debug, Clone)]
pub enum DifferenceSignal {
    /// Absolute per-channel difference of every pixel
    ChannelDelta(PixelGrid),
    /// Mask that is transparent where pixels match and colored where they don't
    MismatchMask(PixelGrid),
}

impl DifferenceSignal {
    /// Underlying grid
    #[must_use]
    pub const fn grid(&self) -> &PixelGrid {
        match self {
            Self::ChannelDelta(grid) | Self::MismatchMask(grid) => grid,
        }
    }
}

/// Result of running a policy over two grids
#[derive(Debug, Clone)]
pub struct DiffOutcome {
    /// Match or mismatch
    pub verdict: Verdict,
    /// Pixels counted as different
    pub diff_pixels: usize,
    /// Pixels compared
    pub total_pixels: usize,
    /// `diff_pixels / total_pixels`
    pub diff_ratio: f64,
    /// Largest single-channel difference seen (threshold-count only)
    pub max_channel_diff: u8,
    /// Whether the count stopped at the first mismatch
    pub truncated: bool,
    /// How a mismatch should surface
    pub severity: Severity,
    /// Data for the diff image
    pub signal: DifferenceSignal,
}

impl DiffOutcome {
    /// Whether the grids matched
    #[must_use]
    pub fn is_match(&self) -> bool {
        self.verdict == Verdict::Match
    }
}

/// Configuration-selected comparison strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ComparisonPolicy {
    /// Count pixels over an intensity threshold
    ThresholdCount(ThresholdCountPolicy),
    /// Perceptual YIQ pixel matching
    Perceptual(PerceptualPolicy),
}

impl Default for ComparisonPolicy {
    fn default() -> Self {
        Self::Perceptual(PerceptualPolicy::default())
    }
}

impl ComparisonPolicy {
    /// Compare a (reconciled) reference against the candidate
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::DimensionMismatch`] on unequal sizes and
    /// [`SnapshotError::InvalidConfig`] on out-of-range settings.
    pub fn compare(
        &self,
        reference: &PixelGrid,
        candidate: &PixelGrid,
    ) -> SnapshotResult<DiffOutcome> {
        ensure_same_size(reference, candidate)?;
        match self {
            Self::ThresholdCount(policy) => policy.compare(reference, candidate),
            Self::Perceptual(policy) => policy.compare(reference, candidate),
        }
    }

    /// Check settings without comparing anything
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::InvalidConfig`] on out-of-range settings.
    pub fn validate(&self) -> SnapshotResult<()> {
        match self {
            Self::ThresholdCount(policy) => policy.validate(),
            Self::Perceptual(policy) => policy.validate(),
        }
    }

    /// Apply per-call perceptual overrides; `None` keeps the configured
    /// value. Threshold-count ignores them.
    #[must_use]
    pub fn with_overrides(&self, threshold: Option<f64>, fail_fast: Option<bool>) -> Self {
        match self {
            Self::Perceptual(policy) => {
                let mut policy = policy.clone();
                if let Some(threshold) = threshold {
                    policy.threshold = threshold;
                }
                if let Some(fail_fast) = fail_fast {
                    policy.fail_fast = fail_fast;
                }
                Self::Perceptual(policy)
            }
            Self::ThresholdCount(_) => self.clone(),
        }
    }

    /// Short policy name for logs and reports
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ThresholdCount(_) => "threshold-count",
            Self::Perceptual(_) => "perceptual",
        }
    }
}

fn ensure_same_size(reference: &PixelGrid, candidate: &PixelGrid) -> SnapshotResult<()> {
    if reference.dimensions() != candidate.dimensions() {
        return Err(SnapshotError::DimensionMismatch {
            reference: reference.dimensions(),
            candidate: candidate.dimensions(),
        });
    }
    Ok(())
}

pub(crate) fn ratio(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::test_support::solid;

    fn policies() -> Vec<ComparisonPolicy> {
        vec![
            ComparisonPolicy::ThresholdCount(ThresholdCountPolicy::default()),
            ComparisonPolicy::Perceptual(PerceptualPolicy::default()),
            ComparisonPolicy::Perceptual(PerceptualPolicy::default().with_fail_fast(true)),
        ]
    }

    #[test]
    fn test_identical_grids_match_under_every_policy() {
        let grid = solid(40, 30, [12, 200, 99, 255]);
        for policy in policies() {
            let outcome = policy.compare(&grid, &grid.clone()).unwrap();
            assert!(outcome.is_match(), "{} should match", policy.name());
            assert_eq!(outcome.diff_pixels, 0);
            assert_eq!(outcome.total_pixels, 1200);
        }
    }

    #[test]
    fn test_black_vs_white_scenario() {
        let black = solid(200, 100, [0, 0, 0, 255]);
        let white = solid(200, 100, [255, 255, 255, 255]);

        let threshold = ComparisonPolicy::ThresholdCount(ThresholdCountPolicy::default())
            .compare(&black, &white)
            .unwrap();
        assert_eq!(threshold.verdict, Verdict::Mismatch);
        assert_eq!(threshold.diff_pixels, 20_000);
        assert!((threshold.diff_ratio - 1.0).abs() < f64::EPSILON);
        assert_eq!(threshold.severity, Severity::Advisory);

        let perceptual =
            ComparisonPolicy::Perceptual(PerceptualPolicy::default().with_threshold(0.1))
                .compare(&black, &white)
                .unwrap();
        assert_eq!(perceptual.verdict, Verdict::Mismatch);
        assert_eq!(perceptual.diff_pixels, 20_000);
        assert_eq!(perceptual.severity, Severity::Hard);
        assert!(!perceptual.truncated);
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let a = solid(2, 2, [0, 0, 0, 255]);
        let b = solid(3, 3, [0, 0, 0, 255]);
        for policy in policies() {
            let result = policy.compare(&a, &b);
            assert!(matches!(
                result,
                Err(SnapshotError::DimensionMismatch { .. })
            ));
        }
    }

    #[test]
    fn test_overrides_only_touch_perceptual() {
        let perceptual = ComparisonPolicy::Perceptual(PerceptualPolicy::default());
        match perceptual.with_overrides(Some(0.4), Some(true)) {
            ComparisonPolicy::Perceptual(p) => {
                assert!((p.threshold - 0.4).abs() < f64::EPSILON);
                assert!(p.fail_fast);
            }
            ComparisonPolicy::ThresholdCount(_) => panic!("variant changed"),
        }

        let count = ComparisonPolicy::ThresholdCount(ThresholdCountPolicy::default());
        assert_eq!(count.with_overrides(Some(0.4), Some(true)), count);
    }

    #[test]
    fn test_overrides_can_turn_fail_fast_off() {
        let configured =
            ComparisonPolicy::Perceptual(PerceptualPolicy::default().with_fail_fast(true));
        assert_eq!(configured.with_overrides(None, None), configured);
        assert_eq!(
            configured.with_overrides(None, Some(false)),
            ComparisonPolicy::Perceptual(PerceptualPolicy::default())
        );
    }

    #[test]
    fn test_policy_deserialize_fills_defaults() {
        let policy: ComparisonPolicy = serde_json::from_str(
            r#"{"kind":"threshold-count","pixel_threshold":5,"escalate":true}"#,
        )
        .unwrap();
        match policy {
            ComparisonPolicy::ThresholdCount(p) => {
                assert_eq!(p.pixel_threshold, 5);
                assert!(p.escalate);
                assert_eq!(p.intensity_threshold, DEFAULT_INTENSITY_THRESHOLD);
            }
            ComparisonPolicy::Perceptual(_) => panic!("wrong variant"),
        }
    }

    #[test]
    fn test_verdict_is_pass() {
        assert!(Verdict::Match.is_pass());
        assert!(Verdict::BaselineCreated.is_pass());
        assert!(Verdict::BaselineUpdated.is_pass());
        assert!(!Verdict::Mismatch.is_pass());
        assert_eq!(Verdict::BaselineCreated.to_string(), "baseline created");
    }
}
