//! Per-comparison entry point: update mode, first run and compare.

use crate::artifacts::{ArtifactSet, ArtifactWriter};
use crate::diff::{ComparisonPolicy, Severity, Verdict};
use crate::identity::TestIdentity;
use crate::normalize::{decode, reconcile};
use crate::result::{SnapshotError, SnapshotResult};
use crate::sink::{NullSink, ReportSink};
use crate::store::BaselineStore;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Session-wide configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Overwrite baselines instead of comparing
    pub update_snapshots: bool,
    /// Comparison strategy
    pub policy: ComparisonPolicy,
}

impl SessionConfig {
    /// Create a default configuration (perceptual policy, no updates)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set update mode
    #[must_use]
    pub const fn with_update_snapshots(mut self, update: bool) -> Self {
        self.update_snapshots = update;
        self
    }

    /// Set the comparison policy
    #[must_use]
    pub fn with_policy(mut self, policy: ComparisonPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Per-call overrides
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CompareOptions {
    /// Perceptual threshold for this call
    pub threshold: Option<f64>,
    /// Fail-fast perceptual scanning for this call
    pub fail_fast: Option<bool>,
}

impl CompareOptions {
    /// No overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the perceptual threshold
    #[must_use]
    pub const fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Override fail-fast scanning, either way
    #[must_use]
    pub const fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = Some(fail_fast);
        self
    }
}

/// Difference numbers of a comparison that ran the diff engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffSummary {
    /// Policy that produced the numbers
    pub policy: String,
    /// Pixels counted as different
    pub diff_pixels: usize,
    /// Pixels compared
    pub total_pixels: usize,
    /// `diff_pixels / total_pixels`
    pub diff_ratio: f64,
    /// Count stopped at the first mismatch
    pub truncated: bool,
    /// The reference was resampled to the candidate's size
    pub resized: bool,
    /// How a mismatch surfaces
    pub severity: Severity,
}

/// What one call to [`SnapshotSession::compare`] did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// Outcome
    pub verdict: Verdict,
    /// Baseline file involved
    pub baseline: PathBuf,
    /// Present when the diff engine ran
    pub diff: Option<DiffSummary>,
    /// Present on mismatch
    pub artifacts: Option<ArtifactSet>,
}

/// Compares screenshots against stored baselines.
///
/// Holds no mutable state: calls for distinct identities may run in
/// parallel. Calls for the same identity must not overlap.
#[derive(Debug)]
pub struct SnapshotSession<S: ReportSink = NullSink> {
    config: SessionConfig,
    store: BaselineStore,
    sink: S,
}

impl SnapshotSession<NullSink> {
    /// Session storing baselines next to each test's source
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self::with_parts(config, BaselineStore::new(), NullSink)
    }
}

impl<S: ReportSink> SnapshotSession<S> {
    /// Session with an explicit store and report sink
    #[must_use]
    pub const fn with_parts(config: SessionConfig, store: BaselineStore, sink: S) -> Self {
        Self {
            config,
            store,
            sink,
        }
    }

    /// Report sink
    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Compare `screenshot` against the baseline for `identity`.
    ///
    /// In update mode, or when no baseline exists, the screenshot becomes
    /// the baseline (it must decode) and nothing is compared. Otherwise a
    /// mismatch writes failure artifacts; hard mismatches are returned as
    /// [`SnapshotError::SnapshotMismatch`], advisory ones as a report with
    /// [`Verdict::Mismatch`].
    ///
    /// # Errors
    ///
    /// Returns decode, I/O and configuration errors, and hard mismatches.
    pub fn compare(
        &self,
        identity: &TestIdentity,
        screenshot: &[u8],
        options: &CompareOptions,
    ) -> SnapshotResult<ComparisonReport> {
        let baseline = self.store.resolve(identity)?;

        if self.config.update_snapshots {
            self.adopt(&baseline, screenshot)?;
            tracing::info!(baseline = %baseline.display(), "Snapshots updated. Please review images");
            return Ok(Self::report(Verdict::BaselineUpdated, baseline));
        }

        if !self.store.exists(&baseline) {
            self.adopt(&baseline, screenshot)?;
            tracing::info!(baseline = %baseline.display(), "New snapshot(s) created. Please review images");
            return Ok(Self::report(Verdict::BaselineCreated, baseline));
        }

        let policy = self
            .config
            .policy
            .with_overrides(options.threshold, options.fail_fast);
        policy.validate()?;

        let candidate = decode(screenshot, "screenshot")?;
        let stored = decode(&self.store.read(&baseline)?, "baseline")?;
        let (reference, candidate) = reconcile(&stored, &candidate);
        let resized = reference.dimensions() != stored.dimensions();

        let outcome = policy.compare(&reference, candidate)?;
        let summary = DiffSummary {
            policy: policy.name().to_string(),
            diff_pixels: outcome.diff_pixels,
            total_pixels: outcome.total_pixels,
            diff_ratio: outcome.diff_ratio,
            truncated: outcome.truncated,
            resized,
            severity: outcome.severity,
        };

        if outcome.is_match() {
            tracing::info!(
                diff_pixels = outcome.diff_pixels,
                diff_ratio = outcome.diff_ratio,
                "Snapshots match! Diff pixels: {} Diff ratio: {}",
                outcome.diff_pixels,
                outcome.diff_ratio
            );
            return Ok(ComparisonReport {
                verdict: Verdict::Match,
                baseline,
                diff: Some(summary),
                artifacts: None,
            });
        }

        let name = identity.snapshot_name();
        let artifacts = ArtifactWriter::new(&self.sink).write(
            &self.store.failures_dir(identity),
            &name,
            candidate,
            &reference,
            &outcome.signal,
        )?;
        tracing::warn!(
            snapshot = %name,
            policy = policy.name(),
            diff_pixels = outcome.diff_pixels,
            diff_ratio = outcome.diff_ratio,
            artifacts = %artifacts.dir.display(),
            "Snapshots DO NOT match!"
        );

        match outcome.severity {
            Severity::Hard => Err(SnapshotError::SnapshotMismatch {
                name,
                mismatched_pixels: outcome.diff_pixels,
                artifacts_dir: artifacts.dir,
            }),
            Severity::Advisory => Ok(ComparisonReport {
                verdict: Verdict::Mismatch,
                baseline,
                diff: Some(summary),
                artifacts: Some(artifacts),
            }),
        }
    }

    /// Store the screenshot as the baseline once it is known to decode
    fn adopt(&self, baseline: &Path, screenshot: &[u8]) -> SnapshotResult<()> {
        decode(screenshot, "screenshot")?;
        self.store.write(baseline, screenshot)
    }

    const fn report(verdict: Verdict, baseline: PathBuf) -> ComparisonReport {
        ComparisonReport {
            verdict,
            baseline,
            diff: None,
            artifacts: None,
        }
    }
}
