//! Visual Snapshot: screenshot regression checks for browser end-to-end tests
//!
//! Compares a freshly captured screenshot with a stored baseline and decides
//! whether they match within tolerance. Mismatches leave Actual, Expected and
//! Diff images behind for review.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌────────────┐   ┌────────────┐   ┌────────────┐
//! │ TestIdentity │──►│ Baseline   │──►│ Normalizer │──►│ Difference │
//! │              │   │ Store      │   │ (decode,   │   │ Engine     │
//! └──────────────┘   └────────────┘   │  resample) │   └─────┬──────┘
//!                                     └────────────┘         │
//!                         ┌──────────────┐   ┌───────────────▼──┐
//!                         │ ReportSink   │◄──│ ArtifactWriter   │
//!                         └──────────────┘   └──────────────────┘
//! ```
//!
//! [`SnapshotSession::compare`] drives the whole flow for one screenshot.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use visual_snapshot::{CompareOptions, SessionConfig, SnapshotSession, TestIdentity};
//!
//! # fn main() -> visual_snapshot::SnapshotResult<()> {
//! let session = SnapshotSession::new(SessionConfig::new());
//! let identity =
//!     TestIdentity::from_runner_name(Path::new("tests/login.rs"), "test_login[chromium]", "main")?;
//! let screenshot = std::fs::read("target/login.png")?;
//! let report = session.compare(&identity, &screenshot, &CompareOptions::new())?;
//! println!("{}", report.verdict);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod artifacts;
/// Difference engine and comparison policies
pub mod diff;
mod identity;
mod normalize;
mod result;
mod session;
mod sink;
mod store;

#[cfg(test)]
mod test_support;

pub use artifacts::{jet, render_diff, rotate, ArtifactSet, ArtifactWriter};
pub use diff::{
    ComparisonPolicy, DiffOutcome, DifferenceSignal, PerceptualPolicy, Severity,
    ThresholdCountPolicy, Verdict,
};
pub use identity::{host_platform, TestIdentity};
pub use normalize::{decode, encode_png, reconcile, PixelGrid};
pub use result::{SnapshotError, SnapshotResult};
pub use session::{
    CompareOptions, ComparisonReport, DiffSummary, SessionConfig, SnapshotSession,
};
pub use sink::{Attachment, CollectingSink, ManifestSink, NullSink, ReportSink, PNG_CONTENT_TYPE};
pub use store::{BaselineStore, FAILURES_DIR, SNAPSHOTS_DIR};
