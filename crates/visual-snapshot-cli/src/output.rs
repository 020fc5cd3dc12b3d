//! Terminal output

use crate::error::CliResult;
use console::{style, Term};
use serde::Serialize;
use visual_snapshot::{ComparisonReport, DiffOutcome, Verdict};

/// Status line writer for stderr
#[derive(Debug)]
pub struct Reporter {
    term: Term,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl Reporter {
    /// Create a new reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            use_color,
            quiet,
        }
    }

    fn line(&self, symbol: console::StyledObject<&str>, plain: &str, message: &str) {
        let prefix = if self.use_color {
            symbol.bold().to_string()
        } else {
            plain.to_string()
        };
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if !self.quiet {
            self.line(style("✓").green(), "PASS", message);
        }
    }

    /// Print a failure message; shown even in quiet mode
    pub fn failure(&self, message: &str) {
        self.line(style("✗").red(), "FAIL", message);
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if !self.quiet {
            self.line(style("⚠").yellow(), "WARN", message);
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if !self.quiet {
            self.line(style("ℹ").blue(), "INFO", message);
        }
    }

    /// Print the status line for a session comparison
    pub fn comparison(&self, report: &ComparisonReport) {
        let message = describe(report);
        match report.verdict {
            Verdict::Match => self.success(&message),
            Verdict::Mismatch => self.warning(&message),
            Verdict::BaselineCreated | Verdict::BaselineUpdated => self.info(&message),
        }
    }

    /// Print the status line for a direct diff
    pub fn outcome(&self, outcome: &DiffOutcome) {
        let message = format!(
            "{} ({} of {} pixels differ, ratio {:.4})",
            outcome.verdict, outcome.diff_pixels, outcome.total_pixels, outcome.diff_ratio
        );
        if outcome.is_match() {
            self.success(&message);
        } else {
            self.failure(&message);
        }
    }
}

/// One-line summary of a comparison report
#[must_use]
pub fn describe(report: &ComparisonReport) -> String {
    let baseline = report.baseline.display();
    match (&report.verdict, &report.diff, &report.artifacts) {
        (Verdict::BaselineCreated, ..) => {
            format!("New snapshot created at {baseline}. Please review images")
        }
        (Verdict::BaselineUpdated, ..) => {
            format!("Snapshot updated at {baseline}. Please review images")
        }
        (Verdict::Mismatch, diff, artifacts) => {
            let mut message = format!("Snapshot differs from {baseline}");
            if let Some(diff) = diff {
                message.push_str(&format!(
                    " ({} pixels, ratio {:.4})",
                    diff.diff_pixels, diff.diff_ratio
                ));
            }
            if let Some(artifacts) = artifacts {
                message.push_str(&format!("; see {}", artifacts.dir.display()));
            }
            message
        }
        (Verdict::Match, Some(diff), _) => format!(
            "Snapshot matches {baseline} (diff pixels {}, ratio {:.4})",
            diff.diff_pixels, diff.diff_ratio
        ),
        (Verdict::Match, None, _) => format!("Snapshot matches {baseline}"),
    }
}

/// Print a value as pretty JSON on stdout
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
pub fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use visual_snapshot::{ArtifactSet, DiffSummary, Severity};

    fn report(verdict: Verdict) -> ComparisonReport {
        ComparisonReport {
            verdict,
            baseline: PathBuf::from("snapshots/login.png"),
            diff: None,
            artifacts: None,
        }
    }

    fn summary() -> DiffSummary {
        DiffSummary {
            policy: "threshold-count".to_string(),
            diff_pixels: 1200,
            total_pixels: 10_000,
            diff_ratio: 0.12,
            truncated: false,
            resized: false,
            severity: Severity::Advisory,
        }
    }

    mod describe_tests {
        use super::*;

        #[test]
        fn test_created() {
            let text = describe(&report(Verdict::BaselineCreated));
            assert!(text.starts_with("New snapshot created"));
            assert!(text.contains("login.png"));
        }

        #[test]
        fn test_updated() {
            assert!(describe(&report(Verdict::BaselineUpdated)).contains("updated"));
        }

        #[test]
        fn test_match_with_numbers() {
            let mut matched = report(Verdict::Match);
            matched.diff = Some(DiffSummary {
                diff_pixels: 0,
                diff_ratio: 0.0,
                ..summary()
            });
            assert!(describe(&matched).contains("diff pixels 0"));
        }

        #[test]
        fn test_mismatch_names_artifacts() {
            let mut mismatch = report(Verdict::Mismatch);
            mismatch.diff = Some(summary());
            mismatch.artifacts = Some(ArtifactSet {
                dir: PathBuf::from("failures/login"),
                actual: PathBuf::from("failures/login/Actual_a.png"),
                expected: PathBuf::from("failures/login/Expected_a.png"),
                diff: PathBuf::from("failures/login/Diff_a.png"),
                rotated_to: None,
            });
            let text = describe(&mismatch);
            assert!(text.contains("1200 pixels"));
            assert!(text.contains("ratio 0.1200"));
            assert!(text.contains("failures/login"));
        }
    }

    mod reporter_tests {
        use super::*;

        #[test]
        fn test_new_reporter() {
            let reporter = Reporter::new(false, true);
            assert!(!reporter.use_color);
            assert!(reporter.quiet);
        }

        #[test]
        fn test_default_reporter() {
            let reporter = Reporter::default();
            assert!(reporter.use_color);
            assert!(!reporter.quiet);
        }

        #[test]
        fn test_messages_do_not_panic() {
            let reporter = Reporter::new(false, false);
            reporter.success("ok");
            reporter.failure("bad");
            reporter.warning("hmm");
            reporter.info("fyi");
            reporter.comparison(&report(Verdict::BaselineCreated));
        }

        #[test]
        fn test_print_json() {
            print_json(&report(Verdict::Match)).unwrap();
        }
    }
}
