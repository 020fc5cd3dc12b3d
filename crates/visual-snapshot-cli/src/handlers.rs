//! Subcommand handlers

use crate::commands::{CompareArgs, DiffArgs};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::{print_json, Reporter};
use std::path::Path;
use visual_snapshot::{
    decode, encode_png, reconcile, render_diff, BaselineStore, CompareOptions, ComparisonPolicy,
    ComparisonReport, ManifestSink, NullSink, ReportSink, SnapshotSession, TestIdentity,
};

fn read_image(path: &Path, what: &str) -> CliResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        CliError::invalid_argument(format!("cannot read {what} {}: {e}", path.display()))
    })
}

/// Build the test identity from compare arguments
///
/// # Errors
///
/// Returns an error if a derived component is unusable.
pub fn identity_for(args: &CompareArgs) -> CliResult<TestIdentity> {
    let mut identity = TestIdentity::from_runner_name(&args.test_file, &args.test_name, &args.tab)?;
    if let Some(index) = args.index {
        identity = identity.with_index(index);
    }
    if let Some(platform) = &args.platform {
        identity = identity.with_platform(platform)?;
    }
    Ok(identity)
}

/// Refuse perceptual-only flags under a threshold-count policy
fn check_overrides(
    policy: &ComparisonPolicy,
    threshold: Option<f64>,
    fail_fast: bool,
) -> CliResult<()> {
    if matches!(policy, ComparisonPolicy::ThresholdCount(_)) && (threshold.is_some() || fail_fast) {
        return Err(CliError::invalid_argument(
            "--threshold and --fail-fast only apply to the perceptual policy",
        ));
    }
    Ok(())
}

fn compare_in<S: ReportSink>(
    session: &SnapshotSession<S>,
    identity: &TestIdentity,
    screenshot: &[u8],
    options: &CompareOptions,
) -> CliResult<ComparisonReport> {
    Ok(session.compare(identity, screenshot, options)?)
}

/// Run the compare command
///
/// # Errors
///
/// Returns an error on unreadable input, bad configuration, or a hard
/// mismatch.
pub fn run_compare(config: &CliConfig, args: &CompareArgs, reporter: &Reporter) -> CliResult<()> {
    let screenshot = read_image(&args.screenshot, "screenshot")?;
    let identity = identity_for(args)?;

    let session_config = config.session(args.policy, args.update_snapshots);
    check_overrides(&session_config.policy, args.threshold, args.fail_fast)?;
    let store = args
        .root
        .as_ref()
        .or(config.file.root.as_ref())
        .map_or_else(BaselineStore::new, BaselineStore::with_root);
    let mut options = CompareOptions::new();
    if args.fail_fast {
        options = options.with_fail_fast(true);
    }
    if let Some(threshold) = args.threshold {
        options = options.with_threshold(threshold);
    }

    tracing::debug!(
        snapshot = %identity.snapshot_name(),
        policy = session_config.policy.name(),
        update = session_config.update_snapshots,
        "comparing screenshot"
    );

    let report = match args.manifest.as_ref().or(config.file.manifest.as_ref()) {
        Some(manifest) => {
            let session =
                SnapshotSession::with_parts(session_config, store, ManifestSink::new(manifest));
            compare_in(&session, &identity, &screenshot, &options)?
        }
        None => {
            let session = SnapshotSession::with_parts(session_config, store, NullSink);
            compare_in(&session, &identity, &screenshot, &options)?
        }
    };

    reporter.comparison(&report);
    if args.json {
        print_json(&report)?;
    }
    Ok(())
}

/// Run the diff command
///
/// # Errors
///
/// Returns an error on unreadable input, bad configuration, or when the
/// images do not match under the chosen policy.
pub fn run_diff(config: &CliConfig, args: &DiffArgs, reporter: &Reporter) -> CliResult<()> {
    let stored = decode(&read_image(&args.reference, "reference")?, "reference")?;
    let candidate = decode(&read_image(&args.candidate, "candidate")?, "candidate")?;
    let (reference, candidate) = reconcile(&stored, &candidate);

    let policy = config.policy(args.policy);
    check_overrides(&policy, args.threshold, args.fail_fast)?;
    let policy = policy.with_overrides(args.threshold, args.fail_fast.then_some(true));
    policy.validate()?;
    let outcome = policy.compare(&reference, candidate)?;

    if let Some(out) = &args.out {
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(out, encode_png(&render_diff(&outcome.signal))?)?;
        reporter.info(&format!("Diff image written to {}", out.display()));
    }

    reporter.outcome(&outcome);
    if outcome.is_match() {
        Ok(())
    } else {
        Err(CliError::mismatch(format!(
            "Images differ under {}: {} of {} pixels",
            policy.name(),
            outcome.diff_pixels,
            outcome.total_pixels
        )))
    }
}
