//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// vsnap: screenshot regression checks against stored baselines
#[derive(Parser, Debug)]
#[command(name = "vsnap")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Emit library logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// YAML config file
    #[arg(long, global = true, env = "VSNAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compare a screenshot against its baseline, creating it on first run
    Compare(CompareArgs),

    /// Compare two image files directly, without any baseline handling
    Diff(DiffArgs),
}

/// Arguments for the compare command
#[derive(Parser, Debug)]
pub struct CompareArgs {
    /// Freshly captured screenshot (PNG)
    #[arg(short, long)]
    pub screenshot: PathBuf,

    /// Test source file the screenshot belongs to
    #[arg(long)]
    pub test_file: PathBuf,

    /// Test name as reported by the runner; `-<digits>` runs are stripped
    #[arg(long)]
    pub test_name: String,

    /// Tab or view label
    #[arg(long)]
    pub tab: String,

    /// Sequence index for several screenshots of one tab
    #[arg(long)]
    pub index: Option<u32>,

    /// Overwrite the baseline with the screenshot
    #[arg(long, env = "VSNAP_UPDATE_SNAPSHOTS")]
    pub update_snapshots: bool,

    /// Comparison policy
    #[arg(long)]
    pub policy: Option<PolicyArg>,

    /// Perceptual matching threshold (0.0-1.0)
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Stop at the first perceptual mismatch
    #[arg(long)]
    pub fail_fast: bool,

    /// Store snapshots under this directory instead of next to the test file
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Append artifact attachments to this JSON-lines manifest
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Platform tag (defaults to the host OS)
    #[arg(long)]
    pub platform: Option<String>,

    /// Print the comparison report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the diff command
#[derive(Parser, Debug)]
pub struct DiffArgs {
    /// Reference image; resampled to the candidate's size if needed
    pub reference: PathBuf,

    /// Candidate image
    pub candidate: PathBuf,

    /// Write the rendered diff image here
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Comparison policy
    #[arg(long)]
    pub policy: Option<PolicyArg>,

    /// Perceptual matching threshold (0.0-1.0)
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Stop at the first perceptual mismatch
    #[arg(long)]
    pub fail_fast: bool,
}

/// Comparison policy choice
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolicyArg {
    /// Count pixels whose channels differ by more than 30 (advisory)
    ThresholdCount,
    /// Perceptual YIQ matching (hard failure)
    Perceptual,
}

/// Color output argument
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
