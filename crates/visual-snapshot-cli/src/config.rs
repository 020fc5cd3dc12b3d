//! CLI configuration

use crate::commands::PolicyArg;
use crate::error::{CliError, CliResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use visual_snapshot::{ComparisonPolicy, PerceptualPolicy, SessionConfig, ThresholdCountPolicy};

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - errors only
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - library info logs
    Verbose,
    /// Debug - maximum output
    Debug,
}

impl Verbosity {
    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Default tracing filter for this level
    #[must_use]
    pub const fn log_filter(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "info",
            Self::Debug => "debug",
        }
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorChoice {
    /// Always use colors
    Always,
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Should use colors based on output detection
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => std::io::IsTerminal::is_terminal(&std::io::stderr()),
        }
    }
}

/// Settings read from a YAML config file
///
/// ```yaml
/// update_snapshots: false
/// root: target/snapshots
/// policy:
///   kind: threshold-count
///   pixel_threshold: 500
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Overwrite baselines instead of comparing
    pub update_snapshots: bool,
    /// Comparison policy
    pub policy: ComparisonPolicy,
    /// Snapshot root override
    pub root: Option<PathBuf>,
    /// Attachment manifest
    pub manifest: Option<PathBuf>,
}

impl FileConfig {
    /// Load from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or holds
    /// out-of-range policy values.
    pub fn load(path: &Path) -> CliResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            CliError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml(&text)
    }

    /// Parse YAML text
    ///
    /// # Errors
    ///
    /// Returns an error on malformed YAML or out-of-range policy values.
    pub fn from_yaml(text: &str) -> CliResult<Self> {
        let config: Self = serde_yaml_ng::from_str(text)?;
        config.policy.validate()?;
        Ok(config)
    }
}

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Color output choice
    pub color: ColorChoice,
    /// Emit logs as JSON lines
    pub log_json: bool,
    /// Values from the config file, if any
    pub file: FileConfig,
}

impl CliConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set color choice
    #[must_use]
    pub const fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }

    /// Set JSON log output
    #[must_use]
    pub const fn with_log_json(mut self, log_json: bool) -> Self {
        self.log_json = log_json;
        self
    }

    /// Set file-provided settings
    #[must_use]
    pub fn with_file(mut self, file: FileConfig) -> Self {
        self.file = file;
        self
    }

    /// Policy after applying a command-line choice. Picking the kind the
    /// file already configures keeps the file's settings.
    #[must_use]
    pub fn policy(&self, choice: Option<PolicyArg>) -> ComparisonPolicy {
        match (choice, &self.file.policy) {
            (None, policy)
            | (Some(PolicyArg::ThresholdCount), policy @ ComparisonPolicy::ThresholdCount(_))
            | (Some(PolicyArg::Perceptual), policy @ ComparisonPolicy::Perceptual(_)) => {
                policy.clone()
            }
            (Some(PolicyArg::ThresholdCount), ComparisonPolicy::Perceptual(_)) => {
                ComparisonPolicy::ThresholdCount(ThresholdCountPolicy::default())
            }
            (Some(PolicyArg::Perceptual), ComparisonPolicy::ThresholdCount(_)) => {
                ComparisonPolicy::Perceptual(PerceptualPolicy::default())
            }
        }
    }

    /// Session configuration; the update flag is on if either the command
    /// line or the file sets it
    #[must_use]
    pub fn session(&self, choice: Option<PolicyArg>, update_snapshots: bool) -> SessionConfig {
        SessionConfig::new()
            .with_update_snapshots(update_snapshots || self.file.update_snapshots)
            .with_policy(self.policy(choice))
    }
}
