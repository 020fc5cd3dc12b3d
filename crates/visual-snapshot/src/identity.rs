//! Test identity: the key every baseline and failure directory hangs off.

use crate::result::{SnapshotError, SnapshotResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Numeric parameterization suffixes (`-1280`, `-3`) that change between runs
fn volatile_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-(\d+)").expect("static pattern is valid"))
}

/// Trailing `_<digits>`, which would read as a sequence index in file names
fn index_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"_\d+$").expect("static pattern is valid"))
}

/// Host platform tag appended to test names
#[must_use]
pub fn host_platform() -> &'static str {
    std::env::consts::OS
}

/// Identity of one screenshot comparison.
///
/// Two comparisons with equal identities share a baseline file. The path
/// components are validated on construction so that distinct identities
/// never collapse onto the same file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TestIdentity {
    /// Directory containing the test source file
    pub source_dir: PathBuf,
    /// Test file stem (`login` for `tests/login.rs`)
    pub test_file: String,
    /// Test group: the raw test name without parameters
    pub test_group: String,
    /// Logical test name with volatile suffixes stripped
    pub test_name: String,
    /// Platform tag (`linux`, `macos`, ...)
    pub platform: String,
    /// Tab or view label
    pub tab: String,
    /// Sequence index for several screenshots of the same tab
    pub index: Option<u32>,
}

impl TestIdentity {
    /// Create an identity from explicit parts, tagged with the host platform
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::InvalidIdentity`] if a component is empty or
    /// contains a path separator.
    pub fn new(
        source_dir: impl Into<PathBuf>,
        test_file: impl Into<String>,
        test_group: impl Into<String>,
        test_name: impl Into<String>,
        tab: impl Into<String>,
    ) -> SnapshotResult<Self> {
        let identity = Self {
            source_dir: source_dir.into(),
            test_file: test_file.into(),
            test_group: test_group.into(),
            test_name: test_name.into(),
            platform: host_platform().to_string(),
            tab: tab.into(),
            index: None,
        };
        identity.validate()?;
        Ok(identity)
    }

    /// Derive an identity from the test source path and the name the test
    /// runner reports, e.g. `test_login[chromium-1280]`.
    ///
    /// The group is the runner name up to its first `[`; the test name is
    /// the runner name with every `-<digits>` run removed.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::InvalidIdentity`] if the path has no file
    /// stem or a derived component is unusable.
    pub fn from_runner_name(
        test_path: &Path,
        runner_name: &str,
        tab: impl Into<String>,
    ) -> SnapshotResult<Self> {
        let test_file = test_path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                SnapshotError::invalid_identity(format!(
                    "test path has no file name: {}",
                    test_path.display()
                ))
            })?;
        let source_dir = test_path
            .parent()
            .map_or_else(PathBuf::new, Path::to_path_buf);

        let test_group = runner_name.split('[').next().unwrap_or(runner_name);
        let test_name = volatile_suffix().replace_all(runner_name, "");

        Self::new(source_dir, test_file, test_group, test_name, tab)
    }

    /// Attach a sequence index
    #[must_use]
    pub const fn with_index(mut self, index: u32) -> Self {
        self.index = Some(index);
        self
    }

    /// Override the platform tag
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::InvalidIdentity`] if the tag is unusable.
    pub fn with_platform(mut self, platform: impl Into<String>) -> SnapshotResult<Self> {
        self.platform = platform.into();
        self.validate()?;
        Ok(self)
    }

    /// Test name qualified with the platform: `test_login[chromium][linux]`
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}[{}]", self.test_name, self.platform)
    }

    /// Name used for artifact files: `<qualified name>_<tab>`
    #[must_use]
    pub fn snapshot_name(&self) -> String {
        format!("{}_{}", self.qualified_name(), self.tab)
    }

    /// Baseline file name: `<qualified name>_<tab>[_<index>].png`
    #[must_use]
    pub fn baseline_file_name(&self) -> String {
        match self.index {
            Some(index) => format!("{}_{index}.png", self.snapshot_name()),
            None => format!("{}.png", self.snapshot_name()),
        }
    }

    fn validate(&self) -> SnapshotResult<()> {
        let parts = [
            ("test file", &self.test_file),
            ("test group", &self.test_group),
            ("test name", &self.test_name),
            ("platform", &self.platform),
            ("tab", &self.tab),
        ];
        for (label, value) in parts {
            if value.is_empty() || value == "." || value == ".." {
                return Err(SnapshotError::invalid_identity(format!(
                    "{label} must be a non-empty name, got {value:?}"
                )));
            }
            if value.contains(['/', '\\']) {
                return Err(SnapshotError::invalid_identity(format!(
                    "{label} must not contain a path separator: {value:?}"
                )));
            }
        }
        if index_suffix().is_match(&self.tab) {
            return Err(SnapshotError::invalid_identity(format!(
                "tab must not end in _<digits>, use an index instead: {:?}",
                self.tab
            )));
        }
        Ok(())
    }
}
