//! Baseline storage on the local filesystem.

use crate::identity::TestIdentity;
use crate::result::{SnapshotError, SnapshotResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory holding baselines, next to the test source
pub const SNAPSHOTS_DIR: &str = "snapshots";
/// Directory holding failure artifacts, next to the test source
pub const FAILURES_DIR: &str = "snapshot_tests_failures";

/// Maps test identities to baseline files and owns their lifecycle.
///
/// Layout under the root (the test's source directory unless overridden):
///
/// ```text
/// snapshots/<test_file>/<test_group>/<test_name>[<platform>]_<tab>[_<index>].png
/// snapshot_tests_failures/<test_file>/<test_name>[<platform>]/
/// ```
#[derive(Debug, Clone, Default)]
pub struct BaselineStore {
    root: Option<PathBuf>,
}

impl BaselineStore {
    /// Store rooted at each identity's own source directory
    #[must_use]
    pub const fn new() -> Self {
        Self { root: None }
    }

    /// Store rooted at a fixed directory instead of the test source directory
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn root_for<'a>(&'a self, identity: &'a TestIdentity) -> &'a Path {
        self.root.as_deref().unwrap_or(identity.source_dir.as_path())
    }

    /// Baseline path for an identity. Creates the parent directories.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directories cannot be created.
    pub fn resolve(&self, identity: &TestIdentity) -> SnapshotResult<PathBuf> {
        let dir = self
            .root_for(identity)
            .join(SNAPSHOTS_DIR)
            .join(&identity.test_file)
            .join(&identity.test_group);
        fs::create_dir_all(&dir)?;
        Ok(dir.join(identity.baseline_file_name()))
    }

    /// Live failure-artifact directory for an identity. Not created here.
    #[must_use]
    pub fn failures_dir(&self, identity: &TestIdentity) -> PathBuf {
        self.root_for(identity)
            .join(FAILURES_DIR)
            .join(&identity.test_file)
            .join(identity.qualified_name())
    }

    /// Whether a baseline exists at `path`
    #[must_use]
    pub fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    /// Read baseline bytes
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::NotFound`] if the file is absent.
    pub fn read(&self, path: &Path) -> SnapshotResult<Vec<u8>> {
        fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SnapshotError::NotFound {
                path: path.to_path_buf(),
            },
            _ => SnapshotError::Io(e),
        })
    }

    /// Write baseline bytes, replacing any existing file
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be written.
    pub fn write(&self, path: &Path, bytes: &[u8]) -> SnapshotResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, bytes)?;
        Ok(())
    }
}
