//! Result and error types for visual snapshot comparison.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for snapshot operations
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Errors that can occur while comparing snapshots
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Image bytes could not be decoded, or decoded to a zero-sized image
    #[error("Failed to decode {what}: {message}")]
    Decode {
        /// Which image failed ("screenshot", "baseline", ...)
        what: String,
        /// Error message
        message: String,
    },

    /// Baseline file expected but absent
    #[error("Baseline not found: {}", path.display())]
    NotFound {
        /// Path that was looked up
        path: PathBuf,
    },

    /// A policy was handed grids of different sizes.
    ///
    /// The session reconciles sizes before diffing, so this only surfaces
    /// when a policy is called directly.
    #[error("Image dimensions differ: reference {reference:?}, candidate {candidate:?}")]
    DimensionMismatch {
        /// Reference (width, height)
        reference: (u32, u32),
        /// Candidate (width, height)
        candidate: (u32, u32),
    },

    /// The pixel matcher itself failed
    #[error("Image comparison failed: {message}")]
    Comparison {
        /// Error message
        message: String,
    },

    /// Encoding an image for output failed
    #[error("Failed to encode image: {message}")]
    ImageEncode {
        /// Error message
        message: String,
    },

    /// A configuration value is out of range
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Error message
        message: String,
    },

    /// A test identity component cannot be used as a path segment
    #[error("Invalid test identity: {message}")]
    InvalidIdentity {
        /// Error message
        message: String,
    },

    /// Snapshot comparison failed hard
    #[error(
        "Snapshots DO NOT match: {name} has {mismatched_pixels} mismatched pixels, see {}",
        artifacts_dir.display()
    )]
    SnapshotMismatch {
        /// Snapshot name (`<test_name>_<tab>`)
        name: String,
        /// Number of mismatched pixels (a lower bound when scanning fail-fast)
        mismatched_pixels: usize,
        /// Directory holding the Actual/Expected/Diff images
        artifacts_dir: PathBuf,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SnapshotError {
    /// Create a decode error
    #[must_use]
    pub fn decode(what: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            what: what.into(),
            message: message.into(),
        }
    }

    /// Create an invalid configuration error
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an invalid identity error
    #[must_use]
    pub fn invalid_identity(message: impl Into<String>) -> Self {
        Self::InvalidIdentity {
            message: message.into(),
        }
    }

    /// Whether this error is a comparison failure rather than an operational one
    #[must_use]
    pub const fn is_mismatch(&self) -> bool {
        matches!(self, Self::SnapshotMismatch { .. })
    }
}
