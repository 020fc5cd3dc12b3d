//! Failure artifacts: directory rotation, diff rendering and the
//! Actual/Expected/Diff image files.

use crate::diff::DifferenceSignal;
use crate::normalize::{encode_png, PixelGrid};
use crate::result::SnapshotResult;
use crate::sink::{Attachment, ReportSink};
use image::Rgba;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// The three images written for one failed comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSet {
    /// Live failure directory
    pub dir: PathBuf,
    /// Candidate screenshot
    pub actual: PathBuf,
    /// Reference, at the candidate's size
    pub expected: PathBuf,
    /// Rendered difference
    pub diff: PathBuf,
    /// Where the previous live directory was moved, if there was one
    pub rotated_to: Option<PathBuf>,
}

/// Move an existing failure directory out of the way by appending a
/// random suffix. A missing directory is not an error.
///
/// Two processes rotating the same directory at once can race; callers
/// must not compare the same identity concurrently.
///
/// # Errors
///
/// Returns an I/O error if the rename fails for any reason other than the
/// directory being absent.
pub fn rotate(dir: &Path) -> SnapshotResult<Option<PathBuf>> {
    if !dir.exists() {
        return Ok(None);
    }
    let mut rotated = dir.as_os_str().to_os_string();
    rotated.push(format!("_{}", uuid::Uuid::new_v4()));
    let rotated = PathBuf::from(rotated);

    match fs::rename(dir, &rotated) {
        Ok(()) => {
            tracing::debug!(from = %dir.display(), to = %rotated.display(), "rotated failure directory");
            Ok(Some(rotated))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Jet color map: dark blue for 0 through cyan, yellow and red to dark red
/// for 255.
#[must_use]
pub fn jet(value: u8) -> Rgba<u8> {
    let v = f64::from(value) / 255.0;
    let channel = |center: f64| -> u8 {
        let c = (1.5 - (4.0 * v - center).abs()).clamp(0.0, 1.0);
        (c * 255.0).round() as u8
    };
    Rgba([channel(3.0), channel(2.0), channel(1.0), 255])
}

/// Render a difference signal as a viewable image.
///
/// Channel deltas are collapsed to the mean of their color channels and
/// mapped through [`jet`]; mismatch masks are already images.
#[must_use]
pub fn render_diff(signal: &DifferenceSignal) -> PixelGrid {
    match signal {
        DifferenceSignal::ChannelDelta(delta) => {
            PixelGrid::from_fn(delta.width(), delta.height(), |x, y| {
                let Rgba([r, g, b, _]) = *delta.get_pixel(x, y);
                let mean = (u16::from(r) + u16::from(g) + u16::from(b)) / 3;
                jet(mean as u8)
            })
        }
        DifferenceSignal::MismatchMask(mask) => mask.clone(),
    }
}

/// Writes failure artifacts into a fresh directory per failure
pub struct ArtifactWriter<'a> {
    sink: &'a dyn ReportSink,
}

impl std::fmt::Debug for ArtifactWriter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactWriter").finish_non_exhaustive()
    }
}

impl<'a> ArtifactWriter<'a> {
    /// Writer that reports to `sink`
    #[must_use]
    pub fn new(sink: &'a dyn ReportSink) -> Self {
        Self { sink }
    }

    /// Rotate `dir`, recreate it and write
    /// `Actual_<name>.png`, `Expected_<name>.png` and `Diff_<name>.png`.
    ///
    /// # Errors
    ///
    /// Returns an error if rotation, encoding, writing or the sink fails.
    pub fn write(
        &self,
        dir: &Path,
        snapshot_name: &str,
        actual: &PixelGrid,
        expected: &PixelGrid,
        signal: &DifferenceSignal,
    ) -> SnapshotResult<ArtifactSet> {
        let rotated_to = rotate(dir)?;
        fs::create_dir_all(dir)?;

        let set = ArtifactSet {
            dir: dir.to_path_buf(),
            actual: dir.join(format!("Actual_{snapshot_name}.png")),
            expected: dir.join(format!("Expected_{snapshot_name}.png")),
            diff: dir.join(format!("Diff_{snapshot_name}.png")),
            rotated_to,
        };

        fs::write(&set.diff, encode_png(&render_diff(signal))?)?;
        fs::write(&set.actual, encode_png(actual)?)?;
        fs::write(&set.expected, encode_png(expected)?)?;

        self.sink.attach(&Attachment::png(&set.diff, "Diff Image"))?;
        self.sink
            .attach(&Attachment::png(&set.actual, "Actual Image"))?;
        self.sink
            .attach(&Attachment::png(&set.expected, "Expected Image"))?;

        Ok(set)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::sink::{CollectingSink, NullSink};
    use crate::test_support::solid;
    use tempfile::TempDir;

    #[test]
    fn test_jet_endpoints() {
        assert_eq!(jet(0), Rgba([0, 0, 128, 255]));
        assert_eq!(jet(255), Rgba([128, 0, 0, 255]));
        // Midpoint is green-dominant
        let Rgba([r, g, b, _]) = jet(128);
        assert!(g > r && g > b);
    }

    #[test]
    fn test_jet_goes_from_cool_to_hot() {
        let Rgba([r_low, _, b_low, _]) = jet(20);
        let Rgba([r_high, _, b_high, _]) = jet(235);
        assert!(b_low > r_low);
        assert!(r_high > b_high);
    }

    #[test]
    fn test_render_channel_delta_uses_mean() {
        let delta = PixelGrid::from_pixel(2, 1, Rgba([255, 255, 255, 0]));
        let rendered = render_diff(&DifferenceSignal::ChannelDelta(delta));
        assert_eq!(*rendered.get_pixel(0, 0), jet(255));

        let delta = PixelGrid::from_pixel(1, 1, Rgba([90, 0, 0, 0]));
        let rendered = render_diff(&DifferenceSignal::ChannelDelta(delta));
        assert_eq!(*rendered.get_pixel(0, 0), jet(30));
    }

    #[test]
    fn test_rotate_missing_dir_is_silent() {
        let temp = TempDir::new().unwrap();
        assert_eq!(rotate(&temp.path().join("absent")).unwrap(), None);
    }

    #[test]
    fn test_rotate_renames_with_suffix() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("test_login");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("keep.txt"), "old").unwrap();

        let rotated = rotate(&dir).unwrap().unwrap();
        assert!(!dir.exists());
        assert!(rotated.join("keep.txt").exists());
        let name = rotated.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("test_login_"));
    }

    #[test]
    fn test_write_creates_three_images_and_reports() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("failures").join("case");
        let sink = CollectingSink::new();
        let actual = solid(4, 4, [255, 255, 255, 255]);
        let expected = solid(4, 4, [0, 0, 0, 255]);
        let signal = DifferenceSignal::ChannelDelta(solid(4, 4, [255, 255, 255, 0]));

        let set = ArtifactWriter::new(&sink)
            .write(&dir, "case[linux]_main", &actual, &expected, &signal)
            .unwrap();

        assert!(set.actual.ends_with("Actual_case[linux]_main.png"));
        assert!(set.expected.ends_with("Expected_case[linux]_main.png"));
        assert!(set.diff.ends_with("Diff_case[linux]_main.png"));
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 3);
        assert_eq!(set.rotated_to, None);

        let names: Vec<_> = sink.attachments().into_iter().map(|a| a.name).collect();
        assert_eq!(names, ["Diff Image", "Actual Image", "Expected Image"]);
    }

    #[test]
    fn test_second_write_preserves_first() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("case");
        let grid = solid(2, 2, [1, 2, 3, 255]);
        let signal = DifferenceSignal::MismatchMask(PixelGrid::new(2, 2));
        let writer = ArtifactWriter::new(&NullSink);

        writer.write(&dir, "n", &grid, &grid, &signal).unwrap();
        let second = writer.write(&dir, "n", &grid, &grid, &signal).unwrap();

        let rotated = second.rotated_to.unwrap();
        assert!(rotated.join("Actual_n.png").exists());
        assert!(dir.join("Actual_n.png").exists());
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 2);
    }
}
