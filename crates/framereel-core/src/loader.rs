use std::fs;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageReader, ImageResult, Rgb};
use regex::Regex;
use tracing::{debug, info};

use crate::error::{FrameReelError, Result};
use crate::frame::Frame;
use crate::natural::natural_cmp;
use crate::transform::flatten_to_rgb;

/// File extensions accepted as frames, compared case-insensitively.
pub const ACCEPTED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

/// Which directory entries become frames.
#[derive(Debug, Clone)]
pub struct FilterSpec {
    /// Anchored at the start of the file name; `None` accepts every name.
    pattern: Option<Regex>,
    extensions: Vec<String>,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            pattern: None,
            extensions: ACCEPTED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl FilterSpec {
    /// Build a filter that additionally requires file names to match `pattern` from their start.
    pub fn with_pattern(pattern: &str) -> Result<Self> {
        let anchored = Regex::new(&format!("^(?:{pattern})")).map_err(|source| {
            FrameReelError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            }
        })?;
        Ok(Self {
            pattern: Some(anchored),
            ..Self::default()
        })
    }

    pub fn from_pattern(pattern: Option<&str>) -> Result<Self> {
        match pattern {
            Some(p) => Self::with_pattern(p),
            None => Ok(Self::default()),
        }
    }

    pub fn has_accepted_extension(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .is_some_and(|ext| self.extensions.iter().any(|e| *e == ext))
    }

    pub fn matches_pattern(&self, file_name: &str) -> bool {
        self.pattern.as_ref().is_none_or(|re| re.is_match(file_name))
    }

    pub fn accepts(&self, path: &Path) -> bool {
        self.has_accepted_extension(path) && self.matches_pattern(&file_name_of(path))
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// List the regular files in `dir`, sorted by file name in natural order.
pub fn list_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let read_dir_err = |source| FrameReelError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_dir_err)? {
        let path = entry.map_err(read_dir_err)?.path();
        if path.is_file() {
            entries.push(path);
        }
    }

    entries.sort_by(|a, b| natural_cmp(&file_name_of(a), &file_name_of(b)));
    info!(?dir, entry_count = entries.len(), "listed input directory");
    Ok(entries)
}

/// Drop the first `skip` sorted entries, then keep only those the filter accepts.
pub fn select_entries(entries: Vec<PathBuf>, skip: usize, filter: &FilterSpec) -> Vec<PathBuf> {
    entries
        .into_iter()
        .skip(skip)
        .filter(|path| {
            let keep = filter.accepts(path);
            if !keep {
                debug!(?path, "entry filtered out");
            }
            keep
        })
        .collect()
}

fn decode(path: &Path) -> ImageResult<DynamicImage> {
    ImageReader::open(path)?.with_guessed_format()?.decode()
}

/// Decode one file into an RGB frame, compositing any alpha over `background`.
pub fn load_frame(path: &Path, index: usize, background: Rgb<u8>) -> Result<Frame> {
    let decoded = decode(path).map_err(|source| FrameReelError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let image = flatten_to_rgb(decoded, background);
    debug!(?path, index, width = image.width(), height = image.height(), "decoded frame");
    Ok(Frame {
        image,
        source: path.to_path_buf(),
        index,
    })
}

/// Enumerate, skip, filter and decode every frame in `dir`.
///
/// Stops at the first file that fails to decode.
pub fn load_frames(
    dir: &Path,
    skip: usize,
    filter: &FilterSpec,
    background: Rgb<u8>,
) -> Result<Vec<Frame>> {
    let selected = select_entries(list_entries(dir)?, skip, filter);
    info!(?dir, skip, selected = selected.len(), "selected frame sources");

    selected
        .iter()
        .enumerate()
        .map(|(index, path)| load_frame(path, index, background))
        .collect()
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage, RgbImage};
    use tempfile::TempDir;
    use tracing_test::traced_test;

    use super::*;
    use crate::transform::DEFAULT_FILL;

    fn write_png(dir: &Path, name: &str, w: u32, h: u32) {
        RgbImage::from_pixel(w, h, Rgb([200, 10, 10]))
            .save(dir.join(name))
            .unwrap_or_else(|e| panic!("failed to write fixture {name}: {e}"));
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths.iter().map(|p| file_name_of(p)).collect()
    }

    fn frame_names(frames: &[Frame]) -> Vec<String> {
        frames.iter().map(|f| file_name_of(&f.source)).collect()
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        let filter = FilterSpec::default();
        assert!(filter.accepts(Path::new("/x/a.PNG")));
        assert!(filter.accepts(Path::new("/x/a.JpEg")));
        assert!(filter.accepts(Path::new("/x/a.webp")));
        assert!(!filter.accepts(Path::new("/x/a.txt")));
        assert!(!filter.accepts(Path::new("/x/png")));
    }

    #[test]
    fn pattern_is_anchored_at_start() {
        let filter = FilterSpec::with_pattern("a1").unwrap();
        assert!(filter.matches_pattern("a1.png"));
        assert!(filter.matches_pattern("a10.png"));
        assert!(!filter.matches_pattern("ba1.png"));
    }

    #[test]
    fn alternation_stays_anchored() {
        let filter = FilterSpec::with_pattern("a|b").unwrap();
        assert!(filter.matches_pattern("b.png"));
        assert!(!filter.matches_pattern("cb.png"));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = FilterSpec::with_pattern("(unclosed").unwrap_err();
        assert!(matches!(err, FrameReelError::InvalidPattern { .. }));
    }

    #[test]
    fn skip_applies_before_filtering() {
        let entries: Vec<PathBuf> = ["a.txt", "b1.png", "b2.png", "c.png"]
            .iter()
            .map(PathBuf::from)
            .collect();
        let selected = select_entries(entries, 1, &FilterSpec::default());
        assert_eq!(names(&selected), vec!["b1.png", "b2.png", "c.png"]);
    }

    #[test]
    fn filtering_is_idempotent() {
        let entries: Vec<PathBuf> = ["a1.png", "a2.png", "b1.png", "a3.txt", "xa1.png"]
            .iter()
            .map(PathBuf::from)
            .collect();
        let filter = FilterSpec::with_pattern("a").unwrap();
        let once = select_entries(entries, 0, &filter);
        let twice = select_entries(once.clone(), 0, &filter);
        assert_eq!(once, twice);
        assert_eq!(names(&once), vec!["a1.png", "a2.png"]);
    }

    #[test]
    #[traced_test]
    fn loads_in_natural_order() {
        let dir = TempDir::new().unwrap();
        for name in ["frame10.png", "frame2.png", "frame1.png", "notes.txt"] {
            if name.ends_with(".png") {
                write_png(dir.path(), name, 4, 4);
            } else {
                fs::write(dir.path().join(name), "not an image").unwrap();
            }
        }
        fs::create_dir(dir.path().join("sub.png")).unwrap();

        let frames = load_frames(dir.path(), 0, &FilterSpec::default(), DEFAULT_FILL).unwrap();
        assert_eq!(frame_names(&frames), vec!["frame1.png", "frame2.png", "frame10.png"]);
        assert_eq!(frames.iter().map(|f| f.index).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert!(logs_contain("selected frame sources"));
    }

    #[test]
    fn skip_equals_removing_files() {
        let full = TempDir::new().unwrap();
        let trimmed = TempDir::new().unwrap();
        for (i, name) in ["p1.png", "p2.png", "p3.png", "p10.png"].iter().enumerate() {
            write_png(full.path(), name, 2 + i as u32, 2);
            if i >= 2 {
                write_png(trimmed.path(), name, 2 + i as u32, 2);
            }
        }

        let skipped = load_frames(full.path(), 2, &FilterSpec::default(), DEFAULT_FILL).unwrap();
        let removed = load_frames(trimmed.path(), 0, &FilterSpec::default(), DEFAULT_FILL).unwrap();
        assert_eq!(frame_names(&skipped), frame_names(&removed));
        assert_eq!(frame_names(&skipped), vec!["p3.png", "p10.png"]);
    }

    #[test]
    fn corrupt_file_aborts_with_path() {
        let dir = TempDir::new().unwrap();
        write_png(dir.path(), "a.png", 4, 4);
        fs::write(dir.path().join("b.png"), b"definitely not a png").unwrap();
        write_png(dir.path(), "c.png", 4, 4);

        let err = load_frames(dir.path(), 0, &FilterSpec::default(), DEFAULT_FILL).unwrap_err();
        match err {
            FrameReelError::Decode { path, .. } => assert!(path.ends_with("b.png")),
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn missing_directory_is_read_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let err = list_entries(&missing).unwrap_err();
        assert!(matches!(err, FrameReelError::ReadDir { .. }));
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn alpha_is_composited_on_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clear.png");
        RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 0])).save(&path).unwrap();

        let frame = load_frame(&path, 0, Rgb([0, 0, 255])).unwrap();
        assert_eq!(*frame.image.get_pixel(1, 1), Rgb([0, 0, 255]));
    }
}
