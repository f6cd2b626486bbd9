use std::path::{Path, PathBuf};

use image::Rgb;
use tracing::{info, warn};

use crate::animation::{write_gif, GifOptions};
use crate::dump::save_frames;
use crate::error::{FrameReelError, Result};
use crate::frame::Frame;
use crate::loader::{load_frames, FilterSpec};
use crate::transform::{transform_frame, TargetGeometry, DEFAULT_FILL};
use crate::video::{write_video, VideoOptions};

/// Default display time per frame.
pub const DEFAULT_DURATION_MS: u32 = 500;

/// Parameters for one run of the frame pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Display time of every frame in milliseconds.
    pub duration_ms: u32,
    /// Number of naturally sorted directory entries to drop before filtering.
    pub skip: usize,
    /// Regular expression file names must match from their start.
    pub pattern: Option<String>,
    /// Bounding box to shrink (and optionally pad) frames into, or None to keep source sizes.
    pub geometry: Option<TargetGeometry>,
    /// Loop the GIF forever instead of playing once.
    pub looping: bool,
    /// Padding color, also the background transparent pixels are flattened onto.
    pub fill: Rgb<u8>,
    /// Secondary MP4 output, or None to skip video encoding.
    pub video_output: Option<PathBuf>,
    /// Directory to write the prepared frames to as PNGs, or None to skip.
    pub frames_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            duration_ms: DEFAULT_DURATION_MS,
            skip: 0,
            pattern: None,
            geometry: None,
            looping: false,
            fill: DEFAULT_FILL,
            video_output: None,
            frames_dir: None,
        }
    }
}

impl PipelineConfig {
    /// Check numeric limits and compile the file filter.
    pub fn validate(&self) -> Result<FilterSpec> {
        if self.duration_ms < 1 {
            return Err(FrameReelError::InvalidConfig(format!(
                "duration must be >= 1ms, got {}",
                self.duration_ms
            )));
        }
        if let Some(geometry) = self.geometry {
            if geometry.max_size < 1 {
                return Err(FrameReelError::InvalidConfig(format!(
                    "max_size must be >= 1, got {}",
                    geometry.max_size
                )));
            }
        }
        FilterSpec::from_pattern(self.pattern.as_deref())
    }

    pub fn gif_options(&self) -> GifOptions {
        GifOptions {
            duration_ms: self.duration_ms,
            looping: self.looping,
            fill: self.fill,
        }
    }

    pub fn video_options(&self) -> VideoOptions {
        VideoOptions {
            duration_ms: self.duration_ms,
            fill: self.fill,
        }
    }
}

/// What a pipeline run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineReport {
    /// Nothing matched the filters; no output was written.
    NoMatchingInput,
    Written {
        gif: PathBuf,
        frame_count: usize,
        video: Option<PathBuf>,
        frames_dir: Option<PathBuf>,
    },
}

/// Load, transform and emit every frame in `input_dir`.
///
/// The GIF is written first; a later video failure leaves it on disk.
pub fn run_pipeline(
    input_dir: &Path,
    output_gif: &Path,
    config: &PipelineConfig,
) -> Result<PipelineReport> {
    let filter = config.validate()?;

    info!(
        ?input_dir,
        ?output_gif,
        duration_ms = config.duration_ms,
        skip = config.skip,
        pattern = ?config.pattern,
        geometry = ?config.geometry,
        looping = config.looping,
        "pipeline starting"
    );

    let frames = prepare_frames(input_dir, &filter, config)?;
    if frames.is_empty() {
        warn!(?input_dir, "no matching images found");
        return Ok(PipelineReport::NoMatchingInput);
    }

    if let Some(dir) = &config.frames_dir {
        save_frames(&frames, dir)?;
    }

    let frame_count = write_gif(&frames, output_gif, &config.gif_options())?;

    if let Some(video) = &config.video_output {
        write_video(&frames, video, &config.video_options())?;
    }

    info!(frame_count, "pipeline complete");

    Ok(PipelineReport::Written {
        gif: output_gif.to_path_buf(),
        frame_count,
        video: config.video_output.clone(),
        frames_dir: config.frames_dir.clone(),
    })
}

/// Decode the selected files and fit each one into the configured geometry.
pub fn prepare_frames(
    input_dir: &Path,
    filter: &FilterSpec,
    config: &PipelineConfig,
) -> Result<Vec<Frame>> {
    let frames = load_frames(input_dir, config.skip, filter, config.fill)?;
    info!(frame_count = frames.len(), "frame loading complete");

    Ok(frames
        .into_iter()
        .map(|frame| transform_frame(frame, config.geometry, config.fill))
        .collect())
}
