use std::path::PathBuf;

use clap::Parser;
use image::Rgb;

use framereel_core::pipeline::{PipelineConfig, DEFAULT_DURATION_MS};
use framereel_core::transform::{parse_hex_color, TargetGeometry};

#[derive(Parser, Debug)]
#[command(
    name = "framereel",
    about = "Create an animated GIF (and optionally an MP4) from a directory of images"
)]
pub struct Cli {
    /// Directory containing the images.
    pub image_folder: PathBuf,

    /// Output GIF file name.
    pub output_gif: PathBuf,

    /// Duration of each frame in milliseconds.
    #[arg(long, default_value_t = DEFAULT_DURATION_MS, value_parser = clap::value_parser!(u32).range(1..))]
    pub duration: u32,

    /// Longest axis of the output frames; frames are padded to a square of this size.
    #[arg(long = "max_size", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_size: Option<u32>,

    /// Only shrink to --max_size, keep each frame's aspect without padding.
    #[arg(long = "no_pad", requires = "max_size")]
    pub no_pad: bool,

    /// Color for padding and transparent areas, as #RRGGBB.
    #[arg(long = "pad_color", default_value = "#000000", value_parser = parse_hex_color)]
    pub pad_color: Rgb<u8>,

    /// Only use files whose name matches this regular expression from the start.
    #[arg(long)]
    pub regex: Option<String>,

    /// Loop the GIF forever.
    #[arg(long = "loop")]
    pub looping: bool,

    /// Number of sorted directory entries to skip.
    #[arg(long, default_value_t = 0)]
    pub skip: usize,

    /// Also write an MP4 video to this path.
    #[arg(long = "output_mp4")]
    pub output_mp4: Option<PathBuf>,

    /// Write the prepared frames as PNGs into this directory.
    #[arg(long = "frames_dir")]
    pub frames_dir: Option<PathBuf>,
}

impl Cli {
    pub fn pipeline_config(&self) -> PipelineConfig {
        let geometry = self.max_size.map(|size| {
            if self.no_pad {
                TargetGeometry::shrink_only(size)
            } else {
                TargetGeometry::square(size)
            }
        });

        PipelineConfig {
            duration_ms: self.duration,
            skip: self.skip,
            pattern: self.regex.clone(),
            geometry,
            looping: self.looping,
            fill: self.pad_color,
            video_output: self.output_mp4.clone(),
            frames_dir: self.frames_dir.clone(),
        }
    }
}
