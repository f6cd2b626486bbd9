use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::buffer::ConvertBuffer;
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Rgb, RgbaImage};
use tracing::{info, warn};

use crate::error::{EncodeStage, FrameReelError, Result};
use crate::frame::Frame;
use crate::transform::{common_canvas, pad_to_canvas, DEFAULT_FILL};

/// NeuQuant speed passed to the GIF encoder (1 = best palette, 30 = fastest).
const GIF_ENCODE_SPEED: i32 = 10;

/// Timing and repeat behaviour of the written animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GifOptions {
    /// Display time of every frame in milliseconds.
    pub duration_ms: u32,
    /// Loop forever; otherwise play once and hold the last frame.
    pub looping: bool,
    /// Fill for frames padded up to the common canvas.
    pub fill: Rgb<u8>,
}

impl Default for GifOptions {
    fn default() -> Self {
        Self {
            duration_ms: 500,
            looping: false,
            fill: DEFAULT_FILL,
        }
    }
}

/// Write `frames` as an animated GIF and return the number of frames written.
///
/// The GIF screen is sized from the first frame, so frames of differing size are
/// centered on the smallest common canvas first. An empty sequence writes nothing
/// and returns 0.
pub fn write_gif(frames: &[Frame], output: &Path, options: &GifOptions) -> Result<usize> {
    if frames.is_empty() {
        warn!(?output, "no frames to encode, GIF not written");
        return Ok(0);
    }
    if options.duration_ms % 10 != 0 {
        warn!(
            duration_ms = options.duration_ms,
            "GIF delays have 10ms granularity, frame duration will be rounded"
        );
    }

    let (width, height) = common_canvas(frames);
    let mixed = frames.iter().any(|f| f.dimensions() != (width, height));
    if mixed {
        warn!(width, height, "frames differ in size, padding to common canvas for GIF");
    }

    info!(
        ?output,
        frame_count = frames.len(),
        width,
        height,
        duration_ms = options.duration_ms,
        looping = options.looping,
        "encoding GIF"
    );

    let io_err = |source| FrameReelError::Io {
        path: output.to_path_buf(),
        stage: EncodeStage::Gif,
        source,
    };
    let encode_err = |source| FrameReelError::Encode {
        path: output.to_path_buf(),
        stage: EncodeStage::Gif,
        source,
    };

    let mut writer = BufWriter::new(File::create(output).map_err(io_err)?);
    {
        let mut encoder = GifEncoder::new_with_speed(&mut writer, GIF_ENCODE_SPEED);
        // Without a NETSCAPE loop extension viewers play the animation once.
        if options.looping {
            encoder.set_repeat(Repeat::Infinite).map_err(encode_err)?;
        }

        let delay = Delay::from_numer_denom_ms(options.duration_ms, 1);
        for frame in frames {
            let rgba: RgbaImage = if mixed {
                pad_to_canvas(frame.image.clone(), width, height, options.fill).convert()
            } else {
                frame.image.convert()
            };
            encoder
                .encode_frame(image::Frame::from_parts(rgba, 0, 0, delay))
                .map_err(encode_err)?;
        }
    }
    writer.flush().map_err(io_err)?;

    info!(?output, frame_count = frames.len(), "GIF written");
    Ok(frames.len())
}
