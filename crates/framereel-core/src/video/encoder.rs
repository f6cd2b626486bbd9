use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use image::{Rgb, RgbImage};
use tracing::{debug, error, info, warn};

use crate::error::{FrameReelError, Result};
use crate::frame::Frame;
use crate::transform::{common_canvas, pad_to_canvas, DEFAULT_FILL};

const FFMPEG: &str = "ffmpeg";

/// Parameters for the secondary video output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoOptions {
    /// Display time of every frame in milliseconds; the frame rate is `1000 / duration_ms`.
    pub duration_ms: u32,
    /// Fill for frames padded up to the common canvas.
    pub fill: Rgb<u8>,
}

impl Default for VideoOptions {
    fn default() -> Self {
        Self {
            duration_ms: 500,
            fill: DEFAULT_FILL,
        }
    }
}

/// Frame rate for ffmpeg as the exact rational `1000/duration_ms`.
pub fn frame_rate(duration_ms: u32) -> String {
    format!("1000/{duration_ms}")
}

/// Arguments for an ffmpeg process reading raw RGB24 frames from stdin.
///
/// The frame rate is passed as the exact rational `1000/duration_ms`. libx264 with
/// yuv420p needs even dimensions, so odd canvases get one extra fill row/column.
pub fn ffmpeg_args(output: &Path, width: u32, height: u32, duration_ms: u32) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-hide_banner",
        "-loglevel",
        "error",
        "-y",
        "-f",
        "rawvideo",
        "-pix_fmt",
        "rgb24",
    ]
    .iter()
    .map(OsString::from)
    .collect();
    args.extend([
        "-s".into(),
        format!("{width}x{height}").into(),
        "-framerate".into(),
        frame_rate(duration_ms).into(),
        "-i".into(),
        "pipe:0".into(),
        "-vf".into(),
        "pad=ceil(iw/2)*2:ceil(ih/2)*2".into(),
        "-c:v".into(),
        "libx264".into(),
        "-pix_fmt".into(),
        "yuv420p".into(),
    ]);
    args.push(output.as_os_str().to_owned());
    args
}

/// Encodes frames by piping raw RGB24 data into the ffmpeg CLI.
pub struct VideoEncoder {
    child: Option<Child>,
    output: PathBuf,
    width: u32,
    height: u32,
    frame_bytes: usize,
    frame_count: u32,
}

impl VideoEncoder {
    /// Spawn ffmpeg writing a `width`x`height` video to `output`.
    pub fn spawn(output: &Path, width: u32, height: u32, duration_ms: u32) -> Result<Self> {
        assert!(width > 0 && height > 0, "invalid video dimensions: {width}x{height}");
        assert!(duration_ms > 0, "duration_ms must be > 0");

        info!(?output, width, height, duration_ms, "spawning ffmpeg encoder process");

        let child = Command::new(FFMPEG)
            .args(ffmpeg_args(output, width, height, duration_ms))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| FrameReelError::Ffmpeg {
                path: output.to_path_buf(),
                message: format!("failed to spawn ffmpeg, is ffmpeg installed? ({e})"),
            })?;

        Ok(Self {
            child: Some(child),
            output: output.to_path_buf(),
            width,
            height,
            frame_bytes: width as usize * height as usize * 3,
            frame_count: 0,
        })
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Send one frame. Its dimensions must match the encoder's.
    pub fn write_frame(&mut self, image: &RgbImage) -> Result<()> {
        if image.dimensions() != (self.width, self.height) {
            return Err(self.ffmpeg_error(format!(
                "frame {} is {}x{}, encoder expects {}x{}",
                self.frame_count,
                image.width(),
                image.height(),
                self.width,
                self.height
            )));
        }
        debug_assert_eq!(image.as_raw().len(), self.frame_bytes);

        let written = match self.child.as_mut().and_then(|c| c.stdin.as_mut()) {
            Some(stdin) => stdin.write_all(image.as_raw()),
            None => return Err(self.ffmpeg_error("ffmpeg stdin not available".to_string())),
        };

        if let Err(e) = written {
            let stderr = self.abort();
            error!(frame = self.frame_count, %e, %stderr, "failed to write to ffmpeg pipe");
            return Err(self.ffmpeg_error(format!(
                "pipe closed at frame {}: {e}; {stderr}",
                self.frame_count
            )));
        }

        self.frame_count += 1;
        debug!(frame = self.frame_count, "frame sent to ffmpeg");
        Ok(())
    }

    /// Close stdin and wait for ffmpeg to finish the container.
    pub fn finish(mut self) -> Result<u32> {
        let Some(mut child) = self.child.take() else {
            return Err(self.ffmpeg_error("encoder already closed".to_string()));
        };
        drop(child.stdin.take());

        let result = child.wait_with_output().map_err(|e| {
            self.ffmpeg_error(format!("failed to wait for ffmpeg: {e}"))
        })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            error!(%stderr, output = ?self.output, status = %result.status, "ffmpeg failed");
            return Err(self.ffmpeg_error(format!("exited with {}: {stderr}", result.status)));
        }

        info!(output = ?self.output, frames = self.frame_count, "video encoder finished");
        Ok(self.frame_count)
    }

    /// Kill ffmpeg and return whatever it wrote to stderr.
    fn abort(&mut self) -> String {
        let Some(mut child) = self.child.take() else {
            return String::new();
        };
        drop(child.stdin.take());
        let _ = child.kill();
        match child.wait_with_output() {
            Ok(out) => String::from_utf8_lossy(&out.stderr).trim().to_string(),
            Err(_) => String::new(),
        }
    }

    fn ffmpeg_error(&self, message: String) -> FrameReelError {
        FrameReelError::Ffmpeg {
            path: self.output.clone(),
            message,
        }
    }
}

impl Drop for VideoEncoder {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            warn!(output = ?self.output, frames = self.frame_count, "video encoder dropped before finish");
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Encode `frames` into a video at `output` and return the number of frames written.
///
/// Frames of differing size are centered on the smallest common canvas.
pub fn write_video(frames: &[Frame], output: &Path, options: &VideoOptions) -> Result<usize> {
    if frames.is_empty() {
        warn!(?output, "no frames to encode, video not written");
        return Ok(0);
    }

    let (width, height) = common_canvas(frames);
    let mixed = frames.iter().any(|f| f.dimensions() != (width, height));
    if mixed {
        warn!(width, height, "frames differ in size, padding to common canvas for video");
    }

    info!(
        ?output,
        frame_count = frames.len(),
        frame_rate = %frame_rate(options.duration_ms),
        "encoding video"
    );

    let mut encoder = VideoEncoder::spawn(output, width, height, options.duration_ms)?;
    for frame in frames {
        if mixed {
            let padded = pad_to_canvas(frame.image.clone(), width, height, options.fill);
            encoder.write_frame(&padded)?;
        } else {
            encoder.write_frame(&frame.image)?;
        }
    }
    let written = encoder.finish()?;

    info!(?output, frame_count = written, "video written");
    Ok(written as usize)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn ffmpeg_available() -> bool {
        Command::new(FFMPEG)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|s| s.success())
    }

    fn frame(index: usize, w: u32, h: u32) -> Frame {
        Frame {
            image: RgbImage::from_pixel(w, h, Rgb([(index * 40) as u8, 100, 200])),
            source: PathBuf::from(format!("f{index}.png")),
            index,
        }
    }

    fn args_as_strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn frame_rate_from_duration() {
        assert_eq!(frame_rate(200), "1000/200");
        assert_eq!(frame_rate(VideoOptions::default().duration_ms), "1000/500");
    }

    #[test]
    fn args_use_exact_rational_rate() {
        let args = args_as_strings(&ffmpeg_args(Path::new("out.mp4"), 60, 40, 333));
        let rate = args.iter().position(|a| a == "-framerate").unwrap();
        assert_eq!(args[rate + 1], "1000/333");
        let size = args.iter().position(|a| a == "-s").unwrap();
        assert_eq!(args[size + 1], "60x40");
        assert_eq!(args.last().map(String::as_str), Some("out.mp4"));
        assert!(args.contains(&"libx264".to_string()));
    }

    #[test]
    fn empty_sequence_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("empty.mp4");
        assert_eq!(write_video(&[], &out, &VideoOptions::default()).unwrap(), 0);
        assert!(!out.exists());
    }

    #[test]
    fn encodes_mixed_size_frames() {
        if !ffmpeg_available() {
            eprintln!("ffmpeg not on PATH, skipping");
            return;
        }
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out.mp4");
        let frames = vec![frame(0, 31, 20), frame(1, 20, 31), frame(2, 31, 31)];
        let options = VideoOptions {
            duration_ms: 200,
            ..VideoOptions::default()
        };

        assert_eq!(write_video(&frames, &out, &options).unwrap(), 3);
        assert!(std::fs::metadata(&out).unwrap().len() > 0);
    }

    #[test]
    fn wrong_frame_size_is_rejected() {
        if !ffmpeg_available() {
            eprintln!("ffmpeg not on PATH, skipping");
            return;
        }
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("bad.mp4");
        let mut encoder = VideoEncoder::spawn(&out, 8, 8, 100).unwrap();
        let err = encoder.write_frame(&RgbImage::new(4, 4)).unwrap_err();
        assert!(matches!(err, FrameReelError::Ffmpeg { .. }));
        assert_eq!(encoder.frame_count(), 0);
    }
}
