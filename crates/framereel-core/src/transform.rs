use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};
use tracing::debug;

use crate::frame::Frame;
use crate::rect::PixelRect;

/// Fill color used for padding and alpha flattening unless configured otherwise.
pub const DEFAULT_FILL: Rgb<u8> = Rgb([0, 0, 0]);

/// Resampling filter for the shrink step.
const RESIZE_FILTER: FilterType = FilterType::Lanczos3;

/// Bounding box every frame is fitted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetGeometry {
    /// Longest allowed side, and the canvas side when padding.
    pub max_size: u32,
    /// Pad the shrunk frame onto an exact `max_size`x`max_size` canvas.
    pub pad: bool,
}

impl TargetGeometry {
    pub fn square(max_size: u32) -> Self {
        Self { max_size, pad: true }
    }

    pub fn shrink_only(max_size: u32) -> Self {
        Self { max_size, pad: false }
    }
}

/// Fit a frame into the target geometry. Without a geometry the frame is returned unchanged.
pub fn transform_frame(frame: Frame, geometry: Option<TargetGeometry>, fill: Rgb<u8>) -> Frame {
    let Some(geometry) = geometry else {
        return frame;
    };

    let (src_w, src_h) = frame.dimensions();
    let (w, h) = PixelRect::fit_within(src_w, src_h, geometry.max_size);

    let image = if (w, h) == (src_w, src_h) {
        frame.image
    } else {
        imageops::resize(&frame.image, w, h, RESIZE_FILTER)
    };

    let image = if geometry.pad {
        pad_to_canvas(image, geometry.max_size, geometry.max_size, fill)
    } else {
        image
    };

    debug!(
        index = frame.index,
        src_w,
        src_h,
        out_w = image.width(),
        out_h = image.height(),
        "frame transformed"
    );

    Frame { image, ..frame }
}

/// Smallest canvas that holds every frame.
pub fn common_canvas(frames: &[Frame]) -> (u32, u32) {
    frames
        .iter()
        .fold((0, 0), |(w, h), f| (w.max(f.width()), h.max(f.height())))
}

/// Center `image` on a `canvas_w`x`canvas_h` canvas filled with `fill`.
pub fn pad_to_canvas(image: RgbImage, canvas_w: u32, canvas_h: u32, fill: Rgb<u8>) -> RgbImage {
    if image.dimensions() == (canvas_w, canvas_h) {
        return image;
    }
    let rect = PixelRect::centered_in(image.width(), image.height(), canvas_w, canvas_h);
    let mut canvas = RgbImage::from_pixel(canvas_w, canvas_h, fill);
    imageops::replace(&mut canvas, &image, rect.x as i64, rect.y as i64);
    canvas
}

/// Convert any decoded image to RGB. Alpha is composited over `background`;
/// palette and grayscale sources are expanded.
pub fn flatten_to_rgb(image: DynamicImage, background: Rgb<u8>) -> RgbImage {
    if !image.color().has_alpha() {
        return image.into_rgb8();
    }

    let rgba = image.into_rgba8();
    let (w, h) = rgba.dimensions();
    RgbImage::from_fn(w, h, |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        Rgb([
            blend(r, background[0], a),
            blend(g, background[1], a),
            blend(b, background[2], a),
        ])
    })
}

fn blend(fg: u8, bg: u8, alpha: u8) -> u8 {
    let a = alpha as u32;
    ((fg as u32 * a + bg as u32 * (255 - a) + 127) / 255) as u8
}

/// Parse `#RRGGBB` or `RRGGBB` into a color.
pub fn parse_hex_color(s: &str) -> Result<Rgb<u8>, String> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("expected a color like #RRGGBB, got {s:?}"));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| format!("bad color {s:?}: {e}"))
    };
    Ok(Rgb([channel(0)?, channel(2)?, channel(4)?]))
}
