/// A rectangle in absolute pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl PixelRect {
    /// Size of a `w`x`h` image shrunk so its longest side is at most `max_side`,
    /// keeping the aspect ratio. Images already within bounds are not upscaled.
    pub fn fit_within(w: u32, h: u32, max_side: u32) -> (u32, u32) {
        assert!(max_side > 0, "max_side must be > 0");
        let longest = w.max(h);
        if longest <= max_side {
            return (w, h);
        }
        let scale = |side: u32| ((side as u64 * max_side as u64 / longest as u64) as u32).max(1);
        (scale(w), scale(h))
    }

    /// Place a `w`x`h` image in the middle of a `canvas_w`x`canvas_h` canvas.
    /// When the leftover space is odd, the extra pixel goes to the right/bottom edge.
    pub fn centered_in(w: u32, h: u32, canvas_w: u32, canvas_h: u32) -> PixelRect {
        assert!(
            w <= canvas_w && h <= canvas_h,
            "image {w}x{h} does not fit canvas {canvas_w}x{canvas_h}"
        );
        PixelRect {
            x: (canvas_w - w) / 2,
            y: (canvas_h - h) / 2,
            w,
            h,
        }
    }

    /// Padding on each edge as `(left, top, right, bottom)` within a canvas.
    pub fn margins(self, canvas_w: u32, canvas_h: u32) -> (u32, u32, u32, u32) {
        (
            self.x,
            self.y,
            canvas_w - self.x - self.w,
            canvas_h - self.y - self.h,
        )
    }
}
