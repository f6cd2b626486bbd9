use std::path::PathBuf;

use image::RgbImage;

/// A single decoded still image with its place in the sequence.
#[derive(Debug, Clone)]
pub struct Frame {
    /// The frame's RGB pixel data.
    pub image: RgbImage,
    /// File the frame was decoded from.
    pub source: PathBuf,
    /// Position in the sequence after skip and filtering (0-based).
    pub index: usize,
}

impl Frame {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}
