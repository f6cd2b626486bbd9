use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// The output stage an encode failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeStage {
    Gif,
    Video,
    FrameDump,
}

impl fmt::Display for EncodeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeStage::Gif => write!(f, "gif"),
            EncodeStage::Video => write!(f, "video"),
            EncodeStage::FrameDump => write!(f, "frame dump"),
        }
    }
}

#[derive(Debug, Error)]
pub enum FrameReelError {
    #[error("failed to read input directory {}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to decode image {}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("invalid filename pattern {pattern:?}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{stage} encoding failed for {}", path.display())]
    Encode {
        path: PathBuf,
        stage: EncodeStage,
        #[source]
        source: image::ImageError,
    },

    #[error("{stage} output I/O failed for {}", path.display())]
    Io {
        path: PathBuf,
        stage: EncodeStage,
        #[source]
        source: io::Error,
    },

    #[error("ffmpeg failed writing {}: {message}", path.display())]
    Ffmpeg { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, FrameReelError>;
