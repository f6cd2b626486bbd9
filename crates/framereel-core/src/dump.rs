use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{EncodeStage, FrameReelError, Result};
use crate::frame::Frame;

/// File name a prepared frame is dumped under.
pub fn dump_file_name(frame: &Frame) -> String {
    format!("frame_{:05}.png", frame.index)
}

/// Write each prepared frame as a PNG into `dir`, creating it if needed.
pub fn save_frames(frames: &[Frame], dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).map_err(|source| FrameReelError::Io {
        path: dir.to_path_buf(),
        stage: EncodeStage::FrameDump,
        source,
    })?;

    let mut written = Vec::with_capacity(frames.len());
    for frame in frames {
        let path = dir.join(dump_file_name(frame));
        frame.image.save(&path).map_err(|source| FrameReelError::Encode {
            path: path.clone(),
            stage: EncodeStage::FrameDump,
            source,
        })?;
        debug!(?path, source = ?frame.source, "saved prepared frame");
        written.push(path);
    }

    info!(?dir, frame_count = written.len(), "prepared frames dumped");
    Ok(written)
}
