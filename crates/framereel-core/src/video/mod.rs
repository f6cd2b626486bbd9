pub mod encoder;

pub use encoder::{write_video, VideoEncoder, VideoOptions};
