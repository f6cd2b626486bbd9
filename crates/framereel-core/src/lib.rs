pub mod animation;
pub mod dump;
pub mod error;
pub mod frame;
pub mod loader;
pub mod natural;
pub mod pipeline;
pub mod rect;
pub mod transform;
pub mod video;

pub use error::{FrameReelError, Result};
pub use frame::Frame;
