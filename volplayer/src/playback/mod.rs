mod clock;
mod loader;
mod pool;
mod ring;
mod source;
mod writer;

pub use clock::{Clock, FramePacer, ManualClock, WallClock, frame_period};
pub use loader::{FrameLoader, PlaybackControls};
pub use ring::{Consumer, Producer, Publish, RingBuffer};
pub use source::{SourceFactory, WebmSourceFactory};
