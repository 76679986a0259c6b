/*!
    Shared types for the volumetric media crates.

    This crate defines the vocabulary that crosses crate boundaries: packets,
    stream roles, pixel formats, decoded frames and the common error type.
    It has no dependency on FFmpeg, so the playback pipeline can be built and
    tested against synthetic sources.
*/

mod error;
mod format;
mod frame;
mod packet;
mod stream;
mod time;

pub use error::{Error, Result};
pub use format::{ChromaLayout, CodecId, PixelFormat};
pub use frame::{Plane, PlaneKind, PlaneView, VideoFrame};
pub use packet::Packet;
pub use stream::{RoleSet, StreamInfo, StreamRole};
pub use time::{MediaDuration, Pts, Rational};
