/*!
    Container demuxing for the volumetric media crates.

    This crate handles the input side of the pipeline. It opens a container
    held entirely in memory, identifies which stream carries color, alpha and
    depth, and produces role-tagged packets for the decoders.

    The FFmpeg-backed WebM demuxer is available with the `ffmpeg` feature.
    The [`Demuxer`] trait and role assignment are always available so other
    sources can plug into the same decode path.
*/

mod demuxer;
mod roles;

#[cfg(feature = "ffmpeg")]
mod convert;
#[cfg(feature = "ffmpeg")]
mod codec_config;
#[cfg(feature = "ffmpeg")]
mod memory;
#[cfg(feature = "ffmpeg")]
mod webm;

pub use demuxer::Demuxer;
pub use roles::{assign_roles, classify_stream, validate_roles};

#[cfg(feature = "ffmpeg")]
pub use codec_config::CodecConfig;
#[cfg(feature = "ffmpeg")]
pub use memory::MemoryInput;
#[cfg(feature = "ffmpeg")]
pub use webm::WebmDemuxer;
