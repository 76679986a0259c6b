/*!
    Decoding for the volumetric media crates.

    A logical frame is assembled from up to three independently coded
    streams: AV1 color, FFV1 alpha and PNG depth. Each stream gets its own
    [`DecodeEngine`]; [`MultiStreamDecoder`] routes demuxed packets to them
    and reports a frame only once every configured role produced an image.

    The pipeline consumes frames through the [`FrameSource`] trait, so it can
    run against synthetic sources in tests and without FFmpeg installed.

    The FFmpeg engines and [`open_webm`] are available with the `ffmpeg`
    feature.
*/

mod engine;
mod planes;
mod source;
mod sync;

#[cfg(feature = "ffmpeg")]
mod ffmpeg;
#[cfg(feature = "ffmpeg")]
mod open;

pub use engine::DecodeEngine;
pub use planes::{copy_gray16be, copy_gray16le, copy_gray8};
pub use source::FrameSource;
pub use sync::{DEFAULT_MAX_PACKETS_PER_FRAME, MultiStreamDecoder, SyncConfig};

#[cfg(feature = "ffmpeg")]
pub use ffmpeg::FfmpegEngine;
#[cfg(feature = "ffmpeg")]
pub use open::open_webm;
