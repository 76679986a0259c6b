/*!
    Streaming playback of volumetric video.

    A volumetric asset is a WebM container carrying an AV1 color stream and,
    optionally, an FFV1 alpha stream and a 16-bit PNG depth stream. This
    crate downloads the asset, decodes it on a background thread into a
    fixed pool of frames, and hands frames to a renderer at a configurable
    rate.

    The moving parts:

    - [`fetch`] downloads the manifest and the media blob.
    - [`playback::RingBuffer`] coordinates the decode thread and the render
      thread through a lock-free ring of frame slots.
    - [`FrameLoader`] owns the writer thread and paces frames out with
      [`FrameLoader::swap_next_frame`].

    ```ignore
    let network = NetworkContext::new(&config.http)?;
    let mut loader = FrameLoader::new(config, &network)?;
    loader.load_manifest()?;
    loader.start_background_writer()?;

    // once per rendered frame
    if let Some(frame) = loader.swap_next_frame(loader.now_seconds()) {
        for plane in frame.planes() {
            upload(plane);
        }
    }
    ```
*/

pub mod config;
pub mod error;
pub mod fetch;
pub mod manifest;
pub mod playback;

pub use config::{HttpConfig, PlayerConfig, StreamLayout};
pub use error::{Error, Result};
pub use fetch::{BlobFetcher, NetworkContext};
pub use manifest::Manifest;
pub use playback::{
    Clock, FrameLoader, ManualClock, PlaybackControls, SourceFactory, WallClock,
    WebmSourceFactory,
};

pub use media_decode::FrameSource;
pub use media_types::{PlaneKind, PlaneView, RoleSet, StreamRole, VideoFrame};
