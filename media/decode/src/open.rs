use media_source::WebmDemuxer;
use media_types::Result;

use crate::engine::DecodeEngine;
use crate::ffmpeg::FfmpegEngine;
use crate::sync::{MultiStreamDecoder, SyncConfig};

/**
    Open a WebM blob and build one FFmpeg engine per configured role.

    Fails if the container cannot be parsed, a configured role has no
    stream, the color layout is unsupported or a decoder cannot be opened.
*/
pub fn open_webm(blob: Vec<u8>, config: SyncConfig) -> Result<MultiStreamDecoder<WebmDemuxer>> {
    let demuxer = WebmDemuxer::open(blob, config.roles)?;

    let engines = demuxer
        .codec_configs()
        .iter()
        .map(|codec_config| {
            FfmpegEngine::open(codec_config).map(|e| Box::new(e) as Box<dyn DecodeEngine>)
        })
        .collect::<Result<Vec<_>>>()?;

    let (width, height) = demuxer.dimensions();
    tracing::info!(width, height, roles = %config.roles, "opened webm source");

    MultiStreamDecoder::new(demuxer, engines, config)
}
