/*!
    WebM demuxer over an in-memory blob.
*/

use media_types::{
    Error, MediaDuration, Packet, PixelFormat, Rational, Result, RoleSet, StreamInfo, StreamRole,
};

use crate::codec_config::CodecConfig;
use crate::convert::{
    codec_id_from_ffmpeg, pixel_format_from_ffmpeg, pts_from_ffmpeg, rational_from_ffmpeg,
};
use crate::demuxer::Demuxer;
use crate::memory::MemoryInput;
use crate::roles::{assign_roles, validate_roles};

/**
    Demuxes a multi-stream WebM held in memory.

    Created by [`WebmDemuxer::open`], which identifies the color, alpha and
    depth streams and fails if any role in `required` is absent.
*/
pub struct WebmDemuxer {
    input: MemoryInput,
    streams: Vec<StreamInfo>,
    /// Role per container stream index.
    roles: Vec<Option<StreamRole>>,
    configs: Vec<CodecConfig>,
}

impl WebmDemuxer {
    /**
        Open a container from its bytes.

        # Example

        ```ignore
        let demuxer = WebmDemuxer::open(blob, RoleSet::ALL)?;
        for stream in demuxer.streams() {
            println!("{}: {:?}", stream.index, stream.role);
        }
        ```
    */
    pub fn open(blob: Vec<u8>, required: RoleSet) -> Result<Self> {
        let input = MemoryInput::open(blob)?;

        let mut streams: Vec<StreamInfo> = input
            .input()
            .streams()
            .map(|stream| {
                let parameters = stream.parameters();
                let codec_id = codec_id_from_ffmpeg(parameters.id());

                // Create a decoder context to get dimensions and format
                let video = ffmpeg_next::codec::context::Context::from_parameters(parameters)
                    .ok()
                    .and_then(|ctx| ctx.decoder().video().ok());
                let (pixel_format, width, height) = match &video {
                    Some(v) => (pixel_format_from_ffmpeg(v.format()), v.width(), v.height()),
                    None => (PixelFormat::Other, 0, 0),
                };

                StreamInfo {
                    index: stream.index(),
                    codec_id,
                    pixel_format,
                    width,
                    height,
                    time_base: rational_from_ffmpeg(stream.time_base()),
                    role: None,
                }
            })
            .collect();

        assign_roles(&mut streams, required);
        validate_roles(&streams, required)?;

        let mut roles = vec![None; streams.len()];
        let mut configs = Vec::new();
        for stream in input.input().streams() {
            let info = &streams[stream.index()];
            let Some(role) = info.role else {
                continue;
            };
            roles[stream.index()] = Some(role);
            configs.push(CodecConfig::new(
                stream.parameters().clone(),
                role,
                info.time_base,
            ));
        }

        tracing::debug!(
            streams = streams.len(),
            roles = %required,
            "opened in-memory container"
        );

        Ok(Self {
            input,
            streams,
            roles,
            configs,
        })
    }

    /**
        Codec configuration for the stream carrying `role`, if present.
    */
    pub fn codec_config(&self, role: StreamRole) -> Option<&CodecConfig> {
        self.configs.iter().find(|c| c.role() == role)
    }

    pub fn codec_configs(&self) -> &[CodecConfig] {
        &self.configs
    }

    /**
        Dimensions of the color stream as reported by the container.
    */
    pub fn dimensions(&self) -> (u32, u32) {
        self.streams
            .iter()
            .find(|s| s.role == Some(StreamRole::Color))
            .map(|s| (s.width, s.height))
            .unwrap_or((0, 0))
    }
}

impl Demuxer for WebmDemuxer {
    fn streams(&self) -> &[StreamInfo] {
        &self.streams
    }

    fn read_packet(&mut self) -> Result<Option<Packet>> {
        let Some((stream, ffmpeg_packet)) = self.input.input_mut().packets().next() else {
            return Ok(None);
        };

        let stream_index = stream.index();
        let role = self.roles.get(stream_index).copied().flatten();
        let time_base = self
            .streams
            .get(stream_index)
            .map(|s| s.time_base)
            .unwrap_or(Rational::MICROS);

        let data = ffmpeg_packet.data().map(|d| d.to_vec()).unwrap_or_default();

        let mut packet = Packet::new(data, stream_index, role);
        packet.pts = pts_from_ffmpeg(ffmpeg_packet.pts());
        packet.dts = pts_from_ffmpeg(ffmpeg_packet.dts());
        packet.duration = MediaDuration(ffmpeg_packet.duration());
        packet.time_base = time_base;
        packet.is_keyframe = ffmpeg_packet.is_key();

        Ok(Some(packet))
    }

    fn seek_to_start(&mut self) -> Result<()> {
        self.input
            .input_mut()
            .seek(0, ..0)
            .map_err(|e| Error::codec(format!("seek failed: {}", e)))
    }
}
