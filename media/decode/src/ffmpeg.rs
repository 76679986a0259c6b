/*!
    FFmpeg-backed decode engines.
*/

use std::collections::VecDeque;

use ffmpeg_next::{
    codec::{self, decoder::Video as VideoDecoderFFmpeg},
    ffi,
    packet::Mut as PacketMut,
    util::frame::video::Video as VideoFrameFFmpeg,
};

use media_source::CodecConfig;
use media_types::{Error, Packet, PixelFormat, Rational, Result, StreamRole, VideoFrame};

use crate::engine::DecodeEngine;
use crate::planes::{copy_gray8, copy_gray16be, copy_gray16le};

/**
    Decodes one role's stream with libavcodec.

    Color uses `libdav1d` when FFmpeg was built with it and falls back to
    the native AV1 decoder. Alpha and depth use the FFV1 and PNG decoders.
*/
pub struct FfmpegEngine {
    role: StreamRole,
    decoder: VideoDecoderFFmpeg,
    time_base: Rational,
    /// Packets the codec refused with EAGAIN, oldest first.
    pending: VecDeque<ffmpeg_next::Packet>,
    /// End of stream requested while packets were still pending.
    eof_pending: bool,
    decoded: VideoFrameFFmpeg,
}

// SAFETY: the codec context and frame are only touched through &mut self.
unsafe impl Send for FfmpegEngine {}

impl FfmpegEngine {
    /**
        Open a decoder for the stream described by `config`.
    */
    pub fn open(config: &CodecConfig) -> Result<Self> {
        ffmpeg_next::init().map_err(|e| Error::codec(e.to_string()))?;

        let role = config.role();
        let codec = find_decoder(role).ok_or_else(|| {
            Error::unsupported(format!("no decoder available for the {role} stream"))
        })?;
        let codec_name = codec.name().to_owned();

        let decoder_ctx = codec::context::Context::from_parameters(config.parameters().clone())
            .map_err(|e| Error::codec(e.to_string()))?;

        let decoder = decoder_ctx
            .decoder()
            .open_as(codec)
            .and_then(|opened| opened.video())
            .map_err(|e| Error::codec(format!("failed to open {role} decoder: {e}")))?;

        tracing::debug!(%role, codec = %codec_name, "opened decoder");

        Ok(Self {
            role,
            decoder,
            time_base: config.time_base(),
            pending: VecDeque::new(),
            eof_pending: false,
            decoded: VideoFrameFFmpeg::empty(),
        })
    }

    /**
        Submit queued packets in order until the codec pushes back.

        Returns true if at least one packet was accepted.
    */
    fn resubmit_pending(&mut self) -> Result<bool> {
        let mut submitted = false;
        while let Some(packet) = self.pending.front() {
            match self.decoder.send_packet(packet) {
                Ok(()) => {
                    self.pending.pop_front();
                    submitted = true;
                }
                Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => break,
                Err(e) => return Err(Error::codec(e.to_string())),
            }
        }
        if self.pending.is_empty() && self.eof_pending {
            self.eof_pending = false;
            self.submit_eof()?;
        }
        Ok(submitted)
    }

    fn submit_eof(&mut self) -> Result<()> {
        match self.decoder.send_eof() {
            Ok(()) | Err(ffmpeg_next::Error::Eof) => Ok(()),
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => {
                self.eof_pending = true;
                Ok(())
            }
            Err(e) => Err(Error::codec(e.to_string())),
        }
    }

    /**
        Copy the last decoded picture into this role's planes.
    */
    fn copy_decoded(&self, frame: &mut VideoFrame) -> Result<()> {
        let picture = &self.decoded;
        let (width, height) = (picture.width(), picture.height());
        if width == 0 || height == 0 {
            return Err(Error::invalid_data("frame has zero dimensions"));
        }
        let format = pixel_format_from_ffmpeg(picture.format());

        match self.role {
            StreamRole::Color => {
                let layout = format.chroma_layout().ok_or_else(|| {
                    Error::unsupported_format(format!(
                        "color picture uses {:?}, only 8-bit 4:2:0, 4:2:2 and 4:4:4 are supported",
                        picture.format()
                    ))
                })?;
                let (chroma_width, chroma_height) = layout.chroma_size(width, height);

                frame
                    .y
                    .copy_from_strided(picture.data(0), picture.stride(0), width, height)?;
                frame.u.copy_from_strided(
                    picture.data(1),
                    picture.stride(1),
                    chroma_width,
                    chroma_height,
                )?;
                frame.v.copy_from_strided(
                    picture.data(2),
                    picture.stride(2),
                    chroma_width,
                    chroma_height,
                )?;

                let pts = picture.timestamp().or_else(|| picture.pts()).unwrap_or(0);
                frame.ts_us = self.time_base.rescale_to_micros(pts);
            }
            StreamRole::Alpha => {
                if format != PixelFormat::Gray8 {
                    return Err(Error::unsupported_format(format!(
                        "alpha picture uses {:?}, expected gray8",
                        picture.format()
                    )));
                }
                copy_gray8(
                    &mut frame.alpha,
                    picture.data(0),
                    picture.stride(0),
                    width,
                    height,
                )?;
            }
            StreamRole::Depth => match format {
                PixelFormat::Gray16Be => copy_gray16be(
                    &mut frame.depth,
                    picture.data(0),
                    picture.stride(0),
                    width,
                    height,
                )?,
                PixelFormat::Gray16Le => copy_gray16le(
                    &mut frame.depth,
                    picture.data(0),
                    picture.stride(0),
                    width,
                    height,
                )?,
                _ => {
                    return Err(Error::unsupported_format(format!(
                        "depth picture uses {:?}, expected gray16be",
                        picture.format()
                    )));
                }
            },
        }
        Ok(())
    }
}

impl DecodeEngine for FfmpegEngine {
    fn role(&self) -> StreamRole {
        self.role
    }

    fn send_packet(&mut self, packet: &Packet) -> Result<()> {
        let mut ffmpeg_pkt = ffmpeg_next::Packet::copy(&packet.data);

        // Set timing info
        unsafe {
            let pkt_ptr = ffmpeg_pkt.as_mut_ptr();
            if let Some(pts) = packet.pts {
                (*pkt_ptr).pts = pts.0;
            }
            if let Some(dts) = packet.dts {
                (*pkt_ptr).dts = dts.0;
            }
            (*pkt_ptr).duration = packet.duration.0;
        }

        // Keep submission order: nothing jumps the queue
        if !self.pending.is_empty() {
            self.pending.push_back(ffmpeg_pkt);
            return Ok(());
        }

        match self.decoder.send_packet(&ffmpeg_pkt) {
            Ok(()) => Ok(()),
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => {
                self.pending.push_back(ffmpeg_pkt);
                Ok(())
            }
            Err(e) => Err(Error::codec(e.to_string())),
        }
    }

    fn receive_into(&mut self, frame: &mut VideoFrame) -> Result<bool> {
        loop {
            match self.decoder.receive_frame(&mut self.decoded) {
                Ok(()) => {
                    self.copy_decoded(frame)?;
                    self.resubmit_pending()?;
                    return Ok(true);
                }
                Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => {
                    // Need more input; queued packets may now fit
                    if self.resubmit_pending()? {
                        continue;
                    }
                    return Ok(false);
                }
                Err(ffmpeg_next::Error::Eof) => return Ok(false),
                Err(e) => return Err(Error::codec(e.to_string())),
            }
        }
    }

    fn send_eof(&mut self) -> Result<()> {
        if !self.pending.is_empty() {
            self.eof_pending = true;
            return Ok(());
        }
        self.submit_eof()
    }

    fn flush(&mut self) {
        self.decoder.flush();
        self.pending.clear();
        self.eof_pending = false;
    }
}

impl std::fmt::Debug for FfmpegEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegEngine")
            .field("role", &self.role)
            .field("time_base", &self.time_base)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

fn find_decoder(role: StreamRole) -> Option<ffmpeg_next::Codec> {
    use ffmpeg_next::codec::Id;

    match role {
        StreamRole::Color => ffmpeg_next::decoder::find_by_name("libdav1d")
            .or_else(|| ffmpeg_next::decoder::find(Id::AV1)),
        StreamRole::Alpha => ffmpeg_next::decoder::find(Id::FFV1),
        StreamRole::Depth => ffmpeg_next::decoder::find(Id::PNG),
    }
}

/**
    Convert FFmpeg pixel format to our PixelFormat.
*/
fn pixel_format_from_ffmpeg(format: ffmpeg_next::format::Pixel) -> PixelFormat {
    use ffmpeg_next::format::Pixel;

    match format {
        Pixel::YUV420P | Pixel::YUVJ420P => PixelFormat::Yuv420p,
        Pixel::YUV422P | Pixel::YUVJ422P => PixelFormat::Yuv422p,
        Pixel::YUV444P | Pixel::YUVJ444P => PixelFormat::Yuv444p,
        Pixel::YUV420P10LE | Pixel::YUV420P10BE => PixelFormat::Yuv420p10,
        Pixel::GRAY8 => PixelFormat::Gray8,
        Pixel::GRAY16BE => PixelFormat::Gray16Be,
        Pixel::GRAY16LE => PixelFormat::Gray16Le,
        _ => PixelFormat::Other,
    }
}
