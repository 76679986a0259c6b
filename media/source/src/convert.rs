/*!
    Conversion utilities between ffmpeg-next types and media-types.
*/

use media_types::{CodecId, Error, PixelFormat, Pts, Rational};

pub fn rational_from_ffmpeg(r: ffmpeg_next::Rational) -> Rational {
    Rational::new(r.numerator(), r.denominator())
}

/**
    Convert an ffmpeg-next pixel format to ours.

    Full-range YUVJ variants share the planar layout of their limited-range
    counterparts and map onto the same value.
*/
pub fn pixel_format_from_ffmpeg(format: ffmpeg_next::format::Pixel) -> PixelFormat {
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

pub fn codec_id_from_ffmpeg(id: ffmpeg_next::codec::Id) -> CodecId {
    use ffmpeg_next::codec::Id;

    match id {
        Id::AV1 => CodecId::Av1,
        Id::FFV1 => CodecId::Ffv1,
        Id::PNG => CodecId::Png,
        _ => CodecId::Other,
    }
}

pub fn pts_from_ffmpeg(pts: Option<i64>) -> Option<Pts> {
    pts.map(Pts)
}

pub fn error_from_ffmpeg(error: ffmpeg_next::Error) -> Error {
    Error::codec(error.to_string())
}
