/*!
    Encoded packet type.
*/

use crate::{MediaDuration, Pts, Rational, StreamRole};

/**
    One compressed unit read from the container.

    Packets carry the role of the stream they came from so the decoder can
    route them without looking up stream indices.
*/
#[derive(Clone, Debug)]
pub struct Packet {
    /// Compressed payload.
    pub data: Vec<u8>,
    /// Presentation timestamp, if known.
    pub pts: Option<Pts>,
    /// Decode timestamp, if known.
    pub dts: Option<Pts>,
    /// Duration in time base units.
    pub duration: MediaDuration,
    /// Time base of `pts`, `dts` and `duration`.
    pub time_base: Rational,
    /// Whether this packet starts a keyframe.
    pub is_keyframe: bool,
    /// Index of the source stream in the container.
    pub stream_index: usize,
    /// Role of the source stream, `None` for streams the player ignores.
    pub role: Option<StreamRole>,
}

impl Packet {
    pub fn new(data: Vec<u8>, stream_index: usize, role: Option<StreamRole>) -> Self {
        Self {
            data,
            pts: None,
            dts: None,
            duration: MediaDuration::default(),
            time_base: Rational::MICROS,
            is_keyframe: false,
            stream_index,
            role,
        }
    }

    pub fn with_pts(mut self, pts: i64, time_base: Rational) -> Self {
        self.pts = Some(Pts(pts));
        self.time_base = time_base;
        self
    }

    /**
        Presentation time in microseconds, falling back to the decode
        timestamp when the container did not set one.
    */
    pub fn timestamp_us(&self) -> Option<i64> {
        self.pts
            .or(self.dts)
            .map(|ts| self.time_base.rescale_to_micros(ts.0))
    }
}
