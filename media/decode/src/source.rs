use media_types::{Result, VideoFrame};

/**
    Produces complete logical frames for the playback writer.

    Frames are decoded in place into caller-owned storage so the writer can
    target a pool slot directly.
*/
pub trait FrameSource: Send {
    /**
        Decode the next logical frame into `frame`.

        Returns `Ok(false)` at end of stream.
    */
    fn decode_next_frame(&mut self, frame: &mut VideoFrame) -> Result<bool>;

    /**
        Rewind to the first frame.
    */
    fn seek_to_start(&mut self) -> Result<()>;

    /**
        Luma dimensions as known before decoding, `(0, 0)` if unknown.
    */
    fn dimensions(&self) -> (u32, u32) {
        (0, 0)
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn decode_next_frame(&mut self, frame: &mut VideoFrame) -> Result<bool> {
        (**self).decode_next_frame(frame)
    }

    fn seek_to_start(&mut self) -> Result<()> {
        (**self).seek_to_start()
    }

    fn dimensions(&self) -> (u32, u32) {
        (**self).dimensions()
    }
}
