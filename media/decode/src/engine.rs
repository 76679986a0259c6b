use media_types::{Packet, Result, StreamRole, VideoFrame};

/**
    One codec instance decoding a single role's stream.

    Engines follow the send/receive model: packets go in with
    [`send_packet`](Self::send_packet), decoded images come out with
    [`receive_into`](Self::receive_into), which writes only the planes that
    belong to the engine's role.
*/
pub trait DecodeEngine: Send {
    fn role(&self) -> StreamRole;

    /**
        Submit one compressed packet.

        An engine whose codec is not ready for more input keeps the packet
        queued and submits it after the next successful receive.
    */
    fn send_packet(&mut self, packet: &Packet) -> Result<()>;

    /**
        Pull one decoded image into this role's planes of `frame`.

        Returns `Ok(false)` when the codec needs more input or is fully
        drained after end of stream.
    */
    fn receive_into(&mut self, frame: &mut VideoFrame) -> Result<bool>;

    /**
        Signal end of stream so buffered images can be drained.
    */
    fn send_eof(&mut self) -> Result<()> {
        Ok(())
    }

    /**
        Drop buffered images, queued packets and end-of-stream state.
    */
    fn flush(&mut self);
}

impl<E: DecodeEngine + ?Sized> DecodeEngine for Box<E> {
    fn role(&self) -> StreamRole {
        (**self).role()
    }

    fn send_packet(&mut self, packet: &Packet) -> Result<()> {
        (**self).send_packet(packet)
    }

    fn receive_into(&mut self, frame: &mut VideoFrame) -> Result<bool> {
        (**self).receive_into(frame)
    }

    fn send_eof(&mut self) -> Result<()> {
        (**self).send_eof()
    }

    fn flush(&mut self) {
        (**self).flush()
    }
}
