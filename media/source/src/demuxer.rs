use media_types::{Packet, Result, StreamInfo};

/**
    A source of role-tagged compressed packets.

    Implementations read packets in container order, interleaved across
    streams. Only streams with an assigned role need to be tagged; packets
    from other streams may carry `role: None` and are skipped downstream.
*/
pub trait Demuxer: Send {
    /**
        Streams found in the container, with their assigned roles.
    */
    fn streams(&self) -> &[StreamInfo];

    /**
        Read the next packet.

        Returns `Ok(None)` once the container is exhausted.
    */
    fn read_packet(&mut self) -> Result<Option<Packet>>;

    /**
        Reposition every stream at timestamp zero.

        Decoders fed by this demuxer must be flushed afterwards.
    */
    fn seek_to_start(&mut self) -> Result<()>;
}

impl<D: Demuxer + ?Sized> Demuxer for Box<D> {
    fn streams(&self) -> &[StreamInfo] {
        (**self).streams()
    }

    fn read_packet(&mut self) -> Result<Option<Packet>> {
        (**self).read_packet()
    }

    fn seek_to_start(&mut self) -> Result<()> {
        (**self).seek_to_start()
    }
}
