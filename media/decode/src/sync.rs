/*!
    Multi-stream frame assembly.

    Color, alpha and depth are coded as separate streams whose packets are
    interleaved in the container, and each codec may hold images back for a
    few packets. A logical frame is complete once every configured role has
    produced exactly one image in the current cycle.
*/

use media_source::Demuxer;
use media_types::{Error, Result, RoleSet, StreamRole, VideoFrame};

use crate::engine::DecodeEngine;
use crate::source::FrameSource;

/// Default bound on packets routed for one logical frame.
pub const DEFAULT_MAX_PACKETS_PER_FRAME: usize = 256;

/**
    Configuration for [`MultiStreamDecoder`].
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncConfig {
    /// Roles that must produce an image to complete a frame.
    pub roles: RoleSet,
    /// Packets routed without completing a frame before reporting desync.
    pub max_packets_per_frame: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            roles: RoleSet::ALL,
            max_packets_per_frame: DEFAULT_MAX_PACKETS_PER_FRAME,
        }
    }
}

/**
    Assembles logical frames from a demuxer and one engine per role.

    # Example

    ```ignore
    let mut decoder = MultiStreamDecoder::new(demuxer, engines, SyncConfig::default())?;
    let mut frame = VideoFrame::new();
    while decoder.decode_next_frame(&mut frame)? {
        println!("frame at {} us", frame.ts_us);
    }
    ```
*/
pub struct MultiStreamDecoder<D> {
    demuxer: D,
    /// Engines indexed by [`StreamRole::index`].
    engines: [Option<Box<dyn DecodeEngine>>; 3],
    config: SyncConfig,
    eof_sent: bool,
    frames_decoded: u64,
}

impl<D: Demuxer> MultiStreamDecoder<D> {
    /**
        Create a decoder over `demuxer`.

        Fails if two engines claim the same role or a required role has no
        engine. Engines for roles outside `config.roles` are dropped.
    */
    pub fn new(
        demuxer: D,
        engines: Vec<Box<dyn DecodeEngine>>,
        config: SyncConfig,
    ) -> Result<Self> {
        if config.roles.is_empty() {
            return Err(Error::invalid_data("no stream roles configured"));
        }

        let mut slots: [Option<Box<dyn DecodeEngine>>; 3] = [None, None, None];
        for engine in engines {
            let role = engine.role();
            if !config.roles.contains(role) {
                continue;
            }
            let slot = &mut slots[role.index()];
            if slot.is_some() {
                return Err(Error::invalid_data(format!("two engines for the {role} stream")));
            }
            *slot = Some(engine);
        }

        let present: RoleSet = StreamRole::ALL
            .into_iter()
            .filter(|role| slots[role.index()].is_some())
            .collect();
        let missing = config.roles.difference(present);
        if !missing.is_empty() {
            return Err(Error::MissingStreams(missing));
        }

        Ok(Self {
            demuxer,
            engines: slots,
            config,
            eof_sent: false,
            frames_decoded: 0,
        })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn demuxer(&self) -> &D {
        &self.demuxer
    }

    /// Logical frames produced since the decoder was created.
    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded
    }

    /**
        Decode the next logical frame into `frame`.

        Returns `Ok(false)` once the container is exhausted and every engine
        has been drained. Roles that produced an image in a cycle that
        could not complete are discarded with it.
    */
    pub fn decode_next_frame(&mut self, frame: &mut VideoFrame) -> Result<bool> {
        let mut satisfied = RoleSet::EMPTY;
        let mut routed = 0usize;

        loop {
            self.drain(frame, &mut satisfied)?;
            if satisfied.is_superset_of(self.config.roles) {
                frame.sequence = self.frames_decoded;
                self.frames_decoded += 1;
                return Ok(true);
            }
            if self.eof_sent {
                if !satisfied.is_empty() {
                    tracing::debug!(
                        missing = %self.config.roles.difference(satisfied),
                        "dropping incomplete frame at end of stream"
                    );
                }
                return Ok(false);
            }
            if routed >= self.config.max_packets_per_frame {
                return Err(Error::Desync {
                    packets: routed,
                    missing: self.config.roles.difference(satisfied),
                });
            }

            match self.demuxer.read_packet()? {
                Some(packet) => {
                    let Some(role) = packet.role else {
                        continue;
                    };
                    let Some(engine) = self.engines[role.index()].as_mut() else {
                        continue;
                    };
                    engine.send_packet(&packet)?;
                    routed += 1;
                }
                None => {
                    for engine in self.engines.iter_mut().flatten() {
                        engine.send_eof()?;
                    }
                    self.eof_sent = true;
                }
            }
        }
    }

    /**
        Rewind the container and reset every engine.
    */
    pub fn seek_to_start(&mut self) -> Result<()> {
        self.demuxer.seek_to_start()?;
        for engine in self.engines.iter_mut().flatten() {
            engine.flush();
        }
        self.eof_sent = false;
        Ok(())
    }

    /**
        Pull at most one image from every engine whose role is still
        unsatisfied this cycle.
    */
    fn drain(&mut self, frame: &mut VideoFrame, satisfied: &mut RoleSet) -> Result<()> {
        for role in self.config.roles.iter() {
            if satisfied.contains(role) {
                continue;
            }
            let Some(engine) = self.engines[role.index()].as_mut() else {
                continue;
            };
            if engine.receive_into(frame)? {
                satisfied.insert(role);
            }
        }
        Ok(())
    }
}

impl<D: Demuxer> FrameSource for MultiStreamDecoder<D> {
    fn decode_next_frame(&mut self, frame: &mut VideoFrame) -> Result<bool> {
        MultiStreamDecoder::decode_next_frame(self, frame)
    }

    fn seek_to_start(&mut self) -> Result<()> {
        MultiStreamDecoder::seek_to_start(self)
    }

    fn dimensions(&self) -> (u32, u32) {
        self.demuxer
            .streams()
            .iter()
            .find(|s| s.role == Some(StreamRole::Color))
            .map(|s| (s.width, s.height))
            .unwrap_or((0, 0))
    }
}
