/*!
    The writer thread: decodes frames into the ring ahead of the consumer.
*/

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use media_decode::FrameSource;
use media_types::RoleSet;

use crate::error::Result;

use super::loader::PlaybackControls;
use super::ring::{Producer, Publish};
use super::source::SourceFactory;

const PROTOCOL_VIOLATION_BACKOFF: Duration = Duration::from_millis(1);

/**
    Everything the writer thread needs, moved onto it at spawn.
*/
pub(crate) struct WriterContext {
    pub producer: Producer,
    pub factory: Arc<dyn SourceFactory>,
    pub controls: PlaybackControls,
    pub running: Arc<AtomicBool>,
    pub target_fill: usize,
    pub wait_timeout: Duration,
    /// Frame size from the manifest, `(0, 0)` to use the source's.
    pub frame_size: (u32, u32),
    pub roles: RoleSet,
}

/**
    Start the writer thread. The thread hands the producer back when it
    exits so a later start can reuse the ring.
*/
pub(crate) fn spawn(context: WriterContext) -> std::io::Result<JoinHandle<Producer>> {
    thread::Builder::new()
        .name("volplayer-writer".into())
        .spawn(move || run(context))
}

fn run(context: WriterContext) -> Producer {
    let WriterContext {
        producer,
        factory,
        controls,
        running,
        target_fill,
        wait_timeout,
        frame_size,
        roles,
    } = context;

    let mut writer = Writer {
        producer,
        controls,
        running: Arc::clone(&running),
        target_fill,
        wait_timeout,
        published_since_restart: true,
        frames_published: 0,
        loops: 0,
    };

    tracing::info!("writer started");
    // a frame being filled when the source panics is never marked ready
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        writer.run(factory.as_ref(), frame_size, roles)
    }));
    match outcome {
        Ok(Ok(())) => tracing::info!(
            frames = writer.frames_published,
            loops = writer.loops,
            "writer stopped"
        ),
        Ok(Err(e)) => tracing::error!(
            error = %e,
            frames = writer.frames_published,
            "writer failed"
        ),
        Err(payload) => tracing::error!(
            panic = panic_message(payload.as_ref()),
            frames = writer.frames_published,
            "writer panicked"
        ),
    }

    running.store(false, Ordering::Release);
    writer.producer
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown")
}

enum Flow {
    Continue,
    Stop,
}

struct Writer {
    producer: Producer,
    controls: PlaybackControls,
    running: Arc<AtomicBool>,
    target_fill: usize,
    wait_timeout: Duration,
    /// Cleared on every restart; a restart with nothing published since the
    /// last one means the stream yields no frames at all.
    published_since_restart: bool,
    frames_published: u64,
    loops: u64,
}

impl Writer {
    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn run(
        &mut self,
        factory: &dyn SourceFactory,
        frame_size: (u32, u32),
        roles: RoleSet,
    ) -> Result<()> {
        let mut source = factory.open()?;

        let (width, height) = match frame_size {
            (0, _) | (_, 0) => source.dimensions(),
            size => size,
        };
        self.producer.preallocate(width, height, roles);
        tracing::debug!(width, height, %roles, "preallocated frame pool");

        while self.is_running() {
            if !self.producer.wait_for_space(self.wait_timeout) {
                continue;
            }
            let batch = self.producer.free_slots().min(self.target_fill);
            for _ in 0..batch {
                if !self.is_running() {
                    break;
                }
                if let Flow::Stop = self.step(source.as_mut())? {
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    /**
        Decode and publish one frame.
    */
    fn step(&mut self, source: &mut dyn FrameSource) -> Result<Flow> {
        let outcome = self
            .producer
            .publish_with(|frame| source.decode_next_frame(frame));

        match outcome {
            Ok(Publish::Published) => {
                self.published_since_restart = true;
                self.frames_published += 1;
                Ok(Flow::Continue)
            }
            Ok(Publish::EndOfStream) => self.restart(source),
            Ok(Publish::Full) => Ok(Flow::Continue),
            Ok(Publish::SlotBusy) => {
                tracing::error!("write slot is still marked ready, not overwriting");
                thread::sleep(PROTOCOL_VIOLATION_BACKOFF);
                Ok(Flow::Continue)
            }
            Err(e) if e.is_recoverable() => {
                tracing::warn!(error = %e, "restarting stream");
                self.restart(source)
            }
            Err(e) => Err(e.into()),
        }
    }

    /**
        Handle the end of the stream: seek back to the start when looping,
        stop otherwise.
    */
    fn restart(&mut self, source: &mut dyn FrameSource) -> Result<Flow> {
        if !self.controls.is_looping() {
            tracing::info!("end of stream");
            return Ok(Flow::Stop);
        }
        if !self.published_since_restart {
            tracing::warn!("no frames decoded since the last restart, stopping");
            return Ok(Flow::Stop);
        }

        source.seek_to_start()?;
        self.published_since_restart = false;
        self.loops += 1;
        tracing::debug!(loops = self.loops, "looping to start");
        Ok(Flow::Continue)
    }
}
