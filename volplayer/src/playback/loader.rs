/*!
    The consumer-facing frame loader.
*/

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};
use std::thread::JoinHandle;

use parking_lot::Mutex;

use media_types::VideoFrame;

use crate::config::PlayerConfig;
use crate::error::{Error, Result};
use crate::fetch::{BlobFetcher, NetworkContext};
use crate::manifest::{DEFAULT_DEPTH_SCALE_FACTOR, DEFAULT_FPS, Manifest};

use super::clock::{Clock, FramePacer, WallClock};
use super::ring::{Consumer, Producer, RingBuffer, WriterWaker};
use super::source::{SourceFactory, WebmSourceFactory};
use super::writer::{self, WriterContext};

struct ControlState {
    fps: AtomicI32,
    /// `f32` bits.
    depth_scale_factor: AtomicU32,
    looping: AtomicBool,
    pacer: Mutex<FramePacer>,
    clock: Arc<dyn Clock>,
}

/**
    Cloneable handle to the runtime-adjustable playback settings.

    Changes take effect on the next paced tick; the writer reads the
    looping flag each time it reaches the end of the stream.
*/
#[derive(Clone)]
pub struct PlaybackControls {
    inner: Arc<ControlState>,
}

impl PlaybackControls {
    fn new(clock: Arc<dyn Clock>, fps: i32, depth_scale_factor: f32, looping: bool) -> Self {
        let now = clock.now();
        Self {
            inner: Arc::new(ControlState {
                fps: AtomicI32::new(fps),
                depth_scale_factor: AtomicU32::new(depth_scale_factor.to_bits()),
                looping: AtomicBool::new(looping),
                pacer: Mutex::new(FramePacer::new(now)),
                clock,
            }),
        }
    }

    pub fn fps(&self) -> i32 {
        self.inner.fps.load(Ordering::Relaxed)
    }

    /**
        Change the playback rate and restart the schedule from now, so the
        next ready frame is shown immediately.
    */
    pub fn set_fps(&self, fps: i32) {
        self.inner.fps.store(fps, Ordering::Relaxed);
        self.restart_schedule();
    }

    pub fn depth_scale_factor(&self) -> f32 {
        f32::from_bits(self.inner.depth_scale_factor.load(Ordering::Relaxed))
    }

    pub fn set_depth_scale_factor(&self, factor: f32) {
        self.inner
            .depth_scale_factor
            .store(factor.to_bits(), Ordering::Relaxed);
    }

    pub fn is_looping(&self) -> bool {
        self.inner.looping.load(Ordering::Relaxed)
    }

    pub fn set_looping(&self, looping: bool) {
        self.inner.looping.store(looping, Ordering::Relaxed);
    }

    pub fn next_presentation_time(&self) -> f64 {
        self.inner.pacer.lock().next_presentation_time()
    }

    fn restart_schedule(&self) {
        let now = self.inner.clock.now();
        self.inner.pacer.lock().reset(now);
    }

    fn tick(&self, now: f64) -> bool {
        let fps = self.fps();
        self.inner.pacer.lock().tick(now, fps)
    }
}

impl std::fmt::Debug for PlaybackControls {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackControls")
            .field("fps", &self.fps())
            .field("depth_scale_factor", &self.depth_scale_factor())
            .field("looping", &self.is_looping())
            .finish_non_exhaustive()
    }
}

/**
    Streams frames of one volumetric asset to a renderer.

    The loader fetches the manifest, runs a background writer that downloads
    and decodes the media into a ring of frames, and paces frames out to the
    caller. [`swap_next_frame`](Self::swap_next_frame) never blocks on I/O
    and is meant to be called once per rendered frame.
*/
pub struct FrameLoader {
    config: PlayerConfig,
    fetcher: BlobFetcher,
    manifest: Manifest,
    controls: PlaybackControls,
    clock: Arc<dyn Clock>,
    consumer: Consumer,
    /// Present while no writer thread holds it.
    producer: Option<Producer>,
    waker: WriterWaker,
    writer: Option<JoinHandle<Producer>>,
    running: Arc<AtomicBool>,
    source_factory: Option<Arc<dyn SourceFactory>>,
}

impl FrameLoader {
    pub fn new(config: PlayerConfig, network: &NetworkContext) -> Result<Self> {
        config.validate()?;

        let clock: Arc<dyn Clock> = Arc::new(WallClock::new());
        let (producer, consumer) = RingBuffer::new(config.ring_capacity);
        let waker = producer.waker();

        Ok(Self {
            fetcher: BlobFetcher::new(network.clone(), config.base_url.clone()),
            manifest: Manifest::default(),
            controls: PlaybackControls::new(
                Arc::clone(&clock),
                DEFAULT_FPS,
                DEFAULT_DEPTH_SCALE_FACTOR,
                config.looping,
            ),
            clock,
            consumer,
            producer: Some(producer),
            waker,
            writer: None,
            running: Arc::new(AtomicBool::new(false)),
            source_factory: None,
            config,
        })
    }

    /**
        Replace the time source used by [`now_seconds`](Self::now_seconds)
        and by [`set_fps`](Self::set_fps) to restart the schedule.

        Settings already applied carry over; the schedule restarts at the
        new clock's current time. Handles from [`controls`](Self::controls)
        taken before this call no longer affect the loader.
    */
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.controls = PlaybackControls::new(
            Arc::clone(&clock),
            self.controls.fps(),
            self.controls.depth_scale_factor(),
            self.controls.is_looping(),
        );
        self.clock = clock;
        self
    }

    /**
        Decode from a custom source instead of the manifest's WebM file.
    */
    pub fn with_source_factory(mut self, factory: Arc<dyn SourceFactory>) -> Self {
        self.source_factory = Some(factory);
        self
    }

    /**
        Fetch and apply the manifest.
    */
    #[tracing::instrument(skip(self), fields(base_url = %self.fetcher.base_url()))]
    pub fn load_manifest(&mut self) -> Result<()> {
        let text = self.fetcher.fetch_manifest()?;
        let manifest = Manifest::parse(&text)?;
        self.apply_manifest(manifest);
        Ok(())
    }

    /**
        Apply an already parsed manifest and restart the schedule so the
        first ready frame is shown immediately.
    */
    pub fn apply_manifest(&mut self, manifest: Manifest) {
        tracing::info!(
            file = manifest.file.as_deref().unwrap_or("<none>"),
            width = manifest.width,
            height = manifest.height,
            fps = manifest.fps,
            depth_scale_factor = manifest.depth_scale_factor,
            "manifest loaded"
        );
        self.controls
            .inner
            .fps
            .store(manifest.fps, Ordering::Relaxed);
        self.controls
            .set_depth_scale_factor(manifest.depth_scale_factor);
        self.controls.restart_schedule();
        self.manifest = manifest;
    }

    /**
        Start the writer thread. Does nothing if it is already running.

        A writer that stopped on its own (end of stream without looping, or
        an error) is reaped first, so this also restarts playback.
    */
    pub fn start_background_writer(&mut self) -> Result<()> {
        if self.is_writer_running() {
            return Ok(());
        }
        self.join_writer();

        let producer = self.producer.take().ok_or(Error::WriterUnavailable)?;
        let factory = match &self.source_factory {
            Some(factory) => Arc::clone(factory),
            None => Arc::new(WebmSourceFactory::new(
                self.fetcher.clone(),
                self.manifest.file.clone(),
                self.config.sync_config(),
            )),
        };

        self.running.store(true, Ordering::Release);
        let context = WriterContext {
            producer,
            factory,
            controls: self.controls.clone(),
            running: Arc::clone(&self.running),
            target_fill: self.config.target_fill(),
            wait_timeout: self.config.writer_wait_timeout(),
            frame_size: (self.manifest.width, self.manifest.height),
            roles: self.config.sync_config().roles,
        };
        match writer::spawn(context) {
            Ok(handle) => {
                self.writer = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::Release);
                Err(e.into())
            }
        }
    }

    /**
        Stop the writer thread and wait for it. Does nothing if no writer
        is running. Frames already published stay available.
    */
    pub fn stop_background_writer(&mut self) {
        self.running.store(false, Ordering::Release);
        self.waker.wake();
        self.join_writer();
    }

    fn join_writer(&mut self) {
        let Some(handle) = self.writer.take() else {
            return;
        };
        match handle.join() {
            Ok(producer) => self.producer = Some(producer),
            Err(_) => {
                self.running.store(false, Ordering::Release);
                tracing::error!("writer thread panicked, ring is lost");
            }
        }
    }

    /**
        Returns the next frame if one is due at `now` and ready.

        Advances the schedule whenever a frame is due, even if the writer
        has not produced one yet. The returned frame stays valid until the
        next call that returns a frame.
    */
    pub fn swap_next_frame(&mut self, now: f64) -> Option<&VideoFrame> {
        if !self.controls.tick(now) {
            return None;
        }
        self.consumer.try_take()
    }

    /**
        The frame most recently returned by
        [`swap_next_frame`](Self::swap_next_frame).
    */
    pub fn current_frame(&self) -> Option<&VideoFrame> {
        self.consumer.current()
    }

    /// Frames decoded and waiting to be shown.
    pub fn buffered_frames(&self) -> usize {
        self.consumer.buffered()
    }

    pub fn controls(&self) -> PlaybackControls {
        self.controls.clone()
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn set_fps(&self, fps: i32) {
        self.controls.set_fps(fps);
    }

    pub fn fps(&self) -> i32 {
        self.controls.fps()
    }

    pub fn set_depth_scale_factor(&self, factor: f32) {
        self.controls.set_depth_scale_factor(factor);
    }

    pub fn depth_scale_factor(&self) -> f32 {
        self.controls.depth_scale_factor()
    }

    pub fn set_looping(&self, looping: bool) {
        self.controls.set_looping(looping);
    }

    pub fn width(&self) -> u32 {
        self.manifest.width
    }

    pub fn height(&self) -> u32 {
        self.manifest.height
    }

    pub fn is_writer_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn now_seconds(&self) -> f64 {
        self.clock.now()
    }
}

impl Drop for FrameLoader {
    fn drop(&mut self) {
        self.stop_background_writer();
    }
}

#[cfg(test)]
mod tests {
    use crate::config::HttpConfig;
    use crate::playback::clock::ManualClock;

    use super::*;

    fn loader(clock: Arc<ManualClock>) -> FrameLoader {
        let network = NetworkContext::new(&HttpConfig::default()).unwrap();
        FrameLoader::new(PlayerConfig::default(), &network)
            .unwrap()
            .with_clock(clock)
    }

    #[test]
    fn manifest_sets_rate_and_restarts_schedule() {
        let clock = Arc::new(ManualClock::new(3.0));
        let mut loader = loader(Arc::clone(&clock));
        assert_eq!(loader.fps(), 16);

        clock.set(7.5);
        loader.apply_manifest(Manifest {
            file: Some("a.webm".into()),
            width: 640,
            height: 360,
            fps: 24,
            depth_scale_factor: 0.5,
        });

        assert_eq!(loader.fps(), 24);
        assert_eq!(loader.depth_scale_factor(), 0.5);
        assert_eq!((loader.width(), loader.height()), (640, 360));
        assert_eq!(loader.controls().next_presentation_time(), 7.5);
    }

    #[test]
    fn set_fps_restarts_schedule_at_clock_time() {
        let clock = Arc::new(ManualClock::new(0.0));
        let mut loader = loader(Arc::clone(&clock));

        assert!(loader.swap_next_frame(0.0).is_none());
        assert_eq!(loader.controls().next_presentation_time(), 0.0625);

        clock.set(0.5);
        loader.set_fps(4);
        assert_eq!(loader.controls().next_presentation_time(), 0.5);
        assert!(loader.swap_next_frame(0.5).is_none());
        assert_eq!(loader.controls().next_presentation_time(), 0.75);
    }

    #[test]
    fn replacing_the_clock_keeps_applied_settings() {
        let network = NetworkContext::new(&HttpConfig::default()).unwrap();
        let mut loader = FrameLoader::new(PlayerConfig::default(), &network).unwrap();
        loader.apply_manifest(Manifest {
            fps: 30,
            depth_scale_factor: 0.25,
            ..Manifest::default()
        });
        loader.set_looping(false);

        let loader = loader.with_clock(Arc::new(ManualClock::new(4.0)));
        assert_eq!(loader.fps(), 30);
        assert_eq!(loader.depth_scale_factor(), 0.25);
        assert!(!loader.controls().is_looping());
        assert_eq!(loader.controls().next_presentation_time(), 4.0);
    }

    #[test]
    fn controls_are_shared_between_handles() {
        let loader = loader(Arc::new(ManualClock::new(0.0)));
        let controls = loader.controls();
        controls.set_depth_scale_factor(2.0);
        controls.set_looping(false);
        assert_eq!(loader.depth_scale_factor(), 2.0);
        assert!(!loader.controls().is_looping());
    }

    #[test]
    fn start_without_manifest_file_stops_writer() {
        let mut loader = loader(Arc::new(ManualClock::new(0.0)));
        loader.start_background_writer().unwrap();
        // the writer fails to open its source and clears the running flag
        for _ in 0..500 {
            if !loader.is_writer_running() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        assert!(!loader.is_writer_running());
        loader.stop_background_writer();
        // the ring is handed back, so the writer can start again
        loader.start_background_writer().unwrap();
        loader.stop_background_writer();
    }
}
