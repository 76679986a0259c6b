use std::convert::Infallible;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use volplayer::playback::{Consumer, Producer, Publish, RingBuffer};
use volplayer::{
    FrameLoader, FrameSource, HttpConfig, ManualClock, NetworkContext, PlayerConfig, RoleSet,
    SourceFactory, StreamRole, VideoFrame,
};

const PERIOD_US: i64 = 62_500;

/// Frames `0..len`, each with its luma filled with the frame index.
struct CountingSource {
    len: u64,
    next: u64,
    desync_at: Option<u64>,
    decoded: Arc<AtomicU64>,
}

impl CountingSource {
    fn new(len: u64) -> Self {
        Self {
            len,
            next: 0,
            desync_at: None,
            decoded: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl FrameSource for CountingSource {
    fn decode_next_frame(&mut self, frame: &mut VideoFrame) -> media_types::Result<bool> {
        if self.desync_at == Some(self.next) {
            return Err(media_types::Error::Desync {
                packets: 256,
                missing: RoleSet::only(StreamRole::Depth),
            });
        }
        if self.next >= self.len {
            return Ok(false);
        }
        fill(frame, self.next);
        self.next += 1;
        self.decoded.fetch_add(1, Ordering::Relaxed);
        Ok(true)
    }

    fn seek_to_start(&mut self) -> media_types::Result<()> {
        self.next = 0;
        Ok(())
    }

    fn dimensions(&self) -> (u32, u32) {
        (4, 4)
    }
}

/// Decodes one frame per permit; ends when the sender is dropped.
struct GatedSource {
    permits: Receiver<()>,
    next: u64,
}

impl FrameSource for GatedSource {
    fn decode_next_frame(&mut self, frame: &mut VideoFrame) -> media_types::Result<bool> {
        if self.permits.recv().is_err() {
            return Ok(false);
        }
        fill(frame, self.next);
        self.next += 1;
        Ok(true)
    }

    fn seek_to_start(&mut self) -> media_types::Result<()> {
        Ok(())
    }
}

struct PanickingSource;

impl FrameSource for PanickingSource {
    fn decode_next_frame(&mut self, _frame: &mut VideoFrame) -> media_types::Result<bool> {
        panic!("decoder crashed");
    }

    fn seek_to_start(&mut self) -> media_types::Result<()> {
        Ok(())
    }
}

fn fill(frame: &mut VideoFrame, index: u64) {
    frame.reserve(4, 4, RoleSet::COLOR);
    frame.y.samples_mut().fill(index as u8);
    frame.ts_us = index as i64 * PERIOD_US;
    frame.sequence = index;
}

fn factory<S, F>(make: F) -> Arc<dyn SourceFactory>
where
    S: FrameSource + 'static,
    F: Fn() -> S + Send + Sync + 'static,
{
    Arc::new(move || -> volplayer::Result<Box<dyn FrameSource>> { Ok(Box::new(make())) })
}

fn gated() -> (Sender<()>, Arc<dyn SourceFactory>) {
    let (tx, rx) = mpsc::channel();
    let permits = Mutex::new(Some(rx));
    let factory = factory(move || GatedSource {
        permits: permits.lock().unwrap().take().expect("gated source opened twice"),
        next: 0,
    });
    (tx, factory)
}

fn loader(config: PlayerConfig, start: f64, source: Arc<dyn SourceFactory>) -> FrameLoader {
    let network = NetworkContext::new(&HttpConfig::default()).unwrap();
    FrameLoader::new(config, &network)
        .unwrap()
        .with_clock(Arc::new(ManualClock::new(start)))
        .with_source_factory(source)
}

fn wait_until(what: &str, mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(1));
    }
}

/// Shows every frame the writer produces until `count` frames were seen.
fn drain_timestamps(loader: &mut FrameLoader, count: usize) -> Vec<i64> {
    let mut seen = Vec::new();
    while seen.len() < count {
        wait_until("a buffered frame", || loader.buffered_frames() > 0);
        let now = loader.controls().next_presentation_time();
        let frame = loader.swap_next_frame(now).expect("due frame was not shown");
        seen.push(frame.ts_us);
    }
    seen
}

#[test]
fn spsc_frames_arrive_intact_and_in_order() {
    const FRAMES: u64 = 5_000;
    let (mut producer, mut consumer) = RingBuffer::new(4);

    let writer = thread::spawn(move || {
        let mut index = 0;
        while index < FRAMES {
            let outcome = producer
                .publish_with(|frame| {
                    fill(frame, index);
                    Ok::<_, Infallible>(true)
                })
                .unwrap();
            match outcome {
                Publish::Published => index += 1,
                Publish::Full => {
                    producer.wait_for_space(Duration::from_millis(5));
                }
                other => panic!("unexpected publish outcome {other:?}"),
            }
        }
    });

    let mut expected = 0;
    while expected < FRAMES {
        match consumer.try_take() {
            Some(frame) => {
                assert_eq!(frame.sequence, expected);
                assert_eq!(frame.ts_us, expected as i64 * PERIOD_US);
                assert!(frame.y.samples().iter().all(|&s| s == expected as u8));
                expected += 1;
            }
            None => thread::yield_now(),
        }
    }
    writer.join().unwrap();
    assert!(consumer.try_take().is_none());
}

#[test]
fn buffered_and_free_slots_account_for_the_whole_ring() {
    let (mut producer, mut consumer) = RingBuffer::new(5);
    let check = |producer: &Producer, consumer: &Consumer| {
        assert_eq!(
            consumer.buffered() + producer.free_slots() + 1,
            consumer.capacity()
        );
    };

    for round in 0..40u64 {
        // publish a varying number of frames, then take a varying number
        for _ in 0..(round % 5) {
            producer
                .publish_with(|frame| {
                    frame.ts_us = round as i64;
                    Ok::<_, Infallible>(true)
                })
                .unwrap();
            check(&producer, &consumer);
        }
        for _ in 0..(round % 3) {
            consumer.try_take();
            check(&producer, &consumer);
        }
    }
}

#[test]
fn writer_fills_the_ring_and_then_waits() {
    let source = CountingSource::new(u64::MAX);
    let decoded = Arc::clone(&source.decoded);
    let source = Mutex::new(Some(source));
    let mut loader = loader(
        PlayerConfig::default(),
        0.0,
        factory(move || source.lock().unwrap().take().unwrap()),
    );

    loader.start_background_writer().unwrap();
    wait_until("a full ring", || loader.buffered_frames() == 7);

    // nothing is consumed, so the writer must not decode ahead of the ring
    thread::sleep(Duration::from_millis(50));
    assert_eq!(loader.buffered_frames(), 7);
    assert_eq!(decoded.load(Ordering::Relaxed), 7);
    assert!(loader.is_writer_running());

    assert!(loader.swap_next_frame(0.0).is_some());
    wait_until("the freed slot to be refilled", || {
        decoded.load(Ordering::Relaxed) == 8
    });
    wait_until("a full ring again", || loader.buffered_frames() == 7);

    loader.stop_background_writer();
    assert!(!loader.is_writer_running());
}

#[test]
fn frames_are_paced_at_the_manifest_rate() {
    let t0 = 10.0;
    let period = 1.0 / 16.0;
    let (sender, source) = gated();
    let mut loader = loader(PlayerConfig::default(), t0, source);
    // dropped before the loader, which unblocks the writer on early exit
    let permits = sender;
    loader.start_background_writer().unwrap();

    // due, but nothing decoded yet; the schedule still moves on
    assert!(loader.swap_next_frame(t0).is_none());

    permits.send(()).unwrap();
    wait_until("the first frame", || loader.buffered_frames() == 1);
    let frame = loader.swap_next_frame(t0 + period).unwrap();
    assert_eq!(frame.ts_us, 0);

    permits.send(()).unwrap();
    wait_until("the second frame", || loader.buffered_frames() == 1);
    // ready, but not due yet
    assert!(loader.swap_next_frame(t0 + period + period / 2.0).is_none());
    assert_eq!(loader.current_frame().map(|f| f.ts_us), Some(0));

    let frame = loader.swap_next_frame(t0 + 2.0 * period).unwrap();
    assert_eq!(frame.ts_us, PERIOD_US);

    drop(permits);
    loader.stop_background_writer();
}

#[test]
fn set_fps_restarts_the_schedule() {
    let clock = Arc::new(ManualClock::new(0.0));
    let network = NetworkContext::new(&HttpConfig::default()).unwrap();
    let loader = FrameLoader::new(PlayerConfig::default(), &network)
        .unwrap()
        .with_clock(clock.clone());
    let controls = loader.controls();

    clock.set(3.25);
    loader.set_fps(8);
    assert_eq!(loader.fps(), 8);
    assert_eq!(controls.next_presentation_time(), 3.25);

    loader.set_fps(0);
    assert_eq!(loader.fps(), 0);
}

#[test]
fn looping_replays_from_the_first_frame() {
    let mut loader = loader(
        PlayerConfig::default(),
        0.0,
        factory(|| CountingSource::new(3)),
    );
    loader.start_background_writer().unwrap();

    let seen = drain_timestamps(&mut loader, 7);
    assert_eq!(seen, [0, 1, 2, 0, 1, 2, 0].map(|i| i * PERIOD_US));
    assert!(loader.is_writer_running());
}

#[test]
fn writer_stops_at_end_of_stream_without_looping() {
    let config = PlayerConfig {
        looping: false,
        ..PlayerConfig::default()
    };
    let mut loader = loader(config, 0.0, factory(|| CountingSource::new(3)));
    loader.start_background_writer().unwrap();

    wait_until("the writer to stop", || !loader.is_writer_running());
    assert_eq!(loader.buffered_frames(), 3);
    assert_eq!(drain_timestamps(&mut loader, 3), [0, PERIOD_US, 2 * PERIOD_US]);

    // a stopped writer can be started again and plays from the start
    loader.start_background_writer().unwrap();
    wait_until("the second run to stop", || !loader.is_writer_running());
    assert_eq!(drain_timestamps(&mut loader, 3), [0, PERIOD_US, 2 * PERIOD_US]);
}

#[test]
fn looping_flag_is_read_by_the_writer() {
    let mut loader = loader(
        PlayerConfig::default(),
        0.0,
        factory(|| CountingSource::new(2)),
    );
    loader.set_looping(false);
    loader.start_background_writer().unwrap();
    wait_until("the writer to stop", || !loader.is_writer_running());
    assert_eq!(loader.buffered_frames(), 2);
}

#[test]
fn empty_stream_stops_the_writer() {
    let mut loader = loader(
        PlayerConfig::default(),
        0.0,
        factory(|| CountingSource::new(0)),
    );
    loader.start_background_writer().unwrap();
    wait_until("the writer to stop", || !loader.is_writer_running());
    assert_eq!(loader.buffered_frames(), 0);
    assert!(loader.swap_next_frame(0.0).is_none());
}

#[test]
fn desync_restarts_the_stream() {
    let mut loader = loader(
        PlayerConfig::default(),
        0.0,
        factory(|| CountingSource {
            desync_at: Some(2),
            ..CountingSource::new(5)
        }),
    );
    loader.start_background_writer().unwrap();

    let seen = drain_timestamps(&mut loader, 5);
    assert_eq!(seen, [0, 1, 0, 1, 0].map(|i| i * PERIOD_US));
}

#[test]
fn failing_source_stops_the_writer() {
    let mut loader = loader(
        PlayerConfig::default(),
        0.0,
        Arc::new(|| -> volplayer::Result<Box<dyn FrameSource>> {
            Err(media_types::Error::codec("no decoder").into())
        }),
    );
    loader.start_background_writer().unwrap();
    wait_until("the writer to stop", || !loader.is_writer_running());
    assert_eq!(loader.buffered_frames(), 0);
}

#[test]
fn panicking_source_leaves_the_loader_restartable() {
    let opened = AtomicU64::new(0);
    let source: Arc<dyn SourceFactory> =
        Arc::new(move || -> volplayer::Result<Box<dyn FrameSource>> {
            if opened.fetch_add(1, Ordering::Relaxed) == 0 {
                Ok(Box::new(PanickingSource))
            } else {
                Ok(Box::new(CountingSource::new(3)))
            }
        });
    let config = PlayerConfig {
        looping: false,
        ..PlayerConfig::default()
    };
    let mut loader = loader(config, 0.0, source);

    loader.start_background_writer().unwrap();
    wait_until("the writer to stop", || !loader.is_writer_running());
    assert_eq!(loader.buffered_frames(), 0);

    loader.stop_background_writer();
    loader.start_background_writer().unwrap();
    wait_until("the second run to stop", || !loader.is_writer_running());
    assert_eq!(drain_timestamps(&mut loader, 3), [0, PERIOD_US, 2 * PERIOD_US]);
}

#[test]
fn start_and_stop_are_idempotent() {
    let mut loader = loader(
        PlayerConfig::default(),
        0.0,
        factory(|| CountingSource::new(u64::MAX)),
    );

    loader.stop_background_writer();
    loader.start_background_writer().unwrap();
    loader.start_background_writer().unwrap();
    assert!(loader.is_writer_running());

    wait_until("buffered frames", || loader.buffered_frames() > 0);

    loader.stop_background_writer();
    loader.stop_background_writer();
    assert!(!loader.is_writer_running());

    // frames decoded before the stop are still there
    assert!(loader.swap_next_frame(0.0).is_some());

    loader.start_background_writer().unwrap();
    assert!(loader.is_writer_running());
}
