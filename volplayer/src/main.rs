use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use image::{GrayImage, ImageBuffer, Luma};
use tracing::Level;

use volplayer::{FrameLoader, NetworkContext, PlaneKind, PlayerConfig, VideoFrame};

#[derive(Parser, Debug)]
#[command(name = "volplayer")]
#[command(about = "Stream and pace a volumetric video asset")]
struct Args {
    /// Asset base URL, serving manifest/frames.json and frames/<file>
    #[arg(short, long)]
    base_url: Option<String>,

    /// Config file (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the manifest frame rate
    #[arg(long)]
    fps: Option<i32>,

    /// How often the render loop polls for a frame, in Hz
    #[arg(long, default_value = "72")]
    tick_hz: u32,

    /// Stop after this many seconds (runs until the stream ends otherwise)
    #[arg(short, long)]
    duration: Option<f64>,

    /// Play once instead of looping
    #[arg(long)]
    no_loop: bool,

    /// Write the luma and depth planes of the first frame shown to
    /// <path>.png and <path>-depth.png
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    let mut config = PlayerConfig::load(args.config.as_deref()).context("loading config")?;
    if let Some(base_url) = args.base_url.clone() {
        config = config.with_base_url(base_url);
    }
    if args.no_loop {
        config.looping = false;
    }
    config.validate().context("invalid config")?;

    let network = NetworkContext::new(&config.http).context("creating HTTP client")?;
    let mut loader = FrameLoader::new(config, &network)?;
    loader.load_manifest().context("fetching manifest")?;
    if let Some(fps) = args.fps {
        loader.set_fps(fps);
    }

    loader.start_background_writer()?;
    let stats = play(&mut loader, &args)?;
    loader.stop_background_writer();

    println!(
        "shown {} frames in {:.2}s ({:.1} fps), {} due ticks found no frame",
        stats.shown,
        stats.elapsed,
        stats.shown as f64 / stats.elapsed.max(f64::EPSILON),
        stats.starved,
    );
    if args.snapshot.is_some() && stats.shown == 0 {
        tracing::warn!("no frame was shown, nothing to snapshot");
    }
    Ok(())
}

struct Stats {
    shown: u64,
    starved: u64,
    elapsed: f64,
}

fn play(loader: &mut FrameLoader, args: &Args) -> Result<Stats> {
    let tick = Duration::from_secs_f64(1.0 / f64::from(args.tick_hz.max(1)));
    let start = loader.now_seconds();
    let mut stats = Stats {
        shown: 0,
        starved: 0,
        elapsed: 0.0,
    };
    let mut last_due = loader.controls().next_presentation_time();

    loop {
        let now = loader.now_seconds();
        stats.elapsed = now - start;
        if args.duration.is_some_and(|limit| stats.elapsed >= limit) {
            break;
        }

        let due = now >= last_due;
        match loader.swap_next_frame(now) {
            Some(frame) => {
                tracing::trace!(
                    sequence = frame.sequence,
                    ts_us = frame.ts_us,
                    "frame shown"
                );
                if let (0, Some(path)) = (stats.shown, &args.snapshot) {
                    write_snapshot(frame, path)?;
                }
                stats.shown += 1;
            }
            None if due => stats.starved += 1,
            None => {}
        }
        last_due = loader.controls().next_presentation_time();

        if !loader.is_writer_running() && loader.buffered_frames() == 0 {
            tracing::info!("stream finished");
            break;
        }
        thread::sleep(tick);
    }
    Ok(stats)
}

fn write_snapshot(frame: &VideoFrame, path: &Path) -> Result<()> {
    let luma = frame
        .plane(PlaneKind::Y)
        .context("frame has no color plane")?;
    let image = GrayImage::from_raw(luma.width, luma.height, luma.data.to_vec())
        .context("luma plane size mismatch")?;
    let luma_path = path.with_extension("png");
    image
        .save(&luma_path)
        .with_context(|| format!("writing {}", luma_path.display()))?;
    tracing::info!(path = %luma_path.display(), "wrote luma snapshot");

    if let Some(depth) = frame.plane(PlaneKind::Depth) {
        let samples: Vec<u16> = bytemuck::pod_collect_to_vec(depth.data);
        let image: ImageBuffer<Luma<u16>, Vec<u16>> =
            ImageBuffer::from_raw(depth.width, depth.height, samples)
                .context("depth plane size mismatch")?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "snapshot".into());
        let depth_path = path.with_file_name(format!("{stem}-depth.png"));
        image
            .save(&depth_path)
            .with_context(|| format!("writing {}", depth_path.display()))?;
        tracing::info!(path = %depth_path.display(), "wrote depth snapshot");
    }
    Ok(())
}
