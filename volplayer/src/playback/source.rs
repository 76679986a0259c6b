use media_decode::{FrameSource, SyncConfig};

use crate::error::{Error, Result};
use crate::fetch::BlobFetcher;

/**
    Opens the frame source the writer thread decodes from.

    Called once on the writer thread each time the writer starts, so any
    network or decoder setup happens off the render thread.
*/
pub trait SourceFactory: Send + Sync {
    fn open(&self) -> Result<Box<dyn FrameSource>>;
}

impl<F> SourceFactory for F
where
    F: Fn() -> Result<Box<dyn FrameSource>> + Send + Sync,
{
    fn open(&self) -> Result<Box<dyn FrameSource>> {
        self()
    }
}

/**
    Downloads the manifest's media file and opens it as a WebM source.
*/
#[derive(Clone, Debug)]
pub struct WebmSourceFactory {
    fetcher: BlobFetcher,
    file: Option<String>,
    sync: SyncConfig,
}

impl WebmSourceFactory {
    pub fn new(fetcher: BlobFetcher, file: Option<String>, sync: SyncConfig) -> Self {
        Self {
            fetcher,
            file,
            sync,
        }
    }
}

impl SourceFactory for WebmSourceFactory {
    fn open(&self) -> Result<Box<dyn FrameSource>> {
        let file = self.file.as_deref().ok_or(Error::MissingFile)?;
        let blob = self.fetcher.fetch_blob(file)?;
        open_webm(blob, self.sync)
    }
}

#[cfg(feature = "ffmpeg")]
fn open_webm(blob: Vec<u8>, sync: SyncConfig) -> Result<Box<dyn FrameSource>> {
    Ok(Box::new(media_decode::open_webm(blob, sync)?))
}

#[cfg(not(feature = "ffmpeg"))]
fn open_webm(_blob: Vec<u8>, _sync: SyncConfig) -> Result<Box<dyn FrameSource>> {
    Err(media_types::Error::unsupported("WebM decoding requires the ffmpeg feature").into())
}
