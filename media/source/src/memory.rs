/*!
    FFmpeg input backed by an in-memory blob.

    The container bytes are served to libavformat through a custom AVIO
    context with read and seek callbacks, so nothing touches the filesystem.
*/

use std::ffi::{c_int, c_void};
use std::ptr;

use ffmpeg_next::{ffi, format::context::Input as InputContext};

use media_types::{Error, Result};

use crate::convert::error_from_ffmpeg;

const AVIO_BUFFER_SIZE: usize = 64 * 1024;

const SEEK_SET: c_int = 0;
const SEEK_CUR: c_int = 1;
const SEEK_END: c_int = 2;

/**
    The blob and its read cursor, handed to the AVIO callbacks as `opaque`.
*/
struct BlobReader {
    data: Vec<u8>,
    pos: usize,
}

impl BlobReader {
    fn read(&mut self, buf: &mut [u8]) -> usize {
        let remaining = &self.data[self.pos.min(self.data.len())..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        n
    }

    /**
        Reposition the cursor. Returns the new position, or `None` if the
        target falls outside the blob.
    */
    fn seek(&mut self, offset: i64, whence: c_int) -> Option<i64> {
        let len = self.data.len() as i64;
        let base = match whence {
            SEEK_SET => 0,
            SEEK_CUR => self.pos as i64,
            SEEK_END => len,
            _ => return None,
        };
        let target = base.checked_add(offset)?;
        if !(0..=len).contains(&target) {
            return None;
        }
        self.pos = target as usize;
        Some(target)
    }
}

unsafe extern "C" fn read_blob(opaque: *mut c_void, buf: *mut u8, buf_size: c_int) -> c_int {
    // SAFETY: opaque is the BlobReader owned by AvioHandle, which outlives the AVIO context
    let reader = unsafe { &mut *(opaque as *mut BlobReader) };
    if buf.is_null() || buf_size <= 0 {
        return 0;
    }
    // SAFETY: libavformat passes a writable buffer of buf_size bytes
    let buf = unsafe { std::slice::from_raw_parts_mut(buf, buf_size as usize) };
    match reader.read(buf) {
        0 => ffi::AVERROR_EOF,
        n => n as c_int,
    }
}

unsafe extern "C" fn seek_blob(opaque: *mut c_void, offset: i64, whence: c_int) -> i64 {
    // SAFETY: see read_blob
    let reader = unsafe { &mut *(opaque as *mut BlobReader) };
    if whence & ffi::AVSEEK_SIZE as c_int != 0 {
        return reader.data.len() as i64;
    }
    reader
        .seek(offset, whence & !(ffi::AVSEEK_FORCE as c_int))
        .unwrap_or(-1)
}

/**
    Owns the AVIO context, its buffer and the blob it reads from.
*/
struct AvioHandle {
    avio: *mut ffi::AVIOContext,
    reader: *mut BlobReader,
}

impl AvioHandle {
    fn new(blob: Vec<u8>) -> Result<Self> {
        let reader = Box::into_raw(Box::new(BlobReader { data: blob, pos: 0 }));

        // SAFETY: the buffer is handed to avio_alloc_context which takes ownership;
        // on failure it is released here before returning
        unsafe {
            let buffer = ffi::av_malloc(AVIO_BUFFER_SIZE) as *mut u8;
            if buffer.is_null() {
                drop(Box::from_raw(reader));
                return Err(Error::codec("failed to allocate AVIO buffer"));
            }

            let avio = ffi::avio_alloc_context(
                buffer,
                AVIO_BUFFER_SIZE as c_int,
                0,
                reader as *mut c_void,
                Some(read_blob),
                None,
                Some(seek_blob),
            );
            if avio.is_null() {
                ffi::av_free(buffer as *mut c_void);
                drop(Box::from_raw(reader));
                return Err(Error::codec("failed to allocate AVIO context"));
            }

            Ok(Self { avio, reader })
        }
    }
}

impl Drop for AvioHandle {
    fn drop(&mut self) {
        // SAFETY: both pointers were created in new() and are released once.
        // The buffer may have been reallocated by libavformat, so free the
        // context's current one rather than the original allocation.
        unsafe {
            if !self.avio.is_null() {
                ffi::av_freep(&mut (*self.avio).buffer as *mut *mut u8 as *mut c_void);
                ffi::avio_context_free(&mut self.avio);
            }
            drop(Box::from_raw(self.reader));
        }
    }
}

/**
    An opened libavformat input reading from memory.

    Field order matters: the format context must close before the AVIO
    context it reads through is freed.
*/
pub struct MemoryInput {
    input: InputContext,
    _io: AvioHandle,
}

// SAFETY: the raw pointers in AvioHandle are only dereferenced by libavformat
// from calls made through `input`, which requires &mut self.
unsafe impl Send for MemoryInput {}

impl MemoryInput {
    /**
        Open a container held in memory and read its stream headers.
    */
    pub fn open(blob: Vec<u8>) -> Result<Self> {
        if blob.is_empty() {
            return Err(Error::invalid_data("media blob is empty"));
        }
        ffmpeg_next::init().map_err(error_from_ffmpeg)?;

        let io = AvioHandle::new(blob)?;

        // SAFETY: ctx is freed by avformat_open_input on failure, and owned by
        // InputContext afterwards. The custom IO flag keeps libavformat from
        // closing our AVIO context.
        let input = unsafe {
            let mut ctx = ffi::avformat_alloc_context();
            if ctx.is_null() {
                return Err(Error::codec("failed to allocate format context"));
            }
            (*ctx).pb = io.avio;
            (*ctx).flags |= ffi::AVFMT_FLAG_CUSTOM_IO as c_int;

            let ret = ffi::avformat_open_input(&mut ctx, ptr::null(), ptr::null(), ptr::null_mut());
            if ret < 0 {
                return Err(Error::codec(format!(
                    "failed to open container: {}",
                    ffmpeg_next::Error::from(ret)
                )));
            }

            let input = InputContext::wrap(ctx);
            let ret = ffi::avformat_find_stream_info(ctx, ptr::null_mut());
            if ret < 0 {
                return Err(Error::codec(format!(
                    "failed to read stream info: {}",
                    ffmpeg_next::Error::from(ret)
                )));
            }
            input
        };

        Ok(Self { input, _io: io })
    }

    pub fn input(&self) -> &InputContext {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputContext {
        &mut self.input
    }
}
