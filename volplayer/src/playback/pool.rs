use std::cell::UnsafeCell;

use media_types::{RoleSet, VideoFrame};

/**
    Fixed set of frames shared by the writer and the consumer.

    The pool does no synchronization itself. Which side may touch a frame
    is decided by the ring protocol: a frame belongs to the writer while its
    slot is not ready and is not the consumer's current frame, and to the
    consumer otherwise.
*/
pub(crate) struct FramePool {
    frames: Box<[UnsafeCell<VideoFrame>]>,
}

// SAFETY: access to each frame is serialized by the ring's ready flags and
// indices, which publish with Release and observe with Acquire.
unsafe impl Sync for FramePool {}

impl FramePool {
    pub fn new(len: usize) -> Self {
        Self {
            frames: (0..len)
                .map(|_| UnsafeCell::new(VideoFrame::new()))
                .collect(),
        }
    }

    /**
        # Safety

        The caller must own frame `index` for reading under the ring protocol.
    */
    pub unsafe fn get(&self, index: usize) -> &VideoFrame {
        unsafe { &*self.frames[index].get() }
    }

    /**
        # Safety

        The caller must own frame `index` exclusively under the ring protocol.
    */
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn get_mut(&self, index: usize) -> &mut VideoFrame {
        unsafe { &mut *self.frames[index].get() }
    }

    /**
        Size frame `index` for the given dimensions.

        # Safety

        Same as [`get_mut`](Self::get_mut).
    */
    pub unsafe fn reserve(&self, index: usize, width: u32, height: u32, roles: RoleSet) {
        unsafe { self.get_mut(index) }.reserve(width, height, roles);
    }
}
