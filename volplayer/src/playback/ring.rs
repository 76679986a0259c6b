/*!
    Single-producer single-consumer ring of frame slots.

    Slots reference frames in a pre-allocated pool by index. The writer
    decodes straight into the frame behind the slot at the write index and
    then marks it ready; the consumer takes the frame at the read index and
    hands the slot back. Nothing is copied between slots.

    One slot is always kept empty, so `free_slots() = cap - occupied - 1`.
    That slot is the one behind the read index, which holds the frame the
    consumer took last: the writer can never overwrite it until the next
    take, so the consumer may keep reading it in between.
*/

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use media_types::{RoleSet, VideoFrame};

use super::pool::FramePool;

struct Slot {
    /// Pool index of the frame this slot refers to.
    frame: usize,
    /// True once the frame is complete; written by both sides.
    ready: AtomicBool,
}

/**
    Condition variable the consumer pokes after freeing a slot.
*/
#[derive(Default)]
struct WriterWakeup {
    lock: Mutex<()>,
    cond: Condvar,
}

struct Shared {
    slots: Box<[Slot]>,
    pool: FramePool,
    write_index: AtomicUsize,
    read_index: AtomicUsize,
    wakeup: WriterWakeup,
}

impl Shared {
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn occupied(&self) -> usize {
        let cap = self.capacity();
        let w = self.write_index.load(Ordering::Acquire);
        let r = self.read_index.load(Ordering::Acquire);
        (w + cap - r) % cap
    }

    fn free_slots(&self) -> usize {
        self.capacity() - self.occupied() - 1
    }
}

/**
    Outcome of [`Producer::publish_with`].
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Publish {
    /// A frame was written and made visible to the consumer.
    Published,
    /// The fill callback had nothing to write.
    EndOfStream,
    /// No free slot.
    Full,
    /// The slot at the write index is still marked ready. This breaks the
    /// ring protocol; the slot is left untouched.
    SlotBusy,
}

/**
    Constructor for the producer and consumer halves of a frame ring.
*/
pub struct RingBuffer;

impl RingBuffer {
    /**
        Allocate a ring of `capacity` slots and its frame pool.

        At most `capacity - 1` frames are buffered at once. Capacities below
        2 are raised to 2.
    */
    #[allow(clippy::new_ret_no_self)]
    pub fn new(capacity: usize) -> (Producer, Consumer) {
        let capacity = capacity.max(2);
        let shared = Arc::new(Shared {
            slots: (0..capacity)
                .map(|frame| Slot {
                    frame,
                    ready: AtomicBool::new(false),
                })
                .collect(),
            pool: FramePool::new(capacity),
            write_index: AtomicUsize::new(0),
            read_index: AtomicUsize::new(0),
            wakeup: WriterWakeup::default(),
        });

        (
            Producer {
                shared: Arc::clone(&shared),
            },
            Consumer {
                shared,
                current: None,
            },
        )
    }
}

/**
    Writer half of the ring. Not `Clone`: there is exactly one.
*/
pub struct Producer {
    shared: Arc<Shared>,
}

impl Producer {
    pub fn capacity(&self) -> usize {
        self.shared.capacity()
    }

    pub fn free_slots(&self) -> usize {
        self.shared.free_slots()
    }

    /**
        Fill the frame behind the write index and publish it.

        `fill` returns `Ok(false)` when it has no frame to give, in which
        case nothing is published. An error from `fill` is passed through
        and the slot stays unpublished.
    */
    pub fn publish_with<E>(
        &mut self,
        fill: impl FnOnce(&mut VideoFrame) -> Result<bool, E>,
    ) -> Result<Publish, E> {
        let shared = &*self.shared;
        if shared.free_slots() == 0 {
            return Ok(Publish::Full);
        }

        let w = shared.write_index.load(Ordering::Relaxed);
        let slot = &shared.slots[w];
        if slot.ready.load(Ordering::Acquire) {
            return Ok(Publish::SlotBusy);
        }

        // SAFETY: the slot is free and not the consumer's current frame
        let frame = unsafe { shared.pool.get_mut(slot.frame) };
        if !fill(frame)? {
            return Ok(Publish::EndOfStream);
        }

        slot.ready.store(true, Ordering::Release);
        shared
            .write_index
            .store((w + 1) % shared.capacity(), Ordering::Release);
        Ok(Publish::Published)
    }

    /**
        Size every frame the writer currently owns for the given luma
        dimensions. Frames held by the consumer are left alone and grow on
        their next decode instead.
    */
    pub fn preallocate(&mut self, width: u32, height: u32, roles: RoleSet) {
        let shared = &*self.shared;
        let cap = shared.capacity();
        let w = shared.write_index.load(Ordering::Relaxed);
        for offset in 0..shared.free_slots() {
            let slot = &shared.slots[(w + offset) % cap];
            // SAFETY: slots from the write index up to the free count are writer-owned
            unsafe { shared.pool.reserve(slot.frame, width, height, roles) };
        }
    }

    /**
        Block until a slot is free or `timeout` passes.

        Returns true if a slot is free.
    */
    pub fn wait_for_space(&self, timeout: Duration) -> bool {
        let wakeup = &self.shared.wakeup;
        let mut guard = wakeup.lock.lock();
        if self.free_slots() > 0 {
            return true;
        }
        wakeup.cond.wait_for(&mut guard, timeout);
        self.free_slots() > 0
    }

    /**
        Handle that can wake a writer blocked in [`wait_for_space`](Self::wait_for_space).
    */
    pub(crate) fn waker(&self) -> WriterWaker {
        WriterWaker {
            shared: Arc::clone(&self.shared),
        }
    }
}

/**
    Reader half of the ring. Not `Clone`: there is exactly one.
*/
pub struct Consumer {
    shared: Arc<Shared>,
    /// Pool index of the frame returned by the last take.
    current: Option<usize>,
}

impl Consumer {
    pub fn capacity(&self) -> usize {
        self.shared.capacity()
    }

    /// Frames published and not yet taken.
    pub fn buffered(&self) -> usize {
        self.shared.occupied()
    }

    /**
        Take the next ready frame, if any.

        The returned frame stays valid and unmodified until the next
        successful take, which the borrow enforces.
    */
    pub fn try_take(&mut self) -> Option<&VideoFrame> {
        let shared = &*self.shared;
        let r = shared.read_index.load(Ordering::Relaxed);
        let slot = &shared.slots[r];
        if !slot.ready.load(Ordering::Acquire) {
            return None;
        }

        slot.ready.store(false, Ordering::Release);
        shared
            .read_index
            .store((r + 1) % shared.capacity(), Ordering::Release);
        self.current = Some(slot.frame);
        self.notify_writer();

        // SAFETY: the slot behind the read index is never written by the producer
        Some(unsafe { shared.pool.get(slot.frame) })
    }

    /**
        The frame returned by the last successful take.
    */
    pub fn current(&self) -> Option<&VideoFrame> {
        // SAFETY: see try_take
        self.current
            .map(|index| unsafe { self.shared.pool.get(index) })
    }

    /// Wake the writer without taking its lock.
    pub fn notify_writer(&self) {
        self.shared.wakeup.cond.notify_one();
    }
}

/**
    Wakes the writer, e.g. to make it notice a shutdown request.
*/
#[derive(Clone)]
pub(crate) struct WriterWaker {
    shared: Arc<Shared>,
}

impl WriterWaker {
    pub fn wake(&self) {
        // Taking the lock orders this wake after a concurrent free-slot check
        let _guard = self.shared.wakeup.lock.lock();
        self.shared.wakeup.cond.notify_all();
    }
}
