//! DMA Buffer Synchronization Core
//!
//! Hands sample bytes from a non-real-time mixer thread to a real-time
//! playback callback through a fixed-capacity circular buffer. The producer
//! reports how many bytes it wrote; the consumer pulls an exact byte count
//! each period, copying valid data or falling back to silence rather than
//! blocking past a bounded wait.
//!
//! Features:
//! - Available-byte accounting under a single mutex + condition variable
//! - Bounded consumer wait with a one-shot starvation latch
//! - Whole-period silence on underrun (no mid-period audio/silence splicing)
//! - Lock-free read-position snapshot for producer pacing

use crate::config::{DmaConfig, BYTES_PER_SAMPLE, DEFAULT_DATA_WAIT};
use crate::ring::{advance, RingStorage};
use crate::Result;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Pipeline state driving the silence decision
///
/// Replaces a pair of booleans (mixing-started, waiting-for-restart) with one
/// exhaustive state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MixState {
    /// No production report yet; every period is silence (warm-up)
    NotStarted,
    /// Normal operation; the consumer may block up to the data-wait bound
    Ready,
    /// A timed wait expired; emit silence without blocking until data resumes
    Starved,
}

/// Shared counters guarded by the control mutex
#[derive(Debug)]
struct Control {
    /// Bytes written by the producer but not yet copied out
    available: usize,
    state: MixState,
    shut_down: bool,
}

impl Control {
    fn reset(&mut self) {
        self.available = 0;
        self.state = MixState::NotStarted;
        self.shut_down = false;
    }
}

/// Producer/consumer DMA buffer
///
/// One instance per audio session, shared (via `Arc`) between the mixer
/// thread and the playback callback. Created detached; [`DmaBuffer::init`]
/// attaches storage and resets all counters.
///
/// # Example
/// ```
/// use snd_dma::{DmaBuffer, DmaConfig};
///
/// let mut dma = DmaBuffer::new();
/// dma.init(DmaConfig::new(44_100, 2).with_capacity(4096)).unwrap();
///
/// // Producer: write samples, then report them.
/// dma.write_at(0, &[0u8; 512]).unwrap();
/// dma.report_write(512);
///
/// // Consumer: pull one period worth of bytes.
/// let mut period = [0u8; 256];
/// dma.fill(&mut period);
/// ```
#[derive(Debug)]
pub struct DmaBuffer {
    control: Mutex<Control>,
    /// The condition is "new data is now available"
    data_ready: Condvar,
    /// Sample bytes; locked only for the duration of a copy
    storage: Mutex<RingStorage>,
    /// Byte offset the consumer will read next, published for pacing queries
    read_pos: AtomicUsize,
    capacity: usize,
    data_wait: Duration,
}

impl DmaBuffer {
    /// Create a detached buffer with no storage attached
    ///
    /// Every [`fill`](DmaBuffer::fill) before [`init`](DmaBuffer::init)
    /// emits silence.
    pub fn new() -> Self {
        DmaBuffer {
            control: Mutex::new(Control {
                available: 0,
                state: MixState::NotStarted,
                shut_down: false,
            }),
            data_ready: Condvar::new(),
            storage: Mutex::new(RingStorage::detached()),
            read_pos: AtomicUsize::new(0),
            capacity: 0,
            data_wait: DEFAULT_DATA_WAIT,
        }
    }

    /// Attach storage and reset the session state
    ///
    /// Validates the configuration, allocates the ring and resets the
    /// available count, the state machine and the read cursor. Requires
    /// exclusive access, so it must run before the buffer is shared.
    pub fn init(&mut self, config: DmaConfig) -> Result<()> {
        config.validate()?;
        *self.storage.get_mut() = RingStorage::new(config.capacity)?;
        self.capacity = config.capacity;
        self.data_wait = config.data_wait;
        self.control.get_mut().reset();
        self.read_pos.store(0, Ordering::Release);
        Ok(())
    }

    /// Whether storage has been attached
    pub fn is_initialized(&self) -> bool {
        self.capacity > 0
    }

    /// Ring capacity in bytes (zero while detached)
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Write sample bytes at the producer's own cursor, wrapping at capacity
    ///
    /// This is the data half of the producer contract; it makes no bytes
    /// visible to the consumer until [`report_write`](DmaBuffer::report_write)
    /// is called. The producer must pace itself (via
    /// [`read_position`](DmaBuffer::read_position)) so it never overwrites
    /// unconsumed data; that invariant is not checked here.
    pub fn write_at(&self, offset_bytes: usize, data: &[u8]) -> Result<()> {
        self.storage.lock().write_at(offset_bytes, data)
    }

    /// Report that `len_bytes` of new sample data are now valid
    ///
    /// Called by the producer after physically writing the bytes. Marks the
    /// pipeline as started, wakes the consumer if it was starved and bumps
    /// the available count. Never blocks.
    pub fn report_write(&self, len_bytes: usize) {
        let mut control = self.control.lock();
        if control.shut_down {
            return;
        }
        if control.state == MixState::NotStarted {
            control.state = MixState::Ready;
        }
        // Only one waiter can exist, so a single signal suffices.
        if control.available == 0 {
            self.data_ready.notify_one();
        }
        control.available += len_bytes;
    }

    /// Fill one output period, substituting silence when data runs out
    ///
    /// Invoked periodically by the playback layer with the exact byte count
    /// the hardware needs. Always populates all of `dest` before returning:
    /// valid sample bytes while they last, zeros for the rest. Blocks at
    /// most once, for at most the configured data-wait, and only when the
    /// pipeline has started and is not already starved.
    ///
    /// Once a gap is detected the entire remainder of the period is
    /// silenced; a torn period that splices mixed audio and silence is more
    /// audible than a cleanly silent one.
    pub fn fill(&self, dest: &mut [u8]) {
        if dest.is_empty() {
            return;
        }
        if !self.is_initialized() {
            dest.fill(0);
            return;
        }

        let mut cursor = self.read_pos.load(Ordering::Relaxed);
        let mut filled = 0;

        while filled < dest.len() {
            let remaining = dest.len() - filled;

            let mut control = self.control.lock();
            if self.should_emit_silence(&mut control) {
                drop(control);
                dest[filled..].fill(0);
                self.read_pos.store(cursor, Ordering::Release);
                return;
            }
            let chunk = control
                .available
                .min(self.capacity - cursor)
                .min(remaining);
            control.available -= chunk;
            drop(control);

            // Copy outside the control mutex so the producer's report path
            // never waits on a memcpy.
            self.storage
                .lock()
                .copy_out(cursor, &mut dest[filled..filled + chunk]);
            filled += chunk;
            cursor = advance(cursor, chunk, self.capacity);
        }

        self.read_pos.store(cursor, Ordering::Release);
    }

    /// Current read position in samples
    ///
    /// Snapshot of the consumer's cursor for producer pacing. Never takes
    /// the mutex; at worst slightly stale, never torn.
    pub fn read_position(&self) -> usize {
        self.read_pos.load(Ordering::Acquire) / BYTES_PER_SAMPLE
    }

    /// Bytes reported but not yet consumed (advisory)
    pub fn available(&self) -> usize {
        self.control.lock().available
    }

    /// Stop the session
    ///
    /// Later fills emit silence and later reports are ignored. Wakes a
    /// consumer parked in its timed wait so shutdown never trails by a full
    /// wait period.
    pub fn shutdown(&self) {
        let mut control = self.control.lock();
        control.shut_down = true;
        self.data_ready.notify_one();
    }

    /// Decide whether the rest of the current period must be silence
    ///
    /// Runs with the control mutex held (and releases it only inside the
    /// condvar wait). Returns `true` during warm-up, after shutdown, once
    /// the starvation latch is set, or when a fresh wait for data times out;
    /// in the last case the latch is set so subsequent periods silence
    /// immediately instead of re-blocking.
    fn should_emit_silence(&self, control: &mut MutexGuard<'_, Control>) -> bool {
        if control.shut_down || control.state == MixState::NotStarted {
            return true;
        }
        while control.available == 0 {
            if control.shut_down || control.state == MixState::Starved {
                return true;
            }
            let timed_out = self
                .data_ready
                .wait_for(control, self.data_wait)
                .timed_out();
            if timed_out {
                control.state = MixState::Starved;
                return true;
            }
            // Signaled: loop re-tests the predicate (spurious wakeups).
        }
        control.state = MixState::Ready;
        false
    }
}

impl Default for DmaBuffer {
    fn default() -> Self {
        Self::new()
    }
}
