//! Circular Buffer Storage
//!
//! Fixed-capacity byte storage with modulo-capacity index arithmetic.
//! The producer writes at arbitrary wrapping offsets, the consumer reads
//! contiguous runs bounded by the distance to the wrap point.
//!
//! Features:
//! - Wrapping two-segment writes for the producer data path
//! - Contiguous reads for the consumer copy loop
//! - Detached (zero-capacity) state for the "device not ready" case

use crate::{Result, SndDmaError};

/// Advance a byte offset by `n`, wrapping at `capacity`.
///
/// `offset` must already be in `[0, capacity)` and `n` at most `capacity`,
/// which holds for every cursor movement in this crate.
pub fn advance(offset: usize, n: usize, capacity: usize) -> usize {
    debug_assert!(offset < capacity);
    debug_assert!(n <= capacity);
    let next = offset + n;
    if next >= capacity {
        next - capacity
    } else {
        next
    }
}

/// Fixed-capacity circular byte storage
///
/// Owns the raw sample bytes shared between the mixer (producer) and the
/// playback callback (consumer). Allocated once at init and reused for the
/// whole session; all offsets are taken modulo the capacity.
#[derive(Debug)]
pub struct RingStorage {
    data: Box<[u8]>,
}

impl RingStorage {
    /// Create storage with the given capacity in bytes
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(SndDmaError::ConfigError(
                "ring capacity must be non-zero".to_string(),
            ));
        }
        Ok(RingStorage {
            data: vec![0u8; capacity].into_boxed_slice(),
        })
    }

    /// Create detached storage with no backing bytes
    ///
    /// Represents the state before `init` has attached a real buffer.
    pub fn detached() -> Self {
        RingStorage {
            data: Box::default(),
        }
    }

    /// Capacity in bytes (zero when detached)
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Write `src` starting at `offset`, wrapping past the end
    ///
    /// `src` must not be longer than the capacity; the offset may be any
    /// value and is reduced modulo the capacity.
    pub fn write_at(&mut self, offset: usize, src: &[u8]) -> Result<()> {
        let capacity = self.capacity();
        if capacity == 0 {
            return Err(SndDmaError::BufferError(
                "storage not attached".to_string(),
            ));
        }
        if src.len() > capacity {
            return Err(SndDmaError::BufferError(format!(
                "write of {} bytes exceeds capacity {}",
                src.len(),
                capacity
            )));
        }
        let offset = offset % capacity;
        let first = src.len().min(capacity - offset);
        self.data[offset..offset + first].copy_from_slice(&src[..first]);
        let wrapped = &src[first..];
        self.data[..wrapped.len()].copy_from_slice(wrapped);
        Ok(())
    }

    /// Copy a contiguous run starting at `offset` into `dest`
    ///
    /// The caller guarantees `offset + dest.len()` does not cross the wrap
    /// point; the consumer copy loop bounds every chunk by the distance to
    /// the end of the buffer.
    pub fn copy_out(&self, offset: usize, dest: &mut [u8]) {
        dest.copy_from_slice(&self.data[offset..offset + dest.len()]);
    }
}
