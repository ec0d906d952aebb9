//! Audio Output & Streaming
//!
//! Adapts the DMA buffer's consumption path to a real audio backend. The
//! device owns the output stream and pulls sample bytes through
//! [`DmaBuffer::fill`](crate::DmaBuffer::fill), so underruns surface as
//! silence on the speaker instead of a stalled stream.

mod audio_device;

pub use audio_device::AudioDevice;

/// Bytes pulled from the DMA buffer per batch read
///
/// Batching keeps lock traffic off the playback thread's per-sample path.
pub const DEVICE_CHUNK_BYTES: usize = 4096;
