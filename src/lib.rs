//! Real-time playback DMA buffer
//!
//! A producer/consumer synchronization core that feeds audio sample bytes
//! from a non-real-time mixer thread into a fixed-size circular buffer
//! drained by a real-time playback callback. The consumer never blocks past
//! a bounded wait: when the producer falls behind, the rest of the output
//! period degrades to silence instead of stalling the audio thread.
//!
//! # Features
//! - Circular byte buffer with wraparound-safe index arithmetic
//! - Available-byte handoff protocol (mutex + condition variable, bounded wait)
//! - One-shot starvation latch so stalls cost one wait period, not many
//! - Lock-free read-position snapshot for producer pacing
//! - Optional `streaming` feature with a rodio-backed output device
//!
//! # Crate feature flags
//! - `streaming` (opt-in): Real-time audio output (enables optional `rodio` dep)
//!
//! # Quick start
//! ## Core handoff only
//! ```
//! use snd_dma::{DmaBuffer, DmaConfig};
//!
//! let mut dma = DmaBuffer::new();
//! dma.init(DmaConfig::new(44_100, 2).with_capacity(16 * 1024)).unwrap();
//!
//! // Mixer thread: write sample bytes, then publish them.
//! dma.write_at(0, &[0u8; 1024]).unwrap();
//! dma.report_write(1024);
//!
//! // Playback callback: always fully populated, silence on underrun.
//! let mut period = [0u8; 512];
//! dma.fill(&mut period);
//!
//! // Producer pacing: how far has playback advanced?
//! let _samples_played = dma.read_position();
//! ```
//!
//! ## Real-time device output
//! ```no_run
//! # #[cfg(feature = "streaming")]
//! # {
//! use snd_dma::{AudioDevice, DmaBuffer, DmaConfig};
//! use std::sync::Arc;
//!
//! let config = DmaConfig::new(44_100, 2);
//! let mut dma = DmaBuffer::new();
//! dma.init(config).unwrap();
//! let dma = Arc::new(dma);
//! let _device =
//!     AudioDevice::new(config.sample_rate, config.channels, Arc::clone(&dma)).unwrap();
//! // mix into `dma` in a loop: write_at + report_write
//! # }
//! ```

#![warn(missing_docs)]

// Domain modules
pub mod config; // Session configuration
pub mod dma; // Producer/consumer synchronization core
pub mod ring; // Circular buffer storage
#[cfg(feature = "streaming")]
pub mod streaming; // Audio Output & Streaming

/// Error types for DMA buffer operations
#[derive(thiserror::Error, Debug)]
pub enum SndDmaError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Buffer storage misuse (detached storage, oversized write)
    #[error("Buffer error: {0}")]
    BufferError(String),

    /// Audio device error
    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    /// IO error from filesystem or device
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for SndDmaError {
    /// Converts a String into `SndDmaError::Other`.
    ///
    /// Convenience for generic string errors; prefer the specific variant
    /// constructors when the error class is known.
    fn from(msg: String) -> Self {
        SndDmaError::Other(msg)
    }
}

impl From<&str> for SndDmaError {
    /// Converts a string slice into `SndDmaError::Other`.
    fn from(msg: &str) -> Self {
        SndDmaError::Other(msg.to_string())
    }
}

/// Result type for DMA buffer operations
pub type Result<T> = std::result::Result<T, SndDmaError>;

// Public API exports
pub use config::{
    DmaConfig, BYTES_PER_SAMPLE, DEFAULT_CAPACITY, DEFAULT_DATA_WAIT, DEFAULT_SAMPLE_RATE,
};
pub use dma::DmaBuffer;
pub use ring::RingStorage;

#[cfg(feature = "streaming")]
pub use streaming::{AudioDevice, DEVICE_CHUNK_BYTES};
