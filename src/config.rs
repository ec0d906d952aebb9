//! Stream Configuration
//!
//! Parameters for the DMA buffer session: output format, ring capacity and
//! the bounded wait the playback callback tolerates before falling back to
//! silence. Defaults match a 16-bit stereo stream with a 16 KiB ring.

use crate::{Result, SndDmaError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bytes per sample (16-bit PCM)
pub const BYTES_PER_SAMPLE: usize = 2;

/// Default output sample rate in Hz
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Default ring capacity in bytes
pub const DEFAULT_CAPACITY: usize = 16 * 1024;

/// Default bound on the consumer's wait for fresh data
///
/// Short enough that a starved playback period resolves quickly, long enough
/// to ride out normal producer scheduling jitter.
pub const DEFAULT_DATA_WAIT: Duration = Duration::from_millis(40);

/// DMA buffer session configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DmaConfig {
    /// Output sample rate in Hz
    pub sample_rate: u32,
    /// Number of interleaved output channels
    pub channels: u16,
    /// Ring buffer capacity in bytes
    pub capacity: usize,
    /// Maximum time the consumer blocks waiting for the producer
    pub data_wait: Duration,
}

impl Default for DmaConfig {
    fn default() -> Self {
        DmaConfig {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: 2,
            capacity: DEFAULT_CAPACITY,
            data_wait: DEFAULT_DATA_WAIT,
        }
    }
}

impl DmaConfig {
    /// Create a configuration with the given format and a default ring
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        DmaConfig {
            sample_rate,
            channels,
            ..Default::default()
        }
    }

    /// Override the ring capacity in bytes
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Override the consumer's data-wait bound
    pub fn with_data_wait(mut self, data_wait: Duration) -> Self {
        self.data_wait = data_wait;
        self
    }

    /// Bytes per interleaved frame (one sample per channel)
    pub fn frame_bytes(&self) -> usize {
        self.channels as usize * BYTES_PER_SAMPLE
    }

    /// Full-ring latency in milliseconds
    pub fn latency_ms(&self) -> f32 {
        let frames = self.capacity as f32 / self.frame_bytes() as f32;
        frames * 1000.0 / self.sample_rate as f32
    }

    /// Validate the configuration
    ///
    /// The capacity must hold at least one frame and divide evenly into
    /// frames so the wrap point never splits a sample.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(SndDmaError::ConfigError(
                "sample rate must be non-zero".to_string(),
            ));
        }
        if self.channels == 0 {
            return Err(SndDmaError::ConfigError(
                "channel count must be non-zero".to_string(),
            ));
        }
        if self.capacity == 0 {
            return Err(SndDmaError::ConfigError(
                "ring capacity must be non-zero".to_string(),
            ));
        }
        if self.capacity % self.frame_bytes() != 0 {
            return Err(SndDmaError::ConfigError(format!(
                "ring capacity {} is not a multiple of the {}-byte frame size",
                self.capacity,
                self.frame_bytes()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = DmaConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.capacity, DEFAULT_CAPACITY);
        assert_eq!(config.data_wait, DEFAULT_DATA_WAIT);
    }

    #[test]
    fn test_latency_reflects_capacity() {
        let config = DmaConfig::new(44_100, 2).with_capacity(4096);
        // 1024 stereo frames at 44.1kHz ~= 23ms
        let latency = config.latency_ms();
        assert!(latency > 20.0 && latency < 26.0, "latency was {latency}ms");
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let config = DmaConfig::default().with_capacity(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_capacity_splitting_a_frame() {
        let config = DmaConfig::new(44_100, 2).with_capacity(1022);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_degenerate_format() {
        assert!(DmaConfig::new(0, 2).validate().is_err());
        assert!(DmaConfig::new(44_100, 0).validate().is_err());
    }

    #[test]
    fn test_config_from_json() {
        let config: DmaConfig = serde_json::from_str(
            r#"{
                "sample_rate": 11025,
                "channels": 2,
                "capacity": 16384,
                "data_wait": { "secs": 0, "nanos": 40000000 }
            }"#,
        )
        .expect("config should deserialize");

        assert_eq!(config.sample_rate, 11_025);
        assert_eq!(config.capacity, 16_384);
        assert_eq!(config.data_wait, Duration::from_millis(40));
        assert!(config.validate().is_ok());
    }
}
